//! Multi-key credential pool with round-robin rotation.
//!
//! Keys are discovered from the environment at startup: any variable
//! whose name signals a model-API credential and whose value carries
//! the provider's key prefix is a candidate. Discovery order is lexical
//! by variable name so rotation is deterministic across runs.

use std::sync::Mutex;

/// Gemini API keys all start with this prefix.
const KEY_PREFIX: &str = "AIza";

/// Case-insensitive markers flagging an env var as a candidate credential.
const NAME_MARKERS: &[&str] = &["gemini", "api_key"];

/// Ordered pool of API keys with a process-wide rotation cursor.
///
/// The cursor is guarded by a mutex so concurrent requests advance it
/// without racing. A manually supplied key never enters the pool.
pub struct CredentialPool {
    keys: Vec<String>,
    cursor: Mutex<usize>,
}

impl CredentialPool {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys,
            cursor: Mutex::new(0),
        }
    }

    /// Seed the pool from the process environment.
    pub fn from_env() -> Self {
        let keys = discover(std::env::vars());
        if keys.is_empty() {
            tracing::warn!(
                "No Gemini API keys found in the environment. Requests will need a manual key."
            );
        } else {
            tracing::info!(keys = keys.len(), "Credential pool seeded from environment");
        }
        Self::new(keys)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The key at the cursor, advancing the cursor modulo pool size.
    /// Returns `None` on an empty pool.
    pub fn next(&self) -> Option<String> {
        if self.keys.is_empty() {
            return None;
        }
        // The cursor is a plain index, so a poisoned lock is safe to recover.
        let mut cursor = self.cursor.lock().unwrap_or_else(|e| e.into_inner());
        let key = self.keys[*cursor].clone();
        *cursor = (*cursor + 1) % self.keys.len();
        Some(key)
    }

    /// Ordered keys for one request: the manual key first when present,
    /// then up to three rotations from the pool. The manual key is
    /// request-scoped and does not touch the cursor.
    pub fn attempt_keys(&self, manual: Option<&str>) -> Vec<String> {
        let mut keys = Vec::new();
        if let Some(manual) = manual.filter(|k| !k.trim().is_empty()) {
            keys.push(manual.to_string());
        }
        for _ in 0..self.keys.len().min(3) {
            if let Some(key) = self.next() {
                keys.push(key);
            }
        }
        keys
    }
}

/// Filter candidate credentials out of a set of environment variables.
///
/// Kept separate from [`CredentialPool::from_env`] so tests can feed a
/// fixed variable set instead of mutating the process environment.
pub fn discover<I>(vars: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut found: Vec<(String, String)> = vars
        .into_iter()
        .filter(|(name, value)| {
            let name = name.to_lowercase();
            NAME_MARKERS.iter().any(|marker| name.contains(marker))
                && value.starts_with(KEY_PREFIX)
        })
        .collect();
    found.sort_by(|a, b| a.0.cmp(&b.0));
    found.into_iter().map(|(_, value)| value).collect()
}
