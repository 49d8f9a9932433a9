use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Guardian";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default model used for both vision enrichment and answer generation.
pub const DEFAULT_MODEL: &str = "gemini-flash-latest";

/// Get the application data directory
/// ~/Guardian/ by default; overridable via GUARDIAN_DATA_DIR.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("GUARDIAN_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Guardian")
}

/// The curated first-aid protocol document.
pub fn knowledge_base_path() -> PathBuf {
    data_dir().join("knowledge_base.json")
}

/// The medicine/equipment inventory document.
pub fn inventory_path() -> PathBuf {
    data_dir().join("inventory.json")
}

/// Static assets for the chat front end.
pub fn static_dir() -> PathBuf {
    data_dir().join("static")
}

/// Model name, overridable via GUARDIAN_MODEL.
pub fn model_name() -> String {
    std::env::var("GUARDIAN_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string())
}

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    "info,guardian=debug".to_string()
}

/// Socket address for the HTTP server, overridable via GUARDIAN_BIND.
pub fn bind_addr() -> SocketAddr {
    std::env::var("GUARDIAN_BIND")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8000)))
}
