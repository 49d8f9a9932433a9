//! Diagnostic: list the models visible to each discovered API key.
//!
//! Models that support content generation are marked with `*`. Keys
//! are identified only by their last four characters.

use guardian::credentials::CredentialPool;
use guardian::gemini::{GeminiClient, GenerateContent};

fn main() {
    let pool = CredentialPool::from_env();
    if pool.is_empty() {
        eprintln!("No Gemini API keys found in the environment.");
        std::process::exit(1);
    }

    let client = GeminiClient::default_hosted();
    for _ in 0..pool.len() {
        let Some(key) = pool.next() else { break };
        let tail = &key[key.len().saturating_sub(4)..];
        println!("Key …{tail}:");
        match client.list_models(&key) {
            Ok(models) => {
                for model in models {
                    let marker = if model.supports_generation() { "*" } else { " " };
                    println!("  {marker} {}", model.name);
                }
            }
            Err(e) => println!("  error: {e}"),
        }
    }
}
