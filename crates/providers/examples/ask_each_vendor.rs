//! Send one prompt to every vendor you hold a key for.
//!
//! Run with: cargo run -p providers --example ask_each_vendor
//! Or with a custom prompt: cargo run -p providers --example ask_each_vendor -- "Your prompt here"
//!
//! Set the keys you have in .env:
//!   ASK_CLAUDE_KEY, ASK_CHATGPT_KEY, ASK_DEEPSEEK_KEY, ASK_GEMINI_KEY
//!
//! Vendors without a key are skipped.

use chat_core::TurnRequest;
use providers::default_registry;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let prompt = if args.len() > 1 {
        args[1..].join(" ")
    } else {
        "In one sentence, what makes a good panel discussion?".to_string()
    };

    let registry = default_registry()?;

    for vendor in registry.known_vendors() {
        let key_var = format!("ASK_{}_KEY", vendor.to_uppercase());
        let Ok(api_key) = env::var(&key_var) else {
            println!("[{vendor}] skipped ({key_var} not set)");
            continue;
        };

        let client = registry
            .get(&vendor)
            .ok_or_else(|| format!("vendor {vendor} vanished from the registry"))?;

        println!("[{vendor}] asking: \"{prompt}\"");
        match client
            .generate(TurnRequest::new(api_key, prompt.clone(), ""))
            .await
        {
            Ok(reply) => println!("[{vendor}] {reply}\n"),
            Err(err) => println!("[{vendor}] failed: {err}\n"),
        }
    }

    Ok(())
}
