//! Live multi-vendor panel.
//!
//! Seats every vendor you hold a key for in one shared conversation and
//! drives a few rounds, printing each turn as it lands.
//!
//! Run with: cargo run -p orchestrator --example live_panel
//!
//! Configuration via .env file or environment variables:
//!   ASK_CLAUDE_KEY, ASK_CHATGPT_KEY, ASK_DEEPSEEK_KEY, ASK_GEMINI_KEY
//!   PANEL_TOPIC  - what the panel discusses (has a default)
//!   PANEL_ROUNDS - turns to drive after the opening one (default 3)

use std::env;

use orchestrator::{CreateConversationRequest, Database, Orchestrator};
use providers::default_registry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orchestrator=info".into()),
        )
        .init();

    let db = Database::connect("sqlite:colloquy-live.db?mode=rwc").await?;
    db.migrate().await?;
    let engine = Orchestrator::new(db, default_registry()?);

    // Seat every vendor whose key is present.
    let mut participants = Vec::new();
    for vendor in engine.available_vendors() {
        let key_var = format!("ASK_{}_KEY", vendor.to_uppercase());
        let Ok(api_key) = env::var(&key_var) else {
            println!("[{vendor}] left out ({key_var} not set)");
            continue;
        };
        database::credential::upsert_api_key(engine.db().pool(), "auditor", &vendor, &api_key)
            .await?;
        participants.push(vendor);
    }
    if participants.len() < 2 {
        eprintln!("Need keys for at least two vendors to hold a panel.");
        return Ok(());
    }

    let topic = env::var("PANEL_TOPIC")
        .unwrap_or_else(|_| "Will software engineering still be a human job in 2040?".to_string());
    let rounds: usize = env::var("PANEL_ROUNDS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3);

    println!("Panel: {}", participants.join(", "));
    println!("Topic: {topic}\n");

    let conversation = engine
        .create_conversation(CreateConversationRequest {
            user_id: "auditor".to_string(),
            name: Some(topic.clone()),
            participants: participants.clone(),
            system_prompt: format!(
                "You are one voice on a panel of AI models discussing: {topic}. \
                 Address the previous speaker directly and keep each reply under 120 words."
            ),
            seed_opening_turn: true,
        })
        .await?;

    let detail = engine
        .get_conversation_detail(&conversation.id, "auditor")
        .await?;
    if let Some(opening) = detail.messages.first() {
        println!("[{}] {}\n", opening.sender_id, opening.content);
    }

    for _ in 0..rounds {
        match engine.advance_turn(&conversation.id, "auditor").await {
            Ok(turn) => println!("[{}] {}\n", turn.sender_id, turn.content),
            Err(error) => {
                eprintln!("advance failed: {error}");
                break;
            }
        }
    }

    engine.db().close().await;
    Ok(())
}
