//! Scripted conversation panel.
//!
//! Drives a two-model conversation entirely with mock clients: no network,
//! no real API keys, an in-memory database. Shows the turn rotation, a
//! moderator steer, and the event stream.
//!
//! Run with: cargo run -p orchestrator --example mock_panel

use std::sync::Arc;

use mock_client::ScriptedClient;
use orchestrator::{
    ClientRegistry, ConversationEvent, CreateConversationRequest, Database, Orchestrator,
    SenderKind,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let db = Database::connect("sqlite::memory:").await?;
    db.migrate().await?;

    let mut registry = ClientRegistry::new();
    registry.register(Arc::new(ScriptedClient::new(
        "muse",
        [
            "I'll open: whether progress is real depends on what we measure.",
            "Fair push-back. I still say direction matters more than speed.",
        ],
    )));
    registry.register(Arc::new(ScriptedClient::new(
        "critic",
        ["Progress without a destination is just motion. I disagree, muse."],
    )));

    let engine = Orchestrator::new(db, registry);
    let mut events = engine.subscribe();

    // The mocks never read the key, but the engine still requires one per
    // participant, exactly as it would for real vendors.
    for vendor in ["muse", "critic"] {
        database::credential::upsert_api_key(engine.db().pool(), "auditor", vendor, "mock-key")
            .await?;
    }

    let conversation = engine
        .create_conversation(CreateConversationRequest {
            user_id: "auditor".to_string(),
            name: Some("what counts as progress?".to_string()),
            participants: vec!["muse".to_string(), "critic".to_string()],
            system_prompt: "Two-model panel. Keep replies to a sentence or two.".to_string(),
            seed_opening_turn: true,
        })
        .await?;
    println!("Created conversation {}", conversation.id);

    // The seed already made muse speak; let critic answer.
    engine.advance_turn(&conversation.id, "auditor").await?;

    // Anchor the rotation at critic's slot so muse replies to this.
    engine
        .post_moderator_message(
            &conversation.id,
            "auditor",
            "muse, answer that directly.",
            Some("critic".to_string()),
        )
        .await?;
    engine.advance_turn(&conversation.id, "auditor").await?;

    let detail = engine
        .get_conversation_detail(&conversation.id, "auditor")
        .await?;
    println!("\nTranscript:");
    for message in &detail.messages {
        let speaker = match message.sender_kind {
            SenderKind::Model => message.sender_id.as_str(),
            SenderKind::Moderator => "auditor",
        };
        println!("  [{speaker}] {}", message.content);
    }

    println!("\nEvents:");
    while let Ok(event) = events.try_recv() {
        match event {
            ConversationEvent::TurnAdvanced { message, .. } => {
                println!("  turn_advanced: {} spoke", message.sender_id);
            }
            ConversationEvent::ModeratorPosted { message, .. } => {
                println!("  moderator_posted: {:?}", message.content);
            }
            ConversationEvent::SystemPromptUpdated { prompt, .. } => {
                println!("  system_prompt_updated: {prompt:?}");
            }
            ConversationEvent::AdvanceFailed { reason, .. } => {
                println!("  advance_failed: {reason}");
            }
        }
    }

    Ok(())
}
