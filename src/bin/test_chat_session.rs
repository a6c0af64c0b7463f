//! Test binary for verifying a chat session against a live backend
//! Starts a session, asks one question, lists sessions, then cleans up.

use knowledge_chat_client::auth::{AuthHeaderSource, BearerAuth};
use knowledge_chat_client::{ClientConfig, ConversationManager};
use std::env;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ClientConfig::from_env();
    info!(api_base_url = %config.api_base_url, "Configuration loaded");

    let auth: Arc<dyn AuthHeaderSource> =
        Arc::new(BearerAuth::new(env::var("CHAT_ACCESS_TOKEN").ok()));
    let manager = ConversationManager::connect(config, auth)?;

    let question = env::args()
        .nth(1)
        .unwrap_or_else(|| "What does the Quran say about patience?".to_string());

    println!("Testing chat session against the backend...\n");

    let session = manager.start_session(Some("Smoke test")).await?;
    println!("1. Started session {} ({})", session.id, session.title);

    println!("2. User: {}", question);
    let message = manager.send_message(&question, Some("en")).await?;
    println!("   Assistant: {}\n", message.bot_response.trim());
    for source in &message.sources {
        println!("   [{}] {}", source.reference(), source.display_text());
    }

    let sessions = manager.load_session_list().await?;
    println!("\n3. {} session(s) on the server", sessions.len());

    manager.delete_session(&session.id).await?;
    println!("4. Deleted session {}", session.id);

    println!("\n✓ Chat session test completed!");
    Ok(())
}
