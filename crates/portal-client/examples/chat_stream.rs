use std::sync::Arc;

use anyhow::Result;
use portal_client::{PortalClient, PortalConfig};
use portal_session::{ChatSession, Role};

#[tokio::main]
async fn main() -> Result<()> {
    // Backend location from PORTAL_API_URL, e.g. http://localhost:8000
    let config = PortalConfig::from_env()?;

    println!("Portal Chat Streaming Example");
    println!("=============================\n");
    println!("Backend: {}\n", config.base_url);

    let client = PortalClient::new(config)?;
    let session = ChatSession::new(Arc::new(client));

    let prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "How are my clusters doing?".to_string());
    println!("> {}\n", prompt);

    let mut updates = session.subscribe();
    session.send_message(&prompt)?;

    let mut printed = 0;
    while updates.changed().await.is_ok() {
        let snapshot = updates.borrow_and_update().clone();

        for message in &snapshot.messages[printed..] {
            match message.role {
                Role::User => {}
                Role::Agent => println!(
                    "[{}] {}",
                    message.agent_name.as_deref().unwrap_or("agent"),
                    message.content
                ),
                Role::Assistant => println!("\n{}", message.content),
            }
        }
        printed = snapshot.messages.len();

        if !snapshot.is_streaming {
            break;
        }
    }

    Ok(())
}
