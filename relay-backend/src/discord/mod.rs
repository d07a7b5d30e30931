//! Discord gateway integration: connects the bot and wires gateway events to
//! the router and command handler.

pub mod commands;
pub mod handler;

use serenity::Client;
use std::sync::Arc;

use crate::ai::Completer;
use crate::channels::{ActivationStore, MessageRouter};
use crate::config::Config;

pub use handler::DiscordHandler;

/// Connect to Discord and process events until the connection ends.
pub async fn run(
    config: &Config,
    store: Arc<ActivationStore>,
    completer: Arc<dyn Completer>,
) -> Result<(), String> {
    let router = MessageRouter::new(store.clone(), completer);
    let handler = DiscordHandler::new(store, router, config.command_prefix.clone());

    let mut client = Client::builder(&config.discord_bot_token, DiscordHandler::intents())
        .event_handler(handler)
        .await
        .map_err(|e| format!("Failed to create Discord client: {}", e))?;

    log::info!("[Discord] Connecting to gateway");
    client
        .start()
        .await
        .map_err(|e| format!("Discord client error: {}", e))
}
