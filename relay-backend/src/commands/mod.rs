//! Administrative commands: `channel {set, remove, list}` and `help`.
//!
//! Replies are platform-neutral (`CommandReply`) so the slash-command and the
//! legacy prefix surfaces share one implementation.

pub mod legacy;

use async_trait::async_trait;
use std::sync::Arc;
use strum::{AsRefStr, EnumIter, EnumString};

use crate::channels::ActivationStore;

pub use legacy::{parse_legacy_command, LegacyCommand};

/// Sub-actions of the `channel` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ChannelAction {
    Set,
    Remove,
    List,
}

/// Resolves a stored channel id to something displayable. `None` means the
/// channel no longer exists (or is not visible to the bot).
#[async_trait]
pub trait ChannelResolver: Send + Sync {
    async fn resolve(&self, channel_id: u64) -> Option<String>;
}

/// Discord's mention syntax for a channel
pub fn channel_mention(channel_id: u64) -> String {
    format!("<#{}>", channel_id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpField {
    pub name: &'static str,
    pub value: &'static str,
}

/// Fixed, structured summary of the bot's commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpCard {
    pub title: &'static str,
    pub color: u32,
    pub fields: Vec<HelpField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReply {
    Text(String),
    Help(HelpCard),
}

pub const NO_ACTIVE_CHANNELS: &str = "📋 No active channels set.";
pub const SAVE_FAILED: &str = "❌ Failed to save active channels, please try again.";
pub const MANAGE_DENIED: &str = "❌ You need the Manage Channels permission to change active channels.";

pub struct CommandHandler {
    store: Arc<ActivationStore>,
}

impl CommandHandler {
    pub fn new(store: Arc<ActivationStore>) -> Self {
        Self { store }
    }

    /// Run a `channel` sub-action. `target` defaults to `invoked_in`.
    pub async fn channel(
        &self,
        action: ChannelAction,
        target: Option<u64>,
        invoked_in: u64,
        resolver: &dyn ChannelResolver,
    ) -> CommandReply {
        let channel_id = target.unwrap_or(invoked_in);
        log::info!(
            "[Commands] channel {} (target {})",
            action.as_ref(),
            channel_id
        );

        let text = match action {
            ChannelAction::Set => self.set(channel_id),
            ChannelAction::Remove => self.remove(channel_id),
            ChannelAction::List => self.list(resolver).await,
        };
        CommandReply::Text(text)
    }

    fn set(&self, channel_id: u64) -> String {
        let mention = channel_mention(channel_id);
        match self.store.add(channel_id) {
            Ok(true) => format!("✅ Bot will now reply to all messages in {}", mention),
            Ok(false) => format!("❌ Bot is already active in {}", mention),
            Err(e) => {
                log::error!("[Commands] Failed to activate {}: {}", channel_id, e);
                SAVE_FAILED.to_string()
            }
        }
    }

    fn remove(&self, channel_id: u64) -> String {
        let mention = channel_mention(channel_id);
        match self.store.remove(channel_id) {
            Ok(true) => format!("✅ Bot will no longer reply to messages in {}", mention),
            Ok(false) => format!("❌ Bot is not active in {}", mention),
            Err(e) => {
                log::error!("[Commands] Failed to deactivate {}: {}", channel_id, e);
                SAVE_FAILED.to_string()
            }
        }
    }

    // Unresolvable ids are left in the store, only hidden from the listing.
    async fn list(&self, resolver: &dyn ChannelResolver) -> String {
        let ids = self.store.list();
        if ids.is_empty() {
            return NO_ACTIVE_CHANNELS.to_string();
        }

        let mut mentions = Vec::with_capacity(ids.len());
        for id in ids {
            match resolver.resolve(id).await {
                Some(mention) => mentions.push(mention),
                None => log::debug!("[Commands] Skipping unresolvable channel {}", id),
            }
        }
        format!("📋 Active channels: {}", mentions.join(", "))
    }

    pub fn help() -> CommandReply {
        CommandReply::Help(HelpCard {
            title: "Discord AI Bot Commands",
            color: 0x00ff00,
            fields: vec![
                HelpField {
                    name: "/channel set [channel]",
                    value: "Make bot reply to all messages in specified channel (or current channel if none specified)",
                },
                HelpField {
                    name: "/channel remove [channel]",
                    value: "Stop bot from replying to all messages in specified channel",
                },
                HelpField {
                    name: "/channel list",
                    value: "Show all active channels",
                },
                HelpField {
                    name: "@mention",
                    value: "Mention the bot anywhere to get a response",
                },
                HelpField {
                    name: "/help",
                    value: "Show this help message",
                },
            ],
        })
    }

    /// Answer a parsed legacy text command.
    ///
    /// Text commands bypass Discord's per-command permissions, so changing the
    /// active set requires `may_manage` (Manage Channels in the guild).
    pub async fn run_legacy(
        &self,
        command: LegacyCommand,
        invoked_in: u64,
        may_manage: bool,
        resolver: &dyn ChannelResolver,
    ) -> CommandReply {
        match command {
            LegacyCommand::Channel { action, target } => {
                if action != ChannelAction::List && !may_manage {
                    log::warn!(
                        "[Commands] Rejected legacy channel {} without Manage Channels",
                        action.as_ref()
                    );
                    return CommandReply::Text(MANAGE_DENIED.to_string());
                }
                self.channel(action, target, invoked_in, resolver).await
            }
            LegacyCommand::Help => Self::help(),
            LegacyCommand::Usage(usage) => CommandReply::Text(usage),
        }
    }
}
