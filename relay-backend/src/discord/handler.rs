//! Discord event handler for serenity.

use once_cell::sync::OnceCell;
use serenity::all::{
    Cache, ChannelId, Command, CommandInteraction, Context, CreateInteractionResponse,
    CreateMessage, EventHandler, GatewayIntents, Interaction, Message, Ready,
};
use serenity::async_trait;
use std::sync::Arc;

use super::commands::{
    command_definitions, error_message, help_embed, interaction_message, parse_channel_options,
    BAD_OPTIONS, CHANNEL_COMMAND, HELP_COMMAND,
};
use crate::channels::router::is_legacy_command;
use crate::channels::{ActivationStore, InboundMessage, MessageRouter, RouteDecision};
use crate::commands::{
    channel_mention, parse_legacy_command, ChannelResolver, CommandHandler, CommandReply,
};

/// Discord rejects messages longer than this many characters
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Trim a reply so it fits in a single Discord message
pub fn truncate_for_discord(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(MAX_MESSAGE_CHARS - 3).collect();
    out.push_str("...");
    out
}

/// Resolves channel ids from the gateway cache. No REST calls, so a long list
/// of stale ids cannot push a slash command past its response deadline.
pub struct CacheChannelResolver {
    cache: Arc<Cache>,
}

impl CacheChannelResolver {
    pub fn new(cache: Arc<Cache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl ChannelResolver for CacheChannelResolver {
    async fn resolve(&self, channel_id: u64) -> Option<String> {
        if channel_id == 0 {
            return None;
        }
        let resolved = self
            .cache
            .channel(ChannelId::new(channel_id))
            .map(|channel| channel_mention(channel.id.get()));
        if resolved.is_none() {
            log::debug!("[Discord] Channel {} not in cache", channel_id);
        }
        resolved
    }
}

/// Whether the author of a guild message holds Manage Channels there.
/// Direct messages never qualify.
fn author_may_manage(ctx: &Context, msg: &Message) -> bool {
    msg.guild_id.is_some()
        && msg
            .author_permissions(&ctx.cache)
            .is_some_and(|perms| perms.manage_channels())
}

/// Handler for Discord gateway events
pub struct DiscordHandler {
    store: Arc<ActivationStore>,
    router: MessageRouter,
    commands: CommandHandler,
    command_prefix: String,
    bot_user_id: OnceCell<u64>,
}

impl DiscordHandler {
    pub fn new(store: Arc<ActivationStore>, router: MessageRouter, command_prefix: String) -> Self {
        Self {
            commands: CommandHandler::new(store.clone()),
            store,
            router,
            command_prefix,
            bot_user_id: OnceCell::new(),
        }
    }

    /// Required gateway intents for the bot
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
    }

    async fn bot_user_id(&self, ctx: &Context) -> Option<u64> {
        if let Some(id) = self.bot_user_id.get() {
            return Some(*id);
        }
        match ctx.http.get_current_user().await {
            Ok(user) => Some(*self.bot_user_id.get_or_init(|| user.id.get())),
            Err(e) => {
                log::error!("[Discord] Could not determine bot user id: {}", e);
                None
            }
        }
    }

    async fn run_legacy_command(&self, ctx: &Context, msg: &Message) {
        let Some(command) = parse_legacy_command(&msg.content, &self.command_prefix) else {
            return;
        };

        let resolver = CacheChannelResolver::new(ctx.cache.clone());
        let may_manage = author_may_manage(ctx, msg);
        let reply = self
            .commands
            .run_legacy(command, msg.channel_id.get(), may_manage, &resolver)
            .await;

        let builder = match &reply {
            CommandReply::Text(text) => CreateMessage::new().content(text.as_str()),
            CommandReply::Help(card) => CreateMessage::new().embed(help_embed(card)),
        }
        .reference_message(msg);

        if let Err(e) = msg.channel_id.send_message(ctx, builder).await {
            log::error!("[Discord] Failed to answer legacy command: {}", e);
        }
    }

    async fn handle_command(&self, ctx: &Context, command: &CommandInteraction) {
        let reply = match command.data.name.as_str() {
            CHANNEL_COMMAND => match parse_channel_options(&command.data.options) {
                Ok(args) => {
                    let resolver = CacheChannelResolver::new(ctx.cache.clone());
                    self.commands
                        .channel(args.action, args.target, command.channel_id.get(), &resolver)
                        .await
                }
                Err(e) => {
                    log::warn!("[Discord] Bad /channel invocation: {}", e);
                    let response = CreateInteractionResponse::Message(error_message(BAD_OPTIONS));
                    if let Err(e) = command.create_response(ctx, response).await {
                        log::error!("[Discord] Failed to answer bad /channel invocation: {}", e);
                    }
                    return;
                }
            },
            HELP_COMMAND => CommandHandler::help(),
            other => {
                log::warn!("[Discord] Unknown command: {}", other);
                return;
            }
        };

        let response = CreateInteractionResponse::Message(interaction_message(&reply));
        if let Err(e) = command.create_response(ctx, response).await {
            log::error!(
                "[Discord] Failed to respond to /{}: {}",
                command.data.name,
                e
            );
        }
    }
}

/// Guild nickname, then global display name, then username
fn display_name(msg: &Message) -> String {
    msg.member
        .as_ref()
        .and_then(|m| m.nick.clone())
        .or_else(|| msg.author.global_name.clone())
        .unwrap_or_else(|| msg.author.name.clone())
}

fn to_inbound(msg: &Message) -> InboundMessage {
    InboundMessage {
        author_id: msg.author.id.get(),
        author_display_name: display_name(msg),
        content: msg.content.clone(),
        channel_id: msg.channel_id.get(),
        mentions: msg.mentions.iter().map(|u| u.id.get()).collect(),
    }
}

#[async_trait]
impl EventHandler for DiscordHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        let _ = self.bot_user_id.set(ready.user.id.get());
        log::info!("[Discord] {} has connected to Discord!", ready.user.name);

        match Command::set_global_commands(&ctx.http, command_definitions()).await {
            Ok(synced) => log::info!("[Discord] Synced {} command(s)", synced.len()),
            Err(e) => log::error!("[Discord] Failed to sync commands: {}", e),
        }

        if self.store.is_empty() {
            log::info!("[Discord] Active channels: none");
        } else {
            log::info!("[Discord] Active channels: {:?}", self.store.list());
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let Some(bot_id) = self.bot_user_id(&ctx).await else {
            return;
        };
        if msg.author.id.get() == bot_id {
            return;
        }

        // Legacy commands do not stop routing: a command that also mentions
        // the bot still gets an AI reply.
        if is_legacy_command(&msg.content, &self.command_prefix) {
            self.run_legacy_command(&ctx, &msg).await;
        }

        let inbound = to_inbound(&msg);
        let RouteDecision::Reply(reason) = self.router.decide(&inbound, bot_id) else {
            return;
        };

        let typing = msg.channel_id.start_typing(&ctx.http);
        let reply = self.router.respond(&inbound, reason).await;
        typing.stop();

        if let Err(e) = msg.reply(&ctx, truncate_for_discord(&reply)).await {
            log::error!(
                "[Discord] Failed to reply in channel {}: {}",
                inbound.channel_id,
                e
            );
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            log::info!(
                "[Discord] Received slash command /{} from {}",
                command.data.name,
                command.user.name
            );
            self.handle_command(&ctx, &command).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_reply_untouched() {
        assert_eq!(truncate_for_discord("hello"), "hello");
    }

    #[test]
    fn test_long_reply_truncated() {
        let long = "é".repeat(MAX_MESSAGE_CHARS + 50);
        let out = truncate_for_discord(&long);
        assert_eq!(out.chars().count(), MAX_MESSAGE_CHARS);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn test_exact_limit_untouched() {
        let exact = "a".repeat(MAX_MESSAGE_CHARS);
        assert_eq!(truncate_for_discord(&exact), exact);
    }

    #[test]
    fn test_intents_include_message_content() {
        assert!(DiscordHandler::intents().contains(GatewayIntents::MESSAGE_CONTENT));
    }

    #[tokio::test]
    async fn test_cache_resolver_skips_unknown_channels() {
        let resolver = CacheChannelResolver::new(Arc::new(Cache::new()));
        assert_eq!(resolver.resolve(0).await, None);
        assert_eq!(resolver.resolve(123456789012345678).await, None);
    }
}
