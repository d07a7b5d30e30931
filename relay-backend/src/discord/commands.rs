//! Slash command schemas and conversions between serenity types and
//! [`CommandReply`].

use serenity::all::{
    ChannelType, CommandDataOption, CommandDataOptionValue, CommandOptionType, CreateCommand,
    CreateCommandOption, CreateEmbed, CreateInteractionResponseMessage,
};
use strum::IntoEnumIterator;

use crate::commands::{ChannelAction, CommandReply, HelpCard};

pub const CHANNEL_COMMAND: &str = "channel";
pub const HELP_COMMAND: &str = "help";

/// Commands registered globally at startup
pub fn command_definitions() -> Vec<CreateCommand> {
    let mut action = CreateCommandOption::new(
        CommandOptionType::String,
        "action",
        "What to do (set/remove/list)",
    )
    .required(true);
    for choice in ChannelAction::iter() {
        action = action.add_string_choice(choice.as_ref(), choice.as_ref());
    }

    let channel = CreateCommandOption::new(
        CommandOptionType::Channel,
        "channel",
        "Channel to modify (optional, uses current channel if not specified)",
    )
    .required(false)
    .channel_types(vec![ChannelType::Text]);

    vec![
        CreateCommand::new(CHANNEL_COMMAND)
            .description("Manage channels for auto-replies")
            .add_option(action)
            .add_option(channel),
        CreateCommand::new(HELP_COMMAND).description("Show bot commands and features"),
    ]
}

/// Arguments of a `/channel` invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelArgs {
    pub action: ChannelAction,
    pub target: Option<u64>,
}

/// Read the `action` and `channel` options. The action is a required choice, so
/// a missing or unknown value means the registered schema is out of date.
pub fn parse_channel_options(options: &[CommandDataOption]) -> Result<ChannelArgs, String> {
    let mut action = None;
    let mut target = None;

    for option in options {
        match (option.name.as_str(), &option.value) {
            ("action", CommandDataOptionValue::String(value)) => {
                action = Some(
                    value
                        .parse::<ChannelAction>()
                        .map_err(|_| format!("Unknown action: {}", value))?,
                );
            }
            ("channel", CommandDataOptionValue::Channel(id)) => target = Some(id.get()),
            (name, _) => log::debug!("[Discord] Ignoring unexpected option {}", name),
        }
    }

    let action = action.ok_or_else(|| "Missing action option".to_string())?;
    Ok(ChannelArgs { action, target })
}

pub fn help_embed(card: &HelpCard) -> CreateEmbed {
    card.fields.iter().fold(
        CreateEmbed::new().title(card.title).color(card.color),
        |embed, field| embed.field(field.name, field.value, false),
    )
}

/// Shown only to the invoking user when a slash command cannot be run
pub const BAD_OPTIONS: &str = "❌ Couldn't read that command's options, please try again.";

/// Ephemeral failure notice, so an interaction is always answered
pub fn error_message(text: &str) -> CreateInteractionResponseMessage {
    CreateInteractionResponseMessage::new()
        .content(text)
        .ephemeral(true)
}

pub fn interaction_message(reply: &CommandReply) -> CreateInteractionResponseMessage {
    match reply {
        CommandReply::Text(text) => CreateInteractionResponseMessage::new().content(text.as_str()),
        CommandReply::Help(card) => CreateInteractionResponseMessage::new().embed(help_embed(card)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandHandler;
    use serde_json::json;

    // Options arrive from the gateway as raw JSON; build them the same way.
    fn options(raw: serde_json::Value) -> Vec<CommandDataOption> {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn test_definitions() {
        let commands = command_definitions();
        assert_eq!(commands.len(), 2);
    }

    #[test]
    fn test_parse_action_and_channel() {
        let args = parse_channel_options(&options(json!([
            { "name": "action", "type": 3, "value": "set" },
            { "name": "channel", "type": 7, "value": "100" },
        ])))
        .unwrap();
        assert_eq!(args, ChannelArgs { action: ChannelAction::Set, target: Some(100) });
    }

    #[test]
    fn test_parse_action_only() {
        let args = parse_channel_options(&options(json!([
            { "name": "action", "type": 3, "value": "list" },
        ])))
        .unwrap();
        assert_eq!(args, ChannelArgs { action: ChannelAction::List, target: None });
    }

    #[test]
    fn test_parse_missing_or_unknown_action() {
        assert!(parse_channel_options(&[]).is_err());
        assert!(parse_channel_options(&options(json!([
            { "name": "action", "type": 3, "value": "toggle" },
        ])))
        .is_err());
    }

    #[test]
    fn test_help_embed_serializes_fields() {
        let CommandReply::Help(card) = CommandHandler::help() else {
            panic!("help should return a card");
        };
        let json = serde_json::to_value(help_embed(&card)).unwrap();
        assert_eq!(json["title"], "Discord AI Bot Commands");
        assert_eq!(json["color"], 0x00ff00);
        assert_eq!(json["fields"].as_array().map(|f| f.len()), Some(5));
        assert_eq!(json["fields"][4]["name"], "/help");
    }

    #[test]
    fn test_error_message_is_ephemeral() {
        let json = serde_json::to_value(error_message(BAD_OPTIONS)).unwrap();
        assert_eq!(json["content"], BAD_OPTIONS);
        // EPHEMERAL flag (1 << 6)
        assert_eq!(json["flags"].as_u64().map(|f| f & 64), Some(64));
    }
}
