//! Prefix-style text commands (`!channel set #general`, `!help`).

use super::ChannelAction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyCommand {
    Channel {
        action: ChannelAction,
        target: Option<u64>,
    },
    Help,
    /// Recognized command with bad arguments
    Usage(String),
}

/// Parse a text message into a legacy command. Returns `None` when the message
/// does not carry the prefix or names an unknown command.
pub fn parse_legacy_command(content: &str, prefix: &str) -> Option<LegacyCommand> {
    if prefix.is_empty() {
        return None;
    }
    let rest = content.trim().strip_prefix(prefix)?;
    if rest.starts_with(char::is_whitespace) {
        return None;
    }
    let mut parts = rest.split_whitespace();
    let name = parts.next()?.to_lowercase();

    match name.as_str() {
        "help" => Some(LegacyCommand::Help),
        "channel" => {
            let usage = || {
                Some(LegacyCommand::Usage(format!(
                    "❌ Usage: {}channel <set|remove|list> [#channel]",
                    prefix
                )))
            };

            let Some(action) = parts.next().and_then(|a| a.to_lowercase().parse::<ChannelAction>().ok()) else {
                return usage();
            };
            let target = match parts.next() {
                None => None,
                Some(raw) => match parse_channel_ref(raw) {
                    Some(id) => Some(id),
                    None => return usage(),
                },
            };
            Some(LegacyCommand::Channel { action, target })
        }
        _ => None,
    }
}

/// Accepts `<#123>` or a bare `123`
fn parse_channel_ref(raw: &str) -> Option<u64> {
    raw.strip_prefix("<#")
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(raw)
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_help() {
        assert_eq!(parse_legacy_command("!help", "!"), Some(LegacyCommand::Help));
        assert_eq!(parse_legacy_command("  !HELP  ", "!"), Some(LegacyCommand::Help));
    }

    #[test]
    fn test_parse_channel_actions() {
        assert_eq!(
            parse_legacy_command("!channel list", "!"),
            Some(LegacyCommand::Channel { action: ChannelAction::List, target: None })
        );
        assert_eq!(
            parse_legacy_command("!channel set <#123456789012345678>", "!"),
            Some(LegacyCommand::Channel {
                action: ChannelAction::Set,
                target: Some(123456789012345678)
            })
        );
        assert_eq!(
            parse_legacy_command("!channel Remove 42", "!"),
            Some(LegacyCommand::Channel { action: ChannelAction::Remove, target: Some(42) })
        );
    }

    #[test]
    fn test_bad_arguments_give_usage() {
        assert!(matches!(
            parse_legacy_command("!channel", "!"),
            Some(LegacyCommand::Usage(_))
        ));
        assert!(matches!(
            parse_legacy_command("!channel toggle", "!"),
            Some(LegacyCommand::Usage(_))
        ));
        assert!(matches!(
            parse_legacy_command("!channel set #general", "!"),
            Some(LegacyCommand::Usage(_))
        ));
    }

    #[test]
    fn test_not_a_command() {
        assert_eq!(parse_legacy_command("hello", "!"), None);
        assert_eq!(parse_legacy_command("!unknown", "!"), None);
        assert_eq!(parse_legacy_command("!", "!"), None);
        assert_eq!(parse_legacy_command("! help", "!"), None);
        assert_eq!(parse_legacy_command("?help", "!"), None);
        assert_eq!(parse_legacy_command("?help", "?"), Some(LegacyCommand::Help));
    }
}
