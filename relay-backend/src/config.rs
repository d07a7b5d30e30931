use std::env;
use std::path::PathBuf;

/// Environment variable names - single source of truth
pub mod env_vars {
    /// API key for the completion provider (required)
    pub const GROQ_API_KEY: &str = "GROQ_API_KEY";
    /// Discord bot token (required)
    pub const DISCORD_BOT_TOKEN: &str = "DISCORD_BOT_TOKEN";
    /// Base URL of an OpenAI-compatible chat completions API
    pub const COMPLETION_API_URL: &str = "COMPLETION_API_URL";
    pub const COMPLETION_MODEL: &str = "COMPLETION_MODEL";
    /// Where the active channel list is persisted
    pub const ACTIVE_CHANNELS_FILE: &str = "ACTIVE_CHANNELS_FILE";
    /// Prefix for legacy text commands (e.g. "!help")
    pub const COMMAND_PREFIX: &str = "COMMAND_PREFIX";
}

/// Default values
pub mod defaults {
    pub const COMPLETION_API_URL: &str = "https://api.groq.com/openai/v1";
    pub const COMPLETION_MODEL: &str = "llama3-8b-8192";
    pub const ACTIVE_CHANNELS_FILE: &str = "active_channels.json";
    pub const COMMAND_PREFIX: &str = "!";
    pub const MAX_TOKENS: u32 = 500;
    pub const TEMPERATURE: f32 = 0.7;
}

#[derive(Clone)]
pub struct Config {
    pub groq_api_key: String,
    pub discord_bot_token: String,
    pub completion_api_url: String,
    pub completion_model: String,
    pub active_channels_file: PathBuf,
    pub command_prefix: String,
}

// Hand-written so credentials never end up in logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("completion_api_url", &self.completion_api_url)
            .field("completion_model", &self.completion_model)
            .field("active_channels_file", &self.active_channels_file)
            .field("command_prefix", &self.command_prefix)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Build the config from the process environment.
    ///
    /// Both credentials are required; a missing or blank value is an error so the
    /// process can stop before it opens a half-configured gateway connection.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| format!("{} must be set", key))
        };
        let optional = |key: &str, default: &str| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            groq_api_key: required(env_vars::GROQ_API_KEY)?,
            discord_bot_token: required(env_vars::DISCORD_BOT_TOKEN)?,
            completion_api_url: optional(env_vars::COMPLETION_API_URL, defaults::COMPLETION_API_URL)
                .trim_end_matches('/')
                .to_string(),
            completion_model: optional(env_vars::COMPLETION_MODEL, defaults::COMPLETION_MODEL),
            active_channels_file: PathBuf::from(optional(
                env_vars::ACTIVE_CHANNELS_FILE,
                defaults::ACTIVE_CHANNELS_FILE,
            )),
            command_prefix: optional(env_vars::COMMAND_PREFIX, defaults::COMMAND_PREFIX),
        })
    }
}
