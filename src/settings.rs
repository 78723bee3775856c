//! Credentials, webhook destinations and logging settings of the relay.

use std::env;
use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use simplelog::LevelFilter;
use tokio::fs;

/// Location of the optional logging configuration.
const LOG_CONFIG: &str = "config/log.toml";

/// Main structure that holds all the settings of the relay.
#[derive(Debug)]
pub struct Settings {
    /// Logger specific configuration.
    pub logging: Logging,
    /// Discord related settings.
    pub discord: Discord,
    /// Where events are delivered to.
    pub webhooks: Webhooks,
}

/// All configuration for the logging of the relay, including different logging backends like a
/// file or the terminal.
#[derive(Debug, Deserialize)]
pub struct Logging {
    /// Logging settings for the terminal backend.
    pub terminal: Option<BaseLogger>,
    /// File backend settings.
    pub file: Option<FileLogger>,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            terminal: Some(BaseLogger {
                filter: LevelFilter::Info,
            }),
            file: None,
        }
    }
}

/// The base logger describes the very basic settings that apply to each logging backend.
#[derive(Debug, Deserialize)]
pub struct BaseLogger {
    /// Maximum logging level that the backend outputs.
    #[serde(with = "SerdeLevelFilter")]
    pub filter: LevelFilter,
}

/// Logging configuration specific to file backends.
#[derive(Debug, Deserialize)]
pub struct FileLogger {
    /// base logging backend configuration.
    #[serde(flatten)]
    pub base: BaseLogger,
    /// Location of the file to write logs to.
    pub path: PathBuf,
}

/// Configuration for the Discord API.
pub struct Discord {
    /// A token to authenticate against the Discord API as a bot and receive gateway events.
    pub bot_token: String,
}

impl fmt::Debug for Discord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Discord")
            .field("bot_token", &"<redacted>")
            .finish()
    }
}

/// Webhook endpoints, selected by event type.
#[derive(Clone, Debug)]
pub struct Webhooks {
    /// Receives `bot_added_to_guild` and `new_bot_member` events.
    pub joined: Url,
    /// Receives `message_create` events and anything without a dedicated endpoint.
    pub message: Url,
}

/// A wrapper for the [LevelFilter] that allows to use it in [serde], as it doesn't provide support
/// for it out of the box.
#[derive(Deserialize)]
#[serde(remote = "LevelFilter", rename_all = "lowercase")]
enum SerdeLevelFilter {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Settings {
    /// Create a new instance of the settings. Logging is configured from the optional
    /// `config/log.toml` file, everything else is taken from the environment.
    pub async fn new() -> Result<Self> {
        let logging = load_toml::<Logging>(LOG_CONFIG).await?.unwrap_or_default();

        Ok(Self {
            logging,
            ..Self::from_lookup(|key| env::var(key).ok())?
        })
    }

    /// Build the settings from any key lookup, with the default logging configuration.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            logging: Logging::default(),
            discord: Discord::from_lookup(&lookup)?,
            webhooks: Webhooks::from_lookup(&lookup)?,
        })
    }
}

impl Discord {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            bot_token: required(&lookup, "DISCORD_TOKEN")?,
        })
    }
}

impl Webhooks {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            joined: required_url(&lookup, "WEBHOOK_URL_JOINED")?,
            message: required_url(&lookup, "WEBHOOK_URL_MESSAGE")?,
        })
    }
}

/// Unset and empty values are both treated as missing.
fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => bail!("{} env var missing", key),
    }
}

fn required_url(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Url> {
    let value = required(lookup, key)?;
    value
        .parse()
        .with_context(|| format!("{} is not a valid URL: '{}'", key, value))
}

/// Load any deserializable structure from the given file path as TOML and provide helpful error
/// messages in case something goes wrong during the process. A missing file yields `None`.
async fn load_toml<T>(path: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    let content = match fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("failed loading config file at '{}'", path))
        }
    };

    toml::from_slice(&content)
        .map(Some)
        .with_context(|| format!("failed to parse TOML config from '{}'", path))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn all_values_present() {
        let vars = lookup(&[
            ("DISCORD_TOKEN", "secret"),
            ("WEBHOOK_URL_JOINED", "https://hooks.example.com/joined"),
            ("WEBHOOK_URL_MESSAGE", "https://hooks.example.com/message"),
        ]);

        let discord = Discord::from_lookup(&vars).unwrap();
        let webhooks = Webhooks::from_lookup(&vars).unwrap();

        assert_eq!("secret", discord.bot_token);
        assert_eq!("https://hooks.example.com/joined", webhooks.joined.as_str());
        assert_eq!("https://hooks.example.com/message", webhooks.message.as_str());
    }

    #[test]
    fn settings_from_lookup() {
        let settings = Settings::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "secret"),
            ("WEBHOOK_URL_JOINED", "https://hooks.example.com/joined"),
            ("WEBHOOK_URL_MESSAGE", "https://hooks.example.com/message"),
        ]))
        .unwrap();

        assert_eq!("secret", settings.discord.bot_token);
        assert_eq!("/joined", settings.webhooks.joined.path());
        assert_eq!("/message", settings.webhooks.message.path());
        assert!(settings.logging.terminal.is_some());
        assert!(settings.logging.file.is_none());

        let err = Settings::from_lookup(lookup(&[("DISCORD_TOKEN", "secret")])).unwrap_err();
        assert!(err.to_string().contains("WEBHOOK_URL_JOINED"));
    }

    #[test]
    fn token_is_redacted() {
        let discord = Discord::from_lookup(lookup(&[("DISCORD_TOKEN", "secret")])).unwrap();
        let debug = format!("{:?}", discord);

        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn missing_values_are_named() {
        let err = Discord::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("DISCORD_TOKEN"));

        let err = Webhooks::from_lookup(lookup(&[(
            "WEBHOOK_URL_JOINED",
            "https://hooks.example.com/joined",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("WEBHOOK_URL_MESSAGE"));
    }

    #[test]
    fn empty_values_count_as_missing() {
        let err = Discord::from_lookup(lookup(&[("DISCORD_TOKEN", "")])).unwrap_err();
        assert!(err.to_string().contains("DISCORD_TOKEN"));
    }

    #[test]
    fn invalid_urls_are_rejected() {
        let err = Webhooks::from_lookup(lookup(&[
            ("WEBHOOK_URL_JOINED", "not a url"),
            ("WEBHOOK_URL_MESSAGE", "https://hooks.example.com/message"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("WEBHOOK_URL_JOINED"));
    }

    #[test]
    fn parse_logging() {
        let logging: Logging = toml::from_str(
            r#"
            [terminal]
            filter = "debug"

            [file]
            filter = "warn"
            path = "hookrelay.log"
            "#,
        )
        .unwrap();

        assert_eq!(LevelFilter::Debug, logging.terminal.unwrap().filter);
        let file = logging.file.unwrap();
        assert_eq!(LevelFilter::Warn, file.base.filter);
        assert_eq!(PathBuf::from("hookrelay.log"), file.path);
    }

    #[tokio::test]
    async fn missing_log_config() {
        let logging = load_toml::<Logging>("config/does-not-exist.toml")
            .await
            .unwrap();
        assert!(logging.is_none());
    }
}
