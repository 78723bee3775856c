//! Message creates decoded straight from the gateway payload.
//!
//! twilight-model 0.11 truncates message flags to the ones it knows, which drops the voice
//! message flag, and has no attachment durations. Message creates are therefore read from the
//! raw dispatch payload instead of the typed event.

use serde::Deserialize;

use crate::models;
use crate::payload::Snowflake;

const MESSAGE_CREATE: &str = "MESSAGE_CREATE";

#[derive(Deserialize)]
struct DispatchKind {
    t: Option<String>,
}

#[derive(Deserialize)]
struct Dispatch<T> {
    d: T,
}

#[derive(Debug, Deserialize)]
pub struct MessageCreate {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub guild_id: Option<Snowflake>,
    pub author: User,
    #[serde(default)]
    pub content: String,
    pub flags: Option<u64>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: Snowflake,
    pub username: String,
    /// Decimal string, `"0"` for migrated accounts.
    #[serde(default)]
    pub discriminator: String,
    #[serde(default)]
    pub bot: bool,
}

#[derive(Debug, Deserialize)]
pub struct Attachment {
    pub id: Snowflake,
    pub filename: String,
    pub url: String,
    pub proxy_url: Option<String>,
    pub content_type: Option<String>,
    pub size: u64,
    pub width: Option<u64>,
    pub height: Option<u64>,
    pub duration: Option<f64>,
    pub duration_secs: Option<f64>,
}

/// Decode the payload if it is a message create dispatch, `None` for any other payload.
pub fn message_create(bytes: &[u8]) -> serde_json::Result<Option<MessageCreate>> {
    let kind: DispatchKind = serde_json::from_slice(bytes)?;
    if kind.t.as_deref() != Some(MESSAGE_CREATE) {
        return Ok(None);
    }

    serde_json::from_slice::<Dispatch<MessageCreate>>(bytes).map(|dispatch| Some(dispatch.d))
}

impl From<MessageCreate> for models::Message {
    fn from(m: MessageCreate) -> Self {
        Self {
            id: m.id.0,
            guild_id: m.guild_id.map(|id| id.0),
            guild_name: None,
            channel_id: m.channel_id.0,
            channel_name: None,
            author: m.author.into(),
            content: m.content,
            flags: m.flags,
            attachments: m.attachments.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<User> for models::Author {
    fn from(u: User) -> Self {
        Self {
            id: u.id.0,
            name: u.username,
            discriminator: u.discriminator.parse().unwrap_or_default(),
            bot: u.bot,
        }
    }
}

impl From<Attachment> for models::Attachment {
    fn from(a: Attachment) -> Self {
        Self {
            id: a.id.0,
            filename: a.filename,
            url: a.url,
            proxy_url: a.proxy_url,
            content_type: a.content_type,
            size: a.size,
            width: a.width,
            height: a.height,
            duration: a.duration,
            duration_secs: a.duration_secs,
        }
    }
}
