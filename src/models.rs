//! Views of the platform objects the relay reports on, independent of the gateway library.
//!
//! Every attribute the platform may withhold (because of intents, privacy settings or a cold
//! cache) is an [`Option`]. What a missing value turns into on the wire is decided by the
//! serializer in [`crate::payload`], not here.

/// Voice message flag of a message (`IS_VOICE_MESSAGE`, bit 13).
pub const VOICE_MESSAGE_FLAG: u64 = 1 << 13;

#[derive(Clone, Debug, Default)]
pub struct Guild {
    pub id: u64,
    pub name: String,
    pub owner_id: Option<u64>,
    pub description: Option<String>,
    pub preferred_locale: Option<String>,
    pub nsfw_level: Option<String>,
    pub verification_level: Option<String>,
    pub premium_tier: Option<String>,
    pub features: Vec<String>,
    /// Only reliable with the privileged members intent.
    pub member_count: Option<u64>,
    pub roles: Option<usize>,
    pub emojis: Option<usize>,
    pub stickers: Option<usize>,
    pub channels: Option<Vec<ChannelKind>>,
    pub threads: Option<usize>,
    pub system_channel_id: Option<u64>,
    pub rules_channel_id: Option<u64>,
    pub public_updates_channel_id: Option<u64>,
    pub afk_channel_id: Option<u64>,
    pub afk_timeout: Option<u64>,
    pub vanity_url_code: Option<String>,
    pub icon: Option<String>,
    pub banner: Option<String>,
    pub splash: Option<String>,
    /// Guild level permission bits of the bot itself.
    pub bot_permissions: Option<u64>,
}

/// Coarse classification of guild channels, as far as the guild snapshot counts them.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChannelKind {
    Category,
    Text,
    Voice,
    Stage,
    Other,
}

#[derive(Clone, Debug)]
pub struct Member {
    pub guild_id: u64,
    pub guild_name: Option<String>,
    pub user: Author,
}

#[derive(Clone, Debug)]
pub struct Author {
    pub id: u64,
    pub name: String,
    pub discriminator: u16,
    pub bot: bool,
}

impl Author {
    /// The `name#1234` form of the user, or the bare name for accounts that were migrated to
    /// unique usernames (discriminator `0`).
    pub fn tag(&self) -> String {
        if self.discriminator == 0 {
            self.name.clone()
        } else {
            format!("{}#{:04}", self.name, self.discriminator)
        }
    }
}

#[derive(Clone, Debug)]
pub struct Message {
    pub id: u64,
    /// `None` for direct messages.
    pub guild_id: Option<u64>,
    pub guild_name: Option<String>,
    pub channel_id: u64,
    pub channel_name: Option<String>,
    pub author: Author,
    pub content: String,
    pub flags: Option<u64>,
    pub attachments: Vec<Attachment>,
}

impl Message {
    pub fn is_voice_message(&self) -> bool {
        self.flags
            .map_or(false, |flags| flags & VOICE_MESSAGE_FLAG != 0)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Attachment {
    pub id: u64,
    pub filename: String,
    pub url: String,
    pub proxy_url: Option<String>,
    pub content_type: Option<String>,
    pub size: u64,
    pub width: Option<u64>,
    pub height: Option<u64>,
    /// Length of a voice message in seconds. Older payloads carry it as `duration_secs`.
    pub duration: Option<f64>,
    pub duration_secs: Option<f64>,
}
