//! Flat, JSON-safe snapshots of platform objects as they are sent to the webhooks.
//!
//! Every snapshot always carries its full key set. Values that are not available turn into
//! `null`, except for collection sizes which fall back to `0`.

use serde::Serialize;

pub use self::snowflake::{iso8601, Snowflake};
use crate::models::{Attachment, ChannelKind, Guild, Member, Message};

mod snowflake;

const CDN: &str = "https://cdn.discordapp.com";

#[derive(Clone, Debug, Serialize)]
pub struct GuildSnapshot {
    pub guild_id: Snowflake,
    pub guild_name: String,
    pub created_at: Option<String>,
    pub owner_id: Option<Snowflake>,
    pub description: Option<String>,
    pub preferred_locale: Option<String>,
    pub nsfw_level: Option<String>,
    pub verification_level: Option<String>,
    pub premium_tier: Option<String>,
    pub features: Vec<String>,
    pub member_count: Option<u64>,
    pub roles_count: usize,
    pub emojis_count: usize,
    pub stickers_count: usize,
    pub channels: ChannelCounts,
    pub system_channel_id: Option<Snowflake>,
    pub rules_channel_id: Option<Snowflake>,
    pub public_updates_channel_id: Option<Snowflake>,
    pub afk_channel_id: Option<Snowflake>,
    pub afk_timeout: Option<u64>,
    pub vanity_url_code: Option<String>,
    pub icon_url: Option<String>,
    pub banner_url: Option<String>,
    pub splash_url: Option<String>,
    pub bot_permissions_value: Option<u64>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ChannelCounts {
    pub total: usize,
    pub categories: usize,
    pub text: usize,
    pub voice: usize,
    pub stage: usize,
    pub threads_active: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct BotJoinSnapshot {
    pub guild_id: Snowflake,
    pub guild_name: Option<String>,
    pub bot_id: Snowflake,
    pub bot_tag: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct MessageSnapshot {
    pub guild_id: Snowflake,
    pub guild_name: Option<String>,
    pub channel_id: Snowflake,
    pub channel_name: Option<String>,
    pub message_id: Snowflake,
    pub author_id: Snowflake,
    pub author_name: String,
    pub author_is_bot: bool,
    pub content: String,
    pub created_at: Option<String>,
    pub is_voice_message: bool,
    pub attachments_count: usize,
    pub attachments: Vec<AttachmentSnapshot>,
}

/// The voice message waveform is left out on purpose, it is large and of no use to the
/// receivers.
#[derive(Clone, Debug, Serialize)]
pub struct AttachmentSnapshot {
    pub id: Snowflake,
    pub filename: String,
    pub url: String,
    pub proxy_url: Option<String>,
    pub content_type: Option<String>,
    pub size: u64,
    pub width: Option<u64>,
    pub height: Option<u64>,
    pub duration_secs: Option<f64>,
}

pub fn guild(guild: &Guild) -> GuildSnapshot {
    let id = Snowflake(guild.id);

    GuildSnapshot {
        guild_id: id,
        guild_name: guild.name.clone(),
        created_at: id.created_at().map(iso8601),
        owner_id: guild.owner_id.map(Snowflake),
        description: guild.description.clone(),
        preferred_locale: guild.preferred_locale.clone(),
        nsfw_level: guild.nsfw_level.clone(),
        verification_level: guild.verification_level.clone(),
        premium_tier: guild.premium_tier.clone(),
        features: guild.features.clone(),
        member_count: guild.member_count,
        roles_count: guild.roles.unwrap_or_default(),
        emojis_count: guild.emojis.unwrap_or_default(),
        stickers_count: guild.stickers.unwrap_or_default(),
        channels: channel_counts(guild.channels.as_deref(), guild.threads),
        system_channel_id: guild.system_channel_id.map(Snowflake),
        rules_channel_id: guild.rules_channel_id.map(Snowflake),
        public_updates_channel_id: guild.public_updates_channel_id.map(Snowflake),
        afk_channel_id: guild.afk_channel_id.map(Snowflake),
        afk_timeout: guild.afk_timeout,
        vanity_url_code: guild.vanity_url_code.clone(),
        icon_url: guild.icon.as_deref().map(|hash| asset_url("icons", id, hash)),
        banner_url: guild.banner.as_deref().map(|hash| asset_url("banners", id, hash)),
        splash_url: guild.splash.as_deref().map(|hash| asset_url("splashes", id, hash)),
        bot_permissions_value: guild.bot_permissions,
    }
}

fn channel_counts(channels: Option<&[ChannelKind]>, threads: Option<usize>) -> ChannelCounts {
    let channels = channels.unwrap_or_default();
    let count = |kind| channels.iter().filter(|&&c| c == kind).count();

    ChannelCounts {
        total: channels.len(),
        categories: count(ChannelKind::Category),
        text: count(ChannelKind::Text),
        voice: count(ChannelKind::Voice),
        stage: count(ChannelKind::Stage),
        threads_active: threads.unwrap_or_default(),
    }
}

/// CDN location of a guild image. Animated images (hash prefixed with `a_`) are served as GIF.
fn asset_url(kind: &str, guild_id: Snowflake, hash: &str) -> String {
    let ext = if hash.starts_with("a_") { "gif" } else { "png" };
    format!("{}/{}/{}/{}.{}", CDN, kind, guild_id, hash, ext)
}

pub fn bot_join(member: &Member) -> BotJoinSnapshot {
    BotJoinSnapshot {
        guild_id: Snowflake(member.guild_id),
        guild_name: member.guild_name.clone(),
        bot_id: Snowflake(member.user.id),
        bot_tag: member.user.tag(),
    }
}

/// Snapshot of a message posted in the given guild.
pub fn message(message: &Message, guild_id: u64) -> MessageSnapshot {
    let attachments: Vec<_> = message.attachments.iter().map(attachment).collect();
    let id = Snowflake(message.id);

    MessageSnapshot {
        guild_id: Snowflake(guild_id),
        guild_name: message.guild_name.clone(),
        channel_id: Snowflake(message.channel_id),
        channel_name: message.channel_name.clone(),
        message_id: id,
        author_id: Snowflake(message.author.id),
        author_name: message.author.tag(),
        author_is_bot: message.author.bot,
        content: message.content.clone(),
        created_at: id.created_at().map(iso8601),
        is_voice_message: message.is_voice_message(),
        attachments_count: attachments.len(),
        attachments,
    }
}

pub fn attachment(attachment: &Attachment) -> AttachmentSnapshot {
    AttachmentSnapshot {
        id: Snowflake(attachment.id),
        filename: attachment.filename.clone(),
        url: attachment.url.clone(),
        proxy_url: attachment.proxy_url.clone(),
        content_type: attachment.content_type.clone(),
        size: attachment.size,
        width: attachment.width,
        height: attachment.height,
        duration_secs: attachment.duration.or(attachment.duration_secs),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::models::Author;

    const GUILD_KEYS: &[&str] = &[
        "guild_id",
        "guild_name",
        "created_at",
        "owner_id",
        "description",
        "preferred_locale",
        "nsfw_level",
        "verification_level",
        "premium_tier",
        "features",
        "member_count",
        "roles_count",
        "emojis_count",
        "stickers_count",
        "channels",
        "system_channel_id",
        "rules_channel_id",
        "public_updates_channel_id",
        "afk_channel_id",
        "afk_timeout",
        "vanity_url_code",
        "icon_url",
        "banner_url",
        "splash_url",
        "bot_permissions_value",
    ];

    fn author() -> Author {
        Author {
            id: 80_351_110_224_678_912,
            name: "Nelly".to_owned(),
            discriminator: 1337,
            bot: false,
        }
    }

    fn bare_guild() -> Guild {
        Guild {
            id: 41_771_983_423_143_937,
            name: "Relay Test".to_owned(),
            ..Guild::default()
        }
    }

    #[test]
    fn bare_guild_has_every_key() {
        let value = serde_json::to_value(guild(&bare_guild())).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(GUILD_KEYS.len(), object.len());
        for key in GUILD_KEYS {
            assert!(object.contains_key(*key), "missing key {}", key);
        }

        assert_eq!(json!("41771983423143937"), value["guild_id"]);
        assert_eq!(Value::Null, value["owner_id"]);
        assert_eq!(Value::Null, value["member_count"]);
        assert_eq!(Value::Null, value["icon_url"]);
        assert_eq!(Value::Null, value["bot_permissions_value"]);
        assert_eq!(json!(0), value["roles_count"]);
        assert_eq!(json!([]), value["features"]);
        assert_eq!(
            json!({
                "total": 0,
                "categories": 0,
                "text": 0,
                "voice": 0,
                "stage": 0,
                "threads_active": 0,
            }),
            value["channels"]
        );
    }

    #[test]
    fn full_guild() {
        let source = Guild {
            owner_id: Some(u64::MAX),
            preferred_locale: Some("en-US".to_owned()),
            nsfw_level: Some("default".to_owned()),
            features: vec!["COMMUNITY".to_owned()],
            member_count: Some(12),
            roles: Some(3),
            channels: Some(vec![
                ChannelKind::Category,
                ChannelKind::Text,
                ChannelKind::Text,
                ChannelKind::Voice,
                ChannelKind::Stage,
                ChannelKind::Other,
            ]),
            threads: Some(2),
            afk_channel_id: Some(7),
            icon: Some("a_1269e74af4df7417b13759eae50c83dc".to_owned()),
            splash: Some("1269e74af4df7417b13759eae50c83dc".to_owned()),
            bot_permissions: Some(8),
            ..bare_guild()
        };

        let snapshot = guild(&source);
        assert_eq!(Some(Snowflake(u64::MAX)), snapshot.owner_id);
        assert_eq!(3, snapshot.roles_count);
        assert_eq!(
            ChannelCounts {
                total: 6,
                categories: 1,
                text: 2,
                voice: 1,
                stage: 1,
                threads_active: 2,
            },
            snapshot.channels
        );
        assert_eq!(
            Some("https://cdn.discordapp.com/icons/41771983423143937/a_1269e74af4df7417b13759eae50c83dc.gif"),
            snapshot.icon_url.as_deref()
        );
        assert_eq!(
            Some("https://cdn.discordapp.com/splashes/41771983423143937/1269e74af4df7417b13759eae50c83dc.png"),
            snapshot.splash_url.as_deref()
        );

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json!("18446744073709551615"), value["owner_id"]);
        assert_eq!(json!("7"), value["afk_channel_id"]);
        assert_eq!(json!(8), value["bot_permissions_value"]);
    }

    #[test]
    fn guild_creation_time() {
        let snapshot = guild(&Guild {
            id: 175_928_847_299_117_063,
            ..bare_guild()
        });
        assert_eq!(
            Some("2016-04-30T11:18:25.796000+00:00"),
            snapshot.created_at.as_deref()
        );
    }

    #[test]
    fn bot_join_snapshot() {
        let member = Member {
            guild_id: 1,
            guild_name: None,
            user: Author {
                bot: true,
                ..author()
            },
        };

        let value = serde_json::to_value(bot_join(&member)).unwrap();
        assert_eq!(
            json!({
                "guild_id": "1",
                "guild_name": null,
                "bot_id": "80351110224678912",
                "bot_tag": "Nelly#1337",
            }),
            value
        );
    }

    #[test]
    fn message_snapshot() {
        let source = Message {
            id: 175_928_847_299_117_063,
            guild_id: Some(2),
            guild_name: Some("Relay Test".to_owned()),
            channel_id: 3,
            channel_name: None,
            author: author(),
            content: "hello".to_owned(),
            flags: None,
            attachments: vec![
                Attachment {
                    id: 10,
                    filename: "a.png".to_owned(),
                    ..Attachment::default()
                },
                Attachment {
                    id: 11,
                    filename: "voice-message.ogg".to_owned(),
                    duration: Some(4.5),
                    ..Attachment::default()
                },
            ],
        };

        let value = serde_json::to_value(message(&source, 2)).unwrap();
        assert_eq!(json!("2"), value["guild_id"]);
        assert_eq!(json!("3"), value["channel_id"]);
        assert_eq!(Value::Null, value["channel_name"]);
        assert_eq!(json!("80351110224678912"), value["author_id"]);
        assert_eq!(json!("Nelly#1337"), value["author_name"]);
        assert_eq!(json!(false), value["author_is_bot"]);
        assert_eq!(json!("2016-04-30T11:18:25.796000+00:00"), value["created_at"]);
        assert_eq!(json!(false), value["is_voice_message"]);
        assert_eq!(json!(2), value["attachments_count"]);
        assert_eq!(json!("10"), value["attachments"][0]["id"]);
        assert_eq!(json!(4.5), value["attachments"][1]["duration_secs"]);
    }

    #[test]
    fn attachment_duration() {
        let mut source = Attachment {
            id: 5,
            filename: "voice-message.ogg".to_owned(),
            url: "https://cdn.discordapp.com/attachments/1/5/voice-message.ogg".to_owned(),
            content_type: Some("audio/ogg".to_owned()),
            size: 2048,
            ..Attachment::default()
        };

        let value = serde_json::to_value(attachment(&source)).unwrap();
        assert_eq!(Value::Null, value["duration_secs"]);
        assert_eq!(Value::Null, value["width"]);
        assert_eq!(Value::Null, value["proxy_url"]);
        assert_eq!(json!("audio/ogg"), value["content_type"]);
        assert_eq!(json!(2048), value["size"]);

        source.duration = Some(3.25);
        assert_eq!(Some(3.25), attachment(&source).duration_secs);

        source.duration = None;
        source.duration_secs = Some(1.5);
        assert_eq!(Some(1.5), attachment(&source).duration_secs);

        source.duration = Some(3.25);
        assert_eq!(Some(3.25), attachment(&source).duration_secs);
    }
}
