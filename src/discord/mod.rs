use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use log::{debug, info, warn};
use tokio::sync::mpsc::Sender;
use twilight_cache_inmemory::{InMemoryCache, ResourceType};
use twilight_gateway::{
    cluster::{Cluster, Events},
    Event, EventTypeFlags,
};
use twilight_http::Client as HttpClient;
use twilight_model::channel::ChannelType;
use twilight_model::gateway::Intents;
use twilight_model::guild::{Guild, Member, NSFWLevel, PremiumTier, VerificationLevel};
use twilight_model::id::{marker::UserMarker, Id};
use twilight_model::user::User;

use crate::events::{self, Envelope, GuildTracker};
use crate::settings::Discord;
use crate::{commands, models};

mod raw;

/// Connect to the gateway and turn incoming events into envelopes on the given channel. The
/// returned cluster is used to shut the connection down again.
pub async fn start(settings: &Discord, sender: Sender<Envelope>) -> Result<Arc<Cluster>> {
    // Members is a privileged intent, needed for member joins and reliable member counts.
    let intents = Intents::GUILDS
        | Intents::GUILD_MEMBERS
        | Intents::GUILD_MESSAGES
        | Intents::MESSAGE_CONTENT;

    // Message creates are decoded from the raw payload, see `raw`.
    let event_types = EventTypeFlags::all() - EventTypeFlags::MESSAGE_CREATE;

    let (cluster, events) = Cluster::builder(settings.bot_token.clone(), intents)
        .event_types(event_types)
        .build()
        .await
        .context("failed setting up the gateway cluster")?;
    let cluster = Arc::new(cluster);

    debug!("Cluster set up");

    // Start all shards in the cluster in the background.
    let cluster_spawn = Arc::clone(&cluster);
    tokio::spawn(async move {
        debug!("Spawning cluster");
        cluster_spawn.up().await;
    });

    // Guild and channel names are not part of message events, and the bot's permissions are
    // derived from its roles, so those are kept around.
    debug!("Setting up cache for twilight");
    let cache = InMemoryCache::builder()
        .resource_types(
            ResourceType::GUILD
                | ResourceType::CHANNEL
                | ResourceType::ROLE
                | ResourceType::MEMBER,
        )
        .build();

    // Handle Discord events on a separate task.
    tokio::spawn(handle_events(events, cache, sender));

    Ok(cluster)
}

async fn handle_events(mut events: Events, cache: InMemoryCache, sender: Sender<Envelope>) {
    let mut guilds = GuildTracker::default();
    let mut current_user = None;

    while let Some((shard_id, event)) = events.next().await {
        debug!("{} | Received event : {:?}", shard_id, event.kind());
        cache.update(&event);

        let mut command = None;
        let envelope = match &event {
            Event::Ready(ready) => {
                let user = models::Author {
                    id: ready.user.id.get(),
                    name: ready.user.name.clone(),
                    discriminator: ready.user.discriminator,
                    bot: ready.user.bot,
                };
                info!("Connected on shard {} as {} ({})", shard_id, user.tag(), user.id);
                current_user = Some(ready.user.id);
                guilds.ready(ready.guilds.iter().map(|guild| guild.id.get()));
                None
            }
            Event::GuildCreate(guild) if guilds.created(guild.0.id.get()) => {
                info!("Added to guild {} ({})", guild.0.name, guild.0.id);
                let guild = guild_view(&guild.0, &cache, current_user);
                Some(events::on_guild_join(&guild))
            }
            Event::GuildDelete(guild) => {
                guilds.deleted(guild.id.get(), guild.unavailable);
                None
            }
            Event::MemberAdd(member) => events::on_member_join(&member_view(&member.0, &cache)),
            Event::ShardPayload(payload) => match raw::message_create(&payload.bytes) {
                Ok(Some(message)) => {
                    let message = message_view(message, &cache);
                    let envelope = events::on_message(&message);
                    command = envelope.as_ref().map(|_| message);
                    envelope
                }
                Ok(None) => None,
                Err(e) => {
                    warn!("{} | Failed decoding gateway payload: {}", shard_id, e);
                    None
                }
            },
            _ => None,
        };

        if let Some(envelope) = envelope {
            if sender.send(envelope).await.is_err() {
                debug!("Envelope receiver gone, stopping event handling");
                return;
            }
        }

        if let Some(message) = command {
            commands::process(&message);
        }
    }

    debug!("Gateway event stream ended");
}

pub fn new_client(settings: &Discord) -> HttpClient {
    HttpClient::new(settings.bot_token.clone())
}

fn guild_view(
    guild: &Guild,
    cache: &InMemoryCache,
    current_user: Option<Id<UserMarker>>,
) -> models::Guild {
    let bot_permissions = current_user
        .and_then(|user_id| cache.permissions().root(user_id, guild.id).ok())
        .map(|permissions| permissions.bits());

    models::Guild {
        id: guild.id.get(),
        name: guild.name.clone(),
        owner_id: Some(guild.owner_id.get()),
        description: guild.description.clone(),
        preferred_locale: Some(guild.preferred_locale.clone()),
        nsfw_level: nsfw_level_name(guild.nsfw_level).map(str::to_owned),
        verification_level: verification_level_name(guild.verification_level)
            .map(str::to_owned),
        premium_tier: premium_tier_name(guild.premium_tier).map(str::to_owned),
        features: guild.features.clone(),
        member_count: guild.member_count,
        roles: Some(guild.roles.len()),
        emojis: Some(guild.emojis.len()),
        stickers: Some(guild.stickers.len()),
        channels: Some(
            guild
                .channels
                .iter()
                .map(|channel| channel_kind(channel.kind))
                .collect(),
        ),
        threads: Some(guild.threads.len()),
        system_channel_id: guild.system_channel_id.map(Id::get),
        rules_channel_id: guild.rules_channel_id.map(Id::get),
        // Not exposed by twilight-model 0.11.
        public_updates_channel_id: None,
        afk_channel_id: guild.afk_channel_id.map(Id::get),
        afk_timeout: Some(guild.afk_timeout),
        vanity_url_code: guild.vanity_url_code.clone(),
        icon: guild.icon.as_ref().map(ToString::to_string),
        banner: guild.banner.as_ref().map(ToString::to_string),
        splash: guild.splash.as_ref().map(ToString::to_string),
        bot_permissions,
    }
}

fn channel_kind(kind: ChannelType) -> models::ChannelKind {
    match kind {
        ChannelType::GuildCategory => models::ChannelKind::Category,
        ChannelType::GuildText | ChannelType::GuildNews => models::ChannelKind::Text,
        ChannelType::GuildVoice => models::ChannelKind::Voice,
        ChannelType::GuildStageVoice => models::ChannelKind::Stage,
        _ => models::ChannelKind::Other,
    }
}

#[allow(unreachable_patterns)]
fn nsfw_level_name(level: NSFWLevel) -> Option<&'static str> {
    Some(match level {
        NSFWLevel::Default => "default",
        NSFWLevel::Explicit => "explicit",
        NSFWLevel::Safe => "safe",
        NSFWLevel::AgeRestricted => "age_restricted",
        _ => return None,
    })
}

#[allow(unreachable_patterns)]
fn verification_level_name(level: VerificationLevel) -> Option<&'static str> {
    Some(match level {
        VerificationLevel::None => "none",
        VerificationLevel::Low => "low",
        VerificationLevel::Medium => "medium",
        VerificationLevel::High => "high",
        VerificationLevel::VeryHigh => "highest",
        _ => return None,
    })
}

#[allow(unreachable_patterns)]
fn premium_tier_name(tier: PremiumTier) -> Option<&'static str> {
    Some(match tier {
        PremiumTier::None => "none",
        PremiumTier::Tier1 => "tier_1",
        PremiumTier::Tier2 => "tier_2",
        PremiumTier::Tier3 => "tier_3",
        _ => return None,
    })
}

fn member_view(member: &Member, cache: &InMemoryCache) -> models::Member {
    models::Member {
        guild_id: member.guild_id.get(),
        guild_name: cache
            .guild(member.guild_id)
            .map(|guild| guild.name().to_owned()),
        user: (&member.user).into(),
    }
}

fn message_view(message: raw::MessageCreate, cache: &InMemoryCache) -> models::Message {
    let mut view = models::Message::from(message);

    view.guild_name = view
        .guild_id
        .and_then(Id::new_checked)
        .and_then(|id| cache.guild(id))
        .map(|guild| guild.name().to_owned());
    view.channel_name = Id::new_checked(view.channel_id)
        .and_then(|id| cache.channel(id))
        .and_then(|channel| channel.name.clone());

    view
}

impl From<&User> for models::Author {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.get(),
            name: u.name.clone(),
            discriminator: u.discriminator,
            bot: u.bot,
        }
    }
}
