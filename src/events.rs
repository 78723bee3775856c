//! Reactions to single platform events, each one producing at most one [`Envelope`].

use std::collections::HashSet;

use serde::Serialize;

use crate::models::{Guild, Member, Message};
use crate::payload::{self, BotJoinSnapshot, GuildSnapshot, MessageSnapshot};

/// Everything that is sent to a webhook, serialized as `{"type": ..., "payload": ...}`.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Envelope {
    BotAddedToGuild(GuildSnapshot),
    NewBotMember(BotJoinSnapshot),
    MessageCreate(MessageSnapshot),
}

impl Envelope {
    /// The value of the `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BotAddedToGuild(_) => "bot_added_to_guild",
            Self::NewBotMember(_) => "new_bot_member",
            Self::MessageCreate(_) => "message_create",
        }
    }
}

pub fn on_guild_join(guild: &Guild) -> Envelope {
    Envelope::BotAddedToGuild(payload::guild(guild))
}

/// Only bots joining a guild are reported.
pub fn on_member_join(member: &Member) -> Option<Envelope> {
    member
        .user
        .bot
        .then(|| Envelope::NewBotMember(payload::bot_join(member)))
}

/// Direct messages are ignored.
pub fn on_message(message: &Message) -> Option<Envelope> {
    let guild_id = message.guild_id?;
    Some(Envelope::MessageCreate(payload::message(message, guild_id)))
}

/// Tells guilds the bot was just added to apart from guilds the gateway merely (re)announces.
///
/// The gateway sends a guild create event for every guild listed in the ready event and for
/// guilds recovering from an outage. Only guilds that were never seen before, or that the bot
/// was removed from in the meantime, count as joined.
#[derive(Debug, Default)]
pub struct GuildTracker {
    known: HashSet<u64>,
}

impl GuildTracker {
    pub fn ready(&mut self, guilds: impl IntoIterator<Item = u64>) {
        self.known.extend(guilds);
    }

    /// Record a guild create event, returning whether the bot newly joined the guild.
    pub fn created(&mut self, guild_id: u64) -> bool {
        self.known.insert(guild_id)
    }

    /// Record a guild delete event. Guilds that merely became unavailable stay known.
    pub fn deleted(&mut self, guild_id: u64, unavailable: bool) {
        if !unavailable {
            self.known.remove(&guild_id);
        }
    }
}
