//! Hand-off of guild messages to command processing.
//!
//! No commands are registered, so prefixed messages are only recognized and logged.

use log::debug;

use crate::models::Message;

pub const PREFIX: &str = "!";

/// Name of the command a message invokes, if it starts with the command prefix.
pub fn parse(content: &str) -> Option<&str> {
    content
        .strip_prefix(PREFIX)?
        .split(char::is_whitespace)
        .next()
        .filter(|name| !name.is_empty())
}

pub fn process(message: &Message) {
    if let Some(name) = parse(&message.content) {
        debug!(
            "No command `{}` registered (requested by {} in {})",
            name, message.author.id, message.channel_id
        );
    }
}
