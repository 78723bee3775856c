//! Relay of chat platform events to HTTP webhooks.
//!
//! Gateway events are mapped into framework independent [`models`], serialized into flat
//! [`payload`] snapshots, wrapped into an [`events::Envelope`] and posted by the
//! [`webhook::Dispatcher`] to the endpoint selected by the event type.

pub mod commands;
pub mod discord;
pub mod events;
pub mod models;
pub mod payload;
pub mod settings;
pub mod webhook;
