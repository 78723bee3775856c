//! Best-effort delivery of event envelopes to the configured webhooks.

use std::time::Duration;

use log::{debug, error};
use reqwest::{StatusCode, Url};
use serde::Serialize;

use crate::events::Envelope;
use crate::settings::Webhooks;

/// Total time a single delivery may take, from connecting until the response body is read.
pub const TIMEOUT: Duration = Duration::from_secs(10);

/// Amount of characters of a rejecting response body that are kept for the logs.
const BODY_PREVIEW: usize = 500;

/// Outcome of a single delivery. It is logged by the dispatcher and only returned for
/// inspection, no caller has to act on it.
#[derive(Debug)]
pub enum Delivery {
    Delivered(StatusCode),
    Rejected { status: StatusCode, body: String },
    Failed(reqwest::Error),
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }
}

#[derive(Clone, Debug)]
pub struct Dispatcher {
    webhooks: Webhooks,
}

#[derive(Serialize)]
struct Body<'a, T: ?Sized> {
    #[serde(rename = "type")]
    kind: &'a str,
    payload: &'a T,
}

impl Dispatcher {
    pub fn new(webhooks: Webhooks) -> Self {
        Self { webhooks }
    }

    /// Destination of the given event type. Unknown types go to the message webhook.
    pub fn resolve(&self, event_type: &str) -> &Url {
        match event_type {
            "bot_added_to_guild" | "new_bot_member" => &self.webhooks.joined,
            "message_create" => &self.webhooks.message,
            _ => &self.webhooks.message,
        }
    }

    pub async fn post(&self, envelope: &Envelope) -> Delivery {
        self.send(envelope.kind(), envelope).await
    }

    /// Wrap an arbitrary payload into an envelope of the given type and deliver it.
    pub async fn post_raw<T>(&self, event_type: &str, payload: &T) -> Delivery
    where
        T: Serialize + ?Sized,
    {
        let body = Body {
            kind: event_type,
            payload,
        };
        self.send(event_type, &body).await
    }

    async fn send<B>(&self, event_type: &str, body: &B) -> Delivery
    where
        B: Serialize + ?Sized,
    {
        let url = self.resolve(event_type);
        let delivery = deliver(url, body).await.unwrap_or_else(Delivery::Failed);

        match &delivery {
            Delivery::Delivered(status) => {
                debug!("Delivered {} to {} ({})", event_type, url, status)
            }
            Delivery::Rejected { status, body } => {
                error!("Webhook {} responded {}: {}", url, status, body)
            }
            Delivery::Failed(e) => {
                error!("Failed sending {} to webhook {}: {:?}", event_type, url, e)
            }
        }

        delivery
    }
}

/// Issue a single POST with a client of its own. The response body is always read to the end,
/// so the connection is released before returning.
async fn deliver<B>(url: &Url, body: &B) -> reqwest::Result<Delivery>
where
    B: Serialize + ?Sized,
{
    let client = reqwest::Client::builder().timeout(TIMEOUT).build()?;
    let response = client.post(url.clone()).json(body).send().await?;

    let status = response.status();
    let text = response.text().await?;

    Ok(if status.as_u16() >= 400 {
        Delivery::Rejected {
            status,
            body: text.chars().take(BODY_PREVIEW).collect(),
        }
    } else {
        Delivery::Delivered(status)
    })
}
