use std::collections::HashMap;

use bytes::Bytes;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;

use crate::{blocking::ClientId, resp::RespValue};

#[derive(Debug, Clone)]
pub struct Subscriber {
    pub client_id: ClientId,
    pub sender: mpsc::Sender<RespValue>,
}

/// Channel subscriptions of every connection.
///
/// Subscribers are kept in subscription order, which is also the delivery
/// order of a publish.
#[derive(Debug, Default)]
pub struct PubSubHub {
    channels: HashMap<Bytes, Vec<Subscriber>>,
    client_channels: HashMap<ClientId, Vec<Bytes>>,
}

impl PubSubHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the subscription if missing. Returns the client's subscription count.
    pub fn subscribe(
        &mut self,
        client_id: ClientId,
        channel: Bytes,
        sender: mpsc::Sender<RespValue>,
    ) -> usize {
        let client_channels = self.client_channels.entry(client_id).or_default();

        if !client_channels.contains(&channel) {
            client_channels.push(channel.clone());
            self.channels
                .entry(channel)
                .or_default()
                .push(Subscriber { client_id, sender });
        }

        client_channels.len()
    }

    /// Returns the client's remaining subscription count.
    pub fn unsubscribe(&mut self, client_id: ClientId, channel: &[u8]) -> usize {
        if let Some(subscribers) = self.channels.get_mut(channel) {
            subscribers.retain(|subscriber| subscriber.client_id != client_id);

            if subscribers.is_empty() {
                self.channels.remove(channel);
            }
        }

        let Some(client_channels) = self.client_channels.get_mut(&client_id) else {
            return 0;
        };

        client_channels.retain(|subscribed| subscribed.as_ref() != channel);
        let remaining = client_channels.len();

        if remaining == 0 {
            self.client_channels.remove(&client_id);
        }

        remaining
    }

    /// Drops every subscription of the client. Returns the channels it left, in
    /// subscription order.
    pub fn unsubscribe_all(&mut self, client_id: ClientId) -> Vec<Bytes> {
        let channels = self.channels_of(client_id);

        for channel in &channels {
            self.unsubscribe(client_id, channel);
        }

        channels
    }

    /// Queues the message on every subscriber's outbound channel. Returns how
    /// many subscribers accepted it.
    pub fn publish(&self, channel: &Bytes, message: &Bytes) -> usize {
        let Some(subscribers) = self.channels.get(channel) else {
            return 0;
        };

        let payload = RespValue::Array(vec![
            RespValue::bulk_string("message"),
            RespValue::BulkString(channel.clone()),
            RespValue::BulkString(message.clone()),
        ]);

        subscribers
            .iter()
            .filter(|subscriber| match subscriber.sender.try_send(payload.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        client_id = subscriber.client_id,
                        channel = %String::from_utf8_lossy(channel),
                        "subscriber outbound queue full, dropping message"
                    );
                    false
                }
                Err(TrySendError::Closed(_)) => false,
            })
            .count()
    }

    pub fn channels_of(&self, client_id: ClientId) -> Vec<Bytes> {
        self.client_channels
            .get(&client_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn subscription_count(&self, client_id: ClientId) -> usize {
        self.client_channels.get(&client_id).map_or(0, Vec::len)
    }

    pub fn subscriber_count(&self, channel: &[u8]) -> usize {
        self.channels.get(channel).map_or(0, Vec::len)
    }
}
