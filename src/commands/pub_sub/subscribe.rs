use bytes::Bytes;
use tokio::sync::mpsc;

use crate::{blocking::ClientId, pubsub::PubSubHub, resp::RespValue};

fn subscription_reply(kind: &'static str, channel: Option<Bytes>, count: usize) -> RespValue {
    RespValue::Array(vec![
        RespValue::bulk_string(kind),
        channel.map_or(RespValue::NullBulkString, RespValue::BulkString),
        RespValue::Integer(count as i64),
    ])
}

/// Handles `SUBSCRIBE channel [channel ...]`.
///
/// Replies once per channel with `["subscribe", channel, count]`, where
/// `count` is the connection's subscription count after that channel.
/// Subscribing twice to the same channel is a no-op that still replies.
pub fn subscribe(
    client_id: ClientId,
    hub: &mut PubSubHub,
    sender: &mpsc::Sender<RespValue>,
    arguments: Vec<Bytes>,
) -> Vec<RespValue> {
    arguments
        .into_iter()
        .map(|channel| {
            let count = hub.subscribe(client_id, channel.clone(), sender.clone());
            subscription_reply("subscribe", Some(channel), count)
        })
        .collect()
}

/// Handles `UNSUBSCRIBE [channel ...]`; without channels every subscription
/// is dropped. A connection with nothing to leave gets a single
/// `["unsubscribe", nil, 0]`.
pub fn unsubscribe(client_id: ClientId, hub: &mut PubSubHub, arguments: Vec<Bytes>) -> Vec<RespValue> {
    let channels = if arguments.is_empty() {
        hub.channels_of(client_id)
    } else {
        arguments
    };

    if channels.is_empty() {
        return vec![subscription_reply("unsubscribe", None, 0)];
    }

    channels
        .into_iter()
        .map(|channel| {
            let remaining = hub.unsubscribe(client_id, &channel);
            subscription_reply("unsubscribe", Some(channel), remaining)
        })
        .collect()
}
