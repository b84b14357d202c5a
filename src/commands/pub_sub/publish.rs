use bytes::Bytes;

use crate::{pubsub::PubSubHub, resp::RespValue};

/// Handles `PUBLISH channel message`, replying with the number of
/// subscribers the message was queued for.
pub fn publish(hub: &PubSubHub, arguments: Vec<Bytes>) -> RespValue {
    let delivered = hub.publish(&arguments[0], &arguments[1]);

    RespValue::Integer(delivered as i64)
}
