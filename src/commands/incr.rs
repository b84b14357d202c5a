use bytes::Bytes;

use crate::{
    commands::{CommandError, command_utils::parse_integer},
    key_value_store::{DataType, KeyValueStore},
    resp::RespValue,
};

pub fn incr(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    increment_by(store, &arguments[0], 1)
}

pub fn incrby(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    let delta = parse_integer(&arguments[1])?;

    increment_by(store, &arguments[0], delta)
}

/// Adds `delta` to the integer stored at `key`, treating a missing key as 0.
/// The key keeps its expiry.
fn increment_by(store: &mut KeyValueStore, key: &Bytes, delta: i64) -> Result<RespValue, CommandError> {
    let current = match store.get_string(key)? {
        Some(value) => parse_integer(value)?,
        None => 0,
    };

    let incremented = current
        .checked_add(delta)
        .ok_or(CommandError::IncrementOverflow)?;
    let data = DataType::String(Bytes::from(incremented.to_string()));

    let expiration = store.get(key).and_then(|value| value.expiration);
    store.set(key.clone(), data, expiration);

    Ok(RespValue::Integer(incremented))
}
