use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

use crate::{
    commands::{CommandError, command_utils::parse_integer},
    key_value_store::{KeyValueStore, Ttl},
    resp::RespValue,
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum TimeUnit {
    Seconds,
    Milliseconds,
}

pub fn expire(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    set_expiration(store, arguments, TimeUnit::Seconds)
}

pub fn pexpire(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    set_expiration(store, arguments, TimeUnit::Milliseconds)
}

/// A zero or negative amount deletes the key right away.
fn set_expiration(
    store: &mut KeyValueStore,
    arguments: Vec<Bytes>,
    unit: TimeUnit,
) -> Result<RespValue, CommandError> {
    let amount = parse_integer(&arguments[1])?;
    let command = match unit {
        TimeUnit::Seconds => "expire",
        TimeUnit::Milliseconds => "pexpire",
    };

    let milliseconds = match unit {
        TimeUnit::Seconds => amount.checked_mul(1000),
        TimeUnit::Milliseconds => Some(amount),
    }
    .ok_or_else(|| CommandError::InvalidExpireTime(command.to_string()))?;

    let now = Instant::now();
    let deadline = if milliseconds <= 0 {
        now
    } else {
        now.checked_add(Duration::from_millis(milliseconds as u64))
            .ok_or_else(|| CommandError::InvalidExpireTime(command.to_string()))?
    };

    let updated = store.set_expiration(&arguments[0], deadline);

    Ok(RespValue::Integer(updated as i64))
}

pub fn ttl(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    Ok(RespValue::Integer(match store.ttl(&arguments[0]) {
        Ttl::Missing => -2,
        Ttl::NoExpiry => -1,
        // Rounded to the nearest second.
        Ttl::Remaining(remaining) => ((remaining.as_millis() + 500) / 1000) as i64,
    }))
}

pub fn pttl(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    Ok(RespValue::Integer(match store.ttl(&arguments[0]) {
        Ttl::Missing => -2,
        Ttl::NoExpiry => -1,
        Ttl::Remaining(remaining) => remaining.as_millis() as i64,
    }))
}

pub fn persist(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    Ok(RespValue::Integer(store.persist(&arguments[0]) as i64))
}
