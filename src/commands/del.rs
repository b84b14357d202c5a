use bytes::Bytes;

use crate::{commands::CommandError, key_value_store::KeyValueStore, resp::RespValue};

/// Handles DEL, replying with the number of keys that were removed.
pub fn del(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    let removed = arguments.iter().filter(|key| store.delete(key)).count();

    Ok(RespValue::Integer(removed as i64))
}

/// Handles EXISTS. A key named several times is counted several times.
pub fn exists(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    let existing = arguments.iter().filter(|key| store.exists(key)).count();

    Ok(RespValue::Integer(existing as i64))
}
