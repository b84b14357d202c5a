use bytes::Bytes;

use crate::{commands::CommandError, key_value_store::KeyValueStore, resp::RespValue};

/// Handles the GET command.
///
/// # Returns
///
/// * `Ok(RespValue::BulkString)` - The stored string
/// * `Ok(RespValue::NullBulkString)` - The key is missing or has expired
/// * `Err(CommandError::Store(StoreError::WrongType))` - The key holds another type
pub fn get(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    let key = &arguments[0];

    Ok(match store.get_string(key)? {
        Some(value) => RespValue::BulkString(value.clone()),
        None => RespValue::NullBulkString,
    })
}
