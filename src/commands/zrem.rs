use bytes::Bytes;

use crate::{commands::CommandError, key_value_store::KeyValueStore, resp::RespValue};

/// Handles ZREM, replying with the number of members removed. The key is
/// deleted once its last member is gone.
pub fn zrem(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    let removed = store.remove_from_sorted_set(&arguments[0], &arguments[1..])?;

    Ok(RespValue::Integer(removed as i64))
}
