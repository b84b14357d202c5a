use bytes::Bytes;

use crate::{commands::CommandError, key_value_store::KeyValueStore, resp::RespValue};

/// Handles the LLEN command. A missing key has length 0.
pub fn llen(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    let length = store.get_list(&arguments[0])?.map_or(0, |list| list.len());

    Ok(RespValue::Integer(length as i64))
}
