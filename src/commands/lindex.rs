use bytes::Bytes;

use crate::{
    commands::{CommandError, command_utils::parse_integer},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

/// Handles the LINDEX command. `-1` is the last element.
pub fn lindex(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    let index = parse_integer(&arguments[1])?;

    let Some(list) = store.get_list(&arguments[0])? else {
        return Ok(RespValue::NullBulkString);
    };

    let position = if index < 0 {
        list.len() as i64 + index
    } else {
        index
    };

    let element = usize::try_from(position)
        .ok()
        .and_then(|position| list.get(position));

    Ok(match element {
        Some(element) => RespValue::BulkString(element.clone()),
        None => RespValue::NullBulkString,
    })
}
