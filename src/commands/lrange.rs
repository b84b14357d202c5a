use bytes::Bytes;

use crate::{
    commands::{CommandError, command_utils::parse_integer},
    key_value_store::{KeyValueStore, normalize_range},
    resp::RespValue,
};

pub struct LrangeArguments {
    key: Bytes,
    start: i64,
    stop: i64,
}

impl LrangeArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() != 3 {
            return Err(CommandError::WrongNumberOfArguments("lrange".to_string()));
        }

        Ok(Self {
            start: parse_integer(&arguments[1])?,
            stop: parse_integer(&arguments[2])?,
            key: arguments[0].clone(),
        })
    }
}

/// Handles the LRANGE command.
///
/// Both indices are inclusive. Negative indices count from the tail, so
/// `LRANGE key 0 -1` returns the whole list. Out of range indices are
/// clamped and a missing key reads as an empty list.
pub fn lrange(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    let lrange_arguments = LrangeArguments::parse(arguments)?;

    let Some(list) = store.get_list(&lrange_arguments.key)? else {
        return Ok(RespValue::Array(Vec::new()));
    };

    let Some((start, stop)) = normalize_range(lrange_arguments.start, lrange_arguments.stop, list.len())
    else {
        return Ok(RespValue::Array(Vec::new()));
    };

    Ok(RespValue::array_of_bulk_strings(
        list.range(start..=stop).cloned(),
    ))
}
