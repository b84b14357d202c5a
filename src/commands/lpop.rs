use bytes::Bytes;

use crate::{
    blocking::ListSide,
    commands::{CommandError, command_utils::parse_integer},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct PopArguments {
    key: Bytes,
    count: Option<usize>,
}

impl PopArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        let mut arguments = arguments.into_iter();
        let key = arguments.next().unwrap_or_default();

        let count = match arguments.next() {
            Some(count) => {
                let count = parse_integer(&count)?;
                if count < 0 {
                    return Err(CommandError::NotPositive);
                }
                Some(count as usize)
            }
            None => None,
        };

        if arguments.next().is_some() {
            return Err(CommandError::SyntaxError);
        }

        Ok(Self { key, count })
    }
}

/// Handles the LPOP command.
///
/// Without a count, replies with the popped element or a null bulk string.
/// With a count, replies with an array of up to `count` elements, or a null
/// array when the key does not exist.
pub fn lpop(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    pop(store, arguments, ListSide::Left)
}

/// Handles the RPOP command, the tail-side twin of [`lpop`].
pub fn rpop(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    pop(store, arguments, ListSide::Right)
}

fn pop(
    store: &mut KeyValueStore,
    arguments: Vec<Bytes>,
    side: ListSide,
) -> Result<RespValue, CommandError> {
    let pop_arguments = PopArguments::parse(arguments)?;

    match pop_arguments.count {
        None => {
            let popped = store.pop_from_list(&pop_arguments.key, 1, side)?;

            Ok(match popped.into_iter().next() {
                Some(element) => RespValue::BulkString(element),
                None => RespValue::NullBulkString,
            })
        }
        Some(count) => {
            if !store.exists(&pop_arguments.key) {
                // Still reports WRONGTYPE for non-list keys.
                store.get_list(&pop_arguments.key)?;
                return Ok(RespValue::NullArray);
            }

            let popped = store.pop_from_list(&pop_arguments.key, count, side)?;

            Ok(RespValue::array_of_bulk_strings(popped))
        }
    }
}
