use bytes::Bytes;

use crate::{
    blocking::ListSide, commands::CommandError, key_value_store::KeyValueStore, resp::RespValue,
};

pub struct PushArrayOperations {
    key: Bytes,
    values: Vec<Bytes>,
}

impl PushArrayOperations {
    pub fn parse(arguments: Vec<Bytes>, side: ListSide) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            let command = match side {
                ListSide::Left => "lpush",
                ListSide::Right => "rpush",
            };
            return Err(CommandError::WrongNumberOfArguments(command.to_string()));
        }

        let mut arguments = arguments.into_iter();

        Ok(Self {
            key: arguments.next().unwrap_or_default(),
            values: arguments.collect(),
        })
    }
}

pub fn rpush(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    push_array_operations(store, arguments, ListSide::Right)
}

/// Elements are prepended one at a time, so `LPUSH key a b c` leaves `c b a`.
pub fn lpush(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    push_array_operations(store, arguments, ListSide::Left)
}

fn push_array_operations(
    store: &mut KeyValueStore,
    arguments: Vec<Bytes>,
    side: ListSide,
) -> Result<RespValue, CommandError> {
    let push_array_arguments = PushArrayOperations::parse(arguments, side)?;

    let length = store.push_to_list(
        &push_array_arguments.key,
        push_array_arguments.values,
        side,
    )?;

    Ok(RespValue::Integer(length as i64))
}
