use bytes::Bytes;

use crate::{commands::CommandError, key_value_store::KeyValueStore, resp::RespValue};

pub fn type_command(
    store: &mut KeyValueStore,
    arguments: Vec<Bytes>,
) -> Result<RespValue, CommandError> {
    let type_name = store
        .get(&arguments[0])
        .map_or("none", |value| value.data.type_name());

    Ok(RespValue::SimpleString(type_name.to_string()))
}
