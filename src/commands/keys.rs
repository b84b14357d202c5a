use bytes::Bytes;
use globset::Glob;

use crate::{commands::CommandError, key_value_store::KeyValueStore, resp::RespValue};

pub struct KeysArguments {
    pub pattern: String,
}

impl KeysArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::WrongNumberOfArguments("keys".to_string()));
        }

        Ok(KeysArguments {
            pattern: String::from_utf8_lossy(&arguments[0]).to_string(),
        })
    }
}

pub fn keys(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    let keys_arguments = KeysArguments::parse(arguments)?;

    let matcher = Glob::new(&keys_arguments.pattern)
        .map_err(|e| CommandError::InvalidGlobPattern(e.to_string()))?
        .compile_matcher();

    Ok(RespValue::array_of_bulk_strings(store.keys(&matcher)))
}

pub fn dbsize(store: &mut KeyValueStore, _arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    store.remove_expired();

    Ok(RespValue::Integer(store.len() as i64))
}
