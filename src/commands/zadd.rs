use bytes::Bytes;

use crate::{
    commands::{CommandError, command_utils::parse_float},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct ZaddArguments {
    key: Bytes,
    members: Vec<(f64, Bytes)>,
}

impl ZaddArguments {
    /// Parses `key score member [score member ...]`. Every score is checked
    /// before anything is written.
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() < 3 || arguments.len() % 2 == 0 {
            return Err(CommandError::SyntaxError);
        }

        let mut arguments = arguments.into_iter();
        let key = arguments.next().unwrap_or_default();

        let mut members = Vec::new();
        while let (Some(score), Some(member)) = (arguments.next(), arguments.next()) {
            members.push((parse_float(&score)?, member));
        }

        Ok(Self { key, members })
    }
}

/// Handles the ZADD command, replying with the number of new members.
/// Existing members get their score updated.
pub fn zadd(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    let zadd_arguments = ZaddArguments::parse(arguments)?;
    let added = store.add_to_sorted_set(&zadd_arguments.key, zadd_arguments.members)?;

    Ok(RespValue::Integer(added as i64))
}
