use bytes::Bytes;

use crate::{
    commands::{CommandError, command_utils::format_score},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

/// Handles ZRANK: the zero-based rank, or a null bulk string for a missing member.
pub fn zrank(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    let rank = store
        .get_sorted_set(&arguments[0])?
        .and_then(|sorted_set| sorted_set.rank(&arguments[1]));

    Ok(match rank {
        Some(rank) => RespValue::Integer(rank as i64),
        None => RespValue::NullBulkString,
    })
}

pub fn zscore(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    let score = store
        .get_sorted_set(&arguments[0])?
        .and_then(|sorted_set| sorted_set.score(&arguments[1]));

    Ok(match score {
        Some(score) => RespValue::BulkString(format_score(score)),
        None => RespValue::NullBulkString,
    })
}

pub fn zcard(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    let cardinality = store
        .get_sorted_set(&arguments[0])?
        .map_or(0, |sorted_set| sorted_set.len());

    Ok(RespValue::Integer(cardinality as i64))
}
