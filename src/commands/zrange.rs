use bytes::Bytes;

use crate::{
    commands::{
        CommandError,
        command_utils::{format_score, parse_integer, uppercase},
    },
    key_value_store::{KeyValueStore, ScoreBound},
    resp::RespValue,
};

/// Only WITHSCORES may follow the range.
fn parse_with_scores(options: &[Bytes]) -> Result<bool, CommandError> {
    match options {
        [] => Ok(false),
        [option] if uppercase(option) == "WITHSCORES" => Ok(true),
        _ => Err(CommandError::SyntaxError),
    }
}

fn members_to_resp(members: Vec<(Bytes, f64)>, with_scores: bool) -> RespValue {
    let mut response = Vec::with_capacity(members.len() * if with_scores { 2 } else { 1 });

    for (member, score) in members {
        response.push(RespValue::BulkString(member));
        if with_scores {
            response.push(RespValue::BulkString(format_score(score)));
        }
    }

    RespValue::Array(response)
}

/// Parses a ZRANGEBYSCORE bound: a float, `-inf`/`+inf`, or `(` for exclusive.
pub fn parse_score_bound(argument: &[u8]) -> Result<ScoreBound, CommandError> {
    let (exclusive, number) = match argument.strip_prefix(b"(") {
        Some(number) => (true, number),
        None => (false, argument),
    };

    let score = std::str::from_utf8(number)
        .ok()
        .and_then(|number| number.parse::<f64>().ok())
        .filter(|score| !score.is_nan())
        .ok_or(CommandError::InvalidScoreRange)?;

    Ok(if exclusive {
        ScoreBound::Exclusive(score)
    } else {
        ScoreBound::Inclusive(score)
    })
}

/// Handles `ZRANGE key start stop [WITHSCORES]`, by rank with negative indices
/// counting from the highest score.
pub fn zrange(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    let start = parse_integer(&arguments[1])?;
    let stop = parse_integer(&arguments[2])?;
    let with_scores = parse_with_scores(&arguments[3..])?;

    let members = store
        .get_sorted_set(&arguments[0])?
        .map(|sorted_set| sorted_set.range_by_rank(start, stop))
        .unwrap_or_default();

    Ok(members_to_resp(members, with_scores))
}

/// Handles `ZRANGEBYSCORE key min max [WITHSCORES]`.
pub fn zrangebyscore(
    store: &mut KeyValueStore,
    arguments: Vec<Bytes>,
) -> Result<RespValue, CommandError> {
    let min = parse_score_bound(&arguments[1])?;
    let max = parse_score_bound(&arguments[2])?;
    let with_scores = parse_with_scores(&arguments[3..])?;

    let members = store
        .get_sorted_set(&arguments[0])?
        .map(|sorted_set| sorted_set.range_by_score(min, max))
        .unwrap_or_default();

    Ok(members_to_resp(members, with_scores))
}
