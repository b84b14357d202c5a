use bytes::Bytes;

use crate::{
    commands::{
        CommandError,
        command_utils::{parse_integer, uppercase},
        stream_utils::{parse_range_end, parse_range_start, parse_stream_entries_to_resp},
    },
    key_value_store::{KeyValueStore, StreamId},
    resp::RespValue,
};

pub struct XrangeArguments {
    key: Bytes,
    /// `None` when an exclusive bound leaves nothing to return.
    start: Option<StreamId>,
    end: Option<StreamId>,
    count: Option<usize>,
}

impl XrangeArguments {
    /// Parses `key start end [COUNT n]`.
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() != 3 && arguments.len() != 5 {
            return Err(if arguments.len() < 3 {
                CommandError::WrongNumberOfArguments("xrange".to_string())
            } else {
                CommandError::SyntaxError
            });
        }

        let count = match arguments.get(3) {
            Some(option) if uppercase(option) == "COUNT" => {
                let count = parse_integer(&arguments[4])?;
                Some(count.max(0) as usize)
            }
            Some(_) => return Err(CommandError::SyntaxError),
            None => None,
        };

        Ok(Self {
            start: parse_range_start(&arguments[1])?,
            end: parse_range_end(&arguments[2])?,
            key: arguments[0].clone(),
            count,
        })
    }
}

/// Handles the XRANGE command: entries with `start <= id <= end`, oldest first.
pub fn xrange(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    let xrange_arguments = XrangeArguments::parse(arguments)?;

    let Some(stream) = store.get_stream(&xrange_arguments.key)? else {
        return Ok(RespValue::Array(Vec::new()));
    };

    let (Some(start), Some(end)) = (xrange_arguments.start, xrange_arguments.end) else {
        return Ok(RespValue::Array(Vec::new()));
    };

    Ok(parse_stream_entries_to_resp(stream.range(
        start,
        end,
        xrange_arguments.count,
    )))
}

/// Handles the XLEN command. A missing key has length 0.
pub fn xlen(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    let length = store.get_stream(&arguments[0])?.map_or(0, |stream| stream.len());

    Ok(RespValue::Integer(length as i64))
}
