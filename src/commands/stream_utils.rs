use crate::{
    commands::CommandError,
    key_value_store::{StreamEntry, StreamId},
    resp::RespValue,
};

/// Parses the start of an XRANGE interval.
///
/// `-` is the smallest ID, a bare `<ms>` means `<ms>-0` and a leading `(`
/// makes the bound exclusive.
pub fn parse_range_start(argument: &[u8]) -> Result<Option<StreamId>, CommandError> {
    if argument == b"-" {
        return Ok(Some(StreamId::ZERO));
    }

    if let Some(id) = argument.strip_prefix(b"(") {
        let id = parse_full_or_partial(id, 0)?;
        return Ok(next_id(id));
    }

    parse_full_or_partial(argument, 0).map(Some)
}

/// Parses the end of an XRANGE interval.
///
/// `+` is the greatest ID and a bare `<ms>` covers every sequence of that
/// millisecond.
pub fn parse_range_end(argument: &[u8]) -> Result<Option<StreamId>, CommandError> {
    if argument == b"+" {
        return Ok(Some(StreamId::MAX));
    }

    if let Some(id) = argument.strip_prefix(b"(") {
        let id = parse_full_or_partial(id, u64::MAX)?;
        return Ok(previous_id(id));
    }

    parse_full_or_partial(argument, u64::MAX).map(Some)
}

fn parse_full_or_partial(argument: &[u8], default_sequence: u64) -> Result<StreamId, CommandError> {
    let argument = std::str::from_utf8(argument).map_err(|_| CommandError::InvalidStreamId)?;

    let (milliseconds, sequence) = match argument.split_once('-') {
        Some((milliseconds, sequence)) => (
            milliseconds.parse::<u64>(),
            sequence.parse::<u64>().map_err(|_| CommandError::InvalidStreamId)?,
        ),
        None => (argument.parse::<u64>(), default_sequence),
    };

    let milliseconds = milliseconds.map_err(|_| CommandError::InvalidStreamId)?;

    Ok(StreamId::new(milliseconds, sequence))
}

fn next_id(id: StreamId) -> Option<StreamId> {
    match id.sequence.checked_add(1) {
        Some(sequence) => Some(StreamId::new(id.milliseconds, sequence)),
        None => id
            .milliseconds
            .checked_add(1)
            .map(|milliseconds| StreamId::new(milliseconds, 0)),
    }
}

fn previous_id(id: StreamId) -> Option<StreamId> {
    match id.sequence.checked_sub(1) {
        Some(sequence) => Some(StreamId::new(id.milliseconds, sequence)),
        None => id
            .milliseconds
            .checked_sub(1)
            .map(|milliseconds| StreamId::new(milliseconds, u64::MAX)),
    }
}

/// Converts stream entries to the reply shape shared by XRANGE and XREAD:
/// each entry is `[id, [field1, value1, field2, value2, ...]]`.
pub fn parse_stream_entries_to_resp(entries: Vec<StreamEntry>) -> RespValue {
    RespValue::Array(
        entries
            .into_iter()
            .map(|entry| {
                let fields = entry
                    .fields
                    .into_iter()
                    .flat_map(|(field, value)| [RespValue::BulkString(field), RespValue::BulkString(value)])
                    .collect();

                RespValue::Array(vec![
                    RespValue::bulk_string(entry.id.to_string()),
                    RespValue::Array(fields),
                ])
            })
            .collect(),
    )
}
