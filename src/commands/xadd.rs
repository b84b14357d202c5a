use bytes::Bytes;

use crate::{
    commands::CommandError,
    key_value_store::{KeyValueStore, StreamIdRequest, stream::get_timestamp_in_milliseconds},
    resp::RespValue,
};

pub struct XaddArguments {
    key: Bytes,
    id: StreamIdRequest,
    fields: Vec<(Bytes, Bytes)>,
}

impl XaddArguments {
    /// Parses `key id field value [field value ...]`.
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() < 4 || arguments.len() % 2 != 0 {
            return Err(CommandError::WrongNumberOfArguments("xadd".to_string()));
        }

        let mut arguments = arguments.into_iter();
        let key = arguments.next().unwrap_or_default();
        let id = arguments
            .next()
            .as_deref()
            .and_then(StreamIdRequest::parse)
            .ok_or(CommandError::InvalidStreamId)?;

        let mut fields = Vec::new();
        while let (Some(field), Some(value)) = (arguments.next(), arguments.next()) {
            fields.push((field, value));
        }

        Ok(Self { key, id, fields })
    }
}

/// Handles the XADD command.
///
/// The ID may be `*` (wall clock milliseconds), `<ms>-*` (next free
/// sequence) or explicit. It must end up strictly greater than the last ID
/// of the stream and never `0-0`. Replies with the assigned ID.
pub fn xadd(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    let xadd_arguments = XaddArguments::parse(arguments)?;
    let now_ms = get_timestamp_in_milliseconds().unwrap_or_default();

    let id = store.append_to_stream(
        &xadd_arguments.key,
        xadd_arguments.id,
        xadd_arguments.fields,
        now_ms,
    )?;

    Ok(RespValue::bulk_string(id.to_string()))
}
