use bytes::Bytes;

use crate::{commands::CommandError, resp::RespValue};

/// Handles the ECHO command, replying with its single argument as a bulk string.
pub fn echo(arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    let Some(message) = arguments.into_iter().next() else {
        return Err(CommandError::WrongNumberOfArguments("echo".to_string()));
    };

    Ok(RespValue::BulkString(message))
}
