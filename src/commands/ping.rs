use bytes::Bytes;

use crate::{commands::CommandError, resp::RespValue};

pub struct PingArguments {
    message: Option<Bytes>,
}

impl PingArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() > 1 {
            return Err(CommandError::WrongNumberOfArguments("ping".to_string()));
        }

        Ok(Self {
            message: arguments.into_iter().next(),
        })
    }
}

/// Handles the PING command.
///
/// Replies `+PONG`, or echoes the optional message as a bulk string. Once
/// the connection has subscriptions the reply becomes the pub/sub shaped
/// `["pong", message]` array, with an empty message when none was given.
pub fn ping(arguments: Vec<Bytes>, subscribed: bool) -> Result<RespValue, CommandError> {
    let ping_arguments = PingArguments::parse(arguments)?;

    if subscribed {
        return Ok(RespValue::Array(vec![
            RespValue::bulk_string("pong"),
            RespValue::BulkString(ping_arguments.message.unwrap_or_default()),
        ]));
    }

    Ok(match ping_arguments.message {
        Some(message) => RespValue::BulkString(message),
        None => RespValue::SimpleString("PONG".to_string()),
    })
}
