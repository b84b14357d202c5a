use thiserror::Error;

use crate::{key_value_store::StoreError, resp::RespValue};

/// Errors raised while parsing or running a command.
///
/// The display text is the exact error line sent to the client, so every
/// message starts with its Redis error prefix.
#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("ERR Protocol error: expected a non-empty array of bulk strings")]
    InvalidCommand,
    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),
    #[error("ERR unknown subcommand '{0}'")]
    UnknownSubcommand(String),
    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongNumberOfArguments(String),
    #[error("ERR syntax error")]
    SyntaxError,
    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,
    #[error("ERR value is out of range, must be positive")]
    NotPositive,
    #[error("ERR value is not a valid float")]
    NotAFloat,
    #[error("ERR increment or decrement would overflow")]
    IncrementOverflow,
    #[error("ERR invalid expire time in '{0}' command")]
    InvalidExpireTime(String),
    #[error("ERR timeout is not a float or out of range")]
    InvalidTimeout,
    #[error("ERR timeout is negative")]
    NegativeTimeout,
    #[error("ERR min or max is not a float")]
    InvalidScoreRange,
    #[error("ERR Invalid stream ID specified as stream command argument")]
    InvalidStreamId,
    #[error(
        "ERR Unbalanced 'xread' list of streams: for each stream key an ID or '$' must be specified."
    )]
    UnbalancedXreadStreams,
    #[error("ERR invalid pattern: {0}")]
    InvalidGlobPattern(String),
    #[error(
        "ERR Can't execute '{0}': only (P|S)SUBSCRIBE / (P|S)UNSUBSCRIBE / PING / QUIT / RESET are allowed in this context"
    )]
    NotAllowedWhileSubscribed(String),
    #[error("ERR {0} inside MULTI is not allowed")]
    NotAllowedInTransaction(String),
    #[error("ERR MULTI calls can not be nested")]
    NestedMulti,
    #[error("ERR EXEC without MULTI")]
    ExecWithoutMulti,
    #[error("ERR DISCARD without MULTI")]
    DiscardWithoutMulti,
    #[error("EXECABORT Transaction discarded because of previous errors.")]
    ExecAborted,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CommandError {
    pub fn as_resp(&self) -> RespValue {
        RespValue::Error(self.to_string())
    }
}
