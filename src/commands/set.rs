use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

use crate::{
    commands::{
        CommandError,
        command_utils::{parse_integer, uppercase},
    },
    key_value_store::{DataType, KeyValueStore},
    resp::RespValue,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SetCondition {
    Always,
    /// NX
    IfMissing,
    /// XX
    IfExists,
}

/// Represents the parsed arguments for the SET command.
#[derive(Debug, PartialEq)]
pub struct SetArguments {
    /// The key name to write
    key: Bytes,
    /// The value to be stored under the given key
    value: Bytes,
    /// Time to live, from EX or PX
    expiration: Option<Duration>,
    condition: SetCondition,
}

impl SetArguments {
    /// Parses `key value [EX seconds | PX milliseconds] [NX | XX]`.
    ///
    /// Options are case-insensitive and may come in any order. Giving both
    /// EX and PX, or both NX and XX, is a syntax error. Expiry amounts must
    /// be positive integers.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // SET mykey hello PX 1000 NX
    /// let arguments = SetArguments::parse(
    ///     ["mykey", "hello", "PX", "1000", "NX"].map(Bytes::from).to_vec(),
    /// )?;
    /// ```
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        let mut arguments = arguments.into_iter();
        let (Some(key), Some(value)) = (arguments.next(), arguments.next()) else {
            return Err(CommandError::WrongNumberOfArguments("set".to_string()));
        };

        let mut expiration = None;
        let mut condition = SetCondition::Always;

        while let Some(option) = arguments.next() {
            match uppercase(&option).as_str() {
                unit @ ("EX" | "PX") if expiration.is_none() => {
                    let amount = arguments.next().ok_or(CommandError::SyntaxError)?;
                    let amount = parse_integer(&amount)?;

                    if amount <= 0 {
                        return Err(CommandError::InvalidExpireTime("set".to_string()));
                    }

                    expiration = Some(if unit == "EX" {
                        Duration::from_secs(amount as u64)
                    } else {
                        Duration::from_millis(amount as u64)
                    });
                }
                "NX" if condition == SetCondition::Always => condition = SetCondition::IfMissing,
                "XX" if condition == SetCondition::Always => condition = SetCondition::IfExists,
                _ => return Err(CommandError::SyntaxError),
            }
        }

        Ok(Self {
            key,
            value,
            expiration,
            condition,
        })
    }
}

/// Handles the SET command.
///
/// Replaces any previous value, whatever its type, and clears its expiry
/// unless a new one is given. With NX or XX the write is skipped when the
/// condition does not hold and the reply is a null bulk string.
pub fn set(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    let set_arguments = SetArguments::parse(arguments)?;

    let expiration = match set_arguments.expiration {
        Some(ttl) => Some(
            Instant::now()
                .checked_add(ttl)
                .ok_or_else(|| CommandError::InvalidExpireTime("set".to_string()))?,
        ),
        None => None,
    };

    let exists = store.exists(&set_arguments.key);
    let allowed = match set_arguments.condition {
        SetCondition::Always => true,
        SetCondition::IfMissing => !exists,
        SetCondition::IfExists => exists,
    };

    if !allowed {
        return Ok(RespValue::NullBulkString);
    }

    store.set(
        set_arguments.key,
        DataType::String(set_arguments.value),
        expiration,
    );

    Ok(RespValue::ok())
}
