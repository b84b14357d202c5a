use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use tokio::{sync::Mutex, time::Instant};

use crate::{
    blocking::{ClientId, ListSide, WaitKind, Wakeup, wait_for_wakeup},
    commands::CommandError,
    key_value_store::KeyValueStore,
    resp::RespValue,
};

/// Represents the parsed arguments for BLPOP and BRPOP.
#[derive(Debug, PartialEq)]
pub struct BlpopArguments {
    /// Keys checked in order; the first non-empty list wins.
    keys: Vec<Bytes>,
    /// `None` blocks forever.
    timeout: Option<Duration>,
}

impl BlpopArguments {
    /// Parses `key [key ...] timeout`, with the timeout in (fractional) seconds.
    pub fn parse(mut arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        let Some(timeout) = arguments.pop() else {
            return Err(CommandError::WrongNumberOfArguments("blpop".to_string()));
        };

        if arguments.is_empty() {
            return Err(CommandError::WrongNumberOfArguments("blpop".to_string()));
        }

        let seconds = std::str::from_utf8(&timeout)
            .ok()
            .and_then(|timeout| timeout.parse::<f64>().ok())
            .filter(|seconds| seconds.is_finite())
            .ok_or(CommandError::InvalidTimeout)?;

        if seconds < 0.0 {
            return Err(CommandError::NegativeTimeout);
        }

        let timeout = if seconds == 0.0 {
            None
        } else {
            Some(Duration::try_from_secs_f64(seconds).map_err(|_| CommandError::InvalidTimeout)?)
        };

        Ok(Self {
            keys: arguments,
            timeout,
        })
    }
}

fn pop_command(side: ListSide) -> &'static str {
    match side {
        ListSide::Left => "LPOP",
        ListSide::Right => "RPOP",
    }
}

/// Pops from the first key holding a non-empty list.
fn pop_first_available(
    store: &mut KeyValueStore,
    keys: &[Bytes],
    side: ListSide,
) -> Result<Option<(Bytes, Bytes)>, CommandError> {
    for key in keys {
        if let Some(element) = store.pop_from_list(key, 1, side)?.into_iter().next() {
            store.record_mutation(vec![Bytes::from_static(pop_command(side).as_bytes()), key.clone()]);
            return Ok(Some((key.clone(), element)));
        }
    }

    Ok(None)
}

/// BLPOP/BRPOP without blocking, as run inside EXEC: a null array when
/// every list is empty.
pub fn pop_immediately(
    store: &mut KeyValueStore,
    arguments: Vec<Bytes>,
    side: ListSide,
) -> Result<RespValue, CommandError> {
    let blpop_arguments = BlpopArguments::parse(arguments)?;

    Ok(
        match pop_first_available(store, &blpop_arguments.keys, side)? {
            Some((key, element)) => RespValue::Array(vec![
                RespValue::BulkString(key),
                RespValue::BulkString(element),
            ]),
            None => RespValue::NullArray,
        },
    )
}

/// Handles BLPOP (left side) and BRPOP (right side).
///
/// If one of the lists has an element it is popped right away. Otherwise the
/// client is parked on every key and served first come first served as
/// soon as an element is pushed; the element is removed on its behalf while
/// the pusher still holds the store lock, so two clients never race for it.
///
/// # Returns
///
/// * `Ok(RespValue::Array)` - `[key, element]`
/// * `Ok(RespValue::NullArray)` - The timeout expired first
/// * `Err(CommandError::InvalidTimeout)` - The timeout is not a number
/// * `Err(CommandError::NegativeTimeout)` - The timeout is below zero
pub async fn blocking_pop(
    client_id: ClientId,
    store: &Arc<Mutex<KeyValueStore>>,
    arguments: Vec<Bytes>,
    side: ListSide,
) -> Result<RespValue, CommandError> {
    let blpop_arguments = BlpopArguments::parse(arguments)?;
    let deadline = blpop_arguments
        .timeout
        .and_then(|timeout| Instant::now().checked_add(timeout));

    let mut store_guard = store.lock().await;

    if let Some((key, element)) = pop_first_available(&mut store_guard, &blpop_arguments.keys, side)? {
        return Ok(RespValue::Array(vec![
            RespValue::BulkString(key),
            RespValue::BulkString(element),
        ]));
    }

    let (waiter_id, receiver) = store_guard.blocking_mut().register(
        client_id,
        blpop_arguments.keys,
        WaitKind::ListPop(side),
    );
    drop(store_guard);

    match wait_for_wakeup(store, waiter_id, receiver, deadline).await {
        Some(Wakeup::Popped { key, element }) => Ok(RespValue::Array(vec![
            RespValue::BulkString(key),
            RespValue::BulkString(element),
        ])),
        _ => Ok(RespValue::NullArray),
    }
}
