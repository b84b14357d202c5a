use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use tokio::{sync::Mutex, time::Instant};

use crate::{
    blocking::{ClientId, WaitKind, wait_for_wakeup},
    commands::{
        CommandError,
        command_utils::{parse_integer, uppercase},
        stream_utils::parse_stream_entries_to_resp,
    },
    key_value_store::{KeyValueStore, StreamId},
    resp::RespValue,
};

/// Where a read starts for one stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StartId {
    /// `$`: only entries added after the command was issued.
    Latest,
    After(StreamId),
}

#[derive(Debug, PartialEq)]
pub struct XreadArguments {
    count: Option<usize>,
    /// Block duration in milliseconds, `Some(0)` blocks forever.
    block: Option<u64>,
    keys: Vec<Bytes>,
    ids: Vec<StartId>,
}

impl XreadArguments {
    /// Parses `[COUNT n] [BLOCK ms] STREAMS key [key ...] id [id ...]`.
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        let mut count = None;
        let mut block = None;
        let mut position = 0;

        loop {
            let Some(option) = arguments.get(position) else {
                return Err(CommandError::SyntaxError);
            };

            match uppercase(option).as_str() {
                "COUNT" => {
                    let value = arguments.get(position + 1).ok_or(CommandError::SyntaxError)?;
                    count = Some(parse_integer(value)?.max(0) as usize);
                    position += 2;
                }
                "BLOCK" => {
                    let value = arguments.get(position + 1).ok_or(CommandError::SyntaxError)?;
                    let milliseconds = parse_integer(value)?;
                    if milliseconds < 0 {
                        return Err(CommandError::NegativeTimeout);
                    }
                    block = Some(milliseconds as u64);
                    position += 2;
                }
                "STREAMS" => {
                    position += 1;
                    break;
                }
                _ => return Err(CommandError::SyntaxError),
            }
        }

        let streams = &arguments[position..];
        if streams.is_empty() || streams.len() % 2 != 0 {
            return Err(CommandError::UnbalancedXreadStreams);
        }

        let (keys, ids) = streams.split_at(streams.len() / 2);
        let ids = ids
            .iter()
            .map(|id| {
                if id.as_ref() == b"$" {
                    Ok(StartId::Latest)
                } else {
                    StreamId::parse(id)
                        .map(StartId::After)
                        .ok_or(CommandError::InvalidStreamId)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            count,
            block,
            keys: keys.to_vec(),
            ids,
        })
    }
}

/// Pins `$` to the current last ID of each stream.
fn resolve_start_ids(
    store: &mut KeyValueStore,
    xread_arguments: &XreadArguments,
) -> Result<Vec<StreamId>, CommandError> {
    xread_arguments
        .keys
        .iter()
        .zip(&xread_arguments.ids)
        .map(|(key, id)| match id {
            StartId::After(id) => Ok(*id),
            StartId::Latest => Ok(store
                .get_stream(key)?
                .map_or(StreamId::ZERO, |stream| stream.last_id())),
        })
        .collect()
}

/// `[[key, entries], ...]` for every stream with new entries, or `None`.
fn read_streams(
    store: &mut KeyValueStore,
    keys: &[Bytes],
    start_ids: &[StreamId],
    count: Option<usize>,
) -> Result<Option<RespValue>, CommandError> {
    let mut response = Vec::new();

    for (key, start_id) in keys.iter().zip(start_ids) {
        let Some(stream) = store.get_stream(key)? else {
            continue;
        };

        let entries = stream.entries_after(*start_id, count);
        if entries.is_empty() {
            continue;
        }

        response.push(RespValue::Array(vec![
            RespValue::BulkString(key.clone()),
            parse_stream_entries_to_resp(entries),
        ]));
    }

    Ok((!response.is_empty()).then_some(RespValue::Array(response)))
}

/// XREAD as run inside EXEC: BLOCK is ignored.
pub fn read_immediately(
    store: &mut KeyValueStore,
    arguments: Vec<Bytes>,
) -> Result<RespValue, CommandError> {
    let xread_arguments = XreadArguments::parse(arguments)?;
    let start_ids = resolve_start_ids(store, &xread_arguments)?;

    Ok(read_streams(store, &xread_arguments.keys, &start_ids, xread_arguments.count)?
        .unwrap_or(RespValue::NullArray))
}

/// Handles the XREAD command.
///
/// Returns the entries newer than the given ID of each stream. With BLOCK
/// and nothing to return yet, the client is parked on every key and woken
/// when any of them gets a new entry; `$` keeps meaning "newer than the
/// last entry at the time XREAD was issued" across wakeups.
///
/// # Returns
///
/// * `Ok(RespValue::Array)` - `[[key, [[id, [field, value, ...]], ...]], ...]`
/// * `Ok(RespValue::NullArray)` - Nothing new, or the block timed out
/// * `Err(CommandError::UnbalancedXreadStreams)` - Keys and IDs do not pair up
pub async fn xread(
    client_id: ClientId,
    store: &Arc<Mutex<KeyValueStore>>,
    arguments: Vec<Bytes>,
) -> Result<RespValue, CommandError> {
    let xread_arguments = XreadArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;
    let start_ids = resolve_start_ids(&mut store_guard, &xread_arguments)?;

    let mut response = read_streams(
        &mut store_guard,
        &xread_arguments.keys,
        &start_ids,
        xread_arguments.count,
    )?;

    let Some(block) = xread_arguments.block else {
        return Ok(response.unwrap_or(RespValue::NullArray));
    };

    let deadline = match block {
        0 => None,
        milliseconds => Instant::now().checked_add(Duration::from_millis(milliseconds)),
    };

    while response.is_none() {
        let (waiter_id, receiver) = store_guard.blocking_mut().register(
            client_id,
            xread_arguments.keys.clone(),
            WaitKind::StreamRead,
        );
        drop(store_guard);

        if wait_for_wakeup(store, waiter_id, receiver, deadline).await.is_none() {
            return Ok(RespValue::NullArray);
        }

        store_guard = store.lock().await;
        response = read_streams(
            &mut store_guard,
            &xread_arguments.keys,
            &start_ids,
            xread_arguments.count,
        )?;
    }

    Ok(response.unwrap_or(RespValue::NullArray))
}
