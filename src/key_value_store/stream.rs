use std::{
    collections::BTreeMap,
    fmt,
    ops::Bound,
    time::{SystemTime, SystemTimeError},
};

use bytes::Bytes;

use super::StoreError;

/// Identifier of a stream entry, ordered by milliseconds then sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StreamId {
    pub milliseconds: u64,
    pub sequence: u64,
}

impl StreamId {
    pub const ZERO: StreamId = StreamId::new(0, 0);
    pub const MAX: StreamId = StreamId::new(u64::MAX, u64::MAX);

    pub const fn new(milliseconds: u64, sequence: u64) -> Self {
        Self {
            milliseconds,
            sequence,
        }
    }

    /// Parses a complete `<ms>-<seq>` ID. A bare `<ms>` means sequence 0.
    pub fn parse(input: &[u8]) -> Option<Self> {
        let input = std::str::from_utf8(input).ok()?;

        match input.split_once('-') {
            Some((milliseconds, sequence)) => Some(Self::new(
                milliseconds.parse().ok()?,
                sequence.parse().ok()?,
            )),
            None => Some(Self::new(input.parse().ok()?, 0)),
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.milliseconds, self.sequence)
    }
}

/// The ID argument of an append: fully automatic, automatic sequence or explicit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StreamIdRequest {
    Auto,
    AutoSequence(u64),
    Explicit(StreamId),
}

impl StreamIdRequest {
    pub fn parse(input: &[u8]) -> Option<Self> {
        if input == b"*" {
            return Some(StreamIdRequest::Auto);
        }

        if let Some(milliseconds) = input.strip_suffix(b"-*") {
            let milliseconds = std::str::from_utf8(milliseconds).ok()?.parse().ok()?;
            return Some(StreamIdRequest::AutoSequence(milliseconds));
        }

        StreamId::parse(input).map(StreamIdRequest::Explicit)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamEntry {
    pub id: StreamId,
    pub fields: Vec<(Bytes, Bytes)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stream {
    entries: BTreeMap<StreamId, Vec<(Bytes, Bytes)>>,
    last_id: StreamId,
}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The greatest ID ever assigned, `0-0` for a stream that never had entries.
    pub fn last_id(&self) -> StreamId {
        self.last_id
    }

    /// Turns an ID request into a concrete ID strictly greater than the last one.
    pub fn resolve_id(&self, request: StreamIdRequest, now_ms: u64) -> Result<StreamId, StoreError> {
        let last = self.last_id;

        match request {
            StreamIdRequest::Explicit(id) => {
                if id == StreamId::ZERO {
                    return Err(StoreError::StreamIdZero);
                }

                if id <= last {
                    return Err(StoreError::StreamIdTooSmall);
                }

                Ok(id)
            }
            StreamIdRequest::AutoSequence(milliseconds) => {
                if milliseconds < last.milliseconds {
                    return Err(StoreError::StreamIdTooSmall);
                }

                if milliseconds == last.milliseconds {
                    let sequence = last
                        .sequence
                        .checked_add(1)
                        .ok_or(StoreError::StreamIdTooSmall)?;
                    return Ok(StreamId::new(milliseconds, sequence));
                }

                Ok(StreamId::new(milliseconds, 0))
            }
            StreamIdRequest::Auto => {
                if now_ms > last.milliseconds {
                    return Ok(StreamId::new(now_ms, 0));
                }

                // The clock went backwards or several appends landed in the same millisecond.
                match last.sequence.checked_add(1) {
                    Some(sequence) => Ok(StreamId::new(last.milliseconds, sequence)),
                    None => last
                        .milliseconds
                        .checked_add(1)
                        .map(|milliseconds| StreamId::new(milliseconds, 0))
                        .ok_or(StoreError::StreamIdTooSmall),
                }
            }
        }
    }

    pub fn append(
        &mut self,
        request: StreamIdRequest,
        fields: Vec<(Bytes, Bytes)>,
        now_ms: u64,
    ) -> Result<StreamId, StoreError> {
        let id = self.resolve_id(request, now_ms)?;

        self.entries.insert(id, fields);
        self.last_id = id;

        Ok(id)
    }

    /// Entries with `start <= id <= end`, at most `count` of them.
    pub fn range(&self, start: StreamId, end: StreamId, count: Option<usize>) -> Vec<StreamEntry> {
        if start > end {
            return Vec::new();
        }

        self.collect(
            (Bound::Included(start), Bound::Included(end)),
            count,
        )
    }

    /// Entries with an ID strictly greater than `id`.
    pub fn entries_after(&self, id: StreamId, count: Option<usize>) -> Vec<StreamEntry> {
        self.collect((Bound::Excluded(id), Bound::Unbounded), count)
    }

    fn collect(
        &self,
        bounds: (Bound<StreamId>, Bound<StreamId>),
        count: Option<usize>,
    ) -> Vec<StreamEntry> {
        self.entries
            .range(bounds)
            .take(count.unwrap_or(usize::MAX))
            .map(|(id, fields)| StreamEntry {
                id: *id,
                fields: fields.clone(),
            })
            .collect()
    }
}

pub fn get_timestamp_in_milliseconds() -> Result<u64, SystemTimeError> {
    let duration_since_epoch = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH)?;

    Ok(duration_since_epoch.as_millis() as u64)
}
