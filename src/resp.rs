//! Redis Serialization Protocol (RESP2) encoding and decoding.
//!
//! Frames are decoded from a growing [`BytesMut`] buffer using the length
//! prefixes, so bulk strings may contain any bytes, including CRLF. A frame
//! that is not complete yet leaves the buffer untouched and decodes to
//! `Ok(None)`, letting the caller read more bytes and try again.

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::commands::CommandError;

const CRLF: &[u8] = b"\r\n";

/// Largest bulk string accepted from a client (same limit as Redis).
const MAX_BULK_STRING_LENGTH: i64 = 512 * 1024 * 1024;

/// Largest header line (type byte, length or simple string) accepted.
const MAX_LINE_LENGTH: usize = 64 * 1024;

const MAX_NESTING_DEPTH: usize = 32;

/// Malformed framing. These errors are fatal for the connection.
#[derive(Error, Debug, PartialEq)]
pub enum RespError {
    #[error("unknown RESP type byte {0:#04x}")]
    UnknownRespType(u8),
    #[error("invalid length prefix")]
    InvalidLength,
    #[error("invalid integer")]
    InvalidInteger,
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
    #[error("missing CRLF terminator")]
    MissingTerminator,
    #[error("bulk string exceeds maximum length")]
    BulkStringTooLong,
    #[error("line exceeds maximum length")]
    LineTooLong,
    #[error("too many nested arrays")]
    NestingTooDeep,
}

impl RespError {
    /// The best-effort reply sent before the connection is closed.
    pub fn as_resp(&self) -> RespValue {
        RespValue::Error(format!("ERR Protocol error: {}", self))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Bytes),
    /// `$-1\r\n`, "no value".
    NullBulkString,
    Array(Vec<RespValue>),
    /// `*-1\r\n`, returned by timed out blocking commands.
    NullArray,
}

impl RespValue {
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    pub fn bulk_string(value: impl Into<Bytes>) -> Self {
        RespValue::BulkString(value.into())
    }

    pub fn array_of_bulk_strings<I, B>(values: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        RespValue::Array(values.into_iter().map(RespValue::bulk_string).collect())
    }

    /// Splits a request into its bulk string parts, command name first.
    pub fn into_arguments(self) -> Result<Vec<Bytes>, CommandError> {
        let RespValue::Array(elements) = self else {
            return Err(CommandError::InvalidCommand);
        };

        if elements.is_empty() {
            return Err(CommandError::InvalidCommand);
        }

        elements
            .into_iter()
            .map(|element| match element {
                RespValue::BulkString(data) => Ok(data),
                _ => Err(CommandError::InvalidCommand),
            })
            .collect()
    }

    /// Decodes one frame from the front of `buffer`.
    ///
    /// Returns `Ok(None)` when the buffer holds only part of a frame; nothing
    /// is consumed in that case. On success the decoded bytes are removed
    /// from the buffer. Use a [`RespDecoder`] when the same buffer is decoded
    /// repeatedly while it fills up.
    pub fn decode(buffer: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        RespDecoder::new().decode(buffer)
    }

    pub fn encode(&self) -> Bytes {
        let mut buffer = BytesMut::new();
        self.encode_into(&mut buffer);
        buffer.freeze()
    }

    pub fn encode_into(&self, buffer: &mut BytesMut) {
        match self {
            RespValue::SimpleString(s) => {
                buffer.put_u8(b'+');
                put_line(buffer, s);
            }
            RespValue::Error(s) => {
                buffer.put_u8(b'-');
                put_line(buffer, s);
            }
            RespValue::Integer(i) => {
                buffer.put_u8(b':');
                buffer.put_slice(i.to_string().as_bytes());
                buffer.put_slice(CRLF);
            }
            RespValue::BulkString(data) => {
                buffer.put_u8(b'$');
                buffer.put_slice(data.len().to_string().as_bytes());
                buffer.put_slice(CRLF);
                buffer.put_slice(data);
                buffer.put_slice(CRLF);
            }
            RespValue::NullBulkString => buffer.put_slice(b"$-1\r\n"),
            RespValue::Array(elements) => {
                buffer.put_u8(b'*');
                buffer.put_slice(elements.len().to_string().as_bytes());
                buffer.put_slice(CRLF);

                for element in elements {
                    element.encode_into(buffer);
                }
            }
            RespValue::NullArray => buffer.put_slice(b"*-1\r\n"),
        }
    }
}

// Simple strings and errors are line based and cannot carry CR or LF.
fn put_line(buffer: &mut BytesMut, line: &str) {
    for byte in line.bytes() {
        buffer.put_u8(if byte == b'\r' || byte == b'\n' { b' ' } else { byte });
    }
    buffer.put_slice(CRLF);
}

/// Incremental frame decoder.
///
/// Remembers how far the frame at the front of the buffer has been checked,
/// so bytes arriving in small reads are scanned once instead of on every
/// attempt. Payloads are only split off once the whole frame is buffered,
/// and bulk strings share that allocation.
///
/// A decoder belongs to one buffer: nothing else may consume from its front.
#[derive(Debug, Default)]
pub struct RespDecoder {
    /// Length of the prefix of the current frame that holds complete items.
    scanned: usize,
    /// Elements still missing from every array opened so far, outermost first.
    open_arrays: Vec<i64>,
}

impl RespDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, buffer: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        let frame_length = match self.scan(buffer) {
            Ok(Some(frame_length)) => frame_length,
            Ok(None) => return Ok(None),
            Err(error) => {
                self.reset();
                return Err(error);
            }
        };
        self.reset();

        let frame = buffer.split_to(frame_length).freeze();
        FrameBuilder::new(frame).build_value().map(Some)
    }

    fn reset(&mut self) {
        self.scanned = 0;
        self.open_arrays.clear();
    }

    /// Validates items from `scanned` on. Returns the frame length once the
    /// outermost value is complete.
    fn scan(&mut self, input: &[u8]) -> Result<Option<usize>, RespError> {
        loop {
            let start = self.scanned;
            let Some(&type_byte) = input.get(start) else {
                return Ok(None);
            };
            let Some((line, after_line)) = find_line(input, start + 1)? else {
                return Ok(None);
            };

            let item_end = match type_byte {
                b'+' | b'-' => {
                    std::str::from_utf8(line).map_err(|_| RespError::InvalidUtf8)?;
                    after_line
                }
                b':' => {
                    parse_integer(line)?;
                    after_line
                }
                b'$' => match bulk_string_end(line, after_line)? {
                    None => after_line,
                    Some(end) if input.len() < end + CRLF.len() => return Ok(None),
                    Some(end) if &input[end..end + CRLF.len()] != CRLF => {
                        return Err(RespError::MissingTerminator);
                    }
                    Some(end) => end + CRLF.len(),
                },
                b'*' => {
                    let length = parse_length(line)?;
                    if length > 0 {
                        if self.open_arrays.len() >= MAX_NESTING_DEPTH {
                            return Err(RespError::NestingTooDeep);
                        }
                        self.open_arrays.push(length);
                        self.scanned = after_line;
                        continue;
                    }
                    after_line
                }
                other => return Err(RespError::UnknownRespType(other)),
            };

            self.scanned = item_end;

            // Close every array this item completed.
            loop {
                match self.open_arrays.last_mut() {
                    None => return Ok(Some(self.scanned)),
                    Some(remaining) if *remaining > 1 => {
                        *remaining -= 1;
                        break;
                    }
                    Some(_) => {
                        self.open_arrays.pop();
                    }
                }
            }
        }
    }
}

/// The line starting at `start`, without its CRLF, and the offset after it.
fn find_line(input: &[u8], start: usize) -> Result<Option<(&[u8], usize)>, RespError> {
    let remaining = input.get(start..).unwrap_or_default();

    match remaining.windows(2).position(|window| window == CRLF) {
        Some(end) => Ok(Some((&remaining[..end], start + end + CRLF.len()))),
        None if remaining.len() > MAX_LINE_LENGTH => Err(RespError::LineTooLong),
        None => Ok(None),
    }
}

/// Offset where the payload of a bulk string ends, `None` for the null bulk string.
fn bulk_string_end(line: &[u8], payload_start: usize) -> Result<Option<usize>, RespError> {
    let length = parse_length(line)?;

    if length == -1 {
        return Ok(None);
    }

    if length > MAX_BULK_STRING_LENGTH {
        return Err(RespError::BulkStringTooLong);
    }

    Ok(Some(payload_start + length as usize))
}

/// Builds the value of a frame [`RespDecoder::scan`] already validated.
struct FrameBuilder {
    frame: Bytes,
    position: usize,
}

impl FrameBuilder {
    fn new(frame: Bytes) -> Self {
        Self { frame, position: 0 }
    }

    fn build_value(&mut self) -> Result<RespValue, RespError> {
        let type_byte = self
            .frame
            .get(self.position)
            .copied()
            .ok_or(RespError::MissingTerminator)?;

        let Some((line, after_line)) = find_line(&self.frame, self.position + 1)? else {
            return Err(RespError::MissingTerminator);
        };

        match type_byte {
            b'+' => {
                let value = line_to_string(line)?;
                self.position = after_line;
                Ok(RespValue::SimpleString(value))
            }
            b'-' => {
                let value = line_to_string(line)?;
                self.position = after_line;
                Ok(RespValue::Error(value))
            }
            b':' => {
                let value = parse_integer(line)?;
                self.position = after_line;
                Ok(RespValue::Integer(value))
            }
            b'$' => {
                let Some(end) = bulk_string_end(line, after_line)? else {
                    self.position = after_line;
                    return Ok(RespValue::NullBulkString);
                };

                if self.frame.len() < end + CRLF.len() {
                    return Err(RespError::MissingTerminator);
                }

                self.position = end + CRLF.len();
                Ok(RespValue::BulkString(self.frame.slice(after_line..end)))
            }
            b'*' => {
                let length = parse_length(line)?;
                self.position = after_line;

                if length == -1 {
                    return Ok(RespValue::NullArray);
                }

                let mut elements = Vec::with_capacity((length as usize).min(1024));
                for _ in 0..length {
                    elements.push(self.build_value()?);
                }

                Ok(RespValue::Array(elements))
            }
            other => Err(RespError::UnknownRespType(other)),
        }
    }
}

fn line_to_string(line: &[u8]) -> Result<String, RespError> {
    std::str::from_utf8(line)
        .map(str::to_string)
        .map_err(|_| RespError::InvalidUtf8)
}

fn parse_integer(line: &[u8]) -> Result<i64, RespError> {
    std::str::from_utf8(line)
        .map_err(|_| RespError::InvalidUtf8)?
        .parse::<i64>()
        .map_err(|_| RespError::InvalidInteger)
}

fn parse_length(line: &[u8]) -> Result<i64, RespError> {
    let length = parse_integer(line).map_err(|_| RespError::InvalidLength)?;

    if length < -1 {
        return Err(RespError::InvalidLength);
    }

    Ok(length)
}
