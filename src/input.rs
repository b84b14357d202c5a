//! Reading RESP frames from a client socket.

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::resp::{RespDecoder, RespError, RespValue};

/// Errors that can occur while reading a request from a client.
#[derive(Error, Debug, PartialEq)]
pub enum CommandReadError {
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("RESP parse error: {0}")]
    RespParseError(#[from] RespError),
}

const READ_BUFFER_CAPACITY: usize = 4096;

/// Bytes read from a client that were not decoded yet, plus the decoder's
/// progress through them.
#[derive(Debug)]
pub struct ReadBuffer {
    bytes: BytesMut,
    decoder: RespDecoder,
}

impl Default for ReadBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadBuffer {
    pub fn new() -> Self {
        Self {
            bytes: BytesMut::with_capacity(READ_BUFFER_CAPACITY),
            decoder: RespDecoder::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// One read from `reader` appended to the buffer. Cancel safe.
    pub async fn fill_from<R>(&mut self, reader: &mut R) -> std::io::Result<usize>
    where
        R: AsyncRead + Unpin,
    {
        reader.read_buf(&mut self.bytes).await
    }

    fn next_frame(&mut self) -> Result<Option<RespValue>, RespError> {
        self.decoder.decode(&mut self.bytes)
    }
}

/// Reads until one complete RESP value is buffered and returns it.
///
/// Bytes past the returned value stay in `buffer`, so pipelined requests are
/// served one by one without touching the socket again. Reading is cancel
/// safe: nothing is lost if the future is dropped between reads.
///
/// # Returns
///
/// * `Ok(RespValue)` - The next request
/// * `Err(CommandReadError::ConnectionClosed)` - The peer closed the socket
/// * `Err(CommandReadError::RespParseError)` - The bytes are not valid RESP
/// * `Err(CommandReadError::IoError)` - Reading from the socket failed
pub async fn read_frame<R>(reader: &mut R, buffer: &mut ReadBuffer) -> Result<RespValue, CommandReadError>
where
    R: AsyncRead + Unpin,
{
    loop {
        if let Some(value) = buffer.next_frame()? {
            return Ok(value);
        }

        let number_of_bytes = buffer
            .fill_from(reader)
            .await
            .map_err(|e| CommandReadError::IoError(e.to_string()))?;

        if number_of_bytes == 0 {
            return Err(CommandReadError::ConnectionClosed);
        }
    }
}
