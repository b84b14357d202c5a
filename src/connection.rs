use std::{future::Future, net::SocketAddr};

use bytes::BytesMut;

use tokio::{
    io::{AsyncRead, AsyncWriteExt},
    net::{TcpStream, tcp::OwnedWriteHalf},
    sync::mpsc,
};
use tracing::{debug, info, warn};

use crate::{
    blocking::ClientId,
    commands::{CommandDispatcher, CommandResult},
    input::{CommandReadError, ReadBuffer, read_frame},
    resp::RespValue,
    state::ServerContext,
};

/// Replies and pub/sub messages waiting to be written to one client.
const OUTBOUND_CAPACITY: usize = 1024;

/// Input buffered while a command is pending. Past this the socket is not
/// read again until the command completes.
pub const MAX_PENDING_INPUT: usize = 1024 * 1024;

/// Serves one client until it disconnects, sends QUIT or breaks the protocol.
///
/// Replies go through an outbound channel drained by a dedicated writer
/// task, so pub/sub messages published by other clients interleave with
/// this client's replies without sharing the socket. While a command is
/// pending (e.g. a blocked BLPOP) the socket is still watched: EOF drops the
/// command, and teardown releases the client's waiters and subscriptions.
pub async fn handle_connection(stream: TcpStream, peer: SocketAddr, context: ServerContext) {
    let client_id = context.next_client_id();
    info!(client_id, %peer, "client connected");

    let (mut reader, writer) = stream.into_split();
    let (outbound, replies) = mpsc::channel(OUTBOUND_CAPACITY);
    let writer_task = tokio::spawn(write_replies(writer, replies, client_id));

    let mut dispatcher = CommandDispatcher::new(client_id, context, outbound.clone());
    let mut buffer = ReadBuffer::new();

    loop {
        let input = match read_frame(&mut reader, &mut buffer).await {
            Ok(input) => input,
            Err(CommandReadError::ConnectionClosed) => break,
            Err(CommandReadError::RespParseError(error)) => {
                warn!(client_id, %peer, %error, "protocol error, closing connection");
                let _ = outbound.send(error.as_resp()).await;
                break;
            }
            Err(error) => {
                warn!(client_id, %peer, %error, "failed to read from client");
                break;
            }
        };

        let result = watch_while_pending(dispatcher.dispatch(input), &mut reader, &mut buffer).await;

        let Some(result) = result else {
            debug!(client_id, "client went away with a command pending");
            break;
        };

        let (replies, quit) = match result {
            CommandResult::Response(reply) => (vec![reply], false),
            CommandResult::Responses(replies) => (replies, false),
            CommandResult::Quit(reply) => (vec![reply], true),
        };

        let mut delivered = true;
        for reply in replies {
            if outbound.send(reply).await.is_err() {
                delivered = false;
                break;
            }
        }

        if quit || !delivered {
            break;
        }
    }

    dispatcher.close().await;
    drop(dispatcher);
    drop(outbound);

    if let Err(error) = writer_task.await {
        warn!(client_id, %error, "writer task failed");
    }

    info!(client_id, %peer, "client disconnected");
}

/// Drives a dispatched command to completion while still reading the socket.
///
/// Pipelined input is kept in `buffer` for after the command, up to
/// [`MAX_PENDING_INPUT`]. Returns `None` when the client went away first.
async fn watch_while_pending<F, R>(dispatch: F, reader: &mut R, buffer: &mut ReadBuffer) -> Option<F::Output>
where
    F: Future,
    R: AsyncRead + Unpin,
{
    tokio::pin!(dispatch);

    loop {
        tokio::select! {
            biased;
            result = &mut dispatch => return Some(result),
            read = buffer.fill_from(&mut *reader), if buffer.len() < MAX_PENDING_INPUT => match read {
                Ok(0) | Err(_) => return None,
                Ok(_) => continue,
            },
        }
    }
}

/// Drains the outbound channel into the socket, batching whatever is
/// already queued into one write.
async fn write_replies(
    mut writer: OwnedWriteHalf,
    mut replies: mpsc::Receiver<RespValue>,
    client_id: ClientId,
) {
    let mut buffer = BytesMut::new();

    while let Some(reply) = replies.recv().await {
        reply.encode_into(&mut buffer);
        while let Ok(reply) = replies.try_recv() {
            reply.encode_into(&mut buffer);
        }

        if let Err(error) = writer.write_all(&buffer).await {
            debug!(client_id, %error, "failed to write to client");
            return;
        }
        buffer.clear();
    }

    let _ = writer.shutdown().await;
}
