//! Reader and writer tasks of one connection.
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::error::RelayError;
use crate::hub::HubEvent;

pub(crate) async fn open(
    stream: TcpStream,
    client_id: u32,
    queue: usize,
    events: mpsc::Sender<HubEvent>,
) -> Result<(), RelayError> {
    if let Err(err) = stream.set_nodelay(true) {
        debug!(target: "arcana::relay", client_id, %err, "nodelay not set");
    }
    let (read, write) = stream.into_split();
    let (outbox, lines) = mpsc::channel(queue.max(1));

    // Registered before the reader starts, so the welcome precedes any echo.
    events
        .send(HubEvent::Joined { client_id, outbox })
        .await
        .map_err(|_| RelayError::HubStopped)?;
    let (writer_done, stopped) = oneshot::channel();
    tokio::spawn(write_lines(client_id, write, lines, writer_done));
    tokio::spawn(read_lines(client_id, read, events, stopped));
    Ok(())
}

/// Stops at EOF, on a read error, or once the writer has finished.
async fn read_lines(
    client_id: u32,
    read: OwnedReadHalf,
    events: mpsc::Sender<HubEvent>,
    mut stopped: oneshot::Receiver<()>,
) {
    let mut lines = BufReader::new(read).lines();
    loop {
        let next = tokio::select! {
            next = lines.next_line() => next,
            _ = &mut stopped => {
                debug!(target: "arcana::relay", client_id, "writer closed, reader stopping");
                break;
            }
        };
        match next {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => {
                if events.send(HubEvent::Line { client_id, line }).await.is_err() {
                    return;
                }
            }
            Ok(None) => break,
            Err(err) => {
                debug!(target: "arcana::relay", client_id, %err, "read failed");
                break;
            }
        }
    }
    let _ = events.send(HubEvent::Left { client_id }).await;
}

/// Ends when the hub drops the outbox or the peer stops reading.
async fn write_lines(
    client_id: u32,
    mut write: OwnedWriteHalf,
    mut lines: mpsc::Receiver<Arc<str>>,
    _done: oneshot::Sender<()>,
) {
    while let Some(line) = lines.recv().await {
        let mut framed = String::with_capacity(line.len() + 1);
        framed.push_str(&line);
        framed.push('\n');
        if let Err(err) = write.write_all(framed.as_bytes()).await {
            debug!(target: "arcana::relay", client_id, %err, "write failed");
            break;
        }
    }
    let _ = write.shutdown().await;
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tokio::time::timeout;

    use super::*;

    #[tokio::test]
    async fn a_dropped_outbox_stops_the_reader_too() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut peer = TcpStream::connect(listener.local_addr().unwrap()).await.unwrap();
        let (stream, _) = listener.accept().await.unwrap();

        let (events, mut hub) = mpsc::channel(8);
        open(stream, 7, 4, events).await.unwrap();
        let Some(HubEvent::Joined { client_id: 7, outbox }) = hub.recv().await else {
            panic!("expected a join");
        };
        drop(outbox);

        // The peer stays connected; only the relay side gives up.
        let left = timeout(Duration::from_secs(5), hub.recv()).await.unwrap();
        assert!(matches!(left, Some(HubEvent::Left { client_id: 7 })));

        let mut buf = [0u8; 16];
        let read = timeout(Duration::from_secs(5), peer.read(&mut buf)).await.unwrap();
        assert_eq!(read.unwrap(), 0);
    }
}
