use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use super::Transport;
use crate::error::TransportError;

/// Long-lived socket to the relay.
///
/// A dedicated reader thread appends every received line to a shared inbox
/// and does nothing else; the simulation thread drains it.
pub struct TcpTransport {
    stream: TcpStream,
    inbox: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl TcpTransport {
    pub fn connect(addr: &str) -> Result<Self, TransportError> {
        let connect_err = |source| TransportError::Connect {
            addr: addr.to_string(),
            source,
        };
        let stream = TcpStream::connect(addr).map_err(connect_err)?;
        stream.set_nodelay(true).map_err(connect_err)?;
        let read_half = stream.try_clone().map_err(connect_err)?;

        let inbox = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let reader = {
            let inbox = Arc::clone(&inbox);
            let closed = Arc::clone(&closed);
            thread::Builder::new()
                .name("arcana-reader".into())
                .spawn(move || read_loop(read_half, inbox, closed))
                .map_err(connect_err)?
        };
        info!(target: "arcana::transport", addr, "connected to relay");

        Ok(Self {
            stream,
            inbox,
            closed,
            reader: Some(reader),
        })
    }
}

fn read_loop(stream: TcpStream, inbox: Arc<Mutex<Vec<String>>>, closed: Arc<AtomicBool>) {
    for line in BufReader::new(stream).lines() {
        match line {
            Ok(line) if line.is_empty() => continue,
            Ok(line) => match inbox.lock() {
                Ok(mut lines) => lines.push(line),
                Err(_) => break,
            },
            Err(err) => {
                warn!(target: "arcana::transport", "read failed: {err}");
                break;
            }
        }
    }
    debug!(target: "arcana::transport", "reader thread finished");
    closed.store(true, Ordering::Release);
}

impl Transport for TcpTransport {
    fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        self.stream
            .write_all(format!("{line}\n").as_bytes())
            .map_err(TransportError::Write)
    }

    fn drain_lines(&mut self) -> Result<Vec<String>, TransportError> {
        // Read the flag first so lines pushed before close are still drained.
        let closed = self.closed.load(Ordering::Acquire);
        let lines = {
            let mut inbox = self.inbox.lock().map_err(|_| TransportError::Poisoned)?;
            std::mem::take(&mut *inbox)
        };
        if lines.is_empty() && closed {
            return Err(TransportError::Closed);
        }
        Ok(lines)
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}
