//! The length-prefixed TCP command dispatcher: one task per connection,
//! a reader-preferring lock around the handler table for hot reload, and
//! a semaphore bounding the number of concurrently served connections.

mod config;

pub use config::ServerConfig;

use crate::context::HSMContext;
use crate::handlers::HandlerTable;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{watch, RwLock, Semaphore};
use tracing::{debug, warn};

pub struct HsmServer {
    config: ServerConfig,
    ctx: HSMContext,
    handlers: RwLock<HandlerTable>,
    semaphore: Arc<Semaphore>,
    active_connections: AtomicUsize,
}

impl HsmServer {
    pub fn new(config: ServerConfig, ctx: HSMContext, handlers: HandlerTable) -> Arc<Self> {
        Arc::new(Self {
            semaphore: Arc::new(Semaphore::new(config.max_connections)),
            config,
            ctx,
            handlers: RwLock::new(handlers),
            active_connections: AtomicUsize::new(0),
        })
    }

    /// Atomically swap the handler table. In-flight invocations keep
    /// running against the handler they started with; only the next
    /// dispatch sees the new table.
    pub async fn reload(&self, new_handlers: HandlerTable) {
        let mut guard = self.handlers.write().await;
        *guard = new_handlers;
    }

    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Accept connections from `listener` until `shutdown` reports `true`,
    /// then drain in-flight connections for up to the configured shutdown
    /// timeout before returning.
    pub async fn serve(self: Arc<Self>, listener: tokio::net::TcpListener, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                accepted = listener.accept() => {
                    let (socket, _peer) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!(error = %e, "accept failed");
                            continue;
                        }
                    };
                    let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() else {
                        drop(socket);
                        continue;
                    };
                    let server = Arc::clone(&self);
                    tokio::spawn(async move {
                        server.active_connections.fetch_add(1, Ordering::Relaxed);
                        server.handle_connection(socket).await;
                        server.active_connections.fetch_sub(1, Ordering::Relaxed);
                        drop(permit);
                    });
                }
            }
        }

        let deadline = tokio::time::Instant::now() + self.config.shutdown_timeout;
        while self.active_connections() > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    async fn handle_connection(&self, mut socket: TcpStream) {
        loop {
            let frame = match self.read_frame(&mut socket).await {
                Ok(Some(frame)) => frame,
                Ok(None) => return,
                Err(_) => return,
            };

            if frame.len() < 2 {
                return;
            }
            let opcode = [frame[0], frame[1]];
            let body = &frame[2..];
            let response = self.dispatch(opcode, body).await;

            if self.write_frame(&mut socket, &response).await.is_err() {
                return;
            }
        }
    }

    async fn dispatch(&self, opcode: [u8; 2], body: &[u8]) -> Vec<u8> {
        let response_opcode = increment_opcode(opcode);
        let mut response = response_opcode.to_vec();

        let opcode_str = std::str::from_utf8(&opcode).unwrap_or("\0\0");
        let handler = {
            let table = self.handlers.read().await;
            table.get(opcode_str).cloned()
        };

        match handler {
            None => response.extend_from_slice(b"86"),
            Some(handler) => {
                let ctx = &self.ctx;
                let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler.handle(ctx, body)));
                match outcome {
                    Ok(Ok(bytes)) => response.extend_from_slice(&bytes),
                    Ok(Err(e)) => {
                        debug!(status = e.status_code(), "handler returned error");
                        response.extend_from_slice(e.status_code().as_bytes());
                    }
                    Err(_) => {
                        warn!("handler panicked");
                        response.extend_from_slice(b"68");
                    }
                }
            }
        }
        response
    }

    async fn read_frame(&self, socket: &mut TcpStream) -> io::Result<Option<Vec<u8>>> {
        let mut len_buf = [0u8; 2];
        match tokio::time::timeout(self.config.idle_timeout, socket.read_exact(&mut len_buf)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(io::Error::new(io::ErrorKind::TimedOut, "idle timeout")),
        }

        let len = u16::from_be_bytes(len_buf) as usize;
        let mut payload = vec![0u8; len];
        tokio::time::timeout(self.config.read_timeout, socket.read_exact(&mut payload))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "read timeout"))??;
        Ok(Some(payload))
    }

    async fn write_frame(&self, socket: &mut TcpStream, payload: &[u8]) -> io::Result<()> {
        let len = payload.len() as u16;
        let mut frame = Vec::with_capacity(2 + payload.len());
        frame.extend_from_slice(&len.to_be_bytes());
        frame.extend_from_slice(payload);
        tokio::time::timeout(self.config.write_timeout, socket.write_all(&frame))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "write timeout"))?
    }
}

/// `next('Z') = 'A'`, `next(c) = c + 1` otherwise, applied to the second
/// opcode character.
fn increment_opcode(opcode: [u8; 2]) -> [u8; 2] {
    let next = if opcode[1] == b'Z' { b'A' } else { opcode[1] + 1 };
    [opcode[0], next]
}
