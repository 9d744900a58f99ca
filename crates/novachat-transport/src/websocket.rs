//! Production transport backend: axum's `WebSocket` extractor. Each binary
//! message is exactly one L0 frame; the websocket layer already frames
//! messages, so no length-prefix reassembly is needed here (contrast
//! `stream.rs`, used for tests over a raw duplex stream).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use novachat_protocol::MAX_FRAME;
use tokio::sync::Mutex as AsyncMutex;

use crate::TransportError;

pub struct WebSocketTransport {
    inner: Arc<Inner>,
}

struct Inner {
    sink: AsyncMutex<SplitSink<WebSocket, Message>>,
    stream: AsyncMutex<SplitStream<WebSocket>>,
    closed: AtomicBool,
}

impl WebSocketTransport {
    pub fn new(socket: WebSocket) -> Self {
        let (sink, stream) = socket.split();
        WebSocketTransport {
            inner: Arc::new(Inner {
                sink: AsyncMutex::new(sink),
                stream: AsyncMutex::new(stream),
                closed: AtomicBool::new(false),
            }),
        }
    }
}

impl Clone for WebSocketTransport {
    fn clone(&self) -> Self {
        WebSocketTransport {
            inner: self.inner.clone(),
        }
    }
}

impl crate::Transport for WebSocketTransport {
    async fn read_frame(&self) -> Result<Option<Vec<u8>>, TransportError> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        let mut stream = self.inner.stream.lock().await;
        loop {
            match stream.next().await {
                None => return Ok(None),
                Some(Ok(Message::Close(_))) => return Ok(None),
                Some(Ok(Message::Binary(bytes))) => {
                    if bytes.len() > MAX_FRAME {
                        return Err(TransportError::FrameTooLarge {
                            len: bytes.len(),
                            max: MAX_FRAME,
                        });
                    }
                    return Ok(Some(bytes.to_vec()));
                }
                // Text/Ping/Pong carry no protocol meaning here; axum answers
                // pings itself, so these are just skipped.
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(TransportError::Io(std::io::Error::other(e))),
            }
        }
    }

    async fn write_frame(&self, bytes: Vec<u8>) -> Result<(), TransportError> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        let mut sink = self.inner.sink.lock().await;
        sink.send(Message::Binary(bytes.into()))
            .await
            .map_err(|e| TransportError::Io(std::io::Error::other(e)))
    }

    fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }

    fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}
