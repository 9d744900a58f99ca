mod error;
mod stream;
mod transport;
mod websocket;

pub mod file;

pub use error::TransportError;
pub use stream::FramedTransport;
pub use transport::Transport;
pub use websocket::WebSocketTransport;
