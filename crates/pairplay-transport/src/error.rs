/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection description could not be understood by this transport.
    #[error("invalid connection description: {0}")]
    InvalidDescription(String),

    /// Negotiation was attempted in the wrong order (e.g. `complete` before
    /// `initiate`).
    #[error("negotiation out of order: {0}")]
    OutOfOrder(&'static str),

    /// The channel is not open.
    #[error("channel not open")]
    NotOpen,

    /// The connection was closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Establishing the connection failed.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),
}
