/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listener failed.
    #[error("bind failed: {0}")]
    BindFailed(#[source] std::io::Error),

    /// Accepting a TCP connection or completing the WebSocket upgrade failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// A frame was not valid UTF-8 text where text was required.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}
