use thiserror::Error;

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("WebSocket channel '{channel}' is already connected.")]
    AlreadyConnected { channel: String },
    #[error("WebSocket channel '{channel}' is not connected. Connect first.")]
    NotConnected { channel: String },
    #[error("No active WebSocket connection on '{channel}' to disconnect.")]
    NothingToDisconnect { channel: String },
    #[error("WebSocket connect to '{url}' failed: {source}")]
    ConnectFailed {
        url: String,
        #[source]
        source: Box<tokio_tungstenite::tungstenite::Error>,
    },
    #[error("WebSocket connect to '{url}' timed out after {timeout_ms}ms.")]
    ConnectTimeout { url: String, timeout_ms: u128 },
    #[error("Failed to encode message envelope: {source}")]
    EncodeEnvelope {
        #[source]
        source: serde_json::Error,
    },
    #[error("WebSocket channel '{channel}' closed before the message was sent.")]
    SendFailed { channel: String },
}
