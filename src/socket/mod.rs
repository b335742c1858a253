//! Live WebSocket sessions keyed by channel, with per-channel transcripts.
mod registry;
mod transcript;


pub use registry::{SocketRegistry, SocketState, channel_url};
pub use transcript::{Direction, MessageEnvelope, Payload, Speaker, TranscriptEntry};
