use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use super::transcript::{Direction, MessageEnvelope, Payload, Speaker, TranscriptEntry};
use crate::error::{AppResult, SocketError, ValidationError};
use crate::report::Reporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SocketState {
    Disconnected,
    Connecting,
    Connected,
}

/// Derives a channel endpoint from the configured connect URL by replacing
/// its first `/connect` segment. URLs without one are used unchanged.
#[must_use]
pub fn channel_url(ws_url: &str, channel: &str) -> String {
    ws_url.replacen("/connect", &format!("/{}", channel), 1)
}

struct Slot {
    generation: u64,
    state: SocketState,
    outbound: Option<mpsc::UnboundedSender<Message>>,
}

#[derive(Default)]
struct RegistryState {
    slots: HashMap<String, Slot>,
    transcripts: HashMap<String, Vec<TranscriptEntry>>,
    next_generation: u64,
}

/// At most one live session per channel. Transcripts outlive their sessions.
#[derive(Clone)]
pub struct SocketRegistry {
    shared: Arc<Mutex<RegistryState>>,
    reporter: Arc<dyn Reporter>,
    connect_timeout: Duration,
}

impl std::fmt::Debug for SocketRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketRegistry")
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}

impl SocketRegistry {
    pub fn new(reporter: Arc<dyn Reporter>, connect_timeout: Duration) -> Self {
        Self {
            shared: Arc::new(Mutex::new(RegistryState::default())),
            reporter,
            connect_timeout,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn state(&self, channel: &str) -> SocketState {
        self.lock()
            .slots
            .get(channel)
            .map_or(SocketState::Disconnected, |slot| slot.state)
    }

    #[must_use]
    pub fn live_channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self.lock().slots.keys().cloned().collect();
        channels.sort();
        channels
    }

    #[must_use]
    pub fn transcript(&self, channel: &str) -> Vec<TranscriptEntry> {
        self.lock()
            .transcripts
            .get(channel)
            .cloned()
            .unwrap_or_default()
    }

    pub fn clear_transcripts(&self) {
        self.lock().transcripts.clear();
    }

    /// Opens a session for `channel` and starts pumping its frames into the transcript.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel already has a session, or when the
    /// handshake fails or times out.
    pub async fn connect(&self, channel: &str, url: &str) -> Result<(), SocketError> {
        let generation = {
            let mut state = self.lock();
            if state.slots.contains_key(channel) {
                return Err(SocketError::AlreadyConnected {
                    channel: channel.to_owned(),
                });
            }
            let generation = state.next_generation;
            state.next_generation = generation.wrapping_add(1);
            state.slots.insert(
                channel.to_owned(),
                Slot {
                    generation,
                    state: SocketState::Connecting,
                    outbound: None,
                },
            );
            generation
        };
        self.reporter.socket_state(channel, SocketState::Connecting);
        debug!("Connecting WebSocket channel '{}' to {}", channel, url);

        let stream = match timeout(self.connect_timeout, connect_async(url)).await {
            Ok(Ok((stream, _response))) => stream,
            Ok(Err(err)) => {
                let err = SocketError::ConnectFailed {
                    url: url.to_owned(),
                    source: Box::new(err),
                };
                self.fail_connect(channel, generation, &err);
                return Err(err);
            }
            Err(_) => {
                let err = SocketError::ConnectTimeout {
                    url: url.to_owned(),
                    timeout_ms: self.connect_timeout.as_millis(),
                };
                self.fail_connect(channel, generation, &err);
                return Err(err);
            }
        };

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        {
            let mut state = self.lock();
            match state.slots.get_mut(channel) {
                Some(slot) if slot.generation == generation => {
                    slot.state = SocketState::Connected;
                    slot.outbound = Some(outbound_tx);
                }
                Some(_) | None => {
                    return Err(SocketError::NotConnected {
                        channel: channel.to_owned(),
                    });
                }
            }
            self.push_entry(
                &mut state,
                channel,
                TranscriptEntry::system("Connection established", Direction::Info),
            );
        }
        self.reporter.socket_state(channel, SocketState::Connected);

        let registry = self.clone();
        let channel_key = channel.to_owned();
        tokio::spawn(async move {
            registry
                .pump(channel_key, generation, stream, outbound_rx)
                .await;
        });
        Ok(())
    }

    /// Sends `text` wrapped in a message envelope and records it as a client entry.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel has no open session, when `text` is
    /// empty, or when the session closed underneath the send.
    pub fn send(&self, channel: &str, text: &str) -> AppResult<MessageEnvelope> {
        let mut state = self.lock();
        let outbound = state
            .slots
            .get(channel)
            .filter(|slot| slot.state == SocketState::Connected)
            .and_then(|slot| slot.outbound.clone())
            .ok_or_else(|| SocketError::NotConnected {
                channel: channel.to_owned(),
            })?;
        if text.is_empty() {
            return Err(ValidationError::MissingMessage.into());
        }

        let envelope = MessageEnvelope::message(text);
        let encoded = serde_json::to_string(&envelope)
            .map_err(|source| SocketError::EncodeEnvelope { source })?;
        outbound
            .send(Message::Text(encoded.clone()))
            .map_err(|err| {
                debug!("Outbound queue for '{}' is closed: {}", channel, err);
                SocketError::SendFailed {
                    channel: channel.to_owned(),
                }
            })?;
        self.push_entry(
            &mut state,
            channel,
            TranscriptEntry::new(
                Speaker::Client,
                Payload::parse_lenient(&encoded),
                Direction::Sent,
            ),
        );
        Ok(envelope)
    }

    /// Closes the channel's session.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel has no session.
    pub fn disconnect(&self, channel: &str) -> Result<(), SocketError> {
        {
            let mut state = self.lock();
            if state.slots.remove(channel).is_none() {
                return Err(SocketError::NothingToDisconnect {
                    channel: channel.to_owned(),
                });
            }
            self.push_entry(
                &mut state,
                channel,
                TranscriptEntry::system("Connection closed", Direction::Info),
            );
        }
        self.reporter
            .socket_state(channel, SocketState::Disconnected);
        Ok(())
    }

    /// Closes every live session. Used on shutdown.
    pub fn disconnect_all(&self) {
        for channel in self.live_channels() {
            if let Err(err) = self.disconnect(&channel) {
                debug!("{}", err);
            }
        }
    }

    fn fail_connect(&self, channel: &str, generation: u64, err: &SocketError) {
        {
            let mut state = self.lock();
            remove_if_current(&mut state, channel, generation);
            self.push_entry(
                &mut state,
                channel,
                TranscriptEntry::system(err.to_string(), Direction::Error),
            );
        }
        self.reporter
            .socket_state(channel, SocketState::Disconnected);
    }

    fn push_entry(&self, state: &mut RegistryState, channel: &str, entry: TranscriptEntry) {
        self.reporter.transcript(channel, &entry);
        state
            .transcripts
            .entry(channel.to_owned())
            .or_default()
            .push(entry);
    }

    fn append(&self, channel: &str, entry: TranscriptEntry) {
        let mut state = self.lock();
        self.push_entry(&mut state, channel, entry);
    }

    async fn pump(
        &self,
        channel: String,
        generation: u64,
        stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
        mut outbound: mpsc::UnboundedReceiver<Message>,
    ) {
        let (mut sink, mut source) = stream.split();
        loop {
            tokio::select! {
                queued = outbound.recv() => {
                    let Some(message) = queued else {
                        // Local disconnect: the slot and its sender are gone.
                        if let Err(err) = sink.close().await {
                            debug!("Closing WebSocket channel '{}' failed: {}", channel, err);
                        }
                        return;
                    };
                    if let Err(err) = sink.send(message).await {
                        warn!("WebSocket send on '{}' failed: {}", channel, err);
                        self.append(
                            &channel,
                            TranscriptEntry::system(format!("Send failed: {}", err), Direction::Error),
                        );
                        break;
                    }
                }
                incoming = source.next() => {
                    match incoming {
                        Some(Ok(Message::Text(text))) => self.receive(&channel, &text),
                        Some(Ok(Message::Binary(bytes))) => {
                            self.receive(&channel, &String::from_utf8_lossy(&bytes));
                        }
                        Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Err(err)) => {
                            warn!("WebSocket channel '{}' failed: {}", channel, err);
                            self.append(
                                &channel,
                                TranscriptEntry::system(format!("Connection error: {}", err), Direction::Error),
                            );
                            break;
                        }
                    }
                }
            }
        }
        self.remote_closed(&channel, generation);
    }

    fn receive(&self, channel: &str, text: &str) {
        self.append(
            channel,
            TranscriptEntry::new(Speaker::Server, Payload::parse_lenient(text), Direction::Received),
        );
    }

    fn remote_closed(&self, channel: &str, generation: u64) {
        let removed = {
            let mut state = self.lock();
            let removed = remove_if_current(&mut state, channel, generation);
            if removed {
                self.push_entry(
                    &mut state,
                    channel,
                    TranscriptEntry::system("Connection closed by server", Direction::Info),
                );
            }
            removed
        };
        if removed {
            self.reporter
                .socket_state(channel, SocketState::Disconnected);
        }
    }
}

fn remove_if_current(state: &mut RegistryState, channel: &str, generation: u64) -> bool {
    let current = state
        .slots
        .get(channel)
        .is_some_and(|slot| slot.generation == generation);
    if current {
        state.slots.remove(channel);
    }
    current
}
