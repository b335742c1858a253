use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{accept_async, tungstenite::Message};

use crate::args::ResourceKind;
use crate::error::{AppError, AppResult};
use crate::http::{AggregateStats, SystemInfo};
use crate::records::{LogStats, RecordId, TestRecord};
use crate::report::{LoadKind, Notice, Reporter};
use crate::socket::{SocketState, TranscriptEntry};

pub(crate) const TEST_TIMEOUT: Duration = Duration::from_secs(2);

pub(crate) fn run_async_test<F>(future: F) -> AppResult<()>
where
    F: Future<Output = AppResult<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::validation(format!("Failed to build runtime: {}", err)))?;
    runtime.block_on(future)
}

/// Polls `condition` until it holds or the test timeout passes.
pub(crate) async fn wait_for<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    timeout(TEST_TIMEOUT, async {
        while !condition() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok()
}

/// A base URL nothing is listening on.
pub(crate) fn closed_port_url() -> AppResult<String> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}", addr))
}

#[derive(Debug, Clone)]
pub(crate) struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl CapturedRequest {
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

pub(crate) type Responder = fn(&CapturedRequest) -> (u16, &'static str, String);

/// One request per connection; every response carries `X-Probe` twice.
pub(crate) struct TestServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    task: JoinHandle<()>,
}

impl TestServer {
    pub(crate) async fn spawn(responder: Responder) -> AppResult<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let requests = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&requests);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let captured = Arc::clone(&captured);
                tokio::spawn(async move {
                    serve_connection(stream, responder, &captured).await;
                });
            }
        });
        Ok(Self {
            base_url: format!("http://{}", addr),
            requests,
            task,
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn requests(&self) -> Vec<CapturedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub(crate) fn ok_json(_request: &CapturedRequest) -> (u16, &'static str, String) {
    (200, "OK", r#"{"ok":true}"#.to_owned())
}

async fn serve_connection(
    mut stream: TcpStream,
    responder: Responder,
    captured: &Mutex<Vec<CapturedRequest>>,
) {
    let Some(request) = read_request(&mut stream).await else {
        return;
    };
    let (status, reason, body) = responder(&request);
    let mut response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nX-Probe: one\r\nX-Probe: two\r\nConnection: close\r\n\r\n",
        status,
        reason,
        body.len()
    );
    if request.method != "HEAD" {
        response.push_str(&body);
    }
    captured
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(request);
    if stream.write_all(response.as_bytes()).await.is_ok() {
        drop(stream.flush().await);
    }
    drop(stream.shutdown().await);
}

async fn read_request(stream: &mut TcpStream) -> Option<CapturedRequest> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        if let Some(position) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
            break position;
        }
        let read = stream.read(&mut chunk).await.ok()?;
        if read == 0 {
            return None;
        }
        buffer.extend_from_slice(chunk.get(..read)?);
    };

    let head = String::from_utf8_lossy(buffer.get(..header_end)?).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_owned();
    let path = request_line.next()?.to_owned();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_owned()))
        .collect();
    let content_length = headers
        .iter()
        .find(|(name, _)| name == "content-length")
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buffer
        .get(header_end.saturating_add(4)..)
        .map(<[u8]>::to_vec)
        .unwrap_or_default();
    while body.len() < content_length {
        let read = stream.read(&mut chunk).await.ok()?;
        if read == 0 {
            break;
        }
        body.extend_from_slice(chunk.get(..read)?);
    }

    Some(CapturedRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum WsBehavior {
    /// Echoes every text frame back.
    Echo,
    /// Sends one text frame and closes.
    GreetThenClose(&'static str),
}

/// WebSocket server accepting connections until the handle is aborted.
/// Returns a `ws://host:port/ws/connect` URL.
pub(crate) async fn spawn_ws_server(behavior: WsBehavior) -> AppResult<(String, JoinHandle<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let task = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(mut ws) = accept_async(stream).await else {
                    return;
                };
                match behavior {
                    WsBehavior::Echo => {
                        while let Some(Ok(message)) = ws.next().await {
                            match message {
                                Message::Text(text) => {
                                    if ws.send(Message::Text(text)).await.is_err() {
                                        break;
                                    }
                                }
                                Message::Close(_) => break,
                                Message::Binary(_)
                                | Message::Ping(_)
                                | Message::Pong(_)
                                | Message::Frame(_) => {}
                            }
                        }
                    }
                    WsBehavior::GreetThenClose(text) => {
                        if ws.send(Message::Text(text.to_owned())).await.is_ok() {
                            drop(ws.close(None).await);
                        }
                    }
                }
            });
        }
    });
    Ok((format!("ws://{}/ws/connect", addr), task))
}

#[derive(Debug, Clone)]
pub(crate) enum Reported {
    Record(RecordId),
    Stats(LogStats),
    Notice(Notice),
    SocketState(String, SocketState),
    Transcript(String, TranscriptEntry),
    Aggregate(LoadKind, AggregateStats),
    SystemInfo(SystemInfo),
    Resource(ResourceKind, serde_json::Value),
}

#[derive(Debug, Default)]
pub(crate) struct RecordingReporter {
    events: Mutex<Vec<Reported>>,
}

impl RecordingReporter {
    fn push(&self, event: Reported) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    pub(crate) fn events(&self) -> Vec<Reported> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn notices(&self) -> Vec<Notice> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Reported::Notice(notice) => Some(notice),
                Reported::Record(_)
                | Reported::Stats(_)
                | Reported::SocketState(..)
                | Reported::Transcript(..)
                | Reported::Aggregate(..)
                | Reported::SystemInfo(_)
                | Reported::Resource(..) => None,
            })
            .collect()
    }

    pub(crate) fn socket_states(&self, channel: &str) -> Vec<SocketState> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Reported::SocketState(name, state) if name == channel => Some(state),
                Reported::SocketState(..)
                | Reported::Record(_)
                | Reported::Stats(_)
                | Reported::Notice(_)
                | Reported::Transcript(..)
                | Reported::Aggregate(..)
                | Reported::SystemInfo(_)
                | Reported::Resource(..) => None,
            })
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn record(&self, record: &TestRecord) {
        self.push(Reported::Record(record.id()));
    }

    fn stats(&self, stats: &LogStats) {
        self.push(Reported::Stats(*stats));
    }

    fn notice(&self, notice: &Notice) {
        self.push(Reported::Notice(notice.clone()));
    }

    fn socket_state(&self, channel: &str, state: SocketState) {
        self.push(Reported::SocketState(channel.to_owned(), state));
    }

    fn transcript(&self, channel: &str, entry: &TranscriptEntry) {
        self.push(Reported::Transcript(channel.to_owned(), entry.clone()));
    }

    fn aggregate(&self, kind: LoadKind, stats: &AggregateStats) {
        self.push(Reported::Aggregate(kind, stats.clone()));
    }

    fn system_info(&self, info: &SystemInfo) {
        self.push(Reported::SystemInfo(info.clone()));
    }

    fn resource(&self, kind: ResourceKind, data: &serde_json::Value) {
        self.push(Reported::Resource(kind, data.clone()));
    }
}
