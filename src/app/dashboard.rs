use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use url::Url;

use crate::args::{DEFAULT_BATCH_PATH, ResourceKind};
use crate::error::{AppError, AppResult, ExportError, HttpError, SocketError, ValidationError};
use crate::http::{
    AggregateStats, BatchRunner, ClientSettings, ConcurrentParams, HttpProbeRunner, ProbeRequest,
    RemoteLoadTrigger, StressParams, SystemInfo, build_client,
};
use crate::records::{LatencySummary, LogStats, Outcome, ResultLog, TestRecord};
use crate::report::{LoadKind, Notice, Reporter};
use crate::socket::{MessageEnvelope, SocketRegistry, TranscriptEntry, channel_url};

use super::export::write_export;

#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub base_url: Url,
    pub ws_url: String,
    pub client: ClientSettings,
    /// Applied to every single probe before the probe's own headers.
    pub default_headers: Vec<(String, String)>,
    pub export_dir: PathBuf,
}

/// The orchestrating context. Owns the result log and the socket registry;
/// every action reports through the [`Reporter`] and turns failures into
/// notices instead of errors.
pub struct Dashboard {
    log: ResultLog,
    runner: HttpProbeRunner,
    batch: BatchRunner,
    remote: RemoteLoadTrigger,
    sockets: SocketRegistry,
    reporter: Arc<dyn Reporter>,
    ws_url: String,
    default_headers: Vec<(String, String)>,
    export_dir: PathBuf,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("records", &self.log.len())
            .field("base_url", self.runner.base_url())
            .field("ws_url", &self.ws_url)
            .field("export_dir", &self.export_dir)
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn new(settings: DashboardSettings, reporter: Arc<dyn Reporter>) -> AppResult<Self> {
        let client = build_client(&settings.client)?;
        let runner = HttpProbeRunner::new(client.clone(), settings.base_url.clone());
        Ok(Self {
            log: ResultLog::new(),
            batch: BatchRunner::new(runner.clone()),
            runner,
            remote: RemoteLoadTrigger::new(client, settings.base_url),
            sockets: SocketRegistry::new(
                Arc::clone(&reporter),
                settings.client.connect_timeout,
            ),
            reporter,
            ws_url: settings.ws_url,
            default_headers: settings.default_headers,
            export_dir: settings.export_dir,
        })
    }

    #[must_use]
    pub const fn log(&self) -> &ResultLog {
        &self.log
    }

    #[must_use]
    pub const fn sockets(&self) -> &SocketRegistry {
        &self.sockets
    }

    /// Runs one probe and appends its record.
    pub async fn test_http(&mut self, request: ProbeRequest) -> Option<TestRecord> {
        if request.url.trim().is_empty() {
            self.decline(&AppError::validation(ValidationError::MissingUrl));
            return None;
        }
        let mut prepared = ProbeRequest::new(request.method, request.url.trim());
        for (name, value) in &self.default_headers {
            prepared.set_header(name, value.as_str());
        }
        for (name, value) in request.headers {
            prepared.set_header(&name, value);
        }
        prepared.body = request.body;

        let record = self.runner.run(&prepared).await;
        if let Outcome::Error(facet) = record.outcome() {
            self.notify(Notice::danger(format!("Request failed: {}", facet.message)));
        }
        self.append(record.clone());
        Some(record)
    }

    /// Clears the log, then probes `url` (or the default test path) with
    /// every method in order.
    pub async fn test_all_methods(&mut self, url: Option<&str>) -> Option<Vec<TestRecord>> {
        let target = url
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_BATCH_PATH);
        self.log.clear();
        self.reporter.stats(&self.log.stats());
        self.notify(Notice::info(format!("Testing all methods against {}", target)));

        let mut records = Vec::new();
        let log = &mut self.log;
        let reporter = &self.reporter;
        self.batch
            .run_all_with(target, |record| {
                reporter.record(&record);
                log.append(record.clone());
                reporter.stats(&log.stats());
                records.push(record);
            })
            .await;

        let succeeded = records.iter().filter(|record| record.success()).count();
        self.notify(Notice::success(format!(
            "All methods tested: {}/{} succeeded",
            succeeded,
            records.len()
        )));
        Some(records)
    }

    pub async fn test_concurrent(&self, params: ConcurrentParams) -> Option<AggregateStats> {
        self.notify(Notice::info(format!(
            "Starting concurrent test: concurrency={}, requests={}, delay={}ms",
            params.concurrency.get(),
            params.requests.get(),
            params.delay_ms
        )));
        let result = self.remote.trigger_concurrent(params).await;
        self.finish_load(LoadKind::Concurrent, result)
    }

    pub async fn test_stress(&self, params: StressParams) -> Option<AggregateStats> {
        self.notify(Notice::info(format!(
            "Starting stress test: duration={}s, concurrency={}",
            params.duration_secs.get(),
            params.concurrency.get()
        )));
        let result = self.remote.trigger_stress(params).await;
        self.finish_load(LoadKind::Stress, result)
    }

    fn finish_load(
        &self,
        kind: LoadKind,
        result: Result<AggregateStats, HttpError>,
    ) -> Option<AggregateStats> {
        match result {
            Ok(stats) => {
                self.reporter.aggregate(kind, &stats);
                self.notify(Notice::success(format!("{} completed", kind.label())));
                Some(stats)
            }
            Err(err) => {
                self.notify(Notice::danger(format!("{} failed: {}", kind.label(), err)));
                None
            }
        }
    }

    pub async fn load_system_info(&self) -> Option<SystemInfo> {
        match self.remote.system_info().await {
            Ok(info) => {
                self.reporter.system_info(&info);
                Some(info)
            }
            Err(err) => {
                self.notify(Notice::danger(format!(
                    "Failed to load system info: {}",
                    err
                )));
                None
            }
        }
    }

    pub async fn test_resource(&self, kind: ResourceKind) -> Option<serde_json::Value> {
        self.notify(Notice::info(format!("Running {} test", kind.label())));
        match self.remote.resource_test(kind).await {
            Ok(data) => {
                self.reporter.resource(kind, &data);
                self.notify(Notice::success(format!("{} test completed", kind.label())));
                Some(data)
            }
            Err(err) => {
                self.notify(Notice::danger(format!(
                    "{} test failed: {}",
                    kind.label(),
                    err
                )));
                None
            }
        }
    }

    /// Opens `channel`, at `url` when given, else at the URL derived from the
    /// configured WebSocket URL. Returns the URL used.
    pub async fn connect_socket(&self, channel: &str, url: Option<&str>) -> Option<String> {
        let channel = channel.trim();
        if channel.is_empty() {
            self.decline(&AppError::validation(ValidationError::MissingChannel));
            return None;
        }
        let target = url.map_or_else(
            || channel_url(&self.ws_url, channel),
            |explicit| explicit.trim().to_owned(),
        );
        if let Err(source) = Url::parse(&target) {
            self.decline(&AppError::validation(ValidationError::InvalidSocketUrl {
                url: target,
                source,
            }));
            return None;
        }
        match self.sockets.connect(channel, &target).await {
            Ok(()) => {
                info!("WebSocket channel '{}' connected to {}", channel, target);
                self.notify(Notice::success(format!(
                    "WebSocket '{}' connected",
                    channel
                )));
                Some(target)
            }
            Err(err) => {
                self.decline(&AppError::socket(err));
                None
            }
        }
    }

    #[must_use]
    pub fn send_socket(&self, channel: &str, text: &str) -> Option<MessageEnvelope> {
        match self.sockets.send(channel.trim(), text) {
            Ok(envelope) => Some(envelope),
            Err(err) => {
                self.decline(&err);
                None
            }
        }
    }

    #[must_use]
    pub fn disconnect_socket(&self, channel: &str) -> Option<()> {
        match self.sockets.disconnect(channel.trim()) {
            Ok(()) => {
                info!("WebSocket channel '{}' disconnected", channel.trim());
                self.notify(Notice::info(format!(
                    "WebSocket '{}' disconnected",
                    channel.trim()
                )));
                Some(())
            }
            Err(err) => {
                self.decline(&AppError::socket(err));
                None
            }
        }
    }

    /// Empties the log and every transcript. Live sessions stay open.
    pub fn clear(&mut self) {
        self.log.clear();
        self.sockets.clear_transcripts();
        self.reporter.stats(&self.log.stats());
        self.notify(Notice::info("Results cleared"));
    }

    pub async fn export(&self) -> Option<PathBuf> {
        match write_export(&self.export_dir, &self.log).await {
            Ok(path) => {
                self.notify(Notice::success(format!(
                    "Exported {} results to {}",
                    self.log.len(),
                    path.display()
                )));
                Some(path)
            }
            Err(err) => {
                self.decline(&AppError::export(err));
                None
            }
        }
    }

    #[must_use]
    pub fn stats(&self) -> LogStats {
        self.log.stats()
    }

    /// Reports the current stats and latency distribution.
    #[must_use]
    pub fn report_summary(&self) -> Option<LatencySummary> {
        self.reporter.stats(&self.log.stats());
        match self.log.latency() {
            Ok(latency) => {
                self.reporter.latency(&latency);
                Some(latency)
            }
            Err(err) => {
                self.decline(&AppError::metrics(err));
                None
            }
        }
    }

    #[must_use]
    pub fn transcript(&self, channel: &str) -> Vec<TranscriptEntry> {
        self.sockets.transcript(channel.trim())
    }

    /// Replays a channel's stored transcript through the reporter.
    #[must_use]
    pub fn report_transcript(&self, channel: &str) -> usize {
        let entries = self.transcript(channel);
        if entries.is_empty() {
            self.notify(Notice::info(format!(
                "No transcript for '{}'",
                channel.trim()
            )));
        }
        for entry in &entries {
            self.reporter.transcript(channel.trim(), entry);
        }
        entries.len()
    }

    /// Closes every live WebSocket session.
    pub fn shutdown(&self) {
        self.sockets.disconnect_all();
    }

    fn append(&mut self, record: TestRecord) {
        self.reporter.record(&record);
        self.log.append(record);
        self.reporter.stats(&self.log.stats());
    }

    pub fn notify(&self, notice: Notice) {
        self.reporter.notice(&notice);
    }

    /// Reports input rejected before it reached the dashboard.
    pub fn reject(&self, err: ValidationError) {
        self.decline(&AppError::validation(err));
    }

    fn decline(&self, err: &AppError) {
        warn!("{}", err);
        self.notify(notice_for(err));
    }
}

/// User mistakes and state conflicts are warnings; everything else is danger.
fn notice_for(err: &AppError) -> Notice {
    let message = match err {
        AppError::Validation(inner) => return Notice::warning(inner.to_string()),
        AppError::Socket(inner) => match inner {
            SocketError::AlreadyConnected { .. }
            | SocketError::NotConnected { .. }
            | SocketError::NothingToDisconnect { .. } => {
                return Notice::warning(inner.to_string());
            }
            SocketError::ConnectFailed { .. }
            | SocketError::ConnectTimeout { .. }
            | SocketError::EncodeEnvelope { .. }
            | SocketError::SendFailed { .. } => inner.to_string(),
        },
        AppError::Export(inner) => match inner {
            ExportError::EmptyLog => return Notice::warning(inner.to_string()),
            ExportError::Encode { .. } | ExportError::Write { .. } => inner.to_string(),
        },
        AppError::Io { .. }
        | AppError::Clap { .. }
        | AppError::Json { .. }
        | AppError::Config(_)
        | AppError::Http(_)
        | AppError::Metrics(_)
        | AppError::ActionFailed { .. } => err.to_string(),
    };
    Notice::danger(message)
}
