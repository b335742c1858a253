use chrono::DateTime;

use crate::args::ResourceKind;
use crate::http::{AggregateStats, SystemInfo};
use crate::records::{LatencySummary, LogStats, Outcome, TestRecord};
use crate::report::{LoadKind, Notice, NoticeLevel, Reporter};
use crate::socket::{SocketState, TranscriptEntry};

use super::formatting::{format_bytes, format_duration, indent, pretty_body, truncate_chars};

const BODY_PREVIEW_CHARS: usize = 4_000;

pub(crate) fn render_record(record: &TestRecord, show_headers: bool) -> String {
    let request = record.request();
    let verdict = if record.success() { "OK" } else { "FAILED" };
    let mut lines = vec![format!(
        "#{} [{}] {} {}",
        record.id().get(),
        verdict,
        request.method,
        request.url
    )];
    match record.outcome() {
        Outcome::Response(response) => {
            lines.push(format!(
                "  status: {} {}  time: {} ms  size: {}",
                response.status,
                response.status_text,
                response.elapsed_ms,
                format_bytes(u64::try_from(response.body.len()).unwrap_or(u64::MAX))
            ));
            if show_headers {
                for (name, value) in &response.headers {
                    lines.push(format!("  {}: {}", name, value));
                }
            }
            if !response.body.is_empty() {
                let body = truncate_chars(&pretty_body(&response.body), BODY_PREVIEW_CHARS);
                lines.push(indent(&body, "    "));
            }
        }
        Outcome::Error(facet) => lines.push(format!("  error: {}", facet.message)),
    }
    lines.join("\n")
}

pub(crate) fn render_stats(stats: &LogStats) -> String {
    format!(
        "total: {}  success: {}  failed: {}  success rate: {}%",
        stats.total, stats.success_count, stats.failed_count, stats.success_rate
    )
}

pub(crate) fn render_latency(latency: &LatencySummary) -> String {
    format!(
        "latency ms (n={}): min {}  avg {}  max {}  p50 {}  p90 {}  p99 {}",
        latency.count,
        latency.min_ms,
        latency.avg_ms,
        latency.max_ms,
        latency.p50_ms,
        latency.p90_ms,
        latency.p99_ms
    )
}

fn render_epoch(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0).map_or_else(|| secs.to_string(), |time| time.to_rfc3339())
}

pub(crate) fn render_aggregate(kind: LoadKind, stats: &AggregateStats) -> String {
    [
        format!("{} results:", kind.label()),
        format!("  total requests: {}", stats.total_requests),
        format!("  successful: {}", stats.success_requests),
        format!("  failed: {}", stats.failed_requests),
        format!(
            "  response ms: avg {}  min {}  max {}",
            stats.average_response_ms, stats.min_response_ms, stats.max_response_ms
        ),
        format!("  requests/s: {:.2}", stats.requests_per_second),
        format!(
            "  duration: {}",
            format_duration(stats.duration_ms.checked_div(1_000).unwrap_or(0))
        ),
        format!(
            "  window: {} .. {}",
            render_epoch(stats.start_time),
            render_epoch(stats.end_time)
        ),
    ]
    .join("\n")
}

pub(crate) fn render_system_info(info: &SystemInfo) -> String {
    let mut lines = vec!["System info:".to_owned()];
    if let Some(version) = &info.go_version {
        lines.push(format!("  runtime: {}", version));
    }
    lines.push(format!("  cpus: {}", info.cpu_count));
    lines.push(format!("  goroutines: {}", info.goroutine_count));
    lines.push(format!(
        "  memory: alloc {:.2} MB  sys {:.2} MB  heap objects {}",
        info.memory.alloc_mb, info.memory.sys_mb, info.memory.heap_objects
    ));
    if let (Some(heap_alloc), Some(heap_sys)) = (info.memory.heap_alloc, info.memory.heap_sys) {
        lines.push(format!(
            "  heap: alloc {}  sys {}",
            format_bytes(heap_alloc),
            format_bytes(heap_sys)
        ));
    }
    lines.push(format!(
        "  gc: runs {}  total pause {} ns",
        info.gc.num_gc, info.gc.pause_total_ns
    ));
    lines.push(format!("  as of: {}", render_epoch(info.timestamp)));
    lines.join("\n")
}

pub(crate) fn render_resource(kind: ResourceKind, data: &serde_json::Value) -> String {
    let body = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
    format!("{} test result:\n{}", kind.label(), indent(&body, "  "))
}

pub(crate) fn render_transcript_entry(channel: &str, entry: &TranscriptEntry) -> String {
    let payload = entry.payload.to_string();
    let header = format!(
        "[{}] ws/{} {} ({})",
        entry.timestamp.format("%H:%M:%S%.3f"),
        channel,
        entry.sender.label(),
        entry.direction.as_str()
    );
    if payload.contains('\n') {
        format!("{}\n{}", header, indent(&payload, "    "))
    } else {
        format!("{} {}", header, payload)
    }
}

pub(crate) const fn notice_tag(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "success",
        NoticeLevel::Warning => "warning",
        NoticeLevel::Danger => "error",
    }
}

/// Prints everything to the terminal. Warnings and errors go to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    show_headers: bool,
}

impl ConsoleReporter {
    #[must_use]
    pub const fn new(show_headers: bool) -> Self {
        Self { show_headers }
    }
}

impl Reporter for ConsoleReporter {
    fn record(&self, record: &TestRecord) {
        println!("{}", render_record(record, self.show_headers));
    }

    fn stats(&self, stats: &LogStats) {
        println!("{}", render_stats(stats));
    }

    fn latency(&self, latency: &LatencySummary) {
        println!("{}", render_latency(latency));
    }

    fn notice(&self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Info | NoticeLevel::Success => {
                println!("[{}] {}", notice_tag(notice.level), notice.message);
            }
            NoticeLevel::Warning | NoticeLevel::Danger => {
                eprintln!("[{}] {}", notice_tag(notice.level), notice.message);
            }
        }
    }

    fn socket_state(&self, channel: &str, state: SocketState) {
        let label = match state {
            SocketState::Disconnected => "disconnected",
            SocketState::Connecting => "connecting",
            SocketState::Connected => "connected",
        };
        println!("ws/{}: {}", channel, label);
    }

    fn transcript(&self, channel: &str, entry: &TranscriptEntry) {
        println!("{}", render_transcript_entry(channel, entry));
    }

    fn aggregate(&self, kind: LoadKind, stats: &AggregateStats) {
        println!("{}", render_aggregate(kind, stats));
    }

    fn system_info(&self, info: &SystemInfo) {
        println!("{}", render_system_info(info));
    }

    fn resource(&self, kind: ResourceKind, data: &serde_json::Value) {
        println!("{}", render_resource(kind, data));
    }
}
