use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::args::{DEFAULT_CHANNEL, HttpMethod, PositiveU64, ResourceKind};
use crate::error::{AppResult, ValidationError};
use crate::http::{ConcurrentParams, ProbeRequest, StressParams};
use crate::report::Notice;

use super::Dashboard;

pub const SESSION_HELP: &str = "\
Commands:
  get|post|put|delete|patch|head|options <url> [body]
  batch [url]
  concurrent [concurrency requests delay_ms]
  stress [duration_secs concurrency]
  system
  resource <memory|cpu|network|fileio>
  ws connect [channel] [url]
  ws send <channel> <text>
  ws close [channel]
  transcript [channel]
  stats
  clear
  export
  help
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Probe {
        method: HttpMethod,
        url: String,
        body: Option<String>,
    },
    Batch {
        url: Option<String>,
    },
    Concurrent(ConcurrentParams),
    Stress(StressParams),
    System,
    Resource(ResourceKind),
    WsConnect {
        channel: String,
        url: Option<String>,
    },
    WsSend {
        channel: String,
        text: String,
    },
    WsClose {
        channel: String,
    },
    Transcript {
        channel: String,
    },
    Stats,
    Clear,
    Export,
    Help,
    Quit,
}

/// Splits off the first whitespace-delimited word.
fn split_word(text: &str) -> (&str, &str) {
    let trimmed = text.trim_start();
    trimmed
        .split_once(char::is_whitespace)
        .map_or((trimmed, ""), |(word, rest)| (word, rest.trim_start()))
}

/// Like [`split_word`], but only the single separator after the word is
/// dropped; the remainder is kept byte for byte.
fn split_payload(text: &str) -> (&str, &str) {
    let trimmed = text.trim_start();
    trimmed.split_once(char::is_whitespace).unwrap_or((trimmed, ""))
}

fn optional(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn channel_or_default(text: &str) -> String {
    optional(text).unwrap_or_else(|| DEFAULT_CHANNEL.to_owned())
}

fn positive_or(token: Option<&str>, fallback: PositiveU64) -> Result<PositiveU64, ValidationError> {
    token.map_or(Ok(fallback), str::parse)
}

fn parse_concurrent(rest: &str) -> Result<ConcurrentParams, ValidationError> {
    let defaults = ConcurrentParams::default();
    let mut tokens = rest.split_whitespace();
    let concurrency = positive_or(tokens.next(), defaults.concurrency)?;
    let requests = positive_or(tokens.next(), defaults.requests)?;
    let delay_ms = tokens.next().map_or(Ok(defaults.delay_ms), |token| {
        token
            .parse::<u64>()
            .map_err(|source| ValidationError::InvalidNumber { source })
    })?;
    Ok(ConcurrentParams {
        concurrency,
        requests,
        delay_ms,
    })
}

fn parse_stress(rest: &str) -> Result<StressParams, ValidationError> {
    let defaults = StressParams::default();
    let mut tokens = rest.split_whitespace();
    Ok(StressParams {
        duration_secs: positive_or(tokens.next(), defaults.duration_secs)?,
        concurrency: positive_or(tokens.next(), defaults.concurrency)?,
    })
}

fn parse_ws(rest: &str) -> Result<SessionCommand, ValidationError> {
    let (action, args) = split_word(rest);
    match action.to_ascii_lowercase().as_str() {
        "connect" | "open" => {
            let (channel, url) = split_word(args);
            Ok(SessionCommand::WsConnect {
                channel: channel_or_default(channel),
                url: optional(url),
            })
        }
        "send" => {
            let (channel, text) = split_payload(args);
            if channel.is_empty() {
                return Err(ValidationError::MissingChannel);
            }
            if text.is_empty() {
                return Err(ValidationError::MissingMessage);
            }
            Ok(SessionCommand::WsSend {
                channel: channel.to_owned(),
                text: text.to_owned(),
            })
        }
        "close" | "disconnect" => Ok(SessionCommand::WsClose {
            channel: channel_or_default(args),
        }),
        "" => Err(ValidationError::MissingArgument {
            name: "ws action (connect, send, close)",
        }),
        other => Err(ValidationError::UnknownCommand {
            value: format!("ws {}", other),
        }),
    }
}

/// Parses one input line. Blank lines yield `None`.
///
/// # Errors
///
/// Returns an error when the command is unknown or its arguments are invalid.
pub fn parse_command(line: &str) -> Result<Option<SessionCommand>, ValidationError> {
    let (word, rest) = split_word(line);
    if word.is_empty() {
        return Ok(None);
    }
    let keyword = word.to_ascii_lowercase();
    if let Ok(method) = keyword.parse::<HttpMethod>() {
        let (url, body) = split_payload(rest);
        if url.is_empty() {
            return Err(ValidationError::MissingUrl);
        }
        return Ok(Some(SessionCommand::Probe {
            method,
            url: url.to_owned(),
            body: (!body.is_empty()).then(|| body.to_owned()),
        }));
    }
    let command = match keyword.as_str() {
        "batch" | "all" => SessionCommand::Batch {
            url: optional(rest),
        },
        "concurrent" => SessionCommand::Concurrent(parse_concurrent(rest)?),
        "stress" => SessionCommand::Stress(parse_stress(rest)?),
        "system" => SessionCommand::System,
        "resource" => SessionCommand::Resource(rest.trim().parse()?),
        "ws" => parse_ws(rest)?,
        "transcript" => SessionCommand::Transcript {
            channel: channel_or_default(rest),
        },
        "stats" => SessionCommand::Stats,
        "clear" => SessionCommand::Clear,
        "export" => SessionCommand::Export,
        "help" | "?" => SessionCommand::Help,
        "quit" | "exit" => SessionCommand::Quit,
        _ => {
            return Err(ValidationError::UnknownCommand {
                value: word.to_owned(),
            });
        }
    };
    Ok(Some(command))
}

/// Reads commands line by line until `quit` or end of input, then closes
/// any open WebSocket sessions.
///
/// # Errors
///
/// Returns an error when reading the input fails.
pub async fn run_session<R>(dashboard: &mut Dashboard, input: R) -> AppResult<()>
where
    R: AsyncBufRead + Unpin,
{
    dashboard.notify(Notice::info("Session started. Type 'help' for commands."));
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(SessionCommand::Quit)) => break,
            Ok(Some(command)) => execute(dashboard, command).await,
            Err(err) => dashboard.reject(err),
        }
    }
    debug!("Session input finished");
    dashboard.shutdown();
    Ok(())
}

pub async fn execute(dashboard: &mut Dashboard, command: SessionCommand) {
    match command {
        SessionCommand::Probe { method, url, body } => {
            let mut request = ProbeRequest::new(method, url);
            request.body = body;
            dashboard.test_http(request).await;
        }
        SessionCommand::Batch { url } => {
            dashboard.test_all_methods(url.as_deref()).await;
        }
        SessionCommand::Concurrent(params) => {
            dashboard.test_concurrent(params).await;
        }
        SessionCommand::Stress(params) => {
            dashboard.test_stress(params).await;
        }
        SessionCommand::System => {
            dashboard.load_system_info().await;
        }
        SessionCommand::Resource(kind) => {
            dashboard.test_resource(kind).await;
        }
        SessionCommand::WsConnect { channel, url } => {
            dashboard.connect_socket(&channel, url.as_deref()).await;
        }
        SessionCommand::WsSend { channel, text } => {
            let _envelope = dashboard.send_socket(&channel, &text);
        }
        SessionCommand::WsClose { channel } => {
            let _closed = dashboard.disconnect_socket(&channel);
        }
        SessionCommand::Transcript { channel } => {
            let _entries = dashboard.report_transcript(&channel);
        }
        SessionCommand::Stats => {
            let _latency = dashboard.report_summary();
        }
        SessionCommand::Clear => dashboard.clear(),
        SessionCommand::Export => {
            dashboard.export().await;
        }
        SessionCommand::Help => dashboard.notify(Notice::info(SESSION_HELP)),
        SessionCommand::Quit => dashboard.shutdown(),
    }
}
