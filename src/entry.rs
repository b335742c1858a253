use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgMatches, CommandFactory, FromArgMatches};
use tokio::io::BufReader;
use tracing::{debug, warn};
use url::Url;

use crate::app::{Dashboard, DashboardSettings, run_session};
use crate::args::{
    Command, DEFAULT_USER_AGENT, DashboardArgs, HttpMethod, ProbeArgs, ResourceKind, WsArgs,
    parse_headers_json,
};
use crate::config::{apply_config, load_config};
use crate::error::{AppError, AppResult, ValidationError};
use crate::http::{ClientSettings, ConcurrentParams, ProbeRequest, StressParams};
use crate::ui::ConsoleReporter;

struct SocketPlan {
    channel: String,
    url: Option<String>,
    messages: Vec<String>,
    listen: Duration,
}

enum RunPlan {
    Probe(ProbeRequest),
    Batch(Option<String>),
    Concurrent(ConcurrentParams),
    Stress(StressParams),
    System,
    Resource(ResourceKind),
    Socket(SocketPlan),
    Session,
}

/// Parses the command line, applies config, and runs the requested command.
///
/// # Errors
///
/// Returns an error when arguments or config are invalid, or when a one-shot
/// command could not complete.
pub fn run() -> AppResult<()> {
    let matches = DashboardArgs::command().get_matches_from(std::env::args_os());
    let mut args = DashboardArgs::from_arg_matches(&matches)?;
    configure(&mut args, &matches)?;

    crate::logger::init_logging(args.verbose, args.no_color);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(args))
}

fn configure(args: &mut DashboardArgs, matches: &ArgMatches) -> AppResult<()> {
    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(args, matches, &config)?;
    }
    Ok(())
}

async fn run_async(args: DashboardArgs) -> AppResult<()> {
    let plan = build_plan(&args.command)?;
    let mut dashboard = build_dashboard(&args)?;
    let result = execute_plan(&mut dashboard, plan).await;
    dashboard.shutdown();
    result?;

    if args.export && dashboard.export().await.is_none() {
        return Err(AppError::ActionFailed { action: "export" });
    }
    Ok(())
}

fn build_dashboard(args: &DashboardArgs) -> AppResult<Dashboard> {
    let base_url = Url::parse(&args.base_url).map_err(|err| {
        AppError::validation(ValidationError::InvalidBaseUrl {
            url: args.base_url.clone(),
            source: err,
        })
    })?;
    let settings = DashboardSettings {
        base_url,
        ws_url: args.ws_url.clone(),
        client: ClientSettings {
            request_timeout: args.request_timeout,
            connect_timeout: args.connect_timeout,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        },
        default_headers: args.default_headers.clone(),
        export_dir: PathBuf::from(&args.export_dir),
    };
    Dashboard::new(settings, Arc::new(ConsoleReporter::new(args.verbose)))
}

fn build_plan(command: &Command) -> AppResult<RunPlan> {
    let plan = match command {
        Command::Probe(probe) => RunPlan::Probe(build_probe(probe)?),
        Command::Batch(batch) => RunPlan::Batch(batch.url.clone()),
        Command::Concurrent(concurrent) => RunPlan::Concurrent(ConcurrentParams {
            concurrency: concurrent.concurrency,
            requests: concurrent.requests,
            delay_ms: concurrent.delay,
        }),
        Command::Stress(stress) => RunPlan::Stress(StressParams {
            duration_secs: stress.duration,
            concurrency: stress.concurrency,
        }),
        Command::System => RunPlan::System,
        Command::Resource(resource) => RunPlan::Resource(resource.kind),
        Command::Ws(ws) => RunPlan::Socket(build_socket_plan(ws)?),
        Command::Session => RunPlan::Session,
    };
    Ok(plan)
}

/// Preset first, then explicit flags on top.
fn build_probe(args: &ProbeArgs) -> AppResult<ProbeRequest> {
    let mut request = args.preset.map_or_else(
        || ProbeRequest::new(HttpMethod::Get, String::new()),
        ProbeRequest::from_preset,
    );
    if let Some(method) = args.method {
        request.method = method;
    }
    if let Some(url) = args.url.as_ref() {
        request.url.clone_from(url);
    }
    if request.url.trim().is_empty() {
        return Err(AppError::validation(ValidationError::MissingUrl));
    }
    if let Some(text) = args.headers_json.as_deref() {
        match parse_headers_json(text) {
            Some(headers) => {
                for (name, value) in headers {
                    request.set_header(&name, value);
                }
            }
            None => warn!("Ignoring headers JSON that is not a JSON object: {}", text),
        }
    }
    for (name, value) in &args.headers {
        request.set_header(name, value.as_str());
    }
    if let Some(data) = args.data.as_ref() {
        request.body = Some(data.clone());
    }
    Ok(request)
}

fn build_socket_plan(args: &WsArgs) -> AppResult<SocketPlan> {
    if args.channel.trim().is_empty() {
        return Err(AppError::validation(ValidationError::MissingChannel));
    }
    Ok(SocketPlan {
        channel: args.channel.trim().to_owned(),
        url: args.url.clone(),
        messages: args.messages.clone(),
        listen: args.listen,
    })
}

async fn execute_plan(dashboard: &mut Dashboard, plan: RunPlan) -> AppResult<()> {
    match plan {
        RunPlan::Probe(request) => {
            dashboard
                .test_http(request)
                .await
                .ok_or(AppError::ActionFailed { action: "probe" })?;
        }
        RunPlan::Batch(url) => {
            dashboard
                .test_all_methods(url.as_deref())
                .await
                .ok_or(AppError::ActionFailed { action: "batch" })?;
            let _latency = dashboard.report_summary();
        }
        RunPlan::Concurrent(params) => {
            dashboard
                .test_concurrent(params)
                .await
                .ok_or(AppError::ActionFailed {
                    action: "concurrent test",
                })?;
        }
        RunPlan::Stress(params) => {
            dashboard
                .test_stress(params)
                .await
                .ok_or(AppError::ActionFailed {
                    action: "stress test",
                })?;
        }
        RunPlan::System => {
            dashboard
                .load_system_info()
                .await
                .ok_or(AppError::ActionFailed {
                    action: "system info",
                })?;
        }
        RunPlan::Resource(kind) => {
            dashboard
                .test_resource(kind)
                .await
                .ok_or(AppError::ActionFailed {
                    action: "resource test",
                })?;
        }
        RunPlan::Socket(plan) => run_socket(dashboard, plan).await?,
        RunPlan::Session => {
            let stdin = BufReader::new(tokio::io::stdin());
            run_session(dashboard, stdin).await?;
        }
    }
    Ok(())
}

async fn run_socket(dashboard: &Dashboard, plan: SocketPlan) -> AppResult<()> {
    dashboard
        .connect_socket(&plan.channel, plan.url.as_deref())
        .await
        .ok_or(AppError::ActionFailed {
            action: "WebSocket connect",
        })?;
    for message in &plan.messages {
        if dashboard.send_socket(&plan.channel, message).is_none() {
            debug!("Message '{}' was not sent", message);
        }
    }
    tokio::time::sleep(plan.listen).await;
    if dashboard.sockets().live_channels().contains(&plan.channel) {
        let _closed = dashboard.disconnect_socket(&plan.channel);
    }
    Ok(())
}
