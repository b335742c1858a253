use std::time::Duration;

use url::Url;

use super::*;
use crate::args::{HttpMethod, PositiveU64, Preset, ResourceKind};
use crate::error::{AppError, AppResult, HttpError};
use crate::records::Outcome;
use crate::test_support::{CapturedRequest, TestServer, closed_port_url, ok_json, run_async_test};

fn runner_for(base_url: &str) -> AppResult<HttpProbeRunner> {
    let settings = ClientSettings {
        request_timeout: Duration::from_secs(2),
        connect_timeout: Duration::from_secs(1),
        ..ClientSettings::default()
    };
    let client = build_client(&settings)?;
    let base = Url::parse(base_url)
        .map_err(|err| AppError::validation(format!("Bad test base URL: {}", err)))?;
    Ok(HttpProbeRunner::new(client, base))
}

fn remote_for(base_url: &str) -> AppResult<RemoteLoadTrigger> {
    let client = build_client(&ClientSettings::default())?;
    let base = Url::parse(base_url)
        .map_err(|err| AppError::validation(format!("Bad test base URL: {}", err)))?;
    Ok(RemoteLoadTrigger::new(client, base))
}

fn not_found(_request: &CapturedRequest) -> (u16, &'static str, String) {
    (404, "Not Found", r#"{"error":"missing"}"#.to_owned())
}

fn remote_backend(request: &CapturedRequest) -> (u16, &'static str, String) {
    let path = request.path.split('?').next().unwrap_or_default();
    let body = match path {
        "/test/concurrent" | "/test/stress" => r#"{"code":0,"message":"ok","data":{
            "total_requests":100,"success_requests":98,"failed_requests":2,
            "average_response_ms":12,"min_response_ms":1,"max_response_ms":80,
            "requests_per_second":450.5,"duration_ms":222,
            "start_time":1700000000,"end_time":1700000001},
            "timestamp":1700000001,"request_id":"abc"}"#
            .to_owned(),
        "/test/system" => r#"{"data":{"go_version":"go1.22","cpu_count":8,"goroutine_count":12,
            "go_os":"linux","go_arch":"amd64",
            "memory":{"alloc_mb":3.25,"total_alloc":9437184,"sys_mb":12.5,
                "heap_alloc":3407872,"heap_sys":7864320,"heap_objects":4000},
            "gc":{"num_gc":5,"pause_total_ns":120000,"last_gc":1699999999000000000},
            "timestamp":1700000000}}"#
            .to_owned(),
        "/test/memory" => r#"{"data":{"allocated_mb":100}}"#.to_owned(),
        _ => "not json at all".to_owned(),
    };
    (200, "OK", body)
}

#[test]
fn resolve_target_joins_relative_paths() -> AppResult<()> {
    let base = Url::parse("http://localhost:8080")
        .map_err(|err| AppError::validation(format!("{}", err)))?;
    let joined = resolve_target(&base, "/api/test")
        .map_err(|err| AppError::validation(format!("{}", err)))?;
    if joined.as_str() != "http://localhost:8080/api/test" {
        return Err(AppError::validation(format!("Unexpected join: {}", joined)));
    }
    let absolute = resolve_target(&base, "http://example.com/x")
        .map_err(|err| AppError::validation(format!("{}", err)))?;
    if absolute.as_str() != "http://example.com/x" {
        return Err(AppError::validation(format!(
            "Absolute URL rewritten: {}",
            absolute
        )));
    }
    Ok(())
}

#[test]
fn effective_body_only_for_body_methods() -> AppResult<()> {
    let get = ProbeRequest::new(HttpMethod::Get, "/").with_body("ignored");
    if get.effective_body().is_some() {
        return Err(AppError::validation("GET must not carry a body"));
    }
    let empty_post = ProbeRequest::new(HttpMethod::Post, "/").with_body("");
    if empty_post.effective_body().is_some() {
        return Err(AppError::validation("Empty body must be dropped"));
    }
    let patch = ProbeRequest::new(HttpMethod::Patch, "/").with_body("x");
    if patch.effective_body() != Some("x") {
        return Err(AppError::validation("PATCH body missing"));
    }
    Ok(())
}

#[test]
fn set_header_replaces_case_insensitively() -> AppResult<()> {
    let request = ProbeRequest::new(HttpMethod::Get, "/")
        .with_header("content-type", "text/plain")
        .with_header("Content-Type", "application/json");
    if request.headers.len() != 1 {
        return Err(AppError::validation(format!(
            "Expected one header, got {:?}",
            request.headers
        )));
    }
    if request.headers.get("Content-Type").map(String::as_str) != Some("application/json") {
        return Err(AppError::validation("Later header value must win"));
    }
    Ok(())
}

#[test]
fn presets_fill_expected_requests() -> AppResult<()> {
    let post = ProbeRequest::from_preset(Preset::JsonPost);
    if post.method != HttpMethod::Post || post.url != "/api/test" {
        return Err(AppError::validation("json-post preset mismatch"));
    }
    if post.body.as_deref() != Some(r#"{"message":"Hello, World!"}"#) {
        return Err(AppError::validation("json-post preset body mismatch"));
    }
    let upload = ProbeRequest::from_preset(Preset::FileUpload);
    if upload.url != "/api/upload" || upload.body.is_some() {
        return Err(AppError::validation("file-upload preset mismatch"));
    }
    Ok(())
}

#[test]
fn probe_records_successful_response() -> AppResult<()> {
    run_async_test(async {
        let server = TestServer::spawn(ok_json).await?;
        let runner = runner_for(&server.base_url)?;
        let request = ProbeRequest::new(HttpMethod::Post, "/api/test")
            .with_header("X-Trace", "1")
            .with_body(r#"{"a":1}"#);
        let record = runner.run(&request).await;

        if !record.success() {
            return Err(AppError::validation(format!(
                "Expected success, got {:?}",
                record.outcome()
            )));
        }
        let Some(response) = record.outcome().response() else {
            return Err(AppError::validation("Expected a response facet"));
        };
        if response.status != 200 || response.status_text != "OK" {
            return Err(AppError::validation(format!(
                "Unexpected status {} {}",
                response.status, response.status_text
            )));
        }
        if response.body != r#"{"ok":true}"# {
            return Err(AppError::validation(format!(
                "Unexpected body {}",
                response.body
            )));
        }
        if response.headers.get("x-probe").map(String::as_str) != Some("one, two") {
            return Err(AppError::validation(format!(
                "Repeated headers not joined: {:?}",
                response.headers
            )));
        }

        let captured = server.requests();
        let Some(seen) = captured.first() else {
            return Err(AppError::validation("Server saw no request"));
        };
        if seen.method != "POST" || seen.path != "/api/test" || seen.body != r#"{"a":1}"# {
            return Err(AppError::validation(format!("Unexpected request {:?}", seen)));
        }
        if seen.header("x-trace") != Some("1") {
            return Err(AppError::validation("Custom header not sent"));
        }
        Ok(())
    })
}

#[test]
fn probe_http_error_is_response_but_not_success() -> AppResult<()> {
    run_async_test(async {
        let server = TestServer::spawn(not_found).await?;
        let runner = runner_for(&server.base_url)?;
        let record = runner
            .run(&ProbeRequest::new(HttpMethod::Get, "/missing"))
            .await;
        if record.success() {
            return Err(AppError::validation("404 must not be a success"));
        }
        match record.outcome() {
            Outcome::Response(response) if response.status == 404 => Ok(()),
            Outcome::Response(_) | Outcome::Error(_) => Err(AppError::validation(format!(
                "Expected 404 response facet, got {:?}",
                record.outcome()
            ))),
        }
    })
}

#[test]
fn probe_transport_failure_becomes_error_facet() -> AppResult<()> {
    run_async_test(async {
        let base = closed_port_url()?;
        let runner = runner_for(&base)?;
        let record = runner.run(&ProbeRequest::new(HttpMethod::Get, "/")).await;
        match record.outcome() {
            Outcome::Error(facet) if !facet.message.is_empty() => {}
            Outcome::Error(_) | Outcome::Response(_) => {
                return Err(AppError::validation(format!(
                    "Expected error facet, got {:?}",
                    record.outcome()
                )));
            }
        }
        if record.success() {
            return Err(AppError::validation("Transport failure must not succeed"));
        }
        Ok(())
    })
}

#[test]
fn probe_drops_body_for_get_and_skips_head_body() -> AppResult<()> {
    run_async_test(async {
        let server = TestServer::spawn(ok_json).await?;
        let runner = runner_for(&server.base_url)?;
        let get = runner
            .run(&ProbeRequest::new(HttpMethod::Get, "/api/test").with_body("payload"))
            .await;
        if get.request().body.is_some() {
            return Err(AppError::validation("Recorded GET body must be empty"));
        }
        let head = runner
            .run(&ProbeRequest::new(HttpMethod::Head, "/api/test"))
            .await;
        let Some(response) = head.outcome().response() else {
            return Err(AppError::validation("HEAD must produce a response"));
        };
        if !response.body.is_empty() {
            return Err(AppError::validation("HEAD body must be empty"));
        }

        let captured = server.requests();
        let Some(seen_get) = captured.iter().find(|request| request.method == "GET") else {
            return Err(AppError::validation("GET not captured"));
        };
        if !seen_get.body.is_empty() {
            return Err(AppError::validation("GET body reached the server"));
        }
        Ok(())
    })
}

#[test]
fn probe_invalid_url_becomes_error_facet() -> AppResult<()> {
    run_async_test(async {
        let runner = runner_for("http://localhost:8080")?;
        let record = runner
            .run(&ProbeRequest::new(HttpMethod::Get, "http://[::1"))
            .await;
        if record.success() || record.outcome().response().is_some() {
            return Err(AppError::validation("Invalid URL must be an error facet"));
        }
        Ok(())
    })
}

#[test]
fn batch_issues_seven_methods_in_order() -> AppResult<()> {
    run_async_test(async {
        let server = TestServer::spawn(ok_json).await?;
        let runner = runner_for(&server.base_url)?;
        let records = BatchRunner::new(runner).run_all("/api/test").await;

        let methods: Vec<HttpMethod> = records
            .iter()
            .map(|record| record.request().method)
            .collect();
        if methods != HttpMethod::ALL.to_vec() {
            return Err(AppError::validation(format!(
                "Unexpected method order {:?}",
                methods
            )));
        }
        let captured = server.requests();
        if captured.len() != 7 {
            return Err(AppError::validation(format!(
                "Expected 7 requests, got {}",
                captured.len()
            )));
        }
        for request in &captured {
            if request.header("content-type") != Some("application/json") {
                return Err(AppError::validation(format!(
                    "{} missing JSON content type",
                    request.method
                )));
            }
            let expects_body = matches!(request.method.as_str(), "POST" | "PUT" | "PATCH");
            if expects_body {
                let body: serde_json::Value = serde_json::from_str(&request.body)?;
                if body != serde_json::json!({ "test": true, "method": request.method }) {
                    return Err(AppError::validation(format!(
                        "Unexpected {} body {}",
                        request.method, request.body
                    )));
                }
            } else if !request.body.is_empty() {
                return Err(AppError::validation(format!(
                    "{} must not carry a body",
                    request.method
                )));
            }
        }
        Ok(())
    })
}

#[test]
fn batch_records_every_method_when_server_is_down() -> AppResult<()> {
    run_async_test(async {
        let base = closed_port_url()?;
        let runner = runner_for(&base)?;
        let records = BatchRunner::new(runner).run_all("/api/test").await;
        if records.len() != 7 {
            return Err(AppError::validation(format!(
                "Expected 7 records, got {}",
                records.len()
            )));
        }
        if records.iter().any(|record| record.success()) {
            return Err(AppError::validation("Nothing should succeed"));
        }
        Ok(())
    })
}

#[test]
fn remote_concurrent_sends_parameters_and_decodes_data() -> AppResult<()> {
    run_async_test(async {
        let server = TestServer::spawn(remote_backend).await?;
        let remote = remote_for(&server.base_url)?;
        let params = ConcurrentParams {
            concurrency: PositiveU64::try_from(5)?,
            requests: PositiveU64::try_from(50)?,
            delay_ms: 3,
        };
        let stats = remote.trigger_concurrent(params).await?;
        if stats.total_requests != 100 || stats.failed_requests != 2 {
            return Err(AppError::validation(format!("Unexpected stats {:?}", stats)));
        }
        let captured = server.requests();
        let Some(seen) = captured.first() else {
            return Err(AppError::validation("Server saw no request"));
        };
        if seen.path != "/test/concurrent?concurrency=5&requests=50&delay=3" {
            return Err(AppError::validation(format!("Unexpected path {}", seen.path)));
        }
        Ok(())
    })
}

#[test]
fn remote_stress_uses_default_parameters() -> AppResult<()> {
    run_async_test(async {
        let server = TestServer::spawn(remote_backend).await?;
        let remote = remote_for(&server.base_url)?;
        remote.trigger_stress(StressParams::default()).await?;
        let captured = server.requests();
        let Some(seen) = captured.first() else {
            return Err(AppError::validation("Server saw no request"));
        };
        if seen.path != "/test/stress?duration=60&concurrency=20" {
            return Err(AppError::validation(format!("Unexpected path {}", seen.path)));
        }
        Ok(())
    })
}

#[test]
fn remote_system_and_resource_decode() -> AppResult<()> {
    run_async_test(async {
        let server = TestServer::spawn(remote_backend).await?;
        let remote = remote_for(&server.base_url)?;
        let info = remote.system_info().await?;
        if info.cpu_count != 8 || info.memory.heap_objects != 4000 || info.gc.num_gc != 5 {
            return Err(AppError::validation(format!("Unexpected info {:?}", info)));
        }
        let sizes = format!("{:.2}/{:.2}", info.memory.alloc_mb, info.memory.sys_mb);
        if sizes != "3.25/12.50" || info.memory.heap_sys != Some(7_864_320) {
            return Err(AppError::validation(format!("Unexpected memory {:?}", info.memory)));
        }
        let memory = remote.resource_test(ResourceKind::Memory).await?;
        if memory != serde_json::json!({ "allocated_mb": 100 }) {
            return Err(AppError::validation(format!("Unexpected data {}", memory)));
        }
        let paths: Vec<String> = server
            .requests()
            .into_iter()
            .map(|request| request.path)
            .collect();
        if !paths.contains(&"/test/memory?size=100&duration=10".to_owned()) {
            return Err(AppError::validation(format!("Unexpected paths {:?}", paths)));
        }
        Ok(())
    })
}

#[test]
fn system_info_accepts_fractional_megabytes() -> AppResult<()> {
    let info: SystemInfo = serde_json::from_str(
        r#"{"cpu_count":4,"goroutine_count":2,
            "memory":{"alloc_mb":1.5,"sys_mb":7.8125,"heap_objects":10},
            "gc":{"num_gc":0,"pause_total_ns":0},"timestamp":1700000000}"#,
    )?;
    let sizes = format!("{}/{}", info.memory.alloc_mb, info.memory.sys_mb);
    if sizes != "1.5/7.8125" {
        return Err(AppError::validation(format!("Unexpected sizes {}", sizes)));
    }
    if info.memory.total_alloc.is_some() || info.go_version.is_some() {
        return Err(AppError::validation(format!("Unexpected optional fields {:?}", info)));
    }
    Ok(())
}

#[test]
fn remote_malformed_body_is_decode_error() -> AppResult<()> {
    run_async_test(async {
        let server = TestServer::spawn(remote_backend).await?;
        let remote = remote_for(&server.base_url)?;
        match remote.resource_test(ResourceKind::Cpu).await {
            Err(HttpError::DecodeFailed { status: 200, .. }) => Ok(()),
            Err(err) => Err(AppError::validation(format!(
                "Expected decode failure, got {}",
                err
            ))),
            Ok(value) => Err(AppError::validation(format!(
                "Expected decode failure, got {}",
                value
            ))),
        }
    })
}

#[test]
fn remote_unreachable_backend_is_request_error() -> AppResult<()> {
    run_async_test(async {
        let remote = remote_for(&closed_port_url()?)?;
        match remote.system_info().await {
            Err(HttpError::RequestFailed { .. }) => Ok(()),
            Err(err) => Err(AppError::validation(format!(
                "Expected request failure, got {}",
                err
            ))),
            Ok(_) => Err(AppError::validation("Expected request failure")),
        }
    })
}
