//! Core library for the `proxyprobe` CLI.
//!
//! The crate drives manual HTTP and WebSocket tests against a backend and
//! aggregates the outcomes: single probes, the all-methods batch, remote
//! load triggers, per-channel WebSocket sessions, the result log with its
//! statistics, and the JSON export. Rendering sits behind the
//! [`report::Reporter`] trait; the binary plugs in a console reporter.
pub mod app;
pub mod args;
pub mod config;
pub mod entry;
pub mod error;
pub mod http;
pub mod logger;
pub mod records;
pub mod report;
pub mod socket;
pub mod ui;

#[cfg(test)]
mod test_support;
