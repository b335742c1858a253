//! Terminal rendering for the dashboard.
mod console;
mod formatting;


pub use console::ConsoleReporter;
pub use formatting::{format_bytes, format_duration, pretty_body, truncate_chars};
