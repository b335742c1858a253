//! The orchestrating dashboard, its export artifact and the interactive session.
mod dashboard;
mod export;
mod session;


pub use dashboard::{Dashboard, DashboardSettings};
pub use export::{ExportDocument, build_export, export_file_name, write_export};
pub use session::{SESSION_HELP, SessionCommand, execute, parse_command, run_session};
