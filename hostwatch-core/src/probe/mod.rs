//! Read-only probes over the command executor
//!
//! Every probe issues a fixed command template; the only interpolated values
//! are numbers and validated systemd unit names.

mod health;
mod logs;
pub mod models;
pub mod parser;
mod services;

pub use health::{DEFAULT_PROCESS_LIMIT, HealthProbe};
pub use logs::{DEFAULT_ERROR_LINES, ErrorLogScanner, SAMPLE_LINES};
pub use models::{ErrorLogSummary, ProcessSample, ServerStatus, ServiceState, is_healthy};
pub use parser::ProbeParser;
pub use services::ServiceChecker;
