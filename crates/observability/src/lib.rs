//! Logging setup shared by every binary in the workspace.

/// Initialize process-wide logging with the given output format.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(format: LogFormat) {
    tracing::init(format);
}

/// Subscriber configuration (filter, output format).
pub mod tracing;

pub use crate::tracing::{LogFormat, UnknownLogFormat};
