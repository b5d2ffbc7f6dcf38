//! Human-readable progress output.

/// Receives progress lines while a run is underway. The binary prints them;
/// tests collect them.
pub trait Reporter: Send + Sync {
  fn progress(&self, message: &str);
}

/// Forwards progress lines to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
  fn progress(&self, message: &str) { tracing::info!("{message}"); }
}
