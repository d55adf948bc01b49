//! Input injection sinks.
//!
//! The backend is chosen at startup from [`SinkKind`]:
//!
//! - `log`   – [`TracingSink`], records every action in the log.
//! - `xtest` – `XTestSink`, real injection through the X11 XTest extension.
//!   Only available on Linux builds with the `xtest` cargo feature.
//!
//! [`mock::RecordingSink`] is the in-memory sink tests observe.

pub mod mock;
pub mod tracing_sink;

#[cfg(all(target_os = "linux", feature = "xtest"))]
pub mod xtest;

use thiserror::Error;

use crate::application::dispatcher::InputSink;
use crate::domain::SinkKind;

pub use mock::{RecordingSink, SinkCall};
pub use tracing_sink::TracingSink;

/// Error returned when the configured sink cannot be created.
#[derive(Debug, Error)]
pub enum SinkInitError {
    #[error("the {0} sink is not compiled into this build (enable the `xtest` feature on Linux)")]
    Unavailable(SinkKind),

    #[error("failed to initialise the {kind} sink: {reason}")]
    Platform { kind: SinkKind, reason: String },
}

/// Creates the sink named by `kind`.
///
/// # Errors
///
/// [`SinkInitError::Unavailable`] when the backend is not compiled in, or
/// [`SinkInitError::Platform`] when it cannot reach the OS (e.g. no X
/// display).
pub fn build_sink(kind: SinkKind) -> Result<Box<dyn InputSink>, SinkInitError> {
    match kind {
        SinkKind::Log => Ok(Box::new(TracingSink::new())),
        SinkKind::Xtest => build_xtest_sink(),
    }
}

#[cfg(all(target_os = "linux", feature = "xtest"))]
fn build_xtest_sink() -> Result<Box<dyn InputSink>, SinkInitError> {
    xtest::XTestSink::open()
        .map(|sink| Box::new(sink) as Box<dyn InputSink>)
        .map_err(|e| SinkInitError::Platform {
            kind: SinkKind::Xtest,
            reason: e.to_string(),
        })
}

#[cfg(not(all(target_os = "linux", feature = "xtest")))]
fn build_xtest_sink() -> Result<Box<dyn InputSink>, SinkInitError> {
    Err(SinkInitError::Unavailable(SinkKind::Xtest))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_sink_is_always_available() {
        assert!(build_sink(SinkKind::Log).is_ok());
    }

    #[cfg(not(all(target_os = "linux", feature = "xtest")))]
    #[test]
    fn test_xtest_sink_unavailable_without_feature() {
        assert!(matches!(
            build_sink(SinkKind::Xtest),
            Err(SinkInitError::Unavailable(SinkKind::Xtest))
        ));
    }
}
