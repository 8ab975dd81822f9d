//! Logging and tracing conventions for rowsync.
//!
//! rowsync uses the `tracing` crate for instrumentation. The library never
//! installs a subscriber; to see logs, install one in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("rowsync=debug")
//!         .init();
//! }
//! ```
//!
//! Every event is emitted under one of the [`targets`] so that a single
//! subsystem can be enabled in isolation, e.g. `RUST_LOG=rowsync::diff=debug`.

/// Span names used throughout rowsync for tracing.
pub mod span_names {
    /// Edit script computation span.
    pub const DIFF: &str = "rowsync::diff";
    /// Host batch application span.
    pub const BATCH: &str = "rowsync::batch";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "rowsync_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "rowsync_core::signal";
    /// Diff engine target.
    pub const DIFF: &str = "rowsync::diff";
    /// Section model target.
    pub const SECTION: &str = "rowsync::section";
    /// Renderer registry target.
    pub const REGISTRY: &str = "rowsync::registry";
    /// Update coordinator target.
    pub const COORDINATOR: &str = "rowsync::coordinator";
    /// Configuration loading target.
    pub const CONFIG: &str = "rowsync::config";
    /// Performance spans target.
    pub const PERF: &str = "rowsync::perf";
}

/// A guard for a performance tracing span.
///
/// The span is entered on creation and exited when the guard is dropped.
///
/// ```ignore
/// let _span = PerfSpan::new(span_names::DIFF);
/// // ... timed work ...
/// ```
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

/// Debug-level event under the core target.
///
/// Callers need `tracing` in their own dependency list.
#[macro_export]
macro_rules! rowsync_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: $crate::logging::targets::CORE, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perf_span() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let _span = PerfSpan::new("test_operation");
        crate::rowsync_debug!(value = 1, "inside perf span");
    }

    /// Records the target of every event.
    #[derive(Clone, Default)]
    struct TargetLog(std::sync::Arc<parking_lot::Mutex<Vec<&'static str>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for TargetLog {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            self.0.lock().push(event.metadata().target());
        }
    }

    #[test]
    fn test_debug_macro_uses_core_target() {
        use tracing_subscriber::layer::SubscriberExt;

        let log = TargetLog::default();
        let subscriber = tracing_subscriber::registry().with(log.clone());
        tracing::subscriber::with_default(subscriber, || {
            let signal = crate::Signal::<()>::new();
            signal.connect(|_| {});
            signal.disconnect_all();
        });

        assert!(log.0.lock().contains(&targets::CORE));
    }

    #[test]
    fn test_targets_are_distinct() {
        let all = [
            targets::CORE,
            targets::SIGNAL,
            targets::DIFF,
            targets::SECTION,
            targets::REGISTRY,
            targets::COORDINATOR,
            targets::CONFIG,
            targets::PERF,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
