/*!
 * Tracing
 * Structured tracing for blocking waits using the tracing crate
 *
 * Features:
 * - JSON-formatted logs for structured parsing
 * - Per-wait spans correlated by registration id
 * - Slow wait detection
 */

use crate::core::sync::WaitError;
use std::time::{Duration, Instant};
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Waits blocked longer than this are reported at `warn`
pub const SLOW_WAIT_THRESHOLD: Duration = Duration::from_secs(1);

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - CONDLATCH_TRACE_JSON: Enable JSON output (default: false)
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Check if JSON output is requested
    let use_json = std::env::var("CONDLATCH_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init();
        info!("Structured tracing initialized with JSON output");
    } else {
        // Human-readable output for development
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .init();
        info!("Structured tracing initialized");
    }
}

/// Span covering one blocking wait
pub struct WaitSpan {
    span: tracing::Span,
    start: Instant,
    signal_id: u64,
}

impl WaitSpan {
    pub fn new(signal_id: u64, deadline: Option<Instant>) -> Self {
        let timeout_ms = deadline.map(|d| d.saturating_duration_since(Instant::now()).as_millis());

        let span = span!(
            Level::DEBUG,
            "wait",
            signal_id = signal_id,
            timeout_ms = ?timeout_ms,
            outcome = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            signal_id,
        }
    }

    /// Record how the wait ended: woken, timed out, or failed
    pub fn record_outcome(&self, outcome: Result<bool, &WaitError>) {
        let label = match outcome {
            Ok(true) => "woken",
            Ok(false) => "timed_out",
            Err(WaitError::Interrupted) => "interrupted",
            Err(_) => "error",
        };
        self.span.record("outcome", label);
    }
}

impl Drop for WaitSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_us", duration.as_micros() as u64);

        if duration > SLOW_WAIT_THRESHOLD {
            warn!(
                signal_id = self.signal_id,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow wait detected"
            );
        } else {
            debug!(
                signal_id = self.signal_id,
                duration_us = duration.as_micros() as u64,
                "wait completed"
            );
        }
    }
}
