//! Prometheus metrics for observability and monitoring.
//!
//! This module provides metric collection for the embedded-content controller:
//! - Store action processing and effect execution
//! - Frame load outcomes (loaded, errored) and load latency
//! - Render passes per primary region
//! - Overlay open/dismiss
//!
//! # Example
//!
//! ```rust,no_run
//! use unit_frame_runtime::metrics::{FrameMetrics, MetricsRecorder};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut recorder = MetricsRecorder::new();
//! recorder.install()?;
//!
//! FrameMetrics::record_errored("timeout");
//! println!("{}", recorder.render().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus recorder installed as the global `metrics` sink.
#[derive(Default)]
pub struct MetricsRecorder {
    handle: Option<PrometheusHandle>,
}

impl MetricsRecorder {
    /// Create a recorder that has not been installed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Register metric descriptions and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// If a recorder is already installed (e.g., by another test), this logs a
    /// warning and succeeds without a handle.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!("Metrics recorder installed");
                Ok(())
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus text format.
    ///
    /// Returns `None` if this recorder was not the one installed.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    // Store Metrics
    describe_counter!("store.commands.total", "Total number of actions sent to stores");
    describe_counter!(
        "store.effects.executed",
        "Total number of effects started, by effect type"
    );
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time taken to execute reducers"
    );
    describe_counter!(
        "store.effects.cancelled",
        "Effect tasks aborted by a cancellation id"
    );
    describe_counter!("store.closed.total", "Total number of stores retired");
    describe_counter!(
        "store.closed.rejected_actions",
        "Actions dropped because their store had been retired"
    );

    // Frame Metrics
    describe_counter!("unit_frame.loaded.total", "Frames that reported a successful load");
    describe_counter!(
        "unit_frame.errored.total",
        "Frames flagged as failed to load, by reason"
    );
    describe_histogram!(
        "unit_frame.load.duration_seconds",
        "Time from mount to the first load signal"
    );
    describe_counter!(
        "unit_frame.renders.total",
        "Render passes, by primary region"
    );

    // Overlay Metrics
    describe_counter!("unit_frame.overlay.opened.total", "Overlays opened, by payload kind");
    describe_counter!("unit_frame.overlay.dismissed.total", "Overlays dismissed");
}

/// Frame lifecycle metrics recorder.
pub struct FrameMetrics;

impl FrameMetrics {
    /// Record a successful load and its latency since mount.
    pub fn record_loaded(latency: Duration) {
        counter!("unit_frame.loaded.total").increment(1);
        histogram!("unit_frame.load.duration_seconds").record(latency.as_secs_f64());
    }

    /// Record a failed load.
    pub fn record_errored(reason: &'static str) {
        counter!("unit_frame.errored.total", "reason" => reason).increment(1);
    }

    /// Record one render pass.
    pub fn record_render(region: &'static str) {
        counter!("unit_frame.renders.total", "region" => region).increment(1);
    }
}

/// Overlay metrics recorder.
pub struct OverlayMetrics;

impl OverlayMetrics {
    /// Record an overlay being opened.
    pub fn record_opened(kind: &'static str) {
        counter!("unit_frame.overlay.opened.total", "kind" => kind).increment(1);
    }

    /// Record an overlay being dismissed.
    pub fn record_dismissed() {
        counter!("unit_frame.overlay.dismissed.total").increment(1);
    }
}
