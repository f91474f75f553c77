// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for layering and run lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Layer computation (sizes, start/stop restriction, cycle seeding)
//! * Run lifecycle (start, completion, cancellation, failure)
//! * The side channels a run reports to (trace sink, session store)

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Layers computed for a run.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_loopwood::observability::messages::engine::LayersComputed;
///
/// let msg = LayersComputed {
///     layer_count: 3,
///     vertices_to_run: 7,
///     start_id: None,
///     stop_id: Some("output"),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct LayersComputed<'a> {
    pub layer_count: usize,
    pub vertices_to_run: usize,
    pub start_id: Option<&'a str>,
    pub stop_id: Option<&'a str>,
}

impl Display for LayersComputed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Computed {} layers covering {} vertices",
            self.layer_count, self.vertices_to_run
        )
    }
}

impl StructuredLog for LayersComputed<'_> {
    fn log(&self) {
        tracing::info!(
            layer_count = self.layer_count,
            vertices_to_run = self.vertices_to_run,
            start_id = self.start_id,
            stop_id = self.stop_id,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "layering",
            span_name = name,
            layer_count = self.layer_count,
            vertices_to_run = self.vertices_to_run,
            start_id = self.start_id,
            stop_id = self.stop_id,
        )
    }
}

/// A pure cycle had no zero in-degree vertex, so one was picked to seed the layers.
///
/// # Log Level
/// `debug!` - Scheduling detail
pub struct PrimaryInputSeeded<'a> {
    pub vertex_id: &'a str,
}

impl Display for PrimaryInputSeeded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Seeding cyclic layering with vertex '{}'", self.vertex_id)
    }
}

impl StructuredLog for PrimaryInputSeeded<'_> {
    fn log(&self) {
        tracing::debug!(vertex_id = self.vertex_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("layer_seed", span_name = name, vertex_id = self.vertex_id)
    }
}

/// A run started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_loopwood::observability::messages::engine::RunStarted;
///
/// let msg = RunStarted {
///     run_id: "4f1c",
///     session_id: Some("chat-42"),
///     vertices_to_run: 5,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct RunStarted<'a> {
    pub run_id: &'a str,
    pub session_id: Option<&'a str>,
    pub vertices_to_run: usize,
}

impl Display for RunStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting run {} with {} vertices to run",
            self.run_id, self.vertices_to_run
        )
    }
}

impl StructuredLog for RunStarted<'_> {
    fn log(&self) {
        tracing::info!(
            run_id = self.run_id,
            session_id = self.session_id,
            vertices_to_run = self.vertices_to_run,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run",
            span_name = name,
            run_id = self.run_id,
            session_id = self.session_id,
        )
    }
}

/// A run finished without a run-level error.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RunCompleted<'a> {
    pub run_id: &'a str,
    pub built: usize,
    pub failed: usize,
    pub duration: Duration,
}

impl Display for RunCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Run {} completed: {} built, {} failed in {:?}",
            self.run_id, self.built, self.failed, self.duration
        )
    }
}

impl StructuredLog for RunCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            run_id = self.run_id,
            built = self.built,
            failed = self.failed,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run_completed",
            span_name = name,
            run_id = self.run_id,
            duration = ?self.duration,
        )
    }
}

/// A run was cancelled before it finished.
///
/// # Log Level
/// `warn!` - Degraded behavior
pub struct RunCancelled<'a> {
    pub run_id: &'a str,
    pub in_flight: usize,
}

impl Display for RunCancelled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Run {} cancelled with {} builds in flight",
            self.run_id, self.in_flight
        )
    }
}

impl StructuredLog for RunCancelled<'_> {
    fn log(&self) {
        tracing::warn!(run_id = self.run_id, in_flight = self.in_flight, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("run_cancelled", span_name = name, run_id = self.run_id)
    }
}

/// A run ended with a run-level error.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_loopwood::observability::messages::engine::RunFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "task panicked");
/// let msg = RunFailed {
///     run_id: "4f1c",
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct RunFailed<'a> {
    pub run_id: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for RunFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Run {} failed: {}", self.run_id, self.error)
    }
}

impl StructuredLog for RunFailed<'_> {
    fn log(&self) {
        tracing::error!(run_id = self.run_id, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "run_failed",
            span_name = name,
            run_id = self.run_id,
            error = %self.error,
        )
    }
}

/// The trace sink was told to close every trace of a run.
pub struct TracesEnded<'a> {
    pub run_id: &'a str,
    pub error: Option<&'a str>,
}

impl Display for TracesEnded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.error {
            Some(error) => write!(f, "Ending traces for run {} with error: {}", self.run_id, error),
            None => write!(f, "Ending traces for run {}", self.run_id),
        }
    }
}

impl StructuredLog for TracesEnded<'_> {
    fn log(&self) {
        tracing::info!(run_id = self.run_id, error = self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "traces_ended",
            span_name = name,
            run_id = self.run_id,
            error = self.error,
        )
    }
}

/// The trace sink rejected the end-of-run notification.
///
/// # Log Level
/// `warn!` - the run itself is unaffected
pub struct TraceSinkFailed<'a> {
    pub run_id: &'a str,
    pub error: &'a anyhow::Error,
}

impl Display for TraceSinkFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Failed to end traces for run {}: {:#}", self.run_id, self.error)
    }
}

impl StructuredLog for TraceSinkFailed<'_> {
    fn log(&self) {
        tracing::warn!(run_id = self.run_id, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("trace_sink_failed", span_name = name, run_id = self.run_id)
    }
}

/// The session store rejected a graph.
///
/// # Log Level
/// `warn!` - the run itself is unaffected
pub struct SessionStoreFailed<'a> {
    pub session_id: &'a str,
    pub error: &'a anyhow::Error,
}

impl Display for SessionStoreFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to store graph for session {}: {:#}",
            self.session_id, self.error
        )
    }
}

impl StructuredLog for SessionStoreFailed<'_> {
    fn log(&self) {
        tracing::warn!(session_id = self.session_id, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "session_store_failed",
            span_name = name,
            session_id = self.session_id,
        )
    }
}
