// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the vertex build lifecycle.

use crate::errors::BuildError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A vertex is about to execute its component.
///
/// `requester` is the downstream vertex that pulled this build, if any. Its span
/// wraps the whole build, including upstream pulls.
///
/// # Log Level
/// `debug!` - Build detail
pub struct VertexBuildStarted<'a> {
    pub vertex_id: &'a str,
    pub kind: &'a str,
    pub requester: Option<&'a str>,
}

impl Display for VertexBuildStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.requester {
            Some(requester) => write!(
                f,
                "Building vertex '{}' ({}) for '{}'",
                self.vertex_id, self.kind, requester
            ),
            None => write!(f, "Building vertex '{}' ({})", self.vertex_id, self.kind),
        }
    }
}

impl StructuredLog for VertexBuildStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            vertex_id = self.vertex_id,
            kind = self.kind,
            requester = self.requester,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "vertex_build",
            span_name = name,
            vertex_id = self.vertex_id,
            kind = self.kind,
            requester = self.requester,
        )
    }
}

/// A vertex built successfully.
///
/// # Example
/// ```
/// use the_loopwood::observability::messages::vertex::VertexBuildCompleted;
/// use std::time::Duration;
///
/// let msg = VertexBuildCompleted {
///     vertex_id: "prompt",
///     duration: Duration::from_millis(12),
/// };
///
/// assert_eq!(msg.to_string(), "Vertex 'prompt' built in 12ms");
/// ```
pub struct VertexBuildCompleted<'a> {
    pub vertex_id: &'a str,
    pub duration: Duration,
}

impl Display for VertexBuildCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Vertex '{}' built in {:?}", self.vertex_id, self.duration)
    }
}

impl StructuredLog for VertexBuildCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            vertex_id = self.vertex_id,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "vertex_built",
            span_name = name,
            vertex_id = self.vertex_id,
            duration = ?self.duration,
        )
    }
}

/// A vertex build failed. The vertex is left in the ERROR state.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct VertexBuildFailed<'a> {
    pub vertex_id: &'a str,
    pub error: &'a BuildError,
}

impl Display for VertexBuildFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Vertex '{}' failed: {}", self.vertex_id, self.error)
    }
}

impl StructuredLog for VertexBuildFailed<'_> {
    fn log(&self) {
        tracing::error!(vertex_id = self.vertex_id, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "vertex_failed",
            span_name = name,
            vertex_id = self.vertex_id,
            error = %self.error,
        )
    }
}

/// A build request was answered without executing the component.
pub struct VertexReused<'a> {
    pub vertex_id: &'a str,
    pub reason: &'a str,
}

impl Display for VertexReused<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Skipping build of vertex '{}': {}", self.vertex_id, self.reason)
    }
}

impl StructuredLog for VertexReused<'_> {
    fn log(&self) {
        tracing::debug!(vertex_id = self.vertex_id, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "vertex_reused",
            span_name = name,
            vertex_id = self.vertex_id,
            reason = self.reason,
        )
    }
}
