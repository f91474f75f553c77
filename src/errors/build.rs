// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors produced while building a single vertex.
//!
//! A `BuildError` is always attributable to one vertex. The orchestrator records it
//! as that vertex's result (`valid = false`) and keeps the rest of the run going;
//! only `Cancelled` is treated differently, since cancellation is not a failure.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The underlying component raised while instantiating or executing.
    #[error("Error building component '{vertex_id}': {message}")]
    Component {
        vertex_id: String,
        message: String,
        stack_trace: String,
    },

    /// No factory is registered for the vertex kind.
    #[error("No component registered for kind '{kind}' (vertex '{vertex_id}')")]
    UnknownComponent { vertex_id: String, kind: String },

    /// The component handed back the "unbuilt" placeholder instead of a result.
    #[error("Component '{vertex_id}' returned an unbuilt placeholder")]
    UnbuiltResult { vertex_id: String },

    /// The component returned no value but the vertex requires one.
    #[error("Component '{vertex_id}' returned no value but a value is required")]
    MissingValue { vertex_id: String },

    /// A streaming result was produced by a vertex that does not stream its output.
    #[error("Component '{vertex_id}' returned a stream but its output is not declared as streaming")]
    StreamMismatch { vertex_id: String },

    /// A required input is neither wired by an edge nor given a literal value.
    #[error("Vertex '{vertex_id}' is missing required input '{input}'")]
    MissingInput { vertex_id: String, input: String },

    /// An upstream vertex this one depends on ended in the error state.
    #[error("Vertex '{vertex_id}' depends on '{upstream_id}', which failed to build")]
    UpstreamFailed {
        vertex_id: String,
        upstream_id: String,
    },

    /// The build was cancelled before it finished.
    #[error("Build of vertex '{0}' was cancelled")]
    Cancelled(String),
}

impl BuildError {
    /// Wraps a component failure, keeping the message and the full cause chain.
    pub fn component(vertex_id: &str, err: &anyhow::Error) -> Self {
        BuildError::Component {
            vertex_id: vertex_id.to_string(),
            message: err.to_string(),
            stack_trace: format!("{err:?}"),
        }
    }

    /// Message and trace for the `{error, stack_trace}` artifact.
    pub fn error_payload(&self) -> (String, String) {
        match self {
            BuildError::Component {
                message,
                stack_trace,
                ..
            } => (message.clone(), stack_trace.clone()),
            other => (other.to_string(), other.to_string()),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, BuildError::Cancelled(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_error_keeps_cause_chain() {
        let err = anyhow::anyhow!("disk full").context("writing cache");
        let build_err = BuildError::component("writer-1", &err);

        let (message, trace) = build_err.error_payload();
        assert_eq!(message, "writing cache");
        assert!(trace.contains("disk full"));
        assert!(build_err.to_string().contains("writer-1"));
    }

    #[test]
    fn cancelled_is_not_a_component_failure() {
        let err = BuildError::Cancelled("a".into());
        assert!(err.is_cancelled());
        assert!(!BuildError::MissingValue { vertex_id: "a".into() }.is_cancelled());
    }
}
