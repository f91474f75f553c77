// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structural errors raised by the graph model and the layering scheduler.

use thiserror::Error;

/// A structural problem with a graph. These abort a run before any vertex builds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A vertex id was requested that the graph does not contain.
    #[error("Vertex '{0}' not found in graph")]
    VertexNotFound(String),

    /// An edge references an endpoint that is not a vertex of the graph.
    #[error("Edge {source_id} -> {target_id} references missing vertex '{missing}'")]
    DanglingEdge {
        source_id: String,
        target_id: String,
        missing: String,
    },

    /// Two vertices share the same id.
    #[error("Duplicate vertex id: '{0}'")]
    DuplicateVertex(String),
}
