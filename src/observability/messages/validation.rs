// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for flow definition loading and materialization.
//!
//! This module contains message types for logging events related to:
//! * Vertices whose kind has no registered component
//! * The shape of a materialized graph

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A vertex names a kind the component registry does not know.
///
/// Not fatal at load time: the vertex fails with an unknown-component error only if a
/// run actually reaches it.
///
/// # Log Level
/// `warn!` - Potential issue or degraded behavior
///
/// # Example
/// ```
/// use the_loopwood::observability::messages::validation::UnregisteredKind;
///
/// let msg = UnregisteredKind {
///     vertex_id: "llm",
///     kind: "openai",
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct UnregisteredKind<'a> {
    pub vertex_id: &'a str,
    pub kind: &'a str,
}

impl Display for UnregisteredKind<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Vertex '{}' uses kind '{}' which has no registered component",
            self.vertex_id, self.kind
        )
    }
}

impl StructuredLog for UnregisteredKind<'_> {
    fn log(&self) {
        tracing::warn!(vertex_id = self.vertex_id, kind = self.kind, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::WARN,
            "span_name",
            name = name,
            vertex_id = self.vertex_id,
            kind = self.kind,
        )
    }
}

/// A flow definition was turned into a graph.
///
/// # Log Level
/// `info!` - Important operational event
pub struct FlowMaterialized {
    pub vertex_count: usize,
    pub edge_count: usize,
    pub cyclic_count: usize,
}

impl Display for FlowMaterialized {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Materialized flow: {} vertices, {} edges, {} in cycles",
            self.vertex_count, self.edge_count, self.cyclic_count
        )
    }
}

impl StructuredLog for FlowMaterialized {
    fn log(&self) {
        tracing::info!(
            vertex_count = self.vertex_count,
            edge_count = self.edge_count,
            cyclic_count = self.cyclic_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "span_name",
            name = name,
            vertex_count = self.vertex_count,
            edge_count = self.edge_count,
            cyclic_count = self.cyclic_count,
        )
    }
}
