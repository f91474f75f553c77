// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use thiserror::Error;

use super::GraphError;

/// Errors that can occur during flow definition validation
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Two vertices declare the same id
    DuplicateVertexId {
        /// The duplicate vertex ID
        vertex_id: String,
    },
    /// An edge references a vertex that doesn't exist
    UnresolvedEdgeEndpoint {
        /// Source of the offending edge
        source_id: String,
        /// Target of the offending edge
        target_id: String,
        /// The endpoint that couldn't be resolved
        missing_vertex: String,
    },
    /// An edge names an output or input the vertex does not declare
    UndeclaredPort {
        /// The vertex whose port is missing
        vertex_id: String,
        /// The port name used by the edge
        port: String,
        /// Either "output" or "input"
        direction: &'static str,
    },
    /// A start or stop hint points at a vertex that doesn't exist
    UnknownRunHint {
        /// "start" or "stop"
        hint: &'static str,
        /// The unknown vertex id
        vertex_id: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateVertexId { vertex_id } => {
                write!(f, "Duplicate vertex ID: '{}'", vertex_id)
            }
            ValidationError::UnresolvedEdgeEndpoint {
                source_id,
                target_id,
                missing_vertex,
            } => {
                write!(
                    f,
                    "Edge '{}' -> '{}' references vertex '{}' which does not exist",
                    source_id, target_id, missing_vertex
                )
            }
            ValidationError::UndeclaredPort {
                vertex_id,
                port,
                direction,
            } => {
                write!(
                    f,
                    "Vertex '{}' has no {} named '{}'",
                    vertex_id, direction, port
                )
            }
            ValidationError::UnknownRunHint { hint, vertex_id } => {
                write!(f, "The {} vertex '{}' does not exist", hint, vertex_id)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while loading a flow definition from disk.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading flow definition: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML flow definition: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid TOML flow definition: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported flow definition extension '{0}' (expected .yaml, .yml or .toml)")]
    UnsupportedFormat(String),

    #[error("Flow validation failed:\n{}", format_validation(.0))]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
