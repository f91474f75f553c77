// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structural validation of a flow definition before it is materialized.
//!
//! Cycles are not an error here: loop vertices legitimately feed results back
//! upstream and the scheduler bounds how often they re-fire. What is rejected is
//! anything that would make the graph ill-formed:
//!
//! 1. **Duplicate vertex ids**
//! 2. **Edges with a missing endpoint**
//! 3. **Edges naming ports the vertex does not declare** (only checked when the
//!    vertex declares ports on that side at all)
//! 4. **Start/stop hints naming unknown vertices**
//!
//! All problems are accumulated so the author sees them at once.

use std::collections::{HashMap, HashSet};

use crate::config::FlowConfig;
use crate::errors::ValidationError;
use crate::vertex::VertexSpec;

pub fn validate_flow(config: &FlowConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    errors.extend(validate_unique_vertex_ids(config));
    errors.extend(validate_edges(config));
    errors.extend(validate_run_hints(config));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_unique_vertex_ids(config: &FlowConfig) -> Vec<ValidationError> {
    let mut seen_ids = HashSet::new();
    config
        .vertices
        .iter()
        .filter(|v| !seen_ids.insert(&v.id))
        .map(|v| ValidationError::DuplicateVertexId {
            vertex_id: v.id.clone(),
        })
        .collect()
}

fn validate_edges(config: &FlowConfig) -> Vec<ValidationError> {
    let vertices: HashMap<&str, &VertexSpec> = config
        .vertices
        .iter()
        .map(|v| (v.id.as_str(), v))
        .collect();
    let mut errors = Vec::new();

    for edge in &config.edges {
        let source = vertices.get(edge.source.as_str());
        let target = vertices.get(edge.target.as_str());

        for (endpoint, resolved) in [(&edge.source, source), (&edge.target, target)] {
            if resolved.is_none() {
                errors.push(ValidationError::UnresolvedEdgeEndpoint {
                    source_id: edge.source.clone(),
                    target_id: edge.target.clone(),
                    missing_vertex: endpoint.clone(),
                });
            }
        }

        if let Some(source) = source {
            if !source.outputs.is_empty() && !source.declares_output(&edge.output) {
                errors.push(ValidationError::UndeclaredPort {
                    vertex_id: source.id.clone(),
                    port: edge.output.clone(),
                    direction: "output",
                });
            }
        }
        if let Some(target) = target {
            if !target.inputs.is_empty() && !target.declares_input(&edge.input) {
                errors.push(ValidationError::UndeclaredPort {
                    vertex_id: target.id.clone(),
                    port: edge.input.clone(),
                    direction: "input",
                });
            }
        }
    }

    errors
}

fn validate_run_hints(config: &FlowConfig) -> Vec<ValidationError> {
    let known = |id: &str| config.vertices.iter().any(|v| v.id == id);
    [("start", &config.start), ("stop", &config.stop)]
        .into_iter()
        .filter_map(|(hint, id)| match id {
            Some(id) if !known(id) => Some(ValidationError::UnknownRunHint {
                hint,
                vertex_id: id.clone(),
            }),
            _ => None,
        })
        .collect()
}
