// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

/// A data dependency from one vertex's named output to another vertex's named input.
///
/// Type compatibility between the two ports is checked by whoever materializes the
/// graph; the engine only uses edges for adjacency and parameter resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source_id: String,
    pub source_output: String,
    pub target_id: String,
    pub target_input: String,
}

impl Edge {
    pub fn new(
        source_id: impl Into<String>,
        source_output: impl Into<String>,
        target_id: impl Into<String>,
        target_input: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            source_output: source_output.into(),
            target_id: target_id.into(),
            target_input: target_input.into(),
        }
    }
}
