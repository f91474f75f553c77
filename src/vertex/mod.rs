// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Stateful wrapper around one graph node.
//!
//! A [`Vertex`] owns its build state, resolved parameters, results and artifacts, and
//! an exclusive build lock. The lifecycle lives in [`build`](Vertex::build):
//!
//! ```text
//! ACTIVE ──deactivate──▶ INACTIVE ──reset/activate──▶ ACTIVE
//!   │
//!   └──build fails──▶ ERROR ──reset──▶ ACTIVE
//! ```

mod build;
mod spec;

pub use build::{BuildFuture, VertexBuild};
pub use spec::{InputSpec, OutputSpec, VertexSpec};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::traits::{ComponentResult, ResolvedParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VertexState {
    #[default]
    Active,
    Inactive,
    Error,
}

#[derive(Debug, Default)]
struct VertexStatus {
    state: VertexState,
    built: bool,
    result: Option<ComponentResult>,
    artifacts: Map<String, Value>,
    params: ResolvedParams,
    build_count: usize,
}

#[derive(Debug)]
pub struct Vertex {
    spec: VertexSpec,
    build_lock: tokio::sync::Mutex<()>,
    status: RwLock<VertexStatus>,
}

impl Vertex {
    pub fn new(spec: VertexSpec) -> Self {
        Self {
            spec,
            build_lock: tokio::sync::Mutex::new(()),
            status: RwLock::new(VertexStatus::default()),
        }
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }

    pub fn kind(&self) -> &str {
        &self.spec.kind
    }

    pub fn spec(&self) -> &VertexSpec {
        &self.spec
    }

    pub fn is_input(&self) -> bool {
        self.spec.is_input
    }

    pub fn is_output(&self) -> bool {
        self.spec.is_output
    }

    pub fn is_frozen(&self) -> bool {
        self.spec.frozen
    }

    /// Declared loop vertex: at least one output may feed back upstream.
    pub fn allows_loop(&self) -> bool {
        self.spec.outputs.iter().any(|o| o.allows_loop)
    }

    pub fn state(&self) -> VertexState {
        self.status.read().state
    }

    /// Raw state change. Use `Graph::set_vertex_state` so the inactivated set stays in sync.
    pub(crate) fn set_state(&self, state: VertexState) {
        self.status.write().state = state;
    }

    pub fn is_built(&self) -> bool {
        self.status.read().built
    }

    pub fn result(&self) -> Option<ComponentResult> {
        self.status.read().result.clone()
    }

    pub fn artifacts(&self) -> Map<String, Value> {
        self.status.read().artifacts.clone()
    }

    pub fn params(&self) -> ResolvedParams {
        self.status.read().params.clone()
    }

    /// Number of times the underlying component actually executed.
    pub fn build_count(&self) -> usize {
        self.status.read().build_count
    }

    /// Value of one output as seen by a downstream vertex.
    ///
    /// Multi-output vertices publish an object keyed by output name; single-output
    /// vertices publish their whole result under every name.
    pub fn output_value(&self, output: &str) -> Value {
        let status = self.status.read();
        let Some(result) = &status.result else {
            return Value::Null;
        };
        let json = result.to_json();
        if self.spec.outputs.len() > 1 {
            if let Value::Object(map) = &json {
                if let Some(value) = map.get(output) {
                    return value.clone();
                }
            }
        }
        json
    }

    /// Forgets the previous build and returns to ACTIVE.
    pub fn reset(&self) {
        let mut status = self.status.write();
        let build_count = status.build_count;
        *status = VertexStatus {
            build_count,
            ..Default::default()
        };
    }

    /// Same spec, pristine state; used when a run needs its own vertex set.
    pub(crate) fn fresh_copy(&self) -> Vertex {
        Vertex::new(self.spec.clone())
    }
}
