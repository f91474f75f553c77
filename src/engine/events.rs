// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Build lifecycle events and their wire shape.
//!
//! Every event serializes to `{"event": <name>, "data": {...}}`; `end` carries `{}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::graph::Graph;
use crate::vertex::VertexBuild;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum BuildEvent {
    /// Emitted once, before any vertex finishes.
    VerticesSorted {
        /// The first layer.
        ids: Vec<String>,
        /// Every vertex the run may build.
        to_run: Vec<String>,
    },
    VertexEnd { build_data: VertexBuildResponse },
    /// A run-level failure. Per-vertex failures are `VertexEnd` with `valid = false`.
    Error {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        vertex_id: Option<String>,
        error: String,
    },
    End {},
}

impl BuildEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BuildEvent::VerticesSorted { .. } => "vertices_sorted",
            BuildEvent::VertexEnd { .. } => "vertex_end",
            BuildEvent::Error { .. } => "error",
            BuildEvent::End {} => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexBuildResponse {
    pub id: String,
    pub valid: bool,
    pub data: ResultData,
    pub next_vertices_ids: Vec<String>,
    pub inactivated_vertices: Vec<String>,
    pub excluded_vertices: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultData {
    pub results: Value,
    pub artifacts: Map<String, Value>,
    pub duration_ms: u64,
}

impl VertexBuildResponse {
    pub fn success(build: &VertexBuild, next: Vec<String>, inactivated: Vec<String>, graph: &Graph) -> Self {
        Self {
            id: build.vertex_id.clone(),
            valid: true,
            data: ResultData {
                results: build.result.to_json(),
                artifacts: build.artifacts.clone(),
                duration_ms: build.duration.as_millis() as u64,
            },
            next_vertices_ids: next,
            inactivated_vertices: inactivated,
            excluded_vertices: graph.excluded_vertices(),
            timestamp: Utc::now(),
        }
    }

    pub fn failure(vertex_id: &str, error: &str, stack_trace: &str, inactivated: Vec<String>, graph: &Graph) -> Self {
        let mut artifacts = Map::new();
        artifacts.insert("error".to_string(), Value::String(error.to_string()));
        artifacts.insert("stack_trace".to_string(), Value::String(stack_trace.to_string()));
        Self {
            id: vertex_id.to_string(),
            valid: false,
            data: ResultData {
                results: Value::Null,
                artifacts,
                duration_ms: 0,
            },
            next_vertices_ids: Vec::new(),
            inactivated_vertices: inactivated,
            excluded_vertices: graph.excluded_vertices(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_wire_shape_table_driven() {
        struct TestCase {
            name: &'static str,
            event: BuildEvent,
            expected: Value,
        }

        let test_cases = vec![
            TestCase {
                name: "end carries an empty object",
                event: BuildEvent::End {},
                expected: json!({"event": "end", "data": {}}),
            },
            TestCase {
                name: "vertices sorted",
                event: BuildEvent::VerticesSorted {
                    ids: vec!["a".into()],
                    to_run: vec!["a".into(), "b".into()],
                },
                expected: json!({"event": "vertices_sorted", "data": {"ids": ["a"], "to_run": ["a", "b"]}}),
            },
            TestCase {
                name: "run level error omits vertex",
                event: BuildEvent::Error {
                    vertex_id: None,
                    error: "boom".into(),
                },
                expected: json!({"event": "error", "data": {"error": "boom"}}),
            },
        ];

        for test_case in test_cases {
            let value = serde_json::to_value(&test_case.event).unwrap();
            assert_eq!(value, test_case.expected, "Test case '{}'", test_case.name);
            assert_eq!(value["event"], test_case.event.name(), "Test case '{}'", test_case.name);
        }
    }

    #[test]
    fn vertex_end_round_trips() {
        let event = BuildEvent::VertexEnd {
            build_data: VertexBuildResponse {
                id: "b".into(),
                valid: false,
                data: ResultData::default(),
                next_vertices_ids: vec![],
                inactivated_vertices: vec![],
                excluded_vertices: vec!["c".into()],
                timestamp: Utc::now(),
            },
        };

        let line = serde_json::to_string(&event).unwrap();
        let parsed: BuildEvent = serde_json::from_str(&line).unwrap();

        assert_eq!(parsed, event);
        assert!(line.starts_with(r#"{"event":"vertex_end","data":{"build_data":"#));
    }
}
