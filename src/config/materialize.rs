// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::config::{validate_flow, ComponentRegistry, FlowConfig};
use crate::errors::ConfigError;
use crate::graph::{Edge, Graph};
use crate::observability::messages::validation::{FlowMaterialized, UnregisteredKind};
use crate::observability::messages::StructuredLog;

impl FlowConfig {
    /// Validates the definition and builds the graph the engine runs.
    ///
    /// Vertex kinds missing from `registry` are only warned about here; building such
    /// a vertex fails that vertex alone.
    pub fn into_graph(&self, registry: Arc<ComponentRegistry>) -> Result<Graph, ConfigError> {
        validate_flow(self).map_err(ConfigError::Validation)?;

        let mut graph = Graph::new(Arc::clone(&registry));
        for spec in &self.vertices {
            if !registry.contains_key(&spec.kind) {
                UnregisteredKind {
                    vertex_id: &spec.id,
                    kind: &spec.kind,
                }
                .log();
            }
            graph.add_vertex(spec.clone())?;
        }
        for edge in &self.edges {
            graph.add_edge(Edge::from(edge))?;
        }

        FlowMaterialized {
            vertex_count: graph.len(),
            edge_count: graph.edges().len(),
            cyclic_count: graph.cyclic_vertices().len(),
        }
        .log();
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::StubComponentFactory;

    #[test]
    fn test_into_graph_wires_edges_and_flags() {
        let yaml = r#"
vertices:
  - id: in
    kind: stub
    is_input: true
    outputs: [{ name: out }]
  - id: loop
    kind: stub
    frozen: true
    inputs: [{ name: in }]
    outputs: [{ name: out, allows_loop: true }]
edges:
  - { source: in, output: out, target: loop, input: in }
  - { source: loop, output: out, target: loop, input: in }
"#;
        let cfg: FlowConfig = serde_yaml::from_str(yaml).unwrap();

        let graph = cfg.into_graph(Arc::new(StubComponentFactory::registry())).unwrap();

        assert!(graph.vertex("in").unwrap().is_input());
        assert!(graph.vertex("loop").unwrap().is_frozen());
        assert!(graph.vertex("loop").unwrap().allows_loop());
        assert_eq!(graph.predecessors("loop").unwrap().len(), 2);
        assert!(graph.is_cyclic("loop"));
        assert!(!graph.is_cyclic("in"));
    }

    #[test]
    fn test_into_graph_rejects_invalid_flow() {
        let cfg = FlowConfig {
            stop: Some("missing".into()),
            ..Default::default()
        };

        let err = cfg.into_graph(Arc::new(ComponentRegistry::new())).unwrap_err();

        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
