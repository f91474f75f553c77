// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::{Vertex, VertexState};
use crate::errors::BuildError;
use crate::graph::Graph;
use crate::observability::messages::vertex::{
    VertexBuildCompleted, VertexBuildFailed, VertexBuildStarted, VertexReused,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{ComponentOutput, ComponentResult, ResolvedParams};

/// Outcome of one `Vertex::build` call.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBuild {
    pub vertex_id: String,
    pub result: ComponentResult,
    pub artifacts: Map<String, Value>,
    pub params: ResolvedParams,
    /// The previous result was returned without executing the component.
    pub from_cache: bool,
    /// The vertex was INACTIVE and its component was not executed.
    pub skipped: bool,
    pub duration: Duration,
}

pub type BuildFuture<'a> = Pin<Box<dyn Future<Output = Result<VertexBuild, BuildError>> + Send + 'a>>;

impl Vertex {
    /// Builds this vertex, or returns its existing result.
    ///
    /// Builds are serialized by the vertex's own lock, so concurrent callers wait for
    /// the in-flight build and then observe its result instead of executing again.
    /// `requester` is the downstream vertex pulling this one in while resolving its
    /// inputs, or `None` when the orchestrator schedules the vertex directly. Only a
    /// direct request may re-fire a built loop vertex.
    ///
    /// Failures leave the vertex in `ERROR` with `{error, stack_trace}` artifacts;
    /// cancellation leaves it unbuilt.
    pub fn build<'a>(
        &'a self,
        graph: &'a Graph,
        requester: Option<&'a str>,
        cancel: &'a CancellationToken,
    ) -> BuildFuture<'a> {
        let span = VertexBuildStarted {
            vertex_id: self.id(),
            kind: self.kind(),
            requester,
        }
        .span("vertex_build");
        Box::pin(self.build_locked(graph, requester, cancel).instrument(span))
    }

    async fn build_locked(
        &self,
        graph: &Graph,
        requester: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<VertexBuild, BuildError> {
        let started = Instant::now();
        if cancel.is_cancelled() {
            return Err(BuildError::Cancelled(self.id().to_string()));
        }
        let _guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(BuildError::Cancelled(self.id().to_string())),
            guard = self.build_lock.lock() => guard,
        };

        if self.state() == VertexState::Inactive {
            {
                let mut status = self.status.write();
                status.built = true;
                status.result = Some(ComponentResult::Null);
            }
            VertexReused {
                vertex_id: self.id(),
                reason: "inactive",
            }
            .log();
            return Ok(self.snapshot(started, false, true));
        }

        if self.is_built() && !self.may_rebuild(graph, requester) {
            VertexReused {
                vertex_id: self.id(),
                reason: "already built",
            }
            .log();
            return Ok(self.snapshot(started, true, false));
        }

        VertexBuildStarted {
            vertex_id: self.id(),
            kind: self.kind(),
            requester,
        }
        .log();

        match self.execute(graph, cancel).await {
            Ok((output, params)) => {
                self.apply_side_effects(graph, &output);
                {
                    let mut status = self.status.write();
                    status.state = VertexState::Active;
                    status.built = true;
                    status.result = Some(output.result);
                    status.artifacts = output.artifacts;
                    status.params = params;
                }
                let build = self.snapshot(started, false, false);
                VertexBuildCompleted {
                    vertex_id: self.id(),
                    duration: build.duration,
                }
                .log();
                Ok(build)
            }
            Err(err) if err.is_cancelled() => Err(err),
            Err(err) => {
                let (message, stack_trace) = err.error_payload();
                {
                    let mut status = self.status.write();
                    status.state = VertexState::Error;
                    status.built = false;
                    status.result = None;
                    status.artifacts = Map::from_iter([
                        ("error".to_string(), Value::String(message)),
                        ("stack_trace".to_string(), Value::String(stack_trace)),
                    ]);
                }
                VertexBuildFailed {
                    vertex_id: self.id(),
                    error: &err,
                }
                .log();
                Err(err)
            }
        }
    }

    /// A built vertex is only rebuilt when the orchestrator asks directly, the vertex
    /// is not frozen, and it is allowed to re-fire (declared loop output or cycle member).
    fn may_rebuild(&self, graph: &Graph, requester: Option<&str>) -> bool {
        requester.is_none() && !self.is_frozen() && (self.allows_loop() || graph.is_cyclic(self.id()))
    }

    async fn execute(
        &self,
        graph: &Graph,
        cancel: &CancellationToken,
    ) -> Result<(ComponentOutput, ResolvedParams), BuildError> {
        let params = self.resolve_params(graph, cancel).await?;

        let factory = graph
            .registry()
            .get(self.kind())
            .ok_or_else(|| BuildError::UnknownComponent {
                vertex_id: self.id().to_string(),
                kind: self.kind().to_string(),
            })?;
        let component = factory
            .instantiate(&params)
            .map_err(|e| BuildError::component(self.id(), &e))?;

        let executed = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(BuildError::Cancelled(self.id().to_string())),
            executed = component.execute() => executed,
        };
        self.status.write().build_count += 1;
        let output = executed.map_err(|e| BuildError::component(self.id(), &e))?;

        self.validate_result(&output.result)?;
        Ok((output, params))
    }

    /// Literal params, overridden by every input wired through an edge.
    ///
    /// Several edges into one input become an array in edge order. An edge from
    /// another member of this vertex's cycle never waits: it reads whatever that
    /// vertex currently holds, otherwise two cycle members would wait on each other.
    async fn resolve_params(
        &self,
        graph: &Graph,
        cancel: &CancellationToken,
    ) -> Result<ResolvedParams, BuildError> {
        let mut params = self.spec.params.clone();
        let mut wired: Vec<(String, Vec<Value>)> = Vec::new();

        for edge in graph.incoming_edges(self.id()) {
            let upstream = graph.vertex(&edge.source_id).map_err(|_| BuildError::MissingInput {
                vertex_id: self.id().to_string(),
                input: edge.target_input.clone(),
            })?;
            let value = self
                .upstream_value(graph, upstream, &edge.source_output, cancel)
                .await?;
            match wired.iter_mut().find(|(input, _)| *input == edge.target_input) {
                Some((_, values)) => values.push(value),
                None => wired.push((edge.target_input.clone(), vec![value])),
            }
        }

        for (input, mut values) in wired {
            let value = if values.len() == 1 {
                values.remove(0)
            } else {
                Value::Array(values)
            };
            params.insert(input, value);
        }

        if let Some(missing) = self
            .spec
            .inputs
            .iter()
            .find(|input| input.required && !params.contains_key(&input.name))
        {
            return Err(BuildError::MissingInput {
                vertex_id: self.id().to_string(),
                input: missing.name.clone(),
            });
        }
        Ok(params)
    }

    async fn upstream_value(
        &self,
        graph: &Graph,
        upstream: &Vertex,
        output: &str,
        cancel: &CancellationToken,
    ) -> Result<Value, BuildError> {
        if graph.in_same_cycle(self.id(), upstream.id()) {
            return Ok(upstream.output_value(output));
        }
        let excluded = graph.run_state().is_excluded(upstream.id());
        if excluded {
            return Ok(Value::Null);
        }
        match upstream.state() {
            VertexState::Error => Err(BuildError::UpstreamFailed {
                vertex_id: self.id().to_string(),
                upstream_id: upstream.id().to_string(),
            }),
            VertexState::Inactive => Ok(Value::Null),
            VertexState::Active => {
                upstream.build(graph, Some(self.id()), cancel).await?;
                Ok(upstream.output_value(output))
            }
        }
    }

    fn validate_result(&self, result: &ComponentResult) -> Result<(), BuildError> {
        let vertex_id = self.id().to_string();
        match result {
            ComponentResult::Unbuilt => Err(BuildError::UnbuiltResult { vertex_id }),
            ComponentResult::Stream(_) if !self.spec.streams_output => {
                Err(BuildError::StreamMismatch { vertex_id })
            }
            r if r.is_null() && self.spec.requires_value => Err(BuildError::MissingValue { vertex_id }),
            _ => Ok(()),
        }
    }

    /// Routing decisions and deactivations requested by the component.
    fn apply_side_effects(&self, graph: &Graph, output: &ComponentOutput) {
        if let Some(excluded) = &output.routing {
            graph.run_state().set_exclusions(self.id(), excluded);
        }
        for vertex_id in &output.deactivate {
            if graph.set_vertex_state(vertex_id, VertexState::Inactive).is_err() {
                tracing::warn!(vertex_id = self.id(), target_id = %vertex_id, "Ignoring deactivation of unknown vertex");
            }
        }
    }

    fn snapshot(&self, started: Instant, from_cache: bool, skipped: bool) -> VertexBuild {
        let status = self.status.read();
        VertexBuild {
            vertex_id: self.id().to_string(),
            result: status.result.clone().unwrap_or_default(),
            artifacts: status.artifacts.clone(),
            params: status.params.clone(),
            from_cache,
            skipped,
            duration: started.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::StubComponentFactory;
    use crate::config::ComponentRegistry;
    use crate::graph::Edge;
    use crate::traits::Component;
    use crate::vertex::VertexSpec;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn chain(registry: ComponentRegistry, specs: Vec<VertexSpec>, edges: &[(&str, &str)]) -> Graph {
        let mut graph = Graph::new(Arc::new(registry));
        for spec in specs {
            graph.add_vertex(spec).unwrap();
        }
        for (from, to) in edges {
            graph.add_edge(Edge::new(*from, "out", *to, "in")).unwrap();
        }
        graph
    }

    fn stub(id: &str) -> VertexSpec {
        VertexSpec::new(id, "stub").input("in", false).output("out")
    }

    #[tokio::test]
    async fn upstream_results_flow_into_params() {
        let graph = chain(
            StubComponentFactory::registry(),
            vec![stub("a").param("value", json!("hello")), stub("b")],
            &[("a", "b")],
        );
        let cancel = CancellationToken::new();

        let build = graph.vertex("b").unwrap().build(&graph, None, &cancel).await.unwrap();

        assert_eq!(build.params["in"], json!("hello"));
        assert!(graph.vertex("a").unwrap().is_built());
    }

    #[tokio::test]
    async fn multiple_edges_into_one_input_become_an_array() {
        let graph = chain(
            StubComponentFactory::registry(),
            vec![
                stub("a").param("value", json!(1)),
                stub("b").param("value", json!(2)),
                stub("c"),
            ],
            &[("a", "c"), ("b", "c")],
        );
        let cancel = CancellationToken::new();

        let build = graph.vertex("c").unwrap().build(&graph, None, &cancel).await.unwrap();

        assert_eq!(build.params["in"], json!([1, 2]));
    }

    #[tokio::test]
    async fn concurrent_requests_execute_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = ComponentRegistry::new().with(
            "counting",
            StubComponentFactory::counting(Arc::clone(&calls), Duration::from_millis(20)),
        );
        let graph = Arc::new(chain(registry, vec![VertexSpec::new("slow", "counting")], &[]));
        let cancel = CancellationToken::new();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let graph = Arc::clone(&graph);
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move {
                let vertex = graph.vertex("slow").unwrap();
                vertex.build(&graph, None, &cancel).await.unwrap().result
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| *r == results[0]));
        assert_eq!(graph.vertex("slow").unwrap().build_count(), 1);
    }

    #[tokio::test]
    async fn inactive_vertex_skips_its_component() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = ComponentRegistry::new()
            .with("counting", StubComponentFactory::counting(Arc::clone(&calls), Duration::ZERO));
        let graph = chain(registry, vec![VertexSpec::new("a", "counting")], &[]);
        graph.set_vertex_state("a", VertexState::Inactive).unwrap();

        let build = graph
            .vertex("a")
            .unwrap()
            .build(&graph, None, &CancellationToken::new())
            .await
            .unwrap();

        assert!(build.skipped);
        assert_eq!(build.result, ComponentResult::Null);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn loop_vertices_rebuild_only_on_direct_request() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = ComponentRegistry::new()
            .with("counting", StubComponentFactory::counting(Arc::clone(&calls), Duration::ZERO));
        let graph = chain(
            registry,
            vec![VertexSpec::new("loop", "counting").loop_output("out")],
            &[],
        );
        let vertex = graph.vertex("loop").unwrap();
        let cancel = CancellationToken::new();

        vertex.build(&graph, None, &cancel).await.unwrap();
        let pulled = vertex.build(&graph, Some("downstream"), &cancel).await.unwrap();
        vertex.build(&graph, None, &cancel).await.unwrap();

        assert!(pulled.from_cache);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn frozen_loop_vertex_is_never_rebuilt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = ComponentRegistry::new()
            .with("counting", StubComponentFactory::counting(Arc::clone(&calls), Duration::ZERO));
        let graph = chain(
            registry,
            vec![VertexSpec::new("loop", "counting").loop_output("out").frozen()],
            &[],
        );
        let vertex = graph.vertex("loop").unwrap();
        let cancel = CancellationToken::new();

        vertex.build(&graph, None, &cancel).await.unwrap();
        let again = vertex.build(&graph, None, &cancel).await.unwrap();

        assert!(again.from_cache);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_result_validation_table_driven() {
        struct TestCase {
            name: &'static str,
            spec: VertexSpec,
            expected: Option<BuildError>,
        }

        let test_cases = vec![
            TestCase {
                name: "unbuilt placeholder",
                spec: VertexSpec::new("v", "unbuilt"),
                expected: Some(BuildError::UnbuiltResult { vertex_id: "v".into() }),
            },
            TestCase {
                name: "null where a value is required",
                spec: VertexSpec::new("v", "null").requiring_value(),
                expected: Some(BuildError::MissingValue { vertex_id: "v".into() }),
            },
            TestCase {
                name: "null is fine otherwise",
                spec: VertexSpec::new("v", "null"),
                expected: None,
            },
            TestCase {
                name: "stream into a buffered output",
                spec: VertexSpec::new("v", "stream"),
                expected: Some(BuildError::StreamMismatch { vertex_id: "v".into() }),
            },
            TestCase {
                name: "stream from a streaming vertex",
                spec: VertexSpec::new("v", "stream").streaming(),
                expected: None,
            },
            TestCase {
                name: "unknown kind",
                spec: VertexSpec::new("v", "llm"),
                expected: Some(BuildError::UnknownComponent {
                    vertex_id: "v".into(),
                    kind: "llm".into(),
                }),
            },
            TestCase {
                name: "missing required input",
                spec: VertexSpec::new("v", "stub").input("prompt", true),
                expected: Some(BuildError::MissingInput {
                    vertex_id: "v".into(),
                    input: "prompt".into(),
                }),
            },
        ];

        for test_case in test_cases {
            let graph = chain(StubComponentFactory::registry(), vec![test_case.spec], &[]);
            let result = graph
                .vertex("v")
                .unwrap()
                .build(&graph, None, &CancellationToken::new())
                .await;

            assert_eq!(result.err(), test_case.expected, "Test case '{}'", test_case.name);
        }
    }

    #[tokio::test]
    async fn component_failure_is_recorded_on_the_vertex() {
        let graph = chain(
            StubComponentFactory::registry(),
            vec![VertexSpec::new("bad", "failing").param("message", json!("kaboom"))],
            &[],
        );

        let err = graph
            .vertex("bad")
            .unwrap()
            .build(&graph, None, &CancellationToken::new())
            .await
            .unwrap_err();

        let vertex = graph.vertex("bad").unwrap();
        assert!(matches!(err, BuildError::Component { ref message, .. } if message == "kaboom"));
        assert_eq!(vertex.state(), VertexState::Error);
        assert!(!vertex.is_built());
        assert_eq!(vertex.artifacts()["error"], json!("kaboom"));
        assert!(vertex.artifacts().contains_key("stack_trace"));
    }

    #[tokio::test]
    async fn failed_upstream_fails_the_dependent() {
        let graph = chain(
            StubComponentFactory::registry(),
            vec![VertexSpec::new("a", "failing").output("out"), stub("b")],
            &[("a", "b")],
        );
        let cancel = CancellationToken::new();
        let _ = graph.vertex("a").unwrap().build(&graph, None, &cancel).await;

        let err = graph.vertex("b").unwrap().build(&graph, None, &cancel).await.unwrap_err();

        assert_eq!(
            err,
            BuildError::UpstreamFailed {
                vertex_id: "b".into(),
                upstream_id: "a".into()
            }
        );
    }

    #[tokio::test]
    async fn cancelled_build_leaves_vertex_unbuilt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = ComponentRegistry::new().with(
            "counting",
            StubComponentFactory::counting(Arc::clone(&calls), Duration::from_secs(30)),
        );
        let graph = chain(registry, vec![VertexSpec::new("slow", "counting")], &[]);
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });
        let err = graph.vertex("slow").unwrap().build(&graph, None, &cancel).await.unwrap_err();

        assert!(err.is_cancelled());
        assert!(!graph.vertex("slow").unwrap().is_built());
        assert_eq!(graph.vertex("slow").unwrap().state(), VertexState::Active);
    }

    #[tokio::test]
    async fn routing_output_sets_exclusions_and_deactivations() {
        struct Router;

        #[async_trait::async_trait]
        impl Component for Router {
            async fn execute(&self) -> anyhow::Result<ComponentOutput> {
                Ok(ComponentOutput::value(json!("left"))
                    .with_routing(vec!["right".to_string()])
                    .deactivating(vec!["right".to_string()]))
            }

            fn name(&self) -> &'static str {
                "router"
            }
        }

        let registry = StubComponentFactory::registry().with(
            "router",
            |_: &ResolvedParams| -> anyhow::Result<Box<dyn Component>> { Ok(Box::new(Router)) },
        );
        let graph = chain(
            registry,
            vec![
                VertexSpec::new("route", "router").output("out"),
                stub("left"),
                stub("right"),
            ],
            &[("route", "left"), ("route", "right")],
        );

        graph
            .vertex("route")
            .unwrap()
            .build(&graph, None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(graph.excluded_vertices(), vec!["right"]);
        assert_eq!(graph.vertex("right").unwrap().state(), VertexState::Inactive);
        assert_eq!(graph.reset_inactivated(), vec!["right"]);
        assert_eq!(graph.excluded_vertices(), vec!["right"], "exclusions survive the reset");
    }
}
