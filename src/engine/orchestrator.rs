// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Runs one build pass over a graph and reports it as an event stream.
//!
//! The orchestrator layers the graph, builds the first layer concurrently and then
//! cascades: every finished vertex schedules those successors whose dependencies are
//! now satisfied. Cyclic vertices may be scheduled up to the policy's appearance cap.
//!
//! Per-vertex failures are reported as `vertex_end` events with `valid = false` and
//! do not stop unrelated branches. Run-level failures (bad start or stop id, a
//! panicking build task) end the run with a single `error` event. A cancelled run
//! aborts its in-flight builds and ends with nothing but the channel's sentinel.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::events::{BuildEvent, VertexBuildResponse};
use super::layering::{layer, Layering, LayeringPolicy};
use crate::backends::memory::{InMemorySessionStore, NoopTraceSink};
use crate::errors::{BuildError, GraphError, JobError, OrchestratorError};
use crate::graph::Graph;
use crate::jobs::{EventEmitter, JobQueue};
use crate::observability::messages::engine::{
    RunCancelled, RunCompleted, RunFailed, RunStarted, SessionStoreFailed, TraceSinkFailed,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{SessionStore, TraceSink};
use crate::vertex::VertexBuild;

type BuildTask = (String, Result<VertexBuild, BuildError>);

/// What to build in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRequest {
    /// Rebuild from this vertex onward; upstream results are reused when present.
    pub start_vertex_id: Option<String>,
    /// Build only what this vertex needs.
    pub stop_vertex_id: Option<String>,
    /// Key under which the graph is kept in the session store.
    pub session_id: Option<String>,
}

impl RunRequest {
    pub fn starting_at(mut self, vertex_id: impl Into<String>) -> Self {
        self.start_vertex_id = Some(vertex_id.into());
        self
    }

    pub fn stopping_at(mut self, vertex_id: impl Into<String>) -> Self {
        self.stop_vertex_id = Some(vertex_id.into());
        self
    }

    pub fn in_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every reachable vertex was attempted; some may still have failed.
    Completed,
    Cancelled,
    /// A run-level error ended the run early.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub outcome: RunOutcome,
    /// Vertices that reported a successful build, in completion order.
    pub built: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Default)]
struct Progress {
    built: Vec<String>,
    failed: Vec<String>,
    in_flight: usize,
}

enum Flow {
    Drained,
    Cancelled,
}

/// Closes the run's traces exactly once, also when the run future is dropped.
struct TraceGuard {
    sink: Arc<dyn TraceSink>,
    run_id: String,
    done: AtomicBool,
}

impl TraceGuard {
    fn new(sink: Arc<dyn TraceSink>, run_id: String) -> Self {
        Self {
            sink,
            run_id,
            done: AtomicBool::new(false),
        }
    }

    fn finish(&self, error: Option<&str>) {
        if self.done.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.sink.end_all_traces(&self.run_id, error) {
            TraceSinkFailed {
                run_id: &self.run_id,
                error: &e,
            }
            .log();
        }
    }
}

impl Drop for TraceGuard {
    fn drop(&mut self) {
        self.finish(Some("cancelled"));
    }
}

pub struct BuildOrchestrator {
    policy: LayeringPolicy,
    trace_sink: Arc<dyn TraceSink>,
    session_store: Arc<dyn SessionStore>,
}

impl fmt::Debug for BuildOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildOrchestrator")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Default for BuildOrchestrator {
    fn default() -> Self {
        Self::new(LayeringPolicy::default())
    }
}

impl BuildOrchestrator {
    pub fn new(policy: LayeringPolicy) -> Self {
        Self {
            policy,
            trace_sink: Arc::new(NoopTraceSink),
            session_store: Arc::new(InMemorySessionStore::default()),
        }
    }

    pub fn with_trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.trace_sink = sink;
        self
    }

    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = store;
        self
    }

    pub fn policy(&self) -> &LayeringPolicy {
        &self.policy
    }

    pub fn session_store(&self) -> &Arc<dyn SessionStore> {
        &self.session_store
    }

    /// Runs one build pass, writing its events to `emitter` and closing it at the end.
    ///
    /// Never fails: run-level errors are reported on the channel and in the summary.
    pub async fn run(
        &self,
        graph: Arc<Graph>,
        request: RunRequest,
        emitter: &EventEmitter,
        cancel: &CancellationToken,
    ) -> RunSummary {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();
        let traces = TraceGuard::new(Arc::clone(&self.trace_sink), run_id.clone());
        let mut progress = Progress::default();

        let span = RunStarted {
            run_id: &run_id,
            session_id: request.session_id.as_deref(),
            vertices_to_run: 0,
        }
        .span("run");
        let flow = self
            .drive(&graph, &request, &run_id, emitter, cancel, &mut progress)
            .instrument(span)
            .await
            .and_then(|flow| {
                if let Flow::Drained = flow {
                    emitter.emit(&BuildEvent::End {})?;
                }
                Ok(flow)
            });

        let outcome = match flow {
            Ok(Flow::Drained) => {
                traces.finish(None);
                RunCompleted {
                    run_id: &run_id,
                    built: progress.built.len(),
                    failed: progress.failed.len(),
                    duration: started.elapsed(),
                }
                .log();
                RunOutcome::Completed
            }
            Ok(Flow::Cancelled) => {
                traces.finish(Some("cancelled"));
                RunCancelled {
                    run_id: &run_id,
                    in_flight: progress.in_flight,
                }
                .log();
                RunOutcome::Cancelled
            }
            Err(err) => {
                RunFailed {
                    run_id: &run_id,
                    error: &err,
                }
                .log();
                let message = err.to_string();
                // the error event itself may be what failed to serialize; the sentinel still follows
                let _ = emitter.emit(&BuildEvent::Error {
                    vertex_id: None,
                    error: message.clone(),
                });
                traces.finish(Some(&message));
                RunOutcome::Failed(message)
            }
        };
        emitter.close();

        RunSummary {
            run_id,
            outcome,
            built: progress.built,
            failed: progress.failed,
        }
    }

    /// Creates a job on `jobs` that runs this orchestrator over `graph`.
    pub fn spawn_run(
        self: &Arc<Self>,
        jobs: &JobQueue,
        graph: Arc<Graph>,
        request: RunRequest,
    ) -> Result<String, JobError> {
        let job_id = jobs.create_job();
        let orchestrator = Arc::clone(self);
        jobs.start_job(&job_id, move |ctx| async move {
            orchestrator
                .run(graph, request, &ctx.emitter, &ctx.cancel)
                .await;
        })?;
        Ok(job_id)
    }

    async fn drive(
        &self,
        graph: &Arc<Graph>,
        request: &RunRequest,
        run_id: &str,
        emitter: &EventEmitter,
        cancel: &CancellationToken,
        progress: &mut Progress,
    ) -> Result<Flow, OrchestratorError> {
        let layering = layer(
            graph,
            request.start_vertex_id.as_deref(),
            request.stop_vertex_id.as_deref(),
            &self.policy,
        )?;
        // a stop inside a cycle was turned into the start by the layering
        let stop = request
            .stop_vertex_id
            .as_ref()
            .filter(|id| !graph.is_cyclic(id))
            .cloned();

        reset_for_run(graph, request.start_vertex_id.as_deref(), &layering)?;
        graph.stamp_run(
            run_id.to_string(),
            request.session_id.clone(),
            layering.vertices_to_run.clone(),
            stop,
        );
        RunStarted {
            run_id,
            session_id: request.session_id.as_deref(),
            vertices_to_run: layering.vertices_to_run.len(),
        }
        .log();
        self.store_session(graph, request).await;

        let mut to_run: Vec<String> = layering.vertices_to_run.iter().cloned().collect();
        to_run.sort();
        emitter.emit(&BuildEvent::VerticesSorted {
            ids: layering.first_layer.clone(),
            to_run,
        })?;

        let order = layering.flattened();
        let mut tasks: JoinSet<BuildTask> = JoinSet::new();
        for vertex_id in &layering.first_layer {
            self.spawn_build(graph, vertex_id, &mut tasks, cancel)?;
        }

        loop {
            if cancel.is_cancelled() {
                progress.in_flight = tasks.len();
                tasks.abort_all();
                while tasks.join_next().await.is_some() {}
                return Ok(Flow::Cancelled);
            }

            if tasks.is_empty() {
                let mut spawned = false;
                for vertex_id in graph.pending_runnable(&order) {
                    spawned |= self.spawn_build(graph, &vertex_id, &mut tasks, cancel)?;
                }
                if !spawned {
                    return Ok(Flow::Drained);
                }
            }

            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled() => continue,
                joined = tasks.join_next() => joined,
            };
            let Some(joined) = joined else {
                continue;
            };
            let (vertex_id, result) =
                joined.map_err(|e| OrchestratorError::TaskFailed(e.to_string()))?;

            graph.run_state().release(&vertex_id);

            match result {
                Ok(build) => {
                    // successors deactivated by this build are still INACTIVE here
                    let next = graph.next_runnable(&vertex_id)?;
                    let inactivated = graph.reset_inactivated();
                    let response =
                        VertexBuildResponse::success(&build, next.clone(), inactivated, graph);
                    emitter.emit(&BuildEvent::VertexEnd {
                        build_data: response,
                    })?;
                    progress.built.push(vertex_id.clone());

                    if graph.vertex(&vertex_id)?.spec().streams_output {
                        self.store_session(graph, request).await;
                    }
                    for next_id in &next {
                        self.spawn_build(graph, next_id, &mut tasks, cancel)?;
                    }
                }
                // the token fired mid-build; the next iteration winds the run down
                Err(err) if err.is_cancelled() => {}
                Err(err) => {
                    let inactivated = graph.reset_inactivated();
                    let (message, stack_trace) = err.error_payload();
                    let response = VertexBuildResponse::failure(
                        &vertex_id,
                        &message,
                        &stack_trace,
                        inactivated,
                        graph,
                    );
                    emitter.emit(&BuildEvent::VertexEnd {
                        build_data: response,
                    })?;
                    progress.failed.push(vertex_id);
                }
            }
        }
    }

    /// Claims `vertex_id` for this run and spawns its build. Returns false when the
    /// claim was refused (in flight, already built, or out of cycle appearances).
    fn spawn_build(
        &self,
        graph: &Arc<Graph>,
        vertex_id: &str,
        tasks: &mut JoinSet<BuildTask>,
        cancel: &CancellationToken,
    ) -> Result<bool, GraphError> {
        let vertex = Arc::clone(graph.vertex(vertex_id)?);
        let cyclic = graph.is_cyclic(vertex_id);
        if !graph
            .run_state()
            .try_claim(vertex_id, cyclic, self.policy.max_cycle_appearances)
        {
            return Ok(false);
        }

        let graph = Arc::clone(graph);
        let cancel = cancel.clone();
        tasks.spawn(async move {
            let result = vertex.build(&graph, None, &cancel).await;
            (vertex.id().to_string(), result)
        });
        Ok(true)
    }

    async fn store_session(&self, graph: &Arc<Graph>, request: &RunRequest) {
        let Some(session_id) = &request.session_id else {
            return;
        };
        if let Err(e) = self.session_store.upsert(session_id, Arc::clone(graph)).await {
            SessionStoreFailed {
                session_id,
                error: &e,
            }
            .log();
        }
    }
}

/// Clears previous results of everything this run may build.
///
/// Frozen vertices keep their result. With a start vertex, only the start and what
/// lies downstream of it are cleared; upstream results are reused when present.
fn reset_for_run(graph: &Graph, start_id: Option<&str>, layering: &Layering) -> Result<(), GraphError> {
    let rebuilt: Option<HashSet<String>> = start_id.map(|id| graph.subgraph_from(id)).transpose()?;
    for vertex_id in &layering.vertices_to_run {
        let vertex = graph.vertex(vertex_id)?;
        let reusable = vertex.is_frozen()
            || rebuilt
                .as_ref()
                .is_some_and(|ids| !ids.contains(vertex_id));
        if !(reusable && vertex.is_built()) {
            vertex.reset();
        }
    }
    Ok(())
}
