// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::backends::memory::{InMemorySessionStore, LoggingTraceSink};
use crate::config::{ComponentRegistry, FlowConfig};
use crate::engine::BuildOrchestrator;
use crate::errors::ConfigError;
use crate::graph::Graph;
use crate::jobs::JobQueue;

/// Runtime builder - assembles everything a flow needs to run from its definition.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use the_loopwood::backends::local::LocalComponentFactory;
/// use the_loopwood::config::{FlowConfig, RuntimeBuilder};
///
/// let flow = FlowConfig::default();
/// let (graph, _orchestrator, _jobs) =
///     RuntimeBuilder::from_config(&flow, Arc::new(LocalComponentFactory::registry())).unwrap();
///
/// assert!(graph.is_empty());
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Build a complete runtime from a flow definition.
    ///
    /// Creates and returns:
    /// - `Graph`: the validated, materialized flow
    /// - `BuildOrchestrator`: configured with the flow's layering policy, a logging
    ///   trace sink and an in-memory session store
    /// - `JobQueue`: empty queue for running the orchestrator as cancellable jobs
    pub fn from_config(
        cfg: &FlowConfig,
        registry: Arc<ComponentRegistry>,
    ) -> Result<(Graph, BuildOrchestrator, JobQueue), ConfigError> {
        let graph = cfg.into_graph(registry)?;
        let orchestrator = BuildOrchestrator::new(cfg.engine.layering_policy())
            .with_trace_sink(Arc::new(LoggingTraceSink))
            .with_session_store(Arc::new(InMemorySessionStore::default()));
        Ok((graph, orchestrator, JobQueue::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::local::LocalComponentFactory;
    use crate::config::load_and_validate_config;
    use crate::engine::RunRequest;
    use serde_json::Value;
    use std::path::PathBuf;

    fn shipped_flow(name: &str) -> FlowConfig {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("flows").join(name);
        load_and_validate_config(path).unwrap()
    }

    async fn run_to_completion(flow: &FlowConfig) -> Vec<Value> {
        let (graph, orchestrator, jobs) =
            RuntimeBuilder::from_config(flow, Arc::new(LocalComponentFactory::registry())).unwrap();
        let job_id = Arc::new(orchestrator)
            .spawn_run(&jobs, Arc::new(graph), RunRequest::default())
            .unwrap();
        let channel = jobs.get_job(&job_id).unwrap().channel();

        let mut events = Vec::new();
        loop {
            let batch = channel.drain(flow.engine.jobs.drain_timeout()).await;
            events.extend(batch.events);
            if batch.closed {
                return events;
            }
        }
    }

    fn builds_of<'a>(events: &'a [Value], id: &str) -> Vec<&'a Value> {
        events
            .iter()
            .filter(|e| e["event"] == "vertex_end" && e["data"]["build_data"]["id"] == id)
            .map(|e| &e["data"]["build_data"])
            .collect()
    }

    #[tokio::test]
    async fn text_pipeline_routes_to_the_greeting() {
        let events = run_to_completion(&shipped_flow("text-pipeline.yaml")).await;

        assert_eq!(events.last().unwrap()["event"], "end");
        let greeting = builds_of(&events, "greeting");
        assert_eq!(greeting.len(), 1);
        assert_eq!(greeting[0]["data"]["results"], "<<HELLO LOOPWOOD>>");
        assert!(builds_of(&events, "other").is_empty());
        assert_eq!(builds_of(&events, "count")[0]["data"]["results"]["word_count"], 2);
    }

    #[tokio::test]
    async fn refine_loop_stops_at_the_cycle_cap() {
        let flow = shipped_flow("refine-loop.toml");

        let events = run_to_completion(&flow).await;

        assert_eq!(events.last().unwrap()["event"], "end");
        assert_eq!(builds_of(&events, "refine").len(), flow.engine.layering.max_cycle_appearances);
        assert_eq!(builds_of(&events, "review").len(), flow.engine.layering.max_cycle_appearances);
        assert_eq!(builds_of(&events, "output").len(), 1);
        assert!(builds_of(&events, "output")[0]["valid"].as_bool().unwrap());
    }
}
