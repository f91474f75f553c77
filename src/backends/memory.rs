// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! In-process implementations of the orchestrator's collaborators.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::graph::Graph;
use crate::observability::messages::engine::TracesEnded;
use crate::observability::messages::StructuredLog;
use crate::traits::{SessionStore, TraceSink};

/// Discards trace notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTraceSink;

impl TraceSink for NoopTraceSink {
    fn end_all_traces(&self, _run_id: &str, _error: Option<&str>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Reports the end of every run through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingTraceSink;

impl TraceSink for LoggingTraceSink {
    fn end_all_traces(&self, run_id: &str, error: Option<&str>) -> anyhow::Result<()> {
        TracesEnded { run_id, error }.log();
        Ok(())
    }
}

/// Graphs by session id, kept for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    graphs: RwLock<HashMap<String, Arc<Graph>>>,
}

impl InMemorySessionStore {
    pub async fn len(&self) -> usize {
        self.graphs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.graphs.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn upsert(&self, session_id: &str, graph: Arc<Graph>) -> anyhow::Result<()> {
        self.graphs
            .write()
            .await
            .insert(session_id.to_string(), graph);
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Option<Arc<Graph>> {
        self.graphs.read().await.get(session_id).cloned()
    }
}
