// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Collaborators the orchestrator reports to but does not depend on for correctness.

use async_trait::async_trait;
use std::sync::Arc;

use crate::graph::Graph;

/// Receives the "end all traces" notification at the end of every run.
///
/// Called synchronously from a drop guard, so it must not block. Errors are logged
/// and otherwise ignored.
pub trait TraceSink: Send + Sync {
    fn end_all_traces(&self, run_id: &str, error: Option<&str>) -> anyhow::Result<()>;
}

/// Keeps graph instances by session id so a later partial re-run can reuse prior state.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn upsert(&self, session_id: &str, graph: Arc<Graph>) -> anyhow::Result<()>;

    async fn get(&self, session_id: &str) -> Option<Arc<Graph>>;
}
