// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::GraphError;
use thiserror::Error;

/// Run-level failures. Any of these ends the run with a single terminal `error` event.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// The graph could not be layered (missing vertex, bad start/stop id).
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A vertex response or event could not be serialized.
    #[error("Failed to serialize build event: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A build task panicked or was aborted outside a cancellation.
    #[error("Build task failed: {0}")]
    TaskFailed(String),
}
