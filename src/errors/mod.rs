// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod build;
mod config;
mod graph;
mod job;
mod orchestrator;

pub use build::BuildError;
pub use config::{ConfigError, ValidationError};
pub use graph::GraphError;
pub use job::JobError;
pub use orchestrator::OrchestratorError;
