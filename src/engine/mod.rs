// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod events;
pub mod layering;
pub mod orchestrator;

pub use events::{BuildEvent, ResultData, VertexBuildResponse};
pub use layering::{layer, Layering, LayeringPolicy};
pub use orchestrator::{BuildOrchestrator, RunOutcome, RunRequest, RunSummary};
