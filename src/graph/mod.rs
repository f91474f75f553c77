// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Graph model: vertices, edges and the derived adjacency indices.

mod adjacency;
pub mod cycles;
mod edge;
mod model;
mod run_state;

pub use adjacency::Adjacency;
pub use edge::Edge;
pub use model::Graph;
pub use run_state::RunState;
