// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod component_registry;
mod loader;
mod materialize;
mod runtime;
mod validation;

pub mod consts;

pub use component_registry::ComponentRegistry;
pub use loader::{
    load_and_validate_config, load_config, EdgeConfig, EngineConfig, FlowConfig, JobsConfig,
    LayeringConfig,
};
pub use runtime::RuntimeBuilder;
pub use validation::validate_flow;
