// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod component;
pub mod sinks;

pub use component::{Component, ComponentFactory, ComponentOutput, ComponentResult, ResolvedParams};
pub use sinks::{SessionStore, TraceSink};
