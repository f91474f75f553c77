// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // component catalogs, trace sink and session store implementations
pub mod config;     // flow definitions, registry, runtime assembly
pub mod engine;     // layering, events, build orchestrator
pub mod errors;     // error handling
pub mod graph;      // graph model and per-run state
pub mod jobs;       // background jobs and event channels
pub mod observability;
pub mod traits;     // component and collaborator seams
pub mod vertex;     // vertex spec, status and build lifecycle
