// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Component and collaborator implementations.
//!
//! # Available Backends
//!
//! ## Local Backend
//! In-process components for text flows: input and output vertices, case
//! conversion, prefix/suffix wrapping, token counting and a conditional router.
//!
//! ## Memory Backend
//! Trace sinks and an in-memory session store for the orchestrator.
//!
//! ## Stub Backend (Test-Only)
//! Echoing, failing, placeholder, streaming and counting components for
//! engine tests. Only available in test builds.
//!
//! # Example
//! ```rust
//! use the_loopwood::backends::local::LocalComponentFactory;
//! use serde_json::json;
//! use std::collections::HashMap;
//!
//! let params = HashMap::from([("text".to_string(), json!("shout"))]);
//! let component = LocalComponentFactory::create_component("change_text_case", &params)?;
//! assert_eq!(component.name(), "change_text_case");
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod local;
pub mod memory;
#[cfg(test)]
pub mod stub;
