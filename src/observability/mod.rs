// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and operational
//! logging in The Loopwood. Message types follow a struct-based pattern with a
//! `Display` implementation so that log text lives in one place and every event
//! carries the same structured fields wherever it is emitted.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - layering and run lifecycle events
//! * `messages::vertex` - vertex build lifecycle events
//! * `messages::job` - background job lifecycle events
//! * `messages::validation` - flow definition loading and materialization
//!
//! # Usage
//!
//! ```rust
//! use the_loopwood::observability::messages::vertex::VertexReused;
//! use the_loopwood::observability::messages::StructuredLog;
//!
//! VertexReused {
//!     vertex_id: "prompt",
//!     reason: "already built",
//! }
//! .log();
//! ```

pub mod messages;
