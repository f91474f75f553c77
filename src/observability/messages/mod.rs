// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit it at the right level with structured fields, or to open
//! a span carrying the same fields.
//!
//! * `engine` - layering and run lifecycle events
//! * `vertex` - vertex build lifecycle events
//! * `job` - background job lifecycle events
//! * `validation` - flow definition loading and materialization

use tracing::Span;

pub mod engine;
pub mod job;
pub mod validation;
pub mod vertex;

/// A log message that knows its own level and fields.
pub trait StructuredLog {
    /// Emits the message at its level with structured fields.
    fn log(&self);

    /// Opens a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
