// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Background build jobs and their event channels.
//!
//! A job pairs an [`EventChannel`] with a cancellable background task. Consumers read
//! the channel either as a stream of NDJSON records or by polling batches; both modes
//! stop at the terminal sentinel.

pub mod channel;
pub mod queue;

pub use channel::{DrainBatch, EventChannel, EventEmitter, QueuedEvent};
pub use queue::{Job, JobContext, JobQueue};
