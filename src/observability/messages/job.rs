// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for background job lifecycle events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

pub struct JobCreated<'a> {
    pub job_id: &'a str,
}

impl Display for JobCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Created job {}", self.job_id)
    }
}

impl StructuredLog for JobCreated<'_> {
    fn log(&self) {
        tracing::debug!(job_id = self.job_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("job_created", span_name = name, job_id = self.job_id)
    }
}

/// The job's background task was spawned. Its span wraps the whole task.
pub struct JobStarted<'a> {
    pub job_id: &'a str,
}

impl Display for JobStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Started job {}", self.job_id)
    }
}

impl StructuredLog for JobStarted<'_> {
    fn log(&self) {
        tracing::info!(job_id = self.job_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("job", span_name = name, job_id = self.job_id)
    }
}

/// A job was cancelled.
///
/// `was_running` is false when the job had already finished and cancelling was a no-op.
pub struct JobCancelled<'a> {
    pub job_id: &'a str,
    pub was_running: bool,
}

impl Display for JobCancelled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.was_running {
            write!(f, "Cancelled job {}", self.job_id)
        } else {
            write!(f, "Job {} had already finished", self.job_id)
        }
    }
}

impl StructuredLog for JobCancelled<'_> {
    fn log(&self) {
        tracing::info!(job_id = self.job_id, was_running = self.was_running, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("job_cancelled", span_name = name, job_id = self.job_id)
    }
}

pub struct JobsPruned {
    pub pruned: usize,
    pub remaining: usize,
}

impl Display for JobsPruned {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pruned {} finished jobs, {} remaining",
            self.pruned, self.remaining
        )
    }
}

impl StructuredLog for JobsPruned {
    fn log(&self) {
        tracing::debug!(pruned = self.pruned, remaining = self.remaining, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("jobs_pruned", span_name = name, pruned = self.pruned)
    }
}
