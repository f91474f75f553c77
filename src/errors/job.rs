// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors reported by the job queue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The job was never created or has already been pruned.
    #[error("Job '{0}' not found")]
    NotFound(String),

    /// `start_job` was called twice for the same job.
    #[error("Job '{0}' has already been started")]
    AlreadyStarted(String),
}
