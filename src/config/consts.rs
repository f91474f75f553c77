// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// How many times a vertex inside a cycle may appear across all layers of one run.
pub const DEFAULT_MAX_CYCLE_APPEARANCES: usize = 2;
/// Input-kind substrings tried in order when a graph has no zero in-degree vertex.
pub const DEFAULT_PRIMARY_INPUT_PRIORITY: &[&str] = &["webhook", "chatinput", "chat_input"];
/// Longest a poll-mode drain waits for the first event.
pub const DEFAULT_DRAIN_TIMEOUT_MS: u64 = 1_000;
/// Finished jobs older than this are dropped by `JobQueue::prune_finished`.
pub const DEFAULT_FINISHED_JOB_TTL_SECS: u64 = 300;
