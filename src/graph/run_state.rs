// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::{HashMap, HashSet};

/// Per-run bookkeeping attached to a graph.
///
/// Stamped at the start of every build pass. Guarded by the graph's mutex and only
/// touched in short synchronous sections, never across an await.
#[derive(Debug, Default)]
pub struct RunState {
    pub run_id: Option<String>,
    pub session_id: Option<String>,
    pub stop_vertex: Option<String>,
    pub vertices_to_run: HashSet<String>,
    inactivated: HashSet<String>,
    // deactivated mid-run; reported once and never picked up by the pending sweep
    deactivated: HashSet<String>,
    // excluded vertex -> vertex that excluded it
    conditionally_excluded: HashMap<String, String>,
    being_run: HashSet<String>,
    build_counts: HashMap<String, usize>,
}

impl RunState {
    /// Resets everything for a fresh pass.
    pub fn begin(
        &mut self,
        run_id: String,
        session_id: Option<String>,
        vertices_to_run: HashSet<String>,
        stop_vertex: Option<String>,
    ) {
        *self = RunState {
            run_id: Some(run_id),
            session_id,
            stop_vertex,
            vertices_to_run,
            ..Default::default()
        };
    }

    /// Claims a vertex for building.
    ///
    /// Fails when the vertex is already in flight, when an acyclic vertex has already
    /// been built this run, or when a cyclic vertex has used up its appearances.
    pub fn try_claim(&mut self, vertex_id: &str, cyclic: bool, max_cycle_appearances: usize) -> bool {
        if self.being_run.contains(vertex_id) {
            return false;
        }
        let count = self.build_counts.get(vertex_id).copied().unwrap_or(0);
        let limit = if cyclic { max_cycle_appearances.max(1) } else { 1 };
        if count >= limit {
            return false;
        }
        self.being_run.insert(vertex_id.to_string());
        self.build_counts.insert(vertex_id.to_string(), count + 1);
        true
    }

    /// Marks a claimed vertex as finished.
    pub fn release(&mut self, vertex_id: &str) {
        self.being_run.remove(vertex_id);
    }

    pub fn is_being_run(&self, vertex_id: &str) -> bool {
        self.being_run.contains(vertex_id)
    }

    pub fn build_count(&self, vertex_id: &str) -> usize {
        self.build_counts.get(vertex_id).copied().unwrap_or(0)
    }

    pub fn mark_inactivated(&mut self, vertex_id: &str) {
        self.inactivated.insert(vertex_id.to_string());
    }

    pub fn unmark_inactivated(&mut self, vertex_id: &str) {
        self.inactivated.remove(vertex_id);
    }

    pub fn is_inactivated(&self, vertex_id: &str) -> bool {
        self.inactivated.contains(vertex_id)
    }

    /// Empties the inactivated set and returns what it held, sorted.
    pub fn take_inactivated(&mut self) -> Vec<String> {
        let mut ids: Vec<String> = self.inactivated.drain().collect();
        self.deactivated.extend(ids.iter().cloned());
        ids.sort();
        ids
    }

    pub fn was_deactivated(&self, vertex_id: &str) -> bool {
        self.deactivated.contains(vertex_id)
    }

    /// Replaces the exclusions owned by `owner` with `excluded`.
    ///
    /// Exclusions owned by other vertices are left alone.
    pub fn set_exclusions(&mut self, owner: &str, excluded: &[String]) {
        self.conditionally_excluded.retain(|_, by| by != owner);
        for vertex_id in excluded {
            self.conditionally_excluded
                .insert(vertex_id.clone(), owner.to_string());
        }
    }

    pub fn is_excluded(&self, vertex_id: &str) -> bool {
        self.conditionally_excluded.contains_key(vertex_id)
    }

    pub fn excluded_vertices(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.conditionally_excluded.keys().cloned().collect();
        ids.sort();
        ids
    }
}
