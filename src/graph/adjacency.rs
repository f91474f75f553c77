// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use super::Edge;

/// Cached adjacency indices derived from a graph's edges.
///
/// Parallel edges between the same two vertices (different ports) count as one link,
/// so `in_degree[id] == predecessors[id].len()` always holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Adjacency {
    pub in_degree: HashMap<String, usize>,
    pub successors: HashMap<String, Vec<String>>,
    pub predecessors: HashMap<String, Vec<String>>,
}

impl Adjacency {
    /// Full O(V + E) build.
    pub fn build<'a, I>(vertex_ids: I, edges: &[Edge]) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut adjacency = Self::default();
        for id in vertex_ids {
            adjacency.insert_vertex(id);
        }
        for edge in edges {
            push_unique(
                adjacency.successors.entry(edge.source_id.clone()).or_default(),
                &edge.target_id,
            );
            push_unique(
                adjacency.predecessors.entry(edge.target_id.clone()).or_default(),
                &edge.source_id,
            );
        }
        for (id, preds) in &adjacency.predecessors {
            adjacency.in_degree.insert(id.clone(), preds.len());
        }
        adjacency
    }

    pub fn insert_vertex(&mut self, id: &str) {
        self.in_degree.entry(id.to_string()).or_insert(0);
        self.successors.entry(id.to_string()).or_default();
        self.predecessors.entry(id.to_string()).or_default();
    }

    /// Recomputes the entries of the given vertices only, leaving the rest untouched.
    pub fn refresh(&mut self, edges: &[Edge], endpoints: &[&str]) {
        for &id in endpoints {
            let mut successors = Vec::new();
            let mut predecessors = Vec::new();
            for edge in edges {
                if edge.source_id == id {
                    push_unique(&mut successors, &edge.target_id);
                }
                if edge.target_id == id {
                    push_unique(&mut predecessors, &edge.source_id);
                }
            }
            self.in_degree.insert(id.to_string(), predecessors.len());
            self.successors.insert(id.to_string(), successors);
            self.predecessors.insert(id.to_string(), predecessors);
        }
    }
}

fn push_unique(list: &mut Vec<String>, id: &str) {
    if !list.iter().any(|existing| existing == id) {
        list.push(id.to_string());
    }
}
