// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Turns a graph (optionally restricted by a start and/or stop vertex) into ordered
//! build layers.
//!
//! ## Algorithm
//!
//! 1. A stop vertex that sits inside a cycle cannot terminate a run
//!    deterministically, so it becomes the start vertex instead.
//! 2. The vertex set is restricted: a stop keeps `subgraph_up_to(stop)`, a start keeps
//!    everything it can reach plus everything each of those needs. With both, a stop
//!    the start cannot reach yields nothing to run.
//! 3. Kahn's algorithm is seeded with the zero in-degree vertices of that set. When
//!    there is none (a pure cycle), the start vertex, else the primary input, else the
//!    smallest id is seeded with its in-degree forced to zero.
//! 4. Waves are produced by decrementing successor in-degrees. A cyclic vertex whose
//!    only unfired predecessors belong to its own cycle is enqueued eagerly, otherwise
//!    a cycle with an external entry would never reach in-degree zero.
//! 5. A vertex outside any cycle appears once. A cyclic vertex appears at most
//!    `max_cycle_appearances` times.
//! 6. A mixed first layer containing an input vertex is split so the primary input
//!    runs alone, and every layer is ordered producers first.
//!
//! - **Time Complexity**: O(cap × (V + E)) where cap bounds cycle re-appearances
//! - **Space Complexity**: O(V) for in-degree and appearance bookkeeping

use std::collections::{HashMap, HashSet};

use crate::config::consts::{DEFAULT_MAX_CYCLE_APPEARANCES, DEFAULT_PRIMARY_INPUT_PRIORITY};
use crate::errors::GraphError;
use crate::graph::Graph;
use crate::observability::messages::engine::{LayersComputed, PrimaryInputSeeded};
use crate::observability::messages::StructuredLog;

/// Tunable heuristics of the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct LayeringPolicy {
    /// Upper bound on how often a cyclic vertex appears across all layers.
    pub max_cycle_appearances: usize,
    /// Lowercase substrings matched against input vertex kinds, most preferred first.
    pub primary_input_priority: Vec<String>,
}

impl Default for LayeringPolicy {
    fn default() -> Self {
        Self {
            max_cycle_appearances: DEFAULT_MAX_CYCLE_APPEARANCES,
            primary_input_priority: DEFAULT_PRIMARY_INPUT_PRIORITY
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layering {
    pub first_layer: Vec<String>,
    pub remaining_layers: Vec<Vec<String>>,
    /// Every vertex that appears in some layer.
    pub vertices_to_run: HashSet<String>,
}

impl Layering {
    pub fn is_empty(&self) -> bool {
        self.first_layer.is_empty()
    }

    /// First layer followed by the remaining ones.
    pub fn layers(&self) -> Vec<Vec<String>> {
        let mut layers = Vec::with_capacity(self.remaining_layers.len() + 1);
        if !self.first_layer.is_empty() {
            layers.push(self.first_layer.clone());
        }
        layers.extend(self.remaining_layers.iter().cloned());
        layers
    }

    /// Every scheduled vertex in layer order, each listed once.
    pub fn flattened(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.layers()
            .into_iter()
            .flatten()
            .filter(|id| seen.insert(id.clone()))
            .collect()
    }
}

/// Computes the build layers of `graph`, restricted by the optional start/stop vertex.
pub fn layer(
    graph: &Graph,
    start_id: Option<&str>,
    stop_id: Option<&str>,
    policy: &LayeringPolicy,
) -> Result<Layering, GraphError> {
    for id in start_id.iter().chain(stop_id.iter()) {
        graph.vertex(id)?;
    }

    let (start_id, stop_id) = match stop_id {
        Some(stop) if graph.is_cyclic(stop) => (Some(stop), None),
        _ => (start_id, stop_id),
    };

    let scope = restrict(graph, start_id, stop_id)?;
    if scope.is_empty() {
        return Ok(Layering::default());
    }

    let mut ids: Vec<String> = scope.iter().cloned().collect();
    ids.sort();

    let mut layers = if ids.len() == 1 {
        vec![ids.clone()]
    } else {
        kahn_waves(graph, &ids, &scope, start_id, policy)
    };

    promote_primary_input(graph, &mut layers, policy);
    for layer in &mut layers {
        order_producers_first(graph, layer);
    }

    let vertices_to_run: HashSet<String> = layers.iter().flatten().cloned().collect();
    let mut layers = layers.into_iter();
    let first_layer = layers.next().unwrap_or_default();
    let remaining_layers: Vec<Vec<String>> = layers.collect();

    LayersComputed {
        layer_count: remaining_layers.len() + usize::from(!first_layer.is_empty()),
        vertices_to_run: vertices_to_run.len(),
        start_id,
        stop_id,
    }
    .log();

    Ok(Layering {
        first_layer,
        remaining_layers,
        vertices_to_run,
    })
}

fn restrict(
    graph: &Graph,
    start_id: Option<&str>,
    stop_id: Option<&str>,
) -> Result<HashSet<String>, GraphError> {
    let start_closure = |start: &str| -> Result<HashSet<String>, GraphError> {
        let mut closure = HashSet::new();
        for reachable in graph.subgraph_from(start)? {
            closure.extend(graph.subgraph_up_to(&reachable)?);
        }
        Ok(closure)
    };

    match (start_id, stop_id) {
        (None, None) => Ok(graph.vertex_ids().into_iter().collect()),
        (None, Some(stop)) => graph.subgraph_up_to(stop),
        (Some(start), None) => start_closure(start),
        (Some(start), Some(stop)) => {
            if !graph.subgraph_from(start)?.contains(stop) {
                return Ok(HashSet::new());
            }
            let up_to_stop = graph.subgraph_up_to(stop)?;
            Ok(start_closure(start)?
                .intersection(&up_to_stop)
                .cloned()
                .collect())
        }
    }
}

fn kahn_waves(
    graph: &Graph,
    ids: &[String],
    scope: &HashSet<String>,
    start_id: Option<&str>,
    policy: &LayeringPolicy,
) -> Vec<Vec<String>> {
    let adjacency = graph.adjacency();
    let in_scope = |list: Option<&Vec<String>>| -> Vec<String> {
        list.into_iter()
            .flatten()
            .filter(|id| scope.contains(id.as_str()))
            .cloned()
            .collect()
    };

    let mut remaining: HashMap<String, usize> = ids
        .iter()
        .map(|id| (id.clone(), in_scope(adjacency.predecessors.get(id)).len()))
        .collect();

    let mut current: Vec<String> = ids
        .iter()
        .filter(|id| remaining[id.as_str()] == 0)
        .cloned()
        .collect();

    if current.is_empty() {
        let seed = start_id
            .filter(|s| scope.contains(*s))
            .map(str::to_string)
            .or_else(|| primary_input(graph, ids, policy))
            .unwrap_or_else(|| ids[0].clone());
        PrimaryInputSeeded { vertex_id: &seed }.log();
        remaining.insert(seed.clone(), 0);
        current.push(seed);
    }

    let cap = policy.max_cycle_appearances.max(1);
    let limit = |id: &str| if graph.is_cyclic(id) { cap } else { 1 };
    let mut appearances: HashMap<String, usize> = HashMap::new();
    let mut layers = Vec::new();

    while !current.is_empty() {
        for id in &current {
            *appearances.entry(id.clone()).or_default() += 1;
        }

        let mut next: Vec<String> = Vec::new();
        for id in &current {
            for succ in in_scope(adjacency.successors.get(id)) {
                let degree = remaining.entry(succ.clone()).or_default();
                *degree = degree.saturating_sub(1);
                let ready = *degree == 0;

                let seen = appearances.get(&succ).copied().unwrap_or(0);
                let eager = !ready
                    && seen == 0
                    && graph.is_cyclic(&succ)
                    && in_scope(adjacency.predecessors.get(&succ))
                        .iter()
                        .filter(|pred| !appearances.contains_key(pred.as_str()))
                        .all(|pred| graph.in_same_cycle(pred, &succ));

                if (ready || eager) && seen < limit(&succ) && !next.contains(&succ) {
                    next.push(succ);
                }
            }
        }

        layers.push(std::mem::take(&mut current));
        current = next;
    }

    layers
}

/// The input vertex preferred by the priority list, else the first input by id.
fn primary_input(graph: &Graph, candidates: &[String], policy: &LayeringPolicy) -> Option<String> {
    let inputs: Vec<(&String, String)> = candidates
        .iter()
        .filter_map(|id| graph.vertex(id).ok().map(|v| (id, v)))
        .filter(|(_, v)| v.is_input())
        .map(|(id, v)| (id, v.kind().to_lowercase()))
        .collect();

    policy
        .primary_input_priority
        .iter()
        .find_map(|needle| {
            inputs
                .iter()
                .find(|(_, kind)| kind.contains(needle.as_str()))
                .map(|(id, _)| (*id).clone())
        })
        .or_else(|| inputs.first().map(|(id, _)| (*id).clone()))
}

fn promote_primary_input(graph: &Graph, layers: &mut Vec<Vec<String>>, policy: &LayeringPolicy) {
    let Some(first) = layers.first() else {
        return;
    };
    if first.len() < 2 {
        return;
    }
    let Some(primary) = primary_input(graph, first, policy) else {
        return;
    };
    let rest: Vec<String> = first.iter().filter(|id| **id != primary).cloned().collect();
    layers[0] = vec![primary];
    layers.insert(1, rest);
}

/// Stable-sorts a layer so any vertex feeding another member of the same layer comes first.
fn order_producers_first(graph: &Graph, layer: &mut [String]) {
    layer.sort();
    let position: HashMap<&str, usize> = layer
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    let adjacency = graph.adjacency();
    let keys: HashMap<String, Option<usize>> = layer
        .iter()
        .map(|id| {
            let furthest_consumer = adjacency
                .successors
                .get(id)
                .into_iter()
                .flatten()
                .filter(|succ| *succ != id)
                .filter_map(|succ| position.get(succ.as_str()).copied())
                .max();
            (id.clone(), furthest_consumer)
        })
        .collect();
    layer.sort_by(|a, b| keys[b].cmp(&keys[a]));
}
