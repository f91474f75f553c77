// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Cycle detection via strongly connected components.
//!
//! Flows are allowed to contain cycles (loop vertices feed results back into earlier
//! vertices), so cycles are not a validation failure here. Instead the scheduler and
//! the build engine need to know *which* vertices participate in a cycle: those are
//! the vertices allowed to appear more than once in the layering and to rebuild
//! during a single run.
//!
//! # Algorithm: Tarjan's SCC (iterative)
//!
//! - **Time Complexity**: O(V + E)
//! - **Space Complexity**: O(V) for index/lowlink maps and the explicit call stack
//! - An explicit call stack replaces recursion so deep chains cannot overflow.
//!
//! A vertex is *cyclic* when its component has more than one member, or when it has
//! an edge to itself.

use std::collections::{HashMap, HashSet};

/// Returns every strongly connected component, each sorted by id.
///
/// Components come out in reverse topological order of the condensation graph
/// (a component is emitted after everything reachable from it).
pub fn strongly_connected_components(
    vertex_ids: &[String],
    successors: &HashMap<String, Vec<String>>,
) -> Vec<Vec<String>> {
    let mut tarjan = Tarjan::new(successors);
    for id in vertex_ids {
        if !tarjan.index.contains_key(id.as_str()) {
            tarjan.strong_connect(id);
        }
    }
    tarjan.components
}

/// Returns the ids of all vertices that participate in at least one cycle.
pub fn find_cyclic_vertices(
    vertex_ids: &[String],
    successors: &HashMap<String, Vec<String>>,
) -> HashSet<String> {
    let mut cyclic = HashSet::new();
    for component in strongly_connected_components(vertex_ids, successors) {
        if is_cycle(&component, successors) {
            cyclic.extend(component);
        }
    }
    cyclic
}

/// A component is a cycle when it has several members or its only member links to itself.
pub fn is_cycle(component: &[String], successors: &HashMap<String, Vec<String>>) -> bool {
    match component {
        [] => false,
        [only] => successors.get(only).is_some_and(|succ| succ.contains(only)),
        _ => true,
    }
}

struct Tarjan<'a> {
    successors: &'a HashMap<String, Vec<String>>,
    index: HashMap<&'a str, usize>,
    lowlink: HashMap<&'a str, usize>,
    on_stack: HashSet<&'a str>,
    stack: Vec<&'a str>,
    next_index: usize,
    components: Vec<Vec<String>>,
}

impl<'a> Tarjan<'a> {
    fn new(successors: &'a HashMap<String, Vec<String>>) -> Self {
        Self {
            successors,
            index: HashMap::new(),
            lowlink: HashMap::new(),
            on_stack: HashSet::new(),
            stack: Vec::new(),
            next_index: 0,
            components: Vec::new(),
        }
    }

    fn successors_of(&self, vertex: &str) -> &'a [String] {
        let successors: &'a HashMap<String, Vec<String>> = self.successors;
        successors.get(vertex).map(Vec::as_slice).unwrap_or(&[])
    }

    fn visit(&mut self, vertex: &'a str) {
        self.index.insert(vertex, self.next_index);
        self.lowlink.insert(vertex, self.next_index);
        self.next_index += 1;
        self.stack.push(vertex);
        self.on_stack.insert(vertex);
    }

    fn lower(&mut self, vertex: &'a str, candidate: usize) {
        if let Some(low) = self.lowlink.get_mut(vertex) {
            *low = (*low).min(candidate);
        }
    }

    fn strong_connect(&mut self, root: &'a str) {
        self.visit(root);
        // (vertex, position of the next successor to explore)
        let mut call_stack: Vec<(&'a str, usize)> = vec![(root, 0)];

        while let Some(frame) = call_stack.last_mut() {
            let (vertex, position) = *frame;
            let successors = self.successors_of(vertex);

            if position < successors.len() {
                frame.1 += 1;
                let next = successors[position].as_str();
                if !self.index.contains_key(next) {
                    self.visit(next);
                    call_stack.push((next, 0));
                } else if self.on_stack.contains(next) {
                    let next_index = self.index[next];
                    self.lower(vertex, next_index);
                }
                continue;
            }

            call_stack.pop();
            let vertex_low = self.lowlink[vertex];
            if let Some(&(parent, _)) = call_stack.last() {
                self.lower(parent, vertex_low);
            }

            if vertex_low == self.index[vertex] {
                let mut component = Vec::new();
                while let Some(member) = self.stack.pop() {
                    self.on_stack.remove(member);
                    component.push(member.to_string());
                    if member == vertex {
                        break;
                    }
                }
                component.sort();
                self.components.push(component);
            }
        }
    }
}
