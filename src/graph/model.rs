// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use parking_lot::{Mutex, MutexGuard};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::{Arc, OnceLock};

use super::cycles::{is_cycle, strongly_connected_components};
use super::{Adjacency, Edge, RunState};
use crate::config::ComponentRegistry;
use crate::errors::GraphError;
use crate::vertex::{Vertex, VertexSpec, VertexState};

/// The owning aggregate of a flow: vertices, edges and the derived adjacency.
///
/// Adjacency and the cyclic-vertex set are computed lazily on first use and kept
/// as fields of this instance. Adding an edge refreshes only its two endpoints.
/// Structural mutation takes `&mut self`, so it cannot race an in-flight build that
/// holds the graph through an `Arc`.
pub struct Graph {
    vertices: HashMap<String, Arc<Vertex>>,
    edges: Vec<Edge>,
    adjacency: OnceLock<Adjacency>,
    cycles: OnceLock<CycleIndex>,
    registry: Arc<ComponentRegistry>,
    run: Mutex<RunState>,
}

impl Graph {
    pub fn new(registry: Arc<ComponentRegistry>) -> Self {
        Self {
            vertices: HashMap::new(),
            edges: Vec::new(),
            adjacency: OnceLock::new(),
            cycles: OnceLock::new(),
            registry,
            run: Mutex::new(RunState::default()),
        }
    }

    pub fn add_vertex(&mut self, spec: VertexSpec) -> Result<(), GraphError> {
        if self.vertices.contains_key(&spec.id) {
            return Err(GraphError::DuplicateVertex(spec.id));
        }
        if let Some(adjacency) = self.adjacency.get_mut() {
            adjacency.insert_vertex(&spec.id);
        }
        self.cycles = OnceLock::new();
        self.vertices
            .insert(spec.id.clone(), Arc::new(Vertex::new(spec)));
        Ok(())
    }

    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        for endpoint in [&edge.source_id, &edge.target_id] {
            if !self.vertices.contains_key(endpoint) {
                return Err(GraphError::DanglingEdge {
                    source_id: edge.source_id.clone(),
                    target_id: edge.target_id.clone(),
                    missing: endpoint.clone(),
                });
            }
        }
        let (source, target) = (edge.source_id.clone(), edge.target_id.clone());
        self.edges.push(edge);
        if let Some(adjacency) = self.adjacency.get_mut() {
            adjacency.refresh(&self.edges, &[&source, &target]);
        }
        self.cycles = OnceLock::new();
        Ok(())
    }

    pub fn vertex(&self, vertex_id: &str) -> Result<&Arc<Vertex>, GraphError> {
        self.vertices
            .get(vertex_id)
            .ok_or_else(|| GraphError::VertexNotFound(vertex_id.to_string()))
    }

    pub fn contains(&self, vertex_id: &str) -> bool {
        self.vertices.contains_key(vertex_id)
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Arc<Vertex>> {
        self.vertices.values()
    }

    /// All vertex ids, sorted.
    pub fn vertex_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.vertices.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn incoming_edges<'a>(&'a self, vertex_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.target_id == vertex_id)
    }

    pub fn adjacency(&self) -> &Adjacency {
        self.adjacency
            .get_or_init(|| Adjacency::build(self.vertices.keys(), &self.edges))
    }

    pub fn predecessors(&self, vertex_id: &str) -> Result<&[String], GraphError> {
        self.vertex(vertex_id)?;
        Ok(self
            .adjacency()
            .predecessors
            .get(vertex_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }

    pub fn successors(&self, vertex_id: &str) -> Result<&[String], GraphError> {
        self.vertex(vertex_id)?;
        Ok(self
            .adjacency()
            .successors
            .get(vertex_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }

    pub fn in_degree(&self, vertex_id: &str) -> Result<usize, GraphError> {
        self.vertex(vertex_id)?;
        Ok(self.adjacency().in_degree.get(vertex_id).copied().unwrap_or(0))
    }

    fn cycles(&self) -> &CycleIndex {
        self.cycles
            .get_or_init(|| CycleIndex::build(&self.vertex_ids(), &self.adjacency().successors))
    }

    /// Vertices that participate in at least one cycle.
    pub fn cyclic_vertices(&self) -> &HashSet<String> {
        &self.cycles().members
    }

    pub fn is_cyclic(&self, vertex_id: &str) -> bool {
        self.cycles().members.contains(vertex_id)
    }

    /// Both vertices belong to the same cycle.
    pub fn in_same_cycle(&self, a: &str, b: &str) -> bool {
        let index = self.cycles();
        match (index.component.get(a), index.component.get(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Everything `vertex_id` transitively depends on, inclusive.
    pub fn subgraph_up_to(&self, vertex_id: &str) -> Result<HashSet<String>, GraphError> {
        self.vertex(vertex_id)?;
        Ok(self.walk(vertex_id, &self.adjacency().predecessors))
    }

    /// Everything reachable from `vertex_id`, inclusive.
    pub fn subgraph_from(&self, vertex_id: &str) -> Result<HashSet<String>, GraphError> {
        self.vertex(vertex_id)?;
        Ok(self.walk(vertex_id, &self.adjacency().successors))
    }

    fn walk(&self, from: &str, links: &HashMap<String, Vec<String>>) -> HashSet<String> {
        let mut seen = HashSet::from([from.to_string()]);
        let mut queue = VecDeque::from([from.to_string()]);
        while let Some(current) = queue.pop_front() {
            for next in links.get(&current).into_iter().flatten() {
                if seen.insert(next.clone()) {
                    queue.push_back(next.clone());
                }
            }
        }
        seen
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    pub(crate) fn run_state(&self) -> MutexGuard<'_, RunState> {
        self.run.lock()
    }

    pub fn run_id(&self) -> Option<String> {
        self.run.lock().run_id.clone()
    }

    pub fn session_id(&self) -> Option<String> {
        self.run.lock().session_id.clone()
    }

    /// Attaches fresh run/session identifiers and the set of vertices this pass may build.
    pub fn stamp_run(
        &self,
        run_id: String,
        session_id: Option<String>,
        vertices_to_run: HashSet<String>,
        stop_vertex: Option<String>,
    ) {
        self.run
            .lock()
            .begin(run_id, session_id, vertices_to_run, stop_vertex);
    }

    /// Changes a vertex's state and keeps the inactivated set in sync.
    ///
    /// Only vertices with at most one incoming dependency are recorded as inactivated:
    /// another still-active predecessor could re-activate the rest.
    pub fn set_vertex_state(&self, vertex_id: &str, state: VertexState) -> Result<(), GraphError> {
        let vertex = self.vertex(vertex_id)?;
        let in_degree = self.in_degree(vertex_id)?;
        vertex.set_state(state);
        let mut run = self.run.lock();
        match state {
            VertexState::Inactive if in_degree <= 1 => run.mark_inactivated(vertex_id),
            VertexState::Active => run.unmark_inactivated(vertex_id),
            _ => {}
        }
        Ok(())
    }

    /// Clears the inactivated set, re-activating its members, and reports who was in it.
    pub fn reset_inactivated(&self) -> Vec<String> {
        let ids = self.run.lock().take_inactivated();
        for id in &ids {
            if let Some(vertex) = self.vertices.get(id) {
                vertex.set_state(VertexState::Active);
            }
        }
        ids
    }

    pub fn excluded_vertices(&self) -> Vec<String> {
        self.run.lock().excluded_vertices()
    }

    /// Successors of a finished vertex whose other dependencies are now satisfied.
    ///
    /// When the run's stop vertex is among them it is returned alone.
    pub fn next_runnable(&self, finished_id: &str) -> Result<Vec<String>, GraphError> {
        let successors = self.successors(finished_id)?;
        let run = self.run.lock();
        let mut next: Vec<String> = successors
            .iter()
            .filter(|id| self.is_schedulable(&run, id))
            .filter(|id| {
                self.adjacency()
                    .predecessors
                    .get(id.as_str())
                    .into_iter()
                    .flatten()
                    .all(|pred| pred == finished_id || self.is_satisfied(&run, pred, id))
            })
            .cloned()
            .collect();
        next.sort();

        if let Some(stop) = &run.stop_vertex {
            if next.contains(stop) {
                return Ok(vec![stop.clone()]);
            }
        }
        Ok(next)
    }

    /// Vertices of the run that never started but whose dependencies are all satisfied.
    ///
    /// Picks up work the cascade could not reach, e.g. a second entry point whose
    /// successor also waits on an input vertex outside every cascade path.
    pub fn pending_runnable(&self, order: &[String]) -> Vec<String> {
        let run = self.run.lock();
        order
            .iter()
            .filter(|id| run.vertices_to_run.contains(id.as_str()))
            .filter(|id| run.build_count(id) == 0 && !run.is_being_run(id))
            .filter(|id| !run.was_deactivated(id))
            .filter(|id| self.is_schedulable(&run, id))
            .filter(|id| self.vertices.get(id.as_str()).is_some_and(|v| !v.is_built()))
            .filter(|id| {
                self.adjacency()
                    .predecessors
                    .get(id.as_str())
                    .into_iter()
                    .flatten()
                    .all(|pred| self.is_satisfied(&run, pred, id))
            })
            .cloned()
            .collect()
    }

    fn is_schedulable(&self, run: &RunState, vertex_id: &str) -> bool {
        run.vertices_to_run.contains(vertex_id)
            && !run.is_excluded(vertex_id)
            && self
                .vertices
                .get(vertex_id)
                .is_some_and(|v| v.state() != VertexState::Inactive)
    }

    fn is_satisfied(&self, run: &RunState, predecessor: &str, candidate: &str) -> bool {
        if run.is_excluded(predecessor) || !run.vertices_to_run.contains(predecessor) {
            return true;
        }
        if self.in_same_cycle(predecessor, candidate) {
            return true;
        }
        match self.vertices.get(predecessor) {
            // a built vertex still in flight has not reported yet
            Some(vertex) => {
                vertex.state() == VertexState::Inactive
                    || (vertex.is_built() && !run.is_being_run(predecessor))
            }
            None => true,
        }
    }

    /// A structurally identical graph with pristine vertex state, for an independent run.
    pub fn fork(&self) -> Graph {
        let vertices = self
            .vertices
            .iter()
            .map(|(id, vertex)| (id.clone(), Arc::new(vertex.fresh_copy())))
            .collect();
        Graph {
            vertices,
            edges: self.edges.clone(),
            adjacency: self.adjacency.clone(),
            cycles: self.cycles.clone(),
            registry: Arc::clone(&self.registry),
            run: Mutex::new(RunState::default()),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct CycleIndex {
    members: HashSet<String>,
    // cyclic vertex -> index of its strongly connected component
    component: HashMap<String, usize>,
}

impl CycleIndex {
    fn build(vertex_ids: &[String], successors: &HashMap<String, Vec<String>>) -> Self {
        let mut index = CycleIndex::default();
        for (i, scc) in strongly_connected_components(vertex_ids, successors)
            .into_iter()
            .enumerate()
        {
            if is_cycle(&scc, successors) {
                for id in scc {
                    index.component.insert(id.clone(), i);
                    index.members.insert(id);
                }
            }
        }
        index
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("vertices", &self.vertex_ids())
            .field("edges", &self.edges.len())
            .field("run_id", &self.run.lock().run_id)
            .finish()
    }
}
