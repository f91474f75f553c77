// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The uniform "instantiate and execute" contract the build engine calls for every vertex.
//!
//! The engine never knows what a vertex actually does. It resolves the vertex's
//! parameters, asks the registered [`ComponentFactory`] for the vertex kind to
//! instantiate a [`Component`], executes it once and validates the [`ComponentOutput`].

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Parameter name -> resolved value (literal, or the result of an upstream vertex).
pub type ResolvedParams = HashMap<String, Value>;

/// What a component produced.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ComponentResult {
    /// A buffered value.
    Value(Value),
    /// A chunked stream; only valid for vertices that declare a streaming output.
    Stream(Vec<Value>),
    /// No value.
    #[default]
    Null,
    /// Placeholder meaning "nothing was built". Always rejected by the engine.
    Unbuilt,
}

impl ComponentResult {
    /// JSON view handed to downstream vertices and serialized into events.
    pub fn to_json(&self) -> Value {
        match self {
            ComponentResult::Value(value) => value.clone(),
            ComponentResult::Stream(chunks) => Value::Array(chunks.clone()),
            ComponentResult::Null | ComponentResult::Unbuilt => Value::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ComponentResult::Null)
            || matches!(self, ComponentResult::Value(Value::Null))
    }
}

/// Everything a component hands back from one execution.
#[derive(Debug, Clone, Default)]
pub struct ComponentOutput {
    pub result: ComponentResult,
    pub artifacts: Map<String, Value>,
    /// `Some` when the component made a routing decision: the listed vertices are
    /// conditionally excluded, replacing whatever this vertex excluded before.
    pub routing: Option<Vec<String>>,
    /// Vertices to set INACTIVE.
    pub deactivate: Vec<String>,
}

impl ComponentOutput {
    pub fn value(value: Value) -> Self {
        Self {
            result: ComponentResult::Value(value),
            ..Default::default()
        }
    }

    pub fn stream(chunks: Vec<Value>) -> Self {
        Self {
            result: ComponentResult::Stream(chunks),
            ..Default::default()
        }
    }

    pub fn with_artifact(mut self, key: &str, value: Value) -> Self {
        self.artifacts.insert(key.to_string(), value);
        self
    }

    pub fn with_routing(mut self, excluded: Vec<String>) -> Self {
        self.routing = Some(excluded);
        self
    }

    pub fn deactivating(mut self, vertex_ids: Vec<String>) -> Self {
        self.deactivate = vertex_ids;
        self
    }
}

/// One executable unit, instantiated per build with its parameters bound.
#[async_trait]
pub trait Component: Send + Sync {
    async fn execute(&self) -> anyhow::Result<ComponentOutput>;

    fn name(&self) -> &'static str;
}

/// Creates a component for a vertex kind from the vertex's resolved parameters.
pub trait ComponentFactory: Send + Sync {
    fn instantiate(&self, params: &ResolvedParams) -> anyhow::Result<Box<dyn Component>>;
}

impl<F> ComponentFactory for F
where
    F: Fn(&ResolvedParams) -> anyhow::Result<Box<dyn Component>> + Send + Sync,
{
    fn instantiate(&self, params: &ResolvedParams) -> anyhow::Result<Box<dyn Component>> {
        self(params)
    }
}
