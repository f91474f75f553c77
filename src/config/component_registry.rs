// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::traits::ComponentFactory;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps a vertex kind to the factory that instantiates its component.
///
/// The build engine looks up `vertex.kind()` here for every build; a miss is a
/// per-vertex `BuildError::UnknownComponent`, not a run failure.
///
/// # Example
/// ```
/// use the_loopwood::config::ComponentRegistry;
/// use the_loopwood::backends::local::LocalComponentFactory;
///
/// let registry = LocalComponentFactory::registry();
/// assert!(registry.contains_key("change_text_case"));
/// assert!(!registry.contains_key("llm"));
/// ```
#[derive(Clone, Default)]
pub struct ComponentRegistry(pub HashMap<String, Arc<dyn ComponentFactory>>);

impl ComponentRegistry {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Register a factory for a kind, replacing any previous one.
    pub fn insert<F>(&mut self, kind: &str, factory: F)
    where
        F: ComponentFactory + 'static,
    {
        self.0.insert(kind.to_string(), Arc::new(factory));
    }

    /// Builder-style `insert`.
    pub fn with<F>(mut self, kind: &str, factory: F) -> Self
    where
        F: ComponentFactory + 'static,
    {
        self.insert(kind, factory);
        self
    }

    /// Adds every entry of `other`; entries in `other` win.
    pub fn merge(mut self, other: ComponentRegistry) -> Self {
        self.0.extend(other.0);
        self
    }

    pub fn get(&self, kind: &str) -> Option<&Arc<dyn ComponentFactory>> {
        self.0.get(kind)
    }

    pub fn contains_key(&self, kind: &str) -> bool {
        self.0.contains_key(kind)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&String> = self.0.keys().collect();
        kinds.sort();
        f.debug_struct("ComponentRegistry")
            .field("component_count", &self.0.len())
            .field("kinds", &kinds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::local::LocalComponentFactory;
    use crate::backends::stub::StubComponentFactory;
    use crate::traits::ResolvedParams;
    use serde_json::json;

    #[tokio::test]
    async fn closures_and_functions_register_as_factories() {
        let registry = ComponentRegistry::new()
            .with("echo", StubComponentFactory::stub)
            .with("failing", StubComponentFactory::failing);

        let mut params = ResolvedParams::new();
        params.insert("value".to_string(), json!("hi"));
        let component = registry.get("echo").unwrap().instantiate(&params).unwrap();
        let output = component.execute().await.unwrap();

        assert_eq!(output.result.to_json(), json!("hi"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn merge_prefers_the_incoming_registry() {
        let local = LocalComponentFactory::registry();
        let local_len = local.len();
        let merged = local.merge(StubComponentFactory::registry());

        assert!(merged.contains_key("text_input"));
        assert!(merged.contains_key("failing"));
        assert!(merged.len() > local_len);
        assert!(format!("{merged:?}").contains("component_count"));
    }
}
