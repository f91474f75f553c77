// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::components::*;
use crate::config::ComponentRegistry;
use crate::traits::{Component, ResolvedParams};

/// Factory for the local (in-process) component catalog.
pub struct LocalComponentFactory;

impl LocalComponentFactory {
    /// Create a component for a vertex kind from its resolved params.
    ///
    /// Known kinds:
    /// - "text_input" -> TextInputComponent
    /// - "change_text_case" -> ChangeTextCaseComponent (`case`: upper, lower, proper, title)
    /// - "prefix_suffix_adder" -> PrefixSuffixAdderComponent
    /// - "token_counter" -> TokenCounterComponent
    /// - "text_output" -> TextOutputComponent
    /// - "conditional_router" -> ConditionalRouterComponent
    pub fn create_component(kind: &str, params: &ResolvedParams) -> anyhow::Result<Box<dyn Component>> {
        let component: Box<dyn Component> = match kind {
            "text_input" => Box::new(TextInputComponent::from_params(params)?),
            "change_text_case" => Box::new(ChangeTextCaseComponent::from_params(params)?),
            "prefix_suffix_adder" => Box::new(PrefixSuffixAdderComponent::from_params(params)?),
            "token_counter" => Box::new(TokenCounterComponent::from_params(params)?),
            "text_output" => Box::new(TextOutputComponent::from_params(params)?),
            "conditional_router" => Box::new(ConditionalRouterComponent::from_params(params)?),
            _ => anyhow::bail!("Unknown local component kind: '{}'", kind),
        };
        Ok(component)
    }

    /// List all available local component kinds
    pub fn list_available_kinds() -> Vec<&'static str> {
        vec![
            "text_input",
            "change_text_case",
            "prefix_suffix_adder",
            "token_counter",
            "text_output",
            "conditional_router",
        ]
    }

    /// A registry holding every local kind.
    pub fn registry() -> ComponentRegistry {
        let mut registry = ComponentRegistry::new();
        for kind in Self::list_available_kinds() {
            registry.insert(kind, move |params: &ResolvedParams| -> anyhow::Result<Box<dyn Component>> {
                Self::create_component(kind, params)
            });
        }
        registry
    }
}
