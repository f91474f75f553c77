// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use crate::traits::{Component, ComponentOutput, ResolvedParams};

/// Entry point of a flow: publishes its configured `value` as text.
pub struct TextInputComponent {
    value: String,
}

impl TextInputComponent {
    pub fn from_params(params: &ResolvedParams) -> anyhow::Result<Self> {
        Ok(Self {
            value: super::param_or(params, "value", String::new())?,
        })
    }
}

#[async_trait]
impl Component for TextInputComponent {
    async fn execute(&self) -> anyhow::Result<ComponentOutput> {
        Ok(ComponentOutput::value(Value::String(self.value.clone())))
    }

    fn name(&self) -> &'static str {
        "text_input"
    }
}
