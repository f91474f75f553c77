// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::traits::{Component, ComponentOutput, ResolvedParams};

/// Terminal vertex: passes its `text` input through and records it as a message artifact.
pub struct TextOutputComponent {
    text: String,
}

impl TextOutputComponent {
    pub fn from_params(params: &ResolvedParams) -> anyhow::Result<Self> {
        Ok(Self {
            text: super::text_param(params, "text")?,
        })
    }
}

#[async_trait]
impl Component for TextOutputComponent {
    async fn execute(&self) -> anyhow::Result<ComponentOutput> {
        Ok(ComponentOutput::value(Value::String(self.text.clone()))
            .with_artifact("message", json!({ "text": self.text, "type": "text" })))
    }

    fn name(&self) -> &'static str {
        "text_output"
    }
}
