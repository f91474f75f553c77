// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use crate::traits::{Component, ComponentOutput, ResolvedParams};

/// Wraps its `text` input in `prefix` and `suffix`, `[` and `]` when not configured.
pub struct PrefixSuffixAdderComponent {
    text: String,
    prefix: String,
    suffix: String,
}

impl PrefixSuffixAdderComponent {
    pub fn from_params(params: &ResolvedParams) -> anyhow::Result<Self> {
        Ok(Self {
            text: super::text_param(params, "text")?,
            prefix: super::param_or(params, "prefix", "[".to_string())?,
            suffix: super::param_or(params, "suffix", "]".to_string())?,
        })
    }
}

#[async_trait]
impl Component for PrefixSuffixAdderComponent {
    async fn execute(&self) -> anyhow::Result<ComponentOutput> {
        Ok(ComponentOutput::value(Value::String(format!(
            "{}{}{}",
            self.prefix, self.text, self.suffix
        ))))
    }

    fn name(&self) -> &'static str {
        "prefix_suffix_adder"
    }
}
