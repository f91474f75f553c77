// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::traits::{Component, ComponentOutput, ResolvedParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOperator {
    #[default]
    Equals,
    Contains,
    StartsWith,
    EndsWith,
}

/// Compares its `text` input against `match_text` and routes the text to the
/// `true_result` or `false_result` output.
///
/// The vertices listed in `false_targets` (when the comparison holds) or
/// `true_targets` (when it does not) are conditionally excluded from the run. The
/// exclusion belongs to this vertex: only its next build replaces it.
pub struct ConditionalRouterComponent {
    text: String,
    match_text: String,
    operator: MatchOperator,
    case_sensitive: bool,
    true_targets: Vec<String>,
    false_targets: Vec<String>,
}

impl ConditionalRouterComponent {
    pub fn from_params(params: &ResolvedParams) -> anyhow::Result<Self> {
        Ok(Self {
            text: super::text_param(params, "text")?,
            match_text: super::param_or(params, "match_text", String::new())?,
            operator: super::param_or(params, "operator", MatchOperator::default())?,
            case_sensitive: super::param_or(params, "case_sensitive", false)?,
            true_targets: super::param_or(params, "true_targets", Vec::new())?,
            false_targets: super::param_or(params, "false_targets", Vec::new())?,
        })
    }

    fn matches(&self) -> bool {
        let (text, needle) = if self.case_sensitive {
            (self.text.clone(), self.match_text.clone())
        } else {
            (self.text.to_lowercase(), self.match_text.to_lowercase())
        };
        match self.operator {
            MatchOperator::Equals => text == needle,
            MatchOperator::Contains => text.contains(&needle),
            MatchOperator::StartsWith => text.starts_with(&needle),
            MatchOperator::EndsWith => text.ends_with(&needle),
        }
    }
}

#[async_trait]
impl Component for ConditionalRouterComponent {
    async fn execute(&self) -> anyhow::Result<ComponentOutput> {
        let matched = self.matches();
        let text = Value::String(self.text.clone());
        let (result, excluded) = if matched {
            (json!({ "true_result": text, "false_result": null }), &self.false_targets)
        } else {
            (json!({ "true_result": null, "false_result": text }), &self.true_targets)
        };
        Ok(ComponentOutput::value(result)
            .with_artifact("matched", Value::Bool(matched))
            .with_routing(excluded.clone()))
    }

    fn name(&self) -> &'static str {
        "conditional_router"
    }
}
