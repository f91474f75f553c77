// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::traits::{Component, ComponentOutput, ResolvedParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextCase {
    #[default]
    Upper,
    Lower,
    Proper,
    Title,
}

const TITLE_SMALL_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

/// Converts its `text` input to the case named by the `case` param.
pub struct ChangeTextCaseComponent {
    text: String,
    case: TextCase,
}

impl ChangeTextCaseComponent {
    pub fn from_params(params: &ResolvedParams) -> anyhow::Result<Self> {
        Ok(Self {
            text: super::text_param(params, "text")?,
            case: super::param_or(params, "case", TextCase::default())?,
        })
    }

    pub fn convert(text: &str, case: TextCase) -> String {
        match case {
            TextCase::Upper => text.to_uppercase(),
            TextCase::Lower => text.to_lowercase(),
            TextCase::Proper => text
                .split_whitespace()
                .map(capitalize)
                .collect::<Vec<_>>()
                .join(" "),
            TextCase::Title => text
                .split_whitespace()
                .enumerate()
                .map(|(i, word)| {
                    let lower = word.to_lowercase();
                    if i > 0 && TITLE_SMALL_WORDS.contains(&lower.as_str()) {
                        lower
                    } else {
                        capitalize(word)
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
    }
}

#[async_trait]
impl Component for ChangeTextCaseComponent {
    async fn execute(&self) -> anyhow::Result<ComponentOutput> {
        let converted = Self::convert(&self.text, self.case);
        Ok(ComponentOutput::value(Value::String(converted))
            .with_artifact("transform_type", json!(self.case)))
    }

    fn name(&self) -> &'static str {
        "change_text_case"
    }
}
