// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Serialize;

use crate::traits::{Component, ComponentOutput, ResolvedParams};

pub struct TokenCounterComponent {
    text: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TokenCount {
    pub char_count: usize,
    pub word_count: usize,
    pub line_count: usize,
}

impl TokenCounterComponent {
    pub fn from_params(params: &ResolvedParams) -> anyhow::Result<Self> {
        Ok(Self {
            text: super::text_param(params, "text")?,
        })
    }

    pub fn count(text: &str) -> TokenCount {
        TokenCount {
            char_count: text.chars().count(),
            word_count: text.split_whitespace().count(),
            // at least one line, even for empty input
            line_count: text.lines().count().max(1),
        }
    }
}

#[async_trait]
impl Component for TokenCounterComponent {
    async fn execute(&self) -> anyhow::Result<ComponentOutput> {
        let counts = serde_json::to_value(Self::count(&self.text))?;
        Ok(ComponentOutput::value(counts))
    }

    fn name(&self) -> &'static str {
        "token_counter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_chars_words_and_lines() {
        assert_eq!(
            TokenCounterComponent::count("héllo wide\nworld"),
            TokenCount {
                char_count: 16,
                word_count: 3,
                line_count: 2
            }
        );
        assert_eq!(TokenCounterComponent::count("").line_count, 1);
    }
}
