// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod change_text_case;
pub mod conditional_router;
pub mod prefix_suffix_adder;
pub mod text_input;
pub mod text_output;
pub mod token_counter;

pub use change_text_case::*;
pub use conditional_router::*;
pub use prefix_suffix_adder::*;
pub use text_input::*;
pub use text_output::*;
pub use token_counter::*;

use anyhow::{anyhow, Context};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::traits::ResolvedParams;

/// Reads a param as text. Numbers and booleans are rendered, arrays of text
/// (several edges into one input) are joined with newlines.
pub(crate) fn text_param(params: &ResolvedParams, name: &str) -> anyhow::Result<String> {
    match params.get(name) {
        None | Some(Value::Null) => Err(anyhow!("missing text input '{}'", name)),
        Some(value) => Ok(render_text(value)),
    }
}

fn render_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(render_text).collect::<Vec<_>>().join("\n"),
        other => other.to_string(),
    }
}

/// Reads an optional typed param, falling back to `default` when absent.
pub(crate) fn param_or<T: DeserializeOwned>(params: &ResolvedParams, name: &str, default: T) -> anyhow::Result<T> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => serde_json::from_value(value.clone())
            .with_context(|| format!("invalid value for param '{}'", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_param_table_driven() {
        struct TestCase {
            name: &'static str,
            value: Option<Value>,
            expected: Option<&'static str>,
        }

        let test_cases = vec![
            TestCase { name: "string", value: Some(json!("hi")), expected: Some("hi") },
            TestCase { name: "number", value: Some(json!(42)), expected: Some("42") },
            TestCase { name: "joined array", value: Some(json!(["a", "b"])), expected: Some("a\nb") },
            TestCase { name: "null", value: Some(Value::Null), expected: None },
            TestCase { name: "absent", value: None, expected: None },
        ];

        for test_case in test_cases {
            let mut params = ResolvedParams::new();
            if let Some(value) = test_case.value {
                params.insert("text".into(), value);
            }
            let result = text_param(&params, "text").ok();
            assert_eq!(result.as_deref(), test_case.expected, "Test case '{}'", test_case.name);
        }
    }

    #[test]
    fn param_or_rejects_wrong_types() {
        let mut params = ResolvedParams::new();
        params.insert("limit".into(), json!("ten"));

        assert!(param_or::<u32>(&params, "limit", 1).is_err());
        assert_eq!(param_or::<u32>(&params, "other", 7).unwrap(), 7);
    }
}
