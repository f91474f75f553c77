// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A declared input port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    /// Result types this input accepts from upstream outputs.
    #[serde(default)]
    pub input_types: Vec<String>,
}

/// A declared output port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
    /// Output may feed back into an earlier vertex; makes the vertex a loop vertex.
    #[serde(default)]
    pub allows_loop: bool,
}

/// Static description of one vertex, as handed over by the graph materializer.
///
/// # Example
/// ```
/// use the_loopwood::vertex::VertexSpec;
///
/// let spec = VertexSpec::new("ChatInput-a1b2c", "chat_input")
///     .output("message")
///     .param("value", serde_json::json!("hello"))
///     .as_input();
///
/// assert!(spec.is_input);
/// assert_eq!(spec.outputs[0].name, "message");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexSpec {
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub inputs: Vec<InputSpec>,
    #[serde(default)]
    pub outputs: Vec<OutputSpec>,
    /// Literal parameters. Inputs wired by an edge override these.
    #[serde(default)]
    pub params: HashMap<String, Value>,
    #[serde(default)]
    pub is_input: bool,
    #[serde(default)]
    pub is_output: bool,
    /// Config locked: once built, the result is reused.
    #[serde(default)]
    pub frozen: bool,
    /// The vertex streams its own output instead of producing a buffered result.
    #[serde(default)]
    pub streams_output: bool,
    /// A `Null` result is a build error for this vertex.
    #[serde(default)]
    pub requires_value: bool,
}

impl VertexSpec {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            display_name: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            params: HashMap::new(),
            is_input: false,
            is_output: false,
            frozen: false,
            streams_output: false,
            requires_value: false,
        }
    }

    /// Builds an id in the conventional `<kind>-<suffix>` form.
    pub fn generate_id(kind: &str) -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("{}-{}", kind, &suffix[..5])
    }

    pub fn input(mut self, name: &str, required: bool) -> Self {
        self.inputs.push(InputSpec {
            name: name.to_string(),
            required,
            input_types: Vec::new(),
        });
        self
    }

    pub fn output(mut self, name: &str) -> Self {
        self.outputs.push(OutputSpec {
            name: name.to_string(),
            types: Vec::new(),
            allows_loop: false,
        });
        self
    }

    pub fn loop_output(mut self, name: &str) -> Self {
        self.outputs.push(OutputSpec {
            name: name.to_string(),
            types: Vec::new(),
            allows_loop: true,
        });
        self
    }

    pub fn param(mut self, name: &str, value: Value) -> Self {
        self.params.insert(name.to_string(), value);
        self
    }

    pub fn as_input(mut self) -> Self {
        self.is_input = true;
        self
    }

    pub fn as_output(mut self) -> Self {
        self.is_output = true;
        self
    }

    pub fn frozen(mut self) -> Self {
        self.frozen = true;
        self
    }

    pub fn streaming(mut self) -> Self {
        self.streams_output = true;
        self
    }

    pub fn requiring_value(mut self) -> Self {
        self.requires_value = true;
        self
    }

    pub fn declares_output(&self, name: &str) -> bool {
        self.outputs.iter().any(|o| o.name == name)
    }

    pub fn declares_input(&self, name: &str) -> bool {
        self.inputs.iter().any(|i| i.name == name)
    }
}
