// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_DRAIN_TIMEOUT_MS, DEFAULT_FINISHED_JOB_TTL_SECS, DEFAULT_MAX_CYCLE_APPEARANCES,
    DEFAULT_PRIMARY_INPUT_PRIORITY,
};
use crate::engine::LayeringPolicy;
use crate::errors::ConfigError;
use crate::graph::Edge;
use crate::vertex::VertexSpec;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// A flow definition: engine tuning, vertices, edges and optional run hints.
///
/// # Example
/// ```yaml
/// start: null
/// stop: output-1
/// vertices:
///   - id: input-1
///     kind: text_input
///     is_input: true
///     outputs: [{ name: text }]
///     params: { value: "hello" }
///   - id: output-1
///     kind: text_output
///     is_output: true
///     inputs: [{ name: text, required: true }]
///     outputs: [{ name: text }]
/// edges:
///   - { source: input-1, output: text, target: output-1, input: text }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlowConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    /// Run only what this vertex can reach, plus what those need.
    #[serde(default)]
    pub start: Option<String>,
    /// Run only what is needed to produce this vertex.
    #[serde(default)]
    pub stop: Option<String>,
    #[serde(default)]
    pub vertices: Vec<VertexSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeConfig>,
}

/// Engine tuning. Every field has a default, so an empty section is valid.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub layering: LayeringConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayeringConfig {
    #[serde(default = "default_max_cycle_appearances")]
    pub max_cycle_appearances: usize,
    #[serde(default = "default_primary_input_priority")]
    pub primary_input_priority: Vec<String>,
}

impl Default for LayeringConfig {
    fn default() -> Self {
        Self {
            max_cycle_appearances: default_max_cycle_appearances(),
            primary_input_priority: default_primary_input_priority(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
    #[serde(default = "default_finished_job_ttl_secs")]
    pub finished_job_ttl_secs: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            drain_timeout_ms: default_drain_timeout_ms(),
            finished_job_ttl_secs: default_finished_job_ttl_secs(),
        }
    }
}

impl JobsConfig {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    pub fn finished_job_ttl(&self) -> Duration {
        Duration::from_secs(self.finished_job_ttl_secs)
    }
}

impl EngineConfig {
    pub fn layering_policy(&self) -> LayeringPolicy {
        LayeringPolicy {
            max_cycle_appearances: self.layering.max_cycle_appearances,
            primary_input_priority: self.layering.primary_input_priority.clone(),
        }
    }
}

fn default_max_cycle_appearances() -> usize {
    DEFAULT_MAX_CYCLE_APPEARANCES
}

fn default_primary_input_priority() -> Vec<String> {
    DEFAULT_PRIMARY_INPUT_PRIORITY
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_drain_timeout_ms() -> u64 {
    DEFAULT_DRAIN_TIMEOUT_MS
}

fn default_finished_job_ttl_secs() -> u64 {
    DEFAULT_FINISHED_JOB_TTL_SECS
}

/// `(source, output) -> (target, input)` as written in a flow file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EdgeConfig {
    pub source: String,
    pub output: String,
    pub target: String,
    pub input: String,
}

impl From<&EdgeConfig> for Edge {
    fn from(edge: &EdgeConfig) -> Self {
        Edge::new(&edge.source, &edge.output, &edge.target, &edge.input)
    }
}

/// Load a flow definition, choosing the format by file extension.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FlowConfig, ConfigError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let content = fs::read_to_string(path)?;
    match extension.as_str() {
        "yaml" | "yml" => Ok(serde_yaml::from_str(&content)?),
        "toml" => Ok(toml::from_str(&content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

/// Load a flow definition and reject it if it does not validate.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<FlowConfig, ConfigError> {
    let cfg = load_config(path)?;
    crate::config::validate_flow(&cfg).map_err(ConfigError::Validation)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    const FLOW_YAML: &str = r#"
engine:
  layering:
    max_cycle_appearances: 3
vertices:
  - id: input-1
    kind: text_input
    is_input: true
    outputs: [{ name: text }]
    params: { value: "hello" }
  - id: upper-1
    kind: change_text_case
    inputs: [{ name: text, required: true }]
    outputs: [{ name: text }]
    params: { case: upper }
edges:
  - { source: input-1, output: text, target: upper-1, input: text }
"#;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parse_flow_with_engine_defaults() {
        let cfg: FlowConfig = serde_yaml::from_str(FLOW_YAML).unwrap();

        assert_eq!(cfg.engine.layering.max_cycle_appearances, 3);
        assert_eq!(
            cfg.engine.layering.primary_input_priority,
            vec!["webhook", "chatinput", "chat_input"]
        );
        assert_eq!(cfg.engine.jobs.drain_timeout(), Duration::from_secs(1));
        assert_eq!(cfg.vertices.len(), 2);
        assert_eq!(Edge::from(&cfg.edges[0]).target_input, "text");
    }

    #[test]
    fn test_load_config_by_extension_table_driven() {
        struct TestCase {
            name: &'static str,
            suffix: &'static str,
            content: &'static str,
            expect_vertices: Option<usize>,
        }

        let toml_flow = r#"
stop = "b"

[[vertices]]
id = "a"
kind = "stub"
outputs = [{ name = "out" }]

[[vertices]]
id = "b"
kind = "stub"
inputs = [{ name = "in" }]

[[edges]]
source = "a"
output = "out"
target = "b"
input = "in"
"#;

        let test_cases = vec![
            TestCase {
                name: "yaml",
                suffix: ".yaml",
                content: FLOW_YAML,
                expect_vertices: Some(2),
            },
            TestCase {
                name: "yml",
                suffix: ".yml",
                content: FLOW_YAML,
                expect_vertices: Some(2),
            },
            TestCase {
                name: "toml",
                suffix: ".toml",
                content: toml_flow,
                expect_vertices: Some(2),
            },
            TestCase {
                name: "json is not supported",
                suffix: ".json",
                content: "{}",
                expect_vertices: None,
            },
        ];

        for test_case in test_cases {
            let file = write_temp(test_case.suffix, test_case.content);
            let result = load_config(file.path());
            match test_case.expect_vertices {
                Some(count) => {
                    let cfg = result.unwrap();
                    assert_eq!(cfg.vertices.len(), count, "Test case '{}'", test_case.name);
                }
                None => assert!(
                    matches!(result, Err(ConfigError::UnsupportedFormat(_))),
                    "Test case '{}'",
                    test_case.name
                ),
            }
        }
    }

    #[test]
    fn test_load_and_validate_rejects_dangling_edges() {
        let yaml = r#"
vertices:
  - id: a
    kind: stub
edges:
  - { source: a, output: out, target: ghost, input: in }
"#;
        let file = write_temp(".yaml", yaml);

        let err = load_and_validate_config(file.path()).unwrap_err();

        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = load_config("/definitely/not/here.yaml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
