// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ComponentRegistry;
use crate::traits::{Component, ComponentFactory, ComponentOutput, ComponentResult, ResolvedParams};

/// Echoes its `value` param, or all of its params as an object.
pub struct StubComponent {
    params: ResolvedParams,
}

#[async_trait]
impl Component for StubComponent {
    async fn execute(&self) -> anyhow::Result<ComponentOutput> {
        let result = match self.params.get("value") {
            Some(value) => value.clone(),
            None => {
                let mut sorted: Vec<(&String, &Value)> = self.params.iter().collect();
                sorted.sort_by(|a, b| a.0.cmp(b.0));
                Value::Object(sorted.into_iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            }
        };
        Ok(ComponentOutput::value(result))
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Always fails, with its `message` param when given.
pub struct FailingComponent {
    message: String,
}

#[async_trait]
impl Component for FailingComponent {
    async fn execute(&self) -> anyhow::Result<ComponentOutput> {
        Err(anyhow::anyhow!(self.message.clone()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Returns a fixed result without doing any work.
pub struct FixedComponent {
    result: ComponentResult,
}

#[async_trait]
impl Component for FixedComponent {
    async fn execute(&self) -> anyhow::Result<ComponentOutput> {
        Ok(ComponentOutput {
            result: self.result.clone(),
            ..Default::default()
        })
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Counts its executions after an optional delay; the result is the running count.
pub struct CountingComponent {
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

#[async_trait]
impl Component for CountingComponent {
    async fn execute(&self) -> anyhow::Result<ComponentOutput> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let count = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ComponentOutput::value(json!(count)))
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

/// Factories for the test catalog.
pub struct StubComponentFactory;

impl StubComponentFactory {
    pub fn stub(params: &ResolvedParams) -> anyhow::Result<Box<dyn Component>> {
        Ok(Box::new(StubComponent {
            params: params.clone(),
        }))
    }

    pub fn failing(params: &ResolvedParams) -> anyhow::Result<Box<dyn Component>> {
        let message = params
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Simulated component failure")
            .to_string();
        Ok(Box::new(FailingComponent { message }))
    }

    pub fn unbuilt(_: &ResolvedParams) -> anyhow::Result<Box<dyn Component>> {
        Ok(Box::new(FixedComponent {
            result: ComponentResult::Unbuilt,
        }))
    }

    pub fn null(_: &ResolvedParams) -> anyhow::Result<Box<dyn Component>> {
        Ok(Box::new(FixedComponent {
            result: ComponentResult::Null,
        }))
    }

    pub fn stream(_: &ResolvedParams) -> anyhow::Result<Box<dyn Component>> {
        Ok(Box::new(FixedComponent {
            result: ComponentResult::Stream(vec![json!("chunk-1"), json!("chunk-2")]),
        }))
    }

    /// Shares `calls` across every instance it creates.
    pub fn counting(calls: Arc<AtomicUsize>, delay: Duration) -> impl ComponentFactory {
        move |_: &ResolvedParams| -> anyhow::Result<Box<dyn Component>> {
            Ok(Box::new(CountingComponent {
                calls: Arc::clone(&calls),
                delay,
            }))
        }
    }

    /// `stub`, `failing`, `unbuilt`, `null` and `stream`.
    pub fn registry() -> ComponentRegistry {
        ComponentRegistry::new()
            .with("stub", Self::stub)
            .with("failing", Self::failing)
            .with("unbuilt", Self::unbuilt)
            .with("null", Self::null)
            .with("stream", Self::stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[tokio::test]
    async fn stub_echoes_params_without_value() {
        let mut params = ResolvedParams::new();
        params.insert("b".into(), json!(2));
        params.insert("a".into(), json!(1));

        let output = StubComponentFactory::stub(&params).unwrap().execute().await.unwrap();

        let expected: Map<String, Value> = [("a".to_string(), json!(1)), ("b".to_string(), json!(2))]
            .into_iter()
            .collect();
        assert_eq!(output.result, ComponentResult::Value(Value::Object(expected)));
    }

    #[tokio::test]
    async fn counting_instances_share_the_counter() {
        let calls = Arc::new(AtomicUsize::new(0));
        let factory = StubComponentFactory::counting(Arc::clone(&calls), Duration::ZERO);

        for _ in 0..3 {
            factory.instantiate(&ResolvedParams::new()).unwrap().execute().await.unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
