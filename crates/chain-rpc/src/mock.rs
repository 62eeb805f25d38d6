//! In-memory transport for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RpcError;
use crate::transport::RpcTransport;

#[derive(Debug)]
struct Rule {
    method: String,
    /// Substring the serialized params must contain, if any.
    needle: Option<String>,
    response: Result<Value, RpcError>,
    once: bool,
}

/// Answers requests from canned responses keyed by method name.
///
/// Rules with a params needle win over plain method rules; one-shot rules
/// are consumed in insertion order. Every request is recorded.
#[derive(Debug, Default)]
pub struct MockTransport {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer `method` with `result`.
    pub fn with(self, method: &str, result: Value) -> Self {
        self.add(method, None, Ok(result), false);
        self
    }

    /// Always fail `method` with `error`.
    pub fn with_error(self, method: &str, error: RpcError) -> Self {
        self.add(method, None, Err(error), false);
        self
    }

    /// Answer `method` with `result` when the params contain `needle`.
    pub fn with_matching(self, method: &str, needle: &str, result: Value) -> Self {
        self.add(method, Some(needle.to_lowercase()), Ok(result), false);
        self
    }

    /// Answer the next `method` call with `result`, then fall through.
    pub fn push(&self, method: &str, result: Value) {
        self.add(method, None, Ok(result), true);
    }

    fn add(&self, method: &str, needle: Option<String>, response: Result<Value, RpcError>, once: bool) {
        let mut rules = self.rules.lock().unwrap_or_else(|e| e.into_inner());
        rules.push(Rule {
            method: method.to_string(),
            needle,
            response,
            once,
        });
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls().iter().filter(|(m, _)| m == method).count()
    }

    /// Params of the first recorded call to `method`.
    pub fn params_of(&self, method: &str) -> Option<Value> {
        self.calls()
            .into_iter()
            .find(|(m, _)| m == method)
            .map(|(_, params)| params)
    }
}

#[async_trait]
impl RpcTransport for MockTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((method.to_string(), params.clone()));

        let haystack = params.to_string().to_lowercase();
        let mut rules = self.rules.lock().unwrap_or_else(|e| e.into_inner());

        let applies = |rule: &Rule| {
            rule.method == method
                && rule
                    .needle
                    .as_ref()
                    .map_or(true, |needle| haystack.contains(needle.as_str()))
        };
        let position = rules
            .iter()
            .position(|rule| rule.needle.is_some() && applies(rule))
            .or_else(|| rules.iter().position(|rule| rule.once && applies(rule)))
            .or_else(|| rules.iter().position(|rule| applies(rule)));

        match position {
            Some(index) if rules[index].once => rules.remove(index).response,
            Some(index) => rules[index].response.clone(),
            None => Err(RpcError::Transport(format!("no mock response for {method}"))),
        }
    }
}
