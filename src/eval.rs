//! Script evaluation capability
//!
//! The client library occasionally needs to run small pieces of downloaded
//! script (signature and throttling transforms). How that happens is up to
//! the host: a sandboxed interpreter, an embedded engine, or nothing at all.

use crate::error::{HostkitError, HostkitResult};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Named values made available to evaluated code
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalEnv {
    vars: Map<String, Value>,
}

impl EvalEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding, replacing any previous one with the same name
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn vars(&self) -> &Map<String, Value> {
        &self.vars
    }
}

/// Evaluates code against an environment and returns its result
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, code: &str, env: &EvalEnv) -> HostkitResult<Value>;
}

/// Evaluator for runtimes that cannot run scripts; always fails
#[derive(Debug, Clone)]
pub struct DisabledEvaluator {
    runtime: String,
}

impl DisabledEvaluator {
    pub fn new(runtime: impl Into<String>) -> Self {
        Self {
            runtime: runtime.into(),
        }
    }
}

#[async_trait]
impl Evaluator for DisabledEvaluator {
    async fn evaluate(&self, _code: &str, _env: &EvalEnv) -> HostkitResult<Value> {
        Err(HostkitError::EvaluationUnsupported {
            runtime: self.runtime.clone(),
        })
    }
}

/// Adapts a synchronous closure into an [`Evaluator`]
pub struct FnEvaluator<F> {
    func: F,
}

impl<F> FnEvaluator<F>
where
    F: Fn(&str, &EvalEnv) -> HostkitResult<Value> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> Evaluator for FnEvaluator<F>
where
    F: Fn(&str, &EvalEnv) -> HostkitResult<Value> + Send + Sync,
{
    async fn evaluate(&self, code: &str, env: &EvalEnv) -> HostkitResult<Value> {
        (self.func)(code, env)
    }
}
