//! Compile-time handler registry: tool name → strongly typed handler.
//!
//! Completeness against the catalog is checked once at startup with
//! [`HandlerRegistry::validate_completeness`].

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use neuro_types::BackendResult;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Number, Value};
use thiserror::Error;

use super::catalog::ToolCatalog;
use crate::backend::{BackendError, BackendFacade};

/// Startup wiring errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A catalog tool has no handler.
    #[error("tool `{0}` has no registered handler")]
    MissingHandler(String),
    /// A handler is bound to a name the catalog does not define.
    #[error("handler `{0}` does not match any tool definition")]
    OrphanHandler(String),
    /// Two definitions share a name.
    #[error("duplicate tool definition `{0}`")]
    DuplicateTool(String),
    /// A definition failed validation.
    #[error("{0}")]
    InvalidDefinition(String),
}

/// Errors raised by a handler. The dispatcher turns them into failure records.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Parameters did not decode into the handler's typed shape.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    /// The backend call failed at the transport level.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// One executable tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool with verified parameters (a JSON object).
    async fn invoke(&self, parameters: Value) -> Result<BackendResult, ToolError>;
}

/// Decode verified parameters into `P`. Whole-number floats (`4.0`) decode as integers.
pub fn decode_params<P: DeserializeOwned>(parameters: Value) -> Result<P, ToolError> {
    serde_json::from_value(normalize_numbers(parameters))
        .map_err(|error| ToolError::InvalidParameters(error.to_string()))
}

fn normalize_numbers(value: Value) -> Value {
    match value {
        Value::Number(number) => match number.as_f64() {
            Some(float)
                if !number.is_i64()
                    && !number.is_u64()
                    && float.fract() == 0.0
                    && float.abs() < 9.0e15 =>
            {
                #[allow(clippy::cast_possible_truncation)]
                let whole = float as i64;
                Value::Number(Number::from(whole))
            }
            _ => Value::Number(number),
        },
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, normalize_numbers(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_numbers).collect()),
        other => other,
    }
}

/// Handler that decodes parameters into `P`, then forwards them to a backend operation.
pub struct TypedHandler<P> {
    operation: String,
    backend: Arc<dyn BackendFacade>,
    _params: PhantomData<fn() -> P>,
}

impl<P> TypedHandler<P> {
    pub fn new(operation: &str, backend: Arc<dyn BackendFacade>) -> Self {
        Self {
            operation: operation.to_string(),
            backend,
            _params: PhantomData,
        }
    }
}

#[async_trait]
impl<P> ToolHandler for TypedHandler<P>
where
    P: DeserializeOwned + Serialize + Send + Sync + 'static,
{
    async fn invoke(&self, parameters: Value) -> Result<BackendResult, ToolError> {
        let typed: P = decode_params(parameters)?;
        let body = serde_json::to_value(&typed)
            .map_err(|error| ToolError::InvalidParameters(error.to_string()))?;
        Ok(self.backend.call(&self.operation, body).await?)
    }
}

/// Tool name → handler.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Arc<dyn ToolHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to `name`, replacing any previous binding.
    pub fn register(&mut self, name: &str, handler: Arc<dyn ToolHandler>) {
        self.handlers.insert(name.to_string(), handler);
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, name: &str, handler: Arc<dyn ToolHandler>) -> Self {
        self.register(name, handler);
        self
    }

    /// Handler for `name`.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Bound names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Every catalog tool has a handler and every handler has a tool.
    pub fn validate_completeness(&self, catalog: &ToolCatalog) -> Result<(), RegistryError> {
        if let Some(missing) = catalog
            .names()
            .into_iter()
            .find(|name| !self.handlers.contains_key(*name))
        {
            return Err(RegistryError::MissingHandler(missing.to_string()));
        }
        if let Some(orphan) = self
            .handlers
            .keys()
            .find(|name| catalog.get(name).is_none())
        {
            return Err(RegistryError::OrphanHandler(orphan.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Counts {
        epochs: u32,
        rate: f64,
    }

    #[test]
    fn whole_floats_decode_into_integer_fields() {
        let counts: Counts = decode_params(json!({"epochs": 20.0, "rate": 0.5})).unwrap();
        assert_eq!(counts.epochs, 20);
        assert!((counts.rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn wrong_shape_is_invalid_parameters() {
        let result: Result<Counts, _> = decode_params(json!({"epochs": "many", "rate": 1}));
        assert!(matches!(result, Err(ToolError::InvalidParameters(_))));
    }
}
