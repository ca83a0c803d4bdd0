//! Error types for weaving operations.

use serde_json::Value;

use crate::registry::Index;

/// Result type for weaving operations.
pub type Result<T> = std::result::Result<T, WeaveError>;

/// Errors surfaced by the interceptor, registry and binder.
///
/// None of these are recovered internally. Failures raised by advice or by
/// the intercepted code travel through [`WeaveError::Raised`] untouched.
#[derive(Debug, thiserror::Error)]
pub enum WeaveError {
    #[error("The join point passed to the interceptor must be an instance of \"{expected}\"")]
    Construction { expected: &'static str },

    #[error("The kind ({0}) is invalid.")]
    Kind(u32),

    #[error("The instance of the pointcut must contain the selector.")]
    Pointcut,

    #[error("No binding registered at index {0}")]
    UnknownIndex(Index),

    #[error(transparent)]
    Raised(Box<dyn std::error::Error + Send + Sync>),
}

impl WeaveError {
    /// Wrap an error raised by advice or by the original code.
    pub fn raised<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Raised(Box::new(err))
    }

    /// Returns the raised error if it is a [`Thrown`] exception.
    pub fn as_thrown(&self) -> Option<&Thrown> {
        match self {
            Self::Raised(err) => err.downcast_ref::<Thrown>(),
            _ => None,
        }
    }
}

/// An exception thrown by intercepted code, as reported by the engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{class_name}: {message}")]
pub struct Thrown {
    pub class_name: String,
    pub message: String,
    /// Extra payload attached by the engine (code, trace, ...).
    pub payload: Value,
}

impl Thrown {
    pub fn new(class_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            message: message.into(),
            payload: Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}
