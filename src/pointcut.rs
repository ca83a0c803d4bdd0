//! Pointcut value object.

/// Selects the methods, functions or properties an aspect applies to.
///
/// The selector syntax belongs to the engine and is passed through as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pointcut {
    selector: String,
}

impl Pointcut {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// True when no selector is set. Such a pointcut cannot be registered.
    pub fn is_empty(&self) -> bool {
        self.selector.is_empty()
    }
}

impl From<&str> for Pointcut {
    fn from(selector: &str) -> Self {
        Self::new(selector)
    }
}

impl From<String> for Pointcut {
    fn from(selector: String) -> Self {
        Self::new(selector)
    }
}
