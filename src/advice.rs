//! Advice: the behavior executed when a pointcut matches.
//!
//! Advice objects are owned by the caller and shared with the registry
//! through an `Arc`. Options given at registration time are pushed into
//! the advice through [`Advice::add_options`] before it is bound.
//!
//! ```ignore
//! let logging = FnAdvice::shared(|jp| {
//!     tracing::info!(kind = %jp.kind(), "entering");
//!     jp.proceed()
//! });
//! interceptor.add_around(Arc::new(Pointcut::new("Foo::bar()")), logging, AddOptions::default())?;
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::join_point::JoinPoint;

/// Free-form options attached to an advice.
pub type AdviceOptions = Map<String, Value>;

/// Options accepted by the `add_*` registration calls.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddOptions {
    /// Options merged into the advice before binding.
    pub advice: Option<AdviceOptions>,
}

impl AddOptions {
    pub fn with_advice_options(options: AdviceOptions) -> Self {
        Self {
            advice: Some(options),
        }
    }
}

/// Behavior invoked with the normalized join point.
///
/// The returned value is handed back to the engine; it only matters for
/// around advice, where it replaces the result of the intercepted code.
pub trait Advice: Send + Sync {
    fn invoke(&self, jp: &mut JoinPoint<'_>) -> Result<Value>;

    /// Merge registration options into this advice.
    fn add_options(&self, _options: &AdviceOptions) {}

    /// Options currently held by this advice.
    fn options(&self) -> AdviceOptions {
        AdviceOptions::new()
    }
}

/// Closure-backed advice that keeps the options it receives.
pub struct FnAdvice<F> {
    func: F,
    options: RwLock<AdviceOptions>,
}

impl<F> FnAdvice<F>
where
    F: Fn(&mut JoinPoint<'_>) -> Result<Value> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self {
            func,
            options: RwLock::new(AdviceOptions::new()),
        }
    }

    /// Wrap a closure directly into the shared form the interceptor takes.
    pub fn shared(func: F) -> Arc<dyn Advice>
    where
        F: 'static,
    {
        Arc::new(Self::new(func))
    }
}

impl<F> Advice for FnAdvice<F>
where
    F: Fn(&mut JoinPoint<'_>) -> Result<Value> + Send + Sync,
{
    fn invoke(&self, jp: &mut JoinPoint<'_>) -> Result<Value> {
        (self.func)(jp)
    }

    fn add_options(&self, options: &AdviceOptions) {
        let mut current = self.options.write();
        for (key, value) in options {
            current.insert(key.clone(), value.clone());
        }
    }

    fn options(&self) -> AdviceOptions {
        self.options.read().clone()
    }
}
