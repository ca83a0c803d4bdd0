//! Binder - enable/disable through indirection.
//!
//! Every binding gets one stable callback registered with the engine at
//! creation. That callback never changes; it forwards to the handler the
//! binding currently holds. Enabling or disabling a binding only swaps that
//! handler between the advice and a pass-through, so the engine's dispatch
//! table is never touched again.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::advice::Advice;
use crate::engine::EngineCallback;
use crate::error::{Result, WeaveError};
use crate::join_point::{JoinPoint, JoinPointAdapter, RawJoinPoint};
use crate::kind::KindResolver;
use crate::registry::{Binding, Index, WeavingRegistry};

/// Inner handler a binding's indirection forwards to.
#[derive(Clone)]
pub enum Handler {
    /// Invoke the advice and return its result.
    Advice(Arc<dyn Advice>),
    /// Do the least needed to keep the original call intact.
    PassThrough,
}

impl Handler {
    pub fn invoke(&self, jp: &mut JoinPoint<'_>) -> Result<Value> {
        match self {
            Handler::Advice(advice) => advice.invoke(jp),
            Handler::PassThrough => pass_through(jp),
        }
    }

    pub fn is_advice(&self) -> bool {
        matches!(self, Handler::Advice(_))
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handler::Advice(_) => f.write_str("Advice"),
            Handler::PassThrough => f.write_str("PassThrough"),
        }
    }
}

/// After method/function kinds read the return value, around
/// method/function kinds run the original code. Anything else is a no-op.
fn pass_through(jp: &mut JoinPoint<'_>) -> Result<Value> {
    let kind = jp.kind();
    let callable = kind.is_method() || kind.is_function();

    if callable && kind.is_after() {
        return Ok(jp.return_value().clone());
    }
    if callable && kind.is_around() {
        return jp.proceed();
    }
    Ok(Value::Null)
}

/// Point the binding's handler at its advice.
pub fn bind_advice(binding: &mut Binding) {
    binding.handler = Handler::Advice(Arc::clone(binding.advice()));
}

/// Point the binding's handler at the pass-through.
pub fn bind_pass_through(binding: &mut Binding) {
    binding.handler = Handler::PassThrough;
}

/// Builds indirection callbacks and dispatches engine events through them.
#[derive(Clone)]
pub struct BinderController {
    registry: Arc<RwLock<WeavingRegistry>>,
    resolver: KindResolver,
}

impl BinderController {
    pub fn new(registry: Arc<RwLock<WeavingRegistry>>, resolver: KindResolver) -> Self {
        Self { registry, resolver }
    }

    pub fn registry(&self) -> &Arc<RwLock<WeavingRegistry>> {
        &self.registry
    }

    pub fn resolver(&self) -> &KindResolver {
        &self.resolver
    }

    /// The callback to hand to the engine for the binding at `index`.
    ///
    /// The callback holds the registry weakly; once the registry is gone it
    /// reports the index as unknown.
    pub fn create_binder(&self, index: Index) -> EngineCallback {
        let registry = Arc::downgrade(&self.registry);
        let resolver = self.resolver;

        Arc::new(move |raw: &mut dyn RawJoinPoint| -> Result<Value> {
            let registry = Weak::upgrade(&registry).ok_or(WeaveError::UnknownIndex(index))?;
            BinderController::new(registry, resolver).dispatch(index, raw)
        })
    }

    /// Dispatch one raw event to the binding at `index`.
    ///
    /// Marks the binding as called, resolves the kind, wraps the event and
    /// invokes whichever handler is bound. The registry lock is released
    /// before the handler runs, so nested dispatches from `proceed()` are
    /// safe.
    pub fn dispatch(&self, index: Index, raw: &mut dyn RawJoinPoint) -> Result<Value> {
        let (handler, pointcut) = {
            let mut registry = self.registry.write();
            let binding = registry.get_mut(index)?;
            binding.mark_called();
            (binding.handler().clone(), Arc::clone(binding.pointcut()))
        };

        let kind = self.resolver.resolve(raw.kind_code())?;
        debug!(
            index = index,
            kind = %kind,
            handler = ?handler,
            "Dispatching join point"
        );

        let mut jp = JoinPoint::new(kind, index, pointcut, JoinPointAdapter::new(raw));
        handler.invoke(&mut jp)
    }
}
