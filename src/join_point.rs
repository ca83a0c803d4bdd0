//! Join points.
//!
//! The engine hands each interception to the interceptor as a raw event
//! implementing [`RawJoinPoint`]. [`JoinPointAdapter`] wraps one raw event
//! and exposes it through normalized accessors; [`JoinPoint`] adds the
//! resolved [`Kind`] and the binding's [`Pointcut`] and is what advice
//! receives.
//!
//! Accessors delegate to the raw event without transforming values. The
//! return value is exposed by mutable reference so advice can read and
//! overwrite what the original caller will receive.

use std::any::Any;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Result, Thrown, WeaveError};
use crate::kind::Kind;
use crate::pointcut::Pointcut;
use crate::registry::Index;

/// Event surface exposed by the external weaving engine.
pub trait RawJoinPoint {
    /// Engine kind code of this interception.
    fn kind_code(&self) -> u32;

    /// Selector the engine matched.
    fn pointcut(&self) -> &str;

    fn arguments(&self) -> Vec<Value>;

    /// Replace the whole argument list.
    fn set_arguments(&mut self, args: Vec<Value>);

    fn class_name(&self) -> Option<String>;

    fn object(&self) -> Option<Value>;

    fn property_name(&self) -> Option<String>;

    /// Value being assigned, for property writes.
    fn assigned_value(&self) -> Option<Value>;

    fn set_assigned_value(&mut self, value: Value);

    fn method_name(&self) -> Option<String>;

    fn function_name(&self) -> Option<String>;

    fn exception(&self) -> Option<Thrown>;

    /// Value that will be returned to the original caller.
    fn returned_value_mut(&mut self) -> &mut Value;

    fn set_returned_value(&mut self, value: Value);

    /// Run the intercepted code and return its result.
    fn process(&mut self) -> Result<Value>;

    fn as_any(&self) -> &dyn Any;
}

/// Normalized accessors over exactly one raw event.
pub struct JoinPointAdapter<'a> {
    raw: &'a mut dyn RawJoinPoint,
}

impl<'a> JoinPointAdapter<'a> {
    pub fn new(raw: &'a mut dyn RawJoinPoint) -> Self {
        Self { raw }
    }

    /// Build an adapter from a type-erased handle.
    ///
    /// Fails with [`WeaveError::Construction`] unless the handle is an `R`.
    pub fn downcast<R>(handle: &'a mut (dyn Any + 'static)) -> Result<Self>
    where
        R: RawJoinPoint + 'static,
    {
        match handle.downcast_mut::<R>() {
            Some(raw) => Ok(Self::new(raw)),
            None => Err(WeaveError::Construction {
                expected: std::any::type_name::<R>(),
            }),
        }
    }

    /// The wrapped raw event.
    pub fn raw(&self) -> &dyn RawJoinPoint {
        &*self.raw
    }

    pub fn raw_mut(&mut self) -> &mut dyn RawJoinPoint {
        &mut *self.raw
    }

    pub fn kind_code(&self) -> u32 {
        self.raw.kind_code()
    }

    pub fn pointcut(&self) -> &str {
        self.raw.pointcut()
    }

    pub fn args(&self) -> Vec<Value> {
        self.raw.arguments()
    }

    /// Replace all arguments at once; there is no partial update.
    pub fn set_args(&mut self, args: Vec<Value>) {
        self.raw.set_arguments(args);
    }

    pub fn class_name(&self) -> Option<String> {
        self.raw.class_name()
    }

    pub fn object(&self) -> Option<Value> {
        self.raw.object()
    }

    pub fn property_name(&self) -> Option<String> {
        self.raw.property_name()
    }

    pub fn property_value(&self) -> Option<Value> {
        self.raw.assigned_value()
    }

    pub fn set_property_value(&mut self, value: Value) {
        self.raw.set_assigned_value(value);
    }

    pub fn method_name(&self) -> Option<String> {
        self.raw.method_name()
    }

    pub fn function_name(&self) -> Option<String> {
        self.raw.function_name()
    }

    pub fn exception(&self) -> Option<Thrown> {
        self.raw.exception()
    }

    pub fn return_value(&mut self) -> &mut Value {
        self.raw.returned_value_mut()
    }

    pub fn set_return_value(&mut self, value: Value) {
        self.raw.set_returned_value(value);
    }

    /// Run the intercepted code. Only meaningful for around kinds; other
    /// kinds are left to the engine.
    pub fn proceed(&mut self) -> Result<Value> {
        self.raw.process()
    }
}

/// A normalized join point, valid for the duration of one dispatch.
pub struct JoinPoint<'a> {
    kind: Kind,
    index: Index,
    pointcut: Arc<Pointcut>,
    support: JoinPointAdapter<'a>,
}

impl<'a> JoinPoint<'a> {
    pub fn new(
        kind: Kind,
        index: Index,
        pointcut: Arc<Pointcut>,
        support: JoinPointAdapter<'a>,
    ) -> Self {
        Self {
            kind,
            index,
            pointcut,
            support,
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Index of the binding being dispatched.
    pub fn index(&self) -> Index {
        self.index
    }

    /// Pointcut the advice was registered with.
    pub fn pointcut(&self) -> &Arc<Pointcut> {
        &self.pointcut
    }

    /// Selector the engine actually matched for this event.
    pub fn matched_pointcut(&self) -> &str {
        self.support.pointcut()
    }

    pub fn support(&self) -> &JoinPointAdapter<'a> {
        &self.support
    }

    pub fn support_mut(&mut self) -> &mut JoinPointAdapter<'a> {
        &mut self.support
    }

    pub fn args(&self) -> Vec<Value> {
        self.support.args()
    }

    pub fn set_args(&mut self, args: Vec<Value>) {
        self.support.set_args(args);
    }

    pub fn class_name(&self) -> Option<String> {
        self.support.class_name()
    }

    pub fn object(&self) -> Option<Value> {
        self.support.object()
    }

    pub fn property_name(&self) -> Option<String> {
        self.support.property_name()
    }

    pub fn property_value(&self) -> Option<Value> {
        self.support.property_value()
    }

    pub fn set_property_value(&mut self, value: Value) {
        self.support.set_property_value(value);
    }

    pub fn method_name(&self) -> Option<String> {
        self.support.method_name()
    }

    pub fn function_name(&self) -> Option<String> {
        self.support.function_name()
    }

    pub fn exception(&self) -> Option<Thrown> {
        self.support.exception()
    }

    pub fn return_value(&mut self) -> &mut Value {
        self.support.return_value()
    }

    pub fn set_return_value(&mut self, value: Value) {
        self.support.set_return_value(value);
    }

    pub fn proceed(&mut self) -> Result<Value> {
        self.support.proceed()
    }
}

impl std::fmt::Debug for JoinPoint<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoinPoint")
            .field("kind", &self.kind)
            .field("index", &self.index)
            .field("pointcut", &self.pointcut.selector())
            .field("matched", &self.support.pointcut())
            .finish()
    }
}
