//! In-memory weaving engine.
//!
//! Matches selectors by exact string comparison and fires callbacks only
//! when asked to through [`InMemoryEngine::fire`]. Useful for tests and
//! for hosts that drive interception themselves.

use std::any::Any;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use super::{AtomicSwitch, Category, EngineCallback, WeavingEngine, WeavingSwitch};
use crate::error::{Result, Thrown};
use crate::join_point::RawJoinPoint;

/// Original code attached to a [`MemoryJoinPoint`].
pub type OriginalCode = Box<dyn FnMut(&[Value]) -> Result<Value> + Send>;

struct Registration {
    category: Category,
    selector: String,
    callback: EngineCallback,
}

/// Engine that keeps its registrations in memory.
pub struct InMemoryEngine {
    registrations: RwLock<Vec<Registration>>,
    switch: Arc<dyn WeavingSwitch>,
}

impl InMemoryEngine {
    /// Create an engine with its own switch, enabled.
    pub fn new() -> Self {
        Self::with_switch(Arc::new(AtomicSwitch::default()))
    }

    pub fn with_switch(switch: Arc<dyn WeavingSwitch>) -> Self {
        Self {
            registrations: RwLock::new(Vec::new()),
            switch,
        }
    }

    /// The switch this engine honors.
    pub fn switch(&self) -> Arc<dyn WeavingSwitch> {
        Arc::clone(&self.switch)
    }

    pub fn registration_count(&self) -> usize {
        self.registrations.read().len()
    }

    /// Categories registered for `selector`, in registration order.
    pub fn categories_for(&self, selector: &str) -> Vec<Category> {
        self.registrations
            .read()
            .iter()
            .filter(|r| r.selector == selector)
            .map(|r| r.category)
            .collect()
    }

    /// Simulate an interception of `raw` at the given moment.
    ///
    /// Every callback registered for the category and the event's selector
    /// runs in registration order; the last result is returned. With
    /// weaving disabled, or with no around callback, an around interception
    /// runs the original code directly.
    pub fn fire(&self, category: Category, raw: &mut dyn RawJoinPoint) -> Result<Option<Value>> {
        if !self.switch.is_enabled() {
            debug!(category = %category, "Weaving disabled, bypassing callbacks");
            return self.bypass(category, raw);
        }

        // Callbacks run without the lock held; original code may fire again.
        let callbacks: Vec<EngineCallback> = self
            .registrations
            .read()
            .iter()
            .filter(|r| r.category == category && r.selector == raw.pointcut())
            .map(|r| Arc::clone(&r.callback))
            .collect();

        if callbacks.is_empty() {
            return self.bypass(category, raw);
        }

        let mut last = None;
        for callback in callbacks {
            last = Some(callback(&mut *raw)?);
        }
        Ok(last)
    }

    fn bypass(&self, category: Category, raw: &mut dyn RawJoinPoint) -> Result<Option<Value>> {
        match category {
            Category::Around => raw.process().map(Some),
            _ => Ok(None),
        }
    }
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WeavingEngine for InMemoryEngine {
    fn register(&self, category: Category, selector: &str, callback: EngineCallback) {
        debug!(category = %category, selector = %selector, "Engine registration");
        self.registrations.write().push(Registration {
            category,
            selector: selector.to_string(),
            callback,
        });
    }
}

/// Plain raw event with counters for observing the interceptor.
pub struct MemoryJoinPoint {
    kind_code: u32,
    pointcut: String,
    args: Vec<Value>,
    class_name: Option<String>,
    object: Option<Value>,
    property_name: Option<String>,
    assigned: Option<Value>,
    method_name: Option<String>,
    function_name: Option<String>,
    exception: Option<Thrown>,
    returned: Value,
    original: Option<OriginalCode>,
    proceed_count: usize,
    return_reads: usize,
}

impl MemoryJoinPoint {
    pub fn new(kind_code: u32, pointcut: impl Into<String>) -> Self {
        Self {
            kind_code,
            pointcut: pointcut.into(),
            args: Vec::new(),
            class_name: None,
            object: None,
            property_name: None,
            assigned: None,
            method_name: None,
            function_name: None,
            exception: None,
            returned: Value::Null,
            original: None,
            proceed_count: 0,
            return_reads: 0,
        }
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_object(mut self, object: Value) -> Self {
        self.object = Some(object);
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, assigned: Option<Value>) -> Self {
        self.property_name = Some(name.into());
        self.assigned = assigned;
        self
    }

    pub fn with_method(mut self, method_name: impl Into<String>) -> Self {
        self.method_name = Some(method_name.into());
        self
    }

    pub fn with_function(mut self, function_name: impl Into<String>) -> Self {
        self.function_name = Some(function_name.into());
        self
    }

    pub fn with_exception(mut self, exception: Thrown) -> Self {
        self.exception = Some(exception);
        self
    }

    pub fn with_returned(mut self, value: Value) -> Self {
        self.returned = value;
        self
    }

    /// Attach the code `process` runs. It receives the current arguments.
    pub fn with_original<F>(mut self, original: F) -> Self
    where
        F: FnMut(&[Value]) -> Result<Value> + Send + 'static,
    {
        self.original = Some(Box::new(original));
        self
    }

    /// Number of times the original code ran.
    pub fn proceed_count(&self) -> usize {
        self.proceed_count
    }

    /// Number of times the return value was accessed through the adapter.
    pub fn return_reads(&self) -> usize {
        self.return_reads
    }

    pub fn returned(&self) -> &Value {
        &self.returned
    }
}

impl RawJoinPoint for MemoryJoinPoint {
    fn kind_code(&self) -> u32 {
        self.kind_code
    }

    fn pointcut(&self) -> &str {
        &self.pointcut
    }

    fn arguments(&self) -> Vec<Value> {
        self.args.clone()
    }

    fn set_arguments(&mut self, args: Vec<Value>) {
        self.args = args;
    }

    fn class_name(&self) -> Option<String> {
        self.class_name.clone()
    }

    fn object(&self) -> Option<Value> {
        self.object.clone()
    }

    fn property_name(&self) -> Option<String> {
        self.property_name.clone()
    }

    fn assigned_value(&self) -> Option<Value> {
        self.assigned.clone()
    }

    fn set_assigned_value(&mut self, value: Value) {
        self.assigned = Some(value);
    }

    fn method_name(&self) -> Option<String> {
        self.method_name.clone()
    }

    fn function_name(&self) -> Option<String> {
        self.function_name.clone()
    }

    fn exception(&self) -> Option<Thrown> {
        self.exception.clone()
    }

    fn returned_value_mut(&mut self) -> &mut Value {
        self.return_reads += 1;
        &mut self.returned
    }

    fn set_returned_value(&mut self, value: Value) {
        self.returned = value;
    }

    fn process(&mut self) -> Result<Value> {
        self.proceed_count += 1;
        if let Some(original) = self.original.as_mut() {
            self.returned = original(&self.args)?;
        }
        Ok(self.returned.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
