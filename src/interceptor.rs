//! Interceptor facade.
//!
//! Public surface of the crate: register advice for each moment, query and
//! toggle bindings by index or selector, toggle weaving as a whole, and
//! dispatch raw engine events.
//!
//! # Example
//!
//! ```ignore
//! let engine = Arc::new(InMemoryEngine::new());
//! let interceptor = Interceptor::new(engine.clone(), engine.switch());
//!
//! let index = interceptor.add_around(
//!     Arc::new(Pointcut::new("Foo::bar()")),
//!     FnAdvice::shared(|jp| jp.proceed()),
//!     AddOptions::default(),
//! )?;
//!
//! interceptor.disable(index)?;
//! assert_eq!(interceptor.is_enabled(index)?, Some(false));
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::info;

use crate::advice::{AddOptions, Advice};
use crate::binder::BinderController;
use crate::config::WeaverConfig;
use crate::engine::{Category, WeavingEngine, WeavingSwitch};
use crate::error::{Result, WeaveError};
use crate::join_point::RawJoinPoint;
use crate::kind::{Kind, KindResolver};
use crate::pointcut::Pointcut;
use crate::registry::{Binding, Index, StatusFilter, WeavingRegistry};

/// What an `is_enabled`/`enable`/`disable` call applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// The process-wide weaving flag.
    Weaving,
    /// One binding.
    Index(Index),
    /// Every binding registered with this selector.
    Selector(String),
}

impl From<Index> for Scope {
    fn from(index: Index) -> Self {
        Scope::Index(index)
    }
}

impl From<&str> for Scope {
    fn from(selector: &str) -> Self {
        Scope::Selector(selector.to_string())
    }
}

impl From<String> for Scope {
    fn from(selector: String) -> Self {
        Scope::Selector(selector)
    }
}

/// Registers advice with the engine and controls the resulting bindings.
pub struct Interceptor {
    engine: Arc<dyn WeavingEngine>,
    switch: Arc<dyn WeavingSwitch>,
    binder: BinderController,
}

impl Interceptor {
    /// Create an interceptor with a fresh registry.
    pub fn new(engine: Arc<dyn WeavingEngine>, switch: Arc<dyn WeavingSwitch>) -> Self {
        Self::with_registry(
            Arc::new(RwLock::new(WeavingRegistry::new())),
            engine,
            switch,
        )
    }

    /// Create an interceptor over an existing registry.
    pub fn with_registry(
        registry: Arc<RwLock<WeavingRegistry>>,
        engine: Arc<dyn WeavingEngine>,
        switch: Arc<dyn WeavingSwitch>,
    ) -> Self {
        Self {
            engine,
            switch,
            binder: BinderController::new(registry, KindResolver::default()),
        }
    }

    /// Create an interceptor and seed the engine's weaving flag from
    /// `config`. `switch` must be the flag the engine honours.
    pub fn from_config(
        config: &WeaverConfig,
        engine: Arc<dyn WeavingEngine>,
        switch: Arc<dyn WeavingSwitch>,
    ) -> Self {
        switch.set_enabled(config.weaving.enabled);
        Self::new(engine, switch)
    }

    pub fn registry(&self) -> &Arc<RwLock<WeavingRegistry>> {
        self.binder.registry()
    }

    pub fn switch(&self) -> &Arc<dyn WeavingSwitch> {
        &self.switch
    }

    // ========================================================================
    // Registration
    // ========================================================================

    pub fn add_before(
        &self,
        pointcut: Arc<Pointcut>,
        advice: Arc<dyn Advice>,
        options: AddOptions,
    ) -> Result<Index> {
        self.add(Category::Before, pointcut, advice, options)
    }

    pub fn add_around(
        &self,
        pointcut: Arc<Pointcut>,
        advice: Arc<dyn Advice>,
        options: AddOptions,
    ) -> Result<Index> {
        self.add(Category::Around, pointcut, advice, options)
    }

    pub fn add_after(
        &self,
        pointcut: Arc<Pointcut>,
        advice: Arc<dyn Advice>,
        options: AddOptions,
    ) -> Result<Index> {
        self.add(Category::After, pointcut, advice, options)
    }

    pub fn add_after_throw(
        &self,
        pointcut: Arc<Pointcut>,
        advice: Arc<dyn Advice>,
        options: AddOptions,
    ) -> Result<Index> {
        self.add(Category::AfterThrow, pointcut, advice, options)
    }

    pub fn add_after_return(
        &self,
        pointcut: Arc<Pointcut>,
        advice: Arc<dyn Advice>,
        options: AddOptions,
    ) -> Result<Index> {
        self.add(Category::AfterReturn, pointcut, advice, options)
    }

    /// Validate, bind, store, then hand the indirection to the engine.
    ///
    /// Nothing is stored or registered when the pointcut has no selector.
    /// The registry write guard is held across `WeavingEngine::register`,
    /// so the engine must not dispatch from inside `register`.
    pub fn add(
        &self,
        category: Category,
        pointcut: Arc<Pointcut>,
        advice: Arc<dyn Advice>,
        options: AddOptions,
    ) -> Result<Index> {
        if pointcut.is_empty() {
            return Err(WeaveError::Pointcut);
        }

        if let Some(advice_options) = options.advice.as_ref().filter(|o| !o.is_empty()) {
            advice.add_options(advice_options);
        }

        let selector = pointcut.selector().to_string();

        // Engine registration happens under the same guard so the engine
        // sees callbacks in index order.
        let index = {
            let mut registry = self.registry().write();
            let index = registry.insert(Binding::new(category, pointcut, advice));
            self.engine
                .register(category, &selector, self.binder.create_binder(index));
            index
        };

        info!(
            index = index,
            category = %category,
            selector = %selector,
            "Advice registered"
        );
        Ok(index)
    }

    // ========================================================================
    // Enable / disable
    // ========================================================================

    /// Enabled state for a scope.
    ///
    /// - `Weaving`: the weaving flag.
    /// - `Index`: that binding's flag; unknown indices are an error.
    /// - `Selector`: the flag of the last binding with that selector, or
    ///   `None` when no binding has it.
    pub fn is_enabled(&self, scope: impl Into<Scope>) -> Result<Option<bool>> {
        match scope.into() {
            Scope::Weaving => Ok(Some(self.switch.is_enabled())),
            Scope::Index(index) => {
                let registry = self.registry().read();
                Ok(Some(registry.get(index)?.is_enabled()))
            }
            Scope::Selector(selector) => Ok(self.registry().read().last_enabled_for(&selector)),
        }
    }

    /// Shorthand for `is_enabled(Scope::Weaving)`.
    pub fn is_weaving_enabled(&self) -> bool {
        self.switch.is_enabled()
    }

    pub fn enable(&self, scope: impl Into<Scope>) -> Result<&Self> {
        self.set_enabled(scope.into(), true)
    }

    pub fn disable(&self, scope: impl Into<Scope>) -> Result<&Self> {
        self.set_enabled(scope.into(), false)
    }

    fn set_enabled(&self, scope: Scope, enabled: bool) -> Result<&Self> {
        match scope {
            Scope::Weaving => {
                self.switch.set_enabled(enabled);
                info!(enabled = enabled, "Weaving toggled");
            }
            Scope::Index(index) => {
                self.registry().write().set_enabled(index, enabled)?;
            }
            Scope::Selector(selector) => {
                let mut registry = self.registry().write();
                for index in registry.find_by_selector(&selector, StatusFilter::Any) {
                    registry.set_enabled(index, enabled)?;
                }
            }
        }
        Ok(self)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn get_pointcut(&self, index: Index) -> Result<Arc<Pointcut>> {
        let registry = self.registry().read();
        Ok(Arc::clone(registry.get(index)?.pointcut()))
    }

    /// Indices registered with `selector`, ascending, filtered by status.
    pub fn get_index_of_selector(&self, selector: &str, filter: StatusFilter) -> Vec<Index> {
        self.registry().read().find_by_selector(selector, filter)
    }

    /// Whether the engine has dispatched to the binding at least once.
    pub fn was_called(&self, index: Index) -> Result<bool> {
        Ok(self.registry().read().get(index)?.was_called())
    }

    pub fn category(&self, index: Index) -> Result<Category> {
        Ok(self.registry().read().get(index)?.category())
    }

    pub fn len(&self) -> usize {
        self.registry().read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry().read().is_empty()
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Normalize an engine kind code.
    pub fn resolve_kind(&self, code: u32) -> Result<Kind> {
        self.binder.resolver().resolve(code)
    }

    /// Dispatch a raw event to the binding at `index`.
    pub fn dispatch(&self, index: Index, raw: &mut dyn RawJoinPoint) -> Result<Value> {
        self.binder.dispatch(index, raw)
    }
}
