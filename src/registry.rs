//! Weaving registry - indexed storage of bindings.
//!
//! Each `add_*` call on the interceptor produces exactly one [`Binding`].
//! Bindings are numbered from 1 in registration order, never removed, and
//! only mutated through [`WeavingRegistry::set_enabled`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::advice::Advice;
use crate::binder::{self, Handler};
use crate::engine::Category;
use crate::error::{Result, WeaveError};
use crate::pointcut::Pointcut;

/// Handle of a binding. The first index is 1.
pub type Index = usize;

/// Which bindings a selector query returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    /// Only enabled bindings.
    #[default]
    Enabled,
    /// Only disabled bindings.
    Disabled,
    /// No filtering.
    Any,
}

impl StatusFilter {
    pub fn accepts(self, enabled: bool) -> bool {
        match self {
            StatusFilter::Enabled => enabled,
            StatusFilter::Disabled => !enabled,
            StatusFilter::Any => true,
        }
    }
}

/// One registration of advice against a pointcut.
pub struct Binding {
    index: Index,
    category: Category,
    selector: String,
    pointcut: Arc<Pointcut>,
    advice: Arc<dyn Advice>,
    enabled: bool,
    called: bool,
    pub(crate) handler: Handler,
}

impl Binding {
    /// Create an enabled binding with advice bound.
    ///
    /// The index is assigned on insertion into a registry.
    pub fn new(category: Category, pointcut: Arc<Pointcut>, advice: Arc<dyn Advice>) -> Self {
        let mut binding = Self {
            index: 0,
            category,
            selector: pointcut.selector().to_string(),
            pointcut,
            advice,
            enabled: true,
            called: false,
            handler: Handler::PassThrough,
        };
        binder::bind_advice(&mut binding);
        binding
    }

    pub fn index(&self) -> Index {
        self.index
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn pointcut(&self) -> &Arc<Pointcut> {
        &self.pointcut
    }

    pub fn advice(&self) -> &Arc<dyn Advice> {
        &self.advice
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// True once the engine has dispatched to this binding.
    pub fn was_called(&self) -> bool {
        self.called
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub(crate) fn mark_called(&mut self) {
        self.called = true;
    }

    /// Flip `enabled` and rebind the handler in the same mutation.
    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if enabled {
            binder::bind_advice(self);
        } else {
            binder::bind_pass_through(self);
        }
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("index", &self.index)
            .field("category", &self.category)
            .field("selector", &self.selector)
            .field("enabled", &self.enabled)
            .field("called", &self.called)
            .field("handler", &self.handler)
            .finish()
    }
}

/// Indexed collection of bindings.
///
/// Keeps a selector -> indices map next to the bindings so selector
/// queries do not scan every binding.
#[derive(Debug, Default)]
pub struct WeavingRegistry {
    bindings: Vec<Binding>,
    by_selector: HashMap<String, Vec<Index>>,
}

impl WeavingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Index the next insertion will receive.
    pub fn next_index(&self) -> Index {
        self.bindings.len() + 1
    }

    /// Append a binding and return its index.
    pub fn insert(&mut self, mut binding: Binding) -> Index {
        let index = self.next_index();
        binding.index = index;

        self.by_selector
            .entry(binding.selector.clone())
            .or_default()
            .push(index);
        self.bindings.push(binding);

        index
    }

    pub fn get(&self, index: Index) -> Result<&Binding> {
        index
            .checked_sub(1)
            .and_then(|slot| self.bindings.get(slot))
            .ok_or(WeaveError::UnknownIndex(index))
    }

    pub fn get_mut(&mut self, index: Index) -> Result<&mut Binding> {
        index
            .checked_sub(1)
            .and_then(|slot| self.bindings.get_mut(slot))
            .ok_or(WeaveError::UnknownIndex(index))
    }

    /// Indices registered with `selector` that pass `filter`, ascending.
    pub fn find_by_selector(&self, selector: &str, filter: StatusFilter) -> Vec<Index> {
        self.by_selector
            .get(selector)
            .map(|indices| {
                indices
                    .iter()
                    .copied()
                    .filter(|&index| {
                        self.get(index)
                            .map(|b| filter.accepts(b.enabled))
                            .unwrap_or(false)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Enabled state of the last binding registered with `selector`.
    ///
    /// `None` means no binding has this selector, which is not the same as
    /// disabled.
    pub fn last_enabled_for(&self, selector: &str) -> Option<bool> {
        self.by_selector
            .get(selector)
            .and_then(|indices| indices.last())
            .and_then(|&index| self.get(index).ok())
            .map(|b| b.enabled)
    }

    /// Set a binding's enabled state and rebind its handler.
    pub fn set_enabled(&mut self, index: Index, enabled: bool) -> Result<()> {
        let binding = self.get_mut(index)?;
        binding.set_enabled(enabled);
        debug!(
            index = index,
            selector = %binding.selector,
            enabled = enabled,
            "Binding toggled"
        );
        Ok(())
    }

    /// Bindings in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }
}
