//! Contract with the external weaving engine.
//!
//! This module contains:
//! - `WeavingEngine` trait: permanent callback registration per selector
//! - `WeavingSwitch` trait: the process-wide weaving flag
//! - `AtomicSwitch`: in-process switch implementation
//! - `InMemoryEngine`: reference engine for tests and embedders

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::join_point::RawJoinPoint;

pub mod memory;

pub use memory::{InMemoryEngine, MemoryJoinPoint};

/// Callback the engine invokes for each matching interception.
///
/// The returned value is used by around registrations and ignored otherwise.
pub type EngineCallback = Arc<dyn Fn(&mut dyn RawJoinPoint) -> Result<Value> + Send + Sync>;

/// Moment at which a registration is woven in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Before,
    Around,
    After,
    AfterThrow,
    AfterReturn,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Before => "before",
            Category::Around => "around",
            Category::After => "after",
            Category::AfterThrow => "after_throw",
            Category::AfterReturn => "after_return",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Traits
// ============================================================================

/// The interception engine.
///
/// Registration is permanent: there is no way to remove or replace a
/// callback once handed over.
pub trait WeavingEngine: Send + Sync {
    fn register(&self, category: Category, selector: &str, callback: EngineCallback);

    fn register_before(&self, selector: &str, callback: EngineCallback) {
        self.register(Category::Before, selector, callback);
    }

    fn register_around(&self, selector: &str, callback: EngineCallback) {
        self.register(Category::Around, selector, callback);
    }

    fn register_after(&self, selector: &str, callback: EngineCallback) {
        self.register(Category::After, selector, callback);
    }

    fn register_after_throw(&self, selector: &str, callback: EngineCallback) {
        self.register(Category::AfterThrow, selector, callback);
    }

    fn register_after_return(&self, selector: &str, callback: EngineCallback) {
        self.register(Category::AfterReturn, selector, callback);
    }
}

/// Process-wide weaving flag.
pub trait WeavingSwitch: Send + Sync {
    fn is_enabled(&self) -> bool;

    fn set_enabled(&self, enabled: bool);
}

/// Weaving flag held in an atomic.
#[derive(Debug)]
pub struct AtomicSwitch {
    enabled: AtomicBool,
}

impl AtomicSwitch {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
        }
    }
}

impl Default for AtomicSwitch {
    fn default() -> Self {
        Self::new(true)
    }
}

impl WeavingSwitch for AtomicSwitch {
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }
}
