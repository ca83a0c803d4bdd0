//! AOP interceptor - runtime weaving registry.
//!
//! Registers advice against pointcuts with an external interception engine
//! and lets each registration be enabled or disabled at runtime without
//! registering anything with the engine again.
//!
//! - [`Interceptor`]: public facade (`add_*`, `enable`, `disable`, queries)
//! - [`registry::WeavingRegistry`]: indexed store of [`Binding`]s
//! - [`binder`]: indirection callbacks and handler swapping
//! - [`kind`]: engine kind codes to the portable [`Kind`] taxonomy
//! - [`join_point`]: normalized view over raw engine events
//! - [`engine`]: the contract the external engine fulfils

pub mod advice;
pub mod binder;
pub mod config;
pub mod engine;
pub mod error;
pub mod interceptor;
pub mod join_point;
pub mod kind;
pub mod pointcut;
pub mod registry;
pub mod utils;

pub use advice::{AddOptions, Advice, AdviceOptions, FnAdvice};
pub use config::WeaverConfig;
pub use engine::{AtomicSwitch, Category, EngineCallback, WeavingEngine, WeavingSwitch};
pub use error::{Result, Thrown, WeaveError};
pub use interceptor::{Interceptor, Scope};
pub use join_point::{JoinPoint, JoinPointAdapter, RawJoinPoint};
pub use kind::{Kind, KindResolver};
pub use pointcut::Pointcut;
pub use registry::{Binding, Index, StatusFilter, WeavingRegistry};
