//! Core runtime components.
//!
//! This module contains the cooperative scheduler that hosts Turnstile
//! tasks: task execution, timers, and cooperative yielding.
//!
//! It is responsible for:
//! - executing asynchronous tasks one at a time on the current thread,
//! - keeping ready tasks in wake-up order,
//! - providing runtime context for spawning and timers,
//! - enabling cooperative multitasking via yielding.
//!
//! Most users will interact with higher-level APIs built on top of
//! these components rather than using this module directly.

mod core;
mod error;
mod executor;

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod yield_now;

pub mod task;

pub use self::core::Runtime;
pub use error::RuntimeError;
