//! Task executor implementation.
//!
//! This module contains the components responsible for executing
//! asynchronous tasks within the runtime.
//!
//! It is composed of:
//! - [`core`]: the executor loop and task ownership,
//! - [`queue`]: the run queue shared with wakers,
//! - [`timer`]: entries of the timer heap.

pub(crate) mod core;
pub(crate) mod queue;
pub(crate) mod timer;
