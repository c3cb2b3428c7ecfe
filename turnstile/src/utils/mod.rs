//! Utilities for memory-efficient data structures.
//!
//! This module provides low-level utilities used internally by the runtime.
//! In particular, it exposes a [`Slab`] used by the executor to own tasks
//! under stable, reusable keys.

mod slab;

pub(crate) use slab::Slab;
