//! Synchronization primitives for Turnstile.
//!
//! This module provides async-aware synchronization tools for the runtime.
//! The primitives suspend tasks instead of blocking threads, and are meant
//! to be shared between tasks of the same runtime with `Rc`.
//!
//! The current primitives include:
//! - [`Mutex`] — a fair, non-reentrant mutual exclusion primitive.
//! - [`Guarded`] — a value that can only be reached through a held [`Mutex`].
//!
//! ## Design notes
//!
//! - Waiters are admitted strictly first-come-first-served.
//! - On release, ownership passes directly to the oldest waiter; the lock is
//!   never observably free in between.
//! - The primitives are `!Sync`: they assume one scheduler thread where only
//!   one task runs at any instant.

mod guarded;
mod mutex;

pub use guarded::{Guarded, GuardedRef};
pub use mutex::{Acquire, Lock, Mutex, MutexGuard};
