//! # Turnstile
//!
//! **Turnstile** is a fair, non-reentrant asynchronous mutex for the **Nebula**
//! ecosystem, together with the small single-threaded cooperative runtime that
//! hosts it.
//!
//! Tasks run one at a time and interleave only at `.await` points. Inside that
//! model, [`sync::Mutex`] guarantees that:
//!
//! - at most one task is inside the critical section at a time,
//! - waiters are admitted in strict first-come-first-served order,
//! - on release, ownership passes directly to the oldest waiter,
//! - [`sync::Mutex::with_lock`] releases the lock on every exit path, including
//!   errors and panics inside the critical section.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use turnstile::sync::Mutex;
//! use turnstile::task;
//! use std::rc::Rc;
//!
//! #[turnstile::main]
//! async fn main() {
//!     let mutex = Rc::new(Mutex::new());
//!
//!     let handle = task::spawn({
//!         let mutex = mutex.clone();
//!         async move {
//!             mutex.with_lock(|| async { println!("inside the critical section") }).await;
//!         }
//!     });
//!
//!     handle.await.unwrap();
//!     assert!(!mutex.is_held());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`sync`] — The fair mutex and the value-guarding [`sync::Guarded`]
//! - [`task`] — Spawning tasks and awaiting their results
//! - [`time`] — Sleep and timeout
//!
//! ## Getting Started
//!
//! Add Turnstile to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! turnstile = { git = "https://github.com/Nebula-ecosystem/Turnstile", package = "turnstile" }
//! ```

mod runtime;
mod utils;

pub mod sync;
pub mod time;

pub use runtime::builder::RuntimeBuilder;
pub use runtime::task;
pub use runtime::yield_now::yield_now;
pub use runtime::{Runtime, RuntimeError};

pub use turnstile_macros::*;
