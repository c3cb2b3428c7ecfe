//! Time utilities.
//!
//! This module provides time-related asynchronous utilities driven by the
//! runtime's timer heap.
//!
//! It includes:
//! - [`sleep`] for suspending a task until a deadline,
//! - [`timeout`] for bounding future execution time.

mod sleep;
mod timeout;

#[doc(inline)]
pub use sleep::{Sleep, sleep};

#[doc(inline)]
pub use timeout::{Elapsed, Timeout, timeout};
