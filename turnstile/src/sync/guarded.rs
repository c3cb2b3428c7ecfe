use super::mutex::{Mutex, MutexGuard};

use std::cell::{RefCell, RefMut};
use std::fmt;
use std::ops::{Deref, DerefMut};

/// A value protected by a [`Mutex`].
///
/// `Guarded<T>` pairs a fair mutex with the data it protects, so the data
/// can only be reached while the lock is held. Waiters are admitted in
/// arrival order, exactly as with [`Mutex`].
///
/// # Examples
///
/// ```rust,ignore
/// let counter = Rc::new(Guarded::new(0usize));
///
/// let mut value = counter.lock().await;
/// *value += 1;
/// ```
pub struct Guarded<T> {
    mutex: Mutex,
    value: RefCell<T>,
}

impl<T> Guarded<T> {
    /// Creates a new unlocked `Guarded` wrapping `value`.
    pub fn new(value: T) -> Self {
        Self {
            mutex: Mutex::new(),
            value: RefCell::new(value),
        }
    }

    /// Waits for the lock and returns a guard giving access to the value.
    pub async fn lock(&self) -> GuardedRef<'_, T> {
        let permit = self.mutex.lock().await;
        self.borrow(permit)
    }

    /// Takes the lock if it is free, without suspending.
    pub fn try_lock(&self) -> Option<GuardedRef<'_, T>> {
        self.mutex.try_lock().map(|permit| self.borrow(permit))
    }

    /// Returns `true` if the value is currently locked.
    pub fn is_locked(&self) -> bool {
        self.mutex.is_held()
    }

    /// Consumes the `Guarded`, returning the protected value.
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }

    fn borrow<'a>(&'a self, permit: MutexGuard<'a>) -> GuardedRef<'a, T> {
        // Holding the permit means no other `GuardedRef` is alive.
        GuardedRef {
            value: self.value.borrow_mut(),
            _permit: permit,
        }
    }
}

impl<T: Default> Default for Guarded<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> fmt::Debug for Guarded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guarded")
            .field("locked", &self.is_locked())
            .finish_non_exhaustive()
    }
}

/// Access to the value of a [`Guarded`].
///
/// Releases the lock when dropped.
#[must_use = "if unused the Guarded will immediately unlock"]
pub struct GuardedRef<'a, T> {
    // Declared first so the borrow ends before the lock is handed on.
    value: RefMut<'a, T>,
    _permit: MutexGuard<'a>,
}

impl<T> Deref for GuardedRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for GuardedRef<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for GuardedRef<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.value, f)
    }
}
