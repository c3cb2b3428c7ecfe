use super::core::TaskHeader;

use std::mem;
use std::sync::Arc;
use std::task::{RawWaker, RawWakerVTable, Waker};

/// The `RawWakerVTable` for task headers.
///
/// The vtable defines how the executor interacts with the task when:
/// - cloning the waker,
/// - waking the task,
/// - waking by reference,
/// - dropping the waker.
static VTABLE: RawWakerVTable = RawWakerVTable::new(clone_raw, wake_raw, wake_by_ref_raw, drop_raw);

/// Creates a [`Waker`] that reschedules the task owning `header`.
///
/// # Safety
///
/// The pointer stored inside the `RawWaker` originates from
/// `Arc::into_raw`, and every vtable function below keeps the reference
/// count balanced. `TaskHeader` is `Send + Sync`, so the waker may be used
/// from any thread.
pub(crate) fn make_waker(header: Arc<TaskHeader>) -> Waker {
    unsafe { Waker::from_raw(RawWaker::new(Arc::into_raw(header) as *const (), &VTABLE)) }
}

/// Clones the raw waker.
///
/// This increments the reference count of the underlying header.
fn clone_raw(ptr: *const ()) -> RawWaker {
    let arc = unsafe { Arc::<TaskHeader>::from_raw(ptr as *const TaskHeader) };
    let cloned = arc.clone();
    mem::forget(arc);

    RawWaker::new(Arc::into_raw(cloned) as *const (), &VTABLE)
}

/// Wakes the task and consumes the waker.
fn wake_raw(ptr: *const ()) {
    let arc = unsafe { Arc::<TaskHeader>::from_raw(ptr as *const TaskHeader) };
    arc.wake();
}

/// Wakes the task without consuming the waker.
fn wake_by_ref_raw(ptr: *const ()) {
    let arc = unsafe { Arc::<TaskHeader>::from_raw(ptr as *const TaskHeader) };
    arc.clone().wake();
    mem::forget(arc);
}

/// Drops the raw waker, decrementing the header's reference count.
fn drop_raw(ptr: *const ()) {
    unsafe { drop(Arc::<TaskHeader>::from_raw(ptr as *const TaskHeader)) };
}
