use turnstile::sync::Mutex;
use turnstile::task::{self, JoinError};
use turnstile::time::{sleep, timeout};
use turnstile::{RuntimeBuilder, RuntimeError, yield_now};

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn try_acquire_fast_path_contention() {
    let mutex = Mutex::new();

    assert!(mutex.try_acquire());
    assert!(!mutex.try_acquire());

    mutex.release();

    assert!(mutex.try_acquire());
    assert!(mutex.is_held());
}

#[test]
fn release_on_free_mutex_is_tolerated() {
    let mutex = Mutex::new();

    mutex.release();
    mutex.release();

    assert!(!mutex.is_held());
    assert!(mutex.try_acquire());
}

#[test]
fn with_lock_on_free_mutex_completes_without_suspending() {
    let mutex = Mutex::new();
    let mut cx = Context::from_waker(Waker::noop());

    let mut fut = pin!(mutex.with_lock(|| async { 7 }));

    assert_eq!(fut.as_mut().poll(&mut cx), Poll::Ready(7));
    assert!(!mutex.is_held());
}

#[test]
fn dropping_a_queued_waiter_removes_it_from_the_queue() {
    let mutex = Mutex::new();
    let mut cx = Context::from_waker(Waker::noop());

    assert!(mutex.try_acquire());

    let mut first = Box::pin(mutex.acquire());
    let mut second = Box::pin(mutex.acquire());
    assert!(first.as_mut().poll(&mut cx).is_pending());
    assert!(second.as_mut().poll(&mut cx).is_pending());

    drop(first);

    mutex.release();
    assert!(mutex.is_held());
    assert!(second.as_mut().poll(&mut cx).is_ready());

    drop(second);
    assert!(mutex.is_held());

    mutex.release();
    assert!(!mutex.is_held());
}

#[test]
fn dropping_a_granted_waiter_passes_ownership_on() {
    let mutex = Mutex::new();
    let mut cx = Context::from_waker(Waker::noop());

    assert!(mutex.try_acquire());

    let mut first = Box::pin(mutex.acquire());
    let mut second = Box::pin(mutex.acquire());
    assert!(first.as_mut().poll(&mut cx).is_pending());
    assert!(second.as_mut().poll(&mut cx).is_pending());

    // Ownership goes to `first`, which never observes it.
    mutex.release();
    drop(first);

    assert!(mutex.is_held());
    assert!(second.as_mut().poll(&mut cx).is_ready());

    mutex.release();
    assert!(!mutex.is_held());
}

#[test]
fn repolling_a_waiter_does_not_queue_it_twice() {
    let mutex = Mutex::new();
    let mut cx = Context::from_waker(Waker::noop());

    assert!(mutex.try_acquire());

    let mut waiter = Box::pin(mutex.acquire());
    assert!(waiter.as_mut().poll(&mut cx).is_pending());
    assert!(waiter.as_mut().poll(&mut cx).is_pending());

    mutex.release();
    assert!(waiter.as_mut().poll(&mut cx).is_ready());

    mutex.release();
    assert!(!mutex.is_held());
}

#[turnstile::test]
async fn queued_acquire_waits_for_release() {
    init_logging();

    let mutex = Rc::new(Mutex::new());
    let resumed = Rc::new(Cell::new(false));

    mutex.acquire().await;

    let handle = task::spawn({
        let mutex = mutex.clone();
        let resumed = resumed.clone();

        async move {
            mutex.acquire().await;
            resumed.set(true);
            mutex.release();
        }
    });

    sleep(Duration::from_millis(20)).await;
    assert!(!resumed.get());
    assert!(mutex.is_held());

    mutex.release();
    handle.await.unwrap();

    assert!(resumed.get());
    assert!(!mutex.is_held());
}

#[turnstile::test]
async fn waiters_are_granted_in_arrival_order() {
    let mutex = Rc::new(Mutex::new());
    let order = Rc::new(RefCell::new(Vec::new()));

    mutex.acquire().await;

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let mutex = mutex.clone();
            let order = order.clone();

            task::spawn(async move {
                mutex.acquire().await;
                order.borrow_mut().push(i);
                yield_now().await;
                mutex.release();
            })
        })
        .collect();

    // Every task runs once and queues up behind the holder.
    yield_now().await;
    assert!(order.borrow().is_empty());

    mutex.release();

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(*order.borrow(), (0..10).collect::<Vec<_>>());
    assert!(!mutex.is_held());
}

#[turnstile::test]
async fn release_transfers_ownership_without_freeing() {
    let mutex = Rc::new(Mutex::new());

    mutex.acquire().await;

    let handle = task::spawn({
        let mutex = mutex.clone();
        async move {
            mutex.acquire().await;
            mutex.release();
        }
    });

    yield_now().await;

    mutex.release();

    // The waiter owns the lock now, even though it has not run yet.
    assert!(mutex.is_held());
    assert!(!mutex.try_acquire());
    assert!(mutex.try_lock().is_none());

    handle.await.unwrap();
    assert!(!mutex.is_held());
}

#[turnstile::test]
async fn critical_sections_never_overlap() {
    let mutex = Rc::new(Mutex::new());
    let inside = Rc::new(Cell::new(0usize));
    let max_inside = Rc::new(Cell::new(0usize));

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let mutex = mutex.clone();
            let inside = inside.clone();
            let max_inside = max_inside.clone();

            task::spawn(async move {
                mutex
                    .with_lock(move || async move {
                        inside.set(inside.get() + 1);
                        max_inside.set(max_inside.get().max(inside.get()));

                        yield_now().await;
                        yield_now().await;

                        inside.set(inside.get() - 1);
                    })
                    .await;
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(inside.get(), 0);
    assert_eq!(max_inside.get(), 1);
}

#[turnstile::test]
async fn holder_acquiring_again_waits_for_another_release() {
    let mutex = Rc::new(Mutex::new());
    let progress = Rc::new(Cell::new(0));

    let handle = task::spawn({
        let mutex = mutex.clone();
        let progress = progress.clone();

        async move {
            mutex.acquire().await;
            progress.set(1);

            mutex.acquire().await;
            progress.set(2);

            mutex.release();
        }
    });

    sleep(Duration::from_millis(20)).await;
    assert_eq!(progress.get(), 1);
    assert!(mutex.is_held());

    // Any caller may release; this hands the lock to the second acquire.
    mutex.release();
    handle.await.unwrap();

    assert_eq!(progress.get(), 2);
    assert!(!mutex.is_held());
}

#[test]
fn holder_acquiring_again_alone_stalls() {
    let runtime = RuntimeBuilder::new().build();
    let mutex = Mutex::new();

    let result = runtime.try_block_on(async {
        mutex.acquire().await;
        mutex.acquire().await;
    });

    assert_eq!(result, Err(RuntimeError::Stalled { pending: 0 }));

    // The abandoned second acquire left the queue; the first still holds.
    assert!(mutex.is_held());
    mutex.release();
    assert!(!mutex.is_held());
}

#[turnstile::test]
async fn sequential_pairs_leave_mutex_free() {
    let mutex = Mutex::new();

    for _ in 0..1000 {
        mutex.acquire().await;
        assert!(mutex.is_held());
        mutex.release();
    }

    assert!(!mutex.is_held());
}

#[derive(Debug, PartialEq)]
struct Failure(&'static str);

#[turnstile::test]
async fn with_lock_releases_after_error_and_stays_usable() {
    let mutex = Mutex::new();

    let result: Result<(), Failure> = mutex.with_lock(|| async { Err(Failure("boom")) }).await;

    assert_eq!(result, Err(Failure("boom")));
    assert!(!mutex.is_held());

    let value = mutex.with_lock(|| async { "ok" }).await;
    assert_eq!(value, "ok");
    assert!(!mutex.is_held());
}

#[turnstile::test]
async fn with_lock_releases_after_panic_and_stays_usable() {
    init_logging();

    let mutex = Rc::new(Mutex::new());

    let handle = task::spawn({
        let mutex = mutex.clone();
        async move {
            let () = mutex
                .with_lock(|| async { panic!("critical section failed") })
                .await;
        }
    });

    let err = handle.await.unwrap_err();
    assert_eq!(err, JoinError::Panicked("critical section failed".to_string()));
    assert!(!mutex.is_held());

    let value = mutex.with_lock(|| async { "ok" }).await;
    assert_eq!(value, "ok");
}

#[turnstile::test]
async fn panic_in_critical_section_hands_lock_to_next_waiter() {
    let mutex = Rc::new(Mutex::new());
    let served = Rc::new(Cell::new(false));

    let failing = task::spawn({
        let mutex = mutex.clone();
        async move {
            let () = mutex
                .with_lock(|| async {
                    yield_now().await;
                    panic!("failed while others wait");
                })
                .await;
        }
    });

    let waiting = task::spawn({
        let mutex = mutex.clone();
        let served = served.clone();
        async move {
            mutex
                .with_lock(move || async move {
                    served.set(true);
                })
                .await;
        }
    });

    assert!(failing.await.unwrap_err().is_panic());
    waiting.await.unwrap();

    assert!(served.get());
    assert!(!mutex.is_held());
}

#[turnstile::test]
async fn dropping_with_lock_mid_task_releases() {
    let mutex = Mutex::new();

    let result = timeout(
        Duration::from_millis(20),
        mutex.with_lock(|| sleep(Duration::from_secs(3600))),
    )
    .await;

    assert!(result.is_err());
    assert!(!mutex.is_held());
    assert!(mutex.try_acquire());
}

#[turnstile::test]
async fn timed_out_holder_hands_lock_to_next_waiter() {
    let mutex = Rc::new(Mutex::new());
    let served = Rc::new(Cell::new(false));

    let holder = task::spawn({
        let mutex = mutex.clone();
        async move {
            timeout(
                Duration::from_millis(20),
                mutex.with_lock(|| sleep(Duration::from_secs(3600))),
            )
            .await
        }
    });

    yield_now().await;
    assert!(mutex.is_held());

    let waiting = task::spawn({
        let mutex = mutex.clone();
        let served = served.clone();
        async move {
            mutex
                .with_lock(move || async move {
                    served.set(true);
                })
                .await;
        }
    });

    yield_now().await;
    assert!(!served.get());

    assert!(holder.await.unwrap().is_err());
    waiting.await.unwrap();

    assert!(served.get());
    assert!(!mutex.is_held());
}

#[turnstile::test]
async fn contended_read_modify_write_is_serialized() {
    const TASKS: usize = 1000;

    let mutex = Rc::new(Mutex::new());
    let counter = Rc::new(Cell::new(0usize));

    let handles: Vec<_> = (0..TASKS)
        .map(|_| {
            let mutex = mutex.clone();
            let counter = counter.clone();

            task::spawn(async move {
                mutex
                    .with_lock(move || async move {
                        let current = counter.get();
                        yield_now().await;
                        counter.set(current + 1);
                    })
                    .await;
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(counter.get(), TASKS);
    assert!(!mutex.is_held());
}

#[turnstile::test]
async fn unserialized_read_modify_write_loses_updates() {
    const TASKS: usize = 100;

    let counter = Rc::new(Cell::new(0usize));

    let handles: Vec<_> = (0..TASKS)
        .map(|_| {
            let counter = counter.clone();

            task::spawn(async move {
                let current = counter.get();
                yield_now().await;
                counter.set(current + 1);
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    assert!(counter.get() < TASKS);
}

#[turnstile::test]
async fn lock_guard_releases_on_drop() {
    let mutex = Mutex::new();

    let guard = mutex.lock().await;
    assert!(mutex.is_held());
    assert!(std::ptr::eq(guard.mutex(), &mutex));

    drop(guard);
    assert!(!mutex.is_held());

    {
        let _guard = mutex.try_lock().expect("mutex is free");
        assert!(mutex.try_lock().is_none());
    }

    assert!(!mutex.is_held());
}
