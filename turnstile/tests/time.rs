use turnstile::sync::Mutex;
use turnstile::task;
use turnstile::time::{Elapsed, sleep, timeout};

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

#[turnstile::test]
async fn test_sleep_waits_at_least_the_duration() {
    let start = Instant::now();

    let delay = sleep(Duration::from_millis(30));
    let deadline = delay.deadline();
    delay.await;

    assert!(Instant::now() >= deadline);
    assert!(start.elapsed() >= Duration::from_millis(30));
}

#[turnstile::test]
async fn test_sleeps_complete_in_deadline_order() {
    let order = Rc::new(RefCell::new(Vec::new()));

    let handles: Vec<_> = [30u64, 10, 20]
        .into_iter()
        .map(|ms| {
            let order = order.clone();
            task::spawn(async move {
                sleep(Duration::from_millis(ms)).await;
                order.borrow_mut().push(ms);
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(*order.borrow(), vec![10, 20, 30]);
}

#[turnstile::test]
async fn test_timeout_completes_before_deadline() {
    let handle = task::spawn(async {
        sleep(Duration::from_millis(10)).await;
        123
    });

    let result = timeout(Duration::from_millis(200), handle).await;

    assert!(
        matches!(result, Ok(Ok(123))),
        "Timeout should return Ok(123)"
    );
}

#[turnstile::test]
async fn test_timeout_expires() {
    let result = timeout(Duration::from_millis(20), sleep(Duration::from_millis(500))).await;

    let err: Elapsed = result.unwrap_err();
    assert_eq!(err.to_string(), "deadline has elapsed");
}

#[turnstile::test]
async fn test_timed_out_waiter_leaves_the_mutex_queue() {
    let mutex = Mutex::new();
    mutex.acquire().await;

    let result = timeout(Duration::from_millis(20), mutex.acquire()).await;
    assert!(result.is_err());

    // Only the original holder remains; one release frees the lock.
    assert!(mutex.is_held());
    mutex.release();
    assert!(!mutex.is_held());
}
