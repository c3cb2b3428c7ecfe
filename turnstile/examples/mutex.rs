use turnstile::sync::Mutex;
use turnstile::task;
use turnstile::time::sleep;

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Five workers append to a shared counter through a fair mutex. Each one
/// holds the lock across a sleep; the others queue and are served in the
/// order they arrived.
#[turnstile::main]
async fn main() {
    let mutex = Rc::new(Mutex::new());
    let counter = Rc::new(Cell::new(0usize));

    let mut handles = Vec::new();

    for id in 0..5 {
        let mutex = mutex.clone();
        let counter = counter.clone();

        handles.push(task::spawn(async move {
            mutex
                .with_lock(move || async move {
                    let current = counter.get();
                    sleep(Duration::from_millis(10)).await;
                    counter.set(current + 1);

                    println!("worker {id} wrote {}", current + 1);
                })
                .await;
        }));
    }

    for handle in handles {
        handle.await.expect("worker panicked");
    }

    assert_eq!(counter.get(), 5);
    assert!(!mutex.is_held());
}
