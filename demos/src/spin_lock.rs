use std::cell::UnsafeCell;
use std::thread;

use concurrent_bst::{NodeLock, SpinLock, SpinPolicy};

struct Guarded {
    lock: SpinLock,
    value: UnsafeCell<u64>,
}

// `value` is only touched while `lock` is held.
unsafe impl Sync for Guarded {}

#[test]
fn guard_plain_data() {
    let guarded = Guarded {
        lock: SpinLock::default(),
        value: UnsafeCell::new(0),
    };
    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..1000 {
                    guarded.lock.acquire(SpinPolicy::Backoff { max_exponent: 4 });
                    unsafe {
                        *guarded.value.get() += 1;
                    }
                    guarded.lock.release();
                }
            });
        }
    });
    assert_eq!(guarded.value.into_inner(), 4000);
}
