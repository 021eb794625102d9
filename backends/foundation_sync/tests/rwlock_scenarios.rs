//! Multi-threaded scenarios for `PolicyRwLock`.
//!
//! Threads are parked in the lock before the interesting release happens;
//! `snapshot()` tells us when they are actually waiting.

use foundation_sync::{LockSnapshot, LockState, Policy, PolicyRwLock};
use serial_test::serial;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::{Duration, Instant};

fn wait_until(lock: &PolicyRwLock, what: &str, condition: impl Fn(&LockSnapshot) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let snapshot = lock.snapshot();
        if condition(&snapshot) {
            return;
        }
        assert!(Instant::now() < deadline, "timed out waiting for {what}: {snapshot:?}");
        thread::sleep(Duration::from_millis(1));
    }
}

fn wait_for_flag(flag: &AtomicBool) {
    while !flag.load(Ordering::Acquire) {
        thread::sleep(Duration::from_millis(1));
    }
}

/// WHY: Under writer preference a queued writer overtakes a reader that queued first
/// WHAT: With W1 held, R then W2 queue; releasing W1 admits W2 before R
#[test]
#[serial]
#[ntest::timeout(10000)]
fn test_writers_policy_admits_waiting_writer_first() {
    let lock = Arc::new(PolicyRwLock::new(Policy::Writers));
    let order = Arc::new(Mutex::new(Vec::new()));

    lock.writer_lock();

    let reader = {
        let lock = Arc::clone(&lock);
        let order = Arc::clone(&order);
        thread::spawn(move || {
            lock.reader_lock();
            order.lock().unwrap().push("R");
            lock.reader_unlock();
        })
    };
    wait_until(&lock, "reader to queue", |s| s.waiting_readers == 1);

    let writer = {
        let lock = Arc::clone(&lock);
        let order = Arc::clone(&order);
        thread::spawn(move || {
            lock.writer_lock();
            order.lock().unwrap().push("W2");
            lock.writer_unlock();
        })
    };
    wait_until(&lock, "writer to queue", |s| s.waiting_writers == 1);

    lock.writer_unlock();
    reader.join().unwrap();
    writer.join().unwrap();

    assert_eq!(*order.lock().unwrap(), vec!["W2", "R"]);
    assert_eq!(lock.snapshot().state(), LockState::Idle);
}

/// WHY: Writer preference must hold for every reader that queued behind writers
/// WHAT: With W1 held, 3 readers and 2 writers queue; both writers run before any reader
#[test]
#[serial]
#[ntest::timeout(10000)]
fn test_writers_policy_drains_writers_before_readers() {
    let lock = Arc::new(PolicyRwLock::new(Policy::Writers));
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut handles = Vec::new();

    lock.writer_lock();

    for _ in 0..3 {
        let lock = Arc::clone(&lock);
        let order = Arc::clone(&order);
        handles.push(thread::spawn(move || {
            let _guard = lock.read();
            order.lock().unwrap().push('R');
        }));
    }
    wait_until(&lock, "readers to queue", |s| s.waiting_readers == 3);

    for _ in 0..2 {
        let lock = Arc::clone(&lock);
        let order = Arc::clone(&order);
        handles.push(thread::spawn(move || {
            let _guard = lock.write();
            order.lock().unwrap().push('W');
        }));
    }
    wait_until(&lock, "writers to queue", |s| s.waiting_writers == 2);

    lock.writer_unlock();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(*order.lock().unwrap(), vec!['W', 'W', 'R', 'R', 'R']);
}

/// WHY: Reader preference lets readers keep entering past a waiting writer
/// WHAT: Two readers hold, W queues, a third reader enters at once; W only runs after all unlock
#[test]
#[serial]
#[ntest::timeout(10000)]
fn test_readers_policy_lets_readers_pass_waiting_writer() {
    let lock = Arc::new(PolicyRwLock::new(Policy::Readers));
    let writer_acquired = Arc::new(AtomicBool::new(false));

    lock.reader_lock();
    lock.reader_lock();

    let writer = {
        let lock = Arc::clone(&lock);
        let writer_acquired = Arc::clone(&writer_acquired);
        thread::spawn(move || {
            lock.writer_lock();
            writer_acquired.store(true, Ordering::Release);
            lock.writer_unlock();
        })
    };
    wait_until(&lock, "writer to queue", |s| s.waiting_writers == 1);

    lock.reader_lock();
    let snapshot = lock.snapshot();
    assert_eq!(snapshot.active_readers, 3);
    assert_eq!(snapshot.waiting_readers, 0);
    assert!(!writer_acquired.load(Ordering::Acquire));

    lock.reader_unlock();
    lock.reader_unlock();
    thread::sleep(Duration::from_millis(20));
    assert!(!writer_acquired.load(Ordering::Acquire), "writer ran while a reader held the lock");

    lock.reader_unlock();
    writer.join().unwrap();
    assert!(writer_acquired.load(Ordering::Acquire));
}

/// WHY: The n-way batch bounds how many readers pass a waiting writer
/// WHAT: width 3, W1 held, R1..R5 then W2 queue; exactly 3 readers enter, then W2,
///       then the remaining two readers once W2 releases
#[test]
#[serial]
#[ntest::timeout(10000)]
fn test_n_way_batch_admits_width_readers_then_writer() {
    let lock = Arc::new(PolicyRwLock::new(Policy::n_way(3).unwrap()));
    let admitted = Arc::new(AtomicUsize::new(0));
    let release_readers = Arc::new(AtomicBool::new(false));
    let writer_acquired = Arc::new(AtomicBool::new(false));
    let release_writer = Arc::new(AtomicBool::new(false));

    lock.writer_lock();

    let readers: Vec<_> = (0..5)
        .map(|_| {
            let lock = Arc::clone(&lock);
            let admitted = Arc::clone(&admitted);
            let release_readers = Arc::clone(&release_readers);
            thread::spawn(move || {
                lock.reader_lock();
                admitted.fetch_add(1, Ordering::AcqRel);
                wait_for_flag(&release_readers);
                lock.reader_unlock();
            })
        })
        .collect();
    wait_until(&lock, "five readers to queue", |s| s.waiting_readers == 5);

    let writer = {
        let lock = Arc::clone(&lock);
        let writer_acquired = Arc::clone(&writer_acquired);
        let release_writer = Arc::clone(&release_writer);
        thread::spawn(move || {
            lock.writer_lock();
            writer_acquired.store(true, Ordering::Release);
            wait_for_flag(&release_writer);
            lock.writer_unlock();
        })
    };
    wait_until(&lock, "second writer to queue", |s| s.waiting_writers == 1);

    lock.writer_unlock();
    wait_until(&lock, "batch to fill", |s| s.active_readers == 3);

    let snapshot = lock.snapshot();
    assert!(snapshot.batch_active);
    assert_eq!(snapshot.batch_limit, 3);
    assert_eq!(snapshot.current_batch_readers, 3);
    assert_eq!(snapshot.waiting_readers, 2);
    assert_eq!(snapshot.waiting_writers, 1);

    thread::sleep(Duration::from_millis(30));
    assert_eq!(admitted.load(Ordering::Acquire), 3, "a reader slipped past the batch limit");
    assert!(!writer_acquired.load(Ordering::Acquire));

    release_readers.store(true, Ordering::Release);
    wait_for_flag(&writer_acquired);
    let snapshot = lock.snapshot();
    assert_eq!(snapshot.state(), LockState::Writing);
    assert_eq!(snapshot.waiting_readers, 2);
    assert!(!snapshot.batch_active);
    assert_eq!(admitted.load(Ordering::Acquire), 3);

    release_writer.store(true, Ordering::Release);
    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(admitted.load(Ordering::Acquire), 5);
    assert_eq!(lock.snapshot().state(), LockState::Idle);
}

/// WHY: With no writer waiting the n-way lock must not limit readers
/// WHAT: width 2 still lets four readers hold the lock at the same time
#[test]
#[ntest::timeout(5000)]
fn test_n_way_without_waiting_writer_is_unbounded() {
    let lock = Arc::new(PolicyRwLock::new(Policy::n_way(2).unwrap()));
    let all_inside = Arc::new(Barrier::new(5));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let lock = Arc::clone(&lock);
            let all_inside = Arc::clone(&all_inside);
            thread::spawn(move || {
                let _guard = lock.read();
                all_inside.wait();
            })
        })
        .collect();

    all_inside.wait();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(lock.snapshot(), LockSnapshot::default());
}

/// WHY: Successive batches must each respect the width while a writer keeps waiting
/// WHAT: width 2 with 6 queued readers and 3 queued writers alternates
///       at most 2 readers between consecutive writers
#[test]
#[serial]
#[ntest::timeout(10000)]
fn test_n_way_bounds_readers_between_writers() {
    let lock = Arc::new(PolicyRwLock::new(Policy::n_way(2).unwrap()));
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut handles = Vec::new();

    lock.writer_lock();

    for _ in 0..6 {
        let lock = Arc::clone(&lock);
        let order = Arc::clone(&order);
        handles.push(thread::spawn(move || {
            let _guard = lock.read();
            order.lock().unwrap().push('R');
            thread::sleep(Duration::from_millis(5));
        }));
    }
    wait_until(&lock, "readers to queue", |s| s.waiting_readers == 6);

    for _ in 0..3 {
        let lock = Arc::clone(&lock);
        let order = Arc::clone(&order);
        handles.push(thread::spawn(move || {
            let _guard = lock.write();
            order.lock().unwrap().push('W');
            thread::sleep(Duration::from_millis(5));
        }));
    }
    wait_until(&lock, "writers to queue", |s| s.waiting_writers == 3);

    lock.writer_unlock();
    for handle in handles {
        handle.join().unwrap();
    }

    let order = order.lock().unwrap().clone();
    assert_eq!(order.iter().filter(|&&c| c == 'R').count(), 6);
    assert_eq!(order.iter().filter(|&&c| c == 'W').count(), 3);

    let last_writer = order.iter().rposition(|&c| c == 'W').unwrap();
    let mut run = 0;
    for &event in &order[..last_writer] {
        if event == 'R' {
            run += 1;
            assert!(run <= 2, "more than 2 readers between writers: {order:?}");
        } else {
            run = 0;
        }
    }
}

/// WHY: Mutual exclusion must hold for every policy under mixed load
/// WHAT: Readers and writers hammer the lock; no reader ever sees a writer inside
#[test]
#[ntest::timeout(20000)]
fn test_mutual_exclusion_for_every_policy() {
    for policy in [Policy::Readers, Policy::Writers, Policy::n_way(3).unwrap()] {
        let lock = Arc::new(PolicyRwLock::new(policy));
        let readers_inside = Arc::new(AtomicUsize::new(0));
        let writers_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|thread_id| {
                let lock = Arc::clone(&lock);
                let readers_inside = Arc::clone(&readers_inside);
                let writers_inside = Arc::clone(&writers_inside);
                thread::spawn(move || {
                    for iteration in 0..300 {
                        if (thread_id + iteration) % 4 == 0 {
                            let _guard = lock.write();
                            assert_eq!(writers_inside.fetch_add(1, Ordering::SeqCst), 0);
                            assert_eq!(readers_inside.load(Ordering::SeqCst), 0);
                            writers_inside.fetch_sub(1, Ordering::SeqCst);
                        } else {
                            let _guard = lock.read();
                            readers_inside.fetch_add(1, Ordering::SeqCst);
                            assert_eq!(writers_inside.load(Ordering::SeqCst), 0);
                            readers_inside.fetch_sub(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(lock.snapshot().state(), LockState::Idle, "policy {policy}");
    }
}
