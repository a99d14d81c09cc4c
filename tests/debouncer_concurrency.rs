// tests/debouncer_concurrency.rs

mod common;
use crate::common::{manual_debouncer, TestResult};

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const WRITERS: usize = 8;
const PATHS_PER_WRITER: usize = 250;

/// Writers record distinct paths while a drainer keeps polling and the clock
/// keeps moving. Every path must come out exactly once.
#[test]
fn concurrent_record_and_drain_lose_and_duplicate_nothing() -> TestResult {
    let (debouncer, clock) = manual_debouncer(0.05);
    let barrier = Arc::new(Barrier::new(WRITERS + 1));
    let writers_done = Arc::new(AtomicBool::new(false));

    let drainer = {
        let debouncer = Arc::clone(&debouncer);
        let clock = clock.clone();
        let barrier = Arc::clone(&barrier);
        let writers_done = Arc::clone(&writers_done);
        thread::spawn(move || {
            let mut seen: HashMap<PathBuf, usize> = HashMap::new();
            barrier.wait();
            loop {
                let finished = writers_done.load(Ordering::SeqCst);
                clock.advance(Duration::from_millis(10));
                for path in debouncer.drain_ready() {
                    *seen.entry(path).or_default() += 1;
                }
                if finished && debouncer.is_empty() {
                    break;
                }
            }
            seen
        })
    };

    let writers: Vec<_> = (0..WRITERS)
        .map(|w| {
            let debouncer = Arc::clone(&debouncer);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..PATHS_PER_WRITER {
                    debouncer.record(format!("/w/{w}/{i}.py"));
                }
            })
        })
        .collect();

    for writer in writers {
        writer.join().map_err(|_| "writer panicked")?;
    }
    writers_done.store(true, Ordering::SeqCst);

    let seen = drainer.join().map_err(|_| "drainer panicked")?;

    let expected: BTreeSet<PathBuf> = (0..WRITERS)
        .flat_map(|w| (0..PATHS_PER_WRITER).map(move |i| PathBuf::from(format!("/w/{w}/{i}.py"))))
        .collect();
    let drained: BTreeSet<PathBuf> = seen.keys().cloned().collect();

    assert_eq!(drained, expected);
    assert!(seen.values().all(|&n| n == 1), "some path was drained twice");
    Ok(())
}

/// Re-recording the same paths across cycles: each cycle yields each path
/// once, and nothing leaks between cycles.
#[test]
fn repeated_cycles_deliver_once_per_cycle() -> TestResult {
    let (debouncer, clock) = manual_debouncer(1.0);
    let names: Vec<String> = (0..64).map(|i| format!("/w/{i}.rs")).collect();

    for cycle in 0..5 {
        thread::scope(|s| {
            for chunk in names.chunks(16) {
                let debouncer = &debouncer;
                s.spawn(move || {
                    for name in chunk {
                        debouncer.record(name.as_str());
                    }
                });
            }
        });

        assert!(debouncer.drain_ready().is_empty(), "cycle {cycle}: drained too early");
        clock.advance(Duration::from_secs(1));

        let drained = debouncer.drain_ready();
        assert_eq!(drained.len(), names.len(), "cycle {cycle}");
        assert!(debouncer.is_empty());
    }
    Ok(())
}
