// tests/debouncer_timing.rs

mod common;
use crate::common::{manual_debouncer, paths, TestResult};

use std::path::{Path, PathBuf};
use std::time::Duration;

use watchfix::watch::Debouncer;

#[test]
fn not_ready_before_window_ready_at_window_then_gone() -> TestResult {
    let (debouncer, clock) = manual_debouncer(2.0);
    debouncer.record("/w/a.py");

    clock.set_elapsed(Duration::from_millis(1999));
    assert!(debouncer.drain_ready().is_empty());
    assert!(debouncer.contains(Path::new("/w/a.py")));

    clock.set_elapsed(Duration::from_secs(2));
    assert_eq!(paths(debouncer.drain_ready()), paths(["/w/a.py"]));

    clock.set_elapsed(Duration::from_secs(10));
    assert!(debouncer.drain_ready().is_empty());
    assert!(debouncer.is_empty());
    Ok(())
}

#[test]
fn re_recording_re_arms_the_window() -> TestResult {
    let (debouncer, clock) = manual_debouncer(2.0);
    debouncer.record("/w/a.py");

    clock.set_elapsed_secs(1.5);
    debouncer.record("/w/a.py");
    assert_eq!(debouncer.pending_len(), 1);

    // 2.0s after the first record, only 0.5s after the second.
    clock.set_elapsed_secs(2.0);
    assert!(debouncer.drain_ready().is_empty());

    clock.set_elapsed_secs(3.5);
    assert_eq!(paths(debouncer.drain_ready()), paths(["/w/a.py"]));
    Ok(())
}

#[test]
fn drained_path_returns_only_after_new_record() -> TestResult {
    let (debouncer, clock) = manual_debouncer(1.0);
    debouncer.record("/w/a.py");

    clock.set_elapsed_secs(1.0);
    assert_eq!(debouncer.drain_ready().len(), 1);

    clock.set_elapsed_secs(5.0);
    assert!(debouncer.drain_ready().is_empty());

    debouncer.record("/w/a.py");
    clock.set_elapsed_secs(5.5);
    assert!(debouncer.drain_ready().is_empty());
    clock.set_elapsed_secs(6.0);
    assert_eq!(paths(debouncer.drain_ready()), paths(["/w/a.py"]));
    Ok(())
}

#[test]
fn drain_of_empty_or_unsettled_table_changes_nothing() -> TestResult {
    let (debouncer, clock) = manual_debouncer(2.0);
    assert!(debouncer.drain_ready().is_empty());
    assert!(debouncer.drain_ready().is_empty());

    debouncer.record("/w/a.py");
    clock.set_elapsed_secs(0.5);
    debouncer.record("/w/b.py");
    clock.set_elapsed_secs(1.0);

    for _ in 0..3 {
        assert!(debouncer.drain_ready().is_empty());
        assert_eq!(debouncer.pending_len(), 2);
    }
    Ok(())
}

#[test]
fn two_paths_settle_in_recording_order() -> TestResult {
    let (debouncer, clock) = manual_debouncer(2.0);

    debouncer.record("a");
    // The second record lands just after t=0.1, as it does in real time.
    clock.set_elapsed(Duration::from_millis(101));
    debouncer.record("b");

    clock.set_elapsed_secs(1.0);
    assert!(debouncer.drain_ready().is_empty());

    clock.set_elapsed_secs(2.1);
    assert_eq!(debouncer.drain_ready().into_iter().collect::<Vec<_>>(), vec![PathBuf::from("a")]);

    clock.set_elapsed_secs(2.2);
    assert_eq!(debouncer.drain_ready().into_iter().collect::<Vec<_>>(), vec![PathBuf::from("b")]);

    assert!(debouncer.is_empty());
    Ok(())
}

#[test]
fn zero_window_drains_on_next_poll() -> TestResult {
    let (debouncer, _clock) = manual_debouncer(0.0);
    debouncer.record("/w/a.py");
    assert_eq!(debouncer.drain_ready().len(), 1);
    Ok(())
}

#[test]
fn default_debouncer_uses_two_second_window() {
    let debouncer = Debouncer::default();
    assert_eq!(debouncer.settle_window(), Duration::from_secs(2));
}
