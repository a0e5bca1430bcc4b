#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use hookgate_store::CircuitBreaker;
use std::path::Path;
use std::thread;
use tempfile::TempDir;

fn breaker_at(root: &Path) -> CircuitBreaker {
    CircuitBreaker::new(root.join(".claude/hooks.disabled"), root.join(".claude/session"))
}

#[test]
fn test_concurrent_errors_are_all_counted() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().to_path_buf();

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let root = root.clone();
            thread::spawn(move || breaker_at(&root).with_threshold(100).record_error("s1").unwrap())
        })
        .collect();

    for handle in handles {
        assert!(!handle.join().unwrap());
    }
    assert_eq!(breaker_at(&root).error_count("s1").unwrap(), 12);
}

#[test]
fn test_trip_is_visible_to_a_fresh_instance() {
    let temp = TempDir::new().unwrap();
    let first = breaker_at(temp.path());

    for _ in 0..3 {
        if first.record_error("s1").unwrap() {
            first.trip().unwrap();
        }
    }

    let second = breaker_at(temp.path());
    assert!(second.is_tripped());
    assert_eq!(
        std::fs::read_to_string(second.sentinel_path()).unwrap(),
        "tripped\n"
    );
}

#[test]
fn test_invalid_session_key_is_rejected() {
    let temp = TempDir::new().unwrap();
    assert!(breaker_at(temp.path()).record_error("../../x").is_err());
}
