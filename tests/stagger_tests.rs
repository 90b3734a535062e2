//! Integration tests for the staggered fan-out combinator
//!
//! Exercises the public API end to end against real timers.

use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio_test::assert_ok;

use stagger::{stagger_all, stagger_all_with};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[tokio::test]
async fn uppercase_walkthrough_staggers_starts_and_preserves_order() {
    init_tracing();

    let step = Duration::from_millis(60);
    let begun = Instant::now();
    let starts: Arc<Mutex<Vec<(usize, Duration)>>> = Arc::new(Mutex::new(Vec::new()));

    let recorded = Arc::clone(&starts);
    let result = stagger_all(
        vec!["Promise", "all", "step"],
        move |word, index| {
            let recorded = Arc::clone(&recorded);
            async move {
                recorded.lock().unwrap().push((index, begun.elapsed()));
                Ok::<_, Infallible>(word.to_uppercase())
            }
        },
        step,
    )
    .await;

    let words = assert_ok!(result);
    assert_eq!(words, ["PROMISE", "ALL", "STEP"]);
    assert!(
        begun.elapsed() >= step * 2,
        "the last unit cannot have started before 2 × step"
    );

    let starts = starts.lock().unwrap();
    assert_eq!(starts.len(), 3);
    for &(index, at) in starts.iter() {
        let earliest = step * index as u32;
        assert!(
            at >= earliest,
            "unit {index} started at {at:?}, expected no earlier than {earliest:?}"
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fan_out_keeps_results_aligned_with_input() {
    init_tracing();

    let items: Vec<usize> = (0..100).collect();
    let result = stagger_all(
        items.clone(),
        |item, _index| async move {
            // Deterministically uneven durations so completion order differs
            // from index order.
            tokio::time::sleep(Duration::from_millis(((item * 7) % 13) as u64)).await;
            Ok::<_, Infallible>(item * 2)
        },
        Duration::ZERO,
    )
    .await;

    let doubled = assert_ok!(result);
    let expected: Vec<usize> = items.iter().map(|item| item * 2).collect();
    assert_eq!(doubled, expected);
}

#[tokio::test]
async fn shared_context_reaches_every_unit() {
    let result = stagger_all_with(
        vec!["a", "b", "c"],
        |prefix: Arc<String>, word, index| async move {
            Ok::<_, Infallible>(format!("{prefix}/{word}/{index}"))
        },
        Duration::ZERO,
        Arc::new(String::from("ctx")),
    )
    .await;

    assert_eq!(assert_ok!(result), ["ctx/a/0", "ctx/b/1", "ctx/c/2"]);
}

#[tokio::test]
async fn early_failure_rejects_without_waiting_for_later_units() {
    init_tracing();

    let begun = Instant::now();
    let result = stagger_all(
        vec!["fail", "slow"],
        |word, _index| async move {
            if word == "fail" {
                Err("fail refused")
            } else {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok(word)
            }
        },
        Duration::from_millis(30),
    )
    .await;

    assert_eq!(result.unwrap_err(), "fail refused");
    assert!(
        begun.elapsed() < Duration::from_millis(400),
        "the aggregate must settle on the first failure, not the slow unit"
    );
}
