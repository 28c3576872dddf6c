use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use looprun::{EventLoop, ProcessRunner};

#[test]
fn zero_budget_runs_process_exactly_once() {
    let flag = Arc::new(AtomicUsize::new(0));
    let flag_cl = Arc::clone(&flag);
    let invocations = Arc::new(AtomicUsize::new(0));
    let invocations_cl = Arc::clone(&invocations);

    let mut runner = ProcessRunner::new(EventLoop::new(), move || {
        flag_cl.store(42, Ordering::Relaxed);
        invocations_cl.fetch_add(1, Ordering::Relaxed);
        true
    });

    // A zero limit is exceeded right after the first invocation, even though
    // the process keeps asking to go again.
    runner.set_time_limit(0).set_interval(0);
    runner.run();

    assert_eq!(flag.load(Ordering::Relaxed), 42, "Process should have run");
    assert_eq!(invocations.load(Ordering::Relaxed), 1);
}

#[test]
fn backlog_drains_within_a_single_tick() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let invocations_cl = Arc::clone(&invocations);

    let mut runner = ProcessRunner::new(EventLoop::new(), move || {
        // Report a 500-item backlog, then an empty queue.
        invocations_cl.fetch_add(1, Ordering::Relaxed) + 1 < 500
    });
    runner.set_interval(1).set_time_limit(2);

    let start = Instant::now();
    runner.run();
    let wall = start.elapsed();

    // One invocation per tick would need minutes; draining within a tick
    // finishes the backlog inside the two-second budget.
    assert!(
        invocations.load(Ordering::Relaxed) >= 500,
        "Backlog should drain without waiting for further ticks"
    );
    assert!(wall < Duration::from_secs(3), "Run should end at the limit");
}

#[test]
fn idle_process_waits_a_full_interval_per_tick() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let invocations_cl = Arc::clone(&invocations);

    let mut runner = ProcessRunner::new(EventLoop::new(), move || {
        invocations_cl.fetch_add(1, Ordering::Relaxed);
        false
    });
    runner.set_interval(1).set_time_limit(1);

    let start = Instant::now();
    runner.run();

    assert_eq!(
        invocations.load(Ordering::Relaxed),
        1,
        "An idle process should be invoked once per tick"
    );
    assert!(
        start.elapsed() >= Duration::from_secs(1),
        "The first tick should come one interval after run()"
    );
}

#[test]
fn set_process_replaces_the_constructor_process() {
    let original = Arc::new(AtomicUsize::new(0));
    let original_cl = Arc::clone(&original);
    let replacement = Arc::new(AtomicUsize::new(0));
    let replacement_cl = Arc::clone(&replacement);

    let mut runner = ProcessRunner::new(EventLoop::new(), move || {
        original_cl.fetch_add(1, Ordering::Relaxed);
        false
    });
    runner
        .set_process(move || {
            replacement_cl.fetch_add(1, Ordering::Relaxed);
            false
        })
        .set_time_limit(0)
        .set_interval(0);
    runner.run();

    assert_eq!(
        original.load(Ordering::Relaxed),
        0,
        "The replaced process should never run"
    );
    assert_eq!(replacement.load(Ordering::Relaxed), 1);
}

#[test]
fn runner_is_reusable_across_runs() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let invocations_cl = Arc::clone(&invocations);

    let mut runner = ProcessRunner::new(EventLoop::new(), move || {
        invocations_cl.fetch_add(1, Ordering::Relaxed);
        false
    });
    runner.set_time_limit(0).set_interval(0);

    runner.run();
    runner.run();

    assert_eq!(
        invocations.load(Ordering::Relaxed),
        2,
        "Each run should register a fresh tick and restart the clock"
    );
}

#[test]
fn unbounded_run_stops_only_through_the_loop_handle() {
    let event_loop = EventLoop::new();
    let handle = event_loop.handle();

    let invocations = Arc::new(AtomicUsize::new(0));
    let invocations_cl = Arc::clone(&invocations);
    let mut runner = ProcessRunner::new(event_loop, move || {
        if invocations_cl.fetch_add(1, Ordering::Relaxed) + 1 == 3 {
            handle.stop();
            return false;
        }
        true
    });

    // No time limit: without the external stop this would never return.
    runner.set_interval(0);
    runner.run();

    assert_eq!(invocations.load(Ordering::Relaxed), 3);
}

#[test]
fn elapsed_is_stable_between_invocations() {
    let mut runner = ProcessRunner::new(EventLoop::new(), || false);
    runner.set_time_limit(0).set_interval(0);
    runner.run();

    let first = runner.elapsed();
    let second = runner.elapsed();

    assert_eq!(first, second, "Reading elapsed must not recompute it");
    assert_eq!(first, 0, "A zero-budget run ends within the first second");
}
