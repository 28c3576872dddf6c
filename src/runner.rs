//! Adaptive periodic execution of a caller-supplied process.
//!
//! [`ProcessRunner`] repeatedly invokes a boolean-returning closure on an
//! [`EventLoop`] timer. A `true` return means "that did something, there may
//! be more" and triggers an immediate re-invocation within the same tick; a
//! `false` return ends the tick and the runner waits one interval before
//! trying again. An optional wall-clock time limit bounds the whole run.
//!
//! The intended workload is queue draining: the process pops one item and
//! returns whether it got one. A backlog is then consumed back-to-back at
//! full speed, while an empty queue is only probed once per interval.

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use crate::event_loop::EventLoop;

type Process = Box<dyn FnMut() -> bool + Send>;

// Wall-clock accounting for a single run, in whole seconds.
//
// `elapsed` is only recomputed after a process invocation, never on read, so
// reading it between invocations is idempotent. With no limit configured
// there is nothing to exceed and the run is unbounded.
struct TimeBudget {
    started: Instant,
    elapsed: u64,
    limit: Option<u64>,
}

impl TimeBudget {
    fn unbounded() -> Self {
        TimeBudget {
            started: Instant::now(),
            elapsed: 0,
            limit: None,
        }
    }

    fn restart(&mut self) {
        self.started = Instant::now();
        self.elapsed = 0;
    }

    fn touch(&mut self) {
        self.elapsed = self.started.elapsed().as_secs();
    }

    fn exceeded(&self) -> bool {
        match self.limit {
            Some(limit) => self.elapsed >= limit,
            None => false,
        }
    }

    fn within(&self) -> bool {
        !self.exceeded()
    }
}

// Shared between the runner and the timer callback it registers.
struct Shared {
    process: Process,
    budget: TimeBudget,
}

/// Runs a process on a periodic timer, draining adaptively, until an optional
/// time limit expires.
///
/// The runner consumes an [`EventLoop`] at construction and registers one
/// periodic timer per [`run`](ProcessRunner::run) call. While the process
/// keeps returning `true` and the time limit is not exceeded, it is
/// re-invoked immediately within the same tick; this intentionally ignores
/// the interval in favor of throughput, and a process that never returns
/// `false` will starve any other timers on the loop. Once the limit is
/// exceeded the runner stops the loop and `run` returns.
///
/// Configuration is not validated: a zero interval ticks as fast as the loop
/// allows, and a zero time limit expires after the first invocation.
///
/// The runner is reusable; each `run` call restarts the clock.
///
/// # Example
/// ```
/// use looprun::{EventLoop, ProcessRunner};
///
/// let mut queue: Vec<u32> = (0..3).collect();
/// let mut runner = ProcessRunner::new(EventLoop::new(), move || queue.pop().is_some());
///
/// runner.set_interval(0).set_time_limit(0);
/// runner.run();
/// ```
pub struct ProcessRunner {
    event_loop: EventLoop,
    shared: Arc<Mutex<Shared>>,
    interval: u64,
}

impl ProcessRunner {
    /// Creates a runner for `process` on the given loop.
    ///
    /// `process` returns `true` to be invoked again immediately and `false`
    /// to wait one interval. The interval defaults to 1 second and no time
    /// limit is set.
    pub fn new(event_loop: EventLoop, process: impl FnMut() -> bool + Send + 'static) -> Self {
        ProcessRunner {
            event_loop,
            shared: Arc::new(Mutex::new(Shared {
                process: Box::new(process),
                budget: TimeBudget::unbounded(),
            })),
            interval: 1,
        }
    }

    /// Replaces the process.
    ///
    /// Takes effect at the next invocation; an already-running invocation is
    /// unaffected.
    pub fn set_process(&mut self, process: impl FnMut() -> bool + Send + 'static) -> &mut Self {
        self.shared.lock().unwrap().process = Box::new(process);
        self
    }

    /// Sets the total wall-clock time limit, in seconds.
    ///
    /// The limit is checked against whole elapsed seconds after every process
    /// invocation; it is not validated against time already elapsed.
    pub fn set_time_limit(&mut self, seconds: u64) -> &mut Self {
        self.shared.lock().unwrap().budget.limit = Some(seconds);
        self
    }

    /// Sets the interval, in seconds, between ticks when the process reports
    /// no further work.
    ///
    /// Applies when the periodic timer is next registered, i.e. at the next
    /// [`run`](ProcessRunner::run) call; it does not re-arm a timer already
    /// registered by a run in progress.
    pub fn set_interval(&mut self, seconds: u64) -> &mut Self {
        self.interval = seconds;
        self
    }

    /// Elapsed whole seconds of the current or most recent run.
    ///
    /// Recomputed only after process invocations, so repeated reads between
    /// invocations return the same value.
    #[must_use]
    pub fn elapsed(&self) -> u64 {
        self.shared.lock().unwrap().budget.elapsed
    }

    /// Runs the process until the time limit expires or the loop is stopped.
    ///
    /// Registers a periodic timer at the configured interval and blocks
    /// driving the loop. Each tick invokes the process at least once and
    /// keeps invoking it while it returns `true` and the time limit is not
    /// exceeded; once exceeded, the loop is stopped and this method returns.
    /// With no time limit set, the run only ends through a [`LoopHandle`]
    /// stop from elsewhere.
    ///
    /// A panic in the process propagates out of this method.
    ///
    /// [`LoopHandle`]: crate::LoopHandle
    pub fn run(&mut self) {
        self.shared.lock().unwrap().budget.restart();

        let shared = Arc::clone(&self.shared);
        let handle = self.event_loop.handle();
        self.event_loop
            .add_periodic_timer(Duration::from_secs(self.interval), move || {
                let mut shared = shared.lock().unwrap();
                loop {
                    let did_something = (shared.process)();
                    shared.budget.touch();
                    if !did_something || shared.budget.exceeded() {
                        break;
                    }
                }
                if shared.budget.exceeded() {
                    handle.stop();
                }
            });

        self.event_loop.run();
    }
}
