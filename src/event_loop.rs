//! A minimal single-threaded event loop built around wall-clock timers.
//!
//! [`EventLoop`] owns a set of registered timer callbacks and dispatches them
//! from whatever thread drives it. [`EventLoop::run`] blocks the caller until
//! the loop is stopped or runs out of timers; [`EventLoop::drive`] exposes the
//! same dispatch cycle as a plain future so the loop can be awaited on any
//! executor instead.
//!
//! Stopping is cooperative: a cloneable [`LoopHandle`] flips a shared flag,
//! which the dispatch cycle checks before firing each callback. Callbacks run
//! strictly sequentially on the driving thread; there is no internal
//! concurrency.

use std::{
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use futures::executor::block_on;
use pin_project_lite::pin_project;

use crate::timer::Sleep;

// A registered callback. `repeat` is the rescheduling interval for periodic
// timers and `None` for one-shot timers, which are dropped after firing.
struct Timer {
    next_fire: Instant,
    repeat: Option<Duration>,
    callback: Box<dyn FnMut() + Send>,
}

/// Stops an [`EventLoop`] from outside its dispatch cycle.
///
/// Handles are cheap to clone and may be moved into timer callbacks or held
/// by other threads. Stopping is idempotent; once the flag is set the loop
/// fires no further callbacks and its drive call returns.
#[derive(Clone)]
pub struct LoopHandle {
    stopped: Arc<AtomicBool>,
}

impl LoopHandle {
    /// Requests that the loop stop.
    ///
    /// Takes effect before the next callback dispatch; a callback that is
    /// already executing runs to completion.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    /// Returns `true` if a stop has been requested and not yet cleared.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}

/// A cooperative timer-driven event loop.
///
/// Timers are registered up front, then the loop is either blocked on with
/// [`run`](EventLoop::run) or awaited through [`drive`](EventLoop::drive).
/// Periodic timers first fire one interval after registration and are
/// rescheduled relative to the completion of each firing. A zero interval
/// fires as fast as the driving executor can poll; the loop does not clamp
/// or validate intervals.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use looprun::EventLoop;
///
/// let mut event_loop = EventLoop::new();
/// let handle = event_loop.handle();
///
/// let mut remaining = 3u32;
/// event_loop.add_periodic_timer(Duration::from_millis(1), move || {
///     remaining -= 1;
///     if remaining == 0 {
///         handle.stop();
///     }
/// });
///
/// event_loop.run();
/// ```
pub struct EventLoop {
    timers: Vec<Timer>,
    stopped: Arc<AtomicBool>,
}

impl EventLoop {
    /// Creates an empty loop.
    #[must_use]
    pub fn new() -> Self {
        EventLoop {
            timers: Vec::new(),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns a [`LoopHandle`] for stopping this loop.
    ///
    /// Obtain the handle before handing the loop off to a component that
    /// consumes it, such as [`ProcessRunner`](crate::ProcessRunner).
    #[must_use]
    pub fn handle(&self) -> LoopHandle {
        LoopHandle {
            stopped: Arc::clone(&self.stopped),
        }
    }

    /// Registers a recurring callback fired every `interval`.
    ///
    /// The first firing happens one interval after registration. The callback
    /// runs on the thread driving the loop.
    pub fn add_periodic_timer(
        &mut self,
        interval: Duration,
        callback: impl FnMut() + Send + 'static,
    ) {
        self.timers.push(Timer {
            next_fire: Instant::now() + interval,
            repeat: Some(interval),
            callback: Box::new(callback),
        });
    }

    /// Registers a one-shot callback fired once after `delay`.
    pub fn add_timer(&mut self, delay: Duration, callback: impl FnMut() + Send + 'static) {
        self.timers.push(Timer {
            next_fire: Instant::now() + delay,
            repeat: None,
            callback: Box::new(callback),
        });
    }

    /// Requests that the loop stop; equivalent to [`LoopHandle::stop`].
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    /// Blocks the current thread, dispatching timers until the loop stops or
    /// no timers remain.
    ///
    /// On return all timer registrations are released and the stop flag is
    /// cleared, so the loop can be populated and run again.
    pub fn run(&mut self) {
        block_on(self.drive());
        self.timers.clear();
        self.stopped.store(false, Ordering::Relaxed);
    }

    /// Returns the dispatch cycle as a future, for driving the loop on an
    /// existing executor instead of blocking a thread.
    ///
    /// Resolves when the loop is stopped or has no timers left. Unlike
    /// [`run`](EventLoop::run), completing this future does not release
    /// registrations or clear the stop flag.
    pub fn drive(&mut self) -> Drive<'_> {
        Drive {
            event_loop: self,
            sleep: Sleep::new(),
        }
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

pin_project! {
    /// Future returned by [`EventLoop::drive`].
    #[must_use = "futures do nothing unless polled or .awaited"]
    pub struct Drive<'a> {
        event_loop: &'a mut EventLoop,
        #[pin]
        sleep: Sleep,
    }
}

impl Future for Drive<'_> {
    type Output = ();

    fn poll(
        self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Self::Output> {
        let mut this = self.project();
        loop {
            if this.event_loop.stopped.load(Ordering::Relaxed) {
                return std::task::Poll::Ready(());
            }

            // Fire everything that has come due. A callback may stop the
            // loop, in which case the remaining due timers are skipped.
            let now = Instant::now();
            let stopped = Arc::clone(&this.event_loop.stopped);
            this.event_loop.timers.retain_mut(|timer| {
                if stopped.load(Ordering::Relaxed) || now < timer.next_fire {
                    return true;
                }
                (timer.callback)();
                match timer.repeat {
                    Some(interval) => {
                        timer.next_fire = Instant::now() + interval;
                        true
                    }
                    None => false,
                }
            });

            if this.event_loop.stopped.load(Ordering::Relaxed) {
                return std::task::Poll::Ready(());
            }
            let Some(due) = this.event_loop.timers.iter().map(|t| t.next_fire).min() else {
                // Nothing left that could ever fire.
                return std::task::Poll::Ready(());
            };

            this.sleep.as_mut().reset(due);
            if this.sleep.as_mut().poll(cx).is_pending() {
                return std::task::Poll::Pending;
            }
            // The earliest timer is already due again; go around without
            // yielding. With a zero interval this dispatches back-to-back.
        }
    }
}
