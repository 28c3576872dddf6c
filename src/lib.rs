//! Adaptive periodic process running on a small cooperative event loop.
//!
//! `looprun` provides two pieces that together turn a boolean-returning
//! closure into a self-pacing worker:
//!
//! - An [`EventLoop`]: a single-threaded, timer-driven loop with periodic and
//!   one-shot callbacks, a blocking [`run`](EventLoop::run) call, and a
//!   cloneable [`LoopHandle`] for stopping it. The loop can also be awaited
//!   on any async executor through [`drive`](EventLoop::drive).
//! - A [`ProcessRunner`]: invokes a caller-supplied process on a periodic
//!   timer, re-invoking it immediately for as long as it reports more work,
//!   and waiting one interval when it does not. An optional wall-clock time
//!   limit ends the run.
//!
//! The typical workload is draining a queue: the process pops an item and
//! returns whether it got one. Backlogs drain at full speed within a single
//! tick; an empty queue is probed once per interval with no busy-polling.
//!
//! Timing wakeups are armed on a shared thread pool and delivered through
//! standard `Waker`s, so no specific async runtime is required or assumed.

pub mod event_loop;
pub mod runner;
mod timer;

pub use event_loop::{Drive, EventLoop, LoopHandle};
pub use runner::ProcessRunner;
