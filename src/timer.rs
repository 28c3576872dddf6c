//! Wall-clock wakeups for the event loop.
//!
//! The loop never spins while waiting for a timer to come due. Instead it
//! polls a [`Sleep`] future, which parks a task on a shared thread pool until
//! the due time and then wakes the stored waker. This keeps the crate
//! independent of any particular async runtime: whatever executor polls the
//! loop gets woken through the ordinary `Waker` machinery.

use std::{
    pin::Pin,
    sync::OnceLock,
    time::Instant,
};

use futures::executor::{ThreadPool, ThreadPoolBuilder};

static THREAD_POOL: OnceLock<ThreadPool> = OnceLock::new();

/// A future that resolves once a wall-clock instant has passed.
///
/// Re-targetable: [`Sleep::reset`] moves the due time and disarms any pending
/// wakeup bookkeeping, so a single `Sleep` can be reused across event loop
/// iterations. A stale wakeup from a previous due time only causes a spurious
/// poll, which is harmless.
pub(crate) struct Sleep {
    due: Instant,
    // Whether a wakeup has been armed for the current `due`.
    armed: bool,
}

impl Sleep {
    pub(crate) fn new() -> Self {
        Sleep {
            due: Instant::now(),
            armed: false,
        }
    }

    /// Re-targets the sleep at a new due time.
    ///
    /// A no-op when the due time is unchanged, so polling in a loop does not
    /// spawn a fresh sleeper thread on every pass.
    pub(crate) fn reset(self: Pin<&mut Self>, due: Instant) {
        let this = self.get_mut();
        if this.due != due {
            this.due = due;
            this.armed = false;
        }
    }

    fn arm(&mut self, cx: &mut std::task::Context<'_>) {
        let pool = THREAD_POOL.get_or_init(|| {
            ThreadPoolBuilder::new()
                .pool_size(32)
                .create()
                .expect("Timer thread pool creation failed")
        });
        let waker = cx.waker().clone();
        let due = self.due;

        pool.spawn_ok(async move {
            std::thread::sleep(due.saturating_duration_since(Instant::now()));
            waker.wake_by_ref();
        });
        self.armed = true;
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(
        self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Self::Output> {
        let this = self.get_mut();
        if Instant::now() >= this.due {
            return std::task::Poll::Ready(());
        }
        if !this.armed {
            this.arm(cx);
        }
        std::task::Poll::Pending
    }
}
