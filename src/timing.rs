//! Executor-agnostic timing utilities.
//!
//! [`Delay`] defers polling of an inner future until a duration has elapsed,
//! waking the task from a small dedicated timer pool. [`sleep`] is a `Delay`
//! over an already-ready future and is the suspension point of the serial
//! queue's drain loop. Neither depends on any particular async runtime.

use std::{
    pin::Pin,
    sync::OnceLock,
    time::{Duration, Instant},
};

use futures::executor::{ThreadPool, ThreadPoolBuilder};
use pin_project_lite::pin_project;

static TIMER_POOL: OnceLock<ThreadPool> = OnceLock::new();

fn timer_pool() -> &'static ThreadPool {
    TIMER_POOL.get_or_init(|| {
        ThreadPoolBuilder::new()
            .pool_size(4)
            .name_prefix("eventron-timer-")
            .create()
            .expect("Timer pool creation failed")
    })
}

pin_project! {
    /// A future that begins polling its inner future only after a delay.
    ///
    /// The countdown starts at the first poll, not at construction. Once the
    /// delay has passed, every poll is delegated to the inner future.
    #[must_use = "futures do nothing unless polled or .awaited"]
    pub struct Delay<F> {
        #[pin]
        future: F,
        due: Instant,
        scheduled: bool,
    }
}

impl<F> Delay<F> {
    /// Wraps `future` so it is not polled until `delay` has elapsed.
    pub fn new(future: F, delay: Duration) -> Self {
        Delay {
            future,
            due: Instant::now() + delay,
            scheduled: false,
        }
    }

    /// Consumes the `Delay` and returns the inner future.
    pub fn inner(self) -> F {
        self.future
    }
}

impl<F> Future for Delay<F>
where
    F: Future,
{
    type Output = F::Output;

    fn poll(
        self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Self::Output> {
        let this = self.project();
        if Instant::now() < *this.due {
            if !*this.scheduled {
                *this.scheduled = true;
                let waker = cx.waker().clone();
                let due = *this.due;
                timer_pool().spawn_ok(async move {
                    let now = Instant::now();
                    if due > now {
                        std::thread::sleep(due - now);
                    }
                    waker.wake_by_ref();
                });
            }
            return std::task::Poll::Pending;
        }
        this.future.poll(cx)
    }
}

/// Suspends for `duration` without depending on a runtime timer.
pub fn sleep(duration: Duration) -> Delay<futures::future::Ready<()>> {
    Delay::new(futures::future::ready(()), duration)
}
