//! The serial task queue: an unbounded FIFO drained by a single perpetual
//! loop.
//!
//! Items are *launched* strictly in the order they were enqueued, with at
//! least the item's delay between successive launches. Launching is
//! fire-and-forget, so a slow item still overlaps the ones launched after it;
//! only the spacing between launches is serialized.
//!
//! Every enqueued item comes with a [`QueueTicket`]. Cancelling a ticket
//! before the item reaches the head of the queue prevents it from ever being
//! launched; the drain loop skips cancelled items without waiting out their
//! delay. Cancellation never affects work that was already launched, and it
//! never disturbs the drain loop itself.

use std::{
    pin::Pin,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU8, Ordering},
    },
    time::Duration,
};

use futures::{
    StreamExt,
    channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded},
};

use crate::{
    launcher::{ExecutorError, Launcher, TaskHandle},
    timing::sleep,
};

const PENDING: u8 = 0;
const LAUNCHED: u8 = 1;
const CANCELED: u8 = 2;

type QueuedWork = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

struct QueuedTask {
    work: QueuedWork,
    delay: Duration,
    state: Arc<AtomicU8>,
}

/// Controls one enqueued item.
///
/// Obtained from [`SerialQueue::enqueue`] or [`SerialQueue::enqueue_after`].
/// Dropping the ticket leaves the item queued.
pub struct QueueTicket {
    state: Arc<AtomicU8>,
}

impl QueueTicket {
    /// Cancels the item if it has not been launched yet.
    ///
    /// Returns `true` when the item was still pending; the drain loop will
    /// skip it without applying its delay. Returns `false` when the item was
    /// already launched, in which case the running work is unaffected.
    pub fn cancel(&self) -> bool {
        self.state
            .compare_exchange(PENDING, CANCELED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Whether the item was cancelled before launch.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELED
    }

    /// Whether the drain loop has launched the item.
    #[must_use]
    pub fn is_launched(&self) -> bool {
        self.state.load(Ordering::Acquire) == LAUNCHED
    }
}

/// An unbounded FIFO of delayed work, drained one item at a time.
///
/// Enqueuing never suspends. Nothing is launched until the drain loop is
/// started via [`SerialQueue::start`]; items enqueued earlier are buffered
/// and launched afterwards in order.
pub struct SerialQueue {
    tx: UnboundedSender<QueuedTask>,
    rx: Mutex<Option<UnboundedReceiver<QueuedTask>>>,
}

impl SerialQueue {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        SerialQueue {
            tx,
            rx: Mutex::new(Some(rx)),
        }
    }

    /// Appends `work` to the queue with no post-launch delay.
    pub fn enqueue<F>(&self, work: F) -> QueueTicket
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.enqueue_after(work, Duration::ZERO)
    }

    /// Appends `work` to the queue.
    ///
    /// After launching this item the drain loop waits out `delay` before it
    /// even looks at the next item, enforcing minimum spacing between
    /// launches.
    pub fn enqueue_after<F>(&self, work: F, delay: Duration) -> QueueTicket
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let state = Arc::new(AtomicU8::new(PENDING));
        let task = QueuedTask {
            work: Box::pin(work),
            delay,
            state: Arc::clone(&state),
        };
        // The receiver lives for the queue's lifetime, so this cannot fail.
        let _ = self.tx.unbounded_send(task);
        QueueTicket { state }
    }

    /// Starts the drain loop as a single tracked task on `launcher`.
    ///
    /// Called once during executor initialization. A second call finds the
    /// receiver already taken and reports `AlreadyInitialized`.
    ///
    /// # Errors
    ///
    /// - `ExecutorError::NotInitialized`: the launcher has no context bound.
    /// - `ExecutorError::AlreadyInitialized`: the loop is already running.
    pub(crate) fn start(&self, launcher: &Launcher) -> Result<TaskHandle, ExecutorError> {
        let rx = self
            .rx
            .lock()
            .unwrap()
            .take()
            .ok_or(ExecutorError::AlreadyInitialized)?;
        tracing::debug!("serial queue drain loop starting");
        launcher.submit(Self::drain(rx, launcher.clone()))
    }

    // Runs forever: the sender half is owned by the queue, so `next()` only
    // resolves with items, never with end-of-stream, until the whole executor
    // is dropped.
    async fn drain(mut rx: UnboundedReceiver<QueuedTask>, launcher: Launcher) {
        while let Some(item) = rx.next().await {
            if item
                .state
                .compare_exchange(PENDING, LAUNCHED, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                // Cancelled while queued: skip it, and skip its delay too.
                tracing::trace!("skipping cancelled queue item");
                continue;
            }
            tracing::trace!(delay_ms = item.delay.as_millis() as u64, "queue item launched");
            // Fire and forget; the item's failure stays inside its own task.
            let _ = launcher.submit(item.work);
            sleep(item.delay).await;
        }
    }
}

impl Default for SerialQueue {
    fn default() -> Self {
        Self::new()
    }
}
