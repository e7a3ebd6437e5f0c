//! The [`Executor`] context object tying the launcher, the serial queue, and
//! the dispatcher together.
//!
//! A host application constructs one `Executor` per process, calls
//! [`Executor::init`] exactly once to bind a scheduling context and start the
//! queue's drain loop, and then uses the executor as its single entry point
//! for submitting work, enqueuing delayed work, and publishing events.
//!
//! Subscription and channel management only touch data structures and are
//! valid before `init`; anything that actually launches work reports
//! [`ExecutorError::NotInitialized`] until a context is bound.

use std::time::Duration;

use futures::executor::ThreadPool;

use crate::{
    dispatcher::{DEFAULT_CHANNEL, Dispatcher},
    launcher::{ExecutorError, Launcher, TaskHandle},
    listener::{Listener, ListenerId},
    queue::{QueueTicket, SerialQueue},
    topic::Topic,
};

/// The task executor and event dispatcher for one process.
///
/// `D` is the payload type published on this executor's channels.
///
/// # Example
///
/// ```no_run
/// use eventron::Executor;
///
/// # async fn demo() -> Result<(), eventron::ExecutorError> {
/// let executor: Executor<&str> = Executor::new();
/// executor.init(None)?;
///
/// executor.on(&["Message".into(), "Test".into()], |data| async move {
///     println!("got: {data}");
/// });
/// executor.publish("hello", &["Message".into(), "Test".into()])?;
/// # Ok(())
/// # }
/// ```
pub struct Executor<D> {
    launcher: Launcher,
    queue: SerialQueue,
    dispatcher: Dispatcher<D>,
}

impl<D> Executor<D>
where
    D: Clone + Send + Sync + 'static,
{
    /// Creates an executor with no scheduling context bound.
    #[must_use]
    pub fn new() -> Self {
        Executor {
            launcher: Launcher::new(),
            queue: SerialQueue::new(),
            dispatcher: Dispatcher::new(),
        }
    }

    /// Binds the scheduling context and starts the queue drain loop.
    ///
    /// With `None` a fresh thread pool is created. The bound pool is returned
    /// either way so the host can hold on to it.
    ///
    /// # Errors
    ///
    /// - `ExecutorError::AlreadyInitialized`: `init` was called before.
    /// - `ExecutorError::PoolCreation`: the default pool could not be built.
    pub fn init(&self, pool: Option<ThreadPool>) -> Result<ThreadPool, ExecutorError> {
        let pool = match pool {
            Some(pool) => pool,
            None => ThreadPool::new().map_err(ExecutorError::PoolCreation)?,
        };
        self.launcher.bind(pool.clone())?;
        self.queue.start(&self.launcher)?;
        tracing::debug!("executor initialized");
        Ok(pool)
    }

    /// Schedules `future` for concurrent execution without awaiting it.
    ///
    /// # Errors
    ///
    /// - `ExecutorError::NotInitialized`: [`init`](Self::init) has not run.
    pub fn submit<F>(&self, future: F) -> Result<TaskHandle, ExecutorError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.launcher.submit(future)
    }

    /// Schedules `future` and awaits its result.
    ///
    /// # Errors
    ///
    /// - `ExecutorError::NotInitialized`: [`init`](Self::init) has not run.
    pub async fn run<F>(&self, future: F) -> Result<F::Output, ExecutorError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.launcher.run(future).await
    }

    /// Appends `work` to the serial queue with no post-launch delay.
    pub fn enqueue<F>(&self, work: F) -> QueueTicket
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.queue.enqueue(work)
    }

    /// Appends `work` to the serial queue; after launching it the drain loop
    /// waits out `delay` before looking at the next item.
    pub fn enqueue_after<F>(&self, work: F, delay: Duration) -> QueueTicket
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.queue.enqueue_after(work, delay)
    }

    /// Ensures a channel exists. Idempotent.
    pub fn create_channel(&self, channel: &str) {
        self.dispatcher.create_channel(channel);
    }

    /// Registers `listener` under `path` on the `"Default"` channel.
    pub fn subscribe(&self, listener: Listener<D>, path: &[Topic]) -> ListenerId {
        self.dispatcher.subscribe(listener, path)
    }

    /// Registers `listener` under `path` on the named channel.
    pub fn subscribe_on(&self, listener: Listener<D>, path: &[Topic], channel: &str) -> ListenerId {
        self.dispatcher.subscribe_on(listener, path, channel)
    }

    /// Registers a payload-only callback under `path` on the `"Default"`
    /// channel.
    pub fn on<F, Fut>(&self, path: &[Topic], f: F) -> ListenerId
    where
        F: Fn(D) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.dispatcher.on(path, f)
    }

    /// Removes listeners under `path` on the `"Default"` channel; see
    /// [`Dispatcher::unsubscribe_on`].
    pub fn unsubscribe(&self, path: &[Topic], id: Option<ListenerId>) -> bool {
        self.dispatcher.unsubscribe(path, id)
    }

    /// Removes listeners under `path` on the named channel.
    pub fn unsubscribe_on(&self, path: &[Topic], id: Option<ListenerId>, channel: &str) -> bool {
        self.dispatcher.unsubscribe_on(path, id, channel)
    }

    /// Publishes `data` under `path` on the `"Default"` channel with
    /// recursive matching.
    ///
    /// # Errors
    ///
    /// - `ExecutorError::NotInitialized`: a listener matched before `init`.
    pub fn publish(&self, data: D, path: &[Topic]) -> Result<(), ExecutorError> {
        self.dispatcher.publish(&self.launcher, data, path)
    }

    /// Publishes `data` under `path` on the named channel with recursive
    /// matching.
    ///
    /// # Errors
    ///
    /// - `ExecutorError::NotInitialized`: a listener matched before `init`.
    pub fn publish_on(&self, data: D, path: &[Topic], channel: &str) -> Result<(), ExecutorError> {
        self.dispatcher.publish_on(&self.launcher, data, path, channel)
    }

    /// Publishes with full control over matching mode and channel; see
    /// [`Dispatcher::dispatch`].
    ///
    /// # Errors
    ///
    /// - `ExecutorError::NotInitialized`: a listener matched before `init`.
    pub fn dispatch(
        &self,
        data: D,
        path: &[Topic],
        recursive: bool,
        channel: &str,
    ) -> Result<(), ExecutorError> {
        self.dispatcher
            .dispatch(&self.launcher, data, path, recursive, channel)
    }

    /// The task launcher backing this executor.
    #[must_use]
    pub fn launcher(&self) -> &Launcher {
        &self.launcher
    }

    /// The serial queue backing this executor.
    #[must_use]
    pub fn queue(&self) -> &SerialQueue {
        &self.queue
    }

    /// The dispatcher backing this executor.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher<D> {
        &self.dispatcher
    }

    /// The name of the implicit channel.
    #[must_use]
    pub fn default_channel() -> &'static str {
        DEFAULT_CHANNEL
    }
}

impl<D> Default for Executor<D>
where
    D: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
