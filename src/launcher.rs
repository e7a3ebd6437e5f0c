//! Provides the [`Launcher`] for scheduling asynchronous work on a bound
//! thread pool.
//!
//! A `Launcher` starts out unbound; [`Launcher::bind`] attaches the scheduling
//! context exactly once. Every unit of work submitted afterwards is tracked in
//! a live-task set for the duration of its execution, so the set reflects the
//! currently running tasks at any instant. Tracking exists for introspection
//! and tests, never for control flow.
//!
//! Failures inside submitted work stay inside that task. Only [`Launcher::run`]
//! callers observe an outcome, because they await it directly.

use std::{
    collections::HashSet,
    fmt, io,
    sync::{
        Arc, Mutex, OnceLock,
        atomic::{AtomicU64, Ordering},
    },
};

use futures::{FutureExt, executor::ThreadPool};

/// Errors produced while binding or using the scheduling context.
#[derive(Debug)]
pub enum ExecutorError {
    /// Work was submitted before a scheduling context was bound.
    NotInitialized,

    /// A scheduling context was already bound by an earlier `init` call.
    AlreadyInitialized,

    /// The default thread pool could not be created.
    PoolCreation(io::Error),
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorError::NotInitialized => {
                write!(f, "No scheduling context bound, call init() first")
            }
            ExecutorError::AlreadyInitialized => {
                write!(f, "A scheduling context is already bound")
            }
            ExecutorError::PoolCreation(e) => {
                write!(f, "Failed to create the default thread pool: {e}")
            }
        }
    }
}

impl std::error::Error for ExecutorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecutorError::PoolCreation(e) => Some(e),
            _ => None,
        }
    }
}

/// Identifies one submitted task for the duration of its execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

type LiveSet = Arc<Mutex<HashSet<TaskId>>>;

// Removes the task from the live set when the task future completes or is
// dropped, panicking included: the removal rides on `Drop`.
struct LiveGuard {
    id: TaskId,
    live: LiveSet,
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        if let Ok(mut live) = self.live.lock() {
            live.remove(&self.id);
        }
    }
}

/// A handle to a task accepted by [`Launcher::submit`].
///
/// The handle carries no result; it only allows asking whether the task is
/// still in flight.
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    live: LiveSet,
}

impl TaskHandle {
    /// The id the task is tracked under while it runs.
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Whether the task has left the live set.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        !self.live.lock().unwrap().contains(&self.id)
    }
}

struct LauncherInner {
    pool: OnceLock<ThreadPool>,
    live: LiveSet,
    next_id: AtomicU64,
}

/// Schedules asynchronous work on the bound thread pool and tracks it while
/// it runs.
///
/// Cloning a `Launcher` is cheap; every clone shares the same scheduling
/// context and live-task set.
#[derive(Clone)]
pub struct Launcher {
    inner: Arc<LauncherInner>,
}

impl Launcher {
    /// Creates an unbound launcher. Submissions fail with
    /// [`ExecutorError::NotInitialized`] until [`bind`](Self::bind) is called.
    #[must_use]
    pub fn new() -> Self {
        Launcher {
            inner: Arc::new(LauncherInner {
                pool: OnceLock::new(),
                live: Arc::new(Mutex::new(HashSet::with_capacity(8))),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Binds the scheduling context. May be called at most once per launcher.
    ///
    /// # Errors
    ///
    /// - `ExecutorError::AlreadyInitialized`: a context was bound earlier.
    pub fn bind(&self, pool: ThreadPool) -> Result<(), ExecutorError> {
        self.inner
            .pool
            .set(pool)
            .map_err(|_| ExecutorError::AlreadyInitialized)?;
        tracing::debug!("scheduling context bound");
        Ok(())
    }

    fn pool(&self) -> Result<&ThreadPool, ExecutorError> {
        self.inner.pool.get().ok_or(ExecutorError::NotInitialized)
    }

    fn track(&self) -> LiveGuard {
        let id = TaskId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.live.lock().unwrap().insert(id);
        LiveGuard {
            id,
            live: Arc::clone(&self.inner.live),
        }
    }

    /// Schedules `future` for concurrent execution and returns immediately.
    ///
    /// The task is entered into the live set before this method returns and
    /// leaves it when the task finishes, however it finishes. Its outcome is
    /// not retained anywhere.
    ///
    /// # Errors
    ///
    /// - `ExecutorError::NotInitialized`: no scheduling context is bound yet.
    pub fn submit<F>(&self, future: F) -> Result<TaskHandle, ExecutorError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let pool = self.pool()?;
        let guard = self.track();
        let handle = TaskHandle {
            id: guard.id,
            live: Arc::clone(&self.inner.live),
        };
        tracing::trace!(id = handle.id().0, "task submitted");
        pool.spawn_ok(async move {
            let _guard = guard;
            future.await;
        });
        Ok(handle)
    }

    /// Schedules `future` and suspends the caller until it completes,
    /// returning its output.
    ///
    /// The task is tracked in the live set exactly like a
    /// [`submit`](Self::submit)-ted one. A panic inside `future` resurfaces
    /// in the caller.
    ///
    /// # Errors
    ///
    /// - `ExecutorError::NotInitialized`: no scheduling context is bound yet.
    pub async fn run<F>(&self, future: F) -> Result<F::Output, ExecutorError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let pool = self.pool()?;
        let guard = self.track();
        let (remote, handle) = async move {
            let _guard = guard;
            future.await
        }
        .remote_handle();
        pool.spawn_ok(remote);
        Ok(handle.await)
    }

    /// The number of tasks currently in flight.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.inner.live.lock().unwrap().len()
    }
}

impl Default for Launcher {
    fn default() -> Self {
        Self::new()
    }
}
