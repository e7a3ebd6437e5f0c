//! In-process task scheduling and hierarchical publish/subscribe dispatch.
//!
//! `eventron` lets independent components of a single-process application
//! register interest in nested topic paths and receive asynchronously
//! dispatched notifications, while also offering a concurrent task launcher
//! and a strictly ordered delayed task queue.
//!
//! The crate is designed around one explicit [`Executor`] context per
//! process:
//! - A [`Launcher`] that turns asynchronous work into tracked, fire-and-forget
//!   tasks on a bound thread pool
//! - A [`SerialQueue`] whose drain loop launches queued items in strict FIFO
//!   order with enforced minimum spacing between launches
//! - A [`Dispatcher`] routing published payloads through per-channel topic
//!   trees, with recursive or exact matching and three fixed listener shapes
//! - Executor-agnostic [`timing`] helpers used for queue spacing
//!
//! All state lives in memory; nothing is persisted across restarts, and
//! delivery never leaves the process.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use eventron::{Executor, Listener};
//!
//! # fn demo() -> Result<(), eventron::ExecutorError> {
//! let executor: Executor<i64> = Executor::new();
//! executor.init(None)?;
//!
//! // Fires for every publish on the Default channel.
//! executor.subscribe(
//!     Listener::with_topics(|topics, data| async move {
//!         println!("{topics:?} -> {data}");
//!     }),
//!     &[],
//! );
//!
//! // Fires only for publishes reaching Message/Test.
//! executor.on(&["Message".into(), "Test".into()], |data| async move {
//!     println!("message test: {data}");
//! });
//!
//! executor.publish(1, &["Message".into(), "Test".into()])?;
//!
//! // Launched at least three seconds after anything queued before it.
//! executor.enqueue_after(async { println!("spaced out"); }, Duration::from_secs(3));
//! # Ok(())
//! # }
//! ```

pub mod dispatcher;
pub mod executor;
pub mod launcher;
pub mod listener;
pub mod queue;
pub mod timing;
pub mod topic;

pub use dispatcher::{DEFAULT_CHANNEL, Dispatcher};
pub use executor::Executor;
pub use launcher::{ExecutorError, Launcher, TaskHandle, TaskId};
pub use listener::{Listener, ListenerId, TopicPath};
pub use queue::{QueueTicket, SerialQueue};
pub use topic::Topic;
