//! Listener shapes and registration tokens for the dispatcher.
//!
//! Instead of inspecting callbacks at dispatch time, the shape of a listener
//! is fixed when it is registered. Exactly three shapes exist: one taking no
//! arguments, one taking the published payload, and one taking the published
//! path together with the payload. Anything else is unrepresentable.

use std::{pin::Pin, sync::Arc};

use crate::topic::Topic;

/// The boxed future produced by one listener invocation.
pub type ListenerFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// The full path a notification was published under, shared across every
/// listener matched by that publish.
pub type TopicPath = Arc<[Topic]>;

/// Identifies one registration within a dispatcher.
///
/// Returned by `subscribe` and used to remove exactly that listener again.
/// Ids are unique per dispatcher for the lifetime of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// An asynchronous callback registered on a topic node, tagged with the
/// arguments it expects.
///
/// Construct one with [`Listener::no_args`], [`Listener::data`], or
/// [`Listener::with_topics`]. The payload type `D` is fixed by the dispatcher
/// the listener is registered on.
pub enum Listener<D> {
    /// Invoked with no arguments.
    NoArgs(Arc<dyn Fn() -> ListenerFuture + Send + Sync>),
    /// Invoked with the published payload.
    Data(Arc<dyn Fn(D) -> ListenerFuture + Send + Sync>),
    /// Invoked with the published path and the payload.
    WithTopics(Arc<dyn Fn(TopicPath, D) -> ListenerFuture + Send + Sync>),
}

impl<D> Listener<D> {
    /// Creates a listener that ignores the published payload.
    pub fn no_args<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Listener::NoArgs(Arc::new(move || -> ListenerFuture { Box::pin(f()) }))
    }

    /// Creates a listener that receives the published payload.
    pub fn data<F, Fut>(f: F) -> Self
    where
        F: Fn(D) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Listener::Data(Arc::new(move |data| -> ListenerFuture { Box::pin(f(data)) }))
    }

    /// Creates a listener that receives the full published path and the
    /// payload.
    pub fn with_topics<F, Fut>(f: F) -> Self
    where
        F: Fn(TopicPath, D) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Listener::WithTopics(Arc::new(move |path, data| -> ListenerFuture {
            Box::pin(f(path, data))
        }))
    }

    /// Builds the invocation future for one publish.
    pub(crate) fn invoke(&self, path: &TopicPath, data: D) -> ListenerFuture {
        match self {
            Listener::NoArgs(f) => f(),
            Listener::Data(f) => f(data),
            Listener::WithTopics(f) => f(Arc::clone(path), data),
        }
    }
}

impl<D> Clone for Listener<D> {
    fn clone(&self) -> Self {
        match self {
            Listener::NoArgs(f) => Listener::NoArgs(Arc::clone(f)),
            Listener::Data(f) => Listener::Data(Arc::clone(f)),
            Listener::WithTopics(f) => Listener::WithTopics(Arc::clone(f)),
        }
    }
}
