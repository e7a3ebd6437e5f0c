//! The hierarchical publish/subscribe dispatcher.
//!
//! A dispatcher owns a set of named channels, each an independent topic tree;
//! publishes and subscriptions on one channel never cross into another. The
//! `"Default"` channel exists from construction, other channels appear lazily
//! on first subscription or via [`Dispatcher::create_channel`].
//!
//! Publishing walks the tree from the channel root along the published path.
//! With recursive matching (the default) every node on the path fires,
//! root first; with exact matching only the terminal node fires. Matched
//! listeners are handed to the task launcher one by one in root-to-leaf
//! order, so publishing never blocks on listener execution.
//!
//! Missing channels and missing path segments are soft conditions: publishing
//! degrades to a no-op and unsubscription reports `false`, by design.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{
    launcher::{ExecutorError, Launcher},
    listener::{Listener, ListenerId, TopicPath},
    topic::{Topic, TopicNode},
};

/// The channel used when none is named explicitly.
pub const DEFAULT_CHANNEL: &str = "Default";

/// Routes published notifications to listeners registered on hierarchical
/// topic paths.
///
/// `D` is the payload type carried by every publish on this dispatcher; it is
/// cloned once per matched listener that asked for it.
pub struct Dispatcher<D> {
    channels: Mutex<HashMap<String, TopicNode<D>>>,
    next_id: AtomicU64,
}

impl<D> Dispatcher<D>
where
    D: Clone + Send + Sync + 'static,
{
    /// Creates a dispatcher with the `"Default"` channel in place.
    #[must_use]
    pub fn new() -> Self {
        let mut channels = HashMap::new();
        channels.insert(DEFAULT_CHANNEL.to_owned(), TopicNode::new());
        Dispatcher {
            channels: Mutex::new(channels),
            next_id: AtomicU64::new(0),
        }
    }

    /// Ensures a channel's root node exists. Idempotent.
    pub fn create_channel(&self, channel: &str) {
        let mut channels = self.channels.lock().unwrap();
        if !channels.contains_key(channel) {
            tracing::debug!(channel, "channel created");
            channels.insert(channel.to_owned(), TopicNode::new());
        }
    }

    /// Registers `listener` under `path` on the `"Default"` channel.
    ///
    /// Missing intermediate nodes are created on the way down. An empty path
    /// registers at the channel root, matching every recursive publish on the
    /// channel.
    pub fn subscribe(&self, listener: Listener<D>, path: &[Topic]) -> ListenerId {
        self.subscribe_on(listener, path, DEFAULT_CHANNEL)
    }

    /// Registers `listener` under `path` on the named channel, creating the
    /// channel if needed.
    pub fn subscribe_on(&self, listener: Listener<D>, path: &[Topic], channel: &str) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut channels = self.channels.lock().unwrap();
        let mut node = channels
            .entry(channel.to_owned())
            .or_insert_with(TopicNode::new);
        for topic in path {
            node = node.ensure_child(topic.clone());
        }
        node.add(id, listener);
        tracing::trace!(channel, id = id.0, "listener registered");
        id
    }

    /// Registers a payload-only callback under `path` on the `"Default"`
    /// channel and returns its registration token.
    pub fn on<F, Fut>(&self, path: &[Topic], f: F) -> ListenerId
    where
        F: Fn(D) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.subscribe(Listener::data(f), path)
    }

    /// Removes listeners under `path` on the `"Default"` channel.
    ///
    /// See [`unsubscribe_on`](Self::unsubscribe_on).
    pub fn unsubscribe(&self, path: &[Topic], id: Option<ListenerId>) -> bool {
        self.unsubscribe_on(path, id, DEFAULT_CHANNEL)
    }

    /// Removes listeners under `path` on the named channel.
    ///
    /// With `Some(id)` only that registration is removed from the terminal
    /// node; with `None` the entire subtree at the terminal segment is
    /// discarded, nested subscriptions included. Returns whether anything was
    /// removed: an unknown channel, a missing intermediate segment, or an id
    /// not present at the terminal node all yield `false`.
    ///
    /// An empty path targets the channel root, where only id-based removal is
    /// meaningful; `None` yields `false` because a channel root cannot remove
    /// itself.
    pub fn unsubscribe_on(&self, path: &[Topic], id: Option<ListenerId>, channel: &str) -> bool {
        let mut channels = self.channels.lock().unwrap();
        let Some(mut node) = channels.get_mut(channel) else {
            return false;
        };

        let Some((last, intermediate)) = path.split_last() else {
            return match id {
                Some(id) => node.remove(id),
                None => false,
            };
        };
        for topic in intermediate {
            match node.child_mut(topic) {
                Some(child) => node = child,
                None => return false,
            }
        }
        match id {
            Some(id) => match node.child_mut(last) {
                Some(terminal) => terminal.remove(id),
                None => false,
            },
            None => node.remove_child(last),
        }
    }

    /// Publishes `data` under `path` on the `"Default"` channel with
    /// recursive matching.
    pub fn publish(&self, launcher: &Launcher, data: D, path: &[Topic]) -> Result<(), ExecutorError> {
        self.dispatch(launcher, data, path, true, DEFAULT_CHANNEL)
    }

    /// Publishes `data` under `path` on the named channel with recursive
    /// matching.
    pub fn publish_on(
        &self,
        launcher: &Launcher,
        data: D,
        path: &[Topic],
        channel: &str,
    ) -> Result<(), ExecutorError> {
        self.dispatch(launcher, data, path, true, channel)
    }

    /// Publishes `data` under `path` with full control over matching mode and
    /// channel.
    ///
    /// Matched listeners are submitted to `launcher` in root-to-leaf order;
    /// their actual execution interleaves on the scheduling context. An
    /// unknown channel is a no-op, as is a path whose next segment does not
    /// exist (the walk simply stops there).
    ///
    /// # Errors
    ///
    /// - `ExecutorError::NotInitialized`: a listener matched but no
    ///   scheduling context is bound, so it cannot be invoked.
    pub fn dispatch(
        &self,
        launcher: &Launcher,
        data: D,
        path: &[Topic],
        recursive: bool,
        channel: &str,
    ) -> Result<(), ExecutorError> {
        // Collect matches under the lock, invoke after releasing it so
        // listeners are free to subscribe or publish themselves.
        let matched = {
            let channels = self.channels.lock().unwrap();
            let Some(mut node) = channels.get(channel) else {
                return Ok(());
            };

            let mut matched: Vec<Listener<D>> = Vec::new();
            if recursive {
                matched.extend(node.registrations().iter().map(|r| r.listener.clone()));
            }
            for (depth, topic) in path.iter().enumerate() {
                let Some(child) = node.child(topic) else {
                    break;
                };
                node = child;
                if recursive || depth == path.len() - 1 {
                    matched.extend(node.registrations().iter().map(|r| r.listener.clone()));
                }
            }
            matched
        };

        if matched.is_empty() {
            return Ok(());
        }
        tracing::trace!(channel, matched = matched.len(), "publishing");

        let published: TopicPath = Arc::from(path.to_vec());
        for listener in matched {
            launcher.submit(listener.invoke(&published, data.clone()))?;
        }
        Ok(())
    }

    /// The registration tokens at the node reached by `path` on the
    /// `"Default"` channel, in insertion order. `None` if the path does not
    /// exist.
    #[must_use]
    pub fn listeners(&self, path: &[Topic]) -> Option<Vec<ListenerId>> {
        self.listeners_on(path, DEFAULT_CHANNEL)
    }

    /// The registration tokens at the node reached by `path` on the named
    /// channel, in insertion order.
    #[must_use]
    pub fn listeners_on(&self, path: &[Topic], channel: &str) -> Option<Vec<ListenerId>> {
        let channels = self.channels.lock().unwrap();
        let mut node = channels.get(channel)?;
        for topic in path {
            node = node.child(topic)?;
        }
        Some(node.registrations().iter().map(|r| r.id).collect())
    }
}

impl<D> Default for Dispatcher<D>
where
    D: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
