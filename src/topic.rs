//! Topic segments and the topic tree used for hierarchical dispatch.
//!
//! A subscription path is a sequence of [`Topic`] segments. Each segment maps
//! to a [`TopicNode`] holding the listeners registered at exactly that depth
//! plus the child nodes for deeper paths. Nodes are created lazily the first
//! time a subscription needs them and removed explicitly on unsubscription.

use std::collections::HashMap;

use crate::listener::{Listener, ListenerId};

/// One segment of a hierarchical topic path.
///
/// Paths may freely mix textual and numeric segments, e.g.
/// `["Message".into(), 1.into()]`. Segments compare by value and are used as
/// hash-map keys inside the topic tree.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    /// A textual segment.
    Text(String),
    /// A numeric segment.
    Number(i64),
}

impl From<&str> for Topic {
    fn from(value: &str) -> Self {
        Topic::Text(value.to_owned())
    }
}

impl From<String> for Topic {
    fn from(value: String) -> Self {
        Topic::Text(value)
    }
}

impl From<i64> for Topic {
    fn from(value: i64) -> Self {
        Topic::Number(value)
    }
}

impl From<i32> for Topic {
    fn from(value: i32) -> Self {
        Topic::Number(i64::from(value))
    }
}

impl From<u32> for Topic {
    fn from(value: u32) -> Self {
        Topic::Number(i64::from(value))
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topic::Text(s) => write!(f, "{s}"),
            Topic::Number(n) => write!(f, "{n}"),
        }
    }
}

// A listener registered at one node, paired with its registration token.
pub(crate) struct Registration<D> {
    pub(crate) id: ListenerId,
    pub(crate) listener: Listener<D>,
}

/// A node of the topic tree: the listeners registered at this exact path and
/// the children keyed by the next segment.
pub(crate) struct TopicNode<D> {
    registrations: Vec<Registration<D>>,
    children: HashMap<Topic, TopicNode<D>>,
}

impl<D> TopicNode<D> {
    pub(crate) fn new() -> Self {
        Self {
            registrations: Vec::new(),
            children: HashMap::new(),
        }
    }

    /// Appends a listener, preserving insertion order.
    pub(crate) fn add(&mut self, id: ListenerId, listener: Listener<D>) {
        self.registrations.push(Registration { id, listener });
    }

    /// Removes the registration with the given id, returning whether it was
    /// present.
    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.id != id);
        self.registrations.len() < before
    }

    /// Drops the entire subtree under `topic`, returning whether it existed.
    pub(crate) fn remove_child(&mut self, topic: &Topic) -> bool {
        self.children.remove(topic).is_some()
    }

    pub(crate) fn child(&self, topic: &Topic) -> Option<&TopicNode<D>> {
        self.children.get(topic)
    }

    pub(crate) fn child_mut(&mut self, topic: &Topic) -> Option<&mut TopicNode<D>> {
        self.children.get_mut(topic)
    }

    /// Returns the child for `topic`, creating it if absent.
    pub(crate) fn ensure_child(&mut self, topic: Topic) -> &mut TopicNode<D> {
        self.children.entry(topic).or_insert_with(TopicNode::new)
    }

    pub(crate) fn registrations(&self) -> &[Registration<D>] {
        &self.registrations
    }
}
