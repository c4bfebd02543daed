//! Change notifications.
//!
//! Listener lists are copy on write: subscribing or unsubscribing replaces the shared
//! slice, so a snapshot taken by a running mutation keeps the handlers it saw.
//! Mutations collect `(snapshot, subject)` pairs into an [`Outbox`] while the
//! structure is being edited and deliver them only after the edit is complete.

use std::{fmt, sync::Arc};

use derive_more::Into;
use tracing::trace;

use crate::tree::{Forest, ForestError, TreeNodeId};

/// A listener callback. Receives the node the event is about.
pub type Handler = Arc<dyn Fn(TreeNodeId) + Send + Sync>;

/// Identifies a subscription so it can be removed again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Into)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListenerId(pub(crate) u64);

/// Per-node events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeEvent {
    /// The node, or one of its ancestors, got a new parent.
    ParentChanged,
    /// The set of nodes below this node changed.
    ChildrenChanged,
    /// The node's tree was removed from the forest.
    Removed,
}

/// Forest-level events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ForestEvent {
    RootAdded,
    RootRemoved,
}

type Entries = Arc<[(ListenerId, Handler)]>;

/// A copy-on-write list of handlers.
#[derive(Clone)]
pub struct Listeners {
    entries: Entries,
}

impl Default for Listeners {
    fn default() -> Self {
        Listeners {
            entries: Arc::from(Vec::new()),
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(id, _)| id))
            .finish()
    }
}

impl Listeners {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn subscribe(&mut self, id: ListenerId, handler: Handler) {
        let mut entries = self.entries.to_vec();
        entries.push((id, handler));
        self.entries = entries.into();
    }

    /// Returns `true` if a handler with this id was present.
    pub(crate) fn unsubscribe(&mut self, id: ListenerId) -> bool {
        if !self.entries.iter().any(|(existing, _)| *existing == id) {
            return false;
        }
        let entries: Vec<_> = self
            .entries
            .iter()
            .filter(|(existing, _)| *existing != id)
            .cloned()
            .collect();
        self.entries = entries.into();
        true
    }

    fn snapshot(&self) -> Option<Entries> {
        (!self.is_empty()).then(|| Arc::clone(&self.entries))
    }
}

/// The listener lists every node carries.
#[derive(Clone, Debug, Default)]
pub struct NodeListeners {
    pub(crate) parent_changed: Listeners,
    pub(crate) children_changed: Listeners,
    pub(crate) removed: Listeners,
}

impl NodeListeners {
    pub(crate) fn get(&self, event: NodeEvent) -> &Listeners {
        match event {
            NodeEvent::ParentChanged => &self.parent_changed,
            NodeEvent::ChildrenChanged => &self.children_changed,
            NodeEvent::Removed => &self.removed,
        }
    }

    fn get_mut(&mut self, event: NodeEvent) -> &mut Listeners {
        match event {
            NodeEvent::ParentChanged => &mut self.parent_changed,
            NodeEvent::ChildrenChanged => &mut self.children_changed,
            NodeEvent::Removed => &mut self.removed,
        }
    }

    fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.parent_changed.unsubscribe(id)
            || self.children_changed.unsubscribe(id)
            || self.removed.unsubscribe(id)
    }
}

/// The listener lists the forest itself carries.
#[derive(Clone, Debug, Default)]
pub struct ForestListeners {
    pub(crate) root_added: Listeners,
    pub(crate) root_removed: Listeners,
}

impl ForestListeners {
    pub(crate) fn get(&self, event: ForestEvent) -> &Listeners {
        match event {
            ForestEvent::RootAdded => &self.root_added,
            ForestEvent::RootRemoved => &self.root_removed,
        }
    }

    fn get_mut(&mut self, event: ForestEvent) -> &mut Listeners {
        match event {
            ForestEvent::RootAdded => &mut self.root_added,
            ForestEvent::RootRemoved => &mut self.root_removed,
        }
    }
}

struct Delivery {
    handlers: Entries,
    subject: TreeNodeId,
}

/// Notifications collected by a mutation, in firing order.
#[must_use = "notifications are only sent by `Outbox::deliver`"]
#[derive(Default)]
pub struct Outbox {
    deliveries: Vec<Delivery>,
}

impl fmt::Debug for Outbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outbox")
            .field("deliveries", &self.deliveries.len())
            .finish()
    }
}

impl Outbox {
    pub(crate) fn push(&mut self, listeners: &Listeners, subject: TreeNodeId) {
        if let Some(handlers) = listeners.snapshot() {
            self.deliveries.push(Delivery { handlers, subject });
        }
    }

    pub(crate) fn append(&mut self, mut other: Outbox) {
        self.deliveries.append(&mut other.deliveries);
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    /// Calls every collected handler, in order.
    pub fn deliver(self) {
        trace!(deliveries = self.deliveries.len(), "delivering notifications");
        for delivery in self.deliveries {
            for (_, handler) in delivery.handlers.iter() {
                handler(delivery.subject);
            }
        }
    }
}

/// Subscription management.
impl<V> Forest<V> {
    fn next_listener_id(&mut self) -> ListenerId {
        self.next_listener += 1;
        ListenerId(self.next_listener)
    }

    /// Registers `handler` for `event` on `node`.
    pub fn subscribe(
        &mut self,
        node: TreeNodeId,
        event: NodeEvent,
        handler: impl Fn(TreeNodeId) + Send + Sync + 'static,
    ) -> Result<ListenerId, ForestError> {
        self.check(node)?;
        let id = self.next_listener_id();
        self.rec_mut(node)
            .listeners
            .get_mut(event)
            .subscribe(id, Arc::new(handler));
        Ok(id)
    }

    pub fn on_parent_changed(
        &mut self,
        node: TreeNodeId,
        handler: impl Fn(TreeNodeId) + Send + Sync + 'static,
    ) -> Result<ListenerId, ForestError> {
        self.subscribe(node, NodeEvent::ParentChanged, handler)
    }

    pub fn on_children_changed(
        &mut self,
        node: TreeNodeId,
        handler: impl Fn(TreeNodeId) + Send + Sync + 'static,
    ) -> Result<ListenerId, ForestError> {
        self.subscribe(node, NodeEvent::ChildrenChanged, handler)
    }

    pub fn on_removed(
        &mut self,
        node: TreeNodeId,
        handler: impl Fn(TreeNodeId) + Send + Sync + 'static,
    ) -> Result<ListenerId, ForestError> {
        self.subscribe(node, NodeEvent::Removed, handler)
    }

    /// Removes a node subscription. Returns `false` if `listener` was not subscribed
    /// on `node`.
    pub fn unsubscribe(
        &mut self,
        node: TreeNodeId,
        listener: ListenerId,
    ) -> Result<bool, ForestError> {
        self.check(node)?;
        Ok(self.rec_mut(node).listeners.unsubscribe(listener))
    }

    /// Registers `handler` for a forest-level event.
    pub fn subscribe_forest(
        &mut self,
        event: ForestEvent,
        handler: impl Fn(TreeNodeId) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = self.next_listener_id();
        self.listeners.get_mut(event).subscribe(id, Arc::new(handler));
        id
    }

    pub fn on_root_added(
        &mut self,
        handler: impl Fn(TreeNodeId) + Send + Sync + 'static,
    ) -> ListenerId {
        self.subscribe_forest(ForestEvent::RootAdded, handler)
    }

    pub fn on_root_removed(
        &mut self,
        handler: impl Fn(TreeNodeId) + Send + Sync + 'static,
    ) -> ListenerId {
        self.subscribe_forest(ForestEvent::RootRemoved, handler)
    }

    pub fn unsubscribe_forest(&mut self, listener: ListenerId) -> bool {
        self.listeners.root_added.unsubscribe(listener)
            || self.listeners.root_removed.unsubscribe(listener)
    }

    /// Number of handlers subscribed to `event` on `node`.
    pub fn listener_count(&self, node: TreeNodeId, event: NodeEvent) -> Result<usize, ForestError> {
        Ok(self.check(node)?.listeners.get(event).len())
    }
}

#[cfg(test)]
mod test {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::{Listeners, Outbox};
    use crate::tree::Forest;

    #[test]
    fn snapshot_survives_unsubscribe() {
        let mut forest: Forest<()> = Forest::new();
        let node = forest.create_node(());
        let hits = Arc::new(AtomicUsize::new(0));

        let mut listeners = Listeners::default();
        let counter = Arc::clone(&hits);
        let id = crate::event::ListenerId(1);
        listeners.subscribe(
            id,
            Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let mut outbox = Outbox::default();
        outbox.push(&listeners, node);
        assert!(listeners.unsubscribe(id));
        assert!(listeners.is_empty());
        assert!(!listeners.unsubscribe(id));

        outbox.deliver();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_lists_are_skipped() {
        let mut forest: Forest<()> = Forest::new();
        let node = forest.create_node(());
        let mut outbox = Outbox::default();
        outbox.push(&Listeners::default(), node);
        assert!(outbox.is_empty());
    }
}
