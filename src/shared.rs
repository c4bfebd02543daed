//! A forest shared between threads.
//!
//! [`SharedForest`] serialises every operation, reads included, behind a single
//! mutex. Mutations deliver their notifications after the lock is released, so a
//! handler may call back into the same forest.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    config::ForestOptions,
    event::{ForestEvent, ListenerId, NodeEvent},
    tree::{Forest, ForestError, TreeNodeId},
};

/// A cloneable, thread-safe handle to a [`Forest`].
pub struct SharedForest<V> {
    inner: Arc<Mutex<Forest<V>>>,
}

impl<V> Clone for SharedForest<V> {
    fn clone(&self) -> Self {
        SharedForest {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Default for SharedForest<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> From<Forest<V>> for SharedForest<V> {
    fn from(forest: Forest<V>) -> Self {
        SharedForest {
            inner: Arc::new(Mutex::new(forest)),
        }
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for SharedForest<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SharedForest").field(&*self.inner.lock()).finish()
    }
}

impl<V> SharedForest<V> {
    pub fn new() -> Self {
        Forest::new().into()
    }

    pub fn with_options(options: ForestOptions) -> Self {
        Forest::with_options(options).into()
    }

    /// Runs `f` with the forest locked. Handy for queries that return borrowed data.
    pub fn read<R>(&self, f: impl FnOnce(&Forest<V>) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Runs `f` with exclusive access to the forest. Notifications raised inside `f`
    /// are delivered while the lock is still held, so handlers must not touch this
    /// handle.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Forest<V>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn create_node(&self, data: V) -> TreeNodeId {
        self.inner.lock().create_node(data)
    }

    pub fn insert_root(&self, data: V) -> TreeNodeId {
        let node = self.create_node(data);
        // Only this call knows the handle, so nobody can register it in between.
        let outbox = self.inner.lock().add_root_inner(node);
        match outbox {
            Ok(outbox) => outbox.deliver(),
            Err(e) => crate::tree::corrupted(&format!(
                "fresh node {node} refused registration: {e}"
            )),
        }
        node
    }

    pub fn add_child(&self, parent: TreeNodeId, data: V) -> Result<TreeNodeId, ForestError> {
        let (child, outbox) = self.inner.lock().add_child_inner(parent, data)?;
        outbox.deliver();
        Ok(child)
    }

    pub fn add_root(&self, node: TreeNodeId) -> Result<(), ForestError> {
        let outbox = self.inner.lock().add_root_inner(node)?;
        outbox.deliver();
        Ok(())
    }

    pub fn remove_root(&self, node: TreeNodeId) -> Result<(), ForestError> {
        let outbox = self.inner.lock().remove_root_inner(node)?;
        outbox.deliver();
        Ok(())
    }

    pub fn remove(&self, node: TreeNodeId) -> Result<(), ForestError> {
        let outbox = self.inner.lock().remove_inner(node)?;
        outbox.deliver();
        Ok(())
    }

    pub fn reparent(&self, node: TreeNodeId, parent: TreeNodeId) -> Result<(), ForestError> {
        let outbox = self.inner.lock().reparent_inner(node, parent)?;
        outbox.deliver();
        Ok(())
    }

    pub fn detach(&self, node: TreeNodeId) -> Result<(), ForestError> {
        let outbox = self.inner.lock().detach_inner(node)?;
        outbox.deliver();
        Ok(())
    }

    pub fn clear(&self) {
        let outbox = self.inner.lock().clear_inner();
        outbox.deliver();
    }

    pub fn node_at(&self, index: usize) -> Result<TreeNodeId, ForestError> {
        self.inner.lock().node_at(index)
    }

    pub fn total_count(&self) -> usize {
        self.inner.lock().total_count()
    }

    pub fn root_count(&self) -> usize {
        self.inner.lock().root_count()
    }

    pub fn roots(&self) -> Vec<TreeNodeId> {
        self.inner.lock().roots().to_vec()
    }

    pub fn parent(&self, node: TreeNodeId) -> Result<Option<TreeNodeId>, ForestError> {
        self.inner.lock().parent(node)
    }

    pub fn children(&self, node: TreeNodeId) -> Result<Vec<TreeNodeId>, ForestError> {
        self.inner.lock().children_vec(node)
    }

    pub fn descendants(&self, node: TreeNodeId) -> Result<Vec<TreeNodeId>, ForestError> {
        Ok(self.inner.lock().descendants(node)?.to_vec())
    }

    pub fn validate(&self) -> Result<(), ForestError> {
        self.inner.lock().validate()
    }

    pub fn subscribe(
        &self,
        node: TreeNodeId,
        event: NodeEvent,
        handler: impl Fn(TreeNodeId) + Send + Sync + 'static,
    ) -> Result<ListenerId, ForestError> {
        self.inner.lock().subscribe(node, event, handler)
    }

    pub fn unsubscribe(&self, node: TreeNodeId, listener: ListenerId) -> Result<bool, ForestError> {
        self.inner.lock().unsubscribe(node, listener)
    }

    pub fn subscribe_forest(
        &self,
        event: ForestEvent,
        handler: impl Fn(TreeNodeId) + Send + Sync + 'static,
    ) -> ListenerId {
        self.inner.lock().subscribe_forest(event, handler)
    }

    pub fn unsubscribe_forest(&self, listener: ListenerId) -> bool {
        self.inner.lock().unsubscribe_forest(listener)
    }
}

impl<V: Clone> SharedForest<V> {
    pub fn data(&self, node: TreeNodeId) -> Result<V, ForestError> {
        self.inner.lock().data(node).cloned()
    }
}
