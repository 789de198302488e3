//! ShadowNodeRegistry: tag → shadow node map plus the set of root tags.
//!
//! Two locks guard the state. `roots` is a `Mutex` over the root tags in
//! registration order; `nodes` is an `RwLock` over the node map. Every
//! operation that touches both takes `roots` first, then `nodes`, and holds
//! both until the change is complete, so a root snapshot always pairs with a
//! fully registered node. Guards never leave a method.
//!
//! Each mutation is a single insert or remove per map, so a panic on another
//! thread cannot leave the maps inconsistent; poisoned locks are recovered.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use hashbrown::HashMap;
use indexmap::IndexSet;
use log::debug;
use rnhost_api_core::Tag;

use crate::error::RegistryError;
use crate::shadow::ShadowNode;

/// One registry mutation, as issued by the UI manager while it processes a batch.
pub enum ShadowTreeCommand<N> {
    AddRoot(Arc<N>),
    RemoveRoot(Tag),
    AddNode(Arc<N>),
    RemoveNode(Tag),
}

impl<N> std::fmt::Debug for ShadowTreeCommand<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShadowTreeCommand::AddRoot(_) => f.write_str("AddRoot"),
            ShadowTreeCommand::RemoveRoot(tag) => write!(f, "RemoveRoot({tag})"),
            ShadowTreeCommand::AddNode(_) => f.write_str("AddNode"),
            ShadowTreeCommand::RemoveNode(tag) => write!(f, "RemoveNode({tag})"),
        }
    }
}

pub struct ShadowNodeRegistry<N: ShadowNode> {
    roots: Mutex<IndexSet<Tag>>,
    nodes: RwLock<HashMap<Tag, Arc<N>>>,
}

impl<N: ShadowNode> Default for ShadowNodeRegistry<N> {
    fn default() -> Self {
        Self {
            roots: Mutex::new(IndexSet::new()),
            nodes: RwLock::new(HashMap::new()),
        }
    }
}

impl<N: ShadowNode> ShadowNodeRegistry<N> {
    pub fn new() -> Self {
        Self::default()
    }

    fn roots(&self) -> MutexGuard<'_, IndexSet<Tag>> {
        self.roots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn nodes(&self) -> RwLockReadGuard<'_, HashMap<Tag, Arc<N>>> {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn nodes_mut(&self) -> RwLockWriteGuard<'_, HashMap<Tag, Arc<N>>> {
        self.nodes.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `node` and flag its tag as a root, as one step.
    pub fn add_root_node(&self, node: Arc<N>) -> Result<(), RegistryError> {
        let tag = node.react_tag();
        let mut roots = self.roots();
        let mut nodes = self.nodes_mut();
        if nodes.contains_key(&tag) {
            return Err(RegistryError::DuplicateTag { tag });
        }
        nodes.insert(tag, node);
        roots.insert(tag);
        debug!("add_root_node: {tag}");
        Ok(())
    }

    pub fn remove_root_node(&self, tag: Tag) -> Result<(), RegistryError> {
        let mut roots = self.roots();
        if !roots.contains(&tag) {
            return Err(RegistryError::NotFound {
                tag,
                expected: "a root node",
            });
        }
        let mut nodes = self.nodes_mut();
        nodes.remove(&tag);
        roots.shift_remove(&tag);
        debug!("remove_root_node: {tag}");
        Ok(())
    }

    pub fn add_node(&self, node: Arc<N>) -> Result<(), RegistryError> {
        let tag = node.react_tag();
        let mut nodes = self.nodes_mut();
        if nodes.contains_key(&tag) {
            return Err(RegistryError::DuplicateTag { tag });
        }
        nodes.insert(tag, node);
        Ok(())
    }

    /// Remove a non-root node. Roots must go through [`Self::remove_root_node`].
    /// Removing a tag that is not registered does nothing.
    pub fn remove_node(&self, tag: Tag) -> Result<(), RegistryError> {
        let roots = self.roots();
        if roots.contains(&tag) {
            return Err(RegistryError::Conflict { tag });
        }
        let mut nodes = self.nodes_mut();
        nodes.remove(&tag);
        Ok(())
    }

    pub fn get_node(&self, tag: Tag) -> Result<Arc<N>, RegistryError> {
        self.nodes()
            .get(&tag)
            .cloned()
            .ok_or(RegistryError::NotFound {
                tag,
                expected: "a shadow node",
            })
    }

    pub fn is_root_node(&self, tag: Tag) -> bool {
        self.roots().contains(&tag)
    }

    /// Point-in-time copy of the root tags, in registration order.
    pub fn root_node_tags(&self) -> Vec<Tag> {
        self.roots().iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.nodes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes().is_empty()
    }

    pub fn apply(&self, command: ShadowTreeCommand<N>) -> Result<(), RegistryError> {
        match command {
            ShadowTreeCommand::AddRoot(node) => self.add_root_node(node),
            ShadowTreeCommand::RemoveRoot(tag) => self.remove_root_node(tag),
            ShadowTreeCommand::AddNode(node) => self.add_node(node),
            ShadowTreeCommand::RemoveNode(tag) => self.remove_node(tag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Node(Tag);

    impl ShadowNode for Node {
        fn react_tag(&self) -> Tag {
            self.0
        }
    }

    fn node(tag: i32) -> Arc<Node> {
        Arc::new(Node(Tag(tag)))
    }

    #[test]
    fn roots_and_nodes_share_the_tag_space() {
        let reg = ShadowNodeRegistry::new();
        reg.add_root_node(node(1)).unwrap();
        assert_eq!(
            reg.add_node(node(1)),
            Err(RegistryError::DuplicateTag { tag: Tag(1) })
        );
        reg.add_node(node(2)).unwrap();
        assert_eq!(
            reg.add_root_node(node(2)),
            Err(RegistryError::DuplicateTag { tag: Tag(2) })
        );
        assert!(!reg.is_root_node(Tag(2)));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn snapshot_keeps_registration_order() {
        let reg = ShadowNodeRegistry::new();
        for t in [5, 3, 9] {
            reg.add_root_node(node(t)).unwrap();
        }
        reg.remove_root_node(Tag(3)).unwrap();
        reg.add_root_node(node(3)).unwrap();
        assert_eq!(reg.root_node_tags(), vec![Tag(5), Tag(9), Tag(3)]);
    }

    #[test]
    fn apply_dispatches_commands() {
        let reg = ShadowNodeRegistry::new();
        reg.apply(ShadowTreeCommand::AddRoot(node(1))).unwrap();
        reg.apply(ShadowTreeCommand::AddNode(node(2))).unwrap();
        assert_eq!(
            reg.apply(ShadowTreeCommand::RemoveNode(Tag(1))),
            Err(RegistryError::Conflict { tag: Tag(1) })
        );
        reg.apply(ShadowTreeCommand::RemoveNode(Tag(2))).unwrap();
        reg.apply(ShadowTreeCommand::RemoveRoot(Tag(1))).unwrap();
        assert!(reg.is_empty());
    }
}
