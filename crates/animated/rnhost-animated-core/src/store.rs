//! Tag-indexed ownership arena.
//!
//! Nodes refer to one another by [`Tag`], never by reference, so the store is
//! the single owner of every node and removal never has to chase pointers.
//! References left behind by a removal are detected by whoever follows them.

use crate::error::{AnimatedError, Result};
use hashbrown::HashMap;
use rnhost_api_core::Tag;

#[derive(Debug)]
pub struct NodeStore<T> {
    items: HashMap<Tag, T>,
}

impl<T> Default for NodeStore<T> {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
        }
    }
}

impl<T> NodeStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: HashMap::with_capacity(capacity),
        }
    }

    /// Insert `node` under `tag`. Fails if the tag is already live.
    pub fn create(&mut self, tag: Tag, node: T) -> Result<&mut T> {
        match self.items.entry(tag) {
            hashbrown::hash_map::Entry::Occupied(_) => Err(AnimatedError::DuplicateTag { tag }),
            hashbrown::hash_map::Entry::Vacant(vacant) => Ok(vacant.insert(node)),
        }
    }

    pub fn get(&self, tag: Tag) -> Result<&T> {
        self.items
            .get(&tag)
            .ok_or(AnimatedError::UnknownTag { tag })
    }

    pub fn get_mut(&mut self, tag: Tag) -> Result<&mut T> {
        self.items
            .get_mut(&tag)
            .ok_or(AnimatedError::UnknownTag { tag })
    }

    /// Remove and return the node under `tag`. Removing an absent tag is an error.
    pub fn remove(&mut self, tag: Tag) -> Result<T> {
        self.items
            .remove(&tag)
            .ok_or(AnimatedError::UnknownTag { tag })
    }

    #[inline]
    pub fn contains(&self, tag: Tag) -> bool {
        self.items.contains_key(&tag)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
