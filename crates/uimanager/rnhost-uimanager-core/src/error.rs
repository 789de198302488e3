use rnhost_api_core::Tag;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("shadow node with tag {tag} is already registered")]
    DuplicateTag { tag: Tag },

    #[error("tag {tag} is not registered as {expected}")]
    NotFound { tag: Tag, expected: &'static str },

    /// A root tag was passed to the plain node removal path.
    #[error("tag {tag} is a root node; remove it with remove_root_node")]
    Conflict { tag: Tag },
}
