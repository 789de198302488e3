//! Error types for the animated node graph.

use rnhost_api_core::Tag;
use thiserror::Error;

/// Failure of a single graph command or of one node's evaluation.
///
/// Every variant is local to the operation that produced it: a rejected
/// mutation leaves the store and the edges untouched.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum AnimatedError {
    #[error("animated node with tag {tag} already exists")]
    DuplicateTag { tag: Tag },

    #[error("animated node with tag {tag} does not exist")]
    UnknownTag { tag: Tag },

    /// An edge or reference held by `from` points at a dropped node.
    #[error("node {from} references node {tag}, which has been dropped")]
    DanglingReference { from: Tag, tag: Tag },

    #[error("invalid config for node {tag}: {reason}")]
    InvalidConfig { tag: Tag, reason: String },

    #[error("node {tag} is of type '{actual}', expected {expected}")]
    UnsupportedNodeType {
        tag: Tag,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("connecting {parent} -> {child} would create a cycle")]
    CycleDetected { parent: Tag, child: Tag },

    /// Evaluation hit nodes that never reached in-degree zero.
    #[error("animated graph has a cycle through {count} node(s)")]
    CyclicGraph { count: usize },

    #[error("node {tag} has no attached input")]
    NotAttached { tag: Tag },

    #[error("props node {tag}: {reason}")]
    ViewConnection { tag: Tag, reason: String },

    #[error("division by zero in node {tag}")]
    DivisionByZero { tag: Tag },

    /// A scalar overflowed or became NaN; never sent to a view.
    #[error("node {tag} produced a non-finite value")]
    NonFiniteValue { tag: Tag },

    #[error("animation {id} is not running")]
    UnknownAnimation { id: i32 },

    #[error("invalid animation config for node {tag}: {reason}")]
    InvalidAnimation { tag: Tag, reason: String },
}

impl AnimatedError {
    pub(crate) fn invalid_config(tag: Tag, reason: impl Into<String>) -> Self {
        AnimatedError::InvalidConfig {
            tag,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = AnimatedError> = std::result::Result<T, E>;
