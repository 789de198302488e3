//! rnhost Animated Core (toolkit-agnostic)
//!
//! A graph of typed animated nodes keyed by integer tags. Value nodes are
//! written by commands, animation drivers and native events; derived nodes
//! (interpolation, arithmetic, modulus, diff-clamp) recompute from them; props
//! nodes connected to a view turn the result into property updates.
//!
//! [`NodesManager`] owns the graph and produces one [`Frame`] per tick.

pub mod commands;
pub mod config;
pub mod driver;
pub mod error;
pub mod events;
pub mod manager;
pub mod node;
pub mod outputs;
pub mod store;
pub mod topo;

// Re-exports for hosts
pub use commands::GraphCommand;
pub use config::ManagerConfig;
pub use driver::{AnimationConfig, AnimationDriver, AnimationId, DriverState};
pub use error::{AnimatedError, Result};
pub use events::{EventMapping, EventMappings};
pub use manager::NodesManager;
pub use node::{
    AnimatedNode, Evaluation, Extrapolate, Graph, NodeEntry, NodeKind, PropSource, TransformEntry,
};
pub use outputs::{AnimatedEvent, EvaluationFailure, Frame};
pub use store::NodeStore;
pub use rnhost_api_core::{PropsMap, Tag, UpdateBatch, ViewUpdate};
