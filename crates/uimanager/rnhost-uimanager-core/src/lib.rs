//! rnhost UIManager Core
//!
//! Tag-indexed registry of shadow nodes, shared between the layout thread
//! that mutates it and the UI thread that snapshots its roots.

pub mod error;
pub mod registry;
pub mod shadow;

pub use error::RegistryError;
pub use registry::{ShadowNodeRegistry, ShadowTreeCommand};
pub use rnhost_api_core::Tag;
pub use shadow::ShadowNode;
