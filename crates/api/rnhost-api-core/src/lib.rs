//! rnhost-api-core: identifiers and outbound update types shared by the
//! animated graph and the UI manager (core, toolkit-agnostic).

pub mod tag;
pub mod update;

pub use tag::Tag;
pub use update::{PropsMap, UpdateBatch, ViewUpdate, TRANSFORM_KEY};
