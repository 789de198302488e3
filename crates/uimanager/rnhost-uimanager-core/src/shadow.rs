use rnhost_api_core::Tag;

/// A node of the shadow tree as seen by the registry.
///
/// The registry never inspects nodes beyond their tag; layout data and
/// children belong to the implementor.
pub trait ShadowNode: Send + Sync {
    fn react_tag(&self) -> Tag;
}
