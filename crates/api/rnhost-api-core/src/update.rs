//! Property updates produced by the animated graph for native views.
//!
//! ViewUpdate serializes to JSON as:
//!   { "viewTag": 100, "props": { "transform": [ { "rotate": 45 } ], "opacity": 0.5 } }
//!
//! UpdateBatch is a simple Vec<ViewUpdate> with helpers.

use crate::Tag;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Property name → value.
pub type PropsMap = Map<String, JsonValue>;

/// Property key under which transform lists are installed.
pub const TRANSFORM_KEY: &str = "transform";

/// All property changes computed in one evaluation cycle for one view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewUpdate {
    pub view_tag: Tag,
    pub props: PropsMap,
}

impl ViewUpdate {
    pub fn new(view_tag: Tag, props: PropsMap) -> Self {
        Self { view_tag, props }
    }

    /// The ordered transform list, if this update carries one.
    pub fn transform(&self) -> Option<&Vec<JsonValue>> {
        self.props.get(TRANSFORM_KEY).and_then(JsonValue::as_array)
    }
}

/// A batch of view updates handed to the presentation context in one piece.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateBatch(pub Vec<ViewUpdate>);

impl UpdateBatch {
    pub fn new() -> Self {
        UpdateBatch(Vec::new())
    }

    pub fn push(&mut self, update: ViewUpdate) {
        self.0.push(update);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First update addressed to `view_tag`, if any.
    pub fn for_view(&self, view_tag: Tag) -> Option<&ViewUpdate> {
        self.0.iter().find(|u| u.view_tag == view_tag)
    }
}
