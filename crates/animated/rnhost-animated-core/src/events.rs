//! Native events driving value nodes directly.
//!
//! A mapping names a value node and a path of keys into the event payload.
//! When the host reports an event for a view, every mapping registered for
//! that `(view, event)` pair writes the number found at its path.

use indexmap::IndexMap;
use rnhost_api_core::Tag;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EventMapping {
    pub animated_value_tag: Tag,
    pub native_event_path: Vec<String>,
}

impl EventMapping {
    /// Number at `native_event_path` inside `payload`, if the path resolves to one.
    pub fn extract(&self, payload: &JsonValue) -> Option<f64> {
        self.native_event_path
            .iter()
            .try_fold(payload, |v, key| v.get(key.as_str()))
            .and_then(JsonValue::as_f64)
    }
}

#[derive(Debug, Default)]
pub struct EventMappings {
    by_event: IndexMap<(Tag, String), Vec<EventMapping>>,
}

impl EventMappings {
    pub fn add(&mut self, view_tag: Tag, event_name: &str, mapping: EventMapping) {
        self.by_event
            .entry((view_tag, event_name.to_string()))
            .or_default()
            .push(mapping);
    }

    /// Remove the mapping for `value_tag`. Returns whether one was removed.
    pub fn remove(&mut self, view_tag: Tag, event_name: &str, value_tag: Tag) -> bool {
        let key = (view_tag, event_name.to_string());
        let Some(list) = self.by_event.get_mut(&key) else {
            return false;
        };
        let before = list.len();
        list.retain(|m| m.animated_value_tag != value_tag);
        let removed = list.len() != before;
        if list.is_empty() {
            self.by_event.shift_remove(&key);
        }
        removed
    }

    pub fn get(&self, view_tag: Tag, event_name: &str) -> &[EventMapping] {
        self.by_event
            .get(&(view_tag, event_name.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.by_event.is_empty()
    }
}
