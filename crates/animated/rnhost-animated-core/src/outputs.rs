//! What one update cycle of the nodes manager hands back to the host.
//!
//! `updates` carries the property maps for connected views, `events` the
//! discrete signals (finished animations, listened values) and `failures`
//! the nodes whose evaluation failed this cycle.

use serde::{Deserialize, Serialize};

use crate::driver::AnimationId;
use crate::error::AnimatedError;
use rnhost_api_core::{Tag, UpdateBatch, ViewUpdate};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnimatedEvent {
    /// A driver left the running set. `finished` is false when it was stopped.
    AnimationFinished {
        animation_id: AnimationId,
        finished: bool,
    },
    /// A listened node resolved to a new value.
    ValueChanged { tag: Tag, value: f64 },
}

/// A node whose evaluation failed; its dependents were skipped.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationFailure {
    pub tag: Tag,
    pub error: AnimatedError,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub updates: UpdateBatch,
    pub events: Vec<AnimatedEvent>,
    pub failures: Vec<EvaluationFailure>,
}

impl Frame {
    pub fn push_update(&mut self, update: ViewUpdate) {
        self.updates.push(update);
    }

    pub fn push_event(&mut self, event: AnimatedEvent) {
        self.events.push(event);
    }

    pub fn push_failure(&mut self, tag: Tag, error: AnimatedError) {
        self.failures.push(EvaluationFailure { tag, error });
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.events.is_empty() && self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_serialize_with_kind_tag() {
        let e = AnimatedEvent::AnimationFinished {
            animation_id: 3,
            finished: true,
        };
        assert_eq!(
            serde_json::to_value(&e).unwrap(),
            json!({ "kind": "animation_finished", "animation_id": 3, "finished": true })
        );
    }

    #[test]
    fn frame_is_empty_until_something_is_pushed() {
        let mut frame = Frame::default();
        assert!(frame.is_empty());
        frame.push_failure(Tag(2), AnimatedError::NotAttached { tag: Tag(2) });
        assert!(!frame.is_empty());
        assert_eq!(frame.failures[0].tag, Tag(2));
    }
}
