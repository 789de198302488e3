use crate::error::Result;
use rnhost_api_core::{PropsMap, Tag, TRANSFORM_KEY};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use super::{parse_config, read_scalar, Graph, NodeKind};

/// One step of a transform list. Either a literal or a live read of a value node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransformEntry {
    Animated {
        property: String,
        #[serde(rename = "nodeTag")]
        node_tag: Tag,
    },
    Static {
        property: String,
        value: f64,
    },
}

impl TransformEntry {
    pub fn property(&self) -> &str {
        match self {
            TransformEntry::Animated { property, .. } | TransformEntry::Static { property, .. } => {
                property
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TransformConfig {
    transforms: Vec<TransformEntry>,
}

/// Ordered list of transform operations installed under the `transform` prop.
///
/// Order is preserved and property names may repeat (two rotations are two
/// entries), which is why the output is a list of single-key objects and not
/// a flat map.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformNode {
    pub entries: Vec<TransformEntry>,
}

impl TransformNode {
    pub(crate) fn from_config(tag: Tag, config: &Map<String, JsonValue>) -> Result<Self> {
        let cfg: TransformConfig = parse_config(tag, NodeKind::Transform, config)?;
        Ok(Self {
            entries: cfg.transforms,
        })
    }

    pub(crate) fn node_refs(&self) -> impl Iterator<Item = Tag> + '_ {
        self.entries.iter().filter_map(|e| match e {
            TransformEntry::Animated { node_tag, .. } => Some(*node_tag),
            TransformEntry::Static { .. } => None,
        })
    }

    /// Resolve every entry and install the ordered list under `transform`.
    ///
    /// `props` is only touched once every entry resolved.
    pub fn collect_view_updates(&self, tag: Tag, graph: &Graph, props: &mut PropsMap) -> Result<()> {
        let mut transforms = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let value = match entry {
                TransformEntry::Static { value, .. } => *value,
                TransformEntry::Animated { node_tag, .. } => read_scalar(graph, tag, *node_tag)?,
            };
            let mut single = Map::with_capacity(1);
            single.insert(entry.property().to_string(), JsonValue::from(value));
            transforms.push(JsonValue::Object(single));
        }
        props.insert(TRANSFORM_KEY.to_string(), JsonValue::Array(transforms));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnimatedError;
    use crate::node::{AnimatedNode, NodeEntry, StyleNode, ValueNode};
    use serde_json::json;

    fn transform(v: JsonValue) -> TransformNode {
        TransformNode::from_config(Tag(2), v.as_object().unwrap()).unwrap()
    }

    #[test]
    fn parses_static_and_animated_entries() {
        let node = transform(json!({ "transforms": [
            { "type": "static", "property": "scale", "value": 2.0 },
            { "type": "animated", "property": "rotate", "nodeTag": 5 }
        ]}));
        assert_eq!(
            node.entries,
            vec![
                TransformEntry::Static {
                    property: "scale".into(),
                    value: 2.0
                },
                TransformEntry::Animated {
                    property: "rotate".into(),
                    node_tag: Tag(5)
                },
            ]
        );
        assert_eq!(node.node_refs().collect::<Vec<_>>(), vec![Tag(5)]);
    }

    #[test]
    fn rejects_unknown_entry_type_and_missing_fields() {
        for bad in [
            json!({ "transforms": [{ "type": "skewed", "property": "x", "value": 1.0 }] }),
            json!({ "transforms": [{ "type": "animated", "property": "x" }] }),
            json!({ "transforms": [{ "type": "static", "value": 1.0 }] }),
            json!({ "transform": [] }),
        ] {
            let err = TransformNode::from_config(Tag(2), bad.as_object().unwrap()).unwrap_err();
            assert!(matches!(err, AnimatedError::InvalidConfig { tag: Tag(2), .. }));
        }
    }

    #[test]
    fn repeated_properties_keep_declared_order() {
        let node = transform(json!({ "transforms": [
            { "type": "static", "property": "rotate", "value": 10.0 },
            { "type": "static", "property": "translateY", "value": 3.0 },
            { "type": "static", "property": "rotate", "value": 20.0 }
        ]}));
        let mut props = PropsMap::new();
        node.collect_view_updates(Tag(2), &Graph::new(), &mut props)
            .unwrap();
        assert_eq!(
            props[TRANSFORM_KEY],
            json!([{ "rotate": 10.0 }, { "translateY": 3.0 }, { "rotate": 20.0 }])
        );
    }

    #[test]
    fn non_scalar_reference_leaves_props_untouched() {
        let mut graph = Graph::new();
        graph
            .create(
                Tag(7),
                NodeEntry::new(AnimatedNode::Style(StyleNode::default())),
            )
            .unwrap();
        graph
            .create(Tag(5), NodeEntry::new(AnimatedNode::Value(ValueNode::new(1.0))))
            .unwrap();
        let node = transform(json!({ "transforms": [
            { "type": "animated", "property": "rotate", "nodeTag": 5 },
            { "type": "animated", "property": "scale", "nodeTag": 7 }
        ]}));
        let mut props = PropsMap::new();
        let err = node
            .collect_view_updates(Tag(2), &graph, &mut props)
            .unwrap_err();
        assert_eq!(
            err,
            AnimatedError::UnsupportedNodeType {
                tag: Tag(7),
                expected: "a value node",
                actual: "style"
            }
        );
        assert!(props.is_empty());
    }
}
