use crate::error::{AnimatedError, Result};
use indexmap::IndexMap;
use rnhost_api_core::{PropsMap, Tag};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use super::{finite, parse_config, AnimatedNode, Graph, NodeKind, Requirement};

/// Where a style or props entry gets its value from.
///
/// On the wire a bare integer is a node tag and `{ "value": .. }` is a literal.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PropSource {
    Node(Tag),
    Literal { value: JsonValue },
}

fn node_refs(entries: &IndexMap<String, PropSource>) -> impl Iterator<Item = Tag> + '_ {
    entries.values().filter_map(|source| match source {
        PropSource::Node(tag) => Some(*tag),
        PropSource::Literal { .. } => None,
    })
}

/// Resolve `entries` into `out`. Style nodes may only be nested inside props.
fn collect_entries(
    tag: Tag,
    entries: &IndexMap<String, PropSource>,
    requirement: Requirement,
    graph: &Graph,
    out: &mut PropsMap,
) -> Result<()> {
    for (name, source) in entries {
        let source_tag = match source {
            PropSource::Literal { value } => {
                out.insert(name.clone(), value.clone());
                continue;
            }
            PropSource::Node(source_tag) => *source_tag,
        };
        let entry = graph
            .get(source_tag)
            .map_err(|_| AnimatedError::DanglingReference {
                from: tag,
                tag: source_tag,
            })?;
        let kind = entry.node.kind();
        if !requirement.accepts(kind) {
            return Err(AnimatedError::UnsupportedNodeType {
                tag: source_tag,
                expected: requirement.describe(),
                actual: kind.as_str(),
            });
        }
        match &entry.node {
            AnimatedNode::Transform(transform) => {
                transform.collect_view_updates(source_tag, graph, out)?
            }
            AnimatedNode::Style(style) => style.collect_view_updates(source_tag, graph, out)?,
            node => {
                if let Some(v) = node.scalar() {
                    out.insert(name.clone(), JsonValue::from(finite(source_tag, v)?));
                }
            }
        }
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StyleConfig {
    style: IndexMap<String, PropSource>,
}

/// Named group of style properties, flattened into the props that reference it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleNode {
    pub entries: IndexMap<String, PropSource>,
}

impl StyleNode {
    pub(crate) fn from_config(tag: Tag, config: &Map<String, JsonValue>) -> Result<Self> {
        let cfg: StyleConfig = parse_config(tag, NodeKind::Style, config)?;
        Ok(Self { entries: cfg.style })
    }

    pub(crate) fn node_refs(&self) -> impl Iterator<Item = Tag> + '_ {
        node_refs(&self.entries)
    }

    /// Resolve every entry and merge the result into `props`.
    ///
    /// Nothing is merged when any entry fails.
    pub fn collect_view_updates(&self, tag: Tag, graph: &Graph, props: &mut PropsMap) -> Result<()> {
        let mut local = PropsMap::new();
        collect_entries(tag, &self.entries, Requirement::StyleInput, graph, &mut local)?;
        props.extend(local);
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PropsConfig {
    props: IndexMap<String, PropSource>,
}

/// Output node: the full set of animated props for one native view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropsNode {
    pub entries: IndexMap<String, PropSource>,
    pub view_tag: Option<Tag>,
    /// Keys sent to the view so far; nulled when the view is disconnected.
    emitted: Vec<String>,
}

impl PropsNode {
    pub(crate) fn from_config(tag: Tag, config: &Map<String, JsonValue>) -> Result<Self> {
        let cfg: PropsConfig = parse_config(tag, NodeKind::Props, config)?;
        Ok(Self {
            entries: cfg.props,
            ..Default::default()
        })
    }

    pub(crate) fn node_refs(&self) -> impl Iterator<Item = Tag> + '_ {
        node_refs(&self.entries)
    }

    pub fn collect_view_updates(&self, tag: Tag, graph: &Graph) -> Result<PropsMap> {
        let mut props = PropsMap::new();
        collect_entries(tag, &self.entries, Requirement::PropsInput, graph, &mut props)?;
        Ok(props)
    }

    pub fn connect_to_view(&mut self, tag: Tag, view_tag: Tag) -> Result<()> {
        match self.view_tag {
            Some(current) if current != view_tag => Err(AnimatedError::ViewConnection {
                tag,
                reason: format!("already connected to view {current}"),
            }),
            _ => {
                self.view_tag = Some(view_tag);
                Ok(())
            }
        }
    }

    /// Disconnect from `view_tag`, returning a reset that nulls every prop
    /// previously sent to it.
    pub fn disconnect_from_view(&mut self, tag: Tag, view_tag: Tag) -> Result<PropsMap> {
        if self.view_tag != Some(view_tag) {
            return Err(AnimatedError::ViewConnection {
                tag,
                reason: format!("not connected to view {view_tag}"),
            });
        }
        self.view_tag = None;
        Ok(self
            .emitted
            .drain(..)
            .map(|key| (key, JsonValue::Null))
            .collect())
    }

    pub(crate) fn remember_emitted(&mut self, props: &PropsMap) {
        for key in props.keys() {
            if !self.emitted.iter().any(|k| k == key) {
                self.emitted.push(key.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeEntry, TransformNode, ValueNode};
    use serde_json::json;

    fn obj(v: JsonValue) -> Map<String, JsonValue> {
        v.as_object().cloned().unwrap()
    }

    fn graph_with(nodes: Vec<(i32, AnimatedNode)>) -> Graph {
        let mut graph = Graph::new();
        for (tag, node) in nodes {
            graph.create(Tag(tag), NodeEntry::new(node)).unwrap();
        }
        graph
    }

    #[test]
    fn bare_integers_are_tags_and_objects_are_literals() {
        let node = PropsNode::from_config(
            Tag(3),
            &obj(json!({ "props": { "style": 2, "pointerEvents": { "value": "none" } } })),
        )
        .unwrap();
        assert_eq!(node.entries["style"], PropSource::Node(Tag(2)));
        assert_eq!(
            node.entries["pointerEvents"],
            PropSource::Literal {
                value: json!("none")
            }
        );
        assert_eq!(node.node_refs().collect::<Vec<_>>(), vec![Tag(2)]);
    }

    #[test]
    fn props_flatten_style_and_transform() {
        let transform = TransformNode::from_config(
            Tag(11),
            &obj(json!({ "transforms": [{ "type": "animated", "property": "scale", "nodeTag": 10 }] })),
        )
        .unwrap();
        let style = StyleNode::from_config(
            Tag(12),
            &obj(json!({ "style": { "opacity": 10, "transform": 11, "zIndex": { "value": 2 } } })),
        )
        .unwrap();
        let graph = graph_with(vec![
            (10, AnimatedNode::Value(ValueNode::new(0.25))),
            (11, AnimatedNode::Transform(transform)),
            (12, AnimatedNode::Style(style)),
        ]);
        let props =
            PropsNode::from_config(Tag(13), &obj(json!({ "props": { "style": 12 } }))).unwrap();
        let out = props.collect_view_updates(Tag(13), &graph).unwrap();
        assert_eq!(out["opacity"], json!(0.25));
        assert_eq!(out["zIndex"], json!(2));
        assert_eq!(out["transform"], json!([{ "scale": 0.25 }]));
    }

    #[test]
    fn style_rejects_nested_style() {
        let graph = graph_with(vec![(1, AnimatedNode::Style(StyleNode::default()))]);
        let style =
            StyleNode::from_config(Tag(2), &obj(json!({ "style": { "inner": 1 } }))).unwrap();
        let mut out = PropsMap::new();
        let err = style
            .collect_view_updates(Tag(2), &graph, &mut out)
            .unwrap_err();
        assert!(matches!(
            err,
            AnimatedError::UnsupportedNodeType {
                tag: Tag(1),
                actual: "style",
                ..
            }
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn missing_source_is_dangling() {
        let props =
            PropsNode::from_config(Tag(3), &obj(json!({ "props": { "opacity": 99 } }))).unwrap();
        let err = props.collect_view_updates(Tag(3), &Graph::new()).unwrap_err();
        assert_eq!(
            err,
            AnimatedError::DanglingReference {
                from: Tag(3),
                tag: Tag(99)
            }
        );
    }

    #[test]
    fn view_connection_lifecycle() {
        let mut props = PropsNode::default();
        props.connect_to_view(Tag(3), Tag(100)).unwrap();
        props.connect_to_view(Tag(3), Tag(100)).unwrap();
        assert!(props.connect_to_view(Tag(3), Tag(101)).is_err());

        let mut emitted = PropsMap::new();
        emitted.insert("opacity".into(), json!(0.5));
        props.remember_emitted(&emitted);

        assert!(props.disconnect_from_view(Tag(3), Tag(101)).is_err());
        let reset = props.disconnect_from_view(Tag(3), Tag(100)).unwrap();
        assert_eq!(reset["opacity"], JsonValue::Null);
        assert_eq!(props.view_tag, None);
    }
}
