//! Animated node variants and their construction from JSON configs.
//!
//! Each node kind parses its loosely typed config exactly once into a typed
//! variant. Evaluation is split in two steps so that a node can read its
//! inputs from the shared [`Graph`] and only then be mutated:
//!
//! - [`AnimatedNode::evaluate`] reads inputs and returns an [`Evaluation`].
//! - [`AnimatedNode::apply`] stores the result on the node.
//!
//! Style, props and transform nodes are pulled by the props node they feed,
//! so their own evaluation step is a no-op.

use crate::error::{AnimatedError, Result};
use crate::store::NodeStore;
use rnhost_api_core::{PropsMap, Tag};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};

mod arithmetic;
mod interpolation;
mod style;
mod transform;
mod value;

pub use arithmetic::{ArithmeticNode, ArithmeticOp, DiffClampNode, ModulusNode};
pub use interpolation::{interpolate, Extrapolate, InterpolationNode};
pub use style::{PropSource, PropsNode, StyleNode};
pub use transform::{TransformEntry, TransformNode};
pub use value::ValueNode;

/// Arena of animated nodes owned by the manager.
pub type Graph = NodeStore<NodeEntry>;

/// A node plus the tags of the nodes that read from it.
#[derive(Debug)]
pub struct NodeEntry {
    pub node: AnimatedNode,
    pub children: Vec<Tag>,
}

impl NodeEntry {
    pub fn new(node: AnimatedNode) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }
}

/// Discriminant of [`AnimatedNode`], matching the `type` strings on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Value,
    Style,
    Props,
    Transform,
    Interpolation,
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Modulus,
    DiffClamp,
}

impl NodeKind {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "value" => NodeKind::Value,
            "style" => NodeKind::Style,
            "props" => NodeKind::Props,
            "transform" => NodeKind::Transform,
            "interpolation" => NodeKind::Interpolation,
            "addition" => NodeKind::Addition,
            "subtraction" => NodeKind::Subtraction,
            "multiplication" => NodeKind::Multiplication,
            "division" => NodeKind::Division,
            "modulus" => NodeKind::Modulus,
            "diffclamp" => NodeKind::DiffClamp,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Value => "value",
            NodeKind::Style => "style",
            NodeKind::Props => "props",
            NodeKind::Transform => "transform",
            NodeKind::Interpolation => "interpolation",
            NodeKind::Addition => "addition",
            NodeKind::Subtraction => "subtraction",
            NodeKind::Multiplication => "multiplication",
            NodeKind::Division => "division",
            NodeKind::Modulus => "modulus",
            NodeKind::DiffClamp => "diffclamp",
        }
    }

    /// Whether nodes of this kind resolve to a single number.
    pub fn is_scalar(self) -> bool {
        !matches!(
            self,
            NodeKind::Style | NodeKind::Props | NodeKind::Transform
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnimatedNode {
    Value(ValueNode),
    Style(StyleNode),
    Props(PropsNode),
    Transform(TransformNode),
    Interpolation(InterpolationNode),
    Arithmetic(ArithmeticNode),
    Modulus(ModulusNode),
    DiffClamp(DiffClampNode),
}

/// Result of reading a node's inputs, applied afterwards with [`AnimatedNode::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// Nothing to store (value nodes, pulled nodes).
    Unchanged,
    Scalar(f64),
    DiffClamp { value: f64, last_input: f64 },
    /// Props computed for the view a props node is connected to.
    View { view_tag: Tag, props: PropsMap },
}

pub(crate) fn parse_config<T: DeserializeOwned>(
    tag: Tag,
    kind: NodeKind,
    config: &Map<String, JsonValue>,
) -> Result<T> {
    serde_json::from_value(JsonValue::Object(config.clone()))
        .map_err(|e| AnimatedError::invalid_config(tag, format!("{} config: {e}", kind.as_str())))
}

/// Read the current scalar of `tag` on behalf of `from`.
///
/// A missing node is a dangling reference; a non-scalar node is rejected.
pub(crate) fn read_scalar(graph: &Graph, from: Tag, tag: Tag) -> Result<f64> {
    let entry = graph
        .get(tag)
        .map_err(|_| AnimatedError::DanglingReference { from, tag })?;
    let value = entry
        .node
        .scalar()
        .ok_or(AnimatedError::UnsupportedNodeType {
            tag,
            expected: "a value node",
            actual: entry.node.kind().as_str(),
        })?;
    finite(tag, value)
}

/// `null` on the wire resets a prop, so infinities and NaN are errors.
pub(crate) fn finite(tag: Tag, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AnimatedError::NonFiniteValue { tag })
    }
}

impl AnimatedNode {
    /// Build a node of `kind` from its wire config.
    pub fn from_config(tag: Tag, kind: &str, config: &Map<String, JsonValue>) -> Result<Self> {
        let kind = NodeKind::parse(kind)
            .ok_or_else(|| AnimatedError::invalid_config(tag, format!("unknown node type '{kind}'")))?;
        let node = match kind {
            NodeKind::Value => AnimatedNode::Value(ValueNode::from_config(tag, config)?),
            NodeKind::Style => AnimatedNode::Style(StyleNode::from_config(tag, config)?),
            NodeKind::Props => AnimatedNode::Props(PropsNode::from_config(tag, config)?),
            NodeKind::Transform => AnimatedNode::Transform(TransformNode::from_config(tag, config)?),
            NodeKind::Interpolation => {
                AnimatedNode::Interpolation(InterpolationNode::from_config(tag, config)?)
            }
            NodeKind::Addition => {
                AnimatedNode::Arithmetic(ArithmeticNode::from_config(tag, ArithmeticOp::Add, config)?)
            }
            NodeKind::Subtraction => AnimatedNode::Arithmetic(ArithmeticNode::from_config(
                tag,
                ArithmeticOp::Subtract,
                config,
            )?),
            NodeKind::Multiplication => AnimatedNode::Arithmetic(ArithmeticNode::from_config(
                tag,
                ArithmeticOp::Multiply,
                config,
            )?),
            NodeKind::Division => AnimatedNode::Arithmetic(ArithmeticNode::from_config(
                tag,
                ArithmeticOp::Divide,
                config,
            )?),
            NodeKind::Modulus => AnimatedNode::Modulus(ModulusNode::from_config(tag, config)?),
            NodeKind::DiffClamp => AnimatedNode::DiffClamp(DiffClampNode::from_config(tag, config)?),
        };
        Ok(node)
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            AnimatedNode::Value(_) => NodeKind::Value,
            AnimatedNode::Style(_) => NodeKind::Style,
            AnimatedNode::Props(_) => NodeKind::Props,
            AnimatedNode::Transform(_) => NodeKind::Transform,
            AnimatedNode::Interpolation(_) => NodeKind::Interpolation,
            AnimatedNode::Arithmetic(n) => n.op.kind(),
            AnimatedNode::Modulus(_) => NodeKind::Modulus,
            AnimatedNode::DiffClamp(_) => NodeKind::DiffClamp,
        }
    }

    /// Current resolved number for scalar nodes, `None` otherwise.
    pub fn scalar(&self) -> Option<f64> {
        match self {
            AnimatedNode::Value(n) => Some(n.get()),
            AnimatedNode::Interpolation(n) => Some(n.value),
            AnimatedNode::Arithmetic(n) => Some(n.value),
            AnimatedNode::Modulus(n) => Some(n.value),
            AnimatedNode::DiffClamp(n) => Some(n.value),
            AnimatedNode::Style(_) | AnimatedNode::Props(_) | AnimatedNode::Transform(_) => None,
        }
    }

    /// Tags named in this node's config together with the kind of node each
    /// one must be. Checked once when the node is created.
    pub fn references(&self) -> Vec<(Tag, Requirement)> {
        match self {
            AnimatedNode::Value(_) | AnimatedNode::Interpolation(_) => Vec::new(),
            AnimatedNode::Style(n) => n
                .node_refs()
                .map(|t| (t, Requirement::StyleInput))
                .collect(),
            AnimatedNode::Props(n) => n
                .node_refs()
                .map(|t| (t, Requirement::PropsInput))
                .collect(),
            AnimatedNode::Transform(n) => n
                .node_refs()
                .map(|t| (t, Requirement::Scalar))
                .collect(),
            AnimatedNode::Arithmetic(n) => {
                n.inputs.iter().map(|t| (*t, Requirement::Scalar)).collect()
            }
            AnimatedNode::Modulus(n) => vec![(n.input, Requirement::Scalar)],
            AnimatedNode::DiffClamp(n) => vec![(n.input, Requirement::Scalar)],
        }
    }

    /// Read inputs from `graph` and compute this node's new state.
    pub fn evaluate(&self, tag: Tag, graph: &Graph) -> Result<Evaluation> {
        match self {
            AnimatedNode::Value(_) | AnimatedNode::Style(_) | AnimatedNode::Transform(_) => {
                Ok(Evaluation::Unchanged)
            }
            AnimatedNode::Props(n) => match n.view_tag {
                Some(view_tag) => Ok(Evaluation::View {
                    view_tag,
                    props: n.collect_view_updates(tag, graph)?,
                }),
                None => Ok(Evaluation::Unchanged),
            },
            AnimatedNode::Interpolation(n) => {
                finite(tag, n.evaluate(tag, graph)?).map(Evaluation::Scalar)
            }
            AnimatedNode::Arithmetic(n) => {
                finite(tag, n.evaluate(tag, graph)?).map(Evaluation::Scalar)
            }
            AnimatedNode::Modulus(n) => {
                finite(tag, n.evaluate(tag, graph)?).map(Evaluation::Scalar)
            }
            AnimatedNode::DiffClamp(n) => {
                let (value, last_input) = n.evaluate(tag, graph)?;
                Ok(Evaluation::DiffClamp {
                    value: finite(tag, value)?,
                    last_input,
                })
            }
        }
    }

    /// Store an evaluation result computed by [`AnimatedNode::evaluate`].
    pub fn apply(&mut self, evaluation: &Evaluation) {
        match (self, evaluation) {
            (AnimatedNode::Interpolation(n), Evaluation::Scalar(v)) => n.value = *v,
            (AnimatedNode::Arithmetic(n), Evaluation::Scalar(v)) => n.value = *v,
            (AnimatedNode::Modulus(n), Evaluation::Scalar(v)) => n.value = *v,
            (AnimatedNode::DiffClamp(n), Evaluation::DiffClamp { value, last_input }) => {
                n.value = *value;
                n.last_input = *last_input;
            }
            (AnimatedNode::Props(n), Evaluation::View { props, .. }) => {
                n.remember_emitted(props);
            }
            _ => {}
        }
    }

    /// Called when `parent` starts feeding this node.
    pub fn on_attached(&mut self, tag: Tag, parent: Tag) -> Result<()> {
        if let AnimatedNode::Interpolation(n) = self {
            return n.attach(tag, parent);
        }
        Ok(())
    }

    /// Called when `parent` stops feeding this node.
    pub fn on_detached(&mut self, parent: Tag) {
        if let AnimatedNode::Interpolation(n) = self {
            n.detach(parent);
        }
    }

    pub fn as_value_mut(&mut self) -> Option<&mut ValueNode> {
        match self {
            AnimatedNode::Value(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_props_mut(&mut self) -> Option<&mut PropsNode> {
        match self {
            AnimatedNode::Props(n) => Some(n),
            _ => None,
        }
    }
}

/// What a referenced tag must resolve to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Requirement {
    Scalar,
    /// Scalar or transform.
    StyleInput,
    /// Scalar, transform or style.
    PropsInput,
}

impl Requirement {
    pub fn accepts(self, kind: NodeKind) -> bool {
        match self {
            Requirement::Scalar => kind.is_scalar(),
            Requirement::StyleInput => kind.is_scalar() || kind == NodeKind::Transform,
            Requirement::PropsInput => kind != NodeKind::Props,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Requirement::Scalar => "a value node",
            Requirement::StyleInput => "a value or transform node",
            Requirement::PropsInput => "a value, transform or style node",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cfg(v: JsonValue) -> Map<String, JsonValue> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn unknown_type_is_invalid_config() {
        let err = AnimatedNode::from_config(Tag(1), "tracking", &Map::new()).unwrap_err();
        assert!(matches!(err, AnimatedError::InvalidConfig { tag: Tag(1), .. }));
    }

    #[test]
    fn kinds_round_trip_through_strings() {
        for s in [
            "value",
            "style",
            "props",
            "transform",
            "interpolation",
            "addition",
            "subtraction",
            "multiplication",
            "division",
            "modulus",
            "diffclamp",
        ] {
            assert_eq!(NodeKind::parse(s).map(NodeKind::as_str), Some(s));
        }
    }

    #[test]
    fn arithmetic_kinds_report_their_operation() {
        let node =
            AnimatedNode::from_config(Tag(4), "multiplication", &cfg(json!({ "input": [1, 2] })))
                .unwrap();
        assert_eq!(node.kind(), NodeKind::Multiplication);
        assert_eq!(node.scalar(), Some(0.0));
        assert_eq!(
            node.references(),
            vec![(Tag(1), Requirement::Scalar), (Tag(2), Requirement::Scalar)]
        );
    }

    #[test]
    fn requirement_acceptance() {
        assert!(Requirement::Scalar.accepts(NodeKind::Interpolation));
        assert!(!Requirement::Scalar.accepts(NodeKind::Transform));
        assert!(Requirement::StyleInput.accepts(NodeKind::Transform));
        assert!(!Requirement::StyleInput.accepts(NodeKind::Style));
        assert!(Requirement::PropsInput.accepts(NodeKind::Style));
        assert!(!Requirement::PropsInput.accepts(NodeKind::Props));
    }
}
