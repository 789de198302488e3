//! Scalar nodes derived from other scalar nodes.

use crate::error::{AnimatedError, Result};
use rnhost_api_core::Tag;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use super::{parse_config, read_scalar, Graph, NodeKind};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    pub fn kind(self) -> NodeKind {
        match self {
            ArithmeticOp::Add => NodeKind::Addition,
            ArithmeticOp::Subtract => NodeKind::Subtraction,
            ArithmeticOp::Multiply => NodeKind::Multiplication,
            ArithmeticOp::Divide => NodeKind::Division,
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ArithmeticConfig {
    input: Vec<Tag>,
}

/// Left fold of its inputs, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ArithmeticNode {
    pub op: ArithmeticOp,
    pub inputs: Vec<Tag>,
    pub value: f64,
}

impl ArithmeticNode {
    pub(crate) fn from_config(
        tag: Tag,
        op: ArithmeticOp,
        config: &Map<String, JsonValue>,
    ) -> Result<Self> {
        let cfg: ArithmeticConfig = parse_config(tag, op.kind(), config)?;
        if cfg.input.is_empty() {
            return Err(AnimatedError::invalid_config(tag, "input must not be empty"));
        }
        Ok(Self {
            op,
            inputs: cfg.input,
            value: 0.0,
        })
    }

    pub(crate) fn evaluate(&self, tag: Tag, graph: &Graph) -> Result<f64> {
        let mut inputs = self.inputs.iter();
        let first = match inputs.next() {
            Some(t) => read_scalar(graph, tag, *t)?,
            None => return Ok(0.0),
        };
        inputs.try_fold(first, |acc, t| {
            let v = read_scalar(graph, tag, *t)?;
            Ok(match self.op {
                ArithmeticOp::Add => acc + v,
                ArithmeticOp::Subtract => acc - v,
                ArithmeticOp::Multiply => acc * v,
                ArithmeticOp::Divide => {
                    if v == 0.0 {
                        return Err(AnimatedError::DivisionByZero { tag });
                    }
                    acc / v
                }
            })
        })
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ModulusConfig {
    input: Tag,
    modulus: f64,
}

/// Always-positive remainder of its input.
#[derive(Debug, Clone, PartialEq)]
pub struct ModulusNode {
    pub input: Tag,
    pub modulus: f64,
    pub value: f64,
}

impl ModulusNode {
    pub(crate) fn from_config(tag: Tag, config: &Map<String, JsonValue>) -> Result<Self> {
        let cfg: ModulusConfig = parse_config(tag, NodeKind::Modulus, config)?;
        if cfg.modulus == 0.0 {
            return Err(AnimatedError::invalid_config(tag, "modulus must not be zero"));
        }
        Ok(Self {
            input: cfg.input,
            modulus: cfg.modulus,
            value: 0.0,
        })
    }

    pub(crate) fn evaluate(&self, tag: Tag, graph: &Graph) -> Result<f64> {
        let v = read_scalar(graph, tag, self.input)?;
        let m = self.modulus;
        Ok(((v % m) + m) % m)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DiffClampConfig {
    input: Tag,
    min: f64,
    max: f64,
}

/// Accumulates changes of its input, clamped to `[min, max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffClampNode {
    pub input: Tag,
    pub min: f64,
    pub max: f64,
    pub value: f64,
    pub last_input: f64,
}

impl DiffClampNode {
    pub(crate) fn from_config(tag: Tag, config: &Map<String, JsonValue>) -> Result<Self> {
        let cfg: DiffClampConfig = parse_config(tag, NodeKind::DiffClamp, config)?;
        if cfg.min > cfg.max {
            return Err(AnimatedError::invalid_config(
                tag,
                format!("min {} is greater than max {}", cfg.min, cfg.max),
            ));
        }
        Ok(Self {
            input: cfg.input,
            min: cfg.min,
            max: cfg.max,
            value: 0.0,
            last_input: 0.0,
        })
    }

    /// New `(value, last_input)` pair.
    pub(crate) fn evaluate(&self, tag: Tag, graph: &Graph) -> Result<(f64, f64)> {
        let input = read_scalar(graph, tag, self.input)?;
        let diff = input - self.last_input;
        Ok(((self.value + diff).clamp(self.min, self.max), input))
    }
}
