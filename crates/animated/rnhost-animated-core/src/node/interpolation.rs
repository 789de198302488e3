//! Piecewise-linear mapping from an input value node onto an output range.

use crate::error::{AnimatedError, Result};
use rnhost_api_core::Tag;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use super::{parse_config, read_scalar, Graph, NodeKind};

/// Behaviour outside the first/last input breakpoint.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extrapolate {
    /// Continue the edge segment linearly.
    #[default]
    Extend,
    /// Hold the edge output.
    Clamp,
    /// Pass the input through unchanged.
    Identity,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct InterpolationConfig {
    input_range: Vec<f64>,
    output_range: Vec<f64>,
    #[serde(default)]
    extrapolate_left: Extrapolate,
    #[serde(default)]
    extrapolate_right: Extrapolate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterpolationNode {
    pub input_range: Vec<f64>,
    pub output_range: Vec<f64>,
    pub extrapolate_left: Extrapolate,
    pub extrapolate_right: Extrapolate,
    /// Node feeding this interpolation, set when the edge is connected.
    pub parent: Option<Tag>,
    pub value: f64,
}

impl InterpolationNode {
    pub(crate) fn from_config(tag: Tag, config: &Map<String, JsonValue>) -> Result<Self> {
        let cfg: InterpolationConfig = parse_config(tag, NodeKind::Interpolation, config)?;
        if cfg.input_range.len() < 2 {
            return Err(AnimatedError::invalid_config(
                tag,
                "inputRange needs at least two breakpoints",
            ));
        }
        if cfg.input_range.len() != cfg.output_range.len() {
            return Err(AnimatedError::invalid_config(
                tag,
                format!(
                    "inputRange has {} entries but outputRange has {}",
                    cfg.input_range.len(),
                    cfg.output_range.len()
                ),
            ));
        }
        if cfg.input_range.windows(2).any(|w| w[1] < w[0]) {
            return Err(AnimatedError::invalid_config(
                tag,
                "inputRange must be non-decreasing",
            ));
        }
        Ok(Self {
            input_range: cfg.input_range,
            output_range: cfg.output_range,
            extrapolate_left: cfg.extrapolate_left,
            extrapolate_right: cfg.extrapolate_right,
            parent: None,
            value: 0.0,
        })
    }

    pub(crate) fn attach(&mut self, tag: Tag, parent: Tag) -> Result<()> {
        match self.parent {
            Some(existing) if existing != parent => Err(AnimatedError::invalid_config(
                tag,
                format!("interpolation already reads from node {existing}"),
            )),
            _ => {
                self.parent = Some(parent);
                Ok(())
            }
        }
    }

    pub(crate) fn detach(&mut self, parent: Tag) {
        if self.parent == Some(parent) {
            self.parent = None;
        }
    }

    pub(crate) fn evaluate(&self, tag: Tag, graph: &Graph) -> Result<f64> {
        let parent = self.parent.ok_or(AnimatedError::NotAttached { tag })?;
        let input = read_scalar(graph, tag, parent)?;
        Ok(interpolate(
            input,
            &self.input_range,
            &self.output_range,
            self.extrapolate_left,
            self.extrapolate_right,
        ))
    }
}

fn interpolate_segment(
    value: f64,
    (in_min, in_max): (f64, f64),
    (out_min, out_max): (f64, f64),
    left: Extrapolate,
    right: Extrapolate,
) -> f64 {
    let mut result = value;

    if result < in_min {
        match left {
            Extrapolate::Identity => return result,
            Extrapolate::Clamp => result = in_min,
            Extrapolate::Extend => {}
        }
    }
    if result > in_max {
        match right {
            Extrapolate::Identity => return result,
            Extrapolate::Clamp => result = in_max,
            Extrapolate::Extend => {}
        }
    }

    if out_min == out_max {
        return out_min;
    }
    if in_min == in_max {
        return if value <= in_min { out_min } else { out_max };
    }
    out_min + (out_max - out_min) * (result - in_min) / (in_max - in_min)
}

/// Index of the segment `[input[i], input[i + 1]]` that `value` falls into.
/// Values past either end use the edge segment.
fn find_segment(value: f64, input: &[f64]) -> usize {
    let mut i = 1;
    while i < input.len() - 1 && input[i] < value {
        i += 1;
    }
    i - 1
}

/// Map `value` through the breakpoints. Ranges must have equal length ≥ 2.
pub fn interpolate(
    value: f64,
    input: &[f64],
    output: &[f64],
    left: Extrapolate,
    right: Extrapolate,
) -> f64 {
    let i = find_segment(value, input);
    interpolate_segment(
        value,
        (input[i], input[i + 1]),
        (output[i], output[i + 1]),
        left,
        right,
    )
}
