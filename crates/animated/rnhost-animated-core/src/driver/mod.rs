//! Animation drivers: per-tick producers of new values for a value node.
//!
//! A driver moves through `Idle → Running → (Completed | Cancelled)`. It is
//! idle until its first tick, which captures the node's current value as the
//! starting point. Each tick returns the next value to write; once the last
//! iteration finishes the driver is `Completed` and produces nothing more.

use crate::config::ManagerConfig;
use crate::error::{AnimatedError, Result};
use rnhost_api_core::Tag;
use serde::{Deserialize, Serialize};

mod decay;
mod frames;
mod spring;

pub use decay::{DecayConfig, DecayCurve};
pub use frames::{FramesConfig, FramesCurve};
pub use spring::{SpringConfig, SpringCurve};

/// Identifier chosen by the declarative layer for one running animation.
pub type AnimationId = i32;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl DriverState {
    pub fn is_finished(self) -> bool {
        matches!(self, DriverState::Completed | DriverState::Cancelled)
    }
}

/// Wire config of an animation, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnimationConfig {
    Frames(FramesConfig),
    Spring(SpringConfig),
    Decay(DecayConfig),
}

impl AnimationConfig {
    pub fn iterations(&self) -> i32 {
        match self {
            AnimationConfig::Frames(c) => c.iterations,
            AnimationConfig::Spring(c) => c.iterations,
            AnimationConfig::Decay(c) => c.iterations,
        }
    }
}

fn default_iterations() -> i32 {
    1
}

/// Shape of the value over one iteration.
#[derive(Debug, Clone)]
pub enum Curve {
    Frames(FramesCurve),
    Spring(SpringCurve),
    Decay(DecayCurve),
}

impl Curve {
    /// Value `elapsed_ms` into the current iteration, and whether the iteration is over.
    fn advance(&mut self, elapsed_ms: f64, from: f64) -> (f64, bool) {
        match self {
            Curve::Frames(c) => c.advance(elapsed_ms, from),
            Curve::Spring(c) => c.advance(elapsed_ms, from),
            Curve::Decay(c) => c.advance(elapsed_ms, from),
        }
    }

    fn restart(&mut self, from: f64) {
        match self {
            Curve::Frames(_) => {}
            Curve::Spring(c) => c.restart(),
            Curve::Decay(c) => c.restart(from),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnimationDriver {
    pub id: AnimationId,
    pub node: Tag,
    state: DriverState,
    curve: Curve,
    /// Total iterations; -1 repeats forever.
    iterations: i32,
    current_loop: i32,
    iteration_start_ms: Option<f64>,
    from_value: f64,
}

impl AnimationDriver {
    pub fn new(
        id: AnimationId,
        node: Tag,
        config: AnimationConfig,
        cfg: &ManagerConfig,
    ) -> Result<Self> {
        let iterations = config.iterations();
        if iterations < -1 {
            return Err(AnimationDriver::invalid(node, "iterations must be -1 or non-negative"));
        }
        let curve = match config {
            AnimationConfig::Frames(c) => Curve::Frames(FramesCurve::new(node, c, cfg)?),
            AnimationConfig::Spring(c) => Curve::Spring(SpringCurve::new(node, c)?),
            AnimationConfig::Decay(c) => Curve::Decay(DecayCurve::new(node, c, cfg)?),
        };
        Ok(Self {
            id,
            node,
            state: DriverState::Idle,
            curve,
            iterations,
            current_loop: 1,
            iteration_start_ms: None,
            from_value: 0.0,
        })
    }

    pub(crate) fn invalid(node: Tag, reason: impl Into<String>) -> AnimatedError {
        AnimatedError::InvalidAnimation {
            tag: node,
            reason: reason.into(),
        }
    }

    #[inline]
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Advance to `frame_time_ms`. `current` is the node's value before this tick.
    /// Returns the value to write, if any.
    pub fn step(&mut self, frame_time_ms: f64, current: f64) -> Option<f64> {
        match self.state {
            DriverState::Completed | DriverState::Cancelled => return None,
            DriverState::Idle => {
                if self.iterations == 0 {
                    self.state = DriverState::Completed;
                    return None;
                }
                self.from_value = current;
                self.state = DriverState::Running;
            }
            DriverState::Running => {}
        }

        let start = match self.iteration_start_ms {
            Some(start) => start,
            None => {
                self.curve.restart(self.from_value);
                self.iteration_start_ms = Some(frame_time_ms);
                frame_time_ms
            }
        };

        let (value, iteration_done) = self
            .curve
            .advance((frame_time_ms - start).max(0.0), self.from_value);
        if iteration_done {
            if self.iterations == -1 || self.current_loop < self.iterations {
                self.current_loop += 1;
                self.iteration_start_ms = None;
            } else {
                self.state = DriverState::Completed;
            }
        }
        Some(value)
    }

    /// Stop the driver. Values already written stay as they are.
    pub fn cancel(&mut self) {
        if !self.state.is_finished() {
            self.state = DriverState::Cancelled;
        }
    }
}
