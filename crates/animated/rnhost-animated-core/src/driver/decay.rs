use crate::config::ManagerConfig;
use crate::error::Result;
use rnhost_api_core::Tag;
use serde::Deserialize;

use super::{default_iterations, AnimationDriver};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecayConfig {
    /// Initial velocity, in units per millisecond.
    pub velocity: f64,
    #[serde(default = "DecayConfig::default_deceleration")]
    pub deceleration: f64,
    #[serde(default = "default_iterations")]
    pub iterations: i32,
}

impl DecayConfig {
    fn default_deceleration() -> f64 {
        0.998
    }
}

/// Exponentially slowing motion that stops once ticks stop moving the value.
#[derive(Debug, Clone)]
pub struct DecayCurve {
    velocity: f64,
    deceleration: f64,
    rest_threshold: f64,
    /// Head start applied to each iteration so its first tick already moves.
    lead_ms: f64,
    last_value: f64,
}

impl DecayCurve {
    pub fn new(node: Tag, config: DecayConfig, cfg: &ManagerConfig) -> Result<Self> {
        if !(0.0..1.0).contains(&config.deceleration) || config.deceleration == 0.0 {
            return Err(AnimationDriver::invalid(
                node,
                format!("deceleration {} must be in (0, 1)", config.deceleration),
            ));
        }
        Ok(Self {
            velocity: config.velocity,
            deceleration: config.deceleration,
            rest_threshold: cfg.decay_rest_threshold,
            lead_ms: cfg.frame_interval_ms,
            last_value: 0.0,
        })
    }

    pub(super) fn restart(&mut self, from: f64) {
        self.last_value = from;
    }

    pub(super) fn advance(&mut self, elapsed_ms: f64, from: f64) -> (f64, bool) {
        let t = elapsed_ms + self.lead_ms;
        let k = 1.0 - self.deceleration;
        let value = from + self.velocity / k * (1.0 - (-k * t).exp());
        let done = (self.last_value - value).abs() < self.rest_threshold;
        self.last_value = value;
        (value, done)
    }
}
