use crate::error::Result;
use rnhost_api_core::Tag;
use serde::Deserialize;

use super::{default_iterations, AnimationDriver};

/// Longest step the spring integrates over in a single tick, in seconds.
const MAX_DELTA_S: f64 = 0.064;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpringConfig {
    pub to_value: f64,
    #[serde(default = "SpringConfig::default_stiffness")]
    pub stiffness: f64,
    #[serde(default = "SpringConfig::default_damping")]
    pub damping: f64,
    #[serde(default = "SpringConfig::default_mass")]
    pub mass: f64,
    #[serde(default)]
    pub initial_velocity: f64,
    #[serde(default)]
    pub overshoot_clamping: bool,
    #[serde(default = "SpringConfig::default_threshold")]
    pub rest_displacement_threshold: f64,
    #[serde(default = "SpringConfig::default_threshold")]
    pub rest_speed_threshold: f64,
    #[serde(default = "default_iterations")]
    pub iterations: i32,
}

impl SpringConfig {
    fn default_stiffness() -> f64 {
        100.0
    }
    fn default_damping() -> f64 {
        10.0
    }
    fn default_mass() -> f64 {
        1.0
    }
    fn default_threshold() -> f64 {
        0.001
    }
}

/// Damped harmonic oscillator solved in closed form.
#[derive(Debug, Clone)]
pub struct SpringCurve {
    config: SpringConfig,
    /// Integrated time of the current iteration, in seconds.
    time_s: f64,
    last_elapsed_ms: f64,
}

impl SpringCurve {
    pub fn new(node: Tag, config: SpringConfig) -> Result<Self> {
        if config.mass.is_nan() || config.mass <= 0.0 {
            return Err(AnimationDriver::invalid(node, "mass must be positive"));
        }
        if config.stiffness.is_nan() || config.stiffness < 0.0 {
            return Err(AnimationDriver::invalid(node, "stiffness must not be negative"));
        }
        if config.damping.is_nan() || config.damping < 0.0 {
            return Err(AnimationDriver::invalid(node, "damping must not be negative"));
        }
        Ok(Self {
            config,
            time_s: 0.0,
            last_elapsed_ms: 0.0,
        })
    }

    pub(super) fn restart(&mut self) {
        self.time_s = 0.0;
        self.last_elapsed_ms = 0.0;
    }

    /// Position and velocity `t` seconds after release from `from`.
    fn solve(&self, from: f64, t: f64) -> (f64, f64) {
        let c = &self.config;
        let to = c.to_value;
        let v0 = -c.initial_velocity;
        let zeta = c.damping / (2.0 * (c.stiffness * c.mass).sqrt());
        let omega0 = (c.stiffness / c.mass).sqrt();
        let x0 = to - from;

        if zeta < 1.0 {
            // Under-damped.
            let omega1 = omega0 * (1.0 - zeta * zeta).sqrt();
            let envelope = (-zeta * omega0 * t).exp();
            let a = v0 + zeta * omega0 * x0;
            let (sin, cos) = (omega1 * t).sin_cos();
            let position = to - envelope * (a / omega1 * sin + x0 * cos);
            let velocity = zeta * omega0 * envelope * (sin * a / omega1 + x0 * cos)
                - envelope * (cos * a - omega1 * x0 * sin);
            (position, velocity)
        } else {
            // Critically damped; also covers the over-damped and zero-stiffness cases.
            let envelope = (-omega0 * t).exp();
            let position = to - envelope * (x0 + (v0 + omega0 * x0) * t);
            let velocity = envelope * (v0 * (t * omega0 - 1.0) + t * x0 * omega0 * omega0);
            (position, velocity)
        }
    }

    pub(super) fn advance(&mut self, elapsed_ms: f64, from: f64) -> (f64, bool) {
        let delta_s = ((elapsed_ms - self.last_elapsed_ms) / 1000.0).clamp(0.0, MAX_DELTA_S);
        self.last_elapsed_ms = elapsed_ms;
        self.time_s += delta_s;

        let c = &self.config;
        let (position, velocity) = self.solve(from, self.time_s);

        let at_rest = velocity.abs() <= c.rest_speed_threshold
            && ((c.to_value - position).abs() <= c.rest_displacement_threshold
                || c.stiffness == 0.0);
        let overshot = c.overshoot_clamping
            && c.stiffness != 0.0
            && if from < c.to_value {
                position > c.to_value
            } else {
                position < c.to_value
            };

        if at_rest || overshot {
            let settled = if c.stiffness != 0.0 { c.to_value } else { position };
            (settled, true)
        } else {
            (position, false)
        }
    }
}
