//! Configuration for the nodes manager.

use serde::{Deserialize, Serialize};

/// Frame interval the frame-based driver samples its curve at (60 fps).
pub const DEFAULT_FRAME_INTERVAL_MS: f64 = 1000.0 / 60.0;

/// Configuration for manager sizing and driver constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Spacing of the precomputed samples of a `frames` animation, in milliseconds.
    pub frame_interval_ms: f64,
    /// A `decay` animation stops once a tick moves the value by less than this.
    pub decay_rest_threshold: f64,
    /// Initial capacity hint for the node store.
    pub node_capacity: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            decay_rest_threshold: 0.1,
            node_capacity: 64,
        }
    }
}
