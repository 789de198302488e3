use crate::config::ManagerConfig;
use crate::error::Result;
use rnhost_api_core::Tag;
use serde::Deserialize;

use super::{default_iterations, AnimationDriver};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FramesConfig {
    /// Progress samples in `[0, 1]`, one per frame interval.
    pub frames: Vec<f64>,
    pub to_value: f64,
    #[serde(default = "default_iterations")]
    pub iterations: i32,
}

/// Pre-sampled easing curve played back at the configured frame rate.
#[derive(Debug, Clone)]
pub struct FramesCurve {
    frames: Vec<f64>,
    to_value: f64,
    frame_interval_ms: f64,
}

impl FramesCurve {
    pub fn new(node: Tag, config: FramesConfig, cfg: &ManagerConfig) -> Result<Self> {
        if config.frames.is_empty() {
            return Err(AnimationDriver::invalid(node, "frames must not be empty"));
        }
        if cfg.frame_interval_ms.is_nan() || cfg.frame_interval_ms <= 0.0 {
            return Err(AnimationDriver::invalid(node, "frame interval must be positive"));
        }
        Ok(Self {
            frames: config.frames,
            to_value: config.to_value,
            frame_interval_ms: cfg.frame_interval_ms,
        })
    }

    pub(super) fn advance(&mut self, elapsed_ms: f64, from: f64) -> (f64, bool) {
        let index = (elapsed_ms / self.frame_interval_ms).round() as usize;
        let last = self.frames.len() - 1;
        if index >= last {
            (self.to_value, true)
        } else {
            (from + self.frames[index] * (self.to_value - from), false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(frames: &[f64], to: f64) -> FramesCurve {
        FramesCurve::new(
            Tag(1),
            FramesConfig {
                frames: frames.to_vec(),
                to_value: to,
                iterations: 1,
            },
            &ManagerConfig {
                frame_interval_ms: 10.0,
                ..ManagerConfig::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn samples_by_frame_index() {
        let mut c = curve(&[0.0, 0.25, 0.5, 1.0], 100.0);
        assert_eq!(c.advance(0.0, 0.0), (0.0, false));
        assert_eq!(c.advance(9.0, 0.0), (25.0, false));
        assert_eq!(c.advance(21.0, 0.0), (50.0, false));
        assert_eq!(c.advance(30.0, 0.0), (100.0, true));
    }

    #[test]
    fn last_frame_writes_target_exactly() {
        let mut c = curve(&[0.0, 0.9], 1.0);
        assert_eq!(c.advance(500.0, 0.3), (1.0, true));
    }

    #[test]
    fn single_frame_finishes_immediately() {
        let mut c = curve(&[1.0], 7.0);
        assert_eq!(c.advance(0.0, 0.0), (7.0, true));
    }

    #[test]
    fn rejects_empty_frames() {
        let err = FramesCurve::new(
            Tag(1),
            FramesConfig {
                frames: vec![],
                to_value: 1.0,
                iterations: 1,
            },
            &ManagerConfig::default(),
        );
        assert!(err.is_err());
    }
}
