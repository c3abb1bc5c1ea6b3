//! Core configuration for pinscroll-core.

use serde::{Deserialize, Serialize};

use crate::error::{ChoreoError, Result};
use crate::interp::Ease;

/// Engine-wide tuning. Defaults reproduce the reference landing page.
/// Phase bounds are fixed in [`crate::timeline::Phase`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Pinned scroll distance as a multiple of the viewport height.
    pub pin_distance_vh: f32,
    /// Lower bound for the pinned distance in raw scroll units.
    pub min_pin_distance: f32,
    /// Seconds the applied progress takes to catch up with the scroll position.
    /// `0.0` applies progress immediately.
    pub scrub_lag: f32,
    pub snap: SnapConfig,
}

/// Snap policy tuning.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SnapConfig {
    pub enabled: bool,
    /// Tolerance around each normalized range that still counts as "inside".
    pub epsilon: f32,
    /// Seconds after start (or after a span change) before the registry is rebuilt.
    pub settle_delay: f32,
    pub duration_min: f32,
    pub duration_max: f32,
    /// Normalized distance at which a snap takes `duration_max`.
    pub duration_reference_distance: f32,
    pub ease: Ease,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pin_distance_vh: 1.3,
            min_pin_distance: 1.0,
            scrub_lag: 0.6,
            snap: SnapConfig::default(),
        }
    }
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            epsilon: 0.02,
            settle_delay: 0.5,
            duration_min: 0.15,
            duration_max: 0.35,
            duration_reference_distance: 0.1,
            ease: Ease::Power2Out,
        }
    }
}

impl Config {
    /// Config with scrub smoothing disabled, so progress tracks scroll exactly.
    pub fn immediate() -> Self {
        Self {
            scrub_lag: 0.0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        fn check(ok: bool, msg: &str) -> Result<()> {
            if ok {
                Ok(())
            } else {
                Err(ChoreoError::InvalidConfig(msg.to_string()))
            }
        }
        check(
            self.pin_distance_vh.is_finite() && self.pin_distance_vh > 0.0,
            "pin_distance_vh must be finite and > 0",
        )?;
        check(
            self.min_pin_distance.is_finite() && self.min_pin_distance > 0.0,
            "min_pin_distance must be finite and > 0",
        )?;
        check(
            self.scrub_lag.is_finite() && self.scrub_lag >= 0.0,
            "scrub_lag must be finite and >= 0",
        )?;
        let s = &self.snap;
        check(
            s.epsilon.is_finite() && (0.0..0.5).contains(&s.epsilon),
            "snap.epsilon must be in [0, 0.5)",
        )?;
        check(
            s.settle_delay.is_finite() && s.settle_delay >= 0.0,
            "snap.settle_delay must be >= 0",
        )?;
        check(
            s.duration_min.is_finite() && s.duration_min >= 0.0 && s.duration_min <= s.duration_max,
            "snap duration must satisfy 0 <= min <= max",
        )?;
        check(
            s.duration_reference_distance.is_finite() && s.duration_reference_distance > 0.0,
            "snap.duration_reference_distance must be > 0",
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        Config::default().validate().unwrap();
        Config::immediate().validate().unwrap();
    }

    #[test]
    fn rejects_inverted_snap_durations() {
        let mut cfg = Config::default();
        cfg.snap.duration_min = 0.5;
        cfg.snap.duration_max = 0.1;
        assert!(matches!(cfg.validate(), Err(ChoreoError::InvalidConfig(_))));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "scrub_lag": 0.0, "snap": { "epsilon": 0.05 } }"#)
            .unwrap();
        assert_eq!(cfg.scrub_lag, 0.0);
        assert_eq!(cfg.snap.epsilon, 0.05);
        assert_eq!(cfg.snap.duration_max, 0.35);
        assert_eq!(cfg.pin_distance_vh, 1.3);
    }
}
