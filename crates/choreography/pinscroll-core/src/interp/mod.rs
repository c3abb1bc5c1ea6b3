//! Easing curves used by timeline entries and snap motions.
//! Names follow the timeline library the choreography was authored in.

pub mod functions;

use serde::{Deserialize, Serialize};

use functions::bezier_ease_t;

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Ease {
    /// Linear.
    #[default]
    #[serde(rename = "none")]
    None,
    /// Cubic ease-in (slow start, committed finish).
    #[serde(rename = "power2.in")]
    Power2In,
    /// Cubic ease-out (fast start, gentle landing).
    #[serde(rename = "power2.out")]
    Power2Out,
    /// CSS-style cubic-bezier timing `(x1, y1, x2, y2)`.
    #[serde(rename = "cubic_bezier")]
    CubicBezier([f32; 4]),
}

impl Ease {
    /// Map linear time `t` in [0,1] to eased time. Input is clamped; endpoints are exact.
    #[inline]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::None => t,
            Ease::Power2In => t * t * t,
            Ease::Power2Out => {
                let u = 1.0 - t;
                1.0 - u * u * u
            }
            Ease::CubicBezier([x1, y1, x2, y2]) => bezier_ease_t(t, x1, y1, x2, y2),
        }
    }
}
