//! Color vision deficiency simulation.
//!
//! Each deficiency is a fixed 3x3 linear transform over RGB channels.
//! Outputs are rounded and clamped to `[0, 255]`.

use serde::{Deserialize, Serialize};

use super::rgb::Rgb;

/// Vision simulation applied uniformly to every color in a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisionFilter {
    #[default]
    None,
    Protanopia,
    Deuteranopia,
    Tritanopia,
}

const PROTANOPIA: [[f64; 3]; 3] = [
    [0.56667, 0.43333, 0.0],
    [0.55833, 0.44167, 0.0],
    [0.0, 0.24167, 0.75833],
];

const DEUTERANOPIA: [[f64; 3]; 3] = [
    [0.625, 0.375, 0.0],
    [0.7, 0.3, 0.0],
    [0.0, 0.3, 0.7],
];

const TRITANOPIA: [[f64; 3]; 3] = [
    [0.95, 0.0, 0.05],
    [0.0, 0.43333, 0.56667],
    [0.0, 0.475, 0.525],
];

impl VisionFilter {
    /// All filters, `None` first.
    pub const ALL: [VisionFilter; 4] = [
        VisionFilter::None,
        VisionFilter::Protanopia,
        VisionFilter::Deuteranopia,
        VisionFilter::Tritanopia,
    ];

    /// Row-major transform, or `None` for the identity filter.
    #[must_use]
    pub const fn matrix(self) -> Option<&'static [[f64; 3]; 3]> {
        match self {
            VisionFilter::None => None,
            VisionFilter::Protanopia => Some(&PROTANOPIA),
            VisionFilter::Deuteranopia => Some(&DEUTERANOPIA),
            VisionFilter::Tritanopia => Some(&TRITANOPIA),
        }
    }

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            VisionFilter::None => "none",
            VisionFilter::Protanopia => "protanopia",
            VisionFilter::Deuteranopia => "deuteranopia",
            VisionFilter::Tritanopia => "tritanopia",
        }
    }
}

impl std::fmt::Display for VisionFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VisionFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VisionFilter::ALL
            .into_iter()
            .find(|filter| filter.as_str() == s)
            .ok_or_else(|| format!("unknown vision filter: {s}"))
    }
}

/// Apply a vision filter to a color.
#[must_use]
pub fn apply_vision_filter(color: Rgb, filter: VisionFilter) -> Rgb {
    let Some(m) = filter.matrix() else {
        return color;
    };
    apply_matrix(color.channels(), m)
}

/// Apply a row-major 3x3 transform to raw channels, clamping the result.
///
/// Raw channels may lie outside `[0, 255]`; the output never does.
#[must_use]
pub fn apply_matrix(c: [f64; 3], m: &[[f64; 3]; 3]) -> Rgb {
    let row = |i: usize| m[i][0] * c[0] + m[i][1] * c[1] + m[i][2] * c[2];
    Rgb::from_channels(row(0), row(1), row(2))
}
