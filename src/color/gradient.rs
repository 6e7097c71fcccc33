//! Display colors for round identifiers.
//!
//! Sequence mode maps each rank onto a single-hue lightness ramp. Memory
//! mode assigns every pairing key a random, clearly distinguishable color
//! that stays fixed for the round.

use rustc_hash::FxHashMap;

use super::rgb::{Hsl, Rgb};
use crate::core::{ColorId, GameRng};

/// Lightness of rank 0, in percent.
pub const GRADIENT_MIN_LIGHTNESS: f64 = 20.0;
/// Lightness span across the ramp, in percent.
pub const GRADIENT_LIGHTNESS_SPAN: f64 = 60.0;
/// Saturation of every gradient block, in percent.
pub const GRADIENT_SATURATION: f64 = 80.0;

/// Position of `identifier` along the ramp, in `[0, 1]`.
///
/// A single-block round sits at the midpoint.
#[must_use]
pub fn gradient_position(identifier: ColorId, total_count: usize) -> f64 {
    if total_count <= 1 {
        return 0.5;
    }
    let max_rank = (total_count - 1) as f64;
    (f64::from(identifier.raw()) / max_rank).clamp(0.0, 1.0)
}

/// Lightness (percent) of `identifier` on the ramp.
#[must_use]
pub fn gradient_lightness(identifier: ColorId, total_count: usize) -> f64 {
    GRADIENT_MIN_LIGHTNESS + GRADIENT_LIGHTNESS_SPAN * gradient_position(identifier, total_count)
}

/// Color of `identifier` on a ramp of `total_count` blocks with hue `base_hue`.
#[must_use]
pub fn gradient_color(identifier: ColorId, total_count: usize, base_hue: f64) -> Rgb {
    Hsl::new(
        base_hue,
        GRADIENT_SATURATION,
        gradient_lightness(identifier, total_count),
    )
    .to_rgb()
}

/// Random color for a memory pair: any hue, saturation 70-100%,
/// lightness 40-70%.
pub fn random_distinct_color(rng: &mut GameRng) -> Rgb {
    let hue = f64::from(rng.gen_range(0..360));
    let saturation = f64::from(rng.gen_range(70..100));
    let lightness = f64::from(rng.gen_range(40..70));
    Hsl::new(hue, saturation, lightness).to_rgb()
}

/// Pair colors for one memory round, keyed by pairing key.
///
/// Both tiles of a pair read their color from here, so they always render
/// identically.
#[derive(Clone, Debug, Default)]
pub struct MemoryPalette {
    colors: FxHashMap<ColorId, Rgb>,
}

impl MemoryPalette {
    /// Create an empty palette.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a color to every distinct key, in first-seen order.
    pub fn for_keys(keys: &[ColorId], rng: &mut GameRng) -> Self {
        let mut palette = Self::new();
        for &key in keys {
            palette.color_for(key, rng);
        }
        palette
    }

    /// Color for `key`, generating one on first use.
    pub fn color_for(&mut self, key: ColorId, rng: &mut GameRng) -> Rgb {
        *self
            .colors
            .entry(key)
            .or_insert_with(|| random_distinct_color(rng))
    }

    /// Cached color for `key`.
    #[must_use]
    pub fn get(&self, key: ColorId) -> Option<Rgb> {
        self.colors.get(&key).copied()
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// True when no colors have been assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}
