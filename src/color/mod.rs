//! Color transforms: identifier to display color, and vision simulation.
//!
//! All functions here are pure. Randomness comes in only through an
//! explicit `GameRng`.

pub mod rgb;
pub mod filter;
pub mod gradient;

pub use rgb::{hsl_to_rgb, Hsl, Rgb};
pub use filter::{apply_vision_filter, VisionFilter};
pub use gradient::{
    gradient_color, gradient_lightness, gradient_position, random_distinct_color, MemoryPalette,
};
