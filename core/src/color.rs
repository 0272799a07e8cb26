//! RGBA color with 8-bit channels.
//!
//! Colors are kept byte-exact in the persisted document and normalized to a
//! `Vec4` only at upload time. The GPU-side bit layout matches a `vec4`
//! uniform, which is why a color-named `vec4` uniform can be retyped to
//! [`Color`] without changing the shader.

use glam::Vec4;
use serde::{Deserialize, Serialize};

/// An RGBA color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0, 255);

    /// Opaque magenta — the sentinel for a color binding nobody has set yet.
    /// Loud on screen, and never a legitimate default.
    pub const MAGENTA: Color = Color::new(255, 0, 255, 255);

    /// Create a color from channel values.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Normalize to a `[0, 1]` float vector for uniform upload.
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            f32::from(self.a) / 255.0,
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}
