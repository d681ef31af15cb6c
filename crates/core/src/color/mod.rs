use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Result, SceneError};

/// Straight (non premultiplied) 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const RED: Rgba = Rgba::rgb(255, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Channels as floats in `[0, 1]`, alpha dropped.
    pub fn to_unit_rgb(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }

    /// Parses a color literal: a name, `R:G:B` with 0-255 components, or
    /// `#RRGGBB` / `#RRGGBBAA`.
    pub fn parse(input: &str) -> Result<Self> {
        let value = input.trim();
        let invalid = || SceneError::parse("color", input);

        if let Some(hex) = value.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(invalid);
        }

        if value.contains(':') {
            let parts = value
                .split(':')
                .map(|p| p.trim().parse::<u8>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| invalid())?;
            return match parts.as_slice() {
                [r, g, b] => Ok(Self::rgb(*r, *g, *b)),
                _ => Err(invalid()),
            };
        }

        named(&value.to_ascii_lowercase()).ok_or_else(invalid)
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

impl FromStr for Rgba {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.r, self.g, self.b)
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.is_ascii() {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        6 => Some(Rgba::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Rgba::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

fn named(name: &str) -> Option<Rgba> {
    let color = match name {
        "white" => Rgba::WHITE,
        "black" => Rgba::BLACK,
        "red" => Rgba::RED,
        "green" => Rgba::rgb(0, 255, 0),
        "blue" => Rgba::rgb(0, 0, 255),
        "yellow" => Rgba::rgb(255, 255, 0),
        "magenta" => Rgba::rgb(255, 0, 255),
        "cyan" | "aqua" => Rgba::rgb(0, 255, 255),
        "grey" | "gray" => Rgba::rgb(128, 128, 128),
        "orange" => Rgba::rgb(255, 128, 0),
        "brown" => Rgba::rgb(180, 77, 25),
        "purple" => Rgba::rgb(128, 0, 255),
        "violet" => Rgba::rgb(255, 0, 255),
        "indigo" => Rgba::rgb(0, 128, 255),
        _ => return None,
    };
    Some(color)
}

/// Linear ramp used to color single-channel raster data.
///
/// Stops run yellow, green, cyan, blue, magenta from the minimum to the
/// maximum value.
pub fn ramp(value: f32, min: f32, max: f32) -> Rgba {
    const STOPS: [[f32; 3]; 5] = [
        [255.0, 255.0, 0.0],
        [0.0, 255.0, 0.0],
        [0.0, 255.0, 255.0],
        [0.0, 0.0, 255.0],
        [255.0, 0.0, 255.0],
    ];

    let span = max - min;
    let t = if span > f32::EPSILON && value.is_finite() {
        ((value - min) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let scaled = t * (STOPS.len() - 1) as f32;
    let lo = (scaled.floor() as usize).min(STOPS.len() - 2);
    let frac = scaled - lo as f32;
    let mix = |c: usize| {
        let v = STOPS[lo][c] + (STOPS[lo + 1][c] - STOPS[lo][c]) * frac;
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgba::rgb(mix(0), mix(1), mix(2))
}
