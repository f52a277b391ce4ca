//! Colors and the image-source interface the quadtree samples from.
//!
//! [`Color`] is a plain value: two colors with equal channels compare
//! equal and hash identically, so it can key maps directly without an
//! interning table. Its canonical string form is six lowercase hex
//! digits (`"ff8000"`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::Dimensions;

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Create a color from its channels.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Canonical lowercase hex form without a leading `#`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

/// Error parsing a hex color string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex color {0:?}: expected six hex digits")]
pub struct ParseColorError(String);

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ParseColorError(s.to_owned()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| ParseColorError(s.to_owned()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

/// A read-only raster the pipeline samples colors from.
///
/// `color_at` must be defined and deterministic for every
/// `0 <= x < width`, `0 <= y < height`. Sampling outside that range is a
/// caller bug; implementations may panic.
///
/// `Sync` is required because subtrees of the quadtree are built on
/// separate threads against the same source.
pub trait ColorSource: Sync {
    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// Color of the pixel at `(x, y)`.
    fn color_at(&self, x: u32, y: u32) -> Color;

    /// Width and height together.
    fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }
}

impl ColorSource for image::RgbaImage {
    fn width(&self) -> u32 {
        self.width()
    }

    fn height(&self) -> u32 {
        self.height()
    }

    /// Alpha is ignored.
    fn color_at(&self, x: u32, y: u32) -> Color {
        let [red, green, blue, _] = self.get_pixel(x, y).0;
        Color::new(red, green, blue)
    }
}

impl ColorSource for image::RgbImage {
    fn width(&self) -> u32 {
        self.width()
    }

    fn height(&self) -> u32 {
        self.height()
    }

    fn color_at(&self, x: u32, y: u32) -> Color {
        let [red, green, blue] = self.get_pixel(x, y).0;
        Color::new(red, green, blue)
    }
}

/// An in-memory grid of colors, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorGrid {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl ColorGrid {
    /// Build a grid by evaluating `f` at every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Color) -> Self {
        let pixels = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// A grid filled with a single color.
    #[must_use]
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        Self::from_fn(width, height, |_, _| color)
    }

    /// Overwrite one pixel. Out-of-range coordinates are ignored.
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        if x < self.width && y < self.height {
            let i = self.offset(x, y);
            self.pixels[i] = color;
        }
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }
}

impl ColorSource for ColorGrid {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn color_at(&self, x: u32, y: u32) -> Color {
        self.pixels[self.offset(x, y)]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn hex_is_zero_padded_lowercase() {
        assert_eq!(Color::new(255, 8, 0).to_hex(), "ff0800");
        assert_eq!(Color::new(1, 2, 3).to_string(), "#010203");
    }

    #[test]
    fn parse_accepts_optional_hash() {
        let c = Color::new(0xab, 0xcd, 0xef);
        assert_eq!("abcdef".parse::<Color>().unwrap(), c);
        assert_eq!("#ABCDEF".parse::<Color>().unwrap(), c);
        assert_eq!(c.to_hex().parse::<Color>().unwrap(), c);
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!("abcde".parse::<Color>().is_err());
        assert!("gg0000".parse::<Color>().is_err());
        assert!("#00000é".parse::<Color>().is_err());
    }

    #[test]
    fn equal_channels_hash_identically() {
        let set: HashSet<Color> = [Color::new(1, 2, 3), Color::new(1, 2, 3)].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn rgba_image_ignores_alpha() {
        let img = image::RgbaImage::from_fn(2, 1, |x, _| image::Rgba([10, 20, 30, x as u8 * 100]));
        assert_eq!(img.color_at(0, 0), img.color_at(1, 0));
        assert_eq!(ColorSource::dimensions(&img), Dimensions { width: 2, height: 1 });
    }

    #[test]
    fn grid_is_row_major() {
        let mut grid = ColorGrid::from_fn(3, 2, |x, y| Color::new(x as u8, y as u8, 0));
        assert_eq!(grid.color_at(2, 1), Color::new(2, 1, 0));
        grid.set(0, 1, Color::WHITE);
        grid.set(9, 9, Color::WHITE);
        assert_eq!(grid.color_at(0, 1), Color::WHITE);
        assert_eq!(grid.color_at(0, 0), Color::BLACK);
    }
}
