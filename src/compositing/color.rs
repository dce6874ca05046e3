use crate::error::Error;
use crate::types::Image;
use image::{Rgba, RgbaImage};
use std::str::FromStr;

/// 8-bit RGBA color used for solid backgrounds and chroma keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const GRAY: Color = Color::rgb(128, 128, 128);

    /// Swatches offered for background replacement
    pub const PALETTE: [(&'static str, Color); 5] = [
        ("red", Color::RED),
        ("green", Color::GREEN),
        ("blue", Color::BLUE),
        ("white", Color::WHITE),
        ("gray", Color::GRAY),
    ];

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Accepts a palette name or `#rrggbb` / `#rrggbbaa`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        if let Some((_, color)) = Self::PALETTE.iter().find(|(n, _)| *n == name || (name == "grey" && *n == "gray")) {
            return Ok(*color);
        }

        let hex = name
            .strip_prefix('#')
            .ok_or_else(|| Error::InvalidColor(s.to_string()))?;
        if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidColor(s.to_string()));
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| Error::InvalidColor(s.to_string()));
        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a,
        })
    }
}

/// Solid image of `color`, sized to match the foreground it will back
pub fn solid_image(color: Color, width: u32, height: u32) -> Image {
    Image::new(RgbaImage::from_pixel(width, height, color.to_rgba()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_palette_names() {
        assert_eq!("Red".parse::<Color>().unwrap(), Color::RED);
        assert_eq!("grey".parse::<Color>().unwrap(), Color::GRAY);
    }

    #[test]
    fn parses_hex() {
        assert_eq!("#102030".parse::<Color>().unwrap(), Color::rgb(0x10, 0x20, 0x30));
        let translucent = "#10203080".parse::<Color>().unwrap();
        assert_eq!(translucent.a, 0x80);
        assert!("#12345".parse::<Color>().is_err());
        assert!("purple".parse::<Color>().is_err());
        assert!("#gg0000".parse::<Color>().is_err());
    }

    #[test]
    fn solid_image_matches_requested_size() {
        let image = solid_image(Color::BLUE, 200, 150);
        assert_eq!(image.dimensions(), (200, 150));
        assert!(image.pixels().pixels().all(|p| p.0 == [0, 0, 255, 255]));
    }
}
