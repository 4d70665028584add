//! Common types for scrubline
//!
//! Shared constants and the colour type used by configuration, the renderer
//! and the pixel buffers handed to the host.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Default vertical headroom reserved above the loudest peak (30%)
pub const DEFAULT_PADDING: f64 = 0.3;

/// Default interval between redraw ticks in milliseconds
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

/// Channel layouts an overview can be drawn for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    Mono,
    Stereo,
}

impl ChannelLayout {
    /// Map a raw channel count, rejecting anything but 1 or 2
    pub fn from_count(channels: u16) -> Option<Self> {
        match channels {
            1 => Some(ChannelLayout::Mono),
            2 => Some(ChannelLayout::Stereo),
            _ => None,
        }
    }

    /// Number of channels (and therefore drawing lanes)
    pub fn count(self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }
}

/// 8-bit RGBA colour, laid out exactly as one pixel of a `PixelBuffer`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable)]
#[repr(C)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const BLUE: Rgba = Rgba::rgb(0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque colour
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }
}

/// Error returned when a colour string is not `#RRGGBB` or `#RRGGBBAA`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid colour '{0}': expected #RRGGBB or #RRGGBBAA")]
pub struct ParseColorError(pub String);

impl FromStr for Rgba {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(err());
        }

        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        let a = if hex.len() == 8 { byte(6)? } else { 255 };
        Ok(Rgba::new(byte(0)?, byte(2)?, byte(4)?, a))
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_layout_from_count() {
        assert_eq!(ChannelLayout::from_count(1), Some(ChannelLayout::Mono));
        assert_eq!(ChannelLayout::from_count(2), Some(ChannelLayout::Stereo));
        assert_eq!(ChannelLayout::from_count(0), None);
        assert_eq!(ChannelLayout::from_count(6), None);
    }

    #[test]
    fn test_color_parse_and_display() {
        let c: Rgba = "#F68656".parse().unwrap();
        assert_eq!(c, Rgba::rgb(246, 134, 86));
        assert_eq!(c.to_string(), "#F68656");

        let t: Rgba = "#00000000".parse().unwrap();
        assert_eq!(t, Rgba::TRANSPARENT);
        assert_eq!(t.to_string(), "#00000000");
    }

    #[test]
    fn test_color_parse_rejects_garbage() {
        assert!("F68656".parse::<Rgba>().is_err());
        assert!("#F686".parse::<Rgba>().is_err());
        assert!("#GG8656".parse::<Rgba>().is_err());
    }

    #[test]
    fn test_rgba_is_four_bytes() {
        let pixels = [Rgba::rgb(1, 2, 3), Rgba::new(4, 5, 6, 7)];
        let bytes: &[u8] = bytemuck::cast_slice(&pixels);
        assert_eq!(bytes, &[1, 2, 3, 255, 4, 5, 6, 7]);
    }
}
