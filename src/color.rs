use std::str::FromStr;

use eframe::egui::Color32;
use palette::{Darken, Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Chart colours
// ---------------------------------------------------------------------------

/// Accent used for the trend line and the leading bar of each ranking.
pub const HIGHLIGHT_HEX: &str = "#90CAF9";

/// Fill for the remaining bars.
pub const MUTED_HEX: &str = "#D3D3D3";

/// Parse a `#RRGGBB` hex string.
pub fn hex_color(hex: &str) -> Option<Color32> {
    let rgb = Srgb::<u8>::from_str(hex).ok()?;
    Some(Color32::from_rgb(rgb.red, rgb.green, rgb.blue))
}

/// A darker shade of `color`, used for bar outlines.
pub fn darken(color: Color32, amount: f32) -> Color32 {
    let rgb = Srgb::new(color.r(), color.g(), color.b()).into_format::<f32>();
    let hsl: Hsl = rgb.into_color();
    let rgb: Srgb = hsl.darken(amount).into_color();
    let rgb = rgb.into_format::<u8>();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

/// Ranking bar colours: the first bar highlighted, the rest muted.
#[derive(Debug, Clone, Copy)]
pub struct BarPalette {
    pub highlight: Color32,
    pub muted: Color32,
}

impl Default for BarPalette {
    fn default() -> Self {
        Self {
            highlight: hex_color(HIGHLIGHT_HEX).unwrap_or(Color32::LIGHT_BLUE),
            muted: hex_color(MUTED_HEX).unwrap_or(Color32::LIGHT_GRAY),
        }
    }
}

impl BarPalette {
    pub fn fill(&self, position: usize) -> Color32 {
        if position == 0 {
            self.highlight
        } else {
            self.muted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_color() {
        assert_eq!(hex_color("#90CAF9"), Some(Color32::from_rgb(0x90, 0xCA, 0xF9)));
        assert_eq!(hex_color("#d3d3d3"), Some(Color32::from_rgb(0xD3, 0xD3, 0xD3)));
        assert_eq!(hex_color("not a colour"), None);
    }

    #[test]
    fn test_palette_highlights_first_bar_only() {
        let palette = BarPalette::default();
        assert_eq!(palette.fill(0), Color32::from_rgb(0x90, 0xCA, 0xF9));
        assert!((1..5).all(|i| palette.fill(i) == Color32::from_rgb(0xD3, 0xD3, 0xD3)));
    }

    #[test]
    fn test_darken_reduces_brightness() {
        let base = Color32::from_rgb(0x90, 0xCA, 0xF9);
        let dark = darken(base, 0.3);
        let sum = |c: Color32| c.r() as u32 + c.g() as u32 + c.b() as u32;
        assert!(sum(dark) < sum(base));
    }
}
