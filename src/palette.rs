//! Resolved scene colors.

use crate::config::PaletteConfig;
use crate::error::ConfigError;
use glam::Vec3;

/// Fraction of the tree radius covered by the core→mid leg of the gradient.
pub const CORE_BAND: f32 = 0.4;

/// Scene colors as RGB in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub background: Vec3,
    pub tree_core: Vec3,
    pub tree_mid: Vec3,
    pub tree_outer: Vec3,
    pub snow: Vec3,
    pub ring_gold: Vec3,
    pub star: Vec3,
}

impl Palette {
    /// Resolve every hex string in the configuration.
    pub fn from_config(config: &PaletteConfig) -> Result<Self, ConfigError> {
        let resolve = |field: &'static str, hex: &str| {
            parse_hex(hex).map_err(|reason| ConfigError::invalid(field, reason))
        };
        Ok(Self {
            background: resolve("palette.background", &config.background)?,
            tree_core: resolve("palette.tree_core", &config.tree_core)?,
            tree_mid: resolve("palette.tree_mid", &config.tree_mid)?,
            tree_outer: resolve("palette.tree_outer", &config.tree_outer)?,
            snow: resolve("palette.snow", &config.snow)?,
            ring_gold: resolve("palette.ring_gold", &config.ring_gold)?,
            star: resolve("palette.star", &config.star)?,
        })
    }

    /// Two-leg radial gradient of the tree.
    ///
    /// `ratio` is the particle's distance from the cone axis divided by the
    /// cone radius at its height: core→mid over `[0, 0.4)`, mid→outer beyond.
    pub fn tree_gradient(&self, ratio: f32) -> Vec3 {
        if ratio < CORE_BAND {
            self.tree_core.lerp(self.tree_mid, ratio / CORE_BAND)
        } else {
            self.tree_mid
                .lerp(self.tree_outer, (ratio - CORE_BAND) / (1.0 - CORE_BAND))
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: rgb(0x05, 0x02, 0x05),
            tree_core: rgb(0xff, 0x00, 0x55),
            tree_mid: rgb(0xff, 0x5e, 0x78),
            tree_outer: rgb(0xff, 0xbd, 0x69),
            snow: rgb(0xff, 0xff, 0xff),
            ring_gold: rgb(0xff, 0xeb, 0x3b),
            star: rgb(0xff, 0xf0, 0xf5),
        }
    }
}

fn rgb(r: u8, g: u8, b: u8) -> Vec3 {
    Vec3::new(r as f32, g as f32, b as f32) / 255.0
}

/// Parse `#rrggbb` (leading `#` optional) into RGB in `[0, 1]`.
pub fn parse_hex(hex: &str) -> Result<Vec3, String> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(format!("expected #rrggbb, got {hex:?}"));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map(|c| c as f32 / 255.0)
            .map_err(|_| format!("expected #rrggbb, got {hex:?}"))
    };
    Ok(Vec3::new(channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        let c = parse_hex("#ff0055").unwrap();
        assert!((c.x - 1.0).abs() < 1e-6);
        assert_eq!(c.y, 0.0);
        assert!((c.z - 85.0 / 255.0).abs() < 1e-6);
        assert_eq!(parse_hex("ffffff").unwrap(), Vec3::ONE);
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex("#fff").is_err());
        assert!(parse_hex("#gg0000").is_err());
        assert!(parse_hex("#ff00é").is_err());
    }

    #[test]
    fn test_default_matches_default_config() {
        let resolved = Palette::from_config(&PaletteConfig::default()).unwrap();
        assert_eq!(resolved, Palette::default());
    }

    #[test]
    fn test_gradient_endpoints() {
        let p = Palette::default();
        assert_eq!(p.tree_gradient(0.0), p.tree_core);
        assert!((p.tree_gradient(CORE_BAND) - p.tree_mid).length() < 1e-6);
        assert!((p.tree_gradient(1.0) - p.tree_outer).length() < 1e-6);
    }

    #[test]
    fn test_gradient_is_continuous_at_band_edge() {
        let p = Palette::default();
        let below = p.tree_gradient(CORE_BAND - 1e-4);
        let above = p.tree_gradient(CORE_BAND + 1e-4);
        assert!((below - above).length() < 1e-3);
    }
}
