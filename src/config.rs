//! Installation configuration.
//!
//! Every tunable constant of the installation lives in one immutable
//! [`InstallationConfig`] that is validated once and then handed to the
//! constructors. Configurations round-trip through JSON so an installation
//! can be re-tuned on site without a rebuild.
//!
//! ```ignore
//! let config = InstallationConfig::load("installation.json")?;
//! config.validate()?;
//! ```

use crate::error::ConfigError;
use crate::palette::parse_hex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tree cone shape and population size.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TreeConfig {
    /// Total cone height.
    pub height: f32,
    /// Cone radius at its base.
    pub radius: f32,
    /// Number of tree particles.
    pub count: usize,
    /// Upward shift of the whole cone, as a fraction of `height`.
    pub vertical_offset_ratio: f32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            height: 12.0,
            radius: 4.5,
            count: 15_000,
            vertical_offset_ratio: 0.4,
        }
    }
}

/// The two golden annuli around the base of the tree.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RingConfig {
    pub count: usize,
    /// Probability that a particle lands on the inner annulus.
    pub inner_probability: f32,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            count: 6000,
            inner_probability: 0.6,
        }
    }
}

/// Glowing corona above the apex.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StarConfig {
    pub count: usize,
    /// Radius of the solid sphere the corona fills.
    pub radius: f32,
    /// Gap between the top of the tree and the corona centre.
    pub height_above_tree: f32,
}

impl Default for StarConfig {
    fn default() -> Self {
        Self {
            count: 500,
            radius: 0.8,
            height_above_tree: 0.5,
        }
    }
}

/// Ambient snow filling a cube around the scene.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SnowConfig {
    pub count: usize,
    /// Edge length of the bounding cube (centred on the origin).
    pub box_size: f32,
    /// Slowest fall distance per frame.
    pub min_speed: f32,
    /// Fastest fall distance per frame (exclusive).
    pub max_speed: f32,
}

impl Default for SnowConfig {
    fn default() -> Self {
        Self {
            count: 2000,
            box_size: 30.0,
            min_speed: 0.02,
            max_speed: 0.07,
        }
    }
}

/// Colors as `#rrggbb` strings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PaletteConfig {
    pub background: String,
    pub tree_core: String,
    pub tree_mid: String,
    pub tree_outer: String,
    pub snow: String,
    pub ring_gold: String,
    pub star: String,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            background: "#050205".into(),
            tree_core: "#ff0055".into(),
            tree_mid: "#ff5e78".into(),
            tree_outer: "#ffbd69".into(),
            snow: "#ffffff".into(),
            ring_gold: "#ffeb3b".into(),
            star: "#fff0f5".into(),
        }
    }
}

/// Open-hand classification.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GestureConfig {
    /// Openness at or above this value freezes the snow.
    pub open_threshold: f32,
    /// Floor applied to wrist-to-knuckle distances.
    pub epsilon: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            open_threshold: 1.6,
            epsilon: 0.001,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Responsiveness of the exponential approach, per second.
    pub rate: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { rate: 3.0 }
    }
}

/// Where the tree's explosion target comes from.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Default)]
pub enum ExplosionSource {
    /// Follow the gesture: frozen drives the tree fully open.
    #[default]
    Gesture,
    /// Hold a constant target in `[0, 1]`.
    Fixed(f32),
}

/// Complete installation configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct InstallationConfig {
    pub tree: TreeConfig,
    pub rings: RingConfig,
    pub star: StarConfig,
    pub snow: SnowConfig,
    pub palette: PaletteConfig,
    pub gesture: GestureConfig,
    pub smoothing: SmoothingConfig,
    pub explosion: ExplosionSource,
    /// Fixed layout seed. `None` draws a fresh layout every run.
    pub seed: Option<u64>,
}

impl InstallationConfig {
    /// Save the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a configuration from a JSON file. Missing sections take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reject values that would make generation or classification meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("tree.height", self.tree.height)?;
        positive("tree.radius", self.tree.radius)?;
        finite("tree.vertical_offset_ratio", self.tree.vertical_offset_ratio)?;
        unit_interval("rings.inner_probability", self.rings.inner_probability)?;
        positive("star.radius", self.star.radius)?;
        non_negative("star.height_above_tree", self.star.height_above_tree)?;
        positive("snow.box_size", self.snow.box_size)?;
        non_negative("snow.min_speed", self.snow.min_speed)?;
        positive("snow.max_speed", self.snow.max_speed)?;
        if self.snow.min_speed >= self.snow.max_speed {
            return Err(ConfigError::invalid(
                "snow.max_speed",
                format!(
                    "must exceed snow.min_speed ({} >= {})",
                    self.snow.min_speed, self.snow.max_speed
                ),
            ));
        }
        positive("gesture.open_threshold", self.gesture.open_threshold)?;
        positive("gesture.epsilon", self.gesture.epsilon)?;
        positive("smoothing.rate", self.smoothing.rate)?;
        if let ExplosionSource::Fixed(v) = self.explosion {
            unit_interval("explosion", v)?;
        }

        let p = &self.palette;
        for (field, hex) in [
            ("palette.background", &p.background),
            ("palette.tree_core", &p.tree_core),
            ("palette.tree_mid", &p.tree_mid),
            ("palette.tree_outer", &p.tree_outer),
            ("palette.snow", &p.snow),
            ("palette.ring_gold", &p.ring_gold),
            ("palette.star", &p.star),
        ] {
            parse_hex(hex).map_err(|reason| ConfigError::invalid(field, reason))?;
        }
        Ok(())
    }

    /// Total number of particles across all populations.
    pub fn total_particles(&self) -> usize {
        self.tree.count + self.rings.count + self.star.count + self.snow.count
    }
}

fn finite(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be finite, got {v}")))
    }
}

fn positive(field: &'static str, v: f32) -> Result<(), ConfigError> {
    finite(field, v)?;
    if v > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be positive, got {v}")))
    }
}

fn non_negative(field: &'static str, v: f32) -> Result<(), ConfigError> {
    finite(field, v)?;
    if v >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must not be negative, got {v}")))
    }
}

fn unit_interval(field: &'static str, v: f32) -> Result<(), ConfigError> {
    finite(field, v)?;
    if (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must lie in [0, 1], got {v}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = InstallationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.total_particles(), 15_000 + 6000 + 500 + 2000);
    }

    #[test]
    fn test_negative_radius_rejected() {
        let mut config = InstallationConfig::default();
        config.tree.radius = -1.0;
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "tree.radius"),
            other => panic!("expected invalid tree.radius, got {other:?}"),
        }
    }

    #[test]
    fn test_inverted_snow_speeds_rejected() {
        let mut config = InstallationConfig::default();
        config.snow.min_speed = 0.1;
        config.snow.max_speed = 0.05;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_color_rejected() {
        let mut config = InstallationConfig::default();
        config.palette.star = "pink".into();
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "palette.star"),
            other => panic!("expected invalid palette.star, got {other:?}"),
        }
    }

    #[test]
    fn test_fixed_explosion_out_of_range_rejected() {
        let config = InstallationConfig {
            explosion: ExplosionSource::Fixed(1.5),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config =
            InstallationConfig::from_json(r#"{ "tree": { "count": 10 }, "seed": 7 }"#).unwrap();
        assert_eq!(config.tree.count, 10);
        assert_eq!(config.tree.radius, 4.5);
        assert_eq!(config.snow, SnowConfig::default());
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_json_round_trip() {
        let config = InstallationConfig {
            explosion: ExplosionSource::Fixed(0.0),
            seed: Some(42),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(InstallationConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            InstallationConfig::from_json("{ tree: "),
            Err(ConfigError::Parse(_))
        ));
    }
}
