//! Procedural layout of the static particle populations.
//!
//! Each generator draws a fixed number of particles from a [`Sampler`] and
//! returns a [`ParticlePopulation`] ready for upload. Generation happens once
//! per scene; afterwards only the snow moves (see [`crate::snow`]).
//!
//! | Population | Shape | Attributes |
//! |---|---|---|
//! | Tree | Cone, area-uniform per height band | color, size, randomness, burst direction |
//! | Rings | Two annuli below the tree | size |
//! | Star | Solid sphere above the apex | position only |
//! | Snow | Cube around the scene | position, plus fall speeds |

use crate::config::{InstallationConfig, RingConfig, StarConfig, TreeConfig};
use crate::palette::Palette;
use crate::population::{Attribute, ParticlePopulation, PopulationBuilder, PopulationKind};
use crate::snow::SnowField;
use crate::spawn::Sampler;
use glam::Vec3;
use rand::Rng;
use tracing::debug;

/// Added to the cone radius before computing a particle's radial ratio.
const RATIO_BIAS: f32 = 0.001;

/// Vertical centre of the ring bands.
pub const RING_CENTER_Y: f32 = -1.0;

/// One annulus, as multiples of the tree radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingBand {
    pub min_factor: f32,
    pub max_factor: f32,
    /// Total vertical thickness.
    pub spread: f32,
}

pub const INNER_RING: RingBand = RingBand {
    min_factor: 1.2,
    max_factor: 2.0,
    spread: 0.5,
};

pub const OUTER_RING: RingBand = RingBand {
    min_factor: 2.5,
    max_factor: 4.0,
    spread: 0.8,
};

/// Geometry of the tree cone in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeShape {
    pub height: f32,
    pub radius: f32,
    /// World-space lift applied to the whole cone.
    pub offset: f32,
}

impl TreeShape {
    pub fn new(config: &TreeConfig) -> Self {
        Self {
            height: config.height,
            radius: config.radius,
            offset: config.height * config.vertical_offset_ratio,
        }
    }

    /// Cone radius at normalized height `h` (0 = base, 1 = apex).
    #[inline]
    pub fn radius_at(&self, h: f32) -> f32 {
        (1.0 - h) * self.radius
    }

    /// Cone-local y for normalized height `h`, before the lift.
    #[inline]
    pub fn local_y(&self, h: f32) -> f32 {
        h * self.height - self.height / 2.0
    }

    /// Normalized height of a world-space point.
    #[inline]
    pub fn height_of(&self, position: Vec3) -> f32 {
        (position.y - self.offset + self.height / 2.0) / self.height
    }

    /// Whether a world-space point lies inside the cone.
    pub fn contains(&self, position: Vec3, tolerance: f32) -> bool {
        let h = self.height_of(position);
        if !(-tolerance..=1.0 + tolerance).contains(&h) {
            return false;
        }
        let axial = Vec3::new(position.x, 0.0, position.z).length();
        axial <= self.radius_at(h.clamp(0.0, 1.0)) + tolerance
    }

    /// World-space y of the apex.
    pub fn apex_y(&self) -> f32 {
        self.local_y(1.0) + self.offset
    }
}

/// All static buffers of one scene.
#[derive(Debug, Clone)]
pub struct SceneBuffers {
    pub tree: ParticlePopulation,
    pub rings: ParticlePopulation,
    pub star: ParticlePopulation,
    pub snow: SnowField,
}

impl SceneBuffers {
    /// Generate every population. `config` must already be validated.
    pub fn generate<R: Rng>(
        config: &InstallationConfig,
        palette: &Palette,
        sampler: &mut Sampler<R>,
    ) -> Self {
        let buffers = Self {
            tree: generate_tree(&config.tree, palette, sampler),
            rings: generate_rings(&config.rings, config.tree.radius, sampler),
            star: generate_star(&config.star, sampler),
            snow: SnowField::generate(&config.snow, sampler),
        };
        debug!(
            tree = buffers.tree.len(),
            rings = buffers.rings.len(),
            star = buffers.star.len(),
            snow = buffers.snow.len(),
            "scene populations generated"
        );
        buffers
    }
}

/// Cone of particles with a radial color gradient and burst directions.
///
/// Heights are uniform and radii use `R(h)·sqrt(u)`, so each height band is
/// filled evenly by area instead of piling up along the axis.
pub fn generate_tree<R: Rng>(
    config: &TreeConfig,
    palette: &Palette,
    sampler: &mut Sampler<R>,
) -> ParticlePopulation {
    let shape = TreeShape::new(config);
    let mut builder = PopulationBuilder::new(
        PopulationKind::Tree,
        config.count,
        &[
            Attribute::Color,
            Attribute::Size,
            Attribute::Randomness,
            Attribute::Direction,
        ],
    );

    for _ in 0..config.count {
        let h = sampler.random();
        let max_r = shape.radius_at(h);
        let (disk, r) = sampler.random_in_disk(max_r);
        let local = Vec3::new(disk.x, shape.local_y(h), disk.z);

        let ratio = r / (max_r + RATIO_BIAS);
        let size = (sampler.random() * 0.5 + 0.5) * (1.0 - ratio * 0.5) * 0.6;
        let randomness = sampler.random();
        let direction = burst_direction(local, sampler);

        builder
            .push(local + Vec3::Y * shape.offset)
            .color(palette.tree_gradient(ratio))
            .size(size)
            .randomness(randomness)
            .direction(direction);
    }
    builder.build()
}

/// Outward-biased unit vector for the burst animation.
///
/// The jitter leans upward so the burst reads as a fountain rather than a
/// flat shockwave.
fn burst_direction<R: Rng>(local: Vec3, sampler: &mut Sampler<R>) -> Vec3 {
    let jitter = Vec3::new(
        (sampler.random() - 0.5) * 1.5,
        (sampler.random() - 0.1) * 1.0,
        (sampler.random() - 0.5) * 1.5,
    );
    (local.normalize_or_zero() + jitter)
        .try_normalize()
        .unwrap_or_else(|| sampler.random_direction())
}

/// Two golden annuli at the foot of the tree.
pub fn generate_rings<R: Rng>(
    config: &RingConfig,
    tree_radius: f32,
    sampler: &mut Sampler<R>,
) -> ParticlePopulation {
    let mut builder =
        PopulationBuilder::new(PopulationKind::Rings, config.count, &[Attribute::Size]);

    for _ in 0..config.count {
        let band = if sampler.chance(config.inner_probability) {
            INNER_RING
        } else {
            OUTER_RING
        };
        let radius = tree_radius * sampler.random_range(band.min_factor, band.max_factor);
        let mut position = sampler.random_on_ring(radius);
        position.y = (sampler.random() - 0.5) * band.spread + RING_CENTER_Y;
        let scale = sampler.random();

        builder.push(position).size(scale);
    }
    builder.build()
}

/// Corona of points filling a sphere, in the star group's local frame.
pub fn generate_star<R: Rng>(config: &StarConfig, sampler: &mut Sampler<R>) -> ParticlePopulation {
    let mut builder = PopulationBuilder::new(PopulationKind::Star, config.count, &[]);
    for _ in 0..config.count {
        builder.push(sampler.random_in_sphere(config.radius));
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(count: usize, seed: u64) -> (TreeShape, ParticlePopulation) {
        let config = TreeConfig {
            count,
            ..Default::default()
        };
        let population = generate_tree(&config, &Palette::default(), &mut Sampler::from_seed(seed));
        (TreeShape::new(&config), population)
    }

    #[test]
    fn test_tree_points_inside_cone() {
        let (shape, population) = tree(5000, 11);
        assert_eq!(population.len(), 5000);
        assert!(population.is_aligned());
        for i in 0..population.len() {
            let p = population.position(i);
            assert!(shape.contains(p, 1e-3), "particle {i} at {p} outside cone");
        }
    }

    #[test]
    fn test_tree_is_area_uniform_per_band() {
        // For area-uniform sampling (r / R(h))² is uniform on [0, 1).
        let (shape, population) = tree(40_000, 12);
        let bins = 10;
        let mut histogram = vec![0usize; bins];
        for i in 0..population.len() {
            let p = population.position(i);
            let h = shape.height_of(p);
            let max_r = shape.radius_at(h);
            if max_r < 1e-2 {
                continue;
            }
            let ratio = Vec3::new(p.x, 0.0, p.z).length() / max_r;
            let bin = ((ratio * ratio) * bins as f32).min(bins as f32 - 1.0) as usize;
            histogram[bin] += 1;
        }
        let total: usize = histogram.iter().sum();
        let expected = total as f32 / bins as f32;
        for (bin, &count) in histogram.iter().enumerate() {
            let deviation = (count as f32 - expected).abs() / expected;
            assert!(deviation < 0.1, "bin {bin}: {count} vs {expected}");
        }
        // Naive uniform radius would put ~10% of points in the inner tenth
        // of the radius; area-uniform puts ~1% there.
        let near_axis = histogram[0] as f32 / total as f32;
        assert!(near_axis < 0.15);
    }

    #[test]
    fn test_tree_heights_are_uniform() {
        let (shape, population) = tree(20_000, 13);
        let below_half = (0..population.len())
            .filter(|&i| shape.height_of(population.position(i)) < 0.5)
            .count();
        let fraction = below_half as f32 / population.len() as f32;
        assert!((fraction - 0.5).abs() < 0.02);
    }

    #[test]
    fn test_tree_directions_are_unit() {
        let (_, population) = tree(2000, 14);
        for i in 0..population.len() {
            let d = population.direction(i).unwrap();
            assert!((d.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_tree_directions_lean_outward() {
        let (shape, population) = tree(5000, 15);
        let mut outward = 0;
        for i in 0..population.len() {
            let p = population.position(i) - Vec3::Y * shape.offset;
            let d = population.direction(i).unwrap();
            if p.normalize_or_zero().dot(d) > 0.0 {
                outward += 1;
            }
        }
        assert!(outward as f32 / population.len() as f32 > 0.6);
    }

    #[test]
    fn test_tree_colors_follow_gradient() {
        let palette = Palette::default();
        let config = TreeConfig {
            count: 500,
            ..Default::default()
        };
        let population = generate_tree(&config, &palette, &mut Sampler::from_seed(16));
        let colors = population.colors().unwrap();
        let sizes = population.sizes().unwrap();
        let randomness = population.randomness().unwrap();
        let lo = palette.tree_core.min(palette.tree_mid).min(palette.tree_outer);
        let hi = palette.tree_core.max(palette.tree_mid).max(palette.tree_outer);
        for i in 0..population.len() {
            let c = Vec3::from_slice(&colors[i * 3..i * 3 + 3]);
            assert!(c.cmpge(lo - 1e-5).all() && c.cmple(hi + 1e-5).all());
            assert!(sizes[i] > 0.0 && sizes[i] <= 0.6);
            assert!((0.0..1.0).contains(&randomness[i]));
        }
    }

    #[test]
    fn test_same_seed_same_tree() {
        let (_, a) = tree(100, 17);
        let (_, b) = tree(100, 17);
        let (_, c) = tree(100, 18);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_rings_lie_in_bands() {
        let config = RingConfig::default();
        let radius = 4.5;
        let population = generate_rings(&config, radius, &mut Sampler::from_seed(21));
        assert_eq!(population.len(), config.count);
        assert!(population.is_aligned());

        let mut inner = 0;
        for i in 0..population.len() {
            let p = population.position(i);
            let r = Vec3::new(p.x, 0.0, p.z).length() / radius;
            let band = if r < 2.25 { INNER_RING } else { OUTER_RING };
            if band == INNER_RING {
                inner += 1;
            }
            assert!(r >= band.min_factor - 1e-4 && r < band.max_factor + 1e-4);
            assert!((p.y - RING_CENTER_Y).abs() <= band.spread / 2.0 + 1e-5);
        }
        let fraction = inner as f32 / population.len() as f32;
        assert!((fraction - config.inner_probability).abs() < 0.03);

        let scales = population.sizes().unwrap();
        assert!(scales.iter().all(|s| (0.0..1.0).contains(s)));
    }

    #[test]
    fn test_star_fills_sphere_uniformly() {
        let config = StarConfig {
            count: 20_000,
            ..Default::default()
        };
        let population = generate_star(&config, &mut Sampler::from_seed(31));
        let mut inner_half = 0;
        for i in 0..population.len() {
            let r = population.position(i).length();
            assert!(r <= config.radius + 1e-5);
            if r < config.radius * 0.5 {
                inner_half += 1;
            }
        }
        // The inner half-radius holds an eighth of the volume.
        let fraction = inner_half as f32 / population.len() as f32;
        assert!((fraction - 0.125).abs() < 0.015, "fraction {fraction}");
        assert_eq!(population.attributes(), vec![Attribute::Position]);
    }

    #[test]
    fn test_scene_respects_counts() {
        let mut config = InstallationConfig::default();
        config.tree.count = 100;
        config.rings.count = 50;
        config.star.count = 25;
        config.snow.count = 10;
        let scene = SceneBuffers::generate(&config, &Palette::default(), &mut Sampler::from_seed(1));
        assert_eq!(scene.tree.len(), 100);
        assert_eq!(scene.rings.len(), 50);
        assert_eq!(scene.star.len(), 25);
        assert_eq!(scene.snow.len(), 10);
    }

    #[test]
    fn test_apex_height() {
        let shape = TreeShape::new(&TreeConfig::default());
        assert!((shape.apex_y() - (6.0 + 4.8)).abs() < 1e-5);
    }
}
