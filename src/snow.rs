//! Falling snow, the only population that moves after generation.

use crate::config::SnowConfig;
use crate::population::{ParticlePopulation, PopulationBuilder, PopulationKind};
use crate::spawn::Sampler;
use glam::Vec3;
use rand::Rng;

/// Snow particles in a cube, each falling at its own fixed speed.
///
/// Speeds are in world units per frame. A flake that drops below the floor
/// of the cube reappears at the ceiling with the same x and z.
#[derive(Debug, Clone, PartialEq)]
pub struct SnowField {
    population: ParticlePopulation,
    speeds: Vec<f32>,
    half_extent: f32,
}

impl SnowField {
    pub fn generate<R: Rng>(config: &SnowConfig, sampler: &mut Sampler<R>) -> Self {
        let half_extent = config.box_size / 2.0;
        let mut builder = PopulationBuilder::new(PopulationKind::Snow, config.count, &[]);
        let mut speeds = Vec::with_capacity(config.count);
        for _ in 0..config.count {
            builder.push(sampler.random_in_cube(half_extent));
            speeds.push(sampler.random_range(config.min_speed, config.max_speed));
        }
        Self {
            population: builder.build(),
            speeds,
            half_extent,
        }
    }

    /// Build a field from explicit flakes. `positions` and `speeds` must be
    /// the same length.
    #[cfg(test)]
    pub(crate) fn from_parts(positions: &[Vec3], speeds: Vec<f32>, box_size: f32) -> Self {
        assert_eq!(positions.len(), speeds.len(), "one speed per flake");
        let mut builder = PopulationBuilder::new(PopulationKind::Snow, positions.len(), &[]);
        for &p in positions {
            builder.push(p);
        }
        Self {
            population: builder.build(),
            speeds,
            half_extent: box_size / 2.0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.speeds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.speeds.is_empty()
    }

    pub fn population(&self) -> &ParticlePopulation {
        &self.population
    }

    pub fn speeds(&self) -> &[f32] {
        &self.speeds
    }

    pub fn half_extent(&self) -> f32 {
        self.half_extent
    }

    /// Advance every flake one frame. Does nothing while `frozen`.
    ///
    /// Returns whether positions changed, i.e. whether the position buffer
    /// needs re-uploading.
    pub fn update(&mut self, frozen: bool) -> bool {
        if frozen || self.is_empty() {
            return false;
        }
        let half = self.half_extent;
        let positions = self.population.positions_mut();
        for (xyz, speed) in positions.chunks_exact_mut(3).zip(&self.speeds) {
            xyz[1] -= speed;
            if xyz[1] < -half {
                xyz[1] = half;
            }
        }
        true
    }
}
