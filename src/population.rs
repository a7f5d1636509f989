//! Particle populations as parallel attribute arrays.
//!
//! A population is laid out the way the renderer uploads it: one flat `f32`
//! array per attribute, index-aligned so entry `i` of every array describes
//! particle `i`. Positions are always present; the other attributes depend
//! on the population kind.

use glam::Vec3;

/// Which part of the scene a population draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PopulationKind {
    Tree,
    Rings,
    Star,
    Snow,
}

/// Per-particle attribute channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Position,
    Color,
    Size,
    Randomness,
    Direction,
}

impl Attribute {
    /// Floats per particle.
    pub fn width(self) -> usize {
        match self {
            Attribute::Position | Attribute::Color | Attribute::Direction => 3,
            Attribute::Size | Attribute::Randomness => 1,
        }
    }

    /// Shader attribute name used by the renderer.
    pub fn shader_name(self) -> &'static str {
        match self {
            Attribute::Position => "position",
            Attribute::Color => "aColor",
            Attribute::Size => "aSize",
            Attribute::Randomness => "aRandomness",
            Attribute::Direction => "aExplosionDir",
        }
    }
}

/// Fixed-size set of particles with index-aligned attribute arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticlePopulation {
    kind: PopulationKind,
    count: usize,
    positions: Vec<f32>,
    colors: Option<Vec<f32>>,
    sizes: Option<Vec<f32>>,
    randomness: Option<Vec<f32>>,
    directions: Option<Vec<f32>>,
}

impl ParticlePopulation {
    #[inline]
    pub fn kind(&self) -> PopulationKind {
        self.kind
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn colors(&self) -> Option<&[f32]> {
        self.colors.as_deref()
    }

    pub fn sizes(&self) -> Option<&[f32]> {
        self.sizes.as_deref()
    }

    pub fn randomness(&self) -> Option<&[f32]> {
        self.randomness.as_deref()
    }

    pub fn directions(&self) -> Option<&[f32]> {
        self.directions.as_deref()
    }

    /// Position of particle `i`.
    pub fn position(&self, i: usize) -> Vec3 {
        Vec3::from_slice(&self.positions[i * 3..i * 3 + 3])
    }

    /// Burst direction of particle `i`, if this population has one.
    pub fn direction(&self, i: usize) -> Option<Vec3> {
        self.directions
            .as_ref()
            .map(|d| Vec3::from_slice(&d[i * 3..i * 3 + 3]))
    }

    /// Raw array for an attribute, `None` if the population lacks it.
    pub fn attribute(&self, attribute: Attribute) -> Option<&[f32]> {
        match attribute {
            Attribute::Position => Some(self.positions.as_slice()),
            Attribute::Color => self.colors(),
            Attribute::Size => self.sizes(),
            Attribute::Randomness => self.randomness(),
            Attribute::Direction => self.directions(),
        }
    }

    /// Attributes this population carries, position first.
    pub fn attributes(&self) -> Vec<Attribute> {
        [
            Attribute::Position,
            Attribute::Color,
            Attribute::Size,
            Attribute::Randomness,
            Attribute::Direction,
        ]
        .into_iter()
        .filter(|&a| self.attribute(a).is_some())
        .collect()
    }

    /// Attribute bytes ready for a one-time GPU upload.
    pub fn attribute_bytes(&self, attribute: Attribute) -> Option<&[u8]> {
        self.attribute(attribute).map(bytemuck::cast_slice)
    }

    /// Every present array holds exactly `len() * width` floats.
    pub fn is_aligned(&self) -> bool {
        self.attributes().into_iter().all(|a| {
            self.attribute(a)
                .is_some_and(|data| data.len() == self.count * a.width())
        })
    }

    /// Interleaved xyz positions, for the snow fall update.
    pub(crate) fn positions_mut(&mut self) -> &mut [f32] {
        &mut self.positions
    }
}

/// Accumulates particles one at a time, keeping arrays aligned.
#[derive(Debug)]
pub struct PopulationBuilder {
    population: ParticlePopulation,
}

impl PopulationBuilder {
    /// Reserve room for `count` particles with the given optional attributes.
    pub fn new(kind: PopulationKind, count: usize, attributes: &[Attribute]) -> Self {
        let reserve = |a: Attribute| {
            attributes
                .contains(&a)
                .then(|| Vec::with_capacity(count * a.width()))
        };
        Self {
            population: ParticlePopulation {
                kind,
                count: 0,
                positions: Vec::with_capacity(count * 3),
                colors: reserve(Attribute::Color),
                sizes: reserve(Attribute::Size),
                randomness: reserve(Attribute::Randomness),
                directions: reserve(Attribute::Direction),
            },
        }
    }

    /// Start a particle at `position`; fill its other attributes on the
    /// returned handle before starting the next one.
    pub fn push(&mut self, position: Vec3) -> ParticleWriter<'_> {
        self.population.positions.extend_from_slice(&position.to_array());
        self.population.count += 1;
        ParticleWriter {
            population: &mut self.population,
        }
    }

    pub fn build(self) -> ParticlePopulation {
        debug_assert!(self.population.is_aligned(), "unfilled particle attribute");
        self.population
    }
}

/// Sets the optional attributes of the particle just pushed.
pub struct ParticleWriter<'a> {
    population: &'a mut ParticlePopulation,
}

impl ParticleWriter<'_> {
    pub fn color(self, color: Vec3) -> Self {
        if let Some(colors) = self.population.colors.as_mut() {
            colors.extend_from_slice(&color.to_array());
        }
        self
    }

    pub fn size(self, size: f32) -> Self {
        if let Some(sizes) = self.population.sizes.as_mut() {
            sizes.push(size);
        }
        self
    }

    pub fn randomness(self, value: f32) -> Self {
        if let Some(randomness) = self.population.randomness.as_mut() {
            randomness.push(value);
        }
        self
    }

    pub fn direction(self, direction: Vec3) -> Self {
        if let Some(directions) = self.population.directions.as_mut() {
            directions.extend_from_slice(&direction.to_array());
        }
        self
    }
}
