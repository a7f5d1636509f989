//! Per-frame animation of the static buffers.
//!
//! The renderer animates the tree in its vertex stage from three uniforms
//! (time, height, explosion) plus each particle's attributes. The functions
//! here are the CPU reference of that displacement so the animation can be
//! tested and previewed without a GPU. Rings and the star group move as
//! rigid bodies; their transforms are in [`SceneTransforms`].

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

/// Distance a fully exploded particle travels along its burst direction.
pub const BURST_DISTANCE: f32 = 25.0;
/// Swirl angle per unit of `explosion * randomness`, radians.
pub const BURST_SWIRL: f32 = 5.0;
/// Upward drift per unit of `explosion * randomness`.
pub const BURST_LIFT: f32 = 5.0;

const BREATH_AMPLITUDE: f32 = 0.02;
const BOB_AMPLITUDE: f32 = 0.05;

/// Hermite ease between `edge0` and `edge1`, matching the shader builtin.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Idle sway of a tree particle before any burst.
pub fn breathing_offset(position: Vec3, randomness: f32, time: f32) -> Vec3 {
    let breath = (time * 1.5 + position.y * 0.5 + randomness * 5.0).sin();
    let bob = (time * 0.5 + randomness * 10.0).sin() * BOB_AMPLITUDE;
    Vec3::new(
        position.x * breath * BREATH_AMPLITUDE,
        bob,
        position.z * breath * BREATH_AMPLITUDE,
    )
}

/// Displacement of a tree particle at explosion amount `explosion` in `[0, 1]`.
///
/// The offset runs along `direction`, swirls in the XZ plane in proportion
/// to the particle's randomness, and drifts upward.
pub fn burst_offset(direction: Vec3, randomness: f32, explosion: f32) -> Vec3 {
    let f = smoothstep(0.0, 1.0, explosion);
    let offset = direction * f * BURST_DISTANCE;
    let (s, c) = (f * randomness * BURST_SWIRL).sin_cos();
    Vec3::new(
        offset.x * c - offset.z * s,
        offset.y + f * BURST_LIFT * randomness,
        offset.x * s + offset.z * c,
    )
}

/// Where a tree particle is drawn this frame.
pub fn animated_position(
    position: Vec3,
    direction: Vec3,
    randomness: f32,
    time: f32,
    explosion: f32,
) -> Vec3 {
    position + breathing_offset(position, randomness, time) + burst_offset(direction, randomness, explosion)
}

/// Point-size multiplier: particles shrink to 60% as they burst.
#[inline]
pub fn size_factor(explosion: f32) -> f32 {
    let f = smoothstep(0.0, 1.0, explosion);
    1.0 + (0.6 - 1.0) * f
}

/// Particle alpha: fades to 70% at full burst.
#[inline]
pub fn alpha(explosion: f32) -> f32 {
    1.0 - smoothstep(0.0, 1.0, explosion) * 0.3
}

/// Uniform block for the tree's vertex stage.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct TreeUniforms {
    pub time: f32,
    pub height: f32,
    pub explosion: f32,
    _padding: f32,
}

impl TreeUniforms {
    pub fn new(time: f32, height: f32, explosion: f32) -> Self {
        Self {
            time,
            height,
            explosion,
            _padding: 0.0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Rigid motion of the rings and the star group at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneTransforms {
    pub rings_rotation: Quat,
    pub star_translation: Vec3,
    pub star_rotation: Quat,
}

impl SceneTransforms {
    /// Rings turn slowly about Y; the star spins the other way while
    /// rolling about Z, parked at `star_height`.
    pub fn at(time: f32, star_height: f32) -> Self {
        Self {
            rings_rotation: Quat::from_rotation_y(time * 0.1),
            star_translation: Vec3::new(0.0, star_height, 0.0),
            star_rotation: Quat::from_rotation_y(-time * 0.5) * Quat::from_rotation_z(time * 0.2),
        }
    }

    pub fn rings_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.rings_rotation)
    }

    pub fn star_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.star_rotation, self.star_translation)
    }
}
