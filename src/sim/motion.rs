//! Transform and motion integration
//!
//! Every entity carries a `Motion`: a position in toroidal world space, a
//! travel heading and scalar speed, and a visual rotation that may differ
//! from the heading (the ship spins independently of where it drifts).

use glam::{Affine2, Vec2};
use serde::{Deserialize, Serialize};

use crate::{heading_vector, normalize_angle};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    pub position: Vec2,
    /// Direction of travel (radians)
    pub heading: f32,
    /// Distance per tick along `heading`
    pub speed: f32,
    /// Visual facing (radians)
    pub rotation: f32,
    /// Per-tick speed multiplier, if this entity decelerates
    pub friction: Option<f32>,
}

impl Motion {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            heading: 0.0,
            speed: 0.0,
            rotation: 0.0,
            friction: None,
        }
    }

    pub fn with_velocity(mut self, speed: f32, heading: f32) -> Self {
        self.set_velocity(speed, heading);
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = normalize_angle(rotation);
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = Some(friction);
        self
    }

    #[inline]
    pub fn velocity(&self) -> Vec2 {
        heading_vector(self.heading) * self.speed
    }

    pub fn set_velocity(&mut self, speed: f32, heading: f32) {
        self.speed = speed;
        self.heading = normalize_angle(heading);
    }

    /// Replace the velocity with a vector, re-deriving heading and speed
    pub fn set_velocity_vector(&mut self, velocity: Vec2) {
        self.speed = velocity.length();
        if self.speed > 0.0 {
            self.heading = velocity.y.atan2(velocity.x);
        }
    }

    /// Push along the current rotation, clamping the resulting speed
    pub fn accelerate(&mut self, amount: f32, speed_limit: f32) {
        let velocity = self.velocity() + heading_vector(self.rotation) * amount;
        self.set_velocity_vector(velocity);
        self.speed = self.speed.min(speed_limit);
    }

    pub fn rotate(&mut self, delta: f32) {
        self.rotation = normalize_angle(self.rotation + delta);
    }

    /// Advance one tick: decay speed, integrate, wrap
    pub fn step(&mut self, world: Vec2) {
        if let Some(friction) = self.friction {
            self.speed *= friction;
        }
        self.position = wrap_position(self.position + self.velocity(), world);
    }

    /// Local-to-world transform for an outline of the given scale:
    /// scale, then rotate, then translate
    pub fn transform(&self, scale: f32) -> Affine2 {
        Affine2::from_scale_angle_translation(Vec2::splat(scale), self.rotation, self.position)
    }

    /// Transform a single local-space point into world space
    pub fn to_world(&self, scale: f32, local: Vec2) -> Vec2 {
        self.transform(scale).transform_point2(local)
    }
}

/// Wrap a position into `[0, world)` on each axis independently
#[inline]
pub fn wrap_position(position: Vec2, world: Vec2) -> Vec2 {
    Vec2::new(wrap_axis(position.x, world.x), wrap_axis(position.y, world.y))
}

/// `rem_euclid` rounds up to `size` for tiny negative inputs
#[inline]
fn wrap_axis(value: f32, size: f32) -> f32 {
    let wrapped = value.rem_euclid(size);
    if wrapped >= size { 0.0 } else { wrapped }
}
