//! The three flows that make up the walk: sky, city and player.
//!
//! They run in that order. The city flow publishes what the player flow
//! needs through [`WalkState`] during `on_init`.

use cgmath::Point3;

use crate::collision::Aabb;

pub mod city;
pub mod player;
pub mod sky;

/// State shared between the flows.
#[derive(Debug, Default)]
pub struct WalkState {
    /// Boxes the player collides with.
    pub colliders: Vec<Aabb>,
    /// Ground point the walk starts from.
    pub spawn: Option<Point3<f32>>,
    /// Horizontal half extent the player is kept within.
    pub half_extent: Option<f32>,
}
