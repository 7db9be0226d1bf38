//! Render pipelines and their WGSL shaders.
//!
//! - `basic` draws the textured, lit city
//! - `sky` draws the gradient sky behind everything
//! - `light` holds the sun, sky and fog uniform both of them read

pub mod basic;
pub mod light;
pub mod sky;
