//! city-walk
//!
//! A first-person walk through a procedurally generated street, running
//! natively and in the browser. The crate is split into a small pure core
//! (layout generation, movement and collision) and the wgpu/winit shell that
//! draws it and feeds it input.
//!
//! High-level modules
//! - `city`: deterministic street layout (road, sidewalks, buildings)
//! - `collision`: axis-aligned boxes
//! - `player` and `input`: keyboard intent, walking, flying and sliding collision
//! - `camera`: first-person camera, projection and mouse look
//! - `config`: settings read from `assets/city.json`
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: meshes, instances, textures and batches
//! - `flow`: the flow trait and the winit application driving it
//! - `pipelines`: the city and sky render pipelines
//! - `resources`: procedural meshes and textures, asset loading
//! - `render`: render composition for efficient pipeline reuse
//! - `scene`: the sky, city and player flows

pub mod camera;
pub mod city;
pub mod collision;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod input;
pub mod pipelines;
pub mod player;
pub mod render;
pub mod resources;
pub mod scene;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

use crate::{
    flow::FlowConstructor,
    scene::{WalkState, city::CityFlow, player::PlayerFlow, sky::SkyFlow},
};

/// Open the window and walk. Blocks until the window is closed on native
/// targets.
pub fn start() -> anyhow::Result<()> {
    // order matters: the sky draws first and the city publishes the spawn
    // point before the player reads it
    let constructors: Vec<FlowConstructor<WalkState>> = vec![
        SkyFlow::constructor(),
        CityFlow::constructor(),
        PlayerFlow::constructor(),
    ];
    flow::run(constructors)
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), JsValue> {
    start().map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
