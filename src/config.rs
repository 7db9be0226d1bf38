//! Runtime settings.
//!
//! All knobs of the demo live in [`Settings`]. Every field has a default so a
//! settings file only needs to mention what it changes. The file is looked up
//! as `assets/city.json` (see [`Settings::load`]).

use serde::Deserialize;

use crate::resources::load_string;

pub const SETTINGS_FILE: &str = "city.json";

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub view: ViewSettings,
    pub player: PlayerSettings,
    pub city: CitySettings,
}

/// Camera, sky and lighting.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewSettings {
    pub title: String,
    pub fov_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    /// Radians of turn per pixel of mouse motion.
    pub mouse_sensitivity: f32,
    pub horizon_colour: [f32; 3],
    pub zenith_colour: [f32; 3],
    pub sun_direction: [f32; 3],
    pub sun_colour: [f32; 3],
    pub ambient: f32,
    /// Distance at which geometry is fully faded into the horizon colour.
    pub fog_distance: f32,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            title: "City Walk".to_string(),
            fov_degrees: 70.0,
            znear: 0.1,
            zfar: 1000.0,
            mouse_sensitivity: 0.0025,
            horizon_colour: [0.78, 0.86, 0.94],
            zenith_colour: [0.24, 0.44, 0.78],
            sun_direction: [0.45, 0.8, 0.35],
            sun_colour: [1.0, 0.96, 0.88],
            ambient: 0.35,
            fog_distance: 450.0,
        }
    }
}

/// Movement tuning. Distances in metres, times in seconds.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerSettings {
    pub eye_height: f32,
    pub radius: f32,
    /// Body extent above the eye.
    pub head_room: f32,
    pub walk_speed: f32,
    pub sprint_multiplier: f32,
    pub fly_speed: f32,
    pub acceleration: f32,
    pub friction: f32,
    pub gravity: f32,
    pub jump_speed: f32,
    pub ground_level: f32,
    pub max_altitude: f32,
    /// Longest frame the integrator accepts; longer frames are clamped.
    pub max_step: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            eye_height: 1.7,
            radius: 0.35,
            head_room: 0.15,
            walk_speed: 6.0,
            sprint_multiplier: 2.0,
            fly_speed: 20.0,
            acceleration: 10.0,
            friction: 8.0,
            gravity: 24.0,
            jump_speed: 8.0,
            ground_level: 0.0,
            max_altitude: 250.0,
            max_step: 0.1,
        }
    }
}

/// Procedural layout parameters.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CitySettings {
    pub seed: u64,
    /// Length of the road along Z.
    pub length: f32,
    pub road_width: f32,
    pub sidewalk_width: f32,
    pub tile_size: f32,
    pub lot_size: f32,
    /// Rows of lots on each side of the road.
    pub rows: u32,
    /// Minimum free space between a building and its lot edge.
    pub alley: f32,
    /// Probability that a lot stays empty.
    pub vacancy: f64,
    pub min_height: f32,
    pub max_height: f32,
    /// Number of distinct facade textures.
    pub styles: u32,
}

impl Default for CitySettings {
    fn default() -> Self {
        Self {
            seed: 42,
            length: 240.0,
            road_width: 10.0,
            sidewalk_width: 4.0,
            tile_size: 2.0,
            lot_size: 16.0,
            rows: 3,
            alley: 2.0,
            vacancy: 0.15,
            min_height: 8.0,
            max_height: 60.0,
            styles: 4,
        }
    }
}

impl Settings {
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load the settings file, falling back to defaults when it is missing or
    /// malformed. The demo must start either way.
    pub async fn load() -> Self {
        let text = match load_string(SETTINGS_FILE).await {
            Ok(text) => text,
            Err(e) => {
                log::info!("No {SETTINGS_FILE} found ({e}), using default settings");
                return Self::default();
            }
        };
        match Self::from_json(&text) {
            Ok(settings) => {
                log::info!("Loaded settings from {SETTINGS_FILE}");
                settings
            }
            Err(e) => {
                log::warn!("Ignoring malformed {SETTINGS_FILE}: {e}");
                Self::default()
            }
        }
    }
}
