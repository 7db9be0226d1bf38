use cgmath::Rad;
use city_walk::config::{CitySettings, Settings};
use winit::keyboard::KeyCode;

use crate::common::Walk;

mod common;

#[test]
fn walking_down_the_street_is_unobstructed() {
    let mut walk = Walk::new(&CitySettings::default());
    let start = walk.position();

    walk.press(KeyCode::KeyW);
    walk.run(5.0);

    let travelled = walk.position().z - start.z;
    let speed = walk.player.settings().walk_speed;
    // a short ramp up, then full walking speed along the road
    assert!(travelled > 4.0 * speed, "only travelled {travelled}");
    assert!((walk.position().x - start.x).abs() < 1e-3);
    assert!(walk.player.on_ground);
}

#[test]
fn sprinting_into_the_buildings_never_enters_one() {
    let mut walk = Walk::new(&CitySettings {
        vacancy: 0.0,
        ..Default::default()
    });
    walk.press(KeyCode::KeyW);
    walk.press(KeyCode::ShiftLeft);

    // sweep the heading around so the player hits walls at many angles
    for turn in 0..30 {
        walk.yaw = Rad(turn as f32 * 1.3);
        walk.run(2.0);
    }
}

#[test]
fn world_bounds_hold() {
    let mut walk = Walk::new(&CitySettings::default());
    walk.yaw = Rad(-std::f32::consts::FRAC_PI_2);
    walk.press(KeyCode::KeyW);
    walk.press(KeyCode::ShiftLeft);
    walk.run(30.0);

    let limit = walk.layout.half_extent;
    assert!(walk.position().z >= -limit && walk.position().z < -limit + 1.0);
}

#[test]
fn flying_over_the_roofs_and_landing() {
    let mut walk = Walk::new(&CitySettings::default());
    let max_altitude = walk.player.settings().max_altitude;

    walk.press(KeyCode::KeyF);
    walk.release(KeyCode::KeyF);
    assert!(walk.player.fly_mode);

    walk.press(KeyCode::Space);
    walk.run(20.0);
    walk.release(KeyCode::Space);
    assert!(walk.position().y <= max_altitude);
    assert!(walk.position().y > 100.0);

    // cross the street high above the buildings
    walk.yaw = Rad(0.0);
    walk.press(KeyCode::KeyW);
    walk.run(4.0);
    walk.release(KeyCode::KeyW);

    // back to walking: gravity brings the player down onto a roof or the ground
    walk.press(KeyCode::KeyF);
    assert!(!walk.player.fly_mode);
    walk.run(10.0);
    assert!(walk.player.on_ground);
}

#[test]
fn shipped_settings_file_parses() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("assets")
        .join(city_walk::config::SETTINGS_FILE);
    let text = std::fs::read_to_string(path).unwrap();
    let settings = Settings::from_json(&text).unwrap();
    assert_eq!(settings.city.seed, 42);
    assert_eq!(settings.view.title, "City Walk");
}
