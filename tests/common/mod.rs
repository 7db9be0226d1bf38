use cgmath::{Point3, Rad, Vector3};
use city_walk::{
    city::CityLayout,
    collision::Aabb,
    config::{CitySettings, PlayerSettings},
    input::Controls,
    player::Player,
};
use winit::keyboard::KeyCode;

pub const FRAME: f32 = 1.0 / 60.0;

/// A generated street with a player standing at its spawn point.
pub struct Walk {
    pub layout: CityLayout,
    pub colliders: Vec<Aabb>,
    pub player: Player,
    pub controls: Controls,
    pub yaw: Rad<f32>,
}

impl Walk {
    pub fn new(city: &CitySettings) -> Self {
        let layout = CityLayout::generate(city);
        let settings = PlayerSettings::default();
        let eye = layout.spawn + Vector3::new(0.0, settings.eye_height, 0.0);
        let player = Player::new(eye, settings).with_bounds(layout.half_extent);
        Self {
            colliders: layout.colliders(),
            layout,
            player,
            controls: Controls::new(),
            yaw: Rad(std::f32::consts::FRAC_PI_2),
        }
    }

    pub fn press(&mut self, code: KeyCode) {
        if self.controls.handle_key(code, true).is_some() {
            self.player.toggle_fly();
        }
    }

    pub fn release(&mut self, code: KeyCode) {
        self.controls.handle_key(code, false);
    }

    /// Advance by whole frames, checking after every frame that the body
    /// is clear of every building.
    pub fn run(&mut self, seconds: f32) {
        let frames = (seconds / FRAME).round() as u32;
        for _ in 0..frames {
            let intent = self.controls.intent(self.player.fly_mode);
            self.player.update(FRAME, self.yaw, &intent, &self.colliders);
            self.assert_clear();
        }
    }

    pub fn assert_clear(&self) {
        let body = self.player.body();
        let position = self.player.position;
        assert!(
            position.x.is_finite() && position.y.is_finite() && position.z.is_finite(),
            "{position:?}"
        );
        for building in &self.colliders {
            assert!(
                !body.intersects(building),
                "player at {position:?} is inside {building:?}"
            );
        }
    }

    pub fn position(&self) -> Point3<f32> {
        self.player.position
    }
}
