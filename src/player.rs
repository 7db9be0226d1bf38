//! First-person player movement.
//!
//! The player is a box around the eye position. Every frame the velocity is
//! pulled towards what the keyboard asks for (acceleration while keys are
//! held, friction otherwise), gravity or fly-mode vertical control is
//! applied, and the resulting displacement is resolved against the building
//! boxes one axis at a time so that the player slides along walls instead of
//! sticking to them.

use cgmath::{InnerSpace, Point3, Rad, Vector3, Zero};

use crate::{collision::Aabb, config::PlayerSettings, input::MovementIntent};

const X: usize = 0;
const Y: usize = 1;
const Z: usize = 2;

/// Gap kept between the body and a face it was pushed against.
const SKIN: f32 = 1e-4;
/// How far below the feet support is looked for.
const GROUND_PROBE: f32 = 0.02;
const MAX_SUBSTEPS: u32 = 64;

#[derive(Clone, Debug)]
pub struct Player {
    /// Eye position.
    pub position: Point3<f32>,
    pub velocity: Vector3<f32>,
    pub fly_mode: bool,
    pub on_ground: bool,
    settings: PlayerSettings,
    /// Horizontal half extent of the walkable world, centred on the origin.
    bounds: Option<f32>,
}

impl Player {
    pub fn new(spawn: Point3<f32>, settings: PlayerSettings) -> Self {
        Self {
            position: spawn,
            velocity: Vector3::zero(),
            fly_mode: false,
            on_ground: false,
            settings,
            bounds: None,
        }
    }

    pub fn with_bounds(mut self, half_extent: f32) -> Self {
        self.bounds = Some(half_extent);
        self
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    pub fn toggle_fly(&mut self) {
        self.fly_mode = !self.fly_mode;
        if self.fly_mode {
            self.velocity.y = 0.0;
        }
        log::info!(
            "Fly mode {}",
            if self.fly_mode { "enabled" } else { "disabled" }
        );
    }

    pub fn body(&self) -> Aabb {
        self.body_at(self.position)
    }

    fn body_at(&self, eye: Point3<f32>) -> Aabb {
        let r = self.settings.radius;
        Aabb {
            min: Point3::new(eye.x - r, eye.y - self.settings.eye_height, eye.z - r),
            max: Point3::new(eye.x + r, eye.y + self.settings.head_room, eye.z + r),
        }
    }

    /// Distance from the eye to the body face on the positive (`true`) or
    /// negative side of `axis`.
    fn extent(&self, axis: usize, positive: bool) -> f32 {
        match (axis, positive) {
            (Y, true) => self.settings.head_room,
            (Y, false) => self.settings.eye_height,
            _ => self.settings.radius,
        }
    }

    /// Advance the player by `dt` seconds. `yaw` is the camera heading; the
    /// wish direction is relative to it.
    pub fn update(
        &mut self,
        dt: f32,
        yaw: Rad<f32>,
        intent: &MovementIntent,
        colliders: &[Aabb],
    ) {
        // also rejects NaN
        if !(dt > 0.0) {
            return;
        }
        let dt = dt.min(self.settings.max_step);
        self.accelerate(dt, yaw, intent);

        let displacement = self.velocity * dt;
        let reach = self.body().inflate(displacement.magnitude() + self.settings.radius);
        let nearby: Vec<Aabb> = colliders
            .iter()
            .filter(|c| c.intersects(&reach))
            .copied()
            .collect();

        let largest = displacement.x.abs().max(displacement.y.abs()).max(displacement.z.abs());
        let steps = ((largest / self.settings.radius).ceil() as u32).clamp(1, MAX_SUBSTEPS);
        let step = displacement / steps as f32;
        for _ in 0..steps {
            self.move_axis(X, step.x, &nearby);
            self.move_axis(Z, step.z, &nearby);
            self.move_axis(Y, step.y, &nearby);
            self.clamp_to_ground();
        }
        self.clamp_to_bounds();
        self.on_ground = self.velocity.y <= 0.0 && self.is_supported(&nearby);
    }

    fn accelerate(&mut self, dt: f32, yaw: Rad<f32>, intent: &MovementIntent) {
        let s = &self.settings;
        let axis = |pos: bool, neg: bool| pos as i32 as f32 - neg as i32 as f32;
        let forward = Vector3::new(yaw.0.cos(), 0.0, yaw.0.sin());
        let right = Vector3::new(-yaw.0.sin(), 0.0, yaw.0.cos());
        let mut wish = forward * axis(intent.forward, intent.backward)
            + right * axis(intent.right, intent.left);
        let has_input = wish.magnitude2() > 0.0;
        if has_input {
            wish = wish.normalize();
        }

        let speed = if self.fly_mode {
            s.fly_speed
        } else if intent.sprint {
            s.walk_speed * s.sprint_multiplier
        } else {
            s.walk_speed
        };
        let target = wish * speed;
        let rate = if has_input { s.acceleration } else { s.friction };
        let t = (rate * dt).min(1.0);
        self.velocity.x += (target.x - self.velocity.x) * t;
        self.velocity.z += (target.z - self.velocity.z) * t;

        if self.fly_mode {
            let vertical = axis(intent.up, intent.down) * s.fly_speed;
            let rate = if vertical != 0.0 { s.acceleration } else { s.friction };
            self.velocity.y += (vertical - self.velocity.y) * (rate * dt).min(1.0);
        } else {
            if intent.jump && self.on_ground {
                self.velocity.y = s.jump_speed;
                self.on_ground = false;
            }
            self.velocity.y -= s.gravity * dt;
        }
    }

    /// Move along one axis, stopping flush against the first face in the way.
    fn move_axis(&mut self, axis: usize, delta: f32, colliders: &[Aabb]) {
        if delta == 0.0 {
            return;
        }
        let before = self.body();
        let mut target = self.position;
        target[axis] += delta;

        for collider in colliders {
            let body = self.body_at(target);
            if !body.intersects(collider) {
                continue;
            }
            if before.intersects(collider) {
                // Already stuck inside: only refuse motion towards the centre
                // that digs deeper. Fully inside, the overlap is the body
                // width and only drifts by rounding.
                let inwards = (collider.center()[axis] - self.position[axis]) * delta > 0.0;
                let deeper = body.overlap(collider)[axis] > before.overlap(collider)[axis] + SKIN;
                if inwards && deeper {
                    target[axis] = self.position[axis];
                    self.velocity[axis] = 0.0;
                }
                continue;
            }
            target[axis] = if delta > 0.0 {
                collider.min[axis] - self.extent(axis, true) - SKIN
            } else {
                collider.max[axis] + self.extent(axis, false) + SKIN
            };
            self.velocity[axis] = 0.0;
        }
        self.position = target;
    }

    fn clamp_to_ground(&mut self) {
        let lowest = self.settings.ground_level + self.settings.eye_height;
        if self.position.y < lowest {
            self.position.y = lowest;
            if self.velocity.y < 0.0 {
                self.velocity.y = 0.0;
            }
        }
    }

    fn clamp_to_bounds(&mut self) {
        if let Some(half) = self.bounds {
            let limit = (half - self.settings.radius).max(0.0);
            for axis in [X, Z] {
                let clamped = self.position[axis].clamp(-limit, limit);
                if clamped != self.position[axis] {
                    self.position[axis] = clamped;
                    self.velocity[axis] = 0.0;
                }
            }
        }
        if self.position.y > self.settings.max_altitude {
            self.position.y = self.settings.max_altitude;
            self.velocity.y = self.velocity.y.min(0.0);
        }
    }

    fn is_supported(&self, colliders: &[Aabb]) -> bool {
        let feet = self.position.y - self.settings.eye_height;
        if feet <= self.settings.ground_level + GROUND_PROBE {
            return true;
        }
        let probe = self.body().translate(Vector3::new(0.0, -GROUND_PROBE, 0.0));
        colliders.iter().any(|c| probe.intersects(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    fn settings() -> PlayerSettings {
        PlayerSettings::default()
    }

    fn standing_at(x: f32, z: f32) -> Player {
        let s = settings();
        let mut player = Player::new(Point3::new(x, s.ground_level + s.eye_height, z), s);
        player.on_ground = true;
        player
    }

    fn run(player: &mut Player, seconds: f32, intent: MovementIntent, colliders: &[Aabb]) {
        let frames = (seconds / FRAME).round() as u32;
        for _ in 0..frames {
            player.update(FRAME, Rad(0.0), &intent, colliders);
        }
    }

    fn forward() -> MovementIntent {
        MovementIntent {
            forward: true,
            ..Default::default()
        }
    }

    fn horizontal_speed(player: &Player) -> f32 {
        Vector3::new(player.velocity.x, 0.0, player.velocity.z).magnitude()
    }

    #[test]
    fn accelerates_towards_walk_speed_without_overshoot() {
        let mut player = standing_at(0.0, 0.0);
        player.update(FRAME, Rad(0.0), &forward(), &[]);
        let first = horizontal_speed(&player);
        assert!(first > 0.0 && first < settings().walk_speed);

        run(&mut player, 3.0, forward(), &[]);
        let speed = horizontal_speed(&player);
        assert!((speed - settings().walk_speed).abs() < 1e-2, "{speed}");
        assert!(speed <= settings().walk_speed + 1e-4);
        // yaw zero looks down +X
        assert!(player.position.x > 10.0);
        assert!(player.position.z.abs() < 1e-4);
    }

    #[test]
    fn diagonal_is_not_faster() {
        let mut player = standing_at(0.0, 0.0);
        let diagonal = MovementIntent {
            forward: true,
            right: true,
            ..Default::default()
        };
        run(&mut player, 3.0, diagonal, &[]);
        assert!(horizontal_speed(&player) <= settings().walk_speed + 1e-4);
        assert!(player.position.z > 0.0);
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut player = standing_at(0.0, 0.0);
        let both = MovementIntent {
            left: true,
            right: true,
            ..Default::default()
        };
        run(&mut player, 1.0, both, &[]);
        assert_eq!(horizontal_speed(&player), 0.0);
    }

    #[test]
    fn friction_brings_player_to_rest() {
        let mut player = standing_at(0.0, 0.0);
        run(&mut player, 2.0, forward(), &[]);
        run(&mut player, 3.0, MovementIntent::default(), &[]);
        assert!(horizontal_speed(&player) < 1e-2);
    }

    #[test]
    fn sprint_raises_top_speed() {
        let mut player = standing_at(0.0, 0.0);
        let sprint = MovementIntent {
            forward: true,
            sprint: true,
            ..Default::default()
        };
        run(&mut player, 3.0, sprint, &[]);
        let expected = settings().walk_speed * settings().sprint_multiplier;
        assert!((horizontal_speed(&player) - expected).abs() < 1e-2);
    }

    #[test]
    fn gravity_settles_on_the_ground() {
        let s = settings();
        let mut player = Player::new(Point3::new(0.0, 20.0, 0.0), s.clone());
        run(&mut player, 4.0, MovementIntent::default(), &[]);
        assert!((player.position.y - (s.ground_level + s.eye_height)).abs() < 1e-4);
        assert_eq!(player.velocity.y, 0.0);
        assert!(player.on_ground);
    }

    #[test]
    fn jumps_only_from_the_ground() {
        let mut player = standing_at(0.0, 0.0);
        let jump = MovementIntent {
            jump: true,
            ..Default::default()
        };
        player.update(FRAME, Rad(0.0), &jump, &[]);
        assert!(player.velocity.y > 0.0);
        assert!(!player.on_ground);

        let rising = player.velocity.y;
        player.update(FRAME, Rad(0.0), &jump, &[]);
        // no double jump, just gravity
        assert!(player.velocity.y < rising);

        run(&mut player, 2.0, MovementIntent::default(), &[]);
        assert!(player.on_ground);
    }

    #[test]
    fn fly_mode_ignores_gravity_and_climbs() {
        let mut player = standing_at(0.0, 0.0);
        player.toggle_fly();
        let start = player.position.y;
        run(&mut player, 1.0, MovementIntent::default(), &[]);
        assert!((player.position.y - start).abs() < 1e-4);

        let up = MovementIntent {
            up: true,
            ..Default::default()
        };
        run(&mut player, 2.0, up, &[]);
        assert!(player.position.y > start + 10.0);

        run(&mut player, 60.0, up, &[]);
        assert_eq!(player.position.y, settings().max_altitude);

        player.toggle_fly();
        run(&mut player, 10.0, MovementIntent::default(), &[]);
        assert!(player.on_ground);
    }

    #[test]
    fn wall_stops_player_flush() {
        let wall = Aabb::new(Point3::new(5.0, 0.0, -10.0), Point3::new(6.0, 10.0, 10.0));
        let mut player = standing_at(0.0, 0.0);
        run(&mut player, 3.0, forward(), &[wall]);
        let front = player.body().max.x;
        assert!(front <= wall.min.x);
        assert!(wall.min.x - front < 1e-2);
        assert!(!player.body().intersects(&wall));
    }

    #[test]
    fn slides_along_walls() {
        let wall = Aabb::new(Point3::new(2.0, 0.0, -50.0), Point3::new(3.0, 10.0, 50.0));
        let mut player = standing_at(0.0, 0.0);
        let diagonal = MovementIntent {
            forward: true,
            right: true,
            ..Default::default()
        };
        run(&mut player, 3.0, diagonal, &[wall]);
        assert!(player.body().max.x <= wall.min.x);
        // the blocked X motion does not stop the Z motion
        assert!(player.position.z > 5.0);
    }

    #[test]
    fn lands_on_roofs() {
        let s = settings();
        let roof = Aabb::new(Point3::new(-5.0, 0.0, -5.0), Point3::new(5.0, 12.0, 5.0));
        let mut player = Player::new(Point3::new(0.0, 30.0, 0.0), s.clone());
        run(&mut player, 3.0, MovementIntent::default(), &[roof]);
        assert!((player.position.y - (roof.max.y + s.eye_height)).abs() < 1e-2);
        assert!(player.on_ground);
    }

    #[test]
    fn fast_motion_does_not_tunnel_through_thin_walls() {
        let wall = Aabb::new(Point3::new(3.0, 0.0, -10.0), Point3::new(3.1, 10.0, 10.0));
        let mut player = standing_at(0.0, 0.0);
        player.velocity = Vector3::new(400.0, 0.0, 0.0);
        player.update(settings().max_step, Rad(0.0), &MovementIntent::default(), &[wall]);
        assert!(player.position.x < wall.min.x);
    }

    #[test]
    fn can_walk_out_of_a_box_it_spawned_in() {
        let crate_box = Aabb::new(Point3::new(-1.0, 0.0, -1.0), Point3::new(1.0, 3.0, 1.0));
        let mut player = standing_at(0.0, 0.0);
        run(&mut player, 3.0, forward(), &[crate_box]);
        assert!(!player.body().intersects(&crate_box));
    }

    #[test]
    fn keeps_moving_while_fully_inside_a_box() {
        let crate_box = Aabb::new(Point3::new(-4.0, 0.0, -4.0), Point3::new(4.0, 3.0, 4.0));
        let mut player = standing_at(0.267449, 0.0);
        player.velocity.x = settings().walk_speed;
        let mut last = player.position.x;
        for _ in 0..30 {
            player.update(FRAME, Rad(0.0), &forward(), &[crate_box]);
            assert!(player.position.x > last, "stuck at {:?}", player.position);
            last = player.position.x;
        }
        run(&mut player, 3.0, forward(), &[crate_box]);
        assert!(!player.body().intersects(&crate_box));
    }

    #[test]
    fn partly_inside_a_box_cannot_push_further_in() {
        let crate_box = Aabb::new(Point3::new(0.0, 0.0, -4.0), Point3::new(8.0, 3.0, 4.0));
        let s = settings();
        // front face a little past the box's west face
        let mut player = standing_at(-s.radius + 0.1, 0.0);
        let before = player.body().overlap(&crate_box).x;
        run(&mut player, 1.0, forward(), &[crate_box]);
        assert!(player.body().overlap(&crate_box).x <= before + 1e-3);

        let back = MovementIntent {
            backward: true,
            ..Default::default()
        };
        run(&mut player, 1.0, back, &[crate_box]);
        assert!(!player.body().intersects(&crate_box));
    }

    #[test]
    fn entering_fly_mode_mid_jump_holds_altitude() {
        let mut player = standing_at(0.0, 0.0);
        let jump = MovementIntent {
            jump: true,
            ..Default::default()
        };
        player.update(FRAME, Rad(0.0), &jump, &[]);
        run(&mut player, 0.1, MovementIntent::default(), &[]);
        assert!(player.velocity.y > 0.0);
        let s = settings();
        assert!(player.position.y > s.ground_level + s.eye_height);

        player.toggle_fly();
        assert_eq!(player.velocity.y, 0.0);
        let altitude = player.position.y;
        player.update(FRAME, Rad(0.0), &MovementIntent::default(), &[]);
        assert_eq!(player.position.y, altitude);
        assert_eq!(player.velocity.y, 0.0);
    }

    #[test]
    fn degenerate_time_steps_are_ignored() {
        let mut player = standing_at(0.0, 0.0);
        player.velocity = Vector3::new(1.0, 0.0, 0.0);
        let before = player.clone();
        player.update(0.0, Rad(0.0), &forward(), &[]);
        player.update(f32::NAN, Rad(0.0), &forward(), &[]);
        player.update(-1.0, Rad(0.0), &forward(), &[]);
        assert_eq!(player.position, before.position);
        assert_eq!(player.velocity, before.velocity);
    }

    #[test]
    fn stays_inside_world_bounds() {
        let mut player = standing_at(0.0, 0.0).with_bounds(5.0);
        run(&mut player, 5.0, forward(), &[]);
        assert!((player.position.x - (5.0 - settings().radius)).abs() < 1e-4);
    }
}
