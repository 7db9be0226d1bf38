use std::f32::consts::FRAC_PI_2;

use cgmath::{Point3, Rad, Vector3};
use instant::Duration;
use winit::{
    event::{KeyEvent, WindowEvent},
    keyboard::PhysicalKey,
};

use crate::{
    context::{Context, InitContext},
    flow::{self, FlowConstructor, GraphicsFlow, Out},
    input::{Command, Controls, MovementIntent},
    player::Player,
    render::Render,
    scene::WalkState,
};

/// Keyboard-driven walking and flying. Moves the camera to the player's eye
/// every frame; mouse look is handled by the camera controller.
pub struct PlayerFlow {
    controls: Controls,
    player: Player,
}

impl PlayerFlow {
    pub fn new(ctx: &InitContext) -> Self {
        let settings = ctx.settings.player.clone();
        Self {
            controls: Controls::new(),
            player: Player::new(Point3::new(0.0, settings.eye_height, 0.0), settings),
        }
    }

    pub fn constructor() -> FlowConstructor<WalkState> {
        flow::constructor(|ctx| async move {
            anyhow::Ok(Box::new(PlayerFlow::new(&ctx)) as Box<dyn GraphicsFlow<WalkState>>)
        })
    }
}

impl GraphicsFlow<WalkState> for PlayerFlow {
    fn on_init(&mut self, ctx: &mut Context, state: &mut WalkState) -> Out {
        let settings = self.player.settings().clone();
        let ground = state.spawn.unwrap_or_else(|| {
            log::warn!("No spawn point was published, starting at the origin");
            Point3::new(0.0, settings.ground_level, 0.0)
        });
        let eye = ground + Vector3::new(0.0, settings.eye_height, 0.0);
        let mut player = Player::new(eye, settings);
        if let Some(half_extent) = state.half_extent {
            player = player.with_bounds(half_extent);
        }
        self.player = player;

        let camera = &mut ctx.camera.camera;
        camera.position = eye;
        // down the street
        camera.yaw = Rad(FRAC_PI_2);
        camera.pitch = Rad(0.0);
        log::info!("Player spawned at {:?}", eye);
        Out::Empty
    }

    fn on_window_events(&mut self, _: &Context, _: &mut WalkState, event: &WindowEvent) -> Out {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                if let Some(Command::ToggleFly) = self.controls.handle_key(*code, state.is_pressed()) {
                    self.player.toggle_fly();
                }
            }
            // key releases never arrive once the window is in the background
            WindowEvent::Focused(false) => self.controls.release_all(),
            _ => (),
        }
        Out::Empty
    }

    fn on_update(&mut self, ctx: &Context, state: &mut WalkState, dt: Duration) -> Out {
        let intent = if ctx.pointer.locked {
            self.controls.intent(self.player.fly_mode)
        } else {
            MovementIntent::default()
        };
        self.player.update(
            dt.as_secs_f32(),
            ctx.camera.camera.yaw,
            &intent,
            &state.colliders,
        );

        let eye = self.player.position;
        Out::Configure(Box::new(move |ctx: &mut Context| {
            ctx.camera.camera.position = eye;
        }))
    }

    fn on_render<'pass>(&self) -> Render<'_, 'pass> {
        Render::None
    }
}
