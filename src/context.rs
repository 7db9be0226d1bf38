use std::sync::Arc;

use anyhow::Context as _;
use wgpu::util::DeviceExt;
use winit::window::{CursorGrabMode, Window};

use crate::{
    camera::{self, CameraResources, CameraUniform, Projection},
    config::Settings,
    data_structures::texture,
    pipelines::{basic::mk_basic_pipeline, light::LightResources},
};

#[derive(Debug)]
pub struct Pipelines {
    pub basic: wgpu::RenderPipeline,
}

/// Whether the mouse is captured for looking around.
#[derive(Debug, Default)]
pub struct Pointer {
    pub locked: bool,
}

impl Pointer {
    /// Grab and hide the cursor. Browsers only allow this from a user
    /// gesture, so call it from a click handler.
    pub fn lock(&mut self, window: &Window) {
        let grabbed = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
        if let Err(e) = grabbed {
            log::warn!("Could not grab the cursor: {e}");
        }
        window.set_cursor_visible(false);
        if !self.locked {
            log::info!("Pointer captured");
        }
        self.locked = true;
    }

    pub fn release(&mut self, window: &Window) {
        if !self.locked {
            return;
        }
        if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
            log::warn!("Could not release the cursor: {e}");
        }
        window.set_cursor_visible(true);
        self.locked = false;
        log::info!("Pointer released");
    }

    /// The browser drops pointer lock on its own (for instance on Escape,
    /// which never reaches the page). Catch up with it.
    #[cfg(target_arch = "wasm32")]
    pub fn sync_with_browser(&mut self) {
        let still_locked = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.pointer_lock_element())
            .is_some();
        if self.locked && !still_locked {
            log::info!("Pointer lock ended by the browser");
            self.locked = false;
        }
    }
}

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub light: LightResources,
    pub pipelines: Pipelines,
    pub clear_colour: wgpu::Color,
    pub settings: Arc<Settings>,
    pub pointer: Pointer,
}

impl Context {
    pub async fn new(window: Arc<Window>, settings: Settings) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("Could not create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No graphics adapter can present to this window")?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                ..Default::default()
            })
            .await
            .context("Could not open the graphics device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shaders work in linear colour and rely on an sRGB surface.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("The surface supports no texture formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let view = &settings.view;
        let camera = camera::Camera::new((0.0, 0.0, 0.0), cgmath::Rad(0.0), cgmath::Rad(0.0));
        let projection = camera::Projection::new(
            config.width,
            config.height,
            cgmath::Deg(view.fov_degrees),
            view.znear,
            view.zfar,
        );
        let camera_controller = camera::CameraController::new(view.mouse_sensitivity);

        let mut camera_uniform = CameraUniform::new();
        camera_uniform.update_view_proj(&camera, &projection);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("camera_bind_group_layout"),
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let camera = CameraResources {
            camera,
            controller: camera_controller,
            uniform: camera_uniform,
            buffer: camera_buffer,
            bind_group: camera_bind_group,
            bind_group_layout: camera_bind_group_layout,
        };

        let depth_texture = texture::Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            "depth_texture",
        );

        let light = LightResources::new(&device, view);

        let pipelines = Pipelines {
            basic: mk_basic_pipeline(
                &device,
                config.format,
                &light.bind_group_layout,
                &camera.bind_group_layout,
            ),
        };

        let [r, g, b] = view.horizon_colour;
        let clear_colour = wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        };

        Ok(Self {
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            light,
            pipelines,
            clear_colour,
            settings: Arc::new(settings),
            pointer: Pointer::default(),
            window,
            depth_texture,
        })
    }
}

/// What a flow constructor gets to build its GPU resources with.
///
/// Device and queue are reference counted inside wgpu, so cloning them here
/// only clones handles.
#[derive(Debug, Clone)]
pub struct InitContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub format: wgpu::TextureFormat,
    pub camera_layout: wgpu::BindGroupLayout,
    pub light_layout: wgpu::BindGroupLayout,
    pub settings: Arc<Settings>,
}

impl From<&Context> for InitContext {
    fn from(ctx: &Context) -> Self {
        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            format: ctx.config.format,
            camera_layout: ctx.camera.bind_group_layout.clone(),
            light_layout: ctx.light.bind_group_layout.clone(),
            settings: ctx.settings.clone(),
        }
    }
}
