use instant::Duration;

use crate::{
    context::{Context, InitContext},
    data_structures::model::Mesh,
    flow::{self, FlowConstructor, GraphicsFlow, Out},
    pipelines::sky::mk_sky_pipeline,
    render::Render,
    resources::mesh,
    scene::WalkState,
};

/// Gradient sky with a sun, drawn before anything else.
pub struct SkyFlow {
    pipeline: wgpu::RenderPipeline,
    cube: Mesh,
}

impl SkyFlow {
    pub fn new(ctx: &InitContext) -> Self {
        let pipeline = mk_sky_pipeline(&ctx.device, ctx.format, &ctx.camera_layout, &ctx.light_layout);
        let cube = mesh::upload(&ctx.device, "Sky", &mesh::sky_cube(), 0);
        Self { pipeline, cube }
    }

    pub fn constructor() -> FlowConstructor<WalkState> {
        flow::constructor(|ctx| async move {
            anyhow::Ok(Box::new(SkyFlow::new(&ctx)) as Box<dyn GraphicsFlow<WalkState>>)
        })
    }
}

impl GraphicsFlow<WalkState> for SkyFlow {
    fn on_init(&mut self, ctx: &mut Context, _: &mut WalkState) -> Out {
        // Whatever the cube misses (it should miss nothing) blends into the horizon.
        let [r, g, b] = ctx.settings.view.horizon_colour;
        ctx.clear_colour = wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        };
        Out::Empty
    }

    fn on_update(&mut self, _: &Context, _: &mut WalkState, _: Duration) -> Out {
        Out::Empty
    }

    fn on_render<'pass>(&self) -> Render<'_, 'pass> {
        Render::Custom(Box::new(move |ctx: &Context, pass: &mut wgpu::RenderPass<'pass>| {
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &ctx.camera.bind_group, &[]);
            pass.set_bind_group(1, &ctx.light.bind_group, &[]);
            pass.set_vertex_buffer(0, self.cube.vertex_buffer.slice(..));
            pass.set_index_buffer(self.cube.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..self.cube.num_elements, 0, 0..1);
        }))
    }
}
