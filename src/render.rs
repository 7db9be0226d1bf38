//! Render composition and pipeline batching.
//!
//! Flows describe what they want drawn with a [`Render`] value each frame.
//! The app walks those values, runs custom draws right away and collects the
//! instanced batches so they can all be drawn with the basic pipeline bound
//! once.

use wgpu::RenderPass;

use crate::{
    context::Context,
    data_structures::{batch::MeshBatch, model::Model},
};

/// Data for instanced object rendering: a model and its instance buffer.
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub model: &'a Model,
    pub amount: usize,
}

/// Specifies how a flow should be rendered.
///
/// - `None` renders nothing
/// - `Defaults(Vec<Instanced>)` renders a batch of opaque instanced objects
/// - `Custom(...)` invokes a closure with its own pipeline, e.g. the sky
pub enum Render<'a, 'pass>
where
    'pass: 'a,
{
    None,
    Defaults(Vec<Instanced<'a>>),
    Custom(Box<dyn 'a + FnOnce(&Context, &mut wgpu::RenderPass<'pass>)>),
}

impl<'a, 'pass> Render<'a, 'pass> {
    pub(crate) fn set_pipelines(
        self,
        ctx: &Context,
        render_pass: &mut RenderPass<'pass>,
        basics: &mut Vec<Instanced<'a>>,
    ) {
        match self {
            Render::Defaults(mut vec) => basics.append(&mut vec),
            Render::Custom(f) => f(ctx, render_pass),
            Render::None => (),
        }
    }
}

impl<'a> From<&'a MeshBatch> for Instanced<'a> {
    fn from(batch: &'a MeshBatch) -> Self {
        Instanced {
            instance: &batch.instance_buffer,
            model: &batch.model,
            amount: batch.instances.len(),
        }
    }
}
