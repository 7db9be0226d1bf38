use wgpu::{Device, util::DeviceExt};

use crate::data_structures::{instance::Instance, model::Model};

/**
 * A `MeshBatch` draws one model many times with a single instanced draw call.
 *
 * The ground, the road, every sidewalk tile and every building of one style
 * are each a batch. Instances are uploaded once; the city never changes after
 * it is generated.
 */
#[derive(Debug)]
pub struct MeshBatch {
    pub label: String,
    pub model: Model,
    pub instances: Vec<Instance>,
    pub instance_buffer: wgpu::Buffer,
}

impl MeshBatch {
    pub fn new(device: &Device, label: &str, model: Model, instances: Vec<Instance>) -> Self {
        let instance_data = instances.iter().map(Instance::to_raw).collect::<Vec<_>>();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&instance_data),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            label: label.to_string(),
            model,
            instances,
            instance_buffer,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
