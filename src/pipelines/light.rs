use cgmath::{InnerSpace, Vector3};
use wgpu::util::DeviceExt;

use crate::config::ViewSettings;

/// Sun, sky and fog. Shared by the city and sky shaders.
#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, view: &ViewSettings) -> Self {
        let uniform = LightUniform::from(view);
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    /// Unit vector pointing towards the sun.
    direction: [f32; 3],
    ambient: f32,
    colour: [f32; 3],
    fog_distance: f32,
    horizon: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: u32,
    zenith: [f32; 3],
    _padding2: u32,
}

impl From<&ViewSettings> for LightUniform {
    fn from(view: &ViewSettings) -> Self {
        let direction = Vector3::from(view.sun_direction);
        let direction = if direction.magnitude2() > f32::EPSILON {
            direction.normalize()
        } else {
            log::warn!("Sun direction {:?} has no length, using straight up", view.sun_direction);
            Vector3::unit_y()
        };
        Self {
            direction: direction.into(),
            ambient: view.ambient.clamp(0.0, 1.0),
            colour: view.sun_colour,
            fog_distance: view.fog_distance.max(0.0),
            horizon: view.horizon_colour,
            _padding: 0,
            zenith: view.zenith_colour,
            _padding2: 0,
        }
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
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
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_wgsl_uniform_size() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 64);
    }

    #[test]
    fn sun_direction_is_normalised() {
        let uniform = LightUniform::from(&ViewSettings {
            sun_direction: [0.0, 3.0, 4.0],
            ..Default::default()
        });
        let [x, y, z] = uniform.direction;
        assert!(x.abs() < 1e-6 && (y - 0.6).abs() < 1e-6 && (z - 0.8).abs() < 1e-6);

        let uniform = LightUniform::from(&ViewSettings {
            sun_direction: [0.0; 3],
            ambient: 7.0,
            ..Default::default()
        });
        assert_eq!(uniform.direction, [0.0, 1.0, 0.0]);
        assert_eq!(uniform.ambient, 1.0);
    }
}
