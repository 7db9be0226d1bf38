use cgmath::{InnerSpace, Vector3};
use wgpu::util::DeviceExt;

use crate::data_structures::model;

/// Geometry on the CPU side, before it is uploaded.
///
/// Every builder here produces unit-sized shapes. Instances scale them to
/// their real size, so one upload serves every building, tile or road piece.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<model::ModelVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Append a quad centred on `center` facing `normal`. `up` is the half
    /// extent along the texture's vertical axis and `half_width` the half
    /// extent along its horizontal one.
    ///
    /// Texture coordinates run from 0 to 1 starting at the bottom-left corner
    /// as seen from the front, with v pointing down the image.
    fn push_face(&mut self, center: Vector3<f32>, normal: Vector3<f32>, up: Vector3<f32>, half_width: f32) {
        let right = up.normalize().cross(normal).normalize() * half_width;
        let corners = [
            (center - right - up, [0.0, 1.0]),
            (center + right - up, [1.0, 1.0]),
            (center + right + up, [1.0, 0.0]),
            (center - right + up, [0.0, 0.0]),
        ];
        let base = self.vertices.len() as u32;
        self.vertices
            .extend(corners.iter().map(|(position, tex_coords)| model::ModelVertex {
                position: (*position).into(),
                tex_coords: *tex_coords,
                normal: normal.into(),
            }));
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    pub fn merge(mut self, other: MeshData) -> Self {
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
        self
    }

    pub fn triangles(&self) -> usize {
        self.indices.len() / 3
    }
}

/// The four walls of a box with a unit footprint centred on the origin,
/// standing on y = 0 and one unit tall.
pub fn cuboid_sides() -> MeshData {
    let mut data = MeshData::default();
    let up = Vector3::unit_y() * 0.5;
    for normal in [
        Vector3::unit_x(),
        -Vector3::unit_x(),
        Vector3::unit_z(),
        -Vector3::unit_z(),
    ] {
        data.push_face(normal * 0.5 + up, normal, up, 0.5);
    }
    data
}

/// The roof matching [`cuboid_sides`].
pub fn cuboid_top() -> MeshData {
    let mut data = MeshData::default();
    data.push_face(
        Vector3::unit_y(),
        Vector3::unit_y(),
        -Vector3::unit_z() * 0.5,
        0.5,
    );
    data
}

pub fn cuboid() -> MeshData {
    cuboid_sides().merge(cuboid_top())
}

/// A unit square on y = 0 facing up.
pub fn plane() -> MeshData {
    let mut data = MeshData::default();
    data.push_face(
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::unit_y(),
        -Vector3::unit_z() * 0.5,
        0.5,
    );
    data
}

/// A cube from -1 to 1 whose faces point inwards, for drawing the sky
/// around the eye.
pub fn sky_cube() -> MeshData {
    let mut data = MeshData::default();
    for outward in [
        Vector3::unit_x(),
        -Vector3::unit_x(),
        Vector3::unit_z(),
        -Vector3::unit_z(),
    ] {
        data.push_face(outward, -outward, Vector3::unit_y(), 1.0);
    }
    data.push_face(Vector3::unit_y(), -Vector3::unit_y(), Vector3::unit_z(), 1.0);
    data.push_face(-Vector3::unit_y(), Vector3::unit_y(), -Vector3::unit_z(), 1.0);
    data
}

pub fn upload(device: &wgpu::Device, name: &str, data: &MeshData, material: usize) -> model::Mesh {
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{name} Vertex Buffer")),
        contents: bytemuck::cast_slice(&data.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{name} Index Buffer")),
        contents: bytemuck::cast_slice(&data.indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    model::Mesh {
        name: name.to_string(),
        vertex_buffer,
        index_buffer,
        num_elements: data.indices.len() as u32,
        material,
    }
}
