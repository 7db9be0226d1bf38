//! Procedurally painted textures.
//!
//! Nothing is loaded from disk: every surface of the city is painted into an
//! [`image::RgbaImage`] here and uploaded through [`Texture::from_image`].
//! Noise comes from a fixed seed so the city looks the same on every run.

use image::{Rgba, RgbaImage};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::data_structures::{model::Material, texture::Texture};

const SIZE: u32 = 64;

pub fn diffuse_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("Diffuse texture_bind_group_layout"),
    })
}

pub fn material(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    name: &str,
    img: &RgbaImage,
) -> anyhow::Result<Material> {
    let texture = Texture::from_image(device, queue, img, name)?;
    Material::new(device, name, texture, layout)
}

/// Wall colour, window colour and the window's share of the bay width.
const FACADES: [([u8; 3], [u8; 3], f32); 4] = [
    ([150, 72, 54], [46, 58, 74], 0.45),
    ([168, 168, 160], [52, 66, 84], 0.55),
    ([206, 186, 148], [40, 52, 66], 0.40),
    ([96, 116, 132], [120, 160, 190], 0.85),
];

/// One bay of one floor: a patch of wall with a single framed window. The
/// city shader repeats it across each facade.
pub fn facade(style: usize) -> RgbaImage {
    let style = style % FACADES.len();
    let (wall, glass, window_share) = FACADES[style];
    let mut rng = ChaCha8Rng::seed_from_u64(0xfa_cade + style as u64);
    let margin_x = ((1.0 - window_share) / 2.0 * SIZE as f32) as u32;
    let (top, bottom) = (SIZE / 5, SIZE * 3 / 4);

    RgbaImage::from_fn(SIZE, SIZE, |x, y| {
        let inside_x = x >= margin_x && x < SIZE - margin_x;
        let inside_y = y >= top && y < bottom;
        if inside_x && inside_y {
            let on_frame =
                x < margin_x + 2 || x >= SIZE - margin_x - 2 || y < top + 2 || y >= bottom - 2;
            if on_frame {
                shade([70, 70, 70], &mut rng, 6)
            } else {
                // lighter towards the top, like a reflected sky
                let lift = ((bottom - y) * 24 / (bottom - top)) as u8;
                shade(glass.map(|c| c.saturating_add(lift)), &mut rng, 4)
            }
        } else if y >= SIZE - 3 {
            // floor slab
            shade(wall.map(|c| c.saturating_sub(30)), &mut rng, 8)
        } else {
            shade(wall, &mut rng, 14)
        }
    })
}

pub fn roof() -> RgbaImage {
    let mut rng = ChaCha8Rng::seed_from_u64(0x2007);
    RgbaImage::from_fn(SIZE, SIZE, |_, _| shade([92, 92, 96], &mut rng, 24))
}

/// Asphalt across the full width of the road, with solid edge lines and a
/// dashed centre line. One repeat covers one dash and one gap.
pub fn asphalt() -> RgbaImage {
    let mut rng = ChaCha8Rng::seed_from_u64(0xa5_fa17);
    let centre = SIZE / 2;
    RgbaImage::from_fn(SIZE, SIZE, |x, y| {
        let edge_line = x == 2 || x == SIZE - 3;
        let centre_dash = (x == centre || x + 1 == centre) && y < SIZE / 2;
        if edge_line || centre_dash {
            shade([228, 226, 214], &mut rng, 10)
        } else {
            shade([58, 58, 62], &mut rng, 12)
        }
    })
}

pub fn grass() -> RgbaImage {
    let mut rng = ChaCha8Rng::seed_from_u64(0x9a55);
    RgbaImage::from_fn(SIZE, SIZE, |_, _| shade([72, 110, 58], &mut rng, 28))
}

/// A single paving slab with a darker seam around it.
pub fn sidewalk() -> RgbaImage {
    let mut rng = ChaCha8Rng::seed_from_u64(0x51de);
    RgbaImage::from_fn(SIZE, SIZE, |x, y| {
        let seam = x < 2 || y < 2 || x >= SIZE - 2 || y >= SIZE - 2;
        if seam {
            shade([120, 118, 112], &mut rng, 6)
        } else {
            shade([178, 176, 168], &mut rng, 14)
        }
    })
}

fn shade(colour: [u8; 3], rng: &mut ChaCha8Rng, spread: i16) -> Rgba<u8> {
    let offset = if spread > 0 {
        rng.gen_range(-spread..=spread)
    } else {
        0
    };
    let [r, g, b] = colour.map(|c| (c as i16 + offset).clamp(0, 255) as u8);
    Rgba([r, g, b, 255])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textures_are_deterministic() {
        assert_eq!(facade(1), facade(1));
        assert_eq!(asphalt(), asphalt());
        assert_ne!(facade(0), facade(1));
    }

    #[test]
    fn every_style_has_a_window() {
        for style in 0..FACADES.len() {
            let img = facade(style);
            let centre = img.get_pixel(SIZE / 2, SIZE / 2);
            let corner = img.get_pixel(0, 0);
            assert_ne!(centre, corner, "style {style} has no window");
        }
        // styles past the palette wrap around
        assert_eq!(facade(FACADES.len()), facade(0));
    }

    #[test]
    fn road_has_markings() {
        let img = asphalt();
        let line = img.get_pixel(2, 10)[0];
        let tar = img.get_pixel(SIZE / 4, 10)[0];
        assert!(line > tar + 100);
    }

    #[test]
    fn all_opaque() {
        for img in [roof(), grass(), sidewalk(), asphalt(), facade(3)] {
            assert!(img.pixels().all(|p| p[3] == 255));
        }
    }
}
