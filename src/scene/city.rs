//! GPU side of the city: turns a [`CityLayout`] into instanced batches.

use cgmath::{EuclideanSpace, Vector3};
use instant::Duration;

use crate::{
    city::{Building, CityLayout},
    config::Settings,
    context::{Context, InitContext},
    data_structures::{batch::MeshBatch, instance::Instance, model::Model},
    flow::{self, FlowConstructor, GraphicsFlow, Out},
    render::{Instanced, Render},
    resources::{mesh, texture},
    scene::WalkState,
};

/// Metres one facade texture repeat covers: one window bay by one storey.
const FACADE_TILE: [f32; 2] = [4.0, 3.5];
const GRASS_TILE: [f32; 2] = [8.0, 8.0];
/// Length of one dash and gap of the centre line.
const ROAD_MARKING_REPEAT: f32 = 6.0;
/// Keeps the road above the ground so they do not fight over depth.
const ROAD_LIFT: f32 = 0.02;
const KERB_HEIGHT: f32 = 0.15;
/// Share of a sidewalk cell covered by the slab, the rest is grout.
const SLAB_FILL: f32 = 0.94;

pub struct CityFlow {
    layout: CityLayout,
    batches: Vec<MeshBatch>,
}

impl CityFlow {
    pub fn new(ctx: &InitContext) -> anyhow::Result<Self> {
        let settings: &Settings = &ctx.settings;
        let layout = CityLayout::generate(&settings.city);
        let diffuse = texture::diffuse_layout(&ctx.device);
        let material = |name: &str, img: &image::RgbaImage| {
            texture::material(&ctx.device, &ctx.queue, &diffuse, name, img)
        };

        let mut batches = Vec::new();

        // The ground reaches the far plane so its edge is never seen.
        let ground_size = 2.0 * settings.view.zfar.max(layout.half_extent);
        let ground = Model {
            meshes: vec![mesh::upload(&ctx.device, "Ground", &mesh::plane(), 0)],
            materials: vec![material("Grass", &texture::grass())?],
        };
        let ground_instance = Instance::new()
            .with_scale(Vector3::new(ground_size, 1.0, ground_size))
            .with_tile(GRASS_TILE);
        batches.push(MeshBatch::new(&ctx.device, "Ground", ground, vec![ground_instance]));

        let road_size = layout.road.size();
        if road_size.x > 0.0 && road_size.z > 0.0 {
            let road = Model {
                meshes: vec![mesh::upload(&ctx.device, "Road", &mesh::plane(), 0)],
                materials: vec![material("Asphalt", &texture::asphalt())?],
            };
            let mut road_instance = Instance::from(layout.road.center().to_vec())
                .with_scale(Vector3::new(road_size.x, 1.0, road_size.z))
                .with_tile([road_size.x, ROAD_MARKING_REPEAT]);
            road_instance.position.y += ROAD_LIFT;
            batches.push(MeshBatch::new(&ctx.device, "Road", road, vec![road_instance]));
        }

        let slabs = layout
            .sidewalks
            .iter()
            .map(|tile| {
                Instance::from(tile.center.to_vec()).with_scale(Vector3::new(
                    tile.size * SLAB_FILL,
                    KERB_HEIGHT,
                    tile.size * SLAB_FILL,
                ))
            })
            .collect::<Vec<_>>();
        let sidewalk = Model {
            meshes: vec![mesh::upload(&ctx.device, "Sidewalk", &mesh::cuboid(), 0)],
            materials: vec![material("Sidewalk", &texture::sidewalk())?],
        };
        batches.push(MeshBatch::new(&ctx.device, "Sidewalks", sidewalk, slabs));

        let sides = mesh::cuboid_sides();
        let top = mesh::cuboid_top();
        for style in 0..settings.city.styles.max(1) as usize {
            let instances = layout
                .buildings
                .iter()
                .filter(|b| b.style == style)
                .map(building_instance)
                .collect::<Vec<_>>();
            if instances.is_empty() {
                continue;
            }
            let label = format!("Buildings style {style}");
            let model = Model {
                meshes: vec![
                    mesh::upload(&ctx.device, &format!("{label} walls"), &sides, 0),
                    mesh::upload(&ctx.device, &format!("{label} roofs"), &top, 1),
                ],
                materials: vec![
                    material(&format!("Facade {style}"), &texture::facade(style))?,
                    material("Roof", &texture::roof())?,
                ],
            };
            batches.push(MeshBatch::new(&ctx.device, &label, model, instances));
        }

        log::info!(
            "City uploaded in {} batches ({} instances)",
            batches.len(),
            batches.iter().map(|b| b.instances.len()).sum::<usize>()
        );

        Ok(Self { layout, batches })
    }

    pub fn constructor() -> FlowConstructor<WalkState> {
        flow::constructor(|ctx| async move {
            anyhow::Ok(Box::new(CityFlow::new(&ctx)?) as Box<dyn GraphicsFlow<WalkState>>)
        })
    }
}

fn building_instance(building: &Building) -> Instance {
    Instance::from(building.base.to_vec())
        .with_scale(building.size)
        .with_tint(building.tint)
        .with_tile(FACADE_TILE)
}

impl GraphicsFlow<WalkState> for CityFlow {
    fn on_init(&mut self, _: &mut Context, state: &mut WalkState) -> Out {
        state.colliders = self.layout.colliders();
        state.spawn = Some(self.layout.spawn);
        state.half_extent = Some(self.layout.half_extent);
        Out::Empty
    }

    fn on_update(&mut self, _: &Context, _: &mut WalkState, _: Duration) -> Out {
        Out::Empty
    }

    fn on_render<'pass>(&self) -> Render<'_, 'pass> {
        Render::Defaults(
            self.batches
                .iter()
                .filter(|batch| !batch.is_empty())
                .map(Instanced::from)
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Point3, Transform};

    use super::*;

    #[test]
    fn building_instance_covers_its_collider() {
        let building = Building::new(
            Point3::new(20.0, 0.0, -8.0),
            Vector3::new(10.0, 30.0, 12.0),
            1,
            [0.9, 0.8, 0.85],
        )
        .unwrap();
        let matrix = building_instance(&building).to_matrix();
        let aabb = building.aabb();
        assert_eq!(matrix.transform_point(Point3::new(-0.5, 0.0, -0.5)), aabb.min);
        assert_eq!(matrix.transform_point(Point3::new(0.5, 1.0, 0.5)), aabb.max);
    }
}
