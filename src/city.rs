//! Procedural city layout.
//!
//! The city is a single straight road running along Z through the origin,
//! lined on both sides by tiled sidewalks and then by rows of building lots.
//! [`CityLayout::generate`] is pure and deterministic for a given seed, so the
//! same settings always produce the same street.

use anyhow::ensure;
use cgmath::{Point3, Vector3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{collision::Aabb, config::CitySettings};

const MAX_SIDEWALK_TILES: u64 = 1 << 20;

#[derive(Clone, Debug, PartialEq)]
pub struct Building {
    /// Centre of the footprint at ground level.
    pub base: Point3<f32>,
    pub size: Vector3<f32>,
    /// Index of the facade texture.
    pub style: usize,
    pub tint: [f32; 3],
}

impl Building {
    pub fn new(
        base: Point3<f32>,
        size: Vector3<f32>,
        style: usize,
        tint: [f32; 3],
    ) -> anyhow::Result<Self> {
        ensure!(
            base.x.is_finite() && base.y.is_finite() && base.z.is_finite(),
            "building base {base:?} is not finite"
        );
        ensure!(
            size.x > 0.0 && size.y > 0.0 && size.z > 0.0,
            "building size {size:?} must be positive"
        );
        ensure!(
            size.x.is_finite() && size.y.is_finite() && size.z.is_finite(),
            "building size {size:?} is not finite"
        );
        Ok(Self {
            base,
            size,
            style,
            tint,
        })
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_base(self.base.x, self.base.y, self.base.z, self.size)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SidewalkTile {
    pub center: Point3<f32>,
    pub size: f32,
}

#[derive(Clone, Debug)]
pub struct CityLayout {
    /// The road surface, zero height.
    pub road: Aabb,
    pub sidewalks: Vec<SidewalkTile>,
    pub buildings: Vec<Building>,
    /// Ground point where the walk starts.
    pub spawn: Point3<f32>,
    /// Horizontal half extent of everything that was placed.
    pub half_extent: f32,
}

impl CityLayout {
    pub fn generate(settings: &CitySettings) -> Self {
        let alley = settings.alley.max(0.0);
        if alley != settings.alley {
            log::warn!("Alley width {} is invalid, using {alley}", settings.alley);
        }
        let settings = &CitySettings {
            alley,
            ..settings.clone()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
        let half_length = settings.length.max(0.0) / 2.0;
        let half_road = settings.road_width.max(0.0) / 2.0;
        let lots_start = half_road + settings.sidewalk_width.max(0.0);

        let road = Aabb::new(
            Point3::new(-half_road, 0.0, -half_length),
            Point3::new(half_road, 0.0, half_length),
        );
        let sidewalks = sidewalk_tiles(settings, half_road, half_length);

        let lots_along = if settings.lot_size > 0.0 {
            (settings.length / settings.lot_size).floor().max(0.0) as u32
        } else {
            0
        };
        let mut buildings = Vec::new();
        let mut rejected = 0;
        for side in [-1.0f32, 1.0] {
            for row in 0..settings.rows {
                for lot in 0..lots_along {
                    if rng.r#gen::<f64>() < settings.vacancy {
                        continue;
                    }
                    let near = lots_start + row as f32 * settings.lot_size;
                    let south = -half_length + lot as f32 * settings.lot_size;
                    match place_building(&mut rng, settings, side, near, south) {
                        Ok(building) => buildings.push(building),
                        Err(e) => {
                            rejected += 1;
                            log::warn!("Skipping building in lot {lot} row {row}: {e}");
                        }
                    }
                }
            }
        }
        log::info!(
            "Generated city with {} buildings ({} rejected) and {} sidewalk tiles",
            buildings.len(),
            rejected,
            sidewalks.len()
        );

        let half_extent = (lots_start + settings.rows as f32 * settings.lot_size.max(0.0))
            .max(half_length);
        let spawn = Point3::new(0.0, 0.0, -half_length + settings.lot_size.max(0.0).min(half_length));

        Self {
            road,
            sidewalks,
            buildings,
            spawn,
            half_extent,
        }
    }

    pub fn colliders(&self) -> Vec<Aabb> {
        self.buildings.iter().map(Building::aabb).collect()
    }
}

fn sidewalk_tiles(settings: &CitySettings, half_road: f32, half_length: f32) -> Vec<SidewalkTile> {
    let tile = settings.tile_size;
    if !(tile > 0.0) {
        return Vec::new();
    }
    let across = (settings.sidewalk_width / tile).floor().max(0.0) as u32;
    let along = (settings.length / tile).floor().max(0.0) as u32;
    let count = (across as u64).saturating_mul(along as u64).saturating_mul(2);
    if count > MAX_SIDEWALK_TILES {
        log::warn!("{count} sidewalk tiles requested, leaving the sidewalks bare");
        return Vec::new();
    }
    let mut tiles = Vec::with_capacity(count as usize);
    for side in [-1.0f32, 1.0] {
        for column in 0..across {
            let x = side * (half_road + tile * (column as f32 + 0.5));
            for row in 0..along {
                let z = -half_length + tile * (row as f32 + 0.5);
                tiles.push(SidewalkTile {
                    center: Point3::new(x, 0.0, z),
                    size: tile,
                });
            }
        }
    }
    tiles
}

/// Pick a footprint and height for the lot whose road-facing edge is `near`
/// metres from the centre line and whose south edge is at `south`.
fn place_building(
    rng: &mut ChaCha8Rng,
    settings: &CitySettings,
    side: f32,
    near: f32,
    south: f32,
) -> anyhow::Result<Building> {
    let usable = settings.lot_size - 2.0 * settings.alley;
    let width = usable * lerp(0.55, 1.0, rng.r#gen());
    let depth = usable * lerp(0.55, 1.0, rng.r#gen());
    // skewed towards low-rise
    let skew: f32 = rng.r#gen::<f32>().powf(1.6);
    let height = lerp(settings.min_height, settings.max_height, skew);

    let x_offset = settings.alley + depth / 2.0 + (usable - depth) * rng.r#gen::<f32>();
    let z_offset = settings.alley + width / 2.0 + (usable - width) * rng.r#gen::<f32>();
    let base = Point3::new(side * (near + x_offset), 0.0, south + z_offset);

    let style = rng.gen_range(0..settings.styles.max(1)) as usize;
    let shade = lerp(0.75, 1.0, rng.r#gen());
    let tint = [
        shade * lerp(0.9, 1.0, rng.r#gen()),
        shade * lerp(0.9, 1.0, rng.r#gen()),
        shade * lerp(0.9, 1.0, rng.r#gen()),
    ];

    Building::new(base, Vector3::new(depth, height, width), style, tint)
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lots_start(settings: &CitySettings) -> f32 {
        settings.road_width / 2.0 + settings.sidewalk_width
    }

    #[test]
    fn same_seed_same_city() {
        let settings = CitySettings::default();
        let a = CityLayout::generate(&settings);
        let b = CityLayout::generate(&settings);
        assert_eq!(a.buildings, b.buildings);
        assert_eq!(a.sidewalks, b.sidewalks);

        let other = CityLayout::generate(&CitySettings {
            seed: settings.seed + 1,
            ..settings
        });
        assert_ne!(a.buildings, other.buildings);
    }

    #[test]
    fn buildings_keep_off_the_street() {
        let settings = CitySettings::default();
        let layout = CityLayout::generate(&settings);
        let edge = lots_start(&settings);
        assert!(!layout.buildings.is_empty());
        for building in &layout.buildings {
            let aabb = building.aabb();
            assert!(
                aabb.min.x >= edge - 1e-3 || aabb.max.x <= -edge + 1e-3,
                "{aabb:?} reaches into the street"
            );
        }
    }

    #[test]
    fn buildings_do_not_overlap() {
        let layout = CityLayout::generate(&CitySettings::default());
        let boxes = layout.colliders();
        for (i, a) in boxes.iter().enumerate() {
            for b in &boxes[i + 1..] {
                assert!(!a.intersects(b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn everything_lies_within_the_half_extent() {
        let layout = CityLayout::generate(&CitySettings::default());
        for aabb in layout.colliders() {
            assert!(aabb.min.x >= -layout.half_extent && aabb.max.x <= layout.half_extent);
            assert!(aabb.min.z >= -layout.half_extent && aabb.max.z <= layout.half_extent);
        }
        assert!(layout.road.contains(layout.spawn));
    }

    #[test]
    fn vacancy_controls_lot_usage() {
        let settings = CitySettings {
            vacancy: 0.0,
            ..Default::default()
        };
        let full = CityLayout::generate(&settings);
        let lots_along = (settings.length / settings.lot_size).floor() as usize;
        assert_eq!(full.buildings.len(), 2 * settings.rows as usize * lots_along);

        let empty = CityLayout::generate(&CitySettings {
            vacancy: 1.0,
            ..settings
        });
        assert!(empty.buildings.is_empty());
    }

    #[test]
    fn heights_and_styles_respect_settings() {
        let settings = CitySettings {
            styles: 3,
            ..Default::default()
        };
        let layout = CityLayout::generate(&settings);
        for building in &layout.buildings {
            assert!(building.size.y >= settings.min_height && building.size.y <= settings.max_height);
            assert!(building.style < 3);
        }
    }

    #[test]
    fn sidewalks_are_tiled_on_both_sides() {
        let settings = CitySettings::default();
        let layout = CityLayout::generate(&settings);
        let across = (settings.sidewalk_width / settings.tile_size) as usize;
        let along = (settings.length / settings.tile_size) as usize;
        assert_eq!(layout.sidewalks.len(), 2 * across * along);
        let half_road = settings.road_width / 2.0;
        for tile in &layout.sidewalks {
            assert!(tile.center.x.abs() > half_road);
            assert!(tile.center.x.abs() < lots_start(&settings));
        }
    }

    #[test]
    fn impossible_lots_are_skipped_not_fatal() {
        let settings = CitySettings {
            alley: 20.0,
            tile_size: 0.0,
            ..Default::default()
        };
        let layout = CityLayout::generate(&settings);
        assert!(layout.buildings.is_empty());
        assert!(layout.sidewalks.is_empty());
    }

    #[test]
    fn negative_alley_keeps_buildings_in_their_lots() {
        let settings = CitySettings {
            alley: -6.0,
            vacancy: 0.0,
            ..Default::default()
        };
        let layout = CityLayout::generate(&settings);
        assert!(!layout.buildings.is_empty());
        let edge = lots_start(&settings);
        let boxes = layout.colliders();
        for (i, a) in boxes.iter().enumerate() {
            assert!(a.min.x >= edge - 1e-3 || a.max.x <= -edge + 1e-3, "{a:?} reaches into the street");
            for b in &boxes[i + 1..] {
                assert!(!a.intersects(b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn absurd_sidewalk_tiling_is_refused() {
        let settings = CitySettings {
            length: 1e6,
            tile_size: 0.1,
            sidewalk_width: 50.0,
            ..Default::default()
        };
        assert!(sidewalk_tiles(&settings, 5.0, 5e5).is_empty());
    }

    #[test]
    fn building_rejects_degenerate_sizes() {
        let base = Point3::new(0.0, 0.0, 0.0);
        assert!(Building::new(base, Vector3::new(1.0, 0.0, 1.0), 0, [1.0; 3]).is_err());
        assert!(Building::new(base, Vector3::new(1.0, f32::INFINITY, 1.0), 0, [1.0; 3]).is_err());
        assert!(Building::new(Point3::new(f32::NAN, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0), 0, [1.0; 3]).is_err());
        assert!(Building::new(base, Vector3::new(4.0, 10.0, 4.0), 2, [1.0; 3]).is_ok());
    }
}
