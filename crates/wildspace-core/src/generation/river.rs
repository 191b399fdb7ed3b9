//! River generation - walks a meandering line across the plane and submits
//! it to the spatial index as one path feature.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use wildspace_logic::coords::{check, Coord, Direction};
use wildspace_logic::error::{Conflict, FeatureId, SpatialError};
use wildspace_logic::sectors::Sector;

use crate::spatial::{Feature, PathKind, Shape, SpatialIndex};
use crate::world::TerrainSampler;

/// Configuration for path generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathParams {
    pub kind: PathKind,
    /// Vertices, including the start.
    pub max_length: usize,
    /// Chance per step of drifting one unit sideways.
    pub meander_chance: f64,
    /// How far the path may drift from its main axis.
    pub max_lateral_offset: i32,
    pub width: f64,
    /// End the path at the first vertex whose sector is water, counting
    /// regions, other paths and static rooms.
    pub stop_at_water: bool,
}

impl Default for PathParams {
    fn default() -> Self {
        Self {
            kind: PathKind::River,
            max_length: 512,
            meander_chance: 0.35,
            max_lateral_offset: 6,
            width: 1.0,
            stop_at_water: true,
        }
    }
}

/// Vertices of a path from `start` heading `direction`.
///
/// The walk advances one unit along the main axis per step and may shift one
/// unit along the perpendicular, toward the lower of the two sides when the
/// terrain slopes. It ends before leaving the plane, at `max_length`
/// vertices, or (with `stop_at_water`) on the first vertex `sector_at`
/// reports as water.
pub fn carve_path<T, S>(
    terrain: &T,
    sector_at: S,
    start: Coord,
    direction: Direction,
    rng: &mut impl Rng,
    params: &PathParams,
) -> Result<Vec<Coord>, SpatialError>
where
    T: TerrainSampler + ?Sized,
    S: Fn(Coord) -> Sector,
{
    check(start.x, start.y, 0)?;
    let (fx, fy) = direction
        .plane_offset()
        .ok_or(SpatialError::InvalidDirection(direction))?;
    let (lx, ly) = (-fy, fx);
    let chance = params.meander_chance.clamp(0.0, 1.0);
    let max_offset = params.max_lateral_offset.max(0);
    let ends_here = |at: Coord| params.stop_at_water && sector_at(at).is_water();

    let mut points = vec![start];
    if ends_here(start) {
        return Ok(points);
    }

    let mut axis = start;
    let mut lateral: i32 = 0;
    while points.len() < params.max_length {
        axis = axis.offset(fx, fy);
        if rng.gen_bool(chance) {
            let left = axis.offset(lx * (lateral + 1), ly * (lateral + 1));
            let right = axis.offset(lx * (lateral - 1), ly * (lateral - 1));
            let mut shift = match terrain.elevation(left).cmp(&terrain.elevation(right)) {
                Ordering::Less => 1,
                Ordering::Greater => -1,
                Ordering::Equal if rng.gen_bool(0.5) => 1,
                Ordering::Equal => -1,
            };
            if (lateral + shift).abs() > max_offset {
                shift = -shift;
            }
            if (lateral + shift).abs() > max_offset {
                shift = 0;
            }
            lateral += shift;
        }

        let next = axis.offset(lx * lateral, ly * lateral);
        if !next.is_valid() {
            break;
        }
        points.push(next);
        if ends_here(next) {
            break;
        }
    }
    Ok(points)
}

/// Carve a path and insert it into `index` under `feature_id`.
///
/// `sector_at` sees the index as it was before the new course goes in.
/// Everything is checked before the index is touched. An existing path with
/// the same id is replaced; an existing region with that id is a conflict.
#[allow(clippy::too_many_arguments)]
pub fn generate_path<T, S>(
    index: &mut SpatialIndex,
    terrain: &T,
    sector_at: S,
    start: Coord,
    direction: Direction,
    feature_id: FeatureId,
    name: &str,
    rng: &mut impl Rng,
    params: &PathParams,
) -> Result<Feature, SpatialError>
where
    T: TerrainSampler + ?Sized,
    S: Fn(&SpatialIndex, Coord) -> Sector,
{
    check(start.x, start.y, 0)?;
    if direction.plane_offset().is_none() {
        return Err(SpatialError::InvalidDirection(direction));
    }
    if index.get(feature_id).is_some_and(Feature::is_region) {
        return Err(SpatialError::Duplicate(Conflict::Feature(feature_id)));
    }

    let points = {
        let view: &SpatialIndex = index;
        carve_path(terrain, |at| sector_at(view, at), start, direction, rng, params)?
    };
    let feature = Feature::path(feature_id, name, params.kind, points, params.width);
    let replaced = index.insert(feature.clone())?;

    if let Shape::Path { points, .. } = &feature.shape {
        log::info!(
            "Carved {} '{}' ({}): {} points from ({}, {}) heading {}{}",
            path_label(params.kind),
            name,
            feature_id,
            points.len(),
            start.x,
            start.y,
            direction,
            if replaced.is_some() { ", replacing the old course" } else { "" }
        );
    }
    Ok(feature)
}

fn path_label(kind: PathKind) -> &'static str {
    match kind {
        PathKind::Road => "road",
        PathKind::DirtRoad => "dirt road",
        PathKind::River => "river",
    }
}
