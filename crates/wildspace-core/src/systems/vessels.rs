//! Vessel systems - lookups, contacts, docking and the interior-to-plane frame.

use hecs::{Entity, World};
use wildspace_logic::coords::{bearing_between, chebyshev, range_between, Direction};
use wildspace_logic::error::{Missing, MoveRejection, SpatialError, VesselId, Vnum};
use wildspace_logic::interior::vessel_for_vnum;
use wildspace_logic::vessels::FiringArc;

use crate::components::{Docking, Interior, Vessel, VesselPosition};

/// Entity carrying vessel `id`.
pub fn find_vessel(world: &World, id: VesselId) -> Option<Entity> {
    world
        .query::<&Vessel>()
        .iter()
        .find(|(_, v)| v.id == id)
        .map(|(entity, _)| entity)
}

pub fn require_vessel(world: &World, id: VesselId) -> Result<Entity, SpatialError> {
    find_vessel(world, id).ok_or(SpatialError::NotFound(Missing::Vessel(id)))
}

/// Every vessel id in the world, ascending.
pub fn vessel_ids(world: &World) -> Vec<VesselId> {
    let mut ids: Vec<VesselId> = world.query::<&Vessel>().iter().map(|(_, v)| v.id).collect();
    ids.sort();
    ids
}

/// Lowest id below `max_vessels` that no vessel holds.
pub fn next_free_vessel_id(world: &World, max_vessels: u32) -> Option<VesselId> {
    let taken = vessel_ids(world);
    (0..max_vessels)
        .map(VesselId)
        .find(|id| taken.binary_search(id).is_err())
}

pub fn position_of(world: &World, id: VesselId) -> Result<VesselPosition, SpatialError> {
    let entity = require_vessel(world, id)?;
    world
        .get::<&VesselPosition>(entity)
        .map(|p| *p)
        .map_err(|_| SpatialError::NotFound(Missing::Vessel(id)))
}

pub fn docked_to(world: &World, id: VesselId) -> Option<VesselId> {
    let entity = find_vessel(world, id)?;
    world.get::<&Docking>(entity).ok().map(|d| d.docked_to)
}

/// Vessels within `radius` squares of (x, y), ascending by id.
pub fn vessels_near(world: &World, x: i32, y: i32, radius: i32) -> Vec<VesselId> {
    let at = wildspace_logic::coords::Coord::new(x, y);
    let mut ids: Vec<VesselId> = world
        .query::<(&Vessel, &VesselPosition)>()
        .iter()
        .filter(|(_, (_, pos))| chebyshev(pos.coord(), at) <= radius)
        .map(|(_, (v, _))| v.id)
        .collect();
    ids.sort();
    ids
}

/// How far a vessel's lookouts can see, in plane units.
pub const CONTACT_RANGE: f32 = 35.0;

/// Another vessel as seen from an observer.
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub id: VesselId,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    /// Compass bearing from the observer, in degrees.
    pub bearing: i32,
    pub range: f32,
    pub arc: FiringArc,
    pub heading: Direction,
    pub speed: i32,
}

/// Vessels within `max_range` of `observer`, nearest first. A vertical
/// heading has no bow, so arcs are then taken from north.
pub fn contacts(
    world: &World,
    observer: VesselId,
    max_range: f32,
) -> Result<Vec<Contact>, SpatialError> {
    let from = position_of(world, observer)?;
    let heading = from.heading.degrees().unwrap_or(0);
    let mut found: Vec<Contact> = world
        .query::<(&Vessel, &VesselPosition)>()
        .iter()
        .filter(|(_, (v, _))| v.id != observer)
        .filter_map(|(_, (v, pos))| {
            let range = range_between((from.x, from.y, from.z), (pos.x, pos.y, pos.z));
            if range > max_range {
                return None;
            }
            let bearing = bearing_between((from.x, from.y), (pos.x, pos.y));
            let at = pos.coord();
            Some(Contact {
                id: v.id,
                name: v.name.clone(),
                x: at.x,
                y: at.y,
                z: pos.altitude(),
                bearing,
                range,
                arc: FiringArc::of(heading, bearing),
                heading: pos.heading,
                speed: pos.speed,
            })
        })
        .collect();
    found.sort_by(|a, b| a.range.total_cmp(&b.range).then(a.id.cmp(&b.id)));
    Ok(found)
}

/// Lash two vessels together. They must be within one square of each other
/// at the same altitude, and neither may already be docked.
pub fn dock(world: &mut World, a: VesselId, b: VesselId) -> Result<(), SpatialError> {
    let ea = require_vessel(world, a)?;
    let eb = require_vessel(world, b)?;
    if a == b || docked_to(world, a).is_some() || docked_to(world, b).is_some() {
        return Err(MoveRejection::Docked.into());
    }

    let pa = position_of(world, a)?;
    let pb = position_of(world, b)?;
    let distance = chebyshev(pa.coord(), pb.coord()).max((pa.altitude() - pb.altitude()).abs());
    if distance > 1 {
        return Err(MoveRejection::OutOfReach { distance }.into());
    }

    world
        .insert_one(ea, Docking { docked_to: b })
        .map_err(|_| SpatialError::NotFound(Missing::Vessel(a)))?;
    world
        .insert_one(eb, Docking { docked_to: a })
        .map_err(|_| SpatialError::NotFound(Missing::Vessel(b)))?;
    log::info!("{} docked with {}", a, b);
    Ok(())
}

/// Cast off. Both sides of the docking are cleared. Returns the vessel that
/// was alongside, if any.
pub fn undock(world: &mut World, id: VesselId) -> Result<Option<VesselId>, SpatialError> {
    let entity = require_vessel(world, id)?;
    let Some(other) = docked_to(world, id) else {
        return Ok(None);
    };
    world
        .remove_one::<Docking>(entity)
        .map_err(|_| SpatialError::NotFound(Missing::Vessel(id)))?;
    let mirrored = find_vessel(world, other)
        .map(|e| world.remove_one::<Docking>(e).is_ok())
        .unwrap_or(false);
    if !mirrored {
        log::error!("{} was docked to {} without a matching docking", id, other);
    }
    log::info!("{} cast off from {}", id, other);
    Ok(Some(other))
}

/// Vessel whose interior holds `vnum`.
pub fn interior_owner(world: &World, vnum: Vnum) -> Result<(VesselId, Entity), SpatialError> {
    let missing = SpatialError::NotFound(Missing::Room(vnum));
    let id = vessel_for_vnum(vnum).ok_or(missing.clone())?;
    let entity = find_vessel(world, id).ok_or(missing.clone())?;
    let aboard = world
        .get::<&Interior>(entity)
        .map(|interior| interior.contains(vnum))
        .unwrap_or(false);
    if aboard {
        Ok((id, entity))
    } else {
        Err(missing)
    }
}

/// Plane coordinates of an interior room: wherever its vessel is.
pub fn interior_room_coordinates(world: &World, vnum: Vnum) -> Result<(i32, i32, i32), SpatialError> {
    let (id, _) = interior_owner(world, vnum)?;
    let pos = position_of(world, id)?;
    let at = pos.coord();
    Ok((at.x, at.y, pos.altitude()))
}
