//! Error taxonomy for the spatial engine.
//!
//! Coordinates are never clamped into range: every failure is handed back to
//! the immediate caller, which decides what (if anything) to tell a player.

use crate::coords::{Coord, Direction};
use crate::sectors::Sector;

/// Integer handle of a geographic feature (region or path).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct FeatureId(pub u32);

/// Integer handle of a vessel. Also the block index of its interior.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct VesselId(pub u32);

/// A room vnum: a wilderness room, a static room, or a vessel interior room.
pub type Vnum = i32;

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "feature #{}", self.0)
    }
}

impl std::fmt::Display for VesselId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "vessel #{}", self.0)
    }
}

/// Why a vessel move was refused. The vessel is left where it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    /// The class cannot enter this sector at this altitude.
    Terrain { sector: Sector },
    /// Above ground without air capability, or above the class ceiling.
    Altitude { z: i32, max: i32 },
    /// Below the surface without underwater capability.
    Depth { z: i32 },
    /// Docked vessels must undock first.
    Docked,
    /// An interior passage is locked.
    Locked { room: Vnum, direction: Direction },
    /// Docking needs the other vessel within one square at the same altitude.
    OutOfReach { distance: i32 },
}

/// What a `Duplicate` error collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    Feature(FeatureId),
    Room(Vnum),
    Coordinate(Coord),
    Exit { room: Vnum, direction: Direction },
    Vessel(VesselId),
    /// A configured vnum range runs into a reserved namespace.
    VnumRange { start: Vnum, end: Vnum },
}

/// What a `NotFound` error was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Room(Vnum),
    Coordinate(Coord),
    Feature(FeatureId),
    Vessel(VesselId),
    Exit { room: Vnum, direction: Direction },
    Interior(VesselId),
    /// A route position with no waypoint.
    Waypoint(usize),
}

/// Errors returned by the spatial engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SpatialError {
    /// A coordinate or altitude outside the plane's closed range.
    OutOfBounds { x: i32, y: i32, z: i32 },
    /// Vessel/room addressing outside the reserved namespace or a table limit.
    OutOfRange {
        what: &'static str,
        value: i64,
        max: i64,
    },
    Duplicate(Conflict),
    Rejected(MoveRejection),
    NotFound(Missing),
    /// Every dynamic wilderness room is bound.
    PoolExhausted { capacity: usize },
    /// Plane walks need a horizontal direction.
    InvalidDirection(Direction),
    /// A feature shape that cannot be indexed.
    InvalidShape(&'static str),
}

impl From<MoveRejection> for SpatialError {
    fn from(r: MoveRejection) -> Self {
        SpatialError::Rejected(r)
    }
}

impl std::fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveRejection::Terrain { sector } => write!(f, "cannot traverse {}", sector.name()),
            MoveRejection::Altitude { z, max } => {
                write!(f, "altitude {} exceeds ceiling {}", z, max)
            }
            MoveRejection::Depth { z } => write!(f, "cannot submerge to {}", z),
            MoveRejection::Docked => write!(f, "vessel is docked"),
            MoveRejection::Locked { room, direction } => {
                write!(f, "the {} passage from {} is locked", direction, room)
            }
            MoveRejection::OutOfReach { distance } => {
                write!(f, "the other vessel is {} squares away", distance)
            }
        }
    }
}

impl std::fmt::Display for SpatialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpatialError::OutOfBounds { x, y, z } => {
                write!(f, "Coordinate ({}, {}, {}) is out of bounds", x, y, z)
            }
            SpatialError::OutOfRange { what, value, max } => {
                write!(f, "{} {} is outside 0..={}", what, value, max)
            }
            SpatialError::Duplicate(Conflict::Feature(id)) => write!(f, "{} already exists", id),
            SpatialError::Duplicate(Conflict::Room(v)) => write!(f, "Room {} is already registered", v),
            SpatialError::Duplicate(Conflict::Coordinate(c)) => {
                write!(f, "({}, {}) already has a room", c.x, c.y)
            }
            SpatialError::Duplicate(Conflict::Exit { room, direction }) => {
                write!(f, "Room {} already has a {} exit", room, direction)
            }
            SpatialError::Duplicate(Conflict::Vessel(id)) => write!(f, "{} already exists", id),
            SpatialError::Duplicate(Conflict::VnumRange { start, end }) => {
                write!(f, "Vnums {}..={} overlap a reserved room range", start, end)
            }
            SpatialError::Rejected(reason) => write!(f, "Move rejected: {}", reason),
            SpatialError::NotFound(missing) => match missing {
                Missing::Room(v) => write!(f, "Room {} not found", v),
                Missing::Coordinate(c) => write!(f, "No free coordinate near ({}, {})", c.x, c.y),
                Missing::Feature(id) => write!(f, "{} not found", id),
                Missing::Vessel(id) => write!(f, "{} not found", id),
                Missing::Exit { room, direction } => {
                    write!(f, "Room {} has no {} exit", room, direction)
                }
                Missing::Interior(id) => write!(f, "{} has no interior", id),
                Missing::Waypoint(i) => write!(f, "Route has no waypoint {}", i),
            },
            SpatialError::PoolExhausted { capacity } => {
                write!(f, "All {} wilderness rooms are in use", capacity)
            }
            SpatialError::InvalidDirection(d) => write!(f, "Direction {} is not on the plane", d),
            SpatialError::InvalidShape(reason) => write!(f, "Invalid shape: {}", reason),
        }
    }
}

impl std::error::Error for SpatialError {}
