//! Save/Load for the spatial engine
//!
//! Uses bincode for the binary format. Room bindings, features and vessels
//! are written as plain records; vessels are respawned into a fresh world
//! on load.

use hecs::{EntityBuilder, World};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};
use wildspace_logic::error::{Conflict, Missing, SpatialError, VesselId, Vnum};
use wildspace_logic::interior::MAX_VESSELS;

use crate::components::*;
use crate::spatial::{Feature, SpatialIndex};
use crate::systems::Autopilot;
use crate::wilderness::{RoomAllocator, WildRoom};

/// Version number for save file format (increment when format changes)
pub const SAVE_VERSION: u32 = 2;

/// Serializable snapshot of the engine
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    /// Terrain seed the world was built with
    pub seed: u64,
    /// Bound wilderness rooms, static and dynamic
    pub rooms: Vec<WildRoom>,
    /// Regions and paths, ascending by id
    pub features: Vec<Feature>,
    pub vessels: Vec<VesselRecord>,
}

/// One vessel entity with all of its components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselRecord {
    pub vessel: Vessel,
    pub position: VesselPosition,
    pub binding: WildernessBinding,
    pub docking: Option<Docking>,
    pub interior: Option<Interior>,
    pub autopilot: Option<Autopilot>,
}

fn serialize_vessels(world: &World) -> Vec<VesselRecord> {
    let mut records: Vec<VesselRecord> = world
        .query::<(
            &Vessel,
            &VesselPosition,
            Option<&WildernessBinding>,
            Option<&Docking>,
            Option<&Interior>,
            Option<&Autopilot>,
        )>()
        .iter()
        .map(
            |(_, (vessel, position, binding, docking, interior, autopilot))| VesselRecord {
                vessel: vessel.clone(),
                position: *position,
                binding: binding.copied().unwrap_or_default(),
                docking: docking.copied(),
                interior: interior.cloned(),
                autopilot: autopilot.cloned(),
            },
        )
        .collect();
    records.sort_by_key(|r| r.vessel.id);
    records
}

fn spawn_vessel(world: &mut World, record: VesselRecord) {
    let mut builder = EntityBuilder::new();
    builder
        .add(record.vessel)
        .add(record.position)
        .add(record.binding);
    if let Some(c) = record.docking {
        builder.add(c);
    }
    if let Some(c) = record.interior {
        builder.add(c);
    }
    if let Some(c) = record.autopilot {
        builder.add(c);
    }
    world.spawn(builder.build());
}

/// Save the engine state to a writer
pub fn save_world<W: Write>(
    writer: W,
    seed: u64,
    rooms: &RoomAllocator,
    index: &SpatialIndex,
    world: &World,
) -> Result<(), SaveError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        seed,
        rooms: rooms.snapshot(),
        features: index.iter().cloned().collect(),
        vessels: serialize_vessels(world),
    };

    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Load engine state from a reader
pub fn load_world<R: Read>(reader: R) -> Result<LoadedWorld, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    check_vessels(&save_data.vessels, &save_data.rooms)?;

    let mut world = World::new();
    for record in save_data.vessels {
        spawn_vessel(&mut world, record);
    }

    Ok(LoadedWorld {
        world,
        seed: save_data.seed,
        rooms: save_data.rooms,
        features: save_data.features,
    })
}

/// Cross-check vessel records against each other and against the saved
/// rooms before anything is spawned.
fn check_vessels(vessels: &[VesselRecord], rooms: &[WildRoom]) -> Result<(), SaveError> {
    let mut by_id: HashMap<VesselId, &VesselRecord> = HashMap::new();
    for record in vessels {
        let id = record.vessel.id;
        if id.0 >= MAX_VESSELS {
            return Err(SpatialError::OutOfRange {
                what: "vessel id",
                value: id.0 as i64,
                max: MAX_VESSELS as i64 - 1,
            }
            .into());
        }
        if by_id.insert(id, record).is_some() {
            return Err(SpatialError::Duplicate(Conflict::Vessel(id)).into());
        }
    }

    let rooms: HashMap<Vnum, &WildRoom> = rooms.iter().map(|r| (r.vnum, r)).collect();
    let mut aboard: HashMap<Vnum, u32> = HashMap::new();
    for record in vessels {
        let id = record.vessel.id;
        let inconsistent = |reason| SaveError::Inconsistent { vessel: id, reason };

        if let Some(vnum) = record.binding.room {
            let room = rooms
                .get(&vnum)
                .ok_or(SpatialError::NotFound(Missing::Room(vnum)))?;
            if room.coord != record.position.coord() {
                return Err(inconsistent("is bound to a room it is not over"));
            }
            *aboard.entry(vnum).or_default() += 1;
        }

        if let Some(docking) = record.docking {
            let partner = by_id
                .get(&docking.docked_to)
                .ok_or(SpatialError::NotFound(Missing::Vessel(docking.docked_to)))?;
            if docking.docked_to == id || partner.docking.map(|d| d.docked_to) != Some(id) {
                return Err(inconsistent("has a one-sided docking"));
            }
        }

        if record.interior.as_ref().is_some_and(|i| i.vessel_id != id) {
            return Err(inconsistent("carries another vessel's interior"));
        }

        let lost = |pilot: &Autopilot| pilot.route.validate().is_err() || pilot.current().is_none();
        if record.autopilot.as_ref().is_some_and(lost) {
            return Err(inconsistent("is steering for a waypoint its route does not have"));
        }
    }

    for record in vessels {
        let Some(vnum) = record.binding.room else {
            continue;
        };
        let count = aboard.get(&vnum).copied().unwrap_or(0);
        if rooms.get(&vnum).is_some_and(|r| r.occupants < count) {
            return Err(SaveError::Inconsistent {
                vessel: record.vessel.id,
                reason: "sits in a room that does not count it as an occupant",
            });
        }
    }
    Ok(())
}

/// Result of loading a save
pub struct LoadedWorld {
    pub world: World,
    pub seed: u64,
    pub rooms: Vec<WildRoom>,
    pub features: Vec<Feature>,
}

/// Errors that can occur during save/load
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    VersionMismatch { expected: u32, found: u32 },
    /// The save decoded but its rooms, features or vessels are inconsistent.
    Restore(SpatialError),
    /// A vessel record disagrees with the rest of the save.
    Inconsistent {
        vessel: VesselId,
        reason: &'static str,
    },
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SaveError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SaveError::Bincode(e)
    }
}

impl From<SpatialError> for SaveError {
    fn from(e: SpatialError) -> Self {
        SaveError::Restore(e)
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "IO error: {}", e),
            SaveError::Bincode(e) => write!(f, "Serialization error: {}", e),
            SaveError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Save version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            SaveError::Restore(e) => write!(f, "Corrupt save: {}", e),
            SaveError::Inconsistent { vessel, reason } => {
                write!(f, "Corrupt save: {} {}", vessel, reason)
            }
        }
    }
}

impl std::error::Error for SaveError {}
