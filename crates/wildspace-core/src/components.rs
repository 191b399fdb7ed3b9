//! Component definitions for vessel entities.
//!
//! Components are plain data attached to entities in the `hecs` world.
//! Behaviour lives in `systems` and on the engine.

use serde::{Deserialize, Serialize};
use wildspace_logic::coords::{Coord, Direction};
use wildspace_logic::error::{VesselId, Vnum};
use wildspace_logic::vessels::VesselClass;

pub use wildspace_logic::interior::Interior;

/// Identity of a vessel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vessel {
    pub id: VesselId,
    pub name: String,
    pub class: VesselClass,
    pub hull_weight: i32,
}

/// Where a vessel is on the plane and how it last moved.
///
/// Position is continuous; the room a vessel occupies is the grid square
/// it rounds to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VesselPosition {
    pub x: f32,
    pub y: f32,
    /// Altitude; negative is submerged.
    pub z: f32,
    pub heading: Direction,
    /// Percent speed of the last move over its terrain.
    pub speed: i32,
}

impl VesselPosition {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            heading: Direction::North,
            speed: 0,
        }
    }

    /// Centre of grid square (x, y) at altitude z.
    pub fn at_grid(x: i32, y: i32, z: i32) -> Self {
        Self::new(x as f32, y as f32, z as f32)
    }

    /// Grid square under the vessel.
    pub fn coord(&self) -> Coord {
        Coord::new(self.x.round() as i32, self.y.round() as i32)
    }

    pub fn altitude(&self) -> i32 {
        self.z.round() as i32
    }
}

/// The wilderness room a vessel currently occupies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WildernessBinding {
    pub room: Option<Vnum>,
}

/// Present while a vessel is docked alongside another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Docking {
    pub docked_to: VesselId,
}
