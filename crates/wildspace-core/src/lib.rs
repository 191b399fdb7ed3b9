//! Wildspace Core - Wilderness Spatial Engine
//!
//! Maps a large continuous coordinate plane onto a small pool of discrete
//! rooms, indexes the regions and paths laid over that plane, carves rivers
//! into it, and moves vessels across it while keeping their interiors
//! addressable as ordinary rooms.
//!
//! # Architecture
//!
//! - **World building**: a seeded heightmap gives every coordinate a base
//!   sector; regions and paths in the [`spatial`] index override it.
//! - **Rooms**: the [`wilderness`] allocator binds rooms to coordinates on
//!   demand and reclaims them when nothing references them.
//! - **Vessels**: entities in a `hecs` world carrying position, docking and
//!   interior components. [`systems`] functions move and dock them.
//!
//! # Example
//!
//! ```rust,no_run
//! use wildspace_core::prelude::*;
//!
//! let engine = SpatialEngine::new(EngineConfig::default()).unwrap();
//! let room = engine.allocate_or_get_room(10, -20).unwrap();
//! assert_eq!(engine.room_coordinate(room).unwrap(), Coord::new(10, -20));
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod generation;
pub mod persistence;
pub mod spatial;
pub mod systems;
pub mod wilderness;
pub mod world;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::EngineConfig;
    pub use crate::engine::{MoveOutcome, SpatialEngine, VesselSpec};
    pub use crate::spatial::{Feature, FeatureKind, PathKind, RegionKind, Shape, SpatialIndex};
    pub use crate::systems::{Autopilot, AutopilotState, Contact, Route, Waypoint};
    pub use crate::wilderness::{RoomAllocator, RoomId, RoomProfile};
    pub use wildspace_logic::coords::{Coord, Direction};
    pub use wildspace_logic::error::{FeatureId, SpatialError, VesselId, Vnum};
    pub use wildspace_logic::sectors::Sector;
    pub use wildspace_logic::vessels::VesselClass;
}
