//! Vessel classes and their terrain model.
//!
//! Everything class-specific lives in one declarative table per concern:
//! `CAPABILITIES` for traversal flags and speed, `ROOM_COUNTS` for interior
//! sizing. Lookups are plain indexing; there is no per-class branching
//! outside the airship altitude rule.

use crate::sectors::{Sector, NUM_SECTORS};
use serde::{Deserialize, Serialize};

/// Number of slots in a speed table. Slots past the last sector are unused.
pub const SPEED_TABLE_SLOTS: usize = 40;

/// Altitude above which an airship is considered airborne and ignores
/// surface terrain.
pub const AIRBORNE_ALTITUDE: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum VesselClass {
    Raft = 0,
    Boat = 1,
    Ship = 2,
    Warship = 3,
    Airship = 4,
    Submarine = 5,
    Transport = 6,
    Magical = 7,
}

impl VesselClass {
    pub const ALL: [VesselClass; 8] = [
        VesselClass::Raft,
        VesselClass::Boat,
        VesselClass::Ship,
        VesselClass::Warship,
        VesselClass::Airship,
        VesselClass::Submarine,
        VesselClass::Transport,
        VesselClass::Magical,
    ];

    pub fn from_id(id: u8) -> Option<VesselClass> {
        Self::ALL.get(id as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            VesselClass::Raft => "Raft",
            VesselClass::Boat => "Boat",
            VesselClass::Ship => "Ship",
            VesselClass::Warship => "Warship",
            VesselClass::Airship => "Airship",
            VesselClass::Submarine => "Submarine",
            VesselClass::Transport => "Transport",
            VesselClass::Magical => "Magical Vessel",
        }
    }

    pub fn capabilities(self) -> &'static TerrainCaps {
        &CAPABILITIES[self as usize]
    }
}

impl std::fmt::Display for VesselClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Side of a vessel a contact lies on, relative to its heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FiringArc {
    Fore,
    Starboard,
    Rear,
    Port,
}

impl FiringArc {
    /// Arc of compass `bearing` seen from a vessel heading `heading`.
    /// Arc edges read fore.
    pub fn of(heading: i32, bearing: i32) -> FiringArc {
        match (bearing - heading).rem_euclid(360) {
            41..=139 => FiringArc::Starboard,
            141..=219 => FiringArc::Rear,
            221..=319 => FiringArc::Port,
            _ => FiringArc::Fore,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            FiringArc::Fore => 'F',
            FiringArc::Starboard => 'S',
            FiringArc::Rear => 'R',
            FiringArc::Port => 'P',
        }
    }
}

/// Per-class traversal capabilities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainCaps {
    pub ocean: bool,
    pub shallow: bool,
    pub air: bool,
    pub underwater: bool,
    pub min_water_depth: i32,
    pub max_altitude: i32,
    /// Percent of base speed, indexed by sector id. 0 is impassable.
    pub speed: [u8; SPEED_TABLE_SLOTS],
}

/// Build a speed table from (sector, percent) pairs; every other slot is 0.
const fn speeds(entries: &[(Sector, u8)]) -> [u8; SPEED_TABLE_SLOTS] {
    let mut table = [0u8; SPEED_TABLE_SLOTS];
    let mut i = 0;
    while i < entries.len() {
        table[entries[i].0 as usize] = entries[i].1;
        i += 1;
    }
    table
}

use Sector::*;

const CAPABILITIES: [TerrainCaps; 8] = [
    // Raft: rivers and shallows
    TerrainCaps {
        ocean: false,
        shallow: true,
        air: false,
        underwater: false,
        min_water_depth: 0,
        max_altitude: 0,
        speed: speeds(&[
            (WaterSwim, 100),
            (Marshland, 75),
            (UnderdarkWater, 80),
            (Beach, 50),
            (Seaport, 60),
            (River, 100),
        ]),
    },
    // Boat: coastal waters
    TerrainCaps {
        ocean: false,
        shallow: true,
        air: false,
        underwater: false,
        min_water_depth: 0,
        max_altitude: 0,
        speed: speeds(&[
            (WaterSwim, 100),
            (WaterNoSwim, 75),
            (Marshland, 80),
            (UnderdarkWater, 90),
            (UnderdarkNoSwim, 60),
            (Beach, 60),
            (Seaport, 70),
            (River, 100),
        ]),
    },
    // Ship
    TerrainCaps {
        ocean: true,
        shallow: true,
        air: false,
        underwater: false,
        min_water_depth: 2,
        max_altitude: 0,
        speed: speeds(&[
            (WaterSwim, 75),
            (WaterNoSwim, 100),
            (Ocean, 100),
            (UnderdarkNoSwim, 80),
            (Seaport, 50),
            (River, 50),
        ]),
    },
    // Warship
    TerrainCaps {
        ocean: true,
        shallow: true,
        air: false,
        underwater: false,
        min_water_depth: 2,
        max_altitude: 0,
        speed: speeds(&[
            (WaterSwim, 75),
            (WaterNoSwim, 100),
            (Ocean, 100),
            (UnderdarkNoSwim, 80),
            (Seaport, 50),
            (River, 50),
        ]),
    },
    // Airship: grounded it clears everything but caves, rooms and the underdark
    TerrainCaps {
        ocean: true,
        shallow: true,
        air: true,
        underwater: false,
        min_water_depth: 0,
        max_altitude: 500,
        speed: speeds(&[
            (City, 80),
            (Field, 100),
            (Forest, 100),
            (Hills, 100),
            (Mountain, 100),
            (WaterSwim, 100),
            (WaterNoSwim, 100),
            (Flying, 100),
            (RoadNs, 100),
            (RoadEw, 100),
            (RoadIntersection, 100),
            (Desert, 100),
            (Ocean, 100),
            (Marshland, 100),
            (HighMountain, 100),
            (Planes, 100),
            (Lava, 80),
            (DirtRoadNs, 100),
            (DirtRoadEw, 100),
            (DirtRoadIntersection, 100),
            (Jungle, 100),
            (Tundra, 100),
            (Taiga, 100),
            (Beach, 100),
            (Seaport, 100),
            (River, 100),
        ]),
    },
    // Submarine
    TerrainCaps {
        ocean: true,
        shallow: true,
        air: false,
        underwater: true,
        min_water_depth: 0,
        max_altitude: 0,
        speed: speeds(&[
            (WaterNoSwim, 100),
            (Underwater, 100),
            (Ocean, 100),
            (UnderdarkWater, 100),
            (UnderdarkNoSwim, 100),
            (Seaport, 50),
        ]),
    },
    // Transport: slow cargo hauler
    TerrainCaps {
        ocean: true,
        shallow: true,
        air: false,
        underwater: false,
        min_water_depth: 2,
        max_altitude: 0,
        speed: speeds(&[
            (WaterSwim, 60),
            (WaterNoSwim, 100),
            (Ocean, 100),
            (UnderdarkNoSwim, 70),
            (Seaport, 40),
            (River, 40),
        ]),
    },
    // Magical: everywhere except lava, at reduced speed on land
    TerrainCaps {
        ocean: true,
        shallow: true,
        air: true,
        underwater: true,
        min_water_depth: 0,
        max_altitude: 300,
        speed: speeds(&[
            (Inside, 50),
            (City, 50),
            (Field, 75),
            (Forest, 75),
            (Hills, 75),
            (Mountain, 75),
            (WaterSwim, 100),
            (WaterNoSwim, 100),
            (Flying, 100),
            (Underwater, 100),
            (ZoneStart, 50),
            (RoadNs, 75),
            (RoadEw, 75),
            (RoadIntersection, 75),
            (Desert, 100),
            (Ocean, 100),
            (Marshland, 100),
            (HighMountain, 100),
            (Planes, 100),
            (UnderdarkWild, 50),
            (UnderdarkCity, 50),
            (UnderdarkInside, 50),
            (UnderdarkWater, 100),
            (UnderdarkNoSwim, 100),
            (UnderdarkNoGround, 50),
            (DirtRoadNs, 75),
            (DirtRoadEw, 75),
            (DirtRoadIntersection, 75),
            (Cave, 50),
            (Jungle, 75),
            (Tundra, 75),
            (Taiga, 75),
            (Beach, 80),
            (Seaport, 80),
            (InsideRoom, 50),
            (River, 100),
        ]),
    },
];

/// (base rooms, max rooms) per class, in `VesselClass` order.
const ROOM_COUNTS: [(usize, usize); 8] = [
    (1, 2),  // Raft
    (2, 4),  // Boat
    (3, 8),  // Ship
    (5, 15), // Warship
    (4, 10), // Airship
    (4, 12), // Submarine
    (6, 20), // Transport
    (3, 10), // Magical
];

/// Whether `class` may occupy `sector` at altitude `z`.
///
/// Airborne airships only need to stay under their ceiling and out of
/// enclosed sectors. Everything else is decided by the speed table.
pub fn can_traverse(class: VesselClass, sector: Sector, z: i32) -> bool {
    let caps = class.capabilities();
    if class == VesselClass::Airship && z > AIRBORNE_ALTITUDE {
        return z <= caps.max_altitude && sector != Sector::Inside;
    }
    caps.speed[sector as usize] != 0
}

/// Relative speed of `class` in `sector`; 1.0 is full speed, 0.0 impassable.
pub fn speed_modifier(class: VesselClass, sector: Sector) -> f32 {
    class.capabilities().speed[sector as usize] as f32 / 100.0
}

/// `speed_modifier` with weather penalties applied, as a percentage clamped
/// to 0..=150. `weather` is a severity step count (0 is calm).
pub fn speed_modifier_with_weather(class: VesselClass, sector: Sector, weather: i32) -> i32 {
    let mut pct = class.capabilities().speed[sector as usize] as i32;
    if weather > 0 {
        if class == VesselClass::Airship {
            pct -= weather * 10;
        }
        if !(class == VesselClass::Submarine && sector == Sector::Underwater) {
            pct -= weather * 5;
        }
    }
    pct.clamp(0, 150)
}

/// Whether `class` may sit at altitude `z` at all, independent of terrain.
pub fn altitude_allowed(class: VesselClass, z: i32) -> Result<(), crate::error::MoveRejection> {
    use crate::error::MoveRejection;
    let caps = class.capabilities();
    if z > 0 && (!caps.air || z > caps.max_altitude) {
        return Err(MoveRejection::Altitude {
            z,
            max: if caps.air { caps.max_altitude } else { 0 },
        });
    }
    if z < 0 && !caps.underwater {
        return Err(MoveRejection::Depth { z });
    }
    Ok(())
}

/// Class for a hull weight. Airships, submarines and magical vessels are
/// never derived; they are set explicitly.
pub fn derive_class(hull_weight: i32) -> VesselClass {
    match hull_weight {
        w if w < 50 => VesselClass::Raft,
        w if w < 150 => VesselClass::Boat,
        w if w < 400 => VesselClass::Ship,
        w if w < 800 => VesselClass::Warship,
        _ => VesselClass::Transport,
    }
}

/// (base, max) interior rooms for a class.
pub fn rooms_for_class(class: VesselClass) -> (usize, usize) {
    ROOM_COUNTS[class as usize]
}

pub fn base_rooms_for_class(class: VesselClass) -> usize {
    rooms_for_class(class).0
}

pub fn max_rooms_for_class(class: VesselClass) -> usize {
    rooms_for_class(class).1
}

const _: () = assert!(NUM_SECTORS <= SPEED_TABLE_SLOTS);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_rooms_at_least_base() {
        for class in VesselClass::ALL {
            let (base, max) = rooms_for_class(class);
            assert!(max >= base, "{} max {} < base {}", class, max, base);
            assert!(base >= 1);
            assert!(max <= crate::interior::MAX_ROOMS_PER_VESSEL);
        }
    }

    #[test]
    fn test_derive_class_boundaries() {
        let cases = [
            (0, VesselClass::Raft),
            (49, VesselClass::Raft),
            (50, VesselClass::Boat),
            (149, VesselClass::Boat),
            (150, VesselClass::Ship),
            (399, VesselClass::Ship),
            (400, VesselClass::Warship),
            (799, VesselClass::Warship),
            (800, VesselClass::Transport),
            (10000, VesselClass::Transport),
        ];
        for (weight, expected) in cases {
            assert_eq!(derive_class(weight), expected, "hull weight {}", weight);
        }
    }

    #[test]
    fn test_derive_class_monotonic() {
        let mut prev = derive_class(0) as u8;
        for w in 0..2000 {
            let c = derive_class(w) as u8;
            assert!(c >= prev, "class dropped at weight {}", w);
            prev = c;
        }
    }

    #[test]
    fn test_raft_restrictions() {
        assert!(can_traverse(VesselClass::Raft, Sector::WaterSwim, 0));
        assert!(can_traverse(VesselClass::Raft, Sector::River, 0));
        assert!(!can_traverse(VesselClass::Raft, Sector::Ocean, 0));
        assert!(!can_traverse(VesselClass::Raft, Sector::Field, 0));
        assert!(!can_traverse(VesselClass::Raft, Sector::WaterNoSwim, 0));
    }

    #[test]
    fn test_ship_needs_water() {
        assert!(can_traverse(VesselClass::Ship, Sector::Ocean, 0));
        assert!(can_traverse(VesselClass::Warship, Sector::WaterNoSwim, 0));
        assert!(!can_traverse(VesselClass::Ship, Sector::Forest, 0));
        assert!(!can_traverse(VesselClass::Transport, Sector::Beach, 0));
    }

    #[test]
    fn test_airship_altitude_rule() {
        // On the ground an airship follows its table.
        assert!(!can_traverse(VesselClass::Airship, Sector::Cave, 0));
        // Airborne it flies over caves but never indoors or above its ceiling.
        assert!(can_traverse(VesselClass::Airship, Sector::Cave, 200));
        assert!(!can_traverse(VesselClass::Airship, Sector::Inside, 200));
        assert!(!can_traverse(VesselClass::Airship, Sector::Field, 501));
        assert!(can_traverse(VesselClass::Airship, Sector::Field, 500));
    }

    #[test]
    fn test_submarine_underwater() {
        assert!(can_traverse(VesselClass::Submarine, Sector::Underwater, -50));
        assert!(!can_traverse(VesselClass::Submarine, Sector::WaterSwim, 0));
        assert!(!can_traverse(VesselClass::Submarine, Sector::Field, 0));
    }

    #[test]
    fn test_speed_zero_iff_impassable() {
        for class in VesselClass::ALL {
            for &sector in Sector::all() {
                let passable = can_traverse(class, sector, 0);
                let speed = speed_modifier(class, sector);
                assert_eq!(passable, speed > 0.0, "{} on {:?}", class, sector);
            }
        }
    }

    #[test]
    fn test_speed_values() {
        assert!((speed_modifier(VesselClass::Ship, Sector::River) - 0.5).abs() < f32::EPSILON);
        assert!((speed_modifier(VesselClass::Raft, Sector::Beach) - 0.5).abs() < f32::EPSILON);
        assert!((speed_modifier(VesselClass::Transport, Sector::WaterSwim) - 0.6).abs() < 1e-6);
        assert_eq!(speed_modifier(VesselClass::Magical, Sector::Lava), 0.0);
    }

    #[test]
    fn test_weather_penalties() {
        assert_eq!(speed_modifier_with_weather(VesselClass::Ship, Sector::Ocean, 0), 100);
        assert_eq!(speed_modifier_with_weather(VesselClass::Ship, Sector::Ocean, 2), 90);
        // Airships take both penalties.
        assert_eq!(speed_modifier_with_weather(VesselClass::Airship, Sector::Field, 2), 70);
        // Deep submarines ignore surface weather.
        assert_eq!(
            speed_modifier_with_weather(VesselClass::Submarine, Sector::Underwater, 5),
            100
        );
        assert_eq!(speed_modifier_with_weather(VesselClass::Raft, Sector::River, 30), 0);
    }

    #[test]
    fn test_altitude_allowed() {
        assert!(altitude_allowed(VesselClass::Ship, 0).is_ok());
        assert!(altitude_allowed(VesselClass::Ship, 10).is_err());
        assert!(altitude_allowed(VesselClass::Ship, -10).is_err());
        assert!(altitude_allowed(VesselClass::Submarine, -200).is_ok());
        assert!(altitude_allowed(VesselClass::Magical, 300).is_ok());
        assert!(altitude_allowed(VesselClass::Magical, 301).is_err());
    }

    #[test]
    fn test_class_names() {
        assert_eq!(VesselClass::Magical.name(), "Magical Vessel");
        assert_eq!(VesselClass::from_id(3), Some(VesselClass::Warship));
        assert_eq!(VesselClass::from_id(8), None);
    }

    #[test]
    fn test_firing_arcs() {
        // Heading north: east is to starboard
        assert_eq!(FiringArc::of(0, 90), FiringArc::Starboard);
        assert_eq!(FiringArc::of(0, 270), FiringArc::Port);
        assert_eq!(FiringArc::of(0, 180), FiringArc::Rear);
        assert_eq!(FiringArc::of(0, 350), FiringArc::Fore);
        assert_eq!(FiringArc::of(270, 10), FiringArc::Starboard);
        assert_eq!(FiringArc::of(90, 0), FiringArc::Port);
        // Edges
        assert_eq!(FiringArc::of(0, 40), FiringArc::Fore);
        assert_eq!(FiringArc::of(0, 140), FiringArc::Fore);
        assert_eq!(FiringArc::of(0, 141), FiringArc::Rear);
    }
}
