//! Sector (terrain) types and classification.
//!
//! Sector ids are stable `u8`s shared with the room table and the vessel
//! speed tables. `classify` turns the three procedural fields of the plane
//! (elevation, temperature, moisture) into a base sector before any region
//! or path overrides are applied.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Sector {
    Inside = 0,
    City = 1,
    Field = 2,
    Forest = 3,
    Hills = 4,
    Mountain = 5,
    WaterSwim = 6,
    WaterNoSwim = 7,
    Flying = 8,
    Underwater = 9,
    ZoneStart = 10,
    RoadNs = 11,
    RoadEw = 12,
    RoadIntersection = 13,
    Desert = 14,
    Ocean = 15,
    Marshland = 16,
    HighMountain = 17,
    Planes = 18,
    UnderdarkWild = 19,
    UnderdarkCity = 20,
    UnderdarkInside = 21,
    UnderdarkWater = 22,
    UnderdarkNoSwim = 23,
    UnderdarkNoGround = 24,
    Lava = 25,
    DirtRoadNs = 26,
    DirtRoadEw = 27,
    DirtRoadIntersection = 28,
    Cave = 29,
    Jungle = 30,
    Tundra = 31,
    Taiga = 32,
    Beach = 33,
    Seaport = 34,
    InsideRoom = 35,
    River = 36,
}

/// Number of defined sectors.
pub const NUM_SECTORS: usize = 37;

const ALL_SECTORS: [Sector; NUM_SECTORS] = [
    Sector::Inside,
    Sector::City,
    Sector::Field,
    Sector::Forest,
    Sector::Hills,
    Sector::Mountain,
    Sector::WaterSwim,
    Sector::WaterNoSwim,
    Sector::Flying,
    Sector::Underwater,
    Sector::ZoneStart,
    Sector::RoadNs,
    Sector::RoadEw,
    Sector::RoadIntersection,
    Sector::Desert,
    Sector::Ocean,
    Sector::Marshland,
    Sector::HighMountain,
    Sector::Planes,
    Sector::UnderdarkWild,
    Sector::UnderdarkCity,
    Sector::UnderdarkInside,
    Sector::UnderdarkWater,
    Sector::UnderdarkNoSwim,
    Sector::UnderdarkNoGround,
    Sector::Lava,
    Sector::DirtRoadNs,
    Sector::DirtRoadEw,
    Sector::DirtRoadIntersection,
    Sector::Cave,
    Sector::Jungle,
    Sector::Tundra,
    Sector::Taiga,
    Sector::Beach,
    Sector::Seaport,
    Sector::InsideRoom,
    Sector::River,
];

impl Sector {
    pub fn all() -> &'static [Sector] {
        &ALL_SECTORS
    }

    pub fn from_id(id: u8) -> Option<Sector> {
        ALL_SECTORS.get(id as usize).copied()
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn is_water(self) -> bool {
        matches!(
            self,
            Sector::WaterSwim
                | Sector::WaterNoSwim
                | Sector::Ocean
                | Sector::Underwater
                | Sector::UnderdarkWater
                | Sector::UnderdarkNoSwim
                | Sector::River
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Sector::Inside => "Inside",
            Sector::City => "City",
            Sector::Field => "Field",
            Sector::Forest => "Forest",
            Sector::Hills => "Hills",
            Sector::Mountain => "Mountains",
            Sector::WaterSwim => "Water (Swim)",
            Sector::WaterNoSwim => "Water (No Swim)",
            Sector::Flying => "In Flight",
            Sector::Underwater => "Underwater",
            Sector::ZoneStart => "Zone Start",
            Sector::RoadNs => "Road North-South",
            Sector::RoadEw => "Road East-West",
            Sector::RoadIntersection => "Road Intersection",
            Sector::Desert => "Desert",
            Sector::Ocean => "Ocean",
            Sector::Marshland => "Marshland",
            Sector::HighMountain => "High Mountain",
            Sector::Planes => "Outer Planes",
            Sector::UnderdarkWild => "Underdark Wilderness",
            Sector::UnderdarkCity => "Underdark City",
            Sector::UnderdarkInside => "Underdark Inside",
            Sector::UnderdarkWater => "Underdark Water (Swim)",
            Sector::UnderdarkNoSwim => "Underdark Water (No Swim)",
            Sector::UnderdarkNoGround => "Underdark Air",
            Sector::Lava => "Lava",
            Sector::DirtRoadNs => "Dirt Road North-South",
            Sector::DirtRoadEw => "Dirt Road East-West",
            Sector::DirtRoadIntersection => "Dirt Road Intersection",
            Sector::Cave => "Cave",
            Sector::Jungle => "Jungle",
            Sector::Tundra => "Tundra",
            Sector::Taiga => "Taiga",
            Sector::Beach => "Beach",
            Sector::Seaport => "Seaport",
            Sector::InsideRoom => "Inside Room",
            Sector::River => "River",
        }
    }
}

/// Elevation bands used by `classify`. Elevations run 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Below this elevation the plane is water.
    pub waterline: i32,
    /// Depth band under the waterline that is still swimmable.
    pub shallow_water: i32,
    /// Band above the waterline that is beach or marsh.
    pub coastline: i32,
    /// Band above the waterline that is open lowland.
    pub plains: i32,
    /// Distance below 255 where high mountains begin.
    pub high_mountain: i32,
    /// Distance below 255 where mountains begin.
    pub mountain: i32,
    /// Distance below 255 where hills begin.
    pub hill: i32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            waterline: 128,
            shallow_water: 20,
            coastline: 10,
            plains: 35,
            high_mountain: 40,
            mountain: 55,
            hill: 65,
        }
    }
}

/// Base sector for a cell from its elevation (0..=255), temperature (°C)
/// and moisture (0..=255).
pub fn classify(elevation: i32, temperature: i32, moisture: i32, t: &Thresholds) -> Sector {
    let wet_and_warm = moisture > 180 && temperature > 8;

    if elevation < t.waterline {
        return if elevation > t.waterline - t.shallow_water {
            Sector::WaterSwim
        } else {
            Sector::Ocean
        };
    }

    if elevation < t.waterline + t.coastline {
        if wet_and_warm {
            Sector::Marshland
        } else {
            Sector::Beach
        }
    } else if elevation < t.waterline + t.plains {
        if wet_and_warm {
            Sector::Marshland
        } else if temperature < 8 {
            Sector::Tundra
        } else if temperature > 25 && moisture < 80 {
            Sector::Desert
        } else {
            Sector::Field
        }
    } else if elevation > 255 - t.high_mountain {
        Sector::HighMountain
    } else if elevation > 255 - t.mountain {
        Sector::Mountain
    } else if elevation > 255 - t.hill {
        if temperature < 10 && moisture > 128 {
            Sector::Taiga
        } else {
            Sector::Hills
        }
    } else if temperature < 10 {
        Sector::Taiga
    } else if temperature > 18 && moisture > 180 {
        Sector::Jungle
    } else {
        Sector::Forest
    }
}

/// Temperature gradient: 35°C at the equator (y = 0) falling to -30°C at
/// the poles, cooled further by height above the waterline.
pub fn temperature_at(y: i32, elevation: i32, waterline: i32) -> i32 {
    const MAX_TEMP: f64 = 35.0;
    const MIN_TEMP: f64 = -30.0;
    let pct = y.abs() as f64 / crate::coords::PLANE_Y_LIMIT as f64;
    let lapse = (1.5 * elevation as f64 - waterline as f64).max(0.0) / 10.0;
    (MAX_TEMP - (MAX_TEMP - MIN_TEMP) * pct - lapse) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_dense() {
        for (i, s) in Sector::all().iter().enumerate() {
            assert_eq!(s.id() as usize, i);
            assert_eq!(Sector::from_id(i as u8), Some(*s));
        }
        assert_eq!(Sector::from_id(NUM_SECTORS as u8), None);
    }

    #[test]
    fn test_water_bands() {
        let t = Thresholds::default();
        assert_eq!(classify(127, 20, 100, &t), Sector::WaterSwim);
        assert_eq!(classify(109, 20, 100, &t), Sector::WaterSwim);
        assert_eq!(classify(108, 20, 100, &t), Sector::Ocean);
        assert_eq!(classify(0, 20, 100, &t), Sector::Ocean);
    }

    #[test]
    fn test_coast_and_lowland() {
        let t = Thresholds::default();
        assert_eq!(classify(130, 20, 100, &t), Sector::Beach);
        assert_eq!(classify(130, 20, 200, &t), Sector::Marshland);
        assert_eq!(classify(150, 5, 100, &t), Sector::Tundra);
        assert_eq!(classify(150, 30, 50, &t), Sector::Desert);
        assert_eq!(classify(150, 20, 100, &t), Sector::Field);
    }

    #[test]
    fn test_highlands() {
        let t = Thresholds::default();
        assert_eq!(classify(250, 20, 100, &t), Sector::HighMountain);
        assert_eq!(classify(210, 20, 100, &t), Sector::Mountain);
        assert_eq!(classify(195, 20, 100, &t), Sector::Hills);
        assert_eq!(classify(195, 5, 200, &t), Sector::Taiga);
        assert_eq!(classify(170, 20, 100, &t), Sector::Forest);
        assert_eq!(classify(170, 25, 200, &t), Sector::Jungle);
        assert_eq!(classify(170, 5, 100, &t), Sector::Taiga);
    }

    #[test]
    fn test_temperature_gradient() {
        assert_eq!(temperature_at(0, 0, 128), 35);
        assert_eq!(temperature_at(1024, 0, 128), -30);
        assert_eq!(temperature_at(-1024, 0, 128), -30);
        // Height above the waterline cools the air.
        assert!(temperature_at(0, 200, 128) < temperature_at(0, 100, 128));
    }

    #[test]
    fn test_river_is_water() {
        assert!(Sector::River.is_water());
        assert!(Sector::Ocean.is_water());
        assert!(!Sector::Beach.is_water());
    }
}
