//! Engine configuration.
//!
//! Every field has a default, so a JSON file only needs the keys it wants
//! to change.

use serde::{Deserialize, Serialize};
use std::io::Read;
use wildspace_logic::coords::{PLANE_X_LIMIT, PLANE_Y_LIMIT};
use wildspace_logic::error::{Conflict, SpatialError, Vnum};
use wildspace_logic::interior::{INTERIOR_VNUM_BASE, INTERIOR_VNUM_MAX, MAX_VESSELS};
use wildspace_logic::sectors::Thresholds;

use crate::generation::PathParams;
use crate::wilderness::{
    DYNAMIC_ROOM_VNUM_END, DYNAMIC_ROOM_VNUM_START, STATIC_ROOM_VNUM_END, STATIC_ROOM_VNUM_START,
};

/// Vnum ranges a dynamic pool must stay clear of.
const RESERVED_VNUMS: [(Vnum, Vnum); 2] = [
    (INTERIOR_VNUM_BASE, INTERIOR_VNUM_MAX),
    (STATIC_ROOM_VNUM_START, STATIC_ROOM_VNUM_END),
];

/// More dynamic rooms than plane coordinates could never all be bound.
pub const MAX_POOL_CAPACITY: i64 = (2 * PLANE_X_LIMIT as i64 + 1) * (2 * PLANE_Y_LIMIT as i64 + 1);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seeds the heightmap and every generator.
    pub seed: u64,
    pub thresholds: Thresholds,
    /// First vnum of the dynamic wilderness pool.
    pub dynamic_pool_start: Vnum,
    /// Last vnum of the dynamic wilderness pool (inclusive).
    pub dynamic_pool_end: Vnum,
    /// Edge length of a spatial index bucket, in plane units.
    pub index_cell_size: i32,
    pub river: PathParams,
    pub max_vessels: u32,
    /// Chance per roll of a vessel interior gaining an extra room.
    pub discovery_chance: f64,
    /// Name of a wilderness room no region or path renames.
    pub default_room_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED_CAFE,
            thresholds: Thresholds::default(),
            dynamic_pool_start: DYNAMIC_ROOM_VNUM_START,
            dynamic_pool_end: DYNAMIC_ROOM_VNUM_END,
            index_cell_size: 64,
            river: PathParams::default(),
            max_vessels: MAX_VESSELS,
            discovery_chance: 0.30,
            default_room_name: "The Wilderness".to_string(),
        }
    }
}

/// Errors loading a configuration file.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid(SpatialError),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<SpatialError> for ConfigError {
    fn from(e: SpatialError) -> Self {
        ConfigError::Invalid(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "Config parse error: {}", e),
            ConfigError::Invalid(e) => write!(f, "Invalid config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Number of rooms in the dynamic pool.
    pub fn pool_capacity(&self) -> usize {
        pool_size(self.dynamic_pool_start, self.dynamic_pool_end).max(0) as usize
    }

    /// Check the settings an engine cannot run with. The dynamic pool
    /// must be non-empty and clear of the interior and static vnum ranges.
    pub fn validate(&self) -> Result<(), SpatialError> {
        let (start, end) = (self.dynamic_pool_start, self.dynamic_pool_end);
        let size = pool_size(start, end);
        if !(1..=MAX_POOL_CAPACITY).contains(&size) {
            return Err(SpatialError::OutOfRange {
                what: "dynamic pool size",
                value: size,
                max: MAX_POOL_CAPACITY,
            });
        }
        if start < 1 {
            return Err(SpatialError::OutOfRange {
                what: "dynamic pool start",
                value: start as i64,
                max: Vnum::MAX as i64,
            });
        }
        if RESERVED_VNUMS
            .iter()
            .any(|&(lo, hi)| start <= hi && lo <= end)
        {
            return Err(SpatialError::Duplicate(Conflict::VnumRange { start, end }));
        }
        if !(1..=2 * PLANE_X_LIMIT + 1).contains(&self.index_cell_size) {
            return Err(SpatialError::OutOfRange {
                what: "index cell size",
                value: self.index_cell_size as i64,
                max: (2 * PLANE_X_LIMIT + 1) as i64,
            });
        }
        if self.max_vessels > MAX_VESSELS {
            return Err(SpatialError::OutOfRange {
                what: "max vessels",
                value: self.max_vessels as i64,
                max: MAX_VESSELS as i64,
            });
        }
        Ok(())
    }
}

fn pool_size(start: Vnum, end: Vnum) -> i64 {
    end as i64 - start as i64 + 1
}
