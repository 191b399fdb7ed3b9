//! Seeded noise terrain. Every coordinate on the plane has an elevation and
//! a moisture value in 0..=255; temperature falls out of latitude and height.

use noise::{NoiseFn, Perlin};
use wildspace_logic::coords::{Coord, PLANE_X_LIMIT, PLANE_Y_LIMIT};
use wildspace_logic::sectors::{classify, temperature_at, Sector, Thresholds};

/// Anything that can answer "what is the ground like here".
pub trait TerrainSampler: Send + Sync {
    fn elevation(&self, at: Coord) -> i32;
    fn moisture(&self, at: Coord) -> i32;
    fn thresholds(&self) -> &Thresholds;

    fn temperature(&self, at: Coord) -> i32 {
        temperature_at(at.y, self.elevation(at), self.thresholds().waterline)
    }

    /// Sector before any region or path is applied.
    fn base_sector(&self, at: Coord) -> Sector {
        classify(
            self.elevation(at),
            self.temperature(at),
            self.moisture(at),
            self.thresholds(),
        )
    }

    fn is_water(&self, at: Coord) -> bool {
        self.base_sector(at).is_water()
    }
}

const ELEVATION_OCTAVES: u32 = 6;
const MOISTURE_OCTAVES: u32 = 4;
/// Base noise frequency across the whole plane.
const FREQUENCY: f64 = 4.0;
const DISTORTION: f64 = 0.35;

/// Perlin heightmap: ridged fbm elevation, warped by a second field and
/// pulled down toward the plane edges so the continent sits in the middle.
pub struct Heightmap {
    elevation: Perlin,
    distortion: Perlin,
    moisture: Perlin,
    thresholds: Thresholds,
}

impl Heightmap {
    pub fn new(seed: u64, thresholds: Thresholds) -> Self {
        let seed = seed as u32;
        Self {
            elevation: Perlin::new(seed),
            distortion: Perlin::new(seed.wrapping_add(1)),
            moisture: Perlin::new(seed.wrapping_add(2)),
            thresholds,
        }
    }

    fn normalized(at: Coord) -> (f64, f64) {
        (
            at.x as f64 / PLANE_X_LIMIT as f64,
            at.y as f64 / PLANE_Y_LIMIT as f64,
        )
    }
}

impl TerrainSampler for Heightmap {
    fn elevation(&self, at: Coord) -> i32 {
        let (nx, ny) = Self::normalized(at);
        let warp = self.distortion.get([nx * FREQUENCY, ny * FREQUENCY]) * DISTORTION;

        let ridged = 1.0
            - fbm(
                &self.elevation,
                (nx + warp) * FREQUENCY,
                (ny - warp) * FREQUENCY,
                ELEVATION_OCTAVES,
                0.5,
                2.0,
            )
            .abs();

        // 0 at the centre, 1 at the corners
        let radial = (nx * nx + ny * ny).sqrt() / std::f64::consts::SQRT_2;
        let height = ridged * 0.85 + 0.35 - radial * 0.55;
        (height.clamp(0.0, 1.0) * 255.0) as i32
    }

    fn moisture(&self, at: Coord) -> i32 {
        let (nx, ny) = Self::normalized(at);
        let m = fbm(
            &self.moisture,
            nx * FREQUENCY * 1.5,
            ny * FREQUENCY * 1.5,
            MOISTURE_OCTAVES,
            0.5,
            2.0,
        );
        (((m + 1.0) * 0.5).clamp(0.0, 1.0) * 255.0) as i32
    }

    fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }
}

/// Fractal Brownian motion, normalized back into -1..=1.
fn fbm(noise: &Perlin, x: f64, y: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..octaves {
        total += amplitude * noise.get([x * frequency, y * frequency]);
        max_value += amplitude;
        amplitude *= persistence;
        frequency *= lacunarity;
    }

    total / max_value
}

/// Uniform terrain, with optional water everywhere at or east of `shore_x`.
/// Used for tests and for worlds built entirely out of regions.
#[derive(Debug, Clone)]
pub struct FlatTerrain {
    pub elevation: i32,
    pub moisture: i32,
    pub shore_x: Option<i32>,
    pub thresholds: Thresholds,
}

impl FlatTerrain {
    /// Dry temperate field everywhere.
    pub fn field() -> Self {
        let thresholds = Thresholds::default();
        Self {
            elevation: thresholds.waterline + thresholds.coastline + 5,
            moisture: 100,
            shore_x: None,
            thresholds,
        }
    }

    /// Deep ocean everywhere.
    pub fn ocean() -> Self {
        Self {
            elevation: 40,
            ..Self::field()
        }
    }

    pub fn with_shore(mut self, x: i32) -> Self {
        self.shore_x = Some(x);
        self
    }
}

impl TerrainSampler for FlatTerrain {
    fn elevation(&self, at: Coord) -> i32 {
        match self.shore_x {
            Some(shore) if at.x >= shore => 40,
            _ => self.elevation,
        }
    }

    fn moisture(&self, _at: Coord) -> i32 {
        self.moisture
    }

    fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    // Flat ground has no lapse rate or latitude bands worth modelling.
    fn temperature(&self, _at: Coord) -> i32 {
        15
    }
}
