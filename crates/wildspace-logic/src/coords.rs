//! Wilderness plane coordinates and directions.
//!
//! The plane is a closed square of integer coordinates centred on (0, 0),
//! with an independent altitude axis for airborne and submerged vessels.
//! Every other component calls into here before accepting a coordinate.

use crate::error::SpatialError;
use serde::{Deserialize, Serialize};

/// Largest absolute x coordinate on the plane.
pub const PLANE_X_LIMIT: i32 = 1024;
/// Largest absolute y coordinate on the plane.
pub const PLANE_Y_LIMIT: i32 = 1024;
/// Largest absolute altitude.
pub const ALTITUDE_LIMIT: i32 = 500;

/// True if (x, y, z) lies inside the plane and the altitude band.
///
/// Bounds are closed: ±1024 and ±500 are valid, one unit beyond is not.
pub fn validate(x: i32, y: i32, z: i32) -> bool {
    validate_plane(x, y) && (-ALTITUDE_LIMIT..=ALTITUDE_LIMIT).contains(&z)
}

/// True if (x, y) lies on the plane, ignoring altitude.
pub fn validate_plane(x: i32, y: i32) -> bool {
    (-PLANE_X_LIMIT..=PLANE_X_LIMIT).contains(&x) && (-PLANE_Y_LIMIT..=PLANE_Y_LIMIT).contains(&y)
}

/// `validate` as a `Result`, for `?` chains.
pub fn check(x: i32, y: i32, z: i32) -> Result<(), SpatialError> {
    if validate(x, y, z) {
        Ok(())
    } else {
        Err(SpatialError::OutOfBounds { x, y, z })
    }
}

/// A point on the plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const ORIGIN: Coord = Coord { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn is_valid(&self) -> bool {
        validate_plane(self.x, self.y)
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Coord {
        Coord::new(self.x + dx, self.y + dy)
    }

    pub fn step(&self, dir: Direction) -> Option<Coord> {
        dir.plane_offset().map(|(dx, dy)| self.offset(dx, dy))
    }
}

impl From<(i32, i32)> for Coord {
    fn from((x, y): (i32, i32)) -> Self {
        Coord::new(x, y)
    }
}

/// Chessboard distance: the ring index of `b` around `a`.
pub fn chebyshev(a: Coord, b: Coord) -> i32 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}

/// Compass bearing in whole degrees from `from` to `to`: 0 is north,
/// 90 east. A target on top of the observer reads 0.
pub fn bearing_between(from: (f32, f32), to: (f32, f32)) -> i32 {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    if dx == 0.0 && dy == 0.0 {
        return 0;
    }
    (dx.atan2(dy).to_degrees().rem_euclid(360.0).round() as i32) % 360
}

/// Straight-line distance between two points, altitude included.
pub fn range_between(from: (f32, f32, f32), to: (f32, f32, f32)) -> f32 {
    let (dx, dy, dz) = (to.0 - from.0, to.1 - from.1, to.2 - from.2);
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// The ten exit directions, numbered as the room exit table numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
    Up = 4,
    Down = 5,
    NorthWest = 6,
    NorthEast = 7,
    SouthEast = 8,
    SouthWest = 9,
}

impl Direction {
    pub const ALL: [Direction; 10] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::Up,
        Direction::Down,
        Direction::NorthWest,
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    /// Horizontal directions in hub-spoke order: cardinals, then diagonals clockwise.
    pub const COMPASS: [Direction; 8] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::NorthWest,
    ];

    pub fn from_id(id: u8) -> Option<Direction> {
        Self::ALL.get(id as usize).copied()
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn reverse(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::NorthWest => Direction::SouthEast,
            Direction::NorthEast => Direction::SouthWest,
            Direction::SouthEast => Direction::NorthWest,
            Direction::SouthWest => Direction::NorthEast,
        }
    }

    /// Unit step on the plane. North is +y. `Up`/`Down` have none.
    pub fn plane_offset(self) -> Option<(i32, i32)> {
        match self {
            Direction::North => Some((0, 1)),
            Direction::East => Some((1, 0)),
            Direction::South => Some((0, -1)),
            Direction::West => Some((-1, 0)),
            Direction::NorthWest => Some((-1, 1)),
            Direction::NorthEast => Some((1, 1)),
            Direction::SouthEast => Some((1, -1)),
            Direction::SouthWest => Some((-1, -1)),
            Direction::Up | Direction::Down => None,
        }
    }

    /// Compass bearing of a horizontal direction.
    pub fn degrees(self) -> Option<i32> {
        match self {
            Direction::North => Some(0),
            Direction::NorthEast => Some(45),
            Direction::East => Some(90),
            Direction::SouthEast => Some(135),
            Direction::South => Some(180),
            Direction::SouthWest => Some(225),
            Direction::West => Some(270),
            Direction::NorthWest => Some(315),
            Direction::Up | Direction::Down => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::NorthWest => "northwest",
            Direction::NorthEast => "northeast",
            Direction::SouthEast => "southeast",
            Direction::SouthWest => "southwest",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_exactness() {
        assert!(validate(-1024, 0, 0));
        assert!(!validate(-1025, 0, 0));
        assert!(validate(1024, 0, 0));
        assert!(!validate(1025, 0, 0));
        assert!(validate(0, -1024, 0));
        assert!(!validate(0, -1025, 0));
        assert!(validate(0, 1024, 0));
        assert!(!validate(0, 1025, 0));
        assert!(validate(0, 0, -500));
        assert!(!validate(0, 0, -501));
        assert!(validate(0, 0, 500));
        assert!(!validate(0, 0, 501));
    }

    #[test]
    fn test_corners_valid() {
        for &(x, y) in &[(-1024, -1024), (-1024, 1024), (1024, -1024), (1024, 1024)] {
            assert!(validate(x, y, 0));
            assert!(validate_plane(x, y));
        }
    }

    #[test]
    fn test_check_reports_coordinates() {
        match check(2000, 1, 2) {
            Err(SpatialError::OutOfBounds { x, y, z }) => assert_eq!((x, y, z), (2000, 1, 2)),
            other => panic!("unexpected {:?}", other),
        }
        assert!(check(0, 0, 0).is_ok());
    }

    #[test]
    fn test_reverse_is_involution() {
        for d in Direction::ALL {
            assert_eq!(d.reverse().reverse(), d);
            assert_ne!(d.reverse(), d);
        }
    }

    #[test]
    fn test_offsets_cancel_with_reverse() {
        for d in Direction::COMPASS {
            let (dx, dy) = d.plane_offset().unwrap();
            let (rx, ry) = d.reverse().plane_offset().unwrap();
            assert_eq!((dx + rx, dy + ry), (0, 0));
        }
        assert!(Direction::Up.plane_offset().is_none());
    }

    #[test]
    fn test_direction_ids_roundtrip() {
        for d in Direction::ALL {
            assert_eq!(Direction::from_id(d.id()), Some(d));
        }
        assert_eq!(Direction::from_id(10), None);
    }

    #[test]
    fn test_chebyshev() {
        assert_eq!(chebyshev(Coord::ORIGIN, Coord::new(3, -5)), 5);
        assert_eq!(chebyshev(Coord::new(2, 2), Coord::new(2, 2)), 0);
    }

    #[test]
    fn test_bearing_quadrants() {
        let origin = (0.0, 0.0);
        assert_eq!(bearing_between(origin, (0.0, 5.0)), 0);
        assert_eq!(bearing_between(origin, (5.0, 0.0)), 90);
        assert_eq!(bearing_between(origin, (0.0, -5.0)), 180);
        assert_eq!(bearing_between(origin, (-5.0, 0.0)), 270);
        assert_eq!(bearing_between(origin, (3.0, 3.0)), 45);
        assert_eq!(bearing_between(origin, (-3.0, 3.0)), 315);
        assert_eq!(bearing_between((10.0, 10.0), (13.0, 7.0)), 135);
        assert_eq!(bearing_between((2.0, 2.0), (2.0, 2.0)), 0);
    }

    #[test]
    fn test_bearing_matches_direction_degrees() {
        for d in Direction::COMPASS {
            let (dx, dy) = d.plane_offset().unwrap();
            assert_eq!(
                Some(bearing_between((0.0, 0.0), (dx as f32, dy as f32))),
                d.degrees()
            );
        }
        assert_eq!(Direction::Down.degrees(), None);
    }

    #[test]
    fn test_range_includes_altitude() {
        assert_eq!(range_between((0.0, 0.0, 0.0), (3.0, 4.0, 0.0)), 5.0);
        assert_eq!(range_between((1.0, 1.0, 10.0), (1.0, 1.0, -2.0)), 12.0);
        assert_eq!(range_between((2.0, 0.0, 1.0), (2.0, 0.0, 1.0)), 0.0);
    }
}
