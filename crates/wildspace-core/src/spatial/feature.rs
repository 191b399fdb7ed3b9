//! Regions and paths: named shapes that change what a wilderness room is.

use serde::{Deserialize, Serialize};
use wildspace_logic::coords::{Coord, PLANE_X_LIMIT, PLANE_Y_LIMIT};
use wildspace_logic::error::{FeatureId, SpatialError};
use wildspace_logic::sectors::Sector;

const EDGE_EPSILON: f64 = 1e-9;

/// Largest circle radius or path width a feature may carry: the full span
/// of the plane. Anything wider already covers every coordinate.
pub const MAX_SHAPE_EXTENT: i32 = 2 * if PLANE_X_LIMIT > PLANE_Y_LIMIT {
    PLANE_X_LIMIT
} else {
    PLANE_Y_LIMIT
};

/// Geometry of a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Closed polygon; the last vertex joins back to the first.
    Polygon(Vec<Coord>),
    Circle { center: Coord, radius: f64 },
    /// Open polyline covering every point within `width / 2` of it.
    Path { points: Vec<Coord>, width: f64 },
}

/// What a region does to the rooms inside it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RegionKind {
    /// Names the area; rooms take the region name.
    Geographic,
    /// Forces a sector.
    Sector(Sector),
    /// Raises or lowers elevation before the sector is classified.
    SectorTransform(i32),
    /// Attaches an encounter table, named after the region.
    Encounter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathKind {
    Road,
    DirtRoad,
    River,
}

impl PathKind {
    pub fn default_sector(self) -> Sector {
        match self {
            PathKind::Road => Sector::RoadIntersection,
            PathKind::DirtRoad => Sector::DirtRoadIntersection,
            PathKind::River => Sector::River,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FeatureKind {
    Region(RegionKind),
    Path { kind: PathKind, sector: Sector },
}

/// Inclusive integer bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Bounds {
    pub fn contains(&self, at: Coord) -> bool {
        (self.min_x..=self.max_x).contains(&at.x) && (self.min_y..=self.max_y).contains(&at.y)
    }

    /// True when this box comes within `radius` of `at`.
    pub fn within(&self, at: Coord, radius: f64) -> bool {
        let dx = (self.min_x - at.x).max(at.x - self.max_x).max(0) as f64;
        let dy = (self.min_y - at.y).max(at.y - self.max_y).max(0) as f64;
        dx * dx + dy * dy <= radius * radius
    }

    fn around(points: &[Coord], pad: i32) -> Option<Bounds> {
        let first = points.first()?;
        let mut b = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for p in points {
            b.min_x = b.min_x.min(p.x);
            b.min_y = b.min_y.min(p.y);
            b.max_x = b.max_x.max(p.x);
            b.max_y = b.max_y.max(p.y);
        }
        let pad = pad.clamp(0, MAX_SHAPE_EXTENT);
        b.min_x = b.min_x.saturating_sub(pad).max(-PLANE_X_LIMIT);
        b.min_y = b.min_y.saturating_sub(pad).max(-PLANE_Y_LIMIT);
        b.max_x = b.max_x.saturating_add(pad).min(PLANE_X_LIMIT);
        b.max_y = b.max_y.saturating_add(pad).min(PLANE_Y_LIMIT);
        Some(b)
    }
}

fn check_extent(what: &'static str, extent: f64) -> Result<(), SpatialError> {
    if extent > MAX_SHAPE_EXTENT as f64 {
        return Err(SpatialError::OutOfRange {
            what,
            value: extent.ceil().min(i64::MAX as f64) as i64,
            max: MAX_SHAPE_EXTENT as i64,
        });
    }
    Ok(())
}

/// A named region or path on the plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub name: String,
    pub kind: FeatureKind,
    pub shape: Shape,
}

impl Feature {
    pub fn region(id: FeatureId, name: impl Into<String>, kind: RegionKind, shape: Shape) -> Self {
        Self {
            id,
            name: name.into(),
            kind: FeatureKind::Region(kind),
            shape,
        }
    }

    /// A path with its kind's default sector.
    pub fn path(
        id: FeatureId,
        name: impl Into<String>,
        kind: PathKind,
        points: Vec<Coord>,
        width: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind: FeatureKind::Path {
                kind,
                sector: kind.default_sector(),
            },
            shape: Shape::Path { points, width },
        }
    }

    pub fn is_path(&self) -> bool {
        matches!(self.kind, FeatureKind::Path { .. })
    }

    pub fn is_region(&self) -> bool {
        matches!(self.kind, FeatureKind::Region(_))
    }

    /// Reject shapes the index cannot reason about. Vertices must lie on
    /// the plane; nothing is clamped.
    pub fn validate(&self) -> Result<(), SpatialError> {
        let points: &[Coord] = match &self.shape {
            Shape::Polygon(points) => {
                if points.len() < 3 {
                    return Err(SpatialError::InvalidShape("polygon needs three vertices"));
                }
                points
            }
            Shape::Circle { center, radius } => {
                if !(*radius > 0.0) || !radius.is_finite() {
                    return Err(SpatialError::InvalidShape("circle radius must be positive"));
                }
                check_extent("circle radius", *radius)?;
                std::slice::from_ref(center)
            }
            Shape::Path { points, width } => {
                if points.is_empty() {
                    return Err(SpatialError::InvalidShape("path has no points"));
                }
                if !(*width > 0.0) || !width.is_finite() {
                    return Err(SpatialError::InvalidShape("path width must be positive"));
                }
                check_extent("path width", *width)?;
                points
            }
        };
        match points.iter().find(|p| !p.is_valid()) {
            Some(p) => Err(SpatialError::OutOfBounds { x: p.x, y: p.y, z: 0 }),
            None => Ok(()),
        }
    }

    /// Bounding box, clipped to the plane.
    pub fn bounds(&self) -> Bounds {
        let (points, pad): (&[Coord], i32) = match &self.shape {
            Shape::Polygon(points) => (points, 0),
            Shape::Circle { center, radius } => (std::slice::from_ref(center), radius.ceil() as i32),
            Shape::Path { points, width } => (points, (width / 2.0).ceil() as i32),
        };
        Bounds::around(points, pad).unwrap_or(Bounds {
            min_x: 0,
            min_y: 0,
            max_x: -1,
            max_y: -1,
        })
    }

    pub fn contains(&self, at: Coord) -> bool {
        match &self.shape {
            Shape::Polygon(points) => on_outline(points, at) || ray_cast(points, at),
            Shape::Circle { center, radius } => {
                let dx = (at.x - center.x) as f64;
                let dy = (at.y - center.y) as f64;
                dx * dx + dy * dy <= radius * radius
            }
            Shape::Path { points, width } => polyline_distance(points, at) <= width / 2.0,
        }
    }

    /// Distance from `at` to the nearest covered point; 0 when inside.
    pub fn distance_to(&self, at: Coord) -> f64 {
        match &self.shape {
            Shape::Polygon(points) => {
                if self.contains(at) {
                    0.0
                } else {
                    closed_distance(points, at)
                }
            }
            Shape::Circle { center, radius } => {
                let dx = (at.x - center.x) as f64;
                let dy = (at.y - center.y) as f64;
                ((dx * dx + dy * dy).sqrt() - radius).max(0.0)
            }
            Shape::Path { points, width } => (polyline_distance(points, at) - width / 2.0).max(0.0),
        }
    }
}

fn segment_distance(a: Coord, b: Coord, p: Coord) -> f64 {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (bx, by) = (b.x as f64, b.y as f64);
    let (px, py) = (p.x as f64, p.y as f64);
    let (dx, dy) = (bx - ax, by - ay);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (ax + t * dx, ay + t * dy);
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

fn polyline_distance(points: &[Coord], at: Coord) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => segment_distance(*only, *only, at),
        _ => points
            .windows(2)
            .map(|w| segment_distance(w[0], w[1], at))
            .fold(f64::INFINITY, f64::min),
    }
}

fn closed_distance(points: &[Coord], at: Coord) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| segment_distance(points[i], points[(i + 1) % n], at))
        .fold(f64::INFINITY, f64::min)
}

fn on_outline(points: &[Coord], at: Coord) -> bool {
    points.len() >= 2 && closed_distance(points, at) < EDGE_EPSILON
}

/// Even-odd ray cast toward +x.
fn ray_cast(points: &[Coord], at: Coord) -> bool {
    let (px, py) = (at.x as f64, at.y as f64);
    let mut inside = false;
    let mut j = points.len().wrapping_sub(1);
    for i in 0..points.len() {
        let (xi, yi) = (points[i].x as f64, points[i].y as f64);
        let (xj, yj) = (points[j].x as f64, points[j].y as f64);
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}
