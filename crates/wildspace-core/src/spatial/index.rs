//! Grid-bucketed feature index.
//!
//! Features live in an arena addressed by slot; each bucket of the grid
//! lists the slots whose bounding box touches it. Queries gather candidate
//! slots from the buckets, then run the exact shape test.

use std::collections::{BTreeSet, HashMap};
use wildspace_logic::coords::{validate_plane, Coord, PLANE_X_LIMIT, PLANE_Y_LIMIT};
use wildspace_logic::error::{Conflict, FeatureId, SpatialError};

use super::feature::{Bounds, Feature};

pub const DEFAULT_CELL_SIZE: i32 = 64;

struct Entry {
    feature: Feature,
    bounds: Bounds,
}

pub struct SpatialIndex {
    cell_size: i32,
    cols: usize,
    rows: usize,
    buckets: Vec<Vec<usize>>,
    arena: Vec<Option<Entry>>,
    slots: HashMap<FeatureId, usize>,
    free: Vec<usize>,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl SpatialIndex {
    pub fn new(cell_size: i32) -> Self {
        let cell_size = cell_size.max(1);
        let cols = ((2 * PLANE_X_LIMIT + 1) as usize).div_ceil(cell_size as usize);
        let rows = ((2 * PLANE_Y_LIMIT + 1) as usize).div_ceil(cell_size as usize);
        Self {
            cell_size,
            cols,
            rows,
            buckets: vec![Vec::new(); cols * rows],
            arena: Vec::new(),
            slots: HashMap::new(),
            free: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> i32 {
        self.cell_size
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn get(&self, id: FeatureId) -> Option<&Feature> {
        let slot = *self.slots.get(&id)?;
        self.arena[slot].as_ref().map(|e| &e.feature)
    }

    /// All features, ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        let ordered: BTreeSet<(FeatureId, usize)> =
            self.slots.iter().map(|(&id, &slot)| (id, slot)).collect();
        ordered
            .into_iter()
            .filter_map(move |(_, slot)| self.arena[slot].as_ref().map(|e| &e.feature))
    }

    /// Insert or replace by id. Returns the feature that was replaced.
    pub fn insert(&mut self, feature: Feature) -> Result<Option<Feature>, SpatialError> {
        feature.validate()?;
        let previous = self.remove(feature.id);
        self.place(feature);
        Ok(previous)
    }

    /// Insert, refusing to replace an existing id.
    pub fn try_insert(&mut self, feature: Feature) -> Result<(), SpatialError> {
        if self.contains(feature.id) {
            return Err(SpatialError::Duplicate(Conflict::Feature(feature.id)));
        }
        self.insert(feature).map(|_| ())
    }

    /// Insert many features. Nothing is inserted unless every feature is valid.
    pub fn insert_batch(&mut self, features: Vec<Feature>) -> Result<(), SpatialError> {
        for f in &features {
            f.validate()?;
        }
        for f in features {
            self.remove(f.id);
            self.place(f);
        }
        Ok(())
    }

    /// Replace the whole contents. The index is left untouched on error.
    pub fn rebuild(&mut self, features: Vec<Feature>) -> Result<(), SpatialError> {
        for f in &features {
            f.validate()?;
        }
        self.clear();
        self.insert_batch(features)
    }

    pub fn remove(&mut self, id: FeatureId) -> Option<Feature> {
        let slot = self.slots.remove(&id)?;
        let entry = self.arena[slot].take()?;
        for bucket in self.bucket_range(&entry.bounds) {
            self.buckets[bucket].retain(|&s| s != slot);
        }
        self.free.push(slot);
        Some(entry.feature)
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.arena.clear();
        self.slots.clear();
        self.free.clear();
    }

    /// Ids of every feature containing (x, y), ascending. Empty off the plane.
    pub fn enclosing(&self, x: i32, y: i32) -> Vec<FeatureId> {
        self.enclosing_features(x, y).map(|f| f.id).collect()
    }

    /// Regions containing (x, y), ascending by id.
    pub fn regions_at(&self, x: i32, y: i32) -> Vec<&Feature> {
        self.enclosing_features(x, y).filter(|f| f.is_region()).collect()
    }

    /// Paths containing (x, y), ascending by id.
    pub fn paths_at(&self, x: i32, y: i32) -> Vec<&Feature> {
        self.enclosing_features(x, y).filter(|f| f.is_path()).collect()
    }

    /// Ids of features within `radius` of (x, y), nearest first, ties by id.
    pub fn nearby(&self, x: i32, y: i32, radius: f64) -> Vec<FeatureId> {
        self.nearby_with_distance(x, y, radius)
            .into_iter()
            .map(|(id, _)| id)
            .collect()
    }

    pub fn nearby_with_distance(&self, x: i32, y: i32, radius: f64) -> Vec<(FeatureId, f64)> {
        if !validate_plane(x, y) || !(radius >= 0.0) {
            return Vec::new();
        }
        let at = Coord::new(x, y);
        let reach = radius.ceil().min((2 * PLANE_X_LIMIT) as f64) as i32;
        let window = Bounds {
            min_x: x - reach,
            min_y: y - reach,
            max_x: x + reach,
            max_y: y + reach,
        };

        let mut candidates = BTreeSet::new();
        for bucket in self.bucket_range(&window) {
            candidates.extend(self.buckets[bucket].iter().copied());
        }

        let mut found: Vec<(FeatureId, f64)> = candidates
            .into_iter()
            .filter_map(|slot| self.arena[slot].as_ref())
            .filter(|e| e.bounds.within(at, radius))
            .map(|e| (e.feature.id, e.feature.distance_to(at)))
            .filter(|&(_, d)| d <= radius)
            .collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        found
    }

    fn enclosing_features(&self, x: i32, y: i32) -> impl Iterator<Item = &Feature> {
        let at = Coord::new(x, y);
        let mut hits: Vec<&Feature> = if validate_plane(x, y) {
            self.buckets[self.bucket_of(x, y)]
                .iter()
                .filter_map(|&slot| self.arena[slot].as_ref())
                .filter(|e| e.bounds.contains(at) && e.feature.contains(at))
                .map(|e| &e.feature)
                .collect()
        } else {
            Vec::new()
        };
        hits.sort_by_key(|f| f.id);
        hits.into_iter()
    }

    fn place(&mut self, feature: Feature) {
        let bounds = feature.bounds();
        let id = feature.id;
        let entry = Entry { feature, bounds };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.arena[slot] = Some(entry);
                slot
            }
            None => {
                self.arena.push(Some(entry));
                self.arena.len() - 1
            }
        };
        for bucket in self.bucket_range(&bounds) {
            self.buckets[bucket].push(slot);
        }
        self.slots.insert(id, slot);
    }

    fn bucket_of(&self, x: i32, y: i32) -> usize {
        let col = ((x.clamp(-PLANE_X_LIMIT, PLANE_X_LIMIT) + PLANE_X_LIMIT) / self.cell_size) as usize;
        let row = ((y.clamp(-PLANE_Y_LIMIT, PLANE_Y_LIMIT) + PLANE_Y_LIMIT) / self.cell_size) as usize;
        row.min(self.rows - 1) * self.cols + col.min(self.cols - 1)
    }

    /// Buckets overlapped by a box, clipped to the plane.
    fn bucket_range(&self, b: &Bounds) -> Vec<usize> {
        if b.min_x > b.max_x || b.min_y > b.max_y {
            return Vec::new();
        }
        let lo = self.bucket_of(b.min_x, b.min_y);
        let hi = self.bucket_of(b.max_x, b.max_y);
        let (c0, r0) = (lo % self.cols, lo / self.cols);
        let (c1, r1) = (hi % self.cols, hi / self.cols);
        let mut out = Vec::with_capacity((c1 - c0 + 1) * (r1 - r0 + 1));
        for row in r0..=r1 {
            for col in c0..=c1 {
                out.push(row * self.cols + col);
            }
        }
        out
    }
}
