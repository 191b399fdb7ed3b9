//! Wilderness room allocator.
//!
//! The plane has millions of coordinates but only a few thousand rooms.
//! Static rooms are authored and pinned to a coordinate forever; dynamic
//! rooms come out of a fixed pool, bind to a coordinate the first time
//! something needs a room there, and go back to the pool once nothing
//! occupies or pins them.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use wildspace_logic::coords::{check, Coord};
use wildspace_logic::error::{Conflict, Missing, SpatialError, Vnum};
use wildspace_logic::sectors::Sector;

pub const STATIC_ROOM_VNUM_START: Vnum = 1_000_000;
pub const STATIC_ROOM_VNUM_END: Vnum = 1_003_999;
pub const DYNAMIC_ROOM_VNUM_START: Vnum = 1_004_000;
pub const DYNAMIC_ROOM_VNUM_END: Vnum = 1_005_999;

/// Room handle handed out by the allocator.
pub type RoomId = Vnum;

/// What a wilderness room looks like to a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomProfile {
    pub name: String,
    pub sector: Sector,
    pub encounters: Vec<String>,
}

impl Default for RoomProfile {
    fn default() -> Self {
        Self {
            name: "The Wilderness".to_string(),
            sector: Sector::Field,
            encounters: Vec::new(),
        }
    }
}

/// A room bound to a coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WildRoom {
    pub vnum: RoomId,
    pub coord: Coord,
    pub profile: RoomProfile,
    pub occupants: u32,
    pub pins: u32,
    pub is_static: bool,
}

impl WildRoom {
    pub fn is_referenced(&self) -> bool {
        self.occupants > 0 || self.pins > 0
    }
}

struct AllocatorState {
    pool_start: Vnum,
    /// Slot `i` holds the binding of vnum `pool_start + i`.
    pool: Vec<Option<WildRoom>>,
    /// Unbound dynamic vnums; the lowest is handed out first.
    free: BTreeSet<Vnum>,
    by_coord: HashMap<Coord, Vnum>,
    statics: HashMap<Vnum, WildRoom>,
    static_by_coord: HashMap<Coord, Vnum>,
}

impl AllocatorState {
    fn new(pool_start: Vnum, pool_end: Vnum) -> Self {
        let free: BTreeSet<Vnum> = (pool_start..=pool_end).collect();
        Self {
            pool_start,
            pool: vec![None; free.len()],
            free,
            by_coord: HashMap::new(),
            statics: HashMap::new(),
            static_by_coord: HashMap::new(),
        }
    }

    fn slot(&self, vnum: Vnum) -> Option<usize> {
        let i = vnum.checked_sub(self.pool_start)?;
        (i >= 0 && (i as usize) < self.pool.len()).then_some(i as usize)
    }

    fn lookup(&self, at: Coord) -> Option<Vnum> {
        self.static_by_coord
            .get(&at)
            .or_else(|| self.by_coord.get(&at))
            .copied()
    }

    fn room(&self, vnum: Vnum) -> Option<&WildRoom> {
        if let Some(room) = self.statics.get(&vnum) {
            return Some(room);
        }
        self.slot(vnum).and_then(|i| self.pool[i].as_ref())
    }

    fn room_mut(&mut self, vnum: Vnum) -> Option<&mut WildRoom> {
        if self.statics.contains_key(&vnum) {
            return self.statics.get_mut(&vnum);
        }
        let i = self.slot(vnum)?;
        self.pool[i].as_mut()
    }

    /// Unbind a dynamic room if nothing references it.
    fn try_release(&mut self, vnum: Vnum) -> bool {
        let Some(i) = self.slot(vnum) else {
            return false;
        };
        let coord = match &self.pool[i] {
            Some(room) if !room.is_referenced() => room.coord,
            _ => return false,
        };
        self.pool[i] = None;
        self.by_coord.remove(&coord);
        self.free.insert(vnum);
        log::debug!("Released wilderness room {} at ({}, {})", vnum, coord.x, coord.y);
        true
    }

    fn is_claimed(&self, at: Coord) -> bool {
        if self.static_by_coord.contains_key(&at) {
            return true;
        }
        self.by_coord
            .get(&at)
            .and_then(|&v| self.room(v))
            .map(WildRoom::is_referenced)
            .unwrap_or(false)
    }
}

pub struct RoomAllocator {
    state: RwLock<AllocatorState>,
    capacity: usize,
}

impl Default for RoomAllocator {
    fn default() -> Self {
        Self::new(DYNAMIC_ROOM_VNUM_START, DYNAMIC_ROOM_VNUM_END)
    }
}

impl RoomAllocator {
    /// Pool of dynamic vnums `pool_start..=pool_end`. An inverted range
    /// gives an empty pool.
    pub fn new(pool_start: Vnum, pool_end: Vnum) -> Self {
        let state = AllocatorState::new(pool_start, pool_end);
        Self {
            capacity: state.pool.len(),
            state: RwLock::new(state),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, AllocatorState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, AllocatorState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Dynamic rooms currently bound to a coordinate.
    pub fn bound_count(&self) -> usize {
        self.read().by_coord.len()
    }

    pub fn free_count(&self) -> usize {
        self.read().free.len()
    }

    pub fn static_count(&self) -> usize {
        self.read().statics.len()
    }

    /// Room at (x, y), materializing one with the default profile if needed.
    pub fn room_for(&self, x: i32, y: i32) -> Result<RoomId, SpatialError> {
        self.room_for_with(x, y, |_| RoomProfile::default())
    }

    /// Room at (x, y). A newly bound room takes its profile from `describe`,
    /// which runs outside the allocator lock.
    pub fn room_for_with<F>(&self, x: i32, y: i32, describe: F) -> Result<RoomId, SpatialError>
    where
        F: FnOnce(Coord) -> RoomProfile,
    {
        check(x, y, 0)?;
        let at = Coord::new(x, y);

        if let Some(vnum) = self.read().lookup(at) {
            return Ok(vnum);
        }

        let profile = describe(at);

        let mut state = self.write();
        // Someone may have bound it between the read and the write.
        if let Some(vnum) = state.lookup(at) {
            return Ok(vnum);
        }
        let vnum = state
            .free
            .pop_first()
            .ok_or(SpatialError::PoolExhausted {
                capacity: self.capacity,
            })?;
        let slot = state.slot(vnum).ok_or(SpatialError::PoolExhausted {
            capacity: self.capacity,
        })?;
        state.pool[slot] = Some(WildRoom {
            vnum,
            coord: at,
            profile,
            occupants: 0,
            pins: 0,
            is_static: false,
        });
        state.by_coord.insert(at, vnum);

        let remaining = state.free.len();
        if remaining == self.capacity / 10 {
            log::warn!(
                "Wilderness room pool is down to {} of {} free rooms",
                remaining,
                self.capacity
            );
        }
        log::debug!("Bound wilderness room {} to ({}, {})", vnum, x, y);
        Ok(vnum)
    }

    /// Room already at (x, y), without binding a new one.
    pub fn room_at(&self, x: i32, y: i32) -> Option<RoomId> {
        self.read().lookup(Coord::new(x, y))
    }

    /// Coordinates of every bound dynamic room.
    pub fn bound_coords(&self) -> Vec<Coord> {
        let mut coords: Vec<Coord> = self.read().by_coord.keys().copied().collect();
        coords.sort();
        coords
    }

    pub fn coordinate_for(&self, room: RoomId) -> Result<Coord, SpatialError> {
        self.read()
            .room(room)
            .map(|r| r.coord)
            .ok_or(SpatialError::NotFound(Missing::Room(room)))
    }

    pub fn profile(&self, room: RoomId) -> Option<RoomProfile> {
        self.read().room(room).map(|r| r.profile.clone())
    }

    pub fn room(&self, room: RoomId) -> Option<WildRoom> {
        self.read().room(room).cloned()
    }

    /// Bind an authored room to a coordinate. Static rooms win over the pool:
    /// an unreferenced dynamic room already there is released.
    pub fn register_static(
        &self,
        vnum: RoomId,
        x: i32,
        y: i32,
        profile: RoomProfile,
    ) -> Result<(), SpatialError> {
        if !(STATIC_ROOM_VNUM_START..=STATIC_ROOM_VNUM_END).contains(&vnum) {
            return Err(SpatialError::OutOfRange {
                what: "static room vnum",
                value: vnum as i64,
                max: STATIC_ROOM_VNUM_END as i64,
            });
        }
        check(x, y, 0)?;
        let at = Coord::new(x, y);

        let mut state = self.write();
        if state.statics.contains_key(&vnum) {
            return Err(SpatialError::Duplicate(Conflict::Room(vnum)));
        }
        if state.static_by_coord.contains_key(&at) {
            return Err(SpatialError::Duplicate(Conflict::Coordinate(at)));
        }
        if let Some(&dynamic) = state.by_coord.get(&at) {
            if !state.try_release(dynamic) {
                return Err(SpatialError::Duplicate(Conflict::Coordinate(at)));
            }
        }
        state.statics.insert(
            vnum,
            WildRoom {
                vnum,
                coord: at,
                profile,
                occupants: 0,
                pins: 0,
                is_static: true,
            },
        );
        state.static_by_coord.insert(at, vnum);
        Ok(())
    }

    /// Unbind a dynamic room. Returns false (and does nothing) while the
    /// room is occupied or pinned, and always for static rooms.
    pub fn release(&self, room: RoomId) -> Result<bool, SpatialError> {
        let mut state = self.write();
        let is_static = state
            .room(room)
            .map(|r| r.is_static)
            .ok_or(SpatialError::NotFound(Missing::Room(room)))?;
        if is_static {
            return Ok(false);
        }
        Ok(state.try_release(room))
    }

    /// An entity entered the room.
    pub fn occupy(&self, room: RoomId) -> Result<(), SpatialError> {
        let mut state = self.write();
        let r = state
            .room_mut(room)
            .ok_or(SpatialError::NotFound(Missing::Room(room)))?;
        r.occupants += 1;
        Ok(())
    }

    /// An entity left the room. Returns true if that released it.
    pub fn vacate(&self, room: RoomId) -> Result<bool, SpatialError> {
        let mut state = self.write();
        let r = state
            .room_mut(room)
            .ok_or(SpatialError::NotFound(Missing::Room(room)))?;
        r.occupants = r.occupants.saturating_sub(1);
        Ok(state.try_release(room))
    }

    /// Keep the room bound even when empty (a campsite, a dropped object).
    pub fn pin(&self, room: RoomId) -> Result<(), SpatialError> {
        let mut state = self.write();
        let r = state
            .room_mut(room)
            .ok_or(SpatialError::NotFound(Missing::Room(room)))?;
        r.pins += 1;
        Ok(())
    }

    pub fn unpin(&self, room: RoomId) -> Result<bool, SpatialError> {
        let mut state = self.write();
        let r = state
            .room_mut(room)
            .ok_or(SpatialError::NotFound(Missing::Room(room)))?;
        r.pins = r.pins.saturating_sub(1);
        Ok(state.try_release(room))
    }

    /// Release every unreferenced dynamic room. Returns how many went back.
    pub fn sweep(&self) -> usize {
        let mut state = self.write();
        let bound: Vec<Vnum> = state.by_coord.values().copied().collect();
        let released = bound.into_iter().filter(|&v| state.try_release(v)).count();
        if released > 0 {
            log::debug!("Swept {} idle wilderness rooms", released);
        }
        released
    }

    /// True when (x, y) has a static room, or a dynamic room something holds.
    pub fn is_claimed(&self, x: i32, y: i32) -> bool {
        self.read().is_claimed(Coord::new(x, y))
    }

    /// Nearest unclaimed coordinate to (x, y), scanning Chebyshev rings
    /// outward and, within a ring, counter-clockwise from east.
    pub fn find_nearest_free(&self, x: i32, y: i32, max_radius: i32) -> Result<Coord, SpatialError> {
        check(x, y, 0)?;
        let origin = Coord::new(x, y);
        let state = self.read();
        for r in 0..=max_radius.max(0) {
            if let Some(c) = ring(origin, r)
                .into_iter()
                .find(|c| c.is_valid() && !state.is_claimed(*c))
            {
                return Ok(c);
            }
        }
        Err(SpatialError::NotFound(Missing::Coordinate(origin)))
    }

    /// Recompute the profile of every dynamic room bound at one of `coords`.
    /// Static rooms keep their authored profile. Returns how many changed.
    pub fn reclassify<F>(&self, coords: &[Coord], describe: F) -> usize
    where
        F: Fn(Coord) -> RoomProfile,
    {
        let targets: Vec<(Coord, Vnum)> = {
            let state = self.read();
            coords
                .iter()
                .filter_map(|c| state.by_coord.get(c).map(|&v| (*c, v)))
                .collect()
        };
        let profiles: Vec<(Coord, Vnum, RoomProfile)> = targets
            .into_iter()
            .map(|(c, v)| (c, v, describe(c)))
            .collect();

        let mut state = self.write();
        let mut changed = 0;
        for (c, vnum, profile) in profiles {
            // Skip rooms that were rebound while the lock was released.
            if state.by_coord.get(&c) != Some(&vnum) {
                continue;
            }
            if let Some(room) = state.room_mut(vnum) {
                if room.profile != profile {
                    room.profile = profile;
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Every bound room, static and dynamic, ordered by vnum.
    pub fn snapshot(&self) -> Vec<WildRoom> {
        let state = self.read();
        let mut rooms: Vec<WildRoom> = state
            .statics
            .values()
            .cloned()
            .chain(state.pool.iter().flatten().cloned())
            .collect();
        rooms.sort_by_key(|r| r.vnum);
        rooms
    }

    /// Replace all bindings with `rooms`. Nothing changes on error.
    pub fn restore(&self, rooms: Vec<WildRoom>) -> Result<(), SpatialError> {
        let mut fresh = {
            let state = self.read();
            AllocatorState::new(state.pool_start, state.pool_start + self.capacity as Vnum - 1)
        };
        for room in rooms {
            check(room.coord.x, room.coord.y, 0)?;
            if fresh.lookup(room.coord).is_some() {
                return Err(SpatialError::Duplicate(Conflict::Coordinate(room.coord)));
            }
            if room.is_static {
                if fresh.statics.contains_key(&room.vnum) {
                    return Err(SpatialError::Duplicate(Conflict::Room(room.vnum)));
                }
                fresh.static_by_coord.insert(room.coord, room.vnum);
                fresh.statics.insert(room.vnum, room);
            } else {
                let slot = fresh.slot(room.vnum).ok_or(SpatialError::OutOfRange {
                    what: "dynamic room vnum",
                    value: room.vnum as i64,
                    max: (fresh.pool_start as i64) + self.capacity as i64 - 1,
                })?;
                if !fresh.free.remove(&room.vnum) {
                    return Err(SpatialError::Duplicate(Conflict::Room(room.vnum)));
                }
                fresh.by_coord.insert(room.coord, room.vnum);
                fresh.pool[slot] = Some(room);
            }
        }
        *self.write() = fresh;
        Ok(())
    }

    /// Verify that the coordinate map, the pool and the free list agree.
    pub fn check_consistency(&self) -> bool {
        let state = self.read();
        let mut ok = state.by_coord.len() + state.free.len() == self.capacity;
        for (coord, &vnum) in &state.by_coord {
            let bound_here = state
                .slot(vnum)
                .and_then(|i| state.pool[i].as_ref())
                .map(|r| r.coord == *coord)
                .unwrap_or(false);
            if !bound_here || state.free.contains(&vnum) {
                ok = false;
            }
        }
        for (coord, vnum) in &state.static_by_coord {
            if state.statics.get(vnum).map(|r| r.coord) != Some(*coord) {
                ok = false;
            }
        }
        if !ok {
            log::error!(
                "Wilderness allocator out of sync: {} bound, {} free, capacity {}",
                state.by_coord.len(),
                state.free.len(),
                self.capacity
            );
        }
        debug_assert!(ok, "wilderness allocator maps disagree");
        ok
    }
}

/// Cells at Chebyshev distance `r` from `origin`, ordered by angle from
/// east, counter-clockwise.
fn ring(origin: Coord, r: i32) -> Vec<Coord> {
    if r == 0 {
        return vec![origin];
    }
    let mut cells = Vec::with_capacity(8 * r as usize);
    for dy in -r..=r {
        for dx in -r..=r {
            if dx.abs() == r || dy.abs() == r {
                cells.push((dx, dy));
            }
        }
    }
    cells.sort_by(|a, b| angle(*a).total_cmp(&angle(*b)));
    cells
        .into_iter()
        .map(|(dx, dy)| origin.offset(dx, dy))
        .collect()
}

fn angle((dx, dy): (i32, i32)) -> f64 {
    let a = (dy as f64).atan2(dx as f64);
    if a < 0.0 {
        a + std::f64::consts::TAU
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_pool(n: i32) -> RoomAllocator {
        RoomAllocator::new(DYNAMIC_ROOM_VNUM_START, DYNAMIC_ROOM_VNUM_START + n - 1)
    }

    #[test]
    fn test_room_for_idempotent() {
        let alloc = RoomAllocator::default();
        let a = alloc.room_for(10, 20).unwrap();
        let b = alloc.room_for(10, 20).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, DYNAMIC_ROOM_VNUM_START);
        assert_eq!(alloc.bound_count(), 1);
    }

    #[test]
    fn test_coordinate_roundtrip() {
        let alloc = RoomAllocator::default();
        for &(x, y) in &[(0, 0), (-1024, 1024), (1024, -1024), (7, -3)] {
            let room = alloc.room_for(x, y).unwrap();
            assert_eq!(alloc.coordinate_for(room).unwrap(), Coord::new(x, y));
        }
    }

    #[test]
    fn test_room_for_out_of_bounds() {
        let alloc = RoomAllocator::default();
        assert_eq!(
            alloc.room_for(1025, 0),
            Err(SpatialError::OutOfBounds { x: 1025, y: 0, z: 0 })
        );
        assert_eq!(alloc.bound_count(), 0);
    }

    #[test]
    fn test_coordinate_for_unknown() {
        let alloc = RoomAllocator::default();
        assert_eq!(
            alloc.coordinate_for(42),
            Err(SpatialError::NotFound(Missing::Room(42)))
        );
    }

    #[test]
    fn test_static_rooms_win() {
        let alloc = RoomAllocator::default();
        let profile = RoomProfile {
            name: "Crossroads Inn".into(),
            sector: Sector::City,
            encounters: vec![],
        };
        alloc
            .register_static(STATIC_ROOM_VNUM_START + 5, 3, 3, profile.clone())
            .unwrap();
        assert_eq!(alloc.room_for(3, 3).unwrap(), STATIC_ROOM_VNUM_START + 5);
        assert_eq!(alloc.bound_count(), 0);
        assert_eq!(alloc.profile(STATIC_ROOM_VNUM_START + 5), Some(profile));
        assert_eq!(alloc.release(STATIC_ROOM_VNUM_START + 5), Ok(false));
    }

    #[test]
    fn test_register_static_errors() {
        let alloc = RoomAllocator::default();
        assert!(matches!(
            alloc.register_static(DYNAMIC_ROOM_VNUM_START, 0, 0, RoomProfile::default()),
            Err(SpatialError::OutOfRange { .. })
        ));
        alloc
            .register_static(STATIC_ROOM_VNUM_START, 0, 0, RoomProfile::default())
            .unwrap();
        assert_eq!(
            alloc.register_static(STATIC_ROOM_VNUM_START + 1, 0, 0, RoomProfile::default()),
            Err(SpatialError::Duplicate(Conflict::Coordinate(Coord::ORIGIN)))
        );
        assert_eq!(
            alloc.register_static(STATIC_ROOM_VNUM_START, 1, 1, RoomProfile::default()),
            Err(SpatialError::Duplicate(Conflict::Room(STATIC_ROOM_VNUM_START)))
        );
    }

    #[test]
    fn test_register_static_over_occupied_dynamic() {
        let alloc = RoomAllocator::default();
        let room = alloc.room_for(4, 4).unwrap();
        alloc.occupy(room).unwrap();
        assert!(alloc
            .register_static(STATIC_ROOM_VNUM_START, 4, 4, RoomProfile::default())
            .is_err());
        alloc.vacate(room).unwrap();
        alloc
            .register_static(STATIC_ROOM_VNUM_START, 4, 4, RoomProfile::default())
            .unwrap();
        assert_eq!(alloc.room_at(4, 4), Some(STATIC_ROOM_VNUM_START));
    }

    #[test]
    fn test_release_occupied_is_noop() {
        let alloc = RoomAllocator::default();
        let room = alloc.room_for(1, 1).unwrap();
        alloc.occupy(room).unwrap();
        assert_eq!(alloc.release(room), Ok(false));
        assert_eq!(alloc.coordinate_for(room).unwrap(), Coord::new(1, 1));

        assert_eq!(alloc.vacate(room), Ok(true));
        assert!(alloc.coordinate_for(room).is_err());
        assert_eq!(alloc.room_at(1, 1), None);
    }

    #[test]
    fn test_pin_keeps_room() {
        let alloc = RoomAllocator::default();
        let room = alloc.room_for(2, 2).unwrap();
        alloc.pin(room).unwrap();
        alloc.occupy(room).unwrap();
        assert_eq!(alloc.vacate(room), Ok(false));
        assert_eq!(alloc.sweep(), 0);
        assert_eq!(alloc.unpin(room), Ok(true));
        assert_eq!(alloc.free_count(), alloc.capacity());
    }

    #[test]
    fn test_sweep_releases_idle() {
        let alloc = RoomAllocator::default();
        let busy = alloc.room_for(0, 0).unwrap();
        alloc.occupy(busy).unwrap();
        for x in 1..=5 {
            alloc.room_for(x, 0).unwrap();
        }
        assert_eq!(alloc.sweep(), 5);
        assert_eq!(alloc.bound_count(), 1);
        assert!(alloc.check_consistency());
    }

    #[test]
    fn test_pool_exhausted() {
        let alloc = small_pool(3);
        for x in 0..3 {
            alloc.room_for(x, 0).unwrap();
        }
        assert_eq!(
            alloc.room_for(3, 0),
            Err(SpatialError::PoolExhausted { capacity: 3 })
        );
        // Existing bindings still resolve
        assert!(alloc.room_for(1, 0).is_ok());
    }

    #[test]
    fn test_released_vnum_reused_lowest_first() {
        let alloc = small_pool(4);
        let rooms: Vec<_> = (0..4).map(|x| alloc.room_for(x, 0).unwrap()).collect();
        alloc.release(rooms[2]).unwrap();
        alloc.release(rooms[1]).unwrap();
        assert_eq!(alloc.room_for(50, 50).unwrap(), rooms[1]);
    }

    #[test]
    fn test_describe_called_once() {
        let alloc = RoomAllocator::default();
        let mut calls = 0;
        alloc
            .room_for_with(5, 5, |_| {
                calls += 1;
                RoomProfile::default()
            })
            .unwrap();
        alloc
            .room_for_with(5, 5, |_| {
                calls += 1;
                RoomProfile::default()
            })
            .unwrap();
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_ring_order() {
        let cells = ring(Coord::ORIGIN, 1);
        assert_eq!(
            cells,
            vec![
                Coord::new(1, 0),
                Coord::new(1, 1),
                Coord::new(0, 1),
                Coord::new(-1, 1),
                Coord::new(-1, 0),
                Coord::new(-1, -1),
                Coord::new(0, -1),
                Coord::new(1, -1),
            ]
        );
        assert_eq!(ring(Coord::ORIGIN, 3).len(), 24);
    }

    #[test]
    fn test_find_nearest_free() {
        let alloc = RoomAllocator::default();
        assert_eq!(alloc.find_nearest_free(0, 0, 5), Ok(Coord::ORIGIN));

        let centre = alloc.room_for(0, 0).unwrap();
        // Bound but unreferenced is still free
        assert_eq!(alloc.find_nearest_free(0, 0, 5), Ok(Coord::ORIGIN));

        alloc.occupy(centre).unwrap();
        assert_eq!(alloc.find_nearest_free(0, 0, 5), Ok(Coord::new(1, 0)));

        alloc
            .register_static(STATIC_ROOM_VNUM_START, 1, 0, RoomProfile::default())
            .unwrap();
        assert_eq!(alloc.find_nearest_free(0, 0, 5), Ok(Coord::new(1, 1)));
        assert_eq!(
            alloc.find_nearest_free(0, 0, 0),
            Err(SpatialError::NotFound(Missing::Coordinate(Coord::ORIGIN)))
        );
    }

    #[test]
    fn test_find_nearest_free_skips_off_plane() {
        let alloc = RoomAllocator::default();
        let corner = alloc.room_for(1024, 1024).unwrap();
        alloc.occupy(corner).unwrap();
        // East, north-east and north are off the plane
        assert_eq!(alloc.find_nearest_free(1024, 1024, 1), Ok(Coord::new(1023, 1024)));
    }

    #[test]
    fn test_reclassify_only_bound_dynamic() {
        let alloc = RoomAllocator::default();
        let room = alloc.room_for(0, 0).unwrap();
        alloc
            .register_static(STATIC_ROOM_VNUM_START, 1, 0, RoomProfile::default())
            .unwrap();
        let river = |_: Coord| RoomProfile {
            name: "A River".into(),
            sector: Sector::River,
            encounters: vec![],
        };
        let changed = alloc.reclassify(&[Coord::new(0, 0), Coord::new(1, 0), Coord::new(2, 0)], river);
        assert_eq!(changed, 1);
        assert_eq!(alloc.profile(room).unwrap().sector, Sector::River);
        assert_eq!(alloc.profile(STATIC_ROOM_VNUM_START).unwrap().sector, Sector::Field);
        assert_eq!(alloc.room_at(2, 0), None);
    }

    #[test]
    fn test_snapshot_restore() {
        let alloc = RoomAllocator::default();
        alloc
            .register_static(STATIC_ROOM_VNUM_START, 9, 9, RoomProfile::default())
            .unwrap();
        let room = alloc.room_for(-4, 2).unwrap();
        alloc.pin(room).unwrap();

        let snap = alloc.snapshot();
        let other = RoomAllocator::default();
        other.restore(snap.clone()).unwrap();
        assert_eq!(other.snapshot(), snap);
        assert_eq!(other.room_at(-4, 2), Some(room));
        assert_eq!(other.free_count(), other.capacity() - 1);
        assert!(other.check_consistency());
    }

    #[test]
    fn test_restore_rejects_foreign_vnum() {
        let alloc = small_pool(2);
        let foreign = WildRoom {
            vnum: DYNAMIC_ROOM_VNUM_START + 10,
            coord: Coord::ORIGIN,
            profile: RoomProfile::default(),
            occupants: 0,
            pins: 0,
            is_static: false,
        };
        assert!(matches!(
            alloc.restore(vec![foreign]),
            Err(SpatialError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_concurrent_room_for_same_coordinate() {
        use std::sync::Arc;
        let alloc = Arc::new(RoomAllocator::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let alloc = Arc::clone(&alloc);
                std::thread::spawn(move || alloc.room_for(123, -45).unwrap())
            })
            .collect();
        let rooms: Vec<RoomId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(rooms.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(alloc.bound_count(), 1);
    }
}
