//! Spatial engine - the owned service object the game loop talks to.

use hecs::{EntityBuilder, World};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{Read, Write};
use std::sync::{PoisonError, RwLock, RwLockReadGuard};
use wildspace_logic::coords::{check, Coord, Direction};
use wildspace_logic::error::{FeatureId, Missing, MoveRejection, SpatialError, VesselId, Vnum};
use wildspace_logic::interior::{allocate_room_vnum, Step, MAX_VESSELS};
use wildspace_logic::sectors::{classify, temperature_at, Sector};
use wildspace_logic::vessels::{
    altitude_allowed, can_traverse, derive_class, speed_modifier_with_weather, VesselClass,
};

use crate::components::*;
use crate::config::EngineConfig;
use crate::generation::{generate_interior, generate_path};
use crate::persistence::{self, SaveError};
use crate::spatial::{Feature, FeatureKind, RegionKind, SpatialIndex};
use crate::systems::{self, Autopilot, AutopilotState, Contact, Route};
use crate::wilderness::{RoomAllocator, RoomId, RoomProfile};
use crate::world::{Heightmap, TerrainSampler};

/// What to launch with `spawn_vessel`.
#[derive(Debug, Clone)]
pub struct VesselSpec {
    pub name: String,
    /// Derived from `hull_weight` when not given.
    pub class: Option<VesselClass>,
    pub hull_weight: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub with_interior: bool,
}

impl VesselSpec {
    pub fn new(name: impl Into<String>, hull_weight: i32, x: i32, y: i32, z: i32) -> Self {
        Self {
            name: name.into(),
            class: None,
            hull_weight,
            x,
            y,
            z,
            with_interior: true,
        }
    }

    pub fn class(mut self, class: VesselClass) -> Self {
        self.class = Some(class);
        self
    }

    pub fn without_interior(mut self) -> Self {
        self.with_interior = false;
        self
    }
}

/// Result of an accepted vessel move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOutcome {
    /// Wilderness room the vessel now occupies.
    pub room: RoomId,
    pub sector: Sector,
    /// Percent of full speed over this terrain.
    pub speed: i32,
}

/// Main spatial engine
pub struct SpatialEngine {
    /// ECS world holding the vessels
    pub world: World,
    config: EngineConfig,
    terrain: Box<dyn TerrainSampler>,
    index: RwLock<SpatialIndex>,
    rooms: RoomAllocator,
    rng: StdRng,
}

impl SpatialEngine {
    /// Engine over the seeded noise heightmap.
    pub fn new(config: EngineConfig) -> Result<Self, SpatialError> {
        let terrain = Heightmap::new(config.seed, config.thresholds);
        Self::with_terrain(config, terrain)
    }

    /// Engine over any terrain source. Fails on a config that
    /// [`EngineConfig::validate`] rejects.
    pub fn with_terrain(
        config: EngineConfig,
        terrain: impl TerrainSampler + 'static,
    ) -> Result<Self, SpatialError> {
        config.validate()?;
        Ok(Self {
            world: World::new(),
            index: RwLock::new(SpatialIndex::new(config.index_cell_size)),
            rooms: RoomAllocator::new(config.dynamic_pool_start, config.dynamic_pool_end),
            rng: StdRng::seed_from_u64(config.seed),
            terrain: Box::new(terrain),
            config,
        })
    }

    /// Drop every vessel, feature and room binding.
    pub fn teardown(&mut self) {
        let vessels = self.vessel_count();
        self.world.clear();
        self.index
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.rooms = RoomAllocator::new(self.config.dynamic_pool_start, self.config.dynamic_pool_end);
        log::info!("Spatial engine torn down ({} vessels removed)", vessels);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn rooms(&self) -> &RoomAllocator {
        &self.rooms
    }

    pub fn terrain(&self) -> &dyn TerrainSampler {
        self.terrain.as_ref()
    }

    /// Shared view of the feature index.
    pub fn index(&self) -> RwLockReadGuard<'_, SpatialIndex> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    // ── World building ──────────────────────────────────────────────────

    /// Profile a room at `at` would get: base terrain, then regions in id
    /// order, then paths in id order.
    pub fn describe(&self, at: Coord) -> RoomProfile {
        describe_location(
            self.terrain.as_ref(),
            &self.index(),
            &self.config.default_room_name,
            at,
            None,
        )
    }

    /// Sector at (x, y). A bound room keeps the sector it was given.
    pub fn sector_at(&self, x: i32, y: i32) -> Result<Sector, SpatialError> {
        check(x, y, 0)?;
        if let Some(profile) = self.rooms.room_at(x, y).and_then(|r| self.rooms.profile(r)) {
            return Ok(profile.sector);
        }
        Ok(self.describe(Coord::new(x, y)).sector)
    }

    /// Insert or replace a region or path, then refresh bound rooms under
    /// both the old and new shape.
    pub fn insert_feature(&self, feature: Feature) -> Result<Option<Feature>, SpatialError> {
        let replaced = self
            .index
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(feature.clone())?;
        let mut touched = vec![&feature];
        touched.extend(replaced.as_ref());
        self.reclassify_under(&touched);
        Ok(replaced)
    }

    pub fn remove_feature(&self, id: FeatureId) -> Option<Feature> {
        let removed = self
            .index
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)?;
        self.reclassify_under(&[&removed]);
        Some(removed)
    }

    pub fn feature(&self, id: FeatureId) -> Option<Feature> {
        self.index().get(id).cloned()
    }

    /// Ids of features containing (x, y).
    pub fn query_features(&self, x: i32, y: i32) -> Vec<FeatureId> {
        self.index().enclosing(x, y)
    }

    /// Ids of features within `radius` of (x, y), nearest first.
    pub fn query_features_radius(
        &self,
        x: i32,
        y: i32,
        radius: f64,
    ) -> Vec<FeatureId> {
        self.index().nearby(x, y, radius)
    }

    /// Carve a river from `start` and add it to the index. Rooms already
    /// bound along the old and new course are reclassified; vessels stay put.
    pub fn generate_terrain(
        &mut self,
        start: Coord,
        direction: Direction,
        feature_id: FeatureId,
        name: &str,
    ) -> Result<Feature, SpatialError> {
        let (feature, previous) = {
            let mut index = self.index.write().unwrap_or_else(PoisonError::into_inner);
            let previous = index.get(feature_id).filter(|f| f.is_path()).cloned();
            let terrain = self.terrain.as_ref();
            let rooms = &self.rooms;
            let feature = generate_path(
                &mut index,
                terrain,
                |index, at| river_sector(terrain, index, rooms, feature_id, at),
                start,
                direction,
                feature_id,
                name,
                &mut self.rng,
                &self.config.river,
            )?;
            (feature, previous)
        };
        let mut touched = vec![&feature];
        touched.extend(previous.as_ref());
        self.reclassify_under(&touched);
        Ok(feature)
    }

    fn reclassify_under(&self, features: &[&Feature]) -> usize {
        let coords: Vec<Coord> = self
            .rooms
            .bound_coords()
            .into_iter()
            .filter(|c| features.iter().any(|f| f.contains(*c)))
            .collect();
        if coords.is_empty() {
            return 0;
        }
        let changed = self.rooms.reclassify(&coords, |at| self.describe(at));
        if changed > 0 {
            log::debug!("Reclassified {} wilderness rooms", changed);
        }
        changed
    }

    // ── Rooms ───────────────────────────────────────────────────────────

    /// Room at (x, y), binding one from the pool if none is there yet.
    pub fn allocate_or_get_room(&self, x: i32, y: i32) -> Result<RoomId, SpatialError> {
        self.rooms.room_for_with(x, y, |at| self.describe(at))
    }

    pub fn room_coordinate(&self, room: RoomId) -> Result<Coord, SpatialError> {
        self.rooms.coordinate_for(room)
    }

    pub fn room_profile(&self, room: RoomId) -> Option<RoomProfile> {
        self.rooms.profile(room)
    }

    pub fn register_static_room(
        &self,
        vnum: RoomId,
        x: i32,
        y: i32,
        profile: RoomProfile,
    ) -> Result<(), SpatialError> {
        self.rooms.register_static(vnum, x, y, profile)
    }

    pub fn release_room(&self, room: RoomId) -> Result<bool, SpatialError> {
        self.rooms.release(room)
    }

    pub fn sweep_rooms(&self) -> usize {
        self.rooms.sweep()
    }

    pub fn find_nearest_free(&self, x: i32, y: i32, max_radius: i32) -> Result<Coord, SpatialError> {
        self.rooms.find_nearest_free(x, y, max_radius)
    }

    // ── Vessels ─────────────────────────────────────────────────────────

    /// Launch a vessel. It must be able to sit where it is placed.
    pub fn spawn_vessel(&mut self, spec: VesselSpec) -> Result<VesselId, SpatialError> {
        check(spec.x, spec.y, spec.z)?;
        let class = spec.class.unwrap_or_else(|| derive_class(spec.hull_weight));
        altitude_allowed(class, spec.z)?;
        let sector = self.sector_at(spec.x, spec.y)?;
        if !can_traverse(class, sector, spec.z) {
            return Err(MoveRejection::Terrain { sector }.into());
        }

        let max_vessels = self.config.max_vessels.min(MAX_VESSELS);
        let id = systems::next_free_vessel_id(&self.world, max_vessels).ok_or(
            SpatialError::OutOfRange {
                what: "vessel count",
                value: max_vessels as i64,
                max: max_vessels as i64 - 1,
            },
        )?;

        let interior = if spec.with_interior {
            Some(generate_interior(
                id,
                class,
                &mut self.rng,
                self.config.discovery_chance,
            )?)
        } else {
            None
        };

        let room = self.allocate_or_get_room(spec.x, spec.y)?;
        self.rooms.occupy(room)?;

        let mut builder = EntityBuilder::new();
        builder
            .add(Vessel {
                id,
                name: spec.name.clone(),
                class,
                hull_weight: spec.hull_weight,
            })
            .add(VesselPosition::at_grid(spec.x, spec.y, spec.z))
            .add(WildernessBinding { room: Some(room) });
        if let Some(interior) = interior {
            builder.add(interior);
        }
        self.world.spawn(builder.build());

        log::info!(
            "Launched {} '{}' ({}) at ({}, {}, {})",
            class,
            spec.name,
            id,
            spec.x,
            spec.y,
            spec.z
        );
        Ok(id)
    }

    /// Remove a vessel, casting off and leaving its wilderness room.
    pub fn destroy_vessel(&mut self, id: VesselId) -> Result<(), SpatialError> {
        let entity = systems::require_vessel(&self.world, id)?;
        systems::undock(&mut self.world, id)?;
        let room = self
            .world
            .get::<&WildernessBinding>(entity)
            .ok()
            .and_then(|b| b.room);
        if let Some(room) = room {
            self.vacate_logged(room);
        }
        self.world
            .despawn(entity)
            .map_err(|_| SpatialError::NotFound(Missing::Vessel(id)))?;
        log::info!("{} destroyed", id);
        Ok(())
    }

    /// Move one square in a compass direction, or one unit up or down.
    pub fn move_vessel_direction(
        &mut self,
        id: VesselId,
        direction: Direction,
    ) -> Result<MoveOutcome, SpatialError> {
        let from = systems::position_of(&self.world, id)?;
        let here = from.coord();
        let z = from.altitude();
        let (x, y, z) = match direction.plane_offset() {
            Some((dx, dy)) => (here.x + dx, here.y + dy, z),
            None if direction == Direction::Up => (here.x, here.y, z + 1),
            None => (here.x, here.y, z - 1),
        };
        self.move_vessel(id, x, y, z)
    }

    /// Move a vessel in calm weather.
    pub fn move_vessel(
        &mut self,
        id: VesselId,
        x: i32,
        y: i32,
        z: i32,
    ) -> Result<MoveOutcome, SpatialError> {
        self.move_vessel_in_weather(id, x, y, z, 0)
    }

    /// Move a vessel to (x, y, z). Every check runs before anything changes;
    /// a rejected move leaves position, room binding and occupancy as they were.
    pub fn move_vessel_in_weather(
        &mut self,
        id: VesselId,
        x: i32,
        y: i32,
        z: i32,
        weather: i32,
    ) -> Result<MoveOutcome, SpatialError> {
        check(x, y, z)?;
        let entity = systems::require_vessel(&self.world, id)?;
        if systems::docked_to(&self.world, id).is_some() {
            return Err(MoveRejection::Docked.into());
        }

        let class = self
            .world
            .get::<&Vessel>(entity)
            .map(|v| v.class)
            .map_err(|_| SpatialError::NotFound(Missing::Vessel(id)))?;
        let from = systems::position_of(&self.world, id)?;

        if let Err(reason) = altitude_allowed(class, z) {
            log::warn!("{} ({}) refused altitude {}: {}", id, class, z, reason);
            return Err(reason.into());
        }
        let sector = self.sector_at(x, y)?;
        if !can_traverse(class, sector, z) {
            log::warn!(
                "{} ({}) cannot enter {} at ({}, {}, {})",
                id,
                class,
                sector.name(),
                x,
                y,
                z
            );
            return Err(MoveRejection::Terrain { sector }.into());
        }

        let room = self.allocate_or_get_room(x, y)?;
        let previous = self
            .world
            .get::<&WildernessBinding>(entity)
            .ok()
            .and_then(|b| b.room);
        if previous != Some(room) {
            self.rooms.occupy(room)?;
            if let Some(old) = previous {
                self.vacate_logged(old);
            }
        }

        let speed = speed_modifier_with_weather(class, sector, weather);
        let heading = heading_between(&from, x, y, z).unwrap_or(from.heading);
        if let Ok(mut pos) = self.world.get::<&mut VesselPosition>(entity) {
            *pos = VesselPosition {
                heading,
                speed,
                ..VesselPosition::at_grid(x, y, z)
            };
        }
        if let Ok(mut binding) = self.world.get::<&mut WildernessBinding>(entity) {
            binding.room = Some(room);
        }

        Ok(MoveOutcome { room, sector, speed })
    }

    fn vacate_logged(&self, room: RoomId) {
        if let Err(e) = self.rooms.vacate(room) {
            log::error!("Vacating room {} failed: {}", room, e);
        }
    }

    /// Vnum of room `room_index` of vessel `vessel_id`, whether or not the
    /// vessel exists.
    pub fn vessel_room_vnum(&self, vessel_id: i64, room_index: i64) -> Result<Vnum, SpatialError> {
        let max_vessels = self.config.max_vessels.min(MAX_VESSELS) as i64;
        if vessel_id >= max_vessels {
            return Err(SpatialError::OutOfRange {
                what: "vessel_id",
                value: vessel_id,
                max: max_vessels - 1,
            });
        }
        allocate_room_vnum(vessel_id, room_index)
    }

    pub fn vessel_has_interior(&self, id: VesselId) -> bool {
        systems::find_vessel(&self.world, id)
            .and_then(|e| self.world.get::<&Interior>(e).ok().map(|i| i.has_interior()))
            .unwrap_or(false)
    }

    pub fn vessel(&self, id: VesselId) -> Option<Vessel> {
        let entity = systems::find_vessel(&self.world, id)?;
        self.world.get::<&Vessel>(entity).ok().map(|v| (*v).clone())
    }

    pub fn vessel_count(&self) -> usize {
        self.world.query::<&Vessel>().iter().count()
    }

    pub fn vessel_position(&self, id: VesselId) -> Result<VesselPosition, SpatialError> {
        systems::position_of(&self.world, id)
    }

    /// Wilderness room the vessel occupies.
    pub fn vessel_room(&self, id: VesselId) -> Option<RoomId> {
        let entity = systems::find_vessel(&self.world, id)?;
        self.world.get::<&WildernessBinding>(entity).ok()?.room
    }

    pub fn interior(&self, id: VesselId) -> Option<Interior> {
        let entity = systems::find_vessel(&self.world, id)?;
        self.world.get::<&Interior>(entity).ok().map(|i| (*i).clone())
    }

    pub fn dock_vessels(&mut self, a: VesselId, b: VesselId) -> Result<(), SpatialError> {
        systems::dock(&mut self.world, a, b)
    }

    pub fn undock_vessel(&mut self, id: VesselId) -> Result<Option<VesselId>, SpatialError> {
        systems::undock(&mut self.world, id)
    }

    /// Other vessels within lookout range, nearest first.
    pub fn contacts(&self, id: VesselId) -> Result<Vec<Contact>, SpatialError> {
        systems::contacts(&self.world, id, systems::CONTACT_RANGE)
    }

    pub fn contacts_within(&self, id: VesselId, range: f32) -> Result<Vec<Contact>, SpatialError> {
        systems::contacts(&self.world, id, range)
    }

    // ── Autopilot ───────────────────────────────────────────────────────

    /// Hand a vessel to the autopilot, replacing any route it was flying.
    pub fn start_autopilot(&mut self, id: VesselId, route: Route) -> Result<(), SpatialError> {
        let entity = systems::require_vessel(&self.world, id)?;
        let pilot = Autopilot::new(route)?;
        log::info!(
            "{} engaged autopilot on route '{}' ({} waypoints)",
            id,
            pilot.route.name,
            pilot.route.waypoints.len()
        );
        self.world
            .insert_one(entity, pilot)
            .map_err(|_| SpatialError::NotFound(Missing::Vessel(id)))
    }

    /// Take the helm back. Returns the autopilot that was engaged, if any.
    pub fn stop_autopilot(&mut self, id: VesselId) -> Result<Option<Autopilot>, SpatialError> {
        let entity = systems::require_vessel(&self.world, id)?;
        let removed = self.world.remove_one::<Autopilot>(entity).ok();
        if removed.is_some() {
            log::info!("{} autopilot disengaged", id);
        }
        Ok(removed)
    }

    pub fn pause_autopilot(&mut self, id: VesselId) -> Result<bool, SpatialError> {
        self.with_autopilot(id, Autopilot::pause)
    }

    pub fn resume_autopilot(&mut self, id: VesselId) -> Result<bool, SpatialError> {
        self.with_autopilot(id, Autopilot::resume)
    }

    pub fn autopilot(&self, id: VesselId) -> Option<Autopilot> {
        let entity = systems::find_vessel(&self.world, id)?;
        self.world.get::<&Autopilot>(entity).ok().map(|p| (*p).clone())
    }

    fn with_autopilot(
        &mut self,
        id: VesselId,
        change: impl FnOnce(&mut Autopilot) -> bool,
    ) -> Result<bool, SpatialError> {
        let entity = systems::require_vessel(&self.world, id)?;
        let changed = self
            .world
            .get::<&mut Autopilot>(entity)
            .map(|mut pilot| change(&mut *pilot))
            .unwrap_or(false);
        Ok(changed)
    }

    /// Run every engaged autopilot for one tick, in vessel id order. A
    /// traveling vessel that has arrived starts its wait or turns for the
    /// next waypoint; otherwise it moves one square toward the current one.
    /// Returns how many autopilots are still traveling, waiting or paused.
    pub fn autopilot_tick(&mut self) -> usize {
        let mut engaged: Vec<(VesselId, hecs::Entity)> = self
            .world
            .query::<(&Vessel, &Autopilot)>()
            .iter()
            .map(|(entity, (v, _))| (v.id, entity))
            .collect();
        engaged.sort_by_key(|(id, _)| *id);

        let mut active = 0;
        for (id, entity) in engaged {
            let Some(mut pilot) = self.world.get::<&Autopilot>(entity).ok().map(|p| (*p).clone())
            else {
                continue;
            };
            match pilot.state {
                AutopilotState::Traveling => self.steer(id, &mut pilot),
                AutopilotState::Waiting => pilot.wait_tick(),
                AutopilotState::Paused | AutopilotState::Complete => {}
            }
            if pilot.is_active() {
                active += 1;
            }
            if let Ok(mut slot) = self.world.get::<&mut Autopilot>(entity) {
                *slot = pilot;
            }
        }
        active
    }

    fn steer(&mut self, id: VesselId, pilot: &mut Autopilot) {
        let Ok(position) = systems::position_of(&self.world, id) else {
            return;
        };
        let Some(waypoint) = pilot.current() else {
            pilot.state = AutopilotState::Complete;
            return;
        };
        if systems::arrived(&position, waypoint) {
            log::debug!("{} reached waypoint '{}'", id, waypoint.name);
            pilot.arrive();
            return;
        }
        let Some((x, y, z)) = systems::next_step(&position, waypoint) else {
            pilot.arrive();
            return;
        };
        if let Err(e) = self.move_vessel(id, x, y, z) {
            let at = position.coord();
            log::info!("{} autopilot held at ({}, {}): {}", id, at.x, at.y, e);
        }
    }

    // ── Interior frame ──────────────────────────────────────────────────

    /// Room a boarding character lands in.
    pub fn board_vessel(&self, id: VesselId) -> Result<Vnum, SpatialError> {
        let entity = systems::require_vessel(&self.world, id)?;
        self.world
            .get::<&Interior>(entity)
            .ok()
            .filter(|i| i.has_interior())
            .map(|i| i.entrance)
            .ok_or(SpatialError::NotFound(Missing::Interior(id)))
    }

    /// Wilderness room under the vessel, bound if it was not already.
    pub fn disembark_vessel(&self, id: VesselId) -> Result<RoomId, SpatialError> {
        if let Some(room) = self.vessel_room(id) {
            return Ok(room);
        }
        let at = systems::position_of(&self.world, id)?.coord();
        self.allocate_or_get_room(at.x, at.y)
    }

    /// Follow an interior passage. Locked passages refuse.
    pub fn interior_exit(&self, room: Vnum, direction: Direction) -> Result<Vnum, SpatialError> {
        let (_, entity) = systems::interior_owner(&self.world, room)?;
        let interior = self
            .world
            .get::<&Interior>(entity)
            .map_err(|_| SpatialError::NotFound(Missing::Room(room)))?;
        let exit = interior
            .exit(room, direction)
            .ok_or(SpatialError::NotFound(Missing::Exit { room, direction }))?;
        if exit.is_locked {
            return Err(MoveRejection::Locked { room, direction }.into());
        }
        Ok(exit.to_room)
    }

    /// Shortest unlocked route between two rooms of the same vessel.
    pub fn interior_path(&self, from: Vnum, to: Vnum) -> Result<Vec<Step>, SpatialError> {
        let (owner, entity) = systems::interior_owner(&self.world, from)?;
        let (target_owner, _) = systems::interior_owner(&self.world, to)?;
        if owner != target_owner {
            return Err(SpatialError::NotFound(Missing::Room(to)));
        }
        let interior = self
            .world
            .get::<&Interior>(entity)
            .map_err(|_| SpatialError::NotFound(Missing::Interior(owner)))?;
        interior
            .find_path(from, to)
            .ok_or(SpatialError::NotFound(Missing::Room(to)))
    }

    pub fn set_passage_locked(
        &mut self,
        room: Vnum,
        direction: Direction,
        locked: bool,
    ) -> Result<(), SpatialError> {
        let (_, entity) = systems::interior_owner(&self.world, room)?;
        let mut interior = self
            .world
            .get::<&mut Interior>(entity)
            .map_err(|_| SpatialError::NotFound(Missing::Room(room)))?;
        interior.set_locked(room, direction, locked)
    }

    pub fn interior_room_name(&self, room: Vnum) -> Result<String, SpatialError> {
        let (_, entity) = systems::interior_owner(&self.world, room)?;
        let vessel_name = self
            .world
            .get::<&Vessel>(entity)
            .map(|v| v.name.clone())
            .map_err(|_| SpatialError::NotFound(Missing::Room(room)))?;
        self.world
            .get::<&Interior>(entity)
            .ok()
            .and_then(|i| i.room_name(room, &vessel_name))
            .ok_or(SpatialError::NotFound(Missing::Room(room)))
    }

    /// Plane coordinates of an interior room: wherever its vessel is.
    pub fn interior_room_coordinates(&self, room: Vnum) -> Result<(i32, i32, i32), SpatialError> {
        systems::interior_room_coordinates(&self.world, room)
    }

    // ── Persistence ─────────────────────────────────────────────────────

    /// Save room bindings, features and vessels
    pub fn save<W: Write>(&self, writer: W) -> Result<(), SaveError> {
        persistence::save_world(
            writer,
            self.config.seed,
            &self.rooms,
            &self.index(),
            &self.world,
        )
    }

    /// Replace the engine state with a saved one. The engine is unchanged
    /// if the save cannot be read or restored.
    pub fn load<R: Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let loaded = persistence::load_world(reader)?;
        if loaded.seed != self.config.seed {
            log::warn!(
                "Save was made with seed {} but the engine runs seed {}; base terrain will differ",
                loaded.seed,
                self.config.seed
            );
        }

        let mut index = SpatialIndex::new(self.config.index_cell_size);
        index.rebuild(loaded.features)?;
        let rooms = RoomAllocator::new(self.config.dynamic_pool_start, self.config.dynamic_pool_end);
        rooms.restore(loaded.rooms)?;

        *self.index.get_mut().unwrap_or_else(PoisonError::into_inner) = index;
        self.rooms = rooms;
        self.world = loaded.world;
        log::info!(
            "Loaded {} vessels and {} wilderness rooms",
            self.vessel_count(),
            self.rooms.bound_count() + self.rooms.static_count()
        );
        Ok(())
    }
}

/// Profile for a coordinate from base terrain and the features over it.
fn describe_location(
    terrain: &dyn TerrainSampler,
    index: &SpatialIndex,
    default_name: &str,
    at: Coord,
    skip: Option<FeatureId>,
) -> RoomProfile {
    let mut name = default_name.to_string();
    let mut forced = None;
    let mut shift = 0;
    let mut encounters = Vec::new();

    for region in index.regions_at(at.x, at.y) {
        if Some(region.id) == skip {
            continue;
        }
        if let FeatureKind::Region(kind) = region.kind {
            match kind {
                RegionKind::Geographic => name = region.name.clone(),
                RegionKind::Sector(sector) => forced = Some(sector),
                RegionKind::SectorTransform(delta) => shift += delta,
                RegionKind::Encounter => encounters.push(region.name.clone()),
            }
        }
    }

    let base = if shift == 0 {
        terrain.base_sector(at)
    } else {
        let thresholds = terrain.thresholds();
        let elevation = (terrain.elevation(at) + shift).clamp(0, 255);
        classify(
            elevation,
            temperature_at(at.y, elevation, thresholds.waterline),
            terrain.moisture(at),
            thresholds,
        )
    };
    let mut sector = forced.unwrap_or(base);

    for path in index.paths_at(at.x, at.y).into_iter().filter(|p| Some(p.id) != skip) {
        if let FeatureKind::Path { sector: s, .. } = path.kind {
            name = path.name.clone();
            sector = s;
        }
    }

    RoomProfile {
        name,
        sector,
        encounters,
    }
}

/// Sector a river being carved sees at `at`. Static rooms keep their
/// authored sector; the course being replaced is ignored.
fn river_sector(
    terrain: &dyn TerrainSampler,
    index: &SpatialIndex,
    rooms: &RoomAllocator,
    replacing: FeatureId,
    at: Coord,
) -> Sector {
    let fixed = rooms
        .room_at(at.x, at.y)
        .and_then(|r| rooms.room(r))
        .filter(|r| r.is_static);
    match fixed {
        Some(room) => room.profile.sector,
        None => describe_location(terrain, index, "", at, Some(replacing)).sector,
    }
}

/// Compass heading of a move, or Up/Down for a pure altitude change.
fn heading_between(from: &VesselPosition, x: i32, y: i32, z: i32) -> Option<Direction> {
    let here = from.coord();
    let dx = (x - here.x).signum();
    let dy = (y - here.y).signum();
    let heading = match (dx, dy) {
        (0, 1) => Direction::North,
        (1, 1) => Direction::NorthEast,
        (1, 0) => Direction::East,
        (1, -1) => Direction::SouthEast,
        (0, -1) => Direction::South,
        (-1, -1) => Direction::SouthWest,
        (-1, 0) => Direction::West,
        (-1, 1) => Direction::NorthWest,
        _ => match (z - from.altitude()).signum() {
            1 => Direction::Up,
            -1 => Direction::Down,
            _ => return None,
        },
    };
    Some(heading)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{PathKind, Shape};
    use crate::systems::Waypoint;
    use crate::world::FlatTerrain;

    fn field_engine() -> SpatialEngine {
        SpatialEngine::with_terrain(EngineConfig::default(), FlatTerrain::field()).unwrap()
    }

    fn circle(id: u32, name: &str, kind: RegionKind, x: i32, y: i32, r: f64) -> Feature {
        Feature::region(
            FeatureId(id),
            name,
            kind,
            Shape::Circle {
                center: Coord::new(x, y),
                radius: r,
            },
        )
    }

    #[test]
    fn test_describe_layers() {
        let engine = field_engine();
        engine
            .insert_feature(circle(1, "Greenvale", RegionKind::Geographic, 0, 0, 10.0))
            .unwrap();
        engine
            .insert_feature(circle(2, "Swamp", RegionKind::Sector(Sector::Marshland), 0, 0, 3.0))
            .unwrap();
        engine
            .insert_feature(circle(3, "Wolves", RegionKind::Encounter, 0, 0, 5.0))
            .unwrap();
        engine
            .insert_feature(Feature::path(
                FeatureId(4),
                "King's Road",
                PathKind::Road,
                vec![Coord::new(-10, 8), Coord::new(10, 8)],
                1.0,
            ))
            .unwrap();

        let centre = engine.describe(Coord::ORIGIN);
        assert_eq!(centre.name, "Greenvale");
        assert_eq!(centre.sector, Sector::Marshland);
        assert_eq!(centre.encounters, vec!["Wolves".to_string()]);

        let road = engine.describe(Coord::new(0, 8));
        assert_eq!(road.name, "King's Road");
        assert_eq!(road.sector, Sector::RoadIntersection);

        let outside = engine.describe(Coord::new(50, 50));
        assert_eq!(outside.name, "The Wilderness");
        assert_eq!(outside.sector, Sector::Field);
    }

    #[test]
    fn test_sector_transform_sinks_land() {
        let engine = field_engine();
        engine
            .insert_feature(circle(1, "Sunken Bowl", RegionKind::SectorTransform(-100), 0, 0, 4.0))
            .unwrap();
        assert!(engine.sector_at(0, 0).unwrap().is_water());
        assert_eq!(engine.sector_at(20, 0).unwrap(), Sector::Field);
    }

    #[test]
    fn test_insert_feature_reclassifies_bound_rooms() {
        let engine = field_engine();
        let room = engine.allocate_or_get_room(1, 1).unwrap();
        assert_eq!(engine.room_profile(room).unwrap().sector, Sector::Field);

        engine
            .insert_feature(circle(9, "Lake", RegionKind::Sector(Sector::WaterSwim), 0, 0, 5.0))
            .unwrap();
        assert_eq!(engine.room_profile(room).unwrap().sector, Sector::WaterSwim);

        engine.remove_feature(FeatureId(9)).unwrap();
        assert_eq!(engine.room_profile(room).unwrap().sector, Sector::Field);
    }

    #[test]
    fn test_allocate_out_of_bounds() {
        let engine = field_engine();
        assert_eq!(
            engine.allocate_or_get_room(0, -1025),
            Err(SpatialError::OutOfBounds { x: 0, y: -1025, z: 0 })
        );
    }

    #[test]
    fn test_heading_between() {
        let from = VesselPosition::at_grid(0, 0, 0);
        assert_eq!(heading_between(&from, 3, 0, 0), Some(Direction::East));
        assert_eq!(heading_between(&from, -2, 5, 0), Some(Direction::NorthWest));
        assert_eq!(heading_between(&from, 0, 0, 30), Some(Direction::Up));
        assert_eq!(heading_between(&from, 0, 0, 0), None);
    }

    #[test]
    fn test_spawn_rejects_bad_placement() {
        let mut engine = field_engine();
        // Boats do not sail across fields
        assert_eq!(
            engine.spawn_vessel(VesselSpec::new("Dinghy", 100, 0, 0, 0)),
            Err(SpatialError::Rejected(MoveRejection::Terrain {
                sector: Sector::Field
            }))
        );
        assert_eq!(
            engine.spawn_vessel(VesselSpec::new("Kite", 100, 0, 0, 20)),
            Err(SpatialError::Rejected(MoveRejection::Altitude { z: 20, max: 0 }))
        );
        assert_eq!(engine.vessel_count(), 0);
        assert_eq!(engine.rooms().bound_count(), 0);
    }

    #[test]
    fn test_vessel_room_vnum() {
        let engine = field_engine();
        assert_eq!(engine.vessel_room_vnum(0, 0), Ok(70000));
        assert_eq!(engine.vessel_room_vnum(3, 7), Ok(70067));
        assert_eq!(engine.vessel_room_vnum(499, 19), Ok(79999));
        assert!(engine.vessel_room_vnum(500, 0).is_err());
        assert!(engine.vessel_room_vnum(0, 20).is_err());
        assert!(engine.vessel_room_vnum(-1, 0).is_err());
    }

    #[test]
    fn test_teardown() {
        let mut engine = SpatialEngine::with_terrain(EngineConfig::default(), FlatTerrain::ocean()).unwrap();
        engine
            .spawn_vessel(VesselSpec::new("Cog", 200, 5, 5, 0))
            .unwrap();
        engine
            .insert_feature(circle(1, "Reef", RegionKind::Encounter, 0, 0, 2.0))
            .unwrap();
        engine.teardown();
        assert_eq!(engine.vessel_count(), 0);
        assert!(engine.index().is_empty());
        assert_eq!(engine.rooms().bound_count(), 0);
    }

    fn open_water() -> SpatialEngine {
        SpatialEngine::with_terrain(EngineConfig::default(), FlatTerrain::ocean()).unwrap()
    }

    #[test]
    fn test_move_vessel_direction() {
        let mut engine = open_water();
        let sub = engine
            .spawn_vessel(VesselSpec::new("Nautilus", 300, 0, 0, 0).class(VesselClass::Submarine))
            .unwrap();

        engine.move_vessel_direction(sub, Direction::NorthEast).unwrap();
        let pos = engine.vessel_position(sub).unwrap();
        assert_eq!((pos.coord(), pos.heading), (Coord::new(1, 1), Direction::NorthEast));

        engine.move_vessel_direction(sub, Direction::Down).unwrap();
        let pos = engine.vessel_position(sub).unwrap();
        assert_eq!((pos.coord(), pos.altitude()), (Coord::new(1, 1), -1));
        assert_eq!(pos.heading, Direction::Down);

        // Surface vessels cannot climb
        let cog = engine.spawn_vessel(VesselSpec::new("Cog", 200, 5, 5, 0)).unwrap();
        assert_eq!(
            engine.move_vessel_direction(cog, Direction::Up),
            Err(SpatialError::Rejected(MoveRejection::Altitude { z: 1, max: 0 }))
        );
        assert_eq!(engine.vessel_position(cog).unwrap().altitude(), 0);
    }

    #[test]
    fn test_move_direction_off_the_plane() {
        let mut engine = open_water();
        let cog = engine
            .spawn_vessel(VesselSpec::new("Cog", 200, 1024, 0, 0))
            .unwrap();
        let room = engine.vessel_room(cog);
        assert_eq!(
            engine.move_vessel_direction(cog, Direction::East),
            Err(SpatialError::OutOfBounds { x: 1025, y: 0, z: 0 })
        );
        assert_eq!(engine.vessel_room(cog), room);
    }

    #[test]
    fn test_contacts_through_engine() {
        let mut engine = open_water();
        let a = engine.spawn_vessel(VesselSpec::new("Ketch", 200, 0, 0, 0)).unwrap();
        let b = engine.spawn_vessel(VesselSpec::new("Yawl", 200, -10, 0, 0)).unwrap();
        engine.spawn_vessel(VesselSpec::new("Far", 200, 100, 0, 0)).unwrap();

        let seen = engine.contacts(a).unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!((seen[0].id, seen[0].bearing, seen[0].range), (b, 270, 10.0));
        assert_eq!(engine.contacts_within(a, 200.0).unwrap().len(), 2);
    }

    #[test]
    fn test_autopilot_follows_route() {
        let mut engine = open_water();
        let cog = engine.spawn_vessel(VesselSpec::new("Cog", 200, 0, 0, 0)).unwrap();
        let mut route = Route::new("Run");
        route
            .add_waypoint(Waypoint::new("Buoy", 4, 0, 0).tolerance(0.5).wait(1))
            .unwrap();
        route
            .add_waypoint(Waypoint::new("Pier", 4, -2, 0).tolerance(0.5))
            .unwrap();
        engine.start_autopilot(cog, route).unwrap();

        for _ in 0..4 {
            assert_eq!(engine.autopilot_tick(), 1);
        }
        assert_eq!(engine.vessel_position(cog).unwrap().coord(), Coord::new(4, 0));

        // Arrive, wait one tick, then two squares south
        engine.autopilot_tick();
        assert_eq!(engine.autopilot(cog).unwrap().state, AutopilotState::Waiting);
        engine.autopilot_tick();
        assert_eq!(engine.autopilot(cog).unwrap().waypoint, 1);
        engine.autopilot_tick();
        engine.autopilot_tick();
        assert_eq!(engine.vessel_position(cog).unwrap().coord(), Coord::new(4, -2));
        assert_eq!(engine.autopilot_tick(), 0);
        assert_eq!(engine.autopilot(cog).unwrap().state, AutopilotState::Complete);

        assert!(engine.stop_autopilot(cog).unwrap().is_some());
        assert_eq!(engine.stop_autopilot(cog), Ok(None));
    }

    #[test]
    fn test_autopilot_pause_and_blocked_course() {
        let mut engine =
            SpatialEngine::with_terrain(EngineConfig::default(), FlatTerrain::field().with_shore(0))
                .unwrap();
        let cog = engine.spawn_vessel(VesselSpec::new("Cog", 200, 2, 0, 0)).unwrap();
        let mut route = Route::new("Inland");
        route.add_waypoint(Waypoint::new("Farm", -6, 0, 0)).unwrap();
        engine.start_autopilot(cog, route).unwrap();

        assert_eq!(engine.pause_autopilot(cog), Ok(true));
        engine.autopilot_tick();
        assert_eq!(engine.vessel_position(cog).unwrap().coord(), Coord::new(2, 0));
        assert_eq!(engine.resume_autopilot(cog), Ok(true));

        // Two squares west, then the shore holds it
        for _ in 0..4 {
            engine.autopilot_tick();
        }
        assert_eq!(engine.vessel_position(cog).unwrap().coord(), Coord::new(0, 0));
        assert_eq!(engine.autopilot(cog).unwrap().state, AutopilotState::Traveling);

        assert_eq!(
            engine.pause_autopilot(VesselId(9)),
            Err(SpatialError::NotFound(Missing::Vessel(VesselId(9))))
        );
    }
}
