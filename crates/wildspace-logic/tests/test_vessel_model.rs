//! Integration tests for the vessel terrain model and interior addressing.
//!
//! Exercises: bounds → sector classification → class capabilities
//! → speed with weather → interior vnums → hand-built interior graphs
//!
//! All tests are pure logic; no engine, no allocator.

use wildspace_logic::coords::{check, validate, Coord, Direction};
use wildspace_logic::error::{MoveRejection, SpatialError, VesselId};
use wildspace_logic::interior::{
    allocate_room_vnum, is_interior_vnum, validate_interior, vessel_for_vnum, Interior,
    ShipRoomType, INTERIOR_VNUM_BASE, INTERIOR_VNUM_MAX, MAX_ROOMS_PER_VESSEL, MAX_VESSELS,
};
use wildspace_logic::sectors::{classify, Sector, Thresholds};
use wildspace_logic::vessels::{
    altitude_allowed, can_traverse, derive_class, rooms_for_class, speed_modifier,
    speed_modifier_with_weather, VesselClass,
};

// ── Helpers ────────────────────────────────────────────────────────────

/// Bridge, then a corridor east with quarters beyond, then cargo below.
fn small_ship() -> Interior {
    let mut interior = Interior::new(VesselId(7));
    let bridge = interior.add_room(ShipRoomType::Bridge).unwrap();
    let corridor = interior.add_room(ShipRoomType::Corridor).unwrap();
    let quarters = interior.add_room(ShipRoomType::Quarters).unwrap();
    let cargo = interior.add_room(ShipRoomType::Cargo).unwrap();
    interior.assign_entrance();
    interior
        .connect_both(bridge, corridor, Direction::East, false)
        .unwrap();
    interior
        .connect_both(corridor, quarters, Direction::East, false)
        .unwrap();
    interior
        .connect_both(corridor, cargo, Direction::Down, true)
        .unwrap();
    interior
}

// ── Bounds ─────────────────────────────────────────────────────────────

#[test]
fn bounds_are_closed_on_every_axis() {
    assert!(validate(1024, -1024, 500));
    assert!(validate(-1024, 1024, -500));
    assert!(!validate(1025, 0, 0));
    assert!(!validate(0, -1025, 0));
    assert!(!validate(0, 0, 501));
    assert_eq!(
        check(0, 0, -501),
        Err(SpatialError::OutOfBounds { x: 0, y: 0, z: -501 })
    );
}

#[test]
fn directions_reverse_in_pairs() {
    for dir in Direction::ALL {
        assert_eq!(dir.reverse().reverse(), dir);
        if let Some((dx, dy)) = dir.plane_offset() {
            let back = dir.reverse().plane_offset().unwrap();
            assert_eq!((dx + back.0, dy + back.1), (0, 0), "{}", dir);
        }
    }
    assert_eq!(Coord::ORIGIN.step(Direction::Up), None);
}

// ── Terrain model ──────────────────────────────────────────────────────

#[test]
fn water_ladder_by_elevation() {
    let t = Thresholds::default();
    assert_eq!(classify(10, 20, 100, &t), Sector::Ocean);
    assert_eq!(classify(t.waterline - 1, 20, 100, &t), Sector::WaterSwim);
    assert!(!classify(t.waterline, 20, 100, &t).is_water());
}

#[test]
fn every_class_has_somewhere_to_be() {
    for class in VesselClass::ALL {
        let usable = Sector::all()
            .iter()
            .filter(|&&s| can_traverse(class, s, 0))
            .count();
        assert!(usable > 0, "{} cannot go anywhere", class);
    }
}

#[test]
fn sea_and_land_split() {
    assert!(can_traverse(VesselClass::Ship, Sector::Ocean, 0));
    assert!(!can_traverse(VesselClass::Ship, Sector::Field, 0));
    assert!(!can_traverse(VesselClass::Raft, Sector::Ocean, 0));
    assert!(can_traverse(VesselClass::Raft, Sector::River, 0));
    assert!(can_traverse(VesselClass::Submarine, Sector::Underwater, -20));
    assert!(!can_traverse(VesselClass::Magical, Sector::Lava, 0));
}

#[test]
fn airships_ignore_terrain_once_aloft() {
    assert!(can_traverse(VesselClass::Airship, Sector::Field, 0));
    assert!(can_traverse(VesselClass::Airship, Sector::Cave, 200));
    assert!(!can_traverse(VesselClass::Airship, Sector::Inside, 200));
    assert!(!can_traverse(VesselClass::Airship, Sector::Cave, 0));
}

#[test]
fn altitude_rules() {
    assert_eq!(altitude_allowed(VesselClass::Ship, 0), Ok(()));
    assert_eq!(
        altitude_allowed(VesselClass::Ship, 10),
        Err(MoveRejection::Altitude { z: 10, max: 0 })
    );
    assert_eq!(
        altitude_allowed(VesselClass::Ship, -1),
        Err(MoveRejection::Depth { z: -1 })
    );
    assert_eq!(altitude_allowed(VesselClass::Submarine, -400), Ok(()));
    assert_eq!(altitude_allowed(VesselClass::Airship, 500), Ok(()));
    assert_eq!(
        altitude_allowed(VesselClass::Magical, 301),
        Err(MoveRejection::Altitude { z: 301, max: 300 })
    );
}

#[test]
fn weather_only_ever_slows() {
    for class in VesselClass::ALL {
        for &sector in Sector::all() {
            let calm = speed_modifier_with_weather(class, sector, 0);
            assert_eq!(calm, (speed_modifier(class, sector) * 100.0).round() as i32);
            for weather in 1..6 {
                let rough = speed_modifier_with_weather(class, sector, weather);
                assert!(rough <= calm && rough >= 0);
            }
        }
    }
}

#[test]
fn submarines_dive_under_storms() {
    let calm = speed_modifier_with_weather(VesselClass::Submarine, Sector::Underwater, 0);
    let storm = speed_modifier_with_weather(VesselClass::Submarine, Sector::Underwater, 5);
    assert_eq!(calm, storm);
    assert!(speed_modifier_with_weather(VesselClass::Submarine, Sector::Ocean, 5) < 100);
}

#[test]
fn derived_classes_stay_on_the_water() {
    for weight in (0..2000).step_by(25) {
        let class = derive_class(weight);
        assert!(can_traverse(class, Sector::WaterSwim, 0), "{}", weight);
        let (base, max) = rooms_for_class(class);
        assert!(base >= 1 && base <= max && max <= MAX_ROOMS_PER_VESSEL);
    }
}

// ── Interior addressing ────────────────────────────────────────────────

#[test]
fn vnum_blocks_cover_the_namespace_exactly() {
    assert_eq!(allocate_room_vnum(0, 0), Ok(INTERIOR_VNUM_BASE));
    assert_eq!(
        allocate_room_vnum(MAX_VESSELS as i64 - 1, MAX_ROOMS_PER_VESSEL as i64 - 1),
        Ok(INTERIOR_VNUM_MAX)
    );
    assert!(allocate_room_vnum(MAX_VESSELS as i64, 0).is_err());
    assert!(allocate_room_vnum(i64::MAX, 0).is_err());
    assert!(allocate_room_vnum(0, -1).is_err());
}

#[test]
fn vnums_map_back_to_their_vessel() {
    for id in [0i64, 1, 250, 499] {
        for room in [0i64, 19] {
            let vnum = allocate_room_vnum(id, room).unwrap();
            assert!(is_interior_vnum(vnum));
            assert_eq!(vessel_for_vnum(vnum), Some(VesselId(id as u32)));
        }
    }
    assert_eq!(vessel_for_vnum(INTERIOR_VNUM_BASE - 1), None);
    assert_eq!(vessel_for_vnum(INTERIOR_VNUM_MAX + 1), None);
}

// ── Interior graphs ────────────────────────────────────────────────────

#[test]
fn hand_built_interior_is_valid() {
    let interior = small_ship();
    assert!(interior.has_interior());
    assert!(validate_interior(&interior).is_empty());
    assert_eq!(interior.entrance, interior.rooms()[1]);
    assert_eq!(interior.reachable_from_entrance().len(), 4);
}

#[test]
fn paths_route_around_locks() {
    let mut interior = small_ship();
    let rooms = interior.rooms().to_vec();
    let (bridge, corridor, cargo) = (rooms[0], rooms[1], rooms[3]);

    let path = interior.find_path(bridge, cargo).unwrap();
    assert_eq!(path.len(), 2);
    assert_eq!(path[1].direction, Direction::Down);

    interior.set_locked(corridor, Direction::Down, true).unwrap();
    assert!(interior.is_passage_blocked(corridor, Direction::Down));
    assert_eq!(interior.find_path(bridge, cargo), None);
    // Locked rooms still count as part of the vessel
    assert_eq!(interior.reachable_from_entrance().len(), 4);
}

#[test]
fn duplicate_exits_are_refused() {
    let mut interior = small_ship();
    let rooms = interior.rooms().to_vec();
    assert!(interior
        .connect_both(rooms[0], rooms[2], Direction::East, false)
        .is_err());
}

#[test]
fn cleared_interior_has_no_rooms() {
    let mut interior = small_ship();
    interior.clear();
    assert!(!interior.has_interior());
    assert!(validate_interior(&interior).is_empty());
    assert!(interior.rooms().is_empty());
}
