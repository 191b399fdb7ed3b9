//! Vessel interior generation - lays out the rooms of a vessel and wires
//! them into a walkable graph.

use rand::Rng;
use wildspace_logic::coords::Direction;
use wildspace_logic::error::{SpatialError, VesselId};
use wildspace_logic::interior::{Interior, ShipRoomType, MAX_CONNECTIONS};
use wildspace_logic::vessels::{max_rooms_for_class, VesselClass};

use ShipRoomType::*;

/// Rooms every vessel of a class starts with. Each list is exactly the
/// class's base room count, bridge first.
pub fn class_template(class: VesselClass) -> &'static [ShipRoomType] {
    match class {
        VesselClass::Raft => &[Bridge],
        VesselClass::Boat => &[Bridge, Quarters],
        VesselClass::Ship => &[Bridge, Quarters, Cargo],
        VesselClass::Warship => &[Bridge, Weapons, Weapons, Quarters, Engineering],
        VesselClass::Airship => &[Bridge, Deck, Engineering, Quarters],
        VesselClass::Submarine => &[Bridge, Airlock, Engineering, Quarters],
        VesselClass::Transport => &[Bridge, Cargo, Cargo, Cargo, Quarters, MessHall],
        VesselClass::Magical => &[Bridge, Quarters, Cargo],
    }
}

const COMMON_ROOMS: [ShipRoomType; 5] = [Quarters, Corridor, Cargo, MessHall, Medical];

/// Chance of a cross-link between two neighbouring rooms.
const CROSS_LINK_CHANCE: f64 = 0.40;
/// Chance a cross-link is a hatch rather than an open passage.
const HATCH_CHANCE: f64 = 0.25;

/// Build the interior of a vessel: the class template, then extra rooms
/// while `discovery_chance` rolls succeed (up to the class maximum), then
/// the passages between them.
pub fn generate_interior(
    vessel_id: VesselId,
    class: VesselClass,
    rng: &mut impl Rng,
    discovery_chance: f64,
) -> Result<Interior, SpatialError> {
    let mut interior = Interior::new(vessel_id);
    interior.block_start()?;

    for &kind in class_template(class) {
        interior.add_room(kind)?;
    }

    let chance = discovery_chance.clamp(0.0, 1.0);
    let max_rooms = max_rooms_for_class(class);
    while interior.num_rooms < max_rooms && rng.gen_bool(chance) {
        let kind = discover_room(class, rng);
        interior.add_room(kind)?;
    }

    interior.assign_entrance();
    wire_rooms(&mut interior, rng)?;

    log::debug!(
        "Generated {} rooms and {} passages for {} ({})",
        interior.num_rooms,
        interior.connections.len(),
        vessel_id,
        class
    );
    Ok(interior)
}

fn discover_room(class: VesselClass, rng: &mut impl Rng) -> ShipRoomType {
    if class == VesselClass::Warship && rng.gen_ratio(1, 3) {
        Weapons
    } else if class == VesselClass::Transport && rng.gen_ratio(1, 2) {
        Cargo
    } else {
        COMMON_ROOMS[rng.gen_range(0..COMMON_ROOMS.len())]
    }
}

/// Small vessels are a fore-aft chain. Larger ones radiate from the bridge
/// over the eight compass points, with overflow rooms one deck down, and get
/// a few side passages between neighbouring rooms.
fn wire_rooms(interior: &mut Interior, rng: &mut impl Rng) -> Result<(), SpatialError> {
    let rooms = interior.rooms().to_vec();
    if rooms.len() < 2 {
        return Ok(());
    }

    if rooms.len() <= 3 {
        for pair in rooms.windows(2) {
            interior.connect_both(pair[0], pair[1], Direction::North, false)?;
        }
        return Ok(());
    }

    let bridge = interior.bridge;
    let others: Vec<_> = rooms.iter().copied().filter(|&v| v != bridge).collect();
    for (k, &room) in others.iter().enumerate() {
        match Direction::COMPASS.get(k) {
            Some(&dir) => interior.connect_both(bridge, room, dir, false)?,
            None => {
                let above = others[k - Direction::COMPASS.len()];
                interior.connect_both(above, room, Direction::Down, false)?
            }
        }
    }

    for pair in others.windows(2) {
        if interior.connections.len() + 2 > MAX_CONNECTIONS {
            break;
        }
        if !rng.gen_bool(CROSS_LINK_CHANCE) {
            continue;
        }
        let (a, b) = (pair[0], pair[1]);
        if interior.exits(a).any(|c| c.to_room == b) {
            continue;
        }
        let free = Direction::COMPASS.iter().copied().find(|&d| {
            interior.exit(a, d).is_none() && interior.exit(b, d.reverse()).is_none()
        });
        if let Some(dir) = free {
            let hatch = rng.gen_bool(HATCH_CHANCE);
            interior.connect_both(a, b, dir, hatch)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use wildspace_logic::interior::validate_interior;
    use wildspace_logic::vessels::{base_rooms_for_class, rooms_for_class};

    #[test]
    fn test_templates_match_base_counts() {
        for class in VesselClass::ALL {
            assert_eq!(
                class_template(class).len(),
                base_rooms_for_class(class),
                "{}",
                class
            );
            assert_eq!(class_template(class)[0], Bridge);
        }
    }

    #[test]
    fn test_no_discovery_gives_base() {
        let mut rng = StdRng::seed_from_u64(1);
        for class in VesselClass::ALL {
            let interior = generate_interior(VesselId(3), class, &mut rng, 0.0).unwrap();
            assert_eq!(interior.num_rooms, base_rooms_for_class(class));
        }
    }

    #[test]
    fn test_certain_discovery_fills_to_max() {
        let mut rng = StdRng::seed_from_u64(2);
        for class in VesselClass::ALL {
            let interior = generate_interior(VesselId(4), class, &mut rng, 1.0).unwrap();
            assert_eq!(interior.num_rooms, rooms_for_class(class).1);
            assert!(validate_interior(&interior).is_empty(), "{}", class);
        }
    }

    #[test]
    fn test_room_counts_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for seed_round in 0..50u32 {
            for class in VesselClass::ALL {
                let interior =
                    generate_interior(VesselId(seed_round), class, &mut rng, 0.30).unwrap();
                let (base, max) = rooms_for_class(class);
                assert!(interior.num_rooms >= base && interior.num_rooms <= max);
            }
        }
    }

    #[test]
    fn test_linear_chain_for_small_vessels() {
        let mut rng = StdRng::seed_from_u64(4);
        let interior = generate_interior(VesselId(0), VesselClass::Ship, &mut rng, 0.0).unwrap();
        let rooms = interior.rooms().to_vec();
        assert_eq!(interior.connections.len(), 4);
        assert_eq!(interior.exit(rooms[0], Direction::North).map(|c| c.to_room), Some(rooms[1]));
        assert_eq!(interior.exit(rooms[2], Direction::South).map(|c| c.to_room), Some(rooms[1]));
        assert_eq!(interior.entrance, rooms[1]);
        assert_eq!(interior.bridge, rooms[0]);
    }

    #[test]
    fn test_hub_and_spoke() {
        let mut rng = StdRng::seed_from_u64(5);
        let interior = generate_interior(VesselId(1), VesselClass::Warship, &mut rng, 0.0).unwrap();
        let bridge = interior.bridge;
        let spokes: Vec<_> = interior.exits(bridge).map(|c| c.direction).collect();
        assert_eq!(
            spokes,
            vec![Direction::North, Direction::East, Direction::South, Direction::West]
        );
        for room in interior.rooms().iter().skip(1) {
            assert!(interior.find_path(*room, bridge).is_some());
        }
    }

    #[test]
    fn test_overflow_rooms_go_below() {
        let mut rng = StdRng::seed_from_u64(6);
        let interior = generate_interior(VesselId(2), VesselClass::Transport, &mut rng, 1.0).unwrap();
        let rooms = interior.rooms();
        assert_eq!(rooms.len(), 20);
        // Room 9 is the ninth non-bridge room and hangs under room 1.
        assert_eq!(interior.exit(rooms[1], Direction::Down).map(|c| c.to_room), Some(rooms[9]));
        assert_eq!(interior.exit(rooms[9], Direction::Up).map(|c| c.to_room), Some(rooms[1]));
        assert!(interior.connections.len() <= MAX_CONNECTIONS);
    }

    #[test]
    fn test_submarine_enters_by_airlock() {
        let mut rng = StdRng::seed_from_u64(7);
        let interior = generate_interior(VesselId(5), VesselClass::Submarine, &mut rng, 0.3).unwrap();
        assert_eq!(interior.room_type(interior.entrance), Some(Airlock));
    }

    #[test]
    fn test_raft_single_room() {
        let mut rng = StdRng::seed_from_u64(8);
        let interior = generate_interior(VesselId(6), VesselClass::Raft, &mut rng, 0.0).unwrap();
        assert_eq!(interior.num_rooms, 1);
        assert_eq!(interior.entrance, interior.bridge);
        assert!(interior.connections.is_empty());
        assert!(validate_interior(&interior).is_empty());
    }

    #[test]
    fn test_vessel_id_out_of_namespace() {
        let mut rng = StdRng::seed_from_u64(9);
        assert!(matches!(
            generate_interior(VesselId(500), VesselClass::Raft, &mut rng, 0.0),
            Err(SpatialError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_reproducible() {
        let a = generate_interior(VesselId(7), VesselClass::Airship, &mut StdRng::seed_from_u64(10), 0.3)
            .unwrap();
        let b = generate_interior(VesselId(7), VesselClass::Airship, &mut StdRng::seed_from_u64(10), 0.3)
            .unwrap();
        assert_eq!(a, b);
    }
}
