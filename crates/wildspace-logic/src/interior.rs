//! Vessel interiors: reserved vnum addressing and the room connection graph.
//!
//! Each vessel owns a block of `MAX_ROOMS_PER_VESSEL` vnums carved out of
//! `INTERIOR_VNUM_BASE..=INTERIOR_VNUM_MAX`. That range sits below the
//! wilderness vnums and is never handed out by the world allocator.
//!
//! The connection graph is directed: a two-way passage is two edges. BFS
//! over it mirrors the door-graph pathfinding used for deck layouts, with
//! locked edges treated as walls.

use crate::coords::Direction;
use crate::error::{Conflict, Missing, SpatialError, VesselId, Vnum};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// First vnum of the interior namespace.
pub const INTERIOR_VNUM_BASE: Vnum = 70000;
/// Last vnum of the interior namespace.
pub const INTERIOR_VNUM_MAX: Vnum = 79999;
/// Size of each vessel's vnum block.
pub const MAX_ROOMS_PER_VESSEL: usize = 20;
/// Edge budget per interior.
pub const MAX_CONNECTIONS: usize = 40;
/// Engine-wide vessel cap. 500 blocks of 20 fill the namespace exactly.
pub const MAX_VESSELS: u32 = 500;

/// `BASE + vessel_id * MAX_ROOMS_PER_VESSEL + room_index`, or `OutOfRange`.
pub fn allocate_room_vnum(vessel_id: i64, room_index: i64) -> Result<Vnum, SpatialError> {
    if vessel_id < 0 {
        return Err(SpatialError::OutOfRange {
            what: "vessel_id",
            value: vessel_id,
            max: MAX_VESSELS as i64 - 1,
        });
    }
    if room_index < 0 || room_index >= MAX_ROOMS_PER_VESSEL as i64 {
        return Err(SpatialError::OutOfRange {
            what: "room_index",
            value: room_index,
            max: MAX_ROOMS_PER_VESSEL as i64 - 1,
        });
    }
    let vnum = vessel_id
        .saturating_mul(MAX_ROOMS_PER_VESSEL as i64)
        .saturating_add(INTERIOR_VNUM_BASE as i64 + room_index);
    if vnum > INTERIOR_VNUM_MAX as i64 {
        return Err(SpatialError::OutOfRange {
            what: "interior vnum",
            value: vnum,
            max: INTERIOR_VNUM_MAX as i64,
        });
    }
    Ok(vnum as Vnum)
}

/// True if `vnum` falls in the interior namespace.
pub fn is_interior_vnum(vnum: Vnum) -> bool {
    (INTERIOR_VNUM_BASE..=INTERIOR_VNUM_MAX).contains(&vnum)
}

/// Owning vessel of an interior vnum.
pub fn vessel_for_vnum(vnum: Vnum) -> Option<VesselId> {
    is_interior_vnum(vnum)
        .then(|| VesselId(((vnum - INTERIOR_VNUM_BASE) as usize / MAX_ROOMS_PER_VESSEL) as u32))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ShipRoomType {
    Bridge = 0,
    Quarters = 1,
    Cargo = 2,
    Engineering = 3,
    Weapons = 4,
    Medical = 5,
    MessHall = 6,
    Corridor = 7,
    Airlock = 8,
    Deck = 9,
}

/// Display template and flavour for a room type.
pub struct RoomTemplate {
    /// `{}` is replaced with the vessel name.
    pub name: &'static str,
    pub description: &'static str,
}

const TEMPLATES: [RoomTemplate; 10] = [
    RoomTemplate {
        name: "The Bridge of {}",
        description: "The command center of the vessel. Navigation instruments line the walls.",
    },
    RoomTemplate {
        name: "Crew Quarters aboard {}",
        description: "Rows of bunks fill this cramped space where the crew rests.",
    },
    RoomTemplate {
        name: "Cargo Hold of {}",
        description: "A spacious hold filled with crates, barrels and secured cargo.",
    },
    RoomTemplate {
        name: "Engine Room of {}",
        description: "The heart of the vessel's propulsion, hot and loud.",
    },
    RoomTemplate {
        name: "Weapons Bay of {}",
        description: "Racks of ammunition surround the mounted weapons.",
    },
    RoomTemplate {
        name: "Medical Bay of {}",
        description: "A small infirmary stocked with bandages and remedies.",
    },
    RoomTemplate {
        name: "Mess Hall of {}",
        description: "Long tables and benches where the crew takes its meals.",
    },
    RoomTemplate {
        name: "Corridor aboard {}",
        description: "A narrow passage connecting different sections of the vessel.",
    },
    RoomTemplate {
        name: "Airlock of {}",
        description: "A sealed chamber between the vessel and the world outside.",
    },
    RoomTemplate {
        name: "Main Deck of {}",
        description: "The open deck, exposed to wind and weather.",
    },
];

impl ShipRoomType {
    pub fn template(self) -> &'static RoomTemplate {
        &TEMPLATES[self as usize]
    }

    pub fn display_name(self, vessel_name: &str) -> String {
        self.template().name.replace("{}", vessel_name)
    }

    /// Rooms with windows or open air.
    pub fn has_outside_view(self) -> bool {
        matches!(self, ShipRoomType::Bridge | ShipRoomType::Deck)
    }
}

/// A directed passage between two interior rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConnection {
    pub from_room: Vnum,
    pub to_room: Vnum,
    pub direction: Direction,
    pub is_hatch: bool,
    pub is_locked: bool,
}

/// One hop of an interior route: leave by `direction`, arrive in `room`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub direction: Direction,
    pub room: Vnum,
}

/// A vessel's room block and connection graph.
///
/// `num_rooms` and `room_vnums[0]` are both kept: a partially initialized
/// record can disagree on them, so `has_interior` checks each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interior {
    pub vessel_id: VesselId,
    pub num_rooms: usize,
    pub room_vnums: [Vnum; MAX_ROOMS_PER_VESSEL],
    pub room_types: Vec<ShipRoomType>,
    pub connections: Vec<RoomConnection>,
    /// Boarding room; 0 until assigned.
    pub entrance: Vnum,
    /// Control room; 0 until assigned.
    pub bridge: Vnum,
}

impl Interior {
    pub fn new(vessel_id: VesselId) -> Self {
        Self {
            vessel_id,
            num_rooms: 0,
            room_vnums: [0; MAX_ROOMS_PER_VESSEL],
            room_types: Vec::new(),
            connections: Vec::new(),
            entrance: 0,
            bridge: 0,
        }
    }

    pub fn has_interior(&self) -> bool {
        self.num_rooms > 0 || self.room_vnums[0] != 0
    }

    /// First vnum of this vessel's block, whether or not it is in use.
    pub fn block_start(&self) -> Result<Vnum, SpatialError> {
        allocate_room_vnum(self.vessel_id.0 as i64, 0)
    }

    /// Allocated room vnums, in creation order.
    pub fn rooms(&self) -> &[Vnum] {
        &self.room_vnums[..self.num_rooms.min(MAX_ROOMS_PER_VESSEL)]
    }

    pub fn contains(&self, vnum: Vnum) -> bool {
        vnum != 0 && self.rooms().contains(&vnum)
    }

    pub fn index_of(&self, vnum: Vnum) -> Option<usize> {
        self.rooms().iter().position(|&v| v == vnum)
    }

    pub fn room_type(&self, vnum: Vnum) -> Option<ShipRoomType> {
        self.index_of(vnum)
            .and_then(|i| self.room_types.get(i).copied())
    }

    pub fn room_name(&self, vnum: Vnum, vessel_name: &str) -> Option<String> {
        self.room_type(vnum).map(|t| t.display_name(vessel_name))
    }

    pub fn rooms_of_type(&self, kind: ShipRoomType) -> Vec<Vnum> {
        self.rooms()
            .iter()
            .zip(&self.room_types)
            .filter(|(_, t)| **t == kind)
            .map(|(&v, _)| v)
            .collect()
    }

    /// Append a room in the next free slot of the block. The first bridge
    /// added becomes the bridge room.
    pub fn add_room(&mut self, kind: ShipRoomType) -> Result<Vnum, SpatialError> {
        let vnum = allocate_room_vnum(self.vessel_id.0 as i64, self.num_rooms as i64)?;
        self.room_vnums[self.num_rooms] = vnum;
        self.room_types.push(kind);
        self.num_rooms += 1;
        if kind == ShipRoomType::Bridge && self.bridge == 0 {
            self.bridge = vnum;
        }
        Ok(vnum)
    }

    /// Pick the boarding room: the first airlock, else the second room,
    /// else the bridge.
    pub fn assign_entrance(&mut self) {
        self.entrance = self
            .rooms_of_type(ShipRoomType::Airlock)
            .first()
            .copied()
            .or_else(|| self.rooms().get(1).copied())
            .unwrap_or(self.bridge);
    }

    /// Add one directed edge. Callers add the reverse edge themselves.
    pub fn connect(
        &mut self,
        from_room: Vnum,
        to_room: Vnum,
        direction: Direction,
        is_hatch: bool,
        is_locked: bool,
    ) -> Result<(), SpatialError> {
        for room in [from_room, to_room] {
            if !self.contains(room) {
                return Err(SpatialError::NotFound(Missing::Room(room)));
            }
        }
        if self.exit(from_room, direction).is_some() {
            return Err(SpatialError::Duplicate(Conflict::Exit {
                room: from_room,
                direction,
            }));
        }
        if self.connections.len() >= MAX_CONNECTIONS {
            return Err(SpatialError::OutOfRange {
                what: "connection",
                value: self.connections.len() as i64,
                max: MAX_CONNECTIONS as i64 - 1,
            });
        }
        self.connections.push(RoomConnection {
            from_room,
            to_room,
            direction,
            is_hatch,
            is_locked,
        });
        Ok(())
    }

    /// `connect` both ways with the reverse direction on the return edge.
    pub fn connect_both(
        &mut self,
        a: Vnum,
        b: Vnum,
        direction: Direction,
        is_hatch: bool,
    ) -> Result<(), SpatialError> {
        if self.exit(b, direction.reverse()).is_some() {
            return Err(SpatialError::Duplicate(Conflict::Exit {
                room: b,
                direction: direction.reverse(),
            }));
        }
        self.connect(a, b, direction, is_hatch, false)?;
        self.connect(b, a, direction.reverse(), is_hatch, false)
    }

    pub fn exit(&self, from_room: Vnum, direction: Direction) -> Option<&RoomConnection> {
        self.connections
            .iter()
            .find(|c| c.from_room == from_room && c.direction == direction)
    }

    pub fn exits(&self, from_room: Vnum) -> impl Iterator<Item = &RoomConnection> {
        self.connections
            .iter()
            .filter(move |c| c.from_room == from_room)
    }

    /// True when the passage exists and is locked. A missing exit is not
    /// "blocked", it is absent; callers check `exit` for that.
    pub fn is_passage_blocked(&self, from_room: Vnum, direction: Direction) -> bool {
        self.exit(from_room, direction)
            .map(|c| c.is_locked)
            .unwrap_or(false)
    }

    pub fn set_locked(
        &mut self,
        from_room: Vnum,
        direction: Direction,
        locked: bool,
    ) -> Result<(), SpatialError> {
        let conn = self
            .connections
            .iter_mut()
            .find(|c| c.from_room == from_room && c.direction == direction)
            .ok_or(SpatialError::NotFound(Missing::Exit {
                room: from_room,
                direction,
            }))?;
        conn.is_locked = locked;
        Ok(())
    }

    pub fn has_outside_view(&self, vnum: Vnum) -> bool {
        self.room_type(vnum)
            .map(ShipRoomType::has_outside_view)
            .unwrap_or(false)
    }

    /// Shortest route over unlocked passages. Empty if `from == to`,
    /// `None` if unreachable.
    pub fn find_path(&self, from: Vnum, to: Vnum) -> Option<Vec<Step>> {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }
        if from == to {
            return Some(vec![]);
        }

        let mut prev: HashMap<Vnum, (Vnum, Direction)> = HashMap::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(from);
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            for conn in self.exits(current) {
                if conn.is_locked || !visited.insert(conn.to_room) {
                    continue;
                }
                prev.insert(conn.to_room, (current, conn.direction));
                if conn.to_room == to {
                    return Some(unwind(&prev, from, to));
                }
                queue.push_back(conn.to_room);
            }
        }
        None
    }

    /// Rooms reachable from the entrance over any passage, locked or not.
    pub fn reachable_from_entrance(&self) -> HashSet<Vnum> {
        let mut seen = HashSet::new();
        if !self.contains(self.entrance) {
            return seen;
        }
        let mut queue = VecDeque::from([self.entrance]);
        seen.insert(self.entrance);
        while let Some(current) = queue.pop_front() {
            for conn in self.exits(current) {
                if seen.insert(conn.to_room) {
                    queue.push_back(conn.to_room);
                }
            }
        }
        seen
    }

    /// Drop every room and edge; the block goes back to the namespace.
    pub fn clear(&mut self) {
        let id = self.vessel_id;
        *self = Interior::new(id);
    }
}

fn unwind(prev: &HashMap<Vnum, (Vnum, Direction)>, from: Vnum, to: Vnum) -> Vec<Step> {
    let mut steps = Vec::new();
    let mut cursor = to;
    while cursor != from {
        match prev.get(&cursor) {
            Some(&(parent, direction)) => {
                steps.push(Step {
                    direction,
                    room: cursor,
                });
                cursor = parent;
            }
            None => break,
        }
    }
    steps.reverse();
    steps
}

// ── Interior validation ────────────────────────────────────────────────

/// An interior consistency problem.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub category: &'static str,
    pub message: String,
}

/// Check the structural rules of an interior: signals agree, one bridge,
/// one entrance, edges stay inside the block, everything is reachable.
pub fn validate_interior(interior: &Interior) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut push = |category: &'static str, message: String| {
        errors.push(ValidationError { category, message })
    };

    if interior.num_rooms == 0 {
        if interior.room_vnums[0] != 0 {
            push(
                "signals",
                format!(
                    "num_rooms is 0 but slot 0 holds {}",
                    interior.room_vnums[0]
                ),
            );
        }
        return errors;
    }
    if interior.room_types.len() != interior.num_rooms {
        push(
            "signals",
            format!(
                "{} room types for {} rooms",
                interior.room_types.len(),
                interior.num_rooms
            ),
        );
    }

    for (i, &vnum) in interior.rooms().iter().enumerate() {
        match allocate_room_vnum(interior.vessel_id.0 as i64, i as i64) {
            Ok(expected) if expected == vnum => {}
            _ => push(
                "addressing",
                format!("slot {} holds {} outside the vessel block", i, vnum),
            ),
        }
    }

    let bridges = interior.rooms_of_type(ShipRoomType::Bridge);
    if !interior.contains(interior.bridge) {
        push("bridge", format!("bridge {} is not aboard", interior.bridge));
    } else if interior.room_type(interior.bridge) != Some(ShipRoomType::Bridge) {
        push("bridge", format!("bridge {} is not a bridge room", interior.bridge));
    }
    if bridges.len() != 1 {
        push("bridge", format!("{} bridge rooms", bridges.len()));
    }
    if !interior.contains(interior.entrance) {
        push(
            "entrance",
            format!("entrance {} is not aboard", interior.entrance),
        );
    }

    for c in &interior.connections {
        if !interior.contains(c.from_room) || !interior.contains(c.to_room) {
            push(
                "connections",
                format!("edge {} -> {} leaves the vessel", c.from_room, c.to_room),
            );
        }
    }
    if interior.connections.len() > MAX_CONNECTIONS {
        push(
            "connections",
            format!("{} edges exceed {}", interior.connections.len(), MAX_CONNECTIONS),
        );
    }

    let reachable = interior.reachable_from_entrance();
    for &vnum in interior.rooms() {
        if !reachable.contains(&vnum) {
            push(
                "connectivity",
                format!("room {} unreachable from entrance", vnum),
            );
        }
    }

    errors
}
