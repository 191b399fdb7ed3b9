//! Autopilot - vessels working through a route of waypoints.
//!
//! The state machine lives here; the engine drives it once per tick and
//! performs the moves it asks for.

use serde::{Deserialize, Serialize};
use wildspace_logic::coords::{check, range_between};
use wildspace_logic::error::{Missing, SpatialError};

use crate::components::VesselPosition;

pub const MAX_WAYPOINTS_PER_ROUTE: usize = 20;

/// Arrival distance for a waypoint that sets none.
pub const DEFAULT_ARRIVAL_TOLERANCE: f32 = 5.0;

/// Largest altitude change an autopilot makes in one tick.
pub const CLIMB_PER_TICK: i32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Arrival distance; 0 means the default.
    pub tolerance: f32,
    /// Ticks to hold position after arriving.
    pub wait_ticks: u32,
}

impl Waypoint {
    pub fn new(name: impl Into<String>, x: i32, y: i32, z: i32) -> Self {
        Self {
            name: name.into(),
            x: x as f32,
            y: y as f32,
            z: z as f32,
            tolerance: 0.0,
            wait_ticks: 0,
        }
    }

    pub fn tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn wait(mut self, ticks: u32) -> Self {
        self.wait_ticks = ticks;
        self
    }

    pub fn arrival_tolerance(&self) -> f32 {
        if self.tolerance > 0.0 {
            self.tolerance
        } else {
            DEFAULT_ARRIVAL_TOLERANCE
        }
    }

    fn grid(&self) -> (i32, i32, i32) {
        (
            self.x.round() as i32,
            self.y.round() as i32,
            self.z.round() as i32,
        )
    }
}

/// An ordered list of waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub name: String,
    pub waypoints: Vec<Waypoint>,
    /// Start over from the first waypoint after the last.
    pub looping: bool,
}

impl Route {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            waypoints: Vec::new(),
            looping: false,
        }
    }

    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    /// Append a waypoint, returning its index.
    pub fn add_waypoint(&mut self, waypoint: Waypoint) -> Result<usize, SpatialError> {
        if self.waypoints.len() >= MAX_WAYPOINTS_PER_ROUTE {
            return Err(SpatialError::OutOfRange {
                what: "waypoint count",
                value: self.waypoints.len() as i64 + 1,
                max: MAX_WAYPOINTS_PER_ROUTE as i64,
            });
        }
        let (x, y, z) = waypoint.grid();
        check(x, y, z)?;
        self.waypoints.push(waypoint);
        Ok(self.waypoints.len() - 1)
    }

    pub fn remove_waypoint(&mut self, index: usize) -> Result<Waypoint, SpatialError> {
        if index >= self.waypoints.len() {
            return Err(SpatialError::NotFound(Missing::Waypoint(index)));
        }
        Ok(self.waypoints.remove(index))
    }

    pub fn clear(&mut self) {
        self.waypoints.clear();
    }

    /// A route can be flown if it has between one and the maximum number
    /// of waypoints, all on the plane.
    pub fn validate(&self) -> Result<(), SpatialError> {
        if self.waypoints.is_empty() {
            return Err(SpatialError::NotFound(Missing::Waypoint(0)));
        }
        if self.waypoints.len() > MAX_WAYPOINTS_PER_ROUTE {
            return Err(SpatialError::OutOfRange {
                what: "waypoint count",
                value: self.waypoints.len() as i64,
                max: MAX_WAYPOINTS_PER_ROUTE as i64,
            });
        }
        for waypoint in &self.waypoints {
            let (x, y, z) = waypoint.grid();
            check(x, y, z)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutopilotState {
    Traveling,
    Waiting,
    Paused,
    Complete,
}

/// Attached to a vessel while it follows a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Autopilot {
    pub route: Route,
    /// Index of the waypoint being steered for.
    pub waypoint: usize,
    pub state: AutopilotState,
    pub wait_remaining: u32,
}

impl Autopilot {
    pub fn new(route: Route) -> Result<Self, SpatialError> {
        route.validate()?;
        Ok(Self {
            route,
            waypoint: 0,
            state: AutopilotState::Traveling,
            wait_remaining: 0,
        })
    }

    pub fn current(&self) -> Option<&Waypoint> {
        self.route.waypoints.get(self.waypoint)
    }

    /// Traveling, waiting or paused.
    pub fn is_active(&self) -> bool {
        self.state != AutopilotState::Complete
    }

    /// Steer for the next waypoint. Returns false once a one-way route
    /// has run out.
    pub fn advance(&mut self) -> bool {
        let next = self.waypoint + 1;
        if next < self.route.waypoints.len() {
            self.waypoint = next;
        } else if self.route.looping {
            self.waypoint = 0;
        } else {
            self.state = AutopilotState::Complete;
            log::info!("Route '{}' complete", self.route.name);
            return false;
        }
        self.state = AutopilotState::Traveling;
        true
    }

    /// Reached the current waypoint: hold there if it asks, otherwise
    /// move on.
    pub fn arrive(&mut self) {
        let wait = self.current().map(|w| w.wait_ticks).unwrap_or(0);
        if wait > 0 {
            self.state = AutopilotState::Waiting;
            self.wait_remaining = wait;
        } else {
            self.advance();
        }
    }

    /// One tick of holding at a waypoint.
    pub fn wait_tick(&mut self) {
        self.wait_remaining = self.wait_remaining.saturating_sub(1);
        if self.wait_remaining == 0 {
            self.advance();
        }
    }

    pub fn pause(&mut self) -> bool {
        match self.state {
            AutopilotState::Traveling | AutopilotState::Waiting => {
                self.state = AutopilotState::Paused;
                true
            }
            _ => false,
        }
    }

    /// Back to whatever was interrupted: a wait resumes with the ticks it
    /// had left.
    pub fn resume(&mut self) -> bool {
        if self.state != AutopilotState::Paused {
            return false;
        }
        self.state = if self.wait_remaining > 0 {
            AutopilotState::Waiting
        } else {
            AutopilotState::Traveling
        };
        true
    }
}

/// Whether a vessel at `position` is within arrival distance of `waypoint`.
pub fn arrived(position: &VesselPosition, waypoint: &Waypoint) -> bool {
    let range = range_between(
        (position.x, position.y, position.z),
        (waypoint.x, waypoint.y, waypoint.z),
    );
    range <= waypoint.arrival_tolerance()
}

/// Grid square one step from `position` toward `waypoint`, climbing or
/// diving at most [`CLIMB_PER_TICK`]. None when already over it.
pub fn next_step(position: &VesselPosition, waypoint: &Waypoint) -> Option<(i32, i32, i32)> {
    let here = position.coord();
    let altitude = position.altitude();
    let (tx, ty, tz) = waypoint.grid();
    let step = (
        here.x + (tx - here.x).signum(),
        here.y + (ty - here.y).signum(),
        altitude + (tz - altitude).clamp(-CLIMB_PER_TICK, CLIMB_PER_TICK),
    );
    if step == (here.x, here.y, altitude) {
        None
    } else {
        Some(step)
    }
}
