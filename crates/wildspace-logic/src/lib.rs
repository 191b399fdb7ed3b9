//! Pure spatial logic for Wildspace.
//!
//! This crate holds the rules of the wilderness plane and of vessels that
//! do not need an engine: bounds checking, terrain classification, vessel
//! capability tables and interior room graphs. Functions take plain data and
//! return results, so they are unit-testable in isolation and shared by the
//! engine and the headless harness.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`coords`] | Plane/altitude bounds, directions, distance and bearing |
//! | [`error`] | `SpatialError` taxonomy shared by every component |
//! | [`interior`] | Interior vnum addressing, room templates, navigation graph |
//! | [`sectors`] | Sector table and elevation/temperature/moisture classification |
//! | [`vessels`] | Vessel classes, terrain capabilities, speed tables |

pub mod coords;
pub mod error;
pub mod interior;
pub mod sectors;
pub mod vessels;
