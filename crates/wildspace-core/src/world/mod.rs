//! Base terrain of the wilderness plane.

mod heightmap;

pub use heightmap::*;
