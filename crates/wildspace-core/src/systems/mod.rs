//! Systems - logic that operates on vessel components

mod autopilot;
mod vessels;

pub use autopilot::*;
pub use vessels::*;
