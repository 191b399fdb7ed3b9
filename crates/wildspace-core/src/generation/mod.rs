//! Generation - procedural rivers and vessel interiors

mod interior;
mod river;

pub use interior::*;
pub use river::*;
