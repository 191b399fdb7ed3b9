//! Geographic features laid over the plane and the index that finds them.

mod feature;
mod index;

pub use feature::*;
pub use index::*;
