pub mod math;

// Geographic primitives shared by the story crates.
pub use math::*;
