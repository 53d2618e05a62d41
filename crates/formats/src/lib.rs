pub mod story_collection;

pub use story_collection::*;
