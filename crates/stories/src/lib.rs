//! Year filtering, picker state and popup markup for the story map.
//!
//! Everything here is plain Rust with no browser dependency; the web app
//! drives it from DOM and map-widget callbacks.

pub mod config;
pub mod filter;
pub mod picker;
pub mod popup;
pub mod sanitize;
pub mod selection;
pub mod years;

pub use config::*;
pub use filter::*;
pub use picker::*;
pub use popup::*;
pub use sanitize::*;
pub use selection::*;
pub use years::*;
