pub mod lon_lat;

pub use lon_lat::*;
