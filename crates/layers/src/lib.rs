pub mod cluster;
pub mod layer;
pub mod symbology;

pub use cluster::*;
pub use layer::*;
pub use symbology::*;
