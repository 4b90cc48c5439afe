//! Core value types: byte blobs, geographic bounding boxes and tile
//! addresses.

mod blob;
mod geo_bbox;
mod tile_coord;

pub use blob::*;
pub use geo_bbox::*;
pub use tile_coord::*;
