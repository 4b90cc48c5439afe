//! Geometry support for the kachel tiling pipeline.
//!
//! Provides the feature data model (geometries, properties, collections),
//! Web-Mercator projection, clipping of geometries to tile rectangles, WKB
//! serialization, and the Mapbox Vector Tile wire codec.

mod geo;

pub mod clip;
pub mod mercator;
pub mod vector_tile;
pub mod wkb;

pub use geo::*;
