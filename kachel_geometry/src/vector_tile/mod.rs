//! Mapbox Vector Tile (MVT) wire format.
//!
//! Implements the protobuf-style tile encoding: a tile is a list of layers
//! (field 3); each layer carries its name, feature list, interned key/value
//! tables, extent and version; each feature carries a geometry type tag and
//! a command stream of zigzag-encoded coordinate deltas.
//!
//! Submodules:
//! - [`geometry_type`]: wire-level geometry type tag.
//! - [`project`]: quantization of geographic coordinates into the
//!   tile-local integer grid.
//! - [`property_tables`]: interned per-layer key/value tables.
//! - [`feature`]: command-stream encoding per feature.
//! - [`layer`], [`tile`]: the containers.
//! - [`value`]: typed MVT property values.

mod feature;
mod geometry_type;
mod layer;
mod project;
mod property_tables;
mod tile;
mod value;

pub use feature::VectorTileFeature;
pub use geometry_type::GeomType;
pub use layer::VectorTileLayer;
pub use project::{DEFAULT_EXTENT, TileTransform};
pub use property_tables::PropertyTables;
pub use tile::VectorTile;
pub use value::GeoValuePBF;
