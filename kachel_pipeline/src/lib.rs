//! The kachel tiling pipeline.
//!
//! Feeds a feature collection through a zoom-bucketing cache, clips every
//! feature to its tiles, groups them into named layers and encodes each
//! tile into the vector-tile wire format:
//!
//! ```text
//! GeoCollection -> FeatureCache -> clip -> classify -> encode -> TileSink
//! ```

pub mod bucket;
pub mod cache;
pub mod classify;
pub mod codec;
pub mod driver;
pub mod sink;

pub use cache::{CacheKind, FeatureCache};
pub use classify::{LayerClassifier, PropertyClassifier};
pub use codec::{MvtCodec, TileCodec};
pub use driver::{CancellationFlag, GenerateOptions, generate_tiles, generate_tiles_from_collection, plan_tiles};
pub use sink::{DirectoryTileSink, MemoryTileSink, TileSink};
