//! Feature caches: bucketing features per tile address across the
//! configured zoom levels.
//!
//! All four backends share the same contract: `add_feature` buckets a
//! feature into every tile it is renderable on, `get_features` reads one
//! tile's bucket, and the cumulative count/bbox reflect every added
//! feature regardless of renderability. Mutation is serialized behind one
//! mutex per cache; durable backends flush their write buffer
//! synchronously under that same lock, so a flush blocks concurrent
//! producers until it completes.

mod dense_grid;
mod on_disk;
mod sparse_map;
mod sqlite;

pub use dense_grid::DenseGridCache;
pub use on_disk::OnDiskCache;
pub use sparse_map::SparseMapCache;
pub use sqlite::SqliteCache;

use anyhow::Result;
use kachel_core::{GeoBBox, TileCoord};
use kachel_geometry::{GeoFeature, GeoProperties, KEY_ZOOM_MAX, KEY_ZOOM_MIN};
use std::collections::HashMap;

/// Number of `add_feature` calls between flushes of the durable backends.
pub const DEFAULT_FLUSH_THRESHOLD: usize = 100_000;

/// A tile-bucketing feature cache.
///
/// Implementations are safe to share across producer threads; all mutation
/// is serialized internally.
pub trait FeatureCache: Send + Sync {
	/// Buckets a feature into every covered tile of every configured zoom
	/// level it is renderable on, and updates the cumulative count and
	/// bbox.
	fn add_feature(&self, feature: GeoFeature) -> Result<()>;

	/// Returns one tile's bucket. An empty or absent bucket is an empty
	/// vector, never an error.
	fn get_features(&self, coord: &TileCoord) -> Result<Vec<GeoFeature>>;

	/// Union of the bboxes of all added features; `None` before the first
	/// add.
	fn bbox(&self) -> Option<GeoBBox>;

	/// Number of `add_feature` calls (not bucket entries).
	fn count(&self) -> u64;

	/// Releases backing resources. Also performed on drop; calling any
	/// other method afterwards is an error for durable backends.
	fn close(&self) -> Result<()>;
}

/// Cache backend selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheKind {
	/// Pre-allocated per-zoom grid; O(4^z) cells regardless of occupancy.
	DenseGrid,
	/// Map keyed by tile address; the default general-purpose choice.
	SparseMap,
	/// Buffered map flushed into one file per tile.
	OnDisk,
	/// Buffered map flushed into an embedded SQLite store.
	Sqlite,
}

impl CacheKind {
	/// Creates a cache of this kind for the given zoom levels.
	pub fn create(&self, zoom_levels: &[u8]) -> Result<Box<dyn FeatureCache>> {
		Ok(match self {
			CacheKind::DenseGrid => Box::new(DenseGridCache::new(zoom_levels)?),
			CacheKind::SparseMap => Box::new(SparseMapCache::new(zoom_levels)?),
			CacheKind::OnDisk => Box::new(OnDiskCache::new(zoom_levels, DEFAULT_FLUSH_THRESHOLD)?),
			CacheKind::Sqlite => Box::new(SqliteCache::new(zoom_levels, DEFAULT_FLUSH_THRESHOLD)?),
		})
	}
}

/// The renderability predicate: a feature renders at `level` if its
/// optional `@zoom:min`/`@zoom:max` properties allow it.
pub(crate) fn renderable(properties: &GeoProperties, level: u8) -> bool {
	let level = i64::from(level);
	level >= zoom_property(properties, KEY_ZOOM_MIN, 0) && level <= zoom_property(properties, KEY_ZOOM_MAX, 99)
}

fn zoom_property(properties: &GeoProperties, key: &str, default: i64) -> i64 {
	match properties.get(key) {
		None => default,
		Some(value) => value.as_int().unwrap_or_else(|| {
			log::warn!("property {key} is not numeric ({value:?}), using default {default}");
			default
		}),
	}
}

/// Cumulative count and bbox, identical across backends.
#[derive(Debug, Default)]
pub(crate) struct CacheStats {
	pub count: u64,
	pub bbox: Option<GeoBBox>,
}

impl CacheStats {
	/// Records one added feature.
	pub fn record(&mut self, feature: &GeoFeature) {
		self.count += 1;
		if let Some(feature_bbox) = feature.geometry.bbox() {
			match &mut self.bbox {
				Some(bbox) => bbox.extend(&feature_bbox),
				None => self.bbox = Some(feature_bbox),
			}
		}
	}
}

/// The sparse per-tile buffer shared by the map backend and the write
/// buffers of the durable backends.
#[derive(Debug, Default)]
pub(crate) struct BucketBuffer {
	pub buckets: HashMap<TileCoord, Vec<GeoFeature>>,
}

impl BucketBuffer {
	pub fn new() -> BucketBuffer {
		BucketBuffer {
			buckets: HashMap::new(),
		}
	}

	/// Appends the feature to every covered tile of every renderable zoom
	/// level.
	pub fn add(&mut self, zoom_levels: &[u8], feature: &GeoFeature) -> Result<()> {
		let Some(bbox) = feature.geometry.bbox() else {
			// empty geometry covers no tiles
			return Ok(());
		};
		for &level in zoom_levels {
			if !renderable(&feature.properties, level) {
				continue;
			}
			for coord in bbox.coverage(level)? {
				self.buckets.entry(coord).or_default().push(feature.clone());
			}
		}
		Ok(())
	}

	pub fn get(&self, coord: &TileCoord) -> Vec<GeoFeature> {
		self.buckets.get(coord).cloned().unwrap_or_default()
	}

	pub fn clear(&mut self) {
		self.buckets.clear();
	}
}

pub(crate) fn validate_zoom_levels(zoom_levels: &[u8]) -> Result<Vec<u8>> {
	anyhow::ensure!(!zoom_levels.is_empty(), "at least one zoom level is required");
	for &level in zoom_levels {
		anyhow::ensure!(level <= 30, "zoom level {level} is out of range");
	}
	Ok(zoom_levels.to_vec())
}
