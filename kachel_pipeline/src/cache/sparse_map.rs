//! The sparse in-memory backend: a map keyed by tile address. Memory
//! follows the number of occupied tiles, making this the default choice.

use super::{BucketBuffer, CacheStats, FeatureCache, validate_zoom_levels};
use anyhow::Result;
use kachel_core::{GeoBBox, TileCoord};
use kachel_geometry::GeoFeature;
use parking_lot::Mutex;

pub struct SparseMapCache {
	inner: Mutex<Inner>,
}

struct Inner {
	zoom_levels: Vec<u8>,
	buckets: BucketBuffer,
	stats: CacheStats,
}

impl SparseMapCache {
	pub fn new(zoom_levels: &[u8]) -> Result<SparseMapCache> {
		Ok(SparseMapCache {
			inner: Mutex::new(Inner {
				zoom_levels: validate_zoom_levels(zoom_levels)?,
				buckets: BucketBuffer::new(),
				stats: CacheStats::default(),
			}),
		})
	}
}

impl FeatureCache for SparseMapCache {
	fn add_feature(&self, feature: GeoFeature) -> Result<()> {
		let mut inner = self.inner.lock();
		inner.stats.record(&feature);
		let zoom_levels = inner.zoom_levels.clone();
		inner.buckets.add(&zoom_levels, &feature)
	}

	fn get_features(&self, coord: &TileCoord) -> Result<Vec<GeoFeature>> {
		Ok(self.inner.lock().buckets.get(coord))
	}

	fn bbox(&self) -> Option<GeoBBox> {
		self.inner.lock().stats.bbox
	}

	fn count(&self) -> u64 {
		self.inner.lock().stats.count
	}

	fn close(&self) -> Result<()> {
		self.inner.lock().buckets.clear();
		Ok(())
	}
}
