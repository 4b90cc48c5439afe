//! The embedded-KV backend: adds are buffered in a sparse map and flushed
//! into a SQLite database, one row per tile.
//!
//! Flushing merges with any existing row: the stored bucket is read,
//! decoded, extended with the buffered features, re-encoded and written
//! back. The same write amplification as the disk backend applies.

use super::{BucketBuffer, CacheStats, FeatureCache, validate_zoom_levels};
use crate::bucket;
use anyhow::{Context, Result, anyhow};
use kachel_core::{Blob, GeoBBox, TileCoord};
use kachel_geometry::{GeoCollection, GeoFeature};
use parking_lot::Mutex;
use r2d2::Pool;
use r2d2_sqlite::{
	SqliteConnectionManager,
	rusqlite::{OptionalExtension, params},
};
use tempfile::TempDir;

pub struct SqliteCache {
	inner: Mutex<Inner>,
}

struct Inner {
	zoom_levels: Vec<u8>,
	buffer: BucketBuffer,
	stats: CacheStats,
	pending: usize,
	flush_threshold: usize,
	pool: Option<Pool<SqliteConnectionManager>>,
	dir: Option<TempDir>,
}

impl SqliteCache {
	pub fn new(zoom_levels: &[u8], flush_threshold: usize) -> Result<SqliteCache> {
		anyhow::ensure!(flush_threshold > 0, "flush threshold must be positive");
		let dir = TempDir::with_prefix("kachel-kvcache-").context("failed to create cache directory")?;
		let manager = SqliteConnectionManager::file(dir.path().join("buckets.sqlite"));
		let pool = Pool::builder()
			.max_size(4)
			.build(manager)
			.context("failed to open bucket store")?;

		pool
			.get()?
			.execute_batch("CREATE TABLE IF NOT EXISTS buckets (key TEXT PRIMARY KEY, data BLOB NOT NULL);")?;

		Ok(SqliteCache {
			inner: Mutex::new(Inner {
				zoom_levels: validate_zoom_levels(zoom_levels)?,
				buffer: BucketBuffer::new(),
				stats: CacheStats::default(),
				pending: 0,
				flush_threshold,
				pool: Some(pool),
				dir: Some(dir),
			}),
		})
	}
}

impl Inner {
	fn pool(&self) -> Result<&Pool<SqliteConnectionManager>> {
		self.pool.as_ref().ok_or_else(|| anyhow!("cache is closed"))
	}

	fn read_bucket(&self, coord: &TileCoord) -> Result<Option<GeoCollection>> {
		let conn = self.pool()?.get()?;
		let row: Option<Vec<u8>> = conn
			.query_row(
				"SELECT data FROM buckets WHERE key = ?1",
				params![coord.to_string()],
				|row| row.get(0),
			)
			.optional()?;
		match row {
			Some(data) => Ok(Some(
				bucket::decode_collection(&Blob::from(data)).with_context(|| format!("failed to decode bucket {coord}"))?,
			)),
			None => Ok(None),
		}
	}

	/// Merges every buffered bucket into its row and clears the buffer.
	/// Runs under the cache lock; producers block until it returns.
	fn flush(&mut self) -> Result<()> {
		let buckets = std::mem::take(&mut self.buffer.buckets);
		for (coord, features) in buckets {
			let mut collection = self.read_bucket(&coord)?.unwrap_or_default();
			collection.features.extend(features);
			let encoded = bucket::encode_collection(&collection)?;

			let conn = self.pool()?.get()?;
			conn.execute(
				"INSERT OR REPLACE INTO buckets (key, data) VALUES (?1, ?2)",
				params![coord.to_string(), encoded.as_slice()],
			)?;
		}
		self.pending = 0;
		Ok(())
	}
}

impl FeatureCache for SqliteCache {
	fn add_feature(&self, feature: GeoFeature) -> Result<()> {
		let mut inner = self.inner.lock();
		anyhow::ensure!(inner.pool.is_some(), "cache is closed");
		inner.stats.record(&feature);
		let zoom_levels = inner.zoom_levels.clone();
		inner.buffer.add(&zoom_levels, &feature)?;

		inner.pending += 1;
		if inner.pending >= inner.flush_threshold {
			log::debug!("flushing {} buffered buckets to the bucket store", inner.buffer.buckets.len());
			inner.flush()?;
		}
		Ok(())
	}

	fn get_features(&self, coord: &TileCoord) -> Result<Vec<GeoFeature>> {
		let inner = self.inner.lock();
		let mut features = match inner.read_bucket(coord)? {
			Some(collection) => collection.features,
			None => Vec::new(),
		};
		// the tail still sitting in the buffer is part of the bucket too
		features.extend(inner.buffer.get(coord));
		Ok(features)
	}

	fn bbox(&self) -> Option<GeoBBox> {
		self.inner.lock().stats.bbox
	}

	fn count(&self) -> u64 {
		self.inner.lock().stats.count
	}

	fn close(&self) -> Result<()> {
		let mut inner = self.inner.lock();
		inner.buffer.clear();
		inner.pool = None;
		if let Some(dir) = inner.dir.take() {
			dir.close().context("failed to remove cache directory")?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use kachel_geometry::Geometry;

	fn point_feature(id: u64, x: f64, y: f64) -> GeoFeature {
		let mut feature = GeoFeature::new(Geometry::new_point([x, y]));
		feature.set_id(id);
		feature
	}

	#[test]
	fn flush_merges_with_the_stored_row() {
		let cache = SqliteCache::new(&[5], 2).unwrap();
		for id in 0..5 {
			cache.add_feature(point_feature(id, 8.0, 47.0)).unwrap();
		}
		// ids 0..3 flushed in two batches, id 4 still buffered
		let coord = TileCoord::from_geo(8.0, 47.0, 5).unwrap();
		let mut ids: Vec<Option<u64>> = cache
			.get_features(&coord)
			.unwrap()
			.iter()
			.map(|f| f.id)
			.collect();
		ids.sort();
		assert_eq!(ids, (0..5).map(Some).collect::<Vec<_>>());
		cache.close().unwrap();
	}

	#[test]
	fn properties_survive_the_store() {
		let cache = SqliteCache::new(&[5], 1).unwrap();
		let mut feature = point_feature(7, 8.0, 47.0);
		feature.set_property("name", "station");
		feature.set_property("elevation", 411);
		cache.add_feature(feature.clone()).unwrap();

		let coord = TileCoord::from_geo(8.0, 47.0, 5).unwrap();
		let stored = cache.get_features(&coord).unwrap();
		assert_eq!(stored, vec![feature]);
		cache.close().unwrap();
	}

	#[test]
	fn close_is_idempotent_and_final() {
		let cache = SqliteCache::new(&[5], 10).unwrap();
		cache.add_feature(point_feature(1, 8.0, 47.0)).unwrap();
		cache.close().unwrap();
		cache.close().unwrap();
		assert!(cache.add_feature(point_feature(2, 8.0, 47.0)).is_err());
	}
}
