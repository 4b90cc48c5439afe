//! The disk-backed backend: adds are buffered in a sparse map and flushed
//! into one bucket file per tile under a temporary directory.
//!
//! Every flush re-reads, decodes, extends, re-encodes and rewrites each
//! touched bucket in full. Total flush work for a hot tile is therefore
//! superlinear in the number of flushes; this write amplification is the
//! intended trade for bounded memory.

use super::{BucketBuffer, CacheStats, FeatureCache, validate_zoom_levels};
use crate::bucket;
use anyhow::{Context, Result, anyhow};
use kachel_core::{Blob, GeoBBox, TileCoord, TilerError};
use kachel_geometry::{GeoCollection, GeoFeature};
use parking_lot::Mutex;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

pub struct OnDiskCache {
	inner: Mutex<Inner>,
}

struct Inner {
	zoom_levels: Vec<u8>,
	buffer: BucketBuffer,
	stats: CacheStats,
	pending: usize,
	flush_threshold: usize,
	dir: Option<TempDir>,
}

impl OnDiskCache {
	pub fn new(zoom_levels: &[u8], flush_threshold: usize) -> Result<OnDiskCache> {
		anyhow::ensure!(flush_threshold > 0, "flush threshold must be positive");
		let dir = TempDir::with_prefix("kachel-fscache-").context("failed to create cache directory")?;
		Ok(OnDiskCache {
			inner: Mutex::new(Inner {
				zoom_levels: validate_zoom_levels(zoom_levels)?,
				buffer: BucketBuffer::new(),
				stats: CacheStats::default(),
				pending: 0,
				flush_threshold,
				dir: Some(dir),
			}),
		})
	}
}

impl Inner {
	fn bucket_path(&self, coord: &TileCoord) -> Result<PathBuf> {
		let dir = self.dir.as_ref().ok_or_else(|| anyhow!("cache is closed"))?;
		Ok(dir.path().join(format!("{}-{}-{}", coord.level, coord.x, coord.y)))
	}

	/// Merges every buffered bucket into its file and clears the buffer.
	/// Runs under the cache lock; producers block until it returns.
	fn flush(&mut self) -> Result<()> {
		let buckets = std::mem::take(&mut self.buffer.buckets);
		for (coord, features) in buckets {
			let path = self.bucket_path(&coord)?;
			let mut collection = if path.exists() {
				let data = Blob::from(fs::read(&path).map_err(TilerError::Io)?);
				bucket::decode_collection(&data).with_context(|| format!("failed to decode bucket {coord}"))?
			} else {
				GeoCollection::new()
			};
			collection.features.extend(features);
			let encoded = bucket::encode_collection(&collection)?;
			fs::write(&path, encoded.as_slice()).map_err(TilerError::Io)?;
		}
		self.pending = 0;
		Ok(())
	}
}

impl FeatureCache for OnDiskCache {
	fn add_feature(&self, feature: GeoFeature) -> Result<()> {
		let mut inner = self.inner.lock();
		anyhow::ensure!(inner.dir.is_some(), "cache is closed");
		inner.stats.record(&feature);
		let zoom_levels = inner.zoom_levels.clone();
		inner.buffer.add(&zoom_levels, &feature)?;

		inner.pending += 1;
		if inner.pending >= inner.flush_threshold {
			log::debug!("flushing {} buffered buckets to disk", inner.buffer.buckets.len());
			inner.flush()?;
		}
		Ok(())
	}

	fn get_features(&self, coord: &TileCoord) -> Result<Vec<GeoFeature>> {
		let inner = self.inner.lock();
		let path = inner.bucket_path(coord)?;
		let mut features = if path.exists() {
			let data = Blob::from(fs::read(&path).map_err(TilerError::Io)?);
			bucket::decode_collection(&data)
				.with_context(|| format!("failed to decode bucket {coord}"))?
				.features
		} else {
			Vec::new()
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
		if let Some(dir) = inner.dir.take() {
			dir.close().context("failed to remove cache directory")?;
		}
		Ok(())
	}
}
