//! The dense in-memory backend: one pre-allocated `2^z x 2^z` grid per
//! configured zoom level.
//!
//! Fast for low zoom levels because bucket lookup is plain indexing, but
//! memory grows with 4^z regardless of occupancy, so construction is
//! capped at zoom 12.

use super::{CacheStats, FeatureCache, renderable, validate_zoom_levels};
use anyhow::{Result, ensure};
use kachel_core::{GeoBBox, TileCoord};
use kachel_geometry::GeoFeature;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Highest zoom level the dense grid will pre-allocate.
const MAX_DENSE_LEVEL: u8 = 12;

pub struct DenseGridCache {
	inner: Mutex<Inner>,
}

struct Inner {
	zoom_levels: Vec<u8>,
	grids: HashMap<u8, Vec<Vec<GeoFeature>>>,
	stats: CacheStats,
}

impl DenseGridCache {
	pub fn new(zoom_levels: &[u8]) -> Result<DenseGridCache> {
		let zoom_levels = validate_zoom_levels(zoom_levels)?;
		let mut grids = HashMap::new();
		for &level in &zoom_levels {
			ensure!(
				level <= MAX_DENSE_LEVEL,
				"dense grid would need {} cells at zoom {level}; use a sparse backend",
				4u64.pow(u32::from(level))
			);
			let side = 1usize << level;
			grids.insert(level, vec![Vec::new(); side * side]);
		}
		Ok(DenseGridCache {
			inner: Mutex::new(Inner {
				zoom_levels,
				grids,
				stats: CacheStats::default(),
			}),
		})
	}
}

fn cell_index(coord: &TileCoord) -> usize {
	((coord.x as usize) << coord.level) + coord.y as usize
}

impl FeatureCache for DenseGridCache {
	fn add_feature(&self, feature: GeoFeature) -> Result<()> {
		let mut inner = self.inner.lock();
		inner.stats.record(&feature);

		let Some(bbox) = feature.geometry.bbox() else {
			return Ok(());
		};
		for level in inner.zoom_levels.clone() {
			if !renderable(&feature.properties, level) {
				continue;
			}
			let coverage = bbox.coverage(level)?;
			let grid = inner.grids.get_mut(&level).expect("grid exists for every level");
			for coord in coverage {
				grid[cell_index(&coord)].push(feature.clone());
			}
		}
		Ok(())
	}

	fn get_features(&self, coord: &TileCoord) -> Result<Vec<GeoFeature>> {
		let inner = self.inner.lock();
		Ok(match inner.grids.get(&coord.level) {
			Some(grid) => grid.get(cell_index(coord)).cloned().unwrap_or_default(),
			None => Vec::new(),
		})
	}

	fn bbox(&self) -> Option<GeoBBox> {
		self.inner.lock().stats.bbox
	}

	fn count(&self) -> u64 {
		self.inner.lock().stats.count
	}

	fn close(&self) -> Result<()> {
		let mut inner = self.inner.lock();
		inner.grids.clear();
		Ok(())
	}
}
