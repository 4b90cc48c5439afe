//! In-memory sink using the object-store key layout `{z}/{x}/{y}.{ext}`.
//! Used in tests and as the reference for object-store backed sinks.

use super::TileSink;
use anyhow::Result;
use kachel_core::{Blob, TileCoord};
use parking_lot::Mutex;
use std::collections::BTreeMap;

#[derive(Default)]
pub struct MemoryTileSink {
	tiles: Mutex<BTreeMap<String, Blob>>,
}

impl MemoryTileSink {
	pub fn new() -> MemoryTileSink {
		MemoryTileSink::default()
	}

	/// The object key of one tile.
	pub fn key(coord: &TileCoord, extension: &str) -> String {
		format!("{}/{}/{}.{extension}", coord.level, coord.x, coord.y)
	}

	pub fn get(&self, key: &str) -> Option<Blob> {
		self.tiles.lock().get(key).cloned()
	}

	pub fn keys(&self) -> Vec<String> {
		self.tiles.lock().keys().cloned().collect()
	}

	pub fn len(&self) -> usize {
		self.tiles.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.tiles.lock().is_empty()
	}
}

impl TileSink for MemoryTileSink {
	fn write_tile(&self, coord: &TileCoord, data: &Blob, extension: &str) -> Result<()> {
		self.tiles.lock().insert(Self::key(coord, extension), data.clone());
		Ok(())
	}
}
