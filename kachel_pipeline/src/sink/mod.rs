//! Tile sinks: where encoded tiles end up.

mod directory;
mod memory;

pub use directory::DirectoryTileSink;
pub use memory::MemoryTileSink;

use anyhow::Result;
use kachel_core::{Blob, TileCoord};

/// Persists encoded tiles. Implementations must be callable from several
/// generation workers at once.
pub trait TileSink: Send + Sync {
	fn write_tile(&self, coord: &TileCoord, data: &Blob, extension: &str) -> Result<()>;
}
