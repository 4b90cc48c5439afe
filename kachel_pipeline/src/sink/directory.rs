//! Filesystem sink: `{basedir}/{z}/{x}/{y}.{ext}`, optionally gzipped.

use super::TileSink;
use anyhow::Result;
use flate2::{Compression, write::GzEncoder};
use kachel_core::{Blob, TileCoord, TilerError};
use std::{fs, io::Write, path::PathBuf};

pub struct DirectoryTileSink {
	basedir: PathBuf,
	compress: bool,
}

impl DirectoryTileSink {
	pub fn new(basedir: impl Into<PathBuf>) -> DirectoryTileSink {
		DirectoryTileSink {
			basedir: basedir.into(),
			compress: false,
		}
	}

	/// Gzip every tile, appending `.gz` to the file name.
	pub fn with_compression(mut self) -> DirectoryTileSink {
		self.compress = true;
		self
	}
}

impl TileSink for DirectoryTileSink {
	fn write_tile(&self, coord: &TileCoord, data: &Blob, extension: &str) -> Result<()> {
		let dir = self.basedir.join(coord.level.to_string()).join(coord.x.to_string());
		fs::create_dir_all(&dir).map_err(TilerError::Io)?;

		if self.compress {
			let path = dir.join(format!("{}.{extension}.gz", coord.y));
			let file = fs::File::create(&path).map_err(TilerError::Io)?;
			let mut encoder = GzEncoder::new(file, Compression::default());
			encoder.write_all(data.as_slice()).map_err(TilerError::Io)?;
			encoder.finish().map_err(TilerError::Io)?;
		} else {
			let path = dir.join(format!("{}.{extension}", coord.y));
			fs::write(&path, data.as_slice()).map_err(TilerError::Io)?;
		}
		Ok(())
	}
}
