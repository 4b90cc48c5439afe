//! The top-level vector tile: a list of layers.

use super::layer::VectorTileLayer;
use anyhow::{Context, Result, bail};
use kachel_core::{Blob, io::*};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VectorTile {
	pub layers: Vec<VectorTileLayer>,
}

impl VectorTile {
	pub fn new(layers: Vec<VectorTileLayer>) -> VectorTile {
		VectorTile { layers }
	}

	pub fn from_blob(blob: &Blob) -> Result<VectorTile> {
		let mut reader = ValueReaderSlice::new_le(blob.as_slice());

		let mut tile = VectorTile::default();
		while reader.has_remaining() {
			match reader.read_pbf_key().context("failed to read PBF key")? {
				(3, 2) => tile.layers.push(
					VectorTileLayer::read(reader.get_pbf_sub_reader()?.as_mut()).context("failed to read layer")?,
				),
				(f, w) => bail!("unexpected field number ({f}) / wire type ({w}) in tile message"),
			}
		}

		Ok(tile)
	}

	pub fn to_blob(&self) -> Result<Blob> {
		let mut writer = ValueWriterBlob::new_le();

		for layer in &self.layers {
			writer.write_pbf_key(3, 2)?;
			writer.write_pbf_blob(&layer.to_blob()?)?;
		}

		Ok(writer.into_blob())
	}

	pub fn find_layer(&self, name: &str) -> Option<&VectorTileLayer> {
		self.layers.iter().find(|layer| layer.name == name)
	}
}
