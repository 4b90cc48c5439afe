//! A single vector-tile layer.
//!
//! The layer holds its features in compact wire form together with the
//! interned key/value tables. The PBF layout follows the MVT schema:
//! name (1), features (2), keys (3), values (4), extent (5), version (15).

use super::{
	feature::VectorTileFeature,
	project::{DEFAULT_EXTENT, TileTransform},
	property_tables::PropertyTables,
	value::GeoValuePBF,
};
use crate::geo::{GeoFeature, GeoValue};
use anyhow::{Context, Result, anyhow, bail};
use byteorder::LE;
use kachel_core::{
	Blob,
	io::{ValueReader, ValueWriter, ValueWriterBlob},
};

/// Layer version written by this encoder.
pub const LAYER_VERSION: u32 = 2;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VectorTileLayer {
	pub name: String,
	pub extent: u32,
	pub version: u32,
	pub features: Vec<VectorTileFeature>,
	pub tables: PropertyTables,
}

impl VectorTileLayer {
	/// Creates an empty layer with the standard extent and version.
	pub fn new(name: &str) -> VectorTileLayer {
		VectorTileLayer {
			name: name.to_string(),
			extent: DEFAULT_EXTENT,
			version: LAYER_VERSION,
			features: Vec::new(),
			tables: PropertyTables::new(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.features.is_empty()
	}

	/// Quantizes and appends one feature, interning its properties.
	///
	/// Reserved `@`-prefixed properties are rendering metadata and are not
	/// written into the tile.
	pub fn add_feature(&mut self, feature: &GeoFeature, transform: &TileTransform) -> Result<()> {
		let mut tag_ids = Vec::with_capacity(feature.properties.len() * 2);
		for (key, value) in feature.properties.iter() {
			if key.starts_with('@') {
				continue;
			}
			tag_ids.push(self.tables.keys.intern(key.clone()));
			tag_ids.push(self.tables.values.intern(value.clone()));
		}

		let encoded = VectorTileFeature::from_geometry(feature.id, tag_ids, &feature.geometry, transform)
			.context("failed to encode feature geometry")?;
		self.features.push(encoded);
		Ok(())
	}

	/// Decodes all features back into [`GeoFeature`]s with tile-local
	/// geometry. Used to verify encoded tiles.
	pub fn to_features(&self) -> Result<Vec<GeoFeature>> {
		self
			.features
			.iter()
			.map(|f| {
				let mut feature = GeoFeature::new(f.to_geometry().context("failed to decode feature geometry")?);
				feature.id = f.id;
				feature.properties = self.tables.decode_tags(&f.tag_ids)?;
				Ok(feature)
			})
			.collect()
	}

	/// Decodes a layer message.
	pub fn read<'a>(reader: &mut dyn ValueReader<'a, LE>) -> Result<VectorTileLayer> {
		let mut name = None;
		let mut extent = DEFAULT_EXTENT;
		let mut version = 1;
		let mut features = Vec::new();
		let mut tables = PropertyTables::new();

		while reader.has_remaining() {
			match reader.read_pbf_key().context("failed to read PBF key")? {
				(1, 2) => name = Some(reader.read_pbf_string().context("failed to read layer name")?),
				(2, 2) => features.push(
					VectorTileFeature::read(reader.get_pbf_sub_reader()?.as_mut()).context("failed to read feature")?,
				),
				(3, 2) => {
					tables.keys.intern(reader.read_pbf_string().context("failed to read key")?);
				}
				(4, 2) => {
					tables.values.intern(
						GeoValue::read(reader.get_pbf_sub_reader()?.as_mut()).context("failed to read value")?,
					);
				}
				(5, 0) => extent = u32::try_from(reader.read_varint().context("failed to read extent")?)?,
				(15, 0) => version = u32::try_from(reader.read_varint().context("failed to read version")?)?,
				(f, w) => bail!("unexpected field number ({f}) / wire type ({w}) in layer message"),
			}
		}

		Ok(VectorTileLayer {
			name: name.ok_or_else(|| anyhow!("layer name is required"))?,
			extent,
			version,
			features,
			tables,
		})
	}

	/// Encodes this layer as a PBF message. Extent and version are always
	/// written explicitly.
	pub fn to_blob(&self) -> Result<Blob> {
		let mut writer = ValueWriterBlob::new_le();

		writer.write_pbf_key(1, 2)?;
		writer.write_pbf_string(&self.name)?;

		for feature in &self.features {
			writer.write_pbf_key(2, 2)?;
			writer.write_pbf_blob(&feature.to_blob()?)?;
		}

		for key in self.tables.keys.iter() {
			writer.write_pbf_key(3, 2)?;
			writer.write_pbf_string(key)?;
		}

		for value in self.tables.values.iter() {
			writer.write_pbf_key(4, 2)?;
			writer.write_pbf_blob(&value.to_blob()?)?;
		}

		writer.write_pbf_key(5, 0)?;
		writer.write_varint(u64::from(self.extent))?;

		writer.write_pbf_key(15, 0)?;
		writer.write_varint(u64::from(self.version))?;

		Ok(writer.into_blob())
	}
}
