//! The tile codec seam: serializing one tile's layered features into
//! bytes.

use anyhow::Result;
use kachel_core::{Blob, TileCoord, TilerError};
use kachel_geometry::{
	GeoFeature,
	vector_tile::{DEFAULT_EXTENT, TileTransform, VectorTile, VectorTileLayer},
};

/// Encodes one tile's features, grouped into named layers in insertion
/// order.
pub trait TileCodec: Send + Sync {
	fn encode_tile(&self, layers: &[(String, Vec<GeoFeature>)], coord: &TileCoord) -> Result<Blob>;

	/// File extension of the encoded tiles, without the leading dot.
	fn extension(&self) -> &str;
}

/// The production codec: Mapbox Vector Tiles.
pub struct MvtCodec {
	extent: u32,
}

impl MvtCodec {
	pub fn new() -> MvtCodec {
		MvtCodec {
			extent: DEFAULT_EXTENT,
		}
	}

	pub fn with_extent(extent: u32) -> MvtCodec {
		MvtCodec { extent }
	}
}

impl Default for MvtCodec {
	fn default() -> Self {
		Self::new()
	}
}

impl TileCodec for MvtCodec {
	fn encode_tile(&self, layers: &[(String, Vec<GeoFeature>)], coord: &TileCoord) -> Result<Blob> {
		let transform = TileTransform::from_coord(coord, self.extent)?;

		let mut tile = VectorTile::default();
		for (name, features) in layers {
			let mut layer = VectorTileLayer::new(name);
			layer.extent = self.extent;
			for feature in features {
				if let Err(err) = layer.add_feature(feature, &transform) {
					// degenerate geometry is recoverable per feature;
					// everything else aborts the tile
					match err.downcast_ref::<TilerError>() {
						Some(e) if e.is_per_feature() => {
							log::warn!("skipping feature in tile {coord}: {err:#}");
						}
						_ => return Err(err),
					}
				}
			}
			if !layer.is_empty() {
				tile.layers.push(layer);
			}
		}

		tile.to_blob()
	}

	fn extension(&self) -> &str {
		"mvt"
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use kachel_geometry::{GeoValue, Geometry};

	fn coord() -> TileCoord {
		// zoom-1 tile covering the north-east quadrant
		TileCoord::new(1, 1, 0).unwrap()
	}

	fn layers() -> Vec<(String, Vec<GeoFeature>)> {
		let mut poi = GeoFeature::new(Geometry::new_point([40.0, 40.0]));
		poi.set_property("name", "somewhere");
		vec![("pois".to_string(), vec![poi])]
	}

	#[test]
	fn encodes_a_decodable_tile() {
		let blob = MvtCodec::new().encode_tile(&layers(), &coord()).unwrap();
		let tile = VectorTile::from_blob(&blob).unwrap();
		assert_eq!(tile.layers.len(), 1);
		assert_eq!(tile.layers[0].name, "pois");
		assert_eq!(tile.layers[0].version, 2);
		assert_eq!(tile.layers[0].extent, 4096);

		let features = tile.layers[0].to_features().unwrap();
		assert_eq!(features.len(), 1);
		assert_eq!(features[0].properties.get("name"), Some(&GeoValue::from("somewhere")));
	}

	#[test]
	fn degenerate_features_are_skipped_not_fatal() {
		let mut layers = layers();
		layers[0]
			.1
			.push(GeoFeature::new(Geometry::new_line_string(&[[41.0, 41.0]])));
		let blob = MvtCodec::new().encode_tile(&layers, &coord()).unwrap();
		let tile = VectorTile::from_blob(&blob).unwrap();
		assert_eq!(tile.layers[0].features.len(), 1);
	}

	#[test]
	fn empty_layers_are_not_emitted() {
		let layers = vec![("empty".to_string(), vec![])];
		let blob = MvtCodec::new().encode_tile(&layers, &coord()).unwrap();
		let tile = VectorTile::from_blob(&blob).unwrap();
		assert!(tile.layers.is_empty());
	}

	#[test]
	fn extension_is_mvt() {
		assert_eq!(MvtCodec::new().extension(), "mvt");
	}
}
