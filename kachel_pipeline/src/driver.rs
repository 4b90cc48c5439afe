//! The tile driver: fetch, clip, classify, encode, emit.
//!
//! Tile generation only reads the cache, so tile addresses are sharded
//! across scoped worker threads with no shared mutable state beyond the
//! cache's read path and the sink. The first error aborts the run; a
//! degenerate geometry only costs the offending feature.

use crate::{cache::FeatureCache, cache::renderable, classify::LayerClassifier, codec::TileCodec, sink::TileSink};
use anyhow::{Result, anyhow};
use itertools::Itertools;
use kachel_core::{TileCoord, TilerError, WorkerLimits};
use kachel_geometry::{GeoCollection, GeoFeature, clip::clip_geometry};
use std::sync::{
	Arc,
	atomic::{AtomicBool, Ordering},
};

/// Run-scoped cancellation. Checked between tiles; cancelling never
/// corrupts tiles or buckets that are already written.
#[derive(Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
	pub fn new() -> CancellationFlag {
		CancellationFlag::default()
	}

	pub fn cancel(&self) {
		self.0.store(true, Ordering::Relaxed);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::Relaxed)
	}
}

/// Options of one generation run.
pub struct GenerateOptions {
	/// Number of worker threads sharding the tile addresses.
	pub workers: usize,
	/// Cooperative cancellation; share a clone to cancel from outside.
	pub cancellation: CancellationFlag,
}

impl Default for GenerateOptions {
	fn default() -> Self {
		GenerateOptions {
			workers: WorkerLimits::default().generate,
			cancellation: CancellationFlag::new(),
		}
	}
}

/// Enumerates the tiles to generate: the coverage of the cache's
/// cumulative bbox on every zoom level.
pub fn plan_tiles(cache: &dyn FeatureCache, zoom_levels: &[u8]) -> Result<Vec<TileCoord>> {
	let Some(bbox) = cache.bbox() else {
		return Ok(Vec::new());
	};
	zoom_levels
		.iter()
		.map(|&level| bbox.coverage(level))
		.flatten_ok()
		.collect()
}

/// Generates all given tiles from a feature cache.
///
/// Candidate features come from the cache bucket of each tile. Tiles whose
/// layers all end up empty are skipped entirely.
pub fn generate_tiles(
	coords: &[TileCoord],
	cache: &dyn FeatureCache,
	codec: &dyn TileCodec,
	classifier: &dyn LayerClassifier,
	sink: &dyn TileSink,
	options: &GenerateOptions,
) -> Result<()> {
	run_sharded(coords, options, &|coord| {
		let candidates = cache.get_features(coord)?;
		render_tile(coord, &candidates, codec, classifier, sink)
	})
}

/// Generates tiles directly from an in-memory collection, filtering the
/// full feature set against every tile's bbox.
///
/// This is a small-dataset shortcut; the cache-bucketing path of
/// [`generate_tiles`] is the scalable architecture.
pub fn generate_tiles_from_collection(
	coords: &[TileCoord],
	collection: &GeoCollection,
	codec: &dyn TileCodec,
	classifier: &dyn LayerClassifier,
	sink: &dyn TileSink,
	options: &GenerateOptions,
) -> Result<()> {
	run_sharded(coords, options, &|coord| {
		let tile_bbox = coord.as_geo_bbox();
		let candidates: Vec<GeoFeature> = collection
			.features
			.iter()
			.filter(|f| renderable(&f.properties, coord.level))
			.filter(|f| f.geometry.bbox().is_some_and(|b| b.overlaps(&tile_bbox)))
			.cloned()
			.collect();
		render_tile(coord, &candidates, codec, classifier, sink)
	})
}

fn run_sharded(
	coords: &[TileCoord],
	options: &GenerateOptions,
	render: &(dyn Fn(&TileCoord) -> Result<()> + Sync),
) -> Result<()> {
	if coords.is_empty() {
		return Ok(());
	}

	let workers = options.workers.clamp(1, coords.len());
	let chunk_size = coords.len().div_ceil(workers);
	let cancellation = &options.cancellation;

	std::thread::scope(|scope| {
		let handles: Vec<_> = coords
			.chunks(chunk_size)
			.map(|chunk| {
				scope.spawn(move || -> Result<()> {
					for coord in chunk {
						if cancellation.is_cancelled() {
							log::debug!("tile generation cancelled");
							return Ok(());
						}
						render(coord)?;
					}
					Ok(())
				})
			})
			.collect();

		for handle in handles {
			handle.join().map_err(|_| anyhow!("tile worker panicked"))??;
		}
		Ok(())
	})
}

/// Renders one tile from its candidate features.
fn render_tile(
	coord: &TileCoord,
	candidates: &[GeoFeature],
	codec: &dyn TileCodec,
	classifier: &dyn LayerClassifier,
	sink: &dyn TileSink,
) -> Result<()> {
	if candidates.is_empty() {
		return Ok(());
	}

	let tile_bbox = coord.as_geo_bbox();
	let mut layers: Vec<(String, Vec<GeoFeature>)> = Vec::new();

	for feature in candidates {
		let pieces = match clip_geometry(&feature.geometry, &tile_bbox) {
			Ok(pieces) => pieces,
			Err(err) => match err.downcast_ref::<TilerError>() {
				Some(e) if e.is_per_feature() => {
					log::warn!("skipping feature in tile {coord}: {err:#}");
					continue;
				}
				_ => return Err(err),
			},
		};
		if pieces.is_empty() {
			continue;
		}

		let Some(layer_name) = classifier.layer_name(&feature.properties)? else {
			continue;
		};

		let index = match layers.iter().position(|(name, _)| *name == layer_name) {
			Some(index) => index,
			None => {
				layers.push((layer_name, Vec::new()));
				layers.len() - 1
			}
		};
		layers[index]
			.1
			.extend(pieces.into_iter().map(|geometry| feature.with_geometry(geometry)));
	}

	if layers.iter().all(|(_, bucket)| bucket.is_empty()) {
		// no empty tiles are emitted
		return Ok(());
	}

	let blob = codec.encode_tile(&layers, coord)?;
	sink.write_tile(coord, &blob, codec.extension())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		cache::SparseMapCache,
		classify::PropertyClassifier,
		codec::MvtCodec,
		sink::MemoryTileSink,
	};
	use kachel_geometry::{GeoValue, Geometry, vector_tile::VectorTile};

	fn sample_collection() -> GeoCollection {
		let mut poi = GeoFeature::new(Geometry::new_point([13.40, 52.52]));
		poi.set_id(1);
		poi.set_property("name", "center");

		let mut river = GeoFeature::new(Geometry::new_line_string(&[[13.1, 52.4], [13.6, 52.6]]));
		river.set_id(2);
		river.set_property("@layer", "water");

		GeoCollection::from(vec![poi, river])
	}

	fn filled_cache() -> SparseMapCache {
		let cache = SparseMapCache::new(&[7]).unwrap();
		for feature in sample_collection() {
			cache.add_feature(feature).unwrap();
		}
		cache
	}

	#[test]
	fn plan_tiles_covers_the_cache_bbox() {
		let cache = filled_cache();
		let coords = plan_tiles(&cache, &[7]).unwrap();
		assert!(!coords.is_empty());
		for coord in &coords {
			assert_eq!(coord.level, 7);
		}
		// empty cache plans nothing
		let empty = SparseMapCache::new(&[7]).unwrap();
		assert!(plan_tiles(&empty, &[7]).unwrap().is_empty());
	}

	#[test]
	fn generates_decodable_tiles_with_layers() {
		let cache = filled_cache();
		let coords = plan_tiles(&cache, &[7]).unwrap();
		let sink = MemoryTileSink::new();
		let codec = MvtCodec::new();
		let classifier = PropertyClassifier::with_default();

		generate_tiles(
			&coords,
			&cache,
			&codec,
			&classifier,
			&sink,
			&GenerateOptions::default(),
		)
		.unwrap();

		assert!(!sink.is_empty());
		// the tile containing the point feature carries both layers
		let coord = TileCoord::from_geo(13.40, 52.52, 7).unwrap();
		let blob = sink.get(&MemoryTileSink::key(&coord, "mvt")).unwrap();
		let tile = VectorTile::from_blob(&blob).unwrap();
		assert!(tile.find_layer("default").is_some());
		assert!(tile.find_layer("water").is_some());

		let pois = tile.find_layer("default").unwrap().to_features().unwrap();
		assert_eq!(pois.len(), 1);
		assert_eq!(pois[0].properties.get("name"), Some(&GeoValue::from("center")));
	}

	#[test]
	fn features_without_layer_are_dropped() {
		let cache = filled_cache();
		let coords = plan_tiles(&cache, &[7]).unwrap();
		let sink = MemoryTileSink::new();
		let codec = MvtCodec::new();
		// no default layer: only the explicit @layer feature survives
		let classifier = PropertyClassifier::new(None);

		generate_tiles(
			&coords,
			&cache,
			&codec,
			&classifier,
			&sink,
			&GenerateOptions::default(),
		)
		.unwrap();

		for key in sink.keys() {
			let tile = VectorTile::from_blob(&sink.get(&key).unwrap()).unwrap();
			assert!(tile.find_layer("default").is_none());
			assert!(tile.find_layer("water").is_some());
		}
	}

	#[test]
	fn empty_tiles_are_skipped() {
		let cache = filled_cache();
		// a tile far away from all features
		let coord = TileCoord::new(7, 0, 0).unwrap();
		let sink = MemoryTileSink::new();
		generate_tiles(
			&[coord],
			&cache,
			&MvtCodec::new(),
			&PropertyClassifier::with_default(),
			&sink,
			&GenerateOptions::default(),
		)
		.unwrap();
		assert!(sink.is_empty());
	}

	#[test]
	fn classifier_errors_abort_the_run() {
		let cache = SparseMapCache::new(&[7]).unwrap();
		let mut feature = GeoFeature::new(Geometry::new_point([13.4, 52.5]));
		feature.set_property("@layer", 7); // not a string
		cache.add_feature(feature).unwrap();

		let coords = plan_tiles(&cache, &[7]).unwrap();
		let sink = MemoryTileSink::new();
		let result = generate_tiles(
			&coords,
			&cache,
			&MvtCodec::new(),
			&PropertyClassifier::with_default(),
			&sink,
			&GenerateOptions::default(),
		);
		assert!(result.is_err());
	}

	#[test]
	fn cancellation_stops_the_run_cleanly() {
		let cache = filled_cache();
		let coords = plan_tiles(&cache, &[7]).unwrap();
		let sink = MemoryTileSink::new();
		let options = GenerateOptions::default();
		options.cancellation.cancel();

		generate_tiles(
			&coords,
			&cache,
			&MvtCodec::new(),
			&PropertyClassifier::with_default(),
			&sink,
			&options,
		)
		.unwrap();
		assert!(sink.is_empty());
	}

	#[test]
	fn collection_path_matches_the_cache_path() {
		let collection = sample_collection();
		let cache = filled_cache();
		let coords = plan_tiles(&cache, &[7]).unwrap();

		let cache_sink = MemoryTileSink::new();
		let collection_sink = MemoryTileSink::new();
		let codec = MvtCodec::new();
		let classifier = PropertyClassifier::with_default();

		generate_tiles(
			&coords,
			&cache,
			&codec,
			&classifier,
			&cache_sink,
			&GenerateOptions::default(),
		)
		.unwrap();
		generate_tiles_from_collection(
			&coords,
			&collection,
			&codec,
			&classifier,
			&collection_sink,
			&GenerateOptions::default(),
		)
		.unwrap();

		assert_eq!(cache_sink.keys(), collection_sink.keys());
		for key in cache_sink.keys() {
			assert_eq!(
				cache_sink.get(&key).unwrap(),
				collection_sink.get(&key).unwrap(),
				"tile {key} differs between the two paths"
			);
		}
	}
}
