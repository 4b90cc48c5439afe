//! End-to-end pipeline tests: ingest a feature collection into a cache,
//! generate tiles into a sink, and decode the written tiles again.

use kachel_core::TileCoord;
use kachel_geometry::{
	GeoCollection, GeoFeature, GeoValue, Geometry, GeometryTrait, vector_tile::VectorTile,
};
use kachel_pipeline::{
	CacheKind, DirectoryTileSink, GenerateOptions, MemoryTileSink, MvtCodec, PropertyClassifier,
	generate_tiles, plan_tiles,
};
use rstest::rstest;

fn city_collection() -> GeoCollection {
	let mut station = GeoFeature::new(Geometry::new_point([13.3777, 52.5162]));
	station.set_id(1);
	station.set_property("name", "hbf");
	station.set_property("@layer", "pois");

	let mut river = GeoFeature::new(Geometry::new_line_string(&[
		[13.06, 52.40],
		[13.21, 52.45],
		[13.38, 52.51],
		[13.53, 52.56],
	]));
	river.set_id(2);
	river.set_property("@layer", "water");
	river.set_property("name", "spree");

	let mut park = GeoFeature::new(Geometry::new_polygon(&[vec![
		[13.23, 52.50],
		[13.28, 52.50],
		[13.28, 52.53],
		[13.23, 52.53],
		[13.23, 52.50],
	]]));
	park.set_id(3);
	park.set_property("@layer", "landuse");
	park.set_property("kind", "park");

	let mut minor_path = GeoFeature::new(Geometry::new_line_string(&[[13.30, 52.51], [13.31, 52.52]]));
	minor_path.set_id(4);
	minor_path.set_property("@zoom:min", 14);

	GeoCollection::from(vec![station, river, park, minor_path])
}

#[rstest]
#[case::dense(CacheKind::DenseGrid, &[8, 11])]
#[case::sparse(CacheKind::SparseMap, &[8, 14])]
#[case::disk(CacheKind::OnDisk, &[8, 14])]
#[case::sqlite(CacheKind::Sqlite, &[8, 14])]
fn full_pipeline_produces_decodable_tiles(#[case] kind: CacheKind, #[case] zoom_levels: &[u8]) {
	let cache = kind.create(zoom_levels).unwrap();
	for feature in city_collection() {
		cache.add_feature(feature).unwrap();
	}
	assert_eq!(cache.count(), 4);

	let coords = plan_tiles(cache.as_ref(), zoom_levels).unwrap();
	assert!(!coords.is_empty());

	let sink = MemoryTileSink::new();
	let codec = MvtCodec::new();
	let classifier = PropertyClassifier::new(Some("other"));

	generate_tiles(
		&coords,
		cache.as_ref(),
		&codec,
		&classifier,
		&sink,
		&GenerateOptions::default(),
	)
	.unwrap();

	assert!(!sink.is_empty());
	for key in sink.keys() {
		let tile = VectorTile::from_blob(&sink.get(&key).unwrap()).unwrap();
		assert!(!tile.layers.is_empty(), "tile {key} has no layers");
		for layer in &tile.layers {
			assert_eq!(layer.version, 2);
			assert_eq!(layer.extent, 4096);
			assert!(!layer.is_empty(), "layer {} in {key} is empty", layer.name);
			// every feature decodes into closed, in-bounds tile geometry
			for feature in layer.to_features().unwrap() {
				let bounds = match &feature.geometry {
					Geometry::Point(p) => p.compute_bounds(),
					Geometry::LineString(l) => l.compute_bounds(),
					Geometry::Polygon(p) => {
						for ring in &p.0 {
							assert!(ring.verify().is_ok());
						}
						p.compute_bounds()
					}
				}
				.unwrap();
				assert!(bounds[0] >= 0.0 && bounds[2] <= 4096.0, "x out of extent in {key}");
				assert!(bounds[1] >= 0.0 && bounds[3] <= 4096.0, "y out of extent in {key}");
			}
		}
	}

	cache.close().unwrap();
}

#[test]
fn zoom_min_features_appear_only_at_high_zoom() {
	let zoom_levels: &[u8] = &[8, 14];
	let cache = CacheKind::SparseMap.create(zoom_levels).unwrap();
	for feature in city_collection() {
		cache.add_feature(feature).unwrap();
	}

	let coords = plan_tiles(cache.as_ref(), zoom_levels).unwrap();
	let sink = MemoryTileSink::new();
	generate_tiles(
		&coords,
		cache.as_ref(),
		&MvtCodec::new(),
		&PropertyClassifier::with_default(),
		&sink,
		&GenerateOptions::default(),
	)
	.unwrap();

	let mut seen_at = Vec::new();
	for key in sink.keys() {
		let tile = VectorTile::from_blob(&sink.get(&key).unwrap()).unwrap();
		if let Some(layer) = tile.find_layer("default") {
			for feature in layer.to_features().unwrap() {
				if feature.id == Some(4) {
					let level: u8 = key.split('/').next().unwrap().parse().unwrap();
					seen_at.push(level);
				}
			}
		}
	}
	assert!(!seen_at.is_empty(), "the minor path must appear somewhere");
	assert!(seen_at.iter().all(|&level| level == 14));
}

#[test]
fn directory_sink_writes_the_z_x_y_tree() {
	let zoom_levels: &[u8] = &[8];
	let cache = CacheKind::SparseMap.create(zoom_levels).unwrap();
	for feature in city_collection() {
		cache.add_feature(feature).unwrap();
	}

	let dir = tempfile::tempdir().unwrap();
	let sink = DirectoryTileSink::new(dir.path());
	let coords = plan_tiles(cache.as_ref(), zoom_levels).unwrap();
	generate_tiles(
		&coords,
		cache.as_ref(),
		&MvtCodec::new(),
		&PropertyClassifier::with_default(),
		&sink,
		&GenerateOptions::default(),
	)
	.unwrap();

	// the tile containing the station must exist on disk
	let coord = TileCoord::from_geo(13.3777, 52.5162, 8).unwrap();
	let path = dir
		.path()
		.join(coord.level.to_string())
		.join(coord.x.to_string())
		.join(format!("{}.mvt", coord.y));
	assert!(path.exists(), "missing {path:?}");

	let tile = VectorTile::from_blob(&std::fs::read(&path).unwrap().into()).unwrap();
	assert!(tile.find_layer("pois").is_some());
}

#[test]
fn parallel_ingest_then_generate() {
	let zoom_levels: &[u8] = &[9];
	let cache = std::sync::Arc::new(CacheKind::OnDisk.create(zoom_levels).unwrap());

	let mut handles = Vec::new();
	for worker in 0..4u64 {
		let cache = std::sync::Arc::clone(&cache);
		handles.push(std::thread::spawn(move || {
			for i in 0..25u64 {
				let x = 13.0 + (i as f64) / 100.0;
				let y = 52.0 + (worker as f64) / 100.0;
				let mut feature = GeoFeature::new(Geometry::new_point([x, y]));
				feature.set_id(worker * 100 + i);
				feature.set_property("w", GeoValue::from(worker as i64));
				cache.add_feature(feature).unwrap();
			}
		}));
	}
	for handle in handles {
		handle.join().unwrap();
	}
	assert_eq!(cache.count(), 100);

	let coords = plan_tiles(cache.as_ref().as_ref(), zoom_levels).unwrap();
	let sink = MemoryTileSink::new();
	generate_tiles(
		&coords,
		cache.as_ref().as_ref(),
		&MvtCodec::new(),
		&PropertyClassifier::with_default(),
		&sink,
		&GenerateOptions::default(),
	)
	.unwrap();

	// all 100 points must reappear across the written tiles
	let mut total = 0;
	for key in sink.keys() {
		let tile = VectorTile::from_blob(&sink.get(&key).unwrap()).unwrap();
		total += tile.find_layer("default").map_or(0, |l| l.features.len());
	}
	assert_eq!(total, 100);

	cache.close().unwrap();
}
