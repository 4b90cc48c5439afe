//! The persisted feature-bucket format used by durable cache backends.
//!
//! A bucket starts with an 8-byte header (magic cookie `KCHL`, u32 version)
//! followed by a stream of blocks. Each block carries a u32 body length,
//! u16 flags, a compression byte and a message-type byte (both must be 0),
//! then the body: a PBF message with optional metadata tags (field 1) and a
//! feature list (field 2). A feature holds its typed key/value tags, its
//! geometry as WKB bytes, and an optional id. All integers are
//! little-endian.

use anyhow::{Context, Result, anyhow, bail};
use byteorder::LE;
use kachel_core::{
	Blob, TilerError,
	io::{ValueReader, ValueReaderSlice, ValueWriter, ValueWriterBlob},
};
use kachel_geometry::{GeoCollection, GeoFeature, GeoProperties, GeoValue, wkb};

/// Magic cookie at the start of every bucket.
pub const MAGIC: &[u8; 4] = b"KCHL";
/// Format version written by this encoder.
pub const VERSION: u32 = 0;

const TAG_STRING: u64 = 0;
const TAG_INT: u64 = 1;
const TAG_DOUBLE: u64 = 2;

/// Encodes a collection into a complete bucket (header plus one block).
pub fn encode_collection(collection: &GeoCollection) -> Result<Blob> {
	let mut blob = Blob::new_empty();
	blob.extend(&header_blob()?);
	blob.extend(&encode_block(&collection.features, None)?);
	Ok(blob)
}

/// Appends one more block to an already encoded bucket.
pub fn append_block(bucket: &mut Blob, features: &[GeoFeature]) -> Result<()> {
	bucket.extend(&encode_block(features, None)?);
	Ok(())
}

/// Decodes a complete bucket back into a collection, concatenating all
/// blocks in order.
pub fn decode_collection(blob: &Blob) -> Result<GeoCollection> {
	let mut reader = ValueReaderSlice::new_le(blob.as_slice());
	read_header(&mut reader)?;

	let mut features = Vec::new();
	while reader.has_remaining() {
		features.extend(read_block(&mut reader)?);
	}
	Ok(GeoCollection::from(features))
}

fn header_blob() -> Result<Blob> {
	let mut writer = ValueWriterBlob::new_le();
	writer.write_slice(MAGIC)?;
	writer.write_u32(VERSION)?;
	Ok(writer.into_blob())
}

fn read_header<'a>(reader: &mut dyn ValueReader<'a, LE>) -> Result<()> {
	let cookie = reader.read_blob(4).context("failed to read bucket cookie")?;
	if cookie.as_slice() != MAGIC {
		return Err(anyhow!(TilerError::decode("invalid bucket cookie")));
	}
	let version = reader.read_u32().context("failed to read bucket version")?;
	if version > VERSION {
		return Err(anyhow!(TilerError::decode(&format!(
			"unsupported bucket version {version}"
		))));
	}
	Ok(())
}

/// Encodes one block. `meta` tags are optional block metadata.
fn encode_block(features: &[GeoFeature], meta: Option<&GeoProperties>) -> Result<Blob> {
	let mut body = ValueWriterBlob::new_le();

	if let Some(meta) = meta {
		let mut meta_writer = ValueWriterBlob::new_le();
		for (key, value) in meta.iter() {
			meta_writer.write_pbf_key(1, 2)?;
			meta_writer.write_pbf_blob(&encode_tag(key, value)?)?;
		}
		body.write_pbf_key(1, 2)?;
		body.write_pbf_blob(&meta_writer.into_blob())?;
	}

	for feature in features {
		body.write_pbf_key(2, 2)?;
		body.write_pbf_blob(&encode_feature(feature)?)?;
	}

	let body = body.into_blob();
	let mut writer = ValueWriterBlob::new_le();
	writer.write_u32(body.len() as u32)?; // body length
	writer.write_u16(0)?; // flags
	writer.write_u8(0)?; // compression
	writer.write_u8(0)?; // message type
	writer.write_blob(&body)?;
	Ok(writer.into_blob())
}

fn read_block<'a>(reader: &mut dyn ValueReader<'a, LE>) -> Result<Vec<GeoFeature>> {
	let body_len = reader.read_u32().context("failed to read block body length")?;
	let _flags = reader.read_u16().context("failed to read block flags")?;
	let compression = reader.read_u8().context("failed to read block compression")?;
	if compression != 0 {
		return Err(anyhow!(TilerError::unsupported_format(&format!(
			"block compression {compression} is not supported"
		))));
	}
	let message_type = reader.read_u8().context("failed to read block message type")?;
	if message_type != 0 {
		return Err(anyhow!(TilerError::unsupported_format(&format!(
			"block message type {message_type} is not supported"
		))));
	}

	let mut body = reader
		.get_sub_reader(u64::from(body_len))
		.context("block body is truncated")?;

	let mut features = Vec::new();
	while body.has_remaining() {
		match body.read_pbf_key().context("failed to read PBF key")? {
			(1, 2) => {
				// block metadata tags are skipped on read
				body.read_pbf_blob()?;
			}
			(2, 2) => features.push(read_feature(body.get_pbf_sub_reader()?.as_mut())?),
			(f, w) => bail!("unexpected field number ({f}) / wire type ({w}) in block body"),
		}
	}
	Ok(features)
}

/// Feature message: tags (1), WKB geometry (2), id (3).
fn encode_feature(feature: &GeoFeature) -> Result<Blob> {
	let mut writer = ValueWriterBlob::new_le();

	for (key, value) in feature.properties.iter() {
		writer.write_pbf_key(1, 2)?;
		writer.write_pbf_blob(&encode_tag(key, value)?)?;
	}

	writer.write_pbf_key(2, 2)?;
	writer.write_pbf_blob(&wkb::geometry_to_blob(&feature.geometry)?)?;

	if let Some(id) = feature.id {
		writer.write_pbf_key(3, 0)?;
		writer.write_varint(id)?;
	}

	Ok(writer.into_blob())
}

fn read_feature<'a>(reader: &mut dyn ValueReader<'a, LE>) -> Result<GeoFeature> {
	let mut id = None;
	let mut geometry = None;
	let mut properties = GeoProperties::new();

	while reader.has_remaining() {
		match reader.read_pbf_key().context("failed to read PBF key")? {
			(1, 2) => {
				let (key, value) = read_tag(reader.get_pbf_sub_reader()?.as_mut())?;
				properties.insert(key, value);
			}
			(2, 2) => {
				let blob = reader.read_pbf_blob()?;
				geometry = Some(wkb::geometry_from_blob(&blob)?);
			}
			(3, 0) => id = Some(reader.read_varint()?),
			(f, w) => bail!("unexpected field number ({f}) / wire type ({w}) in feature message"),
		}
	}

	let mut feature = GeoFeature::new(geometry.ok_or_else(|| anyhow!(TilerError::decode("feature without geometry")))?);
	feature.id = id;
	feature.properties = properties;
	Ok(feature)
}

/// Tag message: key (1), value bytes (2), value type (3).
fn encode_tag(key: &str, value: &GeoValue) -> Result<Blob> {
	let mut writer = ValueWriterBlob::new_le();

	writer.write_pbf_key(1, 2)?;
	writer.write_pbf_string(key)?;

	let (bytes, type_code) = match value {
		GeoValue::String(s) => (Blob::from(s.as_bytes()), TAG_STRING),
		GeoValue::Int(i) => {
			let mut w = ValueWriterBlob::new_le();
			w.write_u64(*i as u64)?;
			(w.into_blob(), TAG_INT)
		}
		GeoValue::Double(d) => {
			let mut w = ValueWriterBlob::new_le();
			w.write_f64(*d)?;
			(w.into_blob(), TAG_DOUBLE)
		}
	};

	writer.write_pbf_key(2, 2)?;
	writer.write_pbf_blob(&bytes)?;

	writer.write_pbf_key(3, 0)?;
	writer.write_varint(type_code)?;

	Ok(writer.into_blob())
}

fn read_tag<'a>(reader: &mut dyn ValueReader<'a, LE>) -> Result<(String, GeoValue)> {
	let mut key = None;
	let mut bytes = Blob::new_empty();
	let mut type_code = TAG_STRING;

	while reader.has_remaining() {
		match reader.read_pbf_key().context("failed to read PBF key")? {
			(1, 2) => key = Some(reader.read_pbf_string()?),
			(2, 2) => bytes = reader.read_pbf_blob()?,
			(3, 0) => type_code = reader.read_varint()?,
			(f, w) => bail!("unexpected field number ({f}) / wire type ({w}) in tag message"),
		}
	}

	let key = key.ok_or_else(|| anyhow!(TilerError::decode("tag without key")))?;
	let value = match type_code {
		TAG_STRING => GeoValue::String(String::from_utf8(bytes.into_vec()).context("tag value is not valid UTF-8")?),
		TAG_INT => {
			let mut r = ValueReaderSlice::new_le(bytes.as_slice());
			GeoValue::Int(r.read_u64()? as i64)
		}
		TAG_DOUBLE => {
			let mut r = ValueReaderSlice::new_le(bytes.as_slice());
			GeoValue::Double(r.read_f64()?)
		}
		code => {
			return Err(anyhow!(TilerError::decode(&format!("unknown tag value type {code}"))));
		}
	};
	Ok((key, value))
}

#[cfg(test)]
mod tests {
	use super::*;
	use kachel_geometry::Geometry;
	use pretty_assertions::assert_eq;

	fn sample_collection() -> GeoCollection {
		let mut road = GeoFeature::new(Geometry::new_line_string(&[[13.3, 52.5], [13.4, 52.6]]));
		road.set_id(1);
		road.set_property("kind", "road");
		road.set_property("lanes", 4);

		let mut lake = GeoFeature::new(Geometry::new_example());
		lake.set_property("kind", "water");
		lake.set_property("depth", 3.5);

		let poi = GeoFeature::new(Geometry::new_point([13.5, 52.4]));

		GeoCollection::from(vec![road, lake, poi])
	}

	#[test]
	fn roundtrip_preserves_geometry_properties_and_ids() {
		let collection = sample_collection();
		let blob = encode_collection(&collection).unwrap();
		let decoded = decode_collection(&blob).unwrap();
		assert_eq!(decoded, collection);
	}

	#[test]
	fn header_layout() {
		let blob = encode_collection(&GeoCollection::new()).unwrap();
		let bytes = blob.as_slice();
		assert_eq!(&bytes[0..4], b"KCHL");
		assert_eq!(&bytes[4..8], &VERSION.to_le_bytes());
		// empty block: zero-length body
		assert_eq!(&bytes[8..12], &[0, 0, 0, 0]);
		assert_eq!(&bytes[12..16], &[0, 0, 0, 0]); // flags, compression, message type
	}

	#[test]
	fn appended_blocks_are_concatenated_in_order() {
		let a = sample_collection();
		let mut blob = encode_collection(&a).unwrap();
		let extra = GeoFeature::new(Geometry::new_point([1.0, 1.0]));
		append_block(&mut blob, &[extra.clone()]).unwrap();

		let decoded = decode_collection(&blob).unwrap();
		assert_eq!(decoded.len(), a.len() + 1);
		assert_eq!(decoded.features.last(), Some(&extra));
	}

	#[test]
	fn bad_cookie_is_a_decode_error() {
		let err = decode_collection(&Blob::from(b"NOPE\x00\x00\x00\x00")).unwrap_err();
		assert!(matches!(
			err.downcast_ref::<TilerError>(),
			Some(TilerError::Decode(_))
		));
	}

	#[test]
	fn newer_version_is_rejected() {
		let mut bytes = MAGIC.to_vec();
		bytes.extend_from_slice(&7u32.to_le_bytes());
		let err = decode_collection(&Blob::from(bytes)).unwrap_err();
		assert!(matches!(
			err.downcast_ref::<TilerError>(),
			Some(TilerError::Decode(_))
		));
	}

	#[test]
	fn nonzero_compression_is_unsupported() {
		let mut blob = encode_collection(&GeoCollection::new()).unwrap().into_vec();
		blob[14] = 1; // compression byte of the first block
		let err = decode_collection(&Blob::from(blob)).unwrap_err();
		assert!(matches!(
			err.downcast_ref::<TilerError>(),
			Some(TilerError::UnsupportedFormat(_))
		));
	}

	#[test]
	fn nonzero_message_type_is_unsupported() {
		let mut blob = encode_collection(&GeoCollection::new()).unwrap().into_vec();
		blob[15] = 1; // message type byte of the first block
		let err = decode_collection(&Blob::from(blob)).unwrap_err();
		assert!(matches!(
			err.downcast_ref::<TilerError>(),
			Some(TilerError::UnsupportedFormat(_))
		));
	}

	#[test]
	fn negative_int_tags_roundtrip() {
		let mut feature = GeoFeature::new(Geometry::new_point([0.0, 0.0]));
		feature.set_property("elevation", -432);
		let blob = encode_collection(&GeoCollection::from(vec![feature.clone()])).unwrap();
		let decoded = decode_collection(&blob).unwrap();
		assert_eq!(decoded.features[0], feature);
	}

	#[test]
	fn truncated_block_is_an_error() {
		let collection = sample_collection();
		let blob = encode_collection(&collection).unwrap();
		let truncated = Blob::from(&blob.as_slice()[..blob.as_slice().len() - 4]);
		assert!(decode_collection(&truncated).is_err());
	}
}
