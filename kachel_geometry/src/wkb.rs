//! Well-Known Binary geometry serialization.
//!
//! Only the little-endian profile is supported: one endianness byte (must
//! be 1), a u32 geometry type code (1 = Point, 2 = LineString,
//! 3 = Polygon), then the coordinate data. Used as the geometry payload of
//! persisted feature buckets.

use crate::geo::*;
use anyhow::{Result, anyhow};
use byteorder::LE;
use kachel_core::{
	Blob, TilerError,
	io::{ValueReader, ValueReaderSlice, ValueWriter, ValueWriterBlob},
};

const WKB_LITTLE_ENDIAN: u8 = 1;

const TYPE_POINT: u32 = 1;
const TYPE_LINESTRING: u32 = 2;
const TYPE_POLYGON: u32 = 3;

/// Serializes a geometry into WKB bytes.
pub fn geometry_to_blob(geometry: &Geometry) -> Result<Blob> {
	let mut writer = ValueWriterBlob::new_le();
	write_geometry(&mut writer, geometry)?;
	Ok(writer.into_blob())
}

pub fn write_geometry(writer: &mut ValueWriterBlob<LE>, geometry: &Geometry) -> Result<()> {
	writer.write_u8(WKB_LITTLE_ENDIAN)?;
	match geometry {
		Geometry::Point(p) => {
			writer.write_u32(TYPE_POINT)?;
			write_coordinates(writer, &p.0)?;
		}
		Geometry::LineString(l) => {
			writer.write_u32(TYPE_LINESTRING)?;
			write_coordinate_list(writer, &l.0)?;
		}
		Geometry::Polygon(p) => {
			writer.write_u32(TYPE_POLYGON)?;
			writer.write_u32(p.0.len() as u32)?;
			for ring in &p.0 {
				write_coordinate_list(writer, &ring.0)?;
			}
		}
	}
	Ok(())
}

/// Deserializes one geometry from WKB bytes.
pub fn geometry_from_blob(blob: &Blob) -> Result<Geometry> {
	let mut reader = ValueReaderSlice::new_le(blob.as_slice());
	read_geometry(&mut reader)
}

pub fn read_geometry<'a>(reader: &mut dyn ValueReader<'a, LE>) -> Result<Geometry> {
	let endianness = reader.read_u8()?;
	if endianness != WKB_LITTLE_ENDIAN {
		return Err(anyhow!(TilerError::decode(&format!(
			"unsupported WKB endianness marker {endianness}; only little-endian (1) is supported"
		))));
	}

	match reader.read_u32()? {
		TYPE_POINT => Ok(Geometry::Point(PointGeometry(read_coordinates(reader)?))),
		TYPE_LINESTRING => Ok(Geometry::LineString(LineStringGeometry(read_coordinate_list(reader)?))),
		TYPE_POLYGON => {
			let ring_count = reader.read_u32()?;
			let mut rings = Vec::with_capacity(ring_count as usize);
			for _ in 0..ring_count {
				rings.push(RingGeometry(read_coordinate_list(reader)?));
			}
			Ok(Geometry::Polygon(PolygonGeometry(rings)))
		}
		code => Err(anyhow!(TilerError::decode(&format!(
			"unsupported WKB geometry type code {code}"
		)))),
	}
}

fn write_coordinates(writer: &mut ValueWriterBlob<LE>, c: &Coordinates) -> Result<()> {
	writer.write_f64(c.x())?;
	writer.write_f64(c.y())
}

fn write_coordinate_list(writer: &mut ValueWriterBlob<LE>, coords: &[Coordinates]) -> Result<()> {
	writer.write_u32(coords.len() as u32)?;
	for c in coords {
		write_coordinates(writer, c)?;
	}
	Ok(())
}

fn read_coordinates<'a>(reader: &mut dyn ValueReader<'a, LE>) -> Result<Coordinates> {
	let x = reader.read_f64()?;
	let y = reader.read_f64()?;
	Ok(Coordinates::new(x, y))
}

fn read_coordinate_list<'a>(reader: &mut dyn ValueReader<'a, LE>) -> Result<Vec<Coordinates>> {
	let count = reader.read_u32()?;
	let mut coords = Vec::with_capacity(count as usize);
	for _ in 0..count {
		coords.push(read_coordinates(reader)?);
	}
	Ok(coords)
}
