//! Per-feature geometry command streams.
//!
//! A feature's geometry is a stream of commands packed as
//! `(command & 0x7) | (count << 3)` with `MoveTo = 1`, `LineTo = 2`,
//! `ClosePath = 7`. Coordinates are zigzag-encoded deltas; the first vertex
//! is absolute and every further vertex is relative to the previous one,
//! continuing across rings.

use super::{geometry_type::GeomType, project::TileTransform};
use crate::geo::*;
use anyhow::{Context, Result, anyhow, bail, ensure};
use byteorder::LE;
use kachel_core::{
	Blob, TilerError,
	io::{ValueReader, ValueReaderSlice, ValueWriter, ValueWriterBlob},
};

const CMD_MOVE_TO: u64 = 1;
const CMD_LINE_TO: u64 = 2;
const CMD_CLOSE_PATH: u64 = 7;

fn command(cmd: u64, count: u64) -> u64 {
	(cmd & 0x7) | (count << 3)
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VectorTileFeature {
	pub id: Option<u64>,
	pub tag_ids: Vec<u32>,
	pub geom_type: GeomType,
	pub geom_data: Blob,
}

impl VectorTileFeature {
	/// Encodes a geographic geometry into a vector-tile feature, quantizing
	/// vertices through `transform`.
	///
	/// Degenerate geometry (too short lines, unclosed rings) fails with a
	/// geometry error; nothing is skipped silently.
	pub fn from_geometry(
		id: Option<u64>,
		tag_ids: Vec<u32>,
		geometry: &Geometry,
		transform: &TileTransform,
	) -> Result<VectorTileFeature> {
		let mut writer = CommandWriter::new(transform);

		match geometry {
			Geometry::Point(point) => {
				writer.move_to(&[point.0])?;
			}
			Geometry::LineString(line) => {
				if line.0.len() < 2 {
					return Err(anyhow!(TilerError::geometry("LineString must have at least two points")));
				}
				writer.move_to(&line.0[0..1])?;
				writer.line_to(&line.0[1..])?;
			}
			Geometry::Polygon(polygon) => {
				if polygon.is_empty() {
					return Err(anyhow!(TilerError::geometry("polygon must have at least one ring")));
				}
				for ring in &polygon.0 {
					ring
						.verify()
						.map_err(|e| anyhow!(TilerError::geometry(&format!("cannot encode ring: {e}"))))?;
					// the closing vertex is implied by ClosePath
					let pts = &ring.0[..ring.0.len() - 1];
					writer.move_to(&pts[0..1])?;
					writer.line_to(&pts[1..])?;
					writer.close_path()?;
				}
			}
		}

		Ok(VectorTileFeature {
			id,
			tag_ids,
			geom_type: GeomType::from(geometry),
			geom_data: writer.into_blob(),
		})
	}

	/// Decodes the command stream back into a geometry in tile-local
	/// coordinates. Used to verify encoded tiles.
	pub fn to_geometry(&self) -> Result<Geometry> {
		let mut reader = ValueReaderSlice::new_le(self.geom_data.as_slice());

		let mut lines: Vec<Vec<Coordinates>> = Vec::new();
		let mut line: Vec<Coordinates> = Vec::new();
		let mut x = 0i64;
		let mut y = 0i64;

		while reader.has_remaining() {
			let value = reader.read_varint().context("failed to read geometry command")?;
			let cmd = value & 0x7;
			let count = value >> 3;

			match cmd {
				CMD_MOVE_TO | CMD_LINE_TO => {
					for _ in 0..count {
						if cmd == CMD_MOVE_TO && !line.is_empty() {
							lines.push(line);
							line = Vec::new();
						}
						x += reader.read_svarint().context("failed to read x delta")?;
						y += reader.read_svarint().context("failed to read y delta")?;
						line.push(Coordinates::new(x as f64, y as f64));
					}
				}
				CMD_CLOSE_PATH => {
					ensure!(!line.is_empty(), "ClosePath on an empty path");
					line.push(line[0]);
				}
				_ => bail!("unknown geometry command {cmd}"),
			}
		}
		if !line.is_empty() {
			lines.push(line);
		}

		match self.geom_type {
			GeomType::Unknown => Err(anyhow!(TilerError::geometry("unknown geometry type"))),
			GeomType::Point => {
				ensure!(
					lines.len() == 1 && lines[0].len() == 1,
					"point features must contain exactly one vertex"
				);
				Ok(Geometry::Point(PointGeometry(lines.remove(0).remove(0))))
			}
			GeomType::LineString => {
				ensure!(lines.len() == 1, "line features must contain exactly one path");
				ensure!(lines[0].len() >= 2, "line features must have at least two vertices");
				Ok(Geometry::LineString(LineStringGeometry(lines.remove(0))))
			}
			GeomType::Polygon => {
				ensure!(!lines.is_empty(), "polygon features must contain at least one ring");
				let rings = lines
					.into_iter()
					.map(|ring| {
						let geometry = RingGeometry(ring);
						geometry.verify().context("decoded ring is not closed")?;
						Ok(geometry)
					})
					.collect::<Result<Vec<RingGeometry>>>()?;
				Ok(Geometry::Polygon(PolygonGeometry(rings)))
			}
		}
	}

	/// Decodes a feature message (PBF fields: id = 1, tags = 2, type = 3,
	/// geometry = 4).
	pub fn read<'a>(reader: &mut dyn ValueReader<'a, LE>) -> Result<VectorTileFeature> {
		let mut feature = VectorTileFeature::default();

		while reader.has_remaining() {
			match reader.read_pbf_key().context("failed to read PBF key")? {
				(1, 0) => feature.id = Some(reader.read_varint().context("failed to read feature id")?),
				(2, 2) => feature.tag_ids = reader.read_pbf_packed_uint32().context("failed to read tag ids")?,
				(3, 0) => feature.geom_type = GeomType::from(reader.read_varint().context("failed to read geometry type")?),
				(4, 2) => feature.geom_data = reader.read_pbf_blob().context("failed to read geometry data")?,
				(f, w) => bail!("unexpected field number ({f}) / wire type ({w}) in feature message"),
			}
		}

		Ok(feature)
	}

	/// Encodes this feature as a PBF message.
	pub fn to_blob(&self) -> Result<Blob> {
		let mut writer = ValueWriterBlob::new_le();

		if let Some(id) = self.id {
			writer.write_pbf_key(1, 0)?;
			writer.write_varint(id)?;
		}

		if !self.tag_ids.is_empty() {
			writer.write_pbf_key(2, 2)?;
			writer.write_pbf_packed_uint32(&self.tag_ids)?;
		}

		writer.write_pbf_key(3, 0)?;
		writer.write_varint(self.geom_type.as_u64())?;

		if !self.geom_data.is_empty() {
			writer.write_pbf_key(4, 2)?;
			writer.write_pbf_blob(&self.geom_data)?;
		}

		Ok(writer.into_blob())
	}
}

/// Writes geometry commands, tracking the delta cursor across calls.
struct CommandWriter<'a> {
	writer: ValueWriterBlob<LE>,
	transform: &'a TileTransform,
	cursor: (i64, i64),
}

impl<'a> CommandWriter<'a> {
	fn new(transform: &'a TileTransform) -> CommandWriter<'a> {
		CommandWriter {
			writer: ValueWriterBlob::new_le(),
			transform,
			cursor: (0, 0),
		}
	}

	fn move_to(&mut self, points: &[Coordinates]) -> Result<()> {
		self.run(CMD_MOVE_TO, points)
	}

	fn line_to(&mut self, points: &[Coordinates]) -> Result<()> {
		if points.is_empty() {
			return Ok(());
		}
		self.run(CMD_LINE_TO, points)
	}

	fn close_path(&mut self) -> Result<()> {
		self.writer.write_varint(command(CMD_CLOSE_PATH, 1))
	}

	fn run(&mut self, cmd: u64, points: &[Coordinates]) -> Result<()> {
		self.writer.write_varint(command(cmd, points.len() as u64))?;
		for point in points {
			let [x, y] = self.transform.apply(point);
			self.writer.write_svarint(x - self.cursor.0)?;
			self.writer.write_svarint(y - self.cursor.1)?;
			self.cursor = (x, y);
		}
		Ok(())
	}

	fn into_blob(self) -> Blob {
		self.writer.into_blob()
	}
}
