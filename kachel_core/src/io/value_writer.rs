//! The [`ValueWriter`] trait: typed writes to a byte destination.

use super::ValueWriterBlob;
use crate::Blob;
use anyhow::{Context, Result};
use byteorder::{ByteOrder, WriteBytesExt};
use std::io::Write;

/// Writes typed values to a destination with byte order `E`.
pub trait ValueWriter<E: ByteOrder> {
	fn get_writer(&mut self) -> &mut dyn Write;

	fn position(&mut self) -> Result<u64>;

	fn is_empty(&mut self) -> Result<bool> {
		Ok(self.position()? == 0)
	}

	/// Writes an unsigned varint.
	fn write_varint(&mut self, mut value: u64) -> Result<()> {
		while value >= 0x80 {
			self.get_writer().write_all(&[((value & 0x7F) as u8) | 0x80])?;
			value >>= 7;
		}
		self.get_writer().write_all(&[value as u8])?;
		Ok(())
	}

	/// Writes a zigzag-encoded signed varint.
	fn write_svarint(&mut self, value: i64) -> Result<()> {
		self.write_varint(((value << 1) ^ (value >> 63)) as u64)
	}

	fn write_u8(&mut self, value: u8) -> Result<()> {
		Ok(self.get_writer().write_u8(value)?)
	}

	fn write_u16(&mut self, value: u16) -> Result<()> {
		Ok(self.get_writer().write_u16::<E>(value)?)
	}

	fn write_u32(&mut self, value: u32) -> Result<()> {
		Ok(self.get_writer().write_u32::<E>(value)?)
	}

	fn write_u64(&mut self, value: u64) -> Result<()> {
		Ok(self.get_writer().write_u64::<E>(value)?)
	}

	fn write_i64(&mut self, value: i64) -> Result<()> {
		Ok(self.get_writer().write_i64::<E>(value)?)
	}

	fn write_f32(&mut self, value: f32) -> Result<()> {
		Ok(self.get_writer().write_f32::<E>(value)?)
	}

	fn write_f64(&mut self, value: f64) -> Result<()> {
		Ok(self.get_writer().write_f64::<E>(value)?)
	}

	fn write_blob(&mut self, blob: &Blob) -> Result<()> {
		self.get_writer().write_all(blob.as_slice())?;
		Ok(())
	}

	fn write_slice(&mut self, buf: &[u8]) -> Result<()> {
		self.get_writer().write_all(buf)?;
		Ok(())
	}

	fn write_string(&mut self, text: &str) -> Result<()> {
		self.get_writer().write_all(text.as_bytes())?;
		Ok(())
	}

	/// Writes a protobuf field key from field number and wire type.
	fn write_pbf_key(&mut self, field_number: u32, wire_type: u8) -> Result<()> {
		self
			.write_varint((u64::from(field_number) << 3) | u64::from(wire_type))
			.context("failed to write PBF key")
	}

	/// Writes a packed repeated uint32 field.
	fn write_pbf_packed_uint32(&mut self, data: &[u32]) -> Result<()> {
		let mut writer = ValueWriterBlob::new_le();
		for &value in data {
			writer.write_varint(u64::from(value))?;
		}
		self.write_pbf_blob(&writer.into_blob())
	}

	/// Writes a length-prefixed blob.
	fn write_pbf_blob(&mut self, blob: &Blob) -> Result<()> {
		self.write_varint(blob.len()).context("failed to write blob length")?;
		self.write_blob(blob)
	}

	/// Writes a length-prefixed UTF-8 string.
	fn write_pbf_string(&mut self, text: &str) -> Result<()> {
		self
			.write_varint(text.len() as u64)
			.context("failed to write string length")?;
		self.write_string(text)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::io::ValueWriterBlob;

	#[test]
	fn write_varint() {
		let mut writer = ValueWriterBlob::new_le();
		writer.write_varint(300).unwrap();
		assert_eq!(writer.into_blob().as_slice(), &[0b10101100, 0b00000010]);
	}

	#[test]
	fn write_svarint() {
		let mut writer = ValueWriterBlob::new_le();
		writer.write_svarint(-75).unwrap();
		assert_eq!(writer.into_blob().as_slice(), &[149, 1]);
	}

	#[test]
	fn write_pbf_key() {
		let mut writer = ValueWriterBlob::new_le();
		writer.write_pbf_key(1, 0).unwrap();
		assert_eq!(writer.into_blob().as_slice(), &[0x08]);
	}

	#[test]
	fn write_pbf_packed_uint32() {
		let mut writer = ValueWriterBlob::new_le();
		writer.write_pbf_packed_uint32(&[100, 150, 300]).unwrap();
		assert_eq!(writer.into_blob().as_slice(), &[5, 100, 150, 1, 172, 2]);
	}

	#[test]
	fn write_pbf_string_and_blob() {
		let mut writer = ValueWriterBlob::new_le();
		writer.write_pbf_string("hello").unwrap();
		writer.write_pbf_blob(&Blob::from(&[1u8, 2, 3])).unwrap();
		assert_eq!(
			writer.into_blob().as_slice(),
			&[0x05, b'h', b'e', b'l', b'l', b'o', 0x03, 1, 2, 3]
		);
	}

	#[test]
	fn fixed_width_writes() {
		let mut writer = ValueWriterBlob::new_le();
		writer.write_u16(0x0102).unwrap();
		writer.write_u32(1).unwrap();
		writer.write_f64(1.0).unwrap();
		assert_eq!(
			writer.into_blob().as_slice(),
			&[0x02, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xF0, 0x3F]
		);
	}
}
