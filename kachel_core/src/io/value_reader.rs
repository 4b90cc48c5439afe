//! The [`ValueReader`] trait: typed reads over a seekable byte source.

use crate::Blob;
use anyhow::{Context, Result, bail};
use byteorder::{ByteOrder, ReadBytesExt};
use std::io::{Read, Seek};

pub trait SeekRead: Seek + Read {}

/// Reads typed values from a byte source with byte order `E`.
///
/// Implementations provide raw access (`get_reader`, `len`, `position`,
/// `set_position`); all typed reads are derived from those.
pub trait ValueReader<'a, E: ByteOrder + 'a> {
	fn get_reader(&mut self) -> &mut dyn SeekRead;

	fn len(&self) -> u64;

	fn position(&mut self) -> u64;

	fn set_position(&mut self, position: u64) -> Result<()>;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn remaining(&mut self) -> u64 {
		self.len() - self.position()
	}

	fn has_remaining(&mut self) -> bool {
		self.remaining() > 0
	}

	/// Reads an unsigned varint. Fails on values longer than 70 bits.
	fn read_varint(&mut self) -> Result<u64> {
		let mut value = 0;
		let mut shift = 0;
		loop {
			let byte = self.get_reader().read_u8()?;
			value |= (u64::from(byte) & 0x7F) << shift;
			if byte & 0x80 == 0 {
				break;
			}
			shift += 7;
			if shift >= 70 {
				bail!("varint too long");
			}
		}
		Ok(value)
	}

	/// Reads a zigzag-encoded signed varint.
	fn read_svarint(&mut self) -> Result<i64> {
		let value = self.read_varint()? as i64;
		Ok((value >> 1) ^ -(value & 1))
	}

	fn read_u8(&mut self) -> Result<u8> {
		Ok(self.get_reader().read_u8()?)
	}

	fn read_u16(&mut self) -> Result<u16> {
		Ok(self.get_reader().read_u16::<E>()?)
	}

	fn read_u32(&mut self) -> Result<u32> {
		Ok(self.get_reader().read_u32::<E>()?)
	}

	fn read_u64(&mut self) -> Result<u64> {
		Ok(self.get_reader().read_u64::<E>()?)
	}

	fn read_i64(&mut self) -> Result<i64> {
		Ok(self.get_reader().read_i64::<E>()?)
	}

	fn read_f32(&mut self) -> Result<f32> {
		Ok(self.get_reader().read_f32::<E>()?)
	}

	fn read_f64(&mut self) -> Result<f64> {
		Ok(self.get_reader().read_f64::<E>()?)
	}

	fn read_blob(&mut self, length: u64) -> Result<Blob> {
		let mut blob = Blob::new_sized(length as usize);
		self.get_reader().read_exact(blob.as_mut_slice())?;
		Ok(blob)
	}

	fn read_string(&mut self, length: u64) -> Result<String> {
		let mut vec = vec![0u8; length as usize];
		self.get_reader().read_exact(&mut vec)?;
		Ok(String::from_utf8(vec)?)
	}

	/// Reads a protobuf field key, returning `(field_number, wire_type)`.
	fn read_pbf_key(&mut self) -> Result<(u32, u8)> {
		let value = self.read_varint().context("failed to read varint for PBF key")?;
		Ok(((value >> 3) as u32, (value & 0x07) as u8))
	}

	/// Returns a sub-reader over the next `length` bytes and advances the
	/// position past them.
	fn get_sub_reader<'b>(&'b mut self, length: u64) -> Result<Box<dyn ValueReader<'b, E> + 'b>>
	where
		E: 'b;

	/// Reads a length prefix (varint) and returns a sub-reader over the
	/// embedded message.
	fn get_pbf_sub_reader<'b>(&'b mut self) -> Result<Box<dyn ValueReader<'b, E> + 'b>>
	where
		E: 'b,
	{
		let length = self
			.read_varint()
			.context("failed to read varint for sub-reader length")?;
		self.get_sub_reader(length).context("failed to get sub-reader")
	}

	/// Reads a packed repeated uint32 field.
	fn read_pbf_packed_uint32(&mut self) -> Result<Vec<u32>> {
		let mut reader = self
			.get_pbf_sub_reader()
			.context("failed to get sub-reader for packed uint32")?;
		let mut values = Vec::new();
		while reader.has_remaining() {
			values.push(reader.read_varint().context("failed to read packed uint32")? as u32);
		}
		Ok(values)
	}

	fn read_pbf_string(&mut self) -> Result<String> {
		let length = self.read_varint().context("failed to read string length")?;
		self.read_string(length).context("failed to read PBF string")
	}

	fn read_pbf_blob(&mut self) -> Result<Blob> {
		let length = self.read_varint().context("failed to read blob length")?;
		self.read_blob(length).context("failed to read PBF blob")
	}
}

#[cfg(test)]
mod tests {
	use super::super::ValueReaderSlice;
	use super::*;

	#[test]
	fn read_varint() {
		let mut reader = ValueReaderSlice::new_le(&[0xAC, 0x02]);
		assert_eq!(reader.read_varint().unwrap(), 300);
	}

	#[test]
	fn read_varint_too_long() {
		let mut reader = ValueReaderSlice::new_le(&[0x80; 12]);
		assert!(reader.read_varint().is_err());
	}

	#[test]
	fn read_svarint_signs() {
		let mut reader = ValueReaderSlice::new_le(&[0x96, 0x01]);
		assert_eq!(reader.read_svarint().unwrap(), 75);
		let mut reader = ValueReaderSlice::new_le(&[0x95, 0x01]);
		assert_eq!(reader.read_svarint().unwrap(), -75);
	}

	#[test]
	fn read_pbf_key_splits_field_and_wire_type() {
		let mut reader = ValueReaderSlice::new_le(&[0x1A]); // field 3, wire type 2
		assert_eq!(reader.read_pbf_key().unwrap(), (3, 2));
	}

	#[test]
	fn read_pbf_string_and_blob() {
		let mut reader = ValueReaderSlice::new_le(&[0x03, b'a', b'b', b'c', 0x02, 0x01, 0x02]);
		assert_eq!(reader.read_pbf_string().unwrap(), "abc");
		assert_eq!(reader.read_pbf_blob().unwrap().as_slice(), &[1, 2]);
		assert!(!reader.has_remaining());
	}

	#[test]
	fn read_pbf_packed_uint32() {
		let mut reader = ValueReaderSlice::new_le(&[5, 100, 150, 1, 172, 2]);
		assert_eq!(reader.read_pbf_packed_uint32().unwrap(), vec![100, 150, 300]);
	}

	#[test]
	fn sub_reader_is_bounded() {
		let mut reader = ValueReaderSlice::new_le(&[1, 2, 3, 4]);
		let mut sub = reader.get_sub_reader(2).unwrap();
		assert_eq!(sub.read_u8().unwrap(), 1);
		assert_eq!(sub.read_u8().unwrap(), 2);
		assert!(!sub.has_remaining());
		drop(sub);
		assert_eq!(reader.position(), 2);
	}

	#[test]
	fn fixed_width_reads() {
		let mut reader = ValueReaderSlice::new_le(&[0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0xF0, 0x3F]);
		assert_eq!(reader.read_u32().unwrap(), 1);
		assert_eq!(reader.read_f32().unwrap(), 1.875);
	}
}
