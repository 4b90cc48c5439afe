//! [`ValueWriterBlob`]: a [`ValueWriter`] that collects into an in-memory
//! [`Blob`].

use super::ValueWriter;
use crate::Blob;
use anyhow::Result;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::io::{Cursor, Write};
use std::marker::PhantomData;

pub struct ValueWriterBlob<E: ByteOrder> {
	_phantom: PhantomData<E>,
	cursor: Cursor<Vec<u8>>,
}

impl<E: ByteOrder> ValueWriterBlob<E> {
	#[must_use]
	pub fn new() -> ValueWriterBlob<E> {
		ValueWriterBlob {
			_phantom: PhantomData,
			cursor: Cursor::new(Vec::new()),
		}
	}

	#[must_use]
	pub fn into_blob(self) -> Blob {
		Blob::from(self.cursor.into_inner())
	}
}

impl ValueWriterBlob<LittleEndian> {
	#[must_use]
	pub fn new_le() -> ValueWriterBlob<LittleEndian> {
		ValueWriterBlob::new()
	}
}

impl ValueWriterBlob<BigEndian> {
	#[must_use]
	pub fn new_be() -> ValueWriterBlob<BigEndian> {
		ValueWriterBlob::new()
	}
}

impl<E: ByteOrder> ValueWriter<E> for ValueWriterBlob<E> {
	fn get_writer(&mut self) -> &mut dyn Write {
		&mut self.cursor
	}

	fn position(&mut self) -> Result<u64> {
		Ok(self.cursor.position())
	}
}

impl<E: ByteOrder> Default for ValueWriterBlob<E> {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn collects_written_bytes() {
		let mut writer = ValueWriterBlob::new_le();
		writer.write_u8(0xAB).unwrap();
		writer.write_u8(0xCD).unwrap();
		assert_eq!(writer.position().unwrap(), 2);
		assert_eq!(writer.into_blob().as_slice(), &[0xAB, 0xCD]);
	}

	#[test]
	fn big_endian_variant() {
		let mut writer = ValueWriterBlob::new_be();
		writer.write_u16(0x0102).unwrap();
		assert_eq!(writer.into_blob().as_slice(), &[0x01, 0x02]);
	}
}
