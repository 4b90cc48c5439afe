//! [`ValueReaderSlice`]: a [`ValueReader`] over a borrowed byte slice.

use super::{SeekRead, ValueReader};
use anyhow::{Result, anyhow, bail};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::{io::Cursor, marker::PhantomData};

pub struct ValueReaderSlice<'a, E: ByteOrder> {
	_phantom: PhantomData<E>,
	cursor: Cursor<&'a [u8]>,
	len: u64,
}

impl<'a, E: ByteOrder> ValueReaderSlice<'a, E> {
	#[must_use]
	pub fn new(slice: &'a [u8]) -> ValueReaderSlice<'a, E> {
		ValueReaderSlice {
			_phantom: PhantomData,
			len: slice.len() as u64,
			cursor: Cursor::new(slice),
		}
	}
}

impl<'a> ValueReaderSlice<'a, LittleEndian> {
	#[must_use]
	pub fn new_le(slice: &'a [u8]) -> ValueReaderSlice<'a, LittleEndian> {
		ValueReaderSlice::new(slice)
	}
}

impl<'a> ValueReaderSlice<'a, BigEndian> {
	#[must_use]
	pub fn new_be(slice: &'a [u8]) -> ValueReaderSlice<'a, BigEndian> {
		ValueReaderSlice::new(slice)
	}
}

impl SeekRead for Cursor<&[u8]> {}

impl<'a, E: ByteOrder + 'a> ValueReader<'a, E> for ValueReaderSlice<'a, E> {
	fn get_reader(&mut self) -> &mut dyn SeekRead {
		&mut self.cursor
	}

	fn len(&self) -> u64 {
		self.len
	}

	fn position(&mut self) -> u64 {
		self.cursor.position()
	}

	fn set_position(&mut self, position: u64) -> Result<()> {
		if position > self.len {
			bail!("set position beyond end of data");
		}
		self.cursor.set_position(position);
		Ok(())
	}

	fn get_sub_reader<'b>(&'b mut self, length: u64) -> Result<Box<dyn ValueReader<'b, E> + 'b>>
	where
		E: 'b,
	{
		let start = self.cursor.position();
		let end = start + length;
		if end > self.len {
			bail!("requested sub-reader length exceeds remaining data");
		}

		self.cursor.set_position(end);
		Ok(Box::new(ValueReaderSlice::<E>::new(
			self
				.cursor
				.get_ref()
				.get(start as usize..end as usize)
				.ok_or(anyhow!("out of bounds"))?,
		)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn len_and_position() {
		let mut reader = ValueReaderSlice::new_le(&[0x80; 42]);
		assert_eq!(reader.len(), 42);
		assert_eq!(reader.position(), 0);
		reader.set_position(40).unwrap();
		assert_eq!(reader.remaining(), 2);
		assert!(reader.set_position(43).is_err());
	}

	#[test]
	fn endianness_is_a_type_parameter() {
		let data = &[0x01, 0x02, 0x03, 0x04];
		assert_eq!(ValueReaderSlice::new_le(data).read_u16().unwrap(), 0x0201);
		assert_eq!(ValueReaderSlice::new_be(data).read_u16().unwrap(), 0x0102);
	}

	#[test]
	fn sub_reader_too_long_fails() {
		let mut reader = ValueReaderSlice::new_le(&[1, 2, 3]);
		assert!(reader.get_sub_reader(4).is_err());
	}
}
