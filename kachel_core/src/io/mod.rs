//! Binary value readers and writers.
//!
//! The [`ValueReader`] and [`ValueWriter`] traits provide varint, zigzag and
//! protobuf-style framing primitives on top of plain byte access. The byte
//! order is a compile-time type parameter (`byteorder::LE`/`BE`), never
//! process-wide state; everything this workspace persists is little-endian.

mod value_reader;
mod value_reader_slice;
mod value_writer;
mod value_writer_blob;

pub use value_reader::*;
pub use value_reader_slice::*;
pub use value_writer::*;
pub use value_writer_blob::*;
