//! Typed MVT property values.

use crate::geo::GeoValue;
use anyhow::{Context, Result, anyhow, bail};
use byteorder::LE;
use kachel_core::{
	Blob,
	io::{ValueReader, ValueWriter, ValueWriterBlob},
};

/// Wire encoding of [`GeoValue`] as an MVT value message.
///
/// Writing uses one field per variant: string (1), double (3), int (4).
/// Reading additionally accepts the other numeric MVT fields (float, uint,
/// sint, bool), mapped onto the pipeline's three-type attribute model.
pub trait GeoValuePBF<'a>: Sized {
	fn read(reader: &mut dyn ValueReader<'a, LE>) -> Result<Self>;
	fn to_blob(&self) -> Result<Blob>;
}

impl<'a> GeoValuePBF<'a> for GeoValue {
	fn read(reader: &mut dyn ValueReader<'a, LE>) -> Result<GeoValue> {
		let mut value: Option<GeoValue> = None;

		while reader.has_remaining() {
			value = Some(match reader.read_pbf_key().context("failed to read PBF key")? {
				(1, 2) => GeoValue::String(reader.read_pbf_string().context("failed to read string value")?),
				(2, 5) => GeoValue::Double(f64::from(reader.read_f32().context("failed to read float value")?)),
				(3, 1) => GeoValue::Double(reader.read_f64().context("failed to read double value")?),
				(4, 0) => GeoValue::Int(reader.read_varint().context("failed to read int value")? as i64),
				(5, 0) => GeoValue::Int(reader.read_varint().context("failed to read uint value")? as i64),
				(6, 0) => GeoValue::Int(reader.read_svarint().context("failed to read sint value")?),
				(7, 0) => GeoValue::Int(i64::from(reader.read_varint().context("failed to read bool value")? != 0)),
				(f, w) => bail!("unexpected field number ({f}) / wire type ({w}) in value message"),
			});
		}

		value.ok_or_else(|| anyhow!("empty value message"))
	}

	fn to_blob(&self) -> Result<Blob> {
		let mut writer = ValueWriterBlob::new_le();

		match self {
			GeoValue::String(s) => {
				writer.write_pbf_key(1, 2)?;
				writer.write_pbf_string(s)?;
			}
			GeoValue::Double(d) => {
				writer.write_pbf_key(3, 1)?;
				writer.write_f64(*d)?;
			}
			GeoValue::Int(i) => {
				writer.write_pbf_key(4, 0)?;
				writer.write_varint(*i as u64)?;
			}
		}

		Ok(writer.into_blob())
	}
}
