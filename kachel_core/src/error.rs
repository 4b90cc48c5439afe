use thiserror::Error;

/// Classified failure modes of the tiling pipeline.
///
/// All fallible APIs return `anyhow::Result`; errors that belong to one of
/// these classes are constructed as `TilerError` and enter the `anyhow`
/// chain, so callers can downcast to decide how to react. Everything except
/// [`TilerError::Geometry`] is fatal to a run: there are no partial-output
/// completion markers, so a failed run must be repeated from scratch.
#[derive(Debug, Error)]
pub enum TilerError {
	/// Malformed input bytes: bucket blocks, WKB geometry or MVT data.
	#[error("decode error: {0}")]
	Decode(String),

	/// Degenerate or unsupported geometry encountered while clipping or
	/// encoding. The tile driver treats this class as per-feature
	/// recoverable; everywhere else it is fatal.
	#[error("geometry error: {0}")]
	Geometry(String),

	/// A persisted bucket announces a compression or message type that has
	/// no defined meaning yet.
	#[error("unsupported format: {0}")]
	UnsupportedFormat(String),

	/// Flush or tile-write failure.
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}

impl TilerError {
	pub fn decode<T: ToString + ?Sized>(msg: &T) -> Self {
		TilerError::Decode(msg.to_string())
	}

	pub fn geometry<T: ToString + ?Sized>(msg: &T) -> Self {
		TilerError::Geometry(msg.to_string())
	}

	pub fn unsupported_format<T: ToString + ?Sized>(msg: &T) -> Self {
		TilerError::UnsupportedFormat(msg.to_string())
	}

	/// `true` if skipping the offending feature is a safe reaction.
	pub fn is_per_feature(&self) -> bool {
		matches!(self, TilerError::Geometry(_))
	}
}
