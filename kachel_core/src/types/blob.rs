//! [`Blob`] is a thin wrapper around `Vec<u8>` used to pass encoded tile
//! and bucket data between codecs, caches and sinks.

use std::fmt::Debug;

/// An owned chunk of binary data.
///
/// # Examples
///
/// ```rust
/// use kachel_core::Blob;
///
/// let blob = Blob::from("Hello, world!");
/// assert_eq!(blob.len(), 13);
/// assert_eq!(blob.as_str(), "Hello, world!");
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Blob(Vec<u8>);

impl Blob {
	/// Creates an empty `Blob`.
	#[must_use]
	pub fn new_empty() -> Blob {
		Blob(Vec::new())
	}

	/// Creates a zero-filled `Blob` of the given size.
	#[must_use]
	pub fn new_sized(length: usize) -> Blob {
		Blob(vec![0u8; length])
	}

	#[must_use]
	pub fn as_slice(&self) -> &[u8] {
		&self.0
	}

	pub fn as_mut_slice(&mut self) -> &mut [u8] {
		&mut self.0
	}

	/// Interprets the content as UTF-8 text, replacing invalid sequences.
	#[must_use]
	pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
		String::from_utf8_lossy(&self.0)
	}

	#[must_use]
	pub fn into_vec(self) -> Vec<u8> {
		self.0
	}

	#[must_use]
	pub fn len(&self) -> u64 {
		self.0.len() as u64
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Appends the content of another blob.
	pub fn extend(&mut self, other: &Blob) {
		self.0.extend_from_slice(other.as_slice());
	}
}

impl From<Vec<u8>> for Blob {
	fn from(value: Vec<u8>) -> Self {
		Blob(value)
	}
}

impl From<&[u8]> for Blob {
	fn from(value: &[u8]) -> Self {
		Blob(value.to_vec())
	}
}

impl<const N: usize> From<&[u8; N]> for Blob {
	fn from(value: &[u8; N]) -> Self {
		Blob(value.to_vec())
	}
}

impl From<&str> for Blob {
	fn from(value: &str) -> Self {
		Blob(value.as_bytes().to_vec())
	}
}

impl From<String> for Blob {
	fn from(value: String) -> Self {
		Blob(value.into_bytes())
	}
}

impl Debug for Blob {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_fmt(format_args!("Blob({} bytes)", self.0.len()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_and_sized() {
		assert!(Blob::new_empty().is_empty());
		let blob = Blob::new_sized(5);
		assert_eq!(blob.len(), 5);
		assert_eq!(blob.as_slice(), &[0, 0, 0, 0, 0]);
	}

	#[test]
	fn conversions_roundtrip() {
		let vec = vec![0u8, 1, 2, 3];
		assert_eq!(Blob::from(vec.clone()).into_vec(), vec);
		assert_eq!(Blob::from("abc").as_str(), "abc");
		assert_eq!(Blob::from(String::from("xyz")).len(), 3);
		assert_eq!(Blob::from(&[7u8, 8]).as_slice(), &[7, 8]);
	}

	#[test]
	fn extend_appends() {
		let mut blob = Blob::from("ab");
		blob.extend(&Blob::from("cd"));
		assert_eq!(blob.as_str(), "abcd");
	}

	#[test]
	fn debug_shows_length() {
		assert_eq!(format!("{:?}", Blob::from("abc")), "Blob(3 bytes)");
	}
}
