//! Interned per-layer property tables.
//!
//! The MVT format stores every distinct key and value once per layer;
//! features reference them through pairs of indices (`tag_ids`).

use crate::geo::{GeoProperties, GeoValue};
use anyhow::{Result, anyhow, ensure};
use std::{collections::HashMap, fmt::Debug, hash::Hash};

/// An append-only interning table: every distinct entry gets a stable index
/// in insertion order.
#[derive(Clone, PartialEq)]
pub struct InternTable<T>
where
	T: Clone + Eq + Hash,
{
	list: Vec<T>,
	map: HashMap<T, u32>,
}

impl<T> Default for InternTable<T>
where
	T: Clone + Eq + Hash,
{
	fn default() -> Self {
		InternTable {
			list: Vec::new(),
			map: HashMap::new(),
		}
	}
}

impl<T> InternTable<T>
where
	T: Clone + Debug + Eq + Hash,
{
	pub fn new() -> InternTable<T> {
		InternTable {
			list: Vec::new(),
			map: HashMap::new(),
		}
	}

	/// Adds an entry if it is new; returns its index either way.
	pub fn intern(&mut self, entry: T) -> u32 {
		if let Some(index) = self.map.get(&entry) {
			return *index;
		}
		let index = self.list.len() as u32;
		self.map.insert(entry.clone(), index);
		self.list.push(entry);
		index
	}

	pub fn get(&self, id: u32) -> Result<&T> {
		self.list.get(id as usize).ok_or_else(|| anyhow!("id {id} not found"))
	}

	pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
		self.list.iter()
	}

	pub fn len(&self) -> usize {
		self.list.len()
	}

	pub fn is_empty(&self) -> bool {
		self.list.is_empty()
	}
}

impl<T> Debug for InternTable<T>
where
	T: Clone + Debug + Eq + Hash,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_list().entries(&self.list).finish()
	}
}

/// The key and value tables of one layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyTables {
	pub keys: InternTable<String>,
	pub values: InternTable<GeoValue>,
}

impl PropertyTables {
	pub fn new() -> Self {
		Self {
			keys: InternTable::new(),
			values: InternTable::new(),
		}
	}

	/// Interns all properties of one feature, returning its `tag_ids`
	/// (alternating key index, value index).
	pub fn encode_tags(&mut self, properties: &GeoProperties) -> Vec<u32> {
		let mut tag_ids = Vec::with_capacity(properties.len() * 2);
		for (key, value) in properties.iter() {
			tag_ids.push(self.keys.intern(key.clone()));
			tag_ids.push(self.values.intern(value.clone()));
		}
		tag_ids
	}

	/// Resolves `tag_ids` back into a property map.
	pub fn decode_tags(&self, tag_ids: &[u32]) -> Result<GeoProperties> {
		ensure!(tag_ids.len() % 2 == 0, "tag_ids must come in pairs");
		let mut properties = GeoProperties::new();
		for pair in tag_ids.chunks(2) {
			properties.insert(self.keys.get(pair[0])?.clone(), self.values.get(pair[1])?.clone());
		}
		Ok(properties)
	}
}
