use super::GeoValue;
use std::{
	collections::{BTreeMap, btree_map},
	fmt::Debug,
};

/// Reserved property key naming the output layer of a feature.
pub const KEY_LAYER: &str = "@layer";
/// Reserved property key with the minimum zoom level a feature renders at.
pub const KEY_ZOOM_MIN: &str = "@zoom:min";
/// Reserved property key with the maximum zoom level a feature renders at.
pub const KEY_ZOOM_MAX: &str = "@zoom:max";

/// String-keyed feature properties.
///
/// Insertion order is irrelevant; iteration is deterministic (sorted by
/// key), which keeps encoded output stable. Keys prefixed with `@` carry
/// rendering metadata and are not ordinary attributes.
#[derive(Clone, Default, PartialEq)]
pub struct GeoProperties {
	properties: BTreeMap<String, GeoValue>,
}

impl GeoProperties {
	pub fn new() -> GeoProperties {
		GeoProperties {
			properties: BTreeMap::new(),
		}
	}

	pub fn insert(&mut self, key: String, value: GeoValue) {
		self.properties.insert(key, value);
	}

	pub fn remove(&mut self, key: &str) {
		self.properties.remove(key);
	}

	pub fn get(&self, key: &str) -> Option<&GeoValue> {
		self.properties.get(key)
	}

	pub fn iter(&self) -> btree_map::Iter<'_, String, GeoValue> {
		self.properties.iter()
	}

	pub fn len(&self) -> usize {
		self.properties.len()
	}

	pub fn is_empty(&self) -> bool {
		self.properties.is_empty()
	}
}

impl IntoIterator for GeoProperties {
	type Item = (String, GeoValue);
	type IntoIter = btree_map::IntoIter<String, GeoValue>;
	fn into_iter(self) -> Self::IntoIter {
		self.properties.into_iter()
	}
}

impl From<Vec<(&str, GeoValue)>> for GeoProperties {
	fn from(value: Vec<(&str, GeoValue)>) -> Self {
		GeoProperties {
			properties: value.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
		}
	}
}

impl FromIterator<(String, GeoValue)> for GeoProperties {
	fn from_iter<T: IntoIterator<Item = (String, GeoValue)>>(iter: T) -> Self {
		GeoProperties {
			properties: BTreeMap::from_iter(iter),
		}
	}
}

impl Debug for GeoProperties {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_map().entries(self.properties.iter()).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn insert_get_remove() {
		let mut props = GeoProperties::new();
		props.insert("name".to_string(), GeoValue::from("main street"));
		props.insert("lanes".to_string(), GeoValue::from(2));
		assert_eq!(props.get("name"), Some(&GeoValue::from("main street")));
		assert_eq!(props.len(), 2);
		props.remove("name");
		assert_eq!(props.get("name"), None);
	}

	#[test]
	fn iteration_is_sorted_by_key() {
		let props = GeoProperties::from(vec![
			("b", GeoValue::from(2)),
			("a", GeoValue::from(1)),
			("c", GeoValue::from(3)),
		]);
		let keys: Vec<&str> = props.iter().map(|(k, _)| k.as_str()).collect();
		assert_eq!(keys, vec!["a", "b", "c"]);
	}

	#[test]
	fn reserved_keys() {
		let props = GeoProperties::from(vec![
			(KEY_LAYER, GeoValue::from("water")),
			(KEY_ZOOM_MIN, GeoValue::from(7)),
		]);
		assert_eq!(props.get(KEY_LAYER).unwrap().as_str(), Some("water"));
		assert_eq!(props.get(KEY_ZOOM_MIN).unwrap().as_int(), Some(7));
		assert_eq!(props.get(KEY_ZOOM_MAX), None);
	}
}
