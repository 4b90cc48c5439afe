use super::*;
use std::fmt::Debug;

/// A geographic feature: geometry plus properties and an optional id.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoFeature {
	pub id: Option<u64>,
	pub geometry: Geometry,
	pub properties: GeoProperties,
}

impl GeoFeature {
	pub fn new(geometry: Geometry) -> Self {
		Self {
			id: None,
			geometry,
			properties: GeoProperties::new(),
		}
	}

	pub fn set_id(&mut self, id: u64) {
		self.id = Some(id);
	}

	pub fn set_property<T>(&mut self, key: &str, value: T)
	where
		GeoValue: From<T>,
	{
		self.properties.insert(key.to_string(), GeoValue::from(value));
	}

	/// A copy of this feature with a different geometry, as produced by
	/// clipping.
	pub fn with_geometry(&self, geometry: Geometry) -> GeoFeature {
		GeoFeature {
			id: self.id,
			geometry,
			properties: self.properties.clone(),
		}
	}

	#[cfg(test)]
	pub fn new_example() -> Self {
		let mut feature = Self::new(Geometry::new_example());
		feature.set_id(13);
		feature.set_property("name", "Nice");
		feature.set_property("population", 348085);
		feature
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn construction() {
		let feature = GeoFeature::new_example();
		assert_eq!(feature.id, Some(13));
		assert_eq!(feature.properties.get("name"), Some(&GeoValue::from("Nice")));
	}

	#[test]
	fn with_geometry_keeps_properties() {
		let feature = GeoFeature::new_example();
		let derived = feature.with_geometry(Geometry::new_point([1.0, 2.0]));
		assert_eq!(derived.id, feature.id);
		assert_eq!(derived.properties, feature.properties);
		assert_eq!(derived.geometry.type_name(), "Point");
	}
}
