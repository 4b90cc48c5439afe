use crate::geo::Geometry;

/// Wire-level geometry type tag of a vector-tile feature.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum GeomType {
	#[default]
	Unknown = 0,
	Point = 1,
	LineString = 2,
	Polygon = 3,
}

impl GeomType {
	pub fn as_u64(&self) -> u64 {
		*self as u64
	}
}

impl From<u64> for GeomType {
	fn from(value: u64) -> Self {
		match value {
			1 => GeomType::Point,
			2 => GeomType::LineString,
			3 => GeomType::Polygon,
			_ => GeomType::Unknown,
		}
	}
}

impl From<&Geometry> for GeomType {
	fn from(geometry: &Geometry) -> Self {
		match geometry {
			Geometry::Point(_) => GeomType::Point,
			Geometry::LineString(_) => GeomType::LineString,
			Geometry::Polygon(_) => GeomType::Polygon,
		}
	}
}
