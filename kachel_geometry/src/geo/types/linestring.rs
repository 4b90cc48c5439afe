use super::{CompositeGeometryTrait, Coordinates, GeometryTrait};
use anyhow::{Result, ensure};
use std::fmt::Debug;

/// An ordered sequence of connected coordinates.
#[derive(Clone, PartialEq)]
pub struct LineStringGeometry(pub Vec<Coordinates>);

impl GeometryTrait for LineStringGeometry {
	fn area(&self) -> f64 {
		0.0
	}

	fn verify(&self) -> Result<()> {
		ensure!(self.0.len() >= 2, "LineString must have at least two points");
		Ok(())
	}

	fn contains_point(&self, _x: f64, _y: f64) -> bool {
		false
	}

	fn compute_bounds(&self) -> Option<[f64; 4]> {
		bounds_of(&self.0)
	}
}

/// Bounding box of a coordinate slice, `None` when empty.
pub(crate) fn bounds_of(coords: &[Coordinates]) -> Option<[f64; 4]> {
	let first = coords.first()?;
	let mut bounds = [first.x(), first.y(), first.x(), first.y()];
	for c in coords {
		bounds[0] = bounds[0].min(c.x());
		bounds[1] = bounds[1].min(c.y());
		bounds[2] = bounds[2].max(c.x());
		bounds[3] = bounds[3].max(c.y());
	}
	Some(bounds)
}

impl CompositeGeometryTrait<Coordinates> for LineStringGeometry {
	fn new() -> Self {
		Self(Vec::new())
	}
	fn as_vec(&self) -> &Vec<Coordinates> {
		&self.0
	}
	fn as_mut_vec(&mut self) -> &mut Vec<Coordinates> {
		&mut self.0
	}
	fn into_inner(self) -> Vec<Coordinates> {
		self.0
	}
}

impl Debug for LineStringGeometry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_list().entries(&self.0).finish()
	}
}

crate::impl_from_array!(LineStringGeometry, Coordinates);
