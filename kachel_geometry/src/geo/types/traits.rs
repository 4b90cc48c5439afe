use anyhow::Result;
use std::fmt::Debug;

/// Common behavior of all geometric primitives.
pub trait GeometryTrait: Debug + Clone + Sized {
	/// Signed area for rings, 0 for everything without area.
	fn area(&self) -> f64;

	/// Checks structural validity (enough points, rings closed).
	fn verify(&self) -> Result<()>;

	/// `true` if the point lies inside this geometry. Only closed
	/// geometries can contain points; boundary points may go either way.
	fn contains_point(&self, x: f64, y: f64) -> bool;

	/// Bounding box `[x_min, y_min, x_max, y_max]`, or `None` when empty.
	fn compute_bounds(&self) -> Option<[f64; 4]>;
}

/// Composite geometries are collections of simpler elements: a line string
/// is made of coordinates, a polygon of rings.
pub trait CompositeGeometryTrait<Item>: Debug + Clone {
	fn new() -> Self;

	fn as_vec(&self) -> &Vec<Item>;

	fn as_mut_vec(&mut self) -> &mut Vec<Item>;

	fn into_inner(self) -> Vec<Item>;

	fn into_iter(self) -> impl Iterator<Item = Item> {
		self.into_inner().into_iter()
	}

	fn is_empty(&self) -> bool {
		self.as_vec().is_empty()
	}

	fn len(&self) -> usize {
		self.as_vec().len()
	}

	fn push(&mut self, item: Item) {
		self.as_mut_vec().push(item);
	}

	fn first(&self) -> Option<&Item> {
		self.as_vec().first()
	}

	fn last(&self) -> Option<&Item> {
		self.as_vec().last()
	}
}
