//! Polygon clipping via a boundary walk.
//!
//! The subject ring and the clip-rectangle boundary are laid out as two
//! cyclic sequences in index-based arenas. Every subject-edge × clip-edge
//! intersection is inserted into both sequences, cross-linked as a crossing
//! node, and classified as *entering* or *leaving* the rectangle. Output
//! rings are traced by walking the subject sequence from an entering
//! crossing to the next leaving crossing, then following the rectangle
//! boundary back to an entering crossing, until the start is reached again.
//! Both sequences are wound counter-clockwise, so "forward" keeps the
//! clipped interior on the same side throughout.
//!
//! Walks are bounded by the node count; a walk that fails to close (only
//! possible on malformed, e.g. self-intersecting, input) fails with a
//! geometry error instead of looping.

use crate::geo::*;
use anyhow::{Result, anyhow};
use kachel_core::{GeoBBox, TilerError};

/// Clips a polygon (outer ring plus holes) to `bbox`.
///
/// Holes are clipped with the same boundary walk as the outer ring; every
/// clipped hole is attached to the output polygon that contains it, wound
/// opposite to its outer ring. Holes outside every output polygon are
/// dropped.
pub fn clip_polygon(polygon: &PolygonGeometry, bbox: &GeoBBox) -> Result<Vec<PolygonGeometry>> {
	let Some(bounds) = polygon.compute_bounds() else {
		return Ok(vec![]);
	};
	let poly_bbox = GeoBBox::new_unchecked(bounds[0], bounds[1], bounds[2], bounds[3]);

	// fully inside: the polygon is returned unmodified
	if bbox.contains_bbox(&poly_bbox) {
		return Ok(vec![polygon.clone()]);
	}
	if !bbox.overlaps(&poly_bbox) {
		return Ok(vec![]);
	}

	let Some(outer) = polygon.outer() else {
		return Ok(vec![]);
	};

	let mut result: Vec<PolygonGeometry> = clip_ring(outer, bbox)?
		.into_iter()
		.map(|ring| PolygonGeometry(vec![ring]))
		.collect();
	if result.is_empty() {
		return Ok(vec![]);
	}

	for hole in polygon.holes() {
		for clipped in clip_ring(hole, bbox)? {
			// a hole swallowing the whole rectangle hides the polygon here
			if is_full_rect(&clipped, bbox) {
				return Ok(vec![]);
			}
			attach_hole(&mut result, clipped);
		}
	}

	Ok(result)
}

/// `true` if the ring is exactly the clip rectangle.
fn is_full_rect(ring: &RingGeometry, bbox: &GeoBBox) -> bool {
	ring.0.len() == 5
		&& ring.0.iter().all(|pt| {
			(pt.x() == bbox.x_min || pt.x() == bbox.x_max) && (pt.y() == bbox.y_min || pt.y() == bbox.y_max)
		})
}

/// Attaches a clipped hole ring to the output polygon containing it, wound
/// opposite to that polygon's outer ring.
fn attach_hole(polygons: &mut Vec<PolygonGeometry>, hole: RingGeometry) {
	let anchor = hole
		.0
		.iter()
		.find_map(|pt| {
			polygons
				.iter()
				.position(|p| p.outer().is_some_and(|outer| outer.contains_point(pt.x(), pt.y())))
		});
	let Some(index) = anchor else {
		log::debug!("dropping hole ring outside every clipped polygon");
		return;
	};

	let target = &mut polygons[index];
	let outer_ccw = target.outer().is_some_and(RingGeometry::is_ccw);
	let hole = if hole.is_ccw() == outer_ccw { hole.reversed() } else { hole };
	target.push(hole);
}

/// Clips a single ring to `bbox`, returning zero or more closed rings wound
/// counter-clockwise.
pub fn clip_ring(ring: &RingGeometry, bbox: &GeoBBox) -> Result<Vec<RingGeometry>> {
	// fully inside: unchanged
	if let Some(b) = ring.compute_bounds() {
		let ring_bbox = GeoBBox::new_unchecked(b[0], b[1], b[2], b[3]);
		if bbox.contains_bbox(&ring_bbox) {
			return Ok(vec![ring.clone()]);
		}
		if !bbox.overlaps(&ring_bbox) {
			return Ok(vec![]);
		}
	} else {
		return Ok(vec![]);
	}

	// normalize to an open, deduplicated, counter-clockwise point list
	let mut pts = ring.0.clone();
	if pts.len() >= 2 && pts.first() == pts.last() {
		pts.pop();
	}
	pts.dedup();
	if pts.len() < 3 {
		return Ok(vec![]);
	}
	if !RingGeometry(pts.clone()).is_ccw() {
		pts.reverse();
	}

	Walker::new(&pts, bbox)?.trace()
}

/// One node of a cyclic point sequence; crossing nodes reference the shared
/// crossing table.
struct SeqNode {
	pt: Coordinates,
	crossing: Option<usize>,
}

/// A subject-edge × clip-edge intersection, cross-linked into both cyclic
/// sequences by position index.
struct Crossing {
	subj_pos: usize,
	clip_pos: usize,
	entering: bool,
	leaving: bool,
	visited: bool,
}

struct Walker {
	subject: Vec<SeqNode>,
	clip: Vec<SeqNode>,
	crossings: Vec<Crossing>,
}

/// An intersection found during the edge sweep, before the sequences are
/// laid out.
struct Hit {
	subj_edge: usize,
	t: f64,
	clip_edge: usize,
	u: f64,
	pt: Coordinates,
}

impl Walker {
	fn new(pts: &[Coordinates], bbox: &GeoBBox) -> Result<Walker> {
		let corners = [
			Coordinates::new(bbox.x_min, bbox.y_min),
			Coordinates::new(bbox.x_max, bbox.y_min),
			Coordinates::new(bbox.x_max, bbox.y_max),
			Coordinates::new(bbox.x_min, bbox.y_max),
		];

		let n = pts.len();
		let mut hits: Vec<Hit> = Vec::new();
		for (i, a) in pts.iter().enumerate() {
			let b = &pts[(i + 1) % n];
			for j in 0..4 {
				let c = &corners[j];
				let d = &corners[(j + 1) % 4];
				if let Some((pt, t, u)) = segment_intersection(a, b, c, d) {
					// intersections coinciding with a subject vertex or a
					// rectangle corner are touches, not crossings
					if t == 0.0 || t == 1.0 || u == 0.0 || u == 1.0 {
						continue;
					}
					hits.push(Hit {
						subj_edge: i,
						t,
						clip_edge: j,
						u,
						pt,
					});
				}
			}
		}

		let mut crossings: Vec<Crossing> = hits
			.iter()
			.map(|_| Crossing {
				subj_pos: 0,
				clip_pos: 0,
				entering: false,
				leaving: false,
				visited: false,
			})
			.collect();

		// subject sequence: original vertices with crossings inserted in
		// edge order
		let mut subject: Vec<SeqNode> = Vec::with_capacity(n + hits.len());
		for (i, pt) in pts.iter().enumerate() {
			subject.push(SeqNode {
				pt: *pt,
				crossing: None,
			});
			let mut edge_hits: Vec<usize> = (0..hits.len()).filter(|h| hits[*h].subj_edge == i).collect();
			edge_hits.sort_by(|a, b| hits[*a].t.total_cmp(&hits[*b].t));
			for h in edge_hits {
				crossings[h].subj_pos = subject.len();
				subject.push(SeqNode {
					pt: hits[h].pt,
					crossing: Some(h),
				});
			}
		}

		// clip sequence: rectangle corners with crossings inserted in edge
		// order
		let mut clip: Vec<SeqNode> = Vec::with_capacity(4 + hits.len());
		for (j, corner) in corners.iter().enumerate() {
			clip.push(SeqNode {
				pt: *corner,
				crossing: None,
			});
			let mut edge_hits: Vec<usize> = (0..hits.len()).filter(|h| hits[*h].clip_edge == j).collect();
			edge_hits.sort_by(|a, b| hits[*a].u.total_cmp(&hits[*b].u));
			for h in edge_hits {
				crossings[h].clip_pos = clip.len();
				clip.push(SeqNode {
					pt: hits[h].pt,
					crossing: Some(h),
				});
			}
		}

		// classify each crossing by the midpoints towards its neighbors in
		// the subject sequence: outside -> inside is entering, the reverse
		// is leaving, anything else is a touch
		let len = subject.len();
		for crossing in crossings.iter_mut() {
			let pos = crossing.subj_pos;
			let prev = &subject[(pos + len - 1) % len].pt;
			let next = &subject[(pos + 1) % len].pt;
			let own = &subject[pos].pt;
			let before_inside = bbox.contains_point((prev.x() + own.x()) / 2.0, (prev.y() + own.y()) / 2.0);
			let after_inside = bbox.contains_point((own.x() + next.x()) / 2.0, (own.y() + next.y()) / 2.0);
			crossing.entering = !before_inside && after_inside;
			crossing.leaving = before_inside && !after_inside;
		}

		Ok(Walker {
			subject,
			clip,
			crossings,
		})
	}

	fn trace(mut self) -> Result<Vec<RingGeometry>> {
		let mut output = Vec::new();

		if !self.crossings.iter().any(|c| c.entering) {
			return Ok(self.no_crossing_result());
		}

		let step_limit = 2 * (self.subject.len() + self.clip.len()) + 8;

		for start in 0..self.crossings.len() {
			if !self.crossings[start].entering || self.crossings[start].visited {
				continue;
			}

			let mut ring: Vec<Coordinates> = Vec::new();
			let mut steps = 0usize;
			let mut current = start;

			loop {
				self.crossings[current].visited = true;
				let mut pos = self.crossings[current].subj_pos;
				push_dedup(&mut ring, self.subject[pos].pt);

				// walk the subject forward until the run leaves the rectangle
				let leaving = loop {
					pos = (pos + 1) % self.subject.len();
					steps += 1;
					if steps > step_limit {
						return Err(anyhow!(TilerError::geometry(
							"boundary walk failed to close a ring; polygon is malformed"
						)));
					}
					let node = &self.subject[pos];
					push_dedup(&mut ring, node.pt);
					if let Some(id) = node.crossing {
						if self.crossings[id].leaving {
							break id;
						}
					}
				};

				// switch to the rectangle boundary and walk forward to the
				// next entering crossing
				let mut cpos = self.crossings[leaving].clip_pos;
				let entering = loop {
					cpos = (cpos + 1) % self.clip.len();
					steps += 1;
					if steps > step_limit {
						return Err(anyhow!(TilerError::geometry(
							"boundary walk failed to close a ring; polygon is malformed"
						)));
					}
					let node = &self.clip[cpos];
					match node.crossing {
						Some(id) if self.crossings[id].entering => break id,
						_ => push_dedup(&mut ring, node.pt),
					}
				};

				if entering == start {
					break;
				}
				current = entering;
			}

			// close the ring
			if ring.first() != ring.last() {
				ring.push(ring[0]);
			}
			if ring.len() >= 4 {
				output.push(RingGeometry(ring));
			}
		}

		Ok(output)
	}

	/// Resolution when no crossing exists although the bboxes overlap:
	/// either the rectangle lies fully inside the ring (the visible part is
	/// the rectangle itself) or the ring lies outside the rectangle.
	fn no_crossing_result(&self) -> Vec<RingGeometry> {
		let ring = RingGeometry(self.subject.iter().map(|n| n.pt).collect());
		let corners: Vec<Coordinates> = self.clip.iter().filter(|n| n.crossing.is_none()).map(|n| n.pt).collect();
		if corners
			.iter()
			.all(|corner| ring.contains_point(corner.x(), corner.y()))
		{
			let mut rect = corners;
			rect.push(rect[0]);
			vec![RingGeometry(rect)]
		} else {
			vec![]
		}
	}
}

fn push_dedup(ring: &mut Vec<Coordinates>, pt: Coordinates) {
	if ring.last() != Some(&pt) {
		ring.push(pt);
	}
}

/// Intersection of segments `a -> b` and `c -> d`, with the parameters
/// along both segments. Parallel segments never intersect here.
fn segment_intersection(
	a: &Coordinates,
	b: &Coordinates,
	c: &Coordinates,
	d: &Coordinates,
) -> Option<(Coordinates, f64, f64)> {
	let rx = b.x() - a.x();
	let ry = b.y() - a.y();
	let sx = d.x() - c.x();
	let sy = d.y() - c.y();

	let denom = rx * sy - ry * sx;
	if denom == 0.0 {
		return None;
	}

	let t = ((c.x() - a.x()) * sy - (c.y() - a.y()) * sx) / denom;
	let u = ((c.x() - a.x()) * ry - (c.y() - a.y()) * rx) / denom;
	if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
		return None;
	}

	// snap the fixed axis of the axis-aligned clip edge to keep the
	// intersection exactly on the rectangle boundary
	let mut px = a.x() + t * rx;
	let mut py = a.y() + t * ry;
	if sx == 0.0 {
		px = c.x();
	}
	if sy == 0.0 {
		py = c.y();
	}
	Some((Coordinates::new(px, py), t, u))
}
