//! Line clipping: a line string is walked segment by segment and every
//! maximal run inside the rectangle becomes its own output line, split
//! exactly at the boundary crossings.

use crate::geo::*;
use kachel_core::GeoBBox;

/// Clips a line string to `bbox`.
///
/// Returns one line per inside run; runs shorter than two points (a line
/// only touching the rectangle in a single point) are dropped.
pub fn clip_line(line: &LineStringGeometry, bbox: &GeoBBox) -> Vec<LineStringGeometry> {
	let pts = &line.0;
	if pts.len() < 2 {
		return vec![];
	}

	// fully inside: return the input untouched
	if let Some(b) = line.compute_bounds() {
		if bbox.contains_bbox(&GeoBBox::new_unchecked(b[0], b[1], b[2], b[3])) {
			return vec![line.clone()];
		}
	}

	let mut out: Vec<LineStringGeometry> = Vec::new();
	let mut run: Vec<Coordinates> = Vec::new();

	let flush = |run: &mut Vec<Coordinates>, out: &mut Vec<LineStringGeometry>| {
		if run.len() >= 2 {
			out.push(LineStringGeometry(std::mem::take(run)));
		} else {
			run.clear();
		}
	};

	for window in pts.windows(2) {
		let (a, b) = (window[0], window[1]);
		let Some((t0, t1)) = clip_parameters(&a, &b, bbox) else {
			flush(&mut run, &mut out);
			continue;
		};

		let pa = lerp(&a, &b, t0);
		let pb = lerp(&a, &b, t1);

		if t0 > 0.0 {
			// entering the rectangle: any previous run ended earlier
			flush(&mut run, &mut out);
			run.push(pa);
		} else if run.is_empty() {
			run.push(pa);
		}
		push_dedup(&mut run, pb);

		if t1 < 1.0 {
			// leaving the rectangle
			flush(&mut run, &mut out);
		}
	}
	flush(&mut run, &mut out);

	out
}

fn push_dedup(run: &mut Vec<Coordinates>, pt: Coordinates) {
	if run.last() != Some(&pt) {
		run.push(pt);
	}
}

fn lerp(a: &Coordinates, b: &Coordinates, t: f64) -> Coordinates {
	// endpoints stay bit-exact
	if t <= 0.0 {
		*a
	} else if t >= 1.0 {
		*b
	} else {
		Coordinates::new(a.x() + (b.x() - a.x()) * t, a.y() + (b.y() - a.y()) * t)
	}
}

/// Liang-Barsky parameters of the sub-segment of `a -> b` inside `bbox`, or
/// `None` if the segment misses the rectangle entirely.
fn clip_parameters(a: &Coordinates, b: &Coordinates, bbox: &GeoBBox) -> Option<(f64, f64)> {
	let dx = b.x() - a.x();
	let dy = b.y() - a.y();
	let mut t0 = 0.0f64;
	let mut t1 = 1.0f64;

	for (p, q) in [
		(-dx, a.x() - bbox.x_min),
		(dx, bbox.x_max - a.x()),
		(-dy, a.y() - bbox.y_min),
		(dy, bbox.y_max - a.y()),
	] {
		if p == 0.0 {
			if q < 0.0 {
				return None;
			}
		} else {
			let r = q / p;
			if p < 0.0 {
				if r > t1 {
					return None;
				}
				if r > t0 {
					t0 = r;
				}
			} else {
				if r < t0 {
					return None;
				}
				if r < t1 {
					t1 = r;
				}
			}
		}
	}
	Some((t0, t1))
}
