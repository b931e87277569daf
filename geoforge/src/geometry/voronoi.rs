//! Voronoi cells bounded by a rectangle.

use geo::{Area, Coord, LineString, Point, Polygon, Rect};

/// Computes the Voronoi cell of every site inside `bounds`.
///
/// The cell of a site is the bounding rectangle cut by the perpendicular bisector with every other site. A site that
/// repeats an earlier site gets `None`, as does a site whose cell has no area inside the bounds.
pub fn voronoi_cells(sites: &[Point<f64>], bounds: Rect<f64>) -> Vec<Option<Polygon<f64>>> {
    sites
        .iter()
        .enumerate()
        .map(|(index, site)| cell(index, site.0, sites, bounds))
        .collect()
}

fn cell(
    index: usize,
    site: Coord<f64>,
    sites: &[Point<f64>],
    bounds: Rect<f64>,
) -> Option<Polygon<f64>> {
    let mut ring: Vec<Coord<f64>> = bounds.to_polygon().exterior().0.clone();
    ring.pop();

    for (other_index, other) in sites.iter().enumerate() {
        if other_index == index {
            continue;
        }

        if other.0 == site {
            if other_index < index {
                return None;
            }
            continue;
        }

        ring = clip_half_plane(&ring, site, other.0);
        if ring.len() < 3 {
            return None;
        }
    }

    let polygon = Polygon::new(LineString::new(ring), vec![]);
    if polygon.unsigned_area() > 0.0 {
        Some(polygon)
    } else {
        None
    }
}

/// Keeps the part of the ring closer to `site` than to `other`.
fn clip_half_plane(ring: &[Coord<f64>], site: Coord<f64>, other: Coord<f64>) -> Vec<Coord<f64>> {
    let middle = (site + other) / 2.0;
    let normal = other - site;
    let side = |c: Coord<f64>| (c.x - middle.x) * normal.x + (c.y - middle.y) * normal.y;

    let mut result = Vec::with_capacity(ring.len() + 1);
    for (i, &current) in ring.iter().enumerate() {
        let next = ring[(i + 1) % ring.len()];
        let current_side = side(current);
        let next_side = side(next);

        if current_side <= 0.0 {
            result.push(current);
        }

        if (current_side < 0.0 && next_side > 0.0) || (current_side > 0.0 && next_side < 0.0) {
            let t = current_side / (current_side - next_side);
            result.push(current + (next - current) * t);
        }
    }

    result
}
