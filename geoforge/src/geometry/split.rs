//! Splitting lines by other lines.

use geo::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Line, LineString, MultiLineString};

/// Splits `line` at every point where it touches `cutter`.
///
/// Pieces are returned in order along the line. Zero length pieces are dropped. If the line does not touch the
/// cutter, the result contains the line itself.
pub fn split_line(line: &LineString<f64>, cutter: &MultiLineString<f64>) -> Vec<LineString<f64>> {
    let mut pieces = vec![];
    let mut current: Vec<Coord<f64>> = vec![];

    for segment in line.lines() {
        if current.is_empty() {
            current.push(segment.start);
        }

        let mut cuts = vec![];
        for cut_segment in cutter.iter().flat_map(|l| l.lines()) {
            match line_intersection(segment, cut_segment) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    cuts.push((position_on(segment, intersection), intersection));
                }
                Some(LineIntersection::Collinear { intersection }) => {
                    cuts.push((position_on(segment, intersection.start), intersection.start));
                    cuts.push((position_on(segment, intersection.end), intersection.end));
                }
                None => {}
            }
        }

        cuts.sort_by(|a, b| a.0.total_cmp(&b.0));
        for (_, cut) in cuts {
            push_distinct(&mut current, cut);
            if current.len() >= 2 {
                pieces.push(LineString::new(std::mem::take(&mut current)));
            }
            current = vec![cut];
        }

        push_distinct(&mut current, segment.end);
    }

    if current.len() >= 2 {
        pieces.push(LineString::new(current));
    }

    pieces
}

/// Parameter of the projection of `point` onto the segment, 0 at the start and 1 at the end.
fn position_on(segment: Line<f64>, point: Coord<f64>) -> f64 {
    let delta = segment.delta();
    let length_sq = delta.x * delta.x + delta.y * delta.y;
    if length_sq == 0.0 {
        return 0.0;
    }

    let offset = point - segment.start;
    (offset.x * delta.x + offset.y * delta.y) / length_sq
}

fn push_distinct(coords: &mut Vec<Coord<f64>>, coord: Coord<f64>) {
    if coords.last() != Some(&coord) {
        coords.push(coord);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    #[test]
    fn line_crossing_twice_is_split_into_three() {
        let line = line_string![(x: 0.0, y: 0.5), (x: 3.0, y: 0.5)];
        let cutter = MultiLineString::new(vec![
            line_string![(x: 1.0, y: 0.0), (x: 1.0, y: 1.0)],
            line_string![(x: 2.0, y: 0.0), (x: 2.0, y: 1.0)],
        ]);

        let pieces = split_line(&line, &cutter);
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[0], line_string![(x: 0.0, y: 0.5), (x: 1.0, y: 0.5)]);
        assert_eq!(pieces[1], line_string![(x: 1.0, y: 0.5), (x: 2.0, y: 0.5)]);
        assert_eq!(pieces[2], line_string![(x: 2.0, y: 0.5), (x: 3.0, y: 0.5)]);
    }

    #[test]
    fn line_without_crossings_is_unchanged() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0), (x: 2.0, y: 0.0)];
        let cutter = MultiLineString::new(vec![line_string![(x: 5.0, y: 0.0), (x: 5.0, y: 1.0)]]);

        assert_eq!(split_line(&line, &cutter), vec![line]);
    }

    #[test]
    fn touching_at_endpoint_does_not_create_empty_piece() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)];
        let cutter = MultiLineString::new(vec![line_string![(x: 0.0, y: -1.0), (x: 0.0, y: 1.0)]]);

        assert_eq!(split_line(&line, &cutter), vec![line]);
    }
}
