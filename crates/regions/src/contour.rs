//! Polygon extraction from boolean rasters using marching squares.
//!
//! The raster is padded with a false border so every contour closes.
//! Segment endpoints on a 0/1 raster always sit on half-cell positions,
//! which lets segments be joined by exact keys instead of a distance
//! tolerance.

use std::collections::HashMap;

use geo::{Area, Contains, Coord, LineString, MultiPolygon, Polygon};
use ndarray::{Array2, ArrayView2};
use tracing::debug;

use crate::error::{check_shape, Result};

/// Contour level between the false (0) and true (1) cells.
const LEVEL: f64 = 0.5;

/// A point in index space: `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn key(&self) -> (i64, i64) {
        ((self.x * 2.0).round() as i64, (self.y * 2.0).round() as i64)
    }
}

/// A line segment between two points.
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// Marching squares over `data` at `level`. Cells touching NaN are skipped.
pub fn march_squares(data: ArrayView2<'_, f64>, level: f64) -> Vec<Segment> {
    let (height, width) = data.dim();
    if width < 2 || height < 2 {
        return vec![];
    }

    let mut segments = Vec::new();
    for y in 0..(height - 1) {
        for x in 0..(width - 1) {
            let tl = data[[y, x]];
            let tr = data[[y, x + 1]];
            let bl = data[[y + 1, x]];
            let br = data[[y + 1, x + 1]];
            if tl.is_nan() || tr.is_nan() || bl.is_nan() || br.is_nan() {
                continue;
            }

            let mut cell_index = 0u8;
            if tl >= level { cell_index |= 1; }
            if tr >= level { cell_index |= 2; }
            if br >= level { cell_index |= 4; }
            if bl >= level { cell_index |= 8; }

            segments.extend(cell_segments(cell_index, x as f64, y as f64, [tl, tr, br, bl], level));
        }
    }
    segments
}

/// Segments for one cell. Saddles (5 and 10) keep the two high corners apart.
fn cell_segments(cell_index: u8, x: f64, y: f64, corners: [f64; 4], level: f64) -> Vec<Segment> {
    let [tl, tr, br, bl] = corners;
    let top = interpolate_edge(x, y, x + 1.0, y, tl, tr, level);
    let right = interpolate_edge(x + 1.0, y, x + 1.0, y + 1.0, tr, br, level);
    let bottom = interpolate_edge(x, y + 1.0, x + 1.0, y + 1.0, bl, br, level);
    let left = interpolate_edge(x, y, x, y + 1.0, tl, bl, level);

    let seg = |start, end| Segment { start, end };
    match cell_index {
        0 | 15 => vec![],
        1 | 14 => vec![seg(left, top)],
        2 | 13 => vec![seg(top, right)],
        3 | 12 => vec![seg(left, right)],
        4 | 11 => vec![seg(right, bottom)],
        5 => vec![seg(left, top), seg(right, bottom)],
        6 | 9 => vec![seg(top, bottom)],
        7 | 8 => vec![seg(left, bottom)],
        10 => vec![seg(top, right), seg(left, bottom)],
        _ => vec![],
    }
}

fn interpolate_edge(x1: f64, y1: f64, x2: f64, y2: f64, val1: f64, val2: f64, level: f64) -> Point {
    if (val2 - val1).abs() < 1e-12 {
        return Point::new((x1 + x2) / 2.0, (y1 + y2) / 2.0);
    }
    let t = ((level - val1) / (val2 - val1)).clamp(0.0, 1.0);
    Point::new(x1 + t * (x2 - x1), y1 + t * (y2 - y1))
}

/// Join segments into closed rings. Endpoints are matched on half-cell keys,
/// so this is only exact for contours of 0/1 rasters.
pub fn connect_rings(segments: &[Segment]) -> Vec<Vec<Point>> {
    let mut by_endpoint: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (i, s) in segments.iter().enumerate() {
        by_endpoint.entry(s.start.key()).or_default().push(i);
        by_endpoint.entry(s.end.key()).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut rings = Vec::new();

    for start_idx in 0..segments.len() {
        if used[start_idx] {
            continue;
        }
        used[start_idx] = true;
        let first = segments[start_idx].start;
        let mut points = vec![first, segments[start_idx].end];

        while let Some(&current) = points.last() {
            if current.key() == first.key() {
                break;
            }
            let next = by_endpoint
                .get(&current.key())
                .and_then(|ids| ids.iter().copied().find(|&i| !used[i]));
            let Some(i) = next else {
                break;
            };
            used[i] = true;
            let s = &segments[i];
            points.push(if s.start.key() == current.key() { s.end } else { s.start });
        }

        if points.len() >= 4 && points[0].key() == points[points.len() - 1].key() {
            rings.push(points);
        }
    }

    rings
}

/// Coordinate at a fractional index: linear between neighbouring axis
/// values, extrapolated with the end step outside the axis.
fn axis_at(axis: &[f64], index: f64) -> f64 {
    let last = axis.len() - 1;
    if last == 0 {
        return axis[0];
    }
    let lo = (index.floor().max(0.0) as usize).min(last - 1);
    axis[lo] + (index - lo as f64) * (axis[lo + 1] - axis[lo])
}

/// Outline every true region of `mask` as a lon/lat polygon without holes.
///
/// Each closed contour at level 0.5 becomes one polygon, so the outline of
/// a hole is returned as a polygon of its own.
pub fn extract_polygons(mask: ArrayView2<'_, bool>, lon: &[f64], lat: &[f64]) -> Result<Vec<Polygon<f64>>> {
    Ok(trace_rings(mask, lon, lat)?
        .into_iter()
        .map(|ring| Polygon::new(ring, vec![]))
        .collect())
}

/// Outline of all true cells of `mask` as one multipolygon.
///
/// Cells joined only at a corner trace separate rings; all of them are
/// kept. A ring enclosed by an odd number of other rings is a hole of the
/// innermost ring around it.
pub fn region_outline(mask: ArrayView2<'_, bool>, lon: &[f64], lat: &[f64]) -> Result<MultiPolygon<f64>> {
    let rings: Vec<Polygon<f64>> = extract_polygons(mask, lon, lat)?;

    // Indices of the rings enclosing each ring. Rings of a 0/1 raster never
    // touch, so any vertex decides.
    let enclosing: Vec<Vec<usize>> = rings
        .iter()
        .enumerate()
        .map(|(i, ring)| match ring.exterior().0.first() {
            Some(vertex) => rings
                .iter()
                .enumerate()
                .filter(|&(j, other)| j != i && other.contains(vertex))
                .map(|(j, _)| j)
                .collect(),
            None => vec![],
        })
        .collect();

    let mut shells: Vec<(usize, Vec<LineString<f64>>)> = Vec::new();
    let mut shell_of: HashMap<usize, usize> = HashMap::new();
    for (i, around) in enclosing.iter().enumerate() {
        if around.len() % 2 == 0 {
            shell_of.insert(i, shells.len());
            shells.push((i, vec![]));
        }
    }
    for (i, around) in enclosing.iter().enumerate() {
        if around.len() % 2 == 1 {
            let innermost = around.iter().copied().max_by_key(|&j| enclosing[j].len());
            if let Some(&shell) = innermost.and_then(|j| shell_of.get(&j)) {
                shells[shell].1.push(rings[i].exterior().clone());
            }
        }
    }
    debug!(rings = rings.len(), polygons = shells.len(), "Built region outline");

    Ok(MultiPolygon::new(
        shells
            .into_iter()
            .map(|(i, holes)| Polygon::new(rings[i].exterior().clone(), holes))
            .collect(),
    ))
}

fn trace_rings(mask: ArrayView2<'_, bool>, lon: &[f64], lat: &[f64]) -> Result<Vec<LineString<f64>>> {
    check_shape("mask", mask.dim(), lon, lat)?;
    let (rows, cols) = mask.dim();
    if rows == 0 || cols == 0 {
        return Ok(vec![]);
    }

    let mut padded = Array2::<f64>::zeros((rows + 2, cols + 2));
    for ((r, c), &inside) in mask.indexed_iter() {
        if inside {
            padded[[r + 1, c + 1]] = 1.0;
        }
    }

    let segments = march_squares(padded.view(), LEVEL);
    let rings = connect_rings(&segments);
    debug!(segments = segments.len(), rings = rings.len(), "Traced contours");

    Ok(rings
        .into_iter()
        .map(|ring| {
            let coords: Vec<Coord<f64>> = ring
                .iter()
                .map(|p| Coord {
                    x: axis_at(lon, p.x - 1.0),
                    y: axis_at(lat, p.y - 1.0),
                })
                .collect();
            LineString::new(coords)
        })
        .collect())
}

/// The polygon with the greatest positive area (deg²), first one on ties.
pub fn largest_polygon(polygons: Vec<Polygon<f64>>) -> Option<Polygon<f64>> {
    polygons
        .into_iter()
        .map(|p| (p.unsigned_area(), p))
        .filter(|(area, _)| *area > 0.0)
        .fold(None, |best: Option<(f64, Polygon<f64>)>, (area, p)| match best {
            Some((best_area, _)) if best_area >= area => best,
            _ => Some((area, p)),
        })
        .map(|(_, p)| p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_single_cell_is_diamond() {
        let mask = array![[true]];
        let rings = connect_rings(&march_squares(
            array![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]].view(),
            LEVEL,
        ));
        assert_eq!(rings.len(), 1);
        // Four edge midpoints plus the closing point.
        assert_eq!(rings[0].len(), 5);

        let polygons = extract_polygons(mask.view(), &[0.0], &[0.0]).unwrap();
        assert_eq!(polygons.len(), 1);
    }

    #[test]
    fn test_block_area_in_index_space() {
        // A 3x3 block: the contour cuts the four corners, area 9 - 4 * 0.125.
        let mask = Array2::from_shape_fn((5, 5), |(r, c)| (1..4).contains(&r) && (1..4).contains(&c));
        let axis: Vec<f64> = (0..5).map(f64::from).collect();
        let polygons = extract_polygons(mask.view(), &axis, &axis).unwrap();
        assert_eq!(polygons.len(), 1);
        assert_relative_eq!(polygons[0].unsigned_area(), 8.5, epsilon = 1e-9);
    }

    #[test]
    fn test_separate_regions_and_largest() {
        let mask = array![
            [true, false, false, false, false],
            [false, false, false, true, true],
            [false, false, false, true, true],
        ];
        let lon = [10.0, 10.5, 11.0, 11.5, 12.0];
        let lat = [0.0, -0.5, -1.0];
        let polygons = extract_polygons(mask.view(), &lon, &lat).unwrap();
        assert_eq!(polygons.len(), 2);

        let largest = largest_polygon(polygons).unwrap();
        for c in largest.exterior().coords() {
            assert!(c.x >= 11.25 - 1e-9);
        }
    }

    #[test]
    fn test_edge_touching_region_closes() {
        let mask = Array2::from_elem((3, 4), true);
        let axis_lon = [0.0, 1.0, 2.0, 3.0];
        let axis_lat = [0.0, 1.0, 2.0];
        let polygons = extract_polygons(mask.view(), &axis_lon, &axis_lat).unwrap();
        assert_eq!(polygons.len(), 1);
        assert!(polygons[0].unsigned_area() > 0.0);
    }

    #[test]
    fn test_empty_mask_has_no_polygon() {
        let mask = Array2::from_elem((3, 3), false);
        let axis = [0.0, 1.0, 2.0];
        assert!(extract_polygons(mask.view(), &axis, &axis).unwrap().is_empty());
        assert!(largest_polygon(vec![]).is_none());
    }

    #[test]
    fn test_corner_joined_blocks_keep_both_rings() {
        // Two 3x3 blocks touching only at one corner.
        let mask = Array2::from_shape_fn((8, 8), |(r, c)| {
            ((1..4).contains(&r) && (1..4).contains(&c)) || ((4..7).contains(&r) && (4..7).contains(&c))
        });
        let axis: Vec<f64> = (0..8).map(f64::from).collect();

        let largest = largest_polygon(extract_polygons(mask.view(), &axis, &axis).unwrap()).unwrap();
        assert_relative_eq!(largest.unsigned_area(), 8.5, epsilon = 1e-9);

        let outline = region_outline(mask.view(), &axis, &axis).unwrap();
        assert_eq!(outline.0.len(), 2);
        assert_relative_eq!(outline.unsigned_area(), 17.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ring_of_cells_has_a_hole() {
        let mask = Array2::from_shape_fn((7, 7), |(r, c)| {
            (1..6).contains(&r) && (1..6).contains(&c) && !(r == 3 && c == 3)
        });
        let axis: Vec<f64> = (0..7).map(f64::from).collect();
        assert_eq!(extract_polygons(mask.view(), &axis, &axis).unwrap().len(), 2);

        let outline = region_outline(mask.view(), &axis, &axis).unwrap();
        assert_eq!(outline.0.len(), 1);
        assert_eq!(outline.0[0].interiors().len(), 1);
        // 5x5 block minus its cut corners, minus the diamond around the gap.
        assert_relative_eq!(outline.unsigned_area(), 25.0 - 0.5 - 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_axis_interpolation() {
        let axis = [40.0, 39.75, 39.5];
        assert_relative_eq!(axis_at(&axis, 0.5), 39.875);
        assert_relative_eq!(axis_at(&axis, -0.5), 40.125);
        assert_relative_eq!(axis_at(&axis, 2.5), 39.375);
        assert_relative_eq!(axis_at(&[7.0], 0.5), 7.0);
    }

    #[test]
    fn test_shape_is_checked() {
        let mask = Array2::from_elem((2, 2), true);
        assert!(extract_polygons(mask.view(), &[0.0], &[0.0, 1.0]).is_err());
    }
}
