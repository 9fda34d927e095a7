// THEORY:
// The `contour` module is the bridge between the raw binary mask and the
// classification layers. It walks the mask's connected foreground regions,
// keeps only their outer boundaries, and packages each surviving boundary as
// a `ContourCandidate` with its geometry precomputed. Everything downstream
// (shape rules, color voting, tracking) works from these candidates rather
// than from pixels.
//
// Two filters are applied here and nowhere else:
// 1.  Hole and nested boundaries are discarded. The system targets solid,
//     non-occluded objects, so only outer borders are meaningful.
// 2.  Boundaries whose enclosed area falls outside [min_area, max_area] are
//     discarded. The lower bound removes speckle noise, the upper bound
//     removes whole-frame artifacts such as an all-foreground mask.
//
// An empty candidate list is a normal result, not an error.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::arc_length;
use imageproc::point::Point;

use crate::core_modules::detection::BoundingBox;

/// Ordered closed boundary of one foreground region. Cycle-scoped; never
/// persisted across frames.
pub type Contour = Vec<Point<i32>>;

/// An outer boundary that passed the area gate, with its geometry attached.
#[derive(Debug, Clone)]
pub struct ContourCandidate {
    pub points: Contour,
    pub area: f64,
    pub perimeter: f64,
    pub bounding_box: BoundingBox,
    pub centroid: (i32, i32),
}

/// Enclosed polygon area by the shoelace formula.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut doubled = 0i64;
    for (index, point) in points.iter().enumerate() {
        let next = &points[(index + 1) % points.len()];
        doubled += point.x as i64 * next.y as i64 - next.x as i64 * point.y as i64;
    }
    (doubled.abs() as f64) / 2.0
}

/// Smallest axis-aligned box containing every point, pixel-inclusive.
pub fn bounding_box_of(points: &[Point<i32>]) -> BoundingBox {
    let mut min_x = i32::MAX;
    let mut min_y = i32::MAX;
    let mut max_x = i32::MIN;
    let mut max_y = i32::MIN;
    for point in points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }
    BoundingBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    }
}

/// Finds the outer boundaries of the mask's foreground regions and keeps
/// those whose enclosed area lies within `[min_area, max_area]`.
pub fn find_candidates(mask: &GrayImage, min_area: f64, max_area: f64) -> Vec<ContourCandidate> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|contour| matches!(contour.border_type, BorderType::Outer))
        .filter_map(|contour| {
            let points = contour.points;
            if points.is_empty() {
                return None;
            }
            let area = polygon_area(&points);
            if area < min_area || area > max_area {
                return None;
            }
            let perimeter = arc_length(&points, true);
            let bounding_box = bounding_box_of(&points);
            let centroid = bounding_box.center();
            Some(ContourCandidate {
                points,
                area,
                perimeter,
                bounding_box,
                centroid,
            })
        })
        .collect()
}
