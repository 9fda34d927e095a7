// THEORY:
// The `shape` module maps a contour's geometry to exactly one label from a
// closed set. The classifier is a deterministic decision tree over four
// rotation-invariant measurements:
//
// 1.  **Vertex count** of the boundary after Douglas-Peucker simplification
//     with a tolerance proportional to the perimeter. Low vertex counts map
//     directly to polygon orders (3 = triangle, 4 = quadrilateral, ...).
// 2.  **Aspect ratio** of the bounding box, which splits quadrilaterals into
//     squares and rectangles.
// 3.  **Circularity** (4*pi*area / perimeter^2), which separates round
//     residuals (circles, ovals) from everything else once the vertex count
//     stops being informative.
// 4.  **Solidity** (area / convex-hull area), which separates near-convex
//     many-vertex outlines from genuinely concave ones.
//
// Circularity and solidity are always computed from the raw contour, not the
// simplified polygon; simplification exists only to count vertices. A contour
// with zero perimeter is degenerate and labelled Unknown without entering the
// tree.

use std::f64::consts::PI;
use std::fmt;

use imageproc::geometry::{approximate_polygon_dp, convex_hull};
use imageproc::point::Point;

use crate::core_modules::contour::{polygon_area, ContourCandidate};

/// The closed set of recognizable shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeLabel {
    Triangle,
    Square,
    Rectangle,
    Pentagon,
    Hexagon,
    Circle,
    Oval,
    Star,
    Complex,
    Irregular,
    Unknown,
}

impl ShapeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeLabel::Triangle => "Triangle",
            ShapeLabel::Square => "Square",
            ShapeLabel::Rectangle => "Rectangle",
            ShapeLabel::Pentagon => "Pentagon",
            ShapeLabel::Hexagon => "Hexagon",
            ShapeLabel::Circle => "Circle",
            ShapeLabel::Oval => "Oval",
            ShapeLabel::Star => "Star",
            ShapeLabel::Complex => "Complex",
            ShapeLabel::Irregular => "Irregular",
            ShapeLabel::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ShapeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic geometric shape classifier.
#[derive(Debug, Clone)]
pub struct ShapeClassifier {
    /// Simplification tolerance as a fraction of the contour perimeter.
    epsilon_fraction: f64,
}

impl ShapeClassifier {
    pub fn new(epsilon_fraction: f64) -> Self {
        debug_assert!(epsilon_fraction > 0.0);
        Self { epsilon_fraction }
    }

    pub fn classify(&self, candidate: &ContourCandidate) -> ShapeLabel {
        if candidate.perimeter <= 0.0 {
            return ShapeLabel::Unknown;
        }

        let epsilon = self.epsilon_fraction * candidate.perimeter;
        let simplified = approximate_polygon_dp(&candidate.points, epsilon, true);
        let vertices = collapse_close_vertices(simplified, epsilon).len();

        let circularity = 4.0 * PI * candidate.area / (candidate.perimeter * candidate.perimeter);
        let solidity = solidity_of(candidate);

        decide(vertices, candidate.bounding_box.aspect_ratio(), circularity, solidity)
    }
}

fn solidity_of(candidate: &ContourCandidate) -> f64 {
    if candidate.points.len() < 3 {
        return 0.0;
    }
    let hull = convex_hull(candidate.points.as_slice());
    let hull_area = polygon_area(&hull);
    if hull_area > 0.0 {
        candidate.area / hull_area
    } else {
        0.0
    }
}

/// Merges simplified vertices that sit closer together than the tolerance,
/// including a trailing vertex that wrapped around onto the first one. The
/// vertex count then no longer depends on where the border walk started.
fn collapse_close_vertices(points: Vec<Point<i32>>, min_distance: f64) -> Vec<Point<i32>> {
    if points.len() < 2 {
        return points;
    }
    let mut kept: Vec<Point<i32>> = Vec::with_capacity(points.len());
    for point in points {
        match kept.last() {
            Some(previous) if distance(previous, &point) < min_distance => {}
            _ => kept.push(point),
        }
    }
    while kept.len() > 1 && distance(kept.last().unwrap(), &kept[0]) < min_distance {
        kept.pop();
    }
    kept
}

fn distance(a: &Point<i32>, b: &Point<i32>) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    (dx * dx + dy * dy).sqrt()
}

/// The classification tree itself, separated from measurement so each branch
/// can be pinned down in isolation.
fn decide(vertices: usize, aspect_ratio: f64, circularity: f64, solidity: f64) -> ShapeLabel {
    match vertices {
        3 => ShapeLabel::Triangle,
        4 => {
            if (0.95..=1.05).contains(&aspect_ratio) {
                ShapeLabel::Square
            } else {
                ShapeLabel::Rectangle
            }
        }
        5 => ShapeLabel::Pentagon,
        6 => ShapeLabel::Hexagon,
        _ => {
            if circularity > 0.7 {
                ShapeLabel::Circle
            } else if circularity > 0.5 {
                ShapeLabel::Oval
            } else if vertices > 6 {
                if solidity > 0.9 {
                    ShapeLabel::Star
                } else {
                    ShapeLabel::Complex
                }
            } else {
                ShapeLabel::Irregular
            }
        }
    }
}
