// THEORY:
// The `color` module answers two different questions about a contour's
// interior and keeps them strictly separate:
//
// 1.  **Which named color is this?** A winner-take-all vote in HSV space.
//     Every interior pixel is tested against each palette entry's hue,
//     saturation and value ranges; the entry with the most matching pixels
//     wins, provided its count clears an absolute floor. Below the floor the
//     answer is Unknown. Ranges are inclusive at both ends, and an entry may
//     own several disjoint ranges because red straddles the hue wrap at 0.
// 2.  **What does the surface actually look like?** A representative hex
//     color aggregated channel-wise from the raw RGB pixels, either by mean
//     or by median. The median is the default because it shrugs off specular
//     highlights and anti-aliased edge pixels that drag a mean off-color.
//
// Hue is kept on the halved 0..=179 scale with 8-bit saturation and value, so
// palette bounds stay small integers. The palette is an ordered list; when
// two entries tie on pixel count the earlier entry wins, which makes the
// ordering part of the configuration rather than an accident.

use std::fmt;

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

use crate::core_modules::contour::ContourCandidate;

/// Per-frame scratch buffer holding (hue, saturation, value) triples in the
/// three channels of an 8-bit pixel. Hue occupies 0..=179.
pub type HsvFrame = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// Named colors the palette can award.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorLabel {
    Red,
    Green,
    Blue,
    Yellow,
    Orange,
    Purple,
    Cyan,
    Pink,
    White,
    Black,
    Unknown,
}

impl ColorLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorLabel::Red => "Red",
            ColorLabel::Green => "Green",
            ColorLabel::Blue => "Blue",
            ColorLabel::Yellow => "Yellow",
            ColorLabel::Orange => "Orange",
            ColorLabel::Purple => "Purple",
            ColorLabel::Cyan => "Cyan",
            ColorLabel::Pink => "Pink",
            ColorLabel::White => "White",
            ColorLabel::Black => "Black",
            ColorLabel::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ColorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One inclusive box in HSV space.
#[derive(Debug, Clone, Copy)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| hsv[c] >= self.lower[c] && hsv[c] <= self.upper[c])
    }
}

/// Ordered mapping from color name to its HSV range(s). Iteration order is
/// the tie-break order of the vote.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    entries: Vec<(ColorLabel, Vec<HsvRange>)>,
}

impl ColorPalette {
    /// The seven-color baseline with relaxed saturation and value floors.
    pub fn minimal() -> Self {
        Self {
            entries: vec![
                (
                    ColorLabel::Red,
                    vec![
                        HsvRange::new([0, 50, 50], [10, 255, 255]),
                        HsvRange::new([170, 50, 50], [180, 255, 255]),
                    ],
                ),
                (ColorLabel::Green, vec![HsvRange::new([40, 50, 50], [80, 255, 255])]),
                (ColorLabel::Blue, vec![HsvRange::new([100, 50, 50], [130, 255, 255])]),
                (ColorLabel::Yellow, vec![HsvRange::new([20, 50, 50], [40, 255, 255])]),
                (ColorLabel::Orange, vec![HsvRange::new([10, 50, 50], [25, 255, 255])]),
                (ColorLabel::Purple, vec![HsvRange::new([130, 50, 50], [170, 255, 255])]),
                (ColorLabel::Cyan, vec![HsvRange::new([80, 50, 50], [100, 255, 255])]),
            ],
        }
    }

    /// The full ten-color palette with tighter chromatic floors plus the
    /// achromatic white and black bands.
    pub fn extended() -> Self {
        Self {
            entries: vec![
                (
                    ColorLabel::Red,
                    vec![
                        HsvRange::new([0, 100, 100], [10, 255, 255]),
                        HsvRange::new([170, 100, 100], [180, 255, 255]),
                    ],
                ),
                (ColorLabel::Green, vec![HsvRange::new([40, 100, 100], [80, 255, 255])]),
                (ColorLabel::Blue, vec![HsvRange::new([100, 100, 100], [130, 255, 255])]),
                (ColorLabel::Yellow, vec![HsvRange::new([20, 100, 100], [40, 255, 255])]),
                (ColorLabel::Orange, vec![HsvRange::new([10, 100, 100], [25, 255, 255])]),
                (ColorLabel::Purple, vec![HsvRange::new([130, 100, 100], [170, 255, 255])]),
                (ColorLabel::Cyan, vec![HsvRange::new([80, 100, 100], [100, 255, 255])]),
                (ColorLabel::Pink, vec![HsvRange::new([140, 50, 50], [170, 255, 255])]),
                (ColorLabel::White, vec![HsvRange::new([0, 0, 200], [180, 30, 255])]),
                (ColorLabel::Black, vec![HsvRange::new([0, 0, 0], [180, 255, 50])]),
            ],
        }
    }

    pub fn entries(&self) -> &[(ColorLabel, Vec<HsvRange>)] {
        &self.entries
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::extended()
    }
}

/// How the representative hex color is aggregated from interior pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HexAggregation {
    Mean,
    Median,
}

/// Palette vote plus hex aggregation for one contour at a time.
#[derive(Debug, Clone)]
pub struct ColorClassifier {
    palette: ColorPalette,
    vote_floor: u32,
    aggregation: HexAggregation,
}

impl ColorClassifier {
    pub fn new(palette: ColorPalette, vote_floor: u32, aggregation: HexAggregation) -> Self {
        Self { palette, vote_floor, aggregation }
    }

    /// Converts a full RGB frame into the HSV scratch buffer consumed by
    /// `classify`. Computed once per cycle by the orchestrator.
    pub fn to_hsv(frame: &RgbImage) -> HsvFrame {
        HsvFrame::from_fn(frame.width(), frame.height(), |x, y| {
            let Rgb([r, g, b]) = *frame.get_pixel(x, y);
            let (h, s, v) = rgb_to_hsv(r, g, b);
            Rgb([h, s, v])
        })
    }

    /// Winner-take-all palette vote over the contour's interior.
    pub fn classify(&self, hsv: &HsvFrame, candidate: &ContourCandidate) -> ColorLabel {
        let Some(mask) = interior_mask(candidate) else {
            return ColorLabel::Unknown;
        };
        let origin_x = candidate.bounding_box.x;
        let origin_y = candidate.bounding_box.y;

        let mut counts = vec![0u32; self.palette.entries().len()];
        for (x, y, pixel) in mask.enumerate_pixels() {
            if pixel[0] == 0 {
                continue;
            }
            let frame_x = (origin_x + x as i32) as u32;
            let frame_y = (origin_y + y as i32) as u32;
            if frame_x >= hsv.width() || frame_y >= hsv.height() {
                continue;
            }
            let Rgb(hsv_pixel) = *hsv.get_pixel(frame_x, frame_y);
            for (index, (_, ranges)) in self.palette.entries().iter().enumerate() {
                if ranges.iter().any(|range| range.contains(hsv_pixel)) {
                    counts[index] += 1;
                }
            }
        }

        let mut best = ColorLabel::Unknown;
        let mut best_count = 0u32;
        for (index, (label, _)) in self.palette.entries().iter().enumerate() {
            if counts[index] > best_count && counts[index] >= self.vote_floor {
                best = *label;
                best_count = counts[index];
            }
        }
        best
    }

    /// Channel-wise aggregate of the contour's interior pixels, formatted
    /// `#rrggbb`. An empty interior yields `#000000`.
    pub fn representative_hex(&self, frame: &RgbImage, candidate: &ContourCandidate) -> String {
        let Some(mask) = interior_mask(candidate) else {
            return String::from("#000000");
        };
        let origin_x = candidate.bounding_box.x;
        let origin_y = candidate.bounding_box.y;

        let mut channels: [Vec<u8>; 3] = [Vec::new(), Vec::new(), Vec::new()];
        for (x, y, pixel) in mask.enumerate_pixels() {
            if pixel[0] == 0 {
                continue;
            }
            let frame_x = (origin_x + x as i32) as u32;
            let frame_y = (origin_y + y as i32) as u32;
            if frame_x >= frame.width() || frame_y >= frame.height() {
                continue;
            }
            let Rgb([r, g, b]) = *frame.get_pixel(frame_x, frame_y);
            channels[0].push(r);
            channels[1].push(g);
            channels[2].push(b);
        }
        if channels[0].is_empty() {
            return String::from("#000000");
        }

        let aggregate = |values: &mut Vec<u8>| -> u8 {
            match self.aggregation {
                HexAggregation::Mean => {
                    let sum: u64 = values.iter().map(|&v| v as u64).sum();
                    (sum as f64 / values.len() as f64) as u8
                }
                HexAggregation::Median => {
                    values.sort_unstable();
                    let mid = values.len() / 2;
                    if values.len() % 2 == 1 {
                        values[mid]
                    } else {
                        ((values[mid - 1] as f64 + values[mid] as f64) / 2.0) as u8
                    }
                }
            }
        };

        let [mut rs, mut gs, mut bs] = channels;
        format!(
            "#{:02x}{:02x}{:02x}",
            aggregate(&mut rs),
            aggregate(&mut gs),
            aggregate(&mut bs)
        )
    }
}

/// Fills the contour polygon into a mask scoped to its bounding box. Returns
/// `None` for degenerate contours with no interior.
fn interior_mask(candidate: &ContourCandidate) -> Option<GrayImage> {
    if candidate.points.len() < 3 {
        return None;
    }
    let bounding_box = candidate.bounding_box;
    if bounding_box.width <= 0 || bounding_box.height <= 0 {
        return None;
    }

    let mut shifted: Vec<Point<i32>> = candidate
        .points
        .iter()
        .map(|p| Point::new(p.x - bounding_box.x, p.y - bounding_box.y))
        .collect();
    if shifted.first() == shifted.last() {
        shifted.pop();
    }
    if shifted.len() < 3 {
        return None;
    }

    let mut mask = GrayImage::new(bounding_box.width as u32, bounding_box.height as u32);
    draw_polygon_mut(&mut mask, &shifted, Luma([255u8]));
    Some(mask)
}

/// RGB to HSV with hue halved onto 0..=179 and 8-bit saturation and value.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let rf = r as f64 / 255.0;
    let gf = g as f64 / 255.0;
    let bf = b as f64 / 255.0;

    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let hue_degrees = if delta < 1e-9 {
        0.0
    } else if (max - rf).abs() < 1e-9 {
        60.0 * (((gf - bf) / delta).rem_euclid(6.0))
    } else if (max - gf).abs() < 1e-9 {
        60.0 * ((bf - rf) / delta + 2.0)
    } else {
        60.0 * ((rf - gf) / delta + 4.0)
    };

    let hue = ((hue_degrees / 2.0).round() as u16 % 180) as u8;
    let saturation = if max < 1e-9 { 0 } else { (delta / max * 255.0).round() as u8 };
    let value = (max * 255.0).round() as u8;
    (hue, saturation, value)
}
