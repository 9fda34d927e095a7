// Presentation helpers: overlay the analysis results on a copy of the frame
// and lift grayscale diagnostics into RGB for saving. Pure drawing, no
// decisions.

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::pipeline::FrameAnalysis;

const CONTOUR_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BOX_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const CENTROID_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const CENTROID_DOT: Rgb<u8> = Rgb([255, 255, 255]);

/// Returns a copy of `frame` with each tracked object's contour outline,
/// bounding box and centroid marker drawn in.
pub fn annotate(frame: &RgbImage, analysis: &FrameAnalysis) -> RgbImage {
    let mut canvas = frame.clone();
    for (contour, object) in analysis.contours.iter().zip(&analysis.objects) {
        for (index, point) in contour.iter().enumerate() {
            let next = &contour[(index + 1) % contour.len()];
            draw_line_segment_mut(
                &mut canvas,
                (point.x as f32, point.y as f32),
                (next.x as f32, next.y as f32),
                CONTOUR_COLOR,
            );
        }

        let bb = object.detection.bounding_box;
        if bb.width > 0 && bb.height > 0 {
            draw_hollow_rect_mut(
                &mut canvas,
                Rect::at(bb.x, bb.y).of_size(bb.width as u32, bb.height as u32),
                BOX_COLOR,
            );
        }

        let (cx, cy) = object.detection.centroid;
        draw_filled_circle_mut(&mut canvas, (cx, cy), 5, CENTROID_COLOR);
        draw_filled_circle_mut(&mut canvas, (cx, cy), 2, CENTROID_DOT);
    }
    canvas
}

/// Expands a single-channel diagnostic map into RGB so it can be written
/// next to annotated frames.
pub fn edges_to_rgb(edges: &GrayImage) -> RgbImage {
    RgbImage::from_fn(edges.width(), edges.height(), |x, y| {
        let value = edges.get_pixel(x, y)[0];
        Rgb([value, value, value])
    })
}
