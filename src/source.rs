// THEORY:
// The `source` module is the boundary to whatever supplies frames. The
// pipeline never talks to hardware; it consumes the small `FrameSource`
// contract below, which mirrors a camera handle: you can ask whether the
// source is open, and you can pull the next frame. A `None` from
// `read_frame` means end-of-stream and ends the run.
//
// Two concrete sources ship with the crate: a directory of still images
// replayed in sorted order (recorded footage, test fixtures) and a
// procedural scene generator used by the demo runner and the integration
// tests when no footage is available.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_polygon_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;
use tracing::warn;
use walkdir::WalkDir;

/// Pull-based frame supplier. `read_frame` returning `None` is the normal
/// end-of-stream signal.
pub trait FrameSource {
    fn is_open(&self) -> bool;
    fn read_frame(&mut self) -> Option<RgbImage>;
}

/// Replays the image files of one directory in sorted filename order.
pub struct ImageDirSource {
    frames: Vec<PathBuf>,
    cursor: usize,
}

impl ImageDirSource {
    pub fn open(dir: &Path) -> Result<Self> {
        let mut frames: Vec<PathBuf> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.into_path())
            .filter(|path| {
                matches!(
                    path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref(),
                    Some("png" | "jpg" | "jpeg" | "bmp")
                )
            })
            .collect();
        frames.sort();
        ensure!(!frames.is_empty(), "no frame images found in {}", dir.display());
        Ok(Self { frames, cursor: 0 })
    }
}

impl FrameSource for ImageDirSource {
    fn is_open(&self) -> bool {
        self.cursor < self.frames.len()
    }

    fn read_frame(&mut self) -> Option<RgbImage> {
        let path = self.frames.get(self.cursor)?.clone();
        self.cursor += 1;
        match image::open(&path).with_context(|| format!("decoding {}", path.display())) {
            Ok(decoded) => Some(decoded.to_rgb8()),
            Err(error) => {
                // Treated like a camera reporting no frame: the stream ends.
                warn!(%error, "frame decode failed, ending stream");
                None
            }
        }
    }
}

/// Procedural scene: three bright shapes drifting across a dark background.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    total: u32,
    cursor: u32,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32, total: u32) -> Self {
        Self { width, height, total, cursor: 0 }
    }
}

impl FrameSource for SyntheticSource {
    fn is_open(&self) -> bool {
        self.total > 0 && self.cursor < self.total
    }

    fn read_frame(&mut self) -> Option<RgbImage> {
        if self.cursor >= self.total {
            return None;
        }
        let frame = render_scene(self.width, self.height, self.cursor as i32);
        self.cursor += 1;
        Some(frame)
    }
}

/// Draws the synthetic scene for one step. Shapes drift two pixels per step,
/// wrapping back to their start once per span; every step except the wrap
/// keeps them within a small tracking distance of the previous frame.
pub fn render_scene(width: u32, height: u32, step: i32) -> RgbImage {
    let mut frame = RgbImage::from_pixel(width, height, Rgb([0, 0, 0]));
    let span = (width as i32 / 3).max(80);
    let drift = (step * 2) % span;

    // Red square.
    draw_filled_rect_mut(
        &mut frame,
        Rect::at(20 + drift, height as i32 / 6).of_size(60, 60),
        Rgb([255, 70, 70]),
    );

    // Blue rectangle.
    draw_filled_rect_mut(
        &mut frame,
        Rect::at(20 + drift, height as i32 / 2).of_size(90, 45),
        Rgb([80, 80, 255]),
    );

    // Yellow triangle.
    let base_x = width as i32 / 2 + drift;
    let base_y = height as i32 * 3 / 4;
    draw_polygon_mut(
        &mut frame,
        &[
            Point::new(base_x, base_y),
            Point::new(base_x + 80, base_y),
            Point::new(base_x + 40, base_y - 60),
        ],
        Rgb([255, 255, 0]),
    );

    // Green circle.
    draw_filled_circle_mut(
        &mut frame,
        (width as i32 / 5 * 4 - drift, height as i32 / 4),
        28,
        Rgb([60, 220, 60]),
    );

    frame
}
