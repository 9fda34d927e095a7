// THEORY:
// The `foreground` module turns a grayscale view of the frame into a binary
// mask separating objects from background. Two strategies are available
// behind one enum:
//
// -   `Global` blurs the image and cuts it at a single fixed threshold. It is
//     cheap and predictable but sensitive to uneven lighting.
// -   `Adaptive` thresholds each pixel against its local neighborhood mean,
//     then applies a morphological close (merge fragments that sit close
//     together) followed by an open (remove speckle). It is the default.
//
// Both strategies are pure functions of the input image: extracting twice
// from the same frame yields byte-identical masks. An all-background frame
// producing an empty mask is a valid outcome.
//
// The module also produces the diagnostic edge maps shown alongside the main
// view: a Canny map, a Sobel gradient-magnitude map normalized to 8 bits,
// and their per-pixel combination.

use image::{GrayImage, Luma};
use imageproc::contrast::{adaptive_threshold, threshold, ThresholdType};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use imageproc::morphology::{close, open};

const GLOBAL_BLUR_SIGMA: f32 = 1.4;
const EDGE_BLUR_SIGMA: f32 = 1.1;
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;
const MORPH_RADIUS: u8 = 1;

/// How the binary foreground mask is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdStrategy {
    /// Blur, then cut at one fixed grayscale level.
    Global { threshold: u8 },
    /// Compare each pixel to the mean of its local block, then close and
    /// open with a 3x3 element.
    Adaptive { block_radius: u32 },
}

/// Diagnostic edge views derived from the same grayscale frame as the mask.
#[derive(Debug, Clone)]
pub struct EdgeMaps {
    pub canny: GrayImage,
    pub sobel: GrayImage,
    pub combined: GrayImage,
}

/// Stateless mask producer configured with one strategy.
#[derive(Debug, Clone)]
pub struct ForegroundExtractor {
    strategy: ThresholdStrategy,
}

impl ForegroundExtractor {
    pub fn new(strategy: ThresholdStrategy) -> Self {
        Self { strategy }
    }

    /// Binary mask with foreground at 255 and background at 0.
    pub fn extract(&self, gray: &GrayImage) -> GrayImage {
        match self.strategy {
            ThresholdStrategy::Global { threshold: cutoff } => {
                let blurred = gaussian_blur_f32(gray, GLOBAL_BLUR_SIGMA);
                threshold(&blurred, cutoff, ThresholdType::Binary)
            }
            ThresholdStrategy::Adaptive { block_radius } => {
                let thresholded = adaptive_threshold(gray, block_radius);
                let closed = close(&thresholded, Norm::LInf, MORPH_RADIUS);
                open(&closed, Norm::LInf, MORPH_RADIUS)
            }
        }
    }

    pub fn edge_maps(&self, gray: &GrayImage) -> EdgeMaps {
        let blurred = gaussian_blur_f32(gray, EDGE_BLUR_SIGMA);
        let canny_map = canny(&blurred, CANNY_LOW, CANNY_HIGH);
        let sobel_map = sobel_magnitude(gray);
        let combined = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            Luma([canny_map.get_pixel(x, y)[0].max(sobel_map.get_pixel(x, y)[0])])
        });
        EdgeMaps { canny: canny_map, sobel: sobel_map, combined }
    }
}

/// Sobel gradient magnitude rescaled so the strongest edge maps to 255.
fn sobel_magnitude(gray: &GrayImage) -> GrayImage {
    let gx = horizontal_sobel(gray);
    let gy = vertical_sobel(gray);

    let mut magnitudes = vec![0f64; (gray.width() * gray.height()) as usize];
    let mut max_magnitude = 0f64;
    for (index, (px, py)) in gx.pixels().zip(gy.pixels()).enumerate() {
        let dx = px[0] as f64;
        let dy = py[0] as f64;
        let magnitude = (dx * dx + dy * dy).sqrt();
        magnitudes[index] = magnitude;
        max_magnitude = max_magnitude.max(magnitude);
    }

    if max_magnitude <= 0.0 {
        return GrayImage::new(gray.width(), gray.height());
    }
    let width = gray.width();
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let magnitude = magnitudes[(y * width + x) as usize];
        Luma([(magnitude / max_magnitude * 255.0) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn frame_with_bright_square() -> GrayImage {
        let mut gray = GrayImage::new(120, 120);
        draw_filled_rect_mut(&mut gray, Rect::at(30, 30).of_size(50, 50), Luma([200u8]));
        gray
    }

    fn gradient_frame() -> GrayImage {
        GrayImage::from_fn(96, 96, |x, y| Luma([((x * 2 + y) % 256) as u8]))
    }

    #[test]
    fn extraction_is_idempotent() {
        let gray = gradient_frame();
        for strategy in [
            ThresholdStrategy::Global { threshold: 60 },
            ThresholdStrategy::Adaptive { block_radius: 5 },
        ] {
            let extractor = ForegroundExtractor::new(strategy);
            assert_eq!(extractor.extract(&gray), extractor.extract(&gray));
        }
    }

    #[test]
    fn dark_frame_yields_empty_global_mask() {
        let gray = GrayImage::from_pixel(80, 80, Luma([20u8]));
        let extractor = ForegroundExtractor::new(ThresholdStrategy::Global { threshold: 60 });
        let mask = extractor.extract(&gray);
        assert!(mask.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn bright_square_survives_both_strategies() {
        let gray = frame_with_bright_square();
        for strategy in [
            ThresholdStrategy::Global { threshold: 60 },
            ThresholdStrategy::Adaptive { block_radius: 5 },
        ] {
            let extractor = ForegroundExtractor::new(strategy);
            let mask = extractor.extract(&gray);
            assert!(mask.pixels().any(|p| p[0] != 0), "{strategy:?} produced no foreground");
        }
        // The global mask keeps the square's interior solid.
        let global = ForegroundExtractor::new(ThresholdStrategy::Global { threshold: 60 });
        let mask = global.extract(&gray);
        assert_eq!(mask.get_pixel(55, 55)[0], 255);
        assert_eq!(mask.get_pixel(5, 5)[0], 0);
    }

    #[test]
    fn edge_maps_are_empty_for_a_flat_frame() {
        let gray = GrayImage::from_pixel(64, 64, Luma([128u8]));
        let extractor = ForegroundExtractor::new(ThresholdStrategy::Adaptive { block_radius: 5 });
        let edges = extractor.edge_maps(&gray);
        assert!(edges.canny.pixels().all(|p| p[0] == 0));
        assert!(edges.sobel.pixels().all(|p| p[0] == 0));
        assert!(edges.combined.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn edge_maps_light_up_around_the_square() {
        let gray = frame_with_bright_square();
        let extractor = ForegroundExtractor::new(ThresholdStrategy::Adaptive { block_radius: 5 });
        let edges = extractor.edge_maps(&gray);
        assert!(edges.canny.pixels().any(|p| p[0] != 0));
        assert!(edges.sobel.pixels().any(|p| p[0] != 0));
        assert!(edges.combined.pixels().any(|p| p[0] != 0));
    }
}
