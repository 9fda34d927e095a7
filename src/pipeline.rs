// THEORY:
// The `pipeline` module is the top-level API of the analysis engine. It owns
// one instance of every stage and runs them in a fixed order for each
// incoming frame:
//
//     frame -> grayscale -> foreground mask -> contour candidates
//           -> (shape, color, hex) per candidate -> tracked identities
//           -> aggregated counts
//
// The pipeline is synchronous and pull-based. A frame is processed to
// completion before the next one is accepted, and the only state that
// survives a cycle is the tracker's identity registry. Every derived buffer
// (grayscale, HSV, mask, contours) is scratch data owned by the cycle that
// produced it; the `FrameAnalysis` returned to the caller hands those
// diagnostics over by value.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use image::{imageops, GrayImage, RgbImage};
use tracing::debug;

use crate::core_modules::color::{ColorClassifier, ColorPalette, HexAggregation};
use crate::core_modules::contour::{find_candidates, Contour};
use crate::core_modules::detection::Detection;
use crate::core_modules::foreground::{EdgeMaps, ForegroundExtractor, ThresholdStrategy};
use crate::core_modules::shape::ShapeClassifier;
use crate::core_modules::tracker::{IdentityTracker, TrackedObject};

// Re-export the types a consumer needs to configure and read the pipeline.
pub use crate::core_modules::color::ColorLabel;
pub use crate::core_modules::detection::BoundingBox;
pub use crate::core_modules::shape::ShapeLabel;

/// Construction-time configuration for the whole pipeline. Nothing here is
/// reloaded mid-run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Contours with a smaller enclosed area are treated as noise.
    pub min_area: f64,
    /// Contours with a larger enclosed area are treated as frame artifacts.
    pub max_area: f64,
    /// Maximum centroid distance, in pixels, for a cross-frame identity match.
    pub distance_gate: f64,
    /// Polygon simplification tolerance as a fraction of contour perimeter.
    pub epsilon_fraction: f64,
    /// Minimum interior pixel count for a palette color to win the vote.
    pub vote_floor: u32,
    pub threshold: ThresholdStrategy,
    pub hex_aggregation: HexAggregation,
    pub palette: ColorPalette,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_area: 300.0,
            max_area: 50_000.0,
            distance_gate: 50.0,
            epsilon_fraction: 0.02,
            vote_floor: 100,
            threshold: ThresholdStrategy::Adaptive { block_radius: 5 },
            hex_aggregation: HexAggregation::Median,
            palette: ColorPalette::extended(),
        }
    }
}

/// Everything the pipeline can say about one frame.
#[derive(Debug)]
pub struct FrameAnalysis {
    /// This cycle's detections bound to persistent identities, in the order
    /// the contours were found.
    pub objects: Vec<TrackedObject>,
    /// Occurrence count per "{color} {shape}" label.
    pub counts: BTreeMap<String, usize>,
    /// The accepted contours, index-aligned with `objects`. Cycle-scoped
    /// diagnostic data for annotation.
    pub contours: Vec<Contour>,
    pub mask: GrayImage,
    pub edges: EdgeMaps,
}

/// The engine itself. One instance per stream; holds the only cross-frame
/// state (the identity registry).
pub struct FramePipeline {
    extractor: ForegroundExtractor,
    shapes: ShapeClassifier,
    colors: ColorClassifier,
    tracker: IdentityTracker,
    min_area: f64,
    max_area: f64,
}

impl FramePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            extractor: ForegroundExtractor::new(config.threshold),
            shapes: ShapeClassifier::new(config.epsilon_fraction),
            colors: ColorClassifier::new(
                config.palette,
                config.vote_floor,
                config.hex_aggregation,
            ),
            tracker: IdentityTracker::new(config.distance_gate),
            min_area: config.min_area,
            max_area: config.max_area,
        }
    }

    /// Runs the full analysis cycle on one frame.
    pub fn process_frame(&mut self, frame: &RgbImage) -> FrameAnalysis {
        let gray = imageops::grayscale(frame);
        let mask = self.extractor.extract(&gray);
        let edges = self.extractor.edge_maps(&gray);
        let hsv = ColorClassifier::to_hsv(frame);

        let candidates = find_candidates(&mask, self.min_area, self.max_area);
        debug!(candidates = candidates.len(), "contour candidates accepted");

        let mut detections = Vec::with_capacity(candidates.len());
        let mut contours = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let shape = self.shapes.classify(&candidate);
            let color = self.colors.classify(&hsv, &candidate);
            let hex = self.colors.representative_hex(frame, &candidate);
            let circularity = if candidate.perimeter > 0.0 {
                4.0 * PI * candidate.area / (candidate.perimeter * candidate.perimeter)
            } else {
                0.0
            };
            detections.push(Detection {
                shape,
                color,
                hex,
                area: candidate.area,
                perimeter: candidate.perimeter,
                circularity,
                centroid: candidate.centroid,
                bounding_box: candidate.bounding_box,
            });
            contours.push(candidate.points);
        }

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for detection in &detections {
            *counts
                .entry(format!("{} {}", detection.color, detection.shape))
                .or_insert(0) += 1;
        }

        let objects = self.tracker.update(detections);
        debug!(objects = objects.len(), live = self.tracker.live_count(), "cycle complete");

        FrameAnalysis { objects, counts, contours, mask, edges }
    }
}
