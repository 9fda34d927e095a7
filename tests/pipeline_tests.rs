// End-to-end runs of the full pipeline over synthetic frames: drawn shapes
// in, classified and tracked objects out. The global threshold strategy is
// used so the mask is a plain function of brightness and the expectations
// below stay exact.

use std::collections::HashMap;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_polygon_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;

use prism_vision::{
    ColorLabel, FrameAnalysis, FramePipeline, FrameSource, PipelineConfig, ShapeLabel,
    SyntheticSource, ThresholdStrategy,
};

const RED: Rgb<u8> = Rgb([255, 70, 70]);
const BLUE: Rgb<u8> = Rgb([80, 80, 255]);
const YELLOW: Rgb<u8> = Rgb([255, 255, 0]);

fn test_config() -> PipelineConfig {
    PipelineConfig {
        threshold: ThresholdStrategy::Global { threshold: 60 },
        ..PipelineConfig::default()
    }
}

fn draw_square(frame: &mut RgbImage, dx: i32) {
    draw_filled_rect_mut(frame, Rect::at(40 + dx, 60).of_size(60, 60), RED);
}

fn draw_rectangle(frame: &mut RgbImage, dx: i32) {
    draw_filled_rect_mut(frame, Rect::at(190 + dx, 30).of_size(90, 45), BLUE);
}

fn draw_triangle(frame: &mut RgbImage, dx: i32) {
    draw_polygon_mut(
        frame,
        &[
            Point::new(60 + dx, 200),
            Point::new(140 + dx, 200),
            Point::new(100 + dx, 140),
        ],
        YELLOW,
    );
}

fn scene(dx: i32, with_square: bool) -> RgbImage {
    let mut frame = RgbImage::from_pixel(320, 240, Rgb([0, 0, 0]));
    if with_square {
        draw_square(&mut frame, dx);
    }
    draw_rectangle(&mut frame, dx);
    draw_triangle(&mut frame, dx);
    frame
}

fn ids_by_shape(analysis: &FrameAnalysis) -> HashMap<ShapeLabel, (u64, u32)> {
    analysis
        .objects
        .iter()
        .map(|object| (object.detection.shape, (object.id, object.age)))
        .collect()
}

#[test]
fn classifies_shapes_colors_and_hex_in_one_frame() {
    let mut pipeline = FramePipeline::new(test_config());
    let analysis = pipeline.process_frame(&scene(0, true));

    assert_eq!(analysis.objects.len(), 3);
    assert_eq!(analysis.counts.get("Red Square"), Some(&1));
    assert_eq!(analysis.counts.get("Blue Rectangle"), Some(&1));
    assert_eq!(analysis.counts.get("Yellow Triangle"), Some(&1));

    for object in &analysis.objects {
        let detection = &object.detection;
        assert_eq!(object.age, 1);
        assert!(detection.area >= 300.0 && detection.area <= 50_000.0);
        assert!(detection.perimeter > 0.0);
        match detection.shape {
            ShapeLabel::Square => {
                assert_eq!(detection.color, ColorLabel::Red);
                assert_eq!(detection.hex, "#ff4646");
                assert!(detection.area > 2_500.0 && detection.area < 4_200.0);
            }
            ShapeLabel::Rectangle => {
                assert_eq!(detection.color, ColorLabel::Blue);
                assert_eq!(detection.hex, "#5050ff");
            }
            ShapeLabel::Triangle => {
                assert_eq!(detection.color, ColorLabel::Yellow);
                assert_eq!(detection.hex, "#ffff00");
            }
            other => panic!("unexpected shape label {other}"),
        }
    }
}

#[test]
fn identities_survive_small_motion_and_die_without_grace() {
    let mut pipeline = FramePipeline::new(test_config());

    let first = ids_by_shape(&pipeline.process_frame(&scene(0, true)));
    assert_eq!(first.len(), 3);

    // Everything drifts eight pixels: well under the distance gate, so every
    // identity is re-matched and ages.
    let second = ids_by_shape(&pipeline.process_frame(&scene(8, true)));
    for (shape, (id, age)) in &second {
        assert_eq!(*id, first[shape].0, "{shape} changed identity");
        assert_eq!(*age, 2);
    }

    // The square disappears entirely; its identity is dropped at once.
    let third = ids_by_shape(&pipeline.process_frame(&scene(8, false)));
    assert_eq!(third.len(), 2);
    assert!(!third.contains_key(&ShapeLabel::Square));
    assert_eq!(third[&ShapeLabel::Rectangle].1, 3);
    assert_eq!(third[&ShapeLabel::Triangle].1, 3);

    // Reappearing in the same place earns a fresh identity at age 1.
    let fourth = ids_by_shape(&pipeline.process_frame(&scene(8, true)));
    assert_ne!(fourth[&ShapeLabel::Square].0, first[&ShapeLabel::Square].0);
    assert_eq!(fourth[&ShapeLabel::Square].1, 1);
    assert_eq!(fourth[&ShapeLabel::Rectangle].0, first[&ShapeLabel::Rectangle].0);
    assert_eq!(fourth[&ShapeLabel::Rectangle].1, 4);
}

#[test]
fn undersized_regions_never_reach_the_output() {
    let mut pipeline = FramePipeline::new(test_config());
    let mut frame = RgbImage::from_pixel(320, 240, Rgb([0, 0, 0]));
    draw_square(&mut frame, 0);
    // A bright speck, far below the minimum area.
    draw_filled_rect_mut(&mut frame, Rect::at(250, 200).of_size(5, 5), RED);

    let analysis = pipeline.process_frame(&frame);
    assert_eq!(analysis.objects.len(), 1);
    assert_eq!(analysis.objects[0].detection.shape, ShapeLabel::Square);
}

#[test]
fn an_empty_frame_is_a_valid_cycle() {
    let mut pipeline = FramePipeline::new(test_config());
    let analysis = pipeline.process_frame(&RgbImage::from_pixel(320, 240, Rgb([0, 0, 0])));
    assert!(analysis.objects.is_empty());
    assert!(analysis.counts.is_empty());
    assert_eq!(analysis.mask.dimensions(), (320, 240));
}

#[test]
fn diagnostics_match_frame_dimensions() {
    let mut pipeline = FramePipeline::new(test_config());
    let analysis = pipeline.process_frame(&scene(0, true));
    assert_eq!(analysis.mask.dimensions(), (320, 240));
    assert_eq!(analysis.edges.canny.dimensions(), (320, 240));
    assert_eq!(analysis.edges.sobel.dimensions(), (320, 240));
    assert_eq!(analysis.edges.combined.dimensions(), (320, 240));
    assert!(analysis.edges.combined.pixels().any(|p| p[0] != 0));
    assert_eq!(analysis.contours.len(), analysis.objects.len());
}

#[test]
fn synthetic_source_feeds_the_default_pipeline() {
    // Smoke test: the procedural scene runs through the default (adaptive)
    // configuration without incident.
    let mut source = SyntheticSource::new(320, 240, 3);
    let mut pipeline = FramePipeline::new(PipelineConfig::default());
    let mut frames = 0;
    while let Some(frame) = source.read_frame() {
        let analysis = pipeline.process_frame(&frame);
        assert_eq!(analysis.mask.dimensions(), frame.dimensions());
        frames += 1;
    }
    assert_eq!(frames, 3);
}
