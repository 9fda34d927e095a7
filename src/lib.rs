// THEORY:
// This file is the main entry point for the `prism_vision` library crate. It
// exposes the `FramePipeline` and its associated data structures as the
// high-level interface for the whole engine: feed in RGB frames, get back
// classified, identity-tracked objects and per-label counts. The analysis
// stages live in `core_modules` and are re-exported only through the types a
// consumer actually needs; the `source`, `render` and `export` modules cover
// the thin I/O shell around the engine.

pub mod core_modules;
pub mod export;
pub mod pipeline;
pub mod render;
pub mod source;

pub use crate::core_modules::color::{ColorLabel, ColorPalette, HexAggregation};
pub use crate::core_modules::detection::{BoundingBox, Detection};
pub use crate::core_modules::foreground::ThresholdStrategy;
pub use crate::core_modules::shape::ShapeLabel;
pub use crate::core_modules::tracker::TrackedObject;
pub use crate::pipeline::{FrameAnalysis, FramePipeline, PipelineConfig};
pub use crate::source::{FrameSource, ImageDirSource, SyntheticSource};
