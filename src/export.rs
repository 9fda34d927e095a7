// Write-only snapshot export: a JSON record of the current tracked objects
// and a PNG of an annotated frame, both stamped with the unix time in the
// filename. Nothing here is ever read back by the engine.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use image::RgbImage;
use serde::Serialize;

use crate::core_modules::tracker::TrackedObject;

/// One exported object, flattened to plain JSON types.
#[derive(Debug, Serialize)]
pub struct DetectionRecord {
    pub shape: String,
    pub color: String,
    pub hex: String,
    pub area: i64,
    pub center: [i32; 2],
    pub bbox: [i32; 4],
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circularity: Option<f64>,
}

impl DetectionRecord {
    pub fn from_tracked(object: &TrackedObject, timestamp: i64) -> Self {
        let detection = &object.detection;
        let bb = detection.bounding_box;
        Self {
            shape: detection.shape.to_string(),
            color: detection.color.to_string(),
            hex: detection.hex.clone(),
            area: detection.area as i64,
            center: [detection.centroid.0, detection.centroid.1],
            bbox: [bb.x, bb.y, bb.width, bb.height],
            timestamp,
            id: Some(object.id),
            age: Some(object.age),
            circularity: Some(detection.circularity),
        }
    }
}

/// Serializes the tracked objects to `<prefix>_<unix>.json` under `dir` and
/// returns the path written.
pub fn save_detection_data(
    objects: &[TrackedObject],
    dir: &Path,
    prefix: &str,
) -> Result<PathBuf> {
    let timestamp = Utc::now().timestamp();
    let records: Vec<DetectionRecord> = objects
        .iter()
        .map(|object| DetectionRecord::from_tracked(object, timestamp))
        .collect();

    let path = dir.join(format!("{prefix}_{timestamp}.json"));
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, &records)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

/// Saves a frame to `<prefix>_<unix>.png` under `dir`.
pub fn save_screenshot(frame: &RgbImage, dir: &Path, prefix: &str) -> Result<PathBuf> {
    let timestamp = Utc::now().timestamp();
    let path = dir.join(format!("{prefix}_{timestamp}.png"));
    frame
        .save(&path)
        .with_context(|| format!("saving {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::color::ColorLabel;
    use crate::core_modules::detection::{BoundingBox, Detection};
    use crate::core_modules::shape::ShapeLabel;

    fn tracked() -> TrackedObject {
        TrackedObject {
            id: 7,
            age: 3,
            detection: Detection {
                shape: ShapeLabel::Triangle,
                color: ColorLabel::Yellow,
                hex: String::from("#ffff00"),
                area: 2400.7,
                perimeter: 260.0,
                circularity: 0.45,
                centroid: (100, 150),
                bounding_box: BoundingBox { x: 60, y: 120, width: 81, height: 61 },
            },
        }
    }

    #[test]
    fn record_flattens_the_tracked_object() {
        let record = DetectionRecord::from_tracked(&tracked(), 1_700_000_000);
        assert_eq!(record.shape, "Triangle");
        assert_eq!(record.color, "Yellow");
        assert_eq!(record.hex, "#ffff00");
        assert_eq!(record.area, 2400);
        assert_eq!(record.center, [100, 150]);
        assert_eq!(record.bbox, [60, 120, 81, 61]);
        assert_eq!(record.id, Some(7));
        assert_eq!(record.age, Some(3));
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let dir = std::env::temp_dir();
        let path = save_detection_data(&[tracked()], &dir, "prism_test_snapshot").unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();

        let entry = &parsed.as_array().unwrap()[0];
        assert_eq!(entry["shape"], "Triangle");
        assert_eq!(entry["hex"], "#ffff00");
        assert_eq!(entry["id"], 7);
        assert_eq!(entry["age"], 3);
        assert!(entry["timestamp"].as_i64().unwrap() > 0);

        std::fs::remove_file(path).ok();
    }
}
