// THEORY:
// The `tracker` module adds memory to the otherwise stateless per-frame
// analysis. It takes the detections of the current frame and associates each
// one with an identity carried over from the previous frame, solving the
// data association problem with a deliberately simple scheme:
//
// 1.  **Matching**: every (detection, registry entry) pair whose centroid
//     distance falls under the gate becomes a candidate. Candidates are
//     claimed greedily in ascending distance order, so the closest pair
//     always wins and the outcome does not depend on the order detections
//     happened to be found in. Ties at identical distance break by detection
//     index, then id.
// 2.  **Birth**: a detection with no claimable entry receives a fresh id from
//     a monotonically increasing counter and starts at age 1.
// 3.  **Death**: the registry is replaced wholesale every cycle. An identity
//     not claimed this cycle is gone immediately; there is no occlusion
//     grace period, and a later reappearance gets a new id.
//
// Matching cost is O(current x previous), acceptable for the small object
// counts this engine targets.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::core_modules::detection::Detection;

/// A detection that has been bound to a persistent identity.
#[derive(Debug, Clone)]
pub struct TrackedObject {
    /// Stable across every consecutive frame in which the object is re-matched.
    pub id: u64,
    /// Number of consecutive frames this identity has been seen; starts at 1.
    pub age: u32,
    pub detection: Detection,
}

/// Owns the live identity registry and the id counter.
#[derive(Debug)]
pub struct IdentityTracker {
    registry: HashMap<u64, TrackedObject>,
    next_id: u64,
    distance_gate: f64,
}

impl IdentityTracker {
    pub fn new(distance_gate: f64) -> Self {
        Self {
            registry: HashMap::new(),
            next_id: 0,
            distance_gate,
        }
    }

    /// Binds this cycle's detections to identities and replaces the registry
    /// with the result. Output order matches input order.
    pub fn update(&mut self, detections: Vec<Detection>) -> Vec<TrackedObject> {
        // 1. Candidate pairs under the gate, closest first.
        let mut candidates: Vec<(f64, usize, u64)> = Vec::new();
        for (index, detection) in detections.iter().enumerate() {
            for (id, prior) in &self.registry {
                let distance = centroid_distance(detection.centroid, prior.detection.centroid);
                if distance < self.distance_gate {
                    candidates.push((distance, index, *id));
                }
            }
        }
        candidates.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
                .then(a.2.cmp(&b.2))
        });

        // 2. Greedy claiming.
        let mut assigned: Vec<Option<u64>> = vec![None; detections.len()];
        let mut claimed: HashSet<u64> = HashSet::new();
        for (_, index, id) in candidates {
            if assigned[index].is_none() && !claimed.contains(&id) {
                assigned[index] = Some(id);
                claimed.insert(id);
            }
        }

        // 3. Inheritance and births.
        let mut updated: Vec<TrackedObject> = Vec::with_capacity(detections.len());
        for (index, detection) in detections.into_iter().enumerate() {
            let tracked = match assigned[index] {
                Some(id) => TrackedObject {
                    id,
                    age: self.registry[&id].age + 1,
                    detection,
                },
                None => {
                    let id = self.next_id;
                    self.next_id += 1;
                    TrackedObject { id, age: 1, detection }
                }
            };
            updated.push(tracked);
        }

        // The registry is the set of identities seen this cycle, nothing more.
        self.registry = updated.iter().map(|t| (t.id, t.clone())).collect();
        updated
    }

    pub fn live_count(&self) -> usize {
        self.registry.len()
    }
}

fn centroid_distance(a: (i32, i32), b: (i32, i32)) -> f64 {
    let dx = (a.0 - b.0) as f64;
    let dy = (a.1 - b.1) as f64;
    (dx * dx + dy * dy).sqrt()
}
