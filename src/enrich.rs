//! Geometry enrichment.

use crate::feature::Feature;
use crate::traits::Segment;

/// Stamps the road distance covered so far onto each event feature.
///
/// Walks the features in order and advances to the next segment carrying a
/// distance every time the location changes. Distances are assigned, never
/// added to, so stamping the same features twice gives the same result.
/// Returns the distance covered at the last feature.
pub fn stamp_distances(features: &mut [Feature], segments: &[Segment]) -> f64 {
    let mut distances = segments.iter().filter_map(|segment| segment.distance);
    let mut previous = features.first().map(|feature| feature.geometry.clone());
    let mut covered = 0.0;

    for feature in features.iter_mut() {
        if previous.as_ref() != Some(&feature.geometry) {
            if let Some(distance) = distances.next() {
                covered += distance;
            }
            previous = Some(feature.geometry.clone());
        }
        if let Some(event) = feature.event_mut() {
            event.distance = covered;
        }
    }

    covered
}
