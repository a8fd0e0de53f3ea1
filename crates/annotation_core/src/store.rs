use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use shared::domain::PanoramaIndex;
use tracing::debug;

/// A note anchored on the panorama sphere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub position: Vec3,
    pub text: String,
}

impl Marker {
    /// Freshly placed marker whose note is still being recorded.
    pub fn placed(position: Vec3) -> Self {
        Self {
            position,
            text: String::new(),
        }
    }

    pub fn has_note(&self) -> bool {
        !self.text.is_empty()
    }
}

/// Session-scoped markers grouped by panorama, in placement order.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    markers: BTreeMap<PanoramaIndex, Vec<Marker>>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_marker(&mut self, panorama: PanoramaIndex, marker: Marker) {
        let slot = self.markers.entry(panorama).or_default();
        slot.push(marker);
        debug!(panorama = panorama.0, count = slot.len(), "marker stored");
    }

    pub fn markers_for(&self, panorama: PanoramaIndex) -> &[Marker] {
        self.markers
            .get(&panorama)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Sets the note of the most recently placed marker on `panorama`.
    /// Does nothing when the panorama has no markers.
    pub fn set_last_marker_text(&mut self, panorama: PanoramaIndex, text: impl Into<String>) {
        match self.markers.get_mut(&panorama).and_then(|m| m.last_mut()) {
            Some(marker) => marker.text = text.into(),
            None => debug!(
                panorama = panorama.0,
                "ignoring note update for panorama without markers"
            ),
        }
    }

    pub fn len(&self, panorama: PanoramaIndex) -> usize {
        self.markers_for(panorama).len()
    }

    pub fn total(&self) -> usize {
        self.markers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
