use glam::{Vec2, Vec3};
use shared::domain::VisualId;
use tracing::debug;

use crate::{
    geometry::screen_position,
    scene::{MarkerVisual, SceneBackend},
    store::Marker,
};

pub const MARKER_COLOR: &str = "red";

#[derive(Debug, Clone)]
struct DrawnMarker {
    visual: VisualId,
    position: Vec3,
    label: String,
}

/// Tracks the marker visuals currently shown for the active panorama.
#[derive(Debug)]
pub struct MarkerRenderer {
    drawn: Vec<DrawnMarker>,
    visual_radius: f32,
}

impl MarkerRenderer {
    pub fn new(visual_radius: f32) -> Self {
        Self {
            drawn: Vec::new(),
            visual_radius,
        }
    }

    pub fn clear<S: SceneBackend + ?Sized>(&mut self, scene: &mut S) {
        for drawn in self.drawn.drain(..) {
            scene.remove_marker_visual(drawn.visual);
        }
    }

    pub fn draw_all<S: SceneBackend + ?Sized>(&mut self, scene: &mut S, markers: &[Marker]) {
        for marker in markers {
            let visual = scene.create_marker_visual(MarkerVisual {
                position: marker.position,
                radius: self.visual_radius,
                color: MARKER_COLOR,
                label: marker.text.clone(),
            });
            self.drawn.push(DrawnMarker {
                visual,
                position: marker.position,
                label: marker.text.clone(),
            });
        }
        debug!(count = markers.len(), "markers drawn");
    }

    /// Replaces every visual with a fresh set for `markers`.
    pub fn redraw<S: SceneBackend + ?Sized>(&mut self, scene: &mut S, markers: &[Marker]) {
        self.clear(scene);
        self.draw_all(scene, markers);
    }

    /// Shows the tooltip for `visual` and returns where it was placed.
    /// Markers without a note, and visuals this renderer did not draw, show
    /// nothing.
    pub fn hover_enter<S: SceneBackend + ?Sized>(
        &self,
        scene: &mut S,
        visual: VisualId,
    ) -> Option<Vec2> {
        let drawn = self.drawn.iter().find(|d| d.visual == visual)?;
        if drawn.label.is_empty() {
            return None;
        }
        let at = screen_position(drawn.position, scene.camera_transform(), scene.viewport());
        scene.show_tooltip(at, &drawn.label);
        Some(at)
    }

    pub fn hover_leave<S: SceneBackend + ?Sized>(&self, scene: &mut S, visual: VisualId) {
        if self.drawn.iter().any(|d| d.visual == visual) {
            scene.hide_tooltip();
        }
    }

    pub fn visuals(&self) -> impl Iterator<Item = VisualId> + '_ {
        self.drawn.iter().map(|d| d.visual)
    }

    pub fn len(&self) -> usize {
        self.drawn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawn.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/renderer_tests.rs"]
mod tests;
