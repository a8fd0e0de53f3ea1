use std::{collections::BTreeMap, time::Duration};

use annotation_core::{Camera, ControlStates, MarkerVisual, SceneBackend, Viewport};
use glam::{Mat4, Vec2};
use shared::domain::VisualId;
use tracing::debug;

/// Scene that prints what a 3D engine would draw. The camera is fixed, so
/// tooltip positions are stable between runs.
pub struct TerminalScene {
    camera: Camera,
    viewport: Viewport,
    next_id: u64,
    visuals: BTreeMap<VisualId, MarkerVisual>,
}

impl TerminalScene {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            camera: Camera::panorama(0.0, 0.0, viewport.aspect()),
            viewport,
            next_id: 1,
            visuals: BTreeMap::new(),
        }
    }
}

impl SceneBackend for TerminalScene {
    fn set_panorama_source(&mut self, resource: &str) {
        println!("[scene] panorama {resource}");
    }

    fn create_marker_visual(&mut self, visual: MarkerVisual) -> VisualId {
        let id = VisualId(self.next_id);
        self.next_id += 1;
        let p = visual.position;
        let label = if visual.label.is_empty() {
            "(no note)"
        } else {
            visual.label.as_str()
        };
        println!(
            "[scene] marker #{} at ({:.2}, {:.2}, {:.2}) {}",
            id.0, p.x, p.y, p.z, label
        );
        self.visuals.insert(id, visual);
        id
    }

    fn remove_marker_visual(&mut self, id: VisualId) {
        if self.visuals.remove(&id).is_none() {
            debug!(visual = id.0, "removing unknown visual");
        }
    }

    fn camera_transform(&self) -> Mat4 {
        self.camera.view_projection()
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn show_tooltip(&mut self, at: Vec2, text: &str) {
        println!("[tooltip @ {:.0},{:.0}] {text}", at.x, at.y);
    }

    fn hide_tooltip(&mut self) {
        println!("[tooltip hidden]");
    }

    fn notify(&mut self, message: &str, ttl: Duration) {
        println!("[toast {}ms] {message}", ttl.as_millis());
    }

    fn set_controls(&mut self, controls: ControlStates) {
        let flag = |on: bool| if on { "on" } else { "off" };
        println!(
            "[controls] add={} rec={} stop={}",
            flag(controls.add_enabled),
            flag(controls.rec_enabled),
            flag(controls.stop_enabled)
        );
    }
}
