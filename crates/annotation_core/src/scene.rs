//! Boundary to the 3D engine that owns the panorama sphere, the marker
//! spheres and the on-screen overlays.

use std::time::Duration;

use glam::{Mat4, Vec2, Vec3};
use shared::domain::VisualId;

use crate::{geometry::Viewport, workflow::ControlStates};

/// Request to draw one marker sphere.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerVisual {
    pub position: Vec3,
    pub radius: f32,
    pub color: &'static str,
    pub label: String,
}

/// Everything the annotation session needs from a rendering engine.
///
/// Engines raise pointer events (sphere intersections, enter/leave on marker
/// visuals) by calling into the session; this trait covers the other
/// direction.
pub trait SceneBackend: Send {
    fn set_panorama_source(&mut self, resource: &str);
    fn create_marker_visual(&mut self, visual: MarkerVisual) -> VisualId;
    fn remove_marker_visual(&mut self, id: VisualId);
    fn camera_transform(&self) -> Mat4;
    fn viewport(&self) -> Viewport;
    fn show_tooltip(&mut self, at: Vec2, text: &str);
    fn hide_tooltip(&mut self);
    /// Transient toast, dismissed by the engine after `ttl`.
    fn notify(&mut self, message: &str, ttl: Duration);
    fn set_controls(&mut self, controls: ControlStates);
}
