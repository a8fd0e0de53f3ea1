use std::time::Duration;

use shared::protocol::DEFAULT_TRANSCRIPTION_MODEL;

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub sky_radius: f32,
    /// Markers sit this far inside the sky sphere so they never z-fight it.
    pub marker_inset: f32,
    pub marker_visual_radius: f32,
    pub panorama_count: u32,
    pub panorama_base_path: String,
    pub notification_ttl: Duration,
    pub capture_stop_timeout: Duration,
    pub transcription_timeout: Duration,
    pub transcription_model: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            sky_radius: 50.0,
            marker_inset: 0.1,
            marker_visual_radius: 0.5,
            panorama_count: 3,
            panorama_base_path: "/static/panorama_input".into(),
            notification_ttl: Duration::from_millis(1500),
            capture_stop_timeout: Duration::from_secs(10),
            transcription_timeout: Duration::from_secs(60),
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.into(),
        }
    }
}
