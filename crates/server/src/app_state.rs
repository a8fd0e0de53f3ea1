use std::path::PathBuf;

use crate::api::ApiContext;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    pub(crate) static_dir: PathBuf,
    pub(crate) max_audio_bytes: usize,
}
