use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident, $inner:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub $inner);
    };
}

id_newtype!(PanoramaIndex, u32);
id_newtype!(VisualId, u64);

impl PanoramaIndex {
    pub const FIRST: PanoramaIndex = PanoramaIndex(1);
}

impl std::fmt::Display for PanoramaIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Upload descriptor shared by the viewer client and the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioUploadMeta {
    pub filename: String,
    pub mime_type: String,
}

impl Default for AudioUploadMeta {
    fn default() -> Self {
        Self {
            filename: "audio.webm".into(),
            mime_type: "audio/webm".into(),
        }
    }
}
