use shared::domain::PanoramaIndex;

use crate::error::NavigatorError;

/// Active panorama within a fixed, 1-based set of `count` images.
#[derive(Debug, Clone)]
pub struct PanoramaNavigator {
    current: PanoramaIndex,
    count: u32,
    base_path: String,
}

impl PanoramaNavigator {
    pub fn new(count: u32, base_path: impl Into<String>) -> Result<Self, NavigatorError> {
        if count == 0 {
            return Err(NavigatorError::EmptyPanoramaSet);
        }
        Ok(Self {
            current: PanoramaIndex::FIRST,
            count,
            base_path: base_path.into(),
        })
    }

    pub fn current(&self) -> PanoramaIndex {
        self.current
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Moves `offset` panoramas forward (negative goes back), wrapping at
    /// both ends, and returns the new index.
    pub fn advance(&mut self, offset: i64) -> PanoramaIndex {
        self.current = cycle(self.current, offset, self.count);
        self.current
    }

    pub fn resource_for(&self, index: PanoramaIndex) -> String {
        format!(
            "{}/panorama_{}.jpg",
            self.base_path.trim_end_matches('/'),
            index.0
        )
    }

    pub fn current_resource(&self) -> String {
        self.resource_for(self.current)
    }
}

fn cycle(current: PanoramaIndex, offset: i64, count: u32) -> PanoramaIndex {
    let count = i64::from(count);
    let zero_based = (i64::from(current.0) - 1 + offset).rem_euclid(count);
    // rem_euclid keeps the value in 0..count, which always fits back into u32.
    PanoramaIndex(zero_based as u32 + 1)
}
