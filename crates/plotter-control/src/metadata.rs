//! Cache for the last-fetched device geometry.

use crate::mapper::CoordinateMapper;
use plotter_types::{DeviceMetadata, PanelResult};

/// Holds the current metadata generation. The struct is replaced wholesale on
/// a successful refresh; a failed refresh never calls `store`, so the cached
/// value survives untouched.
#[derive(Debug, Default)]
pub struct MetadataCache {
    current: Option<DeviceMetadata>,
    generation: u64,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, meta: DeviceMetadata) {
        self.current = Some(meta);
        self.generation += 1;
        log::debug!(
            "Metadata refreshed (generation {}): workspace {} x {} mm",
            self.generation,
            meta.workspace_size_mm.x,
            meta.workspace_size_mm.y
        );
    }

    /// Fold one refresh attempt into the cache: success replaces the cached
    /// struct wholesale, failure leaves the previous generation untouched.
    pub fn apply(&mut self, fetched: PanelResult<DeviceMetadata>) -> PanelResult<()> {
        match fetched {
            Ok(meta) => {
                self.store(meta);
                Ok(())
            }
            Err(e) => {
                log::warn!("Metadata refresh failed, keeping previous generation: {e}");
                Err(e)
            }
        }
    }

    pub fn get(&self) -> Option<&DeviceMetadata> {
        self.current.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Build a mapper from the current generation. Fails with
    /// `StaleMetadata` before the first successful refresh or while the
    /// device reports a zero scale factor.
    pub fn mapper(&self) -> PanelResult<CoordinateMapper> {
        match &self.current {
            Some(meta) => CoordinateMapper::from_metadata(meta),
            None => Err(plotter_types::PanelError::StaleMetadata),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotter_types::{PanelError, Vec2};

    fn metadata() -> DeviceMetadata {
        DeviceMetadata {
            workspace_size_mm: Vec2::new(200.0, 150.0),
            pixel_size_mm: Vec2::new(0.5, 0.5),
            output_resolution: Vec2::new(1000.0, 500.0),
            original_point_coordinates: Vec2::new(50.0, 50.0),
            xy_factors: Vec2::new(2.0, 2.0),
        }
    }

    #[test]
    fn mapper_fails_before_first_refresh() {
        let cache = MetadataCache::new();
        assert!(matches!(cache.mapper(), Err(PanelError::StaleMetadata)));
    }

    #[test]
    fn mapper_succeeds_after_store() {
        let mut cache = MetadataCache::new();
        cache.store(metadata());
        assert!(cache.mapper().is_ok());
        assert_eq!(cache.generation(), 1);
    }

    #[test]
    fn failed_refresh_leaves_cache_untouched() {
        let mut cache = MetadataCache::new();
        cache.store(metadata());
        let before = *cache.get().unwrap();
        let generation = cache.generation();

        let fetch_failed: PanelResult<DeviceMetadata> =
            Err(PanelError::transport("connection refused"));
        assert!(cache.apply(fetch_failed).is_err());

        let parse_failed: PanelResult<DeviceMetadata> =
            serde_json::from_str("not json").map_err(PanelError::from);
        assert!(cache.apply(parse_failed).is_err());

        assert_eq!(*cache.get().unwrap(), before);
        assert_eq!(cache.generation(), generation);
    }

    #[test]
    fn successful_refresh_applies_wholesale() {
        let mut cache = MetadataCache::new();
        assert!(cache.apply(Ok(metadata())).is_ok());
        assert_eq!(*cache.get().unwrap(), metadata());
        assert_eq!(cache.generation(), 1);
    }

    #[test]
    fn store_replaces_wholesale() {
        let mut cache = MetadataCache::new();
        cache.store(metadata());

        let mut next = metadata();
        next.workspace_size_mm = Vec2::new(300.0, 300.0);
        next.xy_factors = Vec2::new(4.0, 4.0);
        cache.store(next);

        let current = cache.get().unwrap();
        assert_eq!(current.workspace_size_mm, Vec2::new(300.0, 300.0));
        assert_eq!(current.xy_factors, Vec2::new(4.0, 4.0));
        assert_eq!(cache.generation(), 2);
    }
}
