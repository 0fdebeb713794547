use crate::clock::Clock;
use crate::config::{CacheSnapshot, ConfigCache, ConfigSource, Feature};
use std::sync::Arc;

/// The single predicate every hook consults before overriding anything.
pub struct FeatureGate {
    cache: ConfigCache,
    clock: Arc<dyn Clock>,
}

impl FeatureGate {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            cache: ConfigCache::new(),
            clock,
        }
    }

    pub fn refresh<S: ConfigSource + ?Sized>(&self, source: &mut S) -> Arc<CacheSnapshot> {
        self.cache.refresh_if_stale(self.clock.now_millis(), source);
        self.cache.snapshot()
    }

    pub fn is_enabled<S: ConfigSource + ?Sized>(&self, source: &mut S, feature: Feature) -> bool {
        self.refresh(source).is_enabled(feature)
    }

    /// True when the notification should keep the host's default behavior.
    pub fn should_skip<S: ConfigSource + ?Sized>(
        &self,
        source: &mut S,
        feature: Feature,
        app: Option<&str>,
    ) -> bool {
        let snapshot = self.refresh(source);
        !snapshot.is_enabled(feature) || app.is_some_and(|app| snapshot.is_excluded(app))
    }
}
