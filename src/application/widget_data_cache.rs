// Cache of resolved widget payloads, keyed by dashboard id then widget id
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedData {
    pub data: Value,
    pub fetched_at: i64,
}

/// Widget ids are only unique within a dashboard (an imported copy keeps the
/// ids of its source), so entries live under their dashboard.
#[derive(Debug, Default)]
pub struct WidgetDataCache {
    dashboards: HashMap<String, HashMap<String, CachedData>>,
}

impl WidgetDataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached payload when it is younger than `max_age_ms`.
    pub fn fresh(
        &self,
        dashboard_id: &str,
        widget_id: &str,
        max_age_ms: i64,
        now_ms: i64,
    ) -> Option<&CachedData> {
        self.dashboards
            .get(dashboard_id)
            .and_then(|widgets| widgets.get(widget_id))
            .filter(|entry| now_ms.saturating_sub(entry.fetched_at) < max_age_ms)
    }

    pub fn insert(&mut self, dashboard_id: &str, widget_id: &str, data: Value, fetched_at: i64) {
        self.dashboards
            .entry(dashboard_id.to_string())
            .or_default()
            .insert(widget_id.to_string(), CachedData { data, fetched_at });
    }

    pub fn evict(&mut self, dashboard_id: &str, widget_id: &str) -> bool {
        let Some(widgets) = self.dashboards.get_mut(dashboard_id) else {
            return false;
        };
        let removed = widgets.remove(widget_id).is_some();
        if widgets.is_empty() {
            self.dashboards.remove(dashboard_id);
        }
        removed
    }

    /// Drop every entry of one dashboard. Returns how many were removed.
    pub fn evict_dashboard(&mut self, dashboard_id: &str) -> usize {
        self.dashboards
            .remove(dashboard_id)
            .map_or(0, |widgets| widgets.len())
    }

    pub fn len(&self) -> usize {
        self.dashboards.values().map(HashMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fresh_respects_max_age() {
        let mut cache = WidgetDataCache::new();
        cache.insert("d1", "w1", json!({"v": 1}), 1_000);

        assert!(cache.fresh("d1", "w1", 5_000, 3_000).is_some());
        assert!(cache.fresh("d1", "w1", 5_000, 6_000).is_none());
        assert!(cache.fresh("d1", "w2", 5_000, 3_000).is_none());
    }

    #[test]
    fn test_same_widget_id_on_two_dashboards() {
        let mut cache = WidgetDataCache::new();
        cache.insert("d1", "w1", json!("a"), 0);
        cache.insert("d2", "w1", json!("b"), 0);

        assert_eq!(cache.fresh("d1", "w1", 10, 0).unwrap().data, json!("a"));
        assert_eq!(cache.fresh("d2", "w1", 10, 0).unwrap().data, json!("b"));

        assert_eq!(cache.evict_dashboard("d1"), 1);
        assert!(cache.fresh("d1", "w1", 10, 0).is_none());
        assert_eq!(cache.fresh("d2", "w1", 10, 0).unwrap().data, json!("b"));
    }

    #[test]
    fn test_evict() {
        let mut cache = WidgetDataCache::new();
        cache.insert("d1", "w1", json!(1), 0);
        assert!(cache.evict("d1", "w1"));
        assert!(!cache.evict("d1", "w1"));
        assert!(!cache.evict("d2", "w1"));
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.evict_dashboard("d1"), 0);
    }
}
