#![forbid(unsafe_code)]

use serde::Serialize;
use std::collections::BTreeMap;

/// Old id -> new id, one map per entity type, built during a single fork.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IdMaps {
    maps: BTreeMap<String, BTreeMap<i64, i64>>,
}

impl IdMaps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entity_type: &str, old_id: i64, new_id: i64) {
        self.maps
            .entry(entity_type.to_string())
            .or_default()
            .insert(old_id, new_id);
    }

    pub fn resolve(&self, entity_type: &str, old_id: i64) -> Option<i64> {
        self.maps.get(entity_type)?.get(&old_id).copied()
    }

    pub fn map(&self, entity_type: &str) -> Option<&BTreeMap<i64, i64>> {
        self.maps.get(entity_type)
    }

    /// Source ids of `entity_type`, ascending.
    pub fn old_ids(&self, entity_type: &str) -> Vec<i64> {
        self.maps
            .get(entity_type)
            .map(|map| map.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, entity_type: &str) -> usize {
        self.maps.get(entity_type).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.maps.values().all(BTreeMap::is_empty)
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.maps.keys().map(String::as_str)
    }

    /// Keeps only the maps whose entity type satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.maps.retain(|entity_type, _| keep(entity_type));
    }

    pub fn into_inner(self) -> BTreeMap<String, BTreeMap<i64, i64>> {
        self.maps
    }
}
