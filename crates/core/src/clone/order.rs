#![forbid(unsafe_code)]

use super::config::CloneConfig;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleError {
    pub tables: Vec<String>,
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dependency cycle among tables: {}", self.tables.join(", "))
    }
}

impl std::error::Error for CycleError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderResolution {
    /// Table names in execution order.
    pub order: Vec<String>,
    /// Tables left unresolved by a dependency cycle; empty when the graph is acyclic.
    pub cyclic: Vec<String>,
}

impl OrderResolution {
    pub fn into_result(self) -> Result<Vec<String>, CycleError> {
        if self.cyclic.is_empty() {
            Ok(self.order)
        } else {
            Err(CycleError {
                tables: self.cyclic,
            })
        }
    }
}

/// Kahn's algorithm over `depends_on`, ready nodes ordered by
/// `(priority, registration index)`. `configs` must be in registration order.
///
/// Dependencies on unregistered entity types are dropped. On a cycle the
/// whole set falls back to priority order and the cyclic tables are reported.
pub fn resolve_order(configs: &[&CloneConfig]) -> OrderResolution {
    let by_entity: BTreeMap<&str, usize> = configs
        .iter()
        .enumerate()
        .map(|(index, config)| (config.entity_type.as_str(), index))
        .collect();

    let mut indegree = vec![0usize; configs.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); configs.len()];
    for (index, config) in configs.iter().enumerate() {
        for dependency in &config.depends_on {
            let Some(&dep_index) = by_entity.get(dependency.as_str()) else {
                continue;
            };
            if dep_index == index {
                // A self-dependency is a self reference, handled by `self_ref_fk`.
                continue;
            }
            indegree[index] += 1;
            dependents[dep_index].push(index);
        }
    }

    let key = |index: usize| Reverse((configs[index].priority, index));
    let mut ready: BinaryHeap<Reverse<(i32, usize)>> = indegree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(index, _)| key(index))
        .collect();

    let mut order = Vec::with_capacity(configs.len());
    while let Some(Reverse((_, index))) = ready.pop() {
        order.push(index);
        for &dependent in &dependents[index] {
            indegree[dependent] -= 1;
            if indegree[dependent] == 0 {
                ready.push(key(dependent));
            }
        }
    }

    if order.len() == configs.len() {
        return OrderResolution {
            order: order
                .into_iter()
                .map(|index| configs[index].table_name.clone())
                .collect(),
            cyclic: Vec::new(),
        };
    }

    let mut cyclic: Vec<usize> = (0..configs.len())
        .filter(|index| indegree[*index] > 0)
        .collect();
    cyclic.sort_by_key(|index| (configs[*index].priority, *index));

    let mut fallback: Vec<usize> = (0..configs.len()).collect();
    fallback.sort_by_key(|index| (configs[*index].priority, *index));

    OrderResolution {
        order: fallback
            .into_iter()
            .map(|index| configs[index].table_name.clone())
            .collect(),
        cyclic: cyclic
            .into_iter()
            .map(|index| configs[index].table_name.clone())
            .collect(),
    }
}
