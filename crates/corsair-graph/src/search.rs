//! Case-insensitive substring search over a normalized text projection of
//! every node.
//!
//! Deliberately a plain scan, not an inverted index: the graph is small and
//! immutable, and a scan over a few hundred nodes is far below interactive
//! latency. A node matches when its coalesced primary name or secondary
//! field contains the query. Empty queries match nothing (not everything).

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::model::Label;
use crate::query::QueryEngine;

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub label: Label,
    pub name: String,
    pub props: BTreeMap<String, Value>,
}

pub struct SearchIndex<'a> {
    engine: &'a QueryEngine,
}

impl<'a> SearchIndex<'a> {
    /// Result cap, matching the source system's LIMIT.
    pub const MAX_HITS: usize = 20;

    pub fn new(engine: &'a QueryEngine) -> Self {
        Self { engine }
    }

    /// At most [`Self::MAX_HITS`] matches, sorted by node id for
    /// determinism.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit> = self
            .engine
            .all_nodes()
            .iter()
            .filter(|node| {
                node.primary_name().to_lowercase().contains(&needle)
                    || node
                        .secondary_field()
                        .map(|s| s.to_lowercase().contains(&needle))
                        .unwrap_or(false)
            })
            .map(|node| SearchHit {
                id: node.id.clone(),
                label: node.label,
                name: node.primary_name().to_string(),
                props: node.props.clone(),
            })
            .collect();
        hits.sort_by(|a, b| a.id.cmp(&b.id));
        hits.truncate(Self::MAX_HITS);
        hits
    }
}
