//! Immutable snapshot store with label/kind/id/adjacency indexes.
//!
//! Built once from a [`Snapshot`] and never mutated, so every read below it
//! is lock-free. Construction validates the snapshot invariants (globally
//! unique ids, resolvable edge endpoints, resolvable movie references) and
//! rejects violations as `StoreUnavailable`: a corrupt backing store is a
//! fatal condition, not something to limp along with.

use std::collections::HashMap;

use crate::error::GraphError;
use crate::model::{Edge, EdgeKind, Label, Node, Snapshot};

#[derive(Debug)]
pub struct GraphStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    /// node id -> index into `nodes`
    by_id: HashMap<String, usize>,
    /// per label, node indexes ordered by primary name (ascending,
    /// case-sensitive lexical), ties by id
    by_label: HashMap<Label, Vec<usize>>,
    /// per kind, edge indexes in snapshot order
    by_kind: HashMap<EdgeKind, Vec<usize>>,
    /// node id -> incident edge indexes (either direction, snapshot order)
    incident: HashMap<String, Vec<usize>>,
}

impl GraphStore {
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, GraphError> {
        let Snapshot { nodes, edges } = snapshot;

        let mut by_id: HashMap<String, usize> = HashMap::with_capacity(nodes.len());
        for (idx, node) in nodes.iter().enumerate() {
            if by_id.insert(node.id.clone(), idx).is_some() {
                tracing::warn!(id = %node.id, "duplicate node id in snapshot");
                return Err(GraphError::store_unavailable(format!(
                    "duplicate node id `{}`",
                    node.id
                )));
            }
        }

        let mut by_label: HashMap<Label, Vec<usize>> = HashMap::new();
        for (idx, node) in nodes.iter().enumerate() {
            by_label.entry(node.label).or_default().push(idx);
        }
        for indexes in by_label.values_mut() {
            indexes.sort_by(|&a, &b| {
                nodes[a]
                    .primary_name()
                    .cmp(nodes[b].primary_name())
                    .then_with(|| nodes[a].id.cmp(&nodes[b].id))
            });
        }

        let mut by_kind: HashMap<EdgeKind, Vec<usize>> = HashMap::new();
        let mut incident: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, edge) in edges.iter().enumerate() {
            for endpoint in [&edge.source, &edge.target] {
                if !by_id.contains_key(endpoint) {
                    tracing::warn!(kind = %edge.kind, id = %endpoint, "dangling edge endpoint");
                    return Err(GraphError::store_unavailable(format!(
                        "{} edge references unknown node `{endpoint}`",
                        edge.kind
                    )));
                }
            }
            if let Some(movie) = edge.movie_ref() {
                let resolves = by_id
                    .get(movie)
                    .map(|&i| nodes[i].label == Label::Movie)
                    .unwrap_or(false);
                if !resolves {
                    tracing::warn!(kind = %edge.kind, movie = %movie, "dangling movie reference");
                    return Err(GraphError::store_unavailable(format!(
                        "{} edge references unknown movie `{movie}`",
                        edge.kind
                    )));
                }
            }

            by_kind.entry(edge.kind).or_default().push(idx);
            incident.entry(edge.source.clone()).or_default().push(idx);
            if edge.target != edge.source {
                incident.entry(edge.target.clone()).or_default().push(idx);
            }
        }

        Ok(Self {
            nodes,
            edges,
            by_id,
            by_label,
            by_kind,
            incident,
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_by_id(&self, id: &str) -> Option<&Node> {
        self.by_id.get(id).map(|&idx| &self.nodes[idx])
    }

    /// Nodes of one label, ordered by primary name ascending.
    pub fn nodes_by_label(&self, label: Label) -> impl Iterator<Item = &Node> + '_ {
        self.by_label
            .get(&label)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.nodes[idx])
    }

    pub fn edges_by_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &Edge> + '_ {
        self.by_kind
            .get(&kind)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.edges[idx])
    }

    /// Every edge incident to `id` (either direction, any kind), paired with
    /// the far endpoint. Order is snapshot order, so results are stable.
    pub fn neighbors(&self, id: &str) -> Vec<(&Edge, &Node)> {
        let Some(indexes) = self.incident.get(id) else {
            return Vec::new();
        };
        indexes
            .iter()
            .filter_map(|&idx| {
                let edge = &self.edges[idx];
                let other = edge.other_endpoint(id)?;
                Some((edge, self.node_by_id(other)?))
            })
            .collect()
    }
}
