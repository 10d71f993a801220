//! Read operations over the store: listing, filtering, neighbor expansion
//! and full-graph export.
//!
//! The engine mediates all access to [`GraphStore`]; the path finder,
//! aggregator, search index and sampler are built on its public read
//! contract (`node` / `neighbors` / `nodes_of` / `edges_of`) rather than on
//! the store itself.
//!
//! Filtering is permissive by design: a movie id that resolves to nothing
//! simply matches nothing. Id *lookups* are different — an unknown id is a
//! `NotFound`, which callers surface as a negative result, never a crash.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::GraphError;
use crate::model::{Edge, EdgeKind, Label, Node};
use crate::store::GraphStore;

#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<GraphStore>,
}

// ============================================================================
// Projection records
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CharacterRow {
    pub id: String,
    pub name: String,
    pub role: Option<String>,
    pub faction: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationshipRow {
    pub source_id: String,
    pub source: String,
    pub source_faction: Option<String>,
    pub target_id: String,
    pub target: String,
    pub target_faction: Option<String>,
    pub relationship_type: Option<String>,
    pub movie_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionRow {
    pub kind: EdgeKind,
    pub connected_id: String,
    pub connected_label: Label,
    pub connected_name: String,
    /// Edge-specific detail: relationship subtype or route type.
    pub detail: Option<String>,
    pub movie_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShipRouteRow {
    pub ship_id: String,
    pub ship_name: String,
    pub ship_type: Option<String>,
    pub location_id: String,
    pub location_name: String,
    pub location_desc: Option<String>,
    pub movie_id: Option<String>,
    pub route_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RivalryRow {
    pub char1_id: String,
    pub character1: String,
    pub char2_id: String,
    pub character2: String,
    pub conflict_type: String,
    pub movie: String,
    pub movie_id: String,
    pub faction1: Option<String>,
    pub faction2: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovieRow {
    pub id: String,
    pub title: String,
    pub year: Option<i64>,
    pub budget: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeExport {
    pub id: String,
    pub label: Label,
    pub name: String,
    pub props: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeExport {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphExport {
    pub nodes: Vec<NodeExport>,
    pub edges: Vec<EdgeExport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FactionGroup {
    pub faction: String,
    pub member_count: usize,
    pub members: Vec<String>,
    pub member_ids: Vec<String>,
}

/// Grouping bucket for characters without a `faction` property. Keeping
/// them in the breakdown preserves the invariant that member counts sum to
/// the character total.
pub const UNALIGNED_FACTION: &str = "Unaligned";

impl QueryEngine {
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self { store }
    }

    // ------------------------------------------------------------------
    // Public read contract (used by path/aggregate/search/sample)
    // ------------------------------------------------------------------

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.store.node_by_id(id)
    }

    pub fn neighbors(&self, id: &str) -> Vec<(&Edge, &Node)> {
        self.store.neighbors(id)
    }

    pub fn nodes_of(&self, label: Label) -> impl Iterator<Item = &Node> + '_ {
        self.store.nodes_by_label(label)
    }

    pub fn edges_of(&self, kind: EdgeKind) -> impl Iterator<Item = &Edge> + '_ {
        self.store.edges_by_kind(kind)
    }

    pub fn all_nodes(&self) -> &[Node] {
        self.store.nodes()
    }

    pub fn node_count(&self) -> usize {
        self.store.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.store.edge_count()
    }

    // ------------------------------------------------------------------
    // Named operations
    // ------------------------------------------------------------------

    /// All characters, sorted by name.
    pub fn characters(&self) -> Vec<CharacterRow> {
        self.nodes_of(Label::Character)
            .map(|n| CharacterRow {
                id: n.id.clone(),
                name: n.primary_name().to_string(),
                role: n.prop_str("role").map(str::to_string),
                faction: n.faction().map(str::to_string),
                status: n.prop_str("status").map(str::to_string),
            })
            .collect()
    }

    /// All RELATIONSHIP edges with resolved endpoints, optionally filtered
    /// to one movie.
    pub fn relationships(&self, movie: Option<&str>) -> Vec<RelationshipRow> {
        self.edges_of(EdgeKind::Relationship)
            .filter(|e| match movie {
                Some(m) => e.movie_ref() == Some(m),
                None => true,
            })
            .filter_map(|e| {
                let src = self.node(&e.source)?;
                let dst = self.node(&e.target)?;
                Some(RelationshipRow {
                    source_id: src.id.clone(),
                    source: src.primary_name().to_string(),
                    source_faction: src.faction().map(str::to_string),
                    target_id: dst.id.clone(),
                    target: dst.primary_name().to_string(),
                    target_faction: dst.faction().map(str::to_string),
                    relationship_type: e.subtype().map(str::to_string),
                    movie_id: e.movie_ref().map(str::to_string),
                })
            })
            .collect()
    }

    /// Every edge incident to `id`, regardless of kind or direction.
    pub fn character_connections(&self, id: &str) -> Result<Vec<ConnectionRow>, GraphError> {
        if self.node(id).is_none() {
            return Err(GraphError::not_found("character", id));
        }
        Ok(self
            .neighbors(id)
            .into_iter()
            .map(|(edge, other)| ConnectionRow {
                kind: edge.kind,
                connected_id: other.id.clone(),
                connected_label: other.label,
                connected_name: other.primary_name().to_string(),
                detail: edge.detail().map(str::to_string),
                movie_id: edge.movie_ref().map(str::to_string),
            })
            .collect())
    }

    /// ROUTE edges with resolved ship and location attributes, sorted by
    /// ship name then movie id.
    pub fn ship_routes(&self, movie: Option<&str>) -> Vec<ShipRouteRow> {
        let mut rows: Vec<ShipRouteRow> = self
            .edges_of(EdgeKind::Route)
            .filter(|e| match movie {
                Some(m) => e.movie_ref() == Some(m),
                None => true,
            })
            .filter_map(|e| {
                let ship = self.node(&e.source)?;
                let location = self.node(&e.target)?;
                Some(ShipRouteRow {
                    ship_id: ship.id.clone(),
                    ship_name: ship.primary_name().to_string(),
                    ship_type: ship.prop_str("type").map(str::to_string),
                    location_id: location.id.clone(),
                    location_name: location.primary_name().to_string(),
                    location_desc: location.prop_str("description").map(str::to_string),
                    movie_id: e.movie_ref().map(str::to_string),
                    route_type: e.route_type().map(str::to_string),
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            a.ship_name
                .cmp(&b.ship_name)
                .then_with(|| a.movie_id.cmp(&b.movie_id))
        });
        rows
    }

    /// Conflict-subtype RELATIONSHIP edges with their movie resolved,
    /// sorted by release year. Edges whose movie does not resolve are
    /// excluded, matching the source's inner join.
    pub fn rivalries(&self, movie: Option<&str>) -> Vec<RivalryRow> {
        let mut rows: Vec<(i64, RivalryRow)> = self
            .edges_of(EdgeKind::Relationship)
            .filter(|e| e.is_conflict())
            .filter(|e| match movie {
                Some(m) => e.movie_ref() == Some(m),
                None => true,
            })
            .filter_map(|e| {
                let movie_node = self.node(e.movie_ref()?)?;
                if movie_node.label != Label::Movie {
                    return None;
                }
                let c1 = self.node(&e.source)?;
                let c2 = self.node(&e.target)?;
                let year = movie_node.prop_i64("release_year").unwrap_or(i64::MAX);
                Some((
                    year,
                    RivalryRow {
                        char1_id: c1.id.clone(),
                        character1: c1.primary_name().to_string(),
                        char2_id: c2.id.clone(),
                        character2: c2.primary_name().to_string(),
                        conflict_type: e.subtype().unwrap_or_default().to_string(),
                        movie: movie_node.primary_name().to_string(),
                        movie_id: movie_node.id.clone(),
                        faction1: c1.faction().map(str::to_string),
                        faction2: c2.faction().map(str::to_string),
                    },
                ))
            })
            .collect();
        rows.sort_by_key(|(year, _)| *year);
        rows.into_iter().map(|(_, row)| row).collect()
    }

    /// Movies reached from `id` via outgoing APPEARS_IN, sorted by release
    /// year.
    pub fn character_movies(&self, id: &str) -> Result<Vec<MovieRow>, GraphError> {
        if self.node(id).is_none() {
            return Err(GraphError::not_found("character", id));
        }
        let mut rows: Vec<MovieRow> = self
            .neighbors(id)
            .into_iter()
            .filter(|(edge, _)| edge.kind == EdgeKind::AppearsIn && edge.source == id)
            .filter(|(_, other)| other.label == Label::Movie)
            .map(|(_, m)| movie_row(m))
            .collect();
        rows.sort_by_key(|r| r.year.unwrap_or(i64::MAX));
        Ok(rows)
    }

    /// All movies, sorted by release year.
    pub fn movies(&self) -> Vec<MovieRow> {
        let mut rows: Vec<MovieRow> = self.nodes_of(Label::Movie).map(movie_row).collect();
        rows.sort_by_key(|r| r.year.unwrap_or(i64::MAX));
        rows
    }

    /// Every node and edge, projected for visualization. Node ids are
    /// unique by store construction; each edge is emitted exactly once.
    pub fn full_graph(&self) -> GraphExport {
        let nodes = self
            .all_nodes()
            .iter()
            .map(|n| NodeExport {
                id: n.id.clone(),
                label: n.label,
                name: n.primary_name().to_string(),
                props: n.props.clone(),
            })
            .collect();
        let edges = self
            .store
            .edges()
            .iter()
            .map(|e| EdgeExport {
                from: e.source.clone(),
                to: e.target.clone(),
                kind: e.kind,
                label: e.display_label().to_string(),
            })
            .collect();
        GraphExport { nodes, edges }
    }

    /// Characters grouped by faction, sorted by member count descending
    /// (ties by faction name). With a movie filter, only characters with an
    /// APPEARS_IN edge to that movie are counted.
    pub fn faction_breakdown(&self, movie: Option<&str>) -> Vec<FactionGroup> {
        let mut groups: Vec<FactionGroup> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for character in self.nodes_of(Label::Character) {
            if let Some(movie_id) = movie {
                let appears = self.neighbors(&character.id).into_iter().any(|(e, m)| {
                    e.kind == EdgeKind::AppearsIn && e.source == character.id && m.id == movie_id
                });
                if !appears {
                    continue;
                }
            }
            let faction = character.faction().unwrap_or(UNALIGNED_FACTION).to_string();
            let slot = *index.entry(faction.clone()).or_insert_with(|| {
                groups.push(FactionGroup {
                    faction,
                    member_count: 0,
                    members: Vec::new(),
                    member_ids: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot].member_count += 1;
            groups[slot]
                .members
                .push(character.primary_name().to_string());
            groups[slot].member_ids.push(character.id.clone());
        }

        groups.sort_by(|a, b| {
            b.member_count
                .cmp(&a.member_count)
                .then_with(|| a.faction.cmp(&b.faction))
        });
        groups
    }
}

fn movie_row(m: &Node) -> MovieRow {
    MovieRow {
        id: m.id.clone(),
        title: m.primary_name().to_string(),
        year: m.prop_i64("release_year"),
        budget: m.prop_f64("budget_in_million"),
    }
}
