//! Data model: labeled nodes, typed edges, and the bulk snapshot format.
//!
//! Each label has a conventional primary-name property (`name` /
//! `ship_name` / `location_name` / `title`) and a conventional secondary
//! descriptive property (`role` / `type` / `description`). Callers never
//! guess property names; they go through [`Node::primary_name`] and
//! [`Node::secondary_field`], which coalesce in a fixed order. Adding a new
//! label means adding one accessor arm, not scattering conditionals.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GraphError;

/// Subtypes that mark a relationship as antagonistic, used by rivalry
/// filtering.
pub const CONFLICT_SUBTYPES: [&str; 4] = ["ENEMY", "RIVALRY", "BETRAYED", "MISTRUST"];

/// The narrower set used by the leaderboard enemy count. The source system
/// deliberately excluded MISTRUST there; we keep the asymmetry.
pub const ENEMY_SUBTYPES: [&str; 3] = ["ENEMY", "RIVALRY", "BETRAYED"];

/// Coalescing order for the primary display name of a node.
const PRIMARY_PROPS: [&str; 4] = ["name", "ship_name", "location_name", "title"];

/// Coalescing order for the secondary descriptive field.
const SECONDARY_PROPS: [&str; 3] = ["role", "type", "description"];

// ============================================================================
// Labels and edge kinds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    Character,
    Ship,
    Location,
    Movie,
}

impl Label {
    pub const ALL: [Label; 4] = [Label::Character, Label::Ship, Label::Location, Label::Movie];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Character => "Character",
            Label::Ship => "Ship",
            Label::Location => "Location",
            Label::Movie => "Movie",
        }
    }

    /// Case-insensitive parse, for request paths like `/api/sample/ship`.
    pub fn parse(s: &str) -> Option<Label> {
        match s.trim().to_ascii_lowercase().as_str() {
            "character" => Some(Label::Character),
            "ship" => Some(Label::Ship),
            "location" => Some(Label::Location),
            "movie" => Some(Label::Movie),
            _ => None,
        }
    }

    /// The conventional primary-name property for this label.
    pub fn primary_prop(&self) -> &'static str {
        match self {
            Label::Character => "name",
            Label::Ship => "ship_name",
            Label::Location => "location_name",
            Label::Movie => "title",
        }
    }

    /// The conventional secondary descriptive property, if the label has one.
    pub fn secondary_prop(&self) -> Option<&'static str> {
        match self {
            Label::Character => Some("role"),
            Label::Ship => Some("type"),
            Label::Location => Some("description"),
            Label::Movie => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeKind {
    #[serde(rename = "RELATIONSHIP")]
    Relationship,
    #[serde(rename = "ROUTE")]
    Route,
    #[serde(rename = "APPEARS_IN")]
    AppearsIn,
}

impl EdgeKind {
    pub const ALL: [EdgeKind; 3] = [EdgeKind::Relationship, EdgeKind::Route, EdgeKind::AppearsIn];

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Relationship => "RELATIONSHIP",
            EdgeKind::Route => "ROUTE",
            EdgeKind::AppearsIn => "APPEARS_IN",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Nodes
// ============================================================================

/// A uniquely identified graph entity. Ids are globally unique across all
/// labels: several operations address nodes by id alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: Label,
    #[serde(default)]
    pub props: BTreeMap<String, Value>,
}

impl Node {
    pub fn new(id: impl Into<String>, label: Label) -> Self {
        Self {
            id: id.into(),
            label,
            props: BTreeMap::new(),
        }
    }

    /// Builder-style property setter, mostly for fixtures.
    pub fn with_prop(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.props.insert(key.to_string(), value.into());
        self
    }

    /// A string property, treating empty strings as absent.
    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.props
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn prop_i64(&self, key: &str) -> Option<i64> {
        self.props.get(key).and_then(Value::as_i64)
    }

    pub fn prop_f64(&self, key: &str) -> Option<f64> {
        self.props.get(key).and_then(Value::as_f64)
    }

    /// Primary display name: the label's conventional property first, then
    /// the cross-label coalescing order, then the id itself.
    pub fn primary_name(&self) -> &str {
        if let Some(name) = self.prop_str(self.label.primary_prop()) {
            return name;
        }
        PRIMARY_PROPS
            .iter()
            .find_map(|key| self.prop_str(key))
            .unwrap_or(&self.id)
    }

    /// Secondary descriptive field (role / type / description), if any.
    pub fn secondary_field(&self) -> Option<&str> {
        if let Some(key) = self.label.secondary_prop() {
            if let Some(v) = self.prop_str(key) {
                return Some(v);
            }
        }
        SECONDARY_PROPS.iter().find_map(|key| self.prop_str(key))
    }

    pub fn faction(&self) -> Option<&str> {
        self.prop_str("faction")
    }
}

// ============================================================================
// Edges
// ============================================================================

/// A typed, directed connection between two nodes.
///
/// RELATIONSHIP edges connect two characters and carry a `subtype` plus a
/// `movie` reference; ROUTE edges connect a ship to a location and carry a
/// `movie_id` and `route_type`; APPEARS_IN edges connect a character to a
/// movie. RELATIONSHIP edges are stored directed but are semantically
/// symmetric for connectivity queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    #[serde(default)]
    pub props: BTreeMap<String, Value>,
}

impl Edge {
    pub fn new(kind: EdgeKind, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            props: BTreeMap::new(),
        }
    }

    pub fn with_prop(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.props.insert(key.to_string(), value.into());
        self
    }

    fn prop_str(&self, key: &str) -> Option<&str> {
        self.props
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Relationship subtype (`ENEMY`, `ALLY`, ...), when present.
    pub fn subtype(&self) -> Option<&str> {
        self.prop_str("subtype")
    }

    pub fn route_type(&self) -> Option<&str> {
        self.prop_str("route_type")
    }

    /// The movie this edge is scoped to: `movie` for relationships,
    /// `movie_id` for routes.
    pub fn movie_ref(&self) -> Option<&str> {
        match self.kind {
            EdgeKind::Relationship => self.prop_str("movie"),
            EdgeKind::Route => self.prop_str("movie_id"),
            EdgeKind::AppearsIn => None,
        }
    }

    /// The per-kind detail field (subtype / route type), when present.
    pub fn detail(&self) -> Option<&str> {
        match self.kind {
            EdgeKind::Relationship => self.subtype(),
            EdgeKind::Route => self.route_type(),
            EdgeKind::AppearsIn => None,
        }
    }

    /// Display label for exports: the detail field if present, else the
    /// kind name.
    pub fn display_label(&self) -> &str {
        self.detail().unwrap_or_else(|| self.kind.as_str())
    }

    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }

    /// The far endpoint relative to `id`, if the edge is incident to it.
    pub fn other_endpoint(&self, id: &str) -> Option<&str> {
        if self.source == id {
            Some(&self.target)
        } else if self.target == id {
            Some(&self.source)
        } else {
            None
        }
    }

    /// True when the subtype is in the rivalry conflict set.
    pub fn is_conflict(&self) -> bool {
        self.subtype()
            .map(|s| CONFLICT_SUBTYPES.contains(&s))
            .unwrap_or(false)
    }
}

// ============================================================================
// Snapshot: the bulk read contract with the backing store
// ============================================================================

/// Everything the core needs from the backing store: all nodes and edges
/// with their labels, kinds and full property maps. No incremental or
/// streaming contract exists; the snapshot is read once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Snapshot {
    pub fn from_json_str(raw: &str) -> Result<Self, GraphError> {
        serde_json::from_str(raw)
            .map_err(|e| GraphError::store_unavailable(format!("snapshot parse failed: {e}")))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            GraphError::store_unavailable(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }
}
