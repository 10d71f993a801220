//! Breadth-first shortest paths over the undirected view of RELATIONSHIP
//! edges. Other edge kinds are not traversed: two characters connected only
//! through a shared movie are *not* connected here.
//!
//! Tie-break: the frontier expands neighbors in ascending lexical id order,
//! so when several shortest paths exist the reported one is deterministic
//! (favoring lexically smaller ids). The backing graph query this replaces
//! made no such guarantee; fixing one makes results reproducible.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use crate::model::{Edge, EdgeKind};
use crate::query::QueryEngine;

#[derive(Debug, Clone, Serialize)]
pub struct PathCharacter {
    pub id: String,
    pub name: String,
    pub faction: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PathConnection {
    pub subtype: Option<String>,
    pub movie: Option<String>,
}

/// Outcome of a shortest-path query. "No path" is a normal negative result,
/// serialized as `{found: false, message}` rather than an error.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PathResult {
    Found {
        found: bool,
        characters: Vec<PathCharacter>,
        connections: Vec<PathConnection>,
        degrees: usize,
    },
    NoPath {
        found: bool,
        message: String,
    },
}

impl PathResult {
    fn no_path(message: impl Into<String>) -> Self {
        PathResult::NoPath {
            found: false,
            message: message.into(),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, PathResult::Found { .. })
    }

    /// Path length in edges, when a path was found.
    pub fn degrees(&self) -> Option<usize> {
        match self {
            PathResult::Found { degrees, .. } => Some(*degrees),
            PathResult::NoPath { .. } => None,
        }
    }
}

pub struct PathFinder<'a> {
    engine: &'a QueryEngine,
}

impl<'a> PathFinder<'a> {
    pub fn new(engine: &'a QueryEngine) -> Self {
        Self { engine }
    }

    /// Minimum number of RELATIONSHIP edges ("degrees") connecting two
    /// characters, with the nodes and edges of one shortest path. Unknown
    /// endpoints and disconnected pairs both come back as `found: false`.
    pub fn shortest_path(&self, from: &str, to: &str) -> PathResult {
        let engine = self.engine;
        let (Some(start), Some(goal)) = (engine.node(from), engine.node(to)) else {
            return PathResult::no_path("No path found between these characters!");
        };
        if start.id == goal.id {
            return self.materialize(vec![start.id.clone()], Vec::new());
        }

        let start_id: &str = &start.id;
        let goal_id: &str = &goal.id;

        // prev[id] = (id we came from, edge taken)
        let mut prev: HashMap<&str, (&str, &Edge)> = HashMap::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        visited.insert(start_id);
        queue.push_back(start_id);
        let mut reached = false;

        'bfs: while let Some(current) = queue.pop_front() {
            let mut adjacent: Vec<(&str, &Edge)> = engine
                .neighbors(current)
                .into_iter()
                .filter(|(edge, _)| edge.kind == EdgeKind::Relationship)
                .map(|(edge, other)| (other.id.as_str(), edge))
                .collect();
            adjacent.sort_by(|a, b| a.0.cmp(b.0));

            for (next, edge) in adjacent {
                if !visited.insert(next) {
                    continue;
                }
                prev.insert(next, (current, edge));
                if next == goal_id {
                    reached = true;
                    break 'bfs;
                }
                queue.push_back(next);
            }
        }

        if !reached {
            return PathResult::no_path("No path found between these characters!");
        }

        let mut ids: Vec<String> = vec![goal_id.to_string()];
        let mut edges: Vec<&Edge> = Vec::new();
        let mut cursor = goal_id;
        while cursor != start_id {
            let (parent, edge) = prev[cursor];
            edges.push(edge);
            ids.push(parent.to_string());
            cursor = parent;
        }
        ids.reverse();
        edges.reverse();
        self.materialize(ids, edges)
    }

    fn materialize(&self, ids: Vec<String>, edges: Vec<&Edge>) -> PathResult {
        let characters = ids
            .iter()
            .filter_map(|id| self.engine.node(id))
            .map(|n| PathCharacter {
                id: n.id.clone(),
                name: n.primary_name().to_string(),
                faction: n.faction().map(str::to_string),
            })
            .collect();
        let connections: Vec<PathConnection> = edges
            .iter()
            .map(|e| PathConnection {
                subtype: e.subtype().map(str::to_string),
                movie: e.movie_ref().map(str::to_string),
            })
            .collect();
        let degrees = connections.len();
        PathResult::Found {
            found: true,
            characters,
            connections,
            degrees,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, EdgeKind, Label, Node, Snapshot};
    use crate::store::GraphStore;
    use std::sync::Arc;

    fn engine(edges: Vec<Edge>) -> QueryEngine {
        let nodes = vec![
            Node::new("m1", Label::Movie).with_prop("title", "M1"),
            Node::new("a", Label::Character)
                .with_prop("name", "A")
                .with_prop("faction", "Pirates"),
            Node::new("b", Label::Character).with_prop("name", "B"),
            Node::new("c", Label::Character).with_prop("name", "C"),
            Node::new("d", Label::Character).with_prop("name", "D"),
        ];
        let snap = Snapshot { nodes, edges };
        QueryEngine::new(Arc::new(GraphStore::from_snapshot(snap).unwrap()))
    }

    fn rel(a: &str, b: &str, subtype: &str) -> Edge {
        Edge::new(EdgeKind::Relationship, a, b)
            .with_prop("subtype", subtype)
            .with_prop("movie", "m1")
    }

    #[test]
    fn chain_of_two_edges_is_two_degrees() {
        let e = engine(vec![rel("a", "b", "ENEMY"), rel("b", "c", "ALLY")]);
        let result = PathFinder::new(&e).shortest_path("a", "c");
        match result {
            PathResult::Found {
                characters,
                connections,
                degrees,
                ..
            } => {
                assert_eq!(degrees, 2);
                let ids: Vec<&str> = characters.iter().map(|c| c.id.as_str()).collect();
                assert_eq!(ids, vec!["a", "b", "c"]);
                assert_eq!(connections[0].subtype.as_deref(), Some("ENEMY"));
                assert_eq!(connections[0].movie.as_deref(), Some("m1"));
            }
            PathResult::NoPath { .. } => panic!("expected a path"),
        }
    }

    #[test]
    fn relationship_edges_are_undirected() {
        // stored a -> b, but we search b -> a
        let e = engine(vec![rel("a", "b", "ENEMY")]);
        assert_eq!(PathFinder::new(&e).shortest_path("b", "a").degrees(), Some(1));
    }

    #[test]
    fn self_path_is_zero_degrees() {
        let e = engine(vec![rel("a", "b", "ENEMY")]);
        let result = PathFinder::new(&e).shortest_path("a", "a");
        assert_eq!(result.degrees(), Some(0));
        match result {
            PathResult::Found { characters, .. } => assert_eq!(characters.len(), 1),
            PathResult::NoPath { .. } => panic!("self path must be found"),
        }
    }

    #[test]
    fn other_edge_kinds_do_not_connect() {
        // a and c both appear in m1, but share no relationship edges
        let e = engine(vec![
            Edge::new(EdgeKind::AppearsIn, "a", "m1"),
            Edge::new(EdgeKind::AppearsIn, "c", "m1"),
        ]);
        assert!(!PathFinder::new(&e).shortest_path("a", "c").is_found());
    }

    #[test]
    fn unknown_endpoint_is_a_negative_result_not_an_error() {
        let e = engine(vec![rel("a", "b", "ENEMY")]);
        assert!(!PathFinder::new(&e).shortest_path("a", "zzz").is_found());
    }

    #[test]
    fn tie_break_is_lexical_and_deterministic() {
        // two shortest paths a-b-d and a-c-d; expansion order favors b
        let edges = vec![
            rel("a", "b", "ALLY"),
            rel("a", "c", "ALLY"),
            rel("b", "d", "ALLY"),
            rel("c", "d", "ALLY"),
        ];
        let e = engine(edges);
        for _ in 0..3 {
            let result = PathFinder::new(&e).shortest_path("a", "d");
            match &result {
                PathResult::Found { characters, .. } => {
                    let ids: Vec<&str> = characters.iter().map(|c| c.id.as_str()).collect();
                    assert_eq!(ids, vec!["a", "b", "d"]);
                }
                PathResult::NoPath { .. } => panic!("expected a path"),
            }
        }
    }

    #[test]
    fn degrees_match_independent_bfs_on_a_chain() {
        let e = engine(vec![
            rel("a", "b", "ALLY"),
            rel("b", "c", "ALLY"),
            rel("c", "d", "ALLY"),
        ]);
        let finder = PathFinder::new(&e);
        assert_eq!(finder.shortest_path("a", "b").degrees(), Some(1));
        assert_eq!(finder.shortest_path("a", "c").degrees(), Some(2));
        assert_eq!(finder.shortest_path("a", "d").degrees(), Some(3));
    }
}
