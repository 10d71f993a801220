//! Corsair graph core: read-only analytical queries over a small themed
//! knowledge graph (characters, ships, locations, movies).
//!
//! The entire node/edge set is loaded once from a backing snapshot and
//! treated as immutable for the life of the process. Everything above the
//! store is a pure read path:
//!
//! - [`GraphStore`]: the immutable snapshot plus label/kind/id/adjacency
//!   indexes.
//! - [`QueryEngine`]: listing, filtering, neighbor expansion and full-graph
//!   export. All access to the store goes through it.
//! - [`PathFinder`]: breadth-first shortest paths over relationship edges.
//! - [`Aggregator`]: ranked top-K leaderboards.
//! - [`SearchIndex`]: case-insensitive substring search over node names.
//! - [`Sampler`]: seedable uniform sampling, plus the process-wide tally
//!   counter used by narrative features.
//!
//! The higher components depend only on [`QueryEngine`]'s read contract,
//! never on the store's internal representation, so the traversal and
//! ranking algorithms stay independent of how the snapshot is indexed.

pub mod aggregate;
pub mod error;
pub mod model;
pub mod path;
pub mod query;
pub mod sample;
pub mod search;
pub mod store;

pub use aggregate::{Aggregator, Leaderboard, RankedEntry};
pub use error::GraphError;
pub use model::{Edge, EdgeKind, Label, Node, Snapshot, CONFLICT_SUBTYPES, ENEMY_SUBTYPES};
pub use path::{PathFinder, PathResult};
pub use query::QueryEngine;
pub use sample::{Sampler, TallyCounter};
pub use search::{SearchHit, SearchIndex};
pub use store::GraphStore;
