//! Ranked top-K aggregation ("leaderboards") over nodes and their incident
//! edges.
//!
//! All four rankings share one shape: count something per node, keep nodes
//! with a non-zero count, sort by count descending with ties broken by name
//! ascending, truncate to five. Note the enemy ranking counts the narrower
//! subtype set (no MISTRUST) while rivalry filtering counts the full
//! conflict set; the source system was asymmetric here on purpose.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::{EdgeKind, Label, Node, ENEMY_SUBTYPES};
use crate::query::QueryEngine;

/// One leaderboard row. Characters report their faction, ships their
/// captain.
#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captain: Option<String>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Leaderboard {
    pub most_connected: Vec<RankedEntry>,
    pub most_enemies: Vec<RankedEntry>,
    pub most_appearances: Vec<RankedEntry>,
    pub most_traveled_ships: Vec<RankedEntry>,
}

pub struct Aggregator<'a> {
    engine: &'a QueryEngine,
}

impl<'a> Aggregator<'a> {
    pub const TOP_K: usize = 5;

    pub fn new(engine: &'a QueryEngine) -> Self {
        Self { engine }
    }

    pub fn leaderboard(&self) -> Leaderboard {
        Leaderboard {
            most_connected: self.most_connected(),
            most_enemies: self.most_enemies(),
            most_appearances: self.most_appearances(),
            most_traveled_ships: self.most_traveled_ships(),
        }
    }

    /// Characters by incident RELATIONSHIP edges, either direction.
    pub fn most_connected(&self) -> Vec<RankedEntry> {
        self.top_by_count(Label::Character, character_entry, |node| {
            self.engine
                .neighbors(&node.id)
                .iter()
                .filter(|(e, _)| e.kind == EdgeKind::Relationship)
                .count()
        })
    }

    /// Characters by incident RELATIONSHIP edges with an antagonistic
    /// subtype (ENEMY / RIVALRY / BETRAYED).
    pub fn most_enemies(&self) -> Vec<RankedEntry> {
        self.top_by_count(Label::Character, character_entry, |node| {
            self.engine
                .neighbors(&node.id)
                .iter()
                .filter(|(e, _)| {
                    e.kind == EdgeKind::Relationship
                        && e.subtype().map(|s| ENEMY_SUBTYPES.contains(&s)).unwrap_or(false)
                })
                .count()
        })
    }

    /// Characters by outgoing APPEARS_IN edges.
    pub fn most_appearances(&self) -> Vec<RankedEntry> {
        self.top_by_count(Label::Character, character_entry, |node| {
            self.engine
                .neighbors(&node.id)
                .iter()
                .filter(|(e, _)| e.kind == EdgeKind::AppearsIn && e.source == node.id)
                .count()
        })
    }

    /// Ships by *distinct* locations reached via outgoing ROUTE edges.
    pub fn most_traveled_ships(&self) -> Vec<RankedEntry> {
        self.top_by_count(Label::Ship, ship_entry, |node| {
            let distinct: BTreeSet<&str> = self
                .engine
                .neighbors(&node.id)
                .iter()
                .filter(|(e, _)| e.kind == EdgeKind::Route && e.source == node.id)
                .map(|(_, location)| location.id.as_str())
                .collect();
            distinct.len()
        })
    }

    /// The generic ranking: count per node of `label`, drop zero counts,
    /// sort by count descending then name ascending, keep the top five.
    fn top_by_count(
        &self,
        label: Label,
        entry: fn(&Node, usize) -> RankedEntry,
        count: impl Fn(&Node) -> usize,
    ) -> Vec<RankedEntry> {
        let mut ranked: Vec<RankedEntry> = self
            .engine
            .nodes_of(label)
            .filter_map(|node| {
                let n = count(node);
                (n > 0).then(|| entry(node, n))
            })
            .collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        ranked.truncate(Self::TOP_K);
        ranked
    }
}

fn character_entry(node: &Node, count: usize) -> RankedEntry {
    RankedEntry {
        name: node.primary_name().to_string(),
        faction: node.faction().map(str::to_string),
        captain: None,
        count,
    }
}

fn ship_entry(node: &Node, count: usize) -> RankedEntry {
    RankedEntry {
        name: node.primary_name().to_string(),
        faction: None,
        captain: node.prop_str("captain").map(str::to_string),
        count,
    }
}
