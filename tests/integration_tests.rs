//! Integration tests for the complete Corsair read path:
//! snapshot file → GraphStore → QueryEngine → path/aggregate/search/sample.
//!
//! Run with: cargo test --test integration_tests

use std::path::PathBuf;
use std::sync::Arc;

use corsair_graph::{
    Aggregator, Edge, EdgeKind, GraphStore, Label, Node, PathFinder, PathResult, QueryEngine,
    Sampler, SearchIndex, Snapshot, TallyCounter,
};

fn demo_snapshot_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/caribbean.json")
}

fn demo_engine() -> QueryEngine {
    let snapshot = Snapshot::from_json_file(demo_snapshot_path()).expect("demo snapshot loads");
    QueryEngine::new(Arc::new(
        GraphStore::from_snapshot(snapshot).expect("demo snapshot validates"),
    ))
}

// ============================================================================
// Snapshot loading
// ============================================================================

#[test]
fn demo_snapshot_loads_and_validates() {
    let engine = demo_engine();
    assert_eq!(engine.nodes_of(Label::Character).count(), 9);
    assert_eq!(engine.nodes_of(Label::Ship).count(), 4);
    assert_eq!(engine.nodes_of(Label::Location).count(), 5);
    assert_eq!(engine.nodes_of(Label::Movie).count(), 3);
}

#[test]
fn missing_snapshot_file_is_store_unavailable() {
    let err = Snapshot::from_json_file("no/such/snapshot.json").unwrap_err();
    assert!(matches!(
        err,
        corsair_graph::GraphError::StoreUnavailable { .. }
    ));
}

// ============================================================================
// Query operations over the demo graph
// ============================================================================

#[test]
fn characters_are_name_sorted() {
    let rows = demo_engine().characters();
    let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
    assert_eq!(rows[0].name, "Cutler Beckett");
}

#[test]
fn rivalries_are_sorted_by_release_year() {
    let rows = demo_engine().rivalries(None);
    assert_eq!(rows.len(), 9);
    assert_eq!(rows[0].movie, "The Curse of the Black Pearl");
    assert_eq!(rows[0].conflict_type, "ENEMY");
    let years_ok = rows.windows(2).all(|w| w[0].movie_id <= w[1].movie_id);
    assert!(years_ok, "rows must be grouped by ascending release year");
}

#[test]
fn faction_breakdown_sums_to_character_total() {
    let engine = demo_engine();
    let groups = engine.faction_breakdown(None);
    let total: usize = groups.iter().map(|g| g.member_count).sum();
    assert_eq!(total, engine.characters().len());
    assert_eq!(groups[0].faction, "Pirates");
    assert_eq!(groups[0].member_count, 4);
}

#[test]
fn full_graph_export_matches_store_counts() {
    let engine = demo_engine();
    let export = engine.full_graph();
    assert_eq!(export.nodes.len(), engine.node_count());
    assert_eq!(export.edges.len(), engine.edge_count());
}

// ============================================================================
// PathFinder
// ============================================================================

#[test]
fn degrees_of_separation_across_the_demo_graph() {
    let engine = demo_engine();
    let finder = PathFinder::new(&engine);

    // jack -> davy (ENEMY) -> tia (ROMANCE)
    let result = finder.shortest_path("jack_sparrow", "tia_dalma");
    assert_eq!(result.degrees(), Some(2));

    let self_path = finder.shortest_path("jack_sparrow", "jack_sparrow");
    assert_eq!(self_path.degrees(), Some(0));

    // ships are never reachable over RELATIONSHIP edges
    assert!(!finder.shortest_path("jack_sparrow", "black_pearl").is_found());
}

#[test]
fn spec_triangle_of_two_movies_one_rivalry() {
    // A-B (ENEMY, m1), B-C (ALLY, m1): A..C is 2 degrees, one rivalry
    let snap = Snapshot {
        nodes: vec![
            Node::new("m1", Label::Movie)
                .with_prop("title", "M1")
                .with_prop("release_year", 2000),
            Node::new("a", Label::Character)
                .with_prop("name", "A")
                .with_prop("faction", "Pirates"),
            Node::new("b", Label::Character)
                .with_prop("name", "B")
                .with_prop("faction", "Navy"),
            Node::new("c", Label::Character)
                .with_prop("name", "C")
                .with_prop("faction", "Pirates"),
        ],
        edges: vec![
            Edge::new(EdgeKind::Relationship, "a", "b")
                .with_prop("subtype", "ENEMY")
                .with_prop("movie", "m1"),
            Edge::new(EdgeKind::Relationship, "b", "c")
                .with_prop("subtype", "ALLY")
                .with_prop("movie", "m1"),
        ],
    };
    let engine = QueryEngine::new(Arc::new(GraphStore::from_snapshot(snap).unwrap()));

    match PathFinder::new(&engine).shortest_path("a", "c") {
        PathResult::Found {
            characters,
            degrees,
            ..
        } => {
            assert_eq!(degrees, 2);
            let ids: Vec<&str> = characters.iter().map(|c| c.id.as_str()).collect();
            assert_eq!(ids, vec!["a", "b", "c"]);
        }
        PathResult::NoPath { .. } => panic!("a and c are connected through b"),
    }

    let rivalries = engine.rivalries(Some("m1"));
    assert_eq!(rivalries.len(), 1);
    assert_eq!(rivalries[0].char1_id, "a");
    assert_eq!(rivalries[0].char2_id, "b");
    assert_eq!(rivalries[0].conflict_type, "ENEMY");

    let total: usize = engine
        .faction_breakdown(None)
        .iter()
        .map(|g| g.member_count)
        .sum();
    assert_eq!(total, 3);
}

// ============================================================================
// Aggregator
// ============================================================================

#[test]
fn leaderboard_over_the_demo_graph() {
    let engine = demo_engine();
    let board = Aggregator::new(&engine).leaderboard();

    assert_eq!(board.most_connected[0].name, "Jack Sparrow");
    assert_eq!(board.most_connected[0].count, 8);

    assert_eq!(board.most_enemies[0].name, "Jack Sparrow");
    assert_eq!(board.most_enemies[0].count, 6);

    // three characters appear in all three movies; ties break by name
    assert_eq!(board.most_appearances[0].name, "Elizabeth Swann");
    assert_eq!(board.most_appearances[0].count, 3);

    // the pearl reaches four distinct locations (tortuga counted once)
    assert_eq!(board.most_traveled_ships[0].name, "Black Pearl");
    assert_eq!(board.most_traveled_ships[0].count, 4);
    assert_eq!(
        board.most_traveled_ships[0].captain.as_deref(),
        Some("Jack Sparrow")
    );

    for ranking in [
        &board.most_connected,
        &board.most_enemies,
        &board.most_appearances,
        &board.most_traveled_ships,
    ] {
        assert!(ranking.len() <= 5);
        assert!(ranking.windows(2).all(|w| w[0].count >= w[1].count));
    }
}

// ============================================================================
// Search
// ============================================================================

#[test]
fn search_spans_labels_and_respects_the_cap() {
    let engine = demo_engine();
    let index = SearchIndex::new(&engine);

    let hits = index.search("pearl");
    assert_eq!(hits.len(), 2); // the ship and the first movie
    for hit in &hits {
        assert!(hit.name.to_lowercase().contains("pearl"));
    }

    assert!(index.search("").is_empty());
    assert!(index.search("kraken").is_empty());

    let captains = index.search("captain");
    assert!(!captains.is_empty()); // role field matches
    assert!(captains.len() <= SearchIndex::MAX_HITS);
}

// ============================================================================
// Sampler + tally counter
// ============================================================================

#[test]
fn seeded_sampling_is_reproducible_over_the_demo_graph() {
    let a = Sampler::with_seed(demo_engine(), 42);
    let b = Sampler::with_seed(demo_engine(), 42);
    for _ in 0..5 {
        assert_eq!(
            a.pick(Label::Ship).unwrap().id,
            b.pick(Label::Ship).unwrap().id
        );
    }

    let antagonist = a
        .pick_where(Label::Character, |n| {
            matches!(
                n.faction(),
                Some("Royal Navy") | Some("East India Trading Company") | Some("Cursed")
            )
        })
        .unwrap();
    assert_ne!(antagonist.faction(), Some("Pirates"));
}

#[test]
fn tally_counter_survives_a_thundering_herd() {
    let counter = Arc::new(TallyCounter::new());
    let handles: Vec<_> = (0..64)
        .map(|_| {
            let counter = counter.clone();
            std::thread::spawn(move || counter.increment())
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(counter.read(), 64);
}
