use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use seedgraph::expansion::{ExpansionError, NodeContext, Suggestion, TemplateProvider};
use seedgraph::notify::ToastKind;
use seedgraph::{Explorer, ExplorerConfig, GraphData, Link, Node, NodeType};

fn explorer() -> Explorer {
    let config = ExplorerConfig {
        discovery_interval_ms: 0,
        discovery_rounds: 2,
        ..ExplorerConfig::default()
    };
    let root = GraphData {
        nodes: vec![
            Node::new("a", "Photosynthesis", NodeType::Concept).as_root(),
            Node::new("b", "Chlorophyll", NodeType::Entity),
        ],
        links: vec![Link::new("a", "b", "uses")],
    };
    Explorer::with_root(config, root)
}

/// Polls until the explorer has no background jobs left.
fn settle_background(explorer: &mut Explorer) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while explorer.has_pending_work() && Instant::now() < deadline {
        explorer.poll_background();
        thread::sleep(Duration::from_millis(2));
    }
    explorer.poll_background();
}

#[test]
fn expansion_adds_confirmed_nodes_and_reseeds() {
    let mut explorer = explorer();
    explorer.set_provider(Arc::new(TemplateProvider));
    explorer.expand_node("a").unwrap();
    settle_background(&mut explorer);

    assert!(explorer.store().find_by_label("Origin of Photosynthesis").is_some());
    assert!(explorer.store().nodes().iter().all(|node| !node.is_ghost));
    assert_eq!(explorer.engine().body_count(), explorer.store().node_count());
    assert!(
        explorer
            .toasts()
            .active()
            .iter()
            .any(|toast| toast.kind == ToastKind::Info)
    );
}

#[test]
fn repeated_expansion_does_not_duplicate_labels() {
    let mut explorer = explorer();
    explorer.set_provider(Arc::new(TemplateProvider));
    explorer.expand_node("a").unwrap();
    settle_background(&mut explorer);
    let count = explorer.store().node_count();

    explorer.expand_node("a").unwrap();
    settle_background(&mut explorer);
    assert_eq!(explorer.store().node_count(), count);
}

#[test]
fn provider_failure_surfaces_a_toast_and_changes_nothing() {
    let mut explorer = explorer();
    explorer.set_provider(Arc::new(
        |_: &NodeContext| -> Result<Vec<Suggestion>, ExpansionError> {
            Err(ExpansionError::Provider("service unavailable".into()))
        },
    ));
    let before = explorer.store().snapshot();

    explorer.expand_node("a").unwrap();
    settle_background(&mut explorer);

    assert_eq!(explorer.store().snapshot(), before);
    let toast = explorer.toasts().active().last().unwrap();
    assert_eq!(toast.kind, ToastKind::Error);
    assert!(toast.message.contains("service unavailable"));
}

#[test]
fn empty_suggestions_are_a_silent_no_op() {
    let mut explorer = explorer();
    explorer.set_provider(Arc::new(
        |_: &NodeContext| -> Result<Vec<Suggestion>, ExpansionError> { Ok(Vec::new()) },
    ));
    let before = explorer.store().snapshot();

    explorer.expand_node("a").unwrap();
    settle_background(&mut explorer);

    assert_eq!(explorer.store().snapshot(), before);
    assert!(explorer.toasts().is_empty());
}

#[test]
fn discovery_adds_ghosts_that_can_be_confirmed_or_discarded() {
    let mut explorer = explorer();
    explorer.set_provider(Arc::new(TemplateProvider));
    explorer.click_node("a", false);
    explorer.start_discovery().unwrap();
    settle_background(&mut explorer);

    let ghosts = explorer
        .store()
        .nodes()
        .iter()
        .filter(|node| node.is_ghost)
        .map(|node| node.id.clone())
        .collect::<Vec<_>>();
    assert!(!ghosts.is_empty());

    explorer.confirm_ghost(&ghosts[0]).unwrap();
    let discarded = explorer.discard_ghosts();
    assert_eq!(discarded, ghosts.len() - 1);
    assert!(explorer.store().contains(&ghosts[0]));
    assert!(explorer.store().nodes().iter().all(|node| !node.is_ghost));
    assert!(explorer.store().data().is_consistent());
}

#[test]
fn navigating_away_discards_in_flight_results() {
    let mut explorer = explorer();
    explorer.set_provider(Arc::new(
        |context: &NodeContext| -> Result<Vec<Suggestion>, ExpansionError> {
            thread::sleep(Duration::from_millis(30));
            Ok(vec![Suggestion::new(
                format!("Late idea about {}", context.node.label),
                NodeType::Concept,
                "suggests",
            )])
        },
    ));
    explorer.expand_node("a").unwrap();
    explorer.enter_sub_graph("a").unwrap();
    settle_background(&mut explorer);
    explorer.navigate_to_root();

    assert!(explorer.store().find_by_label("Late idea about Photosynthesis").is_none());
    let nested = explorer.store().node("a").unwrap().sub_graph.clone().unwrap();
    assert!(nested.nodes.iter().all(|node| !node.label.starts_with("Late idea")));
}

#[test]
fn stopping_discovery_discards_later_rounds() {
    let mut explorer = explorer();
    explorer.set_provider(Arc::new(
        |_: &NodeContext| -> Result<Vec<Suggestion>, ExpansionError> {
            thread::sleep(Duration::from_millis(20));
            Ok(vec![Suggestion::new("Never applied", NodeType::Concept, "x")])
        },
    ));
    explorer.start_discovery().unwrap();
    assert!(explorer.is_discovering());
    explorer.stop_discovery();
    assert!(!explorer.is_discovering());
    settle_background(&mut explorer);

    assert!(explorer.store().find_by_label("Never applied").is_none());
}

#[test]
fn seed_file_round_trip_through_explorer() {
    let mut explorer = explorer();
    explorer.enter_sub_graph("a").unwrap();
    explorer.create_node("Inner", NodeType::Question).unwrap();
    for _ in 0..10 {
        explorer.tick();
    }
    let file = explorer.to_seed_file("demo");

    let mut restored = Explorer::from_seed_file(file, ExplorerConfig::default()).unwrap();
    assert_eq!(restored.workspace().depth(), 1);
    assert!(restored.store().find_by_label("Inner").is_some());
    assert!(restored.store().nodes().iter().all(|node| node.layout.is_some()));

    restored.navigate_to_root();
    let nested = restored.store().node("a").unwrap().sub_graph.clone().unwrap();
    assert!(nested.nodes.iter().any(|node| node.label == "Inner"));
}
