use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::graph::Node;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchHit {
    pub id: String,
    pub score: i64,
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Ranks nodes by fuzzy match against label, then description. Best first,
/// ties keep node order. An empty query matches nothing.
pub fn search_nodes(nodes: &[Node], query: &str, limit: usize) -> Vec<SearchHit> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut hits = nodes
        .iter()
        .filter_map(|node| {
            let label = fuzzy_match_score(&matcher, &node.label, query);
            // Description matches rank below any label match of similar quality.
            let description = fuzzy_match_score(&matcher, &node.description, query).map(|score| score / 2);
            label.max(description).map(|score| SearchHit {
                id: node.id.clone(),
                score,
            })
        })
        .collect::<Vec<_>>();

    hits.sort_by(|a, b| b.score.cmp(&a.score));
    hits.truncate(limit);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeType;

    #[test]
    fn label_matches_rank_first() {
        let nodes = vec![
            Node::new("1", "Photosynthesis", NodeType::Concept),
            Node::new("2", "Plant", NodeType::Entity).with_description("performs photosynthesis"),
            Node::new("3", "Ocean", NodeType::Place),
        ];

        let hits = search_nodes(&nodes, "photo", 10);
        assert_eq!(hits.first().map(|hit| hit.id.as_str()), Some("1"));
        assert!(hits.iter().all(|hit| hit.id != "3"));
    }

    #[test]
    fn empty_query_and_limit() {
        let nodes = vec![
            Node::new("1", "Alpha", NodeType::Concept),
            Node::new("2", "Alphabet", NodeType::Concept),
        ];
        assert!(search_nodes(&nodes, "  ", 10).is_empty());
        assert_eq!(search_nodes(&nodes, "alp", 1).len(), 1);
    }
}
