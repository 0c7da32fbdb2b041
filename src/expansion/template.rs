use crate::graph::NodeType;

use super::{ExpansionError, ExpansionProvider, NodeContext, Suggestion};

/// Offline provider that proposes fixed follow-up nodes per node type.
///
/// Repeated expansion of the same node yields the same labels, which
/// `apply_suggestions` resolves to the existing nodes.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateProvider;

impl TemplateProvider {
    fn templates(node_type: NodeType) -> &'static [(&'static str, NodeType, &'static str)] {
        match node_type {
            NodeType::Concept => &[
                ("Origin of {}", NodeType::Event, "originated in"),
                ("Example of {}", NodeType::Entity, "exemplified by"),
                ("Open questions about {}", NodeType::Question, "raises"),
            ],
            NodeType::Entity => &[
                ("Parts of {}", NodeType::Concept, "composed of"),
                ("Uses of {}", NodeType::Concept, "used for"),
            ],
            NodeType::Event => &[
                ("Causes of {}", NodeType::Concept, "caused by"),
                ("Consequences of {}", NodeType::Concept, "led to"),
                ("Location of {}", NodeType::Place, "took place in"),
            ],
            NodeType::Person => &[
                ("Work of {}", NodeType::Concept, "known for"),
                ("Contemporaries of {}", NodeType::Person, "worked with"),
            ],
            NodeType::Place => &[
                ("History of {}", NodeType::Event, "shaped by"),
                ("People of {}", NodeType::Person, "home of"),
            ],
            NodeType::Question => &[
                ("Answers to {}", NodeType::Concept, "answered by"),
                ("Evidence on {}", NodeType::Source, "informed by"),
            ],
            NodeType::Source => &[("Claims in {}", NodeType::Concept, "asserts")],
            NodeType::Trace => &[],
        }
    }
}

impl ExpansionProvider for TemplateProvider {
    fn expand(&self, context: &NodeContext) -> Result<Vec<Suggestion>, ExpansionError> {
        let label = context.node.label.trim();
        if label.is_empty() {
            return Err(ExpansionError::Provider(format!(
                "node `{}` has no label to expand",
                context.node.id
            )));
        }

        let mut suggestions = Self::templates(context.node.node_type)
            .iter()
            .map(|(pattern, node_type, relation)| {
                Suggestion::new(pattern.replace("{}", label), *node_type, *relation)
            })
            .collect::<Vec<_>>();

        if context.node.node_type != NodeType::Trace {
            let path = context.path.join(" / ");
            suggestions.push(
                Suggestion::new(format!("Note on {label}"), NodeType::Trace, "annotated by")
                    .with_description(format!("Expanded from {path}")),
            );
        }
        Ok(suggestions)
    }
}
