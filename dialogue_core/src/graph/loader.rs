//! We store dialogue graphs in TOML files.
//! Here we parse that into [`DialogueGraph`].

use serde::Deserialize;
use tracing::debug;

use super::{Condition, DialogueGraph, DialogueNode, GraphError, NodeId, NodeKind};

#[derive(Debug, Deserialize)]
struct ParsedToml {
    graph: ParsedHeader,

    #[serde(default, rename = "node")]
    nodes: Vec<ParsedNode>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ParsedHeader {
    name: String,
    /// Table used by nodes that name a row but no table.
    #[serde(default)]
    table: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ParsedNode {
    name: String,
    kind: NodeKind,
    table: Option<String>,
    row: Option<String>,
    auto_start: Option<bool>,
    #[serde(default)]
    conditions: Vec<Condition>,
    target: Option<String>,
    #[serde(default)]
    next: Vec<String>,
}

impl ParsedNode {
    fn check_fields(&self) -> Result<(), GraphError> {
        let unexpected = |field| {
            Err(GraphError::UnexpectedField {
                node: self.name.clone(),
                kind: self.kind,
                field,
            })
        };

        if !self.kind.is_dialogue() {
            if self.row.is_some() {
                return unexpected("row");
            }
            if self.table.is_some() {
                return unexpected("table");
            }
        }
        if self.kind != NodeKind::Return && self.target.is_some() {
            return unexpected("target");
        }
        Ok(())
    }
}

impl DialogueGraph {
    /// Parse a graph from its TOML representation.
    ///
    /// 1. Create every node, with IDs derived from graph and node names.
    ///    Only Lead and Answer nodes may name a row, and only Return nodes
    ///    a target.
    /// 2. Resolve Return targets.
    /// 3. Add edges, which checks the connection rules.
    pub fn from_toml_str(source: &str) -> Result<Self, GraphError> {
        let ParsedToml { graph: header, nodes } = toml::from_str(source)?;
        let mut graph = DialogueGraph::new(header.name);

        //
        // 1.
        //
        for parsed in &nodes {
            parsed.check_fields()?;
            let mut node = DialogueNode::new(parsed.name.clone(), parsed.kind)
                .with_id(NodeId::from_name(&graph.name, &parsed.name));

            if let Some(row) = &parsed.row {
                let table = parsed
                    .table
                    .as_ref()
                    .or(header.table.as_ref())
                    .ok_or_else(|| GraphError::MissingTable(parsed.name.clone()))?;
                node = node.with_row(table.clone(), row.clone());
            }
            if let Some(auto_start) = parsed.auto_start {
                node = node.with_auto_start(auto_start);
            }
            node.conditions = parsed.conditions.clone();

            graph.add_node(node)?;
        }

        //
        // 2.
        //
        for parsed in &nodes {
            let Some(target_name) = &parsed.target else {
                continue;
            };
            let target = graph.id_by_name(target_name)?;
            let id = graph.id_by_name(&parsed.name)?;
            if let Some(node) = graph.node_mut(id) {
                node.target = Some(target);
            }
        }

        //
        // 3.
        //
        for parsed in &nodes {
            let from = graph.id_by_name(&parsed.name)?;
            for next in &parsed.next {
                let to = graph.id_by_name(next)?;
                graph.connect(from, to)?;
            }
        }

        debug!(
            "Loaded graph '{}' with {} nodes",
            graph.name,
            graph.node_count()
        );
        Ok(graph)
    }

    fn id_by_name(&self, name: &str) -> Result<NodeId, GraphError> {
        self.find_by_name(name)
            .map(|n| n.id)
            .ok_or_else(|| GraphError::UnknownNodeName(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ConnectionRejection;

    const INN: &str = r#"
[graph]
name = "innkeeper"
table = "inn"

[[node]]
name = "start"
kind = "start"
next = ["greeting"]

[[node]]
name = "greeting"
kind = "lead"
row = "greeting"
next = ["ask_rumors", "leave"]

[[node]]
name = "ask_rumors"
kind = "answer"
row = "ask_rumors"
conditions = [{ type = "not_visited" }]
next = ["rumors"]

[[node]]
name = "rumors"
kind = "lead"
table = "gossip"
row = "rumors"
auto_start = false
next = ["back"]

[[node]]
name = "back"
kind = "return"
target = "greeting"

[[node]]
name = "leave"
kind = "answer"
row = "leave"
next = ["end"]

[[node]]
name = "end"
kind = "complete"
"#;

    #[test]
    fn test_load_graph() {
        let graph = DialogueGraph::from_toml_str(INN).unwrap();
        assert_eq!(graph.name, "innkeeper");
        assert_eq!(graph.node_count(), 7);

        let start = graph.start_node().unwrap();
        assert_eq!(start, NodeId::from_name("innkeeper", "start"));

        let greeting = graph.find_by_name("greeting").unwrap();
        assert_eq!(graph.children(start), &[greeting.id]);
        assert_eq!(
            greeting.children,
            vec![
                NodeId::from_name("innkeeper", "ask_rumors"),
                NodeId::from_name("innkeeper", "leave"),
            ]
        );
        assert!(greeting.auto_starts);
        assert_eq!(greeting.row.as_ref().unwrap().table, "inn");

        let rumors = graph.find_by_name("rumors").unwrap();
        assert!(!rumors.auto_starts);
        assert_eq!(rumors.row.as_ref().unwrap().table, "gossip");

        let ask = graph.find_by_name("ask_rumors").unwrap();
        assert_eq!(ask.conditions, vec![Condition::NotVisited]);
        assert!(!ask.auto_starts);

        let back = graph.find_by_name("back").unwrap();
        assert_eq!(back.target, Some(greeting.id));
    }

    #[test]
    fn test_ids_are_stable_across_loads() {
        let a = DialogueGraph::from_toml_str(INN).unwrap();
        let b = DialogueGraph::from_toml_str(INN).unwrap();
        assert_eq!(a.start_node(), b.start_node());
        assert_eq!(
            a.find_by_name("leave").map(|n| n.id),
            b.find_by_name("leave").map(|n| n.id)
        );
    }

    #[test]
    fn test_unknown_next() {
        let source = r#"
[graph]
name = "g"

[[node]]
name = "start"
kind = "start"
next = ["nowhere"]
"#;
        let err = DialogueGraph::from_toml_str(source).unwrap_err();
        assert!(matches!(err, GraphError::UnknownNodeName(name) if name == "nowhere"));
    }

    #[test]
    fn test_unknown_target() {
        let source = r#"
[graph]
name = "g"

[[node]]
name = "back"
kind = "return"
target = "ghost"
"#;
        let err = DialogueGraph::from_toml_str(source).unwrap_err();
        assert!(matches!(err, GraphError::UnknownNodeName(name) if name == "ghost"));
    }

    #[test]
    fn test_duplicate_names() {
        let source = r#"
[graph]
name = "g"

[[node]]
name = "a"
kind = "lead"

[[node]]
name = "a"
kind = "answer"
"#;
        let err = DialogueGraph::from_toml_str(source).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateName(name) if name == "a"));
    }

    #[test]
    fn test_disallowed_connection() {
        let source = r#"
[graph]
name = "g"

[[node]]
name = "end"
kind = "complete"
next = ["line"]

[[node]]
name = "line"
kind = "lead"
"#;
        let err = DialogueGraph::from_toml_str(source).unwrap_err();
        assert!(matches!(
            err,
            GraphError::ConnectionRejected {
                reason: ConnectionRejection::TerminalParent(NodeKind::Complete),
                ..
            }
        ));
    }

    #[test]
    fn test_row_without_table() {
        let source = r#"
[graph]
name = "g"

[[node]]
name = "line"
kind = "lead"
row = "hello"
"#;
        let err = DialogueGraph::from_toml_str(source).unwrap_err();
        assert!(matches!(err, GraphError::MissingTable(name) if name == "line"));
    }

    #[test]
    fn test_fields_checked_against_kind() {
        let stray_target = r#"
[graph]
name = "g"

[[node]]
name = "line"
kind = "lead"
target = "line"
"#;
        let err = DialogueGraph::from_toml_str(stray_target).unwrap_err();
        assert!(matches!(
            err,
            GraphError::UnexpectedField { node, kind: NodeKind::Lead, field: "target" } if node == "line"
        ));

        let stray_row = r#"
[graph]
name = "g"
table = "inn"

[[node]]
name = "end"
kind = "complete"
row = "greeting"
"#;
        let err = DialogueGraph::from_toml_str(stray_row).unwrap_err();
        assert!(matches!(
            err,
            GraphError::UnexpectedField { kind: NodeKind::Complete, field: "row", .. }
        ));

        let stray_table = "[graph]\nname = \"g\"\n[[node]]\nname = \"s\"\nkind = \"start\"\ntable = \"inn\"\n";
        assert!(matches!(
            DialogueGraph::from_toml_str(stray_table),
            Err(GraphError::UnexpectedField { field: "table", .. })
        ));
    }

    #[test]
    fn test_unknown_field_and_kind() {
        let typo = "[graph]\nname = \"g\"\n[[node]]\nname = \"a\"\nkind = \"lead\"\nnxt = []\n";
        assert!(matches!(
            DialogueGraph::from_toml_str(typo),
            Err(GraphError::Toml(_))
        ));

        let bad_kind = "[graph]\nname = \"g\"\n[[node]]\nname = \"a\"\nkind = \"speech\"\n";
        assert!(matches!(
            DialogueGraph::from_toml_str(bad_kind),
            Err(GraphError::Toml(_))
        ));
    }
}
