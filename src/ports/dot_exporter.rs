//! DOT Exporter
//!
//! Writes a Graph as Graphviz DOT text.

use crate::domain::graph::{Attrs, Graph};
use crate::ports::OutputExporter;

pub struct DotExporter;

impl OutputExporter for DotExporter {
    fn export(&self, graph: &Graph) -> anyhow::Result<Vec<u8>> {
        Ok(Self::to_dot(graph).into_bytes())
    }
}

impl DotExporter {
    /// Convert a Graph to DOT text.
    pub fn to_dot(graph: &Graph) -> String {
        let mut lines = Vec::new();

        let (keyword, arrow) = if graph.directed {
            ("digraph", "->")
        } else {
            ("graph", "--")
        };
        lines.push(format!("{} {} {{", keyword, Self::id(&graph.name)));
        lines.push("    node [shape=box, fontname=\"Helvetica\", fontsize=10];".to_string());
        lines.push("    edge [fontname=\"Helvetica\", fontsize=9];".to_string());
        lines.push("".to_string());

        for node in &graph.nodes {
            lines.push(format!("    {}{};", Self::id(&node.id), Self::attrs(&node.attrs)));
        }

        lines.push("".to_string());

        for edge in &graph.edges {
            lines.push(format!(
                "    {} {} {}{};",
                Self::id(&edge.from),
                arrow,
                Self::id(&edge.to),
                Self::attrs(&edge.attrs)
            ));
        }

        lines.push("}".to_string());
        lines.push("".to_string());

        lines.join("\n")
    }

    /// Attribute values are stored DOT-encoded already and written verbatim.
    fn attrs(attrs: &Attrs) -> String {
        if attrs.is_empty() {
            return String::new();
        }
        let pairs: Vec<String> = attrs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        format!(" [{}]", pairs.join(", "))
    }

    /// Quote an identifier unless it is a plain DOT ID.
    fn id(id: &str) -> String {
        let plain = id
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if plain {
            id.to_string()
        } else {
            format!("\"{}\"", id.replace('\\', "\\\\").replace('"', "\\\""))
        }
    }
}
