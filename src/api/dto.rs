use serde::{Deserialize, Serialize};

use crate::domain::graph::{Graph, ATTR_LABEL};
use crate::ports::OutputExporter;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct GraphDto {
    pub name: String,
    pub directed: bool,
    pub nodes: Vec<NodeDto>,
    pub edges: Vec<EdgeDto>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct NodeDto {
    pub id: String,
    /// Kind of AST node, the first label line
    pub kind: String,
    /// Label text with DOT quoting and escapes removed
    pub label: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct EdgeDto {
    pub from: String,
    pub to: String,
    pub label: String,
}

impl From<&Graph> for GraphDto {
    fn from(g: &Graph) -> Self {
        let nodes = g
            .nodes
            .iter()
            .map(|n| {
                let label = n.attrs.get(ATTR_LABEL).map(|l| unquote(l)).unwrap_or_default();
                NodeDto {
                    id: n.id.clone(),
                    kind: label.lines().next().unwrap_or_default().to_string(),
                    label,
                }
            })
            .collect();

        let edges = g
            .edges
            .iter()
            .map(|e| EdgeDto {
                from: e.from.clone(),
                to: e.to.clone(),
                label: e.attrs.get(ATTR_LABEL).map(|l| unquote(l)).unwrap_or_default(),
            })
            .collect();

        GraphDto {
            name: g.name.clone(),
            directed: g.directed,
            nodes,
            edges,
        }
    }
}

/// Exports the graph as pretty-printed JSON.
pub struct JsonExporter;

impl OutputExporter for JsonExporter {
    fn export(&self, graph: &Graph) -> anyhow::Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(&GraphDto::from(graph))?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

/// Undo DOT string quoting: strip the outer quotes and resolve `\"`, `\\`
/// and `\n`. Unquoted values are returned as they are.
fn unquote(s: &str) -> String {
    let Some(inner) = s.strip_prefix('"').and_then(|s| s.strip_suffix('"')) else {
        return s.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
