//! Graph Data Structure
//!
//! A directed graph with string identities and Graphviz-style attributes.
//! Attribute values are stored already encoded for DOT (quoted where needed).

use std::collections::{BTreeMap, HashMap};

/// Attribute key used for node and edge labels.
pub const ATTR_LABEL: &str = "label";

pub type Attrs = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    /// Graph name written into the DOT header
    pub name: String,
    pub directed: bool,
    /// Nodes in insertion order
    pub nodes: Vec<Node>,
    /// Edges in insertion order
    pub edges: Vec<Edge>,
    index: HashMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub attrs: Attrs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub directed: bool,
    pub attrs: Attrs,
}

impl Node {
    pub fn label(&self) -> Option<&str> {
        self.attrs.get(ATTR_LABEL).map(String::as_str)
    }
}

impl Edge {
    pub fn label(&self) -> Option<&str> {
        self.attrs.get(ATTR_LABEL).map(String::as_str)
    }
}

impl Graph {
    pub fn new(name: impl Into<String>, directed: bool) -> Self {
        Self {
            name: name.into(),
            directed,
            nodes: Vec::new(),
            edges: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add a node. An existing node with the same id gets the new attributes
    /// merged into its own.
    pub fn add_node(&mut self, id: impl Into<String>, attrs: Attrs) {
        let id = id.into();
        if let Some(&i) = self.index.get(&id) {
            self.nodes[i].attrs.extend(attrs);
            return;
        }
        self.index.insert(id.clone(), self.nodes.len());
        self.nodes.push(Node { id, attrs });
    }

    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>, directed: bool, attrs: Attrs) {
        self.edges.push(Edge {
            from: from.into(),
            to: to.into(),
            directed,
            attrs,
        });
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Outgoing edges of `id`, in insertion order.
    pub fn edges_from<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.from == id)
    }

    /// Nodes whose label starts with the given kind name.
    pub fn nodes_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes.iter().filter(move |n| {
            n.label()
                .and_then(|l| l.strip_prefix('"'))
                .map(|l| l == format!("{}\"", kind) || l.starts_with(&format!("{}\\n", kind)))
                .unwrap_or(false)
        })
    }
}

/// Build an attribute map holding only a label.
pub fn label_attrs(label: impl Into<String>) -> Attrs {
    let mut attrs = Attrs::new();
    attrs.insert(ATTR_LABEL.to_string(), label.into());
    attrs
}
