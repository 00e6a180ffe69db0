use crate::domain::ast::Grammar;
use crate::domain::error::ParseError;
use crate::domain::graph::Graph;

pub mod dot_exporter;

/// Turns grammar source text into an AST.
pub trait GrammarParser: Send + Sync {
    fn parse(&self, src: &str) -> Result<Grammar, ParseError>;
}

/// Serializes a finished graph into an output format.
pub trait OutputExporter: Send + Sync {
    fn export(&self, graph: &Graph) -> anyhow::Result<Vec<u8>>;
}

/// Turns DOT text into an image.
pub trait DiagramRenderer: Send + Sync {
    fn render(&self, dot: &str) -> anyhow::Result<Vec<u8>>;
}
