// Infrastructure implementations for the ports: the Relapse parser, the
// Graphviz renderer, configuration loading and the worker pool.

pub mod concurrency;
pub mod config;
pub mod lexer;
pub mod parser;
pub mod svg;

pub use parser::RelapseParser;
pub use svg::{GraphvizRenderer, SvgExporter};
