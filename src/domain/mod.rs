// Domain model: the Relapse AST, the graph it is translated into, and the
// translation itself.

pub mod ast;
pub mod error;
pub mod graph;
pub mod identity;
pub mod label;
pub mod translator;
pub mod types;
