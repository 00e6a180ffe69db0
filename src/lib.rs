// Main library entry point for relapse_viz.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{translate, translate_grammar, translate_with, RenderUsecase};
pub use domain::error::ParseError;
pub use domain::graph::Graph;
pub use domain::translator::TranslateOptions;
