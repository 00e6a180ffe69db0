use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::ast::Grammar;
use crate::domain::error::ParseError;
use crate::domain::graph::Graph;
use crate::domain::translator::{TranslateOptions, Translator};
use crate::infrastructure::parser;
use crate::ports::{GrammarParser, OutputExporter};

/// Parse Relapse source and translate it into a graph.
///
/// ```
/// let graph = relapse_viz::translate("(.A == 1 & .B == 2)", false).unwrap();
/// assert_eq!(graph.nodes_of_kind("And").count(), 1);
/// assert_eq!(graph.nodes_of_kind("Keyword").count(), 0);
/// ```
pub fn translate(source: &str, full: bool) -> Result<Graph, ParseError> {
    let grammar = parser::parse(source)?;
    Ok(translate_grammar(&grammar, full))
}

/// Translate an already parsed grammar with the default seed.
pub fn translate_grammar(grammar: &Grammar, full: bool) -> Graph {
    translate_with(
        grammar,
        &TranslateOptions {
            full,
            ..TranslateOptions::default()
        },
    )
}

/// Translate with explicit options. Every call starts a fresh identity
/// stream, so equal inputs and options give equal graphs.
///
/// Only AST node kinds can be walked; anything else is rejected at compile
/// time:
///
/// ```compile_fail
/// use relapse_viz::domain::translator::NodeRef;
/// let not_a_node = 42u32;
/// let _ = NodeRef::from(&not_a_node);
/// ```
pub fn translate_with(grammar: &Grammar, options: &TranslateOptions) -> Graph {
    Translator::new(options).translate(grammar)
}

/// Parse, translate and export one grammar.
pub struct RenderUsecase<'a> {
    pub parser: &'a dyn GrammarParser,
    pub exporter: &'a dyn OutputExporter,
    pub options: TranslateOptions,
}

impl<'a> RenderUsecase<'a> {
    pub fn run(&self, source: &str) -> Result<Vec<u8>> {
        let grammar = self.parser.parse(source)?;
        let graph = translate_with(&grammar, &self.options);
        self.exporter.export(&graph)
    }

    /// Render `input` and write the result to `output`.
    pub fn run_file(&self, input: &Path, output: &Path) -> Result<()> {
        if input == output {
            anyhow::bail!("Refusing to overwrite input {}", input.display());
        }
        let source = fs::read_to_string(input)
            .with_context(|| format!("Cannot read {}", input.display()))?;
        let bytes = self
            .run(&source)
            .with_context(|| input.display().to_string())?;
        fs::write(output, &bytes).with_context(|| format!("Cannot write {}", output.display()))?;
        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            bytes = bytes.len(),
            "rendered grammar"
        );
        Ok(())
    }
}
