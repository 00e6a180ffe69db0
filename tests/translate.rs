use std::collections::{HashMap, HashSet};
use std::fs;
use std::process::Command;

use relapse_viz::api::dto::GraphDto;
use relapse_viz::domain::ast::*;
use relapse_viz::domain::graph::Graph;
use relapse_viz::infrastructure::parser::parse;
use relapse_viz::ports::dot_exporter::DotExporter;
use relapse_viz::{translate, ParseError};

const SAMPLE: &str = r#"
(
	.WhatsUp == "E" &
	.Survived >= 1000000 /*years*/ &
	.DragonsExist != true &
	.MonkeysSmart :: $bool &
	.History [
		*,
		_ == "Katydids Alive"
	] &
	.FeatureRequests._ {
		Name *= "art";
		*;
		Anatomy $= "omen";
	} &
	( .WhatsUp: * | .Survived: * | .History._: -> contains($string, "Met" ) )
)
"#;

fn edge_labels(graph: &Graph) -> Vec<&str> {
    graph.edges.iter().filter_map(|e| e.label()).collect()
}

fn count<'a>(items: impl Iterator<Item = &'a str>) -> HashMap<&'a str, usize> {
    let mut counts = HashMap::new();
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
    counts
}

/// Every node except the root is the target of exactly one edge.
fn assert_tree(graph: &Graph) {
    assert_eq!(graph.edges.len() + 1, graph.nodes.len());
    let targets: HashSet<_> = graph.edges.iter().map(|e| e.to.as_str()).collect();
    assert_eq!(targets.len(), graph.edges.len(), "an identity was reused");
    assert!(!targets.contains("Grammarroot"));
    for edge in &graph.edges {
        assert!(graph.node(&edge.from).is_some());
        assert!(graph.node(&edge.to).is_some());
    }
}

#[test]
fn test_and_of_two_fields() {
    let graph = translate("(.A == 1 & .B == 2)", false).unwrap();
    assert_eq!(graph.nodes_of_kind("And").count(), 1);
    assert_eq!(graph.nodes_of_kind("Keyword").count(), 0);
    assert_eq!(graph.nodes_of_kind("Space").count(), 0);

    let and = graph.nodes_of_kind("And").next().unwrap();
    let labels: Vec<_> = graph.edges_from(&and.id).filter_map(|e| e.label()).collect();
    assert_eq!(labels, vec!["LeftPattern", "RightPattern"]);
    assert_tree(&graph);
}

#[test]
fn test_dot_output_is_deterministic() {
    for full in [false, true] {
        let a = DotExporter::to_dot(&translate(SAMPLE, full).unwrap());
        let b = DotExporter::to_dot(&translate(SAMPLE, full).unwrap());
        assert_eq!(a, b);
    }
}

#[test]
fn test_sample_grammar_full() {
    let graph = translate(SAMPLE, true).unwrap();
    assert_tree(&graph);
    assert_eq!(graph.nodes_of_kind("Grammar").count(), 1);
    assert_eq!(graph.nodes_of_kind("Function").count(), 1);
    assert_eq!(graph.nodes_of_kind("Variable").count(), 2);
    assert_eq!(graph.nodes_of_kind("Interleave").count(), 2);
    assert!(graph.nodes_of_kind("Keyword").count() > 0);
    assert!(graph.nodes_of_kind("Space").count() > 0);
    assert!(graph
        .nodes
        .iter()
        .filter_map(|n| n.label())
        .any(|l| l.contains("/*years*/")));
}

/// `(parent label, edge label, child label)` for every edge.
fn edge_triples(graph: &Graph) -> HashMap<(String, String, String), usize> {
    let label = |id: &str| {
        graph
            .node(id)
            .and_then(|n| n.label())
            .unwrap_or_default()
            .to_string()
    };
    let mut counts = HashMap::new();
    for edge in &graph.edges {
        let key = (
            label(&edge.from),
            edge.label().unwrap_or_default().to_string(),
            label(&edge.to),
        );
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

#[test]
fn test_non_full_is_subset_of_full() {
    let small = translate(SAMPLE, false).unwrap();
    let big = translate(SAMPLE, true).unwrap();
    assert!(small.nodes.len() < big.nodes.len());
    assert_tree(&small);

    let small_nodes = count(small.nodes.iter().filter_map(|n| n.label()));
    let big_nodes = count(big.nodes.iter().filter_map(|n| n.label()));
    for (label, n) in &small_nodes {
        assert!(big_nodes.get(label).copied().unwrap_or(0) >= *n, "missing node {}", label);
    }

    let big_edges = edge_triples(&big);
    for (triple, n) in edge_triples(&small) {
        assert!(
            big_edges.get(&triple).copied().unwrap_or(0) >= n,
            "missing edge {:?}",
            triple
        );
    }
}

/// Counts the AST nodes the walker is expected to visit, straight from the
/// parsed tree.
struct AstCount {
    full: bool,
}

impl AstCount {
    fn space(&self, s: &Option<Space>) -> usize {
        usize::from(self.full && s.is_some())
    }

    fn kw(&self, k: &Option<Keyword>) -> usize {
        match k {
            Some(k) if self.full => 1 + self.space(&k.before),
            _ => 0,
        }
    }

    fn grammar(&self, g: &Grammar) -> usize {
        1 + g.top_pattern.as_ref().map_or(0, |p| self.pattern(p))
            + g.pattern_decls
                .iter()
                .map(|d| {
                    1 + self.kw(&d.hash)
                        + self.space(&d.before)
                        + self.kw(&d.eq)
                        + d.pattern.as_ref().map_or(0, |p| self.pattern(p))
                })
                .sum::<usize>()
            + self.space(&g.after)
    }

    fn boxed(&self, p: &Option<Box<Pattern>>) -> usize {
        p.as_deref().map_or(0, |p| self.pattern(p))
    }

    fn pattern(&self, p: &Pattern) -> usize {
        1 + match p {
            Pattern::Empty(v) => 1 + self.kw(&v.empty),
            Pattern::TreeNode(v) => {
                1 + v.name.as_ref().map_or(0, |n| self.name_expr(n))
                    + self.kw(&v.colon)
                    + self.boxed(&v.pattern)
            }
            Pattern::LeafNode(v) => 1 + v.expr.as_ref().map_or(0, |e| self.expr(e)),
            Pattern::Concat(v) => {
                1 + self.kw(&v.open_bracket)
                    + self.boxed(&v.left_pattern)
                    + self.kw(&v.comma)
                    + self.boxed(&v.right_pattern)
                    + self.kw(&v.extra_comma)
                    + self.kw(&v.close_bracket)
            }
            Pattern::Or(v) => {
                1 + self.kw(&v.open_paren)
                    + self.boxed(&v.left_pattern)
                    + self.kw(&v.pipe)
                    + self.boxed(&v.right_pattern)
                    + self.kw(&v.close_paren)
            }
            Pattern::And(v) => {
                1 + self.kw(&v.open_paren)
                    + self.boxed(&v.left_pattern)
                    + self.kw(&v.ampersand)
                    + self.boxed(&v.right_pattern)
                    + self.kw(&v.close_paren)
            }
            Pattern::ZeroOrMore(v) => {
                1 + self.kw(&v.open_paren)
                    + self.boxed(&v.pattern)
                    + self.kw(&v.close_paren)
                    + self.kw(&v.star)
            }
            Pattern::Reference(v) => 1 + self.kw(&v.at) + self.space(&v.before),
            Pattern::Not(v) => {
                1 + self.kw(&v.exclamation)
                    + self.kw(&v.open_paren)
                    + self.boxed(&v.pattern)
                    + self.kw(&v.close_paren)
            }
            Pattern::ZAny(v) => 1 + self.kw(&v.star),
            Pattern::Contains(v) => 1 + self.kw(&v.dot) + self.boxed(&v.pattern),
            Pattern::Optional(v) => {
                1 + self.kw(&v.open_paren)
                    + self.boxed(&v.pattern)
                    + self.kw(&v.close_paren)
                    + self.kw(&v.question_mark)
            }
            Pattern::Interleave(v) => {
                1 + self.kw(&v.open_curly)
                    + self.boxed(&v.left_pattern)
                    + self.kw(&v.semicolon)
                    + self.boxed(&v.right_pattern)
                    + self.kw(&v.extra_semicolon)
                    + self.kw(&v.close_curly)
            }
        }
    }

    fn exprs(&self, exprs: &[Expr]) -> usize {
        exprs.iter().map(|e| self.expr(e)).sum()
    }

    fn expr(&self, e: &Expr) -> usize {
        1 + self.kw(&e.right_arrow)
            + self.kw(&e.comma)
            + match &e.kind {
                ExprKind::Terminal(t) => {
                    1 + self.space(&t.before) + usize::from(t.variable.is_some())
                }
                ExprKind::List(l) => {
                    1 + self.space(&l.before)
                        + self.kw(&l.open_curly)
                        + self.exprs(&l.elems)
                        + self.kw(&l.close_curly)
                }
                ExprKind::Function(f) => {
                    1 + self.space(&f.before)
                        + self.kw(&f.open_paren)
                        + self.exprs(&f.params)
                        + self.kw(&f.close_paren)
                }
                ExprKind::BuiltIn(b) => {
                    1 + self.kw(&b.symbol) + b.expr.as_deref().map_or(0, |e| self.expr(e))
                }
            }
    }

    fn name_expr(&self, n: &NameExpr) -> usize {
        1 + match n {
            NameExpr::Name(v) => 1 + self.space(&v.before),
            NameExpr::AnyName(v) => 1 + self.kw(&v.underscore),
            NameExpr::AnyNameExcept(v) => {
                1 + self.kw(&v.exclamation)
                    + self.kw(&v.open_paren)
                    + v.except.as_deref().map_or(0, |n| self.name_expr(n))
                    + self.kw(&v.close_paren)
            }
            NameExpr::NameChoice(v) => {
                1 + self.kw(&v.open_paren)
                    + v.left.as_deref().map_or(0, |n| self.name_expr(n))
                    + self.kw(&v.pipe)
                    + v.right.as_deref().map_or(0, |n| self.name_expr(n))
                    + self.kw(&v.close_paren)
            }
        }
    }
}

#[test]
fn test_node_count_matches_visited_ast_nodes() {
    // Grammar, Pattern, ZAny, plus the `*` keyword in full mode
    let star = parse("*").unwrap();
    assert_eq!(AstCount { full: false }.grammar(&star), 3);
    assert_eq!(AstCount { full: true }.grammar(&star), 4);

    let grammar = parse(SAMPLE).unwrap();
    for full in [false, true] {
        let graph = translate(SAMPLE, full).unwrap();
        assert_eq!(graph.nodes.len(), AstCount { full }.grammar(&grammar), "full = {}", full);
    }

    let decls = "#main = @ /*ref*/ other\n#other = [ A == []int{1, 2}, B: -> eq($int, 3), <empty>, ]\n";
    let grammar = parse(decls).unwrap();
    for full in [false, true] {
        let graph = translate(decls, full).unwrap();
        assert_eq!(graph.nodes.len(), AstCount { full }.grammar(&grammar), "full = {}", full);
    }
}

#[test]
fn test_three_pattern_decls() {
    let graph = translate("#a = *\n#b = <empty>\n#c = @a\n", false).unwrap();
    let labels: Vec<_> = graph.edges_from("Grammarroot").filter_map(|e| e.label()).collect();
    assert_eq!(
        labels,
        vec!["\"PatternDecls[0]\"", "\"PatternDecls[1]\"", "\"PatternDecls[2]\""]
    );
    assert_eq!(graph.nodes_of_kind("Reference").count(), 1);
}

#[test]
fn test_embedded_quote_is_escaped() {
    let graph = translate(r#".A == "say \"hi\"""#, false).unwrap();
    for label in graph.nodes.iter().filter_map(|n| n.label()) {
        assert!(label.starts_with('"') && label.ends_with('"'), "{}", label);
        let inner = label[1..label.len() - 1].as_bytes();
        for (i, &b) in inner.iter().enumerate() {
            if b == b'"' {
                let slashes = inner[..i].iter().rev().take_while(|&&c| c == b'\\').count();
                assert_eq!(slashes % 2, 1, "unescaped quote in {}", label);
            }
        }
    }
    let dto = GraphDto::from(&graph);
    assert!(dto.nodes.iter().any(|n| n.label.contains("say \"hi\"")));
}

#[test]
fn test_parse_error_is_returned() {
    let err = translate("(.A == 1 & .B == 2", false).unwrap_err();
    assert!(matches!(err, ParseError::Unexpected { .. }));
    assert!(err.to_string().starts_with("1:"));
    assert_eq!(translate("", false).unwrap_err(), ParseError::EmptyGrammar);
}

#[test]
fn test_cli_writes_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sample.relapse");
    let output = dir.path().join("sample.json");
    fs::write(&input, SAMPLE).unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_relapse_viz"))
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .args(["--format", "json", "--full"])
        .status()
        .unwrap();
    assert!(status.success());

    let dto: GraphDto = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(dto, GraphDto::from(&translate(SAMPLE, true).unwrap()));
}

#[test]
fn test_cli_several_inputs_into_directory() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("out");
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_relapse_viz"));
    for name in ["a", "b", "c"] {
        let input = dir.path().join(format!("{}.relapse", name));
        fs::write(&input, "*").unwrap();
        cmd.arg("-i").arg(input);
    }
    let status = cmd.arg("-o").arg(&out_dir).status().unwrap();
    assert!(status.success());

    let expected = DotExporter::to_dot(&translate("*", false).unwrap());
    for name in ["a", "b", "c"] {
        let dot = fs::read_to_string(out_dir.join(format!("{}.dot", name))).unwrap();
        assert_eq!(dot, expected);
    }
}

#[test]
fn test_cli_reports_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.relapse");
    fs::write(&input, "(* | *").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_relapse_viz"))
        .arg("--input")
        .arg(&input)
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("broken.relapse"), "{}", stderr);
    assert!(output.stdout.is_empty());
}

#[test]
fn test_cli_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("any.relapse");
    let config = dir.path().join("relapse.toml");
    fs::write(&input, "*").unwrap();
    fs::write(&config, "format = \"json\"\nfull = true\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_relapse_viz"))
        .arg("--input")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success());
    let dto: GraphDto = serde_json::from_slice(&output.stdout).unwrap();
    assert!(dto.nodes.iter().any(|n| n.kind == "Keyword"));
}

#[test]
fn test_cli_keeps_inputs_with_output_extension() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_relapse_viz"));
    for name in ["a", "b"] {
        let input = dir.path().join(format!("{}.dot", name));
        fs::write(&input, "*").unwrap();
        cmd.arg("-i").arg(input);
    }
    let status = cmd.status().unwrap();
    assert!(status.success());

    let expected = DotExporter::to_dot(&translate("*", false).unwrap());
    for name in ["a", "b"] {
        assert_eq!(fs::read_to_string(dir.path().join(format!("{}.dot", name))).unwrap(), "*");
        let rendered = fs::read_to_string(dir.path().join(format!("{}.dot.dot", name))).unwrap();
        assert_eq!(rendered, expected);
    }
}

#[test]
fn test_cli_no_full_overrides_config() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("any.relapse");
    let config = dir.path().join("relapse.toml");
    fs::write(&input, "*").unwrap();
    fs::write(&config, "format = \"json\"\nfull = true\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_relapse_viz"))
        .arg("--input")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .arg("--no-full")
        .output()
        .unwrap();
    assert!(output.status.success());
    let dto: GraphDto = serde_json::from_slice(&output.stdout).unwrap();
    assert!(dto.nodes.iter().all(|n| n.kind != "Keyword"));
    assert_eq!(dto.nodes.len(), 3);
}
