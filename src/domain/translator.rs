//! Grammar to Graph Translation
//!
//! Walks a Relapse AST depth-first and emits one graph node per visited AST
//! node and one labeled edge per traversed parent/child field. Punctuation
//! keywords and whitespace are trivia and only walked in full mode.

use crate::domain::ast::*;
use crate::domain::graph::{label_attrs, Graph};
use crate::domain::identity::{IdGenerator, DEFAULT_SEED, ROOT_SUFFIX};
use crate::domain::label::{escape, Label};

/// Name of every generated graph.
pub const GRAPH_NAME: &str = "Relapse";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Also walk trivia (keywords, whitespace, comments).
    pub full: bool,
    /// Seed for node identity suffixes.
    pub seed: u64,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            full: false,
            seed: DEFAULT_SEED,
        }
    }
}

/// A borrowed reference to any AST node kind.
///
/// The walker matches on this exhaustively, so a node kind it does not know
/// how to render cannot be constructed.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Grammar(&'a Grammar),
    PatternDecl(&'a PatternDecl),
    Pattern(&'a Pattern),
    Empty(&'a Empty),
    TreeNode(&'a TreeNode),
    Contains(&'a Contains),
    LeafNode(&'a LeafNode),
    Concat(&'a Concat),
    Or(&'a Or),
    And(&'a And),
    ZeroOrMore(&'a ZeroOrMore),
    Reference(&'a Reference),
    Not(&'a Not),
    ZAny(&'a ZAny),
    Optional(&'a Optional),
    Interleave(&'a Interleave),
    Expr(&'a Expr),
    List(&'a List),
    Function(&'a Function),
    BuiltIn(&'a BuiltIn),
    Terminal(&'a Terminal),
    Variable(&'a Variable),
    Keyword(&'a Keyword),
    Space(&'a Space),
    NameExpr(&'a NameExpr),
    Name(&'a Name),
    AnyName(&'a AnyName),
    AnyNameExcept(&'a AnyNameExcept),
    NameChoice(&'a NameChoice),
}

macro_rules! node_ref_from {
    ($($kind:ident),* $(,)?) => {
        $(
            impl<'a> From<&'a $kind> for NodeRef<'a> {
                fn from(v: &'a $kind) -> Self {
                    NodeRef::$kind(v)
                }
            }
        )*

        impl NodeRef<'_> {
            /// The kind name used for node identities and labels.
            pub fn kind(&self) -> &'static str {
                match self {
                    $(NodeRef::$kind(_) => stringify!($kind),)*
                }
            }
        }
    };
}

node_ref_from!(
    Grammar, PatternDecl, Pattern, Empty, TreeNode, Contains, LeafNode, Concat, Or, And,
    ZeroOrMore, Reference, Not, ZAny, Optional, Interleave, Expr, List, Function, BuiltIn,
    Terminal, Variable, Keyword, Space, NameExpr, Name, AnyName, AnyNameExcept, NameChoice,
);

/// One translation run. Owns the graph being built and the identity stream,
/// so independent runs never share state.
pub struct Translator {
    graph: Graph,
    full: bool,
    ids: IdGenerator,
}

impl Translator {
    pub fn new(options: &TranslateOptions) -> Self {
        Self {
            graph: Graph::new(GRAPH_NAME, true),
            full: options.full,
            ids: IdGenerator::new(options.seed),
        }
    }

    /// Walk the grammar from its root and return the finished graph.
    pub fn translate(mut self, grammar: &Grammar) -> Graph {
        let root = format!("Grammar{}", ROOT_SUFFIX);
        self.visit(NodeRef::Grammar(grammar), &root);
        tracing::debug!(
            nodes = self.graph.nodes.len(),
            edges = self.graph.edges.len(),
            full = self.full,
            "translated grammar"
        );
        self.graph
    }

    /// Create the child's identity, link it from `from` and walk it.
    fn down<'a>(&mut self, from: &str, to: impl Into<NodeRef<'a>>, edge_label: &str) -> String {
        let node = to.into();
        let id = format!("{}{}", node.kind(), self.ids.next());
        self.graph
            .add_edge(from, id.as_str(), true, label_attrs(edge_label));
        self.visit(node, &id);
        id
    }

    fn child<'a, T>(&mut self, from: &str, child: Option<&'a T>, field: &str)
    where
        NodeRef<'a>: From<&'a T>,
    {
        if let Some(c) = child {
            self.down(from, c, field);
        }
    }

    fn trivia<'a, T>(&mut self, from: &str, child: Option<&'a T>, field: &str)
    where
        NodeRef<'a>: From<&'a T>,
    {
        if self.full {
            self.child(from, child, field);
        }
    }

    fn indexed<'a, T>(&mut self, from: &str, children: &'a [T], field: &str)
    where
        NodeRef<'a>: From<&'a T>,
    {
        for (i, c) in children.iter().enumerate() {
            self.down(from, c, &format!("\"{}[{}]\"", field, i));
        }
    }

    fn emit(&mut self, id: &str, label: Label) {
        self.graph.add_node(id, label_attrs(label.finish()));
    }

    fn visit(&mut self, node: NodeRef<'_>, id: &str) {
        let mut label = Label::new(node.kind());
        match node {
            NodeRef::Grammar(v) => {
                marker(&mut label, "TopPattern", v.top_pattern.is_some());
                marker(&mut label, "PatternDecls", !v.pattern_decls.is_empty());
                space(&mut label, "After", v.after.as_ref());
                self.emit(id, label);
                self.child(id, v.top_pattern.as_ref(), "TopPattern");
                self.indexed(id, &v.pattern_decls, "PatternDecls");
                self.trivia(id, v.after.as_ref(), "After");
            }
            NodeRef::PatternDecl(v) => {
                keyword(&mut label, "Hash", v.hash.as_ref());
                space(&mut label, "Before", v.before.as_ref());
                if !v.name.is_empty() {
                    field(&mut label, "Name", &v.name);
                }
                keyword(&mut label, "Eq", v.eq.as_ref());
                marker(&mut label, "Pattern", v.pattern.is_some());
                self.emit(id, label);
                self.trivia(id, v.hash.as_ref(), "Hash");
                self.trivia(id, v.before.as_ref(), "Before");
                self.trivia(id, v.eq.as_ref(), "Eq");
                self.child(id, v.pattern.as_ref(), "Pattern");
            }
            NodeRef::Pattern(v) => {
                self.emit(id, label);
                let case = v.case_name();
                match v {
                    Pattern::Empty(p) => self.down(id, p, case),
                    Pattern::TreeNode(p) => self.down(id, p, case),
                    Pattern::LeafNode(p) => self.down(id, p, case),
                    Pattern::Concat(p) => self.down(id, p, case),
                    Pattern::Or(p) => self.down(id, p, case),
                    Pattern::And(p) => self.down(id, p, case),
                    Pattern::ZeroOrMore(p) => self.down(id, p, case),
                    Pattern::Reference(p) => self.down(id, p, case),
                    Pattern::Not(p) => self.down(id, p, case),
                    Pattern::ZAny(p) => self.down(id, p, case),
                    Pattern::Contains(p) => self.down(id, p, case),
                    Pattern::Optional(p) => self.down(id, p, case),
                    Pattern::Interleave(p) => self.down(id, p, case),
                };
            }
            NodeRef::Empty(v) => {
                if let Some(kw) = &v.empty {
                    quoted(&mut label, "Empty", &kw.to_string());
                }
                self.emit(id, label);
                self.trivia(id, v.empty.as_ref(), "Empty");
            }
            NodeRef::TreeNode(v) => {
                if let Some(name) = &v.name {
                    field(&mut label, "Name", &name.to_string());
                }
                keyword(&mut label, "Colon", v.colon.as_ref());
                marker(&mut label, "Pattern", v.pattern.is_some());
                self.emit(id, label);
                self.child(id, v.name.as_ref(), "Name");
                self.trivia(id, v.colon.as_ref(), "Colon");
                self.child(id, v.pattern.as_deref(), "Pattern");
            }
            NodeRef::Contains(v) => {
                keyword(&mut label, "Dot", v.dot.as_ref());
                marker(&mut label, "Pattern", v.pattern.is_some());
                self.emit(id, label);
                self.trivia(id, v.dot.as_ref(), "Dot");
                self.child(id, v.pattern.as_deref(), "Pattern");
            }
            NodeRef::LeafNode(v) => {
                marker(&mut label, "Expr", v.expr.is_some());
                self.emit(id, label);
                self.child(id, v.expr.as_ref(), "Expr");
            }
            NodeRef::Concat(v) => {
                keyword(&mut label, "OpenBracket", v.open_bracket.as_ref());
                marker(&mut label, "LeftPattern", v.left_pattern.is_some());
                keyword(&mut label, "Comma", v.comma.as_ref());
                marker(&mut label, "RightPattern", v.right_pattern.is_some());
                keyword(&mut label, "ExtraComma", v.extra_comma.as_ref());
                keyword(&mut label, "CloseBracket", v.close_bracket.as_ref());
                self.emit(id, label);
                self.trivia(id, v.open_bracket.as_ref(), "OpenBracket");
                self.child(id, v.left_pattern.as_deref(), "LeftPattern");
                self.trivia(id, v.comma.as_ref(), "Comma");
                self.child(id, v.right_pattern.as_deref(), "RightPattern");
                self.trivia(id, v.extra_comma.as_ref(), "ExtraComma");
                self.trivia(id, v.close_bracket.as_ref(), "CloseBracket");
            }
            NodeRef::Or(v) => {
                keyword(&mut label, "OpenParen", v.open_paren.as_ref());
                marker(&mut label, "LeftPattern", v.left_pattern.is_some());
                keyword(&mut label, "Pipe", v.pipe.as_ref());
                marker(&mut label, "RightPattern", v.right_pattern.is_some());
                keyword(&mut label, "CloseParen", v.close_paren.as_ref());
                self.emit(id, label);
                self.trivia(id, v.open_paren.as_ref(), "OpenParen");
                self.child(id, v.left_pattern.as_deref(), "LeftPattern");
                self.trivia(id, v.pipe.as_ref(), "Pipe");
                self.child(id, v.right_pattern.as_deref(), "RightPattern");
                self.trivia(id, v.close_paren.as_ref(), "CloseParen");
            }
            NodeRef::And(v) => {
                keyword(&mut label, "OpenParen", v.open_paren.as_ref());
                marker(&mut label, "LeftPattern", v.left_pattern.is_some());
                keyword(&mut label, "Ampersand", v.ampersand.as_ref());
                marker(&mut label, "RightPattern", v.right_pattern.is_some());
                keyword(&mut label, "CloseParen", v.close_paren.as_ref());
                self.emit(id, label);
                self.trivia(id, v.open_paren.as_ref(), "OpenParen");
                self.child(id, v.left_pattern.as_deref(), "LeftPattern");
                self.trivia(id, v.ampersand.as_ref(), "Ampersand");
                self.child(id, v.right_pattern.as_deref(), "RightPattern");
                self.trivia(id, v.close_paren.as_ref(), "CloseParen");
            }
            NodeRef::ZeroOrMore(v) => {
                keyword(&mut label, "OpenParen", v.open_paren.as_ref());
                marker(&mut label, "Pattern", v.pattern.is_some());
                keyword(&mut label, "CloseParen", v.close_paren.as_ref());
                keyword(&mut label, "Star", v.star.as_ref());
                self.emit(id, label);
                self.trivia(id, v.open_paren.as_ref(), "OpenParen");
                self.child(id, v.pattern.as_deref(), "Pattern");
                self.trivia(id, v.close_paren.as_ref(), "CloseParen");
                self.trivia(id, v.star.as_ref(), "Star");
            }
            NodeRef::Reference(v) => {
                keyword(&mut label, "At", v.at.as_ref());
                space(&mut label, "Before", v.before.as_ref());
                if !v.name.is_empty() {
                    field(&mut label, "Name", &v.name);
                }
                self.emit(id, label);
                self.trivia(id, v.at.as_ref(), "At");
                self.trivia(id, v.before.as_ref(), "Before");
            }
            NodeRef::Not(v) => {
                keyword(&mut label, "Exclamation", v.exclamation.as_ref());
                keyword(&mut label, "OpenParen", v.open_paren.as_ref());
                marker(&mut label, "Pattern", v.pattern.is_some());
                keyword(&mut label, "CloseParen", v.close_paren.as_ref());
                self.emit(id, label);
                self.trivia(id, v.exclamation.as_ref(), "Exclamation");
                self.trivia(id, v.open_paren.as_ref(), "OpenParen");
                self.child(id, v.pattern.as_deref(), "Pattern");
                self.trivia(id, v.close_paren.as_ref(), "CloseParen");
            }
            NodeRef::ZAny(v) => {
                keyword(&mut label, "Star", v.star.as_ref());
                self.emit(id, label);
                self.trivia(id, v.star.as_ref(), "Star");
            }
            NodeRef::Optional(v) => {
                keyword(&mut label, "OpenParen", v.open_paren.as_ref());
                marker(&mut label, "Pattern", v.pattern.is_some());
                keyword(&mut label, "CloseParen", v.close_paren.as_ref());
                keyword(&mut label, "QuestionMark", v.question_mark.as_ref());
                self.emit(id, label);
                self.trivia(id, v.open_paren.as_ref(), "OpenParen");
                self.child(id, v.pattern.as_deref(), "Pattern");
                self.trivia(id, v.close_paren.as_ref(), "CloseParen");
                self.trivia(id, v.question_mark.as_ref(), "QuestionMark");
            }
            NodeRef::Interleave(v) => {
                keyword(&mut label, "OpenCurly", v.open_curly.as_ref());
                marker(&mut label, "LeftPattern", v.left_pattern.is_some());
                keyword(&mut label, "SemiColon", v.semicolon.as_ref());
                marker(&mut label, "RightPattern", v.right_pattern.is_some());
                keyword(&mut label, "ExtraSemiColon", v.extra_semicolon.as_ref());
                keyword(&mut label, "CloseCurly", v.close_curly.as_ref());
                self.emit(id, label);
                self.trivia(id, v.open_curly.as_ref(), "OpenCurly");
                self.child(id, v.left_pattern.as_deref(), "LeftPattern");
                self.trivia(id, v.semicolon.as_ref(), "SemiColon");
                self.child(id, v.right_pattern.as_deref(), "RightPattern");
                self.trivia(id, v.extra_semicolon.as_ref(), "ExtraSemiColon");
                self.trivia(id, v.close_curly.as_ref(), "CloseCurly");
            }
            NodeRef::Expr(v) => {
                keyword(&mut label, "RightArrow", v.right_arrow.as_ref());
                keyword(&mut label, "Comma", v.comma.as_ref());
                let case = v.kind.case_name();
                marker(&mut label, case, true);
                self.emit(id, label);
                self.trivia(id, v.right_arrow.as_ref(), "RightArrow");
                self.trivia(id, v.comma.as_ref(), "Comma");
                match &v.kind {
                    ExprKind::Terminal(e) => self.down(id, e, case),
                    ExprKind::List(e) => self.down(id, e, case),
                    ExprKind::Function(e) => self.down(id, e, case),
                    ExprKind::BuiltIn(e) => self.down(id, e, case),
                };
            }
            NodeRef::List(v) => {
                space(&mut label, "Before", v.before.as_ref());
                field(&mut label, "Type", v.ty.name());
                keyword(&mut label, "OpenCurly", v.open_curly.as_ref());
                marker(&mut label, "Elems", !v.elems.is_empty());
                keyword(&mut label, "CloseCurly", v.close_curly.as_ref());
                self.emit(id, label);
                self.trivia(id, v.before.as_ref(), "Before");
                self.trivia(id, v.open_curly.as_ref(), "OpenCurly");
                self.indexed(id, &v.elems, "Elems");
                self.trivia(id, v.close_curly.as_ref(), "CloseCurly");
            }
            NodeRef::Function(v) => {
                space(&mut label, "Before", v.before.as_ref());
                if !v.name.is_empty() {
                    field(&mut label, "Name", &v.name);
                }
                keyword(&mut label, "OpenParen", v.open_paren.as_ref());
                marker(&mut label, "Params", !v.params.is_empty());
                keyword(&mut label, "CloseParen", v.close_paren.as_ref());
                self.emit(id, label);
                self.trivia(id, v.before.as_ref(), "Before");
                self.trivia(id, v.open_paren.as_ref(), "OpenParen");
                self.indexed(id, &v.params, "Params");
                self.trivia(id, v.close_paren.as_ref(), "CloseParen");
            }
            NodeRef::BuiltIn(v) => {
                keyword(&mut label, "Symbol", v.symbol.as_ref());
                marker(&mut label, "Expr", v.expr.is_some());
                self.emit(id, label);
                self.trivia(id, v.symbol.as_ref(), "Symbol");
                self.child(id, v.expr.as_deref(), "Expr");
            }
            NodeRef::Terminal(v) => {
                space(&mut label, "Before", v.before.as_ref());
                if !v.literal.is_empty() {
                    field(&mut label, "Literal", &v.literal);
                }
                values(
                    &mut label,
                    Values {
                        double: v.double_value,
                        int: v.int_value,
                        uint: v.uint_value,
                        boolean: v.bool_value,
                        string: v.string_value.as_deref(),
                        bytes: v.bytes_value.as_deref(),
                    },
                );
                marker(&mut label, "Variable", v.variable.is_some());
                self.emit(id, label);
                self.trivia(id, v.before.as_ref(), "Before");
                self.child(id, v.variable.as_ref(), "Variable");
            }
            NodeRef::Variable(v) => {
                field(&mut label, "Type", v.ty.name());
                self.emit(id, label);
            }
            NodeRef::Keyword(v) => {
                space(&mut label, "Before", v.before.as_ref());
                if !v.value.is_empty() {
                    quoted(&mut label, "Value", &v.value);
                }
                self.emit(id, label);
                self.trivia(id, v.before.as_ref(), "Before");
            }
            NodeRef::Space(v) => {
                for (i, s) in v.space.iter().enumerate() {
                    quoted(&mut label, &format!("Space[{}]", i), s);
                }
                self.emit(id, label);
            }
            NodeRef::NameExpr(v) => {
                self.emit(id, label);
                let case = v.case_name();
                match v {
                    NameExpr::Name(n) => self.down(id, n, case),
                    NameExpr::AnyName(n) => self.down(id, n, case),
                    NameExpr::AnyNameExcept(n) => self.down(id, n, case),
                    NameExpr::NameChoice(n) => self.down(id, n, case),
                };
            }
            NodeRef::Name(v) => {
                space(&mut label, "Before", v.before.as_ref());
                values(
                    &mut label,
                    Values {
                        double: v.double_value,
                        int: v.int_value,
                        uint: v.uint_value,
                        boolean: v.bool_value,
                        string: v.string_value.as_deref(),
                        bytes: v.bytes_value.as_deref(),
                    },
                );
                self.emit(id, label);
                self.trivia(id, v.before.as_ref(), "Before");
            }
            NodeRef::AnyName(v) => {
                keyword(&mut label, "Underscore", v.underscore.as_ref());
                self.emit(id, label);
                self.trivia(id, v.underscore.as_ref(), "Underscore");
            }
            NodeRef::AnyNameExcept(v) => {
                keyword(&mut label, "Exclamation", v.exclamation.as_ref());
                keyword(&mut label, "OpenParen", v.open_paren.as_ref());
                marker(&mut label, "Except", v.except.is_some());
                keyword(&mut label, "CloseParen", v.close_paren.as_ref());
                self.emit(id, label);
                self.trivia(id, v.exclamation.as_ref(), "Exclamation");
                self.trivia(id, v.open_paren.as_ref(), "OpenParen");
                self.child(id, v.except.as_deref(), "Except");
                self.trivia(id, v.close_paren.as_ref(), "CloseParen");
            }
            NodeRef::NameChoice(v) => {
                keyword(&mut label, "OpenParen", v.open_paren.as_ref());
                marker(&mut label, "Left", v.left.is_some());
                keyword(&mut label, "Pipe", v.pipe.as_ref());
                marker(&mut label, "Right", v.right.is_some());
                keyword(&mut label, "CloseParen", v.close_paren.as_ref());
                self.emit(id, label);
                self.trivia(id, v.open_paren.as_ref(), "OpenParen");
                self.child(id, v.left.as_deref(), "Left");
                self.trivia(id, v.pipe.as_ref(), "Pipe");
                self.child(id, v.right.as_deref(), "Right");
                self.trivia(id, v.close_paren.as_ref(), "CloseParen");
            }
        }
    }
}

/// Scalar values shared by terminals and names.
struct Values<'a> {
    double: Option<f64>,
    int: Option<i64>,
    uint: Option<u64>,
    boolean: Option<bool>,
    string: Option<&'a str>,
    bytes: Option<&'a [u8]>,
}

fn field(label: &mut Label, name: &str, value: &str) {
    label.write(&["\\n", name, ": ", &escape(value)]);
}

fn quoted(label: &mut Label, name: &str, value: &str) {
    label.write(&["\\n", name, ": \\\"", &escape(value), "\\\""]);
}

fn marker(label: &mut Label, name: &str, present: bool) {
    if present {
        label.write(&["\\n", name, ": ", name]);
    }
}

fn keyword(label: &mut Label, name: &str, kw: Option<&Keyword>) {
    if let Some(kw) = kw {
        field(label, name, &kw.to_string());
    }
}

fn space(label: &mut Label, name: &str, space: Option<&Space>) {
    if let Some(s) = space {
        quoted(label, name, &s.to_string());
    }
}

fn values(label: &mut Label, v: Values<'_>) {
    if let Some(d) = v.double {
        field(label, "DoubleValue", &exponent(d));
    }
    if let Some(i) = v.int {
        field(label, "IntValue", &i.to_string());
    }
    if let Some(u) = v.uint {
        field(label, "UintValue", &u.to_string());
    }
    if let Some(b) = v.boolean {
        field(label, "BoolValue", if b { "true" } else { "false" });
    }
    if let Some(s) = v.string {
        field(label, "StringValue", s);
    }
    if let Some(b) = v.bytes {
        field(label, "BytesValue", &String::from_utf8_lossy(b));
    }
}

/// Shortest round-trip mantissa with a signed exponent of at least two
/// digits, e.g. `1.5E+00` or `1E-07`.
fn exponent(d: f64) -> String {
    if d.is_nan() {
        return "NaN".to_string();
    }
    if d.is_infinite() {
        return if d > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    let s = format!("{:E}", d);
    match s.split_once('E') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            format!("{}E{}{:0>2}", mantissa, sign, digits)
        }
        None => s,
    }
}
