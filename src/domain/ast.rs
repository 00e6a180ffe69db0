// AST data structures for Relapse grammars.
// Every token keeps its leading whitespace and comments so the tree can be
// rendered back with full fidelity.

use std::fmt;

use super::types::Type;

/// The root of a parsed grammar.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grammar {
    pub top_pattern: Option<Pattern>,
    pub pattern_decls: Vec<PatternDecl>,
    /// Trailing whitespace and comments after the last token.
    pub after: Option<Space>,
}

/// `#name = pattern`
#[derive(Debug, Clone, PartialEq)]
pub struct PatternDecl {
    pub hash: Option<Keyword>,
    pub before: Option<Space>,
    pub name: String,
    pub eq: Option<Keyword>,
    pub pattern: Option<Pattern>,
}

/// A matching rule. Exactly one case is active.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Empty(Empty),
    TreeNode(TreeNode),
    LeafNode(LeafNode),
    Concat(Concat),
    Or(Or),
    And(And),
    ZeroOrMore(ZeroOrMore),
    Reference(Reference),
    Not(Not),
    ZAny(ZAny),
    Contains(Contains),
    Optional(Optional),
    Interleave(Interleave),
}

impl Pattern {
    /// Name of the active case.
    pub fn case_name(&self) -> &'static str {
        match self {
            Pattern::Empty(_) => "Empty",
            Pattern::TreeNode(_) => "TreeNode",
            Pattern::LeafNode(_) => "LeafNode",
            Pattern::Concat(_) => "Concat",
            Pattern::Or(_) => "Or",
            Pattern::And(_) => "And",
            Pattern::ZeroOrMore(_) => "ZeroOrMore",
            Pattern::Reference(_) => "Reference",
            Pattern::Not(_) => "Not",
            Pattern::ZAny(_) => "ZAny",
            Pattern::Contains(_) => "Contains",
            Pattern::Optional(_) => "Optional",
            Pattern::Interleave(_) => "Interleave",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Empty {
    pub empty: Option<Keyword>,
}

/// `name: pattern`, or a name directly followed by a depth pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub name: Option<NameExpr>,
    pub colon: Option<Keyword>,
    pub pattern: Option<Box<Pattern>>,
}

/// `.pattern`
#[derive(Debug, Clone, PartialEq)]
pub struct Contains {
    pub dot: Option<Keyword>,
    pub pattern: Option<Box<Pattern>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeafNode {
    pub expr: Option<Expr>,
}

/// `[left, right]`
#[derive(Debug, Clone, PartialEq)]
pub struct Concat {
    pub open_bracket: Option<Keyword>,
    pub left_pattern: Option<Box<Pattern>>,
    pub comma: Option<Keyword>,
    pub right_pattern: Option<Box<Pattern>>,
    pub extra_comma: Option<Keyword>,
    pub close_bracket: Option<Keyword>,
}

/// `(left | right)`
#[derive(Debug, Clone, PartialEq)]
pub struct Or {
    pub open_paren: Option<Keyword>,
    pub left_pattern: Option<Box<Pattern>>,
    pub pipe: Option<Keyword>,
    pub right_pattern: Option<Box<Pattern>>,
    pub close_paren: Option<Keyword>,
}

/// `(left & right)`
#[derive(Debug, Clone, PartialEq)]
pub struct And {
    pub open_paren: Option<Keyword>,
    pub left_pattern: Option<Box<Pattern>>,
    pub ampersand: Option<Keyword>,
    pub right_pattern: Option<Box<Pattern>>,
    pub close_paren: Option<Keyword>,
}

/// `(pattern)*`
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroOrMore {
    pub open_paren: Option<Keyword>,
    pub pattern: Option<Box<Pattern>>,
    pub close_paren: Option<Keyword>,
    pub star: Option<Keyword>,
}

/// `@name`
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub at: Option<Keyword>,
    pub before: Option<Space>,
    pub name: String,
}

/// `!(pattern)`
#[derive(Debug, Clone, PartialEq)]
pub struct Not {
    pub exclamation: Option<Keyword>,
    pub open_paren: Option<Keyword>,
    pub pattern: Option<Box<Pattern>>,
    pub close_paren: Option<Keyword>,
}

/// `*`
#[derive(Debug, Clone, PartialEq)]
pub struct ZAny {
    pub star: Option<Keyword>,
}

/// `(pattern)?`
#[derive(Debug, Clone, PartialEq)]
pub struct Optional {
    pub open_paren: Option<Keyword>,
    pub pattern: Option<Box<Pattern>>,
    pub close_paren: Option<Keyword>,
    pub question_mark: Option<Keyword>,
}

/// `{left; right}`
#[derive(Debug, Clone, PartialEq)]
pub struct Interleave {
    pub open_curly: Option<Keyword>,
    pub left_pattern: Option<Box<Pattern>>,
    pub semicolon: Option<Keyword>,
    pub right_pattern: Option<Box<Pattern>>,
    pub extra_semicolon: Option<Keyword>,
    pub close_curly: Option<Keyword>,
}

/// An expression, optionally introduced by `->` or separated from its
/// predecessor in a list by `,`.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub right_arrow: Option<Keyword>,
    pub comma: Option<Keyword>,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Terminal(Terminal),
    List(List),
    Function(Function),
    BuiltIn(BuiltIn),
}

impl ExprKind {
    pub fn case_name(&self) -> &'static str {
        match self {
            ExprKind::Terminal(_) => "Terminal",
            ExprKind::List(_) => "List",
            ExprKind::Function(_) => "Function",
            ExprKind::BuiltIn(_) => "BuiltIn",
        }
    }
}

/// `[]int{1, 2}`
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    pub before: Option<Space>,
    pub ty: Type,
    pub open_curly: Option<Keyword>,
    pub elems: Vec<Expr>,
    pub close_curly: Option<Keyword>,
}

/// `name(params...)`
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub before: Option<Space>,
    pub name: String,
    pub open_paren: Option<Keyword>,
    pub params: Vec<Expr>,
    pub close_paren: Option<Keyword>,
}

/// A comparison shorthand such as `== 1` or `*= "art"`.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltIn {
    pub symbol: Option<Keyword>,
    pub expr: Option<Box<Expr>>,
}

/// A literal value or a variable. `literal` keeps the source text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Terminal {
    pub before: Option<Space>,
    pub literal: String,
    pub double_value: Option<f64>,
    pub int_value: Option<i64>,
    pub uint_value: Option<u64>,
    pub bool_value: Option<bool>,
    pub string_value: Option<String>,
    pub bytes_value: Option<Vec<u8>>,
    pub variable: Option<Variable>,
}

/// `$int`, `$string`, ...
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Variable {
    pub ty: Type,
}

/// A token together with the trivia in front of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub before: Option<Space>,
    pub value: String,
}

impl Keyword {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            before: None,
            value: value.into(),
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(before) = &self.before {
            write!(f, "{}", before)?;
        }
        f.write_str(&self.value)
    }
}

/// Whitespace runs and comments, in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Space {
    pub space: Vec<String>,
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.space {
            f.write_str(s)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NameExpr {
    Name(Name),
    AnyName(AnyName),
    AnyNameExcept(AnyNameExcept),
    NameChoice(NameChoice),
}

impl NameExpr {
    pub fn case_name(&self) -> &'static str {
        match self {
            NameExpr::Name(_) => "Name",
            NameExpr::AnyName(_) => "AnyName",
            NameExpr::AnyNameExcept(_) => "AnyNameExcept",
            NameExpr::NameChoice(_) => "NameChoice",
        }
    }
}

/// Compact source-like rendering, without trivia.
impl fmt::Display for NameExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameExpr::Name(n) => write!(f, "{}", n),
            NameExpr::AnyName(_) => f.write_str("_"),
            NameExpr::AnyNameExcept(n) => match &n.except {
                Some(except) => write!(f, "!({})", except),
                None => f.write_str("!()"),
            },
            NameExpr::NameChoice(n) => {
                f.write_str("(")?;
                if let Some(left) = &n.left {
                    write!(f, "{}", left)?;
                }
                f.write_str("|")?;
                if let Some(right) = &n.right {
                    write!(f, "{}", right)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// A field name. Exactly one value is expected to be set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Name {
    pub before: Option<Space>,
    pub double_value: Option<f64>,
    pub int_value: Option<i64>,
    pub uint_value: Option<u64>,
    pub bool_value: Option<bool>,
    pub string_value: Option<String>,
    pub bytes_value: Option<Vec<u8>>,
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(s) = &self.string_value {
            let plain = s.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_')
                && s.chars().all(|c| c.is_alphanumeric() || c == '_');
            return if plain { f.write_str(s) } else { write!(f, "{:?}", s) };
        }
        if let Some(i) = self.int_value {
            return write!(f, "{}", i);
        }
        if let Some(u) = self.uint_value {
            return write!(f, "uint({})", u);
        }
        if let Some(d) = self.double_value {
            return write!(f, "double({})", d);
        }
        if let Some(b) = self.bool_value {
            return write!(f, "{}", b);
        }
        if let Some(b) = &self.bytes_value {
            return write!(f, "[]byte{:?}", b);
        }
        Ok(())
    }
}

/// `_`
#[derive(Debug, Clone, PartialEq)]
pub struct AnyName {
    pub underscore: Option<Keyword>,
}

/// `!(name)`
#[derive(Debug, Clone, PartialEq)]
pub struct AnyNameExcept {
    pub exclamation: Option<Keyword>,
    pub open_paren: Option<Keyword>,
    pub except: Option<Box<NameExpr>>,
    pub close_paren: Option<Keyword>,
}

/// `(left | right)` in name position.
#[derive(Debug, Clone, PartialEq)]
pub struct NameChoice {
    pub open_paren: Option<Keyword>,
    pub left: Option<Box<NameExpr>>,
    pub pipe: Option<Keyword>,
    pub right: Option<Box<NameExpr>>,
    pub close_paren: Option<Keyword>,
}
