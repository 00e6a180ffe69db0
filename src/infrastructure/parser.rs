//! Recursive descent parser for Relapse grammars.
//!
//! Binary operators written with more than two operands, such as
//! `(a | b | c)` or `[a, b, c]`, nest to the left. Only the outermost node
//! keeps the surrounding brackets.

use crate::domain::ast::*;
use crate::domain::error::ParseError;
use crate::domain::types::Type;
use crate::infrastructure::lexer::{tokenize, Token, TokenKind, BUILTINS};
use crate::ports::GrammarParser;

type Result<T> = std::result::Result<T, ParseError>;

/// The default [`GrammarParser`].
pub struct RelapseParser;

impl GrammarParser for RelapseParser {
    fn parse(&self, src: &str) -> Result<Grammar> {
        parse(src)
    }
}

/// Parse Relapse source text into a grammar.
pub fn parse(src: &str) -> Result<Grammar> {
    let tokens = tokenize(src)?;
    Parser { tokens, pos: 0 }.grammar()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // The token stream always ends with Eof and the parser never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)]
    }

    fn at(&self, symbol: &str) -> bool {
        self.peek().is_symbol(symbol)
    }

    fn at_builtin(&self) -> bool {
        let t = self.peek();
        t.kind == TokenKind::Symbol && BUILTINS.contains(&t.text.as_str())
    }

    fn next(&mut self) -> Token {
        let t = self.peek().clone();
        if t.kind != TokenKind::Eof {
            self.pos += 1;
        }
        t
    }

    fn error(&self, expected: &str) -> ParseError {
        let t = self.peek();
        ParseError::Unexpected {
            line: t.line,
            column: t.column,
            expected: expected.to_string(),
            found: t.describe(),
        }
    }

    fn keyword(&mut self, symbol: &str) -> Result<Keyword> {
        if !self.at(symbol) {
            return Err(self.error(&format!("'{}'", symbol)));
        }
        let t = self.next();
        Ok(Keyword {
            before: t.before,
            value: t.text,
        })
    }

    fn optional_keyword(&mut self, symbol: &str) -> Option<Keyword> {
        if self.at(symbol) {
            self.keyword(symbol).ok()
        } else {
            None
        }
    }

    fn grammar(mut self) -> Result<Grammar> {
        let top_pattern = if self.at("#") || self.peek().kind == TokenKind::Eof {
            None
        } else {
            Some(self.pattern()?)
        };
        let mut pattern_decls = Vec::new();
        while self.at("#") {
            pattern_decls.push(self.pattern_decl()?);
        }
        if self.peek().kind != TokenKind::Eof {
            return Err(self.error("'#' or end of input"));
        }
        if top_pattern.is_none() && pattern_decls.is_empty() {
            return Err(ParseError::EmptyGrammar);
        }
        let after = self.next().before;
        Ok(Grammar {
            top_pattern,
            pattern_decls,
            after,
        })
    }

    fn pattern_decl(&mut self) -> Result<PatternDecl> {
        let hash = self.keyword("#")?;
        if self.peek().kind != TokenKind::Ident {
            return Err(self.error("pattern name"));
        }
        let name = self.next();
        let eq = self.keyword("=")?;
        let pattern = self.pattern()?;
        Ok(PatternDecl {
            hash: Some(hash),
            before: name.before,
            name: name.text,
            eq: Some(eq),
            pattern: Some(pattern),
        })
    }

    fn pattern(&mut self) -> Result<Pattern> {
        let t = self.peek().clone();
        match t.kind {
            TokenKind::Symbol => match t.text.as_str() {
                "*" => Ok(Pattern::ZAny(ZAny {
                    star: Some(self.keyword("*")?),
                })),
                "<empty>" => Ok(Pattern::Empty(Empty {
                    empty: Some(self.keyword("<empty>")?),
                })),
                "@" => self.reference(),
                "." => Ok(Pattern::Contains(self.contains()?)),
                "[" => Ok(Pattern::Concat(self.concat()?)),
                "{" => Ok(Pattern::Interleave(self.interleave()?)),
                "->" => Ok(Pattern::LeafNode(self.leaf_node()?)),
                "(" | "!" => {
                    if let Some(tree) = self.try_tree_node()? {
                        return Ok(Pattern::TreeNode(tree));
                    }
                    if self.at("!") {
                        self.not()
                    } else {
                        self.parenthesized()
                    }
                }
                _ if self.at_builtin() => Ok(Pattern::LeafNode(self.leaf_node()?)),
                _ => Err(self.error("pattern")),
            },
            TokenKind::Ident | TokenKind::Str | TokenKind::Int | TokenKind::Float => {
                Ok(Pattern::TreeNode(self.tree_node()?))
            }
            _ => Err(self.error("pattern")),
        }
    }

    fn reference(&mut self) -> Result<Pattern> {
        let at = self.keyword("@")?;
        if self.peek().kind != TokenKind::Ident {
            return Err(self.error("pattern name"));
        }
        let name = self.next();
        Ok(Pattern::Reference(Reference {
            at: Some(at),
            before: name.before,
            name: name.text,
        }))
    }

    fn contains(&mut self) -> Result<Contains> {
        let dot = self.keyword(".")?;
        let pattern = self.pattern()?;
        Ok(Contains {
            dot: Some(dot),
            pattern: Some(Box::new(pattern)),
        })
    }

    fn leaf_node(&mut self) -> Result<LeafNode> {
        let expr = if self.at("->") {
            let right_arrow = self.keyword("->")?;
            Expr {
                right_arrow: Some(right_arrow),
                comma: None,
                kind: self.expr_kind()?,
            }
        } else {
            Expr {
                right_arrow: None,
                comma: None,
                kind: ExprKind::BuiltIn(self.builtin()?),
            }
        };
        Ok(LeafNode { expr: Some(expr) })
    }

    fn builtin(&mut self) -> Result<BuiltIn> {
        if !self.at_builtin() {
            return Err(self.error("comparison operator"));
        }
        let t = self.next();
        let symbol = Keyword {
            before: t.before,
            value: t.text,
        };
        let expr = self.expr(None)?;
        Ok(BuiltIn {
            symbol: Some(symbol),
            expr: Some(Box::new(expr)),
        })
    }

    /// A tree node whose name starts with `(` or `!` looks like a pattern
    /// until the token after the name. Try it and rewind on failure.
    /// Once a name and a tree tail are seen the input is committed, so errors
    /// past that point are reported as they are.
    fn try_tree_node(&mut self) -> Result<Option<TreeNode>> {
        let start = self.pos;
        match self.name_expr() {
            Ok(name) if self.at_tree_tail() => self.tree_node_tail(name).map(Some),
            _ => {
                self.pos = start;
                Ok(None)
            }
        }
    }

    fn at_tree_tail(&self) -> bool {
        [":", "[", "{", ".", "->"].iter().any(|s| self.at(s)) || self.at_builtin()
    }

    fn tree_node(&mut self) -> Result<TreeNode> {
        let name = self.name_expr()?;
        self.tree_node_tail(name)
    }

    fn tree_node_tail(&mut self, name: NameExpr) -> Result<TreeNode> {
        let colon = self.optional_keyword(":");
        let pattern = if colon.is_some() {
            self.pattern()?
        } else if self.at("[") {
            Pattern::Concat(self.concat()?)
        } else if self.at("{") {
            Pattern::Interleave(self.interleave()?)
        } else if self.at(".") {
            Pattern::Contains(self.contains()?)
        } else if self.at("->") || self.at_builtin() {
            Pattern::LeafNode(self.leaf_node()?)
        } else {
            return Err(self.error("':' or a pattern after the name"));
        };
        Ok(TreeNode {
            name: Some(name),
            colon,
            pattern: Some(Box::new(pattern)),
        })
    }

    fn not(&mut self) -> Result<Pattern> {
        let exclamation = self.keyword("!")?;
        let open_paren = self.keyword("(")?;
        let pattern = self.pattern()?;
        let close_paren = self.keyword(")")?;
        Ok(Pattern::Not(Not {
            exclamation: Some(exclamation),
            open_paren: Some(open_paren),
            pattern: Some(Box::new(pattern)),
            close_paren: Some(close_paren),
        }))
    }

    /// `(a | b)`, `(a & b)`, `(a)*` or `(a)?`
    fn parenthesized(&mut self) -> Result<Pattern> {
        let open = self.keyword("(")?;
        let first = self.pattern()?;
        if self.at("|") {
            let (left, pipe, right) = self.chain(first, "|")?;
            let close = self.keyword(")")?;
            return Ok(Pattern::Or(Or {
                open_paren: Some(open),
                left_pattern: Some(Box::new(left)),
                pipe: Some(pipe),
                right_pattern: Some(Box::new(right)),
                close_paren: Some(close),
            }));
        }
        if self.at("&") {
            let (left, ampersand, right) = self.chain(first, "&")?;
            let close = self.keyword(")")?;
            return Ok(Pattern::And(And {
                open_paren: Some(open),
                left_pattern: Some(Box::new(left)),
                ampersand: Some(ampersand),
                right_pattern: Some(Box::new(right)),
                close_paren: Some(close),
            }));
        }
        let close = self.keyword(")").map_err(|_| self.error("'|', '&' or ')'"))?;
        if self.at("*") {
            let star = self.keyword("*")?;
            return Ok(Pattern::ZeroOrMore(ZeroOrMore {
                open_paren: Some(open),
                pattern: Some(Box::new(first)),
                close_paren: Some(close),
                star: Some(star),
            }));
        }
        if self.at("?") {
            let question_mark = self.keyword("?")?;
            return Ok(Pattern::Optional(Optional {
                open_paren: Some(open),
                pattern: Some(Box::new(first)),
                close_paren: Some(close),
                question_mark: Some(question_mark),
            }));
        }
        Err(self.error("'*' or '?'"))
    }

    /// Parse `op pattern` repeatedly after `first`, folding all but the last
    /// operand into left-nested, bracketless nodes. Returns the outermost
    /// node's (left, operator, right).
    fn chain(&mut self, first: Pattern, op: &str) -> Result<(Pattern, Keyword, Pattern)> {
        let mut left = first;
        let mut operator = self.keyword(op)?;
        let mut right = self.pattern()?;
        while self.at(op) {
            left = Self::binary(op, left, operator, right);
            operator = self.keyword(op)?;
            right = self.pattern()?;
        }
        Ok((left, operator, right))
    }

    /// Like [`Parser::chain`] for separators that may also trail the last
    /// operand. Returns the trailing separator, if any, as the fourth value.
    fn separated(
        &mut self,
        first: Pattern,
        sep: &str,
        close: &str,
    ) -> Result<(Pattern, Keyword, Pattern, Option<Keyword>)> {
        let mut left = first;
        let mut separator = self.keyword(sep)?;
        let mut right = self.pattern()?;
        loop {
            if !self.at(sep) {
                return Ok((left, separator, right, None));
            }
            let next_sep = self.keyword(sep)?;
            if self.at(close) {
                return Ok((left, separator, right, Some(next_sep)));
            }
            left = Self::binary(sep, left, separator, right);
            separator = next_sep;
            right = self.pattern()?;
        }
    }

    fn binary(op: &str, left: Pattern, operator: Keyword, right: Pattern) -> Pattern {
        let left_pattern = Some(Box::new(left));
        let right_pattern = Some(Box::new(right));
        match op {
            "|" => Pattern::Or(Or {
                open_paren: None,
                left_pattern,
                pipe: Some(operator),
                right_pattern,
                close_paren: None,
            }),
            "&" => Pattern::And(And {
                open_paren: None,
                left_pattern,
                ampersand: Some(operator),
                right_pattern,
                close_paren: None,
            }),
            "," => Pattern::Concat(Concat {
                open_bracket: None,
                left_pattern,
                comma: Some(operator),
                right_pattern,
                extra_comma: None,
                close_bracket: None,
            }),
            _ => Pattern::Interleave(Interleave {
                open_curly: None,
                left_pattern,
                semicolon: Some(operator),
                right_pattern,
                extra_semicolon: None,
                close_curly: None,
            }),
        }
    }

    fn concat(&mut self) -> Result<Concat> {
        let open_bracket = self.keyword("[")?;
        let first = self.pattern()?;
        let (left, comma, right, extra_comma) = self.separated(first, ",", "]")?;
        let close_bracket = self.keyword("]")?;
        Ok(Concat {
            open_bracket: Some(open_bracket),
            left_pattern: Some(Box::new(left)),
            comma: Some(comma),
            right_pattern: Some(Box::new(right)),
            extra_comma,
            close_bracket: Some(close_bracket),
        })
    }

    fn interleave(&mut self) -> Result<Interleave> {
        let open_curly = self.keyword("{")?;
        let first = self.pattern()?;
        let (left, semicolon, right, extra_semicolon) = self.separated(first, ";", "}")?;
        let close_curly = self.keyword("}")?;
        Ok(Interleave {
            open_curly: Some(open_curly),
            left_pattern: Some(Box::new(left)),
            semicolon: Some(semicolon),
            right_pattern: Some(Box::new(right)),
            extra_semicolon,
            close_curly: Some(close_curly),
        })
    }

    fn name_expr(&mut self) -> Result<NameExpr> {
        if self.peek().kind == TokenKind::Ident && self.peek().text == "_" {
            let t = self.next();
            return Ok(NameExpr::AnyName(AnyName {
                underscore: Some(Keyword {
                    before: t.before,
                    value: t.text,
                }),
            }));
        }
        if self.at("!") {
            let exclamation = self.keyword("!")?;
            let open_paren = self.keyword("(")?;
            let except = self.name_expr()?;
            let close_paren = self.keyword(")")?;
            return Ok(NameExpr::AnyNameExcept(AnyNameExcept {
                exclamation: Some(exclamation),
                open_paren: Some(open_paren),
                except: Some(Box::new(except)),
                close_paren: Some(close_paren),
            }));
        }
        if self.at("(") {
            let open_paren = self.keyword("(")?;
            let mut left = self.name_expr()?;
            let mut pipe = self.keyword("|")?;
            let mut right = self.name_expr()?;
            while self.at("|") {
                left = NameExpr::NameChoice(NameChoice {
                    open_paren: None,
                    left: Some(Box::new(left)),
                    pipe: Some(pipe),
                    right: Some(Box::new(right)),
                    close_paren: None,
                });
                pipe = self.keyword("|")?;
                right = self.name_expr()?;
            }
            let close_paren = self.keyword(")")?;
            return Ok(NameExpr::NameChoice(NameChoice {
                open_paren: Some(open_paren),
                left: Some(Box::new(left)),
                pipe: Some(pipe),
                right: Some(Box::new(right)),
                close_paren: Some(close_paren),
            }));
        }
        Ok(NameExpr::Name(self.name()?))
    }

    fn name(&mut self) -> Result<Name> {
        let t = self.peek().clone();
        let mut name = Name {
            before: t.before.clone(),
            ..Name::default()
        };
        match t.kind {
            TokenKind::Ident if self.at_cast() => {
                let (value, _) = self.cast()?;
                match value {
                    Scalar::Int(i) => name.int_value = Some(i),
                    Scalar::Uint(u) => name.uint_value = Some(u),
                    Scalar::Double(d) => name.double_value = Some(d),
                }
            }
            TokenKind::Ident => {
                self.next();
                name.bool_value = match t.text.as_str() {
                    "true" => Some(true),
                    "false" => Some(false),
                    _ => None,
                };
                if name.bool_value.is_none() {
                    name.string_value = Some(t.text);
                }
            }
            TokenKind::Str => {
                self.next();
                name.string_value = t.value;
            }
            TokenKind::Int => {
                self.next();
                name.int_value = Some(parse_int(&t)?);
            }
            TokenKind::Float => {
                self.next();
                name.double_value = Some(parse_float(&t)?);
            }
            _ => return Err(self.error("name")),
        }
        Ok(name)
    }

    /// `int(1)`, `uint(2)` or `double(3.0)`
    fn at_cast(&self) -> bool {
        let t = self.peek();
        t.kind == TokenKind::Ident
            && matches!(t.text.as_str(), "int" | "uint" | "double")
            && self.peek_at(1).is_symbol("(")
            && matches!(self.peek_at(2).kind, TokenKind::Int | TokenKind::Float)
            && self.peek_at(3).is_symbol(")")
    }

    /// Consume a cast, returning its value and source text.
    fn cast(&mut self) -> Result<(Scalar, String)> {
        let func = self.next();
        let open = self.next();
        let num = self.next();
        let close = self.next();
        let text = format!("{}{}{}{}", func.text, open.text, num.text, close.text);
        let value = match func.text.as_str() {
            "int" => Scalar::Int(parse_int(&num)?),
            "uint" => Scalar::Uint(num.text.parse().map_err(|_| invalid_number(&num))?),
            _ => Scalar::Double(parse_float(&num)?),
        };
        Ok((value, text))
    }

    fn expr(&mut self, comma: Option<Keyword>) -> Result<Expr> {
        Ok(Expr {
            right_arrow: None,
            comma,
            kind: self.expr_kind()?,
        })
    }

    fn expr_kind(&mut self) -> Result<ExprKind> {
        let t = self.peek().clone();
        match t.kind {
            TokenKind::Int | TokenKind::Float | TokenKind::Str => {
                self.next();
                let mut term = Terminal {
                    before: t.before.clone(),
                    literal: t.text.clone(),
                    ..Terminal::default()
                };
                match t.kind {
                    TokenKind::Int => term.int_value = Some(parse_int(&t)?),
                    TokenKind::Float => term.double_value = Some(parse_float(&t)?),
                    _ => term.string_value = t.value,
                }
                Ok(ExprKind::Terminal(term))
            }
            TokenKind::Variable => {
                self.next();
                let ty = Type::from_variable(&t.text[1..])
                    .ok_or_else(|| unexpected(&t, "variable type"))?;
                Ok(ExprKind::Terminal(Terminal {
                    before: t.before,
                    variable: Some(Variable { ty }),
                    ..Terminal::default()
                }))
            }
            TokenKind::Ident if t.text == "true" || t.text == "false" => {
                self.next();
                Ok(ExprKind::Terminal(Terminal {
                    before: t.before,
                    bool_value: Some(t.text == "true"),
                    literal: t.text,
                    ..Terminal::default()
                }))
            }
            TokenKind::Ident if self.at_cast() => {
                let (value, literal) = self.cast()?;
                let mut term = Terminal {
                    before: t.before,
                    literal,
                    ..Terminal::default()
                };
                match value {
                    Scalar::Int(i) => term.int_value = Some(i),
                    Scalar::Uint(u) => term.uint_value = Some(u),
                    Scalar::Double(d) => term.double_value = Some(d),
                }
                Ok(ExprKind::Terminal(term))
            }
            TokenKind::Ident if self.peek_at(1).is_symbol("(") => Ok(ExprKind::Function(self.function()?)),
            TokenKind::Symbol if t.text == "[]" => self.list_or_bytes(),
            _ => Err(self.error("expression")),
        }
    }

    fn function(&mut self) -> Result<Function> {
        let name = self.next();
        let open_paren = self.keyword("(")?;
        let mut params = Vec::new();
        if !self.at(")") {
            params.push(self.expr(None)?);
            while self.at(",") {
                let comma = self.keyword(",")?;
                params.push(self.expr(Some(comma))?);
            }
        }
        let close_paren = self.keyword(")")?;
        Ok(Function {
            before: name.before,
            name: name.text,
            open_paren: Some(open_paren),
            params,
            close_paren: Some(close_paren),
        })
    }

    /// `[]int{1, 2}`, `[][]byte{...}` or the bytes literal `[]byte{1, 2}`.
    fn list_or_bytes(&mut self) -> Result<ExprKind> {
        let brackets = self.next();
        let elem = if self.at("[]") {
            self.next();
            if !(self.peek().kind == TokenKind::Ident && self.peek().text == "byte") {
                return Err(self.error("'byte'"));
            }
            self.next();
            "[]byte".to_string()
        } else if self.peek().kind == TokenKind::Ident {
            self.next().text
        } else {
            return Err(self.error("element type"));
        };
        if elem == "byte" {
            return self.bytes(brackets);
        }
        let here = self.peek().clone();
        let ty = Type::from_list_elem(&elem).ok_or_else(|| unexpected(&here, "list element type"))?;
        let open_curly = self.keyword("{")?;
        let mut elems = Vec::new();
        if !self.at("}") {
            elems.push(self.expr(None)?);
            while self.at(",") {
                let comma = self.keyword(",")?;
                elems.push(self.expr(Some(comma))?);
            }
        }
        let close_curly = self.keyword("}")?;
        Ok(ExprKind::List(List {
            before: brackets.before,
            ty,
            open_curly: Some(open_curly),
            elems,
            close_curly: Some(close_curly),
        }))
    }

    fn bytes(&mut self, brackets: Token) -> Result<ExprKind> {
        let mut literal = String::from("[]byte{");
        self.keyword("{")?;
        let mut bytes = Vec::new();
        while !self.at("}") {
            if !bytes.is_empty() {
                self.keyword(",")?;
                literal.push_str(", ");
            }
            let t = self.peek().clone();
            if t.kind != TokenKind::Int {
                return Err(self.error("byte value"));
            }
            self.next();
            let b: u8 = t.text.parse().map_err(|_| invalid_number(&t))?;
            literal.push_str(&t.text);
            bytes.push(b);
        }
        self.keyword("}")?;
        literal.push('}');
        Ok(ExprKind::Terminal(Terminal {
            before: brackets.before,
            literal,
            bytes_value: Some(bytes),
            ..Terminal::default()
        }))
    }
}

enum Scalar {
    Int(i64),
    Uint(u64),
    Double(f64),
}

fn invalid_number(t: &Token) -> ParseError {
    ParseError::InvalidNumber {
        line: t.line,
        column: t.column,
        text: t.text.clone(),
    }
}

fn unexpected(t: &Token, expected: &str) -> ParseError {
    ParseError::Unexpected {
        line: t.line,
        column: t.column,
        expected: expected.to_string(),
        found: t.describe(),
    }
}

fn parse_int(t: &Token) -> Result<i64> {
    t.text.parse().map_err(|_| invalid_number(t))
}

fn parse_float(t: &Token) -> Result<f64> {
    t.text.parse().map_err(|_| invalid_number(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn top(src: &str) -> Pattern {
        parse(src).unwrap().top_pattern.expect("top pattern")
    }

    fn tree(p: &Pattern) -> &TreeNode {
        match p {
            Pattern::TreeNode(t) => t,
            other => panic!("expected TreeNode, got {:?}", other),
        }
    }

    #[test]
    fn test_zany_and_empty() {
        assert!(matches!(top("*"), Pattern::ZAny(_)));
        assert!(matches!(top("<empty>"), Pattern::Empty(_)));
    }

    #[test]
    fn test_and_of_contains() {
        let p = top("(.A == 1 & .B == 2)");
        let Pattern::And(and) = p else { panic!("expected And") };
        assert!(and.open_paren.is_some() && and.close_paren.is_some());
        let Some(left) = and.left_pattern.as_deref() else { panic!("left") };
        let Pattern::Contains(c) = left else { panic!("expected Contains") };
        let t = tree(c.pattern.as_deref().unwrap());
        assert_eq!(t.name.as_ref().unwrap().to_string(), "A");
        assert!(t.colon.is_none());
        let Some(Pattern::LeafNode(leaf)) = t.pattern.as_deref() else { panic!("leaf") };
        let ExprKind::BuiltIn(b) = &leaf.expr.as_ref().unwrap().kind else { panic!("builtin") };
        assert_eq!(b.symbol.as_ref().unwrap().value, "==");
        let ExprKind::Terminal(term) = &b.expr.as_ref().unwrap().kind else { panic!("terminal") };
        assert_eq!(term.int_value, Some(1));
        assert_eq!(term.literal, "1");
    }

    #[test]
    fn test_or_chain_nests_left() {
        let Pattern::Or(outer) = top("(* | <empty> | @a)") else { panic!("Or") };
        assert!(outer.open_paren.is_some());
        assert!(matches!(outer.right_pattern.as_deref(), Some(Pattern::Reference(_))));
        let Some(Pattern::Or(inner)) = outer.left_pattern.as_deref() else { panic!("inner Or") };
        assert!(inner.open_paren.is_none() && inner.close_paren.is_none());
        assert!(matches!(inner.left_pattern.as_deref(), Some(Pattern::ZAny(_))));
    }

    #[test]
    fn test_concat_with_trailing_comma() {
        let Pattern::Concat(c) = top("[*, *, *,]") else { panic!("Concat") };
        assert!(c.extra_comma.is_some());
        assert!(matches!(c.left_pattern.as_deref(), Some(Pattern::Concat(_))));
        let Pattern::Concat(c) = top("[*, *]") else { panic!("Concat") };
        assert!(c.extra_comma.is_none());
    }

    #[test]
    fn test_interleave_under_any_name() {
        let p = top(".F._ {Name *= \"art\"; *; Anatomy $= \"omen\";}");
        let Pattern::Contains(outer) = p else { panic!("Contains") };
        let f = tree(outer.pattern.as_deref().unwrap());
        let Some(Pattern::Contains(inner)) = f.pattern.as_deref() else { panic!("inner Contains") };
        let any = tree(inner.pattern.as_deref().unwrap());
        assert!(matches!(any.name, Some(NameExpr::AnyName(_))));
        let Some(Pattern::Interleave(i)) = any.pattern.as_deref() else { panic!("Interleave") };
        assert!(i.extra_semicolon.is_some());
    }

    #[test]
    fn test_zero_or_more_optional_not() {
        assert!(matches!(top("(*)*"), Pattern::ZeroOrMore(_)));
        assert!(matches!(top("(*)?"), Pattern::Optional(_)));
        assert!(matches!(top("!(*)"), Pattern::Not(_)));
    }

    #[test]
    fn test_name_choice_and_except() {
        let t = tree(&top("(A | B): *")).clone();
        assert!(matches!(t.name, Some(NameExpr::NameChoice(_))));
        let t = tree(&top("!(A): *")).clone();
        assert!(matches!(t.name, Some(NameExpr::AnyNameExcept(_))));
    }

    #[test]
    fn test_function_and_variable() {
        let p = top("A: -> contains($string, \"Met\")");
        let Some(Pattern::LeafNode(leaf)) = tree(&p).pattern.as_deref() else { panic!("leaf") };
        let expr = leaf.expr.as_ref().unwrap();
        assert!(expr.right_arrow.is_some());
        let ExprKind::Function(f) = &expr.kind else { panic!("function") };
        assert_eq!(f.name, "contains");
        assert_eq!(f.params.len(), 2);
        assert!(f.params[0].comma.is_none());
        assert!(f.params[1].comma.is_some());
        let ExprKind::Terminal(v) = &f.params[0].kind else { panic!("terminal") };
        assert_eq!(v.variable, Some(Variable { ty: Type::SingleString }));
    }

    #[test]
    fn test_list_and_bytes() {
        let p = top("A == []int{1, 2, 3}");
        let Some(Pattern::LeafNode(leaf)) = tree(&p).pattern.as_deref() else { panic!("leaf") };
        let ExprKind::BuiltIn(b) = &leaf.expr.as_ref().unwrap().kind else { panic!("builtin") };
        let ExprKind::List(list) = &b.expr.as_ref().unwrap().kind else { panic!("list") };
        assert_eq!(list.ty, Type::ListInt);
        assert_eq!(list.elems.len(), 3);

        let p = top("A == []byte{1, 2}");
        let Some(Pattern::LeafNode(leaf)) = tree(&p).pattern.as_deref() else { panic!("leaf") };
        let ExprKind::BuiltIn(b) = &leaf.expr.as_ref().unwrap().kind else { panic!("builtin") };
        let ExprKind::Terminal(t) = &b.expr.as_ref().unwrap().kind else { panic!("bytes") };
        assert_eq!(t.bytes_value.as_deref(), Some(&[1u8, 2][..]));
        assert_eq!(t.literal, "[]byte{1, 2}");
    }

    #[test]
    fn test_casts() {
        let p = top("uint(3) == double(1.5)");
        let t = tree(&p);
        let Some(NameExpr::Name(n)) = &t.name else { panic!("name") };
        assert_eq!(n.uint_value, Some(3));
        let Some(Pattern::LeafNode(leaf)) = t.pattern.as_deref() else { panic!("leaf") };
        let ExprKind::BuiltIn(b) = &leaf.expr.as_ref().unwrap().kind else { panic!("builtin") };
        let ExprKind::Terminal(term) = &b.expr.as_ref().unwrap().kind else { panic!("terminal") };
        assert_eq!(term.double_value, Some(1.5));
        assert_eq!(term.literal, "double(1.5)");
    }

    #[test]
    fn test_pattern_decls_and_trivia() {
        let g = parse("#main = @other\n#other = * // tail\n").unwrap();
        assert!(g.top_pattern.is_none());
        assert_eq!(g.pattern_decls.len(), 2);
        assert_eq!(g.pattern_decls[0].name, "main");
        assert_eq!(g.pattern_decls[1].name, "other");
        assert_eq!(g.pattern_decls[1].hash.as_ref().unwrap().to_string(), "\n#");
        let after = g.after.unwrap();
        assert_eq!(after.space, vec![" ", "// tail", "\n"]);
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse("  "), Err(ParseError::EmptyGrammar));
        assert!(matches!(
            parse("(* | *"),
            Err(ParseError::Unexpected { line: 1, column: 7, .. })
        ));
        assert!(matches!(parse("(*)"), Err(ParseError::Unexpected { .. })));
        assert!(matches!(parse("A"), Err(ParseError::Unexpected { .. })));
        assert!(matches!(parse("* *"), Err(ParseError::Unexpected { .. })));
        assert!(matches!(
            parse("A == 99999999999999999999"),
            Err(ParseError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_error_inside_name_choice_tree_keeps_position() {
        assert!(matches!(
            parse("(A | B): [*,"),
            Err(ParseError::Unexpected { line: 1, column: 13, .. })
        ));
        let err = parse("!(A) == ").unwrap_err();
        assert_eq!(err.position(), Some((1, 9)));
        // not a tree node at all: falls back to the pattern forms
        assert!(matches!(
            parse("(A | *)"),
            Err(ParseError::Unexpected { line: 1, column: 4, .. })
        ));
    }

    #[test]
    fn test_reference_keeps_name_trivia() {
        let Pattern::Reference(r) = top("@ /*to*/ main") else { panic!("Reference") };
        assert_eq!(r.name, "main");
        assert_eq!(r.before.unwrap().space, vec![" ", "/*to*/", " "]);
    }
}
