use std::borrow::Cow;
use std::fmt;

use crate::compiler::ast::{self, Expr, NodeId, Stmt, SyntaxTree};
use crate::compiler::classify::classify;
use crate::compiler::lexer::{ExprTokenizer, Tokenizer};
use crate::compiler::tokens::{ExprToken, Span, Token};
use crate::error::{Error, ErrorKind};
use crate::syntax::Syntax;
use crate::value::Value;

/// Every nesting level descends through all precedence levels, so this
/// bounds the native stack use of parsing (and evaluating) an expression.
const MAX_RECURSION: usize = 50;

fn unexpected<D: fmt::Display>(unexpected: D, expected: &str) -> Error {
    Error::new(
        ErrorKind::SyntaxError,
        format!("unexpected {unexpected}, expected {expected}"),
    )
}

fn unexpected_eof(expected: &str) -> Error {
    unexpected("end of input", expected)
}

fn syntax_error(msg: Cow<'static, str>) -> Error {
    Error::new(ErrorKind::SyntaxError, msg)
}

fn unmatched_close(body: &str, span: Span) -> Error {
    let mut err = Error::new(
        ErrorKind::UnmatchedClose,
        format!("`{body}` closes a branch that was never opened"),
    );
    err.set_line(span.start_line as usize);
    err
}

/// Builds the syntax tree for a template.
///
/// Text becomes a child of the current cursor.  Tags that close a branch
/// (`else if`, `else` and `end`) first move the cursor up to the parent of
/// the open branch, tags that open a branch (`if`, `else if`, `else` and
/// `foreach`) move the cursor onto themselves after they were attached.
/// This means the clauses of an `if` chain and the closing `end` are
/// siblings, each clause holding its own body as children.
pub fn parse(source: &str, syntax: &Syntax) -> Result<SyntaxTree, Error> {
    let mut tree = SyntaxTree::new();
    let mut cursor = NodeId::ROOT;
    let mut prev = NodeId::ROOT;

    for (token, span) in Tokenizer::new(source, syntax) {
        match token {
            Token::TemplateData(data) => {
                prev = tree.append(cursor, prev, Stmt::Text, data.into(), span);
            }
            Token::Statement(body) => {
                let body = body.trim();
                let stmt = classify(body);
                let kind = stmt.kind();
                if kind.is_branch_end() {
                    cursor = match tree[cursor].parent {
                        Some(parent) => parent,
                        None => return Err(unmatched_close(body, span)),
                    };
                }
                let id = tree.append(cursor, prev, stmt, body.into(), span);
                tracing::trace!(kind = %kind, line = span.start_line, "attached node");
                if kind.is_branch_start() {
                    cursor = id;
                }
                prev = id;
            }
        }
    }

    Ok(tree)
}

struct TokenStream<'a> {
    tokenizer: ExprTokenizer<'a>,
    current: Option<ExprToken<'a>>,
}

impl<'a> TokenStream<'a> {
    pub fn new(source: &'a str) -> Result<TokenStream<'a>, Error> {
        let mut tokenizer = ExprTokenizer::new(source);
        let current = ok!(tokenizer.next_token());
        Ok(TokenStream { tokenizer, current })
    }

    /// Advance the stream.
    pub fn next(&mut self) -> Result<Option<ExprToken<'a>>, Error> {
        let rv = self.current.take();
        self.current = ok!(self.tokenizer.next_token());
        Ok(rv)
    }

    /// Look at the current token
    pub fn current(&self) -> Option<&ExprToken<'a>> {
        self.current.as_ref()
    }
}

fn is_keyword(token: Option<&ExprToken<'_>>, keyword: &str) -> bool {
    matches!(token, Some(ExprToken::Ident(ident)) if ident.eq_ignore_ascii_case(keyword))
}

macro_rules! expect_token {
    ($parser:expr, $match:pat => $target:expr, $expectation:expr) => {{
        match ok!($parser.stream.next()) {
            Some($match) => $target,
            Some(token) => return Err(unexpected(token, $expectation)),
            None => return Err(unexpected_eof($expectation)),
        }
    }};
}

macro_rules! binop {
    ($func:ident, $next:ident, { $($tok:tt)* }) => {
        fn $func(&mut self) -> Result<Expr, Error> {
            let mut left = ok!(self.$next());
            let depth = self.depth;
            loop {
                let op = match self.stream.current() {
                    $($tok)*
                    _ => break,
                };
                // evaluating a chain recurses once per operator
                self.depth += 1;
                if self.depth > MAX_RECURSION {
                    return Err(syntax_error(Cow::Borrowed(
                        "expression exceeds maximum recursion limits",
                    )));
                }
                ok!(self.stream.next());
                let right = ok!(self.$next());
                left = Expr::BinOp {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                };
            }
            self.depth = depth;
            Ok(left)
        }
    };
}

macro_rules! with_recursion_guard {
    ($parser:expr, $expr:expr) => {{
        $parser.depth += 1;
        if $parser.depth > MAX_RECURSION {
            return Err(syntax_error(Cow::Borrowed(
                "expression exceeds maximum recursion limits",
            )));
        }
        let rv = $expr;
        $parser.depth -= 1;
        rv
    }};
}

struct Parser<'a> {
    stream: TokenStream<'a>,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Result<Parser<'a>, Error> {
        Ok(Parser {
            stream: ok!(TokenStream::new(source)),
            depth: 0,
        })
    }

    /// Parses an expression and asserts that there is no more input after it.
    fn parse_standalone_expr(&mut self) -> Result<Expr, Error> {
        let rv = ok!(self.parse_expr());
        match ok!(self.stream.next()) {
            None => Ok(rv),
            Some(token) => Err(unexpected(token, "end of expression")),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, Error> {
        with_recursion_guard!(self, self.parse_or())
    }

    binop!(parse_or, parse_and, {
        Some(ExprToken::Or) => ast::BinOpKind::ScOr,
        tok if is_keyword(tok, "or") => ast::BinOpKind::ScOr,
    });
    binop!(parse_and, parse_not, {
        Some(ExprToken::And) => ast::BinOpKind::ScAnd,
        tok if is_keyword(tok, "and") => ast::BinOpKind::ScAnd,
    });

    fn parse_not(&mut self) -> Result<Expr, Error> {
        let current = self.stream.current();
        if matches!(current, Some(ExprToken::Bang)) || is_keyword(current, "not") {
            ok!(self.stream.next());
            let expr = ok!(with_recursion_guard!(self, self.parse_not()));
            Ok(Expr::UnaryOp {
                op: ast::UnaryOpKind::Not,
                expr: Box::new(expr),
            })
        } else {
            self.parse_compare()
        }
    }

    binop!(parse_compare, parse_math1, {
        Some(ExprToken::Eq) => ast::BinOpKind::Eq,
        Some(ExprToken::Ne) => ast::BinOpKind::Ne,
        Some(ExprToken::Lt) => ast::BinOpKind::Lt,
        Some(ExprToken::Lte) => ast::BinOpKind::Lte,
        Some(ExprToken::Gt) => ast::BinOpKind::Gt,
        Some(ExprToken::Gte) => ast::BinOpKind::Gte,
        tok if is_keyword(tok, "in") => ast::BinOpKind::In,
        tok if is_keyword(tok, "contains") => ast::BinOpKind::Contains,
        tok if is_keyword(tok, "beginswith") => ast::BinOpKind::BeginsWith,
        tok if is_keyword(tok, "endswith") => ast::BinOpKind::EndsWith,
    });
    binop!(parse_math1, parse_math2, {
        Some(ExprToken::Plus) => ast::BinOpKind::Add,
        Some(ExprToken::Minus) => ast::BinOpKind::Sub,
    });
    binop!(parse_math2, parse_unary, {
        Some(ExprToken::Mul) => ast::BinOpKind::Mul,
        Some(ExprToken::Div) => ast::BinOpKind::Div,
    });

    fn parse_unary(&mut self) -> Result<Expr, Error> {
        if matches!(self.stream.current(), Some(ExprToken::Minus)) {
            ok!(self.stream.next());
            let expr = ok!(with_recursion_guard!(self, self.parse_unary()));
            Ok(Expr::UnaryOp {
                op: ast::UnaryOpKind::Neg,
                expr: Box::new(expr),
            })
        } else {
            self.parse_pow()
        }
    }

    fn parse_pow(&mut self) -> Result<Expr, Error> {
        let left = ok!(self.parse_postfix());
        if matches!(self.stream.current(), Some(ExprToken::Pow)) {
            ok!(self.stream.next());
            let right = ok!(with_recursion_guard!(self, self.parse_unary()));
            Ok(Expr::BinOp {
                op: ast::BinOpKind::Pow,
                left: Box::new(left),
                right: Box::new(right),
            })
        } else {
            Ok(left)
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, Error> {
        let mut expr = ok!(self.parse_primary());
        loop {
            match self.stream.current() {
                Some(ExprToken::BracketOpen) => {
                    ok!(self.stream.next());
                    let subscript = ok!(self.parse_expr());
                    expect_token!(self, ExprToken::BracketClose => (), "`]`");
                    expr = Expr::GetItem {
                        expr: Box::new(expr),
                        subscript: Box::new(subscript),
                    };
                }
                Some(ExprToken::Dot) => {
                    ok!(self.stream.next());
                    let name = ok!(self.parse_path_segment());
                    expr = Expr::GetAttr {
                        expr: Box::new(expr),
                        name,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_path_segment(&mut self) -> Result<String, Error> {
        match ok!(self.stream.next()) {
            Some(ExprToken::Ident(name)) => Ok(name.into()),
            Some(ExprToken::Number(idx)) if idx.fract() == 0.0 && idx >= 0.0 => {
                Ok((idx as u64).to_string())
            }
            Some(token) => Err(unexpected(token, "attribute name")),
            None => Err(unexpected_eof("attribute name")),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, Error> {
        let token = match ok!(self.stream.next()) {
            Some(token) => token,
            None => return Err(unexpected_eof("expression")),
        };
        match token {
            ExprToken::Number(num) => Ok(Expr::Const(Value::Number(num))),
            ExprToken::Str(s) => Ok(Expr::Const(Value::String(s.into()))),
            ExprToken::String(s) => Ok(Expr::Const(Value::String(s))),
            ExprToken::Ident(ident) => self.parse_ident(ident),
            ExprToken::ParenOpen => {
                let expr = ok!(self.parse_expr());
                expect_token!(self, ExprToken::ParenClose => (), "`)`");
                Ok(expr)
            }
            ExprToken::BracketOpen => self.parse_list(),
            token => Err(unexpected(token, "expression")),
        }
    }

    fn parse_ident(&mut self, ident: &str) -> Result<Expr, Error> {
        match &ident.to_ascii_lowercase() as &str {
            "true" | "yes" => return Ok(Expr::Const(Value::Bool(true))),
            "false" | "no" => return Ok(Expr::Const(Value::Bool(false))),
            "nil" | "null" => return Ok(Expr::Const(Value::None)),
            _ => {}
        }
        let mut path = ident.to_string();
        while matches!(self.stream.current(), Some(ExprToken::Dot)) {
            ok!(self.stream.next());
            path.push('.');
            path.push_str(&ok!(self.parse_path_segment()));
        }
        Ok(Expr::Path(path))
    }

    fn parse_list(&mut self) -> Result<Expr, Error> {
        let mut items = Vec::new();
        loop {
            if matches!(self.stream.current(), Some(ExprToken::BracketClose)) {
                break;
            }
            if !items.is_empty() {
                expect_token!(self, ExprToken::Comma => (), "`,`");
                if matches!(self.stream.current(), Some(ExprToken::BracketClose)) {
                    break;
                }
            }
            items.push(ok!(self.parse_expr()));
        }
        expect_token!(self, ExprToken::BracketClose => (), "`]`");
        Ok(Expr::List(items))
    }
}

/// Parses a standalone expression.
pub fn parse_expr(source: &str) -> Result<Expr, Error> {
    let mut parser = ok!(Parser::new(source));
    parser.parse_standalone_expr()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::compiler::ast::{BinOpKind, NodeKind, UnaryOpKind};

    use similar_asserts::assert_eq;

    fn kinds(tree: &SyntaxTree, id: NodeId) -> Vec<NodeKind> {
        tree[id].children.iter().map(|&x| tree[x].kind()).collect()
    }

    #[test]
    fn test_if_chain_structure() {
        let tree = parse(
            "{% if(a) %}A{% else if(b) %}B{% else %}C{% end %}!",
            &Syntax::default(),
        )
        .unwrap();
        let root = tree.root();
        assert_eq!(
            kinds(&tree, root),
            vec![
                NodeKind::If,
                NodeKind::ElseIf,
                NodeKind::Else,
                NodeKind::End,
                NodeKind::Text,
            ]
        );
        for &clause in &tree[root].children[..3] {
            assert_eq!(kinds(&tree, clause), vec![NodeKind::Text]);
        }
    }

    #[test]
    fn test_nested_foreach() {
        let tree = parse(
            "{% foreach(a in x) %}{% foreach(b in a) %}{% b %}{% end %}{% end %}",
            &Syntax::default(),
        )
        .unwrap();
        let outer = tree[tree.root()].children[0];
        assert_eq!(
            kinds(&tree, tree.root()),
            vec![NodeKind::ForEach, NodeKind::End]
        );
        assert_eq!(kinds(&tree, outer), vec![NodeKind::ForEach, NodeKind::End]);
        let inner = tree[outer].children[0];
        assert_eq!(kinds(&tree, inner), vec![NodeKind::Value]);
        assert_eq!(tree.depth(tree[inner].children[0]), 3);
    }

    #[test]
    fn test_chain_threads_through_branches() {
        let source = "a{% if(x) %}b{% foreach(i in y) %}c{% end %}{% end %}d";
        let tree = parse(source, &Syntax::default()).unwrap();
        let chain: Vec<_> = tree
            .iter_chain()
            .map(|(_, node)| node.content.as_str())
            .collect();
        assert_eq!(
            chain,
            vec!["", "a", "if(x)", "b", "foreach(i in y)", "c", "end", "end", "d"]
        );
        let mut prev = None;
        for (id, node) in tree.iter_chain() {
            assert_eq!(node.prev, prev);
            prev = Some(id);
        }
        assert_eq!(tree.iter_chain().count(), tree.len());
    }

    #[test]
    fn test_unmatched_close() {
        for source in ["{% end %}", "{% else %}", "{% else if(x) %}", "{% if(x) %}{% end %}{% end %}"] {
            let err = parse(source, &Syntax::default()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnmatchedClose);
        }
    }

    #[test]
    fn test_unmatched_close_line() {
        let err = parse("a\nb\n{% end %}", &Syntax::default()).unwrap_err();
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_unclosed_branch_is_accepted() {
        let tree = parse("{% if(x) %}open", &Syntax::default()).unwrap();
        assert_eq!(kinds(&tree, tree.root()), vec![NodeKind::If]);
    }

    #[test]
    fn test_deterministic() {
        let source = "x{% var a = 1 %}{% if(a) %}{% a %}{% end %}{% debug(a) %}";
        let a: Vec<_> = parse(source, &Syntax::default())
            .unwrap()
            .iter_preorder()
            .map(|x| x.1.kind())
            .collect();
        let b: Vec<_> = parse(source, &Syntax::default())
            .unwrap()
            .iter_preorder()
            .map(|x| x.1.kind())
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_expr_precedence() {
        assert_eq!(
            parse_expr("1 + 2 * x").unwrap(),
            Expr::BinOp {
                op: BinOpKind::Add,
                left: Box::new(Expr::Const(Value::from(1))),
                right: Box::new(Expr::BinOp {
                    op: BinOpKind::Mul,
                    left: Box::new(Expr::Const(Value::from(2))),
                    right: Box::new(Expr::Path("x".into())),
                }),
            }
        );
    }

    #[test]
    fn test_expr_boolean() {
        assert_eq!(
            parse_expr("not a AND b").unwrap(),
            Expr::BinOp {
                op: BinOpKind::ScAnd,
                left: Box::new(Expr::UnaryOp {
                    op: UnaryOpKind::Not,
                    expr: Box::new(Expr::Path("a".into())),
                }),
                right: Box::new(Expr::Path("b".into())),
            }
        );
    }

    #[test]
    fn test_expr_paths() {
        assert_eq!(
            parse_expr("user.addresses.0.city").unwrap(),
            Expr::Path("user.addresses.0.city".into())
        );
        assert_eq!(
            parse_expr("items[0].name").unwrap(),
            Expr::GetAttr {
                expr: Box::new(Expr::GetItem {
                    expr: Box::new(Expr::Path("items".into())),
                    subscript: Box::new(Expr::Const(Value::from(0))),
                }),
                name: "name".into(),
            }
        );
    }

    #[test]
    fn test_expr_literals() {
        assert_eq!(parse_expr("YES").unwrap(), Expr::Const(Value::Bool(true)));
        assert_eq!(parse_expr("nil").unwrap(), Expr::Const(Value::None));
        assert_eq!(
            parse_expr("[1, 'a',]").unwrap(),
            Expr::List(vec![
                Expr::Const(Value::from(1)),
                Expr::Const(Value::from("a")),
            ])
        );
    }

    #[test]
    fn test_expr_errors() {
        assert_eq!(
            parse_expr("1 +").unwrap_err().to_string(),
            "syntax error: unexpected end of input, expected expression"
        );
        assert_eq!(
            parse_expr("(1").unwrap_err().to_string(),
            "syntax error: unexpected end of input, expected `)`"
        );
        assert_eq!(
            parse_expr("a b").unwrap_err().to_string(),
            "syntax error: unexpected identifier, expected end of expression"
        );
        assert!(parse_expr("").is_err());
    }

    #[test]
    fn test_expr_recursion_limit() {
        let source = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        let err = parse_expr(&source).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SyntaxError);

        let source = format!("{}1{}", "(".repeat(40), ")".repeat(40));
        assert_eq!(parse_expr(&source).unwrap(), Expr::Const(Value::Number(1.0)));

        let source = format!("{}1", "-".repeat(200));
        assert!(parse_expr(&source).is_err());
        let source = format!("{}1{}", "[".repeat(200), "]".repeat(200));
        assert!(parse_expr(&source).is_err());
        let source = vec!["1"; 200].join(" + ");
        assert!(parse_expr(&source).is_err());
        let source = vec!["1"; 30].join(" + ");
        assert!(parse_expr(&source).is_ok());
    }
}
