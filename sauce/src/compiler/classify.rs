//! Turns tag bodies into statements.
//!
//! A tag body is tested against an ordered list of matchers.  The first
//! matcher that accepts the body decides the statement, anything that is not
//! accepted by any matcher is a value.  Keywords are case insensitive.
use crate::compiler::ast::Stmt;

type Matcher = fn(&str) -> Option<Stmt>;

/// The matchers in order of precedence.
const MATCHERS: [Matcher; 7] = [
    match_variable,
    match_if,
    match_else_if,
    match_else,
    match_end,
    match_foreach,
    match_debug,
];

/// Classifies an already trimmed tag body.
pub fn classify(body: &str) -> Stmt {
    MATCHERS
        .iter()
        .find_map(|matcher| matcher(body))
        .unwrap_or_else(|| Stmt::Value { expr: body.into() })
}

fn strip_keyword<'a>(s: &'a str, keyword: &str) -> Option<&'a str> {
    let prefix = some!(s.get(..keyword.len()));
    if prefix.eq_ignore_ascii_case(keyword) {
        Some(&s[keyword.len()..])
    } else {
        None
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Strips a keyword that must not be followed by another word character.
fn strip_word<'a>(s: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = some!(strip_keyword(s, keyword));
    if rest.starts_with(is_word_char) {
        None
    } else {
        Some(rest)
    }
}

/// Strips a keyword followed by an opening parenthesis and returns what
/// follows the parenthesis.
fn strip_call<'a>(s: &'a str, keyword: &str) -> Option<&'a str> {
    strip_keyword(s, keyword)?.trim_start().strip_prefix('(')
}

/// Returns the inside of an argument list whose opening parenthesis was
/// already consumed.  A missing closing parenthesis is tolerated.
fn call_args(rest: &str) -> &str {
    let rest = rest.trim();
    rest.strip_suffix(')').unwrap_or(rest).trim()
}

fn split_identifier(s: &str) -> Option<(&str, &str)> {
    let len = s.find(|c: char| !is_word_char(c)).unwrap_or(s.len());
    if len == 0 {
        None
    } else {
        Some(s.split_at(len))
    }
}

fn match_assignment(s: &str) -> Option<(&str, &str)> {
    let (name, rest) = some!(split_identifier(s));
    let rest = some!(rest.trim_start().strip_prefix('='));
    if rest.starts_with(['=', '>', '<']) {
        return None;
    }
    let expr = rest.trim();
    if expr.is_empty() {
        None
    } else {
        Some((name, expr))
    }
}

fn match_variable(s: &str) -> Option<Stmt> {
    let declared = strip_keyword(s, "var")
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .and_then(|rest| match_assignment(rest.trim_start()));
    let (declare, (name, expr)) = match declared {
        Some(assignment) => (true, assignment),
        None => (false, some!(match_assignment(s))),
    };
    Some(Stmt::Variable {
        name: name.into(),
        expr: expr.into(),
        declare,
    })
}

fn match_if(s: &str) -> Option<Stmt> {
    let rest = some!(strip_call(s, "if"));
    Some(Stmt::If {
        predicate: call_args(rest).into(),
    })
}

fn match_else_if(s: &str) -> Option<Stmt> {
    let rest = some!(strip_keyword(s, "else"));
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = some!(strip_call(rest.trim_start(), "if"));
    Some(Stmt::ElseIf {
        predicate: call_args(rest).into(),
    })
}

fn match_else(s: &str) -> Option<Stmt> {
    strip_word(s, "else").map(|_| Stmt::Else)
}

fn match_end(s: &str) -> Option<Stmt> {
    strip_word(s, "end").map(|_| Stmt::End)
}

fn match_foreach(s: &str) -> Option<Stmt> {
    let header = call_args(some!(strip_call(s, "foreach")));
    let parsed = split_identifier(header).and_then(|(var, rest)| {
        let iter = strip_word(rest.trim_start(), "in")?;
        Some((var, iter.trim()))
    });
    let (var, iter) = parsed.unwrap_or(("", ""));
    Some(Stmt::ForEach {
        var: var.into(),
        iter: iter.into(),
    })
}

fn match_debug(s: &str) -> Option<Stmt> {
    let rest = some!(strip_call(s, "debug"));
    Some(Stmt::Debug {
        expr: call_args(rest).into(),
    })
}
