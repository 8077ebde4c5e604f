use std::cmp::Ordering;

use crate::compiler::ast::{BinOpKind, Expr, UnaryOpKind};
use crate::compiler::parser::parse_expr;
use crate::error::Error;
use crate::value::{ops, Value};
use crate::vm::context::Context;

/// Characters that make a value tag go through the expression parser.
const EXPRESSION_CHARS: &[char] = &['*', '-', '+', '(', ')', '[', ']', '=', '/'];

/// Controls how a tag body is evaluated.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EvalOptions {
    /// Bodies starting with `[` or `{` are tried as JSON first.
    pub allow_json: bool,
    /// Bodies are parsed as expressions.  Otherwise the body is looked up
    /// as a single key path.
    pub allow_expressions: bool,
}

impl Default for EvalOptions {
    fn default() -> EvalOptions {
        EvalOptions {
            allow_json: true,
            allow_expressions: true,
        }
    }
}

impl EvalOptions {
    /// The options used for value tags.
    ///
    /// JSON is never parsed.  Expressions are only parsed if the body
    /// contains an operator, a bracket or a digit, plain key paths are
    /// looked up directly.
    pub fn for_value_tag(body: &str) -> EvalOptions {
        EvalOptions {
            allow_json: false,
            allow_expressions: body.contains(EXPRESSION_CHARS)
                || body.contains(|c: char| c.is_ascii_digit()),
        }
    }
}

fn log_error(source: &str, err: &Error) {
    tracing::debug!(source, error = %err, "could not evaluate expression");
}

/// Evaluates a tag body.
///
/// Failures are not reported to the caller, they produce no value.
pub fn evaluate(ctx: &Context, source: &str, opts: EvalOptions) -> Option<Value> {
    let source = source.trim();
    if opts.allow_json && (source.starts_with('[') || source.starts_with('{')) {
        match serde_json::from_str::<serde_json::Value>(source) {
            Ok(value) => return Some(Value::from(value)),
            Err(err) => {
                tracing::debug!(source, error = %err, "body is not valid json");
                if !opts.allow_expressions {
                    return None;
                }
            }
        }
    }

    if opts.allow_expressions {
        match parse_expr(source) {
            Ok(expr) => eval_expr(ctx, &expr),
            Err(err) => {
                log_error(source, &err);
                None
            }
        }
    } else {
        ctx.load(source)
    }
}

/// Evaluates a condition.
///
/// Conditions that cannot be parsed are false.
pub fn evaluate_predicate(ctx: &Context, source: &str) -> bool {
    match parse_expr(source) {
        Ok(expr) => is_true(eval_expr(ctx, &expr).as_ref()),
        Err(err) => {
            log_error(source, &err);
            false
        }
    }
}

fn is_true(value: Option<&Value>) -> bool {
    value.map_or(false, Value::is_true)
}

/// Turns the result of an operation into a value.  Failed operations
/// produce no value.
fn op_result(result: Result<Value, Error>) -> Option<Value> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!(error = %err, "operation failed");
            None
        }
    }
}

fn contained_in(item: &Value, container: &Value) -> Result<bool, Error> {
    ops::contains(container, item)
}

fn test_result(result: Result<bool, Error>) -> bool {
    op_result(result.map(Value::from)).map_or(false, |x| x.is_true())
}

/// Evaluates a parsed expression.
pub fn eval_expr(ctx: &Context, expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Const(value) => Some(value.clone()),
        Expr::Path(path) => ctx.load(path),
        Expr::GetAttr { expr, name } => eval_expr(ctx, expr)?.get_attr(name),
        Expr::GetItem { expr, subscript } => {
            let value = some!(eval_expr(ctx, expr));
            let key = some!(eval_expr(ctx, subscript));
            value.get_item(&key)
        }
        Expr::UnaryOp { op, expr } => {
            let value = eval_expr(ctx, expr);
            match op {
                UnaryOpKind::Not => Some(Value::Bool(!is_true(value.as_ref()))),
                UnaryOpKind::Neg => op_result(ops::neg(&value?)),
            }
        }
        Expr::BinOp { op, left, right } => eval_bin_op(ctx, *op, left, right),
        Expr::List(items) => Some(Value::Seq(
            items
                .iter()
                .map(|item| eval_expr(ctx, item).unwrap_or_default())
                .collect(),
        )),
    }
}

fn eval_bin_op(ctx: &Context, op: BinOpKind, left: &Expr, right: &Expr) -> Option<Value> {
    let lhs = eval_expr(ctx, left);

    // short circuiting operators only evaluate the right side if needed
    match op {
        BinOpKind::ScAnd => {
            return Some(Value::Bool(
                is_true(lhs.as_ref()) && is_true(eval_expr(ctx, right).as_ref()),
            ));
        }
        BinOpKind::ScOr => {
            return Some(Value::Bool(
                is_true(lhs.as_ref()) || is_true(eval_expr(ctx, right).as_ref()),
            ));
        }
        _ => {}
    }

    // every other operator yields nothing if an operand is absent
    let lhs = some!(lhs);
    let rhs = some!(eval_expr(ctx, right));
    let cmp = |f: fn(Ordering) -> bool| {
        Some(Value::Bool(ops::partial_cmp(&lhs, &rhs).map_or(false, f)))
    };
    let test = |f: fn(&Value, &Value) -> Result<bool, Error>| {
        Some(Value::Bool(test_result(f(&lhs, &rhs))))
    };

    match op {
        BinOpKind::Eq => Some(Value::Bool(ops::loose_eq(&lhs, &rhs))),
        BinOpKind::Ne => Some(Value::Bool(!ops::loose_eq(&lhs, &rhs))),
        BinOpKind::Lt => cmp(Ordering::is_lt),
        BinOpKind::Lte => cmp(Ordering::is_le),
        BinOpKind::Gt => cmp(Ordering::is_gt),
        BinOpKind::Gte => cmp(Ordering::is_ge),
        BinOpKind::In => test(contained_in),
        BinOpKind::Contains => test(ops::contains),
        BinOpKind::BeginsWith => test(ops::begins_with),
        BinOpKind::EndsWith => test(ops::ends_with),
        BinOpKind::Add => op_result(ops::add(&lhs, &rhs)),
        BinOpKind::Sub => op_result(ops::sub(&lhs, &rhs)),
        BinOpKind::Mul => op_result(ops::mul(&lhs, &rhs)),
        BinOpKind::Div => op_result(ops::div(&lhs, &rhs)),
        BinOpKind::Pow => op_result(ops::pow(&lhs, &rhs)),
        BinOpKind::ScAnd | BinOpKind::ScOr => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use similar_asserts::assert_eq;

    fn eval_with(model: serde_json::Value, source: &str) -> Option<Value> {
        let ctx = Context::new(&model);
        evaluate(&ctx, source, EvalOptions::default())
    }

    fn eval(source: &str) -> Option<Value> {
        eval_with(json!({"x": 5, "name": "Peter", "items": [1, 2, 3]}), source)
    }

    #[test]
    fn test_value_tag_options() {
        assert_eq!(
            EvalOptions::for_value_tag("user.name"),
            EvalOptions {
                allow_json: false,
                allow_expressions: false,
            }
        );
        assert!(EvalOptions::for_value_tag("price * 2").allow_expressions);
        assert!(EvalOptions::for_value_tag("items.0").allow_expressions);
        assert!(EvalOptions::for_value_tag("f(x)").allow_expressions);
        assert!(!EvalOptions::for_value_tag("[1]").allow_json);
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1 + 2 * 3"), Some(Value::from(7)));
        assert_eq!(eval("(1 + 2) * 3"), Some(Value::from(9)));
        assert_eq!(eval("x / 2"), Some(Value::from(2.5)));
        assert_eq!(eval("2 ** 3 ** 2"), Some(Value::from(512)));
        assert_eq!(eval("-x + 1"), Some(Value::from(-4)));
        assert_eq!(eval("'Hello ' + name"), Some(Value::from("Hello Peter")));
    }

    #[test]
    fn test_absent_operands() {
        for source in [
            "missing == nil",
            "missing != null",
            "missing > 1",
            "1 < missing",
            "1 in missing",
            "missing contains 1",
            "missing beginswith 'a'",
            "name endswith missing",
        ] {
            assert_eq!(eval(source), None, "{source}");
        }
        assert_eq!(eval("missing + 1"), None);
        assert_eq!(eval("-missing"), None);
        assert_eq!(eval("x / 0"), None);
        assert_eq!(eval("true * 2"), None);
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval("x > 1"), Some(Value::from(true)));
        assert_eq!(eval("x <= 4"), Some(Value::from(false)));
        assert_eq!(eval("x == 5"), Some(Value::from(true)));
        assert_eq!(eval("x = 5"), Some(Value::from(true)));
        assert_eq!(eval("x <> 5"), Some(Value::from(false)));
        assert_eq!(eval("nil == null"), Some(Value::from(true)));
        assert_eq!(eval("name == 'Peter'"), Some(Value::from(true)));
        assert_eq!(eval("x == '5'"), Some(Value::from(false)));
        assert_eq!(eval("name < 'Zed'"), Some(Value::from(true)));
    }

    #[test]
    fn test_membership() {
        assert_eq!(eval("2 in items"), Some(Value::from(true)));
        assert_eq!(eval("items contains 4"), Some(Value::from(false)));
        assert_eq!(eval("'ete' in name"), Some(Value::from(true)));
        assert_eq!(eval("name beginswith 'Pe'"), Some(Value::from(true)));
        assert_eq!(eval("name endswith 'Pe'"), Some(Value::from(false)));
        assert_eq!(eval("1 in x"), Some(Value::from(false)));
    }

    #[test]
    fn test_boolean_logic() {
        assert_eq!(eval("x > 1 and name == 'Peter'"), Some(Value::from(true)));
        assert_eq!(eval("x > 10 || missing"), Some(Value::from(false)));
        assert_eq!(eval("not missing"), Some(Value::from(true)));
        assert_eq!(eval("!items"), Some(Value::from(false)));
    }

    #[test]
    fn test_paths_and_subscripts() {
        assert_eq!(eval("items.1"), Some(Value::from(2)));
        assert_eq!(eval("items[x - 3]"), Some(Value::from(3)));
        assert_eq!(eval("items.@count"), Some(Value::from(3)));
        assert_eq!(eval("[1, x, missing]"), Some(Value::from(vec![
            Value::from(1),
            Value::from(5),
            Value::None,
        ])));
    }

    #[test]
    fn test_json() {
        assert_eq!(
            eval(r#"{"a": [1, true]}"#),
            Some(Value::from_serialize(&json!({"a": [1, true]})))
        );
        assert_eq!(eval("[x, 2]"), Some(Value::from(vec![5, 2])));
        assert_eq!(eval("{broken"), None);
        let ctx = Context::new(&());
        let opts = EvalOptions {
            allow_json: true,
            allow_expressions: false,
        };
        assert_eq!(evaluate(&ctx, "[1, 2]", opts), Some(Value::from(vec![1, 2])));
        assert_eq!(evaluate(&ctx, "[x, 2]", opts), None);
    }

    #[test]
    fn test_key_path_lookup() {
        let model = json!({"user": {"first-name": "Peter"}});
        let ctx = Context::new(&model);
        let opts = EvalOptions {
            allow_json: false,
            allow_expressions: false,
        };
        assert_eq!(
            evaluate(&ctx, "user.first-name", opts),
            Some(Value::from("Peter"))
        );
        assert_eq!(evaluate(&ctx, "user", opts).map(|x| x.len()), Some(Some(1)));
    }

    #[test]
    fn test_malformed_expressions() {
        assert_eq!(eval("1 +"), None);
        assert_eq!(eval("(1"), None);
        assert_eq!(eval("'unterminated"), None);
    }

    #[test]
    fn test_predicates() {
        let model = json!({"x": 5, "empty": []});
        let ctx = Context::new(&model);
        assert!(evaluate_predicate(&ctx, "x > 1"));
        assert!(evaluate_predicate(&ctx, "x"));
        assert!(!evaluate_predicate(&ctx, "empty"));
        assert!(!evaluate_predicate(&ctx, "missing"));
        assert!(!evaluate_predicate(&ctx, "x >"));
        assert!(!evaluate_predicate(&ctx, ""));
    }
}
