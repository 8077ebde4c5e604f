use std::fmt;

use crate::compiler::ast::Expr;
use crate::compiler::parser::parse_expr;
use crate::error::Error;
use crate::model::Model;
use crate::value::Value;
use crate::vm::context::Context;
use crate::vm::eval::eval_expr;

/// A compiled expression.
///
/// Expressions use the same language as the tags of a template and can be
/// used to evaluate user provided input against a model, for instance to
/// implement dynamic filtering.  Unlike inside templates, syntax errors are
/// reported by [`compile`](Self::compile).
///
/// ```rust
/// # use sauce::{context, Expression};
/// let expr = Expression::compile("number > 10 and number < 20").unwrap();
/// let rv = expr.eval(&context!(number => 15)).unwrap();
/// assert!(rv.is_true());
/// ```
#[derive(Clone)]
pub struct Expression {
    source: String,
    expr: Expr,
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expression")
            .field("source", &self.source)
            .finish()
    }
}

impl Expression {
    /// Compiles an expression.
    pub fn compile(source: &str) -> Result<Expression, Error> {
        match parse_expr(source) {
            Ok(expr) => Ok(Expression {
                source: source.to_string(),
                expr,
            }),
            Err(mut err) => {
                err.set_template_source(source);
                Err(err)
            }
        }
    }

    /// Returns the source of the expression.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluates the expression against a model.
    ///
    /// Returns `None` if the expression does not produce a value, for
    /// instance because it refers to a missing key.
    pub fn eval(&self, model: &dyn Model) -> Option<Value> {
        eval_expr(&Context::new(model), &self.expr)
    }
}
