use crate::compiler::ast::{NodeId, Stmt, SyntaxTree};
use crate::error::{Error, ErrorKind};
use crate::model::Model;
use crate::output::Output;
use crate::value::Value;
use crate::vm::context::Context;
use crate::vm::eval::{evaluate, evaluate_predicate, EvalOptions};

pub(crate) mod context;
pub(crate) mod eval;

/// The callback invoked by `debug` tags.
pub type DebugFunc = dyn Fn(&Value) + Send + Sync;

/// Emits a `debug` tag value as a tracing event.
pub(crate) fn default_debug(value: &Value) {
    tracing::info!(target: "sauce::debug", value = %value, "debug");
}

/// Walks a syntax tree and renders it.
pub struct Vm<'t> {
    tree: &'t SyntaxTree,
    debug: &'t DebugFunc,
}

impl<'t> Vm<'t> {
    /// Creates a new renderer for a tree.
    pub fn new(tree: &'t SyntaxTree, debug: &'t DebugFunc) -> Vm<'t> {
        Vm { tree, debug }
    }

    /// Renders the tree against a model.
    ///
    /// The only failure is a failing output.
    pub fn eval(&self, model: &dyn Model, out: &mut Output) -> Result<(), Error> {
        let mut ctx = Context::new(model);
        ctx.push_frame();
        ok!(self.render_children(self.tree.root(), &mut ctx, out));
        ctx.pop_frame();
        Ok(())
    }

    fn render_children(
        &self,
        parent: NodeId,
        ctx: &mut Context,
        out: &mut Output,
    ) -> Result<(), Error> {
        let depth = ctx.depth();
        // set once a clause of the current if chain rendered
        let mut matched = false;

        for &id in &self.tree[parent].children {
            let node = &self.tree[id];
            match node.stmt {
                Stmt::Root => {}
                Stmt::Text => {
                    ok!(write_str(out, &node.content));
                }
                Stmt::Value { ref expr } => {
                    if let Some(value) = evaluate(ctx, expr, EvalOptions::for_value_tag(expr)) {
                        ok!(write_value(out, &value));
                    }
                }
                Stmt::Variable { ref name, ref expr, .. } => {
                    let value = evaluate(ctx, expr, EvalOptions::default()).unwrap_or_default();
                    ctx.store(name, value);
                }
                Stmt::If { ref predicate } => {
                    ctx.push_frame();
                    matched = evaluate_predicate(ctx, predicate);
                    if matched {
                        ok!(self.render_children(id, ctx, out));
                    }
                }
                Stmt::ElseIf { ref predicate } => {
                    ctx.pop_frame();
                    ctx.push_frame();
                    if !matched {
                        matched = evaluate_predicate(ctx, predicate);
                        if matched {
                            ok!(self.render_children(id, ctx, out));
                        }
                    }
                }
                Stmt::Else => {
                    ctx.pop_frame();
                    ctx.push_frame();
                    if !matched {
                        matched = true;
                        ok!(self.render_children(id, ctx, out));
                    }
                }
                Stmt::End => {
                    ctx.pop_frame();
                    matched = false;
                }
                Stmt::ForEach { ref var, ref iter } => {
                    ctx.push_frame();
                    ok!(self.render_loop(id, var, iter, ctx, out));
                }
                Stmt::Debug { ref expr } => {
                    if let Some(value) = evaluate(ctx, expr, EvalOptions::default()) {
                        (self.debug)(&value);
                    }
                }
            }
        }

        // branches left open at the end of the source
        ctx.reset_depth(depth);
        Ok(())
    }

    fn render_loop(
        &self,
        id: NodeId,
        var: &str,
        iter: &str,
        ctx: &mut Context,
        out: &mut Output,
    ) -> Result<(), Error> {
        let items = match evaluate(ctx, iter, EvalOptions::default()) {
            Some(items) => items,
            None => return Ok(()),
        };
        let iter = match items.try_iter() {
            Some(iter) => iter,
            None => {
                tracing::debug!(kind = %items.kind(), "cannot iterate over value");
                return Ok(());
            }
        };
        let index_name = format!("{var}Index");
        for (idx, item) in iter.enumerate() {
            ctx.push_frame();
            ctx.store(var, item.clone());
            ctx.store(&index_name, Value::from(idx));
            ok!(self.render_children(id, ctx, out));
            ctx.pop_frame();
        }
        Ok(())
    }
}

fn write_str(out: &mut Output, s: &str) -> Result<(), Error> {
    out.write_str(s)
        .map_err(|_| Error::new(ErrorKind::WriteFailure, "formatting failed"))
}

fn write_value(out: &mut Output, value: &Value) -> Result<(), Error> {
    write!(out, "{value}").map_err(|_| Error::new(ErrorKind::WriteFailure, "formatting failed"))
}
