//! Sauce is a small text template engine with scoped variables and a tiny
//! embedded expression language.
//!
//! Templates are plain text with embedded tags.  Tags are delimited by `{%`
//! and `%}` (the markers can be changed) and either interpolate a value or
//! control the rendering:
//!
//! ```text
//! {% var greeting = "Hello" %}
//! <ul>
//!   {% foreach(user in users) %}
//!   <li>{% greeting %} {% user.name %}!</li>
//!   {% end %}
//! </ul>
//! ```
//!
//! For the full syntax see the [`syntax`] module.
//!
//! # Template Usage
//!
//! A [`Template`] is created from source and rendered against a [`Model`].
//! The model provides the data for all key paths that are not bound by the
//! template itself.  Models are implemented for [`Value`], for
//! [`serde_json::Value`] and for maps of values.  The [`context!`] macro
//! builds a value from keys and anything that implements `Serialize`:
//!
//! ```
//! use sauce::{Template, context};
//!
//! let tmpl = Template::new("Hello {% name %}!");
//! assert_eq!(tmpl.render(&context!(name => "World")).unwrap(), "Hello World!");
//! ```
//!
//! The syntax tree of a template is built on first render and cached for
//! subsequent renders.
//!
//! # Error Handling
//!
//! Rendering is best effort.  A tag that refers to a missing key, holds a
//! malformed expression or otherwise fails to evaluate produces no output and
//! the rest of the template renders as usual.  Such failures are reported as
//! `tracing` events on the debug level.  The only error a render reports is
//! a closing tag (`else if`, `else` or `end`) without an open branch:
//!
//! ```
//! use sauce::{ErrorKind, Template};
//!
//! let tmpl = Template::new("oops {% end %}");
//! let err = tmpl.render(&()).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::UnmatchedClose);
//! ```
//!
//! # Expression Usage
//!
//! The expression language can also be used on its own through
//! [`Expression`].
//!
//! # Optional Features
//!
//! - `debug`: enabled by default.  Adds [`Template::dump`] and
//!   [`Template::print`] which show the parsed syntax tree.
//! - `preserve_order`: when enabled maps preserve the order of their keys
//!   instead of being sorted.  This affects the order in which `foreach`
//!   visits the values of a map.
//! - `unstable_machinery`: exposes an unstable internal API (no semver
//!   guarantees) to tokenize and parse templates.
#![allow(clippy::new_without_default)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

#[macro_use]
mod macros;

mod compiler;
mod error;
mod expression;
mod model;
mod output;
mod template;
mod utils;
mod vm;

pub mod syntax;
pub mod value;

#[cfg(feature = "debug")]
mod debug;

pub use self::error::{Error, ErrorKind};
pub use self::expression::Expression;
pub use self::model::Model;
pub use self::syntax::Syntax;
pub use self::template::Template;
pub use self::value::Value;

#[doc(hidden)]
pub use self::macros::__context;

/// Types to inspect the syntax tree of a template.
///
/// See [`Template::syntax_tree`].
pub mod tree {
    pub use crate::compiler::ast::{Node, NodeId, NodeKind, Stmt, SyntaxTree};
    pub use crate::compiler::tokens::Span;
}

/// This module gives access to the low level machinery.
///
/// This module is only provided by the `unstable_machinery` feature and does not
/// have a stable interface.  It mostly exists for internal testing purposes and
/// for debugging.
#[cfg(feature = "unstable_machinery")]
#[cfg_attr(docsrs, doc(cfg(feature = "unstable_machinery")))]
pub mod machinery {
    #![allow(missing_docs)]
    pub use crate::compiler::ast;
    pub use crate::compiler::classify::classify;
    pub use crate::compiler::lexer::{tokenize, tokenize_expr, ExprTokenizer, Tokenizer};
    pub use crate::compiler::parser::{parse, parse_expr};
    pub use crate::compiler::tokens::{ExprToken, Span, Token};
    pub use crate::compiler::trim::trim;
    pub use crate::output::Output;
    pub use crate::vm::context::Context;
    pub use crate::vm::eval::{eval_expr, evaluate, evaluate_predicate, EvalOptions};
    pub use crate::vm::{DebugFunc, Vm};

    /// Creates an [`Output`] that writes into a string.
    pub fn make_string_output(s: &mut String) -> Output<'_> {
        Output::new(s)
    }
}
