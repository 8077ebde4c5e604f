//! Documents the syntax for templates.
//!
//! <details><summary><strong style="cursor: pointer">Table of Contents</strong></summary>
//!
//! - [Synopsis](#synopsis)
//! - [Tags](#tags)
//!   - [Values](#values)
//!   - [Variables](#variables)
//!   - [`if`](#if)
//!   - [`foreach`](#foreach)
//!   - [`debug`](#debug)
//! - [Expressions](#expressions)
//! - [Whitespace](#whitespace)
//! - [Custom Delimiters](#custom-delimiters)
//!
//! </details>
//!
//! # Synopsis
//!
//! A template is a plain text file with embedded tags.  Everything between
//! the begin marker (`{%`) and the end marker (`%}`) is a tag, everything else
//! is emitted verbatim.
//!
//! ```text
//! {% var greeting = "Hello" %}
//! {% foreach(user in users) %}
//!   {% greeting %} {% user.name %}!
//! {% end %}
//! ```
//!
//! # Tags
//!
//! ## Values
//!
//! Any tag that is not one of the statements below is a value.  Its content is
//! evaluated and the result is written into the output.  Undefined values do
//! not produce output.
//!
//! ```text
//! Hello {% user.name %}!
//! {% price * 2 %}
//! ```
//!
//! Plain key paths are looked up directly.  Only tags that contain one of the
//! characters `* - + ( ) [ ] = /` or a digit are parsed as expressions.
//!
//! ## Variables
//!
//! Variables are assigned with `=`.  The `var` keyword is optional and has no
//! effect on where the variable is stored: if a variable of that name exists in
//! an enclosing scope it is overwritten there, otherwise it is created in the
//! innermost scope.
//!
//! ```text
//! {% var items = [1, 2, 3] %}
//! {% total = 0 %}
//! ```
//!
//! The right hand side may be a JSON literal (starting with `[` or `{`) or an
//! expression.  If the expression cannot be evaluated the variable is set to
//! null.
//!
//! ## `if`
//!
//! ```text
//! {% if(count > 10) %}
//!   many
//! {% else if(count > 0) %}
//!   some
//! {% else %}
//!   none
//! {% end %}
//! ```
//!
//! Exactly one clause is rendered: the first one whose condition is true, or
//! the `else` clause if none matched.
//!
//! ## `foreach`
//!
//! ```text
//! {% foreach(item in items) %}
//!   {% itemIndex %}: {% item %}
//! {% end %}
//! ```
//!
//! Besides the loop variable, the zero based position is bound to the loop
//! variable's name with `Index` appended.  Iterating over a map visits its
//! values.
//!
//! ## `debug`
//!
//! ```text
//! {% debug(user) %}
//! ```
//!
//! Evaluates the expression and hands the result to the debug callback (see
//! [`Template::set_debug_callback`](crate::Template::set_debug_callback)).
//! Nothing is written into the output.
//!
//! # Expressions
//!
//! The expression language supports numbers, single or double quoted strings,
//! `true`/`yes`, `false`/`no`, `nil`/`null`, list literals, key paths
//! (`user.address.city`, `items.0`, `items[0]`, `items.@count`) and the
//! following operators ordered by increasing precedence:
//!
//! | Operators | Meaning |
//! |---|---|
//! | `or`, `\|\|` | disjunction |
//! | `and`, `&&` | conjunction |
//! | `not`, `!` | negation |
//! | `==`, `=`, `!=`, `<>`, `<`, `<=`, `>`, `>=`, `in`, `contains`, `beginswith`, `endswith` | comparisons |
//! | `+`, `-` | addition (string concatenation) and subtraction |
//! | `*`, `/` | multiplication and division |
//! | `-` | negation |
//! | `**` | power |
//!
//! Keywords are case insensitive.  Except for `and`, `or` and `not` an
//! operator with an undefined operand is undefined, so `{% missing > 1 %}`
//! renders nothing and is false as a condition.
//!
//! # Whitespace
//!
//! With trimming enabled (the default) a line that consists only of
//! whitespace and a single statement tag (anything but a value tag) is removed
//! from the output entirely, including its newline.
//!
//! # Custom Delimiters
//!
//! The markers can be changed with [`Syntax`]:
//!
//! ```
//! # use sauce::{Syntax, Template};
//! let tmpl = Template::with_syntax("Hello <?name?>!", Syntax {
//!     block_start: "<?".into(),
//!     block_end: "?>".into(),
//! }).unwrap();
//! ```
use std::borrow::Cow;

use crate::error::{Error, ErrorKind};

/// The delimiter configuration for a template.
///
/// Both markers must be non-empty and they must differ from each other.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Syntax {
    /// The start of a tag. By default it is `{%`.
    pub block_start: Cow<'static, str>,
    /// The end of a tag. By default it is `%}`.
    pub block_end: Cow<'static, str>,
}

const DEFAULT_SYNTAX: Syntax = Syntax {
    block_start: Cow::Borrowed("{%"),
    block_end: Cow::Borrowed("%}"),
};

impl Default for Syntax {
    fn default() -> Self {
        DEFAULT_SYNTAX
    }
}

impl Syntax {
    /// Validates the delimiters.
    pub(crate) fn check_delimiters(&self) -> Result<(), Error> {
        if self.block_start.is_empty() || self.block_end.is_empty() {
            Err(Error::new(
                ErrorKind::InvalidDelimiter,
                "markers must not be empty",
            ))
        } else if self.block_start == self.block_end {
            Err(Error::new(
                ErrorKind::InvalidDelimiter,
                "begin and end marker must be different",
            ))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Syntax::default().check_delimiters().is_ok());
    }

    #[test]
    fn test_invalid_delimiters() {
        let err = Syntax {
            block_start: "".into(),
            block_end: "%}".into(),
        }
        .check_delimiters()
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDelimiter);

        let err = Syntax {
            block_start: "||".into(),
            block_end: "||".into(),
        }
        .check_delimiters()
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDelimiter);
    }
}
