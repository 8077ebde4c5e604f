#![allow(missing_docs)]
/// This module contains the internals of the compiler.
pub mod ast;
pub mod classify;
pub mod lexer;
pub mod parser;
pub mod tokens;
pub mod trim;
