use crate::compiler::tokens::{ExprToken, Span, Token};
use crate::error::{Error, ErrorKind};
use crate::syntax::Syntax;
use crate::utils::{memstr, unescape};

/// Splits a template into template data and tag bodies.
///
/// The tokenizer is a lazy iterator that alternates between the text in
/// front of a begin marker and the body between that begin marker and the
/// next end marker.  A begin marker that is never closed swallows the rest
/// of the template: nothing is emitted for it.
pub struct Tokenizer<'s> {
    rest: &'s str,
    syntax: &'s Syntax,
    in_tag: bool,
    current_line: u32,
    current_col: u32,
    current_offset: u32,
}

impl<'s> Tokenizer<'s> {
    /// Creates a new tokenizer.
    pub fn new(input: &'s str, syntax: &'s Syntax) -> Tokenizer<'s> {
        Tokenizer {
            rest: input,
            syntax,
            in_tag: false,
            current_line: 1,
            current_col: 0,
            current_offset: 0,
        }
    }

    /// Produces the next token from the tokenizer.
    pub fn next_token(&mut self) -> Option<(Token<'s>, Span)> {
        loop {
            if self.rest.is_empty() {
                return None;
            }
            if self.in_tag {
                return self.tokenize_tag();
            }
            if let Some(rv) = self.tokenize_root() {
                return Some(rv);
            }
        }
    }

    fn advance(&mut self, bytes: usize) -> &'s str {
        let (skipped, new_rest) = self.rest.split_at(bytes);
        for c in skipped.chars() {
            match c {
                '\n' => {
                    self.current_line += 1;
                    self.current_col = 0;
                }
                _ => self.current_col += 1,
            }
        }
        self.current_offset += bytes as u32;
        self.rest = new_rest;
        skipped
    }

    #[inline]
    fn loc(&self) -> (u32, u32, u32) {
        (self.current_line, self.current_col, self.current_offset)
    }

    #[inline]
    fn span(&self, (start_line, start_col, start_offset): (u32, u32, u32)) -> Span {
        Span {
            start_line,
            start_col,
            start_offset,
            end_line: self.current_line,
            end_col: self.current_col,
            end_offset: self.current_offset,
        }
    }

    fn tokenize_root(&mut self) -> Option<(Token<'s>, Span)> {
        let old_loc = self.loc();
        let lead = match memstr(self.rest.as_bytes(), self.syntax.block_start.as_bytes()) {
            Some(start) => {
                self.in_tag = true;
                self.advance(start)
            }
            None => self.advance(self.rest.len()),
        };
        if lead.is_empty() {
            None
        } else {
            Some((Token::TemplateData(lead), self.span(old_loc)))
        }
    }

    fn tokenize_tag(&mut self) -> Option<(Token<'s>, Span)> {
        let old_loc = self.loc();
        let skip = self.syntax.block_start.len();
        let end = match memstr(
            &self.rest.as_bytes()[skip..],
            self.syntax.block_end.as_bytes(),
        ) {
            Some(end) => end,
            None => {
                // unterminated tag: the remainder is dropped.
                self.advance(self.rest.len());
                return None;
            }
        };
        self.in_tag = false;
        let tag = self.advance(skip + end + self.syntax.block_end.len());
        Some((
            Token::Statement(&tag[skip..skip + end]),
            self.span(old_loc),
        ))
    }
}

impl<'s> Iterator for Tokenizer<'s> {
    type Item = (Token<'s>, Span);

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Utility function to quickly tokenize into an iterator.
#[cfg(any(test, feature = "unstable_machinery"))]
pub fn tokenize<'s>(input: &'s str, syntax: &'s Syntax) -> Tokenizer<'s> {
    Tokenizer::new(input, syntax)
}

/// Tokenizes expressions.
pub struct ExprTokenizer<'s> {
    rest: &'s str,
    after_dot: bool,
}

fn lex_identifier(s: &str) -> usize {
    s.as_bytes()
        .iter()
        .enumerate()
        .take_while(|&(idx, &c)| {
            if c == b'_' || (idx == 0 && c == b'@') {
                true
            } else if idx == 0 {
                c.is_ascii_alphabetic()
            } else {
                c.is_ascii_alphanumeric()
            }
        })
        .count()
}

impl<'s> ExprTokenizer<'s> {
    /// Creates a new expression tokenizer.
    pub fn new(input: &'s str) -> ExprTokenizer<'s> {
        ExprTokenizer {
            rest: input,
            after_dot: false,
        }
    }

    fn advance(&mut self, bytes: usize) -> &'s str {
        let (skipped, new_rest) = self.rest.split_at(bytes);
        self.rest = new_rest;
        skipped
    }

    #[inline]
    fn syntax_error(&self, msg: &'static str) -> Error {
        Error::new(ErrorKind::SyntaxError, msg)
    }

    /// Produces the next token from the tokenizer.
    pub fn next_token(&mut self) -> Result<Option<ExprToken<'s>>, Error> {
        let skipped = self
            .rest
            .chars()
            .map_while(|c| c.is_whitespace().then(|| c.len_utf8()))
            .sum();
        self.advance(skipped);
        if self.rest.is_empty() {
            return Ok(None);
        }
        let after_dot = std::mem::replace(&mut self.after_dot, false);

        let op = match self.rest.as_bytes().get(..2) {
            Some(b"**") => Some(ExprToken::Pow),
            Some(b"==") => Some(ExprToken::Eq),
            Some(b"!=" | b"<>") => Some(ExprToken::Ne),
            Some(b">=" | b"=>") => Some(ExprToken::Gte),
            Some(b"<=" | b"=<") => Some(ExprToken::Lte),
            Some(b"&&") => Some(ExprToken::And),
            Some(b"||") => Some(ExprToken::Or),
            _ => None,
        };
        if let Some(op) = op {
            self.advance(2);
            return Ok(Some(op));
        }

        let op = match self.rest.as_bytes()[0] {
            b'+' => Some(ExprToken::Plus),
            b'-' => Some(ExprToken::Minus),
            b'*' => Some(ExprToken::Mul),
            b'/' => Some(ExprToken::Div),
            b'.' => Some(ExprToken::Dot),
            b',' => Some(ExprToken::Comma),
            b'=' => Some(ExprToken::Eq),
            b'>' => Some(ExprToken::Gt),
            b'<' => Some(ExprToken::Lt),
            b'!' => Some(ExprToken::Bang),
            b'(' => Some(ExprToken::ParenOpen),
            b')' => Some(ExprToken::ParenClose),
            b'[' => Some(ExprToken::BracketOpen),
            b']' => Some(ExprToken::BracketClose),
            b'\'' => return self.eat_string(b'\'').map(Some),
            b'"' => return self.eat_string(b'"').map(Some),
            c if c.is_ascii_digit() => return self.eat_number(after_dot).map(Some),
            _ => None,
        };
        if let Some(op) = op {
            self.after_dot = op == ExprToken::Dot;
            self.advance(1);
            return Ok(Some(op));
        }

        let ident_len = lex_identifier(self.rest);
        if ident_len > 0 {
            Ok(Some(ExprToken::Ident(self.advance(ident_len))))
        } else {
            Err(self.syntax_error("unexpected character"))
        }
    }

    fn eat_number(&mut self, integer_only: bool) -> Result<ExprToken<'s>, Error> {
        #[derive(Copy, Clone)]
        enum State {
            Integer,      // 123
            Fraction,     // .123
            Exponent,     // E | e
            ExponentSign, // +|-
        }

        let bytes = self.rest.as_bytes();
        let mut num_len = bytes.iter().take_while(|&c| c.is_ascii_digit()).count();
        let mut state = State::Integer;
        if !integer_only {
            while let Some(&c) = bytes.get(num_len) {
                state = match (c, state) {
                    (b'.', State::Integer)
                        if bytes.get(num_len + 1).map_or(false, |x| x.is_ascii_digit()) =>
                    {
                        State::Fraction
                    }
                    (b'E' | b'e', State::Integer | State::Fraction)
                        if bytes
                            .get(num_len + 1)
                            .map_or(false, |x| x.is_ascii_digit() || *x == b'+' || *x == b'-') =>
                    {
                        State::Exponent
                    }
                    (b'+' | b'-', State::Exponent) => State::ExponentSign,
                    (b'0'..=b'9', State::Exponent) => State::ExponentSign,
                    (b'0'..=b'9', state) => state,
                    _ => break,
                };
                num_len += 1;
            }
        }
        let num = self.advance(num_len);
        num.parse()
            .map(ExprToken::Number)
            .map_err(|_| self.syntax_error("invalid number"))
    }

    fn eat_string(&mut self, delim: u8) -> Result<ExprToken<'s>, Error> {
        let mut escaped = false;
        let mut has_escapes = false;
        let str_len = self
            .rest
            .as_bytes()
            .iter()
            .skip(1)
            .take_while(|&&c| match (escaped, c) {
                (true, _) => {
                    escaped = false;
                    true
                }
                (_, b'\\') => {
                    escaped = true;
                    has_escapes = true;
                    true
                }
                (_, c) if c == delim => false,
                _ => true,
            })
            .count();
        if escaped || self.rest.as_bytes().get(str_len + 1) != Some(&delim) {
            return Err(self.syntax_error("unexpected end of string"));
        }
        let s = self.advance(str_len + 2);
        Ok(if has_escapes {
            ExprToken::String(ok!(unescape(&s[1..s.len() - 1])))
        } else {
            ExprToken::Str(&s[1..s.len() - 1])
        })
    }
}

/// Utility function to tokenize a full expression.
#[cfg(any(test, feature = "unstable_machinery"))]
pub fn tokenize_expr(input: &str) -> Result<Vec<ExprToken<'_>>, Error> {
    let mut tokenizer = ExprTokenizer::new(input);
    let mut rv = Vec::new();
    while let Some(token) = ok!(tokenizer.next_token()) {
        rv.push(token);
    }
    Ok(rv)
}
