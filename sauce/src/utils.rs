use std::char::decode_utf16;
use std::iter::{once, repeat};
use std::str::Chars;

use crate::error::{Error, ErrorKind};

pub fn memstr(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Returns the offset at which the last line of `s` starts.
///
/// If `s` ends in a line terminator the last line is empty and the length
/// of `s` is returned.
pub fn last_line_start(s: &str) -> usize {
    s.rfind(['\n', '\r']).map_or(0, |idx| idx + 1)
}

/// Returns the offset right after the terminator of the first line of `s`.
///
/// `\r\n` counts as one terminator.  Without any terminator the whole
/// string is the first line.
pub fn first_line_end(s: &str) -> usize {
    match s.find(['\n', '\r']) {
        Some(idx) if s[idx..].starts_with("\r\n") => idx + 2,
        Some(idx) => idx + 1,
        None => s.len(),
    }
}

struct Unescaper {
    out: String,
    pending_surrogate: u16,
}

fn bad_escape() -> Error {
    Error::new(ErrorKind::SyntaxError, "bad string escape")
}

impl Unescaper {
    fn unescape(mut self, s: &str) -> Result<String, Error> {
        let mut char_iter = s.chars();

        while let Some(c) = char_iter.next() {
            if c == '\\' {
                match char_iter.next() {
                    None => return Err(bad_escape()),
                    Some(d) => match d {
                        '"' | '\\' | '/' | '\'' => ok!(self.push_char(d)),
                        'n' => ok!(self.push_char('\n')),
                        'r' => ok!(self.push_char('\r')),
                        't' => ok!(self.push_char('\t')),
                        'u' => {
                            let val = ok!(self.parse_u16(&mut char_iter));
                            ok!(self.push_u16(val));
                        }
                        _ => return Err(bad_escape()),
                    },
                }
            } else {
                ok!(self.push_char(c));
            }
        }

        if self.pending_surrogate != 0 {
            Err(bad_escape())
        } else {
            Ok(self.out)
        }
    }

    fn parse_u16(&self, chars: &mut Chars) -> Result<u16, Error> {
        let hexnum = chars.chain(repeat('\0')).take(4).collect::<String>();
        u16::from_str_radix(&hexnum, 16).map_err(|_| bad_escape())
    }

    fn push_u16(&mut self, c: u16) -> Result<(), Error> {
        match (self.pending_surrogate, (0xD800..=0xDFFF).contains(&c)) {
            (0, false) => match decode_utf16(once(c)).next() {
                Some(Ok(c)) => self.out.push(c),
                _ => return Err(bad_escape()),
            },
            (_, false) => return Err(bad_escape()),
            (0, true) => self.pending_surrogate = c,
            (prev, true) => match decode_utf16(once(prev).chain(once(c))).next() {
                Some(Ok(c)) => {
                    self.out.push(c);
                    self.pending_surrogate = 0;
                }
                _ => return Err(bad_escape()),
            },
        }
        Ok(())
    }

    fn push_char(&mut self, c: char) -> Result<(), Error> {
        if self.pending_surrogate != 0 {
            Err(bad_escape())
        } else {
            self.out.push(c);
            Ok(())
        }
    }
}

/// Un-escape a string literal, following JSON rules.
pub fn unescape(s: &str) -> Result<String, Error> {
    Unescaper {
        out: String::new(),
        pending_surrogate: 0,
    }
    .unescape(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    #[test]
    fn test_memstr() {
        assert_eq!(memstr(b"abc{%def", b"{%"), Some(3));
        assert_eq!(memstr(b"abc", b"{%"), None);
        assert_eq!(memstr(b"{", b"{%"), None);
    }

    #[test]
    fn test_last_line_start() {
        assert_eq!(last_line_start("A\n  "), 2);
        assert_eq!(last_line_start("A\n"), 2);
        assert_eq!(last_line_start("  "), 0);
        assert_eq!(last_line_start("A\r\nB"), 3);
    }

    #[test]
    fn test_first_line_end() {
        assert_eq!(first_line_end("\nB\n"), 1);
        assert_eq!(first_line_end("  \r\nB"), 4);
        assert_eq!(first_line_end("  "), 2);
        assert_eq!(first_line_end(""), 0);
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"foo\u2603bar").unwrap(), "foo\u{2603}bar");
        assert_eq!(unescape(r"\t\b\f\r\n\\\/").unwrap_err().kind(), ErrorKind::SyntaxError);
        assert_eq!(unescape(r"a\'b").unwrap(), "a'b");
        assert_eq!(unescape(r"\ud83d\ude80").unwrap(), "\u{1f680}");
    }
}
