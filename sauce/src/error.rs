use std::borrow::Cow;
use std::fmt;

/// Represents template errors.
///
/// Errors are only ever produced while a template is turned into a syntax
/// tree (or while it is loaded or written out).  Problems that happen while
/// individual tags are evaluated are not errors: the affected tag simply
/// does not produce output.
///
/// If the error was caused by a specific tag the template source is
/// embedded and can be displayed by formatting an error with the
/// alternative formatting (``format!("{:#}", err)``).
///
/// # Example
///
/// Here is an example of you might want to render errors:
///
/// ```rust
/// # let template = sauce::Template::new("{% end %}");
/// match template.render(&()) {
///     Ok(result) => println!("{}", result),
///     Err(err) => {
///         eprintln!("Could not render template:");
///         eprintln!("  {:#}", err);
///     }
/// }
/// ```
pub struct Error {
    kind: ErrorKind,
    detail: Option<Cow<'static, str>>,
    name: Option<String>,
    lineno: usize,
    template_source: Option<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("detail", &self.detail)
            .field("name", &self.name)
            .field("lineno", &self.lineno)
            .field("source", &self.source)
            .finish()
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind()
    }
}

impl Eq for Error {}

/// An enum describing the error kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An `else if`, `else` or `end` tag was found without an open branch.
    UnmatchedClose,
    /// The begin or end marker is unusable.
    InvalidDelimiter,
    /// An expression could not be parsed.
    SyntaxError,
    /// An operation was applied to values that do not support it.
    InvalidOperation,
    /// A template file could not be read.
    TemplateNotFound,
    /// A value could not be converted into the internal format.
    BadSerialization,
    /// Writing the rendered output failed.
    WriteFailure,
}

impl ErrorKind {
    fn description(self) -> &'static str {
        match self {
            ErrorKind::UnmatchedClose => "unmatched closing tag",
            ErrorKind::InvalidDelimiter => "invalid custom delimiters",
            ErrorKind::SyntaxError => "syntax error",
            ErrorKind::InvalidOperation => "invalid operation",
            ErrorKind::TemplateNotFound => "template not found",
            ErrorKind::BadSerialization => "could not serialize to internal format",
            ErrorKind::WriteFailure => "failed to write output",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref detail) = self.detail {
            write!(f, "{}: {}", self.kind, detail)?;
        } else {
            write!(f, "{}", self.kind)?;
        }
        if let Some(ref filename) = self.name {
            write!(f, " (in {}:{})", filename, self.lineno)?
        } else if self.lineno > 0 {
            write!(f, " (on line {})", self.lineno)?
        }
        if f.alternate() && self.lineno > 0 {
            if let Some(ref source) = self.template_source {
                let lines: Vec<_> = source.lines().enumerate().collect();
                let idx = (self.lineno - 1).min(lines.len().saturating_sub(1));
                if let Some((_, line)) = lines.get(idx) {
                    writeln!(f)?;
                    writeln!(f, "{:-^1$}", " Template Source ", 74)?;
                    let skip = idx.saturating_sub(3);
                    for (idx, line) in lines.iter().skip(skip).take(idx - skip) {
                        writeln!(f, "{:>4} | {}", idx + 1, line)?;
                    }
                    writeln!(f, "{:>4} > {}", idx + 1, line)?;
                    for (idx, line) in lines.iter().skip(idx + 1).take(3) {
                        writeln!(f, "{:>4} | {}", idx + 1, line)?;
                    }
                    write!(f, "{:-^1$}", "", 74)?;
                }
            }
        }
        Ok(())
    }
}

impl Error {
    /// Creates a new error with kind and detail.
    pub fn new<D: Into<Cow<'static, str>>>(kind: ErrorKind, detail: D) -> Error {
        Error {
            kind,
            detail: Some(detail.into()),
            name: None,
            lineno: 0,
            template_source: None,
            source: None,
        }
    }

    pub(crate) fn set_name(&mut self, filename: &str) {
        self.name = Some(filename.into());
    }

    pub(crate) fn set_line(&mut self, lineno: usize) {
        self.lineno = lineno;
    }

    pub(crate) fn set_template_source(&mut self, source: &str) {
        self.template_source = Some(source.into());
    }

    /// Attaches another error as source to this error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error detail
    ///
    /// The detail is an error message that provides further details about
    /// the error kind.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Returns the filename of the template that caused the error.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the line on which the error occurred.
    pub fn line(&self) -> Option<usize> {
        if self.lineno > 0 {
            Some(self.lineno)
        } else {
            None
        }
    }

    /// Returns the template source if available.
    pub fn template_source(&self) -> Option<&str> {
        self.template_source.as_deref()
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|err| err.as_ref() as _)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error {
            kind,
            detail: None,
            name: None,
            lineno: 0,
            template_source: None,
            source: None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(ErrorKind::WriteFailure, "formatting failed").with_source(err)
    }
}
