use std::cell::OnceCell;
use std::path::Path;
use std::sync::Arc;
use std::{fmt, fs, io};

use crate::compiler::ast::SyntaxTree;
use crate::compiler::parser::parse;
use crate::compiler::trim::trim;
use crate::error::{Error, ErrorKind};
use crate::model::Model;
use crate::output::{Output, WriteWrapper};
use crate::syntax::Syntax;
use crate::value::Value;
use crate::vm::{default_debug, DebugFunc, Vm};

/// Represents a template.
///
/// A template holds its source and the settings that control how it is
/// parsed.  The syntax tree is built on first use and cached until the
/// source or one of the parser settings changes.
///
/// ```rust
/// # use sauce::{Template, context};
/// let tmpl = Template::new("Hello {% name %}!");
/// println!("{}", tmpl.render(&context!(name => "World")).unwrap());
/// ```
///
/// The cache is not synchronized, a template can be shared between threads
/// only by cloning it.
#[derive(Clone)]
pub struct Template {
    name: Option<String>,
    source: String,
    syntax: Syntax,
    trimming: bool,
    debug: Arc<DebugFunc>,
    compiled: OnceCell<SyntaxTree>,
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("syntax", &self.syntax)
            .field("trimming", &self.trimming)
            .finish()
    }
}

impl Template {
    /// Creates a template from source with the default syntax.
    pub fn new<S: Into<String>>(source: S) -> Template {
        Template {
            name: None,
            source: source.into(),
            syntax: Syntax::default(),
            trimming: true,
            debug: Arc::new(default_debug),
            compiled: OnceCell::new(),
        }
    }

    /// Creates a template that uses custom markers.
    ///
    /// ```rust
    /// # use sauce::{Template, Syntax, context};
    /// let tmpl = Template::with_syntax("Hi <?name?>", Syntax {
    ///     block_start: "<?".into(),
    ///     block_end: "?>".into(),
    /// }).unwrap();
    /// assert_eq!(tmpl.render(&context!(name => "Jane")).unwrap(), "Hi Jane");
    /// ```
    pub fn with_syntax<S: Into<String>>(source: S, syntax: Syntax) -> Result<Template, Error> {
        let mut rv = Template::new(source);
        ok!(rv.set_syntax(syntax));
        Ok(rv)
    }

    /// Loads a template from a file.
    ///
    /// The file name becomes the name of the template which is used in
    /// error messages.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Template, Error> {
        let path = path.as_ref();
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                return Err(Error::new(
                    ErrorKind::TemplateNotFound,
                    format!("could not read {}", path.display()),
                )
                .with_source(err))
            }
        };
        let mut rv = Template::new(source);
        rv.set_name(path.display().to_string());
        Ok(rv)
    }

    /// Returns the name of the template.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Sets the name that is reported in errors.
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = Some(name.into());
    }

    /// Returns the source code of the template.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Replaces the source of the template.
    pub fn set_source<S: Into<String>>(&mut self, source: S) {
        self.source = source.into();
        self.invalidate();
    }

    /// Returns `true` if whitespace trimming is enabled.
    pub fn trimming(&self) -> bool {
        self.trimming
    }

    /// Enables or disables whitespace trimming.
    ///
    /// With trimming enabled (the default) the line of a statement tag is
    /// removed from the output if it holds nothing but the tag and
    /// whitespace.  Value tags are never trimmed.
    pub fn set_trimming(&mut self, yes: bool) {
        if self.trimming != yes {
            self.trimming = yes;
            self.invalidate();
        }
    }

    /// Returns the markers in use.
    pub fn syntax(&self) -> &Syntax {
        &self.syntax
    }

    /// Changes the markers.
    ///
    /// Fails with [`ErrorKind::InvalidDelimiter`] if a marker is empty or
    /// both markers are the same, in which case the template is unchanged.
    pub fn set_syntax(&mut self, syntax: Syntax) -> Result<(), Error> {
        ok!(syntax.check_delimiters());
        self.syntax = syntax;
        self.invalidate();
        Ok(())
    }

    /// Sets the function that receives the values of `debug` tags.
    ///
    /// By default values are emitted as `tracing` events on the
    /// `sauce::debug` target.
    ///
    /// ```rust
    /// # use sauce::{Template, context};
    /// let mut tmpl = Template::new("{% debug(name) %}");
    /// tmpl.set_debug_callback(|value| eprintln!("debug: {value}"));
    /// assert_eq!(tmpl.render(&context!(name => "x")).unwrap(), "");
    /// ```
    pub fn set_debug_callback<F>(&mut self, f: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.debug = Arc::new(f);
    }

    fn invalidate(&mut self) {
        if self.compiled.take().is_some() {
            tracing::debug!(name = self.name.as_deref(), "discarded cached syntax tree");
        }
    }

    fn build(&self) -> Result<SyntaxTree, Error> {
        tracing::debug!(
            name = self.name.as_deref(),
            trimming = self.trimming,
            "building syntax tree"
        );
        let mut tree = match parse(&self.source, &self.syntax) {
            Ok(tree) => tree,
            Err(mut err) => {
                if let Some(ref name) = self.name {
                    err.set_name(name);
                }
                err.set_template_source(&self.source);
                return Err(err);
            }
        };
        if self.trimming {
            trim(&mut tree);
        }
        Ok(tree)
    }

    /// Returns the syntax tree of the template.
    ///
    /// The tree is built on first access and cached.
    pub fn syntax_tree(&self) -> Result<&SyntaxTree, Error> {
        if let Some(tree) = self.compiled.get() {
            return Ok(tree);
        }
        let tree = ok!(self.build());
        Ok(self.compiled.get_or_init(|| tree))
    }

    /// Renders the template into a string.
    ///
    /// The only error that can happen is a parse error: an `else if`,
    /// `else` or `end` tag without an open branch.  Tags that fail to
    /// evaluate render nothing.
    pub fn render(&self, model: &dyn Model) -> Result<String, Error> {
        let mut rv = String::with_capacity(self.source.len());
        ok!(self._render(model, &mut Output::new(&mut rv)));
        Ok(rv)
    }

    /// Renders the template into an [`io::Write`].
    ///
    /// This works exactly like [`render`](Self::render) but instead writes
    /// the template as it's evaluating into an [`io::Write`].
    ///
    /// ```rust
    /// # use sauce::{Template, context};
    /// use std::io::stdout;
    ///
    /// let tmpl = Template::new("Hello {% name %}!");
    /// tmpl.render_to_write(&context!(name => "John"), &mut stdout()).unwrap();
    /// ```
    pub fn render_to_write<W: io::Write>(&self, model: &dyn Model, w: W) -> Result<(), Error> {
        let mut wrapper = WriteWrapper { w, err: None };
        self._render(model, &mut Output::new(&mut wrapper))
            .map_err(|err| wrapper.take_err(err))
    }

    fn _render(&self, model: &dyn Model, out: &mut Output) -> Result<(), Error> {
        let tree = ok!(self.syntax_tree());
        Vm::new(tree, &*self.debug).eval(model, out)
    }

    /// Dumps the syntax tree.
    ///
    /// Each node is printed with its type on a line of its own, indented by
    /// one tab per nesting level.  If `contents` is set the content of the
    /// nodes is included.
    ///
    /// ```rust
    /// # use sauce::Template;
    /// let tmpl = Template::new("{% if(x) %}yes{% end %}");
    /// assert_eq!(tmpl.dump(false).unwrap(), "Root\n\tIf\n\t\tText\n\tEnd\n");
    /// ```
    #[cfg(feature = "debug")]
    #[cfg_attr(docsrs, doc(cfg(feature = "debug")))]
    pub fn dump(&self, contents: bool) -> Result<String, Error> {
        self.syntax_tree()
            .map(|tree| crate::debug::dump_tree(tree, contents))
    }

    /// Prints the syntax tree to stdout.
    ///
    /// See [`dump`](Self::dump) for the format.
    #[cfg(feature = "debug")]
    #[cfg_attr(docsrs, doc(cfg(feature = "debug")))]
    pub fn print(&self, contents: bool) -> Result<(), Error> {
        print!("{}", ok!(self.dump(contents)));
        Ok(())
    }
}
