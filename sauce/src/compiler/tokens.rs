use std::fmt;

/// Represents a token produced by the tag scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Raw template data between tags.
    TemplateData(&'a str),
    /// The untrimmed body of a tag without its markers.
    Statement(&'a str),
}

/// Represents a token within an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprToken<'a> {
    /// An identifier or keyword.
    Ident(&'a str),
    /// A borrowed string.
    Str(&'a str),
    /// An allocated string (the literal contained escapes).
    String(String),
    /// A number.
    Number(f64),
    /// A plus (`+`) operator.
    Plus,
    /// A minus (`-`) operator.
    Minus,
    /// A mul (`*`) operator.
    Mul,
    /// A div (`/`) operator.
    Div,
    /// Power operator (`**`).
    Pow,
    /// A dot operator (`.`)
    Dot,
    /// The comma operator (`,`)
    Comma,
    /// `==` or `=` operator
    Eq,
    /// `!=` or `<>` operator
    Ne,
    /// `>` operator
    Gt,
    /// `>=` or `=>` operator
    Gte,
    /// `<` operator
    Lt,
    /// `<=` or `=<` operator
    Lte,
    /// `&&` operator
    And,
    /// `||` operator
    Or,
    /// `!` operator
    Bang,
    /// Open Bracket
    BracketOpen,
    /// Close Bracket
    BracketClose,
    /// Open Parenthesis
    ParenOpen,
    /// Close Parenthesis
    ParenClose,
}

impl<'a> fmt::Display for ExprToken<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprToken::Ident(_) => f.write_str("identifier"),
            ExprToken::Str(_) | ExprToken::String(_) => f.write_str("string"),
            ExprToken::Number(_) => f.write_str("number"),
            ExprToken::Plus => f.write_str("`+`"),
            ExprToken::Minus => f.write_str("`-`"),
            ExprToken::Mul => f.write_str("`*`"),
            ExprToken::Div => f.write_str("`/`"),
            ExprToken::Pow => f.write_str("`**`"),
            ExprToken::Dot => f.write_str("`.`"),
            ExprToken::Comma => f.write_str("`,`"),
            ExprToken::Eq => f.write_str("`==`"),
            ExprToken::Ne => f.write_str("`!=`"),
            ExprToken::Gt => f.write_str("`>`"),
            ExprToken::Gte => f.write_str("`>=`"),
            ExprToken::Lt => f.write_str("`<`"),
            ExprToken::Lte => f.write_str("`<=`"),
            ExprToken::And => f.write_str("`&&`"),
            ExprToken::Or => f.write_str("`||`"),
            ExprToken::Bang => f.write_str("`!`"),
            ExprToken::BracketOpen => f.write_str("`[`"),
            ExprToken::BracketClose => f.write_str("`]`"),
            ExprToken::ParenOpen => f.write_str("`(`"),
            ExprToken::ParenClose => f.write_str("`)`"),
        }
    }
}

/// Token span information
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub start_offset: u32,
    pub end_line: u32,
    pub end_col: u32,
    pub end_offset: u32,
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            " @ {}:{}-{}:{}",
            self.start_line, self.start_col, self.end_line, self.end_col
        )
    }
}
