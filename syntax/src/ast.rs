//! Abstract syntax tree definitions for OSQL commands.

use std::fmt::{self, Write};
use std::str::FromStr;

/// The highest cluster id a record identifier may refer to.
pub const CLUSTER_MAX: i32 = 32767;

/// The cluster id of a record that has not been assigned to a cluster yet.
pub const CLUSTER_ID_INVALID: i32 = -1;

/// Abstract representation of an expression.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Expr {
    /// A scalar literal value.
    Literal(Literal),

    /// A function invocation, such as `count(1)`.
    Function(Function),

    /// A method invocation, such as `.size()`, optionally bound to a receiver.
    Method(Method),

    /// An ordered collection, such as `[1, 2]`.
    Collection(Vec<Expr>),

    /// Key/value pairs in declaration order, such as `{"a": 1}`. Duplicate keys
    /// are kept.
    Map(Vec<(Literal, Expr)>),

    /// An explicit "no value" marker. Not the same as a null literal.
    Unset,
}

/// A literal scalar value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Literal {
    Null,
    Integer(i32),
    Double(f64),
    Text(String),
    RecordId(RecordId),
}

/// A reference to a stored record, written as `#cluster:position`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct RecordId {
    pub cluster: i32,
    pub position: i64,
}

/// Error returned when a string is not a valid record identifier.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("invalid record identifier: {0:?}")]
pub struct InvalidRecordId(pub String);

impl RecordId {
    pub fn new(cluster: i32, position: i64) -> Self {
        Self {
            cluster,
            position,
        }
    }
}

impl FromStr for RecordId {
    type Err = InvalidRecordId;

    /// Parse a record identifier. The leading `#` is optional.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidRecordId(s.to_owned());
        let body = s.strip_prefix('#').unwrap_or(s);
        let (cluster, position) = body.split_once(':').ok_or_else(invalid)?;

        let cluster = cluster.parse::<i32>().map_err(|_| invalid())?;
        let position = position.parse::<i64>().map_err(|_| invalid())?;

        if !(CLUSTER_ID_INVALID..=CLUSTER_MAX).contains(&cluster) {
            return Err(invalid());
        }

        Ok(Self::new(cluster, position))
    }
}

impl TryFrom<String> for RecordId {
    type Error = InvalidRecordId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> String {
        id.to_string()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}:{}", self.cluster, self.position)
    }
}

/// A function call.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Function {
    pub name: String,
    pub arguments: Vec<Expr>,
}

/// A method call.
///
/// A method is created without a receiver. The receiver can only be provided
/// once, by [`Method::bind`], when the method is chained onto an expression.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Method {
    pub name: String,
    pub receiver: Option<Box<Expr>>,
    pub arguments: Vec<Expr>,
}

impl Method {
    pub fn new(name: impl Into<String>, arguments: Vec<Expr>) -> Self {
        Self {
            name: name.into(),
            receiver: None,
            arguments,
        }
    }

    /// Bind this method to a receiver, keeping its name and arguments.
    ///
    /// Returns the method back unchanged if it already has a receiver.
    pub fn bind(self, receiver: Expr) -> Result<Self, Self> {
        match self.receiver {
            Some(_) => Err(self),
            None => Ok(Self {
                receiver: Some(Box::new(receiver)),
                ..self
            }),
        }
    }
}

/// The translated value of a parse tree node.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// A bare word, such as a keyword or a field name.
    Word(String),

    /// An operator or punctuation token, such as `=` or `*`.
    Symbol(String),

    Expr(Expr),
}

impl Value {
    /// Get the expression, if this value is one.
    pub fn into_expr(self) -> Option<Expr> {
        match self {
            Value::Expr(expr) => Some(expr),
            _ => None,
        }
    }
}

impl From<Expr> for Value {
    fn from(expr: Expr) -> Self {
        Value::Expr(expr)
    }
}

/// A command with no dedicated structure, kept as its sequence of tokens.
///
/// Interpreting the tokens is up to whoever executes the command.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpaqueCommand {
    pub tokens: Vec<Value>,
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }

    Ok(())
}

/// Whether `text` contains `quote` without a backslash in front of it.
fn has_bare_quote(text: &str, quote: char) -> bool {
    let mut escaped = false;

    text.chars().any(|c| {
        let bare = c == quote && !escaped;
        escaped = c == '\\' && !escaped;
        bare
    })
}

/// Text content keeps its escape sequences, so it is quoted with whichever
/// delimiter it does not contain bare. Bare delimiters left over are escaped.
fn write_text(f: &mut fmt::Formatter, text: &str) -> fmt::Result {
    let quote = if has_bare_quote(text, '"') && !has_bare_quote(text, '\'') {
        '\''
    } else {
        '"'
    };

    f.write_char(quote)?;

    let mut escaped = false;
    for c in text.chars() {
        if c == quote && !escaped {
            f.write_char('\\')?;
        }
        escaped = c == '\\' && !escaped;
        f.write_char(c)?;
    }

    f.write_char(quote)
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("NULL"),
            Literal::Integer(v) => write!(f, "{}", v),
            Literal::Double(v) => write!(f, "{:?}", v),
            Literal::Text(v) => write_text(f, v),
            Literal::RecordId(v) => write!(f, "{}", v),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        write_list(f, &self.arguments)?;
        f.write_str(")")
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(receiver) = &self.receiver {
            write!(f, "{}", receiver)?;
        }

        write!(f, ".{}(", self.name)?;
        write_list(f, &self.arguments)?;
        f.write_str(")")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::Function(v) => write!(f, "{}", v),
            Expr::Method(v) => write!(f, "{}", v),
            Expr::Collection(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            },
            Expr::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            },
            Expr::Unset => f.write_str("UNSET"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Word(v) | Value::Symbol(v) => f.write_str(v),
            Value::Expr(v) => write!(f, "{}", v),
        }
    }
}

impl fmt::Display for OpaqueCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", token)?;
        }

        Ok(())
    }
}
