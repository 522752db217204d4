//! The concrete parse tree handed to the translator.
//!
//! Nodes keep the exact shape of the grammar productions, delimiters included,
//! so that the translator can address children by position. Trees are normally
//! produced by lowering the pest output, but they can also be built by hand.

use crate::error::{ErrorKind, ParseError};
use crate::grammar::Rule;
use crate::source::Span;
use pest::iterators::Pair;
use std::fmt;

/// The grammar rule a parse tree node was produced by.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NodeKind {
    /// The top-level command.
    Command,

    /// A command with no dedicated structural rule.
    UnknownCommand,

    Expression,
    Word,
    Literal,
    Number,
    Integer,
    Float,
    Text,
    Null,
    FunctionCall,
    MethodCall,
    Arguments,

    /// A record identifier token, such as `#12:3`.
    Identifier,

    Map,
    Collection,
    Unset,

    /// An operator or punctuation token appearing directly in a command.
    Symbol,

    /// A delimiter token belonging to an enclosing production.
    Delimiter,
}

impl NodeKind {
    fn from_rule(rule: Rule) -> Option<Self> {
        Some(match rule {
            Rule::command => NodeKind::Command,
            Rule::unknown_command => NodeKind::UnknownCommand,
            Rule::expression | Rule::parenthesized => NodeKind::Expression,
            Rule::word | Rule::callee => NodeKind::Word,
            Rule::literal => NodeKind::Literal,
            Rule::number => NodeKind::Number,
            Rule::integer => NodeKind::Integer,
            Rule::float => NodeKind::Float,
            Rule::text => NodeKind::Text,
            Rule::null => NodeKind::Null,
            Rule::function_call => NodeKind::FunctionCall,
            Rule::method_call => NodeKind::MethodCall,
            Rule::arguments => NodeKind::Arguments,
            Rule::identifier => NodeKind::Identifier,
            Rule::map => NodeKind::Map,
            Rule::collection => NodeKind::Collection,
            Rule::unset => NodeKind::Unset,
            Rule::symbol => NodeKind::Symbol,
            Rule::lparen
            | Rule::rparen
            | Rule::lbrace
            | Rule::rbrace
            | Rule::lbracket
            | Rule::rbracket
            | Rule::dot
            | Rule::comma
            | Rule::colon => NodeKind::Delimiter,
            _ => return None,
        })
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            NodeKind::Command => "command",
            NodeKind::UnknownCommand => "unknown command",
            NodeKind::Expression => "expression",
            NodeKind::Word => "word",
            NodeKind::Literal => "literal",
            NodeKind::Number => "number",
            NodeKind::Integer => "integer",
            NodeKind::Float => "float",
            NodeKind::Text => "text",
            NodeKind::Null => "null",
            NodeKind::FunctionCall => "function call",
            NodeKind::MethodCall => "method call",
            NodeKind::Arguments => "argument list",
            NodeKind::Identifier => "identifier",
            NodeKind::Map => "map",
            NodeKind::Collection => "collection",
            NodeKind::Unset => "unset",
            NodeKind::Symbol => "symbol",
            NodeKind::Delimiter => "delimiter",
        };

        f.write_str(name)
    }
}

/// A node in the concrete parse tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,

    /// The source text matched by this node.
    pub text: String,

    pub span: Span,
    pub children: Vec<Node>,
}

impl Node {
    /// Create a node without children.
    pub fn leaf(kind: NodeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            span: Span::default(),
            children: Vec::new(),
        }
    }

    /// Create a node from its children. The text is the concatenation of the
    /// children's text.
    pub fn branch(kind: NodeKind, children: Vec<Node>) -> Self {
        let text = children.iter().map(|child| child.text.as_str()).collect();

        Self {
            kind,
            text,
            span: Span::default(),
            children,
        }
    }

    /// Get the child at the given position.
    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    /// Iterate over the children of a given kind, in order.
    pub fn children_of(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(move |child| child.kind == kind)
    }
}

/// Lower a pest pair into a parse tree node.
///
/// Returns `None` for pairs that have no counterpart in the tree, such as the
/// end-of-input marker. Nodes nested deeper than `max_depth` are rejected.
pub(crate) fn lower(pair: Pair<'_, Rule>, max_depth: usize) -> Result<Option<Node>, ParseError> {
    Lowering {
        max_depth,
    }.pair(pair, max_depth)
}

struct Lowering {
    max_depth: usize,
}

impl Lowering {
    fn descend(&self, span: Span, depth_left: usize) -> Result<usize, ParseError> {
        depth_left
            .checked_sub(1)
            .ok_or_else(|| ParseError::new(ErrorKind::NestingTooDeep(self.max_depth), span))
    }

    fn pair(&self, pair: Pair<'_, Rule>, depth_left: usize) -> Result<Option<Node>, ParseError> {
        let depth_left = self.descend(pair.as_span().into(), depth_left)?;

        let kind = match pair.as_rule() {
            Rule::expression => return self.expression(pair, depth_left).map(Some),
            rule => match NodeKind::from_rule(rule) {
                Some(kind) => kind,
                None => return Ok(None),
            },
        };

        Ok(Some(Node {
            kind,
            text: pair.as_str().to_owned(),
            span: pair.as_span().into(),
            children: self.children(pair, depth_left)?,
        }))
    }

    fn children(&self, pair: Pair<'_, Rule>, depth_left: usize) -> Result<Vec<Node>, ParseError> {
        pair.into_inner()
            .filter_map(|inner| self.pair(inner, depth_left).transpose())
            .collect()
    }

    /// `expression = primary ~ method_call*` is folded to the left: every method
    /// call wraps the expression built so far, giving `[receiver, method_call]`.
    /// Each fold is one more level of nesting.
    fn expression(&self, pair: Pair<'_, Rule>, mut depth_left: usize) -> Result<Node, ParseError> {
        let text = pair.as_str();
        let start = pair.as_span().start();
        let mut inner = self.children(pair, depth_left)?.into_iter();

        let mut node = match inner.next() {
            Some(primary) => Node {
                kind: NodeKind::Expression,
                text: primary.text.clone(),
                span: primary.span,
                children: vec![primary],
            },
            None => Node::leaf(NodeKind::Expression, text),
        };

        for method_call in inner {
            depth_left = self.descend(method_call.span, depth_left)?;
            let end = method_call.span.end.offset - start;

            node = Node {
                kind: NodeKind::Expression,
                text: text.get(..end).unwrap_or(text).to_owned(),
                span: node.span.to(method_call.span),
                children: vec![node, method_call],
            };
        }

        Ok(node)
    }
}
