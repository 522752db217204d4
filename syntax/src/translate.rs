//! Translation of the concrete parse tree into the abstract syntax tree.
//!
//! This is a type-directed recursive descent over [`Node`]s: leaves are resolved
//! first and composites are assembled from their translated children. Any
//! node that does not have the shape its grammar rule promises aborts the whole
//! translation.

use crate::ast::*;
use crate::error::{ErrorKind, ParseError};
use crate::tree::{Node, NodeKind};
use log::{debug, trace};

/// Default limit on how deeply nodes may be nested.
pub const DEFAULT_MAX_DEPTH: usize = 256;

type Result<T> = std::result::Result<T, ParseError>;

fn error(node: &Node, kind: ErrorKind) -> ParseError {
    ParseError::new(kind, node.span)
}

/// Translates parse tree nodes into AST values.
#[derive(Clone, Copy, Debug)]
pub struct Translator {
    max_depth: usize,
}

impl Default for Translator {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Translator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum nesting depth accepted before giving up.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Translate a top-level command node.
    ///
    /// Only commands without a dedicated structure are known, and these are
    /// kept as an opaque sequence of their translated tokens.
    pub fn translate_command(&self, node: &Node) -> Result<OpaqueCommand> {
        let depth_left = self.check_depth(node, self.max_depth)?;

        match node.child(0) {
            Some(command) if node.kind == NodeKind::Command && command.kind == NodeKind::UnknownCommand => {
                self.visit_unknown_command(command, depth_left)
            },
            _ => Err(error(node, ErrorKind::UnknownedCommand)),
        }
    }

    /// Translate any node. The kind of value returned depends on the kind of
    /// node given.
    pub fn translate(&self, node: &Node) -> Result<Value> {
        self.visit(node, self.max_depth)
    }

    /// Translate a node that must produce an expression.
    pub fn translate_expr(&self, node: &Node) -> Result<Expr> {
        self.visit_expr(node, self.max_depth)
    }

    fn check_depth(&self, node: &Node, depth_left: usize) -> Result<usize> {
        match depth_left.checked_sub(1) {
            Some(depth_left) => Ok(depth_left),
            None => Err(error(node, ErrorKind::NestingTooDeep(self.max_depth))),
        }
    }

    fn visit(&self, node: &Node, depth_left: usize) -> Result<Value> {
        let depth_left = self.check_depth(node, depth_left)?;
        trace!("visiting {} node {:?}", node.kind, node.text);

        Ok(match node.kind {
            NodeKind::Expression => return self.visit_expression(node, depth_left),
            NodeKind::Word => Value::Word(self.visit_word(node)),
            NodeKind::Symbol => Value::Symbol(node.text.clone()),
            NodeKind::Literal => Expr::Literal(self.visit_literal(node)?).into(),
            NodeKind::Identifier => Expr::Literal(self.visit_identifier(node)?).into(),
            NodeKind::FunctionCall => Expr::Function(self.visit_function_call(node, depth_left)?).into(),
            NodeKind::MethodCall => Expr::Method(self.visit_method_call(node, depth_left)?).into(),
            NodeKind::Collection => Expr::Collection(self.visit_collection(node, depth_left)?).into(),
            NodeKind::Map => Expr::Map(self.visit_map(node, depth_left)?).into(),
            NodeKind::Unset => Expr::Unset.into(),

            NodeKind::Command
            | NodeKind::UnknownCommand
            | NodeKind::Number
            | NodeKind::Integer
            | NodeKind::Float
            | NodeKind::Text
            | NodeKind::Null
            | NodeKind::Arguments
            | NodeKind::Delimiter => return Err(error(node, ErrorKind::UnrecognizedNodeKind(node.kind))),
        })
    }

    fn visit_expr(&self, node: &Node, depth_left: usize) -> Result<Expr> {
        self.visit(node, depth_left)?
            .into_expr()
            .ok_or_else(|| error(node, ErrorKind::ExpectedExpression))
    }

    fn visit_unknown_command(&self, node: &Node, depth_left: usize) -> Result<OpaqueCommand> {
        let tokens = node.children
            .iter()
            .map(|child| self.visit(child, depth_left))
            .collect::<Result<Vec<_>>>()?;

        debug!("translated command with {} tokens", tokens.len());

        Ok(OpaqueCommand {
            tokens,
        })
    }

    /// The expression rule is ambiguous and is told apart by its number of
    /// children: a single value, a method chained onto a receiver, or a
    /// parenthesized expression.
    fn visit_expression(&self, node: &Node, depth_left: usize) -> Result<Value> {
        match node.children.as_slice() {
            [inner] => self.visit(inner, depth_left),

            [receiver, method] => {
                let receiver = self.visit(receiver, depth_left)?.into_expr();
                let method = match self.visit(method, depth_left)? {
                    Value::Expr(Expr::Method(method)) => Some(method),
                    _ => None,
                };

                match (receiver, method) {
                    (Some(receiver), Some(method)) => method
                        .bind(receiver)
                        .map(|method| Expr::Method(method).into())
                        .map_err(|_| error(node, ErrorKind::InvalidMethodChainOperands)),
                    _ => Err(error(node, ErrorKind::InvalidMethodChainOperands)),
                }
            },

            // The outer children are the parentheses.
            [_, inner, _] => self.visit(inner, depth_left),

            children => Err(error(node, ErrorKind::MalformedExpressionArity(children.len()))),
        }
    }

    fn visit_word(&self, node: &Node) -> String {
        node.text.clone()
    }

    fn visit_literal(&self, node: &Node) -> Result<Literal> {
        let form = node.child(0).ok_or_else(|| error(node, ErrorKind::UnreachableLiteralForm))?;

        match form.kind {
            NodeKind::Text => self.visit_text(form),
            NodeKind::Number => self.visit_number(form),
            NodeKind::Null => Ok(Literal::Null),
            _ => Err(error(node, ErrorKind::UnreachableLiteralForm)),
        }
    }

    /// Strips exactly one delimiter character from each end. Escape sequences
    /// are kept verbatim.
    fn visit_text(&self, node: &Node) -> Result<Literal> {
        let mut chars = node.text.chars();

        match (chars.next(), chars.next_back()) {
            (Some(_), Some(_)) => Ok(Literal::Text(chars.as_str().to_owned())),
            _ => Err(error(node, ErrorKind::UnreachableLiteralForm)),
        }
    }

    fn visit_number(&self, node: &Node) -> Result<Literal> {
        let invalid = || error(node, ErrorKind::InvalidNumber(node.text.clone()));

        match node.child(0) {
            Some(integer) if integer.kind == NodeKind::Integer => {
                integer.text.parse().map(Literal::Integer).map_err(|_| invalid())
            },
            _ => node.text.parse().map(Literal::Double).map_err(|_| invalid()),
        }
    }

    fn visit_identifier(&self, node: &Node) -> Result<Literal> {
        node.text
            .parse()
            .map(Literal::RecordId)
            .map_err(|_| error(node, ErrorKind::InvalidRecordIdentifier(node.text.clone())))
    }

    /// `name arguments`
    fn visit_function_call(&self, node: &Node, depth_left: usize) -> Result<Function> {
        let name = self.visit_word(self.expect_child(node, 0, NodeKind::Word)?);
        let arguments = self.visit_arguments(self.expect_child(node, 1, NodeKind::Arguments)?, depth_left)?;

        Ok(Function {
            name,
            arguments,
        })
    }

    /// `. name arguments`
    fn visit_method_call(&self, node: &Node, depth_left: usize) -> Result<Method> {
        let name = self.visit_word(self.expect_child(node, 1, NodeKind::Word)?);
        let arguments = self.visit_arguments(self.expect_child(node, 2, NodeKind::Arguments)?, depth_left)?;

        Ok(Method::new(name, arguments))
    }

    /// Arguments sit at the odd positions, between the enclosing delimiters
    /// and the separators.
    fn visit_arguments(&self, node: &Node, depth_left: usize) -> Result<Vec<Expr>> {
        let depth_left = self.check_depth(node, depth_left)?;
        let end = node.children.len().saturating_sub(1);

        node.children
            .iter()
            .take(end)
            .skip(1)
            .step_by(2)
            .map(|child| self.visit_expr(child, depth_left))
            .collect()
    }

    fn visit_collection(&self, node: &Node, depth_left: usize) -> Result<Vec<Expr>> {
        node.children_of(NodeKind::Expression)
            .map(|child| self.visit_expr(child, depth_left))
            .collect()
    }

    /// Keys and values are paired up by position.
    fn visit_map(&self, node: &Node, depth_left: usize) -> Result<Vec<(Literal, Expr)>> {
        let keys: Vec<&Node> = node.children_of(NodeKind::Literal).collect();
        let values: Vec<&Node> = node.children_of(NodeKind::Expression).collect();

        if keys.len() != values.len() {
            return Err(error(node, ErrorKind::MapArityMismatch {
                keys: keys.len(),
                values: values.len(),
            }));
        }

        keys.into_iter()
            .zip(values)
            .map(|(key, value)| -> Result<(Literal, Expr)> {
                Ok((self.visit_literal(key)?, self.visit_expr(value, depth_left)?))
            })
            .collect()
    }

    fn expect_child<'n>(&self, node: &'n Node, index: usize, kind: NodeKind) -> Result<&'n Node> {
        node.child(index)
            .filter(|child| child.kind == kind)
            .ok_or_else(|| error(node, ErrorKind::UnexpectedChild {
                parent: node.kind,
                index,
            }))
    }
}
