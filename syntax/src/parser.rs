//! The command parser.
//!
//! Source text is matched against the grammar, the resulting pairs are lowered
//! into the concrete parse tree, and the tree is translated into the AST.
use crate::ast::*;
use crate::error::{ErrorKind, ParseError};
use crate::grammar::{self, Rule};
use crate::source::*;
use crate::translate::Translator;
use crate::tree::{self, Node};
use log::debug;

/// Parse a command into its AST.
pub fn parse(file: impl Into<SourceFile>) -> Result<OpaqueCommand, ParseError> {
    Parser::new().parse(file)
}

/// Parse a single standalone expression.
pub fn parse_expression(file: impl Into<SourceFile>) -> Result<Value, ParseError> {
    Parser::new().parse_expression(file)
}

/// A configurable parser.
#[derive(Clone, Copy, Debug, Default)]
pub struct Parser {
    translator: Translator,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit how deeply expressions may be nested. Deeper input is rejected
    /// instead of risking a stack overflow.
    pub fn max_depth(self, max_depth: usize) -> Self {
        Self {
            translator: Translator::with_max_depth(max_depth),
        }
    }

    pub fn parse(&self, file: impl Into<SourceFile>) -> Result<OpaqueCommand, ParseError> {
        let file = file.into();
        debug!("parsing command from {}", file.name());

        self.parse_tree(&file, Rule::command)
            .and_then(|node| self.translator.translate_command(&node))
            .map_err(|e| e.with_file(file))
    }

    pub fn parse_expression(&self, file: impl Into<SourceFile>) -> Result<Value, ParseError> {
        let file = file.into();
        debug!("parsing expression from {}", file.name());

        self.parse_tree(&file, Rule::standalone_expression)
            .and_then(|node| self.translator.translate(&node))
            .map_err(|e| e.with_file(file))
    }

    /// Parse the file with the given rule and return its parse tree. For rules
    /// without a node of their own, such as `standalone_expression`, the first
    /// inner node is returned.
    fn parse_tree(&self, file: &SourceFile, rule: Rule) -> Result<Node, ParseError> {
        let max_depth = self.translator.max_depth();
        check_nesting(file.source(), max_depth)?;

        let pair = grammar::parse(file.source(), rule)?
            .next()
            .ok_or_else(|| ParseError::new(ErrorKind::Syntax("empty input".into()), Span::default()))?;
        let span = Span::from(pair.as_span());

        let node = match tree::lower(pair.clone(), max_depth)? {
            Some(node) => Some(node),
            None => pair.into_inner()
                .find_map(|inner| tree::lower(inner, max_depth).transpose())
                .transpose()?,
        };

        node.ok_or_else(|| ParseError::new(ErrorKind::Syntax("empty input".into()), span))
    }
}

/// The grammar recurses once per bracket, so bracket nesting is bounded before
/// the grammar ever sees the input. Brackets inside text literals do not count.
fn check_nesting(source: &str, max_depth: usize) -> Result<(), ParseError> {
    let mut position = Position::default();
    let mut depth = 0usize;
    let mut quote = None;
    let mut escaped = false;

    for c in source.chars() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {},
            None => match c {
                '"' | '\'' => quote = Some(c),
                '(' | '[' | '{' => {
                    depth += 1;

                    if depth > max_depth {
                        return Err(ParseError::new(ErrorKind::NestingTooDeep(max_depth), position.into()));
                    }
                },
                ')' | ']' | '}' => depth = depth.saturating_sub(1),
                _ => {},
            },
        }

        position.offset += c.len_utf8();
        if c == '\n' {
            position.line += 1;
            position.column = 1;
        } else {
            position.column += 1;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brackets_in_text_do_not_nest() {
        assert!(check_nesting(r#"f("((((", '[[[[')"#, 1).is_ok());
        assert!(check_nesting(r#"'\'((((('"#, 0).is_ok());
    }

    #[test]
    fn nesting_error_points_at_the_first_bracket_too_many() {
        let error = check_nesting("[\n [(1)]]", 2).unwrap_err();

        assert_eq!(error.kind, ErrorKind::NestingTooDeep(2));
        assert_eq!(error.span.start, Position {
            line: 2,
            column: 3,
            offset: 4,
        });
    }
}
