use crate::source::*;
use crate::tree::NodeKind;
use std::fmt;

/// The reason a command could not be parsed.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ErrorKind {
    /// The grammar rejected the input.
    #[error("{0}")]
    Syntax(String),

    /// The translator was handed a node it has no rule for.
    #[error("unexpected {0} node")]
    UnrecognizedNodeKind(NodeKind),

    /// A literal node did not contain text, a number or null. This points at
    /// a mismatch between the grammar and the translator.
    #[error("literal is neither text, number nor null")]
    UnreachableLiteralForm,

    #[error("invalid record identifier: {0}")]
    InvalidRecordIdentifier(String),

    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("expression has {0} parts, expected 1 to 3")]
    MalformedExpressionArity(usize),

    #[error("method chain must combine an expression with an unbound method")]
    InvalidMethodChainOperands,

    #[error("map has {keys} keys but {values} values")]
    MapArityMismatch {
        keys: usize,
        values: usize,
    },

    #[error("malformed {parent} node: unexpected child at position {index}")]
    UnexpectedChild {
        parent: NodeKind,
        index: usize,
    },

    #[error("expected an expression")]
    ExpectedExpression,

    #[error("unknown command")]
    UnknownedCommand,

    #[error("expression nested deeper than {0} levels")]
    NestingTooDeep(usize),
}

/// Describes an error that occurred in parsing.
#[derive(Clone, PartialEq)]
pub struct ParseError {
    pub kind: ErrorKind,

    /// The span in the source the error occurred in.
    pub span: Span,

    /// The source file the error occurred in, if known.
    pub file: Option<SourceFile>,
}

impl ParseError {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        Self {
            kind,
            span,
            file: None,
        }
    }

    /// Attach the source file the error occurred in.
    pub fn with_file(self, file: SourceFile) -> Self {
        Self {
            file: Some(file),
            ..self
        }
    }
}

impl From<Box<pest::error::Error<crate::grammar::Rule>>> for ParseError {
    fn from(error: Box<pest::error::Error<crate::grammar::Rule>>) -> Self {
        let span = match error.location {
            pest::error::InputLocation::Pos(offset) => Span::from(Position {
                line: line_of(&error.line_col).0,
                column: line_of(&error.line_col).1,
                offset,
            }),
            pest::error::InputLocation::Span((start, end)) => {
                let ((line, column), (end_line, end_column)) = match error.line_col {
                    pest::error::LineColLocation::Span(start, end) => (start, end),
                    pest::error::LineColLocation::Pos(pos) => (pos, pos),
                };

                Span {
                    start: Position { line, column, offset: start },
                    end: Position { line: end_line, column: end_column, offset: end },
                }
            },
        };

        let message = error.variant.message().into_owned();

        Self::new(ErrorKind::Syntax(message), span)
    }
}

fn line_of(location: &pest::error::LineColLocation) -> (usize, usize) {
    match *location {
        pest::error::LineColLocation::Pos(pos) => pos,
        pest::error::LineColLocation::Span(start, _) => start,
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let file = match &self.file {
            Some(file) => file,
            None => return write!(f, "{}:{}: {}", self.span.start.line, self.span.start.column, self.kind),
        };

        writeln!(f, "{}\n{}:{}:{}",
            self.kind,
            file.name(),
            self.span.start.line,
            self.span.start.column,
        )?;

        let source = file.source();
        let start = self.span.start.offset.min(source.len());
        let end = self.span.end.offset.clamp(start, source.len());

        let starting_offset = source
            .get(..start)
            .and_then(|s| s.rfind('\n'))
            .map(|offset| offset + 1)
            .unwrap_or(0);
        let ending_offset = source
            .get(end..)
            .and_then(|s| s.find('\n'))
            .map(|offset| offset + end)
            .unwrap_or(source.len());

        for line in source.get(starting_offset..ending_offset).unwrap_or_default().lines() {
            writeln!(f, "| {}", line.trim())?;
        }

        Ok(())
    }
}

impl fmt::Debug for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_without_file_shows_position() {
        let error = ParseError::new(ErrorKind::UnknownedCommand, Span::from(Position {
            line: 2,
            column: 5,
            offset: 10,
        }));

        assert_eq!(error.to_string(), "2:5: unknown command");
    }

    #[test]
    fn display_with_file_shows_offending_line() {
        let file = SourceFile::named("query.osql", "SELECT 1\nFROM foo(\nWHERE");
        let error = ParseError::new(ErrorKind::MalformedExpressionArity(4), Span {
            start: Position { line: 2, column: 6, offset: 14 },
            end: Position { line: 2, column: 9, offset: 17 },
        }).with_file(file);

        assert_eq!(
            error.to_string(),
            "expression has 4 parts, expected 1 to 3\nquery.osql:2:6\n| FROM foo(\n",
        );
    }
}
