//! Recursive descent parser for templates
//!
//! The parser pulls tokens from the [`Lexer`] in text mode, switches it to tag
//! mode after every `{$`, and back to text mode once the tag is closed. Open
//! `FOR` loops are tracked on an explicit stack; `END` pops the innermost one
//! and attaches it to its parent.
//!
//! Parsing is all-or-nothing: any grammar violation or lexing error aborts
//! with a [`ParseError`] and no partial tree is returned.

use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, LexError, LexErrorKind, Lexer, LexerState, Token};
use thiserror::Error;
use tracing::debug;

/// What went wrong while parsing
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error(transparent)]
    Lex(LexErrorKind),

    #[error("keyword not recognized: expected FOR, END or =, found {found}")]
    KeywordNotRecognized { found: String },

    #[error("for loop must start with a variable name, found {found}")]
    ExpectedLoopVariable { found: String },

    #[error("for loop arguments must be variables or constants, found {found}")]
    InvalidLoopArgument { found: String },

    #[error("too few arguments for for loop: expected 2 or 3, found {found}")]
    TooFewLoopArguments { found: usize },

    #[error("too many arguments for for loop: expected at most 3")]
    TooManyLoopArguments,

    #[error("invalid element in echo tag: {found}")]
    InvalidEchoElement { found: String },

    #[error("END must be alone in its tag, found {found}")]
    EndTagNotAlone { found: String },

    #[error("misplaced END tag: no open FOR loop")]
    MisplacedEnd,

    #[error("{count} unclosed tag(s)")]
    UnclosedTags { count: usize },

    #[error("unexpected {found} outside of a tag")]
    UnexpectedToken { found: String },
}

/// Parser error type
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Parse error at line {}, column {}: {kind}", location.line, location.column)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub location: SourceLocation,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            kind: ParseErrorKind::Lex(err.kind),
            location: err.location,
        }
    }
}

/// Containers that are still accepting children.
///
/// The document is always at the bottom; loops are closed in LIFO order.
struct OpenNodes {
    document: Vec<Node>,
    loops: Vec<ForLoopNode>,
}

impl OpenNodes {
    fn new() -> Self {
        Self {
            document: Vec::new(),
            loops: Vec::new(),
        }
    }

    fn push_child(&mut self, node: Node) {
        match self.loops.last_mut() {
            Some(open_loop) => open_loop.children.push(node),
            None => self.document.push(node),
        }
    }

    fn open(&mut self, for_loop: ForLoopNode) {
        self.loops.push(for_loop);
    }

    /// Closes the innermost loop. Returns `false` when no loop is open.
    fn close(&mut self) -> bool {
        match self.loops.pop() {
            Some(closed) => {
                self.push_child(Node::ForLoop(closed));
                true
            }
            None => false,
        }
    }
}

/// Recursive descent parser for the template language
pub struct Parser {
    lexer: Lexer,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Self {
            lexer: Lexer::new(source),
        }
    }

    /// Parse the whole input into a document tree
    pub fn parse_document(&mut self) -> Result<DocumentNode, ParseError> {
        let mut open = OpenNodes::new();

        loop {
            match self.lexer.next_token()? {
                Token::Eof(_) => break,
                Token::Text(text, location) => {
                    open.push_child(Node::Text(TextNode { text, location }));
                }
                Token::OpenTag(location) => {
                    self.lexer.set_state(LexerState::Tag);
                    self.parse_tag(&mut open, location)?;
                    self.lexer.set_state(LexerState::Text);
                }
                other => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnexpectedToken {
                            found: other.to_string(),
                        },
                        other.location(),
                    ));
                }
            }
        }

        if let Some(innermost) = open.loops.last() {
            return Err(ParseError::new(
                ParseErrorKind::UnclosedTags {
                    count: open.loops.len(),
                },
                innermost.location,
            ));
        }

        let document = DocumentNode {
            children: open.document,
        };
        debug!(nodes = document.node_count(), "parsed template");
        Ok(document)
    }

    /// Dispatch on the keyword following `{$`
    fn parse_tag(&mut self, open: &mut OpenNodes, location: SourceLocation) -> Result<(), ParseError> {
        match self.lexer.next_token()? {
            Token::Keyword(Keyword::For, _) => {
                let for_loop = self.parse_for_loop(location)?;
                open.open(for_loop);
            }
            Token::Keyword(Keyword::Echo, _) => {
                let echo = self.parse_echo(location)?;
                open.push_child(Node::Echo(echo));
            }
            Token::Keyword(Keyword::End, _) => {
                let token = self.lexer.next_token()?;
                if !matches!(token, Token::CloseTag(_)) {
                    return Err(ParseError::new(
                        ParseErrorKind::EndTagNotAlone {
                            found: token.to_string(),
                        },
                        token.location(),
                    ));
                }
                if !open.close() {
                    return Err(ParseError::new(ParseErrorKind::MisplacedEnd, location));
                }
            }
            other => {
                return Err(ParseError::new(
                    ParseErrorKind::KeywordNotRecognized {
                        found: other.to_string(),
                    },
                    other.location(),
                ));
            }
        }
        Ok(())
    }

    /// `FOR` already consumed: variable, then 2 or 3 arguments, then `$}`
    fn parse_for_loop(&mut self, location: SourceLocation) -> Result<ForLoopNode, ParseError> {
        let variable = match self.lexer.next_token()? {
            Token::Ident(name, _) => name,
            other => {
                return Err(ParseError::new(
                    ParseErrorKind::ExpectedLoopVariable {
                        found: other.to_string(),
                    },
                    other.location(),
                ));
            }
        };

        let mut arguments = Vec::with_capacity(3);
        loop {
            let token = self.lexer.next_token()?;
            if matches!(token, Token::CloseTag(_)) {
                break;
            }
            if arguments.len() == 3 {
                return Err(ParseError::new(
                    ParseErrorKind::TooManyLoopArguments,
                    token.location(),
                ));
            }
            let element = match token {
                Token::StringLiteral(s, _) => Element::Str(s),
                Token::IntLiteral(n, _) => Element::Integer(n),
                Token::DoubleLiteral(n, _) => Element::Double(n),
                Token::Ident(name, _) => Element::Variable(name),
                other => {
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidLoopArgument {
                            found: other.to_string(),
                        },
                        other.location(),
                    ));
                }
            };
            arguments.push(element);
        }

        let found = arguments.len();
        let mut arguments = arguments.into_iter();
        match (arguments.next(), arguments.next(), arguments.next()) {
            (Some(start), Some(end), step) => Ok(ForLoopNode {
                variable,
                start,
                end,
                step,
                children: Vec::new(),
                location,
            }),
            _ => Err(ParseError::new(
                ParseErrorKind::TooFewLoopArguments { found },
                location,
            )),
        }
    }

    /// `=` already consumed: any number of elements, then `$}`
    fn parse_echo(&mut self, location: SourceLocation) -> Result<EchoNode, ParseError> {
        let mut elements = Vec::new();
        loop {
            let element = match self.lexer.next_token()? {
                Token::CloseTag(_) => break,
                Token::StringLiteral(s, _) => Element::Str(s),
                Token::IntLiteral(n, _) => Element::Integer(n),
                Token::DoubleLiteral(n, _) => Element::Double(n),
                Token::Ident(name, _) => Element::Variable(name),
                Token::Function(name, _) => Element::Function(name),
                Token::Operator(op, _) => Element::Operator(op),
                other => {
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidEchoElement {
                            found: other.to_string(),
                        },
                        other.location(),
                    ));
                }
            };
            elements.push(element);
        }
        Ok(EchoNode { elements, location })
    }
}

/// Parse a template in one call.
pub fn parse(source: &str) -> Result<DocumentNode, ParseError> {
    Parser::new(source).parse_document()
}
