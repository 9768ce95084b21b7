//! Lexer (tokenizer) for template source
//!
//! The lexer is pulled one token at a time by the parser and runs in one of two
//! [`LexerState`]s, switched by the caller between calls:
//!
//! - [`LexerState::Text`] produces a single [`Token::Text`] for everything up to
//!   the next unescaped `{$`, then a [`Token::OpenTag`] for the `{$` itself.
//! - [`LexerState::Tag`] skips whitespace and produces the tokens that may appear
//!   between `{$` and `$}`.
//!
//! Lexing errors are fatal; after an error or after [`Token::Eof`] the lexer
//! must not be used again.

use super::ast::SourceLocation;
use std::fmt;
use thiserror::Error;

/// Reserved words recognised inside tags (case-insensitive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    For,
    End,
    /// The bare `=` that opens an echo tag
    Echo,
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Keyword::For => write!(f, "for"),
            Keyword::End => write!(f, "end"),
            Keyword::Echo => write!(f, "="),
        }
    }
}

/// All token variants produced by the lexer.
///
/// Every variant carries a [`SourceLocation`] so that parse errors can report
/// an accurate line and column without a separate token→location table.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Tag delimiters
    OpenTag(SourceLocation),  // {$
    CloseTag(SourceLocation), // $}

    Keyword(Keyword, SourceLocation),
    Ident(String, SourceLocation),

    // Literals
    StringLiteral(String, SourceLocation),
    IntLiteral(i32, SourceLocation),
    DoubleLiteral(f64, SourceLocation),

    /// `@name`, stored without the `@`
    Function(String, SourceLocation),
    Operator(char, SourceLocation),

    /// Literal text between tags, escapes already resolved
    Text(String, SourceLocation),

    Eof(SourceLocation),
}

impl Token {
    /// Returns the source location where this token appears.
    pub fn location(&self) -> SourceLocation {
        match self {
            Token::OpenTag(loc)
            | Token::CloseTag(loc)
            | Token::Keyword(_, loc)
            | Token::Ident(_, loc)
            | Token::StringLiteral(_, loc)
            | Token::IntLiteral(_, loc)
            | Token::DoubleLiteral(_, loc)
            | Token::Function(_, loc)
            | Token::Operator(_, loc)
            | Token::Text(_, loc)
            | Token::Eof(loc) => *loc,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::OpenTag(_) => write!(f, "'{{$'"),
            Token::CloseTag(_) => write!(f, "'$}}'"),
            Token::Keyword(keyword, _) => write!(f, "keyword '{}'", keyword),
            Token::Ident(name, _) => write!(f, "identifier '{}'", name),
            Token::StringLiteral(s, _) => write!(f, "string literal \"{}\"", s),
            Token::IntLiteral(n, _) => write!(f, "int literal {}", n),
            Token::DoubleLiteral(n, _) => write!(f, "double literal {}", n),
            Token::Function(name, _) => write!(f, "function '@{}'", name),
            Token::Operator(op, _) => write!(f, "operator '{}'", op),
            Token::Text(_, _) => write!(f, "text"),
            Token::Eof(_) => write!(f, "end of input"),
        }
    }
}

/// What went wrong while lexing
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexErrorKind {
    #[error("invalid escape sequence '{0}'")]
    InvalidEscape(String),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unrecognized character '{0}'")]
    UnrecognizedCharacter(char),

    #[error("function name must start with a letter after '@'")]
    InvalidFunctionName,

    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),

    #[error("no more tokens after end of input")]
    PastEndOfInput,
}

/// Lexer error type
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Lexer error at line {}, column {}: {kind}", location.line, location.column)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub location: SourceLocation,
}

impl LexError {
    pub fn new(kind: LexErrorKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }
}

/// Scanning mode selected by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexerState {
    #[default]
    Text,
    Tag,
}

const OPERATORS: [char; 5] = ['+', '-', '*', '/', '^'];

/// Lexer for template source
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    state: LexerState,
    current: Option<Token>,
}

impl Lexer {
    /// Create a new lexer for the given source string, starting in text mode.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            state: LexerState::Text,
            current: None,
        }
    }

    /// Changes the scanning mode for subsequent [`Lexer::next_token`] calls.
    pub fn set_state(&mut self, state: LexerState) {
        self.state = state;
    }

    /// Most recently produced token, `None` before the first call.
    pub fn current_token(&self) -> Option<&Token> {
        self.current.as_ref()
    }

    /// Produces the next token and advances past it.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        if let Some(Token::Eof(location)) = self.current {
            return Err(LexError::new(LexErrorKind::PastEndOfInput, location));
        }

        let token = match self.state {
            LexerState::Text => self.next_text_token()?,
            LexerState::Tag => self.next_tag_token()?,
        };
        self.current = Some(token.clone());
        Ok(token)
    }

    fn next_text_token(&mut self) -> Result<Token, LexError> {
        let location = self.current_location();

        if self.is_at_end() {
            return Ok(Token::Eof(location));
        }

        if self.at_open_tag() {
            self.advance();
            self.advance();
            return Ok(Token::OpenTag(location));
        }

        let mut text = String::new();
        while let Some(c) = self.peek() {
            if self.at_open_tag() {
                break;
            }

            if c == '\\' {
                match self.peek_at(1) {
                    Some(escaped @ ('\\' | '{')) => {
                        text.push(escaped);
                        self.advance();
                        self.advance();
                    }
                    other => {
                        return Err(LexError::new(
                            LexErrorKind::InvalidEscape(escape_display(other)),
                            self.current_location(),
                        ));
                    }
                }
                continue;
            }

            text.push(c);
            self.advance();
        }

        Ok(Token::Text(text, location))
    }

    fn next_tag_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let location = self.current_location();

        let Some(c) = self.peek() else {
            return Ok(Token::Eof(location));
        };

        if c == '$' && self.peek_at(1) == Some('}') {
            self.advance();
            self.advance();
            return Ok(Token::CloseTag(location));
        }

        if c == '=' {
            self.advance();
            return Ok(Token::Keyword(Keyword::Echo, location));
        }

        if c.is_alphabetic() {
            let word = self.read_word();
            return Ok(match word.to_lowercase().as_str() {
                "for" => Token::Keyword(Keyword::For, location),
                "end" => Token::Keyword(Keyword::End, location),
                _ => Token::Ident(word, location),
            });
        }

        if c == '@' {
            self.advance();
            if !self.peek().is_some_and(char::is_alphabetic) {
                return Err(LexError::new(LexErrorKind::InvalidFunctionName, location));
            }
            return Ok(Token::Function(self.read_word(), location));
        }

        if self.number_starts_at(self.position)
            || (c == '-' && self.number_starts_at(self.position + 1))
        {
            return self.read_number(location);
        }

        if c == '"' {
            return self.read_string(location);
        }

        if OPERATORS.contains(&c) {
            self.advance();
            return Ok(Token::Operator(c, location));
        }

        Err(LexError::new(
            LexErrorKind::UnrecognizedCharacter(c),
            location,
        ))
    }

    /// Letters, digits and underscores; the caller has checked the first letter.
    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                word.push(c);
                self.advance();
            } else {
                break;
            }
        }
        word
    }

    /// Optional `-`, digits and at most one `.`.
    ///
    /// A second `.` ends the literal one character early: in `1.2.3` the number
    /// is `1.` and lexing resumes at `2.3`.
    fn read_number(&mut self, location: SourceLocation) -> Result<Token, LexError> {
        let start = self.position;
        let mut end = start;
        if self.input[end] == '-' {
            end += 1;
        }

        let mut seen_dot = false;
        while end < self.input.len() {
            let c = self.input[end];
            if c == '.' {
                if seen_dot {
                    end -= 1;
                    break;
                }
                seen_dot = true;
            } else if !c.is_ascii_digit() {
                break;
            }
            end += 1;
        }

        let literal: String = self.input[start..end].iter().collect();
        for _ in start..end {
            self.advance();
        }

        let invalid = || LexError::new(LexErrorKind::InvalidNumber(literal.clone()), location);
        if !literal.chars().any(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        if literal.contains('.') {
            literal
                .parse::<f64>()
                .map(|value| Token::DoubleLiteral(value, location))
                .map_err(|_| invalid())
        } else {
            literal
                .parse::<i32>()
                .map(|value| Token::IntLiteral(value, location))
                .map_err(|_| invalid())
        }
    }

    fn read_string(&mut self, location: SourceLocation) -> Result<Token, LexError> {
        self.advance(); // opening quote
        let mut value = String::new();

        loop {
            match self.peek() {
                None => {
                    return Err(LexError::new(LexErrorKind::UnterminatedString, location));
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    let resolved = match self.peek_at(1) {
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        other => {
                            return Err(LexError::new(
                                LexErrorKind::InvalidEscape(escape_display(other)),
                                self.current_location(),
                            ));
                        }
                    };
                    value.push(resolved);
                    self.advance();
                    self.advance();
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        Ok(Token::StringLiteral(value, location))
    }

    /// A digit, or a `.` immediately followed by a digit.
    fn number_starts_at(&self, index: usize) -> bool {
        match self.input.get(index) {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => self.input.get(index + 1).is_some_and(char::is_ascii_digit),
            _ => false,
        }
    }

    fn at_open_tag(&self) -> bool {
        self.peek() == Some('{') && self.peek_at(1) == Some('$')
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.position += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

fn escape_display(next: Option<char>) -> String {
    match next {
        Some(c) => format!("\\{}", c),
        None => "\\".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag_tokens(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        lexer.set_state(LexerState::Tag);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            let done = matches!(token, Token::Eof(_));
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    #[test]
    fn test_text_until_open_tag() {
        let mut lexer = Lexer::new("Hello \\{$ and \\\\ there{$");
        let token = lexer.next_token().unwrap();
        assert!(matches!(token, Token::Text(ref s, _) if s == "Hello {$ and \\ there"));
        assert!(matches!(lexer.next_token().unwrap(), Token::OpenTag(_)));
        assert!(matches!(lexer.next_token().unwrap(), Token::Eof(_)));
    }

    #[test]
    fn test_current_token_repeats_last() {
        let mut lexer = Lexer::new("abc");
        assert!(lexer.current_token().is_none());
        let token = lexer.next_token().unwrap();
        assert_eq!(lexer.current_token(), Some(&token));
        assert_eq!(lexer.current_token(), Some(&token));
    }

    #[test]
    fn test_invalid_text_escape() {
        let mut lexer = Lexer::new("bad \\n escape");
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InvalidEscape("\\n".to_string()));
        assert_eq!(err.location, SourceLocation::new(1, 5));
    }

    #[test]
    fn test_trailing_backslash_is_error() {
        let mut lexer = Lexer::new("oops\\");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn test_next_after_eof_is_error() {
        let mut lexer = Lexer::new("");
        assert!(matches!(lexer.next_token().unwrap(), Token::Eof(_)));
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::PastEndOfInput);
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let tokens = tag_tokens("FOR For end = forx");
        assert!(matches!(tokens[0], Token::Keyword(Keyword::For, _)));
        assert!(matches!(tokens[1], Token::Keyword(Keyword::For, _)));
        assert!(matches!(tokens[2], Token::Keyword(Keyword::End, _)));
        assert!(matches!(tokens[3], Token::Keyword(Keyword::Echo, _)));
        assert!(matches!(tokens[4], Token::Ident(ref s, _) if s == "forx"));
    }

    #[test]
    fn test_numbers() {
        let tokens = tag_tokens("3.23 .23 -.13 324 -23423 23. -23.");
        assert!(matches!(tokens[0], Token::DoubleLiteral(v, _) if v == 3.23));
        assert!(matches!(tokens[1], Token::DoubleLiteral(v, _) if v == 0.23));
        assert!(matches!(tokens[2], Token::DoubleLiteral(v, _) if v == -0.13));
        assert!(matches!(tokens[3], Token::IntLiteral(324, _)));
        assert!(matches!(tokens[4], Token::IntLiteral(-23423, _)));
        assert!(matches!(tokens[5], Token::DoubleLiteral(v, _) if v == 23.0));
        assert!(matches!(tokens[6], Token::DoubleLiteral(v, _) if v == -23.0));
        assert!(matches!(tokens[7], Token::Eof(_)));
    }

    #[test]
    fn test_second_dot_ends_number_early() {
        let tokens = tag_tokens("1.2.3");
        assert!(matches!(tokens[0], Token::DoubleLiteral(v, _) if v == 1.0));
        assert!(matches!(tokens[1], Token::DoubleLiteral(v, _) if v == 2.3));
    }

    #[test]
    fn test_integer_overflow_is_error() {
        let mut lexer = Lexer::new("99999999999");
        lexer.set_state(LexerState::Tag);
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err.kind, LexErrorKind::InvalidNumber(_)));
    }

    #[test]
    fn test_operators_and_minus() {
        let tokens = tag_tokens("*-+^/ - 3 -3");
        let ops: Vec<char> = tokens
            .iter()
            .filter_map(|t| match t {
                Token::Operator(op, _) => Some(*op),
                _ => None,
            })
            .collect();
        assert_eq!(ops, vec!['*', '-', '+', '^', '/', '-']);
        assert!(matches!(tokens[6], Token::IntLiteral(3, _)));
        assert!(matches!(tokens[7], Token::IntLiteral(-3, _)));
    }

    #[test]
    fn test_strings() {
        let tokens = tag_tokens(r#""aaaa\"" "a\nb" "$}" "tab\t""#);
        assert!(matches!(tokens[0], Token::StringLiteral(ref s, _) if s == "aaaa\""));
        assert!(matches!(tokens[1], Token::StringLiteral(ref s, _) if s == "a\nb"));
        assert!(matches!(tokens[2], Token::StringLiteral(ref s, _) if s == "$}"));
        assert!(matches!(tokens[3], Token::StringLiteral(ref s, _) if s == "tab\t"));
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("\"never closed $}");
        lexer.set_state(LexerState::Tag);
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
    }

    #[test]
    fn test_invalid_string_escape() {
        let mut lexer = Lexer::new(r#""\q""#);
        lexer.set_state(LexerState::Tag);
        assert!(matches!(
            lexer.next_token().unwrap_err().kind,
            LexErrorKind::InvalidEscape(_)
        ));
    }

    #[test]
    fn test_functions() {
        let tokens = tag_tokens("@sin @Kad_21");
        assert!(matches!(tokens[0], Token::Function(ref s, _) if s == "sin"));
        assert!(matches!(tokens[1], Token::Function(ref s, _) if s == "Kad_21"));

        let mut lexer = Lexer::new("@@adaa");
        lexer.set_state(LexerState::Tag);
        assert_eq!(
            lexer.next_token().unwrap_err().kind,
            LexErrorKind::InvalidFunctionName
        );
    }

    #[test]
    fn test_unrecognized_character() {
        let mut lexer = Lexer::new("name{");
        lexer.set_state(LexerState::Tag);
        lexer.next_token().unwrap();
        assert_eq!(
            lexer.next_token().unwrap_err().kind,
            LexErrorKind::UnrecognizedCharacter('{')
        );
    }

    #[test]
    fn test_mixed_states() {
        let mut lexer = Lexer::new("text {$ FOR i 1 10 $}body");
        assert!(matches!(lexer.next_token().unwrap(), Token::Text(ref s, _) if s == "text "));
        assert!(matches!(lexer.next_token().unwrap(), Token::OpenTag(_)));
        lexer.set_state(LexerState::Tag);
        assert!(matches!(lexer.next_token().unwrap(), Token::Keyword(Keyword::For, _)));
        assert!(matches!(lexer.next_token().unwrap(), Token::Ident(ref s, _) if s == "i"));
        assert!(matches!(lexer.next_token().unwrap(), Token::IntLiteral(1, _)));
        assert!(matches!(lexer.next_token().unwrap(), Token::IntLiteral(10, _)));
        assert!(matches!(lexer.next_token().unwrap(), Token::CloseTag(_)));
        lexer.set_state(LexerState::Text);
        assert!(matches!(lexer.next_token().unwrap(), Token::Text(ref s, _) if s == "body"));
    }

    #[test]
    fn test_locations_track_lines() {
        let mut lexer = Lexer::new("a\nb{$");
        lexer.next_token().unwrap();
        let open = lexer.next_token().unwrap();
        assert_eq!(open.location(), SourceLocation::new(2, 2));
    }
}
