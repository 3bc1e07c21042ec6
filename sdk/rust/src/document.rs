//! GraphQL executable documents.
//!
//! Operation documents are parsed once into a token stream so malformed
//! text fails before any request is sent, and printed back in a compact
//! canonical form (ignored characters stripped) for the request body.

use crate::error::{SdkError, SdkResult};
use crate::operation::OperationKind;
use std::fmt;

/// A byte range in the document source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Creates a new span.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }
}

/// The kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Eof,
    Name,
    Int,
    Float,
    String,
    BlockString,
    Bang,
    Dollar,
    Amp,
    LParen,
    RParen,
    Spread,
    Colon,
    Eq,
    At,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Pipe,
}

impl TokenKind {
    /// Returns true for tokens that need a separator from a neighbouring word.
    const fn is_word(self) -> bool {
        matches!(
            self,
            Self::Name | Self::Int | Self::Float | Self::String | Self::BlockString
        )
    }
}

/// A token with its location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Lexer for GraphQL executable documents.
struct Lexer<'a> {
    bytes: &'a [u8],
    pos: u32,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos as usize).copied()
    }

    #[inline]
    fn peek_at(&self, offset: u32) -> Option<u8> {
        self.bytes.get((self.pos + offset) as usize).copied()
    }

    #[inline]
    fn advance(&mut self) {
        self.pos += 1;
    }

    #[inline]
    fn advance_by(&mut self, n: u32) {
        self.pos += n;
    }

    fn error(&self, message: impl fmt::Display) -> SdkError {
        SdkError::invalid_document(format!("{message} at byte {}", self.pos))
    }

    fn next_token(&mut self) -> SdkResult<Token> {
        self.skip_ignored();
        let start = self.pos;

        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                span: Span::new(start, start),
            });
        };

        let kind = match c {
            b'!' => self.single(TokenKind::Bang),
            b'$' => self.single(TokenKind::Dollar),
            b'&' => self.single(TokenKind::Amp),
            b'(' => self.single(TokenKind::LParen),
            b')' => self.single(TokenKind::RParen),
            b':' => self.single(TokenKind::Colon),
            b'=' => self.single(TokenKind::Eq),
            b'@' => self.single(TokenKind::At),
            b'[' => self.single(TokenKind::LBracket),
            b']' => self.single(TokenKind::RBracket),
            b'{' => self.single(TokenKind::LBrace),
            b'}' => self.single(TokenKind::RBrace),
            b'|' => self.single(TokenKind::Pipe),
            b'.' => {
                if self.peek_at(1) == Some(b'.') && self.peek_at(2) == Some(b'.') {
                    self.advance_by(3);
                    TokenKind::Spread
                } else {
                    return Err(self.error("unexpected '.'"));
                }
            }
            b'"' => self.scan_string()?,
            b'-' | b'0'..=b'9' => self.scan_number()?,
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                while let Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') = self.peek() {
                    self.advance();
                }
                TokenKind::Name
            }
            other => {
                return Err(self.error(format_args!(
                    "unexpected character {:?}",
                    char::from(other)
                )));
            }
        };

        Ok(Token {
            kind,
            span: Span::new(start, self.pos),
        })
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Skips whitespace, commas, byte order marks and comments.
    fn skip_ignored(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n' | b',') => self.advance(),
                Some(b'#') => {
                    while let Some(c) = self.peek() {
                        if c == b'\n' || c == b'\r' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some(0xEF) if self.peek_at(1) == Some(0xBB) && self.peek_at(2) == Some(0xBF) => {
                    self.advance_by(3);
                }
                _ => break,
            }
        }
    }

    fn skip_digits(&mut self) -> u32 {
        let start = self.pos;
        while let Some(b'0'..=b'9') = self.peek() {
            self.advance();
        }
        self.pos - start
    }

    fn scan_number(&mut self) -> SdkResult<TokenKind> {
        let mut kind = TokenKind::Int;

        if self.peek() == Some(b'-') {
            self.advance();
        }
        if self.skip_digits() == 0 {
            return Err(self.error("expected digit"));
        }
        if self.peek() == Some(b'.') {
            kind = TokenKind::Float;
            self.advance();
            if self.skip_digits() == 0 {
                return Err(self.error("expected digit after '.'"));
            }
        }
        if let Some(b'e' | b'E') = self.peek() {
            kind = TokenKind::Float;
            self.advance();
            if let Some(b'+' | b'-') = self.peek() {
                self.advance();
            }
            if self.skip_digits() == 0 {
                return Err(self.error("expected exponent digits"));
            }
        }
        if let Some(b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'.') = self.peek() {
            return Err(self.error("invalid number"));
        }

        Ok(kind)
    }

    fn scan_string(&mut self) -> SdkResult<TokenKind> {
        if self.peek_at(1) == Some(b'"') && self.peek_at(2) == Some(b'"') {
            self.advance_by(3);
            return self.scan_block_string();
        }

        self.advance();
        loop {
            match self.peek() {
                None | Some(b'\n' | b'\r') => return Err(self.error("unterminated string")),
                Some(b'"') => {
                    self.advance();
                    return Ok(TokenKind::String);
                }
                Some(b'\\') => {
                    match self.peek_at(1) {
                        Some(b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't') => {
                            self.advance_by(2);
                        }
                        Some(b'u') => {
                            let hex = (2..6).all(|i| {
                                self.peek_at(i).is_some_and(|c| c.is_ascii_hexdigit())
                            });
                            if !hex {
                                return Err(self.error("invalid unicode escape"));
                            }
                            self.advance_by(6);
                        }
                        _ => return Err(self.error("invalid escape sequence")),
                    }
                }
                Some(_) => self.advance(),
            }
        }
    }

    fn scan_block_string(&mut self) -> SdkResult<TokenKind> {
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated block string")),
                Some(b'"') if self.peek_at(1) == Some(b'"') && self.peek_at(2) == Some(b'"') => {
                    self.advance_by(3);
                    return Ok(TokenKind::BlockString);
                }
                Some(b'\\')
                    if self.peek_at(1) == Some(b'"')
                        && self.peek_at(2) == Some(b'"')
                        && self.peek_at(3) == Some(b'"') =>
                {
                    self.advance_by(4);
                }
                Some(_) => self.advance(),
            }
        }
    }
}

/// A top-level definition found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Definition {
    /// An operation with its kind and optional name.
    Operation {
        kind: OperationKind,
        name: Option<String>,
    },
    /// A named fragment.
    Fragment { name: String },
}

/// A parsed GraphQL executable document.
#[derive(Debug, Clone)]
pub struct Document {
    source: String,
    tokens: Vec<Token>,
    definitions: Vec<Definition>,
}

impl Document {
    /// Parses a document, checking tokens, bracket nesting and definitions.
    pub fn parse(source: impl Into<String>) -> SdkResult<Self> {
        let source = source.into();
        if u32::try_from(source.len()).is_err() {
            return Err(SdkError::invalid_document("document is too large"));
        }

        let mut lexer = Lexer::new(&source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            if token.kind == TokenKind::Eof {
                break;
            }
            tokens.push(token);
        }

        let definitions = scan_definitions(&source, &tokens)?;
        Ok(Self {
            source,
            tokens,
            definitions,
        })
    }

    /// Returns the original source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the top-level definitions in order.
    pub fn definitions(&self) -> &[Definition] {
        &self.definitions
    }

    /// Returns the kind and name of the first operation.
    pub fn operation(&self) -> Option<(OperationKind, Option<&str>)> {
        self.definitions.iter().find_map(|def| match def {
            Definition::Operation { kind, name } => Some((*kind, name.as_deref())),
            Definition::Fragment { .. } => None,
        })
    }

    /// Prints the document with ignored characters stripped.
    pub fn print(&self) -> String {
        let mut out = String::with_capacity(self.source.len());
        let mut previous: Option<TokenKind> = None;

        for token in &self.tokens {
            if previous.is_some_and(|p| p.is_word() && token.kind.is_word()) {
                out.push(' ');
            }
            out.push_str(self.text(token));
            previous = Some(token.kind);
        }
        out
    }

    fn text(&self, token: &Token) -> &str {
        token_text(&self.source, token)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.print())
    }
}

fn token_text<'a>(source: &'a str, token: &Token) -> &'a str {
    &source[token.span.start as usize..token.span.end as usize]
}

fn scan_definitions(source: &str, tokens: &[Token]) -> SdkResult<Vec<Definition>> {
    let mut definitions = Vec::new();
    let mut stack: Vec<(TokenKind, Span)> = Vec::new();
    // Set between a definition keyword and the `{` opening its body.
    let mut in_header = false;

    for (i, token) in tokens.iter().enumerate() {
        if stack.is_empty() {
            match (token.kind, token_text(source, token)) {
                (TokenKind::LBrace, _) if in_header => in_header = false,
                (TokenKind::LBrace, _) => definitions.push(Definition::Operation {
                    kind: OperationKind::Query,
                    name: None,
                }),
                (TokenKind::Name, keyword @ ("query" | "mutation" | "subscription"))
                    if !in_header =>
                {
                    let kind = match keyword {
                        "mutation" => OperationKind::Mutation,
                        "subscription" => OperationKind::Subscription,
                        _ => OperationKind::Query,
                    };
                    let name = tokens
                        .get(i + 1)
                        .filter(|t| t.kind == TokenKind::Name)
                        .map(|t| token_text(source, t).to_string());
                    definitions.push(Definition::Operation { kind, name });
                    in_header = true;
                }
                (TokenKind::Name, "fragment") if !in_header => {
                    let name = tokens
                        .get(i + 1)
                        .filter(|t| t.kind == TokenKind::Name)
                        .map(|t| token_text(source, t).to_string())
                        .ok_or_else(|| {
                            SdkError::invalid_document(format!(
                                "fragment without a name at byte {}",
                                token.span.start
                            ))
                        })?;
                    definitions.push(Definition::Fragment { name });
                    in_header = true;
                }
                _ if in_header => {}
                (_, text) => {
                    return Err(SdkError::invalid_document(format!(
                        "unexpected {text:?} at byte {}, expected a definition",
                        token.span.start
                    )));
                }
            }
        }

        match token.kind {
            TokenKind::LBrace | TokenKind::LParen | TokenKind::LBracket => {
                stack.push((token.kind, token.span));
            }
            TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => {
                let expected = match token.kind {
                    TokenKind::RBrace => TokenKind::LBrace,
                    TokenKind::RParen => TokenKind::LParen,
                    _ => TokenKind::LBracket,
                };
                match stack.pop() {
                    Some((open, _)) if open == expected => {}
                    _ => {
                        return Err(SdkError::invalid_document(format!(
                            "unbalanced {:?} at byte {}",
                            token_text(source, token),
                            token.span.start
                        )));
                    }
                }
            }
            _ => {}
        }
    }

    if let Some((_, span)) = stack.last() {
        return Err(SdkError::invalid_document(format!(
            "unclosed bracket opened at byte {}",
            span.start
        )));
    }
    if in_header {
        return Err(SdkError::invalid_document(
            "definition is missing its selection set",
        ));
    }
    if !definitions
        .iter()
        .any(|d| matches!(d, Definition::Operation { .. }))
    {
        return Err(SdkError::invalid_document("document contains no operation"));
    }

    Ok(definitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_print_strips_ignored_characters() {
        let doc = Document::parse(
            r#"
            # channels for the sign-up form
            query getChannelList {
              getChannelList {
                id,
                token
                code
              }
            }
            "#,
        )
        .unwrap();

        assert_eq!(doc.print(), "query getChannelList{getChannelList{id token code}}");
    }

    #[test]
    fn test_print_keeps_arguments_and_strings() {
        let doc = Document::parse(
            "mutation login($email: String!, $rememberMe: Boolean = false) {\n  login(username: $email, note: \"a, b\") { __typename ... on CurrentUser { id } }\n}",
        )
        .unwrap();

        assert_eq!(
            doc.print(),
            "mutation login($email:String!$rememberMe:Boolean=false){login(username:$email note:\"a, b\"){__typename...on CurrentUser{id}}}"
        );
        assert_eq!(doc.to_string(), doc.print());
    }

    #[test]
    fn test_print_output_reparses_identically() {
        let doc = Document::parse("query q($n: Int = -1) { items(take: $n, skip: 2.5e1) { id } }")
            .unwrap();
        let reparsed = Document::parse(doc.print()).unwrap();
        assert_eq!(reparsed.print(), doc.print());
    }

    #[test]
    fn test_operation_header() {
        let doc = Document::parse(
            "fragment F on Channel { id } query getChannelList { getChannelList { ...F } }",
        )
        .unwrap();
        assert_eq!(
            doc.operation(),
            Some((OperationKind::Query, Some("getChannelList")))
        );
        assert_eq!(doc.definitions().len(), 2);

        let anonymous = Document::parse("{ activeCustomer { id } }").unwrap();
        assert_eq!(anonymous.operation(), Some((OperationKind::Query, None)));
    }

    #[test]
    fn test_rejects_malformed_documents() {
        for source in [
            "",
            "query a { b",
            "query a { b ) }",
            "query a { b(c: \"unterminated) }",
            "query a { b(c: 1x) }",
            "query a { b } ;",
            "fragment F on A { id }",
            "nonsense { a }",
        ] {
            let err = Document::parse(source).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidDocument, "source: {source:?}");
        }
    }

    #[test]
    fn test_block_strings() {
        let doc = Document::parse("query a { b(text: \"\"\"line\n\\\"\"\"quoted\"\"\") }").unwrap();
        assert!(doc.print().contains("\"\"\"line\n\\\"\"\"quoted\"\"\""));
    }
}
