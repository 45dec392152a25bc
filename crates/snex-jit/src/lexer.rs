//! Tokenizer for SNEX declarations.
//!
//! Only the declaration level is interpreted by the parser, but function
//! bodies pass through the same lexer, so every character a body may
//! contain has to produce some token. Operators the parser doesn't care
//! about come out as [`TokenKind::Punct`].

use std::fmt;
use std::ops::Range;

use logos::Logos;
use snex_core::{LexError, Span, parse_literal};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TokenKind {
    #[regex(r"//[^\n]*", logos::skip, allow_greedy = true)]
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", logos::skip)]
    Comment,

    #[token("namespace")]
    Namespace,
    #[token("using")]
    Using,
    #[token("struct")]
    #[token("class")]
    Struct,
    #[token("enum")]
    Enum,
    #[token("static")]
    Static,
    #[token("const")]
    Const,
    #[token("public")]
    Public,
    #[token("private")]
    Private,
    #[token("protected")]
    Protected,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Identifier,

    #[regex(r"0x[0-9a-fA-F]+")]
    #[regex(r"[0-9]+f?")]
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?f?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?f?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+f?")]
    Number,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r"'([^'\\\n]|\\.)*'")]
    Str,

    #[token("::")]
    ColonColon,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("=")]
    Assign,
    #[token("&")]
    Amp,
    #[token("-")]
    Minus,

    #[regex(r"[+*/%!|^~?.\[\]#]")]
    Punct,
}

impl TokenKind {
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Comment => "comment",
            TokenKind::Namespace => "'namespace'",
            TokenKind::Using => "'using'",
            TokenKind::Struct => "'struct'",
            TokenKind::Enum => "'enum'",
            TokenKind::Static => "'static'",
            TokenKind::Const => "'const'",
            TokenKind::Public => "'public'",
            TokenKind::Private => "'private'",
            TokenKind::Protected => "'protected'",
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::Str => "string literal",
            TokenKind::ColonColon => "'::'",
            TokenKind::Colon => "':'",
            TokenKind::Semicolon => "';'",
            TokenKind::Comma => "','",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Less => "'<'",
            TokenKind::Greater => "'>'",
            TokenKind::Assign => "'='",
            TokenKind::Amp => "'&'",
            TokenKind::Minus => "'-'",
            TokenKind::Punct => "operator",
        }
    }

    /// Keywords that can open a declaration.
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Namespace
                | TokenKind::Using
                | TokenKind::Struct
                | TokenKind::Enum
                | TokenKind::Static
                | TokenKind::Const
                | TokenKind::Public
                | TokenKind::Private
                | TokenKind::Protected
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub span: Span,
    /// Byte range in the source.
    pub range: Range<usize>,
}

/// Byte offset to line/column translation.
#[derive(Debug, Clone)]
pub(crate) struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(source: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { line_starts }
    }

    pub(crate) fn span(&self, range: Range<usize>) -> Span {
        let line = self
            .line_starts
            .partition_point(|start| *start <= range.start)
            .saturating_sub(1);
        let col = range.start - self.line_starts.get(line).copied().unwrap_or(0);
        Span::new(
            line as u32 + 1,
            col as u32 + 1,
            range.end.saturating_sub(range.start) as u32,
        )
    }
}

/// Split `source` into tokens, dropping whitespace and comments.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, LexError> {
    let lines = LineIndex::new(source);
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let text = lexer.slice();
        let span = lines.span(range.clone());
        let kind = result.map_err(|()| LexError::UnexpectedChar {
            ch: text.chars().next().unwrap_or('\0'),
            span,
        })?;

        if kind == TokenKind::Number && parse_literal(text).is_none() {
            return Err(LexError::InvalidNumber {
                span,
                detail: format!("'{text}' is out of range"),
            });
        }

        tokens.push(Token {
            kind,
            text,
            span,
            range,
        });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn declaration_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds("static const int x = 5;"),
            vec![Static, Const, Identifier, Identifier, Assign, Number, Semicolon]
        );
        assert_eq!(
            kinds("span<float, 4> data;"),
            vec![Identifier, Less, Identifier, Comma, Number, Greater, Identifier, Semicolon]
        );
        assert_eq!(kinds("A::B"), vec![Identifier, ColonColon, Identifier]);
    }

    #[test]
    fn class_is_struct_keyword() {
        assert_eq!(kinds("class"), vec![TokenKind::Struct]);
    }

    #[test]
    fn numbers() {
        for text in ["5", "0x1F", "2.5f", "1.0", ".5", "1e3", "3f"] {
            let tokens = tokenize(text).unwrap();
            assert_eq!(tokens.len(), 1, "{text}");
            assert_eq!(tokens[0].kind, TokenKind::Number, "{text}");
            assert_eq!(tokens[0].text, text);
        }
    }

    #[test]
    fn comments_are_skipped() {
        let source = "// line\nint /* block\n comment */ x;";
        assert_eq!(
            kinds(source),
            vec![TokenKind::Identifier, TokenKind::Identifier, TokenKind::Semicolon]
        );
    }

    #[test]
    fn spans_are_line_based() {
        let tokens = tokenize("int a;\n  float b;").unwrap();
        let b = tokens.iter().find(|t| t.text == "b").unwrap();
        assert_eq!((b.span.line, b.span.col, b.span.len), (2, 9, 1));
        assert_eq!(b.range, 15..16);
    }

    #[test]
    fn body_operators_lex() {
        let source = "{ x += a[i] * 2.0f; return !y || z; }";
        assert!(tokenize(source).is_ok());
    }

    #[test]
    fn unexpected_character() {
        match tokenize("int a = `;") {
            Err(LexError::UnexpectedChar { ch, span }) => {
                assert_eq!(ch, '`');
                assert_eq!(span.col, 9);
            }
            other => panic!("Expected UnexpectedChar, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_number() {
        match tokenize("int a = 99999999999;") {
            Err(LexError::InvalidNumber { .. }) => {}
            other => panic!("Expected InvalidNumber, got {other:?}"),
        }
    }
}
