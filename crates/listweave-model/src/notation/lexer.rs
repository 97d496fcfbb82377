//! Tokenizer for the document notation, built with [Logos].
//!
//! [Logos]: https://docs.rs/logos

use std::ops::Range;

use logos::Logos;

use super::NotationError;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TokenKind {
    /// Node type name, alias, attribute name, or `true`/`false`
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r"-?[0-9]+")]
    Int,

    /// Double quoted string, escapes still in place
    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(",")]
    Comma,

    #[token("=")]
    Eq,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Range<usize>,
}

/// Tokenize `input`. Any character that starts no token is an error.
pub fn lex(input: &str) -> Result<Vec<Token<'_>>, NotationError> {
    let mut tokens = Vec::new();
    for (kind, span) in TokenKind::lexer(input).spanned() {
        let kind = kind.map_err(|()| NotationError::UnexpectedChar { offset: span.start })?;
        tokens.push(Token {
            kind,
            text: &input[span.clone()],
            span,
        });
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_nested_nodes() {
        let kinds: Vec<_> = lex(r#"ol[order=3](li(p("a\"b")))"#)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect();
        use TokenKind::*;
        assert_eq!(
            kinds,
            vec![
                Ident, LBracket, Ident, Eq, Int, RBracket, LParen, Ident, LParen, Ident, LParen,
                Str, RParen, RParen, RParen
            ]
        );
    }

    #[test]
    fn spans_cover_token_text() {
        let tokens = lex(r#"p( "x<a>" )"#).unwrap();
        assert_eq!(tokens[2].text, r#""x<a>""#);
        assert_eq!(tokens[2].span, 3..9);
    }

    #[test]
    fn rejects_stray_characters() {
        assert_eq!(
            lex("p(#)").unwrap_err(),
            NotationError::UnexpectedChar { offset: 2 }
        );
    }
}
