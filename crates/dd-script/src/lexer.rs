use logos::Logos;
use std::fmt;

use crate::error::ScriptError;

/// Token type for the script language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier or keyword (`story`, `if`, `true`…).
    Ident(String),
    /// Integer literal.
    Int(i64),
    /// String literal (single- or double-quoted in source).
    Str(String),
    /// `.`
    Dot,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `,`
    Comma,
    /// `;`
    Semi,
    /// `!`
    Not,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `=`
    Assign,
    /// `+=`
    PlusAssign,
    /// `-=`
    MinusAssign,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `+`
    Plus,
    /// `-`
    Minus,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "{name}"),
            Token::Int(n) => write!(f, "{n}"),
            Token::Str(s) => write!(f, "'{s}'"),
            Token::Dot => write!(f, "."),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Comma => write!(f, ","),
            Token::Semi => write!(f, ";"),
            Token::Not => write!(f, "!"),
            Token::AndAnd => write!(f, "&&"),
            Token::OrOr => write!(f, "||"),
            Token::Assign => write!(f, "="),
            Token::PlusAssign => write!(f, "+="),
            Token::MinusAssign => write!(f, "-="),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Le => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::Ge => write!(f, ">="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
        }
    }
}

#[derive(Logos, Debug)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
enum RawToken {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r"[0-9]+")]
    Int,

    #[regex(r"'[^'\n]*'")]
    SingleStr,

    #[regex(r#""[^"\n]*""#)]
    DoubleStr,

    #[token(".")]
    Dot,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token("!")]
    Not,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("=")]
    Assign,
    #[token("+=")]
    PlusAssign,
    #[token("-=")]
    MinusAssign,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
}

/// Lex script source into `(Token, Span)` pairs. The first bad character
/// or malformed literal aborts lexing: scripts are author code and faults
/// must surface, not be skipped.
pub fn lex(source: &str) -> Result<Vec<(Token, std::ops::Range<usize>)>, ScriptError> {
    let mut tokens = Vec::new();
    let mut lexer = RawToken::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let raw = result.map_err(|()| ScriptError::Syntax {
            position: span.start,
            message: format!("unexpected character: {:?}", &source[span.clone()]),
        })?;
        let token = match raw {
            RawToken::Ident => Token::Ident(lexer.slice().to_string()),
            RawToken::Int => {
                let slice = lexer.slice();
                let n = slice.parse::<i64>().map_err(|_| ScriptError::Syntax {
                    position: span.start,
                    message: format!("integer literal out of range: {slice}"),
                })?;
                Token::Int(n)
            }
            RawToken::SingleStr | RawToken::DoubleStr => {
                let slice = lexer.slice();
                Token::Str(slice[1..slice.len() - 1].to_string())
            }
            RawToken::Dot => Token::Dot,
            RawToken::LParen => Token::LParen,
            RawToken::RParen => Token::RParen,
            RawToken::LBrace => Token::LBrace,
            RawToken::RBrace => Token::RBrace,
            RawToken::Comma => Token::Comma,
            RawToken::Semi => Token::Semi,
            RawToken::Not => Token::Not,
            RawToken::AndAnd => Token::AndAnd,
            RawToken::OrOr => Token::OrOr,
            RawToken::Assign => Token::Assign,
            RawToken::PlusAssign => Token::PlusAssign,
            RawToken::MinusAssign => Token::MinusAssign,
            RawToken::EqEq => Token::EqEq,
            RawToken::NotEq => Token::NotEq,
            RawToken::Lt => Token::Lt,
            RawToken::Le => Token::Le,
            RawToken::Gt => Token::Gt,
            RawToken::Ge => Token::Ge,
            RawToken::Plus => Token::Plus,
            RawToken::Minus => Token::Minus,
        };
        tokens.push((token, span));
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        lex(source)
            .unwrap()
            .into_iter()
            .map(|(t, _)| t)
            .collect()
    }

    #[test]
    fn lex_predicate() {
        let tokens = kinds("!story.isInInventory('lamp')");
        assert_eq!(
            tokens,
            vec![
                Token::Not,
                Token::Ident("story".into()),
                Token::Dot,
                Token::Ident("isInInventory".into()),
                Token::LParen,
                Token::Str("lamp".into()),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn lex_compound_assignment() {
        let tokens = kinds("story.visits += 1");
        assert!(tokens.contains(&Token::PlusAssign));
        assert!(tokens.contains(&Token::Int(1)));
    }

    #[test]
    fn lex_multi_char_operators_win() {
        let tokens = kinds("a <= b == c != d >= e");
        assert!(tokens.contains(&Token::Le));
        assert!(tokens.contains(&Token::EqEq));
        assert!(tokens.contains(&Token::NotEq));
        assert!(tokens.contains(&Token::Ge));
        assert!(!tokens.contains(&Token::Assign));
    }

    #[test]
    fn lex_double_quoted_strings() {
        let tokens = kinds("story.name = \"Ariadne\"");
        assert!(tokens.contains(&Token::Str("Ariadne".into())));
    }

    #[test]
    fn lex_comments_are_skipped() {
        let tokens = kinds("story.n = 1 // bump\nstory.n += 1");
        assert_eq!(tokens.iter().filter(|t| matches!(t, Token::Int(_))).count(), 2);
    }

    #[test]
    fn lex_bad_character_is_a_fault() {
        assert!(lex("story.n = @").is_err());
    }
}
