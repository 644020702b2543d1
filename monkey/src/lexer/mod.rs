//! Lexer implementation using logos

mod token;

pub use token::Token;

use crate::ast::Span;
use crate::error::{Error, Result};
use logos::Logos;

/// Tokenize source code
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span::new(lexer.span().start, lexer.span().end);
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(_) => {
                return Err(Error::lexer(
                    format!("unexpected character: {:?}", lexer.slice()),
                    span,
                ));
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").unwrap().is_empty());
    }

    #[test]
    fn test_tokenize_keywords() {
        assert_eq!(
            kinds("let return if else fn true false nil"),
            vec![
                Token::Let,
                Token::Return,
                Token::If,
                Token::Else,
                Token::Fn,
                Token::True,
                Token::False,
                Token::Nil
            ]
        );
    }

    #[test]
    fn test_tokenize_numeric_literals() {
        assert_eq!(
            kinds("42 42u 1.5"),
            vec![Token::IntLit(42), Token::UIntLit(42), Token::FloatLit(1.5)]
        );
    }

    #[test]
    fn test_tokenize_string_literal() {
        assert_eq!(
            kinds(r#""hello \"world\"""#),
            vec![Token::StringLit("hello \"world\"".to_string())]
        );
    }

    #[test]
    fn test_tokenize_operators() {
        assert_eq!(
            kinds("+ - * / % ! == != < > <= >= && ||"),
            vec![
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
                Token::Percent,
                Token::Bang,
                Token::EqEq,
                Token::NotEq,
                Token::Lt,
                Token::Gt,
                Token::LtEq,
                Token::GtEq,
                Token::AndAnd,
                Token::OrOr
            ]
        );
    }

    #[test]
    fn test_tokenize_method_chain() {
        assert_eq!(
            kinds("xs.push(1);"),
            vec![
                Token::Ident("xs".to_string()),
                Token::Dot,
                Token::Ident("push".to_string()),
                Token::LParen,
                Token::IntLit(1),
                Token::RParen,
                Token::Semi
            ]
        );
    }

    #[test]
    fn test_tokenize_skips_comments() {
        assert_eq!(kinds("1 // trailing\n2"), vec![Token::IntLit(1), Token::IntLit(2)]);
    }

    #[test]
    fn test_tokenize_spans() {
        let tokens = tokenize("let xs").unwrap();
        assert_eq!(tokens[0].1, Span::new(0, 3));
        assert_eq!(tokens[1].1, Span::new(4, 6));
    }

    #[test]
    fn test_tokenize_unexpected_character_error() {
        let err = tokenize("let x = 1 @ 2;").unwrap_err();
        assert!(err.message().contains("@"));
        assert_eq!(err.span(), Some(Span::new(10, 11)));
    }
}
