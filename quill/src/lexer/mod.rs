//! Lexer implementation using logos

mod token;

pub use token::Token;

use crate::ast::Span;
use crate::error::{CompileError, Result};
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
                return Err(CompileError::lexer(describe_error(lexer.slice()), span));
            }
        }
    }

    Ok(tokens)
}

fn describe_error(slice: &str) -> String {
    if slice.starts_with('"') || slice.starts_with('\'') {
        "unterminated string literal".to_string()
    } else if slice.starts_with(|c: char| c.is_ascii_digit()) {
        format!("integer literal out of range: {slice}")
    } else {
        format!("unexpected character: {slice:?}")
    }
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
        assert!(tokenize("  \n\t ").unwrap().is_empty());
    }

    #[test]
    fn test_tokenize_numbers() {
        assert_eq!(kinds("42"), vec![Token::IntLit(42)]);
        assert_eq!(kinds("1.5"), vec![Token::DoubleLit(1.5)]);
        assert_eq!(kinds("3."), vec![Token::DoubleLit(3.0)]);
    }

    #[test]
    fn test_tokenize_int_overflow_is_error() {
        let err = tokenize("2147483648").unwrap_err();
        assert!(err.message().contains("out of range"));
        assert_eq!(kinds("2147483647"), vec![Token::IntLit(i32::MAX)]);
    }

    #[test]
    fn test_tokenize_strings_both_quotes() {
        assert_eq!(
            kinds(r#"'single' "double""#),
            vec![
                Token::StringLit("single".to_string()),
                Token::StringLit("double".to_string())
            ]
        );
    }

    #[test]
    fn test_tokenize_unterminated_string() {
        let err = tokenize("x = 'abc").unwrap_err();
        assert!(err.message().contains("unterminated"));
    }

    #[test]
    fn test_tokenize_arithmetic_operators() {
        assert_eq!(
            kinds("+ - * / % **"),
            vec![
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
                Token::Percent,
                Token::StarStar
            ]
        );
    }

    #[test]
    fn test_tokenize_assignment_operators() {
        assert_eq!(
            kinds("= += -= *= /= %= **="),
            vec![
                Token::Eq,
                Token::PlusEq,
                Token::MinusEq,
                Token::StarEq,
                Token::SlashEq,
                Token::PercentEq,
                Token::StarStarEq
            ]
        );
    }

    #[test]
    fn test_tokenize_increment_decrement() {
        assert_eq!(
            kinds("x++ --y"),
            vec![
                Token::Ident("x".to_string()),
                Token::PlusPlus,
                Token::MinusMinus,
                Token::Ident("y".to_string())
            ]
        );
    }

    #[test]
    fn test_tokenize_comparison_operators() {
        assert_eq!(
            kinds("== != < > <= >="),
            vec![Token::EqEq, Token::NotEq, Token::Lt, Token::Gt, Token::LtEq, Token::GtEq]
        );
    }

    #[test]
    fn test_tokenize_keywords_vs_identifiers() {
        assert_eq!(
            kinds("while whilst null"),
            vec![Token::While, Token::Ident("whilst".to_string()), Token::Null]
        );
    }

    #[test]
    fn test_tokenize_address_punctuation() {
        assert_eq!(
            kinds("a.b[0]"),
            vec![
                Token::Ident("a".to_string()),
                Token::Dot,
                Token::Ident("b".to_string()),
                Token::LBracket,
                Token::IntLit(0),
                Token::RBracket
            ]
        );
    }

    #[test]
    fn test_tokenize_spans() {
        let tokens = tokenize("ab = 12").unwrap();
        assert_eq!(tokens[0].1, Span::new(0, 2));
        assert_eq!(tokens[1].1, Span::new(3, 4));
        assert_eq!(tokens[2].1, Span::new(5, 7));
    }

    #[test]
    fn test_tokenize_skips_comments() {
        assert_eq!(
            kinds("x // trailing note\n; y"),
            vec![Token::Ident("x".to_string()), Token::Semi, Token::Ident("y".to_string())]
        );
    }

    #[test]
    fn test_tokenize_unexpected_character() {
        let err = tokenize("x # y").unwrap_err();
        assert_eq!(err.span(), Some(Span::new(2, 3)));
        assert!(err.message().contains("unexpected character"));
    }
}
