//! Unit tests for the lexer module.
//!
//! Covers reserved words, the identifier classes, text and number literals,
//! the two-word `< input` token, and error cases.

use super::{lexer::tokenize, tokens::TokenKind};

#[test]
fn test_tokenize_reserved_words() {
    let source = "main begin end skip halt print if then else return";
    let tokens = tokenize(source).unwrap();

    assert_eq!(tokens.len(), 10);
    for token in &tokens {
        assert_eq!(token.kind, TokenKind::Reserved);
    }
    assert_eq!(tokens[0].word, "main");
    assert_eq!(tokens[9].word, "return");
}

#[test]
fn test_tokenize_operators_and_punctuation() {
    let source = "num text void not sqrt or and eq grt add sub mul div = ( ) , ; { }";
    let tokens = tokenize(source).unwrap();

    for token in &tokens {
        assert_eq!(token.kind, TokenKind::Reserved);
    }
}

#[test]
fn test_tokenize_variable_names() {
    let source = "V_x V_abc V_a1b2";
    let tokens = tokenize(source).unwrap();

    assert_eq!(tokens.len(), 3);
    for token in &tokens {
        assert_eq!(token.kind, TokenKind::Variable);
    }
    assert_eq!(tokens[0].word, "V_x");
}

#[test]
fn test_tokenize_function_names() {
    let source = "F_abc F_f1";
    let tokens = tokenize(source).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Function);
    assert_eq!(tokens[1].kind, TokenKind::Function);
}

#[test]
fn test_tokenize_text_literals() {
    let source = "\"Hello\" \"A\" \"Abcdefgh\"";
    let tokens = tokenize(source).unwrap();

    assert_eq!(tokens.len(), 3);
    for token in &tokens {
        assert_eq!(token.kind, TokenKind::TextLit);
    }
}

#[test]
fn test_tokenize_numbers() {
    let source = "0 42 -7 3.25 -0.5";
    let tokens = tokenize(source).unwrap();

    assert_eq!(tokens.len(), 5);
    for token in &tokens {
        assert_eq!(token.kind, TokenKind::Number);
    }
}

#[test]
fn test_tokenize_input_token() {
    let source = "V_x < input ;";
    let tokens = tokenize(source).unwrap();

    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[1].kind, TokenKind::Reserved);
    assert_eq!(tokens[1].word, "< input");
    assert_eq!(tokens[2].word, ";");
}

#[test]
fn test_tokenize_sequential_ids() {
    let source = "main begin skip ; end";
    let tokens = tokenize(source).unwrap();

    let ids: Vec<u32> = tokens.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_tokenize_rejects_unknown_word() {
    let result = tokenize("main begin @bad end");
    assert_eq!(
        result,
        Err(crate::errors::errors::LexError::UnrecognisedWord {
            word: "@bad".to_string()
        })
    );
}

#[test]
fn test_tokenize_rejects_uppercase_variable() {
    // Variable names must be V_ followed by lowercase letters/digits.
    assert!(tokenize("V_X").is_err());
}

#[test]
fn test_tokenize_rejects_long_text_literal() {
    // Text literals are a capital letter plus at most seven lowercase letters.
    assert!(tokenize("\"Toolongtext\"").is_err());
}

#[test]
fn test_tokenize_rejects_internal_marker() {
    assert_eq!(
        tokenize("V_x <_input ;"),
        Err(crate::errors::errors::LexError::ReservedInternalWord)
    );
}

#[test]
fn test_tokenize_skips_blank_lines() {
    let source = "main\n\n   \nbegin skip ; end";
    let tokens = tokenize(source).unwrap();
    assert_eq!(tokens.len(), 5);
}
