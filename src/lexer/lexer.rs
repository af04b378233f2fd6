use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::errors::LexError;

use super::tokens::{Token, TokenKind, RESERVED_WORDS};

lazy_static! {
    static ref VARIABLE_PATTERN: Regex = Regex::new("^V_[a-z][a-z0-9]*$").unwrap();
    static ref FUNCTION_PATTERN: Regex = Regex::new("^F_[a-z][a-z0-9]*$").unwrap();
    static ref STRING_PATTERN: Regex = Regex::new("^\"[A-Z][a-z]{0,7}\"$").unwrap();
    static ref NUMBER_PATTERN: Regex =
        Regex::new("^((0|([1-9][0-9]*))(\\.[0-9]+)?|-0(\\.[0-9]+)?|-[1-9][0-9]*(\\.[0-9]+)?)$")
            .unwrap();
}

// Words are whitespace-separated, so `< input` arrives as two words. It is
// re-joined through a private marker that must not itself appear in source.
const INPUT_MARKER: &str = "<_input";

/// Splits the source into whitespace-separated words and classifies each
/// into a token class.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = vec![];
    let mut id_counter = 1;

    for line in source.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.contains(INPUT_MARKER) {
            return Err(LexError::ReservedInternalWord);
        }

        let line = line.replace("< input", INPUT_MARKER);

        for word in line.split_whitespace() {
            let word = if word == INPUT_MARKER { "< input" } else { word };

            let kind = classify(word)?;
            tokens.push(Token {
                id: id_counter,
                kind,
                word: word.to_string(),
            });
            id_counter += 1;
        }
    }

    Ok(tokens)
}

fn classify(word: &str) -> Result<TokenKind, LexError> {
    if RESERVED_WORDS.contains(word) {
        return Ok(TokenKind::Reserved);
    }
    if VARIABLE_PATTERN.is_match(word) {
        return Ok(TokenKind::Variable);
    }
    if FUNCTION_PATTERN.is_match(word) {
        return Ok(TokenKind::Function);
    }
    if STRING_PATTERN.is_match(word) {
        return Ok(TokenKind::TextLit);
    }
    if NUMBER_PATTERN.is_match(word) {
        return Ok(TokenKind::Number);
    }

    Err(LexError::UnrecognisedWord {
        word: word.to_string(),
    })
}
