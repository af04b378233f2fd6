use lazy_static::lazy_static;
use std::{collections::HashSet, fmt::Display};

lazy_static! {
    /// Every reserved word of the language, including punctuation terminals.
    /// The two-word `< input` is reserved as a single token.
    pub static ref RESERVED_WORDS: HashSet<&'static str> = {
        let mut set = HashSet::new();
        for word in [
            "main", "begin", "end", "skip", "halt", "print", "if", "then", "else",
            "num", "text", "void", "not", "sqrt", "or", "and", "eq", "grt",
            "add", "sub", "mul", "div", "< input", "=", "(", ")", ",", ";",
            "{", "}", "return",
        ] {
            set.insert(word);
        }
        set
    };
}

/// Lexical class of a token.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    Reserved,
    Variable,
    Function,
    TextLit,
    Number,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Sequential token id, starting at 1.
    pub id: u32,
    pub kind: TokenKind,
    pub word: String,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Token {{ id: {}, class: {}, word: {:?} }}",
            self.id, self.kind, self.word
        )
    }
}
