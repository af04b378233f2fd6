use thiserror::Error;

/// Lexical errors raised while classifying source words into tokens.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("token does not belong to any class: {word:?}")]
    UnrecognisedWord { word: String },
    #[error("invalid token '<_input' encountered in the source code")]
    ReservedInternalWord,
}

/// Syntax errors raised while recognising the token stream.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected token {found:?}, expected {expected}")]
    UnexpectedToken { expected: String, found: String },
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },
}

/// Fatal scope-analysis errors. Any of these aborts the whole pipeline;
/// no partial output is trusted afterwards.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScopeError {
    #[error("variable {name:?} already declared in this scope")]
    VariableAlreadyDeclared { name: String },
    #[error("name {name:?} cannot be a reserved keyword")]
    ReservedKeyword { name: String },
    #[error("variable {name:?} not declared")]
    VariableNotDeclared { name: String },
    #[error("function {name:?}: sibling already declared with the same name in this scope")]
    FunctionAlreadyDeclared { name: String },
    #[error("function {name:?}: child scope has same name as parent scope")]
    ScopeNameCollision { name: String },
    #[error("function call to {name:?} cannot be resolved")]
    UnresolvedCall { name: String },
    #[error("recursive calls to 'main' are not allowed")]
    RecursiveMain,
    #[error("'return' statement cannot appear in the 'main' scope")]
    ReturnInMain,
    #[error("'return' statement must appear within a function scope")]
    ReturnOutsideFunction,
    #[error("malformed syntax tree: {message}")]
    MalformedTree { message: String },
}

/// Fatal type-lookup errors. Distinct from the soft rule-violation verdict:
/// these indicate the input tree was not actually well-formed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("no binding for id {unid} ({name:?})")]
    MissingBinding { unid: u32, name: String },
    #[error("invalid node shape for type judgment: {label}")]
    InvalidNode { label: String },
}

/// Internal-invariant violations inside a code generator. Unreachable for a
/// tree that passed type checking; never user-facing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodeGenError {
    #[error("unsupported operator: {op:?}")]
    UnsupportedOperator { op: String },
    #[error("no binding for id {unid}")]
    MissingBinding { unid: u32 },
    #[error("malformed syntax tree: {message}")]
    MalformedTree { message: String },
}

/// Umbrella error for the driver and integration callers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("lexical error: {0}")]
    Lex(#[from] LexError),
    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),
    #[error("scope error: {0}")]
    Scope(#[from] ScopeError),
    #[error("type error: {0}")]
    Type(#[from] TypeError),
    #[error("code generation error: {0}")]
    CodeGen(#[from] CodeGenError),
    #[error("type check failed")]
    TypeCheckFailed,
}
