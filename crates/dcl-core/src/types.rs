use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Source location
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: usize,
    pub col: usize,
}

impl SourceLocation {
    pub fn new(file: &str, line: usize, col: usize) -> Self {
        Self {
            file: file.to_string(),
            line,
            col,
        }
    }
}

// ---------------------------------------------------------------------------
// Token types (internal, not serialized)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Identifier,
    IntLiteral,
    LongLiteral,
    StringLiteral,
    True,
    False,
    Null,
    This,
    Val,
    Import,
    Dot,
    Comma,
    Assign,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semicolon,
    Newline,
    /// A character sequence the lexer could not classify. `text` carries the reason.
    Invalid,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    /// Identifier name, literal digits, or the unescaped string content.
    pub text: String,
    pub line: usize,
    pub col: usize,
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub severity: DiagnosticSeverity,
    pub file: String,
    pub line: usize,
    pub col: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn error(code: &str, loc: &SourceLocation, message: String) -> Self {
        Self {
            code: code.to_string(),
            severity: DiagnosticSeverity::Error,
            file: loc.file.clone(),
            line: loc.line,
            col: loc.col,
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}
