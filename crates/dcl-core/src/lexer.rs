use regex::Regex;
use std::sync::LazyLock;

use crate::types::*;

// --- Regex patterns ---

static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[ \t\r]+").unwrap());
static RE_LINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^//[^\n]*").unwrap());
static RE_BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/\*(?s:.*?)\*/").unwrap());
static RE_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").unwrap());
static RE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(-?[0-9]+)(L?)").unwrap());
static RE_STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^"((?:[^"\\\n]|\\.)*)""#).unwrap());

/// Tokenize document source into a flat token sequence ending with `Eof`.
///
/// Lexing never fails: unrecognized input becomes an `Invalid` token carrying
/// the reason, and the parser turns it into a syntax error.
pub fn lex(content: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut pos = 0;
    let mut line = 1;
    let mut col = 1;

    while pos < content.len() {
        let rest = &content[pos..];
        let start_line = line;
        let start_col = col;

        let (token_type, text, consumed) = if let Some(m) = RE_WHITESPACE.find(rest) {
            (None, String::new(), m.end())
        } else if rest.starts_with('\n') {
            (Some(TokenType::Newline), String::new(), 1)
        } else if let Some(m) = RE_LINE_COMMENT.find(rest) {
            (None, String::new(), m.end())
        } else if let Some(m) = RE_BLOCK_COMMENT.find(rest) {
            // A multi-line comment still separates statements.
            let separator = m.as_str().contains('\n').then_some(TokenType::Newline);
            (separator, String::new(), m.end())
        } else if rest.starts_with("/*") {
            (
                Some(TokenType::Invalid),
                "unterminated block comment".to_string(),
                rest.len(),
            )
        } else if let Some(caps) = RE_NUMBER.captures(rest) {
            let digits = caps[1].to_string();
            let token_type = if caps[2].is_empty() {
                TokenType::IntLiteral
            } else {
                TokenType::LongLiteral
            };
            (Some(token_type), digits, caps[0].len())
        } else if let Some(m) = RE_IDENT.find(rest) {
            (Some(keyword_or_identifier(m.as_str())), m.as_str().to_string(), m.end())
        } else if let Some(caps) = RE_STRING.captures(rest) {
            match unescape(&caps[1]) {
                Ok(value) => (Some(TokenType::StringLiteral), value, caps[0].len()),
                Err(reason) => (Some(TokenType::Invalid), reason, caps[0].len()),
            }
        } else if rest.starts_with('"') {
            let end = rest.find('\n').unwrap_or(rest.len());
            (
                Some(TokenType::Invalid),
                "unterminated string literal".to_string(),
                end,
            )
        } else {
            let c = rest.chars().next().unwrap_or('\0');
            let token_type = match c {
                '.' => TokenType::Dot,
                ',' => TokenType::Comma,
                '=' => TokenType::Assign,
                '(' => TokenType::LParen,
                ')' => TokenType::RParen,
                '{' => TokenType::LBrace,
                '}' => TokenType::RBrace,
                ';' => TokenType::Semicolon,
                _ => TokenType::Invalid,
            };
            let text = if token_type == TokenType::Invalid {
                format!("unexpected character '{c}'")
            } else {
                c.to_string()
            };
            (Some(token_type), text, c.len_utf8())
        };

        for ch in content[pos..pos + consumed].chars() {
            if ch == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        pos += consumed;

        if let Some(token_type) = token_type {
            tokens.push(Token {
                token_type,
                text,
                line: start_line,
                col: start_col,
            });
        }
    }

    tokens.push(Token {
        token_type: TokenType::Eof,
        text: String::new(),
        line,
        col,
    });
    tokens
}

fn keyword_or_identifier(word: &str) -> TokenType {
    match word {
        "true" => TokenType::True,
        "false" => TokenType::False,
        "null" => TokenType::Null,
        "this" => TokenType::This,
        "val" => TokenType::Val,
        "import" => TokenType::Import,
        _ => TokenType::Identifier,
    }
}

fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('$') => out.push('$'),
            Some(other) => return Err(format!("unsupported escape sequence '\\{other}'")),
            None => return Err("dangling escape at end of string".to_string()),
        }
    }
    Ok(out)
}
