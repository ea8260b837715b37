use crate::language::*;
use crate::lexer::lex;
use crate::types::*;

// Syntax error codes.
pub const E_UNEXPECTED_TOKEN: &str = "DCL-P001";
pub const E_INVALID_TOKEN: &str = "DCL-P002";
pub const E_LITERAL_RANGE: &str = "DCL-P003";
pub const E_ASSIGNMENT_TARGET: &str = "DCL-P004";
pub const E_UNCLOSED_BLOCK: &str = "DCL-P005";
pub const E_MISPLACED_IMPORT: &str = "DCL-P006";

type ParseResult<T> = Result<T, SyntaxError>;

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    file: String,
}

/// Parse document source into a language tree.
///
/// Parsing always produces a tree; malformed statements are kept as
/// [`DataStatement::Error`] entries so one mistake does not hide the rest of
/// the document.
pub fn parse_string(content: &str, file: &str) -> LanguageTree {
    let tokens = lex(content);
    parse_tokens(&tokens, file)
}

/// Parse a token sequence into a language tree.
pub fn parse_tokens(tokens: &[Token], file: &str) -> LanguageTree {
    let eof = [Token {
        token_type: TokenType::Eof,
        text: String::new(),
        line: 1,
        col: 1,
    }];
    let tokens = if tokens.is_empty() { &eof[..] } else { tokens };
    let mut parser = Parser {
        tokens,
        pos: 0,
        file: file.to_string(),
    };
    let mut errors = Vec::new();
    let imports = parser.parse_imports(&mut errors);
    let start = parser.loc();
    let mut statements: Vec<DataStatement> = errors.into_iter().map(DataStatement::Error).collect();
    statements.extend(parser.parse_statements(false));
    log::debug!(
        "parsed {}: {} imports, {} top-level statements",
        file,
        imports.len(),
        statements.len()
    );
    LanguageTree {
        imports,
        top_level_block: Block {
            statements,
            loc: start,
        },
    }
}

impl<'a> Parser<'a> {
    // --- Token cursor ---

    // `tokens` is never empty and always ends with `Eof`.
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_type(&self) -> TokenType {
        self.peek().token_type
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn loc(&self) -> SourceLocation {
        let token = self.peek();
        SourceLocation::new(&self.file, token.line, token.col)
    }

    fn error(&self, code: &str, message: String) -> SyntaxError {
        SyntaxError {
            code: code.to_string(),
            message,
            loc: self.loc(),
        }
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        let token = self.peek();
        if token.token_type == TokenType::Invalid {
            return self.error(E_INVALID_TOKEN, token.text.clone());
        }
        self.error(
            E_UNEXPECTED_TOKEN,
            format!("expected {}, found {}", expected, describe(token)),
        )
    }

    fn expect(&mut self, token_type: TokenType, expected: &str) -> ParseResult<Token> {
        if self.peek_type() == token_type {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek_type(), TokenType::Newline | TokenType::Semicolon) {
            self.advance();
        }
    }

    fn skip_newlines(&mut self) {
        while self.peek_type() == TokenType::Newline {
            self.advance();
        }
    }

    /// Skip to the end of the current statement, keeping braces balanced.
    fn recover(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek_type() {
                TokenType::Eof => return,
                TokenType::Newline | TokenType::Semicolon if depth == 0 => return,
                TokenType::LBrace => depth += 1,
                TokenType::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.advance();
        }
    }

    // --- Imports ---

    fn parse_imports(&mut self, errors: &mut Vec<SyntaxError>) -> Vec<Import> {
        let mut imports = Vec::new();
        loop {
            self.skip_separators();
            if self.peek_type() != TokenType::Import {
                return imports;
            }
            let loc = self.loc();
            self.advance();
            match self.parse_qualified_name() {
                Ok(name) => imports.push(Import { name, loc }),
                Err(e) => {
                    errors.push(e);
                    self.recover();
                }
            }
        }
    }

    fn parse_qualified_name(&mut self) -> ParseResult<Vec<String>> {
        let mut segments = vec![self.expect(TokenType::Identifier, "a name")?.text];
        while self.peek_type() == TokenType::Dot {
            self.advance();
            segments.push(self.expect(TokenType::Identifier, "a name")?.text);
        }
        Ok(segments)
    }

    // --- Statements ---

    fn parse_statements(&mut self, nested: bool) -> Vec<DataStatement> {
        let mut statements = Vec::new();
        loop {
            self.skip_separators();
            match self.peek_type() {
                TokenType::Eof => break,
                TokenType::RBrace if nested => break,
                TokenType::RBrace => {
                    statements.push(DataStatement::Error(
                        self.error(E_UNEXPECTED_TOKEN, "unmatched '}'".to_string()),
                    ));
                    self.advance();
                    continue;
                }
                TokenType::Import => {
                    statements.push(DataStatement::Error(self.error(
                        E_MISPLACED_IMPORT,
                        "imports must precede all statements".to_string(),
                    )));
                    self.recover();
                    continue;
                }
                _ => {}
            }

            match self.parse_statement() {
                Ok(statement) => {
                    statements.push(statement);
                    let at_end = match self.peek_type() {
                        TokenType::Newline | TokenType::Semicolon | TokenType::Eof => true,
                        TokenType::RBrace => nested,
                        _ => false,
                    };
                    if !at_end {
                        statements.push(DataStatement::Error(self.unexpected("end of statement")));
                        self.recover();
                    }
                }
                Err(e) => {
                    statements.push(DataStatement::Error(e));
                    self.recover();
                }
            }
        }
        statements
    }

    fn parse_statement(&mut self) -> ParseResult<DataStatement> {
        let loc = self.loc();
        if self.peek_type() == TokenType::Val {
            self.advance();
            let name = self.expect(TokenType::Identifier, "a value name")?.text;
            self.expect(TokenType::Assign, "'='")?;
            let rhs = self.parse_expr()?;
            return Ok(DataStatement::LocalValue(LocalValue { name, rhs, loc }));
        }

        let expr = self.parse_expr()?;
        if self.peek_type() != TokenType::Assign {
            return Ok(DataStatement::Expr(expr));
        }
        let lhs = match expr.kind {
            ExprKind::PropertyAccess(access) => access,
            _ => {
                return Err(SyntaxError {
                    code: E_ASSIGNMENT_TARGET.to_string(),
                    message: "only properties can be assigned".to_string(),
                    loc: expr.loc,
                })
            }
        };
        self.advance();
        let rhs = self.parse_expr()?;
        Ok(DataStatement::Assignment(Assignment { lhs, rhs, loc }))
    }

    // --- Expressions ---

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;
        while self.peek_type() == TokenType::Dot {
            self.advance();
            let loc = self.loc();
            let name = self.expect(TokenType::Identifier, "a member name")?.text;
            expr = self.parse_member(Some(Box::new(expr)), name, loc)?;
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let loc = self.loc();
        let token = self.peek().clone();
        let kind = match token.token_type {
            TokenType::IntLiteral => {
                self.advance();
                let value = token.text.parse::<i32>().map_err(|_| SyntaxError {
                    code: E_LITERAL_RANGE.to_string(),
                    message: format!("integer literal {} is out of range", token.text),
                    loc: loc.clone(),
                })?;
                ExprKind::Literal(Literal::Int(value))
            }
            TokenType::LongLiteral => {
                self.advance();
                let value = token.text.parse::<i64>().map_err(|_| SyntaxError {
                    code: E_LITERAL_RANGE.to_string(),
                    message: format!("long literal {}L is out of range", token.text),
                    loc: loc.clone(),
                })?;
                ExprKind::Literal(Literal::Long(value))
            }
            TokenType::StringLiteral => {
                self.advance();
                ExprKind::Literal(Literal::String(token.text))
            }
            TokenType::True | TokenType::False => {
                self.advance();
                ExprKind::Literal(Literal::Boolean(token.token_type == TokenType::True))
            }
            TokenType::Null => {
                self.advance();
                ExprKind::Null
            }
            TokenType::This => {
                self.advance();
                ExprKind::This
            }
            TokenType::LParen => {
                self.advance();
                self.skip_newlines();
                let inner = self.parse_expr()?;
                self.skip_newlines();
                self.expect(TokenType::RParen, "')'")?;
                return Ok(inner);
            }
            TokenType::Identifier => {
                self.advance();
                return self.parse_member(None, token.text, loc);
            }
            _ => return Err(self.unexpected("an expression")),
        };
        Ok(Expr { kind, loc })
    }

    /// A name after an optional receiver: a property access, or a call when
    /// followed by arguments or a trailing block on the same line.
    fn parse_member(
        &mut self,
        receiver: Option<Box<Expr>>,
        name: String,
        loc: SourceLocation,
    ) -> ParseResult<Expr> {
        let expr_loc = receiver.as_ref().map(|r| r.loc.clone()).unwrap_or_else(|| loc.clone());
        let has_args = self.peek_type() == TokenType::LParen;
        if !has_args && self.peek_type() != TokenType::LBrace {
            return Ok(Expr {
                kind: ExprKind::PropertyAccess(PropertyAccess {
                    receiver,
                    name,
                    loc,
                }),
                loc: expr_loc,
            });
        }

        let mut args = if has_args {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        if self.peek_type() == TokenType::LBrace {
            args.push(FunctionArgument::Lambda(self.parse_lambda()?));
        }
        Ok(Expr {
            kind: ExprKind::FunctionCall(FunctionCall {
                receiver,
                name,
                args,
                loc,
            }),
            loc: expr_loc,
        })
    }

    fn parse_arguments(&mut self) -> ParseResult<Vec<FunctionArgument>> {
        self.expect(TokenType::LParen, "'('")?;
        let mut args = Vec::new();
        self.skip_newlines();
        if self.peek_type() == TokenType::RParen {
            self.advance();
            return Ok(args);
        }
        loop {
            self.skip_newlines();
            args.push(self.parse_argument()?);
            self.skip_newlines();
            match self.peek_type() {
                TokenType::Comma => {
                    self.advance();
                }
                TokenType::RParen => {
                    self.advance();
                    return Ok(args);
                }
                _ => return Err(self.unexpected("',' or ')'")),
            }
        }
    }

    fn parse_argument(&mut self) -> ParseResult<FunctionArgument> {
        let is_named = self.peek_type() == TokenType::Identifier
            && self
                .tokens
                .get(self.pos + 1)
                .is_some_and(|t| t.token_type == TokenType::Assign);
        if !is_named {
            return Ok(FunctionArgument::Positional(self.parse_expr()?));
        }
        let loc = self.loc();
        let name = self.advance().text;
        self.advance();
        self.skip_newlines();
        let expr = self.parse_expr()?;
        Ok(FunctionArgument::Named { name, expr, loc })
    }

    fn parse_lambda(&mut self) -> ParseResult<Block> {
        let loc = self.loc();
        self.expect(TokenType::LBrace, "'{'")?;
        let statements = self.parse_statements(true);
        if self.peek_type() != TokenType::RBrace {
            return Err(SyntaxError {
                code: E_UNCLOSED_BLOCK.to_string(),
                message: "block is never closed, expected '}'".to_string(),
                loc,
            });
        }
        self.advance();
        Ok(Block { statements, loc })
    }
}

fn describe(token: &Token) -> String {
    match token.token_type {
        TokenType::Eof => "end of input".to_string(),
        TokenType::Newline => "line break".to_string(),
        TokenType::StringLiteral => format!("string \"{}\"", token.text),
        TokenType::IntLiteral | TokenType::LongLiteral => format!("number {}", token.text),
        _ => format!("'{}'", token.text),
    }
}
