use serde::{Deserialize, Serialize};

use crate::schema::DataType;
use crate::types::{Diagnostic, SourceLocation};

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Literal {
    Int(i32),
    Long(i64),
    String(String),
    Boolean(bool),
}

impl Literal {
    pub fn data_type(&self) -> DataType {
        match self {
            Literal::Int(_) => DataType::Int,
            Literal::Long(_) => DataType::Long,
            Literal::String(_) => DataType::String,
            Literal::Boolean(_) => DataType::Boolean,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Literal(Literal),
    Null,
    This,
    PropertyAccess(PropertyAccess),
    FunctionCall(FunctionCall),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyAccess {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<Box<Expr>>,
    pub name: String,
    pub loc: SourceLocation,
}

impl PropertyAccess {
    /// Dotted segments when the access is a plain name chain like `a.b.c`.
    pub fn name_chain(&self) -> Option<Vec<String>> {
        let mut segments = match &self.receiver {
            None => Vec::new(),
            Some(receiver) => match &receiver.kind {
                ExprKind::PropertyAccess(inner) => inner.name_chain()?,
                _ => return None,
            },
        };
        segments.push(self.name.clone());
        Some(segments)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<Box<Expr>>,
    pub name: String,
    pub args: Vec<FunctionArgument>,
    pub loc: SourceLocation,
}

impl FunctionCall {
    pub fn value_args(&self) -> impl Iterator<Item = &FunctionArgument> {
        self.args
            .iter()
            .filter(|a| !matches!(a, FunctionArgument::Lambda(_)))
    }

    pub fn lambda(&self) -> Option<&Block> {
        self.args.iter().find_map(|a| match a {
            FunctionArgument::Lambda(block) => Some(block),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FunctionArgument {
    Positional(Expr),
    Named {
        name: String,
        expr: Expr,
        loc: SourceLocation,
    },
    Lambda(Block),
}

impl FunctionArgument {
    pub fn loc(&self) -> &SourceLocation {
        match self {
            FunctionArgument::Positional(expr) => &expr.loc,
            FunctionArgument::Named { loc, .. } => loc,
            FunctionArgument::Lambda(block) => &block.loc,
        }
    }
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<DataStatement>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub lhs: PropertyAccess,
    pub rhs: Expr,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalValue {
    pub name: String,
    pub rhs: Expr,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxError {
    pub code: String,
    pub message: String,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataStatement {
    Assignment(Assignment),
    LocalValue(LocalValue),
    Expr(Expr),
    /// A statement that failed to parse. Analysis skips it.
    Error(SyntaxError),
}

impl DataStatement {
    pub fn loc(&self) -> &SourceLocation {
        match self {
            DataStatement::Assignment(a) => &a.loc,
            DataStatement::LocalValue(v) => &v.loc,
            DataStatement::Expr(e) => &e.loc,
            DataStatement::Error(e) => &e.loc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Import {
    pub name: Vec<String>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageTree {
    pub imports: Vec<Import>,
    #[serde(rename = "topLevelBlock")]
    pub top_level_block: Block,
}

impl LanguageTree {
    pub fn syntax_errors(&self) -> Vec<&SyntaxError> {
        let mut out = Vec::new();
        collect_syntax_errors(&self.top_level_block, &mut out);
        out
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.syntax_errors()
            .into_iter()
            .map(|e| Diagnostic::error(&e.code, &e.loc, e.message.clone()))
            .collect()
    }
}

fn collect_syntax_errors<'a>(block: &'a Block, out: &mut Vec<&'a SyntaxError>) {
    for statement in &block.statements {
        match statement {
            DataStatement::Error(e) => out.push(e),
            DataStatement::Assignment(a) => collect_in_expr(&a.rhs, out),
            DataStatement::LocalValue(v) => collect_in_expr(&v.rhs, out),
            DataStatement::Expr(e) => collect_in_expr(e, out),
        }
    }
}

fn collect_in_expr<'a>(expr: &'a Expr, out: &mut Vec<&'a SyntaxError>) {
    match &expr.kind {
        ExprKind::FunctionCall(call) => {
            if let Some(receiver) = &call.receiver {
                collect_in_expr(receiver, out);
            }
            for arg in &call.args {
                match arg {
                    FunctionArgument::Positional(e) | FunctionArgument::Named { expr: e, .. } => {
                        collect_in_expr(e, out)
                    }
                    FunctionArgument::Lambda(block) => collect_syntax_errors(block, out),
                }
            }
        }
        ExprKind::PropertyAccess(access) => {
            if let Some(receiver) = &access.receiver {
                collect_in_expr(receiver, out);
            }
        }
        ExprKind::Literal(_) | ExprKind::Null | ExprKind::This => {}
    }
}

/// The language tree element a resolution error is attached to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LanguageTreeElement {
    Import(Import),
    Statement(DataStatement),
    Expr(Expr),
    FunctionArgument(FunctionArgument),
}

impl LanguageTreeElement {
    pub fn loc(&self) -> &SourceLocation {
        match self {
            LanguageTreeElement::Import(i) => &i.loc,
            LanguageTreeElement::Statement(s) => s.loc(),
            LanguageTreeElement::Expr(e) => &e.loc,
            LanguageTreeElement::FunctionArgument(a) => a.loc(),
        }
    }
}
