//! Structural document model: properties, elements and values, without the
//! expression-level detail of the language tree. Tooling works on this view.

use serde::{Deserialize, Serialize};

use crate::language::*;
use crate::schema::FqName;
use crate::types::SourceLocation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclarativeDocument {
    pub imports: Vec<FqName>,
    pub content: Vec<DocumentNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DocumentNode {
    Property(PropertyNode),
    Element(ElementNode),
    Error(ErrorNode),
}

impl DocumentNode {
    pub fn loc(&self) -> &SourceLocation {
        match self {
            DocumentNode::Property(p) => &p.loc,
            DocumentNode::Element(e) => &e.loc,
            DocumentNode::Error(e) => &e.loc,
        }
    }
}

/// `name = value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyNode {
    pub name: String,
    pub value: ValueNode,
    pub loc: SourceLocation,
}

/// `name(values) { content }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub name: String,
    #[serde(rename = "elementValues")]
    pub element_values: Vec<ValueNode>,
    pub content: Vec<DocumentNode>,
    /// Whether the call was written with a block, even an empty one.
    #[serde(default, rename = "hasBlock")]
    pub has_block: bool,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorNode {
    pub errors: Vec<DocumentError>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValueNode {
    Literal {
        value: Literal,
        loc: SourceLocation,
    },
    ValueFactory {
        #[serde(rename = "factoryName")]
        factory_name: String,
        values: Vec<ValueNode>,
        loc: SourceLocation,
    },
}

impl ValueNode {
    pub fn loc(&self) -> &SourceLocation {
        match self {
            ValueNode::Literal { loc, .. } | ValueNode::ValueFactory { loc, .. } => loc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentError {
    SyntaxError { message: String },
    UnsupportedSyntax { cause: UnsupportedSyntaxCause },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnsupportedSyntaxCause {
    LocalValue,
    QualifiedAssignment,
    DanglingExpression,
    QualifiedFunctionCall,
    NamedArgument,
    NullValue,
    ThisReference,
    PropertyReferenceValue,
    ValueFactoryWithBlock,
}

impl std::fmt::Display for DocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentError::SyntaxError { message } => write!(f, "syntax error: {}", message),
            DocumentError::UnsupportedSyntax { cause } => {
                let what = match cause {
                    UnsupportedSyntaxCause::LocalValue => "local values",
                    UnsupportedSyntaxCause::QualifiedAssignment => "assignments to qualified properties",
                    UnsupportedSyntaxCause::DanglingExpression => "standalone expressions",
                    UnsupportedSyntaxCause::QualifiedFunctionCall => "calls with an explicit receiver",
                    UnsupportedSyntaxCause::NamedArgument => "named arguments",
                    UnsupportedSyntaxCause::NullValue => "null values",
                    UnsupportedSyntaxCause::ThisReference => "'this' references",
                    UnsupportedSyntaxCause::PropertyReferenceValue => "property references as values",
                    UnsupportedSyntaxCause::ValueFactoryWithBlock => "value factories with a block",
                };
                write!(f, "{} are not supported in documents", what)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Conversion from the language tree
// ---------------------------------------------------------------------------

/// Build the structural document for a parsed language tree.
pub fn convert_language_tree(tree: &LanguageTree) -> DeclarativeDocument {
    DeclarativeDocument {
        imports: tree
            .imports
            .iter()
            .filter_map(|i| FqName::from_segments(&i.name))
            .collect(),
        content: convert_block(&tree.top_level_block),
    }
}

fn convert_block(block: &Block) -> Vec<DocumentNode> {
    block.statements.iter().map(convert_statement).collect()
}

fn error_node(errors: Vec<DocumentError>, loc: &SourceLocation) -> DocumentNode {
    DocumentNode::Error(ErrorNode {
        errors,
        loc: loc.clone(),
    })
}

fn unsupported(cause: UnsupportedSyntaxCause) -> DocumentError {
    DocumentError::UnsupportedSyntax { cause }
}

fn convert_statement(statement: &DataStatement) -> DocumentNode {
    match statement {
        DataStatement::Error(e) => error_node(
            vec![DocumentError::SyntaxError {
                message: e.message.clone(),
            }],
            &e.loc,
        ),
        DataStatement::LocalValue(v) => {
            error_node(vec![unsupported(UnsupportedSyntaxCause::LocalValue)], &v.loc)
        }
        DataStatement::Assignment(a) if a.lhs.receiver.is_some() => error_node(
            vec![unsupported(UnsupportedSyntaxCause::QualifiedAssignment)],
            &a.loc,
        ),
        DataStatement::Assignment(a) => match convert_value(&a.rhs) {
            Ok(value) => DocumentNode::Property(PropertyNode {
                name: a.lhs.name.clone(),
                value,
                loc: a.loc.clone(),
            }),
            Err(errors) => error_node(errors, &a.loc),
        },
        DataStatement::Expr(expr) => match &expr.kind {
            ExprKind::FunctionCall(call) if call.receiver.is_none() => convert_element(call),
            ExprKind::FunctionCall(_) => error_node(
                vec![unsupported(UnsupportedSyntaxCause::QualifiedFunctionCall)],
                &expr.loc,
            ),
            _ => error_node(
                vec![unsupported(UnsupportedSyntaxCause::DanglingExpression)],
                &expr.loc,
            ),
        },
    }
}

fn convert_element(call: &FunctionCall) -> DocumentNode {
    let mut errors = Vec::new();
    let mut element_values = Vec::new();
    for arg in &call.args {
        match arg {
            FunctionArgument::Positional(expr) => match convert_value(expr) {
                Ok(value) => element_values.push(value),
                Err(mut e) => errors.append(&mut e),
            },
            FunctionArgument::Named { .. } => {
                errors.push(unsupported(UnsupportedSyntaxCause::NamedArgument))
            }
            FunctionArgument::Lambda(_) => {}
        }
    }
    if !errors.is_empty() {
        return error_node(errors, &call.loc);
    }
    DocumentNode::Element(ElementNode {
        name: call.name.clone(),
        element_values,
        content: call.lambda().map(convert_block).unwrap_or_default(),
        has_block: call.lambda().is_some(),
        loc: call.loc.clone(),
    })
}

fn convert_value(expr: &Expr) -> Result<ValueNode, Vec<DocumentError>> {
    let cause = match &expr.kind {
        ExprKind::Literal(literal) => {
            return Ok(ValueNode::Literal {
                value: literal.clone(),
                loc: expr.loc.clone(),
            })
        }
        ExprKind::FunctionCall(call) if call.receiver.is_some() => {
            UnsupportedSyntaxCause::QualifiedFunctionCall
        }
        ExprKind::FunctionCall(call) if call.lambda().is_some() => {
            UnsupportedSyntaxCause::ValueFactoryWithBlock
        }
        ExprKind::FunctionCall(call) => return convert_value_factory(call),
        ExprKind::Null => UnsupportedSyntaxCause::NullValue,
        ExprKind::This => UnsupportedSyntaxCause::ThisReference,
        ExprKind::PropertyAccess(_) => UnsupportedSyntaxCause::PropertyReferenceValue,
    };
    Err(vec![unsupported(cause)])
}

fn convert_value_factory(call: &FunctionCall) -> Result<ValueNode, Vec<DocumentError>> {
    let mut errors = Vec::new();
    let mut values = Vec::new();
    for arg in call.value_args() {
        match arg {
            FunctionArgument::Positional(expr) => match convert_value(expr) {
                Ok(value) => values.push(value),
                Err(mut e) => errors.append(&mut e),
            },
            _ => errors.push(unsupported(UnsupportedSyntaxCause::NamedArgument)),
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(ValueNode::ValueFactory {
        factory_name: call.name.clone(),
        values,
        loc: call.loc.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_string;
    use pretty_assertions::assert_eq;

    fn document(src: &str) -> DeclarativeDocument {
        convert_language_tree(&parse_string(src, "doc.dcl"))
    }

    #[test]
    fn converts_properties_and_elements() {
        let doc = document("import a.b.C\nname = \"x\"\nitem(\"k\") {\n  value = size(1, 2)\n}");
        assert_eq!(doc.imports, vec![FqName::parse("a.b.C")]);
        assert_eq!(doc.content.len(), 2);
        let DocumentNode::Element(element) = &doc.content[1] else {
            panic!("expected element");
        };
        assert_eq!(element.name, "item");
        assert_eq!(element.element_values.len(), 1);
        let DocumentNode::Property(property) = &element.content[0] else {
            panic!("expected property");
        };
        match &property.value {
            ValueNode::ValueFactory {
                factory_name,
                values,
                ..
            } => {
                assert_eq!(factory_name, "size");
                assert_eq!(values.len(), 2);
            }
            other => panic!("expected value factory, got {:?}", other),
        }
    }

    #[test]
    fn unsupported_constructs_become_error_nodes() {
        let doc = document("val a = 1\nx.y = 2\nname\nz = other\nw = null\nf(n = 1)");
        let causes: Vec<DocumentError> = doc
            .content
            .iter()
            .flat_map(|n| match n {
                DocumentNode::Error(e) => e.errors.clone(),
                _ => Vec::new(),
            })
            .collect();
        assert_eq!(
            causes,
            vec![
                unsupported(UnsupportedSyntaxCause::LocalValue),
                unsupported(UnsupportedSyntaxCause::QualifiedAssignment),
                unsupported(UnsupportedSyntaxCause::DanglingExpression),
                unsupported(UnsupportedSyntaxCause::PropertyReferenceValue),
                unsupported(UnsupportedSyntaxCause::NullValue),
                unsupported(UnsupportedSyntaxCause::NamedArgument),
            ]
        );
    }

    #[test]
    fn syntax_errors_are_kept() {
        let doc = document("x = \ny = 1");
        assert!(matches!(
            &doc.content[0],
            DocumentNode::Error(ErrorNode { errors, .. })
                if matches!(errors[0], DocumentError::SyntaxError { .. })
        ));
        assert!(matches!(doc.content[1], DocumentNode::Property(_)));
    }
}
