pub mod catalogs;
pub mod document_resolution;
pub mod dom;
pub mod evaluation;
pub mod extensions;
pub mod language;
pub mod lexer;
pub mod mapping;
pub mod parser;
pub mod resolution;
pub mod resolver;
pub mod schema;
pub mod schema_builder;
pub mod types;

pub use catalogs::{PARSER_VERSION, SCHEMA_FORMAT_VERSION};
pub use document_resolution::{resolve_document, ResolvedDocument};
pub use dom::{convert_language_tree, DeclarativeDocument};
pub use evaluation::{build_evaluation_schema, EvaluationSchema, EvaluationSchemaComponent};
pub use language::LanguageTree;
pub use lexer::lex;
pub use mapping::{MappingError, RuntimeMapper};
pub use parser::parse_string;
pub use resolution::ResolutionResult;
pub use resolver::resolve;
pub use schema::AnalysisSchema;
pub use schema_builder::{schema_from_types, SchemaBuildError};
pub use types::*;

/// Parse and resolve `content` against `schema`.
///
/// Syntax errors are returned alongside the resolution; resolution still runs
/// over whatever parsed.
pub fn resolve_source(
    schema: &AnalysisSchema,
    content: &str,
    file: &str,
) -> (LanguageTree, ResolutionResult) {
    let tree = parse_string(content, file);
    let result = resolve(schema, &tree);
    (tree, result)
}

/// Parse `content`, convert it to a document and resolve it against `schema`.
pub fn resolve_document_source(
    schema: &AnalysisSchema,
    content: &str,
    file: &str,
) -> (DeclarativeDocument, ResolvedDocument) {
    let document = convert_language_tree(&parse_string(content, file));
    let resolved = resolve_document(schema, &document);
    (document, resolved)
}

/// Every diagnostic for `content`: syntax errors first, then resolution errors.
pub fn check_source(schema: &AnalysisSchema, content: &str, file: &str) -> Vec<Diagnostic> {
    let (tree, result) = resolve_source(schema, content, file);
    let mut diagnostics = tree.diagnostics();
    diagnostics.extend(result.diagnostics());
    diagnostics
}
