//! Rule: unresolved-node
//!
//! Reports every document node that does not resolve against the schema, one
//! diagnostic per failure reason.

use crate::{LintDiagnostic, LintRule, LintSeverity, LintTarget};

pub struct UnresolvedNodeRule;

impl LintRule for UnresolvedNodeRule {
    fn id(&self) -> &str {
        "unresolved-node"
    }

    fn description(&self) -> &str {
        "Document nodes should resolve against the schema"
    }

    fn default_severity(&self) -> LintSeverity {
        LintSeverity::Error
    }

    fn check(&self, target: &LintTarget) -> Vec<LintDiagnostic> {
        target
            .resolved
            .diagnostics()
            .into_iter()
            .map(|d| LintDiagnostic {
                rule: self.id().into(),
                severity: self.default_severity(),
                file: d.file,
                line: d.line,
                col: d.col,
                message: format!("{} ({})", d.message, d.code),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::schema;

    fn check(input: &str) -> Vec<LintDiagnostic> {
        UnresolvedNodeRule.check(&LintTarget::from_source(&schema(), input, "test.dcl"))
    }

    #[test]
    fn reports_each_reason() {
        let results = check("missing = 1\njava {\n  name = \"x\"\n}");
        assert_eq!(results.len(), 2);
        assert!(results[0].message.contains("DCL-D002"));
        assert!(results[1].message.contains("DCL-D003"));
        assert_eq!(results[1].line, 3);
    }

    #[test]
    fn error_nodes_are_reported() {
        let results = check("val a = 1");
        assert_eq!(results.len(), 1);
        assert!(results[0].message.contains("DCL-D012"));
    }

    #[test]
    fn resolved_document_is_clean() {
        assert!(check("name = \"x\"\nlibrary(\"core\")").is_empty());
    }
}
