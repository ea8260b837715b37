//! Rule: empty-block
//!
//! Warns about configuring elements that neither take arguments nor
//! configure anything.

use dcl_core::document_resolution::{DocumentResolution, ElementResolution, ResolvedNode};

use crate::{LintDiagnostic, LintRule, LintSeverity, LintTarget};

pub struct EmptyBlockRule;

impl LintRule for EmptyBlockRule {
    fn id(&self) -> &str {
        "empty-block"
    }

    fn description(&self) -> &str {
        "Configuring blocks should not be empty"
    }

    fn default_severity(&self) -> LintSeverity {
        LintSeverity::Warning
    }

    fn check(&self, target: &LintTarget) -> Vec<LintDiagnostic> {
        target
            .resolved
            .flatten()
            .into_iter()
            .filter(|node| is_empty_configuring_element(node))
            .map(|node| LintDiagnostic {
                rule: self.id().into(),
                severity: self.default_severity(),
                file: node.loc.file.clone(),
                line: node.loc.line,
                col: node.loc.col,
                message: "Configuring block has no content".into(),
            })
            .collect()
    }
}

fn is_empty_configuring_element(node: &ResolvedNode) -> bool {
    matches!(
        node.resolution,
        DocumentResolution::Element(ElementResolution::PropertyConfiguringElementResolved { .. })
            | DocumentResolution::Element(ElementResolution::ContainerElementResolved { .. })
    ) && node.values.is_empty()
        && node.content.is_empty()
}
