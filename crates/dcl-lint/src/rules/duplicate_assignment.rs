//! Rule: duplicate-assignment
//!
//! Warns when the same property is assigned more than once in one block; only
//! the last value survives.

use std::collections::HashMap;

use dcl_core::dom::{DocumentNode, PropertyNode};

use crate::{LintDiagnostic, LintRule, LintSeverity, LintTarget};

pub struct DuplicateAssignmentRule;

impl LintRule for DuplicateAssignmentRule {
    fn id(&self) -> &str {
        "duplicate-assignment"
    }

    fn description(&self) -> &str {
        "A property should be assigned at most once per block"
    }

    fn default_severity(&self) -> LintSeverity {
        LintSeverity::Warning
    }

    fn check(&self, target: &LintTarget) -> Vec<LintDiagnostic> {
        let mut diagnostics = Vec::new();
        check_block(&target.document.content, self, &mut diagnostics);
        diagnostics
    }
}

fn check_block(
    nodes: &[DocumentNode],
    rule: &DuplicateAssignmentRule,
    diagnostics: &mut Vec<LintDiagnostic>,
) {
    let mut first: HashMap<&str, &PropertyNode> = HashMap::new();
    for node in nodes {
        match node {
            DocumentNode::Property(property) => {
                if let Some(previous) = first.get(property.name.as_str()) {
                    diagnostics.push(LintDiagnostic {
                        rule: rule.id().into(),
                        severity: rule.default_severity(),
                        file: property.loc.file.clone(),
                        line: property.loc.line,
                        col: property.loc.col,
                        message: format!(
                            "\"{}\" is already assigned on line {}",
                            property.name, previous.loc.line
                        ),
                    });
                } else {
                    first.insert(&property.name, property);
                }
            }
            DocumentNode::Element(element) => check_block(&element.content, rule, diagnostics),
            DocumentNode::Error(_) => {}
        }
    }
}
