use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dom::*;
use crate::language::Literal;
use crate::schema::*;
use crate::types::{Diagnostic, DiagnosticSeverity, SourceLocation};

// ---------------------------------------------------------------------------
// Resolution model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DocumentResolution {
    Property(PropertyResolution),
    Element(ElementResolution),
    Value(ValueResolution),
    /// The node is an error node; it resolves to nothing.
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyResolution {
    PropertyAssignmentResolved {
        #[serde(rename = "receiverType")]
        receiver_type: DataType,
        property: DataProperty,
    },
    PropertyNotAssigned {
        reasons: Vec<PropertyNotAssignedReason>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementResolution {
    PropertyConfiguringElementResolved {
        #[serde(rename = "elementType")]
        element_type: DataType,
    },
    ContainerElementResolved {
        #[serde(rename = "elementType")]
        element_type: DataType,
        #[serde(rename = "elementFactoryFunction")]
        element_factory_function: SchemaMemberFunction,
        #[serde(rename = "isKeyArguments")]
        is_key_arguments: bool,
    },
    ElementNotResolved {
        reasons: Vec<ElementNotResolvedReason>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueResolution {
    LiteralValueResolved { value: Literal },
    ValueFactoryResolved { function: SchemaFunction },
    ValueFactoryNotResolved { reasons: Vec<ValueFactoryNotResolvedReason> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyNotAssignedReason {
    UnresolvedBase,
    UnresolvedName,
    CrossScopeAccess,
    NotAssignable,
    UnresolvedValueUsed,
    ValueTypeMismatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementNotResolvedReason {
    UnresolvedBase,
    UnresolvedName,
    CrossScopeAccess,
    NotAConfiguringFunction,
    UnresolvedSignature,
    AmbiguousName { candidates: Vec<SchemaFunction> },
    BlockMismatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueFactoryNotResolvedReason {
    UnresolvedName,
    UnresolvedSignature,
    AmbiguousName { candidates: Vec<SchemaFunction> },
    UnresolvedArguments,
}

/// Any failure reason of an unsuccessful document resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResolutionFailureReason {
    Property(PropertyNotAssignedReason),
    Element(ElementNotResolvedReason),
    ValueFactory(ValueFactoryNotResolvedReason),
    IsError,
}

impl ResolutionFailureReason {
    pub fn code(&self) -> &'static str {
        use ElementNotResolvedReason as E;
        use PropertyNotAssignedReason as P;
        use ValueFactoryNotResolvedReason as V;
        match self {
            Self::Property(P::UnresolvedBase) | Self::Element(E::UnresolvedBase) => "DCL-D001",
            Self::Property(P::UnresolvedName)
            | Self::Element(E::UnresolvedName)
            | Self::ValueFactory(V::UnresolvedName) => "DCL-D002",
            Self::Property(P::CrossScopeAccess) | Self::Element(E::CrossScopeAccess) => "DCL-D003",
            Self::Property(P::NotAssignable) => "DCL-D004",
            Self::Property(P::UnresolvedValueUsed) => "DCL-D005",
            Self::Property(P::ValueTypeMismatch) => "DCL-D006",
            Self::Element(E::NotAConfiguringFunction) => "DCL-D007",
            Self::Element(E::UnresolvedSignature) | Self::ValueFactory(V::UnresolvedSignature) => {
                "DCL-D008"
            }
            Self::Element(E::AmbiguousName { .. }) | Self::ValueFactory(V::AmbiguousName { .. }) => {
                "DCL-D009"
            }
            Self::Element(E::BlockMismatch) => "DCL-D010",
            Self::ValueFactory(V::UnresolvedArguments) => "DCL-D011",
            Self::IsError => "DCL-D012",
        }
    }

    pub fn message(&self) -> String {
        use ElementNotResolvedReason as E;
        use PropertyNotAssignedReason as P;
        use ValueFactoryNotResolvedReason as V;
        match self {
            Self::Property(P::UnresolvedBase) | Self::Element(E::UnresolvedBase) => {
                "enclosing element is not resolved".to_string()
            }
            Self::Property(P::UnresolvedName) => "no such property".to_string(),
            Self::Element(E::UnresolvedName) => "no such configuring function".to_string(),
            Self::ValueFactory(V::UnresolvedName) => "no such value factory".to_string(),
            Self::Property(P::CrossScopeAccess) | Self::Element(E::CrossScopeAccess) => {
                "member of an outer scope is not accessible here".to_string()
            }
            Self::Property(P::NotAssignable) => "property is read-only".to_string(),
            Self::Property(P::UnresolvedValueUsed) => "assigned value is not resolved".to_string(),
            Self::Property(P::ValueTypeMismatch) => {
                "value type does not match the property type".to_string()
            }
            Self::Element(E::NotAConfiguringFunction) => {
                "function does not configure an element".to_string()
            }
            Self::Element(E::UnresolvedSignature) | Self::ValueFactory(V::UnresolvedSignature) => {
                "no overload matches the given values".to_string()
            }
            Self::Element(E::AmbiguousName { candidates })
            | Self::ValueFactory(V::AmbiguousName { candidates }) => format!(
                "ambiguous name, {} candidates match",
                candidates.len()
            ),
            Self::Element(E::BlockMismatch) => "element does not accept a block".to_string(),
            Self::ValueFactory(V::UnresolvedArguments) => {
                "value factory arguments are not resolved".to_string()
            }
            Self::IsError => "node is an error".to_string(),
        }
    }
}

impl DocumentResolution {
    pub fn is_successful(&self) -> bool {
        self.reasons().is_empty()
    }

    pub fn reasons(&self) -> Vec<ResolutionFailureReason> {
        match self {
            DocumentResolution::Property(PropertyResolution::PropertyNotAssigned { reasons }) => {
                reasons
                    .iter()
                    .cloned()
                    .map(ResolutionFailureReason::Property)
                    .collect()
            }
            DocumentResolution::Element(ElementResolution::ElementNotResolved { reasons }) => {
                reasons
                    .iter()
                    .cloned()
                    .map(ResolutionFailureReason::Element)
                    .collect()
            }
            DocumentResolution::Value(ValueResolution::ValueFactoryNotResolved { reasons }) => {
                reasons
                    .iter()
                    .cloned()
                    .map(ResolutionFailureReason::ValueFactory)
                    .collect()
            }
            DocumentResolution::Error => vec![ResolutionFailureReason::IsError],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedNode {
    pub resolution: DocumentResolution,
    pub loc: SourceLocation,
    /// Resolved value nodes: a property's value, an element's arguments or a
    /// value factory's arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<ResolvedNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<ResolvedNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDocument {
    pub content: Vec<ResolvedNode>,
}

impl ResolvedDocument {
    /// Every resolved node in document order, values before content.
    pub fn flatten(&self) -> Vec<&ResolvedNode> {
        fn walk<'a>(node: &'a ResolvedNode, out: &mut Vec<&'a ResolvedNode>) {
            out.push(node);
            for value in &node.values {
                walk(value, out);
            }
            for child in &node.content {
                walk(child, out);
            }
        }
        let mut out = Vec::new();
        for node in &self.content {
            walk(node, &mut out);
        }
        out
    }

    pub fn is_successful(&self) -> bool {
        self.flatten().iter().all(|n| n.resolution.is_successful())
    }

    /// One diagnostic per failure reason.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.flatten()
            .into_iter()
            .flat_map(|node| {
                node.resolution.reasons().into_iter().map(move |reason| Diagnostic {
                    code: reason.code().to_string(),
                    severity: DiagnosticSeverity::Error,
                    file: node.loc.file.clone(),
                    line: node.loc.line,
                    col: node.loc.col,
                    message: reason.message(),
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve every node of `document` against `schema`.
pub fn resolve_document(schema: &AnalysisSchema, document: &DeclarativeDocument) -> ResolvedDocument {
    let mut imports: HashMap<String, FqName> = HashMap::new();
    for fq_name in schema.default_imports.iter().chain(document.imports.iter()) {
        imports.insert(fq_name.simple_name.clone(), fq_name.clone());
    }
    let resolver = DocumentResolver { schema, imports };
    let mut scopes = vec![schema.top_level_receiver()];
    let content = resolver.resolve_nodes(&document.content, &mut scopes);
    let resolved = ResolvedDocument { content };
    log::debug!(
        "resolved document: {} nodes, successful: {}",
        resolved.flatten().len(),
        resolved.is_successful()
    );
    resolved
}

struct DocumentResolver<'s> {
    schema: &'s AnalysisSchema,
    imports: HashMap<String, FqName>,
}

/// Scope stack; `None` marks a scope whose receiver could not be resolved.
type Scopes<'s> = Vec<Option<&'s DataClass>>;

impl<'s> DocumentResolver<'s> {
    fn resolve_nodes(&self, nodes: &[DocumentNode], scopes: &mut Scopes<'s>) -> Vec<ResolvedNode> {
        nodes.iter().map(|n| self.resolve_node(n, scopes)).collect()
    }

    fn resolve_node(&self, node: &DocumentNode, scopes: &mut Scopes<'s>) -> ResolvedNode {
        match node {
            DocumentNode::Property(property) => self.resolve_property(property, scopes),
            DocumentNode::Element(element) => self.resolve_element(element, scopes),
            DocumentNode::Error(error) => ResolvedNode {
                resolution: DocumentResolution::Error,
                loc: error.loc.clone(),
                values: Vec::new(),
                content: Vec::new(),
            },
        }
    }

    fn current(&self, scopes: &Scopes<'s>) -> Option<&'s DataClass> {
        scopes.last().copied().flatten()
    }

    fn in_outer_scope(&self, scopes: &Scopes<'s>, has_member: impl Fn(&DataClass) -> bool) -> bool {
        scopes
            .iter()
            .rev()
            .skip(1)
            .flatten()
            .any(|class| has_member(class))
    }

    fn resolve_property(&self, node: &PropertyNode, scopes: &mut Scopes<'s>) -> ResolvedNode {
        let value = self.resolve_value(&node.value, scopes);
        let mut reasons = Vec::new();

        let resolution = match self.current(scopes) {
            None => {
                reasons.push(PropertyNotAssignedReason::UnresolvedBase);
                None
            }
            Some(class) => match class.property(&node.name) {
                Some(property) => Some((class, property)),
                None => {
                    if self.in_outer_scope(scopes, |c| c.property(&node.name).is_some()) {
                        reasons.push(PropertyNotAssignedReason::CrossScopeAccess);
                    } else {
                        reasons.push(PropertyNotAssignedReason::UnresolvedName);
                    }
                    None
                }
            },
        };

        if let Some((_, property)) = resolution {
            if !property.is_writable() {
                reasons.push(PropertyNotAssignedReason::NotAssignable);
            }
        }
        if !value.resolution.is_successful() {
            reasons.push(PropertyNotAssignedReason::UnresolvedValueUsed);
        } else if let (Some((_, property)), Some(value_type)) =
            (resolution, value_type(&value.resolution))
        {
            if !self.schema.is_assignable(&property.value_type, &value_type) {
                reasons.push(PropertyNotAssignedReason::ValueTypeMismatch);
            }
        }

        let resolution = match resolution {
            Some((class, property)) if reasons.is_empty() => {
                PropertyResolution::PropertyAssignmentResolved {
                    receiver_type: class.data_type(),
                    property: property.clone(),
                }
            }
            _ => PropertyResolution::PropertyNotAssigned { reasons },
        };
        ResolvedNode {
            resolution: DocumentResolution::Property(resolution),
            loc: node.loc.clone(),
            values: vec![value],
            content: Vec::new(),
        }
    }

    fn resolve_element(&self, node: &ElementNode, scopes: &mut Scopes<'s>) -> ResolvedNode {
        let values: Vec<ResolvedNode> = node
            .element_values
            .iter()
            .map(|v| self.resolve_value(v, scopes))
            .collect();
        let resolution = self.resolve_element_function(node, &values, scopes);

        let element_type = match &resolution {
            ElementResolution::PropertyConfiguringElementResolved { element_type }
            | ElementResolution::ContainerElementResolved { element_type, .. } => {
                Some(element_type.clone())
            }
            ElementResolution::ElementNotResolved { .. } => None,
        };
        scopes.push(element_type.and_then(|t| self.schema.class_of(&t)));
        let content = self.resolve_nodes(&node.content, scopes);
        scopes.pop();

        ResolvedNode {
            resolution: DocumentResolution::Element(resolution),
            loc: node.loc.clone(),
            values,
            content,
        }
    }

    fn resolve_element_function(
        &self,
        node: &ElementNode,
        values: &[ResolvedNode],
        scopes: &Scopes<'s>,
    ) -> ElementResolution {
        let not_resolved = |reason| ElementResolution::ElementNotResolved {
            reasons: vec![reason],
        };

        let Some(class) = self.current(scopes) else {
            return not_resolved(ElementNotResolvedReason::UnresolvedBase);
        };
        let named: Vec<&SchemaMemberFunction> = class.functions_named(&node.name).collect();
        if named.is_empty() {
            let in_outer = self.in_outer_scope(scopes, |c| c.functions_named(&node.name).next().is_some());
            return not_resolved(if in_outer {
                ElementNotResolvedReason::CrossScopeAccess
            } else {
                ElementNotResolvedReason::UnresolvedName
            });
        }

        let configuring: Vec<&SchemaMemberFunction> = named
            .into_iter()
            .filter(|f| f.semantics().is_configuring())
            .collect();
        if configuring.is_empty() {
            return not_resolved(ElementNotResolvedReason::NotAConfiguringFunction);
        }

        let by_signature: Vec<&SchemaMemberFunction> = configuring
            .into_iter()
            .filter(|f| self.signature_matches(f.parameters(), values))
            .collect();
        if by_signature.is_empty() {
            return not_resolved(ElementNotResolvedReason::UnresolvedSignature);
        }

        let has_block = node.has_block || !node.content.is_empty();
        let matching: Vec<&SchemaMemberFunction> = by_signature
            .into_iter()
            .filter(|f| {
                let requirement = f.semantics().configure_block_requirement();
                if has_block {
                    requirement.allows()
                } else {
                    !requirement.requires()
                }
            })
            .collect();
        match matching.as_slice() {
            [] => not_resolved(ElementNotResolvedReason::BlockMismatch),
            [function] => match function.semantics().into_owned() {
                FunctionSemantics::AccessAndConfigure { accessor, .. } => {
                    ElementResolution::PropertyConfiguringElementResolved {
                        element_type: accessor.object_type().clone(),
                    }
                }
                FunctionSemantics::AddAndConfigure { object_type, .. } => {
                    ElementResolution::ContainerElementResolved {
                        element_type: object_type,
                        element_factory_function: (*function).clone(),
                        is_key_arguments: function
                            .parameters()
                            .iter()
                            .any(|p| p.semantics == ParameterSemantics::IdentityKey),
                    }
                }
                FunctionSemantics::Pure { .. } | FunctionSemantics::Builder { .. } => {
                    not_resolved(ElementNotResolvedReason::NotAConfiguringFunction)
                }
            },
            several => not_resolved(ElementNotResolvedReason::AmbiguousName {
                candidates: several
                    .iter()
                    .map(|f| SchemaFunction::Member((*f).clone()))
                    .collect(),
            }),
        }
    }

    fn resolve_value(&self, value: &ValueNode, scopes: &Scopes<'s>) -> ResolvedNode {
        match value {
            ValueNode::Literal { value, loc } => ResolvedNode {
                resolution: DocumentResolution::Value(ValueResolution::LiteralValueResolved {
                    value: value.clone(),
                }),
                loc: loc.clone(),
                values: Vec::new(),
                content: Vec::new(),
            },
            ValueNode::ValueFactory {
                factory_name,
                values,
                loc,
            } => {
                let args: Vec<ResolvedNode> =
                    values.iter().map(|v| self.resolve_value(v, scopes)).collect();
                let resolution = self.resolve_value_factory(factory_name, &args, scopes);
                ResolvedNode {
                    resolution: DocumentResolution::Value(resolution),
                    loc: loc.clone(),
                    values: args,
                    content: Vec::new(),
                }
            }
        }
    }

    fn resolve_value_factory(
        &self,
        name: &str,
        args: &[ResolvedNode],
        scopes: &Scopes<'s>,
    ) -> ValueResolution {
        let not_resolved = |reason| ValueResolution::ValueFactoryNotResolved {
            reasons: vec![reason],
        };

        let mut candidates: Vec<SchemaFunction> = Vec::new();
        if let Some(class) = self.current(scopes) {
            candidates.extend(
                class
                    .functions_named(name)
                    .filter(|f| f.semantics().is_pure())
                    .map(|f| SchemaFunction::Member(f.clone())),
            );
        }
        if let Some(fq_name) = self.imports.get(name) {
            if let Some(function) = self.schema.external_function(fq_name) {
                if function.semantics.is_pure() {
                    candidates.push(SchemaFunction::TopLevel(function.clone()));
                }
            }
            if let Some(class) = self.schema.data_class(fq_name) {
                candidates.extend(class.constructors.iter().cloned().map(SchemaFunction::Constructor));
            }
        }
        if candidates.is_empty() {
            return not_resolved(ValueFactoryNotResolvedReason::UnresolvedName);
        }
        if args.iter().any(|a| !a.resolution.is_successful()) {
            return not_resolved(ValueFactoryNotResolvedReason::UnresolvedArguments);
        }

        let mut matching: Vec<SchemaFunction> = candidates
            .into_iter()
            .filter(|f| self.signature_matches(f.parameters(), args))
            .collect();
        match matching.len() {
            0 => not_resolved(ValueFactoryNotResolvedReason::UnresolvedSignature),
            1 => ValueResolution::ValueFactoryResolved {
                function: matching.remove(0),
            },
            _ => not_resolved(ValueFactoryNotResolvedReason::AmbiguousName {
                candidates: matching,
            }),
        }
    }

    /// Positional match; values of unknown type are accepted.
    fn signature_matches(&self, parameters: &[DataParameter], values: &[ResolvedNode]) -> bool {
        if values.len() > parameters.len() {
            return false;
        }
        let values_fit = parameters.iter().zip(values).all(|(parameter, value)| {
            value_type(&value.resolution)
                .map_or(true, |t| self.schema.is_assignable(&parameter.data_type, &t))
        });
        values_fit && parameters[values.len()..].iter().all(|p| p.is_default)
    }
}

fn value_type(resolution: &DocumentResolution) -> Option<DataType> {
    match resolution {
        DocumentResolution::Value(ValueResolution::LiteralValueResolved { value }) => {
            Some(value.data_type())
        }
        DocumentResolution::Value(ValueResolution::ValueFactoryResolved { function }) => {
            Some(function.semantics().return_value_type())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_string;
    use pretty_assertions::assert_eq;

    fn member(
        receiver: &str,
        name: &str,
        parameters: Vec<DataParameter>,
        semantics: FunctionSemantics,
    ) -> SchemaMemberFunction {
        SchemaMemberFunction::Member(DataMemberFunction {
            receiver: DataType::class(receiver),
            simple_name: name.to_string(),
            parameters,
            is_direct_access_only: false,
            semantics,
        })
    }

    fn schema() -> AnalysisSchema {
        let mut root = DataClass::new(FqName::parse("p.Root"));
        let nested_property = DataProperty::new("nested", DataType::class("p.Nested")).read_only();
        root.properties = vec![
            DataProperty::new("name", DataType::String),
            DataProperty::new("id", DataType::String).read_only(),
            nested_property.clone(),
        ];
        root.member_functions = vec![
            member(
                "p.Root",
                "nested",
                vec![],
                FunctionSemantics::AccessAndConfigure {
                    accessor: ConfigureAccessor::Property(nested_property),
                    return_type: AccessAndConfigureReturnType::Unit,
                },
            ),
            member(
                "p.Root",
                "item",
                vec![DataParameter::new("key", DataType::String).identity_key()],
                FunctionSemantics::AddAndConfigure {
                    object_type: DataType::class("p.Item"),
                    block: ConfigureBlockRequirement::Optional,
                },
            ),
            member(
                "p.Root",
                "marker",
                vec![],
                FunctionSemantics::AddAndConfigure {
                    object_type: DataType::class("p.Item"),
                    block: ConfigureBlockRequirement::NotAllowed,
                },
            ),
            member(
                "p.Root",
                "label",
                vec![DataParameter::new("s", DataType::String)],
                FunctionSemantics::Pure {
                    return_type: DataType::String,
                },
            ),
            member(
                "p.Root",
                "section",
                vec![],
                FunctionSemantics::AddAndConfigure {
                    object_type: DataType::class("p.Item"),
                    block: ConfigureBlockRequirement::Required,
                },
            ),
        ];
        for parameter in ["a", "b"] {
            root.member_functions.push(member(
                "p.Root",
                "choose",
                vec![DataParameter::new(parameter, DataType::Int)],
                FunctionSemantics::Pure {
                    return_type: DataType::String,
                },
            ));
            root.member_functions.push(member(
                "p.Root",
                "entry",
                vec![DataParameter::new(parameter, DataType::String)],
                FunctionSemantics::AddAndConfigure {
                    object_type: DataType::class("p.Item"),
                    block: ConfigureBlockRequirement::Optional,
                },
            ));
        }
        let mut nested = DataClass::new(FqName::parse("p.Nested"));
        nested.properties = vec![DataProperty::new("depth", DataType::Int)];
        let mut item = DataClass::new(FqName::parse("p.Item"));
        item.properties = vec![DataProperty::new("count", DataType::Int)];

        AnalysisSchema::new(root)
            .with_class(nested)
            .with_class(item)
            .with_top_level_function(DataTopLevelFunction {
                package_name: "p.util".into(),
                simple_name: "twice".into(),
                parameters: vec![DataParameter::new("n", DataType::Int)],
                semantics: FunctionSemantics::Pure {
                    return_type: DataType::Int,
                },
            })
    }

    fn resolve_src(src: &str) -> ResolvedDocument {
        let document = convert_language_tree(&parse_string(src, "doc.dcl"));
        resolve_document(&schema(), &document)
    }

    fn property_reasons(node: &ResolvedNode) -> Vec<PropertyNotAssignedReason> {
        match &node.resolution {
            DocumentResolution::Property(PropertyResolution::PropertyNotAssigned { reasons }) => {
                reasons.clone()
            }
            other => panic!("expected unassigned property, got {:?}", other),
        }
    }

    #[test]
    fn resolves_properties_and_elements() {
        let doc = resolve_src("name = label(\"x\")\nnested {\n  depth = twice(2)\n}\nitem(\"a\") {\n  count = 1\n}");
        assert!(doc.is_successful(), "{:?}", doc.diagnostics());
        match &doc.content[2].resolution {
            DocumentResolution::Element(ElementResolution::ContainerElementResolved {
                element_type,
                is_key_arguments,
                ..
            }) => {
                assert_eq!(element_type, &DataType::class("p.Item"));
                assert!(*is_key_arguments);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            doc.content[1].resolution,
            DocumentResolution::Element(ElementResolution::PropertyConfiguringElementResolved { .. })
        ));
    }

    #[test]
    fn property_failures_are_itemized() {
        let doc = resolve_src("id = 1\nmissing = \"x\"\nname = nope(1)");
        assert_eq!(
            property_reasons(&doc.content[0]),
            vec![
                PropertyNotAssignedReason::NotAssignable,
                PropertyNotAssignedReason::ValueTypeMismatch
            ]
        );
        assert_eq!(
            property_reasons(&doc.content[1]),
            vec![PropertyNotAssignedReason::UnresolvedName]
        );
        assert_eq!(
            property_reasons(&doc.content[2]),
            vec![PropertyNotAssignedReason::UnresolvedValueUsed]
        );
    }

    #[test]
    fn cross_scope_access() {
        let doc = resolve_src("nested {\n  name = \"x\"\n}");
        assert_eq!(
            property_reasons(&doc.content[0].content[0]),
            vec![PropertyNotAssignedReason::CrossScopeAccess]
        );
    }

    #[test]
    fn unresolved_element_content_has_unresolved_base() {
        let doc = resolve_src("unknown {\n  depth = 1\n}");
        assert_eq!(
            doc.content[0].resolution.reasons(),
            vec![ResolutionFailureReason::Element(
                ElementNotResolvedReason::UnresolvedName
            )]
        );
        assert_eq!(
            property_reasons(&doc.content[0].content[0]),
            vec![PropertyNotAssignedReason::UnresolvedBase]
        );
    }

    #[test]
    fn element_failure_reasons() {
        let doc = resolve_src("label(\"x\")\nitem(1)\nmarker {\n  count = 1\n}");
        let reasons: Vec<String> = doc.content[..3]
            .iter()
            .flat_map(|n| n.resolution.reasons())
            .map(|r| r.code().to_string())
            .collect();
        assert_eq!(reasons, vec!["DCL-D007", "DCL-D008", "DCL-D010"]);
    }

    #[test]
    fn required_block_must_be_present() {
        let doc = resolve_src("section()\nsection { }\nsection {\n  count = 1\n}\nmarker { }");
        let reasons: Vec<Vec<ResolutionFailureReason>> =
            doc.content.iter().map(|n| n.resolution.reasons()).collect();
        assert_eq!(
            reasons,
            vec![
                vec![ResolutionFailureReason::Element(ElementNotResolvedReason::BlockMismatch)],
                vec![],
                vec![],
                vec![ResolutionFailureReason::Element(ElementNotResolvedReason::BlockMismatch)],
            ]
        );
    }

    #[test]
    fn ambiguous_element_lists_candidates() {
        let doc = resolve_src("entry(\"x\")");
        match &doc.content[0].resolution {
            DocumentResolution::Element(ElementResolution::ElementNotResolved { reasons }) => {
                match reasons.as_slice() {
                    [ElementNotResolvedReason::AmbiguousName { candidates }] => {
                        assert_eq!(candidates.len(), 2)
                    }
                    other => panic!("expected ambiguity, got {:?}", other),
                }
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(doc.diagnostics()[0].code, "DCL-D009");
    }

    #[test]
    fn ambiguous_value_factory_is_not_resolved() {
        let doc = resolve_src("name = choose(1)");
        assert_eq!(
            property_reasons(&doc.content[0]),
            vec![PropertyNotAssignedReason::UnresolvedValueUsed]
        );
        match &doc.content[0].values[0].resolution {
            DocumentResolution::Value(ValueResolution::ValueFactoryNotResolved { reasons }) => {
                match reasons.as_slice() {
                    [ValueFactoryNotResolvedReason::AmbiguousName { candidates }] => {
                        assert_eq!(candidates.len(), 2)
                    }
                    other => panic!("expected ambiguity, got {:?}", other),
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn error_nodes_resolve_to_error() {
        let doc = resolve_src("val x = 1");
        assert_eq!(doc.content[0].resolution, DocumentResolution::Error);
        let diagnostics = doc.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, "DCL-D012");
    }

    #[test]
    fn value_factory_argument_failure() {
        let doc = resolve_src("name = label(nope())");
        let value = &doc.content[0].values[0];
        assert_eq!(
            value.resolution.reasons(),
            vec![ResolutionFailureReason::ValueFactory(
                ValueFactoryNotResolvedReason::UnresolvedArguments
            )]
        );
    }
}
