//! Schema discovery over host type metadata.
//!
//! A [`HostTypeRepository`] describes the host's types the way reflection
//! would see them: names, supertypes, annotations, members. The builder walks
//! it from the top-level receiver, asks the configured extractors what each
//! type contributes, and assembles an [`AnalysisSchema`].

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalogs::*;
use crate::schema::*;

// ---------------------------------------------------------------------------
// Host metadata
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostClass {
    pub name: FqName,
    #[serde(default)]
    pub supertypes: Vec<FqName>,
    #[serde(default)]
    pub annotations: BTreeSet<String>,
    #[serde(default)]
    pub properties: Vec<HostProperty>,
    #[serde(default)]
    pub functions: Vec<HostFunction>,
    #[serde(default)]
    pub constructors: Vec<HostConstructor>,
}

impl HostClass {
    pub fn new(name: &str) -> Self {
        Self {
            name: FqName::parse(name),
            supertypes: Vec::new(),
            annotations: BTreeSet::new(),
            properties: Vec::new(),
            functions: Vec::new(),
            constructors: Vec::new(),
        }
    }

    pub fn annotated(mut self, annotation: &str) -> Self {
        self.annotations.insert(annotation.to_string());
        self
    }

    pub fn extending(mut self, supertype: &str) -> Self {
        self.supertypes.push(FqName::parse(supertype));
        self
    }

    pub fn with_property(mut self, property: HostProperty) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_function(mut self, function: HostFunction) -> Self {
        self.functions.push(function);
        self
    }

    pub fn with_constructor(mut self, constructor: HostConstructor) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn has_annotation(&self, annotation: &str) -> bool {
        self.annotations.contains(annotation)
    }

    fn data_type(&self) -> DataType {
        DataType::Class(self.name.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostProperty {
    pub name: String,
    #[serde(rename = "valueType")]
    pub value_type: DataType,
    #[serde(default)]
    pub annotations: BTreeSet<String>,
    #[serde(rename = "isMutable", default = "default_true")]
    pub is_mutable: bool,
}

fn default_true() -> bool {
    true
}

impl HostProperty {
    pub fn new(name: &str, value_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            value_type,
            annotations: BTreeSet::new(),
            is_mutable: true,
        }
    }

    pub fn annotated(mut self, annotation: &str) -> Self {
        self.annotations.insert(annotation.to_string());
        self
    }

    pub fn immutable(mut self) -> Self {
        self.is_mutable = false;
        self
    }

    pub fn has_annotation(&self, annotation: &str) -> bool {
        self.annotations.contains(annotation)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostParameter {
    pub name: String,
    #[serde(rename = "dataType")]
    pub data_type: DataType,
    #[serde(rename = "isOptional", default)]
    pub is_optional: bool,
    #[serde(default)]
    pub annotations: BTreeSet<String>,
}

impl HostParameter {
    pub fn new(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            is_optional: false,
            annotations: BTreeSet::new(),
        }
    }

    pub fn annotated(mut self, annotation: &str) -> Self {
        self.annotations.insert(annotation.to_string());
        self
    }

    fn to_data_parameter(&self) -> DataParameter {
        let mut parameter = DataParameter::new(&self.name, self.data_type.clone());
        if self.is_optional {
            parameter = parameter.optional();
        }
        if self.annotations.contains(IDENTITY_KEY) {
            parameter = parameter.identity_key();
        }
        parameter
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostFunction {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<HostParameter>,
    #[serde(rename = "returnType", default = "unit_type")]
    pub return_type: DataType,
    #[serde(default)]
    pub annotations: BTreeSet<String>,
    /// Type received by the trailing configure lambda, when the function takes one.
    #[serde(rename = "configureLambda", default)]
    pub configure_lambda: Option<DataType>,
}

fn unit_type() -> DataType {
    DataType::Unit
}

impl HostFunction {
    pub fn new(name: &str, return_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            parameters: Vec::new(),
            return_type,
            annotations: BTreeSet::new(),
            configure_lambda: None,
        }
    }

    pub fn annotated(mut self, annotation: &str) -> Self {
        self.annotations.insert(annotation.to_string());
        self
    }

    pub fn with_parameter(mut self, parameter: HostParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_configure_lambda(mut self, receiver: DataType) -> Self {
        self.configure_lambda = Some(receiver);
        self
    }

    pub fn has_annotation(&self, annotation: &str) -> bool {
        self.annotations.contains(annotation)
    }

    fn data_parameters(&self) -> Vec<DataParameter> {
        self.parameters
            .iter()
            .map(HostParameter::to_data_parameter)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConstructor {
    #[serde(default)]
    pub parameters: Vec<HostParameter>,
    #[serde(default)]
    pub annotations: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostTopLevelFunction {
    #[serde(rename = "packageName")]
    pub package_name: String,
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<HostParameter>,
    #[serde(rename = "returnType")]
    pub return_type: DataType,
    #[serde(default)]
    pub annotations: BTreeSet<String>,
}

/// Everything the builder may discover.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostTypeRepository {
    #[serde(default)]
    pub classes: Vec<HostClass>,
    #[serde(rename = "topLevelFunctions", default)]
    pub top_level_functions: Vec<HostTopLevelFunction>,
}

impl HostTypeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, class: HostClass) -> Self {
        self.classes.push(class);
        self
    }

    pub fn with_top_level_function(mut self, function: HostTopLevelFunction) -> Self {
        self.top_level_functions.push(function);
        self
    }

    pub fn class(&self, name: &FqName) -> Option<&HostClass> {
        self.classes.iter().find(|c| &c.name == name)
    }
}

// ---------------------------------------------------------------------------
// Extension points
// ---------------------------------------------------------------------------

/// Properties of every discovered class, extracted before functions so that
/// function extractors can refer to them.
#[derive(Debug, Default)]
pub struct PreIndex {
    properties: BTreeMap<String, Vec<DataProperty>>,
}

impl PreIndex {
    pub fn properties_of(&self, class: &FqName) -> &[DataProperty] {
        self.properties
            .get(&class.qualified_name())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn property(&self, class: &FqName, name: &str) -> Option<&DataProperty> {
        self.properties_of(class).iter().find(|p| p.name == name)
    }
}

pub trait PropertyExtractor {
    fn extract_properties(&self, class: &HostClass) -> Vec<DataProperty>;
}

pub trait FunctionExtractor {
    fn member_functions(&self, class: &HostClass, pre_index: &PreIndex) -> Vec<SchemaMemberFunction> {
        let _ = (class, pre_index);
        Vec::new()
    }

    fn constructors(&self, class: &HostClass, pre_index: &PreIndex) -> Vec<DataConstructor> {
        let _ = (class, pre_index);
        Vec::new()
    }

    fn top_level_function(
        &self,
        function: &HostTopLevelFunction,
        pre_index: &PreIndex,
    ) -> Option<DataTopLevelFunction> {
        let _ = (function, pre_index);
        None
    }
}

pub trait TypeDiscovery {
    fn types_to_add(&self, repository: &HostTypeRepository, class: &HostClass) -> Vec<FqName>;
}

/// Extractors run in order; member lists are concatenated.
#[derive(Default)]
pub struct CompositeFunctionExtractor {
    extractors: Vec<Box<dyn FunctionExtractor>>,
}

impl CompositeFunctionExtractor {
    pub fn new(extractors: Vec<Box<dyn FunctionExtractor>>) -> Self {
        Self { extractors }
    }

    pub fn with(mut self, extractor: impl FunctionExtractor + 'static) -> Self {
        self.extractors.push(Box::new(extractor));
        self
    }
}

impl FunctionExtractor for CompositeFunctionExtractor {
    fn member_functions(&self, class: &HostClass, pre_index: &PreIndex) -> Vec<SchemaMemberFunction> {
        self.extractors
            .iter()
            .flat_map(|e| e.member_functions(class, pre_index))
            .collect()
    }

    fn constructors(&self, class: &HostClass, pre_index: &PreIndex) -> Vec<DataConstructor> {
        self.extractors
            .iter()
            .flat_map(|e| e.constructors(class, pre_index))
            .collect()
    }

    fn top_level_function(
        &self,
        function: &HostTopLevelFunction,
        pre_index: &PreIndex,
    ) -> Option<DataTopLevelFunction> {
        self.extractors
            .iter()
            .find_map(|e| e.top_level_function(function, pre_index))
    }
}

#[derive(Default)]
pub struct CompositeTypeDiscovery {
    discoveries: Vec<Box<dyn TypeDiscovery>>,
}

impl CompositeTypeDiscovery {
    pub fn new(discoveries: Vec<Box<dyn TypeDiscovery>>) -> Self {
        Self { discoveries }
    }

    pub fn with(mut self, discovery: impl TypeDiscovery + 'static) -> Self {
        self.discoveries.push(Box::new(discovery));
        self
    }
}

impl TypeDiscovery for CompositeTypeDiscovery {
    fn types_to_add(&self, repository: &HostTypeRepository, class: &HostClass) -> Vec<FqName> {
        self.discoveries
            .iter()
            .flat_map(|d| d.types_to_add(repository, class))
            .collect()
    }
}

#[derive(Default)]
pub struct CompositePropertyExtractor {
    extractors: Vec<Box<dyn PropertyExtractor>>,
}

impl CompositePropertyExtractor {
    pub fn new(extractors: Vec<Box<dyn PropertyExtractor>>) -> Self {
        Self { extractors }
    }
}

impl PropertyExtractor for CompositePropertyExtractor {
    fn extract_properties(&self, class: &HostClass) -> Vec<DataProperty> {
        let mut seen = BTreeSet::new();
        self.extractors
            .iter()
            .flat_map(|e| e.extract_properties(class))
            .filter(|p| seen.insert(p.name.clone()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Default extractors
// ---------------------------------------------------------------------------

/// `Restricted` properties, plus `Configuring` properties kept hidden so that
/// their synthetic configuring function can refer to them.
pub struct DefaultPropertyExtractor;

impl PropertyExtractor for DefaultPropertyExtractor {
    fn extract_properties(&self, class: &HostClass) -> Vec<DataProperty> {
        class
            .properties
            .iter()
            .filter_map(|p| {
                let restricted = p.has_annotation(RESTRICTED);
                if !restricted && !p.has_annotation(CONFIGURING) {
                    return None;
                }
                let mut property = DataProperty::new(&p.name, p.value_type.clone());
                if !p.is_mutable {
                    property = property.read_only();
                }
                if p.has_annotation(HAS_DEFAULT_VALUE) {
                    property = property.with_default_value();
                }
                if !restricted || p.has_annotation(HIDDEN_IN_DSL) {
                    property = property.hidden();
                }
                Some(property)
            })
            .collect()
    }
}

pub struct DefaultFunctionExtractor;

impl DefaultFunctionExtractor {
    fn member_function(class: &HostClass, function: &HostFunction) -> Option<SchemaMemberFunction> {
        let receiver = class.data_type();
        let member = |semantics| {
            SchemaMemberFunction::Member(DataMemberFunction {
                receiver: receiver.clone(),
                simple_name: function.name.clone(),
                parameters: function.data_parameters(),
                is_direct_access_only: false,
                semantics,
            })
        };

        if function.has_annotation(ADDING) {
            let block = if function.configure_lambda.is_some() {
                ConfigureBlockRequirement::Optional
            } else {
                ConfigureBlockRequirement::NotAllowed
            };
            return Some(member(FunctionSemantics::AddAndConfigure {
                object_type: function.return_type.clone(),
                block,
            }));
        }
        if function.has_annotation(CONFIGURING) {
            let Some(lambda) = &function.configure_lambda else {
                log::warn!(
                    "{}.{} is configuring but takes no configure lambda",
                    class.name,
                    function.name
                );
                return None;
            };
            let return_type = if function.return_type == DataType::Unit {
                AccessAndConfigureReturnType::Unit
            } else {
                AccessAndConfigureReturnType::ConfiguredObject
            };
            return Some(member(FunctionSemantics::AccessAndConfigure {
                accessor: ConfigureAccessor::ConfiguringLambdaArgument(lambda.clone()),
                return_type,
            }));
        }
        if function.has_annotation(BUILDER) {
            let [parameter] = function.parameters.as_slice() else {
                log::warn!(
                    "{}.{} is a builder but does not take exactly one parameter",
                    class.name,
                    function.name
                );
                return None;
            };
            return Some(SchemaMemberFunction::Builder(DataBuilderFunction {
                receiver: class.data_type(),
                simple_name: function.name.clone(),
                is_direct_access_only: false,
                parameter: parameter.to_data_parameter(),
            }));
        }
        if function.has_annotation(RESTRICTED) {
            return Some(member(FunctionSemantics::Pure {
                return_type: function.return_type.clone(),
            }));
        }
        None
    }
}

impl FunctionExtractor for DefaultFunctionExtractor {
    fn member_functions(&self, class: &HostClass, pre_index: &PreIndex) -> Vec<SchemaMemberFunction> {
        let mut functions: Vec<SchemaMemberFunction> = class
            .functions
            .iter()
            .filter_map(|f| Self::member_function(class, f))
            .collect();

        for host_property in class
            .properties
            .iter()
            .filter(|p| p.has_annotation(CONFIGURING))
        {
            let Some(property) = pre_index.property(&class.name, &host_property.name) else {
                continue;
            };
            if property.value_type.class_name().is_none() {
                continue;
            }
            let shadowed = functions
                .iter()
                .any(|f| f.simple_name() == property.name && f.parameters().is_empty());
            if shadowed {
                continue;
            }
            functions.push(SchemaMemberFunction::Member(DataMemberFunction {
                receiver: class.data_type(),
                simple_name: property.name.clone(),
                parameters: Vec::new(),
                is_direct_access_only: false,
                semantics: FunctionSemantics::AccessAndConfigure {
                    accessor: ConfigureAccessor::Property(property.clone()),
                    return_type: AccessAndConfigureReturnType::Unit,
                },
            }));
        }
        functions
    }

    fn constructors(&self, class: &HostClass, _pre_index: &PreIndex) -> Vec<DataConstructor> {
        class
            .constructors
            .iter()
            .filter(|c| c.annotations.contains(RESTRICTED))
            .map(|c| DataConstructor {
                parameters: c.parameters.iter().map(HostParameter::to_data_parameter).collect(),
                data_class: class.name.clone(),
            })
            .collect()
    }

    fn top_level_function(
        &self,
        function: &HostTopLevelFunction,
        _pre_index: &PreIndex,
    ) -> Option<DataTopLevelFunction> {
        if !function.annotations.contains(RESTRICTED) {
            return None;
        }
        Some(DataTopLevelFunction {
            package_name: function.package_name.clone(),
            simple_name: function.name.clone(),
            parameters: function
                .parameters
                .iter()
                .map(HostParameter::to_data_parameter)
                .collect(),
            semantics: FunctionSemantics::Pure {
                return_type: function.return_type.clone(),
            },
        })
    }
}

/// Supertypes and every class type mentioned by a member.
pub struct DefaultTypeDiscovery;

impl TypeDiscovery for DefaultTypeDiscovery {
    fn types_to_add(&self, _repository: &HostTypeRepository, class: &HostClass) -> Vec<FqName> {
        let mut types: Vec<FqName> = class.supertypes.clone();
        let mut mention = |data_type: &DataType| {
            if let Some(name) = data_type.class_name() {
                types.push(name.clone());
            }
        };
        for property in &class.properties {
            mention(&property.value_type);
        }
        for function in &class.functions {
            mention(&function.return_type);
            function.parameters.iter().for_each(|p| mention(&p.data_type));
            if let Some(lambda) = &function.configure_lambda {
                mention(lambda);
            }
        }
        types
    }
}

/// Adds a fixed list of types when the key type (or any type, without a key)
/// is discovered.
pub struct FixedTypeDiscovery {
    key: Option<FqName>,
    types: Vec<FqName>,
}

impl FixedTypeDiscovery {
    pub fn new(key: Option<FqName>, types: Vec<FqName>) -> Self {
        Self { key, types }
    }
}

impl TypeDiscovery for FixedTypeDiscovery {
    fn types_to_add(&self, _repository: &HostTypeRepository, class: &HostClass) -> Vec<FqName> {
        match &self.key {
            Some(key) if key != &class.name => Vec::new(),
            _ => self.types.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct SchemaBuilderConfig {
    pub property_extractor: Box<dyn PropertyExtractor>,
    pub function_extractor: Box<dyn FunctionExtractor>,
    pub type_discovery: Box<dyn TypeDiscovery>,
    pub external_objects: Vec<(FqName, DataType)>,
    pub default_imports: Vec<FqName>,
}

impl Default for SchemaBuilderConfig {
    fn default() -> Self {
        Self {
            property_extractor: Box::new(DefaultPropertyExtractor),
            function_extractor: Box::new(DefaultFunctionExtractor),
            type_discovery: Box::new(DefaultTypeDiscovery),
            external_objects: Vec::new(),
            default_imports: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaBuildError {
    #[error("type '{name}' is not in the host type repository")]
    UnknownType { name: String },
    #[error("external object '{name}' has type '{object_type}', which was not discovered")]
    UnknownExternalObjectType { name: String, object_type: String },
}

/// Build a schema rooted at `top_level`, also including `types` and
/// everything discovered from them.
pub fn schema_from_types(
    repository: &HostTypeRepository,
    top_level: &FqName,
    types: &[FqName],
    config: &SchemaBuilderConfig,
) -> Result<AnalysisSchema, SchemaBuildError> {
    let mut queue: VecDeque<&HostClass> = VecDeque::new();
    for name in std::iter::once(top_level).chain(types) {
        let class = repository
            .class(name)
            .ok_or_else(|| SchemaBuildError::UnknownType {
                name: name.qualified_name(),
            })?;
        queue.push_back(class);
    }

    // Discovery
    let mut discovered: Vec<&HostClass> = Vec::new();
    let mut seen: BTreeSet<&FqName> = BTreeSet::new();
    while let Some(class) = queue.pop_front() {
        if !seen.insert(&class.name) {
            continue;
        }
        discovered.push(class);
        for name in config.type_discovery.types_to_add(repository, class) {
            match repository.class(&name) {
                Some(found) => queue.push_back(found),
                None => log::trace!("{} refers to unknown type {}", class.name, name),
            }
        }
    }

    let mut pre_index = PreIndex::default();
    for class in &discovered {
        pre_index.properties.insert(
            class.name.qualified_name(),
            config.property_extractor.extract_properties(class),
        );
    }

    let mut classes = discovered.iter().map(|class| DataClass {
        name: class.name.clone(),
        supertypes: class.supertypes.iter().cloned().collect(),
        properties: pre_index.properties_of(&class.name).to_vec(),
        member_functions: config.function_extractor.member_functions(class, &pre_index),
        constructors: config.function_extractor.constructors(class, &pre_index),
    });
    let Some(root) = classes.next() else {
        return Err(SchemaBuildError::UnknownType {
            name: top_level.qualified_name(),
        });
    };
    let mut schema = classes.fold(AnalysisSchema::new(root), AnalysisSchema::with_class);

    for function in &repository.top_level_functions {
        if let Some(function) = config
            .function_extractor
            .top_level_function(function, &pre_index)
        {
            schema = schema.with_top_level_function(function);
        }
    }
    for (name, object_type) in &config.external_objects {
        if schema.class_of(object_type).is_none() && object_type.class_name().is_some() {
            return Err(SchemaBuildError::UnknownExternalObjectType {
                name: name.qualified_name(),
                object_type: object_type.to_string(),
            });
        }
        schema = schema.with_external_object(name.clone(), object_type.clone());
    }
    schema
        .default_imports
        .extend(config.default_imports.iter().cloned());

    log::debug!(
        "built schema for {} with {} types and {} top-level functions",
        top_level,
        schema.data_classes.len(),
        schema.external_functions_by_fq_name.len()
    );
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn repository() -> HostTypeRepository {
        HostTypeRepository::new()
            .with_class(
                HostClass::new("app.Project")
                    .with_property(
                        HostProperty::new("name", DataType::String).annotated(RESTRICTED),
                    )
                    .with_property(
                        HostProperty::new("id", DataType::Int)
                            .annotated(RESTRICTED)
                            .immutable(),
                    )
                    .with_property(HostProperty::new("internal", DataType::Int))
                    .with_property(
                        HostProperty::new("java", DataType::class("app.Java"))
                            .annotated(CONFIGURING)
                            .immutable(),
                    )
                    .with_function(
                        HostFunction::new("dependencies", DataType::Unit)
                            .annotated(CONFIGURING)
                            .with_configure_lambda(DataType::class("app.Dependencies")),
                    )
                    .with_function(
                        HostFunction::new("library", DataType::class("app.Library"))
                            .annotated(ADDING)
                            .with_parameter(
                                HostParameter::new("name", DataType::String)
                                    .annotated(IDENTITY_KEY),
                            )
                            .with_configure_lambda(DataType::class("app.Library")),
                    )
                    .with_function(
                        HostFunction::new("version", DataType::class("app.Project"))
                            .annotated(BUILDER)
                            .with_parameter(HostParameter::new("value", DataType::String)),
                    )
                    .with_function(
                        HostFunction::new("path", DataType::String)
                            .annotated(RESTRICTED)
                            .with_parameter(HostParameter::new("p", DataType::String)),
                    )
                    .with_function(HostFunction::new("hiddenHelper", DataType::Int)),
            )
            .with_class(
                HostClass::new("app.Java").with_property(
                    HostProperty::new("release", DataType::Int).annotated(RESTRICTED),
                ),
            )
            .with_class(HostClass::new("app.Dependencies"))
            .with_class(HostClass::new("app.Library").extending("app.Named"))
            .with_class(
                HostClass::new("app.Named").with_constructor(HostConstructor {
                    parameters: vec![HostParameter::new("n", DataType::String)],
                    annotations: [RESTRICTED.to_string()].into(),
                }),
            )
            .with_class(HostClass::new("app.Unreachable"))
            .with_top_level_function(HostTopLevelFunction {
                package_name: "app.util".into(),
                name: "env".into(),
                parameters: vec![HostParameter::new("key", DataType::String)],
                return_type: DataType::String,
                annotations: [RESTRICTED.to_string()].into(),
            })
    }

    fn build() -> AnalysisSchema {
        schema_from_types(
            &repository(),
            &FqName::parse("app.Project"),
            &[],
            &SchemaBuilderConfig::default(),
        )
        .expect("schema builds")
    }

    #[test]
    fn discovers_reachable_types_only() {
        let schema = build();
        let names: Vec<&String> = schema.data_classes.keys().collect();
        assert_eq!(
            names,
            vec![
                "app.Dependencies",
                "app.Java",
                "app.Library",
                "app.Named",
                "app.Project"
            ]
        );
        assert_eq!(schema.top_level_receiver_type, FqName::parse("app.Project"));
    }

    #[test]
    fn extracts_restricted_and_configuring_properties() {
        let schema = build();
        let project = schema.top_level_receiver().expect("root");
        let names: Vec<&str> = project.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["name", "id", "java"]);
        assert!(!project.properties[1].is_writable());
        assert!(project.properties[2].is_hidden_in_dsl);
        assert!(project.property("java").is_none());
    }

    #[test]
    fn maps_annotations_to_function_semantics() {
        let schema = build();
        let project = schema.top_level_receiver().expect("root");
        let kinds: Vec<(&str, bool, bool)> = project
            .member_functions
            .iter()
            .map(|f| {
                let semantics = f.semantics();
                (f.simple_name(), semantics.is_configuring(), semantics.is_pure())
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("dependencies", true, false),
                ("library", true, false),
                ("version", false, false),
                ("path", false, true),
                ("java", true, false),
            ]
        );
        assert!(matches!(
            project.member_functions[2],
            SchemaMemberFunction::Builder(_)
        ));
        assert_eq!(
            project.member_functions[1].parameters()[0].semantics,
            ParameterSemantics::IdentityKey
        );
    }

    #[test]
    fn top_level_functions_and_constructors() {
        let schema = build();
        assert!(schema
            .external_function(&FqName::parse("app.util.env"))
            .is_some());
        assert!(schema.default_imports.contains(&FqName::parse("app.util.env")));
        let named = schema.data_class(&FqName::parse("app.Named")).expect("named");
        assert_eq!(named.constructors.len(), 1);
    }

    #[test]
    fn composite_extractors_concatenate_in_order() {
        struct Extra;
        impl FunctionExtractor for Extra {
            fn member_functions(&self, class: &HostClass, _: &PreIndex) -> Vec<SchemaMemberFunction> {
                if class.name != FqName::parse("app.Project") {
                    return Vec::new();
                }
                vec![SchemaMemberFunction::Member(DataMemberFunction {
                    receiver: DataType::class("app.Project"),
                    simple_name: "extra".into(),
                    parameters: vec![],
                    is_direct_access_only: true,
                    semantics: FunctionSemantics::Pure {
                        return_type: DataType::Int,
                    },
                })]
            }
        }

        let config = SchemaBuilderConfig {
            function_extractor: Box::new(
                CompositeFunctionExtractor::default()
                    .with(DefaultFunctionExtractor)
                    .with(Extra),
            ),
            type_discovery: Box::new(
                CompositeTypeDiscovery::default()
                    .with(DefaultTypeDiscovery)
                    .with(FixedTypeDiscovery::new(
                        Some(FqName::parse("app.Project")),
                        vec![FqName::parse("app.Unreachable")],
                    )),
            ),
            ..SchemaBuilderConfig::default()
        };
        let schema = schema_from_types(&repository(), &FqName::parse("app.Project"), &[], &config)
            .expect("schema builds");
        let project = schema.top_level_receiver().expect("root");
        assert_eq!(
            project.member_functions.last().map(|f| f.simple_name()),
            Some("extra")
        );
        assert!(schema.data_class(&FqName::parse("app.Unreachable")).is_some());
    }

    #[test]
    fn unknown_root_is_an_error() {
        let error = schema_from_types(
            &repository(),
            &FqName::parse("app.Missing"),
            &[],
            &SchemaBuilderConfig::default(),
        )
        .unwrap_err();
        assert_eq!(
            error,
            SchemaBuildError::UnknownType {
                name: "app.Missing".into()
            }
        );
    }

    #[test]
    fn external_objects_need_discovered_types() {
        let config = SchemaBuilderConfig {
            external_objects: vec![(FqName::parse("app.env.java"), DataType::class("app.Nope"))],
            ..SchemaBuilderConfig::default()
        };
        let error = schema_from_types(&repository(), &FqName::parse("app.Project"), &[], &config)
            .unwrap_err();
        assert!(matches!(error, SchemaBuildError::UnknownExternalObjectType { .. }));
    }
}
