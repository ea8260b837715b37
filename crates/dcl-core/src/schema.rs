//! Analysis schema: the closed set of types, properties and functions a
//! document may reference.
//!
//! Schemas are built once (see [`crate::schema_builder`]) or deserialized from
//! JSON/YAML, and never mutated afterwards.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Names and types
// ---------------------------------------------------------------------------

/// Serialized as its dotted form, `a.b.C`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FqName {
    pub package_name: String,
    pub simple_name: String,
}

impl FqName {
    pub fn new(package_name: &str, simple_name: &str) -> Self {
        Self {
            package_name: package_name.to_string(),
            simple_name: simple_name.to_string(),
        }
    }

    /// Split a dotted name at its last segment: `a.b.C` → package `a.b`, name `C`.
    pub fn parse(qualified: &str) -> Self {
        match qualified.rsplit_once('.') {
            Some((package, simple)) => Self::new(package, simple),
            None => Self::new("", qualified),
        }
    }

    pub fn from_segments(segments: &[String]) -> Option<Self> {
        let (simple, package) = segments.split_last()?;
        Some(Self::new(&package.join("."), simple))
    }

    pub fn qualified_name(&self) -> String {
        if self.package_name.is_empty() {
            self.simple_name.clone()
        } else {
            format!("{}.{}", self.package_name, self.simple_name)
        }
    }
}

impl From<String> for FqName {
    fn from(qualified: String) -> Self {
        FqName::parse(&qualified)
    }
}

impl From<FqName> for String {
    fn from(name: FqName) -> Self {
        name.qualified_name()
    }
}

impl fmt::Display for FqName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Int,
    Long,
    String,
    Boolean,
    Null,
    Unit,
    /// A data class, referenced by name and looked up in the schema.
    Class(FqName),
}

impl DataType {
    pub fn class(qualified: &str) -> Self {
        DataType::Class(FqName::parse(qualified))
    }

    pub fn class_name(&self) -> Option<&FqName> {
        match self {
            DataType::Class(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int => f.write_str("Int"),
            DataType::Long => f.write_str("Long"),
            DataType::String => f.write_str("String"),
            DataType::Boolean => f.write_str("Boolean"),
            DataType::Null => f.write_str("Nothing?"),
            DataType::Unit => f.write_str("Unit"),
            DataType::Class(name) => write!(f, "{name}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Properties and parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyMode {
    #[default]
    ReadWrite,
    ReadOnly,
    WriteOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataProperty {
    pub name: String,
    #[serde(rename = "valueType")]
    pub value_type: DataType,
    #[serde(default)]
    pub mode: PropertyMode,
    #[serde(default, rename = "hasDefaultValue")]
    pub has_default_value: bool,
    #[serde(default, rename = "isHiddenInDsl")]
    pub is_hidden_in_dsl: bool,
    #[serde(default, rename = "isDirectAccessOnly")]
    pub is_direct_access_only: bool,
}

impl DataProperty {
    pub fn new(name: &str, value_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            value_type,
            mode: PropertyMode::ReadWrite,
            has_default_value: false,
            is_hidden_in_dsl: false,
            is_direct_access_only: false,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.mode = PropertyMode::ReadOnly;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.mode = PropertyMode::WriteOnly;
        self
    }

    pub fn direct_access_only(mut self) -> Self {
        self.is_direct_access_only = true;
        self
    }

    pub fn with_default_value(mut self) -> Self {
        self.has_default_value = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.is_hidden_in_dsl = true;
        self
    }

    pub fn is_readable(&self) -> bool {
        self.mode != PropertyMode::WriteOnly
    }

    pub fn is_writable(&self) -> bool {
        self.mode != PropertyMode::ReadOnly
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterSemantics {
    #[default]
    Unknown,
    /// The argument identifies the element created by an adding function.
    IdentityKey,
    StoreValueInProperty(DataProperty),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataParameter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub data_type: DataType,
    #[serde(default, rename = "isDefault")]
    pub is_default: bool,
    #[serde(default)]
    pub semantics: ParameterSemantics,
}

impl DataParameter {
    pub fn new(name: &str, data_type: DataType) -> Self {
        Self {
            name: Some(name.to_string()),
            data_type,
            is_default: false,
            semantics: ParameterSemantics::Unknown,
        }
    }

    pub fn optional(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn identity_key(mut self) -> Self {
        self.semantics = ParameterSemantics::IdentityKey;
        self
    }
}

// ---------------------------------------------------------------------------
// Function semantics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomAccessor {
    #[serde(rename = "objectType")]
    pub object_type: DataType,
    pub identifier: String,
}

/// How an access-and-configure function reaches its target object at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigureAccessor {
    /// Read a property of the receiver.
    Property(DataProperty),
    /// Call the function itself; it hands the target to its configure lambda.
    ConfiguringLambdaArgument(DataType),
    /// Ask the runtime custom accessors by identifier.
    Custom(CustomAccessor),
}

impl ConfigureAccessor {
    pub fn object_type(&self) -> &DataType {
        match self {
            ConfigureAccessor::Property(property) => &property.value_type,
            ConfigureAccessor::ConfiguringLambdaArgument(object_type) => object_type,
            ConfigureAccessor::Custom(custom) => &custom.object_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccessAndConfigureReturnType {
    ConfiguredObject,
    Unit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfigureBlockRequirement {
    NotAllowed,
    Optional,
    Required,
}

impl ConfigureBlockRequirement {
    pub fn allows(self) -> bool {
        self != ConfigureBlockRequirement::NotAllowed
    }

    pub fn requires(self) -> bool {
        self == ConfigureBlockRequirement::Required
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionSemantics {
    /// No side effects; produces a new value.
    Pure {
        #[serde(rename = "returnType")]
        return_type: DataType,
    },
    /// Stores its single argument on the receiver and returns the receiver.
    Builder {
        #[serde(rename = "returnType")]
        return_type: DataType,
    },
    /// Obtains an existing object and configures it in a block.
    AccessAndConfigure {
        accessor: ConfigureAccessor,
        #[serde(rename = "returnType")]
        return_type: AccessAndConfigureReturnType,
    },
    /// Creates an element, adds it to the receiver, optionally configures it.
    AddAndConfigure {
        #[serde(rename = "objectType")]
        object_type: DataType,
        block: ConfigureBlockRequirement,
    },
}

impl FunctionSemantics {
    pub fn return_value_type(&self) -> DataType {
        match self {
            FunctionSemantics::Pure { return_type } | FunctionSemantics::Builder { return_type } => {
                return_type.clone()
            }
            FunctionSemantics::AccessAndConfigure {
                accessor,
                return_type,
            } => match return_type {
                AccessAndConfigureReturnType::ConfiguredObject => accessor.object_type().clone(),
                AccessAndConfigureReturnType::Unit => DataType::Unit,
            },
            FunctionSemantics::AddAndConfigure { object_type, .. } => object_type.clone(),
        }
    }

    /// Type of the receiver inside the configuring block, if a block is possible.
    pub fn configured_type(&self) -> Option<&DataType> {
        match self {
            FunctionSemantics::AccessAndConfigure { accessor, .. } => Some(accessor.object_type()),
            FunctionSemantics::AddAndConfigure { object_type, .. } => Some(object_type),
            FunctionSemantics::Pure { .. } | FunctionSemantics::Builder { .. } => None,
        }
    }

    pub fn configure_block_requirement(&self) -> ConfigureBlockRequirement {
        match self {
            FunctionSemantics::Pure { .. } | FunctionSemantics::Builder { .. } => {
                ConfigureBlockRequirement::NotAllowed
            }
            FunctionSemantics::AccessAndConfigure { .. } => ConfigureBlockRequirement::Required,
            FunctionSemantics::AddAndConfigure { block, .. } => *block,
        }
    }

    pub fn is_configuring(&self) -> bool {
        self.configured_type().is_some()
    }

    pub fn is_pure(&self) -> bool {
        matches!(self, FunctionSemantics::Pure { .. })
    }
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataMemberFunction {
    pub receiver: DataType,
    #[serde(rename = "simpleName")]
    pub simple_name: String,
    pub parameters: Vec<DataParameter>,
    #[serde(default, rename = "isDirectAccessOnly")]
    pub is_direct_access_only: bool,
    pub semantics: FunctionSemantics,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataBuilderFunction {
    pub receiver: DataType,
    #[serde(rename = "simpleName")]
    pub simple_name: String,
    #[serde(default, rename = "isDirectAccessOnly")]
    pub is_direct_access_only: bool,
    pub parameter: DataParameter,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaMemberFunction {
    Member(DataMemberFunction),
    Builder(DataBuilderFunction),
}

impl SchemaMemberFunction {
    pub fn receiver(&self) -> &DataType {
        match self {
            SchemaMemberFunction::Member(f) => &f.receiver,
            SchemaMemberFunction::Builder(f) => &f.receiver,
        }
    }

    pub fn simple_name(&self) -> &str {
        match self {
            SchemaMemberFunction::Member(f) => &f.simple_name,
            SchemaMemberFunction::Builder(f) => &f.simple_name,
        }
    }

    pub fn parameters(&self) -> &[DataParameter] {
        match self {
            SchemaMemberFunction::Member(f) => &f.parameters,
            SchemaMemberFunction::Builder(f) => std::slice::from_ref(&f.parameter),
        }
    }

    pub fn is_direct_access_only(&self) -> bool {
        match self {
            SchemaMemberFunction::Member(f) => f.is_direct_access_only,
            SchemaMemberFunction::Builder(f) => f.is_direct_access_only,
        }
    }

    pub fn semantics(&self) -> Cow<'_, FunctionSemantics> {
        match self {
            SchemaMemberFunction::Member(f) => Cow::Borrowed(&f.semantics),
            SchemaMemberFunction::Builder(f) => Cow::Owned(FunctionSemantics::Builder {
                return_type: f.receiver.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataTopLevelFunction {
    #[serde(rename = "packageName")]
    pub package_name: String,
    #[serde(rename = "simpleName")]
    pub simple_name: String,
    pub parameters: Vec<DataParameter>,
    pub semantics: FunctionSemantics,
}

impl DataTopLevelFunction {
    pub fn fq_name(&self) -> FqName {
        FqName::new(&self.package_name, &self.simple_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataConstructor {
    pub parameters: Vec<DataParameter>,
    #[serde(rename = "dataClass")]
    pub data_class: FqName,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaFunction {
    Member(SchemaMemberFunction),
    TopLevel(DataTopLevelFunction),
    Constructor(DataConstructor),
}

impl SchemaFunction {
    pub fn simple_name(&self) -> &str {
        match self {
            SchemaFunction::Member(f) => f.simple_name(),
            SchemaFunction::TopLevel(f) => &f.simple_name,
            SchemaFunction::Constructor(c) => &c.data_class.simple_name,
        }
    }

    pub fn parameters(&self) -> &[DataParameter] {
        match self {
            SchemaFunction::Member(f) => f.parameters(),
            SchemaFunction::TopLevel(f) => &f.parameters,
            SchemaFunction::Constructor(c) => &c.parameters,
        }
    }

    pub fn semantics(&self) -> Cow<'_, FunctionSemantics> {
        match self {
            SchemaFunction::Member(f) => f.semantics(),
            SchemaFunction::TopLevel(f) => Cow::Borrowed(&f.semantics),
            SchemaFunction::Constructor(c) => Cow::Owned(FunctionSemantics::Pure {
                return_type: DataType::Class(c.data_class.clone()),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Classes and the schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataClass {
    pub name: FqName,
    #[serde(default)]
    pub supertypes: BTreeSet<FqName>,
    #[serde(default)]
    pub properties: Vec<DataProperty>,
    #[serde(default, rename = "memberFunctions")]
    pub member_functions: Vec<SchemaMemberFunction>,
    #[serde(default)]
    pub constructors: Vec<DataConstructor>,
}

impl DataClass {
    pub fn new(name: FqName) -> Self {
        Self {
            name,
            supertypes: BTreeSet::new(),
            properties: Vec::new(),
            member_functions: Vec::new(),
            constructors: Vec::new(),
        }
    }

    pub fn data_type(&self) -> DataType {
        DataType::Class(self.name.clone())
    }

    /// A property addressable by name from documents.
    pub fn property(&self, name: &str) -> Option<&DataProperty> {
        self.properties
            .iter()
            .find(|p| p.name == name && !p.is_hidden_in_dsl)
    }

    pub fn functions_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a SchemaMemberFunction> + 'a {
        self.member_functions
            .iter()
            .filter(move |f| f.simple_name() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalObjectProviderKey {
    #[serde(rename = "objectType")]
    pub object_type: DataType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSchema {
    #[serde(rename = "topLevelReceiverType")]
    pub top_level_receiver_type: FqName,
    /// Keyed by qualified name.
    #[serde(rename = "dataClasses")]
    pub data_classes: BTreeMap<String, DataClass>,
    #[serde(default, rename = "externalFunctionsByFqName")]
    pub external_functions_by_fq_name: BTreeMap<String, DataTopLevelFunction>,
    #[serde(default, rename = "externalObjectsByFqName")]
    pub external_objects_by_fq_name: BTreeMap<String, ExternalObjectProviderKey>,
    #[serde(default, rename = "defaultImports")]
    pub default_imports: BTreeSet<FqName>,
}

impl AnalysisSchema {
    pub fn new(top_level_receiver: DataClass) -> Self {
        let name = top_level_receiver.name.clone();
        let mut data_classes = BTreeMap::new();
        data_classes.insert(name.qualified_name(), top_level_receiver);
        Self {
            top_level_receiver_type: name,
            data_classes,
            external_functions_by_fq_name: BTreeMap::new(),
            external_objects_by_fq_name: BTreeMap::new(),
            default_imports: BTreeSet::new(),
        }
    }

    pub fn with_class(mut self, class: DataClass) -> Self {
        self.data_classes.insert(class.name.qualified_name(), class);
        self
    }

    /// Register a top-level function and import it by default.
    pub fn with_top_level_function(mut self, function: DataTopLevelFunction) -> Self {
        let fq_name = function.fq_name();
        self.default_imports.insert(fq_name.clone());
        self.external_functions_by_fq_name
            .insert(fq_name.qualified_name(), function);
        self
    }

    /// Register an external object and import it by default.
    pub fn with_external_object(mut self, name: FqName, object_type: DataType) -> Self {
        self.default_imports.insert(name.clone());
        self.external_objects_by_fq_name
            .insert(name.qualified_name(), ExternalObjectProviderKey { object_type });
        self
    }

    pub fn top_level_receiver(&self) -> Option<&DataClass> {
        self.data_class(&self.top_level_receiver_type)
    }

    pub fn data_class(&self, name: &FqName) -> Option<&DataClass> {
        self.data_classes.get(&name.qualified_name())
    }

    pub fn class_of(&self, data_type: &DataType) -> Option<&DataClass> {
        data_type.class_name().and_then(|name| self.data_class(name))
    }

    pub fn external_function(&self, name: &FqName) -> Option<&DataTopLevelFunction> {
        self.external_functions_by_fq_name.get(&name.qualified_name())
    }

    pub fn external_object(&self, name: &FqName) -> Option<&ExternalObjectProviderKey> {
        self.external_objects_by_fq_name.get(&name.qualified_name())
    }

    /// Whether a value of type `actual` may be stored where `expected` is declared.
    pub fn is_assignable(&self, expected: &DataType, actual: &DataType) -> bool {
        if expected == actual {
            return true;
        }
        match (expected, actual) {
            (DataType::Class(_), DataType::Null) => true,
            (DataType::Class(expected), DataType::Class(actual)) => self.is_subtype(actual, expected),
            _ => false,
        }
    }

    fn is_subtype(&self, class: &FqName, of: &FqName) -> bool {
        let mut visited: HashSet<&FqName> = HashSet::new();
        let mut queue: VecDeque<&FqName> = VecDeque::new();
        queue.push_back(class);
        while let Some(current) = queue.pop_front() {
            if current == of {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(data_class) = self.data_class(current) {
                queue.extend(data_class.supertypes.iter());
            }
        }
        false
    }
}
