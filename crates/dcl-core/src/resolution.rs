//! Output model of the resolver: object provenance, recorded assignments and
//! additions, and accumulated resolution errors.

use serde::{Deserialize, Serialize};

use crate::language::{LanguageTreeElement, Literal};
use crate::schema::*;
use crate::types::{Diagnostic, SourceLocation};

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterBinding {
    pub parameter: DataParameter,
    pub value: ObjectOrigin,
}

/// Arguments of a call bound to the parameters of one candidate function,
/// listed in parameter declaration order. Defaulted parameters are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterValueBinding {
    pub bindings: Vec<ParameterBinding>,
    #[serde(rename = "hasConfigureBlock")]
    pub has_configure_block: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResolutionAndBinding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<ObjectOrigin>,
    pub function: SchemaFunction,
    pub binding: ParameterValueBinding,
}

// ---------------------------------------------------------------------------
// Object origins
// ---------------------------------------------------------------------------

/// Where a value comes from. Origins nest into a DAG rooted at
/// [`ObjectOrigin::TopLevelReceiver`]; every function invocation carries an
/// `invocation_id` drawn from the same program-order counter as assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectOrigin {
    TopLevelReceiver {
        #[serde(rename = "receiverType")]
        receiver_type: DataType,
        loc: SourceLocation,
    },
    ConstantOrigin {
        literal: Literal,
        loc: SourceLocation,
    },
    NullObject {
        loc: SourceLocation,
    },
    External {
        key: FqName,
        #[serde(rename = "objectType")]
        object_type: DataType,
        loc: SourceLocation,
    },
    FromLocalValue {
        name: String,
        assigned: Box<ObjectOrigin>,
        loc: SourceLocation,
    },
    /// A scope receiver reached without an explicit `this`.
    ImplicitThisReceiver {
        #[serde(rename = "resolvedTo")]
        resolved_to: Box<ObjectOrigin>,
        #[serde(rename = "isCurrentScopeReceiver")]
        is_current_scope_receiver: bool,
    },
    PropertyReference {
        receiver: Box<ObjectOrigin>,
        property: DataProperty,
        loc: SourceLocation,
    },
    NewObjectFromMemberFunction {
        function: SchemaMemberFunction,
        receiver: Box<ObjectOrigin>,
        binding: ParameterValueBinding,
        #[serde(rename = "invocationId")]
        invocation_id: u64,
        loc: SourceLocation,
    },
    NewObjectFromTopLevelFunction {
        function: DataTopLevelFunction,
        binding: ParameterValueBinding,
        #[serde(rename = "invocationId")]
        invocation_id: u64,
        loc: SourceLocation,
    },
    NewObjectFromConstructor {
        constructor: DataConstructor,
        binding: ParameterValueBinding,
        #[serde(rename = "invocationId")]
        invocation_id: u64,
        loc: SourceLocation,
    },
    /// The object configured by an access-and-configure call.
    ConfigureReceiver {
        receiver: Box<ObjectOrigin>,
        function: SchemaMemberFunction,
        binding: ParameterValueBinding,
        accessor: ConfigureAccessor,
        #[serde(rename = "invocationId")]
        invocation_id: u64,
        loc: SourceLocation,
    },
    /// The element created by an add-and-configure call, as seen inside its block.
    AddAndConfigureReceiver {
        receiver: Box<ObjectOrigin>,
    },
    BuilderReturnedReceiver {
        function: SchemaMemberFunction,
        receiver: Box<ObjectOrigin>,
        binding: ParameterValueBinding,
        #[serde(rename = "invocationId")]
        invocation_id: u64,
        loc: SourceLocation,
    },
}

impl ObjectOrigin {
    pub fn data_type(&self) -> DataType {
        match self {
            ObjectOrigin::TopLevelReceiver { receiver_type, .. } => receiver_type.clone(),
            ObjectOrigin::ConstantOrigin { literal, .. } => literal.data_type(),
            ObjectOrigin::NullObject { .. } => DataType::Null,
            ObjectOrigin::External { object_type, .. } => object_type.clone(),
            ObjectOrigin::FromLocalValue { assigned, .. } => assigned.data_type(),
            ObjectOrigin::ImplicitThisReceiver { resolved_to, .. } => resolved_to.data_type(),
            ObjectOrigin::PropertyReference { property, .. } => property.value_type.clone(),
            ObjectOrigin::NewObjectFromMemberFunction { function, .. } => {
                function.semantics().return_value_type()
            }
            ObjectOrigin::NewObjectFromTopLevelFunction { function, .. } => {
                function.semantics.return_value_type()
            }
            ObjectOrigin::NewObjectFromConstructor { constructor, .. } => {
                DataType::Class(constructor.data_class.clone())
            }
            ObjectOrigin::ConfigureReceiver { accessor, .. } => accessor.object_type().clone(),
            ObjectOrigin::AddAndConfigureReceiver { receiver }
            | ObjectOrigin::BuilderReturnedReceiver { receiver, .. } => receiver.data_type(),
        }
    }

    pub fn invocation_id(&self) -> Option<u64> {
        match self {
            ObjectOrigin::NewObjectFromMemberFunction { invocation_id, .. }
            | ObjectOrigin::NewObjectFromTopLevelFunction { invocation_id, .. }
            | ObjectOrigin::NewObjectFromConstructor { invocation_id, .. }
            | ObjectOrigin::ConfigureReceiver { invocation_id, .. }
            | ObjectOrigin::BuilderReturnedReceiver { invocation_id, .. } => Some(*invocation_id),
            ObjectOrigin::AddAndConfigureReceiver { receiver } => receiver.invocation_id(),
            ObjectOrigin::ImplicitThisReceiver { resolved_to, .. } => resolved_to.invocation_id(),
            _ => None,
        }
    }

    pub fn loc(&self) -> &SourceLocation {
        match self {
            ObjectOrigin::TopLevelReceiver { loc, .. }
            | ObjectOrigin::ConstantOrigin { loc, .. }
            | ObjectOrigin::NullObject { loc }
            | ObjectOrigin::External { loc, .. }
            | ObjectOrigin::FromLocalValue { loc, .. }
            | ObjectOrigin::PropertyReference { loc, .. }
            | ObjectOrigin::NewObjectFromMemberFunction { loc, .. }
            | ObjectOrigin::NewObjectFromTopLevelFunction { loc, .. }
            | ObjectOrigin::NewObjectFromConstructor { loc, .. }
            | ObjectOrigin::ConfigureReceiver { loc, .. }
            | ObjectOrigin::BuilderReturnedReceiver { loc, .. } => loc,
            ObjectOrigin::ImplicitThisReceiver { resolved_to, .. } => resolved_to.loc(),
            ObjectOrigin::AddAndConfigureReceiver { receiver } => receiver.loc(),
        }
    }

    /// Strip implicit-receiver and local-value wrappers.
    pub fn unwrapped(&self) -> &ObjectOrigin {
        match self {
            ObjectOrigin::ImplicitThisReceiver { resolved_to, .. } => resolved_to.unwrapped(),
            ObjectOrigin::FromLocalValue { assigned, .. } => assigned.unwrapped(),
            other => other,
        }
    }

    /// The external object this origin is read through, if any.
    pub fn external_root(&self) -> Option<&FqName> {
        match self.unwrapped() {
            ObjectOrigin::External { key, .. } => Some(key),
            ObjectOrigin::PropertyReference { receiver, .. } => receiver.external_root(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Assignments and additions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyReferenceResolution {
    #[serde(rename = "receiverObject")]
    pub receiver_object: ObjectOrigin,
    pub property: DataProperty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentMethod {
    Property,
    /// Replayed by calling the named builder function with the value.
    Builder {
        #[serde(rename = "functionName")]
        function_name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub lhs: PropertyReferenceResolution,
    pub rhs: ObjectOrigin,
    #[serde(rename = "assignmentOrder")]
    pub assignment_order: u64,
    pub method: AssignmentMethod,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataAddition {
    pub container: ObjectOrigin,
    #[serde(rename = "dataObject")]
    pub data_object: ObjectOrigin,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ErrorReason {
    AmbiguousImport {
        #[serde(rename = "fqName")]
        fq_name: FqName,
    },
    UnresolvedReference {
        reference: String,
    },
    NonReadableProperty {
        property: DataProperty,
    },
    ReadOnlyPropertyAssignment {
        property: DataProperty,
    },
    UnresolvedFunctionCallArguments {
        function: String,
    },
    UnresolvedFunctionCallReceiver {
        function: String,
    },
    UnresolvedFunctionCallSignature {
        function: String,
    },
    AmbiguousFunctions {
        functions: Vec<FunctionResolutionAndBinding>,
    },
    ValReassignment {
        name: String,
    },
    ExternalReassignment {
        external: FqName,
    },
    AssignmentTypeMismatch {
        expected: DataType,
        actual: DataType,
    },
    // Representable for tooling; the resolver does not produce these two.
    UnusedConfigureLambda,
    MissingConfigureLambda,
    AccessOnCurrentReceiverOnlyViolation {
        name: String,
    },
    DuplicateLocalValue {
        name: String,
    },
    UnresolvedAssignmentLhs,
    UnresolvedAssignmentRhs,
    UnitAssignment,
    DanglingPureExpression,
}

impl ErrorReason {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorReason::AmbiguousImport { .. } => "DCL-E001",
            ErrorReason::UnresolvedReference { .. } => "DCL-E002",
            ErrorReason::NonReadableProperty { .. } => "DCL-E003",
            ErrorReason::ReadOnlyPropertyAssignment { .. } => "DCL-E004",
            ErrorReason::UnresolvedFunctionCallArguments { .. } => "DCL-E005",
            ErrorReason::UnresolvedFunctionCallReceiver { .. } => "DCL-E006",
            ErrorReason::UnresolvedFunctionCallSignature { .. } => "DCL-E007",
            ErrorReason::AmbiguousFunctions { .. } => "DCL-E008",
            ErrorReason::ValReassignment { .. } => "DCL-E009",
            ErrorReason::ExternalReassignment { .. } => "DCL-E010",
            ErrorReason::AssignmentTypeMismatch { .. } => "DCL-E011",
            ErrorReason::UnusedConfigureLambda => "DCL-E012",
            ErrorReason::MissingConfigureLambda => "DCL-E013",
            ErrorReason::AccessOnCurrentReceiverOnlyViolation { .. } => "DCL-E014",
            ErrorReason::DuplicateLocalValue { .. } => "DCL-E015",
            ErrorReason::UnresolvedAssignmentLhs => "DCL-E016",
            ErrorReason::UnresolvedAssignmentRhs => "DCL-E017",
            ErrorReason::UnitAssignment => "DCL-E018",
            ErrorReason::DanglingPureExpression => "DCL-E019",
        }
    }

    pub fn message(&self) -> String {
        match self {
            ErrorReason::AmbiguousImport { fq_name } => {
                format!("import '{}' conflicts with another import of the same name", fq_name)
            }
            ErrorReason::UnresolvedReference { reference } => {
                format!("unresolved reference '{}'", reference)
            }
            ErrorReason::NonReadableProperty { property } => {
                format!("property '{}' is write-only", property.name)
            }
            ErrorReason::ReadOnlyPropertyAssignment { property } => {
                format!("property '{}' is read-only", property.name)
            }
            ErrorReason::UnresolvedFunctionCallArguments { function } => {
                format!("arguments of '{}' could not be resolved", function)
            }
            ErrorReason::UnresolvedFunctionCallReceiver { function } => {
                format!("receiver of '{}' could not be resolved", function)
            }
            ErrorReason::UnresolvedFunctionCallSignature { function } => {
                format!("no function '{}' matches the given arguments", function)
            }
            ErrorReason::AmbiguousFunctions { functions } => {
                let names: Vec<String> = functions
                    .iter()
                    .map(|f| describe_function(&f.function))
                    .collect();
                format!("ambiguous call, candidates: {}", names.join(", "))
            }
            ErrorReason::ValReassignment { name } => {
                format!("local value '{}' cannot be reassigned", name)
            }
            ErrorReason::ExternalReassignment { external } => {
                format!("external object '{}' cannot be modified", external)
            }
            ErrorReason::AssignmentTypeMismatch { expected, actual } => {
                format!("type mismatch: expected {}, found {}", expected, actual)
            }
            ErrorReason::UnusedConfigureLambda => "configuring block is not used".to_string(),
            ErrorReason::MissingConfigureLambda => "configuring block is required".to_string(),
            ErrorReason::AccessOnCurrentReceiverOnlyViolation { name } => format!(
                "'{}' can only be accessed on the current receiver",
                name
            ),
            ErrorReason::DuplicateLocalValue { name } => {
                format!("local value '{}' is already defined in this scope", name)
            }
            ErrorReason::UnresolvedAssignmentLhs => {
                "assignment target could not be resolved".to_string()
            }
            ErrorReason::UnresolvedAssignmentRhs => {
                "assigned value could not be resolved".to_string()
            }
            ErrorReason::UnitAssignment => "a Unit value cannot be assigned".to_string(),
            ErrorReason::DanglingPureExpression => {
                "expression result is unused and has no effect".to_string()
            }
        }
    }
}

fn describe_function(function: &SchemaFunction) -> String {
    let params: Vec<String> = function
        .parameters()
        .iter()
        .map(|p| match &p.name {
            Some(name) => format!("{}: {}", name, p.data_type),
            None => p.data_type.to_string(),
        })
        .collect();
    let owner = match function {
        SchemaFunction::Member(f) => format!("{}.", f.receiver()),
        SchemaFunction::TopLevel(f) if !f.package_name.is_empty() => {
            format!("{}.", f.package_name)
        }
        SchemaFunction::TopLevel(_) => String::new(),
        SchemaFunction::Constructor(c) if !c.data_class.package_name.is_empty() => {
            format!("{}.", c.data_class.package_name)
        }
        SchemaFunction::Constructor(_) => String::new(),
    };
    format!("{}{}({})", owner, function.simple_name(), params.join(", "))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionError {
    pub element: LanguageTreeElement,
    pub reason: ErrorReason,
}

impl ResolutionError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.reason.code(), self.element.loc(), self.reason.message())
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    #[serde(rename = "topLevelReceiver")]
    pub top_level_receiver: ObjectOrigin,
    /// Every access-and-configure call, in program order, whether or not its
    /// block has content.
    #[serde(default, rename = "configureInvocations")]
    pub configure_invocations: Vec<ObjectOrigin>,
    pub assignments: Vec<AssignmentRecord>,
    pub additions: Vec<DataAddition>,
    pub errors: Vec<ResolutionError>,
}

impl ResolutionResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.errors.iter().map(ResolutionError::to_diagnostic).collect()
    }
}
