//! Runtime mapping: replay a [`ResolutionResult`] against live host objects.

use std::any::Any;
use std::cell::{RefCell, RefMut};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::language::Literal;
use crate::resolution::*;
use crate::schema::*;

// ---------------------------------------------------------------------------
// Host values
// ---------------------------------------------------------------------------

pub type ObjectRef = Rc<RefCell<dyn HostObject>>;

#[derive(Clone)]
pub enum RuntimeValue {
    Int(i32),
    Long(i64),
    String(String),
    Boolean(bool),
    Null,
    Unit,
    Object(ObjectRef),
}

impl RuntimeValue {
    pub fn from_literal(literal: &Literal) -> Self {
        match literal {
            Literal::Int(v) => RuntimeValue::Int(*v),
            Literal::Long(v) => RuntimeValue::Long(*v),
            Literal::String(v) => RuntimeValue::String(v.clone()),
            Literal::Boolean(v) => RuntimeValue::Boolean(*v),
        }
    }

    pub fn object(object: impl HostObject + 'static) -> Self {
        RuntimeValue::Object(Rc::new(RefCell::new(object)))
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            RuntimeValue::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RuntimeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            RuntimeValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl PartialEq for RuntimeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RuntimeValue::Int(a), RuntimeValue::Int(b)) => a == b,
            (RuntimeValue::Long(a), RuntimeValue::Long(b)) => a == b,
            (RuntimeValue::String(a), RuntimeValue::String(b)) => a == b,
            (RuntimeValue::Boolean(a), RuntimeValue::Boolean(b)) => a == b,
            (RuntimeValue::Null, RuntimeValue::Null) | (RuntimeValue::Unit, RuntimeValue::Unit) => {
                true
            }
            (RuntimeValue::Object(a), RuntimeValue::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for RuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeValue::Int(v) => write!(f, "{v}"),
            RuntimeValue::Long(v) => write!(f, "{v}L"),
            RuntimeValue::String(v) => write!(f, "{v:?}"),
            RuntimeValue::Boolean(v) => write!(f, "{v}"),
            RuntimeValue::Null => f.write_str("null"),
            RuntimeValue::Unit => f.write_str("Unit"),
            RuntimeValue::Object(object) => match object.try_borrow() {
                Ok(object) => write!(f, "<{}>", object.type_name()),
                Err(_) => f.write_str("<borrowed>"),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Option<String>,
    pub value: RuntimeValue,
}

/// A live object the mapper can read, write and call.
pub trait HostObject {
    fn type_name(&self) -> &str;

    fn get_property(&self, name: &str) -> Option<RuntimeValue>;

    fn set_property(&mut self, name: &str, value: RuntimeValue) -> Result<(), String>;

    /// Call a member function. Configuring functions hand the configured
    /// object to `configure`.
    fn invoke(
        &mut self,
        function: &str,
        args: &[Argument],
        configure: Option<&mut dyn FnMut(RuntimeValue)>,
    ) -> Result<RuntimeValue, String>;

    fn as_any(&self) -> &dyn Any;
}

impl fmt::Debug for dyn HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.type_name())
    }
}

// ---------------------------------------------------------------------------
// DynamicObject
// ---------------------------------------------------------------------------

type FactoryFn = Box<dyn Fn(&[Argument]) -> Result<RuntimeValue, String>>;

/// A general purpose [`HostObject`] backed by maps, for embedding and tests.
///
/// * properties are plain values;
/// * children are handed to the configuring block of the same-named function;
/// * containers create a new element per call and keep it;
/// * builders store their single argument in the same-named property;
/// * functions compute a value from their arguments.
#[derive(Default)]
pub struct DynamicObject {
    type_name: String,
    properties: BTreeMap<String, RuntimeValue>,
    children: HashMap<String, ObjectRef>,
    containers: HashMap<String, String>,
    elements: BTreeMap<String, Vec<ObjectRef>>,
    builders: Vec<String>,
    functions: HashMap<String, FactoryFn>,
}

impl DynamicObject {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_property(mut self, name: &str, value: RuntimeValue) -> Self {
        self.properties.insert(name.to_string(), value);
        self
    }

    pub fn with_child(mut self, name: &str, child: ObjectRef) -> Self {
        self.children.insert(name.to_string(), child);
        self
    }

    pub fn with_container(mut self, name: &str, element_type: &str) -> Self {
        self.containers
            .insert(name.to_string(), element_type.to_string());
        self
    }

    pub fn with_builder(mut self, name: &str) -> Self {
        self.builders.push(name.to_string());
        self
    }

    pub fn with_function(
        mut self,
        name: &str,
        function: impl Fn(&[Argument]) -> Result<RuntimeValue, String> + 'static,
    ) -> Self {
        self.functions.insert(name.to_string(), Box::new(function));
        self
    }

    pub fn into_ref(self) -> ObjectRef {
        Rc::new(RefCell::new(self))
    }

    pub fn elements(&self, container: &str) -> &[ObjectRef] {
        self.elements
            .get(container)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl HostObject for DynamicObject {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn get_property(&self, name: &str) -> Option<RuntimeValue> {
        self.properties
            .get(name)
            .cloned()
            .or_else(|| self.children.get(name).cloned().map(RuntimeValue::Object))
    }

    fn set_property(&mut self, name: &str, value: RuntimeValue) -> Result<(), String> {
        self.properties.insert(name.to_string(), value);
        Ok(())
    }

    fn invoke(
        &mut self,
        function: &str,
        args: &[Argument],
        configure: Option<&mut dyn FnMut(RuntimeValue)>,
    ) -> Result<RuntimeValue, String> {
        if let Some(child) = self.children.get(function) {
            let child = RuntimeValue::Object(child.clone());
            if let Some(configure) = configure {
                configure(child.clone());
            }
            return Ok(child);
        }
        if let Some(element_type) = self.containers.get(function) {
            let mut element = DynamicObject::new(element_type);
            for arg in args {
                let key = arg.name.clone().unwrap_or_else(|| "name".to_string());
                element.properties.insert(key, arg.value.clone());
            }
            let element = element.into_ref();
            self.elements
                .entry(function.to_string())
                .or_default()
                .push(element.clone());
            let element = RuntimeValue::Object(element);
            if let Some(configure) = configure {
                configure(element.clone());
            }
            return Ok(element);
        }
        if self.builders.iter().any(|b| b == function) {
            let [arg] = args else {
                return Err(format!("builder '{}' takes exactly one argument", function));
            };
            self.properties.insert(function.to_string(), arg.value.clone());
            return Ok(RuntimeValue::Unit);
        }
        match self.functions.get(function) {
            Some(f) => f(args),
            None => Err(format!(
                "{} has no function '{}'",
                self.type_name, function
            )),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Runtime collaborators
// ---------------------------------------------------------------------------

/// Resolves custom accessor identifiers to live objects.
///
/// `None` means the identifier is unknown to this provider.
pub trait RuntimeCustomAccessors {
    fn object_from_custom_accessor(
        &self,
        receiver: &ObjectRef,
        accessor: &CustomAccessor,
    ) -> Option<ObjectRef>;
}

impl<T: RuntimeCustomAccessors + ?Sized> RuntimeCustomAccessors for &T {
    fn object_from_custom_accessor(
        &self,
        receiver: &ObjectRef,
        accessor: &CustomAccessor,
    ) -> Option<ObjectRef> {
        (**self).object_from_custom_accessor(receiver, accessor)
    }
}

impl<T: RuntimeCustomAccessors + ?Sized> RuntimeCustomAccessors for Box<T> {
    fn object_from_custom_accessor(
        &self,
        receiver: &ObjectRef,
        accessor: &CustomAccessor,
    ) -> Option<ObjectRef> {
        (**self).object_from_custom_accessor(receiver, accessor)
    }
}

/// Asks each provider in order; the first answer wins.
#[derive(Default)]
pub struct CompositeCustomAccessors<'a> {
    providers: Vec<Box<dyn RuntimeCustomAccessors + 'a>>,
}

impl<'a> CompositeCustomAccessors<'a> {
    pub fn new(providers: Vec<Box<dyn RuntimeCustomAccessors + 'a>>) -> Self {
        Self { providers }
    }

    pub fn push(&mut self, provider: impl RuntimeCustomAccessors + 'a) {
        self.providers.push(Box::new(provider));
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl RuntimeCustomAccessors for CompositeCustomAccessors<'_> {
    fn object_from_custom_accessor(
        &self,
        receiver: &ObjectRef,
        accessor: &CustomAccessor,
    ) -> Option<ObjectRef> {
        self.providers
            .iter()
            .find_map(|p| p.object_from_custom_accessor(receiver, accessor))
    }
}

/// Host implementations of schema top-level functions and constructors.
pub trait RuntimeTopLevelFunctions {
    fn invoke(
        &self,
        function: &DataTopLevelFunction,
        args: &[Argument],
    ) -> Result<RuntimeValue, String>;

    fn construct(&self, constructor: &DataConstructor, args: &[Argument]) -> Result<RuntimeValue, String> {
        let _ = args;
        Err(format!("no constructor for {}", constructor.data_class))
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MappingError {
    #[error("cannot map a resolution result with {count} errors")]
    ResolutionHasErrors { count: usize },
    #[error("root object has type '{actual}', expected '{expected}'")]
    RootTypeMismatch { expected: String, actual: String },
    #[error("custom accessor '{identifier}' is not available at runtime")]
    CustomAccessorNotResolved { identifier: String },
    #[error("external object '{name}' was not provided")]
    MissingExternalObject { name: String },
    #[error("no runtime top-level functions were provided to call '{function}'")]
    MissingTopLevelFunctions { function: String },
    #[error("property '{property}' not found on '{type_name}'")]
    PropertyNotFound { type_name: String, property: String },
    #[error("'{function}' did not pass an object to its configuring block")]
    ConfigureLambdaNotInvoked { function: String },
    #[error("{what} is not an object")]
    NotAnObject { what: String },
    #[error("host error: {0}")]
    Host(String),
}

// ---------------------------------------------------------------------------
// Mapper
// ---------------------------------------------------------------------------

pub struct RuntimeMapper<'a> {
    schema: &'a AnalysisSchema,
    custom_accessors: CompositeCustomAccessors<'a>,
    external_objects: HashMap<String, RuntimeValue>,
    top_level_functions: Option<Box<dyn RuntimeTopLevelFunctions + 'a>>,
}

impl<'a> RuntimeMapper<'a> {
    pub fn new(schema: &'a AnalysisSchema) -> Self {
        Self {
            schema,
            custom_accessors: CompositeCustomAccessors::default(),
            external_objects: HashMap::new(),
            top_level_functions: None,
        }
    }

    pub fn with_custom_accessors(mut self, accessors: impl RuntimeCustomAccessors + 'a) -> Self {
        self.custom_accessors.push(accessors);
        self
    }

    pub fn with_external_object(mut self, name: FqName, value: RuntimeValue) -> Self {
        self.external_objects.insert(name.qualified_name(), value);
        self
    }

    pub fn with_top_level_functions(
        mut self,
        functions: impl RuntimeTopLevelFunctions + 'a,
    ) -> Self {
        self.top_level_functions = Some(Box::new(functions));
        self
    }

    /// Apply all configuring calls, assignments and additions of `result` to
    /// `root`, in program order. Each function invocation happens at most once.
    pub fn map(&self, result: &ResolutionResult, root: ObjectRef) -> Result<ObjectRef, MappingError> {
        if result.has_errors() {
            return Err(MappingError::ResolutionHasErrors {
                count: result.errors.len(),
            });
        }
        self.check_root_type(&root)?;

        enum Step<'r> {
            Configure(&'r ObjectOrigin),
            Assign(&'r AssignmentRecord),
            Add(&'r DataAddition),
        }
        let mut steps: Vec<(u64, Step<'_>)> = result
            .configure_invocations
            .iter()
            .map(|c| (c.invocation_id().unwrap_or(0), Step::Configure(c)))
            .chain(
                result
                    .assignments
                    .iter()
                    .map(|a| (a.assignment_order, Step::Assign(a))),
            )
            .chain(
                result
                    .additions
                    .iter()
                    .map(|a| (a.data_object.invocation_id().unwrap_or(0), Step::Add(a))),
            )
            .collect();
        steps.sort_by_key(|(order, _)| *order);

        let mut replay = Replay {
            mapper: self,
            root: root.clone(),
            invocations: HashMap::new(),
        };
        for (_, step) in steps {
            match step {
                Step::Configure(origin) => {
                    replay.eval(origin)?;
                }
                Step::Assign(record) => replay.assign(record)?,
                Step::Add(addition) => {
                    replay.eval(&addition.data_object)?;
                }
            }
        }
        log::debug!(
            "mapped {} assignments and {} additions with {} invocations",
            result.assignments.len(),
            result.additions.len(),
            replay.invocations.len()
        );
        Ok(root)
    }

    fn check_root_type(&self, root: &ObjectRef) -> Result<(), MappingError> {
        let expected = &self.schema.top_level_receiver_type;
        let root = root
            .try_borrow()
            .map_err(|_| MappingError::Host("root object is already borrowed".to_string()))?;
        let actual = root.type_name();
        if actual == expected.simple_name || actual == expected.qualified_name() {
            Ok(())
        } else {
            Err(MappingError::RootTypeMismatch {
                expected: expected.qualified_name(),
                actual: actual.to_string(),
            })
        }
    }
}

struct Replay<'m, 'a> {
    mapper: &'m RuntimeMapper<'a>,
    root: ObjectRef,
    invocations: HashMap<u64, RuntimeValue>,
}

fn borrow_mut(object: &ObjectRef) -> Result<RefMut<'_, dyn HostObject + 'static>, MappingError> {
    object
        .try_borrow_mut()
        .map_err(|_| MappingError::Host("object is already borrowed".to_string()))
}

impl Replay<'_, '_> {
    fn assign(&mut self, record: &AssignmentRecord) -> Result<(), MappingError> {
        let receiver = self.eval_object(&record.lhs.receiver_object)?;
        let value = self.eval(&record.rhs)?;
        let mut receiver = borrow_mut(&receiver)?;
        match &record.method {
            AssignmentMethod::Property => receiver
                .set_property(&record.lhs.property.name, value)
                .map_err(MappingError::Host),
            AssignmentMethod::Builder { function_name } => receiver
                .invoke(function_name, &[Argument { name: None, value }], None)
                .map(|_| ())
                .map_err(MappingError::Host),
        }
    }

    fn eval_object(&mut self, origin: &ObjectOrigin) -> Result<ObjectRef, MappingError> {
        match self.eval(origin)? {
            RuntimeValue::Object(object) => Ok(object),
            other => Err(MappingError::NotAnObject {
                what: format!("{:?} (from {})", other, origin.data_type()),
            }),
        }
    }

    fn eval_binding(&mut self, binding: &ParameterValueBinding) -> Result<Vec<Argument>, MappingError> {
        binding
            .bindings
            .iter()
            .map(|b| {
                Ok(Argument {
                    name: b.parameter.name.clone(),
                    value: self.eval(&b.value)?,
                })
            })
            .collect()
    }

    fn eval(&mut self, origin: &ObjectOrigin) -> Result<RuntimeValue, MappingError> {
        if let Some(id) = origin.invocation_id() {
            if let Some(value) = self.invocations.get(&id) {
                return Ok(value.clone());
            }
        }

        let value = match origin {
            ObjectOrigin::TopLevelReceiver { .. } => RuntimeValue::Object(self.root.clone()),
            ObjectOrigin::ConstantOrigin { literal, .. } => RuntimeValue::from_literal(literal),
            ObjectOrigin::NullObject { .. } => RuntimeValue::Null,
            ObjectOrigin::External { key, .. } => self
                .mapper
                .external_objects
                .get(&key.qualified_name())
                .cloned()
                .ok_or_else(|| MappingError::MissingExternalObject {
                    name: key.qualified_name(),
                })?,
            ObjectOrigin::FromLocalValue { assigned, .. } => self.eval(assigned)?,
            ObjectOrigin::ImplicitThisReceiver { resolved_to, .. } => self.eval(resolved_to)?,
            ObjectOrigin::AddAndConfigureReceiver { receiver }
            | ObjectOrigin::BuilderReturnedReceiver { receiver, .. } => self.eval(receiver)?,
            ObjectOrigin::PropertyReference {
                receiver, property, ..
            } => {
                let object = self.eval_object(receiver)?;
                read_property(&object, &property.name)?
            }
            ObjectOrigin::NewObjectFromMemberFunction {
                function,
                receiver,
                binding,
                ..
            } => {
                let semantics = function.semantics();
                match semantics.as_ref() {
                    FunctionSemantics::AccessAndConfigure { accessor, .. } => {
                        self.access(receiver, function, binding, accessor)?;
                        RuntimeValue::Unit
                    }
                    _ => {
                        let object = self.eval_object(receiver)?;
                        let args = self.eval_binding(binding)?;
                        let mut object = borrow_mut(&object)?;
                        object
                            .invoke(function.simple_name(), &args, None)
                            .map_err(MappingError::Host)?
                    }
                }
            }
            ObjectOrigin::ConfigureReceiver {
                receiver,
                function,
                binding,
                accessor,
                ..
            } => self.access(receiver, function, binding, accessor)?,
            ObjectOrigin::NewObjectFromTopLevelFunction {
                function, binding, ..
            } => {
                let args = self.eval_binding(binding)?;
                let functions = self.top_level_functions(&function.simple_name)?;
                functions
                    .invoke(function, &args)
                    .map_err(MappingError::Host)?
            }
            ObjectOrigin::NewObjectFromConstructor {
                constructor,
                binding,
                ..
            } => {
                let args = self.eval_binding(binding)?;
                let functions = self.top_level_functions(&constructor.data_class.simple_name)?;
                functions
                    .construct(constructor, &args)
                    .map_err(MappingError::Host)?
            }
        };

        if let Some(id) = origin.invocation_id() {
            self.invocations.insert(id, value.clone());
        }
        Ok(value)
    }

    fn top_level_functions(
        &self,
        function: &str,
    ) -> Result<&dyn RuntimeTopLevelFunctions, MappingError> {
        self.mapper
            .top_level_functions
            .as_deref()
            .ok_or_else(|| MappingError::MissingTopLevelFunctions {
                function: function.to_string(),
            })
    }

    /// Obtain the object an access-and-configure function configures.
    fn access(
        &mut self,
        receiver: &ObjectOrigin,
        function: &SchemaMemberFunction,
        binding: &ParameterValueBinding,
        accessor: &ConfigureAccessor,
    ) -> Result<RuntimeValue, MappingError> {
        let object = self.eval_object(receiver)?;
        match accessor {
            ConfigureAccessor::Property(property) => read_property(&object, &property.name),
            ConfigureAccessor::ConfiguringLambdaArgument(_) => {
                let args = self.eval_binding(binding)?;
                let mut captured: Option<RuntimeValue> = None;
                let mut capture = |value: RuntimeValue| captured = Some(value);
                borrow_mut(&object)?
                    .invoke(function.simple_name(), &args, Some(&mut capture))
                    .map_err(MappingError::Host)?;
                captured.ok_or_else(|| MappingError::ConfigureLambdaNotInvoked {
                    function: function.simple_name().to_string(),
                })
            }
            ConfigureAccessor::Custom(custom) => self
                .mapper
                .custom_accessors
                .object_from_custom_accessor(&object, custom)
                .map(RuntimeValue::Object)
                .ok_or_else(|| {
                    log::warn!("custom accessor '{}' is not available", custom.identifier);
                    MappingError::CustomAccessorNotResolved {
                        identifier: custom.identifier.clone(),
                    }
                }),
        }
    }
}

fn read_property(object: &ObjectRef, name: &str) -> Result<RuntimeValue, MappingError> {
    let object = object
        .try_borrow()
        .map_err(|_| MappingError::Host("object is already borrowed".to_string()))?;
    object
        .get_property(name)
        .ok_or_else(|| MappingError::PropertyNotFound {
            type_name: object.type_name().to_string(),
            property: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_string;
    use crate::resolver::resolve;
    use pretty_assertions::assert_eq;

    fn member(name: &str, parameters: Vec<DataParameter>, semantics: FunctionSemantics) -> SchemaMemberFunction {
        SchemaMemberFunction::Member(DataMemberFunction {
            receiver: DataType::class("m.Root"),
            simple_name: name.to_string(),
            parameters,
            is_direct_access_only: false,
            semantics,
        })
    }

    fn schema() -> AnalysisSchema {
        let nested_property = DataProperty::new("nested", DataType::class("m.Nested")).read_only();
        let mut root = DataClass::new(FqName::parse("m.Root"));
        root.properties = vec![
            DataProperty::new("name", DataType::String),
            DataProperty::new("count", DataType::Int),
            nested_property.clone(),
        ];
        root.member_functions = vec![
            member(
                "nested",
                vec![],
                FunctionSemantics::AccessAndConfigure {
                    accessor: ConfigureAccessor::Property(nested_property),
                    return_type: AccessAndConfigureReturnType::Unit,
                },
            ),
            member(
                "lambda",
                vec![],
                FunctionSemantics::AccessAndConfigure {
                    accessor: ConfigureAccessor::ConfiguringLambdaArgument(DataType::class(
                        "m.Nested",
                    )),
                    return_type: AccessAndConfigureReturnType::Unit,
                },
            ),
            member(
                "hidden",
                vec![],
                FunctionSemantics::AccessAndConfigure {
                    accessor: ConfigureAccessor::Custom(CustomAccessor {
                        object_type: DataType::class("m.Nested"),
                        identifier: "custom:hidden".into(),
                    }),
                    return_type: AccessAndConfigureReturnType::Unit,
                },
            ),
            member(
                "item",
                vec![DataParameter::new("name", DataType::String).identity_key()],
                FunctionSemantics::AddAndConfigure {
                    object_type: DataType::class("m.Nested"),
                    block: ConfigureBlockRequirement::Optional,
                },
            ),
            member(
                "upper",
                vec![DataParameter::new("s", DataType::String)],
                FunctionSemantics::Pure {
                    return_type: DataType::String,
                },
            ),
            SchemaMemberFunction::Builder(DataBuilderFunction {
                receiver: DataType::class("m.Root"),
                simple_name: "version".into(),
                is_direct_access_only: false,
                parameter: DataParameter::new("value", DataType::String),
            }),
        ];
        let mut nested = DataClass::new(FqName::parse("m.Nested"));
        nested.properties = vec![DataProperty::new("x", DataType::Int)];
        AnalysisSchema::new(root).with_class(nested)
    }

    fn root_object(nested: ObjectRef) -> ObjectRef {
        DynamicObject::new("Root")
            .with_child("nested", nested.clone())
            .with_child("lambda", nested)
            .with_container("item", "Nested")
            .with_builder("version")
            .with_function("upper", |args| {
                let s = args[0].value.as_str().unwrap_or_default();
                Ok(RuntimeValue::String(s.to_uppercase()))
            })
            .into_ref()
    }

    fn property(object: &ObjectRef, name: &str) -> Option<RuntimeValue> {
        object.borrow().get_property(name)
    }

    struct HiddenAccessor(ObjectRef);

    impl RuntimeCustomAccessors for HiddenAccessor {
        fn object_from_custom_accessor(
            &self,
            _receiver: &ObjectRef,
            accessor: &CustomAccessor,
        ) -> Option<ObjectRef> {
            (accessor.identifier == "custom:hidden").then(|| self.0.clone())
        }
    }

    #[test]
    fn maps_properties_blocks_and_builders() {
        let schema = schema();
        let result = resolve(
            &schema,
            &parse_string(
                "name = upper(\"demo\")\ncount = 2\nnested {\n  x = 5\n}\nlambda {\n  x = 6\n}\nversion(\"1.0\")",
                "m.dcl",
            ),
        );
        assert!(result.errors.is_empty(), "{:?}", result.diagnostics());

        let nested = DynamicObject::new("Nested").into_ref();
        let root = RuntimeMapper::new(&schema)
            .map(&result, root_object(nested.clone()))
            .expect("mapping succeeds");

        assert_eq!(property(&root, "name"), Some(RuntimeValue::String("DEMO".into())));
        assert_eq!(property(&root, "count"), Some(RuntimeValue::Int(2)));
        assert_eq!(property(&nested, "x"), Some(RuntimeValue::Int(6)));
        assert_eq!(property(&root, "version"), Some(RuntimeValue::String("1.0".into())));
    }

    #[test]
    fn additions_create_elements_once() {
        let schema = schema();
        let result = resolve(
            &schema,
            &parse_string("item(\"a\") {\n  x = 1\n}\nitem(\"b\")", "m.dcl"),
        );
        let root = RuntimeMapper::new(&schema)
            .map(&result, root_object(DynamicObject::new("Nested").into_ref()))
            .expect("mapping succeeds");

        let root = root.borrow();
        let root = root
            .as_any()
            .downcast_ref::<DynamicObject>()
            .expect("dynamic root");
        let items = root.elements("item");
        assert_eq!(items.len(), 2);
        assert_eq!(property(&items[0], "x"), Some(RuntimeValue::Int(1)));
        assert_eq!(property(&items[0], "name"), Some(RuntimeValue::String("a".into())));
        assert_eq!(property(&items[1], "name"), Some(RuntimeValue::String("b".into())));
    }

    #[test]
    fn custom_accessor_is_identity_preserving() {
        let schema = schema();
        let result = resolve(&schema, &parse_string("hidden {\n  x = 123\n}", "m.dcl"));
        let hidden = DynamicObject::new("Nested").into_ref();
        RuntimeMapper::new(&schema)
            .with_custom_accessors(HiddenAccessor(hidden.clone()))
            .map(&result, root_object(DynamicObject::new("Nested").into_ref()))
            .expect("mapping succeeds");
        assert_eq!(property(&hidden, "x"), Some(RuntimeValue::Int(123)));
    }

    #[test]
    fn missing_custom_accessor_fails() {
        let schema = schema();
        let result = resolve(&schema, &parse_string("hidden {\n  x = 123\n}", "m.dcl"));
        let error = RuntimeMapper::new(&schema)
            .map(&result, root_object(DynamicObject::new("Nested").into_ref()))
            .unwrap_err();
        assert_eq!(
            error,
            MappingError::CustomAccessorNotResolved {
                identifier: "custom:hidden".into()
            }
        );
    }

    #[test]
    fn empty_custom_accessor_block_still_needs_the_accessor() {
        let schema = schema();
        let result = resolve(&schema, &parse_string("hidden { }", "m.dcl"));
        assert!(result.errors.is_empty(), "{:?}", result.diagnostics());
        assert_eq!(result.configure_invocations.len(), 1);

        let error = RuntimeMapper::new(&schema)
            .map(&result, root_object(DynamicObject::new("Nested").into_ref()))
            .unwrap_err();
        assert_eq!(
            error,
            MappingError::CustomAccessorNotResolved {
                identifier: "custom:hidden".into()
            }
        );
    }

    #[test]
    fn empty_configuring_blocks_are_invoked_once() {
        struct Counting(std::cell::Cell<usize>, ObjectRef);

        impl RuntimeCustomAccessors for Counting {
            fn object_from_custom_accessor(
                &self,
                _receiver: &ObjectRef,
                _accessor: &CustomAccessor,
            ) -> Option<ObjectRef> {
                self.0.set(self.0.get() + 1);
                Some(self.1.clone())
            }
        }

        let schema = schema();
        let result = resolve(
            &schema,
            &parse_string("hidden { }
hidden {
  x = 1
}", "m.dcl"),
        );
        let accessor = Counting(Default::default(), DynamicObject::new("Nested").into_ref());
        RuntimeMapper::new(&schema)
            .with_custom_accessors(&accessor)
            .map(&result, root_object(DynamicObject::new("Nested").into_ref()))
            .expect("mapping succeeds");
        assert_eq!(accessor.0.get(), 2);
        assert_eq!(property(&accessor.1, "x"), Some(RuntimeValue::Int(1)));
    }

    #[test]
    fn refuses_results_with_errors_and_wrong_root() {
        let schema = schema();
        let bad = resolve(&schema, &parse_string("missing = 1", "m.dcl"));
        let error = RuntimeMapper::new(&schema)
            .map(&bad, root_object(DynamicObject::new("Nested").into_ref()))
            .unwrap_err();
        assert_eq!(error, MappingError::ResolutionHasErrors { count: 1 });

        let good = resolve(&schema, &parse_string("count = 1", "m.dcl"));
        let error = RuntimeMapper::new(&schema)
            .map(&good, DynamicObject::new("Other").into_ref())
            .unwrap_err();
        assert!(matches!(error, MappingError::RootTypeMismatch { .. }));
    }

    #[test]
    fn runtime_value_equality_is_identity_for_objects() {
        let a = DynamicObject::new("A").into_ref();
        let b = DynamicObject::new("A").into_ref();
        assert_eq!(RuntimeValue::Object(a.clone()), RuntimeValue::Object(a));
        assert_ne!(
            RuntimeValue::Object(b),
            RuntimeValue::Object(DynamicObject::new("A").into_ref())
        );
    }
}
