//! Third-party extensions: named objects registered on an owner at runtime,
//! exposed to documents as direct-access-only configuring functions backed by
//! custom accessors.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::catalogs::{CUSTOM_ACCESSOR_SEPARATOR, RESTRICTED};
use crate::evaluation::EvaluationSchemaComponent;
use crate::mapping::{ObjectRef, RuntimeCustomAccessors};
use crate::schema::*;
use crate::schema_builder::*;

pub type ExtensionProvider = Rc<dyn Fn() -> ObjectRef>;

/// One registered extension as the owner reports it.
#[derive(Clone)]
pub struct ExtensionSchemaElement {
    pub name: String,
    pub public_type: FqName,
    pub provider: ExtensionProvider,
}

/// Something extensions can be registered on.
pub trait ExtensionAware {
    fn extensions(&self) -> Vec<ExtensionSchemaElement>;
}

/// A plain registry of extensions.
#[derive(Clone, Default)]
pub struct ExtensionContainer {
    elements: Vec<ExtensionSchemaElement>,
}

impl ExtensionContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an existing object.
    pub fn add(&mut self, name: &str, public_type: &str, object: ObjectRef) {
        self.add_lazy(name, public_type, move || object.clone());
    }

    /// Register an object created on first access.
    pub fn add_lazy(&mut self, name: &str, public_type: &str, provider: impl Fn() -> ObjectRef + 'static) {
        self.elements.push(ExtensionSchemaElement {
            name: name.to_string(),
            public_type: FqName::parse(public_type),
            provider: Rc::new(provider),
        });
    }
}

impl ExtensionAware for ExtensionContainer {
    fn extensions(&self) -> Vec<ExtensionSchemaElement> {
        self.elements.clone()
    }
}

// ---------------------------------------------------------------------------
// Annotation checker
// ---------------------------------------------------------------------------

/// Answers "does this type, or any of its supertypes, carry the annotation".
///
/// Two caches: one for the annotation on the type itself, one for the
/// answer including supertypes. Cyclic hierarchies terminate.
pub struct CachedHierarchyAnnotationChecker<'r> {
    repository: &'r HostTypeRepository,
    annotation: String,
    direct: RefCell<HashMap<FqName, bool>>,
    transitive: RefCell<HashMap<FqName, bool>>,
    transitive_hits: Cell<usize>,
}

impl<'r> CachedHierarchyAnnotationChecker<'r> {
    pub fn new(repository: &'r HostTypeRepository, annotation: &str) -> Self {
        Self {
            repository,
            annotation: annotation.to_string(),
            direct: RefCell::new(HashMap::new()),
            transitive: RefCell::new(HashMap::new()),
            transitive_hits: Cell::new(0),
        }
    }

    pub fn is_annotated_maybe_in_supertypes(&self, name: &FqName) -> bool {
        if let Some(&cached) = self.transitive.borrow().get(name) {
            self.transitive_hits.set(self.transitive_hits.get() + 1);
            return cached;
        }

        let mut stack = vec![name.clone()];
        let mut visited: BTreeSet<FqName> = BTreeSet::new();
        // supertype -> the subtype it was first reached from
        let mut reached_from: HashMap<FqName, FqName> = HashMap::new();
        let mut found: Option<FqName> = None;
        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            let known = self.transitive.borrow().get(&current).copied();
            match known {
                Some(true) => {
                    self.transitive_hits.set(self.transitive_hits.get() + 1);
                    found = Some(current);
                    break;
                }
                Some(false) => {
                    self.transitive_hits.set(self.transitive_hits.get() + 1);
                    continue;
                }
                None => {}
            }
            if self.has_annotation(&current) {
                found = Some(current);
                break;
            }
            if let Some(class) = self.repository.class(&current) {
                for supertype in class.supertypes.iter().filter(|s| !visited.contains(*s)) {
                    reached_from
                        .entry(supertype.clone())
                        .or_insert_with(|| current.clone());
                    stack.push(supertype.clone());
                }
            }
        }

        let mut transitive = self.transitive.borrow_mut();
        if let Some(annotated) = &found {
            // every type on the path from `name` to the annotated one
            let mut current = annotated;
            transitive.insert(current.clone(), true);
            while let Some(subtype) = reached_from.get(current) {
                transitive.insert(subtype.clone(), true);
                current = subtype;
            }
        } else {
            // nothing reachable carries the annotation
            for visited in visited {
                transitive.insert(visited, false);
            }
        }
        let found = found.is_some();
        log::trace!("{} annotated with {}: {}", name, self.annotation, found);
        found
    }

    /// Whether the type itself carries the annotation.
    pub fn has_annotation(&self, name: &FqName) -> bool {
        if let Some(&cached) = self.direct.borrow().get(name) {
            return cached;
        }
        let result = self
            .repository
            .class(name)
            .is_some_and(|c| c.has_annotation(&self.annotation));
        self.direct.borrow_mut().insert(name.clone(), result);
        result
    }

    pub fn cached_direct(&self, name: &FqName) -> Option<bool> {
        self.direct.borrow().get(name).copied()
    }

    pub fn cached_transitive(&self, name: &FqName) -> Option<bool> {
        self.transitive.borrow().get(name).copied()
    }

    pub fn transitive_cache_hits(&self) -> usize {
        self.transitive_hits.get()
    }
}

// ---------------------------------------------------------------------------
// Extension info
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct ExtensionInfo {
    pub name: String,
    pub object_type: FqName,
    pub accessor_id_prefix: String,
    provider: ExtensionProvider,
}

impl fmt::Debug for ExtensionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionInfo")
            .field("name", &self.name)
            .field("object_type", &self.object_type)
            .field("accessor_id_prefix", &self.accessor_id_prefix)
            .finish_non_exhaustive()
    }
}

impl ExtensionInfo {
    pub fn custom_accessor_id(&self) -> String {
        format!(
            "{}{}{}",
            self.accessor_id_prefix, CUSTOM_ACCESSOR_SEPARATOR, self.name
        )
    }

    /// The configuring function through which documents reach this extension.
    pub fn schema_function(&self, receiver: &FqName) -> SchemaMemberFunction {
        SchemaMemberFunction::Member(DataMemberFunction {
            receiver: DataType::Class(receiver.clone()),
            simple_name: self.name.clone(),
            parameters: Vec::new(),
            is_direct_access_only: true,
            semantics: FunctionSemantics::AccessAndConfigure {
                accessor: ConfigureAccessor::Custom(CustomAccessor {
                    object_type: DataType::Class(self.object_type.clone()),
                    identifier: self.custom_accessor_id(),
                }),
                return_type: AccessAndConfigureReturnType::Unit,
            },
        })
    }
}

/// Extensions of `owner` whose type passes `include`.
pub fn extension_info(
    owner: &dyn ExtensionAware,
    accessor_id_prefix: &str,
    include: impl Fn(&FqName) -> bool,
) -> Vec<ExtensionInfo> {
    owner
        .extensions()
        .into_iter()
        .filter(|e| include(&e.public_type))
        .map(|e| ExtensionInfo {
            name: e.name,
            object_type: e.public_type,
            accessor_id_prefix: accessor_id_prefix.to_string(),
            provider: e.provider,
        })
        .collect()
}

/// Adds one synthetic function per extension to the extended type.
pub struct ExtensionConfiguringFunctions {
    type_to_extend: FqName,
    extensions: Vec<ExtensionInfo>,
}

impl FunctionExtractor for ExtensionConfiguringFunctions {
    fn member_functions(&self, class: &HostClass, _pre_index: &PreIndex) -> Vec<SchemaMemberFunction> {
        if class.name != self.type_to_extend {
            return Vec::new();
        }
        self.extensions
            .iter()
            .map(|e| e.schema_function(&self.type_to_extend))
            .collect()
    }
}

/// Resolves extension accessor ids, invoking each provider at most once.
pub struct RuntimeExtensionAccessors {
    providers: HashMap<String, ExtensionProvider>,
    instances: RefCell<HashMap<String, ObjectRef>>,
}

impl RuntimeExtensionAccessors {
    pub fn new(extensions: &[ExtensionInfo]) -> Self {
        Self {
            providers: extensions
                .iter()
                .map(|e| (e.custom_accessor_id(), e.provider.clone()))
                .collect(),
            instances: RefCell::new(HashMap::new()),
        }
    }
}

impl RuntimeCustomAccessors for RuntimeExtensionAccessors {
    fn object_from_custom_accessor(
        &self,
        _receiver: &ObjectRef,
        accessor: &CustomAccessor,
    ) -> Option<ObjectRef> {
        if let Some(instance) = self.instances.borrow().get(&accessor.identifier) {
            return Some(instance.clone());
        }
        let provider = self.providers.get(&accessor.identifier)?;
        let instance = provider();
        self.instances
            .borrow_mut()
            .insert(accessor.identifier.clone(), instance.clone());
        Some(instance)
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

pub struct ThirdPartyExtensionsComponent {
    schema_type_to_extend: FqName,
    extensions: Vec<ExtensionInfo>,
}

impl ThirdPartyExtensionsComponent {
    /// Collect the extensions of `owner` whose type is `Restricted`, directly
    /// or through a supertype.
    pub fn new(
        schema_type_to_extend: FqName,
        owner: &dyn ExtensionAware,
        accessor_id_prefix: &str,
        repository: &HostTypeRepository,
    ) -> Self {
        let checker = CachedHierarchyAnnotationChecker::new(repository, RESTRICTED);
        let extensions = extension_info(owner, accessor_id_prefix, |t| {
            checker.is_annotated_maybe_in_supertypes(t)
        });
        log::debug!(
            "{} extensions of {} exposed with prefix '{}'",
            extensions.len(),
            schema_type_to_extend,
            accessor_id_prefix
        );
        Self {
            schema_type_to_extend,
            extensions,
        }
    }

    pub fn extensions(&self) -> &[ExtensionInfo] {
        &self.extensions
    }
}

impl EvaluationSchemaComponent for ThirdPartyExtensionsComponent {
    fn type_discovery(&self) -> Vec<Box<dyn TypeDiscovery>> {
        vec![Box::new(FixedTypeDiscovery::new(
            Some(self.schema_type_to_extend.clone()),
            self.extensions.iter().map(|e| e.object_type.clone()).collect(),
        ))]
    }

    fn function_extractors(&self) -> Vec<Box<dyn FunctionExtractor>> {
        vec![Box::new(ExtensionConfiguringFunctions {
            type_to_extend: self.schema_type_to_extend.clone(),
            extensions: self.extensions.clone(),
        })]
    }

    fn runtime_custom_accessors(&self) -> Vec<Box<dyn RuntimeCustomAccessors>> {
        vec![Box::new(RuntimeExtensionAccessors::new(&self.extensions))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::DynamicObject;
    use pretty_assertions::assert_eq;

    fn hierarchy() -> HostTypeRepository {
        HostTypeRepository::new()
            .with_class(HostClass::new("h.A").extending("h.B"))
            .with_class(HostClass::new("h.B").extending("h.C"))
            .with_class(HostClass::new("h.C").annotated(RESTRICTED))
            .with_class(HostClass::new("h.Plain"))
            .with_class(HostClass::new("h.X").extending("h.Y"))
            .with_class(HostClass::new("h.Y").extending("h.X"))
    }

    #[test]
    fn inherited_annotation_is_found_through_supertypes() {
        let repository = hierarchy();
        let checker = CachedHierarchyAnnotationChecker::new(&repository, RESTRICTED);
        let a = FqName::parse("h.A");

        assert!(checker.is_annotated_maybe_in_supertypes(&a));
        assert_eq!(checker.cached_direct(&a), Some(false));
        assert_eq!(checker.cached_transitive(&a), Some(true));

        assert!(checker.is_annotated_maybe_in_supertypes(&a));
        assert_eq!(checker.transitive_cache_hits(), 1);
    }

    #[test]
    fn types_on_the_annotated_path_are_cached() {
        let repository = hierarchy();
        let checker = CachedHierarchyAnnotationChecker::new(&repository, RESTRICTED);
        assert!(checker.is_annotated_maybe_in_supertypes(&FqName::parse("h.A")));

        for name in ["h.A", "h.B", "h.C"] {
            assert_eq!(
                checker.cached_transitive(&FqName::parse(name)),
                Some(true),
                "{name}"
            );
        }
        assert!(checker.is_annotated_maybe_in_supertypes(&FqName::parse("h.B")));
        assert_eq!(checker.transitive_cache_hits(), 1);
        assert_eq!(checker.cached_direct(&FqName::parse("h.B")), Some(false));
    }

    #[test]
    fn cyclic_hierarchy_terminates() {
        let repository = hierarchy();
        let checker = CachedHierarchyAnnotationChecker::new(&repository, RESTRICTED);
        assert!(!checker.is_annotated_maybe_in_supertypes(&FqName::parse("h.X")));
        assert_eq!(checker.cached_transitive(&FqName::parse("h.Y")), Some(false));
        assert!(!checker.is_annotated_maybe_in_supertypes(&FqName::parse("h.Y")));
        assert_eq!(checker.transitive_cache_hits(), 1);
    }

    #[test]
    fn caches_are_per_instance() {
        let repository = hierarchy();
        let first = CachedHierarchyAnnotationChecker::new(&repository, RESTRICTED);
        first.is_annotated_maybe_in_supertypes(&FqName::parse("h.A"));
        let second = CachedHierarchyAnnotationChecker::new(&repository, RESTRICTED);
        assert_eq!(second.cached_transitive(&FqName::parse("h.A")), None);
    }

    #[test]
    fn one_direct_access_function_per_included_extension() {
        let repository = hierarchy();
        let mut owner = ExtensionContainer::new();
        owner.add("foo", "h.A", DynamicObject::new("A").into_ref());
        owner.add("bar", "h.C", DynamicObject::new("C").into_ref());
        owner.add("skipped", "h.Plain", DynamicObject::new("Plain").into_ref());

        let component =
            ThirdPartyExtensionsComponent::new(FqName::parse("h.Root"), &owner, "prefix", &repository);
        let extractors = component.function_extractors();
        let extractor = &extractors[0];
        let functions = extractor.member_functions(&HostClass::new("h.Root"), &PreIndex::default());

        let ids: Vec<(String, bool)> = functions
            .iter()
            .map(|f| {
                let semantics = f.semantics();
                let FunctionSemantics::AccessAndConfigure {
                    accessor: ConfigureAccessor::Custom(custom),
                    ..
                } = semantics.as_ref()
                else {
                    panic!("expected custom accessor, got {:?}", semantics);
                };
                (custom.identifier.clone(), f.is_direct_access_only())
            })
            .collect();
        assert_eq!(
            ids,
            vec![
                ("prefix:foo".to_string(), true),
                ("prefix:bar".to_string(), true)
            ]
        );
        assert!(extractor
            .member_functions(&HostClass::new("h.Other"), &PreIndex::default())
            .is_empty());
    }

    #[test]
    fn providers_are_invoked_lazily_and_once() {
        let calls = Rc::new(Cell::new(0));
        let mut owner = ExtensionContainer::new();
        let counter = calls.clone();
        owner.add_lazy("foo", "h.C", move || {
            counter.set(counter.get() + 1);
            DynamicObject::new("C").into_ref()
        });
        let repository = hierarchy();
        let component =
            ThirdPartyExtensionsComponent::new(FqName::parse("h.Root"), &owner, "p", &repository);
        let accessors = RuntimeExtensionAccessors::new(component.extensions());
        assert_eq!(calls.get(), 0);

        let receiver = DynamicObject::new("Root").into_ref();
        let accessor = CustomAccessor {
            object_type: DataType::class("h.C"),
            identifier: "p:foo".into(),
        };
        let first = accessors.object_from_custom_accessor(&receiver, &accessor);
        let second = accessors.object_from_custom_accessor(&receiver, &accessor);
        assert_eq!(calls.get(), 1);
        assert!(matches!((first, second), (Some(a), Some(b)) if Rc::ptr_eq(&a, &b)));

        let unknown = CustomAccessor {
            object_type: DataType::class("h.C"),
            identifier: "p:nope".into(),
        };
        assert!(accessors.object_from_custom_accessor(&receiver, &unknown).is_none());
    }
}
