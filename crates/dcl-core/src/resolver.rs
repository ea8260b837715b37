use std::collections::{HashMap, HashSet};

use crate::language::*;
use crate::resolution::*;
use crate::schema::*;
use crate::types::SourceLocation;

/// Resolve a language tree against a schema.
///
/// Resolution is fail-soft: every problem is recorded as a [`ResolutionError`]
/// and analysis continues with the next statement, so a single pass reports
/// everything that is wrong with a document.
pub fn resolve(schema: &AnalysisSchema, tree: &LanguageTree) -> ResolutionResult {
    let root = ObjectOrigin::TopLevelReceiver {
        receiver_type: DataType::Class(schema.top_level_receiver_type.clone()),
        loc: tree.top_level_block.loc.clone(),
    };
    let mut ctx = AnalysisContext {
        schema,
        imports: HashMap::new(),
        scopes: Vec::new(),
        next_instant: 0,
        configure_invocations: Vec::new(),
        assignments: Vec::new(),
        additions: Vec::new(),
        errors: Vec::new(),
    };

    ctx.register_imports(&tree.imports);
    ctx.resolve_block(&tree.top_level_block, root.clone());

    log::debug!(
        "resolved document: {} assignments, {} additions, {} errors",
        ctx.assignments.len(),
        ctx.additions.len(),
        ctx.errors.len()
    );

    ResolutionResult {
        top_level_receiver: root,
        configure_invocations: ctx.configure_invocations,
        assignments: ctx.assignments,
        additions: ctx.additions,
        errors: ctx.errors,
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

struct Scope {
    receiver: ObjectOrigin,
    locals: Vec<(String, ObjectOrigin)>,
}

struct AnalysisContext<'s> {
    schema: &'s AnalysisSchema,
    /// Simple name → imported qualified name.
    imports: HashMap<String, FqName>,
    scopes: Vec<Scope>,
    next_instant: u64,
    configure_invocations: Vec<ObjectOrigin>,
    assignments: Vec<AssignmentRecord>,
    additions: Vec<DataAddition>,
    errors: Vec<ResolutionError>,
}

enum NameLookup {
    Local(ObjectOrigin),
    Property {
        scope_index: usize,
        property: DataProperty,
    },
    External(FqName, DataType),
}

struct ResolvedArgument {
    name: Option<String>,
    origin: ObjectOrigin,
}

struct Candidate {
    receiver: Option<ObjectOrigin>,
    function: SchemaFunction,
}

impl<'s> AnalysisContext<'s> {
    fn next_instant(&mut self) -> u64 {
        let instant = self.next_instant;
        self.next_instant += 1;
        instant
    }

    fn error(&mut self, element: LanguageTreeElement, reason: ErrorReason) {
        log::trace!("{}: {}", reason.code(), reason.message());
        self.errors.push(ResolutionError { element, reason });
    }

    // --- Imports ---

    fn register_imports(&mut self, imports: &[Import]) {
        for fq_name in &self.schema.default_imports {
            self.imports
                .entry(fq_name.simple_name.clone())
                .or_insert_with(|| fq_name.clone());
        }

        let mut explicit: HashSet<String> = HashSet::new();
        for import in imports {
            let Some(fq_name) = FqName::from_segments(&import.name) else {
                continue;
            };
            let simple = fq_name.simple_name.clone();
            let conflicts = explicit.contains(&simple)
                && self.imports.get(&simple).is_some_and(|existing| *existing != fq_name);
            if conflicts {
                self.error(
                    LanguageTreeElement::Import(import.clone()),
                    ErrorReason::AmbiguousImport { fq_name },
                );
                continue;
            }
            explicit.insert(simple.clone());
            self.imports.insert(simple, fq_name);
        }
    }

    // --- Scopes ---

    fn resolve_block(&mut self, block: &Block, receiver: ObjectOrigin) {
        self.scopes.push(Scope {
            receiver,
            locals: Vec::new(),
        });
        for statement in &block.statements {
            self.resolve_statement(statement);
        }
        self.scopes.pop();
    }

    fn implicit_receiver(&self, scope_index: usize) -> ObjectOrigin {
        ObjectOrigin::ImplicitThisReceiver {
            resolved_to: Box::new(self.scopes[scope_index].receiver.clone()),
            is_current_scope_receiver: scope_index + 1 == self.scopes.len(),
        }
    }

    fn is_current_receiver(&self, origin: &ObjectOrigin) -> bool {
        if let ObjectOrigin::ImplicitThisReceiver {
            is_current_scope_receiver,
            ..
        } = origin
        {
            return *is_current_scope_receiver;
        }
        self.scopes.last().is_some_and(|s| s.receiver == *origin)
    }

    /// Look a bare name up without reporting anything.
    fn lookup_name(&self, name: &str) -> Option<NameLookup> {
        for scope in self.scopes.iter().rev() {
            if let Some((_, origin)) = scope.locals.iter().rev().find(|(n, _)| n == name) {
                return Some(NameLookup::Local(origin.clone()));
            }
        }
        for (scope_index, scope) in self.scopes.iter().enumerate().rev() {
            let property = self
                .schema
                .class_of(&scope.receiver.data_type())
                .and_then(|class| class.property(name));
            if let Some(property) = property {
                return Some(NameLookup::Property {
                    scope_index,
                    property: property.clone(),
                });
            }
        }
        let fq_name = self.imports.get(name)?;
        let key = self.schema.external_object(fq_name)?;
        Some(NameLookup::External(fq_name.clone(), key.object_type.clone()))
    }

    // --- Statements ---

    fn resolve_statement(&mut self, statement: &DataStatement) {
        match statement {
            DataStatement::Error(_) => {}
            DataStatement::LocalValue(local) => self.resolve_local_value(local, statement),
            DataStatement::Assignment(assignment) => self.resolve_assignment(assignment, statement),
            DataStatement::Expr(expr) => {
                if let Some(origin) = self.resolve_expr(expr) {
                    if is_pure_origin(&origin) {
                        self.error(
                            LanguageTreeElement::Statement(statement.clone()),
                            ErrorReason::DanglingPureExpression,
                        );
                    }
                }
            }
        }
    }

    fn resolve_local_value(&mut self, local: &LocalValue, statement: &DataStatement) {
        let element = || LanguageTreeElement::Statement(statement.clone());
        let duplicate = self
            .scopes
            .last()
            .is_some_and(|s| s.locals.iter().any(|(n, _)| *n == local.name));

        let Some(rhs) = self.resolve_expr(&local.rhs) else {
            self.error(element(), ErrorReason::UnresolvedAssignmentRhs);
            return;
        };
        if duplicate {
            self.error(
                element(),
                ErrorReason::DuplicateLocalValue {
                    name: local.name.clone(),
                },
            );
            return;
        }
        if rhs.data_type() == DataType::Unit {
            self.error(element(), ErrorReason::UnitAssignment);
            return;
        }

        let origin = ObjectOrigin::FromLocalValue {
            name: local.name.clone(),
            assigned: Box::new(rhs),
            loc: local.loc.clone(),
        };
        if let Some(scope) = self.scopes.last_mut() {
            scope.locals.push((local.name.clone(), origin));
        }
    }

    fn resolve_assignment(&mut self, assignment: &Assignment, statement: &DataStatement) {
        let element = || LanguageTreeElement::Statement(statement.clone());
        let target = self.resolve_assignment_target(&assignment.lhs, statement);
        let rhs = self.resolve_expr(&assignment.rhs);

        let Some(rhs) = rhs else {
            self.error(element(), ErrorReason::UnresolvedAssignmentRhs);
            return;
        };
        let Some(target) = target else {
            return;
        };

        let actual = rhs.data_type();
        if actual == DataType::Unit {
            self.error(element(), ErrorReason::UnitAssignment);
            return;
        }
        let expected = target.property.value_type.clone();
        if !self.schema.is_assignable(&expected, &actual) {
            self.error(
                element(),
                ErrorReason::AssignmentTypeMismatch { expected, actual },
            );
            return;
        }

        let assignment_order = self.next_instant();
        self.assignments.push(AssignmentRecord {
            lhs: target,
            rhs,
            assignment_order,
            method: AssignmentMethod::Property,
            loc: assignment.loc.clone(),
        });
    }

    fn resolve_assignment_target(
        &mut self,
        lhs: &PropertyAccess,
        statement: &DataStatement,
    ) -> Option<PropertyReferenceResolution> {
        let element = || LanguageTreeElement::Statement(statement.clone());

        let Some(receiver_expr) = &lhs.receiver else {
            return match self.lookup_name(&lhs.name) {
                Some(NameLookup::Local(_)) => {
                    self.error(
                        element(),
                        ErrorReason::ValReassignment {
                            name: lhs.name.clone(),
                        },
                    );
                    None
                }
                Some(NameLookup::External(external, _)) => {
                    self.error(element(), ErrorReason::ExternalReassignment { external });
                    None
                }
                Some(NameLookup::Property {
                    scope_index,
                    property,
                }) => {
                    let receiver = self.implicit_receiver(scope_index);
                    self.check_writable(receiver, property, statement)
                }
                None => {
                    self.error(element(), ErrorReason::UnresolvedAssignmentLhs);
                    None
                }
            };
        };

        let receiver = match self.qualified_chain(receiver_expr) {
            Some(chain) => match self.resolve_qualified_external(&chain, &receiver_expr.loc) {
                Some(origin) => Some(origin),
                None => {
                    self.error(
                        LanguageTreeElement::Expr((**receiver_expr).clone()),
                        ErrorReason::UnresolvedReference {
                            reference: chain.join("."),
                        },
                    );
                    None
                }
            },
            None => self.resolve_expr(receiver_expr),
        };
        let Some(receiver) = receiver else {
            self.error(element(), ErrorReason::UnresolvedAssignmentLhs);
            return None;
        };
        if let Some(external) = receiver.external_root() {
            self.error(
                element(),
                ErrorReason::ExternalReassignment {
                    external: external.clone(),
                },
            );
            return None;
        }

        let property = self
            .schema
            .class_of(&receiver.data_type())
            .and_then(|class| class.property(&lhs.name))
            .cloned();
        let Some(property) = property else {
            self.error(element(), ErrorReason::UnresolvedAssignmentLhs);
            return None;
        };
        self.check_writable(receiver, property, statement)
    }

    fn check_writable(
        &mut self,
        receiver: ObjectOrigin,
        property: DataProperty,
        statement: &DataStatement,
    ) -> Option<PropertyReferenceResolution> {
        let element = || LanguageTreeElement::Statement(statement.clone());
        if property.is_direct_access_only && !self.is_current_receiver(&receiver) {
            self.error(
                element(),
                ErrorReason::AccessOnCurrentReceiverOnlyViolation {
                    name: property.name.clone(),
                },
            );
            return None;
        }
        if !property.is_writable() {
            self.error(element(), ErrorReason::ReadOnlyPropertyAssignment { property });
            return None;
        }
        Some(PropertyReferenceResolution {
            receiver_object: receiver,
            property,
        })
    }

    // --- Expressions ---

    fn resolve_expr(&mut self, expr: &Expr) -> Option<ObjectOrigin> {
        match &expr.kind {
            ExprKind::Literal(literal) => Some(ObjectOrigin::ConstantOrigin {
                literal: literal.clone(),
                loc: expr.loc.clone(),
            }),
            ExprKind::Null => Some(ObjectOrigin::NullObject {
                loc: expr.loc.clone(),
            }),
            ExprKind::This => self.scopes.last().map(|s| s.receiver.clone()),
            ExprKind::PropertyAccess(access) => self.resolve_property_access(access, expr),
            ExprKind::FunctionCall(call) => self.resolve_call(call, expr),
        }
    }

    /// The name chain of `expr` when its first segment is not bound to anything
    /// in scope, so it can only denote a qualified name.
    fn qualified_chain(&self, expr: &Expr) -> Option<Vec<String>> {
        let ExprKind::PropertyAccess(access) = &expr.kind else {
            return None;
        };
        let chain = access.name_chain()?;
        if chain.len() > 1 && self.lookup_name(&chain[0]).is_none() {
            Some(chain)
        } else {
            None
        }
    }

    /// Resolve `a.b.C.prop` as the external object `a.b.C` followed by
    /// property reads, preferring the longest qualified prefix.
    fn resolve_qualified_external(
        &self,
        chain: &[String],
        loc: &SourceLocation,
    ) -> Option<ObjectOrigin> {
        for split in (2..=chain.len()).rev() {
            let Some(fq_name) = FqName::from_segments(&chain[..split]) else {
                continue;
            };
            let Some(key) = self.schema.external_object(&fq_name) else {
                continue;
            };
            let mut origin = ObjectOrigin::External {
                key: fq_name,
                object_type: key.object_type.clone(),
                loc: loc.clone(),
            };
            for segment in &chain[split..] {
                let property = self
                    .schema
                    .class_of(&origin.data_type())
                    .and_then(|class| class.property(segment))
                    .filter(|p| p.is_readable() && !p.is_direct_access_only)?;
                origin = ObjectOrigin::PropertyReference {
                    receiver: Box::new(origin),
                    property: property.clone(),
                    loc: loc.clone(),
                };
            }
            return Some(origin);
        }
        None
    }

    fn resolve_property_access(
        &mut self,
        access: &PropertyAccess,
        expr: &Expr,
    ) -> Option<ObjectOrigin> {
        let element = || LanguageTreeElement::Expr(expr.clone());

        let Some(receiver_expr) = &access.receiver else {
            return match self.lookup_name(&access.name) {
                Some(NameLookup::Local(origin)) => Some(origin),
                Some(NameLookup::External(key, object_type)) => Some(ObjectOrigin::External {
                    key,
                    object_type,
                    loc: access.loc.clone(),
                }),
                Some(NameLookup::Property {
                    scope_index,
                    property,
                }) => {
                    let receiver = self.implicit_receiver(scope_index);
                    self.read_property(receiver, property, access, expr)
                }
                None => {
                    self.error(
                        element(),
                        ErrorReason::UnresolvedReference {
                            reference: access.name.clone(),
                        },
                    );
                    None
                }
            };
        };

        if let Some(chain) = self.qualified_chain(expr) {
            let origin = self.resolve_qualified_external(&chain, &access.loc);
            if origin.is_none() {
                self.error(
                    element(),
                    ErrorReason::UnresolvedReference {
                        reference: chain.join("."),
                    },
                );
            }
            return origin;
        }

        let receiver = self.resolve_expr(receiver_expr)?;
        let property = self
            .schema
            .class_of(&receiver.data_type())
            .and_then(|class| class.property(&access.name))
            .cloned();
        match property {
            Some(property) => self.read_property(receiver, property, access, expr),
            None => {
                self.error(
                    element(),
                    ErrorReason::UnresolvedReference {
                        reference: access.name.clone(),
                    },
                );
                None
            }
        }
    }

    fn read_property(
        &mut self,
        receiver: ObjectOrigin,
        property: DataProperty,
        access: &PropertyAccess,
        expr: &Expr,
    ) -> Option<ObjectOrigin> {
        let element = || LanguageTreeElement::Expr(expr.clone());
        if property.is_direct_access_only && !self.is_current_receiver(&receiver) {
            self.error(
                element(),
                ErrorReason::AccessOnCurrentReceiverOnlyViolation {
                    name: property.name.clone(),
                },
            );
            return None;
        }
        if !property.is_readable() {
            self.error(element(), ErrorReason::NonReadableProperty { property });
            return None;
        }
        Some(ObjectOrigin::PropertyReference {
            receiver: Box::new(receiver),
            property,
            loc: access.loc.clone(),
        })
    }

    // --- Function calls ---

    fn resolve_call(&mut self, call: &FunctionCall, expr: &Expr) -> Option<ObjectOrigin> {
        let element = || LanguageTreeElement::Expr(expr.clone());

        let mut args = Vec::new();
        let mut args_resolved = true;
        for arg in call.value_args() {
            let (name, arg_expr) = match arg {
                FunctionArgument::Positional(e) => (None, e),
                FunctionArgument::Named { name, expr, .. } => (Some(name.clone()), expr),
                FunctionArgument::Lambda(_) => continue,
            };
            match self.resolve_expr(arg_expr) {
                Some(origin) => args.push(ResolvedArgument { name, origin }),
                None => args_resolved = false,
            }
        }
        if !args_resolved {
            self.error(
                element(),
                ErrorReason::UnresolvedFunctionCallArguments {
                    function: call.name.clone(),
                },
            );
        }

        let levels = self.candidate_levels(call, expr)?;
        if !args_resolved {
            return None;
        }

        let has_block = call.lambda().is_some();
        for level in levels {
            let mut viable: Vec<FunctionResolutionAndBinding> = Vec::new();
            for candidate in level {
                let semantics = candidate.function.semantics();
                let binding = self.bind(
                    candidate.function.parameters(),
                    &args,
                    has_block,
                    &semantics,
                );
                log::trace!(
                    "candidate {}({} params) for call '{}': {}",
                    candidate.function.simple_name(),
                    candidate.function.parameters().len(),
                    call.name,
                    if binding.is_some() { "viable" } else { "rejected" }
                );
                if let Some(binding) = binding {
                    viable.push(FunctionResolutionAndBinding {
                        receiver: candidate.receiver,
                        function: candidate.function,
                        binding,
                    });
                }
            }
            match viable.len() {
                0 => continue,
                1 => {
                    let chosen = viable.remove(0);
                    return self.apply_function(chosen, call, expr);
                }
                _ => {
                    self.error(element(), ErrorReason::AmbiguousFunctions { functions: viable });
                    return None;
                }
            }
        }

        self.error(
            element(),
            ErrorReason::UnresolvedFunctionCallSignature {
                function: call.name.clone(),
            },
        );
        None
    }

    /// Candidate functions grouped by scope level, innermost first.
    fn candidate_levels(&mut self, call: &FunctionCall, expr: &Expr) -> Option<Vec<Vec<Candidate>>> {
        let schema = self.schema;

        if let Some(receiver_expr) = &call.receiver {
            if let Some(mut segments) = self.qualified_chain_or_name(receiver_expr) {
                segments.push(call.name.clone());
                if let Some(fq_name) = FqName::from_segments(&segments) {
                    let qualified = qualified_candidates(schema, &fq_name);
                    if !qualified.is_empty() {
                        return Some(vec![qualified]);
                    }
                }
            }

            let Some(receiver) = self.resolve_expr(receiver_expr) else {
                self.error(
                    LanguageTreeElement::Expr(expr.clone()),
                    ErrorReason::UnresolvedFunctionCallReceiver {
                        function: call.name.clone(),
                    },
                );
                return None;
            };
            let level: Vec<Candidate> = schema
                .class_of(&receiver.data_type())
                .map(|class| {
                    class
                        .functions_named(&call.name)
                        .map(|f| Candidate {
                            receiver: Some(receiver.clone()),
                            function: SchemaFunction::Member(f.clone()),
                        })
                        .collect()
                })
                .unwrap_or_default();
            return Some(vec![level]);
        }

        let mut levels = Vec::new();
        for scope_index in (0..self.scopes.len()).rev() {
            let receiver = self.implicit_receiver(scope_index);
            let Some(class) = schema.class_of(&receiver.data_type()) else {
                continue;
            };
            let level: Vec<Candidate> = class
                .functions_named(&call.name)
                .map(|f| Candidate {
                    receiver: Some(receiver.clone()),
                    function: SchemaFunction::Member(f.clone()),
                })
                .collect();
            if !level.is_empty() {
                levels.push(level);
            }
        }
        if let Some(fq_name) = self.imports.get(&call.name) {
            levels.push(qualified_candidates(schema, fq_name));
        }
        Some(levels)
    }

    /// Like [`Self::qualified_chain`], but a single unbound name also counts.
    fn qualified_chain_or_name(&self, expr: &Expr) -> Option<Vec<String>> {
        let ExprKind::PropertyAccess(access) = &expr.kind else {
            return None;
        };
        let chain = access.name_chain()?;
        if self.lookup_name(&chain[0]).is_none() {
            Some(chain)
        } else {
            None
        }
    }

    /// Bind call arguments to `parameters`: positional first, then named, then
    /// defaults; every value must be assignable and the configuring block must
    /// agree with the function semantics.
    fn bind(
        &self,
        parameters: &[DataParameter],
        args: &[ResolvedArgument],
        has_block: bool,
        semantics: &FunctionSemantics,
    ) -> Option<ParameterValueBinding> {
        let requirement = semantics.configure_block_requirement();
        if (has_block && !requirement.allows()) || (!has_block && requirement.requires()) {
            return None;
        }

        let mut bound: Vec<Option<ObjectOrigin>> = vec![None; parameters.len()];
        let mut seen_named = false;
        for (position, arg) in args.iter().enumerate() {
            let index = match &arg.name {
                None => {
                    if seen_named {
                        return None;
                    }
                    position
                }
                Some(name) => {
                    seen_named = true;
                    parameters
                        .iter()
                        .position(|p| p.name.as_deref() == Some(name.as_str()))?
                }
            };
            let parameter = parameters.get(index)?;
            if bound[index].is_some()
                || !self
                    .schema
                    .is_assignable(&parameter.data_type, &arg.origin.data_type())
            {
                return None;
            }
            bound[index] = Some(arg.origin.clone());
        }

        let mut bindings = Vec::new();
        for (parameter, value) in parameters.iter().zip(bound) {
            match value {
                Some(value) => bindings.push(ParameterBinding {
                    parameter: parameter.clone(),
                    value,
                }),
                None if parameter.is_default => {}
                None => return None,
            }
        }
        Some(ParameterValueBinding {
            bindings,
            has_configure_block: has_block,
        })
    }

    fn apply_function(
        &mut self,
        chosen: FunctionResolutionAndBinding,
        call: &FunctionCall,
        expr: &Expr,
    ) -> Option<ObjectOrigin> {
        let FunctionResolutionAndBinding {
            receiver,
            function,
            binding,
        } = chosen;
        let loc = call.loc.clone();

        let member = match function {
            SchemaFunction::Member(member) => member,
            SchemaFunction::TopLevel(function) => {
                let invocation_id = self.next_instant();
                let origin = ObjectOrigin::NewObjectFromTopLevelFunction {
                    function,
                    binding,
                    invocation_id,
                    loc,
                };
                if let Some(block) = call.lambda() {
                    self.resolve_block(block, origin.clone());
                }
                return Some(origin);
            }
            SchemaFunction::Constructor(constructor) => {
                let invocation_id = self.next_instant();
                return Some(ObjectOrigin::NewObjectFromConstructor {
                    constructor,
                    binding,
                    invocation_id,
                    loc,
                });
            }
        };

        let receiver = receiver?;
        if member.is_direct_access_only() && !self.is_current_receiver(&receiver) {
            self.error(
                LanguageTreeElement::Expr(expr.clone()),
                ErrorReason::AccessOnCurrentReceiverOnlyViolation {
                    name: call.name.clone(),
                },
            );
            return None;
        }

        let invocation_id = self.next_instant();
        let semantics = member.semantics().into_owned();
        match semantics {
            FunctionSemantics::Pure { .. } => Some(ObjectOrigin::NewObjectFromMemberFunction {
                function: member,
                receiver: Box::new(receiver),
                binding,
                invocation_id,
                loc,
            }),
            FunctionSemantics::Builder { .. } => {
                if let Some(argument) = binding.bindings.first() {
                    let property = match &argument.parameter.semantics {
                        ParameterSemantics::StoreValueInProperty(property) => property.clone(),
                        _ => DataProperty::new(
                            member.simple_name(),
                            argument.parameter.data_type.clone(),
                        ),
                    };
                    self.assignments.push(AssignmentRecord {
                        lhs: PropertyReferenceResolution {
                            receiver_object: receiver.clone(),
                            property,
                        },
                        rhs: argument.value.clone(),
                        assignment_order: invocation_id,
                        method: AssignmentMethod::Builder {
                            function_name: member.simple_name().to_string(),
                        },
                        loc: loc.clone(),
                    });
                }
                Some(ObjectOrigin::BuilderReturnedReceiver {
                    function: member,
                    receiver: Box::new(receiver),
                    binding,
                    invocation_id,
                    loc,
                })
            }
            FunctionSemantics::AccessAndConfigure {
                accessor,
                return_type,
            } => {
                let configured = ObjectOrigin::ConfigureReceiver {
                    receiver: Box::new(receiver.clone()),
                    function: member.clone(),
                    binding: binding.clone(),
                    accessor,
                    invocation_id,
                    loc: loc.clone(),
                };
                self.configure_invocations.push(configured.clone());
                if let Some(block) = call.lambda() {
                    self.resolve_block(block, configured.clone());
                }
                match return_type {
                    AccessAndConfigureReturnType::ConfiguredObject => Some(configured),
                    AccessAndConfigureReturnType::Unit => {
                        Some(ObjectOrigin::NewObjectFromMemberFunction {
                            function: member,
                            receiver: Box::new(receiver),
                            binding,
                            invocation_id,
                            loc,
                        })
                    }
                }
            }
            FunctionSemantics::AddAndConfigure { .. } => {
                let created = ObjectOrigin::NewObjectFromMemberFunction {
                    function: member,
                    receiver: Box::new(receiver.clone()),
                    binding,
                    invocation_id,
                    loc,
                };
                self.additions.push(DataAddition {
                    container: receiver,
                    data_object: created.clone(),
                });
                if let Some(block) = call.lambda() {
                    self.resolve_block(
                        block,
                        ObjectOrigin::AddAndConfigureReceiver {
                            receiver: Box::new(created.clone()),
                        },
                    );
                }
                Some(created)
            }
        }
    }
}

fn qualified_candidates(schema: &AnalysisSchema, fq_name: &FqName) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    if let Some(function) = schema.external_function(fq_name) {
        candidates.push(Candidate {
            receiver: None,
            function: SchemaFunction::TopLevel(function.clone()),
        });
    }
    if let Some(class) = schema.data_class(fq_name) {
        candidates.extend(class.constructors.iter().map(|c| Candidate {
            receiver: None,
            function: SchemaFunction::Constructor(c.clone()),
        }));
    }
    candidates
}

/// Whether evaluating `origin` as a statement would have no effect.
fn is_pure_origin(origin: &ObjectOrigin) -> bool {
    match origin {
        ObjectOrigin::NewObjectFromMemberFunction { function, .. } => function.semantics().is_pure(),
        ObjectOrigin::NewObjectFromTopLevelFunction { function, .. } => {
            function.semantics.is_pure()
        }
        ObjectOrigin::ConfigureReceiver { .. }
        | ObjectOrigin::AddAndConfigureReceiver { .. }
        | ObjectOrigin::BuilderReturnedReceiver { .. } => false,
        _ => true,
    }
}
