//! The compilation pipeline.
//!
//! 1. Parse the declarations.
//! 2. Register the host templates, then namespaces, aliases, enums, structs
//!    and constants with a fresh [`NamespaceHandler`], in source order.
//!    Struct layouts are finalised as soon as the struct is complete and
//!    every complex type is interned.
//! 3. Allocate class variables into the root [`RootClassData`] together
//!    with their initial values.
//! 4. Hand every function body to the [`CodeGenerator`].
//! 5. Wrap the result in a [`JitObject`].
//!
//! Any error aborts the run, is reported through
//! [`GlobalScope::log_message`] and is returned to the caller.
//!
//! [`RootClassData`]: crate::RootClassData

use std::sync::Arc;

use snex_core::{
    CompileError, ComplexType, ComplexTypePtr, DynType, FunctionClass, FunctionData,
    InitialiserList, Member, NamespacedIdentifier, NativeFn, ResolveError, Span, SpanType,
    StructType, TemplateArgument, TypeId, TypeInfo, VariableStorage, WrapType,
};
use snex_registry::{NamespaceHandler, ResolutionResult, SymbolType};

use crate::ast::{
    AliasDecl, EnumDecl, FunctionBody, FunctionDecl, Initialiser, Item, StructDecl, TemplateArg,
    TemplateValue, TypeBase, TypeExpr, ValueExpr, VariableDecl,
};
use crate::compiled::JitObject;
use crate::global_scope::GlobalScope;
use crate::options::CompilerConfig;
use crate::parser::{negate, parse};
use crate::scope::{ClassScope, ScopeArena, ScopeId, ScopeKind};

// ============================================================================
// Backend
// ============================================================================

/// What the backend gets to see of one function, together with everything
/// a call inside its body may resolve against.
#[derive(Debug, Clone, Copy)]
pub struct FunctionSource<'a> {
    pub function: &'a FunctionData,
    pub body: &'a FunctionBody,
    /// Struct the function belongs to, if it is a member function.
    pub owner: Option<&'a ComplexTypePtr>,
    pub optimisation_passes: &'a [String],
    /// Inbuilt functions, host objects and global constants.
    pub global: &'a GlobalScope,
    /// Free functions of the class being compiled.
    pub functions: &'a FunctionClass,
    /// Namespaces, aliases and templates of the compilation.
    pub namespaces: &'a NamespaceHandler,
}

/// Turns function bodies into native callables.
pub trait CodeGenerator {
    /// `Ok(None)` leaves the function unresolved.
    fn generate(&mut self, source: &FunctionSource<'_>) -> Result<Option<NativeFn>, String>;
}

/// A backend that resolves nothing. Compiled functions stay callable only
/// through pointers injected later.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCodeGenerator;

impl CodeGenerator for NullCodeGenerator {
    fn generate(&mut self, _source: &FunctionSource<'_>) -> Result<Option<NativeFn>, String> {
        Ok(None)
    }
}

// ============================================================================
// Compiler
// ============================================================================

pub struct Compiler {
    config: CompilerConfig,
    class_id: NamespacedIdentifier,
    backend: Box<dyn CodeGenerator + Send>,
}

impl Compiler {
    pub const DEFAULT_CLASS_NAME: &'static str = "Main";

    /// A compiler using the configuration of `global`.
    pub fn new(global: &GlobalScope) -> Self {
        Self {
            config: global.config().clone(),
            class_id: NamespacedIdentifier::new(Self::DEFAULT_CLASS_NAME),
            backend: Box::new(NullCodeGenerator),
        }
    }

    pub fn with_code_generator(mut self, backend: impl CodeGenerator + Send + 'static) -> Self {
        self.backend = Box::new(backend);
        self
    }

    /// Name of the class produced by [`compile`](Self::compile).
    pub fn with_class_name(mut self, name: &str) -> Self {
        self.class_id = NamespacedIdentifier::from_string(name);
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile `source` against `global`.
    #[tracing::instrument(level = "debug", skip_all, fields(class = %self.class_id))]
    pub fn compile(&mut self, global: &mut GlobalScope, source: &str) -> Result<JitObject, CompileError> {
        match self.compile_internal(global, source) {
            Ok(object) => {
                if self.config.debug_mode {
                    global.breakpoint_handler_mut().update_entries(object.debug_info());
                    global.log_message(&format!("compiled {}", self.class_id));
                }
                Ok(object)
            }
            Err(e) => {
                global.log_message(&e.to_string());
                Err(e)
            }
        }
    }

    fn compile_internal(&mut self, global: &GlobalScope, source: &str) -> Result<JitObject, CompileError> {
        let items = parse(source)?;
        tracing::debug!(target: "snex::jit", items = items.len(), "parsed declarations");

        let mut handler = NamespaceHandler::new();
        for template in global.templates() {
            let registered = if template.is_class() {
                handler.add_template_class(template.clone())
            } else {
                handler.add_template_function(template.clone())
            };
            registered.map_err(resolve_error(Span::default()))?;
        }

        let mut registration = Registration {
            global,
            arena: ScopeArena::new(self.class_id.clone(), self.config.root_class_capacity),
            functions: FunctionClass::new(self.class_id.clone()),
            pending: Vec::new(),
            class_id: self.class_id.clone(),
        };
        let root = registration.arena.root();
        registration.register_items(&mut handler, &items, root)?;

        let Registration {
            arena,
            mut functions,
            pending,
            ..
        } = registration;
        tracing::debug!(
            target: "snex::jit",
            variables = arena.get(root).map(|s| s.variables().len()).unwrap_or(0),
            functions = pending.len(),
            "registered declarations"
        );

        let passes = global.optimisation_passes();
        let mut generated = Vec::with_capacity(pending.len());
        for p in &pending {
            let native = self
                .backend
                .generate(&FunctionSource {
                    function: &p.function,
                    body: &p.body,
                    owner: p.owner.as_ref(),
                    optimisation_passes: passes,
                    global,
                    functions: &functions,
                    namespaces: &handler,
                })
                .map_err(|message| CompileError::Backend {
                    function: p.function.get_signature(),
                    message,
                })?;
            generated.push(native);
        }

        for (mut p, native) in pending.into_iter().zip(generated) {
            let Some(native) = native else {
                continue;
            };
            p.function.function = Some(native);
            match &p.owner {
                Some(owner) => {
                    if let ComplexType::Struct(s) = owner.as_ref() {
                        s.with_member_functions_mut(|f| f.inject_function_pointer(&p.function));
                    }
                }
                None => {
                    functions.inject_function_pointer(&p.function);
                }
            }
        }

        let scope = ClassScope::from_parts(arena, functions, handler, self.config.overload_policy);
        Ok(JitObject::new(scope))
    }
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("class_id", &self.class_id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Registration
// ============================================================================

struct PendingFunction {
    function: FunctionData,
    body: FunctionBody,
    owner: Option<ComplexTypePtr>,
}

/// State of the declaration pass. The namespace handler is passed around
/// separately so namespace guards can borrow it while this is mutated.
struct Registration<'g> {
    global: &'g GlobalScope,
    arena: ScopeArena,
    functions: FunctionClass,
    pending: Vec<PendingFunction>,
    class_id: NamespacedIdentifier,
}

fn resolve_error(span: Span) -> impl FnOnce(ResolveError) -> CompileError {
    move |source| CompileError::Resolve { span, source }
}

impl Registration<'_> {
    fn register_items(
        &mut self,
        handler: &mut NamespaceHandler,
        items: &[Item],
        scope: ScopeId,
    ) -> Result<(), CompileError> {
        for item in items {
            match item {
                Item::Namespace(ns) => {
                    let mut guard = handler.enter_namespace(ns.name.clone());
                    tracing::debug!(target: "snex::namespace", namespace = %guard.current_namespace(), "entered namespace");
                    self.register_items(&mut guard, &ns.items, scope)?;
                }
                Item::UsingNamespace(using) => handler
                    .add_used_namespace(&using.path)
                    .map_err(resolve_error(using.span))?,
                Item::UsingAlias(alias) => self.register_alias(handler, alias)?,
                Item::Struct(s) => self.register_struct(handler, s, scope)?,
                Item::Enum(e) => self.register_enum(handler, e, scope)?,
                Item::Variable(v) => self.register_variable(handler, v, scope)?,
                Item::Function(f) => {
                    let function = self.function_data(handler, f, None)?;
                    self.register_function(handler, f, function, scope, None)?;
                }
            }
        }
        Ok(())
    }

    fn register_alias(&mut self, handler: &mut NamespaceHandler, alias: &AliasDecl) -> Result<(), CompileError> {
        let id = handler.current_namespace().get_child_id(alias.name.clone());
        let ty = self.resolve_type(handler, &alias.target)?;
        handler
            .add_symbol(id, ty, SymbolType::UsingAlias, Default::default())
            .map_err(resolve_error(alias.span))
    }

    fn register_enum(
        &mut self,
        handler: &mut NamespaceHandler,
        decl: &EnumDecl,
        scope: ScopeId,
    ) -> Result<(), CompileError> {
        let id = handler.current_namespace().get_child_id(decl.name.clone());
        handler
            .add_symbol(
                id.clone(),
                TypeInfo::new(TypeId::Integer),
                SymbolType::Enum,
                Default::default(),
            )
            .map_err(resolve_error(decl.span))?;

        let mut guard = handler.scoped_namespace(&id);
        let mut next = 0;
        for value in &decl.values {
            let v = match &value.value {
                Some(expr) => self.value(&guard, expr)?.to_int(),
                None => next,
            };
            let value_id = id.get_child_id(value.name.clone());
            guard
                .add_enum_value(value_id.clone(), v)
                .map_err(resolve_error(value.span))?;
            self.arena
                .get_mut(scope)?
                .add_constant(value_id, VariableStorage::Integer(v))?;
            next = v.wrapping_add(1);
        }
        Ok(())
    }

    fn register_struct(
        &mut self,
        handler: &mut NamespaceHandler,
        decl: &StructDecl,
        scope: ScopeId,
    ) -> Result<(), CompileError> {
        let id = handler.current_namespace().get_child_id(decl.name.clone());
        let class_scope = self
            .arena
            .add_scope(scope, ScopeKind::Class, Some(decl.name.clone()))?;

        let mut s = StructType::new(id.clone());
        {
            let mut guard = handler.scoped_namespace(&id);
            for member in &decl.members {
                if member.is_constant() {
                    self.register_constant(&mut guard, member, class_scope)?;
                    continue;
                }

                let ty = self.resolve_type(&mut guard, &member.ty)?;
                let mut m = Member::new(member.name.clone(), ty);
                m.visibility = member.visibility;
                if let Some(init) = &member.init {
                    m.default_list = Some(self.initialiser_list(&guard, init)?);
                }
                if !s.add_member(m) {
                    return Err(CompileError::Resolve {
                        span: member.span,
                        source: ResolveError::DuplicateSymbol {
                            name: id.get_child_id(member.name.clone()).to_string(),
                        },
                    });
                }
            }
        }

        let complex: ComplexType = s.into();
        complex.finalise_alignment().map_err(|source| CompileError::Layout {
            name: id.to_string(),
            source,
        })?;
        let ptr = handler.register_complex_type_or_return_existing(Arc::new(complex));
        tracing::debug!(
            target: "snex::layout",
            class = %id,
            size = ptr.required_byte_size(),
            alignment = ptr.required_alignment(),
            "finalised struct"
        );

        handler
            .add_symbol(
                id.clone(),
                TypeInfo::from_complex(ptr.clone()),
                SymbolType::Struct,
                Default::default(),
            )
            .map_err(resolve_error(decl.span))?;
        self.arena.register_class(scope, ptr.clone(), decl.span)?;

        let mut guard = handler.scoped_namespace(&id);
        for f in &decl.functions {
            let function = self.function_data(&mut guard, f, Some(&id))?;
            if let ComplexType::Struct(st) = ptr.as_ref() {
                let declared = st
                    .member_functions()
                    .functions()
                    .iter()
                    .any(|g| g.matches_signature(&function));
                if !declared {
                    st.add_member_function(function.clone());
                }
            }
            self.register_function(&mut guard, f, function, class_scope, Some(ptr.clone()))?;
        }
        Ok(())
    }

    fn register_constant(
        &mut self,
        handler: &mut NamespaceHandler,
        decl: &VariableDecl,
        scope: ScopeId,
    ) -> Result<(), CompileError> {
        let id = handler.current_namespace().get_child_id(decl.name.clone());
        let Some(Initialiser::Value(expr)) = &decl.init else {
            return Err(CompileError::NotAConstant {
                name: id.to_string(),
                span: decl.span,
            });
        };

        let target = self.resolve_type(handler, &decl.ty)?.get_type();
        let raw = self.value(handler, expr)?;
        let value = raw
            .convert_to(target)
            .ok_or_else(|| CompileError::InvalidInitialiser {
                name: id.to_string(),
                span: decl.span,
                message: format!("can't convert {} to {}", raw.type_id(), target),
            })?;

        handler
            .add_symbol(
                id.clone(),
                TypeInfo::new(target).with_const(true),
                SymbolType::Constant,
                decl.visibility,
            )
            .map_err(resolve_error(decl.span))?;
        handler
            .add_constant(id.clone(), value)
            .map_err(resolve_error(decl.span))?;
        self.arena.get_mut(scope)?.add_constant(id, value)?;
        Ok(())
    }

    fn register_variable(
        &mut self,
        handler: &mut NamespaceHandler,
        decl: &VariableDecl,
        scope: ScopeId,
    ) -> Result<(), CompileError> {
        if decl.is_constant() {
            return self.register_constant(handler, decl, scope);
        }

        let id = handler.current_namespace().get_child_id(decl.name.clone());
        let ty = self.resolve_type(handler, &decl.ty)?;
        if ty.is_void() {
            return Err(CompileError::InvalidInitialiser {
                name: id.to_string(),
                span: decl.span,
                message: "variables can't be void".to_string(),
            });
        }
        let init = decl
            .init
            .as_ref()
            .map(|i| self.initialiser_list(handler, i))
            .transpose()?;

        handler
            .add_symbol(id.clone(), ty.clone(), SymbolType::Variable, decl.visibility)
            .map_err(resolve_error(decl.span))?;
        self.arena.allocate(scope, id, ty, init.as_ref())?;
        Ok(())
    }

    /// Signature of `decl`. Functions declared at the root namespace are
    /// named below the compiled class.
    fn function_data(
        &self,
        handler: &mut NamespaceHandler,
        decl: &FunctionDecl,
        owner: Option<&NamespacedIdentifier>,
    ) -> Result<FunctionData, CompileError> {
        let parent = match owner {
            Some(owner) => owner.clone(),
            None if handler.current_namespace().is_root() => self.class_id.clone(),
            None => handler.current_namespace(),
        };
        let return_type = self.resolve_type(handler, &decl.return_type)?;
        let mut function = FunctionData::new(parent.get_child_id(decl.name.clone()), return_type);
        for param in &decl.params {
            let ty = self.resolve_type(handler, &param.ty)?;
            function.add_arg(param.name.as_str(), ty);
        }
        Ok(function)
    }

    fn register_function(
        &mut self,
        handler: &mut NamespaceHandler,
        decl: &FunctionDecl,
        function: FunctionData,
        scope: ScopeId,
        owner: Option<ComplexTypePtr>,
    ) -> Result<(), CompileError> {
        let symbol = handler.current_namespace().get_child_id(decl.name.clone());
        handler
            .add_symbol(
                symbol,
                function.return_type.clone(),
                SymbolType::Function,
                decl.visibility,
            )
            .map_err(resolve_error(decl.span))?;
        self.arena
            .add_scope(scope, ScopeKind::Function, Some(decl.name.clone()))?;

        let Some(body) = &decl.body else {
            if owner.is_none() && !self.has_signature(&function) {
                self.functions.add_function(function);
            }
            return Ok(());
        };

        let defined_twice = self
            .pending
            .iter()
            .any(|p| p.function.matches_signature(&function));
        if defined_twice {
            return Err(CompileError::Resolve {
                span: decl.span,
                source: ResolveError::DuplicateSymbol {
                    name: function.get_signature(),
                },
            });
        }

        if owner.is_none() && !self.has_signature(&function) {
            self.functions.add_function(function.clone());
        }
        self.pending.push(PendingFunction {
            function,
            body: body.clone(),
            owner,
        });
        Ok(())
    }

    fn has_signature(&self, function: &FunctionData) -> bool {
        self.functions
            .functions()
            .iter()
            .any(|f| f.matches_signature(function))
    }

    // ========================================================================
    // Types and values
    // ========================================================================

    /// Absolute path of `id` seen from the current namespace. Private and
    /// protected names are only found from inside their parent.
    fn resolve_symbol(
        &self,
        handler: &NamespaceHandler,
        id: &NamespacedIdentifier,
        span: Span,
    ) -> Result<Option<NamespacedIdentifier>, CompileError> {
        match handler.resolve_checked(id) {
            ResolutionResult::Found(resolved) => {
                handler
                    .check_visibility(&resolved)
                    .map_err(resolve_error(span))?;
                Ok(Some(resolved))
            }
            ResolutionResult::Ambiguous(candidates) => Err(CompileError::Resolve {
                span,
                source: ResolveError::Ambiguous {
                    name: id.to_string(),
                    candidates: candidates.iter().map(ToString::to_string).collect(),
                },
            }),
            ResolutionResult::NotFound => Ok(None),
        }
    }

    fn resolve_type(&self, handler: &mut NamespaceHandler, ty: &TypeExpr) -> Result<TypeInfo, CompileError> {
        let unknown = |id: &NamespacedIdentifier| CompileError::UnknownType {
            name: id.to_string(),
            span: ty.span,
        };
        let base = match &ty.base {
            TypeBase::Primitive(id) => TypeInfo::new(*id),
            TypeBase::Named(id) => {
                let resolved = self
                    .resolve_symbol(handler, id, ty.span)?
                    .ok_or_else(|| unknown(id))?;
                handler.get_alias_type(&resolved).map_err(|_| unknown(id))?
            }
            TypeBase::Span(element, size) => {
                let element = self.resolve_type(handler, element)?;
                let count = self.template_size(handler, size, ty.span)?;
                self.complex(handler, SpanType::new(element, count as usize).into(), ty.span)?
            }
            TypeBase::Dyn(element) => {
                let element = self.resolve_type(handler, element)?;
                self.complex(handler, DynType::new(element).into(), ty.span)?
            }
            TypeBase::Wrap(size) => {
                let size = self.template_size(handler, size, ty.span)?;
                self.complex(handler, WrapType::new(size).into(), ty.span)?
            }
            TypeBase::Template(id, args) => {
                let resolved = self
                    .resolve_symbol(handler, id, ty.span)?
                    .filter(|r| handler.is_template_class_id(r))
                    .ok_or_else(|| unknown(id))?;
                let mut arguments = Vec::with_capacity(args.len());
                for arg in args {
                    arguments.push(self.template_argument(handler, arg, ty.span)?);
                }
                let instance = handler
                    .create_template_instantiation(&resolved, &arguments)
                    .map_err(resolve_error(ty.span))?;
                TypeInfo::from_complex(instance)
            }
        };
        Ok(base.with_const(ty.is_const).with_ref(ty.is_ref))
    }

    /// Finalise and intern an anonymous complex type, so every spelling of
    /// the same type shares one instance.
    fn complex(&self, handler: &mut NamespaceHandler, ty: ComplexType, span: Span) -> Result<TypeInfo, CompileError> {
        ty.finalise_alignment().map_err(|source| CompileError::Layout {
            name: format!("{} at {span}", ty.to_string_internal()),
            source,
        })?;
        let ptr = handler.register_complex_type_or_return_existing(Arc::new(ty));
        Ok(TypeInfo::from_complex(ptr))
    }

    /// A bare name is a constant argument when it names a constant and a
    /// type argument otherwise.
    fn template_argument(
        &self,
        handler: &mut NamespaceHandler,
        arg: &TemplateArg,
        span: Span,
    ) -> Result<TemplateArgument, CompileError> {
        match arg {
            TemplateArg::Value(value) => {
                Ok(TemplateArgument::Constant(self.template_integer(handler, value, span)?))
            }
            TemplateArg::Type(TypeExpr {
                base: TypeBase::Named(id),
                is_const: false,
                is_ref: false,
                ..
            }) if self.names_constant(handler, id) => {
                let value = TemplateValue::Named(id.clone());
                Ok(TemplateArgument::Constant(self.template_integer(handler, &value, span)?))
            }
            TemplateArg::Type(ty) => Ok(TemplateArgument::Type(self.resolve_type(handler, ty)?)),
        }
    }

    fn names_constant(&self, handler: &NamespaceHandler, id: &NamespacedIdentifier) -> bool {
        match handler.resolve_checked(id) {
            ResolutionResult::Found(resolved) => handler.get_constant_value(&resolved).is_some(),
            ResolutionResult::Ambiguous(_) => false,
            ResolutionResult::NotFound => self.global.get_constant(id).is_some(),
        }
    }

    fn template_integer(
        &self,
        handler: &NamespaceHandler,
        value: &TemplateValue,
        span: Span,
    ) -> Result<i32, CompileError> {
        match value {
            TemplateValue::Literal(v) => Ok(*v),
            TemplateValue::Named(id) => {
                let v = self.resolve_constant(handler, id, span)?;
                if v.type_id() != TypeId::Integer {
                    return Err(CompileError::InvalidTemplateArgument {
                        span,
                        message: format!("'{id}' is not an integer"),
                    });
                }
                Ok(v.to_int())
            }
        }
    }

    fn template_size(
        &self,
        handler: &NamespaceHandler,
        value: &TemplateValue,
        span: Span,
    ) -> Result<i32, CompileError> {
        let size = self.template_integer(handler, value, span)?;
        if size <= 0 {
            return Err(CompileError::InvalidTemplateArgument {
                span,
                message: format!("size must be positive, got {size}"),
            });
        }
        Ok(size)
    }

    /// Value of a constant visible from the current namespace, falling back
    /// to the constants of the global scope.
    fn resolve_constant(
        &self,
        handler: &NamespaceHandler,
        id: &NamespacedIdentifier,
        span: Span,
    ) -> Result<VariableStorage, CompileError> {
        match self.resolve_symbol(handler, id, span)? {
            Some(resolved) => {
                handler
                    .get_constant_value(&resolved)
                    .ok_or_else(|| CompileError::NotAConstant {
                        name: resolved.to_string(),
                        span,
                    })
            }
            None => self
                .global
                .get_constant(id)
                .ok_or_else(|| CompileError::Resolve {
                    span,
                    source: ResolveError::NotFound {
                        name: id.to_string(),
                    },
                }),
        }
    }

    fn value(&self, handler: &NamespaceHandler, expr: &ValueExpr) -> Result<VariableStorage, CompileError> {
        match expr {
            ValueExpr::Literal(v) => Ok(*v),
            ValueExpr::Constant { id, negated, span } => {
                let v = self.resolve_constant(handler, id, *span)?;
                Ok(if *negated { negate(v) } else { v })
            }
        }
    }

    fn initialiser_list(
        &self,
        handler: &NamespaceHandler,
        init: &Initialiser,
    ) -> Result<InitialiserList, CompileError> {
        match init {
            Initialiser::Value(expr) => Ok(InitialiserList::make_single_list(self.value(handler, expr)?)),
            Initialiser::List(items, _) => {
                let mut list = InitialiserList::new();
                for item in items {
                    match item {
                        Initialiser::Value(expr) => {
                            list.add_value(self.value(handler, expr)?);
                        }
                        Initialiser::List(..) => {
                            list.add_child_list(self.initialiser_list(handler, item)?);
                        }
                    }
                }
                Ok(list)
            }
        }
    }
}
