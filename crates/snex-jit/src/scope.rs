//! The scope chain of a compilation.
//!
//! Scopes form a parent-linked tree mirroring the source nesting. The tree
//! lives in a [`ScopeArena`] owned by the compiled [`ClassScope`]; parent
//! links are [`ScopeId`] indices into it, so a scope never outlives the
//! scopes it refers to.
//!
//! - `Class` scopes own a [`RootClassData`] table and may register classes
//! - `Function` and `Anonymous` scopes only hold constants, which shadow
//!   those of enclosing scopes without touching them
//! - the `Global` scope lives in [`GlobalScope`](crate::GlobalScope)

use std::fmt;

use snex_core::{
    ComplexTypePtr, FunctionClass, Identifier, InitialiserList, NamespacedIdentifier,
    OverloadPolicy, ScopeError, Span, Symbol, TypeInfo, VariableStorage,
};
use snex_registry::NamespaceHandler;

use crate::root_class_data::RootClassData;

// ============================================================================
// Types
// ============================================================================

/// Index of a scope in its [`ScopeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Global,
    Class,
    Function,
    Anonymous,
}

impl ScopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Global => "global",
            ScopeKind::Class => "class",
            ScopeKind::Function => "function",
            ScopeKind::Anonymous => "anonymous",
        }
    }

    /// Whether scopes of this kind own variable storage.
    pub fn has_class_data(&self) -> bool {
        matches!(self, ScopeKind::Global | ScopeKind::Class)
    }
}

/// A class registered in a class scope together with its declaration site.
#[derive(Debug, Clone)]
pub struct RegisteredClass {
    pub class: ComplexTypePtr,
    pub span: Span,
}

// ============================================================================
// BaseScope
// ============================================================================

/// One node of the scope chain.
#[derive(Debug, Clone)]
pub struct BaseScope {
    kind: ScopeKind,
    id: NamespacedIdentifier,
    parent: Option<ScopeId>,
    constants: Vec<Symbol>,
    variables: Vec<Symbol>,
    classes: Vec<RegisteredClass>,
    data: Option<RootClassData>,
}

impl BaseScope {
    /// `capacity` sizes the variable table of class and global scopes.
    pub fn new(
        kind: ScopeKind,
        id: NamespacedIdentifier,
        parent: Option<ScopeId>,
        capacity: usize,
    ) -> Self {
        Self {
            kind,
            id,
            parent,
            constants: Vec::new(),
            variables: Vec::new(),
            classes: Vec::new(),
            data: kind.has_class_data().then(|| RootClassData::new(capacity)),
        }
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    /// Path of the scope. Symbols declared here live below it.
    pub fn scope_id(&self) -> &NamespacedIdentifier {
        &self.id
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /// Declare a constant in this scope. A constant of the same name in an
    /// enclosing scope is shadowed, not replaced.
    pub fn add_constant(
        &mut self,
        id: NamespacedIdentifier,
        value: VariableStorage,
    ) -> Result<Symbol, ScopeError> {
        if self.constants.iter().any(|c| c.id == id) {
            return Err(ScopeError::DuplicateConstant {
                name: id.to_string(),
            });
        }
        let symbol = Symbol::new(id, TypeInfo::new(value.type_id()).with_const(true))
            .with_const_value(value);
        self.constants.push(symbol.clone());
        Ok(symbol)
    }

    pub fn constants(&self) -> &[Symbol] {
        &self.constants
    }

    fn find_constant(&self, id: &NamespacedIdentifier) -> Option<&Symbol> {
        self.constants.iter().find(|c| Self::names(c, id))
    }

    pub fn get_constant(&self, id: &NamespacedIdentifier) -> Option<VariableStorage> {
        self.find_constant(id).and_then(|c| c.const_expr)
    }

    /// Variables allocated in this scope's table.
    pub fn variables(&self) -> &[Symbol] {
        &self.variables
    }

    /// Whether a constant or variable declared here is called `id`. An
    /// unqualified `id` matches by simple name.
    pub fn declares(&self, id: &NamespacedIdentifier) -> bool {
        self.find_constant(id).is_some() || self.variables.iter().any(|v| Self::names(v, id))
    }

    fn names(symbol: &Symbol, id: &NamespacedIdentifier) -> bool {
        if id.is_explicit() {
            &symbol.id == id
        } else {
            symbol.get_name() == id.get_identifier()
        }
    }

    /// Record a class declared in this scope. Only class scopes accept
    /// classes.
    pub fn register_class(&mut self, class: ComplexTypePtr, span: Span) -> Result<(), ScopeError> {
        if self.kind != ScopeKind::Class {
            return Err(ScopeError::NotAClassScope {
                scope: self.describe(),
            });
        }
        let name = class.to_string_internal();
        if self
            .classes
            .iter()
            .any(|c| c.class.to_string_internal() == name)
        {
            return Err(ScopeError::DuplicateClass { name });
        }
        self.classes.push(RegisteredClass { class, span });
        Ok(())
    }

    pub fn classes(&self) -> &[RegisteredClass] {
        &self.classes
    }

    pub fn root_class_data(&self) -> Option<&RootClassData> {
        self.data.as_ref()
    }

    pub fn root_class_data_mut(&mut self) -> Option<&mut RootClassData> {
        self.data.as_mut()
    }

    /// Allocate a variable in this scope's own table.
    pub fn allocate(
        &mut self,
        symbol: Symbol,
        initial: Option<&InitialiserList>,
    ) -> Result<usize, ScopeError> {
        let scope = self.describe();
        let data = self
            .data
            .as_mut()
            .ok_or(ScopeError::NotAClassScope { scope })?;
        let slot = data.allocate(symbol.clone(), initial)?;
        self.variables.push(symbol);
        Ok(slot)
    }

    fn describe(&self) -> String {
        if self.id.is_root() {
            format!("<{}>", self.kind.as_str())
        } else {
            self.id.to_string()
        }
    }
}

// ============================================================================
// ScopeArena
// ============================================================================

/// Owner of every scope of one compilation. Index 0 is the root.
#[derive(Debug, Clone)]
pub struct ScopeArena {
    scopes: Vec<BaseScope>,
    capacity: usize,
}

impl ScopeArena {
    /// An arena whose root scope is a class scope named `id`.
    pub fn new(id: NamespacedIdentifier, capacity: usize) -> Self {
        Self {
            scopes: vec![BaseScope::new(ScopeKind::Class, id, None, capacity)],
            capacity,
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn get(&self, id: ScopeId) -> Result<&BaseScope, ScopeError> {
        self.scopes.get(id.0).ok_or(ScopeError::InvalidScope(id.0))
    }

    pub fn get_mut(&mut self, id: ScopeId) -> Result<&mut BaseScope, ScopeError> {
        self.scopes.get_mut(id.0).ok_or(ScopeError::InvalidScope(id.0))
    }

    /// Open a child scope. Anonymous scopes get a generated name.
    pub fn add_scope(
        &mut self,
        parent: ScopeId,
        kind: ScopeKind,
        name: Option<Identifier>,
    ) -> Result<ScopeId, ScopeError> {
        let parent_scope = self.get(parent)?;
        let name = name.unwrap_or_else(|| Identifier::from(format!("_{}", self.scopes.len())));
        let id = parent_scope.scope_id().get_child_id(name);

        let scope = ScopeId(self.scopes.len());
        tracing::debug!(
            target: "snex::scope",
            kind = kind.as_str(),
            id = %id,
            parent = %parent,
            "opened scope"
        );
        self.scopes
            .push(BaseScope::new(kind, id, Some(parent), self.capacity));
        Ok(scope)
    }

    /// `from` and all its ancestors, innermost first.
    pub fn chain(&self, from: ScopeId) -> Vec<ScopeId> {
        let mut chain = Vec::new();
        let mut current = self.scopes.get(from.0).map(|_| from);
        while let Some(id) = current {
            chain.push(id);
            current = self.scopes.get(id.0).and_then(BaseScope::parent);
        }
        chain
    }

    /// The innermost scope, starting at `from`, that declares `id`.
    /// `None` means the name isn't declared in this compilation.
    pub fn get_scope_for_symbol(&self, from: ScopeId, id: &NamespacedIdentifier) -> Option<ScopeId> {
        self.chain(from)
            .into_iter()
            .find(|s| self.scopes[s.0].declares(id))
    }

    /// Value of the constant `id` as seen from `from`.
    pub fn get_constant(&self, from: ScopeId, id: &NamespacedIdentifier) -> Option<VariableStorage> {
        self.chain(from)
            .into_iter()
            .find_map(|s| self.scopes[s.0].get_constant(id))
    }

    /// The nearest scope above (or at) `from` that owns a variable table.
    pub fn class_scope_of(&self, from: ScopeId) -> Result<ScopeId, ScopeError> {
        self.chain(from)
            .into_iter()
            .find(|s| self.scopes[s.0].kind().has_class_data())
            .ok_or_else(|| ScopeError::NoClassScope {
                scope: self
                    .scopes
                    .get(from.0)
                    .map(BaseScope::describe)
                    .unwrap_or_else(|| from.to_string()),
            })
    }

    /// Reserve a slot for `id` in the table of the class scope enclosing
    /// `from`.
    pub fn allocate(
        &mut self,
        from: ScopeId,
        id: NamespacedIdentifier,
        type_info: TypeInfo,
        initial: Option<&InitialiserList>,
    ) -> Result<Symbol, ScopeError> {
        let target = self.class_scope_of(from)?;
        let symbol = Symbol::new(id, type_info);
        self.get_mut(target)?.allocate(symbol.clone(), initial)?;
        Ok(symbol)
    }

    pub fn register_class(
        &mut self,
        scope: ScopeId,
        class: ComplexTypePtr,
        span: Span,
    ) -> Result<(), ScopeError> {
        self.get_mut(scope)?.register_class(class, span)
    }

    /// Every scope in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (ScopeId, &BaseScope)> {
        self.scopes.iter().enumerate().map(|(i, s)| (ScopeId(i), s))
    }
}

// ============================================================================
// ClassScope
// ============================================================================

/// The class produced by one compilation: its scope tree, its functions and
/// the namespace tree that names them.
#[derive(Debug)]
pub struct ClassScope {
    arena: ScopeArena,
    functions: FunctionClass,
    handler: NamespaceHandler,
    overload_policy: OverloadPolicy,
}

impl ClassScope {
    pub fn new(id: NamespacedIdentifier, capacity: usize) -> Self {
        Self {
            functions: FunctionClass::new(id.clone()),
            arena: ScopeArena::new(id, capacity),
            handler: NamespaceHandler::new(),
            overload_policy: OverloadPolicy::default(),
        }
    }

    pub(crate) fn from_parts(
        arena: ScopeArena,
        functions: FunctionClass,
        handler: NamespaceHandler,
        overload_policy: OverloadPolicy,
    ) -> Self {
        Self {
            arena,
            functions,
            handler,
            overload_policy,
        }
    }

    pub fn id(&self) -> &NamespacedIdentifier {
        self.root_scope().scope_id()
    }

    pub fn arena(&self) -> &ScopeArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut ScopeArena {
        &mut self.arena
    }

    pub fn root_scope(&self) -> &BaseScope {
        &self.arena.scopes[0]
    }

    pub fn root_scope_mut(&mut self) -> &mut BaseScope {
        &mut self.arena.scopes[0]
    }

    /// Variable table of the class. Class scopes always have one.
    pub fn root_class_data(&self) -> Option<&RootClassData> {
        self.root_scope().root_class_data()
    }

    pub fn root_class_data_mut(&mut self) -> Option<&mut RootClassData> {
        self.root_scope_mut().root_class_data_mut()
    }

    pub fn functions(&self) -> &FunctionClass {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut FunctionClass {
        &mut self.functions
    }

    pub fn namespace_handler(&self) -> &NamespaceHandler {
        &self.handler
    }

    pub fn namespace_handler_mut(&mut self) -> &mut NamespaceHandler {
        &mut self.handler
    }

    pub fn overload_policy(&self) -> OverloadPolicy {
        self.overload_policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snex_core::{ComplexType, StructType, TypeId};
    use std::sync::Arc;

    fn id(s: &str) -> NamespacedIdentifier {
        NamespacedIdentifier::from_string(s)
    }

    fn struct_type(name: &str) -> ComplexTypePtr {
        let s: ComplexType = StructType::new(id(name))
            .with_member("v", TypeInfo::new(TypeId::Integer))
            .into();
        s.finalise_alignment().unwrap();
        Arc::new(s)
    }

    #[test]
    fn chain_walks_to_root() {
        let mut arena = ScopeArena::new(id("Main"), 8);
        let f = arena
            .add_scope(arena.root(), ScopeKind::Function, Some("process".into()))
            .unwrap();
        let block = arena.add_scope(f, ScopeKind::Anonymous, None).unwrap();

        assert_eq!(arena.chain(block), vec![block, f, arena.root()]);
        assert_eq!(arena.get(f).unwrap().scope_id().to_string(), "Main::process");
        assert_eq!(arena.get(block).unwrap().kind(), ScopeKind::Anonymous);
    }

    #[test]
    fn inner_constant_shadows_outer() {
        let mut arena = ScopeArena::new(id("Main"), 8);
        let root = arena.root();
        arena
            .get_mut(root)
            .unwrap()
            .add_constant(id("Main::size"), VariableStorage::Integer(4))
            .unwrap();

        let f = arena.add_scope(root, ScopeKind::Function, Some("f".into())).unwrap();
        arena
            .get_mut(f)
            .unwrap()
            .add_constant(id("Main::f::size"), VariableStorage::Integer(16))
            .unwrap();

        let size = id("size");
        assert_eq!(arena.get_scope_for_symbol(f, &size), Some(f));
        assert_eq!(arena.get_constant(f, &size), Some(VariableStorage::Integer(16)));
        assert_eq!(arena.get_constant(root, &size), Some(VariableStorage::Integer(4)));
        assert_eq!(arena.get_scope_for_symbol(root, &id("missing")), None);
    }

    #[test]
    fn duplicate_constant_in_same_scope() {
        let mut scope = BaseScope::new(ScopeKind::Function, id("f"), None, 0);
        scope.add_constant(id("f::x"), 1.into()).unwrap();
        match scope.add_constant(id("f::x"), 2.into()) {
            Err(ScopeError::DuplicateConstant { name }) => assert_eq!(name, "f::x"),
            other => panic!("Expected DuplicateConstant, got {other:?}"),
        }
    }

    #[test]
    fn allocate_goes_to_enclosing_class() {
        let mut arena = ScopeArena::new(id("Main"), 8);
        let f = arena
            .add_scope(arena.root(), ScopeKind::Function, Some("f".into()))
            .unwrap();
        let symbol = arena
            .allocate(f, id("Main::counter"), TypeInfo::new(TypeId::Integer), None)
            .unwrap();

        let root = arena.get(arena.root()).unwrap();
        assert!(root.root_class_data().unwrap().contains(&symbol.id));
        assert!(arena.get(f).unwrap().root_class_data().is_none());
        assert_eq!(arena.get_scope_for_symbol(f, &id("counter")), Some(arena.root()));
    }

    #[test]
    fn nested_class_gets_own_table() {
        let mut arena = ScopeArena::new(id("Main"), 8);
        let inner = arena
            .add_scope(arena.root(), ScopeKind::Class, Some("Inner".into()))
            .unwrap();
        arena
            .allocate(inner, id("Main::Inner::x"), TypeInfo::new(TypeId::Float), None)
            .unwrap();
        assert_eq!(arena.class_scope_of(inner).unwrap(), inner);
        assert!(arena.get(arena.root()).unwrap().root_class_data().unwrap().is_empty());
    }

    #[test]
    fn register_class_only_on_class_scopes() {
        let mut arena = ScopeArena::new(id("Main"), 8);
        let f = arena
            .add_scope(arena.root(), ScopeKind::Function, Some("f".into()))
            .unwrap();

        match arena.register_class(f, struct_type("A"), Span::default()) {
            Err(ScopeError::NotAClassScope { scope }) => assert_eq!(scope, "Main::f"),
            other => panic!("Expected NotAClassScope, got {other:?}"),
        }

        let root = arena.root();
        arena.register_class(root, struct_type("A"), Span::default()).unwrap();
        match arena.register_class(root, struct_type("A"), Span::default()) {
            Err(ScopeError::DuplicateClass { name }) => assert_eq!(name, "A"),
            other => panic!("Expected DuplicateClass, got {other:?}"),
        }
        assert_eq!(arena.get(root).unwrap().classes().len(), 1);
    }

    #[test]
    fn invalid_scope_handle() {
        let arena = ScopeArena::new(id("Main"), 8);
        match arena.get(ScopeId(7)) {
            Err(ScopeError::InvalidScope(7)) => {}
            other => panic!("Expected InvalidScope, got {other:?}"),
        }
    }

    #[test]
    fn class_scope_accessors() {
        let mut scope = ClassScope::new(id("Synth"), 16);
        assert_eq!(scope.id().to_string(), "Synth");
        assert_eq!(scope.root_class_data().unwrap().capacity(), 16);
        scope
            .root_scope_mut()
            .allocate(
                Symbol::new(id("Synth::gain"), TypeInfo::new(TypeId::Float)),
                None,
            )
            .unwrap();
        assert_eq!(scope.root_class_data().unwrap().len(), 1);
        assert_eq!(scope.overload_policy(), OverloadPolicy::Strict);
    }
}
