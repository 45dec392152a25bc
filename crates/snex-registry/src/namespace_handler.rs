//! Namespace tree - hierarchical storage for every alias a compilation
//! declares.
//!
//! Uses `petgraph::DiGraph` with:
//! - Nodes: [`NamespaceData`] (the aliases declared at that level)
//! - Edges: `Contains(name)` for nesting, `Uses` for `using namespace`
//!
//! Resolution of a name starts in the current namespace and walks up to the
//! root. At every level the namespace's own aliases win; otherwise the
//! namespaces it imports are searched. Imports are not transitive.

use std::fmt::{self, Write as _};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;
use snex_core::{
    ComplexType, ComplexTypePtr, FunctionData, Identifier, NamespacedIdentifier, ResolveError,
    StructType, TemplateArgument, TypeHash, TypeInfo, VariableStorage, Visibility,
};

use crate::template::{TemplateBuilder, TemplateObject, instance_name};

/// Result of a lookup that may be ambiguous.
///
/// When more than one `using namespace` import brings the same name into
/// scope at the same level, resolution is ambiguous.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionResult<T> {
    /// Found exactly one match.
    Found(T),
    /// Found several matches from different imports.
    Ambiguous(Vec<T>),
    /// Not found in any searched location.
    NotFound,
}

impl<T> ResolutionResult<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, ResolutionResult::Found(_))
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, ResolutionResult::Ambiguous(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolutionResult::NotFound)
    }

    /// Convert to Option, returning Some for Found, None otherwise.
    pub fn ok(self) -> Option<T> {
        match self {
            ResolutionResult::Found(v) => Some(v),
            _ => None,
        }
    }
}

/// Edge types in the namespace graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceEdge {
    /// Parent namespace contains child namespace.
    Contains(Identifier),
    /// `using namespace` directive from source to target.
    Uses,
}

/// What an alias stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SymbolType {
    Struct,
    Function,
    Variable,
    UsingAlias,
    Constant,
    StaticFunctionClass,
    Enum,
    EnumValue,
    TemplatedClass,
    TemplatedFunction,
    #[default]
    Unknown,
}

impl SymbolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolType::Struct => "struct",
            SymbolType::Function => "function",
            SymbolType::Variable => "variable",
            SymbolType::UsingAlias => "using",
            SymbolType::Constant => "constant",
            SymbolType::StaticFunctionClass => "class",
            SymbolType::Enum => "enum",
            SymbolType::EnumValue => "enum value",
            SymbolType::TemplatedClass => "template class",
            SymbolType::TemplatedFunction => "template function",
            SymbolType::Unknown => "unknown",
        }
    }

    /// Whether the alias names a type rather than a value.
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            SymbolType::Struct
                | SymbolType::UsingAlias
                | SymbolType::Enum
                | SymbolType::TemplatedClass
        )
    }
}

/// A name declared in a namespace.
#[derive(Debug, Clone)]
pub struct Alias {
    pub id: NamespacedIdentifier,
    pub type_info: TypeInfo,
    pub symbol_type: SymbolType,
    pub visibility: Visibility,
    pub constant_value: Option<VariableStorage>,
    pub description: String,
}

impl Alias {
    pub fn new(id: NamespacedIdentifier, type_info: TypeInfo, symbol_type: SymbolType) -> Self {
        Self {
            id,
            type_info,
            symbol_type,
            visibility: Visibility::Public,
            constant_value: None,
            description: String::new(),
        }
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.symbol_type.as_str())?;
        if !self.type_info.is_void() {
            write!(f, "{} ", self.type_info.to_string_without_alias())?;
        }
        write!(f, "{}", self.id)?;
        if let Some(v) = &self.constant_value {
            write!(f, " = {v}")?;
        }
        Ok(())
    }
}

/// Data stored in each namespace node.
#[derive(Debug, Default)]
pub struct NamespaceData {
    /// Full path of this namespace. Empty for the root.
    pub id: NamespacedIdentifier,
    aliases: Vec<Alias>,
    index: FxHashMap<Identifier, usize>,
}

impl NamespaceData {
    fn new(id: NamespacedIdentifier) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Aliases in declaration order.
    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }

    pub fn get(&self, name: &Identifier) -> Option<&Alias> {
        self.index.get(name).map(|&i| &self.aliases[i])
    }

    fn get_mut(&mut self, name: &Identifier) -> Option<&mut Alias> {
        self.index.get(name).map(|&i| &mut self.aliases[i])
    }

    fn insert(&mut self, alias: Alias) {
        self.index
            .insert(alias.id.get_identifier().clone(), self.aliases.len());
        self.aliases.push(alias);
    }
}

/// The namespace tree of one compilation plus the complex types it owns.
pub struct NamespaceHandler {
    graph: DiGraph<NamespaceData, NamespaceEdge>,
    root: NodeIndex,
    current: NodeIndex,
    /// Namespaces to return to on `pop_namespace`.
    stack: Vec<NodeIndex>,
    complex_types: Vec<ComplexTypePtr>,
    complex_type_index: FxHashMap<TypeHash, usize>,
    templates: Vec<TemplateObject>,
}

impl Default for NamespaceHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NamespaceHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespaceHandler")
            .field("namespaces", &self.graph.node_count())
            .field("current", &self.current_namespace())
            .field("complex_types", &self.complex_types.len())
            .field("templates", &self.templates.len())
            .finish()
    }
}

impl NamespaceHandler {
    /// Create a handler with an empty root namespace as current namespace.
    pub fn new() -> Self {
        let mut graph = DiGraph::new();
        let root = graph.add_node(NamespaceData::new(NamespacedIdentifier::root()));
        Self {
            graph,
            root,
            current: root,
            stack: Vec::new(),
            complex_types: Vec::new(),
            complex_type_index: FxHashMap::default(),
            templates: Vec::new(),
        }
    }

    fn data(&self, node: NodeIndex) -> &NamespaceData {
        &self.graph[node]
    }

    // ========================================================================
    // Tree structure
    // ========================================================================

    fn find_child(&self, parent: NodeIndex, name: &Identifier) -> Option<NodeIndex> {
        self.graph.edges(parent).find_map(|edge| match edge.weight() {
            NamespaceEdge::Contains(child) if child == name => Some(edge.target()),
            _ => None,
        })
    }

    fn get_or_create_child(&mut self, parent: NodeIndex, name: &Identifier) -> NodeIndex {
        if let Some(child) = self.find_child(parent, name) {
            return child;
        }

        let id = self.data(parent).id.get_child_id(name.clone());
        tracing::debug!(target: "snex::namespace", namespace = %id, "created namespace");
        let child = self.graph.add_node(NamespaceData::new(id));
        self.graph
            .add_edge(parent, child, NamespaceEdge::Contains(name.clone()));
        child
    }

    fn get_or_create_path(&mut self, path: &NamespacedIdentifier) -> NodeIndex {
        let mut current = self.root;
        for segment in path.get_id_list() {
            current = self.get_or_create_child(current, &segment);
        }
        current
    }

    fn get_path(&self, path: &NamespacedIdentifier) -> Option<NodeIndex> {
        let mut current = self.root;
        for segment in path.get_id_list() {
            current = self.find_child(current, &segment)?;
        }
        Some(current)
    }

    fn find_parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .find(|edge| matches!(edge.weight(), NamespaceEdge::Contains(_)))
            .map(|edge| edge.source())
    }

    fn children(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<_> = self
            .graph
            .edges(node)
            .filter(|edge| matches!(edge.weight(), NamespaceEdge::Contains(_)))
            .map(|edge| edge.target())
            .collect();
        children.sort_by(|a, b| self.data(*a).id.cmp(&self.data(*b).id));
        children
    }

    /// Imports of a namespace in the order they were added.
    fn get_using_directives(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut used: Vec<_> = self
            .graph
            .edges(node)
            .filter(|edge| matches!(edge.weight(), NamespaceEdge::Uses))
            .map(|edge| edge.target())
            .collect();
        // petgraph iterates outgoing edges newest first
        used.reverse();
        used
    }

    // ========================================================================
    // Current namespace
    // ========================================================================

    /// Full path of the namespace declarations are currently added to.
    pub fn current_namespace(&self) -> NamespacedIdentifier {
        self.data(self.current).id.clone()
    }

    /// Whether `id` names an existing namespace (absolute path).
    pub fn is_namespace(&self, id: &NamespacedIdentifier) -> bool {
        self.get_path(id).is_some()
    }

    /// Descend into the child namespace `name`, creating it if needed.
    /// Returns the new current namespace.
    pub fn push_namespace(&mut self, name: impl Into<Identifier>) -> NamespacedIdentifier {
        let name = name.into();
        self.stack.push(self.current);
        self.current = self.get_or_create_child(self.current, &name);
        self.current_namespace()
    }

    /// Return to the namespace that was current before the last push or
    /// switch.
    pub fn pop_namespace(&mut self) -> Result<NamespacedIdentifier, ResolveError> {
        self.current = self.stack.pop().ok_or(ResolveError::PopRoot)?;
        Ok(self.current_namespace())
    }

    /// Make an existing namespace current. Undone by `pop_namespace`.
    pub fn switch_to_existing_namespace(
        &mut self,
        id: &NamespacedIdentifier,
    ) -> Result<(), ResolveError> {
        let node = self.get_path(id).ok_or_else(|| ResolveError::NotANamespace {
            name: id.to_string(),
        })?;
        self.stack.push(self.current);
        self.current = node;
        Ok(())
    }

    /// Make the namespace at the absolute path `id` current until the
    /// returned guard is dropped. The namespace is created if needed.
    pub fn scoped_namespace(&mut self, id: &NamespacedIdentifier) -> ScopedNamespaceSetter<'_> {
        let previous = self.current;
        let depth = self.stack.len();
        self.current = self.get_or_create_path(id);
        ScopedNamespaceSetter {
            handler: self,
            previous,
            depth,
        }
    }

    /// Scoped variant of [`push_namespace`](Self::push_namespace).
    pub fn enter_namespace(&mut self, name: impl Into<Identifier>) -> ScopedNamespaceSetter<'_> {
        let previous = self.current;
        let depth = self.stack.len();
        let name = name.into();
        self.current = self.get_or_create_child(self.current, &name);
        ScopedNamespaceSetter {
            handler: self,
            previous,
            depth,
        }
    }

    /// Import `id` into the current namespace. `id` is looked up relative
    /// to the current namespace and its parents.
    pub fn add_used_namespace(&mut self, id: &NamespacedIdentifier) -> Result<(), ResolveError> {
        let target = self
            .ancestors(self.current)
            .into_iter()
            .find_map(|node| self.get_path(&self.data(node).id.join(id)))
            .ok_or_else(|| ResolveError::NotANamespace {
                name: id.to_string(),
            })?;

        if target == self.current {
            return Ok(());
        }

        let already = self
            .graph
            .edges(self.current)
            .any(|edge| matches!(edge.weight(), NamespaceEdge::Uses) && edge.target() == target);
        if !already {
            tracing::debug!(
                target: "snex::namespace",
                from = %self.current_namespace(),
                to = %self.data(target).id,
                "using namespace"
            );
            self.graph.add_edge(self.current, target, NamespaceEdge::Uses);
        }
        Ok(())
    }

    fn ancestors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut list = Vec::new();
        let mut scope = Some(node);
        while let Some(n) = scope {
            list.push(n);
            scope = self.find_parent(n);
        }
        list
    }

    // ========================================================================
    // Symbols
    // ========================================================================

    /// Look up the alias at an absolute path.
    pub fn get_alias(&self, id: &NamespacedIdentifier) -> Option<&Alias> {
        let node = self.get_path(&id.get_parent())?;
        self.data(node).get(id.get_identifier())
    }

    fn get_alias_mut(&mut self, id: &NamespacedIdentifier) -> Result<&mut Alias, ResolveError> {
        let node = self
            .get_path(&id.get_parent())
            .ok_or_else(|| ResolveError::UnknownSymbol {
                name: id.to_string(),
            })?;
        self.graph[node]
            .get_mut(id.get_identifier())
            .ok_or_else(|| ResolveError::UnknownSymbol {
                name: id.to_string(),
            })
    }

    /// Declare `id` (an absolute path). Missing parent namespaces are
    /// created. Functions may be declared repeatedly to add overloads; any
    /// other redeclaration is an error.
    pub fn add_symbol(
        &mut self,
        id: NamespacedIdentifier,
        type_info: TypeInfo,
        symbol_type: SymbolType,
        visibility: Visibility,
    ) -> Result<(), ResolveError> {
        let node = self.get_or_create_path(&id.get_parent());

        if let Some(existing) = self.data(node).get(id.get_identifier()) {
            let overloadable = matches!(
                symbol_type,
                SymbolType::Function | SymbolType::TemplatedFunction
            );
            if overloadable && existing.symbol_type == symbol_type {
                return Ok(());
            }
            return Err(ResolveError::DuplicateSymbol {
                name: id.to_string(),
            });
        }

        tracing::debug!(
            target: "snex::namespace",
            symbol = %id,
            kind = symbol_type.as_str(),
            "added symbol"
        );

        let mut alias = Alias::new(id, type_info, symbol_type);
        alias.visibility = visibility;
        self.graph[node].insert(alias);
        Ok(())
    }

    pub fn change_symbol_type(
        &mut self,
        id: &NamespacedIdentifier,
        symbol_type: SymbolType,
    ) -> Result<(), ResolveError> {
        self.get_alias_mut(id)?.symbol_type = symbol_type;
        Ok(())
    }

    pub fn set_type_info(
        &mut self,
        id: &NamespacedIdentifier,
        type_info: TypeInfo,
    ) -> Result<(), ResolveError> {
        self.get_alias_mut(id)?.type_info = type_info;
        Ok(())
    }

    /// Declare or update a compile time constant.
    pub fn add_constant(
        &mut self,
        id: NamespacedIdentifier,
        value: VariableStorage,
    ) -> Result<(), ResolveError> {
        self.set_constant(id, value, SymbolType::Constant)
    }

    /// Declare one value of an enum. Enum values are integer constants.
    pub fn add_enum_value(
        &mut self,
        id: NamespacedIdentifier,
        value: i32,
    ) -> Result<(), ResolveError> {
        self.set_constant(id, VariableStorage::Integer(value), SymbolType::EnumValue)
    }

    fn set_constant(
        &mut self,
        id: NamespacedIdentifier,
        value: VariableStorage,
        symbol_type: SymbolType,
    ) -> Result<(), ResolveError> {
        let type_info = TypeInfo::new(value.type_id()).with_const(true);
        if self.get_alias(&id).is_none() {
            self.add_symbol(id.clone(), type_info.clone(), symbol_type, Visibility::Public)?;
        }

        let alias = self.get_alias_mut(&id)?;
        if !matches!(
            alias.symbol_type,
            SymbolType::Constant | SymbolType::Variable | SymbolType::EnumValue
        ) {
            return Err(ResolveError::DuplicateSymbol {
                name: id.to_string(),
            });
        }
        alias.symbol_type = symbol_type;
        alias.type_info = type_info;
        alias.constant_value = Some(value);
        Ok(())
    }

    pub fn get_constant_value(&self, id: &NamespacedIdentifier) -> Option<VariableStorage> {
        self.get_alias(id).and_then(|a| a.constant_value)
    }

    /// The kind of `id`, [`SymbolType::Unknown`] if it isn't declared.
    pub fn get_symbol_type(&self, id: &NamespacedIdentifier) -> SymbolType {
        self.get_alias(id)
            .map(|a| a.symbol_type)
            .unwrap_or_default()
    }

    /// Type of a declared value or function return.
    pub fn get_variable_type(&self, id: &NamespacedIdentifier) -> Option<TypeInfo> {
        self.get_alias(id).map(|a| a.type_info.clone())
    }

    /// The type a type alias, struct or enum stands for. The returned type
    /// carries `id` as its alias name.
    pub fn get_alias_type(&self, id: &NamespacedIdentifier) -> Result<TypeInfo, ResolveError> {
        match self.get_alias(id) {
            Some(a) if a.symbol_type.is_type() => {
                Ok(a.type_info.clone().with_alias(a.id.clone()))
            }
            _ => Err(ResolveError::NotFound {
                name: id.to_string(),
            }),
        }
    }

    /// Copy every alias of `source` into the current namespace. Names that
    /// already exist there are kept. Returns the number of copied aliases.
    pub fn copy_symbols_from_existing_namespace(
        &mut self,
        source: &NamespacedIdentifier,
    ) -> Result<usize, ResolveError> {
        let node = self.get_path(source).ok_or_else(|| ResolveError::NotANamespace {
            name: source.to_string(),
        })?;
        let target = self.current_namespace();
        let aliases: Vec<Alias> = self.data(node).aliases().to_vec();

        let mut copied = 0;
        for mut alias in aliases {
            alias.id = alias.id.relocate(source, &target);
            if self.data(self.current).get(alias.id.get_identifier()).is_none() {
                self.graph[self.current].insert(alias);
                copied += 1;
            }
        }
        Ok(copied)
    }

    // ========================================================================
    // Complex types
    // ========================================================================

    /// Intern a complex type. A structurally identical type that was
    /// interned before is returned instead of `ty`.
    pub fn register_complex_type_or_return_existing(
        &mut self,
        ty: ComplexTypePtr,
    ) -> ComplexTypePtr {
        let hash = ty.type_hash();
        if let Some(&i) = self.complex_type_index.get(&hash) {
            return self.complex_types[i].clone();
        }

        tracing::debug!(
            target: "snex::namespace",
            ty = %ty.to_string_internal(),
            "interned complex type"
        );
        self.complex_type_index.insert(hash, self.complex_types.len());
        self.complex_types.push(ty.clone());
        ty
    }

    /// The complex type a struct or alias declaration refers to.
    pub fn get_complex_type(&self, id: &NamespacedIdentifier) -> Option<ComplexTypePtr> {
        self.get_alias(id)
            .and_then(|a| a.type_info.get_complex_type().cloned())
    }

    /// Every interned complex type in interning order.
    pub fn complex_types(&self) -> &[ComplexTypePtr] {
        &self.complex_types
    }

    // ========================================================================
    // Templates
    // ========================================================================

    /// Declare a class template. Its id must not name anything else.
    pub fn add_template_class(&mut self, template: TemplateObject) -> Result<(), ResolveError> {
        if !template.is_class() {
            return Err(template.invalid(&[], "not a class template".to_string()));
        }
        self.add_symbol(
            template.id.clone(),
            TypeInfo::void(),
            SymbolType::TemplatedClass,
            Visibility::Public,
        )?;
        self.set_description(&template.id, template.description.clone())?;
        self.templates.push(template);
        Ok(())
    }

    /// Declare a function template. Several templates may share an id when
    /// their parameter counts differ.
    pub fn add_template_function(&mut self, template: TemplateObject) -> Result<(), ResolveError> {
        if template.is_class() {
            return Err(template.invalid(&[], "not a function template".to_string()));
        }
        self.add_symbol(
            template.id.clone(),
            TypeInfo::void(),
            SymbolType::TemplatedFunction,
            Visibility::Public,
        )?;
        self.templates.push(template);
        Ok(())
    }

    pub fn template_objects(&self) -> &[TemplateObject] {
        &self.templates
    }

    pub fn is_template_class_id(&self, id: &NamespacedIdentifier) -> bool {
        self.templates.iter().any(|t| t.is_class() && &t.id == id)
    }

    /// The template `id` that accepts `num_args` explicit arguments. Class
    /// templates are preferred over function templates.
    pub fn get_template_object(&self, id: &NamespacedIdentifier, num_args: usize) -> Option<&TemplateObject> {
        let candidates = || {
            self.templates
                .iter()
                .filter(|t| &t.id == id && t.is_valid_amount(num_args))
        };
        candidates()
            .find(|t| t.is_class())
            .or_else(|| candidates().next())
    }

    /// An interned instance of class template `id` for the completed
    /// argument list `args`.
    pub fn get_existing_template_instantiation(
        &self,
        id: &NamespacedIdentifier,
        args: &[TemplateArgument],
    ) -> Option<ComplexTypePtr> {
        self.complex_types
            .iter()
            .find(|c| {
                c.as_struct()
                    .is_some_and(|s| s.id() == id && s.template_arguments() == args)
            })
            .cloned()
    }

    fn class_template(
        &self,
        id: &NamespacedIdentifier,
        args: &[TemplateArgument],
    ) -> Result<TemplateObject, ResolveError> {
        let mut classes = self.templates.iter().filter(|t| t.is_class() && &t.id == id);
        let Some(first) = classes.next() else {
            return Err(ResolveError::NotFound {
                name: id.to_string(),
            });
        };
        if first.is_valid_amount(args.len()) {
            return Ok(first.clone());
        }
        classes
            .find(|t| t.is_valid_amount(args.len()))
            .cloned()
            .ok_or_else(|| {
                first.invalid(
                    args,
                    format!("expected {} arguments, got {}", first.parameters.len(), args.len()),
                )
            })
    }

    /// Instantiate class template `id`. The finalised instance is interned,
    /// so equal argument lists always return the same pointer.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn create_template_instantiation(
        &mut self,
        id: &NamespacedIdentifier,
        args: &[TemplateArgument],
    ) -> Result<ComplexTypePtr, ResolveError> {
        let template = self.class_template(id, args)?;
        let args = template.complete_arguments(args)?;
        if let Some(existing) = self.get_existing_template_instantiation(id, &args) {
            return Ok(existing);
        }

        let TemplateBuilder::Class(build) = &template.builder else {
            return Err(template.invalid(&args, "not a class template".to_string()));
        };
        let base = args
            .iter()
            .cloned()
            .fold(StructType::new(id.clone()), StructType::with_template_argument);
        let built = build(base, &args).map_err(|message| template.invalid(&args, message))?;
        if built.id() != id || built.template_arguments() != args.as_slice() {
            return Err(template.invalid(&args, "builder replaced the instance name".to_string()));
        }

        let complex: ComplexType = built.into();
        complex
            .finalise_alignment()
            .map_err(|e| template.invalid(&args, e.to_string()))?;
        tracing::debug!(
            target: "snex::namespace",
            instance = %instance_name(id, &args),
            size = complex.required_byte_size(),
            "instantiated template"
        );
        Ok(self.register_complex_type_or_return_existing(Arc::new(complex)))
    }

    /// The function that function template `id` produces for `args`.
    pub fn instantiate_template_function(
        &self,
        id: &NamespacedIdentifier,
        args: &[TemplateArgument],
    ) -> Result<FunctionData, ResolveError> {
        let template = self
            .templates
            .iter()
            .find(|t| !t.is_class() && &t.id == id && t.is_valid_amount(args.len()))
            .ok_or_else(|| ResolveError::NotFound {
                name: instance_name(id, args),
            })?;
        let args = template.complete_arguments(args)?;
        let TemplateBuilder::Function(build) = &template.builder else {
            return Err(template.invalid(&args, "not a function template".to_string()));
        };
        build(id, &args).map_err(|message| template.invalid(&args, message))
    }

    // ========================================================================
    // Descriptions
    // ========================================================================

    pub fn set_description(
        &mut self,
        id: &NamespacedIdentifier,
        description: impl Into<String>,
    ) -> Result<(), ResolveError> {
        self.get_alias_mut(id)?.description = description.into();
        Ok(())
    }

    pub fn get_description_for_item(&self, id: &NamespacedIdentifier) -> Option<&str> {
        self.get_alias(id)
            .map(|a| a.description.as_str())
            .filter(|d| !d.is_empty())
    }

    /// Render the whole tree, one namespace block per level.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_node(self.root, 0, &mut out);
        out
    }

    fn dump_node(&self, node: NodeIndex, depth: usize, out: &mut String) {
        let data = self.data(node);
        let indent = "  ".repeat(depth);
        let inner = if node == self.root {
            indent.clone()
        } else {
            let _ = writeln!(out, "{indent}namespace {} {{", data.id.get_identifier());
            "  ".repeat(depth + 1)
        };

        for used in self.get_using_directives(node) {
            let _ = writeln!(out, "{inner}using namespace {};", self.data(used).id);
        }
        for alias in data.aliases() {
            let _ = write!(out, "{inner}{alias}");
            if !alias.description.is_empty() {
                let _ = write!(out, " // {}", alias.description);
            }
            out.push('\n');
        }
        for child in self.children(node) {
            self.dump_node(child, if node == self.root { depth } else { depth + 1 }, out);
        }

        if node != self.root {
            let _ = writeln!(out, "{indent}}}");
        }
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    fn exists(&self, id: &NamespacedIdentifier) -> bool {
        self.get_alias(id).is_some() || (!id.is_root() && self.get_path(id).is_some())
    }

    /// Resolve `id` from the current namespace.
    ///
    /// Search order, for the current namespace and then each parent up to
    /// the root:
    /// 1. aliases declared in that namespace
    /// 2. namespaces it imports via `using namespace` (non-transitive)
    pub fn resolve_checked(&self, id: &NamespacedIdentifier) -> ResolutionResult<NamespacedIdentifier> {
        let mut scope = Some(self.current);
        while let Some(node) = scope {
            let candidate = self.data(node).id.join(id);
            if self.exists(&candidate) {
                return ResolutionResult::Found(candidate);
            }

            let mut matches: Vec<NamespacedIdentifier> = Vec::new();
            for used in self.get_using_directives(node) {
                let candidate = self.data(used).id.join(id);
                if self.exists(&candidate) && !matches.contains(&candidate) {
                    matches.push(candidate);
                }
            }

            match matches.len() {
                0 => {}
                1 => return ResolutionResult::Found(matches.remove(0)),
                _ => return ResolutionResult::Ambiguous(matches),
            }

            scope = self.find_parent(node);
        }
        ResolutionResult::NotFound
    }

    /// Fail if `id` is private or protected and the current namespace is
    /// neither its parent nor nested inside its parent. Unknown names pass.
    pub fn check_visibility(&self, id: &NamespacedIdentifier) -> Result<(), ResolveError> {
        let Some(alias) = self.get_alias(id) else {
            return Ok(());
        };
        if alias.visibility == Visibility::Public {
            return Ok(());
        }
        if id.get_parent().is_parent_of(&self.current_namespace()) {
            return Ok(());
        }
        Err(ResolveError::NotAccessible {
            name: alias.to_string(),
        })
    }

    /// Replace `id` with the absolute path it resolves to.
    ///
    /// With `allow_zero_match` an unknown name leaves `id` untouched and
    /// succeeds; ambiguity is always an error.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn resolve(
        &self,
        id: &mut NamespacedIdentifier,
        allow_zero_match: bool,
    ) -> Result<(), ResolveError> {
        match self.resolve_checked(id) {
            ResolutionResult::Found(resolved) => {
                *id = resolved;
                Ok(())
            }
            ResolutionResult::Ambiguous(candidates) => Err(ResolveError::Ambiguous {
                name: id.to_string(),
                candidates: candidates.iter().map(ToString::to_string).collect(),
            }),
            ResolutionResult::NotFound if allow_zero_match => Ok(()),
            ResolutionResult::NotFound => Err(ResolveError::NotFound {
                name: id.to_string(),
            }),
        }
    }
}

/// Guard that restores the previous current namespace when dropped.
///
/// Dereferences to the [`NamespaceHandler`] so declarations can be added
/// through it.
pub struct ScopedNamespaceSetter<'a> {
    handler: &'a mut NamespaceHandler,
    previous: NodeIndex,
    depth: usize,
}

impl Deref for ScopedNamespaceSetter<'_> {
    type Target = NamespaceHandler;

    fn deref(&self) -> &NamespaceHandler {
        self.handler
    }
}

impl DerefMut for ScopedNamespaceSetter<'_> {
    fn deref_mut(&mut self) -> &mut NamespaceHandler {
        self.handler
    }
}

impl Drop for ScopedNamespaceSetter<'_> {
    fn drop(&mut self) {
        self.handler.current = self.previous;
        self.handler.stack.truncate(self.depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateParameter;
    use snex_core::{SpanType, TypeId};

    fn id(s: &str) -> NamespacedIdentifier {
        NamespacedIdentifier::from_string(s)
    }

    fn int() -> TypeInfo {
        TypeInfo::new(TypeId::Integer)
    }

    fn add_var(h: &mut NamespaceHandler, name: &str) {
        h.add_symbol(id(name), int(), SymbolType::Variable, Visibility::Public)
            .unwrap();
    }

    // ========================================================================
    // Namespace Navigation Tests
    // ========================================================================

    #[test]
    fn push_and_pop() {
        let mut h = NamespaceHandler::new();
        assert!(h.current_namespace().is_root());

        assert_eq!(h.push_namespace("A").to_string(), "A");
        assert_eq!(h.push_namespace("B").to_string(), "A::B");
        assert_eq!(h.pop_namespace().unwrap().to_string(), "A");
        assert!(h.pop_namespace().unwrap().is_root());
        assert!(h.is_namespace(&id("A::B")));
    }

    #[test]
    fn pop_root_fails() {
        let mut h = NamespaceHandler::new();
        match h.pop_namespace() {
            Err(ResolveError::PopRoot) => {}
            other => panic!("Expected PopRoot, got {other:?}"),
        }
    }

    #[test]
    fn push_reuses_existing_namespace() {
        let mut h = NamespaceHandler::new();
        h.push_namespace("A");
        add_var(&mut h, "A::x");
        h.pop_namespace().unwrap();

        h.push_namespace("A");
        let mut x = id("x");
        h.resolve(&mut x, false).unwrap();
        assert_eq!(x.to_string(), "A::x");
    }

    #[test]
    fn scoped_setter_restores_on_drop() {
        let mut h = NamespaceHandler::new();
        h.push_namespace("Outer");
        {
            let mut scoped = h.scoped_namespace(&id("Other::Inner"));
            assert_eq!(scoped.current_namespace().to_string(), "Other::Inner");
            scoped.push_namespace("Deeper");
        }
        assert_eq!(h.current_namespace().to_string(), "Outer");
        assert!(h.is_namespace(&id("Other::Inner::Deeper")));
    }

    #[test]
    fn scoped_setter_restores_on_error_path() {
        fn declare(h: &mut NamespaceHandler) -> Result<(), ResolveError> {
            let mut scoped = h.enter_namespace("Voice");
            let x = scoped.current_namespace().get_child_id("x");
            scoped.add_symbol(x.clone(), int(), SymbolType::Variable, Visibility::Public)?;
            scoped.add_symbol(x, int(), SymbolType::Variable, Visibility::Public)?;
            Ok(())
        }

        let mut h = NamespaceHandler::new();
        assert!(declare(&mut h).is_err());
        assert!(h.current_namespace().is_root());
    }

    #[test]
    fn switch_to_existing() {
        let mut h = NamespaceHandler::new();
        match h.switch_to_existing_namespace(&id("Nope")) {
            Err(ResolveError::NotANamespace { name }) => assert_eq!(name, "Nope"),
            other => panic!("Expected NotANamespace, got {other:?}"),
        }

        h.push_namespace("A");
        h.pop_namespace().unwrap();
        h.switch_to_existing_namespace(&id("A")).unwrap();
        assert_eq!(h.current_namespace().to_string(), "A");
        h.pop_namespace().unwrap();
        assert!(h.current_namespace().is_root());
    }

    // ========================================================================
    // Resolution Tests
    // ========================================================================

    #[test]
    fn resolve_in_empty_root_fails() {
        let h = NamespaceHandler::new();
        let mut foo = id("foo");
        match h.resolve(&mut foo, false) {
            Err(ResolveError::NotFound { name }) => assert_eq!(name, "foo"),
            other => panic!("Expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn resolve_allow_zero_match_keeps_id() {
        let h = NamespaceHandler::new();
        let mut foo = id("foo");
        h.resolve(&mut foo, true).unwrap();
        assert_eq!(foo.to_string(), "foo");
    }

    #[test]
    fn nested_symbol_visible_from_inside_only() {
        let mut h = NamespaceHandler::new();
        add_var(&mut h, "A::B::x");

        h.switch_to_existing_namespace(&id("A::B")).unwrap();
        let mut x = id("x");
        h.resolve(&mut x, false).unwrap();
        assert_eq!(x.to_string(), "A::B::x");

        h.push_namespace("C");
        let mut x = id("x");
        h.resolve(&mut x, false).unwrap();
        assert_eq!(x.to_string(), "A::B::x");

        h.switch_to_existing_namespace(&id("A")).unwrap();
        assert!(h.resolve_checked(&id("x")).is_not_found());
    }

    #[test]
    fn used_namespace_exposes_symbols() {
        let mut h = NamespaceHandler::new();
        add_var(&mut h, "A::B::x");

        h.switch_to_existing_namespace(&id("A")).unwrap();
        h.add_used_namespace(&id("B")).unwrap();
        let mut x = id("x");
        h.resolve(&mut x, false).unwrap();
        assert_eq!(x.to_string(), "A::B::x");
    }

    #[test]
    fn used_namespaces_are_not_transitive() {
        let mut h = NamespaceHandler::new();
        add_var(&mut h, "Lib::value");

        h.push_namespace("Mid");
        h.add_used_namespace(&id("Lib")).unwrap();
        h.pop_namespace().unwrap();

        h.push_namespace("Top");
        h.add_used_namespace(&id("Mid")).unwrap();
        assert!(h.resolve_checked(&id("value")).is_not_found());
    }

    #[test]
    fn own_symbol_shadows_import() {
        let mut h = NamespaceHandler::new();
        add_var(&mut h, "Lib::gain");
        add_var(&mut h, "App::gain");

        h.push_namespace("App");
        h.add_used_namespace(&id("Lib")).unwrap();
        let mut gain = id("gain");
        h.resolve(&mut gain, false).unwrap();
        assert_eq!(gain.to_string(), "App::gain");
    }

    #[test]
    fn ambiguous_imports_are_an_error() {
        let mut h = NamespaceHandler::new();
        add_var(&mut h, "L::size");
        add_var(&mut h, "R::size");

        h.push_namespace("App");
        h.add_used_namespace(&id("L")).unwrap();
        h.add_used_namespace(&id("R")).unwrap();

        let mut size = id("size");
        match h.resolve(&mut size, true) {
            Err(ResolveError::Ambiguous { name, candidates }) => {
                assert_eq!(name, "size");
                assert_eq!(candidates, vec!["L::size", "R::size"]);
            }
            other => panic!("Expected Ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn explicit_id_resolves_relative_to_parents() {
        let mut h = NamespaceHandler::new();
        add_var(&mut h, "A::B::x");

        h.push_namespace("A");
        let mut x = id("B::x");
        h.resolve(&mut x, false).unwrap();
        assert_eq!(x.to_string(), "A::B::x");

        h.push_namespace("Other");
        let mut x = id("A::B::x");
        h.resolve(&mut x, false).unwrap();
        assert_eq!(x.to_string(), "A::B::x");
    }

    #[test]
    fn unknown_used_namespace_fails() {
        let mut h = NamespaceHandler::new();
        match h.add_used_namespace(&id("Missing")) {
            Err(ResolveError::NotANamespace { .. }) => {}
            other => panic!("Expected NotANamespace, got {other:?}"),
        }
    }

    #[test]
    fn private_symbols_are_visible_inside_their_parent_only() {
        let mut h = NamespaceHandler::new();
        h.add_symbol(id("Voice::limit"), int(), SymbolType::Constant, Visibility::Private)
            .unwrap();
        add_var(&mut h, "Voice::gain");

        h.switch_to_existing_namespace(&id("Voice")).unwrap();
        h.check_visibility(&id("Voice::limit")).unwrap();
        h.push_namespace("Inner");
        h.check_visibility(&id("Voice::limit")).unwrap();
        h.pop_namespace().unwrap();
        h.pop_namespace().unwrap();

        match h.check_visibility(&id("Voice::limit")) {
            Err(ResolveError::NotAccessible { name }) => {
                assert_eq!(name, "constant int Voice::limit")
            }
            other => panic!("Expected NotAccessible, got {other:?}"),
        }
        h.check_visibility(&id("Voice::gain")).unwrap();
        h.check_visibility(&id("Voice::missing")).unwrap();
    }

    // ========================================================================
    // Symbol Tests
    // ========================================================================

    #[test]
    fn duplicate_symbol_fails() {
        let mut h = NamespaceHandler::new();
        add_var(&mut h, "x");
        match h.add_symbol(id("x"), int(), SymbolType::Variable, Visibility::Public) {
            Err(ResolveError::DuplicateSymbol { name }) => assert_eq!(name, "x"),
            other => panic!("Expected DuplicateSymbol, got {other:?}"),
        }
    }

    #[test]
    fn function_overloads_share_one_alias() {
        let mut h = NamespaceHandler::new();
        h.add_symbol(id("Math::sin"), int(), SymbolType::Function, Visibility::Public)
            .unwrap();
        h.add_symbol(id("Math::sin"), int(), SymbolType::Function, Visibility::Public)
            .unwrap();
        assert_eq!(h.get_symbol_type(&id("Math::sin")), SymbolType::Function);
    }

    #[test]
    fn change_symbol_type_and_type_info() {
        let mut h = NamespaceHandler::new();
        add_var(&mut h, "v");
        h.change_symbol_type(&id("v"), SymbolType::Constant).unwrap();
        h.set_type_info(&id("v"), TypeInfo::new(TypeId::Float)).unwrap();

        assert_eq!(h.get_symbol_type(&id("v")), SymbolType::Constant);
        assert_eq!(h.get_variable_type(&id("v")), Some(TypeInfo::new(TypeId::Float)));

        match h.change_symbol_type(&id("missing"), SymbolType::Variable) {
            Err(ResolveError::UnknownSymbol { .. }) => {}
            other => panic!("Expected UnknownSymbol, got {other:?}"),
        }
    }

    #[test]
    fn constants() {
        let mut h = NamespaceHandler::new();
        h.add_constant(id("Config::size"), VariableStorage::Integer(4))
            .unwrap();
        assert_eq!(
            h.get_constant_value(&id("Config::size")),
            Some(VariableStorage::Integer(4))
        );

        h.add_constant(id("Config::size"), VariableStorage::Integer(8))
            .unwrap();
        assert_eq!(
            h.get_constant_value(&id("Config::size")),
            Some(VariableStorage::Integer(8))
        );
        assert!(h.get_variable_type(&id("Config::size")).unwrap().is_const());
    }

    #[test]
    fn constant_cannot_replace_struct() {
        let mut h = NamespaceHandler::new();
        h.add_symbol(id("S"), TypeInfo::void(), SymbolType::Struct, Visibility::Public)
            .unwrap();
        assert!(h.add_constant(id("S"), VariableStorage::Integer(1)).is_err());
    }

    #[test]
    fn enum_values() {
        let mut h = NamespaceHandler::new();
        h.add_symbol(id("Mode"), int(), SymbolType::Enum, Visibility::Public)
            .unwrap();
        h.add_enum_value(id("Mode::Fast"), 0).unwrap();
        h.add_enum_value(id("Mode::Slow"), 3).unwrap();

        assert_eq!(h.get_symbol_type(&id("Mode::Slow")), SymbolType::EnumValue);
        assert_eq!(
            h.get_constant_value(&id("Mode::Slow")),
            Some(VariableStorage::Integer(3))
        );
        assert_eq!(h.get_alias_type(&id("Mode")).unwrap(), int());
    }

    #[test]
    fn alias_type_carries_name() {
        let mut h = NamespaceHandler::new();
        let span: ComplexTypePtr = Arc::new(SpanType::new(int(), 4).into());
        h.add_symbol(
            id("Buffer"),
            TypeInfo::from_complex(span.clone()),
            SymbolType::UsingAlias,
            Visibility::Public,
        )
        .unwrap();

        let t = h.get_alias_type(&id("Buffer")).unwrap();
        assert_eq!(t.to_string(), "Buffer");
        assert_eq!(t, TypeInfo::from_complex(span));

        assert!(h.get_alias_type(&id("Nope")).is_err());
    }

    #[test]
    fn copy_symbols_relocates() {
        let mut h = NamespaceHandler::new();
        add_var(&mut h, "Template::a");
        h.add_constant(id("Template::n"), VariableStorage::Integer(2))
            .unwrap();

        h.push_namespace("Instance");
        add_var(&mut h, "Instance::a");
        let copied = h
            .copy_symbols_from_existing_namespace(&id("Template"))
            .unwrap();
        assert_eq!(copied, 1);
        assert_eq!(
            h.get_constant_value(&id("Instance::n")),
            Some(VariableStorage::Integer(2))
        );
    }

    // ========================================================================
    // Complex Type Tests
    // ========================================================================

    #[test]
    fn complex_types_are_interned() {
        let mut h = NamespaceHandler::new();
        let a: ComplexTypePtr = Arc::new(SpanType::new(TypeInfo::new(TypeId::Float), 4).into());
        let b: ComplexTypePtr = Arc::new(SpanType::new(TypeInfo::new(TypeId::Float), 4).into());
        let c: ComplexTypePtr = Arc::new(SpanType::new(TypeInfo::new(TypeId::Float), 8).into());

        let first = h.register_complex_type_or_return_existing(a.clone());
        let second = h.register_complex_type_or_return_existing(b);
        let third = h.register_complex_type_or_return_existing(c);

        assert!(Arc::ptr_eq(&first, &a));
        assert!(Arc::ptr_eq(&second, &a));
        assert!(!Arc::ptr_eq(&third, &a));
        assert_eq!(h.complex_types().len(), 2);
    }

    #[test]
    fn struct_lookup_by_alias() {
        let mut h = NamespaceHandler::new();
        let s: ComplexType = StructType::new(id("Dsp::Voice"))
            .with_member("gain", TypeInfo::new(TypeId::Float))
            .into();
        let s = h.register_complex_type_or_return_existing(Arc::new(s));
        h.add_symbol(
            id("Dsp::Voice"),
            TypeInfo::from_complex(s.clone()),
            SymbolType::Struct,
            Visibility::Public,
        )
        .unwrap();

        let found = h.get_complex_type(&id("Dsp::Voice")).unwrap();
        assert!(Arc::ptr_eq(&found, &s));
        assert!(h.get_complex_type(&id("Dsp::Other")).is_none());
    }

    // ========================================================================
    // Template Tests
    // ========================================================================

    fn add_osc_template(h: &mut NamespaceHandler) {
        let osc = TemplateObject::class(
            id("Osc"),
            vec![
                TemplateParameter::type_parameter("T"),
                TemplateParameter::constant("NumChannels").with_default(TemplateArgument::Constant(2)),
            ],
            |s, args| match args {
                [TemplateArgument::Type(t), TemplateArgument::Constant(n)] if *n > 0 => {
                    Ok(s.with_member("value", t.clone()))
                }
                _ => Err("NumChannels must be positive".to_string()),
            },
        )
        .with_description("oscillator");
        h.add_template_class(osc).unwrap();
    }

    fn double() -> TemplateArgument {
        TemplateArgument::Type(TypeInfo::new(TypeId::Double))
    }

    #[test]
    fn template_instances_are_shared() {
        let mut h = NamespaceHandler::new();
        add_osc_template(&mut h);
        assert_eq!(h.get_symbol_type(&id("Osc")), SymbolType::TemplatedClass);
        assert_eq!(h.get_description_for_item(&id("Osc")), Some("oscillator"));
        assert!(h.is_template_class_id(&id("Osc")));

        let explicit = h
            .create_template_instantiation(&id("Osc"), &[double(), TemplateArgument::Constant(2)])
            .unwrap();
        let defaulted = h.create_template_instantiation(&id("Osc"), &[double()]).unwrap();
        let aliased = TypeInfo::new(TypeId::Double).with_alias(id("Sample"));
        let via_alias = h
            .create_template_instantiation(&id("Osc"), &[TemplateArgument::Type(aliased)])
            .unwrap();

        assert!(Arc::ptr_eq(&explicit, &defaulted));
        assert!(Arc::ptr_eq(&explicit, &via_alias));
        assert_eq!(explicit.to_string_internal(), "Osc<double, 2>");
        assert_eq!(explicit.required_byte_size(), 8);
        assert_eq!(h.complex_types().len(), 1);

        let other = h
            .create_template_instantiation(&id("Osc"), &[double(), TemplateArgument::Constant(1)])
            .unwrap();
        assert!(!Arc::ptr_eq(&explicit, &other));
        assert_eq!(h.complex_types().len(), 2);
    }

    #[test]
    fn template_argument_errors() {
        let mut h = NamespaceHandler::new();
        add_osc_template(&mut h);

        let three = [double(), TemplateArgument::Constant(2), TemplateArgument::Constant(3)];
        match h.create_template_instantiation(&id("Osc"), &three) {
            Err(ResolveError::InvalidTemplate { message, .. }) => {
                assert_eq!(message, "expected 2 arguments, got 3")
            }
            other => panic!("Expected InvalidTemplate, got {other:?}"),
        }

        match h.create_template_instantiation(&id("Osc"), &[double(), TemplateArgument::Constant(0)]) {
            Err(ResolveError::InvalidTemplate { name, message }) => {
                assert_eq!(name, "Osc<double, 0>");
                assert_eq!(message, "NumChannels must be positive");
            }
            other => panic!("Expected InvalidTemplate, got {other:?}"),
        }

        match h.create_template_instantiation(&id("Missing"), &[double()]) {
            Err(ResolveError::NotFound { name }) => assert_eq!(name, "Missing"),
            other => panic!("Expected NotFound, got {other:?}"),
        }
        assert!(h.complex_types().is_empty());
        let again = h.template_objects()[0].clone();
        assert!(h.add_template_class(again).is_err());
    }

    #[test]
    fn function_templates() {
        let mut h = NamespaceHandler::new();
        let sum = TemplateObject::function(
            id("Math::sum"),
            vec![TemplateParameter::type_parameter("T")],
            |fid, args| match args {
                [TemplateArgument::Type(t)] => Ok(FunctionData::new(fid.clone(), t.clone())
                    .with_arg("a", t.clone())
                    .with_arg("b", t.clone())),
                _ => Err("T must be a type".to_string()),
            },
        );
        h.add_template_function(sum.clone()).unwrap();
        h.add_template_function(sum).unwrap();
        assert_eq!(h.get_symbol_type(&id("Math::sum")), SymbolType::TemplatedFunction);

        let template = h.get_template_object(&id("Math::sum"), 1).unwrap();
        assert!(!template.is_class());
        assert!(h.get_template_object(&id("Math::sum"), 2).is_none());

        let f = h.instantiate_template_function(&id("Math::sum"), &[double()]).unwrap();
        assert_eq!(f.args.len(), 2);
        assert_eq!(f.return_type, TypeInfo::new(TypeId::Double));
        assert!(!h.is_template_class_id(&id("Math::sum")));
    }

    // ========================================================================
    // Description / Dump Tests
    // ========================================================================

    #[test]
    fn descriptions() {
        let mut h = NamespaceHandler::new();
        add_var(&mut h, "Synth::gain");
        assert_eq!(h.get_description_for_item(&id("Synth::gain")), None);

        h.set_description(&id("Synth::gain"), "output level").unwrap();
        assert_eq!(
            h.get_description_for_item(&id("Synth::gain")),
            Some("output level")
        );
        assert!(h.set_description(&id("Synth::missing"), "x").is_err());
    }

    #[test]
    fn dump_lists_namespaces_and_aliases() {
        let mut h = NamespaceHandler::new();
        add_var(&mut h, "top");
        h.add_constant(id("Lib::size"), VariableStorage::Integer(4))
            .unwrap();
        h.set_description(&id("Lib::size"), "buffer size").unwrap();
        h.push_namespace("App");
        h.add_used_namespace(&id("Lib")).unwrap();

        let dump = h.dump();
        let expected = "variable int top\n\
                        namespace App {\n  using namespace Lib;\n}\n\
                        namespace Lib {\n  constant const int Lib::size = 4 // buffer size\n}\n";
        assert_eq!(dump, expected);
    }
}
