//! The compilation-wide root scope.
//!
//! A [`GlobalScope`] is created once per host and reused across many
//! compilations. It carries the inbuilt functions, the function classes of
//! registered host objects, global constants, host templates and the
//! debugging and buffer services compiled code may reach.
//!
//! Registration is not synchronised. The host must not register or
//! deregister objects while a compilation is running on another thread.

use std::fmt;

use snex_core::{
    FunctionClass, FunctionData, FunctionError, NamespacedIdentifier, ObjectHandle, ScopeError,
    Symbol, TypeInfo, VariableStorage, select_overload,
};
use snex_registry::TemplateObject;

use crate::buffer::BufferHandler;
use crate::debug::{BreakpointHandler, DebugHandler, ObjectDeleteListener};
use crate::options::CompilerConfig;
use crate::scope::{BaseScope, ScopeKind};

/// A host object exposing functions to compiled code.
struct ObjectSlot {
    handle: ObjectHandle,
    class: Option<FunctionClass>,
}

pub struct GlobalScope {
    scope: BaseScope,
    functions: FunctionClass,
    objects: Vec<ObjectSlot>,
    templates: Vec<TemplateObject>,
    breakpoints: BreakpointHandler,
    buffers: BufferHandler,
    debug_handlers: Vec<Box<dyn DebugHandler + Send>>,
    delete_listeners: Vec<Box<dyn ObjectDeleteListener + Send>>,
    optimisation_passes: Vec<String>,
    config: CompilerConfig,
}

impl GlobalScope {
    pub fn new() -> Self {
        Self::with_config(CompilerConfig::default())
    }

    pub fn with_config(config: CompilerConfig) -> Self {
        let mut breakpoints = BreakpointHandler::new();
        breakpoints.set_enabled(config.debug_mode);
        Self {
            scope: BaseScope::new(
                ScopeKind::Global,
                NamespacedIdentifier::root(),
                None,
                config.root_class_capacity,
            ),
            functions: FunctionClass::new(NamespacedIdentifier::root()),
            objects: Vec::new(),
            templates: Vec::new(),
            breakpoints,
            buffers: BufferHandler::new(),
            debug_handlers: Vec::new(),
            delete_listeners: Vec::new(),
            optimisation_passes: config.optimisation_passes.clone(),
            config,
        }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn scope(&self) -> &BaseScope {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut BaseScope {
        &mut self.scope
    }

    // ========================================================================
    // Functions
    // ========================================================================

    /// Register an inbuilt function.
    pub fn add_function(&mut self, function: FunctionData) {
        tracing::debug!(target: "snex::jit", function = %function.get_signature(), "added inbuilt function");
        self.functions.add_function(function);
    }

    /// Register a static function class such as `Math`.
    pub fn add_function_class(&mut self, class: FunctionClass) {
        self.functions.add_function_class(class);
    }

    pub fn functions(&self) -> &FunctionClass {
        &self.functions
    }

    fn live_objects(&self) -> impl Iterator<Item = &FunctionClass> {
        self.objects.iter().filter_map(|o| o.class.as_ref())
    }

    /// Whether `id` names an inbuilt function or one of a registered object.
    pub fn has_function(&self, id: &NamespacedIdentifier) -> bool {
        self.functions.has_function(id) || self.live_objects().any(|c| c.has_function(id))
    }

    /// Append the overloads of `id`. Inbuilt functions come before those of
    /// registered objects.
    pub fn add_matching_functions(&self, matches: &mut Vec<FunctionData>, id: &NamespacedIdentifier) {
        self.functions.add_matching_functions(matches, id);
        for class in self.live_objects() {
            class.add_matching_functions(matches, id);
        }
    }

    /// Pick the overload of `id` accepting `arg_types` under the configured
    /// policy.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn resolve_call(
        &self,
        id: &NamespacedIdentifier,
        arg_types: &[TypeInfo],
    ) -> Result<FunctionData, FunctionError> {
        let mut candidates = Vec::new();
        self.add_matching_functions(&mut candidates, id);
        select_overload(&id.to_string(), candidates, arg_types, self.config.overload_policy)
    }

    // ========================================================================
    // Host objects
    // ========================================================================

    /// Expose the functions of a host object. Every function of `class` is
    /// bound to the returned handle, which goes stale once the object is
    /// deregistered.
    pub fn register_object_function(&mut self, mut class: FunctionClass) -> ObjectHandle {
        let handle = match self.objects.iter().position(|o| o.class.is_none()) {
            Some(index) => {
                let generation = self.objects[index].handle.generation.wrapping_add(1);
                ObjectHandle::new(index as u32, generation)
            }
            None => ObjectHandle::new(self.objects.len() as u32, 0),
        };

        class.bind_object(&handle);
        tracing::debug!(
            target: "snex::jit",
            class = %class.get_class_name(),
            index = handle.index,
            generation = handle.generation,
            "registered object"
        );

        let slot = ObjectSlot {
            handle: handle.clone(),
            class: Some(class),
        };
        match self.objects.get_mut(handle.index as usize) {
            Some(existing) => *existing = slot,
            None => self.objects.push(slot),
        }
        handle
    }

    /// Remove a host object. Functions bound to it fail with
    /// [`FunctionError::ObjectDeleted`] from now on. Returns `false` for a
    /// stale or unknown handle.
    pub fn deregister_object(&mut self, handle: &ObjectHandle) -> bool {
        let Some(slot) = self
            .objects
            .get_mut(handle.index as usize)
            .filter(|s| &s.handle == handle)
        else {
            return false;
        };
        let Some(class) = slot.class.take() else {
            return false;
        };

        slot.handle.invalidate();
        let id = class.get_class_name().clone();
        tracing::debug!(target: "snex::jit", class = %id, "deregistered object");
        for listener in &mut self.delete_listeners {
            listener.object_deleted(&id);
        }
        true
    }

    pub fn object_function_class(&self, handle: &ObjectHandle) -> Option<&FunctionClass> {
        self.objects
            .get(handle.index as usize)
            .filter(|s| &s.handle == handle)
            .and_then(|s| s.class.as_ref())
    }

    pub fn add_object_delete_listener(&mut self, listener: impl ObjectDeleteListener + Send + 'static) {
        self.delete_listeners.push(Box::new(listener));
    }

    // ========================================================================
    // Templates
    // ========================================================================

    /// Make a class or function template available to every later
    /// compilation. Templates are validated when a compilation registers
    /// them.
    pub fn add_template(&mut self, template: TemplateObject) {
        tracing::debug!(target: "snex::jit", template = %template.id, "added template");
        self.templates.push(template);
    }

    pub fn templates(&self) -> &[TemplateObject] {
        &self.templates
    }

    // ========================================================================
    // Constants
    // ========================================================================

    /// Define a global constant such as `NumChannels`.
    pub fn add_constant(&mut self, name: &str, value: VariableStorage) -> Result<Symbol, ScopeError> {
        self.scope.add_constant(NamespacedIdentifier::new(name), value)
    }

    /// A global constant or a constant of an inbuilt function class.
    pub fn get_constant(&self, id: &NamespacedIdentifier) -> Option<VariableStorage> {
        self.scope
            .get_constant(id)
            .or_else(|| self.functions.get_constant_value(id))
    }

    // ========================================================================
    // Debugging
    // ========================================================================

    pub fn add_debug_handler(&mut self, handler: impl DebugHandler + Send + 'static) {
        self.debug_handlers.push(Box::new(handler));
    }

    pub fn clear_debug_handlers(&mut self) {
        self.debug_handlers.clear();
    }

    /// Send a diagnostic to the log and to every debug handler.
    pub fn log_message(&mut self, message: &str) {
        tracing::info!(target: "snex::jit", "{message}");
        for handler in &mut self.debug_handlers {
            handler.log_message(message);
        }
    }

    pub fn breakpoint_handler(&self) -> &BreakpointHandler {
        &self.breakpoints
    }

    pub fn breakpoint_handler_mut(&mut self) -> &mut BreakpointHandler {
        &mut self.breakpoints
    }

    pub fn buffer_handler(&self) -> &BufferHandler {
        &self.buffers
    }

    pub fn buffer_handler_mut(&mut self) -> &mut BufferHandler {
        &mut self.buffers
    }

    // ========================================================================
    // Optimisations
    // ========================================================================

    pub fn add_optimisation_pass(&mut self, pass: impl Into<String>) {
        let pass = pass.into();
        if !self.optimisation_passes.contains(&pass) {
            self.optimisation_passes.push(pass);
        }
    }

    pub fn clear_optimisation_passes(&mut self) {
        self.optimisation_passes.clear();
    }

    pub fn optimisation_passes(&self) -> &[String] {
        &self.optimisation_passes
    }

    pub fn has_optimisation_pass(&self, pass: &str) -> bool {
        self.optimisation_passes.iter().any(|p| p == pass)
    }
}

impl Default for GlobalScope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GlobalScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalScope")
            .field("functions", &self.functions.get_function_ids())
            .field("objects", &self.live_objects().count())
            .field("templates", &self.templates.len())
            .field("debug_handlers", &self.debug_handlers.len())
            .field("optimisation_passes", &self.optimisation_passes)
            .field("config", &self.config)
            .finish()
    }
}
