//! Results of a compilation.
//!
//! A [`JitObject`] owns the [`ClassScope`] of one compiled class and is the
//! host's handle for calling its functions and reading its variables. The
//! scope can be moved out again, either directly or through a
//! [`JitCompiledFunctionClass`] that releases it on demand.

use snex_core::{
    FunctionData, FunctionError, NamespacedIdentifier, ScopeError, TypeInfo, VariableStorage,
};

use crate::debug::DebugEntry;
use crate::root_class_data::RootClassData;
use crate::scope::ClassScope;

#[derive(Debug)]
pub struct JitObject {
    scope: ClassScope,
}

impl JitObject {
    pub(crate) fn new(scope: ClassScope) -> Self {
        Self { scope }
    }

    pub fn class_id(&self) -> &NamespacedIdentifier {
        self.scope.id()
    }

    pub fn class_scope(&self) -> &ClassScope {
        &self.scope
    }

    fn data(&self) -> Option<&RootClassData> {
        self.scope.root_class_data()
    }

    // ========================================================================
    // Functions
    // ========================================================================

    /// The function called `name`. With several overloads the first one
    /// registered is returned.
    pub fn get_function(&self, name: &str) -> Option<FunctionData> {
        let mut matches = Vec::new();
        self.scope
            .functions()
            .add_matching_functions(&mut matches, &NamespacedIdentifier::from_string(name));
        matches.into_iter().next()
    }

    pub fn function_ids(&self) -> Vec<NamespacedIdentifier> {
        self.scope.functions().get_function_ids()
    }

    /// Call the overload of `name` that accepts the types of `args`.
    pub fn call(&self, name: &str, args: &[VariableStorage]) -> Result<VariableStorage, FunctionError> {
        let arg_types: Vec<TypeInfo> = args.iter().map(|a| TypeInfo::new(a.type_id())).collect();
        let function = self.scope.functions().resolve_call(
            &NamespacedIdentifier::from_string(name),
            &arg_types,
            self.scope.overload_policy(),
        )?;
        function.call(args)
    }

    /// Call a member function of the struct stored in `variable`. The
    /// function operates on the variable's memory.
    pub fn call_method(
        &mut self,
        variable: &str,
        method: &str,
        args: &[VariableStorage],
    ) -> Result<VariableStorage, FunctionError> {
        let id = NamespacedIdentifier::from_string(variable);
        let class = self
            .data()
            .and_then(|d| d.get(&id))
            .and_then(|slot| slot.symbol.type_info.get_complex_type().cloned())
            .ok_or_else(|| FunctionError::NotFound {
                name: variable.to_string(),
            })?;

        let functions = class.function_class().ok_or_else(|| FunctionError::NotFound {
            name: format!("{}::{method}", class.to_string_internal()),
        })?;
        let arg_types: Vec<TypeInfo> = args.iter().map(|a| TypeInfo::new(a.type_id())).collect();
        let function = functions.resolve_call(
            &NamespacedIdentifier::new(method),
            &arg_types,
            self.scope.overload_policy(),
        )?;

        let data = self
            .scope
            .root_class_data_mut()
            .and_then(|d| d.data_mut(&id))
            .ok_or_else(|| FunctionError::NotFound {
                name: variable.to_string(),
            })?;
        function.call_with_data(data, args)
    }

    // ========================================================================
    // Variables
    // ========================================================================

    /// Current value of a primitive class variable.
    pub fn get_variable(&self, name: &str) -> Option<VariableStorage> {
        self.data()?.get_value(&NamespacedIdentifier::from_string(name))
    }

    pub fn set_variable(&mut self, name: &str, value: VariableStorage) -> Result<(), ScopeError> {
        let id = NamespacedIdentifier::from_string(name);
        self.scope
            .root_class_data_mut()
            .ok_or_else(|| ScopeError::UnknownVariable {
                name: id.to_string(),
            })?
            .set_value(&id, value)
    }

    pub fn get_variable_type(&self, name: &str) -> Option<TypeInfo> {
        self.data()?
            .get(&NamespacedIdentifier::from_string(name))
            .map(|s| s.symbol.type_info.clone())
    }

    /// Memory of a complex class variable.
    pub fn get_variable_data(&self, name: &str) -> Option<&[u8]> {
        self.data()?.data(&NamespacedIdentifier::from_string(name))
    }

    /// A primitive member of a struct variable.
    pub fn get_member(&self, variable: &str, member: &str) -> Option<VariableStorage> {
        let slot = self.data()?.get(&NamespacedIdentifier::from_string(variable))?;
        let class = slot.symbol.type_info.get_complex_type()?;
        let s = class.as_struct()?;
        let member: snex_core::Identifier = member.into();
        let offset = s.member_offset(&member)?;
        let ty = s.member_type_info(&member)?;
        if ty.is_complex_type() {
            return None;
        }
        let data = self.get_variable_data(variable)?;
        VariableStorage::read_from(ty.get_type(), data, offset).ok()
    }

    /// Name, type and rendered value of every class variable.
    pub fn debug_info(&self) -> Vec<DebugEntry> {
        self.data()
            .map(|d| {
                d.slots()
                    .iter()
                    .map(|s| {
                        DebugEntry::new(
                            s.symbol.id.clone(),
                            s.symbol.type_info.clone(),
                            s.dump_value(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Give up the object and keep its class scope.
    pub fn into_class_scope(self) -> ClassScope {
        self.scope
    }

    pub fn into_compiled_class(self) -> JitCompiledFunctionClass {
        JitCompiledFunctionClass::new(self.scope)
    }
}

/// A compiled class whose scope can be released to the host.
///
/// After [`release_class_scope`](Self::release_class_scope) every lookup
/// fails.
#[derive(Debug)]
pub struct JitCompiledFunctionClass {
    scope: Option<ClassScope>,
}

impl JitCompiledFunctionClass {
    pub fn new(scope: ClassScope) -> Self {
        Self { scope: Some(scope) }
    }

    pub fn is_valid(&self) -> bool {
        self.scope.is_some()
    }

    pub fn class_scope(&self) -> Option<&ClassScope> {
        self.scope.as_ref()
    }

    pub fn get_function(&self, id: &NamespacedIdentifier) -> Option<FunctionData> {
        let mut matches = Vec::new();
        self.scope
            .as_ref()?
            .functions()
            .add_matching_functions(&mut matches, id);
        matches.into_iter().next()
    }

    pub fn get_variable(&self, id: &NamespacedIdentifier) -> Option<VariableStorage> {
        self.scope.as_ref()?.root_class_data()?.get_value(id)
    }

    pub fn set_variable(
        &mut self,
        id: &NamespacedIdentifier,
        value: VariableStorage,
    ) -> Result<(), ScopeError> {
        self.scope
            .as_mut()
            .and_then(ClassScope::root_class_data_mut)
            .ok_or_else(|| ScopeError::UnknownVariable {
                name: id.to_string(),
            })?
            .set_value(id, value)
    }

    /// Move the class scope out. Later calls return `None`.
    pub fn release_class_scope(&mut self) -> Option<ClassScope> {
        self.scope.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snex_core::{InitialiserList, NativeFn, Symbol, TypeId};

    fn id(s: &str) -> NamespacedIdentifier {
        NamespacedIdentifier::from_string(s)
    }

    fn scope_with_gain() -> ClassScope {
        let mut scope = ClassScope::new(id("Main"), 8);
        scope
            .root_scope_mut()
            .allocate(
                Symbol::new(id("gain"), TypeInfo::new(TypeId::Float)),
                Some(&InitialiserList::make_single_list(VariableStorage::Float(0.5))),
            )
            .unwrap();
        scope.functions_mut().add_function(
            FunctionData::new(id("twice"), TypeInfo::new(TypeId::Integer))
                .with_arg("x", TypeInfo::new(TypeId::Integer))
                .with_function(NativeFn::from_fn(|ctx| {
                    let x = ctx.arg(0)?.to_int();
                    ctx.set_return(VariableStorage::Integer(x * 2));
                    Ok(())
                })),
        );
        scope
    }

    #[test]
    fn call_and_variables() {
        let mut object = JitObject::new(scope_with_gain());
        assert_eq!(
            object.call("twice", &[VariableStorage::Integer(21)]).unwrap(),
            VariableStorage::Integer(42)
        );
        assert_eq!(object.get_variable("gain"), Some(VariableStorage::Float(0.5)));

        object.set_variable("gain", VariableStorage::Double(0.25)).unwrap();
        assert_eq!(object.get_variable("gain"), Some(VariableStorage::Float(0.25)));
        assert!(object.set_variable("missing", 1.into()).is_err());
    }

    #[test]
    fn unknown_function() {
        let object = JitObject::new(scope_with_gain());
        assert!(object.get_function("nothing").is_none());
        match object.call("nothing", &[]) {
            Err(FunctionError::NotFound { .. }) => {}
            other => panic!("Expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn debug_info_lists_variables() {
        let object = JitObject::new(scope_with_gain());
        let info = object.debug_info();
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].id.to_string(), "gain");
        assert_eq!(info[0].value, "0.5f");
    }

    #[test]
    fn release_invalidates() {
        let mut compiled = JitObject::new(scope_with_gain()).into_compiled_class();
        assert!(compiled.is_valid());
        assert!(compiled.get_function(&id("twice")).is_some());
        assert_eq!(compiled.get_variable(&id("gain")), Some(VariableStorage::Float(0.5)));

        let scope = compiled.release_class_scope().unwrap();
        assert_eq!(scope.id().to_string(), "Main");
        assert!(!compiled.is_valid());
        assert!(compiled.get_function(&id("twice")).is_none());
        assert!(compiled.release_class_scope().is_none());
        assert!(compiled.set_variable(&id("gain"), 1.into()).is_err());
    }

    #[test]
    fn into_class_scope_keeps_data() {
        let object = JitObject::new(scope_with_gain());
        let scope = object.into_class_scope();
        assert_eq!(
            scope.root_class_data().unwrap().get_value(&id("gain")),
            Some(VariableStorage::Float(0.5))
        );
    }
}
