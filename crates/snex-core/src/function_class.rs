//! Overload sets.
//!
//! A [`FunctionClass`] owns a list of [`FunctionData`] under a class symbol,
//! nested sub classes (namespaced or member function groups) and named
//! constants. Lookup is by name first; [`select_overload`] then ranks the
//! candidates by argument types.
//!
//! # Overload resolution
//!
//! Candidates are ranked with [`FunctionData::matches_argument_types`]:
//! exact matches beat implicit ones. When more than one candidate shares the
//! best rank the call is ambiguous, unless [`OverloadPolicy::FirstMatch`] is
//! in effect, in which case the first registered candidate wins.

use crate::{
    FunctionData, FunctionError, Identifier, InlineData, MatchKind, NamespacedIdentifier,
    ObjectHandle, OverloadPolicy, TypeInfo, VariableStorage,
};

/// A named compile time constant exposed by a function class.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionConstant {
    pub id: Identifier,
    pub value: VariableStorage,
}

/// Registry of overloaded functions below one class symbol.
#[derive(Debug, Clone, Default)]
pub struct FunctionClass {
    class_symbol: NamespacedIdentifier,
    functions: Vec<FunctionData>,
    sub_classes: Vec<FunctionClass>,
    constants: Vec<FunctionConstant>,
}

impl FunctionClass {
    pub fn new(class_symbol: NamespacedIdentifier) -> Self {
        Self {
            class_symbol,
            ..Self::default()
        }
    }

    pub fn get_class_name(&self) -> &NamespacedIdentifier {
        &self.class_symbol
    }

    pub fn functions(&self) -> &[FunctionData] {
        &self.functions
    }

    pub fn sub_classes(&self) -> &[FunctionClass] {
        &self.sub_classes
    }

    /// Add an overload. An unqualified id is placed below the class symbol
    /// so `process` registered on `Osc` becomes `Osc::process`.
    pub fn add_function(&mut self, mut function: FunctionData) {
        if !function.id.is_explicit() && !self.class_symbol.is_root() {
            let qualified = self.class_symbol.get_child_id(function.id.get_identifier().clone());
            for arg in &mut function.args {
                arg.id = arg.id.relocate(&function.id, &qualified);
            }
            function.id = qualified;
        }
        self.functions.push(function);
    }

    /// Nest another class. Its functions become reachable through this one.
    pub fn add_function_class(&mut self, class: FunctionClass) {
        self.sub_classes.push(class);
    }

    pub fn add_function_constant(&mut self, id: impl Into<Identifier>, value: VariableStorage) {
        let id = id.into();
        match self.constants.iter_mut().find(|c| c.id == id) {
            Some(existing) => existing.value = value,
            None => self.constants.push(FunctionConstant { id, value }),
        }
    }

    /// Bind every function, including those of sub classes, to `object`.
    pub fn bind_object(&mut self, object: &ObjectHandle) {
        for f in &mut self.functions {
            f.object = Some(object.clone());
        }
        for class in &mut self.sub_classes {
            class.bind_object(object);
        }
    }

    fn qualifies(&self, candidate: &NamespacedIdentifier, symbol: &NamespacedIdentifier) -> bool {
        candidate == symbol
            || (!symbol.is_explicit()
                && candidate.get_identifier() == symbol.get_identifier()
                && candidate.get_parent() == self.class_symbol)
    }

    pub fn has_function(&self, symbol: &NamespacedIdentifier) -> bool {
        self.functions.iter().any(|f| self.qualifies(&f.id, symbol))
            || self.sub_classes.iter().any(|c| c.has_function(symbol))
    }

    pub fn has_constant(&self, symbol: &NamespacedIdentifier) -> bool {
        self.get_constant_value(symbol).is_some()
    }

    /// Value of a constant, searched in this class and its sub classes.
    pub fn get_constant_value(&self, symbol: &NamespacedIdentifier) -> Option<VariableStorage> {
        let own = self
            .constants
            .iter()
            .find(|c| self.qualifies(&self.class_symbol.get_child_id(c.id.clone()), symbol))
            .map(|c| c.value);
        own.or_else(|| self.sub_classes.iter().find_map(|c| c.get_constant_value(symbol)))
    }

    /// Append every overload named `symbol` to `matches`, in registration
    /// order, own functions before sub classes.
    pub fn add_matching_functions(&self, matches: &mut Vec<FunctionData>, symbol: &NamespacedIdentifier) {
        matches.extend(
            self.functions
                .iter()
                .filter(|f| self.qualifies(&f.id, symbol))
                .cloned(),
        );
        for class in &self.sub_classes {
            class.add_matching_functions(matches, symbol);
        }
    }

    /// Ids of all functions, including those of sub classes. Overloads
    /// appear once.
    pub fn get_function_ids(&self) -> Vec<NamespacedIdentifier> {
        let mut ids: Vec<NamespacedIdentifier> = Vec::new();
        for f in &self.functions {
            if !ids.contains(&f.id) {
                ids.push(f.id.clone());
            }
        }
        for class in &self.sub_classes {
            for id in class.get_function_ids() {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        ids
    }

    pub fn get_sub_function_class(&self, id: &NamespacedIdentifier) -> Option<&FunctionClass> {
        self.sub_classes.iter().find_map(|c| {
            if &c.class_symbol == id {
                Some(c)
            } else {
                c.get_sub_function_class(id)
            }
        })
    }

    pub fn get_sub_function_class_mut(&mut self, id: &NamespacedIdentifier) -> Option<&mut FunctionClass> {
        for c in &mut self.sub_classes {
            if &c.class_symbol == id {
                return Some(c);
            }
            if let Some(found) = c.get_sub_function_class_mut(id) {
                return Some(found);
            }
        }
        None
    }

    /// The function named `id` if there is exactly one overload.
    pub fn get_non_overloaded_function(&self, id: &NamespacedIdentifier) -> Option<FunctionData> {
        let mut matches = Vec::new();
        self.add_matching_functions(&mut matches, id);
        if matches.len() == 1 { matches.pop() } else { None }
    }

    /// Copy the native pointer (and bound object) of the registered function
    /// with the same signature into `data`. Returns `false` when no resolved
    /// function matches.
    pub fn fill_jit_function_pointer(&self, data: &mut FunctionData) -> bool {
        if let Some(source) = self
            .functions
            .iter()
            .find(|f| f.is_resolved() && f.matches_signature(data))
        {
            data.function = source.function.clone();
            data.object = source.object.clone();
            return true;
        }
        self.sub_classes.iter().any(|c| c.fill_jit_function_pointer(data))
    }

    /// Store the native pointer of `data` into the registered placeholder
    /// with the same signature. Returns `false` when no placeholder matches.
    pub fn inject_function_pointer(&mut self, data: &FunctionData) -> bool {
        if let Some(target) = self
            .functions
            .iter_mut()
            .find(|f| f.matches_signature(data))
        {
            target.function = data.function.clone();
            if data.object.is_some() {
                target.object = data.object.clone();
            }
            return true;
        }
        self.sub_classes
            .iter_mut()
            .any(|c| c.inject_function_pointer(data))
    }

    pub fn is_inlineable(&self, id: &NamespacedIdentifier) -> bool {
        let mut matches = Vec::new();
        self.add_matching_functions(&mut matches, id);
        !matches.is_empty() && matches.iter().all(FunctionData::is_inlineable)
    }

    /// Run the inliner of the overload that accepts `data`'s arguments.
    pub fn inline_function_call(&self, id: &NamespacedIdentifier, data: &mut InlineData) -> Result<(), FunctionError> {
        let arg_types: Vec<TypeInfo> = data.args.iter().map(|a| a.type_info.clone()).collect();
        let function = self.resolve_call(id, &arg_types, OverloadPolicy::Strict)?;
        match &function.inliner {
            Some(inliner) => inliner.process(data),
            None => Err(FunctionError::NotInlineable {
                name: id.to_string(),
            }),
        }
    }

    /// Find the overload of `id` accepting `arg_types`.
    pub fn resolve_call(
        &self,
        id: &NamespacedIdentifier,
        arg_types: &[TypeInfo],
        policy: OverloadPolicy,
    ) -> Result<FunctionData, FunctionError> {
        let mut candidates = Vec::new();
        self.add_matching_functions(&mut candidates, id);
        select_overload(&id.to_string(), candidates, arg_types, policy)
    }
}

/// Pick the best of `candidates` for `arg_types`.
pub fn select_overload(
    name: &str,
    candidates: Vec<FunctionData>,
    arg_types: &[TypeInfo],
    policy: OverloadPolicy,
) -> Result<FunctionData, FunctionError> {
    if candidates.is_empty() {
        return Err(FunctionError::NotFound {
            name: name.to_string(),
        });
    }

    let ranked: Vec<(MatchKind, FunctionData)> = candidates
        .into_iter()
        .map(|f| (f.matches_argument_types(arg_types), f))
        .filter(|(m, _)| m.is_match())
        .collect();

    let args = || {
        arg_types
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let Some(best) = ranked.iter().map(|(m, _)| *m).max() else {
        return Err(FunctionError::NoMatch {
            name: name.to_string(),
            args: args(),
        });
    };

    let mut top: Vec<FunctionData> = ranked
        .into_iter()
        .filter(|(m, _)| *m == best)
        .map(|(_, f)| f)
        .collect();

    if top.len() > 1 && policy == OverloadPolicy::Strict {
        tracing::debug!(target: "snex::overload", name, count = top.len(), "ambiguous call");
        return Err(FunctionError::Ambiguous {
            name: name.to_string(),
            args: args(),
            candidates: top.iter().map(FunctionData::get_signature).collect(),
        });
    }

    Ok(top.swap_remove(0))
}
