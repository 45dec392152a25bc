//! Host supplied templates.
//!
//! A [`TemplateObject`] names a template, lists its parameters and carries the
//! builder that turns one argument list into a concrete struct or function.
//! The [`NamespaceHandler`](crate::NamespaceHandler) instantiates class
//! templates and interns the result like any other complex type, so
//! `Osc<float, 2>` written twice yields one shared instance.
//!
//! ```
//! use snex_core::{NamespacedIdentifier, TemplateArgument, TypeId, TypeInfo};
//! use snex_registry::{NamespaceHandler, TemplateObject, TemplateParameter};
//!
//! let mut handler = NamespaceHandler::new();
//! handler
//!     .add_template_class(TemplateObject::class(
//!         NamespacedIdentifier::new("Frame"),
//!         vec![TemplateParameter::type_parameter("T")],
//!         |s, args| match &args[0] {
//!             TemplateArgument::Type(t) => Ok(s.with_member("value", t.clone())),
//!             TemplateArgument::Constant(_) => Err("T must be a type".into()),
//!         },
//!     ))
//!     .unwrap();
//!
//! let args = [TemplateArgument::Type(TypeInfo::new(TypeId::Double))];
//! let id = NamespacedIdentifier::new("Frame");
//! let a = handler.create_template_instantiation(&id, &args).unwrap();
//! let b = handler.create_template_instantiation(&id, &args).unwrap();
//! assert!(std::sync::Arc::ptr_eq(&a, &b));
//! assert_eq!(a.required_byte_size(), 8);
//! ```

use std::fmt;
use std::sync::Arc;

use snex_core::{FunctionData, Identifier, NamespacedIdentifier, ResolveError, StructType, TemplateArgument};

/// Whether a parameter takes a type or an integer constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateParameterKind {
    Type,
    Constant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateParameter {
    pub name: Identifier,
    pub kind: TemplateParameterKind,
    /// Used when the argument is omitted. Parameters with a default must
    /// come after those without.
    pub default: Option<TemplateArgument>,
}

impl TemplateParameter {
    pub fn type_parameter(name: impl Into<Identifier>) -> Self {
        Self {
            name: name.into(),
            kind: TemplateParameterKind::Type,
            default: None,
        }
    }

    pub fn constant(name: impl Into<Identifier>) -> Self {
        Self {
            name: name.into(),
            kind: TemplateParameterKind::Constant,
            default: None,
        }
    }

    pub fn with_default(mut self, default: TemplateArgument) -> Self {
        self.default = Some(default);
        self
    }

    pub fn accepts(&self, arg: &TemplateArgument) -> bool {
        matches!(
            (self.kind, arg),
            (TemplateParameterKind::Type, TemplateArgument::Type(_))
                | (TemplateParameterKind::Constant, TemplateArgument::Constant(_))
        )
    }
}

/// Fills in the members of a class template instance. The struct passed in
/// already carries the id and the completed argument list.
pub type ClassBuilder =
    Arc<dyn Fn(StructType, &[TemplateArgument]) -> Result<StructType, String> + Send + Sync>;

/// Creates the function a function template stands for with `args`.
pub type FunctionBuilder = Arc<
    dyn Fn(&NamespacedIdentifier, &[TemplateArgument]) -> Result<FunctionData, String> + Send + Sync,
>;

#[derive(Clone)]
pub enum TemplateBuilder {
    Class(ClassBuilder),
    Function(FunctionBuilder),
}

/// A class or function template registered by the host.
#[derive(Clone)]
pub struct TemplateObject {
    pub id: NamespacedIdentifier,
    pub parameters: Vec<TemplateParameter>,
    pub builder: TemplateBuilder,
    pub description: String,
}

impl TemplateObject {
    pub fn class<F>(id: NamespacedIdentifier, parameters: Vec<TemplateParameter>, build: F) -> Self
    where
        F: Fn(StructType, &[TemplateArgument]) -> Result<StructType, String> + Send + Sync + 'static,
    {
        Self {
            id,
            parameters,
            builder: TemplateBuilder::Class(Arc::new(build)),
            description: String::new(),
        }
    }

    pub fn function<F>(id: NamespacedIdentifier, parameters: Vec<TemplateParameter>, build: F) -> Self
    where
        F: Fn(&NamespacedIdentifier, &[TemplateArgument]) -> Result<FunctionData, String>
            + Send
            + Sync
            + 'static,
    {
        Self {
            id,
            parameters,
            builder: TemplateBuilder::Function(Arc::new(build)),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_class(&self) -> bool {
        matches!(self.builder, TemplateBuilder::Class(_))
    }

    fn required_count(&self) -> usize {
        self.parameters.iter().filter(|p| p.default.is_none()).count()
    }

    /// Whether `count` explicit arguments can instantiate this template.
    pub fn is_valid_amount(&self, count: usize) -> bool {
        (self.required_count()..=self.parameters.len()).contains(&count)
    }

    /// `args` padded with defaults, checked against the parameter kinds.
    /// Aliases are stripped so `Osc<Sample>` and `Osc<float>` agree.
    pub fn complete_arguments(
        &self,
        args: &[TemplateArgument],
    ) -> Result<Vec<TemplateArgument>, ResolveError> {
        if !self.is_valid_amount(args.len()) {
            return Err(self.invalid(
                args,
                format!(
                    "expected {} to {} arguments, got {}",
                    self.required_count(),
                    self.parameters.len(),
                    args.len()
                ),
            ));
        }

        let mut completed = Vec::with_capacity(self.parameters.len());
        for (i, param) in self.parameters.iter().enumerate() {
            let Some(arg) = args.get(i).or(param.default.as_ref()) else {
                return Err(self.invalid(args, format!("missing argument '{}'", param.name)));
            };
            if !param.accepts(arg) {
                let wanted = match param.kind {
                    TemplateParameterKind::Type => "a type",
                    TemplateParameterKind::Constant => "an integer constant",
                };
                return Err(self.invalid(args, format!("'{}' must be {wanted}", param.name)));
            }
            completed.push(match arg {
                TemplateArgument::Type(t) => TemplateArgument::Type(t.clone().without_alias()),
                TemplateArgument::Constant(c) => TemplateArgument::Constant(*c),
            });
        }
        Ok(completed)
    }

    pub(crate) fn invalid(&self, args: &[TemplateArgument], message: String) -> ResolveError {
        ResolveError::InvalidTemplate {
            name: instance_name(&self.id, args),
            message,
        }
    }
}

impl fmt::Debug for TemplateObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateObject")
            .field("id", &self.id)
            .field("parameters", &self.parameters)
            .field("class", &self.is_class())
            .finish_non_exhaustive()
    }
}

/// `Id<a, b>` as written in source.
pub fn instance_name(id: &NamespacedIdentifier, args: &[TemplateArgument]) -> String {
    let args: Vec<String> = args.iter().map(ToString::to_string).collect();
    format!("{id}<{}>", args.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use snex_core::{TypeId, TypeInfo};

    fn osc() -> TemplateObject {
        TemplateObject::class(
            NamespacedIdentifier::new("Osc"),
            vec![
                TemplateParameter::type_parameter("T"),
                TemplateParameter::constant("NumChannels").with_default(TemplateArgument::Constant(2)),
            ],
            |s, _| Ok(s),
        )
    }

    #[test]
    fn defaults_fill_trailing_arguments() {
        let float = TemplateArgument::Type(TypeInfo::new(TypeId::Float));
        let args = osc().complete_arguments(std::slice::from_ref(&float)).unwrap();
        assert_eq!(args, vec![float, TemplateArgument::Constant(2)]);
    }

    #[test]
    fn argument_count_is_checked() {
        let t = osc();
        assert!(!t.is_valid_amount(0));
        assert!(t.is_valid_amount(1));
        assert!(t.is_valid_amount(2));
        assert!(!t.is_valid_amount(3));

        match t.complete_arguments(&[]) {
            Err(ResolveError::InvalidTemplate { name, message }) => {
                assert_eq!(name, "Osc<>");
                assert_eq!(message, "expected 1 to 2 arguments, got 0");
            }
            other => panic!("Expected InvalidTemplate, got {other:?}"),
        }
    }

    #[test]
    fn argument_kinds_are_checked() {
        match osc().complete_arguments(&[TemplateArgument::Constant(4)]) {
            Err(ResolveError::InvalidTemplate { message, .. }) => {
                assert_eq!(message, "'T' must be a type")
            }
            other => panic!("Expected InvalidTemplate, got {other:?}"),
        }
    }

    #[test]
    fn aliases_are_stripped() {
        let sample = TypeInfo::new(TypeId::Float).with_alias(NamespacedIdentifier::new("Sample"));
        let args = osc()
            .complete_arguments(&[TemplateArgument::Type(sample)])
            .unwrap();
        assert_eq!(instance_name(&NamespacedIdentifier::new("Osc"), &args), "Osc<float, 2>");
    }
}
