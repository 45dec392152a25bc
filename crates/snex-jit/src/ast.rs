//! Declaration level syntax tree.
//!
//! Only the parts the front end interprets are modelled. Function bodies
//! are kept as raw text for the code generator.

use snex_core::{Identifier, NamespacedIdentifier, Span, TypeId, VariableStorage, Visibility};

/// A top level or namespace level declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Namespace(NamespaceDecl),
    UsingNamespace(UsingNamespaceDecl),
    UsingAlias(AliasDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    Variable(VariableDecl),
    Function(FunctionDecl),
}

/// `namespace Name { items }`
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDecl {
    pub name: Identifier,
    pub items: Vec<Item>,
    pub span: Span,
}

/// `using namespace Path;`
#[derive(Debug, Clone, PartialEq)]
pub struct UsingNamespaceDecl {
    pub path: NamespacedIdentifier,
    pub span: Span,
}

/// `using Name = Type;`
#[derive(Debug, Clone, PartialEq)]
pub struct AliasDecl {
    pub name: Identifier,
    pub target: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: Identifier,
    /// Data members and `static` constants, in declaration order.
    pub members: Vec<VariableDecl>,
    pub functions: Vec<FunctionDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: Identifier,
    pub values: Vec<EnumValueDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValueDecl {
    pub name: Identifier,
    pub value: Option<ValueExpr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub is_static: bool,
    pub ty: TypeExpr,
    pub name: Identifier,
    pub init: Option<Initialiser>,
    pub visibility: Visibility,
    pub span: Span,
}

impl VariableDecl {
    /// `static const` declarations and `const` primitives with a value are
    /// compile time constants.
    pub fn is_constant(&self) -> bool {
        self.ty.is_const
            && matches!(self.ty.base, TypeBase::Primitive(_))
            && matches!(self.init, Some(Initialiser::Value(_)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub ty: TypeExpr,
    pub name: Identifier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub return_type: TypeExpr,
    pub name: Identifier,
    pub params: Vec<ParamDecl>,
    /// `None` for a forward declaration.
    pub body: Option<FunctionBody>,
    pub visibility: Visibility,
    pub span: Span,
}

/// Source text between the braces of a function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionBody {
    pub text: String,
    /// Line of the opening brace.
    pub line: u32,
}

// Types and values

/// Grammar: `'const'? BASE '&'?`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub is_const: bool,
    pub is_ref: bool,
    pub base: TypeBase,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeBase {
    Primitive(TypeId),
    /// A struct, alias or enum, resolved against the namespace tree.
    Named(NamespacedIdentifier),
    /// `span<T, N>`
    Span(Box<TypeExpr>, TemplateValue),
    /// `dyn<T>`
    Dyn(Box<TypeExpr>),
    /// `wrap<N>`
    Wrap(TemplateValue),
    /// `Name<args>`, an instance of a host class template.
    Template(NamespacedIdentifier, Vec<TemplateArg>),
}

/// Argument of a host class template. A bare name may stand for a type or
/// for a constant and is told apart during registration.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateArg {
    Type(TypeExpr),
    Value(TemplateValue),
}

/// Integer template argument.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateValue {
    Literal(i32),
    Named(NamespacedIdentifier),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpr {
    Literal(VariableStorage),
    Constant {
        id: NamespacedIdentifier,
        negated: bool,
        span: Span,
    },
}

/// `= value` or `= { a, { b, c } }`.
#[derive(Debug, Clone, PartialEq)]
pub enum Initialiser {
    Value(ValueExpr),
    List(Vec<Initialiser>, Span),
}
