//! Error types for every phase of the SNEX front end.
//!
//! ```text
//! SnexError
//! ├── LexError      - tokenizer errors
//! ├── ParseError    - declaration parser errors (with ParseErrorKind)
//! ├── LayoutError   - complex type finalisation and initialisation
//! ├── ResolveError  - namespace and symbol resolution
//! ├── FunctionError - overload resolution and native calls
//! ├── ScopeError    - scope chain and class data allocation
//! └── CompileError  - a failed `Compiler::compile`
//! ```
//!
//! All of these are recoverable: a failed compilation leaves previously
//! compiled objects usable.

use thiserror::Error;

use crate::Span;

/// Errors raised while tokenizing source text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at {span}")]
    UnexpectedChar { ch: char, span: Span },

    #[error("invalid number at {span}: {detail}")]
    InvalidNumber { span: Span, detail: String },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. } => *span,
            LexError::InvalidNumber { span, .. } => *span,
        }
    }
}

/// What the declaration parser was looking at when it gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    ExpectedToken,
    UnexpectedEof,
    ExpectedType,
    ExpectedIdentifier,
    /// Literal or brace initialiser.
    ExpectedValue,
    /// Anything that can start a namespace-level item.
    ExpectedDeclaration,
    /// Malformed `span<T, N>` or `wrap<N>` arguments.
    InvalidTemplateArgs,
    /// Function body braces don't balance.
    MismatchedDelimiter,
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ParseErrorKind::ExpectedToken => "syntax error",
            ParseErrorKind::UnexpectedEof => "source ended early",
            ParseErrorKind::ExpectedType => "bad type",
            ParseErrorKind::ExpectedIdentifier => "bad name",
            ParseErrorKind::ExpectedValue => "bad value",
            ParseErrorKind::ExpectedDeclaration => "bad declaration",
            ParseErrorKind::InvalidTemplateArgs => "bad template arguments",
            ParseErrorKind::MismatchedDelimiter => "unbalanced braces",
        };
        f.write_str(text)
    }
}

/// A located parse failure.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{span}: {kind}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        let message = message.into();
        Self { kind, span, message }
    }

    /// `wanted` was required at `span` but `found` was there instead.
    pub fn expected(kind: ParseErrorKind, span: Span, wanted: &str, found: &str) -> Self {
        Self::new(kind, span, format!("wanted {wanted} but found {found}"))
    }

    pub fn expected_token(span: Span, wanted: &str, found: &str) -> Self {
        Self::expected(ParseErrorKind::ExpectedToken, span, wanted, found)
    }

    pub fn expected_identifier(span: Span, found: &str) -> Self {
        Self::expected(ParseErrorKind::ExpectedIdentifier, span, "a name", found)
    }

    pub fn expected_type(span: Span, found: &str) -> Self {
        Self::expected(ParseErrorKind::ExpectedType, span, "a type", found)
    }

    pub fn unexpected_eof(span: Span) -> Self {
        Self::new(ParseErrorKind::UnexpectedEof, span, "missing closing tokens")
    }
}

/// Errors from complex type finalisation and memory initialisation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// `initialise` was called before `finalise_alignment`.
    #[error("type '{type_name}' is not finalised")]
    NotFinalised { type_name: String },

    /// Initialiser list length does not match the element/member count.
    #[error("initialiser list for '{type_name}' has {actual} items, expected {expected}")]
    InitialiserSize {
        type_name: String,
        expected: usize,
        actual: usize,
    },

    /// The item at `index` has the wrong type.
    #[error("type mismatch at index {index} of '{type_name}': expected {expected}, got {actual}")]
    TypeMismatch {
        type_name: String,
        index: usize,
        expected: String,
        actual: String,
    },

    /// A member ended up at an offset its alignment does not allow.
    #[error("member '{member}' of '{type_name}' at offset {offset} violates alignment {alignment}")]
    AlignmentViolation {
        type_name: String,
        member: String,
        offset: usize,
        alignment: usize,
    },

    /// Cumulative member layout disagrees with the reported byte size.
    #[error("layout of '{type_name}' covers {computed} bytes, expected {expected}")]
    SizeMismatch {
        type_name: String,
        computed: usize,
        expected: usize,
    },

    /// Element count or member offsets don't fit in the address space.
    #[error("layout of '{type_name}' overflows the addressable size")]
    SizeOverflow { type_name: String },

    /// The target buffer cannot hold the type.
    #[error("buffer of {actual} bytes is too small for {required} bytes")]
    BufferTooSmall { required: usize, actual: usize },

    /// A member or element type has no storage (void or dynamic).
    #[error("'{name}' in '{type_name}' has no storage size")]
    UnsizedMember { type_name: String, name: String },

    /// Index past the end of an initialiser list.
    #[error("initialiser index {index} out of range (size {size})")]
    IndexOutOfRange { index: usize, size: usize },

    /// Initialiser text could not be parsed.
    #[error("malformed initialiser list: {0}")]
    MalformedInitialiser(String),
}

/// Errors from namespace and symbol resolution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("{name} can't be resolved")]
    NotFound { name: String },

    /// More than one imported namespace declares the name.
    #[error("{name} is ambiguous: could be {}", candidates.join(", "))]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },

    #[error("{name} is not a namespace")]
    NotANamespace { name: String },

    #[error("symbol '{name}' already defined")]
    DuplicateSymbol { name: String },

    #[error("no symbol '{name}' to modify")]
    UnknownSymbol { name: String },

    /// A private or protected name used outside its declaring scope.
    #[error("{name} is not accessible")]
    NotAccessible { name: String },

    /// A template was given arguments it can't be instantiated with.
    #[error("can't instantiate {name}: {message}")]
    InvalidTemplate { name: String, message: String },

    #[error("can't pop the root namespace")]
    PopRoot,
}

/// Errors from overload resolution and native function calls.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FunctionError {
    #[error("no function '{name}'")]
    NotFound { name: String },

    /// Candidates exist but none accepts the arguments.
    #[error("no matching overload for {name}({args})")]
    NoMatch { name: String, args: String },

    /// Several candidates accept the arguments equally well.
    #[error("ambiguous call to {name}({args}): could be {}", candidates.join(", "))]
    Ambiguous {
        name: String,
        args: String,
        candidates: Vec<String>,
    },

    /// The function has no native pointer yet.
    #[error("function '{name}' is not resolved")]
    Unresolved { name: String },

    #[error("{name} expects {expected} arguments, got {actual}")]
    ArgumentCount {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("argument {index} of {name}: expected {expected}, got {actual}")]
    ArgumentType {
        name: String,
        index: usize,
        expected: String,
        actual: String,
    },

    /// The bound host object was deregistered.
    #[error("object bound to '{name}' was deleted")]
    ObjectDeleted { name: String },

    #[error("function '{name}' has no inliner")]
    NotInlineable { name: String },

    /// The native implementation reported a failure.
    #[error("native call failed: {0}")]
    Native(String),
}

/// Errors from the scope chain and class variable storage.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScopeError {
    #[error("scope '{scope}' is not a class scope")]
    NotAClassScope { scope: String },

    #[error("no class scope above '{scope}'")]
    NoClassScope { scope: String },

    #[error("variable '{name}' already allocated")]
    DuplicateVariable { name: String },

    #[error("class '{name}' already registered")]
    DuplicateClass { name: String },

    #[error("constant '{name}' already defined in this scope")]
    DuplicateConstant { name: String },

    #[error("variable '{name}' needs {size} bytes, the limit is {limit}")]
    VariableTooLarge {
        name: String,
        size: usize,
        limit: usize,
    },

    #[error("class data capacity of {capacity} slots exceeded")]
    CapacityExceeded { capacity: usize },

    #[error("unknown variable '{name}'")]
    UnknownVariable { name: String },

    #[error("invalid scope handle {0}")]
    InvalidScope(usize),

    #[error("can't store {actual} in '{name}' of type {expected}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Errors that abort a compilation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("at {span}: {source}")]
    Resolve { span: Span, source: ResolveError },

    #[error("at {span}: unknown type '{name}'")]
    UnknownType { name: String, span: Span },

    #[error("at {span}: '{name}' is not a compile time constant")]
    NotAConstant { name: String, span: Span },

    /// A `span` or `wrap` size that isn't a positive integer.
    #[error("at {span}: invalid template argument: {message}")]
    InvalidTemplateArgument { span: Span, message: String },

    #[error("at {span}: invalid initialiser for '{name}': {message}")]
    InvalidInitialiser {
        name: String,
        span: Span,
        message: String,
    },

    #[error("layout of '{name}' failed: {source}")]
    Layout { name: String, source: LayoutError },

    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error(transparent)]
    Function(#[from] FunctionError),

    /// The code generator rejected a function body.
    #[error("code generation for '{function}' failed: {message}")]
    Backend { function: String, message: String },
}

/// Unified error for callers that don't care about the phase.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnexError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Function(#[from] FunctionError),

    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error(transparent)]
    Compile(#[from] CompileError),
}

impl SnexError {
    pub fn is_compile(&self) -> bool {
        matches!(self, SnexError::Compile(_))
    }

    pub fn is_resolve(&self) -> bool {
        matches!(self, SnexError::Resolve(_))
    }
}
