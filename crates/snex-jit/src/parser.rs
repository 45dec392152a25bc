//! Recursive descent parser for SNEX declarations.
//!
//! Produces the [`ast`](crate::ast) items the compiler registers. Function
//! bodies are skipped by brace depth and captured verbatim.

use snex_core::{
    Identifier, LexError, NamespacedIdentifier, ParseError, ParseErrorKind, Span, TypeId,
    VariableStorage, Visibility, parse_literal,
};

use crate::ast::{
    AliasDecl, EnumDecl, EnumValueDecl, FunctionBody, FunctionDecl, Initialiser, Item,
    NamespaceDecl, ParamDecl, StructDecl, TemplateArg, TemplateValue, TypeBase, TypeExpr,
    UsingNamespaceDecl, ValueExpr, VariableDecl,
};
use crate::lexer::{Token, TokenKind, tokenize};

/// Parse every declaration of `source`.
pub fn parse(source: &str) -> Result<Vec<Item>, snex_core::CompileError> {
    let mut parser = Parser::new(source)?;
    Ok(parser.parse_items(false)?)
}

pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token<'src>>,
    position: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Result<Self, LexError> {
        Ok(Self {
            source,
            tokens: tokenize(source)?,
            position: 0,
        })
    }

    // ========================================================================
    // Token helpers
    // ========================================================================

    fn peek(&self) -> Option<&Token<'src>> {
        self.tokens.get(self.position)
    }

    fn is_eof(&self) -> bool {
        self.position >= self.tokens.len()
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    fn advance(&mut self) -> Option<Token<'src>> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token<'src>> {
        if self.check(kind) { self.advance() } else { None }
    }

    /// Span of the current token, or of the last one at end of input.
    fn current_span(&self) -> Span {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|t| t.span)
            .unwrap_or_default()
    }

    fn found(&self) -> String {
        match self.peek() {
            Some(t) => format!("'{}'", t.text),
            None => "end of file".to_string(),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'src>, ParseError> {
        if let Some(token) = self.eat(kind) {
            return Ok(token);
        }
        if self.is_eof() {
            return Err(ParseError::unexpected_eof(self.current_span()));
        }
        Err(ParseError::expected_token(
            self.current_span(),
            kind.describe(),
            &self.found(),
        ))
    }

    fn expect_identifier(&mut self) -> Result<Token<'src>, ParseError> {
        self.eat(TokenKind::Identifier)
            .ok_or_else(|| ParseError::expected_identifier(self.current_span(), &self.found()))
    }

    // ========================================================================
    // Items
    // ========================================================================

    /// Parse declarations until end of input or, when `nested`, until the
    /// closing brace of the enclosing block (which is left unconsumed).
    pub fn parse_items(&mut self, nested: bool) -> Result<Vec<Item>, ParseError> {
        let mut items = Vec::new();
        loop {
            if self.is_eof() {
                if nested {
                    return Err(ParseError::unexpected_eof(self.current_span()));
                }
                break;
            }
            if nested && self.check(TokenKind::RBrace) {
                break;
            }
            if self.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            items.push(self.parse_item()?);
        }
        Ok(items)
    }

    fn parse_item(&mut self) -> Result<Item, ParseError> {
        match self.peek().map(|t| t.kind) {
            Some(TokenKind::Namespace) => self.parse_namespace().map(Item::Namespace),
            Some(TokenKind::Using) => self.parse_using(),
            Some(TokenKind::Struct) => self.parse_struct().map(Item::Struct),
            Some(TokenKind::Enum) => self.parse_enum().map(Item::Enum),
            _ => self.parse_declaration(Visibility::Public),
        }
    }

    /// Grammar: `'namespace' NAME ('::' NAME)* '{' ITEM* '}' ';'?`
    ///
    /// `namespace A::B { .. }` nests `B` inside `A`.
    fn parse_namespace(&mut self) -> Result<NamespaceDecl, ParseError> {
        self.expect(TokenKind::Namespace)?;
        let span = self.current_span();
        let path = self.parse_qualified_name()?;
        self.expect(TokenKind::LBrace)?;
        let items = self.parse_items(true)?;
        self.expect(TokenKind::RBrace)?;
        self.eat(TokenKind::Semicolon);

        let mut names = path.get_id_list().into_iter().rev();
        let innermost = names
            .next()
            .ok_or_else(|| ParseError::expected_identifier(span, "'{'"))?;
        let mut decl = NamespaceDecl {
            name: innermost,
            items,
            span,
        };
        for name in names {
            decl = NamespaceDecl {
                name,
                items: vec![Item::Namespace(decl)],
                span,
            };
        }
        Ok(decl)
    }

    /// Grammar: `'using' 'namespace' PATH ';'` or `'using' NAME '=' TYPE ';'`
    fn parse_using(&mut self) -> Result<Item, ParseError> {
        self.expect(TokenKind::Using)?;
        let span = self.current_span();

        if self.eat(TokenKind::Namespace).is_some() {
            let path = self.parse_qualified_name()?;
            self.expect(TokenKind::Semicolon)?;
            return Ok(Item::UsingNamespace(UsingNamespaceDecl { path, span }));
        }

        let name = Identifier::from(self.expect_identifier()?.text);
        self.expect(TokenKind::Assign)?;
        let target = self.parse_type()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Item::UsingAlias(AliasDecl { name, target, span }))
    }

    /// Grammar: `'struct' NAME '{' (VISIBILITY ':' | DECLARATION)* '}' ';'?`
    fn parse_struct(&mut self) -> Result<StructDecl, ParseError> {
        self.expect(TokenKind::Struct)?;
        let name_token = self.expect_identifier()?;
        self.expect(TokenKind::LBrace)?;

        let mut decl = StructDecl {
            name: Identifier::from(name_token.text),
            members: Vec::new(),
            functions: Vec::new(),
            span: name_token.span,
        };
        let mut visibility = Visibility::Public;

        loop {
            if self.is_eof() {
                return Err(ParseError::unexpected_eof(self.current_span()));
            }
            if self.eat(TokenKind::RBrace).is_some() {
                break;
            }
            if self.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            if let Some(v) = self.parse_visibility_label()? {
                visibility = v;
                continue;
            }
            match self.parse_declaration(visibility)? {
                Item::Variable(member) => decl.members.push(member),
                Item::Function(function) => decl.functions.push(function),
                _ => {
                    return Err(ParseError::new(
                        ParseErrorKind::ExpectedDeclaration,
                        self.current_span(),
                        "expected member declaration",
                    ));
                }
            }
        }
        self.eat(TokenKind::Semicolon);
        Ok(decl)
    }

    fn parse_visibility_label(&mut self) -> Result<Option<Visibility>, ParseError> {
        let visibility = match self.peek().map(|t| t.kind) {
            Some(TokenKind::Public) => Visibility::Public,
            Some(TokenKind::Protected) => Visibility::Protected,
            Some(TokenKind::Private) => Visibility::Private,
            _ => return Ok(None),
        };
        self.advance();
        self.expect(TokenKind::Colon)?;
        Ok(Some(visibility))
    }

    /// Grammar: `'enum' 'class'? NAME '{' (NAME ('=' VALUE)?),* '}' ';'?`
    fn parse_enum(&mut self) -> Result<EnumDecl, ParseError> {
        self.expect(TokenKind::Enum)?;
        self.eat(TokenKind::Struct);
        let name_token = self.expect_identifier()?;
        self.expect(TokenKind::LBrace)?;

        let mut values = Vec::new();
        while !self.check(TokenKind::RBrace) {
            let token = self.expect_identifier()?;
            let value = match self.eat(TokenKind::Assign) {
                Some(_) => Some(self.parse_value()?),
                None => None,
            };
            values.push(EnumValueDecl {
                name: Identifier::from(token.text),
                value,
                span: token.span,
            });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        self.eat(TokenKind::Semicolon);

        Ok(EnumDecl {
            name: Identifier::from(name_token.text),
            values,
            span: name_token.span,
        })
    }

    /// A variable or a function.
    ///
    /// Grammar: `'static'? TYPE NAME ( '(' PARAMS ')' BODY | INIT? ';' )`
    fn parse_declaration(&mut self, visibility: Visibility) -> Result<Item, ParseError> {
        let is_static = self.eat(TokenKind::Static).is_some();
        let ty = self.parse_type()?;
        let name_token = self.expect_identifier()?;
        let name = Identifier::from(name_token.text);

        if self.check(TokenKind::LParen) {
            return self
                .parse_function(ty, name, visibility, name_token.span)
                .map(Item::Function);
        }

        let init = if self.eat(TokenKind::Assign).is_some() {
            Some(self.parse_initialiser()?)
        } else if self.check(TokenKind::LBrace) {
            Some(self.parse_initialiser_list()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;

        Ok(Item::Variable(VariableDecl {
            is_static,
            ty,
            name,
            init,
            visibility,
            span: name_token.span,
        }))
    }

    fn parse_function(
        &mut self,
        return_type: TypeExpr,
        name: Identifier,
        visibility: Visibility,
        span: Span,
    ) -> Result<FunctionDecl, ParseError> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let ty = self.parse_type()?;
                let name = Identifier::from(self.expect_identifier()?.text);
                params.push(ParamDecl { ty, name });
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        self.eat(TokenKind::Const);

        let body = if self.eat(TokenKind::Semicolon).is_some() {
            None
        } else {
            Some(self.parse_body()?)
        };

        Ok(FunctionDecl {
            return_type,
            name,
            params,
            body,
            visibility,
            span,
        })
    }

    /// Skip a brace block and return its inner text.
    fn parse_body(&mut self) -> Result<FunctionBody, ParseError> {
        let open = self.expect(TokenKind::LBrace)?;
        let mut depth = 1usize;
        loop {
            let token = self
                .advance()
                .ok_or_else(|| ParseError::unexpected_eof(self.current_span()))?;
            match token.kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(FunctionBody {
                            text: self.source[open.range.end..token.range.start].to_string(),
                            line: open.span.line,
                        });
                    }
                }
                _ => {}
            }
        }
    }

    // ========================================================================
    // Types
    // ========================================================================

    fn parse_qualified_name(&mut self) -> Result<NamespacedIdentifier, ParseError> {
        let first = self.expect_identifier()?;
        self.continue_qualified_name(Identifier::from(first.text))
    }

    fn continue_qualified_name(
        &mut self,
        first: Identifier,
    ) -> Result<NamespacedIdentifier, ParseError> {
        let mut ids = vec![first];
        while self.eat(TokenKind::ColonColon).is_some() {
            ids.push(Identifier::from(self.expect_identifier()?.text));
        }
        Ok(NamespacedIdentifier::from_id_list(ids))
    }

    /// Grammar: `'const'? BASE '&'?`
    ///
    /// Examples:
    /// - `float`
    /// - `const span<float, 4>&`
    /// - `dyn<Voice>`
    /// - `Filters::Coefficients`
    /// - `Osc<float, NumChannels>`
    pub fn parse_type(&mut self) -> Result<TypeExpr, ParseError> {
        let span = self.current_span();
        let is_const = self.eat(TokenKind::Const).is_some();

        let token = self
            .eat(TokenKind::Identifier)
            .ok_or_else(|| ParseError::expected_type(self.current_span(), &self.found()))?;
        let templated = self.check(TokenKind::Less);

        let base = match token.text {
            "span" if templated => {
                self.advance();
                let element = self.parse_type()?;
                self.expect(TokenKind::Comma)?;
                let size = self.parse_template_value()?;
                self.expect(TokenKind::Greater)?;
                TypeBase::Span(Box::new(element), size)
            }
            "dyn" if templated => {
                self.advance();
                let element = self.parse_type()?;
                self.expect(TokenKind::Greater)?;
                TypeBase::Dyn(Box::new(element))
            }
            "wrap" if templated => {
                self.advance();
                let size = self.parse_template_value()?;
                self.expect(TokenKind::Greater)?;
                TypeBase::Wrap(size)
            }
            "bool" => TypeBase::Primitive(TypeId::Integer),
            text => match TypeId::from_name(text) {
                Some(id) if !matches!(id, TypeId::Pointer | TypeId::Dynamic) => {
                    TypeBase::Primitive(id)
                }
                _ => {
                    let id = self.continue_qualified_name(Identifier::from(text))?;
                    if self.eat(TokenKind::Less).is_some() {
                        TypeBase::Template(id, self.parse_template_args()?)
                    } else {
                        TypeBase::Named(id)
                    }
                }
            },
        };

        let is_ref = self.eat(TokenKind::Amp).is_some();
        Ok(TypeExpr {
            is_const,
            is_ref,
            base,
            span,
        })
    }

    /// Arguments after the opening `<`, up to and including the `>`.
    fn parse_template_args(&mut self) -> Result<Vec<TemplateArg>, ParseError> {
        let mut args = Vec::new();
        if self.eat(TokenKind::Greater).is_some() {
            return Ok(args);
        }
        loop {
            let arg = if self.check(TokenKind::Number) {
                TemplateArg::Value(self.parse_template_value()?)
            } else {
                TemplateArg::Type(self.parse_type()?)
            };
            args.push(arg);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::Greater)?;
        Ok(args)
    }

    fn parse_template_value(&mut self) -> Result<TemplateValue, ParseError> {
        if let Some(token) = self.eat(TokenKind::Number) {
            return match parse_literal(token.text) {
                Some(VariableStorage::Integer(v)) => Ok(TemplateValue::Literal(v)),
                _ => Err(ParseError::new(
                    ParseErrorKind::InvalidTemplateArgs,
                    token.span,
                    format!("template argument '{}' is not an integer", token.text),
                )),
            };
        }
        if self.check(TokenKind::Identifier) {
            return self.parse_qualified_name().map(TemplateValue::Named);
        }
        Err(ParseError::expected(
            ParseErrorKind::InvalidTemplateArgs,
            self.current_span(),
            "an integer or constant",
            &self.found(),
        ))
    }

    // ========================================================================
    // Values
    // ========================================================================

    fn parse_initialiser(&mut self) -> Result<Initialiser, ParseError> {
        if self.check(TokenKind::LBrace) {
            self.parse_initialiser_list()
        } else {
            self.parse_value().map(Initialiser::Value)
        }
    }

    /// Grammar: `'{' (INIT (',' INIT)* ','?)? '}'`
    fn parse_initialiser_list(&mut self) -> Result<Initialiser, ParseError> {
        let open = self.expect(TokenKind::LBrace)?;
        let mut items = Vec::new();
        while !self.check(TokenKind::RBrace) {
            items.push(self.parse_initialiser()?);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        if self.eat(TokenKind::RBrace).is_none() {
            return Err(ParseError::expected(
                ParseErrorKind::MismatchedDelimiter,
                open.span,
                "'}' closing the initialiser list",
                &self.found(),
            ));
        }
        Ok(Initialiser::List(items, open.span))
    }

    /// A literal or a constant name, optionally negated.
    fn parse_value(&mut self) -> Result<ValueExpr, ParseError> {
        let negated = self.eat(TokenKind::Minus).is_some();
        let span = self.current_span();

        if let Some(token) = self.eat(TokenKind::Number) {
            let value = parse_literal(token.text).ok_or_else(|| {
                ParseError::new(
                    ParseErrorKind::ExpectedValue,
                    token.span,
                    format!("invalid literal '{}'", token.text),
                )
            })?;
            return Ok(ValueExpr::Literal(if negated { negate(value) } else { value }));
        }

        let identifier = self
            .peek()
            .filter(|t| t.kind == TokenKind::Identifier)
            .map(|t| t.text);
        if let Some(text) = identifier {
            if matches!(text, "true" | "false") {
                self.advance();
                return Ok(ValueExpr::Literal(VariableStorage::Integer((text == "true") as i32)));
            }
            let id = self.parse_qualified_name()?;
            return Ok(ValueExpr::Constant { id, negated, span });
        }

        Err(ParseError::expected(ParseErrorKind::ExpectedValue, span, "a value", &self.found()))
    }
}

pub(crate) fn negate(value: VariableStorage) -> VariableStorage {
    match value {
        VariableStorage::Integer(v) => VariableStorage::Integer(v.wrapping_neg()),
        VariableStorage::Float(v) => VariableStorage::Float(-v),
        VariableStorage::Double(v) => VariableStorage::Double(-v),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(source: &str) -> Vec<Item> {
        parse(source).unwrap()
    }

    fn single_variable(source: &str) -> VariableDecl {
        match items(source).pop() {
            Some(Item::Variable(v)) => v,
            other => panic!("Expected variable, got {other:?}"),
        }
    }

    #[test]
    fn primitive_variable() {
        let v = single_variable("float gain = 0.5f;");
        assert_eq!(v.name, "gain");
        assert_eq!(v.ty.base, TypeBase::Primitive(TypeId::Float));
        assert_eq!(
            v.init,
            Some(Initialiser::Value(ValueExpr::Literal(VariableStorage::Float(0.5))))
        );
        assert!(!v.is_constant());
    }

    #[test]
    fn static_const() {
        let v = single_variable("static const int NumVoices = -4;");
        assert!(v.is_static);
        assert!(v.ty.is_const);
        assert!(v.is_constant());
        assert_eq!(
            v.init,
            Some(Initialiser::Value(ValueExpr::Literal(VariableStorage::Integer(-4))))
        );
    }

    #[test]
    fn template_types() {
        let v = single_variable("span<span<float, 2>, Size> data;");
        match v.ty.base {
            TypeBase::Span(inner, TemplateValue::Named(size)) => {
                assert_eq!(size.to_string(), "Size");
                match inner.base {
                    TypeBase::Span(element, TemplateValue::Literal(2)) => {
                        assert_eq!(element.base, TypeBase::Primitive(TypeId::Float))
                    }
                    other => panic!("Expected span<float, 2>, got {other:?}"),
                }
            }
            other => panic!("Expected span, got {other:?}"),
        }

        let v = single_variable("dyn<int> d;");
        assert!(matches!(v.ty.base, TypeBase::Dyn(_)));
        let v = single_variable("wrap<8> index;");
        assert_eq!(v.ty.base, TypeBase::Wrap(TemplateValue::Literal(8)));
    }

    #[test]
    fn host_template_types() {
        let v = single_variable("Dsp::Osc<span<float, 2>, Voices, 4> osc;");
        let (id, args) = match v.ty.base {
            TypeBase::Template(id, args) => (id, args),
            other => panic!("Expected template type, got {other:?}"),
        };
        assert_eq!(id.to_string(), "Dsp::Osc");
        assert_eq!(args.len(), 3);
        assert!(matches!(&args[0], TemplateArg::Type(t) if matches!(t.base, TypeBase::Span(..))));
        match &args[1] {
            TemplateArg::Type(t) => assert_eq!(t.base, TypeBase::Named(NamespacedIdentifier::new("Voices"))),
            other => panic!("Expected name, got {other:?}"),
        }
        assert_eq!(args[2], TemplateArg::Value(TemplateValue::Literal(4)));

        let v = single_variable("Empty<> e;");
        assert_eq!(
            v.ty.base,
            TypeBase::Template(NamespacedIdentifier::new("Empty"), Vec::new())
        );
    }

    #[test]
    fn qualified_type_and_ref() {
        let v = single_variable("const Filters::Coefficients& c;");
        assert!(v.ty.is_const);
        assert!(v.ty.is_ref);
        match v.ty.base {
            TypeBase::Named(id) => assert_eq!(id.to_string(), "Filters::Coefficients"),
            other => panic!("Expected named type, got {other:?}"),
        }
    }

    #[test]
    fn nested_initialiser_list() {
        let v = single_variable("span<Point, 2> p = { {1, 2.0f}, {3, -4.0f} };");
        match v.init {
            Some(Initialiser::List(items, _)) => {
                assert_eq!(items.len(), 2);
                match &items[1] {
                    Initialiser::List(inner, _) => assert_eq!(
                        inner[1],
                        Initialiser::Value(ValueExpr::Literal(VariableStorage::Float(-4.0)))
                    ),
                    other => panic!("Expected list, got {other:?}"),
                }
            }
            other => panic!("Expected list, got {other:?}"),
        }
    }

    #[test]
    fn constant_reference_initialiser() {
        let v = single_variable("int x = -Config::size;");
        match v.init {
            Some(Initialiser::Value(ValueExpr::Constant { id, negated, .. })) => {
                assert_eq!(id.to_string(), "Config::size");
                assert!(negated);
            }
            other => panic!("Expected constant reference, got {other:?}"),
        }
    }

    #[test]
    fn namespaces_and_using() {
        let parsed = items(
            "namespace A::B { int x; }\n\
             using namespace A::B;\n\
             using Sample = float;",
        );
        assert_eq!(parsed.len(), 3);

        match &parsed[0] {
            Item::Namespace(a) => {
                assert_eq!(a.name, "A");
                match &a.items[0] {
                    Item::Namespace(b) => {
                        assert_eq!(b.name, "B");
                        assert!(matches!(b.items[0], Item::Variable(_)));
                    }
                    other => panic!("Expected namespace, got {other:?}"),
                }
            }
            other => panic!("Expected namespace, got {other:?}"),
        }
        match &parsed[1] {
            Item::UsingNamespace(u) => assert_eq!(u.path.to_string(), "A::B"),
            other => panic!("Expected using namespace, got {other:?}"),
        }
        match &parsed[2] {
            Item::UsingAlias(alias) => {
                assert_eq!(alias.name, "Sample");
                assert_eq!(alias.target.base, TypeBase::Primitive(TypeId::Float));
            }
            other => panic!("Expected alias, got {other:?}"),
        }
    }

    #[test]
    fn struct_members_and_functions() {
        let parsed = items(
            "struct Osc {\n\
               static const int Size = 4;\n\
               float uptime = 0.0f;\n\
             private:\n\
               double delta;\n\
               float tick(float x) { return x * { 2.0f }; }\n\
             };",
        );
        let Some(Item::Struct(s)) = parsed.first() else {
            panic!("Expected struct, got {parsed:?}");
        };
        assert_eq!(s.name, "Osc");
        assert_eq!(s.members.len(), 3);
        assert!(s.members[0].is_static);
        assert_eq!(s.members[1].visibility, Visibility::Public);
        assert_eq!(s.members[2].visibility, Visibility::Private);

        let tick = &s.functions[0];
        assert_eq!(tick.name, "tick");
        assert_eq!(tick.params.len(), 1);
        assert_eq!(tick.visibility, Visibility::Private);
        let body = tick.body.as_ref().unwrap();
        assert_eq!(body.text.trim(), "return x * { 2.0f };");
        assert_eq!(body.line, 6);
    }

    #[test]
    fn enum_values() {
        let parsed = items("enum Mode { Off, On = 3, Auto };");
        let Some(Item::Enum(e)) = parsed.first() else {
            panic!("Expected enum, got {parsed:?}");
        };
        assert_eq!(e.values.len(), 3);
        assert_eq!(e.values[0].value, None);
        assert_eq!(
            e.values[1].value,
            Some(ValueExpr::Literal(VariableStorage::Integer(3)))
        );
    }

    #[test]
    fn forward_declared_function() {
        let parsed = items("void reset();");
        match &parsed[0] {
            Item::Function(f) => assert!(f.body.is_none()),
            other => panic!("Expected function, got {other:?}"),
        }
    }

    #[test]
    fn missing_semicolon() {
        match parse("int x") {
            Err(snex_core::CompileError::Parse(e)) => assert_eq!(e.kind, ParseErrorKind::UnexpectedEof),
            other => panic!("Expected parse error, got {other:?}"),
        }
        match parse("int x int y;") {
            Err(snex_core::CompileError::Parse(e)) => {
                assert_eq!(e.kind, ParseErrorKind::ExpectedToken);
                assert_eq!(e.span.col, 7);
            }
            other => panic!("Expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn unclosed_body() {
        match parse("void f() { if (x) { }") {
            Err(snex_core::CompileError::Parse(e)) => assert_eq!(e.kind, ParseErrorKind::UnexpectedEof),
            other => panic!("Expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn bad_template_argument() {
        match parse("span<float, 2.5f> s;") {
            Err(snex_core::CompileError::Parse(e)) => {
                assert_eq!(e.kind, ParseErrorKind::InvalidTemplateArgs)
            }
            other => panic!("Expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn lex_errors_surface() {
        assert!(matches!(
            parse("int a = `;"),
            Err(snex_core::CompileError::Lex(_))
        ));
    }
}
