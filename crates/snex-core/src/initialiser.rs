//! Nested initialiser lists.
//!
//! An [`InitialiserList`] mirrors the member structure of the complex type it
//! initialises: primitive members consume a value, complex members consume a
//! child list. The textual form is the one used in SNEX source:
//!
//! ```
//! use snex_core::InitialiserList;
//!
//! let list = InitialiserList::parse("{1, 2.5f, {3, 4}}").unwrap();
//! assert_eq!(list.size(), 3);
//! assert_eq!(list.to_string(), "{1, 2.5f, {3, 4}}");
//! ```

use std::fmt;

use crate::{LayoutError, VariableStorage};

/// One entry of an initialiser list.
#[derive(Debug, Clone, PartialEq)]
pub enum InitialiserItem {
    Value(VariableStorage),
    List(InitialiserList),
}

/// An ordered tree of initial values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InitialiserList {
    items: Vec<InitialiserItem>,
}

impl InitialiserList {
    pub fn new() -> Self {
        Self::default()
    }

    /// A list holding exactly one value.
    pub fn make_single_list(value: VariableStorage) -> Self {
        Self {
            items: vec![InitialiserItem::Value(value)],
        }
    }

    pub fn add_value(&mut self, value: VariableStorage) -> &mut Self {
        self.items.push(InitialiserItem::Value(value));
        self
    }

    pub fn add_child_list(&mut self, list: InitialiserList) -> &mut Self {
        self.items.push(InitialiserItem::List(list));
        self
    }

    pub fn with_value(mut self, value: impl Into<VariableStorage>) -> Self {
        self.add_value(value.into());
        self
    }

    pub fn with_child_list(mut self, list: InitialiserList) -> Self {
        self.add_child_list(list);
        self
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[InitialiserItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&InitialiserItem> {
        self.items.get(index)
    }

    /// The value at `index`. A child list holding a single value unwraps to
    /// that value.
    pub fn get_value(&self, index: usize) -> Result<VariableStorage, LayoutError> {
        match self.items.get(index) {
            Some(InitialiserItem::Value(v)) => Ok(*v),
            Some(InitialiserItem::List(list)) if list.size() == 1 => list.get_value(0),
            Some(InitialiserItem::List(list)) => Err(LayoutError::MalformedInitialiser(format!(
                "expected a value at index {index}, found {list}"
            ))),
            None => Err(LayoutError::IndexOutOfRange {
                index,
                size: self.items.len(),
            }),
        }
    }

    /// The child list at `index`. A scalar item is wrapped into a one item
    /// list so `{1, 2}` can initialise a struct whose members are wrapped
    /// primitives.
    pub fn child_list(&self, index: usize) -> Result<InitialiserList, LayoutError> {
        match self.items.get(index) {
            Some(InitialiserItem::List(list)) => Ok(list.clone()),
            Some(InitialiserItem::Value(v)) => Ok(InitialiserList::make_single_list(*v)),
            None => Err(LayoutError::IndexOutOfRange {
                index,
                size: self.items.len(),
            }),
        }
    }

    /// Whether the list holds only one scalar.
    pub fn is_single_value(&self) -> bool {
        matches!(self.items.as_slice(), [InitialiserItem::Value(_)])
    }

    /// Parse the textual form `{a, b, {c}}`.
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        let mut parser = ListParser {
            bytes: text.as_bytes(),
            pos: 0,
        };
        let list = parser.list()?;
        parser.skip_ws();
        if parser.pos != parser.bytes.len() {
            return Err(parser.error("trailing characters"));
        }
        Ok(list)
    }
}

impl fmt::Display for InitialiserList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match item {
                InitialiserItem::Value(v) => write!(f, "{v}")?,
                InitialiserItem::List(l) => write!(f, "{l}")?,
            }
        }
        f.write_str("}")
    }
}

struct ListParser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl ListParser<'_> {
    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.bytes.get(self.pos).copied()
    }

    fn error(&self, what: &str) -> LayoutError {
        LayoutError::MalformedInitialiser(format!("{what} at offset {}", self.pos))
    }

    fn expect(&mut self, c: u8) -> Result<(), LayoutError> {
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", c as char)))
        }
    }

    fn list(&mut self) -> Result<InitialiserList, LayoutError> {
        self.expect(b'{')?;
        let mut list = InitialiserList::new();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(list);
        }
        loop {
            if self.peek() == Some(b'{') {
                let child = self.list()?;
                list.add_child_list(child);
            } else {
                let value = self.value()?;
                list.add_value(value);
            }
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(list);
                }
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    fn value(&mut self) -> Result<VariableStorage, LayoutError> {
        self.skip_ws();
        let start = self.pos;
        while self.pos < self.bytes.len() {
            let c = self.bytes[self.pos];
            if c.is_ascii_alphanumeric() || c == b'.' || c == b'-' || c == b'+' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let token = std::str::from_utf8(&self.bytes[start..self.pos])
            .map_err(|_| self.error("invalid utf-8"))?;
        parse_literal(token).ok_or_else(|| self.error(&format!("invalid literal '{token}'")))
    }
}

/// Parse a numeric literal: `5`, `-3`, `0x10`, `2.5f`, `0.25`, `true`/`false`.
pub fn parse_literal(token: &str) -> Option<VariableStorage> {
    match token {
        "true" => return Some(VariableStorage::Integer(1)),
        "false" => return Some(VariableStorage::Integer(0)),
        _ => {}
    }
    if let Some(hex) = token.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16)
            .ok()
            .map(|v| VariableStorage::Integer(v as i32));
    }
    if let Some(float) = token.strip_suffix('f') {
        return float.parse::<f32>().ok().map(VariableStorage::Float);
    }
    if token.contains('.') || token.contains('e') {
        return token.parse::<f64>().ok().map(VariableStorage::Double);
    }
    token.parse::<i32>().ok().map(VariableStorage::Integer)
}
