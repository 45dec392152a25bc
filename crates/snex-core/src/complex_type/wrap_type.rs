//! Wrapped integer indices: `wrap<N>` stores values modulo `N`.

use std::fmt::Write as _;
use std::sync::OnceLock;

use crate::{InitialiserList, LayoutError, TypeId, VariableStorage};

#[derive(Debug)]
pub struct WrapType {
    size: i32,
    finalised: OnceLock<()>,
}

impl WrapType {
    pub const SIZE: usize = 4;
    pub const ALIGNMENT: usize = 4;

    /// Upper bound of the index range. Values below one are clamped to one.
    pub fn new(size: i32) -> Self {
        Self {
            size: size.max(1),
            finalised: OnceLock::new(),
        }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    /// Map any integer into `0..size`.
    pub fn wrap(&self, value: i32) -> i32 {
        value.rem_euclid(self.size)
    }

    pub fn is_finalised(&self) -> bool {
        self.finalised.get().is_some()
    }

    pub(super) fn finalise_alignment(&self) -> Result<(), LayoutError> {
        let _ = self.finalised.set(());
        Ok(())
    }

    pub(super) fn make_default_initialiser_list() -> InitialiserList {
        InitialiserList::make_single_list(VariableStorage::Integer(0))
    }

    pub(super) fn initialise(&self, data: &mut [u8], list: &InitialiserList) -> Result<(), LayoutError> {
        if list.size() != 1 {
            return Err(LayoutError::InitialiserSize {
                type_name: self.to_string_internal(),
                expected: 1,
                actual: list.size(),
            });
        }
        let value = list.get_value(0)?;
        let Some(VariableStorage::Integer(v)) = value.convert_to(TypeId::Integer) else {
            return Err(LayoutError::TypeMismatch {
                type_name: self.to_string_internal(),
                index: 0,
                expected: "int".to_string(),
                actual: value.type_id().name().to_string(),
            });
        };
        VariableStorage::Integer(self.wrap(v)).write_to(data, 0)
    }

    pub(super) fn dump_into(&self, data: &[u8], indent: usize, out: &mut String) {
        let pad = "  ".repeat(indent);
        match VariableStorage::read_from(TypeId::Integer, data, 0) {
            Ok(v) => {
                let _ = writeln!(out, "{pad}value: {v}");
            }
            Err(_) => {
                let _ = writeln!(out, "{pad}<out of range>");
            }
        }
    }

    pub(super) fn to_string_internal(&self) -> String {
        format!("wrap<{}>", self.size)
    }
}
