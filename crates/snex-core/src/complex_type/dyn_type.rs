//! Dynamic views onto external memory: `dyn<T>`.
//!
//! Layout (16 bytes, 8 aligned): four unused bytes, the element count as
//! `i32`, then the data address. This matches [`Block`](crate::Block).

use std::fmt::Write as _;
use std::sync::OnceLock;

use crate::{
    Block, FunctionClass, FunctionData, FunctionError, InitialiserList, LayoutError,
    NamespacedIdentifier, NativeFn, TypeId, TypeInfo, VariableStorage,
};

#[derive(Debug)]
pub struct DynType {
    element: TypeInfo,
    finalised: OnceLock<()>,
}

impl DynType {
    pub const SIZE: usize = 16;
    pub const ALIGNMENT: usize = 8;

    pub fn new(element: TypeInfo) -> Self {
        Self {
            element,
            finalised: OnceLock::new(),
        }
    }

    pub fn element_type(&self) -> &TypeInfo {
        &self.element
    }

    pub fn is_finalised(&self) -> bool {
        self.finalised.get().is_some()
    }

    pub(super) fn finalise_alignment(&self) -> Result<(), LayoutError> {
        if let Some(c) = self.element.get_complex_type() {
            c.finalise_alignment()?;
        }
        let _ = self.finalised.set(());
        Ok(())
    }

    /// `{data, size}`, both zero.
    pub(super) fn make_default_initialiser_list() -> InitialiserList {
        InitialiserList::new()
            .with_value(VariableStorage::Pointer(0))
            .with_value(VariableStorage::Integer(0))
    }

    /// Accepts `{}`, `{block}` or `{data, size}`.
    pub(super) fn initialise(&self, data: &mut [u8], list: &InitialiserList) -> Result<(), LayoutError> {
        let view = match list.size() {
            0 => Block::default(),
            1 => match list.get_value(0)? {
                VariableStorage::Block(b) => b,
                other => return Err(self.mismatch(0, "block", &other)),
            },
            2 => {
                let address = match list.get_value(0)? {
                    VariableStorage::Pointer(p) => p,
                    VariableStorage::Integer(i) => i as u64,
                    other => return Err(self.mismatch(0, "pointer", &other)),
                };
                let size = match list.get_value(1)? {
                    VariableStorage::Integer(i) => i,
                    other => return Err(self.mismatch(1, "int", &other)),
                };
                Block::new(address, size)
            }
            actual => {
                return Err(LayoutError::InitialiserSize {
                    type_name: self.to_string_internal(),
                    expected: 2,
                    actual,
                });
            }
        };
        data[..Self::SIZE].copy_from_slice(&view.to_bytes());
        Ok(())
    }

    fn mismatch(&self, index: usize, expected: &str, actual: &VariableStorage) -> LayoutError {
        LayoutError::TypeMismatch {
            type_name: self.to_string_internal(),
            index,
            expected: expected.to_string(),
            actual: actual.type_id().name().to_string(),
        }
    }

    /// Decode the view stored in `data`.
    pub fn read_view(data: &[u8]) -> Option<Block> {
        let bytes: &[u8; 16] = data.get(..Self::SIZE)?.try_into().ok()?;
        Some(Block::from_bytes(bytes))
    }

    pub(super) fn dump_into(&self, data: &[u8], indent: usize, out: &mut String) {
        let pad = "  ".repeat(indent);
        match Self::read_view(data) {
            Some(view) => {
                let _ = writeln!(out, "{pad}size: {}", view.size);
                let _ = writeln!(out, "{pad}data: {:#x}", view.data);
            }
            None => {
                let _ = writeln!(out, "{pad}<out of range>");
            }
        }
    }

    pub(super) fn to_string_internal(&self) -> String {
        format!("dyn<{}>", self.element.to_string_without_alias())
    }

    /// `size()` reads the element count from the instance memory.
    pub(super) fn function_class(&self) -> FunctionClass {
        let class_id = NamespacedIdentifier::new(self.to_string_internal());
        let size_id = class_id.get_child_id("size");

        let size_fn = FunctionData::new(size_id, TypeInfo::new(TypeId::Integer))
            .with_description("Returns the number of elements in the view")
            .with_function(NativeFn::from_fn(|ctx| {
                let size = ctx
                    .this_data()
                    .and_then(|d| DynType::read_view(d))
                    .map(|b| b.size)
                    .ok_or_else(|| FunctionError::Native("dyn::size called without instance".into()))?;
                ctx.set_return(VariableStorage::Integer(size));
                Ok(())
            }));

        let mut fc = FunctionClass::new(class_id);
        fc.add_function(size_fn);
        fc
    }
}
