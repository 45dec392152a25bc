//! Fixed size homogeneous arrays: `span<T, N>`.

use std::fmt::Write as _;
use std::sync::OnceLock;

use super::{ComplexVisitor, dump_primitive, write_native_member};
use crate::{
    FunctionClass, FunctionData, InitialiserList, Inliner, LayoutError, NamespacedIdentifier,
    NativeFn, TypeId, TypeInfo, VariableStorage,
};

#[derive(Debug)]
pub struct SpanType {
    element: TypeInfo,
    count: usize,
    finalised: OnceLock<usize>,
}

impl SpanType {
    pub fn new(element: TypeInfo, count: usize) -> Self {
        Self {
            element,
            count,
            finalised: OnceLock::new(),
        }
    }

    pub fn element_type(&self) -> &TypeInfo {
        &self.element
    }

    pub fn num_elements(&self) -> usize {
        self.count
    }

    /// Stride between elements. Complex elements are padded up to their
    /// alignment.
    pub fn element_size(&self) -> usize {
        match self.finalised.get() {
            Some(size) => *size,
            None => Self::padded_element_size(&self.element).unwrap_or(usize::MAX),
        }
    }

    fn padded_element_size(element: &TypeInfo) -> Option<usize> {
        let raw = element.required_byte_size();
        if element.is_complex_type() {
            let alignment = element.required_alignment().max(1);
            raw.div_ceil(alignment).checked_mul(alignment)
        } else {
            Some(raw)
        }
    }

    /// Saturates for unfinalised spans whose layout would overflow.
    pub fn required_byte_size(&self) -> usize {
        self.element_size().saturating_mul(self.count)
    }

    pub fn required_alignment(&self) -> usize {
        self.element.required_alignment().max(1)
    }

    pub fn is_finalised(&self) -> bool {
        self.finalised.get().is_some()
    }

    pub(super) fn finalise_alignment(&self) -> Result<(), LayoutError> {
        if self.is_finalised() {
            return Ok(());
        }
        if let Some(c) = self.element.get_complex_type() {
            c.finalise_alignment()?;
        }
        if self.element.required_alignment() == 0 {
            return Err(LayoutError::UnsizedMember {
                type_name: self.to_string_internal(),
                name: "element".to_string(),
            });
        }
        let stride = Self::padded_element_size(&self.element)
            .filter(|stride| stride.checked_mul(self.count).is_some_and(|n| n <= isize::MAX as usize))
            .ok_or_else(|| LayoutError::SizeOverflow {
                type_name: self.to_string_internal(),
            })?;
        let _ = self.finalised.set(stride);
        Ok(())
    }

    /// One element default, broadcast to every slot.
    pub(super) fn make_default_initialiser_list(&self) -> InitialiserList {
        let element = self.element.make_default_initialiser_list();
        let mut list = InitialiserList::new();
        if self.element.is_complex_type() || !element.is_single_value() {
            list.add_child_list(element);
        } else if let Ok(v) = element.get_value(0) {
            list.add_value(v);
        }
        list
    }

    /// Accepts either one item per element or a single item that fills the
    /// whole span.
    pub(super) fn initialise(&self, data: &mut [u8], list: &InitialiserList) -> Result<(), LayoutError> {
        let size = list.size();
        if size != self.count && size != 1 {
            return Err(LayoutError::InitialiserSize {
                type_name: self.to_string_internal(),
                expected: self.count,
                actual: size,
            });
        }

        let stride = self.element_size();
        let type_name = self.to_string_internal();

        for i in 0..self.count {
            let index = if size == 1 { 0 } else { i };
            let offset = i * stride;
            match self.element.get_complex_type() {
                Some(c) => {
                    let child = list.child_list(index)?;
                    c.initialise(&mut data[offset..offset + c.required_byte_size()], &child)?;
                }
                None => {
                    let value = list.get_value(index).map_err(|_| LayoutError::TypeMismatch {
                        type_name: type_name.clone(),
                        index,
                        expected: self.element.to_string(),
                        actual: "initialiser list".to_string(),
                    })?;
                    write_native_member(self.element.get_type(), value, data, offset, &type_name, index)?;
                }
            }
        }
        Ok(())
    }

    pub(super) fn for_each_element(&self, data: &mut [u8], visitor: &mut ComplexVisitor<'_>) -> bool {
        let Some(c) = self.element.get_complex_type() else {
            return false;
        };
        let stride = self.element_size();
        let element_size = c.required_byte_size();
        for i in 0..self.count {
            let start = i * stride;
            let end = start + element_size;
            if end > data.len() {
                break;
            }
            if c.for_each(&mut data[start..end], visitor) {
                return true;
            }
        }
        false
    }

    pub(super) fn dump_into(&self, data: &[u8], indent: usize, out: &mut String) {
        let stride = self.element_size();
        for i in 0..self.count {
            let offset = i * stride;
            match self.element.get_complex_type() {
                Some(c) => {
                    let _ = writeln!(out, "{}[{i}]:", "  ".repeat(indent));
                    let end = (offset + c.required_byte_size()).min(data.len());
                    c.dump_into(&data[offset.min(end)..end], indent + 1, out);
                }
                None => dump_primitive(self.element.get_type(), data, offset, &format!("[{i}]"), indent, out),
            }
        }
    }

    pub(super) fn to_string_internal(&self) -> String {
        format!("span<{}, {}>", self.element.to_string_without_alias(), self.count)
    }

    /// `size()` returns the element count and folds to a constant.
    pub(super) fn function_class(&self) -> FunctionClass {
        let class_id = NamespacedIdentifier::new(self.to_string_internal());
        let size_id = class_id.get_child_id("size");
        let count = VariableStorage::Integer(self.count as i32);

        let size_fn = FunctionData::new(size_id.clone(), TypeInfo::new(TypeId::Integer))
            .with_function(NativeFn::constant(count))
            .with_description("Returns the number of elements")
            .with_inliner(Inliner::from_fn(size_id, move |d| {
                d.set_result(count);
                Ok(())
            }));

        let mut fc = FunctionClass::new(class_id);
        fc.add_function(size_fn);
        fc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComplexType, StructType};
    use std::sync::Arc;

    #[test]
    fn primitive_span_layout() {
        let c: ComplexType = SpanType::new(TypeInfo::new(TypeId::Float), 4).into();
        c.finalise_alignment().unwrap();
        assert_eq!(c.required_byte_size(), 16);
        assert_eq!(c.required_alignment(), 4);
        assert_eq!(c.to_string_internal(), "span<float, 4>");
    }

    #[test]
    fn broadcast_single_value() {
        let c: ComplexType = SpanType::new(TypeInfo::new(TypeId::Integer), 3).into();
        c.finalise_alignment().unwrap();

        let mut data = vec![0u8; 12];
        c.initialise(&mut data, &InitialiserList::make_single_list(VariableStorage::Integer(7)))
            .unwrap();
        for i in 0..3 {
            assert_eq!(
                VariableStorage::read_from(TypeId::Integer, &data, i * 4).unwrap(),
                VariableStorage::Integer(7)
            );
        }
    }

    #[test]
    fn per_element_values() {
        let c: ComplexType = SpanType::new(TypeInfo::new(TypeId::Double), 2).into();
        c.finalise_alignment().unwrap();

        let mut data = vec![0u8; 16];
        c.initialise(&mut data, &InitialiserList::parse("{1, 2.5}").unwrap())
            .unwrap();
        assert_eq!(
            VariableStorage::read_from(TypeId::Double, &data, 8).unwrap(),
            VariableStorage::Double(2.5)
        );
    }

    #[test]
    fn wrong_count_is_error() {
        let c: ComplexType = SpanType::new(TypeInfo::new(TypeId::Integer), 3).into();
        c.finalise_alignment().unwrap();

        let mut data = vec![0u8; 12];
        assert!(matches!(
            c.initialise(&mut data, &InitialiserList::parse("{1, 2}").unwrap()),
            Err(LayoutError::InitialiserSize { expected: 3, actual: 2, .. })
        ));
    }

    #[test]
    fn struct_elements_use_child_lists() {
        let pair: Arc<ComplexType> = Arc::new(
            StructType::new(NamespacedIdentifier::new("Pair"))
                .with_member("a", TypeInfo::new(TypeId::Integer))
                .with_member("b", TypeInfo::new(TypeId::Integer))
                .into(),
        );
        let c: ComplexType = SpanType::new(TypeInfo::from_complex(pair), 2).into();
        c.finalise_alignment().unwrap();

        let mut data = vec![0u8; 16];
        c.initialise(&mut data, &InitialiserList::parse("{{1, 2}, {3, 4}}").unwrap())
            .unwrap();
        assert_eq!(
            VariableStorage::read_from(TypeId::Integer, &data, 12).unwrap(),
            VariableStorage::Integer(4)
        );
        assert_eq!(c.dump_table(&data), "[0]:\n  a: 1\n  b: 2\n[1]:\n  a: 3\n  b: 4\n");
    }

    #[test]
    fn oversized_nesting_is_a_layout_error() {
        let inner: Arc<ComplexType> =
            Arc::new(SpanType::new(TypeInfo::new(TypeId::Double), i32::MAX as usize).into());
        let outer: ComplexType = SpanType::new(TypeInfo::from_complex(inner), i32::MAX as usize).into();

        match outer.finalise_alignment() {
            Err(LayoutError::SizeOverflow { type_name }) => {
                assert_eq!(type_name, "span<span<double, 2147483647>, 2147483647>")
            }
            other => panic!("Expected SizeOverflow, got {other:?}"),
        }
        assert!(!outer.is_finalised());
        assert_eq!(outer.required_byte_size(), usize::MAX);
    }

    #[test]
    fn size_function_folds() {
        let c: ComplexType = SpanType::new(TypeInfo::new(TypeId::Float), 8).into();
        let fc = c.function_class().unwrap();
        let id = NamespacedIdentifier::new("span<float, 8>").get_child_id("size");
        assert!(fc.is_inlineable(&id));

        let f = fc.get_non_overloaded_function(&id).unwrap();
        assert_eq!(f.call(&[]).unwrap(), VariableStorage::Integer(8));
    }
}
