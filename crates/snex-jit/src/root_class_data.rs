//! Flat storage for the variables of a class scope.
//!
//! Every slot is allocated once during registration and never moves or
//! shrinks for the lifetime of the table. Native values live in a
//! [`VariableStorage`]; complex values own a byte buffer laid out by their
//! [`ComplexType`](snex_core::ComplexType).

use rustc_hash::FxHashMap;
use snex_core::{
    InitialiserList, LayoutError, NamespacedIdentifier, ScopeError, Symbol, TypeId,
    VariableStorage,
};

/// Contents of one slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotValue {
    Native(VariableStorage),
    Complex(Vec<u8>),
}

/// One allocated variable.
#[derive(Debug, Clone)]
pub struct Slot {
    pub symbol: Symbol,
    pub value: SlotValue,
}

impl Slot {
    /// A one line or table rendering of the current value.
    pub fn dump_value(&self) -> String {
        match (&self.value, self.symbol.type_info.get_complex_type()) {
            (SlotValue::Native(v), _) => v.to_string(),
            (SlotValue::Complex(data), Some(ty)) => ty.dump_table(data),
            (SlotValue::Complex(data), None) => format!("<{} bytes>", data.len()),
        }
    }
}

/// Fixed capacity variable table of a class scope.
#[derive(Debug, Clone)]
pub struct RootClassData {
    capacity: usize,
    slots: Vec<Slot>,
    index: FxHashMap<NamespacedIdentifier, usize>,
}

impl RootClassData {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: &NamespacedIdentifier) -> bool {
        self.index.contains_key(id)
    }

    pub fn slot_index(&self, id: &NamespacedIdentifier) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Largest complex value a single slot may hold.
    pub const MAX_SLOT_BYTES: usize = 1 << 28;

    /// Reserve a slot for `symbol` and write its initial value.
    ///
    /// Complex values are initialised from `initial` or, if absent, from the
    /// type's default list. Native values take the single value of
    /// `initial`, converted to the declared type, or zero.
    pub fn allocate(
        &mut self,
        symbol: Symbol,
        initial: Option<&InitialiserList>,
    ) -> Result<usize, ScopeError> {
        if self.contains(&symbol.id) {
            return Err(ScopeError::DuplicateVariable {
                name: symbol.id.to_string(),
            });
        }
        if self.slots.len() >= self.capacity {
            return Err(ScopeError::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        let value = match symbol.type_info.get_complex_type() {
            Some(ty) => {
                let size = ty.required_byte_size();
                if size > Self::MAX_SLOT_BYTES {
                    return Err(ScopeError::VariableTooLarge {
                        name: symbol.id.to_string(),
                        size,
                        limit: Self::MAX_SLOT_BYTES,
                    });
                }
                let mut data = vec![0u8; size];
                match initial {
                    Some(list) => ty.initialise(&mut data, list)?,
                    None => ty.initialise(&mut data, &ty.make_default_initialiser_list())?,
                }
                SlotValue::Complex(data)
            }
            None => {
                let target = symbol.type_info.get_type();
                let value = match initial {
                    Some(list) if list.size() > 1 => {
                        return Err(LayoutError::InitialiserSize {
                            type_name: symbol.type_info.to_string(),
                            expected: 1,
                            actual: list.size(),
                        }
                        .into());
                    }
                    Some(list) if !list.is_empty() => {
                        Self::convert(&symbol, list.get_value(0)?, target)?
                    }
                    _ => VariableStorage::zero(target),
                };
                SlotValue::Native(value)
            }
        };

        tracing::debug!(
            target: "snex::scope",
            symbol = %symbol,
            slot = self.slots.len(),
            "allocated variable"
        );

        let index = self.slots.len();
        self.index.insert(symbol.id.clone(), index);
        self.slots.push(Slot { symbol, value });
        Ok(index)
    }

    fn convert(
        symbol: &Symbol,
        value: VariableStorage,
        target: TypeId,
    ) -> Result<VariableStorage, ScopeError> {
        if target == TypeId::Dynamic {
            return Ok(value);
        }
        value
            .convert_for_initialiser(target)
            .ok_or_else(|| ScopeError::TypeMismatch {
                name: symbol.id.to_string(),
                expected: target.name().to_string(),
                actual: value.type_id().name().to_string(),
            })
    }

    pub fn get(&self, id: &NamespacedIdentifier) -> Option<&Slot> {
        self.slot_index(id).map(|i| &self.slots[i])
    }

    /// Value of a native slot.
    pub fn get_value(&self, id: &NamespacedIdentifier) -> Option<VariableStorage> {
        match &self.get(id)?.value {
            SlotValue::Native(v) => Some(*v),
            SlotValue::Complex(_) => None,
        }
    }

    /// Overwrite a native slot. The value is converted to the declared type.
    pub fn set_value(
        &mut self,
        id: &NamespacedIdentifier,
        value: VariableStorage,
    ) -> Result<(), ScopeError> {
        let index = self
            .slot_index(id)
            .ok_or_else(|| ScopeError::UnknownVariable {
                name: id.to_string(),
            })?;
        let slot = &mut self.slots[index];
        if slot.symbol.type_info.is_const() || matches!(slot.value, SlotValue::Complex(_)) {
            return Err(ScopeError::TypeMismatch {
                name: id.to_string(),
                expected: slot.symbol.type_info.to_string(),
                actual: value.type_id().name().to_string(),
            });
        }
        let converted = Self::convert(&slot.symbol, value, slot.symbol.type_info.get_type())?;
        slot.value = SlotValue::Native(converted);
        Ok(())
    }

    /// Memory of a complex slot.
    pub fn data(&self, id: &NamespacedIdentifier) -> Option<&[u8]> {
        match &self.get(id)?.value {
            SlotValue::Complex(data) => Some(data),
            SlotValue::Native(_) => None,
        }
    }

    pub fn data_mut(&mut self, id: &NamespacedIdentifier) -> Option<&mut [u8]> {
        let index = self.slot_index(id)?;
        match &mut self.slots[index].value {
            SlotValue::Complex(data) => Some(data),
            SlotValue::Native(_) => None,
        }
    }

    /// Slots in allocation order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }
}
