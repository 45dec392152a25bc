//! Primitive type tags and the values they carry.
//!
//! [`TypeId`] is the tag every [`TypeInfo`](crate::TypeInfo) falls back to.
//! [`VariableStorage`] is a tagged primitive value that can be written into
//! (and read back from) the raw memory of a complex type.

use std::fmt;

use crate::LayoutError;

// ============================================================================
// TypeId
// ============================================================================

/// Primitive type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeId {
    Void,
    Integer,
    Float,
    Double,
    /// Address of a complex object. Only valid together with a complex type.
    Pointer,
    /// A 16 byte MIDI style event.
    Event,
    /// A sized view onto an external float buffer.
    Block,
    /// Wildcard used by native functions that accept anything.
    Dynamic,
}

impl TypeId {
    /// All tags, in declaration order.
    pub const ALL: [TypeId; 8] = [
        TypeId::Void,
        TypeId::Integer,
        TypeId::Float,
        TypeId::Double,
        TypeId::Pointer,
        TypeId::Event,
        TypeId::Block,
        TypeId::Dynamic,
    ];

    /// Storage size in bytes.
    pub const fn size(self) -> usize {
        match self {
            TypeId::Void | TypeId::Dynamic => 0,
            TypeId::Integer | TypeId::Float => 4,
            TypeId::Double | TypeId::Pointer => 8,
            TypeId::Event | TypeId::Block => 16,
        }
    }

    /// Required alignment in bytes.
    pub const fn alignment(self) -> usize {
        match self {
            TypeId::Void | TypeId::Dynamic => 0,
            TypeId::Integer | TypeId::Float | TypeId::Event => 4,
            TypeId::Double | TypeId::Pointer | TypeId::Block => 8,
        }
    }

    /// Numeric tags convert implicitly among each other.
    pub const fn is_numeric(self) -> bool {
        matches!(self, TypeId::Integer | TypeId::Float | TypeId::Double)
    }

    pub const fn is_floating_point(self) -> bool {
        matches!(self, TypeId::Float | TypeId::Double)
    }

    /// Whether a value of `self` may be passed where `target` is expected
    /// without an explicit cast.
    pub const fn converts_implicitly_to(self, target: TypeId) -> bool {
        self.is_numeric() && target.is_numeric()
    }

    /// SNEX keyword for the tag.
    pub const fn name(self) -> &'static str {
        match self {
            TypeId::Void => "void",
            TypeId::Integer => "int",
            TypeId::Float => "float",
            TypeId::Double => "double",
            TypeId::Pointer => "pointer",
            TypeId::Event => "event",
            TypeId::Block => "block",
            TypeId::Dynamic => "dynamic",
        }
    }

    pub fn from_name(name: &str) -> Option<TypeId> {
        TypeId::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Event / Block
// ============================================================================

/// A 16 byte event record.
///
/// Layout: `kind, channel, number, value` (1 byte each), `event_id` (2),
/// `transpose`, `gain` (1 each), `timestamp` (4), `pitch_cents` (4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HiseEvent {
    pub kind: u8,
    pub channel: u8,
    pub number: u8,
    pub value: u8,
    pub event_id: u16,
    pub transpose: i8,
    pub gain: i8,
    pub timestamp: u32,
    pub pitch_cents: i32,
}

impl HiseEvent {
    pub const SIZE: usize = 16;

    pub fn to_bytes(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[0] = self.kind;
        out[1] = self.channel;
        out[2] = self.number;
        out[3] = self.value;
        out[4..6].copy_from_slice(&self.event_id.to_ne_bytes());
        out[6] = self.transpose as u8;
        out[7] = self.gain as u8;
        out[8..12].copy_from_slice(&self.timestamp.to_ne_bytes());
        out[12..16].copy_from_slice(&self.pitch_cents.to_ne_bytes());
        out
    }

    pub fn from_bytes(b: &[u8; 16]) -> Self {
        Self {
            kind: b[0],
            channel: b[1],
            number: b[2],
            value: b[3],
            event_id: u16::from_ne_bytes([b[4], b[5]]),
            transpose: b[6] as i8,
            gain: b[7] as i8,
            timestamp: u32::from_ne_bytes([b[8], b[9], b[10], b[11]]),
            pitch_cents: i32::from_ne_bytes([b[12], b[13], b[14], b[15]]),
        }
    }
}

/// A sized view onto external data.
///
/// Shares its 16 byte layout with `dyn<T>`: four unused bytes, the element
/// count, then the data address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Block {
    pub size: i32,
    pub data: u64,
}

impl Block {
    pub const SIZE: usize = 16;

    pub fn new(data: u64, size: i32) -> Self {
        Self { size, data }
    }

    pub fn to_bytes(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[4..8].copy_from_slice(&self.size.to_ne_bytes());
        out[8..16].copy_from_slice(&self.data.to_ne_bytes());
        out
    }

    pub fn from_bytes(b: &[u8; 16]) -> Self {
        let mut size = [0u8; 4];
        size.copy_from_slice(&b[4..8]);
        let mut data = [0u8; 8];
        data.copy_from_slice(&b[8..16]);
        Self {
            size: i32::from_ne_bytes(size),
            data: u64::from_ne_bytes(data),
        }
    }
}

// ============================================================================
// VariableStorage
// ============================================================================

/// A primitive value tagged with its [`TypeId`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum VariableStorage {
    #[default]
    Void,
    Integer(i32),
    Float(f32),
    Double(f64),
    Pointer(u64),
    Event(HiseEvent),
    Block(Block),
}

impl VariableStorage {
    pub fn type_id(&self) -> TypeId {
        match self {
            VariableStorage::Void => TypeId::Void,
            VariableStorage::Integer(_) => TypeId::Integer,
            VariableStorage::Float(_) => TypeId::Float,
            VariableStorage::Double(_) => TypeId::Double,
            VariableStorage::Pointer(_) => TypeId::Pointer,
            VariableStorage::Event(_) => TypeId::Event,
            VariableStorage::Block(_) => TypeId::Block,
        }
    }

    /// The zero value of a tag. `Void` and `Dynamic` both yield `Void`.
    pub fn zero(type_id: TypeId) -> Self {
        match type_id {
            TypeId::Void | TypeId::Dynamic => VariableStorage::Void,
            TypeId::Integer => VariableStorage::Integer(0),
            TypeId::Float => VariableStorage::Float(0.0),
            TypeId::Double => VariableStorage::Double(0.0),
            TypeId::Pointer => VariableStorage::Pointer(0),
            TypeId::Event => VariableStorage::Event(HiseEvent::default()),
            TypeId::Block => VariableStorage::Block(Block::default()),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, VariableStorage::Void)
    }

    pub fn to_int(&self) -> i32 {
        match *self {
            VariableStorage::Integer(v) => v,
            VariableStorage::Float(v) => v as i32,
            VariableStorage::Double(v) => v as i32,
            VariableStorage::Pointer(v) => v as i32,
            _ => 0,
        }
    }

    pub fn to_float(&self) -> f32 {
        match *self {
            VariableStorage::Integer(v) => v as f32,
            VariableStorage::Float(v) => v,
            VariableStorage::Double(v) => v as f32,
            _ => 0.0,
        }
    }

    pub fn to_double(&self) -> f64 {
        match *self {
            VariableStorage::Integer(v) => v as f64,
            VariableStorage::Float(v) => v as f64,
            VariableStorage::Double(v) => v,
            _ => 0.0,
        }
    }

    /// Convert to `target`. Only numeric conversions and identity succeed.
    pub fn convert_to(&self, target: TypeId) -> Option<VariableStorage> {
        let source = self.type_id();
        if source == target {
            return Some(*self);
        }
        if !source.converts_implicitly_to(target) {
            return None;
        }
        Some(match target {
            TypeId::Integer => VariableStorage::Integer(self.to_int()),
            TypeId::Float => VariableStorage::Float(self.to_float()),
            TypeId::Double => VariableStorage::Double(self.to_double()),
            _ => return None,
        })
    }

    /// Conversion applied to initial values of variables and members. On
    /// top of [`convert_to`](Self::convert_to), a zero literal initialises
    /// any sized type to its zero value.
    pub fn convert_for_initialiser(&self, target: TypeId) -> Option<VariableStorage> {
        self.convert_to(target).or_else(|| {
            (self.is_zero_literal() && target.size() > 0).then(|| VariableStorage::zero(target))
        })
    }

    fn is_zero_literal(&self) -> bool {
        match *self {
            VariableStorage::Void => true,
            VariableStorage::Integer(v) => v == 0,
            VariableStorage::Float(v) => v == 0.0,
            VariableStorage::Double(v) => v == 0.0,
            VariableStorage::Pointer(v) => v == 0,
            VariableStorage::Event(_) | VariableStorage::Block(_) => false,
        }
    }

    /// Store the value at `offset` using its native size.
    pub fn write_to(&self, data: &mut [u8], offset: usize) -> Result<(), LayoutError> {
        let size = self.type_id().size();
        let end = offset + size;
        if end > data.len() {
            return Err(LayoutError::BufferTooSmall {
                required: end,
                actual: data.len(),
            });
        }
        let target = &mut data[offset..end];
        match self {
            VariableStorage::Void => {}
            VariableStorage::Integer(v) => target.copy_from_slice(&v.to_ne_bytes()),
            VariableStorage::Float(v) => target.copy_from_slice(&v.to_ne_bytes()),
            VariableStorage::Double(v) => target.copy_from_slice(&v.to_ne_bytes()),
            VariableStorage::Pointer(v) => target.copy_from_slice(&v.to_ne_bytes()),
            VariableStorage::Event(e) => target.copy_from_slice(&e.to_bytes()),
            VariableStorage::Block(b) => target.copy_from_slice(&b.to_bytes()),
        }
        Ok(())
    }

    /// Load a value of `type_id` from `offset`.
    pub fn read_from(type_id: TypeId, data: &[u8], offset: usize) -> Result<Self, LayoutError> {
        let size = type_id.size();
        let end = offset + size;
        if end > data.len() {
            return Err(LayoutError::BufferTooSmall {
                required: end,
                actual: data.len(),
            });
        }
        let src = &data[offset..end];
        let mut b4 = [0u8; 4];
        let mut b8 = [0u8; 8];
        let mut b16 = [0u8; 16];
        Ok(match type_id {
            TypeId::Void | TypeId::Dynamic => VariableStorage::Void,
            TypeId::Integer => {
                b4.copy_from_slice(src);
                VariableStorage::Integer(i32::from_ne_bytes(b4))
            }
            TypeId::Float => {
                b4.copy_from_slice(src);
                VariableStorage::Float(f32::from_ne_bytes(b4))
            }
            TypeId::Double => {
                b8.copy_from_slice(src);
                VariableStorage::Double(f64::from_ne_bytes(b8))
            }
            TypeId::Pointer => {
                b8.copy_from_slice(src);
                VariableStorage::Pointer(u64::from_ne_bytes(b8))
            }
            TypeId::Event => {
                b16.copy_from_slice(src);
                VariableStorage::Event(HiseEvent::from_bytes(&b16))
            }
            TypeId::Block => {
                b16.copy_from_slice(src);
                VariableStorage::Block(Block::from_bytes(&b16))
            }
        })
    }
}

impl From<i32> for VariableStorage {
    fn from(v: i32) -> Self {
        VariableStorage::Integer(v)
    }
}

impl From<f32> for VariableStorage {
    fn from(v: f32) -> Self {
        VariableStorage::Float(v)
    }
}

impl From<f64> for VariableStorage {
    fn from(v: f64) -> Self {
        VariableStorage::Double(v)
    }
}

impl From<HiseEvent> for VariableStorage {
    fn from(v: HiseEvent) -> Self {
        VariableStorage::Event(v)
    }
}

impl From<Block> for VariableStorage {
    fn from(v: Block) -> Self {
        VariableStorage::Block(v)
    }
}

/// Literal form: `5`, `2.5f`, `0.25`, `void`, `event`, `block`, `0x...`.
impl fmt::Display for VariableStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableStorage::Void => f.write_str("void"),
            VariableStorage::Integer(v) => write!(f, "{v}"),
            VariableStorage::Float(v) => write!(f, "{v:?}f"),
            VariableStorage::Double(v) => write!(f, "{v:?}"),
            VariableStorage::Pointer(v) => write!(f, "{v:#x}"),
            VariableStorage::Event(_) => f.write_str("event"),
            VariableStorage::Block(b) => write!(f, "block[{}]", b.size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_sizes() {
        assert_eq!(TypeId::Integer.size(), 4);
        assert_eq!(TypeId::Float.size(), 4);
        assert_eq!(TypeId::Double.size(), 8);
        assert_eq!(TypeId::Pointer.size(), 8);
        assert_eq!(TypeId::Event.size(), 16);
        assert_eq!(TypeId::Block.size(), 16);
        assert_eq!(TypeId::Void.size(), 0);

        assert_eq!(TypeId::Event.alignment(), 4);
        assert_eq!(TypeId::Block.alignment(), 8);
    }

    #[test]
    fn implicit_conversions_are_numeric_only() {
        assert!(TypeId::Integer.converts_implicitly_to(TypeId::Float));
        assert!(TypeId::Double.converts_implicitly_to(TypeId::Integer));
        assert!(!TypeId::Integer.converts_implicitly_to(TypeId::Pointer));
        assert!(!TypeId::Event.converts_implicitly_to(TypeId::Block));
    }

    #[test]
    fn type_names_round_trip() {
        for t in TypeId::ALL {
            assert_eq!(TypeId::from_name(t.name()), Some(t));
        }
        assert_eq!(TypeId::from_name("string"), None);
    }

    #[test]
    fn storage_write_and_read() {
        let mut buf = [0u8; 24];
        VariableStorage::Integer(7).write_to(&mut buf, 0).unwrap();
        VariableStorage::Float(2.5).write_to(&mut buf, 4).unwrap();
        VariableStorage::Double(-1.25).write_to(&mut buf, 8).unwrap();

        assert_eq!(
            VariableStorage::read_from(TypeId::Integer, &buf, 0).unwrap(),
            VariableStorage::Integer(7)
        );
        assert_eq!(
            VariableStorage::read_from(TypeId::Float, &buf, 4).unwrap(),
            VariableStorage::Float(2.5)
        );
        assert_eq!(
            VariableStorage::read_from(TypeId::Double, &buf, 8).unwrap(),
            VariableStorage::Double(-1.25)
        );
    }

    #[test]
    fn storage_write_out_of_bounds() {
        let mut buf = [0u8; 6];
        let err = VariableStorage::Double(1.0).write_to(&mut buf, 0).unwrap_err();
        assert_eq!(
            err,
            LayoutError::BufferTooSmall {
                required: 8,
                actual: 6
            }
        );
    }

    #[test]
    fn block_layout_matches_dyn() {
        let block = Block::new(0xdead_beef, 128);
        let bytes = block.to_bytes();
        assert_eq!(&bytes[0..4], &[0, 0, 0, 0]);
        assert_eq!(Block::from_bytes(&bytes), block);
    }

    #[test]
    fn event_bytes() {
        let event = HiseEvent {
            kind: 1,
            channel: 2,
            number: 64,
            value: 127,
            event_id: 300,
            transpose: -12,
            gain: 3,
            timestamp: 4096,
            pitch_cents: -50,
        };
        assert_eq!(HiseEvent::from_bytes(&event.to_bytes()), event);
    }

    #[test]
    fn conversions() {
        assert_eq!(
            VariableStorage::Integer(3).convert_to(TypeId::Double),
            Some(VariableStorage::Double(3.0))
        );
        assert_eq!(
            VariableStorage::Float(2.75).convert_to(TypeId::Integer),
            Some(VariableStorage::Integer(2))
        );
        assert_eq!(VariableStorage::Integer(1).convert_to(TypeId::Event), None);
    }

    #[test]
    fn zero_literal_initialises_any_sized_type() {
        assert_eq!(
            VariableStorage::Integer(0).convert_for_initialiser(TypeId::Event),
            Some(VariableStorage::Event(HiseEvent::default()))
        );
        assert_eq!(
            VariableStorage::Float(0.0).convert_for_initialiser(TypeId::Block),
            Some(VariableStorage::Block(Block::default()))
        );
        assert_eq!(VariableStorage::Integer(1).convert_for_initialiser(TypeId::Event), None);
        assert_eq!(VariableStorage::Integer(0).convert_for_initialiser(TypeId::Void), None);
    }

    #[test]
    fn display_literals() {
        assert_eq!(VariableStorage::Integer(5).to_string(), "5");
        assert_eq!(VariableStorage::Float(2.5).to_string(), "2.5f");
        assert_eq!(VariableStorage::Double(1.0).to_string(), "1.0");
    }
}
