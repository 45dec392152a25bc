//! User declared structs and externally laid out objects.

use std::fmt::Write as _;
use std::sync::{OnceLock, PoisonError, RwLock};

use super::{ComplexVisitor, dump_primitive, write_native_member};
use crate::{
    FunctionClass, FunctionData, Identifier, InitialiserList, LayoutError, NamespacedIdentifier,
    TypeInfo, Visibility,
};

/// One data member of a [`StructType`].
#[derive(Debug, Clone)]
pub struct Member {
    pub id: Identifier,
    pub type_info: TypeInfo,
    /// Declared default, used when the struct is default constructed.
    pub default_list: Option<InitialiserList>,
    pub visibility: Visibility,
    pub comment: String,
}

impl Member {
    pub fn new(id: impl Into<Identifier>, type_info: TypeInfo) -> Self {
        Self {
            id: id.into(),
            type_info,
            default_list: None,
            visibility: Visibility::Public,
            comment: String::new(),
        }
    }
}

/// Position of a member after finalisation.
///
/// `padding` is the gap inserted before the member, `offset` is where the
/// member's data starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemberLayout {
    pub offset: usize,
    pub padding: usize,
}

/// Template argument a struct was instantiated with. Only used for naming.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateArgument {
    Type(TypeInfo),
    Constant(i32),
}

impl std::fmt::Display for TemplateArgument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateArgument::Type(t) => write!(f, "{t}"),
            TemplateArgument::Constant(c) => write!(f, "{c}"),
        }
    }
}

#[derive(Debug, Clone)]
struct StructLayout {
    members: Vec<MemberLayout>,
    size: usize,
    alignment: usize,
}

/// A struct laid out member by member in declaration order.
#[derive(Debug)]
pub struct StructType {
    id: NamespacedIdentifier,
    template_arguments: Vec<TemplateArgument>,
    members: Vec<Member>,
    /// Size and alignment of an opaque, externally laid out object.
    external: Option<(usize, usize)>,
    member_functions: RwLock<FunctionClass>,
    layout: OnceLock<StructLayout>,
}

impl StructType {
    pub fn new(id: NamespacedIdentifier) -> Self {
        let member_functions = RwLock::new(FunctionClass::new(id.clone()));
        Self {
            id,
            template_arguments: Vec::new(),
            members: Vec::new(),
            external: None,
            member_functions,
            layout: OnceLock::new(),
        }
    }

    /// An object whose layout is owned by the host. It has no visible members
    /// and is zero initialised.
    pub fn opaque(id: NamespacedIdentifier, size: usize, alignment: usize) -> Self {
        let mut s = Self::new(id);
        s.external = Some((size, alignment.max(1)));
        s
    }

    pub fn with_member(mut self, id: impl Into<Identifier>, type_info: TypeInfo) -> Self {
        self.add_member(Member::new(id, type_info));
        self
    }

    pub fn with_template_argument(mut self, arg: TemplateArgument) -> Self {
        self.template_arguments.push(arg);
        self
    }

    /// Append a member. Returns `false` if a member of that name exists.
    pub fn add_member(&mut self, member: Member) -> bool {
        if self.has_member(&member.id) {
            return false;
        }
        self.members.push(member);
        true
    }

    pub fn set_default_value(&mut self, id: &Identifier, list: InitialiserList) -> bool {
        match self.members.iter_mut().find(|m| &m.id == id) {
            Some(m) => {
                m.default_list = Some(list);
                true
            }
            None => false,
        }
    }

    pub fn set_visibility(&mut self, id: &Identifier, visibility: Visibility) -> bool {
        match self.members.iter_mut().find(|m| &m.id == id) {
            Some(m) => {
                m.visibility = visibility;
                true
            }
            None => false,
        }
    }

    pub fn id(&self) -> &NamespacedIdentifier {
        &self.id
    }

    pub fn template_arguments(&self) -> &[TemplateArgument] {
        &self.template_arguments
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, id: &Identifier) -> Option<&Member> {
        self.members.iter().find(|m| &m.id == id)
    }

    pub fn has_member(&self, id: &Identifier) -> bool {
        self.member(id).is_some()
    }

    pub fn member_type_info(&self, id: &Identifier) -> Option<&TypeInfo> {
        self.member(id).map(|m| &m.type_info)
    }

    pub fn is_opaque(&self) -> bool {
        self.external.is_some()
    }

    /// Data offset of a member. Uses the finalised layout when present.
    pub fn member_offset(&self, id: &Identifier) -> Option<usize> {
        let index = self.members.iter().position(|m| &m.id == id)?;
        self.with_layout(|l| l.members.get(index).map(|ml| ml.offset))
            .flatten()
    }

    /// Offsets and padding of every member in declaration order.
    pub fn member_layouts(&self) -> Vec<MemberLayout> {
        self.with_layout(|l| l.members.clone()).unwrap_or_default()
    }

    /// Register a member function. Unqualified ids are placed below the
    /// struct's id.
    pub fn add_member_function(&self, function: FunctionData) {
        self.member_functions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add_function(function);
    }

    /// Snapshot of the member functions.
    pub fn member_functions(&self) -> FunctionClass {
        self.member_functions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run `f` against the live member function class.
    pub fn with_member_functions_mut<R>(&self, f: impl FnOnce(&mut FunctionClass) -> R) -> R {
        let mut guard = self
            .member_functions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn required_byte_size(&self) -> usize {
        self.with_layout(|l| l.size).unwrap_or(0)
    }

    pub fn required_alignment(&self) -> usize {
        self.with_layout(|l| l.alignment).unwrap_or(1)
    }

    pub fn is_finalised(&self) -> bool {
        self.layout.get().is_some()
    }

    fn with_layout<R>(&self, f: impl FnOnce(&StructLayout) -> R) -> Option<R> {
        match self.layout.get() {
            Some(l) => Some(f(l)),
            None => self.compute_layout().ok().map(|l| f(&l)),
        }
    }

    fn compute_layout(&self) -> Result<StructLayout, LayoutError> {
        if let Some((size, alignment)) = self.external {
            return Ok(StructLayout {
                members: Vec::new(),
                size,
                alignment,
            });
        }

        let overflow = || LayoutError::SizeOverflow {
            type_name: self.to_string_internal(),
        };
        let mut offset: usize = 0;
        let mut alignment = 1;
        let mut members = Vec::with_capacity(self.members.len());

        for m in &self.members {
            let member_alignment = m.type_info.required_alignment();
            if member_alignment == 0 {
                return Err(LayoutError::UnsizedMember {
                    type_name: self.to_string_internal(),
                    name: m.id.to_string(),
                });
            }
            let padding = (member_alignment - offset % member_alignment) % member_alignment;
            offset = offset.checked_add(padding).ok_or_else(overflow)?;
            members.push(MemberLayout { offset, padding });
            offset = offset
                .checked_add(m.type_info.required_byte_size())
                .filter(|end| *end <= isize::MAX as usize)
                .ok_or_else(overflow)?;
            alignment = alignment.max(member_alignment);
        }

        Ok(StructLayout {
            members,
            size: offset,
            alignment,
        })
    }

    pub(super) fn finalise_alignment(&self) -> Result<(), LayoutError> {
        if self.is_finalised() {
            return Ok(());
        }

        for m in &self.members {
            if let Some(c) = m.type_info.get_complex_type() {
                c.finalise_alignment()?;
            }
        }

        let layout = self.compute_layout()?;

        let mut covered: usize = 0;
        for (m, ml) in self.members.iter().zip(&layout.members) {
            let member_alignment = m.type_info.required_alignment();
            if ml.offset % member_alignment != 0 {
                return Err(LayoutError::AlignmentViolation {
                    type_name: self.to_string_internal(),
                    member: m.id.to_string(),
                    offset: ml.offset,
                    alignment: member_alignment,
                });
            }
            covered = covered.saturating_add(ml.padding + m.type_info.required_byte_size());
        }
        if self.external.is_none() && covered != layout.size {
            return Err(LayoutError::SizeMismatch {
                type_name: self.to_string_internal(),
                computed: covered,
                expected: layout.size,
            });
        }

        tracing::debug!(
            target: "snex::layout",
            name = %self.id,
            size = layout.size,
            alignment = layout.alignment,
            "finalised struct"
        );
        let _ = self.layout.set(layout);
        Ok(())
    }

    pub(super) fn make_default_initialiser_list(&self) -> InitialiserList {
        let mut list = InitialiserList::new();
        for m in &self.members {
            let member_list = m
                .default_list
                .clone()
                .unwrap_or_else(|| m.type_info.make_default_initialiser_list());

            if m.type_info.is_complex_type() || !member_list.is_single_value() {
                list.add_child_list(member_list);
            } else if let Ok(v) = member_list.get_value(0) {
                list.add_value(v);
            }
        }
        list
    }

    pub(super) fn initialise(&self, data: &mut [u8], list: &InitialiserList) -> Result<(), LayoutError> {
        let Some(layout) = self.layout.get() else {
            return Err(LayoutError::NotFinalised {
                type_name: self.to_string_internal(),
            });
        };

        if self.external.is_some() {
            if !list.is_empty() {
                return Err(LayoutError::InitialiserSize {
                    type_name: self.to_string_internal(),
                    expected: 0,
                    actual: list.size(),
                });
            }
            data[..layout.size].fill(0);
            return Ok(());
        }

        if list.is_empty() && !self.members.is_empty() {
            return self.initialise(data, &self.make_default_initialiser_list());
        }

        if list.size() != self.members.len() {
            return Err(LayoutError::InitialiserSize {
                type_name: self.to_string_internal(),
                expected: self.members.len(),
                actual: list.size(),
            });
        }

        let type_name = self.to_string_internal();
        for (index, (m, ml)) in self.members.iter().zip(&layout.members).enumerate() {
            match m.type_info.get_complex_type() {
                Some(c) => {
                    let child = list.child_list(index)?;
                    let end = ml.offset + c.required_byte_size();
                    c.initialise(&mut data[ml.offset..end], &child)?;
                }
                None => {
                    let value = list.get_value(index).map_err(|_| LayoutError::TypeMismatch {
                        type_name: type_name.clone(),
                        index,
                        expected: m.type_info.to_string(),
                        actual: "initialiser list".to_string(),
                    })?;
                    write_native_member(m.type_info.get_type(), value, data, ml.offset, &type_name, index)?;
                }
            }
        }
        Ok(())
    }

    pub(super) fn for_each_member(&self, data: &mut [u8], visitor: &mut ComplexVisitor<'_>) -> bool {
        let layouts = self.member_layouts();
        for (m, ml) in self.members.iter().zip(layouts) {
            if let Some(c) = m.type_info.get_complex_type() {
                let end = (ml.offset + c.required_byte_size()).min(data.len());
                if ml.offset > end {
                    continue;
                }
                if c.for_each(&mut data[ml.offset..end], visitor) {
                    return true;
                }
            }
        }
        false
    }

    pub(super) fn dump_into(&self, data: &[u8], indent: usize, out: &mut String) {
        if self.is_opaque() {
            let _ = writeln!(out, "{}<{} bytes>", "  ".repeat(indent), self.required_byte_size());
            return;
        }
        for (m, ml) in self.members.iter().zip(self.member_layouts()) {
            match m.type_info.get_complex_type() {
                Some(c) => {
                    let _ = writeln!(out, "{}{}:", "  ".repeat(indent), m.id);
                    let end = (ml.offset + c.required_byte_size()).min(data.len());
                    let start = ml.offset.min(end);
                    c.dump_into(&data[start..end], indent + 1, out);
                }
                None => dump_primitive(m.type_info.get_type(), data, ml.offset, m.id.as_str(), indent, out),
            }
        }
    }

    pub(super) fn to_string_internal(&self) -> String {
        if self.template_arguments.is_empty() {
            return self.id.to_string();
        }
        let args: Vec<String> = self.template_arguments.iter().map(|a| a.to_string()).collect();
        format!("{}<{}>", self.id, args.join(", "))
    }
}
