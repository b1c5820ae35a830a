use crate::{ClassFileError, Result};

/// The constant pool of a parsed class file.
///
/// The table is 1-based and may contain empty slots: slot 0 is always unused,
/// and every 8-byte constant (long, double) is followed by a slot that no
/// valid index may reference.
#[derive(Debug, Default)]
pub struct ConstantPool {
    slots: Vec<Option<Constant>>,
}

impl ConstantPool {
    pub(crate) fn new(slots: Vec<Option<Constant>>) -> Self {
        Self { slots }
    }

    /// The declared constant_pool_count, i.e. the number of slots including
    /// the unused slot 0.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.len() <= 1
    }

    /// Bounds-checked lookup.
    pub fn get(&self, index: u16) -> Result<&Constant> {
        match self.slots.get(index as usize) {
            None => Err(ClassFileError::IndexOutOfRange {
                index,
                size: self.slots.len(),
            }),
            Some(None) => Err(ClassFileError::NullSlot(index)),
            Some(Some(constant)) => Ok(constant),
        }
    }

    /// Bounds- and tag-checked lookup; fails loudly instead of returning a
    /// wrong-typed entry.
    pub fn get_typed(&self, index: u16, expected: ConstantTag) -> Result<&Constant> {
        let constant = self.get(index)?;
        if constant.tag() != expected {
            return Err(ClassFileError::TagMismatch {
                index,
                expected,
                found: constant.tag(),
            });
        }
        Ok(constant)
    }

    pub fn utf8(&self, index: u16) -> Result<&str> {
        match self.get_typed(index, ConstantTag::Utf8)? {
            Constant::Utf8(s) => Ok(s),
            _ => unreachable!(),
        }
    }

    /// Resolves a class or string constant to its text, bypassing the one
    /// level of indirection: both kinds carry an index to a Utf8 entry
    /// instead of their text.
    pub fn resolve_string(&self, index: u16) -> Result<&str> {
        let utf8_index = match self.get(index)? {
            Constant::Class { name_index } => *name_index,
            Constant::String { string_index } => *string_index,
            c => {
                return Err(ClassFileError::TagMismatch {
                    index,
                    expected: ConstantTag::Class,
                    found: c.tag(),
                })
            }
        };

        self.utf8(utf8_index)
    }
}

impl<'a> IntoIterator for &'a ConstantPool {
    type Item = &'a Option<Constant>;
    type IntoIter = std::slice::Iter<'a, Option<Constant>>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}

/// The tag byte identifying a constant pool record's shape.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ConstantTag {
    Utf8,
    Integer,
    Float,
    Long,
    Double,
    Class,
    String,
    FieldRef,
    MethodRef,
    InterfaceMethodRef,
    NameAndType,
    MethodHandle,
    MethodType,
    InvokeDynamic,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Constant {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class {
        name_index: u16,
    },
    String {
        string_index: u16,
    },
    FieldRef(RefInfo),
    MethodRef(RefInfo),
    InterfaceMethodRef(RefInfo),
    NameAndType {
        name_index: u16,
        descriptor_index: u16,
    },
    MethodHandle {
        reference_kind: u8,
        reference_index: u16,
    },
    MethodType {
        descriptor_index: u16,
    },
    InvokeDynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
}

impl Constant {
    pub fn tag(&self) -> ConstantTag {
        match self {
            Constant::Utf8(_) => ConstantTag::Utf8,
            Constant::Integer(_) => ConstantTag::Integer,
            Constant::Float(_) => ConstantTag::Float,
            Constant::Long(_) => ConstantTag::Long,
            Constant::Double(_) => ConstantTag::Double,
            Constant::Class { .. } => ConstantTag::Class,
            Constant::String { .. } => ConstantTag::String,
            Constant::FieldRef(_) => ConstantTag::FieldRef,
            Constant::MethodRef(_) => ConstantTag::MethodRef,
            Constant::InterfaceMethodRef(_) => ConstantTag::InterfaceMethodRef,
            Constant::NameAndType { .. } => ConstantTag::NameAndType,
            Constant::MethodHandle { .. } => ConstantTag::MethodHandle,
            Constant::MethodType { .. } => ConstantTag::MethodType,
            Constant::InvokeDynamic { .. } => ConstantTag::InvokeDynamic,
        }
    }

    /// Whether this constant occupies two consecutive pool slots.
    pub fn is_wide(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct RefInfo {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[cfg(test)]
mod constant_pool_tests {
    use super::*;

    fn pool() -> ConstantPool {
        ConstantPool::new(vec![
            None,
            Some(Constant::Utf8("my/MyClass".into())),
            Some(Constant::Class { name_index: 1 }),
            Some(Constant::Long(42)),
            None,
            Some(Constant::String { string_index: 1 }),
        ])
    }

    #[test]
    fn it_should_reject_slot_zero() {
        assert!(matches!(pool().get(0), Err(ClassFileError::NullSlot(0))));
    }

    #[test]
    fn it_should_reject_out_of_range_indices() {
        assert!(matches!(
            pool().get(6),
            Err(ClassFileError::IndexOutOfRange { index: 6, size: 6 })
        ));
    }

    #[test]
    fn it_should_reject_the_slot_after_a_long() {
        assert!(matches!(pool().get(4), Err(ClassFileError::NullSlot(4))));
    }

    #[test]
    fn it_should_report_a_tag_mismatch() {
        assert!(matches!(
            pool().get_typed(3, ConstantTag::Utf8),
            Err(ClassFileError::TagMismatch {
                index: 3,
                expected: ConstantTag::Utf8,
                found: ConstantTag::Long,
            })
        ));
    }

    #[test]
    fn it_should_resolve_a_class_constant_through_one_hop() {
        assert_eq!("my/MyClass", pool().resolve_string(2).unwrap());
        assert_eq!(pool().utf8(1).unwrap(), pool().resolve_string(2).unwrap());
    }

    #[test]
    fn it_should_resolve_a_string_constant_through_one_hop() {
        assert_eq!("my/MyClass", pool().resolve_string(5).unwrap());
    }

    #[test]
    fn it_should_not_resolve_a_non_indirect_constant_as_a_string() {
        assert!(matches!(
            pool().resolve_string(3),
            Err(ClassFileError::TagMismatch { index: 3, .. })
        ));
    }
}
