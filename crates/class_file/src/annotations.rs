use crate::{constant_pool::Constant, ConstantPool, ConstantTag, Result};

/// One decoded annotation: its type descriptor plus its member values, in
/// the order they were encoded.
#[derive(Debug, PartialEq, Clone)]
pub struct Annotation {
    pub type_descriptor: String,
    pub elements: Vec<ElementValuePair>,
}

impl Annotation {
    pub fn element(&self, name: &str) -> Option<&ElementValue> {
        self.elements
            .iter()
            .find(|pair| pair.name == name)
            .map(|pair| &pair.value)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct ElementValuePair {
    pub name: String,
    pub value: ElementValue,
}

/// One annotation member's value.
///
/// Primitive and string kinds keep their constant pool index; the constant
/// was tag-checked when the value was decoded. A class literal is stored as
/// its resolved descriptor text, since the pool entry it points at carries
/// nothing else.
#[derive(Debug, PartialEq, Clone)]
pub enum ElementValue {
    Byte(u16),
    Char(u16),
    Double(u16),
    Float(u16),
    Int(u16),
    Long(u16),
    Short(u16),
    Boolean(u16),
    String(u16),
    Enum {
        type_name_index: u16,
        const_name_index: u16,
    },
    ClassDescriptor(String),
    Annotation(Box<Annotation>),
    Array(Vec<ElementValue>),
}

impl ElementValue {
    /// Renders the value as text, resolving constant pool indices on the way.
    pub fn stringify(&self, constant_pool: &ConstantPool) -> Result<String> {
        match self {
            ElementValue::Byte(index)
            | ElementValue::Char(index)
            | ElementValue::Int(index)
            | ElementValue::Short(index) => {
                match constant_pool.get_typed(*index, ConstantTag::Integer)? {
                    Constant::Integer(v) => Ok(v.to_string()),
                    _ => unreachable!(),
                }
            }
            ElementValue::Boolean(index) => {
                match constant_pool.get_typed(*index, ConstantTag::Integer)? {
                    Constant::Integer(v) => Ok((*v != 0).to_string()),
                    _ => unreachable!(),
                }
            }
            ElementValue::Long(index) => {
                match constant_pool.get_typed(*index, ConstantTag::Long)? {
                    Constant::Long(v) => Ok(v.to_string()),
                    _ => unreachable!(),
                }
            }
            ElementValue::Float(index) => {
                match constant_pool.get_typed(*index, ConstantTag::Float)? {
                    Constant::Float(v) => Ok(v.to_string()),
                    _ => unreachable!(),
                }
            }
            ElementValue::Double(index) => {
                match constant_pool.get_typed(*index, ConstantTag::Double)? {
                    Constant::Double(v) => Ok(v.to_string()),
                    _ => unreachable!(),
                }
            }
            ElementValue::String(index) => Ok(constant_pool.utf8(*index)?.to_owned()),
            ElementValue::Enum {
                type_name_index,
                const_name_index,
            } => Ok(format!(
                "{}.{}",
                constant_pool.utf8(*type_name_index)?,
                constant_pool.utf8(*const_name_index)?
            )),
            ElementValue::ClassDescriptor(descriptor) => Ok(descriptor.clone()),
            ElementValue::Annotation(annotation) => Ok(annotation.type_descriptor.clone()),
            ElementValue::Array(values) => {
                let rendered = values
                    .iter()
                    .map(|v| v.stringify(constant_pool))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("[{}]", rendered.join(", ")))
            }
        }
    }
}

// Element value discriminator bytes.
pub(crate) const TAG_BYTE: u8 = b'B';
pub(crate) const TAG_CHAR: u8 = b'C';
pub(crate) const TAG_DOUBLE: u8 = b'D';
pub(crate) const TAG_FLOAT: u8 = b'F';
pub(crate) const TAG_INT: u8 = b'I';
pub(crate) const TAG_LONG: u8 = b'J';
pub(crate) const TAG_SHORT: u8 = b'S';
pub(crate) const TAG_BOOLEAN: u8 = b'Z';
pub(crate) const TAG_STRING: u8 = b's';
pub(crate) const TAG_ENUM: u8 = b'e';
pub(crate) const TAG_CLASS: u8 = b'c';
pub(crate) const TAG_ANNOTATION: u8 = b'@';
pub(crate) const TAG_ARRAY: u8 = b'[';

#[cfg(test)]
mod stringify_tests {
    use super::*;
    use crate::ClassFileError;

    fn pool() -> ConstantPool {
        ConstantPool::new(vec![
            None,
            Some(Constant::Integer(17)),
            Some(Constant::Utf8("hello".into())),
            Some(Constant::Utf8("Lmy/Color;".into())),
            Some(Constant::Utf8("RED".into())),
        ])
    }

    #[test]
    fn it_should_render_a_primitive_via_the_pool() {
        assert_eq!("17", ElementValue::Int(1).stringify(&pool()).unwrap());
    }

    #[test]
    fn it_should_render_a_boolean_from_an_integer_constant() {
        assert_eq!("true", ElementValue::Boolean(1).stringify(&pool()).unwrap());
    }

    #[test]
    fn it_should_render_an_enum_constant() {
        let value = ElementValue::Enum {
            type_name_index: 3,
            const_name_index: 4,
        };
        assert_eq!("Lmy/Color;.RED", value.stringify(&pool()).unwrap());
    }

    #[test]
    fn it_should_render_an_array_in_order() {
        let value = ElementValue::Array(vec![
            ElementValue::Int(1),
            ElementValue::String(2),
            ElementValue::Int(1),
        ]);
        assert_eq!("[17, hello, 17]", value.stringify(&pool()).unwrap());
    }

    #[test]
    fn it_should_fail_on_a_mismatched_constant() {
        assert!(matches!(
            ElementValue::Int(2).stringify(&pool()),
            Err(ClassFileError::TagMismatch { index: 2, .. })
        ));
    }
}
