use std::io::{self, BufReader, Read};

use byteorder::{BigEndian, ReadBytesExt};
use log::{debug, trace};

use crate::{
    annotations::{self, Annotation, ElementValue, ElementValuePair},
    attributes::{
        Attribute, Attributes, RUNTIME_VISIBLE_ANNOTATIONS,
        RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS,
    },
    constant_pool::{Constant, ConstantPool, ConstantTag, RefInfo},
    AccessFlags, ClassFile, ClassFileError, Result,
};

type Endian = BigEndian;

/// Default bound on annotation/array nesting. The format cannot encode
/// cycles, but an adversarial file can still nest deep enough to exhaust the
/// stack without a bound.
pub const DEFAULT_MAX_NESTING: usize = 64;

pub struct Parser<R> {
    r: BufReader<R>,
    max_nesting: usize,
}

impl<R: Read> Parser<R> {
    pub fn new(r: R) -> Self {
        Self::with_max_nesting(r, DEFAULT_MAX_NESTING)
    }

    pub fn with_max_nesting(r: R, max_nesting: usize) -> Self {
        Self {
            r: BufReader::new(r),
            max_nesting,
        }
    }

    /// Walks the file in its mandated order. Any error aborts the parse and
    /// discards everything accumulated so far.
    pub fn parse(&mut self) -> Result<ClassFile> {
        self.parse_magic_identifier()?;
        // Minor and major version; version-specific behavior is out of scope.
        self.skip(4)?;

        let constant_pool = self.parse_constant_pool()?;
        let access_flags = self.parse_access_flags()?;
        let this_class = self.read_u16()?;
        let super_class = self.read_u16()?;

        let interfaces_count = self.read_u16()?;
        let mut interfaces = vec![0u16; interfaces_count as usize];
        self.r.read_u16_into::<Endian>(&mut interfaces)?;

        let fields_count = self.read_u16()?;
        for _ in 0..fields_count {
            self.skip_field_or_method()?;
        }

        let methods_count = self.read_u16()?;
        for _ in 0..methods_count {
            self.skip_field_or_method()?;
        }

        let attributes_count = self.read_u16()?;
        let attributes = self.parse_attributes(attributes_count, &constant_pool)?;

        Ok(ClassFile {
            access_flags,
            this_class,
            super_class,
            interfaces,
            constant_pool,
            attributes,
        })
    }

    fn parse_magic_identifier(&mut self) -> Result<()> {
        match self.read_u32()? {
            0xCAFEBABE => Ok(()),
            magic_identifier => Err(ClassFileError::InvalidMagicIdentifier(magic_identifier)),
        }
    }

    fn parse_access_flags(&mut self) -> Result<AccessFlags> {
        let mut flags = AccessFlags::from_bits_truncate(self.read_u16()?);

        // Interfaces are implicitly abstract; the flag is set according to
        // the JVM specification.
        if flags.contains(AccessFlags::INTERFACE) {
            flags.insert(AccessFlags::ABSTRACT);
        }
        if flags.contains(AccessFlags::FINAL | AccessFlags::ABSTRACT) {
            return Err(ClassFileError::FinalAndAbstract);
        }

        Ok(flags)
    }

    fn parse_constant_pool(&mut self) -> Result<ConstantPool> {
        let constant_pool_count = self.read_u16()? as usize;
        trace!("constant pool declares {} slots", constant_pool_count);

        let mut slots = Vec::with_capacity(constant_pool_count);
        if constant_pool_count > 0 {
            // Slot 0 is unused.
            slots.push(None);
        }
        while slots.len() < constant_pool_count {
            let constant = self.parse_constant()?;
            let wide = constant.is_wide();
            slots.push(Some(constant));
            // An 8-byte constant takes up two slots; the one after it must
            // never be referenced.
            if wide && slots.len() < constant_pool_count {
                slots.push(None);
            }
        }

        Ok(ConstantPool::new(slots))
    }

    fn parse_constant(&mut self) -> Result<Constant> {
        let tag = self.read_u8()?;
        match tag {
            1 => self.parse_utf8(),
            3 => Ok(Constant::Integer(self.read_i32()?)),
            4 => Ok(Constant::Float(self.read_f32()?)),
            5 => Ok(Constant::Long(self.read_i64()?)),
            6 => Ok(Constant::Double(self.read_f64()?)),
            7 => Ok(Constant::Class {
                name_index: self.read_u16()?,
            }),
            8 => Ok(Constant::String {
                string_index: self.read_u16()?,
            }),
            9 => Ok(Constant::FieldRef(self.parse_ref_info()?)),
            10 => Ok(Constant::MethodRef(self.parse_ref_info()?)),
            11 => Ok(Constant::InterfaceMethodRef(self.parse_ref_info()?)),
            12 => Ok(Constant::NameAndType {
                name_index: self.read_u16()?,
                descriptor_index: self.read_u16()?,
            }),
            15 => Ok(Constant::MethodHandle {
                reference_kind: self.read_u8()?,
                reference_index: self.read_u16()?,
            }),
            16 => Ok(Constant::MethodType {
                descriptor_index: self.read_u16()?,
            }),
            18 => Ok(Constant::InvokeDynamic {
                bootstrap_method_attr_index: self.read_u16()?,
                name_and_type_index: self.read_u16()?,
            }),
            _ => Err(ClassFileError::InvalidConstantTag(tag)),
        }
    }

    fn parse_utf8(&mut self) -> Result<Constant> {
        let length = self.read_u16()?;
        let mut bytes = vec![0u8; length as usize];
        self.r.read_exact(&mut bytes)?;

        Ok(Constant::Utf8(String::from_utf8_lossy(&bytes).into()))
    }

    fn parse_ref_info(&mut self) -> Result<RefInfo> {
        let class_index = self.read_u16()?;
        let name_and_type_index = self.read_u16()?;

        Ok(RefInfo {
            class_index,
            name_and_type_index,
        })
    }

    /// Walks a field_info or method_info record without modeling it: the
    /// fixed header, then every attribute's payload, advanced over by its
    /// declared length.
    fn skip_field_or_method(&mut self) -> Result<()> {
        // access_flags, name_index, descriptor_index
        self.skip(6)?;
        let attributes_count = self.read_u16()?;
        for _ in 0..attributes_count {
            self.skip(2)?; // attribute_name_index
            let length = self.read_u32()?;
            self.skip(length as u64)?;
        }
        Ok(())
    }

    fn parse_attributes(
        &mut self,
        attributes_count: u16,
        constant_pool: &ConstantPool,
    ) -> Result<Attributes> {
        (0..attributes_count)
            .map(|_| self.parse_attribute(constant_pool))
            .collect::<Result<Vec<_>>>()
            .map(Attributes)
    }

    /// Reads one attribute record. Known, annotation-bearing names are fully
    /// decoded; every other name has its payload skipped byte-for-byte.
    /// Either way exactly 6 + length bytes are consumed.
    fn parse_attribute(&mut self, constant_pool: &ConstantPool) -> Result<Attribute> {
        let name_index = self.read_u16()?;
        let name = constant_pool
            .utf8(name_index)
            .map_err(|_| ClassFileError::UnresolvedAttributeName(name_index))?;
        let length = self.read_u32()?;

        match name {
            RUNTIME_VISIBLE_ANNOTATIONS => Ok(Attribute::RuntimeVisibleAnnotations(
                self.parse_annotations(constant_pool)?,
            )),
            RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS => {
                let num_parameters = self.read_u8()?;
                let parameters = (0..num_parameters)
                    .map(|_| self.parse_annotations(constant_pool))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Attribute::RuntimeVisibleParameterAnnotations(parameters))
            }
            _ => {
                debug!("skipping attribute {} ({} bytes)", name, length);
                self.skip(length as u64)?;
                Ok(Attribute::Unknown { length })
            }
        }
    }

    fn parse_annotations(&mut self, constant_pool: &ConstantPool) -> Result<Vec<Annotation>> {
        let num_annotations = self.read_u16()?;
        (0..num_annotations)
            .map(|_| self.parse_annotation(constant_pool, 0))
            .collect()
    }

    fn parse_annotation(
        &mut self,
        constant_pool: &ConstantPool,
        depth: usize,
    ) -> Result<Annotation> {
        let type_index = self.read_u16()?;
        let type_descriptor = constant_pool.utf8(type_index)?.to_owned();

        let num_element_value_pairs = self.read_u16()?;
        let elements = (0..num_element_value_pairs)
            .map(|_| {
                let name_index = self.read_u16()?;
                let name = constant_pool.utf8(name_index)?.to_owned();
                let value = self.parse_element_value(constant_pool, depth)?;
                Ok(ElementValuePair { name, value })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Annotation {
            type_descriptor,
            elements,
        })
    }

    fn parse_element_value(
        &mut self,
        constant_pool: &ConstantPool,
        depth: usize,
    ) -> Result<ElementValue> {
        if depth >= self.max_nesting {
            return Err(ClassFileError::ExcessiveNesting(self.max_nesting));
        }

        let tag = self.read_u8()?;
        match tag {
            annotations::TAG_BYTE => Ok(ElementValue::Byte(
                self.checked_index(constant_pool, ConstantTag::Integer)?,
            )),
            annotations::TAG_CHAR => Ok(ElementValue::Char(
                self.checked_index(constant_pool, ConstantTag::Integer)?,
            )),
            annotations::TAG_INT => Ok(ElementValue::Int(
                self.checked_index(constant_pool, ConstantTag::Integer)?,
            )),
            annotations::TAG_SHORT => Ok(ElementValue::Short(
                self.checked_index(constant_pool, ConstantTag::Integer)?,
            )),
            annotations::TAG_BOOLEAN => Ok(ElementValue::Boolean(
                self.checked_index(constant_pool, ConstantTag::Integer)?,
            )),
            annotations::TAG_LONG => Ok(ElementValue::Long(
                self.checked_index(constant_pool, ConstantTag::Long)?,
            )),
            annotations::TAG_FLOAT => Ok(ElementValue::Float(
                self.checked_index(constant_pool, ConstantTag::Float)?,
            )),
            annotations::TAG_DOUBLE => Ok(ElementValue::Double(
                self.checked_index(constant_pool, ConstantTag::Double)?,
            )),
            annotations::TAG_STRING => Ok(ElementValue::String(
                self.checked_index(constant_pool, ConstantTag::Utf8)?,
            )),
            annotations::TAG_ENUM => {
                let type_name_index = self.checked_index(constant_pool, ConstantTag::Utf8)?;
                let const_name_index = self.checked_index(constant_pool, ConstantTag::Utf8)?;
                Ok(ElementValue::Enum {
                    type_name_index,
                    const_name_index,
                })
            }
            annotations::TAG_CLASS => {
                // A class literal's index leads straight to the Utf8 entry
                // holding its descriptor.
                let index = self.read_u16()?;
                Ok(ElementValue::ClassDescriptor(
                    constant_pool.utf8(index)?.to_owned(),
                ))
            }
            annotations::TAG_ANNOTATION => Ok(ElementValue::Annotation(Box::new(
                self.parse_annotation(constant_pool, depth + 1)?,
            ))),
            annotations::TAG_ARRAY => {
                let num_values = self.read_u16()?;
                let values = (0..num_values)
                    .map(|_| self.parse_element_value(constant_pool, depth + 1))
                    .collect::<Result<Vec<_>>>()?;
                Ok(ElementValue::Array(values))
            }
            _ => Err(ClassFileError::InvalidElementValueTag(tag)),
        }
    }

    /// Reads a constant pool index and confirms the slot it references has
    /// the tag the element value's discriminator implies.
    fn checked_index(
        &mut self,
        constant_pool: &ConstantPool,
        expected: ConstantTag,
    ) -> Result<u16> {
        let index = self.read_u16()?;
        constant_pool.get_typed(index, expected)?;
        Ok(index)
    }

    fn skip(&mut self, n: u64) -> Result<()> {
        let skipped = io::copy(&mut self.r.by_ref().take(n), &mut io::sink())?;
        if skipped < n {
            return Err(ClassFileError::Truncated);
        }
        Ok(())
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(self.r.read_u32::<Endian>()?)
    }

    fn read_u16(&mut self) -> Result<u16> {
        Ok(self.r.read_u16::<Endian>()?)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.r.read_u8()?)
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(self.r.read_i32::<Endian>()?)
    }

    fn read_i64(&mut self) -> Result<i64> {
        Ok(self.r.read_i64::<Endian>()?)
    }

    fn read_f32(&mut self) -> Result<f32> {
        Ok(self.r.read_f32::<Endian>()?)
    }

    fn read_f64(&mut self) -> Result<f64> {
        Ok(self.r.read_f64::<Endian>()?)
    }
}

#[cfg(test)]
mod parse_magic_identifier_tests {
    use super::*;

    #[test]
    fn it_should_be_able_to_parse_the_correct_identifier() {
        assert!(Parser::new(&[0xca, 0xfe, 0xba, 0xbe][..])
            .parse_magic_identifier()
            .is_ok());
    }

    #[test]
    fn it_should_fail_if_there_is_not_enough_data() {
        assert!(matches!(
            Parser::new(&[0xca, 0xfe, 0xba][..]).parse_magic_identifier(),
            Err(ClassFileError::Truncated)
        ));
    }

    #[test]
    fn it_should_fail_if_the_magic_identifier_is_incorrect() {
        assert!(matches!(
            Parser::new(&[0xca, 0xfe, 0xba, 0xbf][..]).parse_magic_identifier(),
            Err(ClassFileError::InvalidMagicIdentifier(0xCAFEBABF))
        ));
    }
}

#[cfg(test)]
mod parse_constant_pool_tests {
    use super::*;

    #[test]
    fn it_should_leave_slot_zero_empty() {
        // count = 2, one Integer entry
        let pool = Parser::new(&[0x00, 0x02, 0x03, 0x00, 0x00, 0x00, 0x2a][..])
            .parse_constant_pool()
            .unwrap();
        assert_eq!(2, pool.len());
        assert!(matches!(pool.get(0), Err(ClassFileError::NullSlot(0))));
        assert_eq!(&Constant::Integer(42), pool.get(1).unwrap());
    }

    #[test]
    fn it_should_give_a_long_two_slots() {
        // count = 3, one Long entry
        let bytes = [
            0x00, 0x03, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2a,
        ];
        let pool = Parser::new(&bytes[..]).parse_constant_pool().unwrap();
        assert_eq!(3, pool.len());
        assert_eq!(&Constant::Long(42), pool.get(1).unwrap());
        assert!(matches!(pool.get(2), Err(ClassFileError::NullSlot(2))));
    }

    #[test]
    fn it_should_reject_an_unknown_tag() {
        assert!(matches!(
            Parser::new(&[0x00, 0x02, 0x63][..]).parse_constant_pool(),
            Err(ClassFileError::InvalidConstantTag(0x63))
        ));
    }
}

#[cfg(test)]
mod skip_tests {
    use super::*;

    #[test]
    fn it_should_advance_past_exactly_n_bytes() {
        let mut parser = Parser::new(&[0x00, 0x01, 0x02, 0x03, 0xca][..]);
        parser.skip(4).unwrap();
        assert_eq!(0xca, parser.read_u8().unwrap());
    }

    #[test]
    fn it_should_fail_on_a_short_source() {
        assert!(matches!(
            Parser::new(&[0x00, 0x01][..]).skip(3),
            Err(ClassFileError::Truncated)
        ));
    }
}
