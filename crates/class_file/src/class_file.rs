use std::io::Read;

use crate::{
    annotations::Annotation, attributes::Attributes, AccessFlags, ConstantPool, Parser, Result,
};

/// The immutable result of a successful parse.
///
/// Field and method records were walked for cursor alignment only and are
/// not represented here.
#[derive(Debug)]
pub struct ClassFile {
    pub access_flags: AccessFlags,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub constant_pool: ConstantPool,
    pub attributes: Attributes,
}

impl ClassFile {
    pub fn parse(bytes: impl Read) -> Result<ClassFile> {
        Parser::new(bytes).parse()
    }

    pub fn class_name(&self) -> Result<&str> {
        self.constant_pool.resolve_string(self.this_class)
    }

    pub fn super_class_name(&self) -> Result<Option<&str>> {
        // A super_class of zero means this class is java/lang/Object, the
        // only class without a direct superclass.
        if self.super_class == 0 {
            return Ok(None);
        }

        Ok(Some(self.constant_pool.resolve_string(self.super_class)?))
    }

    /// Every annotation declared on the class itself, in encounter order.
    pub fn annotation_entries(&self) -> impl Iterator<Item = &Annotation> {
        self.attributes.annotation_entries()
    }
}
