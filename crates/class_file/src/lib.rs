// https://docs.oracle.com/javase/specs/jvms/se6/html/ClassFile.doc.html
//
// Decodes just enough of the class file format to recover the constant pool,
// the class-level attributes, and the annotations they carry. Method bodies,
// code attributes and field/method records are walked but never modeled.

mod access_flags;
pub mod annotations;
pub mod attributes;
mod class_file;
mod constant_pool;
mod error;
mod parser;

pub use access_flags::AccessFlags;
pub use annotations::{Annotation, ElementValue, ElementValuePair};
pub use attributes::{Attribute, Attributes};
pub use class_file::ClassFile;
pub use constant_pool::{Constant, ConstantPool, ConstantTag, RefInfo};
pub use error::ClassFileError;
pub use parser::{Parser, DEFAULT_MAX_NESTING};

pub type Result<T, E = ClassFileError> = std::result::Result<T, E>;
