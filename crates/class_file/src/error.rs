use std::io;

use thiserror::Error;

use crate::constant_pool::ConstantTag;

#[derive(Error, Debug)]
pub enum ClassFileError {
    #[error(transparent)]
    Io(io::Error),
    #[error("Class file ended before a mandated field was fully read")]
    Truncated,
    #[error("Invalid magic identifier: 0x{0:X}")]
    InvalidMagicIdentifier(u32),
    #[error("Invalid constant pool tag: {0}")]
    InvalidConstantTag(u8),
    #[error("Constant pool index {index} out of range (pool size is {size})")]
    IndexOutOfRange { index: u16, size: usize },
    #[error("Constant pool index {0} is the unusable slot after an 8-byte constant")]
    NullSlot(u16),
    #[error("Expected {expected:?} at constant pool index {index}, found {found:?}")]
    TagMismatch {
        index: u16,
        expected: ConstantTag,
        found: ConstantTag,
    },
    #[error("Class cannot be both final and abstract")]
    FinalAndAbstract,
    #[error("Attribute name index {0} does not resolve to a Utf8 constant")]
    UnresolvedAttributeName(u16),
    #[error("Invalid element value tag: {0}")]
    InvalidElementValueTag(u8),
    #[error("Annotation nesting deeper than the configured limit of {0}")]
    ExcessiveNesting(usize),
}

impl From<io::Error> for ClassFileError {
    fn from(e: io::Error) -> Self {
        // A short read anywhere in the fixed-order walk means the file ended
        // mid-structure; anything else is a real I/O failure.
        match e.kind() {
            io::ErrorKind::UnexpectedEof => ClassFileError::Truncated,
            _ => ClassFileError::Io(e),
        }
    }
}
