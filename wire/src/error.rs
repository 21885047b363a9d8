use std::string::FromUtf8Error;

use thiserror::Error;

use crate::kind::FieldKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("record type is not registered: {0}")]
    ErrUnknownType(String),
    #[error("field {key} does not match declared kind: (expected: {expected:?}, found: {found:?})")]
    ErrFieldKindMismatch {
        key: String,
        expected: FieldKind,
        found: FieldKind,
    },
    #[error("input ended mid-field: (expected: {expected}, actual: {actual})")]
    ErrTruncated { expected: usize, actual: usize },
    #[error("kind index out of range: (index: {index}, declared kinds: {len})")]
    ErrKindOutOfRange { index: u32, len: usize },
    #[error("{0} bytes remain after complete decode")]
    ErrTrailingBytes(usize),
    #[error("optional tuple presence must be 0 or 3, got {0}")]
    ErrBadOptionalLen(u32),
    #[error("tensor shape does not match element count: (shape product: {expected}, elements: {actual})")]
    ErrShapeMismatch { expected: usize, actual: usize },
    #[error("tensor shape product overflows")]
    ErrTensorOverflow,
    #[error("field kind index {index} is not declared by descriptor {name}")]
    ErrUndeclaredKind { name: String, index: u32 },
    #[error("record field is missing: {0}")]
    ErrMissingField(String),
    #[error("type already registered: {0}")]
    ErrDuplicateType(String),
    #[error("utf-8 error: {0}")]
    Utf8(#[from] FromUtf8Error),
}
