/// The recognized field kinds. A type descriptor declares an ordered list
/// of these (its kind palette); every encoded field carries an index into
/// that list so the receiver knows which decoder follows the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// utf-8 string, length-prefixed.
    Str,
    /// unsigned 32-bit integer, big-endian.
    U32,
    /// 32-bit float, big-endian.
    F32,
    /// boolean, one byte.
    Bool,
    /// optional 3-tuple of f32 (presence word 0 or 3).
    OptVec3,
    /// dense row-major tensor of f32.
    TensorF32,
    /// dense row-major tensor of u8.
    TensorU8,
    /// dense row-major tensor of 64-bit complex values.
    TensorC64,
    /// ordered sequence of f32.
    F32Seq,
    /// ordered sequence of f32 tensors.
    TensorSeq,
    /// raw byte string, length-prefixed.
    Raw,
}
