use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::kind::FieldKind;

/// 64-bit complex value laid out on the wire as the (re, im) f32 pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Complex {
    pub re: f32,
    pub im: f32,
}

impl Complex {
    pub fn new(re: f32, im: f32) -> Self {
        Complex { re, im }
    }
}

/// An element type a dense tensor can carry.
pub trait Element: Sized + Copy {
    const SIZE: usize;

    fn put(self, buf: &mut BytesMut);
    fn get(buf: &mut Bytes) -> Self;
}

impl Element for f32 {
    const SIZE: usize = 4;

    fn put(self, buf: &mut BytesMut) {
        buf.put_f32(self);
    }

    fn get(buf: &mut Bytes) -> Self {
        buf.get_f32()
    }
}

impl Element for u8 {
    const SIZE: usize = 1;

    fn put(self, buf: &mut BytesMut) {
        buf.put_u8(self);
    }

    fn get(buf: &mut Bytes) -> Self {
        buf.get_u8()
    }
}

impl Element for Complex {
    const SIZE: usize = 8;

    fn put(self, buf: &mut BytesMut) {
        buf.put_f32(self.re);
        buf.put_f32(self.im);
    }

    fn get(buf: &mut Bytes) -> Self {
        let re = buf.get_f32();
        let im = buf.get_f32();
        Complex { re, im }
    }
}

/// Dense row-major tensor. The shape product always equals the element
/// count; `new` enforces it and decode never constructs a violating value.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T> {
    shape: Vec<u32>,
    data: Vec<T>,
}

impl<T: Element> Tensor<T> {
    pub fn new(shape: Vec<u32>, data: Vec<T>) -> Result<Self> {
        let expected = element_count(&shape)?;
        if expected != data.len() {
            return Err(Error::ErrShapeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Tensor { shape, data })
    }

    pub fn shape(&self) -> &[u32] {
        &self.shape
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    pub(crate) fn encode_to(&self, buf: &mut BytesMut) {
        buf.put_u32(self.shape.len() as u32);
        for dim in &self.shape {
            buf.put_u32(*dim);
        }
        for v in &self.data {
            v.put(buf);
        }
    }

    pub(crate) fn decode(buf: &mut Bytes) -> Result<Self> {
        let rank = read_u32(buf)? as usize;
        ensure(buf, rank * 4)?;
        let mut shape = Vec::with_capacity(rank);
        for _ in 0..rank {
            shape.push(buf.get_u32());
        }

        let count = element_count(&shape)?;
        // A payload whose length is not a multiple of the element size is
        // reported as truncated, never padded.
        ensure(buf, count * T::SIZE)?;
        let mut data = Vec::with_capacity(count);
        for _ in 0..count {
            data.push(T::get(buf));
        }

        Ok(Tensor { shape, data })
    }
}

fn element_count(shape: &[u32]) -> Result<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim as usize))
        .ok_or(Error::ErrTensorOverflow)
}

/// A field value of one of the recognized kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    U32(u32),
    F32(f32),
    Bool(bool),
    OptVec3(Option<[f32; 3]>),
    TensorF32(Tensor<f32>),
    TensorU8(Tensor<u8>),
    TensorC64(Tensor<Complex>),
    F32Seq(Vec<f32>),
    TensorSeq(Vec<Tensor<f32>>),
    Raw(Bytes),
}

impl Value {
    pub fn kind(&self) -> FieldKind {
        match self {
            Value::Str(_) => FieldKind::Str,
            Value::U32(_) => FieldKind::U32,
            Value::F32(_) => FieldKind::F32,
            Value::Bool(_) => FieldKind::Bool,
            Value::OptVec3(_) => FieldKind::OptVec3,
            Value::TensorF32(_) => FieldKind::TensorF32,
            Value::TensorU8(_) => FieldKind::TensorU8,
            Value::TensorC64(_) => FieldKind::TensorC64,
            Value::F32Seq(_) => FieldKind::F32Seq,
            Value::TensorSeq(_) => FieldKind::TensorSeq,
            Value::Raw(_) => FieldKind::Raw,
        }
    }

    pub(crate) fn encode_to(&self, buf: &mut BytesMut) {
        match self {
            Value::Str(s) => put_str(buf, s),
            Value::U32(v) => buf.put_u32(*v),
            Value::F32(v) => buf.put_f32(*v),
            Value::Bool(v) => buf.put_u8(u8::from(*v)),
            Value::OptVec3(opt) => match opt {
                None => buf.put_u32(0),
                Some([x, y, z]) => {
                    buf.put_u32(3);
                    buf.put_f32(*x);
                    buf.put_f32(*y);
                    buf.put_f32(*z);
                }
            },
            Value::TensorF32(t) => t.encode_to(buf),
            Value::TensorU8(t) => t.encode_to(buf),
            Value::TensorC64(t) => t.encode_to(buf),
            Value::F32Seq(vs) => {
                buf.put_u32(vs.len() as u32);
                for v in vs {
                    buf.put_f32(*v);
                }
            }
            Value::TensorSeq(ts) => {
                buf.put_u32(ts.len() as u32);
                for t in ts {
                    t.encode_to(buf);
                }
            }
            Value::Raw(bytes) => {
                buf.put_u32(bytes.len() as u32);
                buf.put_slice(bytes);
            }
        }
    }

    pub(crate) fn decode(kind: FieldKind, buf: &mut Bytes) -> Result<Self> {
        match kind {
            FieldKind::Str => Ok(Value::Str(read_string(buf)?)),
            FieldKind::U32 => Ok(Value::U32(read_u32(buf)?)),
            FieldKind::F32 => Ok(Value::F32(read_f32(buf)?)),
            FieldKind::Bool => {
                ensure(buf, 1)?;
                Ok(Value::Bool(buf.get_u8() != 0))
            }
            FieldKind::OptVec3 => {
                let presence = read_u32(buf)?;
                match presence {
                    0 => Ok(Value::OptVec3(None)),
                    3 => {
                        ensure(buf, 12)?;
                        let x = buf.get_f32();
                        let y = buf.get_f32();
                        let z = buf.get_f32();
                        Ok(Value::OptVec3(Some([x, y, z])))
                    }
                    other => Err(Error::ErrBadOptionalLen(other)),
                }
            }
            FieldKind::TensorF32 => Ok(Value::TensorF32(Tensor::decode(buf)?)),
            FieldKind::TensorU8 => Ok(Value::TensorU8(Tensor::decode(buf)?)),
            FieldKind::TensorC64 => Ok(Value::TensorC64(Tensor::decode(buf)?)),
            FieldKind::F32Seq => {
                let count = read_u32(buf)? as usize;
                ensure(buf, count * 4)?;
                let mut vs = Vec::with_capacity(count);
                for _ in 0..count {
                    vs.push(buf.get_f32());
                }
                Ok(Value::F32Seq(vs))
            }
            FieldKind::TensorSeq => {
                let count = read_u32(buf)? as usize;
                // count is unvalidated input; do not preallocate
                let mut ts = Vec::new();
                for _ in 0..count {
                    ts.push(Tensor::decode(buf)?);
                }
                Ok(Value::TensorSeq(ts))
            }
            FieldKind::Raw => {
                let len = read_u32(buf)? as usize;
                ensure(buf, len)?;
                Ok(Value::Raw(buf.copy_to_bytes(len)))
            }
        }
    }
}

pub(crate) fn put_str(buf: &mut BytesMut, s: &str) {
    buf.put_u32(s.len() as u32);
    buf.put_slice(s.as_bytes());
}

pub(crate) fn read_string(buf: &mut Bytes) -> Result<String> {
    let len = read_u32(buf)? as usize;
    ensure(buf, len)?;
    let raw = buf.copy_to_bytes(len);
    Ok(String::from_utf8(raw.to_vec())?)
}

pub(crate) fn read_u32(buf: &mut Bytes) -> Result<u32> {
    ensure(buf, 4)?;
    Ok(buf.get_u32())
}

fn read_f32(buf: &mut Bytes) -> Result<f32> {
    ensure(buf, 4)?;
    Ok(buf.get_f32())
}

pub(crate) fn ensure(buf: &Bytes, needed: usize) -> Result<()> {
    if buf.remaining() < needed {
        return Err(Error::ErrTruncated {
            expected: needed,
            actual: buf.remaining(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tensor_shape_mismatch() {
        let res = Tensor::<f32>::new(vec![2, 2], vec![0.0; 3]);
        assert_eq!(
            res,
            Err(Error::ErrShapeMismatch {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_tensor_truncated_payload() {
        let mut buf = BytesMut::new();
        buf.put_u32(1); // rank
        buf.put_u32(4); // shape
        buf.put_f32(1.0);
        buf.put_f32(2.0); // only 2 of 4 elements

        let mut bytes = buf.freeze();
        assert_eq!(
            Tensor::<f32>::decode(&mut bytes),
            Err(Error::ErrTruncated {
                expected: 16,
                actual: 8
            })
        );
    }

    #[test]
    fn test_optional_tuple_roundtrip() -> Result<()> {
        for v in [Value::OptVec3(None), Value::OptVec3(Some([1.0, -0.5, 9.8]))] {
            let mut buf = BytesMut::new();
            v.encode_to(&mut buf);
            let mut bytes = buf.freeze();
            let back = Value::decode(FieldKind::OptVec3, &mut bytes)?;
            assert_eq!(back, v);
            assert_eq!(bytes.remaining(), 0);
        }
        Ok(())
    }

    #[test]
    fn test_optional_tuple_bad_presence() {
        let mut buf = BytesMut::new();
        buf.put_u32(2);
        let mut bytes = buf.freeze();
        assert_eq!(
            Value::decode(FieldKind::OptVec3, &mut bytes),
            Err(Error::ErrBadOptionalLen(2))
        );
    }

    #[test]
    fn test_complex_tensor_roundtrip() -> Result<()> {
        let t = Tensor::new(
            vec![2],
            vec![Complex::new(0.5, -0.5), Complex::new(1.0, 2.0)],
        )?;
        let mut buf = BytesMut::new();
        t.encode_to(&mut buf);
        let mut bytes = buf.freeze();
        assert_eq!(Tensor::<Complex>::decode(&mut bytes)?, t);
        Ok(())
    }
}
