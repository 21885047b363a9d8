#[cfg(test)]
mod codec_test;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::record::Record;
use crate::value::{put_str, read_string, read_u32, Value};

/// Serializes one record to its length-prefixed byte string.
///
/// Layout (all integers big-endian):
///
/// ```plain
/// u32 name_len || name_bytes
/// repeated for each field:
///   u32 key_len || key_bytes
///   u32 kind_index
///   <kind-dependent value encoding>
/// ```
pub fn encode(catalog: &Catalog, record: &Record) -> Result<Bytes> {
    let descriptor = catalog.get(record.name())?;

    let mut buf = BytesMut::new();
    put_str(&mut buf, record.name());

    for field in record.fields() {
        let declared = descriptor.kind_of(field.kind_index)?;
        let found = field.value.kind();
        if found != declared {
            return Err(Error::ErrFieldKindMismatch {
                key: field.key.clone(),
                expected: declared,
                found,
            });
        }

        put_str(&mut buf, &field.key);
        buf.put_u32(field.kind_index);
        field.value.encode_to(&mut buf);
    }

    log::trace!(
        "encoded {} ({} fields, {} bytes)",
        record.name(),
        record.fields().len(),
        buf.len()
    );
    Ok(buf.freeze())
}

/// Reconstructs a record from a byte string. Fields are read in the order
/// they appear in the stream; exactly as many fields are read as the
/// descriptor declares, and leftover input is an error.
pub fn decode(catalog: &Catalog, payload: Bytes) -> Result<Record> {
    let mut buf = payload;

    let name = read_string(&mut buf)?;
    let descriptor = catalog.get(&name)?;
    let field_count = descriptor.fields().len();

    let mut record = Record::new(name);
    for _ in 0..field_count {
        let key = read_string(&mut buf)?;
        let kind_index = read_u32(&mut buf)?;
        let kind = descriptor.kind_of(kind_index)?;
        let value = Value::decode(kind, &mut buf)?;
        record.push(key, kind_index, value);
    }

    if buf.has_remaining() {
        return Err(Error::ErrTrailingBytes(buf.remaining()));
    }

    log::trace!("decoded {} ({field_count} fields)", record.name());
    Ok(record)
}
