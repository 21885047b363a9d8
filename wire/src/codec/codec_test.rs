use bytes::{BufMut, Bytes, BytesMut};

use super::*;
use crate::builtin::LinkParameters;
use crate::catalog::{FieldSpec, TypeDescriptor};
use crate::kind::FieldKind;
use crate::value::{Complex, Tensor};

fn everything_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog
        .register(
            TypeDescriptor::new(
                "Everything",
                vec![
                    FieldKind::Str,
                    FieldKind::U32,
                    FieldKind::F32,
                    FieldKind::Bool,
                    FieldKind::OptVec3,
                    FieldKind::TensorF32,
                    FieldKind::TensorU8,
                    FieldKind::TensorC64,
                    FieldKind::F32Seq,
                    FieldKind::TensorSeq,
                    FieldKind::Raw,
                ],
                vec![
                    FieldSpec::new("s", 0),
                    FieldSpec::new("u", 1),
                    FieldSpec::new("f", 2),
                    FieldSpec::new("b", 3),
                    FieldSpec::new("v3", 4),
                    FieldSpec::new("tf", 5),
                    FieldSpec::new("tu", 6),
                    FieldSpec::new("tc", 7),
                    FieldSpec::new("fs", 8),
                    FieldSpec::new("ts", 9),
                    FieldSpec::new("raw", 10),
                ],
            )
            .unwrap(),
        )
        .unwrap();
    catalog
}

fn everything_record() -> Record {
    Record::new("Everything")
        .with_field("s", 0, Value::Str("hello".into()))
        .with_field("u", 1, Value::U32(0xdead_beef))
        .with_field("f", 2, Value::F32(-1.5))
        .with_field("b", 3, Value::Bool(true))
        .with_field("v3", 4, Value::OptVec3(Some([1.0, 2.0, 3.0])))
        .with_field(
            "tf",
            5,
            Value::TensorF32(Tensor::new(vec![2, 3], vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5]).unwrap()),
        )
        .with_field(
            "tu",
            6,
            Value::TensorU8(Tensor::new(vec![2, 2, 1], vec![1, 2, 3, 4]).unwrap()),
        )
        .with_field(
            "tc",
            7,
            Value::TensorC64(
                Tensor::new(vec![2], vec![Complex::new(0.5, -0.5), Complex::new(2.0, 4.0)])
                    .unwrap(),
            ),
        )
        .with_field("fs", 8, Value::F32Seq(vec![20.5, 21.0, 19.75]))
        .with_field(
            "ts",
            9,
            Value::TensorSeq(vec![
                Tensor::new(vec![2], vec![1.0, 2.0]).unwrap(),
                Tensor::new(vec![1, 2], vec![3.0, 4.0]).unwrap(),
            ]),
        )
        .with_field("raw", 10, Value::Raw(Bytes::from_static(b"\xff\xd8\xff")))
}

#[test]
fn test_roundtrip_every_kind() -> Result<()> {
    let catalog = everything_catalog();
    let record = everything_record();

    let encoded = encode(&catalog, &record)?;
    let decoded = decode(&catalog, encoded)?;

    assert_eq!(decoded, record);
    Ok(())
}

#[test]
fn test_link_parameters_header_layout() -> Result<()> {
    let catalog = Catalog::with_builtin_types();
    let params = LinkParameters::new("robot_wifi", "192.168.2.1", "192.168.2.2");

    let encoded = encode(&catalog, &params.to_record())?;

    assert_eq!(&encoded[..4], &14u32.to_be_bytes());
    assert_eq!(&encoded[4..18], b"LinkParameters");
    Ok(())
}

#[test]
fn test_encode_unknown_type() {
    let catalog = Catalog::with_builtin_types();
    let record = Record::new("NotRegistered");
    assert_eq!(
        encode(&catalog, &record),
        Err(Error::ErrUnknownType("NotRegistered".to_owned()))
    );
}

#[test]
fn test_decode_unknown_type() {
    let catalog = Catalog::with_builtin_types();
    let mut buf = BytesMut::new();
    buf.put_u32(7);
    buf.put_slice(b"Unknown");

    assert_eq!(
        decode(&catalog, buf.freeze()),
        Err(Error::ErrUnknownType("Unknown".to_owned()))
    );
}

#[test]
fn test_encode_field_kind_mismatch() {
    let catalog = Catalog::with_builtin_types();
    // water_detected declared Bool, stored F32.
    let record = Record::new("HumiditySample")
        .with_field("humidity", 0, Value::F32(0.5))
        .with_field("water_detected", 1, Value::F32(1.0));

    assert_eq!(
        encode(&catalog, &record),
        Err(Error::ErrFieldKindMismatch {
            key: "water_detected".to_owned(),
            expected: FieldKind::Bool,
            found: FieldKind::F32,
        })
    );
}

#[test]
fn test_decode_kind_out_of_range() {
    let catalog = Catalog::with_builtin_types();
    let mut buf = BytesMut::new();
    buf.put_u32(14);
    buf.put_slice(b"HumiditySample");
    buf.put_u32(8);
    buf.put_slice(b"humidity");
    buf.put_u32(9); // palette has 2 entries
    buf.put_f32(0.5);

    assert_eq!(
        decode(&catalog, buf.freeze()),
        Err(Error::ErrKindOutOfRange { index: 9, len: 2 })
    );
}

#[test]
fn test_decode_truncated_value() -> Result<()> {
    let catalog = everything_catalog();
    let encoded = encode(&catalog, &everything_record())?;

    let cut = encoded.slice(..encoded.len() - 1);
    match decode(&catalog, cut) {
        Err(Error::ErrTruncated { .. }) => Ok(()),
        other => panic!("expected ErrTruncated, got {other:?}"),
    }
}

#[test]
fn test_decode_trailing_bytes() -> Result<()> {
    let catalog = everything_catalog();
    let encoded = encode(&catalog, &everything_record())?;

    let mut buf = BytesMut::from(&encoded[..]);
    buf.put_slice(&[0, 1, 2]);

    assert_eq!(
        decode(&catalog, buf.freeze()),
        Err(Error::ErrTrailingBytes(3))
    );
    Ok(())
}

#[test]
fn test_decode_invalid_utf8_name() {
    let catalog = Catalog::with_builtin_types();
    let mut buf = BytesMut::new();
    buf.put_u32(2);
    buf.put_slice(&[0xff, 0xfe]);

    match decode(&catalog, buf.freeze()) {
        Err(Error::Utf8(_)) => {}
        other => panic!("expected Utf8 error, got {other:?}"),
    }
}

#[test]
fn test_decode_reads_stream_order() -> Result<()> {
    let catalog = Catalog::with_builtin_types();
    let record = Record::new("HumiditySample")
        .with_field("water_detected", 1, Value::Bool(true))
        .with_field("humidity", 0, Value::F32(0.66));

    let decoded = decode(&catalog, encode(&catalog, &record)?)?;
    assert_eq!(decoded.fields()[0].key, "water_detected");
    assert_eq!(decoded.get("humidity"), Some(&Value::F32(0.66)));
    Ok(())
}
