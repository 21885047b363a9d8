//! The built-in record types both peers install before communicating.
//!
//! Each type pairs a plain Rust struct with a `TypeDescriptor` entry; the
//! struct converts to and from the generic [`Record`] the codec works on.

use bytes::Bytes;

use crate::catalog::{FieldSpec, TypeDescriptor};
use crate::error::{Error, Result};
use crate::kind::FieldKind;
use crate::record::Record;
use crate::value::{Complex, Tensor, Value};

/// Well-known token used when no passphrase was configured.
pub const DEFAULT_PASSWORD: &str = "example_password";

/// Every built-in descriptor, in registration order.
pub fn descriptors() -> Vec<TypeDescriptor> {
    vec![
        LinkParameters::descriptor(),
        MjpegFrame::descriptor(),
        CamFrame::descriptor(),
        AudioSpectrum::descriptor(),
        ImuSample::descriptor(),
        HumiditySample::descriptor(),
        TemperatureSeries::descriptor(),
        TensorBatch::descriptor(),
    ]
}

/// The direct-link connection parameters exchanged once during rendezvous.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkParameters {
    pub ssid: String,
    pub server_ip: String,
    pub client_ip: String,
    pub password: String,
}

impl LinkParameters {
    pub const TYPE_NAME: &'static str = "LinkParameters";

    pub fn new(
        ssid: impl Into<String>,
        server_ip: impl Into<String>,
        client_ip: impl Into<String>,
    ) -> Self {
        LinkParameters {
            ssid: ssid.into(),
            server_ip: server_ip.into(),
            client_ip: client_ip.into(),
            password: DEFAULT_PASSWORD.to_owned(),
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor {
            name: Self::TYPE_NAME.to_owned(),
            kinds: vec![FieldKind::Str],
            fields: vec![
                FieldSpec::new("ssid", 0),
                FieldSpec::new("server_ip", 0),
                FieldSpec::new("client_ip", 0),
                FieldSpec::new("password", 0),
            ],
        }
    }

    pub fn to_record(&self) -> Record {
        Record::new(Self::TYPE_NAME)
            .with_field("ssid", 0, Value::Str(self.ssid.clone()))
            .with_field("server_ip", 0, Value::Str(self.server_ip.clone()))
            .with_field("client_ip", 0, Value::Str(self.client_ip.clone()))
            .with_field("password", 0, Value::Str(self.password.clone()))
    }
}

impl TryFrom<&Record> for LinkParameters {
    type Error = Error;

    fn try_from(record: &Record) -> Result<Self> {
        Ok(LinkParameters {
            ssid: want_str(record, "ssid")?,
            server_ip: want_str(record, "server_ip")?,
            client_ip: want_str(record, "client_ip")?,
            password: want_str(record, "password")?,
        })
    }
}

/// A compressed camera frame plus capture settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MjpegFrame {
    pub brightness: u32,
    pub exposure: u32,
    pub mjpeg: Bytes,
}

impl MjpegFrame {
    pub const TYPE_NAME: &'static str = "MjpegFrame";

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor {
            name: Self::TYPE_NAME.to_owned(),
            kinds: vec![FieldKind::Raw, FieldKind::U32],
            fields: vec![
                FieldSpec::new("brightness", 1),
                FieldSpec::new("exposure", 1),
                FieldSpec::new("mjpeg", 0),
            ],
        }
    }

    pub fn to_record(&self) -> Record {
        Record::new(Self::TYPE_NAME)
            .with_field("brightness", 1, Value::U32(self.brightness))
            .with_field("exposure", 1, Value::U32(self.exposure))
            .with_field("mjpeg", 0, Value::Raw(self.mjpeg.clone()))
    }
}

impl TryFrom<&Record> for MjpegFrame {
    type Error = Error;

    fn try_from(record: &Record) -> Result<Self> {
        Ok(MjpegFrame {
            brightness: want_u32(record, "brightness")?,
            exposure: want_u32(record, "exposure")?,
            mjpeg: want_raw(record, "mjpeg")?,
        })
    }
}

/// An uncompressed camera frame as a dense u8 tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct CamFrame {
    pub image: Tensor<u8>,
    pub brightness: u32,
    pub exposure: u32,
}

impl CamFrame {
    pub const TYPE_NAME: &'static str = "CamFrame";

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor {
            name: Self::TYPE_NAME.to_owned(),
            kinds: vec![FieldKind::TensorU8, FieldKind::U32],
            fields: vec![
                FieldSpec::new("image", 0),
                FieldSpec::new("brightness", 1),
                FieldSpec::new("exposure", 1),
            ],
        }
    }

    pub fn to_record(&self) -> Record {
        Record::new(Self::TYPE_NAME)
            .with_field("image", 0, Value::TensorU8(self.image.clone()))
            .with_field("brightness", 1, Value::U32(self.brightness))
            .with_field("exposure", 1, Value::U32(self.exposure))
    }
}

impl TryFrom<&Record> for CamFrame {
    type Error = Error;

    fn try_from(record: &Record) -> Result<Self> {
        Ok(CamFrame {
            image: want_tensor_u8(record, "image")?,
            brightness: want_u32(record, "brightness")?,
            exposure: want_u32(record, "exposure")?,
        })
    }
}

/// One FFT block from the microphone stream.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSpectrum {
    pub sample_rate: u32,
    pub samples_per_sec: u32,
    pub fft: Tensor<Complex>,
}

impl AudioSpectrum {
    pub const TYPE_NAME: &'static str = "AudioSpectrum";

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor {
            name: Self::TYPE_NAME.to_owned(),
            kinds: vec![FieldKind::TensorC64, FieldKind::U32],
            fields: vec![
                FieldSpec::new("sample_rate", 1),
                FieldSpec::new("samples_per_sec", 1),
                FieldSpec::new("fft", 0),
            ],
        }
    }

    pub fn to_record(&self) -> Record {
        Record::new(Self::TYPE_NAME)
            .with_field("sample_rate", 1, Value::U32(self.sample_rate))
            .with_field("samples_per_sec", 1, Value::U32(self.samples_per_sec))
            .with_field("fft", 0, Value::TensorC64(self.fft.clone()))
    }
}

impl TryFrom<&Record> for AudioSpectrum {
    type Error = Error;

    fn try_from(record: &Record) -> Result<Self> {
        Ok(AudioSpectrum {
            sample_rate: want_u32(record, "sample_rate")?,
            samples_per_sec: want_u32(record, "samples_per_sec")?,
            fft: want_tensor_c64(record, "fft")?,
        })
    }
}

/// Accelerometer, gyroscope and magnetometer readings; any axis block may
/// be absent when the sensor did not report.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImuSample {
    pub accel_data: Option<[f32; 3]>,
    pub gyro_data: Option<[f32; 3]>,
    pub mag_data: Option<[f32; 3]>,
}

impl ImuSample {
    pub const TYPE_NAME: &'static str = "ImuSample";

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor {
            name: Self::TYPE_NAME.to_owned(),
            kinds: vec![FieldKind::OptVec3],
            fields: vec![
                FieldSpec::new("accel_data", 0),
                FieldSpec::new("gyro_data", 0),
                FieldSpec::new("mag_data", 0),
            ],
        }
    }

    pub fn to_record(&self) -> Record {
        Record::new(Self::TYPE_NAME)
            .with_field("accel_data", 0, Value::OptVec3(self.accel_data))
            .with_field("gyro_data", 0, Value::OptVec3(self.gyro_data))
            .with_field("mag_data", 0, Value::OptVec3(self.mag_data))
    }
}

impl TryFrom<&Record> for ImuSample {
    type Error = Error;

    fn try_from(record: &Record) -> Result<Self> {
        Ok(ImuSample {
            accel_data: want_opt_vec3(record, "accel_data")?,
            gyro_data: want_opt_vec3(record, "gyro_data")?,
            mag_data: want_opt_vec3(record, "mag_data")?,
        })
    }
}

/// Humidity and water-detection sensor pair.
#[derive(Debug, Clone, PartialEq)]
pub struct HumiditySample {
    pub humidity: f32,
    pub water_detected: bool,
}

impl HumiditySample {
    pub const TYPE_NAME: &'static str = "HumiditySample";

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor {
            name: Self::TYPE_NAME.to_owned(),
            kinds: vec![FieldKind::F32, FieldKind::Bool],
            fields: vec![
                FieldSpec::new("humidity", 0),
                FieldSpec::new("water_detected", 1),
            ],
        }
    }

    pub fn to_record(&self) -> Record {
        Record::new(Self::TYPE_NAME)
            .with_field("humidity", 0, Value::F32(self.humidity))
            .with_field("water_detected", 1, Value::Bool(self.water_detected))
    }
}

impl TryFrom<&Record> for HumiditySample {
    type Error = Error;

    fn try_from(record: &Record) -> Result<Self> {
        Ok(HumiditySample {
            humidity: want_f32(record, "humidity")?,
            water_detected: want_bool(record, "water_detected")?,
        })
    }
}

/// Temperature readings from multiple probe channels.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureSeries {
    pub readings: Vec<f32>,
}

impl TemperatureSeries {
    pub const TYPE_NAME: &'static str = "TemperatureSeries";

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor {
            name: Self::TYPE_NAME.to_owned(),
            kinds: vec![FieldKind::F32Seq],
            fields: vec![FieldSpec::new("readings", 0)],
        }
    }

    pub fn to_record(&self) -> Record {
        Record::new(Self::TYPE_NAME).with_field("readings", 0, Value::F32Seq(self.readings.clone()))
    }
}

impl TryFrom<&Record> for TemperatureSeries {
    type Error = Error;

    fn try_from(record: &Record) -> Result<Self> {
        Ok(TemperatureSeries {
            readings: want_f32_seq(record, "readings")?,
        })
    }
}

/// A batch of f32 tensors, e.g. per-channel feature maps.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorBatch {
    pub tensors: Vec<Tensor<f32>>,
}

impl TensorBatch {
    pub const TYPE_NAME: &'static str = "TensorBatch";

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor {
            name: Self::TYPE_NAME.to_owned(),
            kinds: vec![FieldKind::TensorSeq],
            fields: vec![FieldSpec::new("tensors", 0)],
        }
    }

    pub fn to_record(&self) -> Record {
        Record::new(Self::TYPE_NAME)
            .with_field("tensors", 0, Value::TensorSeq(self.tensors.clone()))
    }
}

impl TryFrom<&Record> for TensorBatch {
    type Error = Error;

    fn try_from(record: &Record) -> Result<Self> {
        Ok(TensorBatch {
            tensors: want_tensor_seq(record, "tensors")?,
        })
    }
}

fn mismatch(key: &str, expected: FieldKind, found: &Value) -> Error {
    Error::ErrFieldKindMismatch {
        key: key.to_owned(),
        expected,
        found: found.kind(),
    }
}

fn want_str(record: &Record, key: &str) -> Result<String> {
    match record.get(key) {
        Some(Value::Str(s)) => Ok(s.clone()),
        Some(v) => Err(mismatch(key, FieldKind::Str, v)),
        None => Err(Error::ErrMissingField(key.to_owned())),
    }
}

fn want_u32(record: &Record, key: &str) -> Result<u32> {
    match record.get(key) {
        Some(Value::U32(v)) => Ok(*v),
        Some(v) => Err(mismatch(key, FieldKind::U32, v)),
        None => Err(Error::ErrMissingField(key.to_owned())),
    }
}

fn want_f32(record: &Record, key: &str) -> Result<f32> {
    match record.get(key) {
        Some(Value::F32(v)) => Ok(*v),
        Some(v) => Err(mismatch(key, FieldKind::F32, v)),
        None => Err(Error::ErrMissingField(key.to_owned())),
    }
}

fn want_bool(record: &Record, key: &str) -> Result<bool> {
    match record.get(key) {
        Some(Value::Bool(v)) => Ok(*v),
        Some(v) => Err(mismatch(key, FieldKind::Bool, v)),
        None => Err(Error::ErrMissingField(key.to_owned())),
    }
}

fn want_opt_vec3(record: &Record, key: &str) -> Result<Option<[f32; 3]>> {
    match record.get(key) {
        Some(Value::OptVec3(v)) => Ok(*v),
        Some(v) => Err(mismatch(key, FieldKind::OptVec3, v)),
        None => Err(Error::ErrMissingField(key.to_owned())),
    }
}

fn want_raw(record: &Record, key: &str) -> Result<Bytes> {
    match record.get(key) {
        Some(Value::Raw(b)) => Ok(b.clone()),
        Some(v) => Err(mismatch(key, FieldKind::Raw, v)),
        None => Err(Error::ErrMissingField(key.to_owned())),
    }
}

fn want_tensor_u8(record: &Record, key: &str) -> Result<Tensor<u8>> {
    match record.get(key) {
        Some(Value::TensorU8(t)) => Ok(t.clone()),
        Some(v) => Err(mismatch(key, FieldKind::TensorU8, v)),
        None => Err(Error::ErrMissingField(key.to_owned())),
    }
}

fn want_tensor_c64(record: &Record, key: &str) -> Result<Tensor<Complex>> {
    match record.get(key) {
        Some(Value::TensorC64(t)) => Ok(t.clone()),
        Some(v) => Err(mismatch(key, FieldKind::TensorC64, v)),
        None => Err(Error::ErrMissingField(key.to_owned())),
    }
}

fn want_f32_seq(record: &Record, key: &str) -> Result<Vec<f32>> {
    match record.get(key) {
        Some(Value::F32Seq(vs)) => Ok(vs.clone()),
        Some(v) => Err(mismatch(key, FieldKind::F32Seq, v)),
        None => Err(Error::ErrMissingField(key.to_owned())),
    }
}

fn want_tensor_seq(record: &Record, key: &str) -> Result<Vec<Tensor<f32>>> {
    match record.get(key) {
        Some(Value::TensorSeq(ts)) => Ok(ts.clone()),
        Some(v) => Err(mismatch(key, FieldKind::TensorSeq, v)),
        None => Err(Error::ErrMissingField(key.to_owned())),
    }
}
