//! Sample sources for demos and tests. Real deployments plug in camera
//! and microphone acquisition behind the same trait.

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use wire::{ImuSample, MjpegFrame, Record};

use crate::error::Result;
use crate::session::SampleSource;

/// Emits synthetic MJPEG frames of a fixed payload size.
pub struct SyntheticCamera {
    frame: u64,
    payload_len: usize,
}

impl SyntheticCamera {
    pub fn new(payload_len: usize) -> Self {
        SyntheticCamera {
            frame: 0,
            payload_len,
        }
    }

    fn fake_jpeg(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.payload_len + 4);
        buf.put_slice(&[0xff, 0xd8]); // SOI
        let fill = self.frame as u8;
        buf.put_bytes(fill, self.payload_len);
        buf.put_slice(&[0xff, 0xd9]); // EOI
        buf.freeze()
    }
}

#[async_trait]
impl SampleSource for SyntheticCamera {
    async fn next_sample(&mut self) -> Result<Option<Record>> {
        let frame = MjpegFrame {
            brightness: 128,
            exposure: (self.frame % 100) as u32,
            mjpeg: self.fake_jpeg(),
        };
        self.frame += 1;
        Ok(Some(frame.to_record()))
    }
}

/// Emits IMU readings with the gyroscope dropping out on odd samples.
pub struct SyntheticImu {
    tick: u64,
}

impl SyntheticImu {
    pub fn new() -> Self {
        SyntheticImu { tick: 0 }
    }
}

impl Default for SyntheticImu {
    fn default() -> Self {
        SyntheticImu::new()
    }
}

#[async_trait]
impl SampleSource for SyntheticImu {
    async fn next_sample(&mut self) -> Result<Option<Record>> {
        let t = self.tick as f32;
        let sample = ImuSample {
            accel_data: Some([t.sin(), t.cos(), 9.8]),
            gyro_data: (self.tick % 2 == 0).then_some([0.01 * t, -0.01 * t, 0.0]),
            mag_data: None,
        };
        self.tick += 1;
        Ok(Some(sample.to_record()))
    }
}

/// Plays back a fixed list of records, then ends the session.
pub struct ScriptedSource {
    records: VecDeque<Record>,
}

impl ScriptedSource {
    pub fn new(records: Vec<Record>) -> Self {
        ScriptedSource {
            records: records.into(),
        }
    }
}

#[async_trait]
impl SampleSource for ScriptedSource {
    async fn next_sample(&mut self) -> Result<Option<Record>> {
        Ok(self.records.pop_front())
    }
}

/// Never produces; the session runs until cancelled. For consume-only
/// peers.
pub struct IdleSource;

#[async_trait]
impl SampleSource for IdleSource {
    async fn next_sample(&mut self) -> Result<Option<Record>> {
        std::future::pending::<()>().await;
        Ok(None)
    }
}
