//! Audio device streaming implementation for
//! [cpal](https://crates.io/crates/cpal).
//!
//! Requires the `cpal` feature.
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Stream;

use ti994a_core::audio::SampleSink;

use super::ring::Ring;
use super::{AudioHandleError, AudioHandleErrorKind};

const RING_SECONDS: usize = 1;

/// A [`SampleSink`] backed by a cpal output stream. `write_samples` never
/// blocks: it pushes into a ring cpal's own audio callback drains from.
pub struct CpalSink {
    ring: Ring,
    stream: Stream,
}

impl CpalSink {
    /// Opens the host's default output device with its default config.
    pub fn create_default() -> Result<Self, AudioHandleError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or_else(|| {
            ("no default output device".to_string(), AudioHandleErrorKind::AudioSubsystem)
        })?;
        Self::create(&device)
    }

    pub fn create(device: &cpal::Device) -> Result<Self, AudioHandleError> {
        let config = device
            .default_output_config()
            .map_err(|e| (e.to_string(), AudioHandleErrorKind::AudioSubsystem))?
            .config();
        let sample_rate = config.sample_rate.0 as usize;
        let ring = Ring::new(sample_rate.max(1) * RING_SECONDS);
        let callback_ring = ring.clone();

        let data_fn = move |out: &mut [i16], _: &_| {
            let copied = callback_ring.fill(out);
            if copied < out.len() {
                log::debug!("cpal audio underrun: {copied} of {} samples", out.len());
            }
        };
        let err_fn = |err| log::error!("an error occurred on the audio stream: {err}");

        let stream = device
            .build_output_stream(&config, data_fn, err_fn, None)
            .map_err(|e| (e.to_string(), AudioHandleErrorKind::AudioStream))?;
        stream
            .play()
            .map_err(|e| (e.to_string(), AudioHandleErrorKind::AudioStream))?;

        Ok(CpalSink { ring, stream })
    }

    pub fn pause(&self) -> Result<(), AudioHandleError> {
        self.stream
            .pause()
            .map_err(|e| (e.to_string(), AudioHandleErrorKind::AudioStream).into())
    }

    pub fn resume(&self) -> Result<(), AudioHandleError> {
        self.stream
            .play()
            .map_err(|e| (e.to_string(), AudioHandleErrorKind::AudioStream).into())
    }
}

impl SampleSink for CpalSink {
    fn write_samples(&mut self, samples: &[i16]) {
        self.ring.push(samples);
    }
}
