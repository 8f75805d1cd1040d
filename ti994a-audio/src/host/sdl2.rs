//! Audio device streaming implementation for
//! [SDL2](https://crates.io/crates/sdl2).
//!
//! Requires the `sdl2` feature.
use sdl2::audio::{AudioCallback, AudioDevice, AudioSpecDesired};
use sdl2::Sdl;

use ti994a_core::audio::SampleSink;

use super::ring::Ring;
use super::{AudioHandleError, AudioHandleErrorKind};

const DEFAULT_SAMPLE_RATE: i32 = 44100;
const RING_SECONDS: usize = 1;

struct Callback(Ring);

impl AudioCallback for Callback {
    type Channel = i16;

    fn callback(&mut self, out: &mut [i16]) {
        let copied = self.0.fill(out);
        if copied < out.len() {
            log::debug!("sdl2 audio underrun: {copied} of {} samples", out.len());
        }
    }
}

/// A [`SampleSink`] backed by an SDL2 playback device. `write_samples`
/// never blocks: it pushes into a ring the device's own callback thread
/// drains from.
pub struct Sdl2Sink {
    ring: Ring,
    device: AudioDevice<Callback>,
}

impl Sdl2Sink {
    /// Opens the default playback device at 44100 Hz mono, matching the
    /// sample rate the mixer and cassette modem both produce at.
    pub fn create(sdl_context: &Sdl) -> Result<Self, AudioHandleError> {
        let audio_subsystem = sdl_context
            .audio()
            .map_err(|e| (e, AudioHandleErrorKind::AudioSubsystem))?;
        let desired = AudioSpecDesired {
            freq: Some(DEFAULT_SAMPLE_RATE),
            channels: Some(1),
            samples: None,
        };
        let ring = Ring::new(DEFAULT_SAMPLE_RATE as usize * RING_SECONDS);
        let callback_ring = ring.clone();
        let device = audio_subsystem
            .open_playback(None, &desired, move |_spec| Callback(callback_ring))
            .map_err(|e| (e, AudioHandleErrorKind::AudioStream))?;
        device.resume();
        Ok(Sdl2Sink { ring, device })
    }

    pub fn pause(&self) {
        self.device.pause();
    }

    pub fn resume(&self) {
        self.device.resume();
    }
}

impl SampleSink for Sdl2Sink {
    fn write_samples(&mut self, samples: &[i16]) {
        self.ring.push(samples);
    }
}
