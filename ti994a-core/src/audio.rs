/*
    Copyright (C) 2024  Mark Halloran

    This file is part of ti994a, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! The sample-sink interface the sound mixer and the cassette modem
//! produce into. The PulseAudio backend is out of scope (spec.md §1) —
//! only this trait is specified.

/// A sink that accepts fixed-size batches of signed 16-bit mono samples at
/// 44100 Hz, as spec.md §4.6 requires of the mixer's producer thread.
pub trait SampleSink {
    /// Accepts one batch of samples. Implementations that write to a
    /// blocking audio device should block here; the mixer's producer loop
    /// is expected to sleep between batches rather than spin.
    fn write_samples(&mut self, samples: &[i16]);
}

/// A [`SampleSink`] that appends every batch to an in-memory buffer, used
/// by tests and by headless hosts.
#[derive(Default, Clone)]
pub struct SampleBuffer {
    pub samples: Vec<i16>,
}

impl SampleSink for SampleBuffer {
    fn write_samples(&mut self, samples: &[i16]) {
        self.samples.extend_from_slice(samples);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_buffer_accumulates_batches() {
        let mut sink = SampleBuffer::default();
        sink.write_samples(&[1, 2, 3]);
        sink.write_samples(&[4, 5]);
        assert_eq!(sink.samples, vec![1, 2, 3, 4, 5]);
    }
}
