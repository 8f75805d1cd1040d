//! A small mutex-guarded ring shared between the producer thread's
//! [`SampleSink::write_samples`][ti994a_core::audio::SampleSink] calls and
//! a native audio callback running on a third, device-owned thread.
//!
//! The retrieved reference crate solves this with a lock-free SPSC
//! carousel; that module wasn't part of the pack this crate was grounded
//! on, so this is a plain mutex-backed equivalent sized generously (one
//! second of audio) so the callback thread is never starved by a lock
//! held only for the duration of a `VecDeque` push/pop.
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct Ring {
    inner: Arc<Mutex<VecDeque<i16>>>,
    capacity: usize,
}

impl Ring {
    pub fn new(capacity: usize) -> Self {
        Ring { inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))), capacity }
    }

    /// Pushes `samples`, dropping the oldest queued sample per overflow so
    /// a slow-draining callback can't back-pressure the producer thread.
    pub fn push(&self, samples: &[i16]) {
        let mut buf = self.inner.lock().unwrap();
        for &sample in samples {
            if buf.len() == self.capacity {
                buf.pop_front();
            }
            buf.push_back(sample);
        }
    }

    /// Fills `out` from the ring, padding any shortfall with silence.
    /// Returns how many of `out`'s slots were real samples.
    pub fn fill(&self, out: &mut [i16]) -> usize {
        let mut buf = self.inner.lock().unwrap();
        let mut copied = 0;
        for slot in out.iter_mut() {
            *slot = match buf.pop_front() {
                Some(sample) => {
                    copied += 1;
                    sample
                }
                None => 0,
            };
        }
        copied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_pads_shortfall_with_silence() {
        let ring = Ring::new(4);
        ring.push(&[1, 2]);
        let mut out = [0i16; 4];
        let copied = ring.fill(&mut out);
        assert_eq!(copied, 2);
        assert_eq!(out, [1, 2, 0, 0]);
    }

    #[test]
    fn push_drops_oldest_on_overflow() {
        let ring = Ring::new(2);
        ring.push(&[1, 2, 3]);
        let mut out = [0i16; 2];
        ring.fill(&mut out);
        assert_eq!(out, [2, 3]);
    }
}
