//! The audio producer thread: the one piece of concurrency spec.md §5
//! carves out of an otherwise single-threaded emulator. It owns nothing
//! about the mixer itself — the caller supplies a batch source closure
//! (typically `Sound::produce_batch`) and a sink to drain into.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ti994a_core::audio::SampleSink;

/// How long the thread sleeps between polls when the source reports
/// nothing to send, matching the 10 ms idle sleep spec.md §5 describes.
const IDLE_SLEEP: Duration = Duration::from_millis(10);

/// Drives a [`SampleSink`] from a batch source on a dedicated thread.
///
/// `running` is cleared either by [`AudioProducer::stop`] or by dropping
/// the handle, so the thread always winds down instead of leaking past
/// its owner's lifetime.
pub struct AudioProducer {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl AudioProducer {
    /// Spawns the producer thread. `next_batch` fills `buf` and returns
    /// `true` when it produced real samples, `false` when there was
    /// nothing to send — the same contract `Sound::produce_batch` uses,
    /// so the thread can sleep instead of pushing silence downstream.
    pub fn spawn<S, F, const N: usize>(mut sink: S, mut next_batch: F) -> Self
    where
        S: SampleSink + Send + 'static,
        F: FnMut(&mut [i16; N]) -> bool + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let running_thread = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name("ti994a-audio".into())
            .spawn(move || {
                let mut buf = [0i16; N];
                while running_thread.load(Ordering::Acquire) {
                    if next_batch(&mut buf) {
                        sink.write_samples(&buf);
                    } else {
                        thread::sleep(IDLE_SLEEP);
                    }
                }
            })
            .expect("failed to spawn ti994a-audio producer thread");
        AudioProducer { running, handle: Some(handle) }
    }

    /// Whether the producer thread is still (supposed to be) running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Clears the run flag and joins the thread. Mirrors the original's
    /// "audio thread is joined on shutdown" cancellation.
    pub fn stop(mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AudioProducer {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink(Arc<Mutex<Vec<i16>>>);

    impl SampleSink for RecordingSink {
        fn write_samples(&mut self, samples: &[i16]) {
            self.0.lock().unwrap().extend_from_slice(samples);
        }
    }

    #[test]
    fn drains_batches_until_stopped() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = RecordingSink(Arc::clone(&log));
        let mut remaining = 3;
        let producer = AudioProducer::spawn::<_, _, 4>(sink, move |buf| {
            if remaining == 0 {
                return false;
            }
            remaining -= 1;
            *buf = [1, 2, 3, 4];
            true
        });
        // Give the thread a chance to drain all three batches.
        thread::sleep(Duration::from_millis(50));
        producer.stop();
        assert_eq!(log.lock().unwrap().len(), 12);
    }
}
