//! The audio producer thread and the optional native playback backends
//! that consume it.
//!
//! Everything upstream of [`ti994a_core::audio::SampleSink`] — the TMS9919
//! mixer, the cassette FM modem's sample stream — lives in the core crate
//! and the main crate's `sound` module. This crate owns only what spec.md
//! §5 calls the "audio producer thread": a loop that pulls finished
//! batches from the mixer and pushes them into whatever sink the host
//! chooses, plus the sinks themselves for the two native backends the
//! teacher supports.
pub mod host;
pub mod producer;

pub use producer::AudioProducer;
