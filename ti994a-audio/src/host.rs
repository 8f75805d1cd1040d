//! Native audio device backends.
//!
//! Enable the `sdl2` or `cpal` feature to pull in the matching submodule.
//! Both expose a [`SampleSink`][ti994a_core::audio::SampleSink]
//! implementation suitable for handing to [`crate::AudioProducer::spawn`].
use core::fmt;
use std::error::Error;

#[cfg(feature = "cpal")]
pub mod cpal;

#[cfg(feature = "sdl2")]
pub mod sdl2;

#[cfg(any(feature = "cpal", feature = "sdl2"))]
pub(crate) mod ring;

/// A list specifying categories of [`AudioHandleError`] error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioHandleErrorKind {
    /// The audio subsystem or device could not be opened.
    AudioSubsystem,
    /// Creating or controlling the audio stream failed.
    AudioStream,
    /// The caller asked for parameters the device can't provide.
    InvalidArguments,
}

/// A common error type returned by all audio handle implementation methods.
#[derive(Debug, Clone)]
pub struct AudioHandleError {
    description: String,
    kind: AudioHandleErrorKind,
}

impl fmt::Display for AudioHandleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.description.fmt(f)
    }
}

impl Error for AudioHandleError {}

impl AudioHandleError {
    pub fn kind(&self) -> AudioHandleErrorKind {
        self.kind
    }
}

impl From<(String, AudioHandleErrorKind)> for AudioHandleError {
    fn from((description, kind): (String, AudioHandleErrorKind)) -> Self {
        AudioHandleError { description, kind }
    }
}
