/*
    Copyright (C) 2024  Mark Halloran

    This file is part of ti994a, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! Canonical RIFF/WAVE PCM container read and write (spec.md §6). The
//! reader accepts 1 or 2 channels at 8 or 16 bits; the writer always
//! produces mono, configurable bit depth, at 44100 Hz.
use byteorder::{ByteOrder, LittleEndian};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WavError {
    #[error("not a RIFF/WAVE file")]
    BadHeader,
    #[error("unsupported format: {0} channels, {1}-bit")]
    Unsupported(u16, u16),
    #[error("file is truncated")]
    Truncated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

/// A fully decoded WAV file's format and sample data, mono- or
/// stereo-interleaved 8- or 16-bit PCM widened to `i16`.
#[derive(Debug, Clone)]
pub struct WavFile {
    pub format: WavFormat,
    pub samples: Vec<i16>,
}

impl WavFile {
    pub fn read(bytes: &[u8]) -> Result<Self, WavError> {
        if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return Err(WavError::BadHeader);
        }

        let mut pos = 12;
        let mut format: Option<WavFormat> = None;
        let mut data: &[u8] = &[];

        while pos + 8 <= bytes.len() {
            let chunk_id = &bytes[pos..pos + 4];
            let chunk_len = LittleEndian::read_u32(&bytes[pos + 4..pos + 8]) as usize;
            let body_start = pos + 8;
            let body_end = body_start.checked_add(chunk_len).ok_or(WavError::Truncated)?;
            if body_end > bytes.len() {
                return Err(WavError::Truncated);
            }
            let body = &bytes[body_start..body_end];

            match chunk_id {
                b"fmt " => {
                    if body.len() < 16 {
                        return Err(WavError::Truncated);
                    }
                    format = Some(WavFormat {
                        channels: LittleEndian::read_u16(&body[2..4]),
                        sample_rate: LittleEndian::read_u32(&body[4..8]),
                        bits_per_sample: LittleEndian::read_u16(&body[14..16]),
                    });
                }
                b"data" => data = body,
                _ => {}
            }

            pos = body_end + (chunk_len % 2);
        }

        let format = format.ok_or(WavError::BadHeader)?;
        if !matches!(format.channels, 1 | 2) || !matches!(format.bits_per_sample, 8 | 16) {
            return Err(WavError::Unsupported(format.channels, format.bits_per_sample));
        }

        let samples = match format.bits_per_sample {
            8 => data.iter().map(|&b| (b as i16 - 128) << 8).collect(),
            16 => data.chunks_exact(2).map(LittleEndian::read_i16).collect(),
            _ => unreachable!(),
        };

        Ok(WavFile { format, samples })
    }

    /// Encodes a mono PCM sample stream as a canonical 44.1 kHz WAV file at
    /// the given bit depth.
    pub fn write_mono(samples: &[i16], bits_per_sample: u16) -> Result<Vec<u8>, WavError> {
        if !matches!(bits_per_sample, 8 | 16) {
            return Err(WavError::Unsupported(1, bits_per_sample));
        }

        let bytes_per_sample = (bits_per_sample / 8) as usize;
        let data_len = samples.len() * bytes_per_sample;
        let mut out = Vec::with_capacity(44 + data_len);

        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&((36 + data_len) as u32).to_le_bytes());
        out.extend_from_slice(b"WAVE");

        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&1u16.to_le_bytes()); // mono
        out.extend_from_slice(&super::cassette::SAMPLE_RATE.to_le_bytes());
        let byte_rate = super::cassette::SAMPLE_RATE * bytes_per_sample as u32;
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&(bytes_per_sample as u16).to_le_bytes()); // block align
        out.extend_from_slice(&bits_per_sample.to_le_bytes());

        out.extend_from_slice(b"data");
        out.extend_from_slice(&(data_len as u32).to_le_bytes());
        match bits_per_sample {
            8 => out.extend(samples.iter().map(|&s| ((s >> 8) + 128) as u8)),
            16 => {
                for &s in samples {
                    out.extend_from_slice(&s.to_le_bytes());
                }
            }
            _ => unreachable!(),
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixteen_bit_mono_round_trips() {
        let samples: Vec<i16> = vec![0, 1000, -1000, 32767, -32768];
        let bytes = WavFile::write_mono(&samples, 16).unwrap();
        let wav = WavFile::read(&bytes).unwrap();
        assert_eq!(wav.format.channels, 1);
        assert_eq!(wav.format.sample_rate, 44100);
        assert_eq!(wav.samples, samples);
    }

    #[test]
    fn eight_bit_round_trips_within_quantization() {
        let samples: Vec<i16> = vec![0, 256, -256];
        let bytes = WavFile::write_mono(&samples, 8).unwrap();
        let wav = WavFile::read(&bytes).unwrap();
        for (original, decoded) in samples.iter().zip(wav.samples.iter()) {
            assert!((original - decoded).abs() <= 256);
        }
    }

    #[test]
    fn rejects_non_riff_data() {
        assert_eq!(WavFile::read(b"not a wav file").unwrap_err(), WavError::BadHeader);
    }
}
