/*
    Copyright (C) 2024  Mark Halloran

    This file is part of ti994a, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! The cassette FM modem: bit-synchronous FSK between a stream of CRU
//! output/input bits and a 44.1 kHz PCM stream, plus the preamble/block/
//! record/file framing layered on top of it (spec.md §4.7).
//!
//! Each symbol is 730 µs. A `0` bit is carried as a half sine cycle over
//! the symbol (phase 0 to π — never crosses back through zero), a `1` bit
//! as a full cycle (phase 0 to 2π — crosses zero at the symbol's
//! midpoint). Decoding compares the sign of the first and second half of
//! each symbol window: equal sign means `0`, a sign flip means `1` — the
//! bit-exact consequence of the same zero-crossing structure spec.md §4.7
//! describes.

pub const SAMPLE_RATE: u32 = 44100;
pub const SYMBOL_SECONDS: f64 = 730e-6;
pub const CASSETTE_AMPLITUDE: i16 = 8000;

/// How many PCM samples a single 730 µs symbol occupies at 44.1 kHz.
pub fn samples_per_symbol() -> usize {
    (SAMPLE_RATE as f64 * SYMBOL_SECONDS).round() as usize
}

/// Modulates a bit stream (MSB first within each byte, as produced by
/// [`bytes_to_bits`]) into a PCM sample stream.
pub fn encode_bits(bits: &[bool]) -> Vec<i16> {
    let n = samples_per_symbol();
    let mut samples = Vec::with_capacity(bits.len() * n);
    for &bit in bits {
        let span = if bit { 2.0 * std::f64::consts::PI } else { std::f64::consts::PI };
        let step = span / n as f64;
        for i in 0..n {
            let value = CASSETTE_AMPLITUDE as f64 * (i as f64 * step).sin();
            samples.push(value.round() as i16);
        }
    }
    samples
}

/// Demodulates a PCM sample stream back into a bit stream, one bit per
/// symbol-width chunk. A trailing partial chunk is ignored.
pub fn decode_bits(samples: &[i16]) -> Vec<bool> {
    let n = samples_per_symbol();
    let half = n / 2;
    samples
        .chunks_exact(n)
        .map(|chunk| {
            let first: i64 = chunk[..half].iter().map(|&s| s as i64).sum();
            let second: i64 = chunk[half..].iter().map(|&s| s as i64).sum();
            first.signum() != second.signum() && !(first == 0 && second == 0)
        })
        .collect()
}

pub fn bytes_to_bits(bytes: &[u8]) -> Vec<bool> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for i in (0..8).rev() {
            bits.push(byte & (1 << i) != 0);
        }
    }
    bits
}

pub fn bits_to_bytes(bits: &[bool]) -> Vec<u8> {
    bits.chunks(8)
        .filter(|chunk| chunk.len() == 8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | b as u8))
        .collect()
}

pub const BLOCK_DATA_LEN: usize = 64;
pub const PREAMBLE_BITS: usize = 6144;

fn checksum(data: &[u8; BLOCK_DATA_LEN]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// One 73-byte on-wire block: 8 sync zero bytes, a `0xFF` mark, 64 data
/// bytes and a checksum.
fn encode_block(data: &[u8; BLOCK_DATA_LEN]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + 1 + BLOCK_DATA_LEN + 1);
    out.extend(std::iter::repeat(0u8).take(8));
    out.push(0xFF);
    out.extend_from_slice(data);
    out.push(checksum(data));
    out
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CassetteError {
    #[error("record is unrecoverable: both block copies have a bad checksum")]
    Unrecoverable,
    #[error("block is misaligned: missing 0xFF mark")]
    Misaligned,
}

/// Encodes a byte payload as a cassette *file*: a `{0xFF, N, N}` header
/// followed by `N` records, each record being two identical copies of the
/// data split into 64-byte blocks, preceded by the fixed 6144-bit silence
/// preamble. `data` is padded with zeros to a multiple of 64 bytes.
pub fn encode_file(data: &[u8]) -> Vec<bool> {
    let record_count = (data.len() + BLOCK_DATA_LEN - 1) / BLOCK_DATA_LEN;
    let mut bytes = Vec::new();
    bytes.push(0xFF);
    bytes.push(record_count as u8);
    bytes.push(record_count as u8);

    for i in 0..record_count {
        let mut block = [0u8; BLOCK_DATA_LEN];
        let start = i * BLOCK_DATA_LEN;
        let end = (start + BLOCK_DATA_LEN).min(data.len());
        block[..end - start].copy_from_slice(&data[start..end]);
        let encoded = encode_block(&block);
        bytes.extend_from_slice(&encoded);
        bytes.extend_from_slice(&encoded);
    }

    let mut bits = vec![false; PREAMBLE_BITS];
    bits.extend(bytes_to_bits(&bytes));
    bits
}

/// Decodes a cassette file's bit stream back into its data payload,
/// substituting a bad block copy with its good twin and failing the
/// record only when both copies have bad checksums.
pub fn decode_file(bits: &[bool]) -> Result<Vec<u8>, CassetteError> {
    let data_bits: Vec<bool> = bits.iter().skip_while(|&&b| !b).cloned().collect();
    let bytes = bits_to_bytes(&data_bits);
    if bytes.len() < 3 || bytes[0] != 0xFF {
        return Err(CassetteError::Misaligned);
    }
    let record_count = bytes[1] as usize;
    let block_wire_len = 8 + 1 + BLOCK_DATA_LEN + 1;
    let mut out = Vec::with_capacity(record_count * BLOCK_DATA_LEN);
    let mut cursor = 3;

    for _ in 0..record_count {
        let copy1 = read_block(&bytes, cursor)?;
        let copy2 = read_block(&bytes, cursor + block_wire_len)?;
        cursor += block_wire_len * 2;

        let sum1_ok = checksum(&copy1.0) == copy1.1;
        let sum2_ok = checksum(&copy2.0) == copy2.1;
        let data = match (sum1_ok, sum2_ok) {
            (true, _) => copy1.0,
            (false, true) => copy2.0,
            (false, false) => return Err(CassetteError::Unrecoverable),
        };
        out.extend_from_slice(&data);
    }

    Ok(out)
}

fn read_block(bytes: &[u8], offset: usize) -> Result<([u8; BLOCK_DATA_LEN], u8), CassetteError> {
    let mark = *bytes.get(offset + 8).ok_or(CassetteError::Misaligned)?;
    if mark != 0xFF {
        return Err(CassetteError::Misaligned);
    }
    let mut data = [0u8; BLOCK_DATA_LEN];
    data.copy_from_slice(&bytes[offset + 9..offset + 9 + BLOCK_DATA_LEN]);
    let checksum = bytes[offset + 9 + BLOCK_DATA_LEN];
    Ok((data, checksum))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_round_trips_through_pcm() {
        let bits = vec![false, true, true, false, false, true];
        let pcm = encode_bits(&bits);
        assert_eq!(decode_bits(&pcm), bits);
    }

    #[test]
    fn byte_bit_conversion_round_trips() {
        let bytes = vec![0x00u8, 0xFF, 0x5A, 0xA5];
        assert_eq!(bits_to_bytes(&bytes_to_bits(&bytes)), bytes);
    }

    #[test]
    fn cassette_file_round_trips_through_pcm() {
        let payload: Vec<u8> = (0..128u16).map(|v| v as u8).collect();
        let bits = encode_file(&payload);
        let pcm = encode_bits(&bits);
        let decoded_bits = decode_bits(&pcm);
        let recovered = decode_file(&decoded_bits).unwrap();
        assert_eq!(recovered, payload);
    }

    #[test]
    fn bad_first_copy_is_substituted_from_good_second_copy() {
        let payload = vec![0xAAu8; 64];
        let mut bytes = Vec::new();
        bytes.push(0xFF);
        bytes.push(1);
        bytes.push(1);
        let mut block = [0u8; BLOCK_DATA_LEN];
        block.copy_from_slice(&payload);
        let good = encode_block(&block);
        let mut corrupt = good.clone();
        corrupt[9] ^= 0xFF; // flip a data byte, leaving the checksum stale
        bytes.extend_from_slice(&corrupt);
        bytes.extend_from_slice(&good);
        let bits = bytes_to_bits(&bytes);
        let recovered = decode_file(&bits).unwrap();
        assert_eq!(recovered, payload);
    }

    #[test]
    fn both_copies_bad_is_unrecoverable() {
        let mut bytes = vec![0xFFu8, 1, 1];
        let mut block = encode_block(&[0u8; BLOCK_DATA_LEN]);
        block[9] ^= 0xFF;
        bytes.extend_from_slice(&block);
        bytes.extend_from_slice(&block);
        let bits = bytes_to_bits(&bytes);
        assert_eq!(decode_file(&bits), Err(CassetteError::Unrecoverable));
    }
}
