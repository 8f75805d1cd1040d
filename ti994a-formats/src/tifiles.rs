/*
    Copyright (C) 2024  Mark Halloran

    This file is part of ti994a, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! The TIFILES out-of-band header: a fixed 128-byte record prepended to a
//! host file to carry the TI file metadata a plain byte stream can't
//! (spec.md §6), so a disk file's descriptor fields survive being copied
//! off the emulated disk onto a host filesystem and back.
use byteorder::{BigEndian, ByteOrder};

pub const HEADER_LEN: usize = 128;
const MARKER: u8 = 0x07;
const IDENT: &[u8; 7] = b"TIFILES";

pub use crate::disk::FileFlags;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TifilesError {
    #[error("missing TIFILES marker/ident bytes")]
    NotTifiles,
    #[error("header is shorter than {HEADER_LEN} bytes")]
    Truncated,
}

#[derive(Debug, Clone)]
pub struct TifilesHeader {
    pub sector_count: u16,
    pub flags: FileFlags,
    pub records_per_sector: u8,
    pub eof_offset: u8,
    pub record_length: u8,
    /// Stored little-endian on disk, unlike every other multi-byte field
    /// in this format (spec.md §6).
    pub l3_alloc: u16,
    pub name: [u8; 10],
}

impl TifilesHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self, TifilesError> {
        if bytes.len() < HEADER_LEN {
            return Err(TifilesError::Truncated);
        }
        if bytes[0] != MARKER || &bytes[1..8] != IDENT {
            return Err(TifilesError::NotTifiles);
        }
        let mut name = [0u8; 10];
        name.copy_from_slice(&bytes[0x10..0x1A]);
        Ok(TifilesHeader {
            sector_count: BigEndian::read_u16(&bytes[8..10]),
            flags: FileFlags::from_bits_truncate(bytes[10]),
            records_per_sector: bytes[11],
            eof_offset: bytes[12],
            record_length: bytes[13],
            l3_alloc: u16::from_le_bytes([bytes[14], bytes[15]]),
            name,
        })
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0] = MARKER;
        out[1..8].copy_from_slice(IDENT);
        BigEndian::write_u16(&mut out[8..10], self.sector_count);
        out[10] = self.flags.bits();
        out[11] = self.records_per_sector;
        out[12] = self.eof_offset;
        out[13] = self.record_length;
        out[14..16].copy_from_slice(&self.l3_alloc.to_le_bytes());
        out[0x10..0x1A].copy_from_slice(&self.name);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let header = TifilesHeader {
            sector_count: 12,
            flags: FileFlags::PROGRAM,
            records_per_sector: 0,
            eof_offset: 44,
            record_length: 0,
            l3_alloc: 0x0102,
            name: *b"HELLO     ",
        };
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), HEADER_LEN);
        let parsed = TifilesHeader::parse(&bytes).unwrap();
        assert_eq!(parsed.sector_count, 12);
        assert_eq!(parsed.eof_offset, 44);
        assert_eq!(parsed.l3_alloc, 0x0102);
        assert_eq!(&parsed.name, b"HELLO     ");
    }

    #[test]
    fn l3_alloc_is_stored_little_endian() {
        let header = TifilesHeader {
            sector_count: 0,
            flags: FileFlags::empty(),
            records_per_sector: 0,
            eof_offset: 0,
            record_length: 0,
            l3_alloc: 0x0102,
            name: [0x20; 10],
        };
        let bytes = header.to_bytes();
        assert_eq!(&bytes[14..16], &[0x02, 0x01]);
    }

    #[test]
    fn rejects_missing_marker() {
        let mut bytes = [0x20u8; HEADER_LEN];
        bytes[0] = MARKER;
        assert_eq!(TifilesHeader::parse(&bytes).unwrap_err(), TifilesError::NotTifiles);
    }
}
