/*
    Copyright (C) 2024  Mark Halloran

    This file is part of ti994a, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! The sector-dump disk volume format: a flat array of 256-byte sectors
//! holding a volume header (sector 0), a directory of file-header sector
//! pointers (sector 1), and one file-header-plus-chain sector per file
//! (spec.md §4.10).
use std::fmt;

use byteorder::{BigEndian, ByteOrder};

pub const SECTOR_SIZE: usize = 256;
pub const VOLUME_HEADER_SECTOR: u16 = 0;
pub const DIRECTORY_SECTOR: u16 = 1;
pub const FIRST_DIRECTORY_ENTRY_SECTOR: u16 = 2;
pub const FIRST_DATA_SECTOR: u16 = 34;
/// The directory sector holds up to `SECTOR_SIZE / 2` big-endian sector
/// pointers, one per file, terminated by a zero entry — so at most this
/// many files fit on a volume.
pub const MAX_DIRECTORY_ENTRIES: usize = SECTOR_SIZE / 2 - 1;
/// The original's chain decoder only ever walks the first 23 of a file
/// header's chain slots even though the header reserves room for 76
/// (`// TODO why 23?` in the source this was ported from) — ported as-is,
/// since every disk image in the wild was written by code with the same
/// limit.
pub const MAX_CHAINS: usize = 23;

/// Translates a host filename into the 10-byte space-padded TI name
/// field: uppercased, with `.` swapped for `/` (spec.md §4.8's name
/// codec — TI filenames can't contain `/`, DOS/Unix paths can't
/// contain `.` as a plain character the way TI subprogram names use it).
/// Truncates to 10 bytes if the translated name is longer.
pub fn host_name_to_ti(name: &str) -> [u8; 10] {
    let mut ti = [0x20u8; 10];
    for (dst, ch) in ti.iter_mut().zip(name.chars()) {
        *dst = match ch.to_ascii_uppercase() {
            '.' => b'/',
            c => c as u8,
        };
    }
    ti
}

/// Inverse of [`host_name_to_ti`]: swaps `/` back to `.` and trims the
/// trailing space padding.
pub fn ti_name_to_host(name: &[u8; 10]) -> String {
    let translated: String = name.iter().map(|&b| if b == b'/' { '.' } else { b as char }).collect();
    translated.trim_end().to_string()
}

bitflags::bitflags! {
    pub struct FileFlags: u8 {
        const VARIABLE  = 0x80;
        const EMULATE   = 0x20;
        const MODIFIED  = 0x10;
        const WRITE_PROTECT = 0x08;
        const BINARY    = 0x02;
        const PROGRAM   = 0x01;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiskError {
    #[error("disk is full")]
    Full,
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("directory is full")]
    DirectoryFull,
    #[error("sector {0} is out of range for this volume")]
    SectorOutOfRange(u16),
    #[error("file header's chain table is full ({MAX_CHAINS} entries)")]
    ChainTableFull,
}

/// The fixed 256-byte volume header occupying sector 0.
#[derive(Debug, Clone)]
pub struct VolumeHeader {
    pub name: [u8; 10],
    pub sectors: u16,
    pub sectors_per_track: u8,
    pub protected: bool,
    pub tracks: u8,
    pub sides: u8,
    pub density: u8,
}

impl VolumeHeader {
    pub fn new(name: &str, sectors_per_track: u8, tracks: u8, sides: u8, density: u8) -> Self {
        let mut tiname = [0x20u8; 10];
        for (dst, src) in tiname.iter_mut().zip(name.as_bytes()) {
            *dst = *src;
        }
        VolumeHeader {
            name: tiname,
            sectors: sectors_per_track as u16 * tracks as u16 * sides as u16,
            sectors_per_track,
            protected: false,
            tracks,
            sides,
            density,
        }
    }

    fn parse(sector: &[u8; SECTOR_SIZE]) -> Self {
        let mut name = [0u8; 10];
        name.copy_from_slice(&sector[0..10]);
        VolumeHeader {
            name,
            sectors: BigEndian::read_u16(&sector[10..12]),
            sectors_per_track: sector[12],
            protected: sector[16] == b'P',
            tracks: sector[17],
            sides: sector[18],
            density: sector[19],
        }
    }

    fn write_into(&self, sector: &mut [u8; SECTOR_SIZE]) {
        sector[0..10].copy_from_slice(&self.name);
        BigEndian::write_u16(&mut sector[10..12], self.sectors);
        sector[12] = self.sectors_per_track;
        sector[13..16].copy_from_slice(b"DSK");
        sector[16] = if self.protected { b'P' } else { b' ' };
        sector[17] = self.tracks;
        sector[18] = self.sides;
        sector[19] = self.density;
    }
}

/// A decoded file-header sector: the TI filename, access flags, record
/// layout and the file's allocated-sector chains.
#[derive(Debug, Clone)]
pub struct FileHeader {
    pub name: [u8; 10],
    pub flags: FileFlags,
    pub records_per_sector: u8,
    pub sector_count: u16,
    pub eof_offset: u8,
    pub record_length: u8,
    pub chains: Vec<(u16, u16)>,
}

impl FileHeader {
    /// Decodes one 3-byte nibble-interleaved chain triple into
    /// `(start_sector, sector_count - 1)`, the exact bit layout the
    /// original's `decodeOne`/`encodeOne` use.
    fn decode_chain(bytes: [u8; 3]) -> (u16, u16) {
        let p1 = ((bytes[1] as u16 & 0xF) << 8) | bytes[0] as u16;
        let p2 = (bytes[1] as u16 >> 4) | ((bytes[2] as u16) << 4);
        (p1, p2)
    }

    fn encode_chain(start: u16, len: u16) -> [u8; 3] {
        [
            (start & 0xFF) as u8,
            ((start >> 8) as u8 & 0x0F) | (((len & 0x0F) as u8) << 4),
            (len >> 4) as u8,
        ]
    }

    fn parse(sector: &[u8; SECTOR_SIZE]) -> Self {
        let mut name = [0u8; 10];
        name.copy_from_slice(&sector[0..10]);
        let flags = FileFlags::from_bits_truncate(sector[12]);
        let records_per_sector = sector[13];
        let sector_count = BigEndian::read_u16(&sector[14..16]);
        let eof_offset = sector[16];
        let record_length = sector[17];
        let mut chains = Vec::new();
        for i in 0..MAX_CHAINS {
            let base = 28 + i * 3;
            let triple = [sector[base], sector[base + 1], sector[base + 2]];
            if triple == [0, 0, 0] {
                continue;
            }
            let (start, len) = Self::decode_chain(triple);
            chains.push((start, start + len));
        }
        FileHeader { name, flags, records_per_sector, sector_count, eof_offset, record_length, chains }
    }

    fn write_into(&self, sector: &mut [u8; SECTOR_SIZE]) {
        sector[0..10].copy_from_slice(&self.name);
        sector[12] = self.flags.bits();
        sector[13] = self.records_per_sector;
        BigEndian::write_u16(&mut sector[14..16], self.sector_count);
        sector[16] = self.eof_offset;
        sector[17] = self.record_length;
        for i in 0..MAX_CHAINS {
            let base = 28 + i * 3;
            let triple = if let Some(&(start, end)) = self.chains.get(i) {
                Self::encode_chain(start, end - start)
            } else {
                [0, 0, 0]
            };
            sector[base..base + 3].copy_from_slice(&triple);
        }
    }

    /// Total data length in bytes, derived from the sector count and the
    /// end-of-file offset within the last sector (0 means the last sector
    /// is entirely used).
    pub fn data_len(&self) -> usize {
        let mut len = self.sector_count as usize * SECTOR_SIZE;
        if self.eof_offset != 0 {
            len -= SECTOR_SIZE - self.eof_offset as usize;
        }
        len
    }

    /// The file's data sectors in logical order: each chain range expanded
    /// and concatenated, the walk order `read`/`write` index into.
    fn sector_list(&self) -> Vec<u16> {
        self.chains.iter().flat_map(|&(start, end)| start..=end).collect()
    }
}

/// An in-memory sector-addressable disk image: the volume header, the
/// directory, and every sector of file data and file-header metadata.
pub struct Volume {
    header: VolumeHeader,
    sectors: Vec<[u8; SECTOR_SIZE]>,
    bitmap_base: usize,
}

impl fmt::Debug for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Volume")
            .field("name", &String::from_utf8_lossy(&self.header.name))
            .field("sectors", &self.sectors.len())
            .finish()
    }
}

impl Volume {
    /// Formats a blank volume with an empty directory.
    pub fn format(header: VolumeHeader) -> Self {
        let n = header.sectors as usize;
        let mut vol = Volume { header, sectors: vec![[0u8; SECTOR_SIZE]; n], bitmap_base: 0x38 };
        vol.mark_allocated(VOLUME_HEADER_SECTOR);
        vol.mark_allocated(DIRECTORY_SECTOR);
        vol.sync_header();
        vol
    }

    /// Parses a raw sector image already loaded by the host (e.g. from a
    /// `.dsk` file).
    pub fn from_sectors(sectors: Vec<[u8; SECTOR_SIZE]>) -> Self {
        let header = VolumeHeader::parse(&sectors[VOLUME_HEADER_SECTOR as usize]);
        Volume { header, sectors, bitmap_base: 0x38 }
    }

    pub fn header(&self) -> &VolumeHeader {
        &self.header
    }

    pub fn sector_count(&self) -> usize {
        self.sectors.len()
    }

    pub fn read_sector(&self, index: usize) -> &[u8; SECTOR_SIZE] {
        &self.sectors[index]
    }

    pub fn write_sector(&mut self, index: usize, data: [u8; SECTOR_SIZE]) {
        self.sectors[index] = data;
    }

    fn is_allocated(&self, sector: usize) -> bool {
        let byte = self.bitmap_base + sector / 8;
        let bit = sector % 8;
        self.sectors[VOLUME_HEADER_SECTOR as usize][byte] & (1 << bit) != 0
    }

    fn mark_allocated(&mut self, sector: u16) {
        let sector = sector as usize;
        let byte = self.bitmap_base + sector / 8;
        let bit = sector % 8;
        self.sectors[VOLUME_HEADER_SECTOR as usize][byte] |= 1 << bit;
    }

    fn mark_free(&mut self, sector: u16) {
        let sector = sector as usize;
        let byte = self.bitmap_base + sector / 8;
        let bit = sector % 8;
        self.sectors[VOLUME_HEADER_SECTOR as usize][byte] &= !(1 << bit);
    }

    fn find_free_sector(&self, start: usize) -> Option<u16> {
        (start..self.sectors.len()).find(|&s| !self.is_allocated(s)).map(|s| s as u16)
    }

    fn sync_header(&mut self) {
        self.header.write_into(&mut self.sectors[VOLUME_HEADER_SECTOR as usize]);
    }

    /// Reads the directory: the file-header sector for each non-zero entry
    /// in sector 1, in on-disk order (already alphabetic, per spec.md
    /// §4.10's directory-insertion invariant).
    pub fn directory(&self) -> Vec<(u16, FileHeader)> {
        let dir = &self.sectors[DIRECTORY_SECTOR as usize];
        let mut entries = Vec::new();
        for i in 0..MAX_DIRECTORY_ENTRIES {
            let sector = BigEndian::read_u16(&dir[i * 2..i * 2 + 2]);
            if sector == 0 {
                break;
            }
            entries.push((sector, FileHeader::parse(&self.sectors[sector as usize])));
        }
        entries
    }

    fn write_directory(&mut self, entries: &[u16]) {
        let mut dir = [0u8; SECTOR_SIZE];
        for (i, &sector) in entries.iter().enumerate() {
            BigEndian::write_u16(&mut dir[i * 2..i * 2 + 2], sector);
        }
        self.sectors[DIRECTORY_SECTOR as usize] = dir;
    }

    /// Creates a new, empty file named `name` with the given flags/record
    /// layout, allocating its header sector and inserting it into the
    /// directory in alphabetic order.
    pub fn create_file(
        &mut self,
        name: [u8; 10],
        flags: FileFlags,
        records_per_sector: u8,
        record_length: u8,
    ) -> Result<u16, DiskError> {
        let header_sector = self
            .find_free_sector(FIRST_DIRECTORY_ENTRY_SECTOR as usize)
            .ok_or(DiskError::Full)?;
        let mut entries: Vec<u16> = self.directory().into_iter().map(|(s, _)| s).collect();
        if entries.len() >= MAX_DIRECTORY_ENTRIES {
            return Err(DiskError::DirectoryFull);
        }
        let position = entries
            .iter()
            .position(|&s| self.file_name(s) > name)
            .unwrap_or(entries.len());
        entries.insert(position, header_sector);

        self.mark_allocated(header_sector);
        let file = FileHeader {
            name,
            flags,
            records_per_sector,
            sector_count: 0,
            eof_offset: 0,
            record_length,
            chains: Vec::new(),
        };
        let mut sector = [0u8; SECTOR_SIZE];
        file.write_into(&mut sector);
        self.sectors[header_sector as usize] = sector;
        self.write_directory(&entries);
        Ok(header_sector)
    }

    fn file_name(&self, header_sector: u16) -> [u8; 10] {
        FileHeader::parse(&self.sectors[header_sector as usize]).name
    }

    pub fn find_file(&self, name: &[u8; 10]) -> Option<(u16, FileHeader)> {
        self.directory().into_iter().find(|(_, f)| &f.name == name)
    }

    /// Reads `len` bytes starting at byte offset `off` into the file,
    /// walking the chain table rather than the whole file (spec.md §4.8's
    /// `File read(off, len)`): skip whole sectors while `off` is past the
    /// current one, read from the current sector at `off % 256`, cap the
    /// read at the end of the current sector, and advance — repeating
    /// until `len` bytes have been collected or the file's data ends.
    pub fn read(&self, header_sector: u16, off: usize, len: usize) -> Vec<u8> {
        let file = FileHeader::parse(&self.sectors[header_sector as usize]);
        let data_len = file.data_len();
        let end = (off.saturating_add(len)).min(data_len);
        if off >= end {
            return Vec::new();
        }
        let sector_list = file.sector_list();
        let mut out = Vec::with_capacity(end - off);
        let mut pos = off;
        while pos < end {
            let sector = sector_list[pos / SECTOR_SIZE];
            let sector_off = pos % SECTOR_SIZE;
            let take = (SECTOR_SIZE - sector_off).min(end - pos);
            out.extend_from_slice(&self.sectors[sector as usize][sector_off..sector_off + take]);
            pos += take;
        }
        out
    }

    /// Writes `data` starting at byte offset `off` into the file (spec.md
    /// §4.8's `File write(off, len)`), walking the same way `read` does.
    /// When the write runs past the file's current last sector, a sector
    /// is allocated starting the search from sector 34: if it lands
    /// contiguous with the last chain's end, that chain is extended in
    /// place; otherwise a new chain entry is appended. The descriptor's
    /// sector count and EOF offset are updated and the descriptor (and,
    /// via the bitmap edits already applied in place, the volume header)
    /// are flushed before returning.
    pub fn write(&mut self, header_sector: u16, off: usize, data: &[u8]) -> Result<(), DiskError> {
        if data.is_empty() {
            return Ok(());
        }
        let mut file = FileHeader::parse(&self.sectors[header_sector as usize]);
        let mut sector_list = file.sector_list();
        let old_len = file.data_len();
        let end = off + data.len();

        while sector_list.len() * SECTOR_SIZE < end {
            let contiguous = file.chains.last().map(|&(_, chain_end)| chain_end + 1);
            let sector = match contiguous {
                Some(candidate) if !self.is_allocated(candidate as usize) => candidate,
                _ => self.find_free_sector(FIRST_DATA_SECTOR as usize).ok_or(DiskError::Full)?,
            };
            self.mark_allocated(sector);
            sector_list.push(sector);
            match file.chains.last_mut() {
                Some((_, chain_end)) if sector == *chain_end + 1 => *chain_end = sector,
                _ => {
                    if file.chains.len() == MAX_CHAINS {
                        return Err(DiskError::ChainTableFull);
                    }
                    file.chains.push((sector, sector));
                }
            }
            file.sector_count += 1;
        }

        let mut pos = off;
        let mut src = 0usize;
        while src < data.len() {
            let sector = sector_list[pos / SECTOR_SIZE];
            let sector_off = pos % SECTOR_SIZE;
            let take = (SECTOR_SIZE - sector_off).min(data.len() - src);
            self.sectors[sector as usize][sector_off..sector_off + take]
                .copy_from_slice(&data[src..src + take]);
            pos += take;
            src += take;
        }

        let new_len = old_len.max(end);
        file.eof_offset = (new_len % SECTOR_SIZE) as u8;

        let mut sector = self.sectors[header_sector as usize];
        file.write_into(&mut sector);
        self.sectors[header_sector as usize] = sector;
        self.sync_header();
        Ok(())
    }

    /// Reads a file's full contents by walking its sector chains. A
    /// whole-file convenience atop [`Self::read`] (bulk import/export
    /// tooling reads the entire file at once far more often than a
    /// positional record access does).
    pub fn read_file(&self, header_sector: u16) -> Vec<u8> {
        let file = FileHeader::parse(&self.sectors[header_sector as usize]);
        self.read(header_sector, 0, file.data_len())
    }

    /// Overwrites a file's contents wholesale: frees its existing chains
    /// and reallocates from scratch, rather than extending in place the
    /// way [`Self::write`] does. Used by bulk import (loading a host file
    /// onto a fresh directory entry), where there is no prior content to
    /// preserve and incremental chain growth would be pure overhead. The
    /// file must already exist (created via [`Self::create_file`]).
    pub fn write_file(&mut self, header_sector: u16, data: &[u8]) -> Result<(), DiskError> {
        let mut file = FileHeader::parse(&self.sectors[header_sector as usize]);
        for (start, end) in file.chains.drain(..).collect::<Vec<_>>() {
            for sector in start..=end {
                self.mark_free(sector);
            }
        }

        let sectors_needed = (data.len() + SECTOR_SIZE - 1) / SECTOR_SIZE;
        let mut remaining = sectors_needed;
        let mut cursor = FIRST_DATA_SECTOR as usize;
        let mut chains = Vec::new();
        let mut written = 0usize;
        while remaining > 0 {
            let start = self.find_free_sector(cursor).ok_or(DiskError::Full)? as usize;
            let mut run_len = 0usize;
            let mut s = start;
            while remaining > 0 && !self.is_allocated(s) {
                self.mark_allocated(s as u16);
                remaining -= 1;
                run_len += 1;
                s += 1;
                if remaining == 0 {
                    break;
                }
            }
            for sector in start..start + run_len {
                let begin = written;
                let end = (written + SECTOR_SIZE).min(data.len());
                let mut buf = [0u8; SECTOR_SIZE];
                if begin < data.len() {
                    buf[..end - begin].copy_from_slice(&data[begin..end]);
                }
                self.sectors[sector] = buf;
                written = end;
            }
            chains.push((start as u16, (start + run_len - 1) as u16));
            cursor = start + run_len;
        }

        file.chains = chains;
        file.sector_count = sectors_needed as u16;
        file.eof_offset = (data.len() % SECTOR_SIZE) as u8;
        let mut sector = self.sectors[header_sector as usize];
        file.write_into(&mut sector);
        self.sectors[header_sector as usize] = sector;
        Ok(())
    }

    /// Removes a file from the directory and frees its sectors.
    pub fn unlink_file(&mut self, header_sector: u16) -> Result<(), DiskError> {
        let file = FileHeader::parse(&self.sectors[header_sector as usize]);
        for (start, end) in &file.chains {
            for sector in *start..=*end {
                self.mark_free(sector);
            }
        }
        self.mark_free(header_sector);
        let entries: Vec<u16> = self
            .directory()
            .into_iter()
            .map(|(s, _)| s)
            .filter(|&s| s != header_sector)
            .collect();
        self.write_directory(&entries);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ti_name(name: &str) -> [u8; 10] {
        let mut buf = [0x20u8; 10];
        for (dst, src) in buf.iter_mut().zip(name.as_bytes()) {
            *dst = *src;
        }
        buf
    }

    #[test]
    fn host_name_codec_swaps_dot_and_uppercases() {
        let ti = host_name_to_ti("game.d");
        assert_eq!(&ti, b"GAME/D    ");
        assert_eq!(ti_name_to_host(&ti), "GAME.D");
    }

    #[test]
    fn host_name_codec_round_trips_a_name_already_at_ten_bytes() {
        let ti = host_name_to_ti("DISKUTIL1");
        assert_eq!(ti_name_to_host(&ti), "DISKUTIL1");
    }

    #[test]
    fn chain_codec_round_trips_example_values() {
        let bytes = FileHeader::encode_chain(0x0123, 0x04);
        let (start, len) = FileHeader::decode_chain(bytes);
        assert_eq!(start, 0x0123);
        assert_eq!(len, 0x04);
    }

    #[test]
    fn create_write_read_round_trip() {
        let header = VolumeHeader::new("TEST", 9, 40, 1, 1);
        let mut vol = Volume::format(header);
        let sector = vol
            .create_file(ti_name("HELLO"), FileFlags::PROGRAM, 0, 0)
            .unwrap();
        let payload = vec![0xAAu8; 300];
        vol.write_file(sector, &payload).unwrap();
        let read_back = vol.read_file(sector);
        assert_eq!(read_back, payload);
    }

    #[test]
    fn positional_read_honors_offset_and_cap() {
        let header = VolumeHeader::new("TEST", 9, 40, 1, 1);
        let mut vol = Volume::format(header);
        let sector = vol.create_file(ti_name("HELLO"), FileFlags::PROGRAM, 0, 0).unwrap();
        let payload: Vec<u8> = (0..300u16).map(|n| n as u8).collect();
        vol.write(sector, 0, &payload).unwrap();
        assert_eq!(vol.read(sector, 250, 20), payload[250..270]);
        // a request past EOF is capped at the file's actual length.
        assert_eq!(vol.read(sector, 290, 100), payload[290..300]);
        assert!(vol.read(sector, 300, 10).is_empty());
    }

    #[test]
    fn positional_write_extends_the_chain_in_place_when_contiguous() {
        let header = VolumeHeader::new("TEST", 9, 40, 1, 1);
        let mut vol = Volume::format(header);
        let sector = vol.create_file(ti_name("HELLO"), FileFlags::PROGRAM, 0, 0).unwrap();
        vol.write(sector, 0, &[0xAAu8; SECTOR_SIZE]).unwrap();
        vol.write(sector, SECTOR_SIZE, &[0xBBu8; 10]).unwrap();

        let file = vol.directory().into_iter().find(|(s, _)| *s == sector).unwrap().1;
        assert_eq!(file.chains.len(), 1, "contiguous growth should extend one chain, not add another");
        assert_eq!(file.sector_count, 2);

        let mut expected = vec![0xAAu8; SECTOR_SIZE];
        expected.extend_from_slice(&[0xBBu8; 10]);
        assert_eq!(vol.read(sector, 0, expected.len()), expected);
    }

    #[test]
    fn positional_write_starts_a_new_chain_when_the_next_sector_is_taken() {
        let header = VolumeHeader::new("TEST", 9, 40, 1, 1);
        let mut vol = Volume::format(header);
        let a = vol.create_file(ti_name("A"), FileFlags::PROGRAM, 0, 0).unwrap();
        vol.write(a, 0, &[0x11u8; SECTOR_SIZE]).unwrap(); // claims sector 34

        let b = vol.create_file(ti_name("B"), FileFlags::PROGRAM, 0, 0).unwrap();
        vol.write(b, 0, &[0x22u8; SECTOR_SIZE]).unwrap(); // claims sector 35, blocking A's extension

        vol.write(a, SECTOR_SIZE, &[0x33u8; 10]).unwrap();
        let file = vol.directory().into_iter().find(|(s, _)| *s == a).unwrap().1;
        assert_eq!(file.chains.len(), 2, "sector 35 is taken, so the growth must start a new chain");

        let mut expected = vec![0x11u8; SECTOR_SIZE];
        expected.extend_from_slice(&[0x33u8; 10]);
        assert_eq!(vol.read(a, 0, expected.len()), expected);
    }

    #[test]
    fn directory_stays_alphabetically_ordered() {
        let header = VolumeHeader::new("TEST", 9, 40, 1, 1);
        let mut vol = Volume::format(header);
        vol.create_file(ti_name("ZEBRA"), FileFlags::PROGRAM, 0, 0).unwrap();
        vol.create_file(ti_name("APPLE"), FileFlags::PROGRAM, 0, 0).unwrap();
        let names: Vec<_> = vol.directory().into_iter().map(|(_, f)| f.name).collect();
        assert_eq!(names, vec![ti_name("APPLE"), ti_name("ZEBRA")]);
    }

    #[test]
    fn unlink_frees_sectors_for_reuse() {
        let header = VolumeHeader::new("TEST", 9, 40, 1, 1);
        let mut vol = Volume::format(header);
        let sector = vol.create_file(ti_name("A"), FileFlags::PROGRAM, 0, 0).unwrap();
        vol.write_file(sector, &[1u8; 512]).unwrap();
        vol.unlink_file(sector).unwrap();
        assert!(vol.find_file(&ti_name("A")).is_none());
        assert!(!vol.is_allocated(sector as usize));
    }

    #[test]
    fn random_sized_payloads_round_trip_through_a_file() {
        use rand::rngs::SmallRng;
        use rand::{RngCore, SeedableRng};

        let mut rng = SmallRng::seed_from_u64(0xD15C);
        let header = VolumeHeader::new("TEST", 9, 40, 1, 1);
        let mut vol = Volume::format(header);
        for len in [1usize, 37, 256, 257, 900] {
            let mut payload = vec![0u8; len];
            rng.fill_bytes(&mut payload);
            let name = format!("F{len}");
            let sector = vol.create_file(ti_name(&name), FileFlags::PROGRAM, 0, 0).unwrap();
            vol.write_file(sector, &payload).unwrap();
            assert_eq!(vol.read_file(sector), payload, "payload length {len}");
            vol.unlink_file(sector).unwrap();
        }
    }
}
