/*
    Copyright (C) 2024  Mark Halloran

    This file is part of ti994a, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! The FD1771 floppy disk controller. A minimal implementation that never
//! generates interrupts or errors: reads and writes of sector data always
//! "succeed" from the guest's point of view, matching spec.md §4.9/§7
//! ("FDC operations never fail; unsupported FDC sub-commands print a
//! warning and behave as no-ops").
use std::fmt;

pub const SECTOR_SIZE: usize = 256;
pub const DRIVE_COUNT: usize = 3;

bitflags::bitflags! {
    #[derive(Default)]
    pub struct Status: u8 {
        const NOT_READY     = 0x80;
        const WRITE_PROTECT = 0x40;
        const HEAD_ENGAGED  = 0x20;
        const WRITE_FAULT   = 0x20;
        const SEEK_ERROR    = 0x10;
        const CRC_ERROR     = 0x08;
        const LOST_DATA     = 0x04;
        const TRACK0        = 0x04;
        const INDEX         = 0x02;
        const DRQ           = 0x02;
        const BUSY          = 0x01;
    }
}

/// A backing drive: a sector-addressable disk image selected onto the
/// controller. The host supplies the sector geometry translation and the
/// actual storage (typically a [`crate::disk`]-style sector-dump file, but
/// the controller doesn't need to know that).
pub trait Drive {
    /// Reads `SECTOR_SIZE` bytes from the given linear sector index.
    fn read_sector(&mut self, sector: usize, buf: &mut [u8; SECTOR_SIZE]);
    /// Writes `SECTOR_SIZE` bytes to the given linear sector index.
    fn write_sector(&mut self, sector: usize, buf: &[u8; SECTOR_SIZE]);
    /// Called when this drive becomes the selected drive.
    fn select(&mut self) {}
    /// Called when this drive is deselected.
    fn deselect(&mut self) {}
}

enum Buffer {
    None,
    Sector { data: Box<[u8; SECTOR_SIZE]>, pos: usize, write: bool },
    Id { data: [u8; 6], pos: usize },
}

pub struct Fdc {
    status: Status,
    track: u8,
    sector: u8,
    data: u8,
    side: bool,
    direction_inward: bool,
    unit: usize,
    sectors_per_track: u8,
    tracks_per_side: u8,
    motor_strobe: bool,
    ignore_irq: bool,
    buffer: Buffer,
    drives: [Option<Box<dyn Drive>>; DRIVE_COUNT + 1],
}

impl fmt::Debug for Fdc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fdc")
            .field("status", &self.status)
            .field("track", &self.track)
            .field("sector", &self.sector)
            .field("unit", &self.unit)
            .field("side", &self.side)
            .finish()
    }
}

impl Fdc {
    pub fn new() -> Self {
        Fdc {
            status: Status::empty(),
            track: 0,
            sector: 0,
            data: 0,
            side: false,
            direction_inward: true,
            unit: 0,
            sectors_per_track: 9,
            tracks_per_side: 40,
            motor_strobe: false,
            ignore_irq: false,
            buffer: Buffer::None,
            drives: Default::default(),
        }
    }

    pub fn attach_drive(&mut self, unit: usize, drive: Box<dyn Drive>) {
        assert!((1..=DRIVE_COUNT).contains(&unit), "drive unit out of range");
        self.drives[unit] = Some(drive);
    }

    /// Translates `{track, sector, side}` into the linear sector index used
    /// by a sector-dump image, mirroring the TI convention that the second
    /// side's tracks run in reverse order (spec.md §4.9).
    fn linear_sector(&self) -> usize {
        let spt = self.sectors_per_track as usize;
        let tps = self.tracks_per_side as usize;
        let mut sector = self.sector as usize;
        if self.side {
            sector += spt * tps;
            sector += (tps - 1 - self.track as usize) * spt;
        } else {
            sector += self.track as usize * spt;
        }
        sector
    }

    fn step(&mut self, inward: bool) {
        if inward {
            if self.track < self.tracks_per_side {
                self.track += 1;
            }
        } else if self.track > 0 {
            self.track -= 1;
        }
    }

    /// Decodes and executes a command byte written to the command
    /// register (spec.md §4.9's table).
    fn execute_command(&mut self, data: u8) {
        self.status = Status::empty();
        match data & 0xF0 {
            0x00 => {
                self.track = 0;
                self.direction_inward = true;
                self.status |= Status::TRACK0;
            }
            0x10 => {
                self.track = self.data;
                if self.track == 0 {
                    self.status |= Status::TRACK0;
                }
            }
            0x20 | 0x30 => self.step(self.direction_inward),
            0x40 | 0x50 => {
                self.direction_inward = true;
                self.step(true);
            }
            0x60 | 0x70 => {
                self.direction_inward = false;
                self.step(false);
            }
            0x80 => {
                let sector = self.linear_sector();
                let mut data = Box::new([0u8; SECTOR_SIZE]);
                if let Some(drive) = self.drives[self.unit].as_mut() {
                    drive.read_sector(sector, &mut data);
                } else {
                    log::warn!("fdc: read sector with no drive selected");
                }
                self.buffer = Buffer::Sector { data, pos: 0, write: false };
            }
            0xA0 => {
                self.buffer = Buffer::Sector { data: Box::new([0u8; SECTOR_SIZE]), pos: 0, write: true };
            }
            0xC0 => {
                self.buffer = Buffer::Id {
                    data: [self.track, self.side as u8, self.sector, 1, 0, 0],
                    pos: 0,
                };
            }
            0xD0 => {
                // Force interrupt: no pending operation to abort in this model.
            }
            0xF0 => {
                self.buffer = Buffer::None;
                self.status |= Status::DRQ;
            }
            other => {
                log::warn!("fdc: unsupported command nibble {:#x}, treated as no-op", other >> 4);
            }
        }
    }

    /// Reads a controller register. `offset` is the even byte offset within
    /// the FDC's device-ROM window (0, 2, 4, 6 for status/track/sector/data).
    /// The data bus is inverted, per the FD1771's hardware.
    pub fn read(&mut self, offset: u16) -> u8 {
        let value = match offset {
            0 => self.status.bits(),
            2 => self.track,
            4 => self.sector,
            6 => self.pop_data(),
            _ => {
                log::warn!("fdc: read of unknown register offset {:#x}", offset);
                0
            }
        };
        !value
    }

    fn pop_data(&mut self) -> u8 {
        match &mut self.buffer {
            Buffer::Sector { data, pos, write: false } => {
                let byte = data[*pos];
                *pos += 1;
                if *pos == SECTOR_SIZE {
                    self.buffer = Buffer::None;
                }
                byte
            }
            Buffer::Id { data, pos } => {
                let byte = data[*pos];
                *pos += 1;
                if *pos == data.len() {
                    self.buffer = Buffer::None;
                }
                byte
            }
            _ => self.data,
        }
    }

    /// Writes a controller register. `offset` is the even byte offset:
    /// 8=command, 0xA=track, 0xC=sector, 0xE=data.
    pub fn write(&mut self, offset: u16, data: u8) {
        let data = !data;
        match offset {
            0x8 => self.execute_command(data),
            0xA => self.track = data,
            0xC => self.sector = data,
            0xE => self.push_data(data),
            _ => log::warn!("fdc: write to unknown register offset {:#x}", offset),
        }
    }

    fn push_data(&mut self, data: u8) {
        match &mut self.buffer {
            Buffer::Sector { data: buf, pos, write: true } => {
                buf[*pos] = data;
                *pos += 1;
                if *pos == SECTOR_SIZE {
                    let sector = self.linear_sector();
                    if let Some(drive) = self.drives[self.unit].as_mut() {
                        drive.write_sector(sector, buf);
                    } else {
                        log::warn!("fdc: write sector with no drive selected");
                    }
                    self.buffer = Buffer::None;
                }
            }
            _ => self.data = data,
        }
    }

    /// Handles a CRU output to one of the FDC's eight control bits
    /// (device-select + strobe-motor + ignore-irq + signal-head + three
    /// drive-select bits + side-select, base `>0880`).
    pub fn cru_output(&mut self, bit: u16, state: bool) {
        match bit {
            1 => self.motor_strobe = state,
            2 => self.ignore_irq = state,
            3 => {} // signal head: informational only
            4 | 5 | 6 => self.select_drive(bit - 4 + 1, state),
            7 => self.side = state,
            _ => {}
        }
    }

    fn select_drive(&mut self, unit: usize, state: bool) {
        if state {
            if self.unit != unit {
                self.unit = unit;
                if let Some(drive) = self.drives[unit].as_mut() {
                    drive.select();
                }
            }
        } else if self.unit == unit {
            if let Some(drive) = self.drives[unit].as_mut() {
                drive.deselect();
            }
            self.unit = 0;
        }
    }

    /// Handles a CRU read of one of the FDC's status bits.
    pub fn cru_get(&self, bit: u16) -> bool {
        match bit {
            0 => false, // HLD pin: not modeled
            1 | 2 | 3 => self.unit == (bit as usize),
            4 => self.motor_strobe,
            7 => self.side,
            _ => false,
        }
    }
}

impl Default for Fdc {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MemDrive {
        sectors: Vec<[u8; SECTOR_SIZE]>,
    }

    impl Drive for MemDrive {
        fn read_sector(&mut self, sector: usize, buf: &mut [u8; SECTOR_SIZE]) {
            buf.copy_from_slice(&self.sectors[sector]);
        }
        fn write_sector(&mut self, sector: usize, buf: &[u8; SECTOR_SIZE]) {
            self.sectors[sector] = *buf;
        }
    }

    #[test]
    fn restore_sets_track_zero_and_track0_flag() {
        let mut fdc = Fdc::new();
        fdc.write(0xA, !5u8); // seek target via track register (inverted on write)
        fdc.write(0x8, !0x10u8); // seek
        assert_eq!(fdc.track, 5);
        fdc.write(0x8, !0x00u8); // restore
        assert_eq!(fdc.track, 0);
        assert!(Status::from_bits_truncate(!fdc.read(0)).contains(Status::TRACK0));
    }

    #[test]
    fn read_sector_round_trips_through_drive() {
        let mut fdc = Fdc::new();
        let mut sectors = vec![[0u8; SECTOR_SIZE]; 400];
        sectors[0][10] = 0x42;
        fdc.attach_drive(1, Box::new(MemDrive { sectors }));
        fdc.select_drive(1, true);
        fdc.write(0x8, !0x80u8); // read single sector at track 0 sector 0
        for _ in 0..10 {
            fdc.read(6);
        }
        assert_eq!(!fdc.read(6), 0x42);
    }

    #[test]
    fn write_sector_flushes_to_drive_on_last_byte() {
        let mut fdc = Fdc::new();
        let sectors = vec![[0u8; SECTOR_SIZE]; 400];
        fdc.attach_drive(1, Box::new(MemDrive { sectors }));
        fdc.select_drive(1, true);
        fdc.write(0x8, !0xA0u8);
        for i in 0..SECTOR_SIZE {
            let byte = if i == 5 { 0x99 } else { 0 };
            fdc.write(0xE, !byte);
        }
        fdc.write(0x8, !0x80u8);
        for _ in 0..6 {
            fdc.read(6);
        }
        assert_eq!(!fdc.read(6), 0x99);
    }

    #[test]
    fn side1_sector_uses_reversed_track_convention() {
        let mut fdc = Fdc::new();
        fdc.side = true;
        fdc.track = 39;
        fdc.sector = 0;
        // side 1, track 39 (the "first" track on side 2) maps right after side 0.
        assert_eq!(fdc.linear_sector(), 9 * 40);
    }
}
