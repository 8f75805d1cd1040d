/*
    Copyright (C) 2024  Mark Halloran

    This file is part of ti994a, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! The three-level hierarchical memory/CRU decoder that ties the console
//! ROM, 32 KiB of expansion RAM, a bank-switched cartridge slot, the
//! scratchpad, and the sound/VDP/speech/GROM ports together behind the
//! [`ti994a_core::memory::Bus`] and [`crate::cpu::SystemBus`] contracts
//! `Cpu::step` runs against.
//!
//! Level 1 splits the 64 KiB address space into eight 8 KiB slots. Two of
//! those slots carry a level-2 table of their own: `6000-7FFF` (two 4 KiB
//! cartridge banks) and `8000-9FFF` (eight 1 KiB MMIO windows). A leaf
//! handler only ever sees the address masked down to its own small window,
//! never the absolute CPU address — so the device ports below take a
//! small relative `offset`, matching [`crate::grom`], [`crate::sound`] and
//! [`crate::vdp`].

use log::warn;
use ti994a_core::chip::HaltReason;
use ti994a_core::memory::Bus;
use ti994a_peripherals::fdc::Fdc;
use ti994a_peripherals::keyboard::{Keyboard, ALPHA_LOCK_BIT, COLUMN_SELECT_BASE, ROW_BASE_BIT};
use ti994a_peripherals::tms9901::{Tms9901, IRQ_TIMER, IRQ_VDP};

use crate::cpu::SystemBus;
use crate::grom::Grom;
use crate::sound::Sound;
use crate::vdp::Vdp;

const CONSOLE_ROM_SIZE: usize = 0x2000;
const RAM_SIZE: usize = 0x8000;
const DEVICE_ROM_SIZE: usize = 0x2000;
const CARTRIDGE_BANK_SIZE: usize = 0x2000;
const MINIMEM_SIZE: usize = 0x1000;
const SCRATCH_SIZE: usize = 0x100;

/// CRU bit index (base `>0880`, divided by two) the floppy controller's
/// eight control lines are wired to.
const FDC_CRU_BASE: u16 = 0x0880;
/// CRU bit range device-ROM select is wired across (base `>1000`-`>1F00`,
/// divided by two is `>0800`-`>0F80`).
const DEVICE_SELECT_LOW: u16 = 0x0800;
const DEVICE_SELECT_HIGH: u16 = 0x0F80;

/// The three-level memory decoder plus every device it routes port
/// accesses to: the CRU fabric, the TMS9901, the keyboard matrix, the
/// floppy controller and the GROM/sound/VDP ports.
pub struct MemoryMap {
    console_rom: Vec<u8>,
    ram: Box<[u8; RAM_SIZE]>,
    device_roms: Vec<[u8; DEVICE_ROM_SIZE]>,
    device_selected: u8,
    device_rom_active: bool,
    cartridge_banks: Vec<[u8; CARTRIDGE_BANK_SIZE]>,
    cartridge_bank: usize,
    minimem: Option<Box<[u8; MINIMEM_SIZE]>>,
    scratch: [u8; SCRATCH_SIZE],
    timer_pending: bool,

    pub tms9901: Tms9901,
    pub keyboard: Keyboard,
    pub fdc: Fdc,
    pub grom: Grom,
    pub sound: Sound,
    pub vdp: Vdp,

    halt: Option<HaltReason>,
}

impl MemoryMap {
    pub fn new() -> Self {
        MemoryMap {
            console_rom: vec![0; CONSOLE_ROM_SIZE],
            ram: Box::new([0; RAM_SIZE]),
            device_roms: vec![[0; DEVICE_ROM_SIZE]; 16],
            device_selected: 0,
            device_rom_active: false,
            cartridge_banks: vec![[0xFF; CARTRIDGE_BANK_SIZE]],
            cartridge_bank: 0,
            minimem: None,
            scratch: [0; SCRATCH_SIZE],
            timer_pending: false,
            tms9901: Tms9901::new(),
            keyboard: Keyboard::new(),
            fdc: Fdc::new(),
            grom: Grom::new(),
            sound: Sound::new(),
            vdp: Vdp::new(),
            halt: None,
        }
    }

    pub fn load_console_rom(&mut self, image: &[u8]) {
        let end = image.len().min(self.console_rom.len());
        self.console_rom[..end].copy_from_slice(&image[..end]);
    }

    /// Loads a device's 8 KiB DSR ROM image into bank `index` (1 is the
    /// floppy controller's disk DSR).
    pub fn load_device_rom(&mut self, index: u8, image: &[u8]) {
        let bank = &mut self.device_roms[index as usize];
        let end = image.len().min(bank.len());
        bank[..end].copy_from_slice(&image[..end]);
    }

    /// Loads an 8 KiB cartridge ROM image into `bank` (0 or 1), growing the
    /// bank table as needed. Extended BASIC and similar two-ROM cartridges
    /// load one 8 KiB image per bank.
    pub fn load_cartridge_rom(&mut self, bank: usize, image: &[u8]) {
        while self.cartridge_banks.len() <= bank {
            self.cartridge_banks.push([0xFF; CARTRIDGE_BANK_SIZE]);
        }
        let end = image.len().min(CARTRIDGE_BANK_SIZE);
        self.cartridge_banks[bank][..end].copy_from_slice(&image[..end]);
    }

    /// Maps a host file's bytes into the `7000-7FFF` minimemory window, in
    /// place of the upper half of the selected cartridge bank.
    pub fn load_minimem(&mut self, image: &[u8]) {
        let mut region = Box::new([0u8; MINIMEM_SIZE]);
        let end = image.len().min(MINIMEM_SIZE);
        region[..end].copy_from_slice(&image[..end]);
        self.minimem = Some(region);
    }

    /// Called by the machine's scheduler when the TMS9901's countdown timer
    /// reaches zero, latching a pending timer interrupt.
    pub fn timer_expired(&mut self) {
        self.timer_pending = true;
    }

    fn halt(&mut self, reason: impl Into<String>) -> u8 {
        if self.halt.is_none() {
            self.halt = Some(HaltReason::new(reason));
        }
        0xFF
    }

    /// Device ROM select: software selects which of sixteen device DSR ROMs
    /// is mapped into `4000-5FFF` by driving one of the CRU bits in
    /// `0800-0F80` (base `1000-1F00`). `state == false` maps device 0 (no
    /// device) back in; the low seven bits of `bit_index` are don't-cares.
    fn select_device_rom(&mut self, bit_index: u16, state: bool) {
        self.device_selected = ((bit_index & 0x0780) >> 7) as u8;
        self.device_rom_active = state;
    }

    fn device_rom_bank(&self) -> usize {
        if self.device_rom_active {
            self.device_selected as usize
        } else {
            0
        }
    }

    fn read_device_rom(&mut self, rel: u16) -> u8 {
        if self.device_selected == 1 && (rel & 0x1FF0) == 0x1FF0 {
            return self.fdc.read(rel & 0xF);
        }
        self.device_roms[self.device_rom_bank()][rel as usize]
    }

    fn write_device_rom(&mut self, rel: u16, value: u8) {
        if self.device_selected == 1 && (rel & 0x1FF0) == 0x1FF0 {
            self.fdc.write(rel & 0xF, value);
        } else if self.device_selected == 14 {
            // SAMS memory-expansion paging registers: not modeled, accept
            // the write as plain RAM so software that merely probes for a
            // SAMS card doesn't halt the machine.
            warn!("memmap: write to unmodeled SAMS register at device-relative >{rel:04X}");
        } else {
            self.halt(format!("invalid write to device ROM at device-relative >{rel:04X}"));
        }
    }

    /// Cartridge bank-select trap on the `6000-6FFF` half: the low two bits
    /// of the write address select bank 1 (`== 0b10`, covering both the
    /// Extended BASIC and Pacman-style schemes) or restore bank 0.
    fn bank_select(&mut self, rel: u16) {
        let bank = if (rel & 3) == 2 { 1 } else { 0 };
        self.cartridge_bank = bank.min(self.cartridge_banks.len().saturating_sub(1));
    }

    fn read_cartridge(&mut self, rel: u16) -> u8 {
        if rel >= 0x1000 {
            if let Some(minimem) = &self.minimem {
                return minimem[(rel - 0x1000) as usize];
            }
        }
        let bank = &self.cartridge_banks[self.cartridge_bank];
        bank[rel as usize]
    }

    fn write_cartridge(&mut self, rel: u16, value: u8) {
        if rel < 0x1000 {
            self.bank_select(rel);
            return;
        }
        if let Some(minimem) = &mut self.minimem {
            minimem[(rel - 0x1000) as usize] = value;
        } else {
            self.halt(format!("invalid write to unmapped minimemory at >{:04X}", 0x7000 + rel));
        }
    }

    fn read_mmio(&mut self, addr: u16) -> u8 {
        let window = (addr >> 10) & 7;
        match window {
            0 => self.scratch[(addr & 0xFF) as usize],
            1 => self.sound.read(addr & 0xFF),
            2 => match self.vdp.read(addr & 0x03) {
                Ok(value) => value,
                Err(reason) => self.halt(reason.to_string()),
            },
            3 => self.halt(format!("invalid read from VDP write port at >{addr:04X}")),
            4 | 5 => {
                warn!("memmap: speech synthesizer not modeled, read as silence");
                0
            }
            6 => self.grom.read(addr & 0x03),
            7 => self.halt(format!("invalid read from GROM write port at >{addr:04X}")),
            _ => unreachable!(),
        }
    }

    fn write_mmio(&mut self, addr: u16, value: u8) {
        let window = (addr >> 10) & 7;
        match window {
            0 => self.scratch[(addr & 0xFF) as usize] = value,
            1 => self.sound.write(value),
            2 => {
                self.halt(format!("invalid write to VDP read port at >{addr:04X}"));
            }
            3 => {
                if let Err(reason) = self.vdp.write(addr & 0x03, value) {
                    self.halt(reason.to_string());
                }
            }
            4 | 5 => warn!("memmap: speech synthesizer not modeled, write ignored"),
            6 => {
                self.halt(format!("invalid write to GROM read port at >{addr:04X}"));
            }
            7 => self.grom.write(addr & 0x03, value),
            _ => unreachable!(),
        }
    }
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for MemoryMap {
    fn read_byte(&mut self, addr: u16) -> u8 {
        match addr >> 13 {
            0 => self.console_rom[(addr & 0x1FFF) as usize],
            1 => self.ram[(addr & 0x1FFF) as usize],
            2 => self.read_device_rom(addr & 0x1FFF),
            3 => self.read_cartridge(addr & 0x1FFF),
            4 => self.read_mmio(addr & 0x1FFF),
            5 => self.ram[0x2000 + (addr & 0x1FFF) as usize],
            6 => self.ram[0x4000 + (addr & 0x1FFF) as usize],
            7 => self.ram[0x6000 + (addr & 0x1FFF) as usize],
            _ => unreachable!(),
        }
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        match addr >> 13 {
            0 => {
                self.halt(format!("invalid write to console ROM at >{addr:04X}"));
            }
            1 => self.ram[(addr & 0x1FFF) as usize] = value,
            2 => self.write_device_rom(addr & 0x1FFF, value),
            3 => self.write_cartridge(addr & 0x1FFF, value),
            4 => self.write_mmio(addr & 0x1FFF, value),
            5 => self.ram[0x2000 + (addr & 0x1FFF) as usize] = value,
            6 => self.ram[0x4000 + (addr & 0x1FFF) as usize] = value,
            7 => self.ram[0x6000 + (addr & 0x1FFF) as usize] = value,
            _ => unreachable!(),
        }
    }
}

impl SystemBus for MemoryMap {
    fn cru_bit_output(&mut self, base: u16, offset: i8, state: bool) {
        let index = cru_index(base, offset);

        if (DEVICE_SELECT_LOW..=DEVICE_SELECT_HIGH).contains(&index) {
            self.select_device_rom(index, state);
            if self.device_selected == 1 && (FDC_CRU_BASE..FDC_CRU_BASE + 8).contains(&index) {
                self.fdc.cru_output(index - FDC_CRU_BASE, state);
            }
            return;
        }

        match index {
            0 => self.tms9901.set_mode(state),
            1..=14 => self.tms9901.bit_set(index, state),
            COLUMN_SELECT_BASE..=ALPHA_LOCK_BIT => self.keyboard.cru_column_select(index, state),
            _ => warn!("memmap: CRU output to unmapped bit >{index:04X}"),
        }
    }

    fn cru_bit_get(&mut self, base: u16, offset: i8) -> bool {
        let index = cru_index(base, offset);

        if (FDC_CRU_BASE..FDC_CRU_BASE + 8).contains(&index) {
            return self.fdc.cru_get(index - FDC_CRU_BASE);
        }

        match index {
            1..=14 => {
                // The TMS9901 intercepts every read in this range while its
                // countdown timer is running; otherwise it passes through
                // whichever external line is wired to that pin.
                let line_state = match index {
                    IRQ_VDP => self.vdp.interrupt_pending(),
                    ROW_BASE_BIT..=10 => self.keyboard.cru_row_get(index),
                    _ => false,
                };
                self.tms9901.bit_get(index, line_state)
            }
            _ => {
                warn!("memmap: CRU input read of unmapped bit >{index:04X}");
                true
            }
        }
    }

    fn cru_multi_bit_set(&mut self, base: u16, data: u16, n_bits: u8) {
        let n = if n_bits == 0 { 16 } else { n_bits };
        for i in 0..n {
            self.cru_bit_output(base, i as i8, (data & (1 << i)) != 0);
        }
    }

    fn cru_multi_bit_get(&mut self, base: u16, n_bits: u8) -> u16 {
        let n = if n_bits == 0 { 16 } else { n_bits };
        let mut data = 0u16;
        for i in 0..n {
            if self.cru_bit_get(base, i as i8) {
                data |= 1 << i;
            }
        }
        data
    }

    fn interrupt_level(&mut self, mask: u8) -> Option<u8> {
        if mask < 1 {
            return None;
        }
        let vdp_line = self.vdp.interrupt_pending();
        let timer_line = self.timer_pending;
        let raised = self
            .tms9901
            .recompute_interrupt(|i| (i == IRQ_VDP && vdp_line) || (i == IRQ_TIMER && timer_line));
        if raised {
            self.timer_pending = false;
            Some(1)
        } else {
            None
        }
    }

    fn take_halt(&mut self) -> Option<HaltReason> {
        self.halt.take()
    }
}

/// Resolves a CPU `(base, offset)` CRU address into a flat 12-bit bit
/// index, matching [`ti994a_core::bus::CruBus`]'s own arithmetic.
fn cru_index(base: u16, offset: i8) -> u16 {
    let bit_base = (base >> 1) as i32;
    (bit_base + offset as i32).rem_euclid(4096) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booted() -> MemoryMap {
        MemoryMap::new()
    }

    #[test]
    fn console_rom_reads_back_loaded_bytes() {
        let mut mem = booted();
        mem.load_console_rom(&[0xAA, 0xBB, 0xCC]);
        assert_eq!(mem.read_byte(0x0000), 0xAA);
        assert_eq!(mem.read_byte(0x0002), 0xCC);
    }

    #[test]
    fn console_rom_write_is_fatal() {
        let mut mem = booted();
        mem.write_byte(0x0000, 0x42);
        assert!(mem.take_halt().is_some());
    }

    #[test]
    fn expansion_ram_round_trips_across_both_low_and_high_windows() {
        let mut mem = booted();
        mem.write_word(0x2000, 0xBEEF);
        assert_eq!(mem.read_word(0x2000), 0xBEEF);
        mem.write_word(0xE000, 0x1234);
        assert_eq!(mem.read_word(0xE000), 0x1234);
    }

    #[test]
    fn cartridge_bank_select_switches_the_whole_eight_kib_window() {
        let mut mem = booted();
        mem.load_cartridge_rom(0, &[0x00; 0x2000]);
        mem.load_cartridge_rom(1, &[0x11; 0x2000]);
        assert_eq!(mem.read_byte(0x6000), 0x00);
        mem.write_byte(0x6002, 0xFF); // low two bits == 0b10 selects bank 1
        assert_eq!(mem.read_byte(0x6000), 0x11);
        assert_eq!(mem.read_byte(0x7000), 0x11);
        mem.write_byte(0x6000, 0xFF); // any other low bits restore bank 0
        assert_eq!(mem.read_byte(0x6000), 0x00);
    }

    #[test]
    fn minimem_overlays_the_upper_cartridge_half() {
        let mut mem = booted();
        mem.load_cartridge_rom(0, &[0x00; 0x2000]);
        mem.load_minimem(&[0x99; 0x1000]);
        mem.write_byte(0x7000, 0x42);
        assert_eq!(mem.read_byte(0x7000), 0x42);
        assert_eq!(mem.read_byte(0x6000), 0x00); // lower half unaffected
    }

    #[test]
    fn device_rom_select_maps_the_chosen_bank_only_while_asserted() {
        let mut mem = booted();
        mem.load_device_rom(1, &[0x77; 0x2000]);
        mem.cru_bit_output(0x1100, 0, true); // bit index 0x880, device 1
        assert_eq!(mem.read_byte(0x4000), 0x77);
        mem.cru_bit_output(0x1100, 0, false);
        assert_eq!(mem.read_byte(0x4000), 0x00);
    }

    #[test]
    fn fdc_register_window_is_reachable_once_its_device_rom_is_selected() {
        let mut mem = booted();
        mem.cru_bit_output(0x1100, 0, true); // selects device 1 (disk)
        mem.read_byte(0x5FF0); // status register
        mem.write_byte(0x5FF8, 0xD0); // restore/seek-type command byte
        mem.read_byte(0x5FF0);
        assert!(mem.take_halt().is_none());
    }

    #[test]
    fn scratchpad_is_plain_word_addressable_ram() {
        let mut mem = booted();
        mem.write_word(0x8010, 0xCAFE);
        assert_eq!(mem.read_word(0x8010), 0xCAFE);
    }

    #[test]
    fn vdp_and_grom_ports_reach_their_devices() {
        let mut mem = booted();
        mem.grom.load(0, &[0x5A]);
        assert_eq!(mem.read_byte(0x9800), 0x5A);

        mem.write_byte(0x8C02, 0x00); // set-write-pointer, low byte of addr (first byte)
        mem.write_byte(0x8C02, 0x40); // second byte: top bits select write mode
        mem.write_byte(0x8C00, 0x37);
        assert!(mem.take_halt().is_none());
        assert_eq!(mem.vdp.register(1), 0); // write-pointer command never touches a register
    }

    #[test]
    fn unmapped_device_rom_write_halts() {
        let mut mem = booted();
        mem.write_byte(0x4000, 0xFF);
        assert!(mem.take_halt().is_some());
    }

    #[test]
    fn keyboard_column_select_and_row_read_reach_the_matrix() {
        let mut mem = booted();
        mem.keyboard.set_key(3, 0, true);
        mem.cru_bit_output(0x0024, 0, false); // bit 18
        mem.cru_bit_output(0x0026, 0, false); // bit 19
        mem.cru_bit_output(0x0028, 0, false); // bit 20
        assert!(!mem.cru_bit_get(0x0006, 0)); // bit 3, active low, pressed
    }

    #[test]
    fn timer_mode_cru_bits_reach_the_tms9901() {
        let mut mem = booted();
        mem.cru_bit_output(0x0000, 0, true); // bit 0: enter timer mode
        mem.cru_bit_output(0x0000, 1, true); // bit 1
        assert!(mem.tms9901.timer_mode());
    }
}
