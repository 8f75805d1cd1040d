/*
    Copyright (C) 2024  Mark Halloran

    This file is part of ti994a, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! The TMS9918 video display processor: 16 KiB of VRAM, eight registers
//! latched through a two-byte command-port protocol, and a renderer that
//! draws a full frame into a [`ti994a_core::video::PixelSink`] covering
//! Graphics I, Graphics II (bitmap) and Text mode, plus the 32-sprite
//! engine with its per-scanline and per-pixel coincidence tracking.

use ti994a_core::chip::HaltReason;
use ti994a_core::video::{color_rgb, PixelSink};

pub const VRAM_SIZE: usize = 0x4000;
pub const SCREEN_WIDTH: usize = 256;
pub const SCREEN_HEIGHT: usize = 192;
const MAX_SPRITES: usize = 32;

const STATUS_VERT_RETRACE: u8 = 0x80;
const STATUS_SPRITE_LINE: u8 = 0x40;
const STATUS_SPRITE_COINC: u8 = 0x20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Latch {
    None,
    Read,
    Write,
}

pub struct Vdp {
    addr: u16,
    cmd_in_progress: bool,
    latch: Latch,
    reg: [u8; 8],
    cmd: u8,
    status: u8,
    ram: [u8; VRAM_SIZE],
    mode_changed: bool,
    sprites_enabled: bool,
    sprite_coinc: Vec<bool>,
    sprites_per_line: [u32; SCREEN_HEIGHT],
}

impl Vdp {
    pub fn new() -> Self {
        Vdp {
            addr: 0,
            cmd_in_progress: false,
            latch: Latch::None,
            reg: [0; 8],
            cmd: 0,
            status: 0,
            ram: [0; VRAM_SIZE],
            mode_changed: false,
            sprites_enabled: true,
            sprite_coinc: vec![false; SCREEN_WIDTH * SCREEN_HEIGHT],
            sprites_per_line: [0; SCREEN_HEIGHT],
        }
    }

    pub fn register(&self, index: usize) -> u8 {
        self.reg[index]
    }

    fn bitmap_mode(&self) -> bool {
        self.reg[0] & 0x02 != 0
    }
    fn external_mode(&self) -> bool {
        self.reg[0] & 0x01 != 0
    }
    fn int_enable(&self) -> bool {
        self.reg[1] & 0x20 != 0
    }
    fn text_mode(&self) -> bool {
        self.reg[1] & 0x10 != 0
    }
    fn multi_mode(&self) -> bool {
        self.reg[1] & 0x08 != 0
    }
    fn sprite_size_large(&self) -> bool {
        self.reg[1] & 0x02 != 0
    }
    fn sprite_mag(&self) -> bool {
        self.reg[1] & 0x01 != 0
    }
    fn screen_image_table(&self) -> u16 {
        ((self.reg[2] & 0x0F) as u16) << 10
    }
    fn gr_coltab_addr(&self) -> u16 {
        (self.reg[3] as u16) << 6
    }
    fn gr_charpat_tab(&self) -> u16 {
        ((self.reg[4] & 0x07) as u16) << 11
    }
    fn bm_coltab_addr(&self) -> u16 {
        ((self.reg[3] & 0x80) as u16) << 6
    }
    fn bm_coltab_size(&self) -> u16 {
        (((self.reg[3] & 0x7F) as u16) << 6) | 0x3F
    }
    fn bm_charpat_tab(&self) -> u16 {
        ((self.reg[4] & 0x04) as u16) << 11
    }
    fn sprite_attr_tab(&self) -> u16 {
        ((self.reg[5] & 0x7F) as u16) << 7
    }
    fn sprite_pat_tab(&self) -> u16 {
        ((self.reg[6] & 0x07) as u16) << 11
    }
    fn fg_colour(&self) -> u8 {
        (self.reg[7] & 0xF0) >> 4
    }
    fn bg_colour(&self) -> u8 {
        self.reg[7] & 0x0F
    }

    /// Reads the VDP port. `offset` 0 is the data port (reads the byte at
    /// the current VRAM pointer and advances it); `offset` 2 is the status
    /// port, which clears the low 5 status bits on read.
    pub fn read(&mut self, offset: u16) -> Result<u8, HaltReason> {
        match offset {
            0 => {
                if self.addr as usize >= VRAM_SIZE {
                    return Err(HaltReason::new(format!("VDP read out of range at >{:04X}", self.addr)));
                }
                self.cmd_in_progress = false;
                let value = self.ram[self.addr as usize];
                self.addr = self.addr.wrapping_add(1);
                Ok(value)
            }
            2 => {
                self.cmd_in_progress = false;
                let value = self.status;
                self.status &= 0x1F;
                Ok(value)
            }
            _ => Err(HaltReason::new(format!("VDP invalid read port offset {offset}"))),
        }
    }

    /// Writes the VDP port. `offset` 0 is the data port; `offset` 2 is the
    /// two-byte latched command port (set read pointer / set write pointer
    /// / select register, keyed by the top 2 bits of the second byte).
    pub fn write(&mut self, offset: u16, data: u8) -> Result<(), HaltReason> {
        match offset {
            0 => {
                if self.addr as usize >= VRAM_SIZE {
                    return Err(HaltReason::new(format!("VDP write out of range at >{:04X}", self.addr)));
                }
                self.cmd_in_progress = false;
                self.ram[self.addr as usize] = data;
                self.addr = self.addr.wrapping_add(1);
                Ok(())
            }
            2 => {
                if self.cmd_in_progress {
                    match data >> 6 {
                        0 => {
                            self.latch = Latch::Read;
                            self.addr = ((data as u16 & 0x3F) << 8) | self.cmd as u16;
                        }
                        1 => {
                            self.latch = Latch::Write;
                            self.addr = ((data as u16 & 0x3F) << 8) | self.cmd as u16;
                        }
                        2 => {
                            let reg = (data & 7) as usize;
                            self.latch = Latch::None;
                            if reg == 1 && self.reg[reg] != self.cmd {
                                self.mode_changed = true;
                            }
                            self.reg[reg] = self.cmd;
                        }
                        _ => {} // command-port case 3 is left unhandled upstream too.
                    }
                } else {
                    self.cmd = data;
                }
                self.cmd_in_progress = !self.cmd_in_progress;
                Ok(())
            }
            _ => Err(HaltReason::new(format!("VDP invalid write port offset {offset}"))),
        }
    }

    /// Called once per vertical retrace. Sets the vsync status bit when
    /// interrupts are enabled and reports whether the VDP's line to the
    /// TMS9901 should be asserted (active low).
    pub fn vsync(&mut self) -> bool {
        if self.int_enable() {
            self.status |= STATUS_VERT_RETRACE;
            true
        } else {
            false
        }
    }

    /// Whether the VDP's interrupt line to the TMS9901 (wired active on the
    /// `F` status bit while interrupts are enabled) is currently asserted.
    pub fn interrupt_pending(&self) -> bool {
        self.int_enable() && (self.status & STATUS_VERT_RETRACE) != 0
    }

    fn char_pixel(&self, cx: usize, cy: usize, bits: usize, ch: u8, px: usize) -> u8 {
        let y = px;
        let (charpat, colpat) = if self.bitmap_mode() {
            let addr = ((ch as u16) << 3) + (((cy >> 3) as u16) << 11) + y as u16;
            let masked = addr & self.bm_coltab_size();
            (self.bm_charpat_tab() + masked, self.bm_coltab_addr() + masked)
        } else {
            (self.gr_charpat_tab() + ((ch as u16) << 3) + y as u16, self.gr_coltab_addr() + (ch as u16 >> 3))
        };

        let data = self.ram[charpat as usize & (VRAM_SIZE - 1)];
        let colour = if self.text_mode() { self.reg[7] } else { self.ram[colpat as usize & (VRAM_SIZE - 1)] };
        let bit = cx % bits;
        if (data << bit) & 0x80 != 0 {
            colour >> 4
        } else {
            colour & 0x0F
        }
    }

    /// Draws the background field (char/bitmap mode) into `framebuffer`, a
    /// flat `width*height` color-index grid.
    fn draw_background(&self, framebuffer: &mut [u8]) {
        let (cells, bits) = if self.text_mode() { (0x3C0, 6) } else { (0x300, 8) };
        let cols = if self.text_mode() { 40 } else { 32 };

        for sc in 0..cells {
            let cx = sc % cols;
            let cy = sc / cols;
            let ch = self.ram[(self.screen_image_table() as usize + sc) & (VRAM_SIZE - 1)];
            for y in 0..8 {
                let row = cy * 8 + y;
                if row >= SCREEN_HEIGHT {
                    continue;
                }
                for x in cx * bits..(cx + 1) * bits {
                    if x >= SCREEN_WIDTH {
                        continue;
                    }
                    let colour = self.char_pixel(x, cy * 8, bits, ch, y);
                    framebuffer[row * SCREEN_WIDTH + x] = colour;
                }
            }
        }

        if self.text_mode() {
            for x in SCREEN_WIDTH - 16..SCREEN_WIDTH {
                for y in 0..SCREEN_HEIGHT {
                    framebuffer[y * SCREEN_WIDTH + x] = 0;
                }
            }
        }
    }

    fn plot(&mut self, framebuffer: &mut [u8], x: i32, y: i32, col: u8) {
        if x < 0 || y < 0 || x as usize >= SCREEN_WIDTH || y as usize >= SCREEN_HEIGHT {
            return;
        }
        framebuffer[y as usize * SCREEN_WIDTH + x as usize] = col;
    }

    /// One scanline's worth of a sprite's pattern byte, tracking the
    /// per-pixel coincidence map and setting the coincidence status bit on
    /// overlap.
    fn draw_sprite_byte(&mut self, framebuffer: &mut [u8], data: u8, x: i32, y: i32, col: u8) {
        let mut data = data;
        for i in 0..8 {
            if data & 0x80 != 0 {
                let px = x + i;
                if px >= 0 && y >= 0 && (px as usize) < SCREEN_WIDTH && (y as usize) < SCREEN_HEIGHT {
                    let idx = y as usize * SCREEN_WIDTH + px as usize;
                    if self.sprite_coinc[idx] {
                        self.status |= STATUS_SPRITE_COINC;
                    }
                    self.sprite_coinc[idx] = true;
                    self.plot(framebuffer, px, y, col);
                }
            }
            data <<= 1;
        }
    }

    fn draw_sprite_byte_magnified(&mut self, framebuffer: &mut [u8], data: u8, x: i32, y: i32, col: u8) {
        let mut data = data;
        for i in 0..8 {
            if data & 0x80 != 0 {
                let px = x + i * 2;
                if px >= 0 && y >= 0 && (px as usize) < SCREEN_WIDTH - 1 && (y as usize) < SCREEN_HEIGHT {
                    let idx0 = y as usize * SCREEN_WIDTH + px as usize;
                    let idx1 = idx0 + 1;
                    if self.sprite_coinc[idx0] || self.sprite_coinc[idx1] {
                        self.status |= STATUS_SPRITE_COINC;
                    }
                    self.sprite_coinc[idx0] = true;
                    self.sprite_coinc[idx1] = true;
                    self.plot(framebuffer, px, y, col);
                    self.plot(framebuffer, px + 1, y, col);
                }
            }
            data <<= 1;
        }
    }

    /// Counts this sprite against its scanline's budget. Once a line has
    /// accumulated its fifth sprite, records which sprite tripped it and
    /// raises the per-scanline overflow flag; every further sprite on that
    /// line (the fifth included) is suppressed.
    fn over_sprite_limit(&mut self, y: i32, sprite: usize) -> bool {
        if y < 0 || y as usize >= SCREEN_HEIGHT {
            return false;
        }
        let y = y as usize;
        self.sprites_per_line[y] += 1;
        match self.sprites_per_line[y] {
            5 => {
                self.status = (self.status & 0xE0) | sprite as u8;
                self.status |= STATUS_SPRITE_LINE;
                true
            }
            n if n > 5 => true,
            _ => false,
        }
    }

    fn draw_sprites(&mut self, framebuffer: &mut [u8]) {
        self.status &= !STATUS_SPRITE_COINC;
        self.sprite_coinc.iter_mut().for_each(|b| *b = false);
        self.sprites_per_line = [0; SCREEN_HEIGHT];

        let size_large = self.sprite_size_large();
        let magnified = self.sprite_mag();
        let attr = self.sprite_attr_tab();
        let pat_tab = self.sprite_pat_tab();

        for i in 0..MAX_SPRITES {
            let base = attr as usize + i * 4;
            let raw_y = self.ram[base & (VRAM_SIZE - 1)];
            // An attribute-table y byte of 0xD0 marks the end of the active
            // sprite list; no further sprites are processed this frame.
            if raw_y == 0xD0 {
                return;
            }
            let y = raw_y as i32 + 1;
            let mut x = self.ram[(base + 1) & (VRAM_SIZE - 1)] as i32;
            let pattern = self.ram[(base + 2) & (VRAM_SIZE - 1)] as u16 * 8 + pat_tab;
            let colour = self.ram[(base + 3) & (VRAM_SIZE - 1)];
            if colour & 0x80 != 0 {
                x -= 32;
            }
            let col = colour & 0x0F;

            match (size_large, magnified) {
                (false, false) => {
                    for row in 0..8 {
                        if self.over_sprite_limit(y + row, i) {
                            continue;
                        }
                        let data = self.ram[(pattern as usize + row as usize) & (VRAM_SIZE - 1)];
                        self.draw_sprite_byte(framebuffer, data, x, y + row, col);
                    }
                }
                (true, false) => {
                    for row in 0..16 {
                        if self.over_sprite_limit(y + row, i) {
                            continue;
                        }
                        for quad in (0..16).step_by(8) {
                            let data = self.ram[(pattern as usize + row as usize + quad * 2) & (VRAM_SIZE - 1)];
                            self.draw_sprite_byte(framebuffer, data, x + quad, y + row, col);
                        }
                    }
                }
                (false, true) => {
                    for row in 0..8 {
                        let data = self.ram[(pattern as usize + row as usize) & (VRAM_SIZE - 1)];
                        if !self.over_sprite_limit(y + row * 2, i) {
                            self.draw_sprite_byte_magnified(framebuffer, data, x, y + row * 2, col);
                        }
                        if !self.over_sprite_limit(y + row * 2 + 1, i) {
                            self.draw_sprite_byte_magnified(framebuffer, data, x, y + row * 2 + 1, col);
                        }
                    }
                }
                (true, true) => {
                    for row in 0..16 {
                        for quad in (0..16).step_by(8) {
                            let data = self.ram[(pattern as usize + row as usize + quad * 2) & (VRAM_SIZE - 1)];
                            if !self.over_sprite_limit(y + row * 2, i) {
                                self.draw_sprite_byte_magnified(framebuffer, data, x + quad, y + row * 2, col);
                            }
                            if !self.over_sprite_limit(y + row * 2 + 1, i) {
                                self.draw_sprite_byte_magnified(framebuffer, data, x + quad, y + row * 2 + 1, col);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Renders a complete frame into `sink`, one scanline at a time. Fails
    /// if the register state selects an unsupported mode (multicolor or
    /// external).
    pub fn render_frame(&mut self, sink: &mut impl PixelSink) -> Result<(), HaltReason> {
        if self.mode_changed {
            self.sprites_enabled = !self.text_mode();
            self.mode_changed = false;
        }
        if self.multi_mode() {
            return Err(HaltReason::new("unsupported VDP mode: multicolor"));
        }
        if self.external_mode() {
            return Err(HaltReason::new("unsupported VDP mode: external"));
        }

        let mut framebuffer = vec![0u8; SCREEN_WIDTH * SCREEN_HEIGHT];
        self.draw_background(&mut framebuffer);
        if self.sprites_enabled {
            self.draw_sprites(&mut framebuffer);
        }

        let background = self.bg_colour();
        let mut row = vec![(0u8, 0u8, 0u8); SCREEN_WIDTH];
        for y in 0..SCREEN_HEIGHT {
            for x in 0..SCREEN_WIDTH {
                row[x] = color_rgb(framebuffer[y * SCREEN_WIDTH + x], background);
            }
            sink.put_scanline(y, &row);
        }
        Ok(())
    }
}

impl Default for Vdp {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ti994a_core::video::FrameBuffer;

    fn set_register(vdp: &mut Vdp, reg: u8, value: u8) {
        vdp.write(2, value).unwrap();
        vdp.write(2, 0x80 | reg).unwrap();
    }

    #[test]
    fn register_write_latches_through_command_port() {
        let mut vdp = Vdp::new();
        set_register(&mut vdp, 7, 0x1F);
        assert_eq!(vdp.register(7), 0x1F);
    }

    #[test]
    fn set_write_pointer_then_data_writes_advance_address() {
        let mut vdp = Vdp::new();
        vdp.write(2, 0x00).unwrap();
        vdp.write(2, 0x40).unwrap(); // set write pointer to 0x0000
        vdp.write(0, 0xAB).unwrap();
        vdp.write(0, 0xCD).unwrap();
        assert_eq!(vdp.ram[0], 0xAB);
        assert_eq!(vdp.ram[1], 0xCD);
    }

    #[test]
    fn status_read_clears_interrupt_fifth_sprite_and_coincidence_bits() {
        let mut vdp = Vdp::new();
        vdp.status = 0xFF;
        let read = vdp.read(2).unwrap();
        assert_eq!(read, 0xFF);
        // F/5S/C (the top three bits) are cleared; the low 5 bits, which
        // hold the 5th-sprite index, are preserved.
        assert_eq!(vdp.status, 0x1F);
    }

    #[test]
    fn vsync_sets_retrace_bit_only_when_interrupts_enabled() {
        let mut vdp = Vdp::new();
        assert!(!vdp.vsync());
        assert_eq!(vdp.status & STATUS_VERT_RETRACE, 0);
        set_register(&mut vdp, 1, 0x20);
        assert!(vdp.vsync());
        assert_eq!(vdp.status & STATUS_VERT_RETRACE, STATUS_VERT_RETRACE);
    }

    #[test]
    fn multicolor_mode_is_a_fatal_error() {
        let mut vdp = Vdp::new();
        set_register(&mut vdp, 1, 0x08);
        let mut fb = FrameBuffer::new(SCREEN_WIDTH, SCREEN_HEIGHT);
        assert!(vdp.render_frame(&mut fb).is_err());
    }

    #[test]
    fn sprite_list_terminates_on_0xd0_y_byte() {
        let mut vdp = Vdp::new();
        // Graphics I mode is the default (register 0/1 all zero).
        vdp.ram[0] = 0xD0; // sprite 0's y byte terminates the list
        let mut fb = FrameBuffer::new(SCREEN_WIDTH, SCREEN_HEIGHT);
        assert!(vdp.render_frame(&mut fb).is_ok());
        assert_eq!(vdp.status & STATUS_SPRITE_LINE, 0);
    }

    #[test]
    fn fifth_sprite_on_a_scanline_sets_overflow_flag() {
        let mut vdp = Vdp::new();
        for i in 0..5u8 {
            let base = i as usize * 4;
            vdp.ram[base] = 99; // y=100 after +1, all sprites share a scanline
            vdp.ram[base + 1] = i * 10; // spread out in x so they don't all overlap
            vdp.ram[base + 2] = 0;
            vdp.ram[base + 3] = 1;
        }
        vdp.ram[5 * 4] = 0xD0; // terminate after 5 sprites
        let mut fb = FrameBuffer::new(SCREEN_WIDTH, SCREEN_HEIGHT);
        vdp.render_frame(&mut fb).unwrap();
        assert_ne!(vdp.status & STATUS_SPRITE_LINE, 0);
    }

    #[test]
    fn overlapping_sprite_pixels_set_coincidence_flag() {
        let mut vdp = Vdp::new();
        set_register(&mut vdp, 6, 1); // sprite pattern table at 0x0800, clear of the attribute table
        vdp.ram[0] = 99;
        vdp.ram[1] = 50;
        vdp.ram[2] = 0;
        vdp.ram[3] = 1;
        vdp.ram[4] = 99;
        vdp.ram[5] = 50;
        vdp.ram[6] = 0;
        vdp.ram[7] = 2;
        vdp.ram[8] = 0xD0;
        // Pattern 0 with all bits set draws a fully opaque 8x8 block.
        for b in 0..8 {
            vdp.ram[0x0800 + b] = 0xFF;
        }
        let mut fb = FrameBuffer::new(SCREEN_WIDTH, SCREEN_HEIGHT);
        vdp.render_frame(&mut fb).unwrap();
        assert_ne!(vdp.status & STATUS_SPRITE_COINC, 0);
    }
}
