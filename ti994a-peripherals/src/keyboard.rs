/*
    Copyright (C) 2024  Mark Halloran

    This file is part of ti994a, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! The 8x8 keyboard/joystick matrix, scanned by the console through the
//! TMS9901: a 3-bit column select (CRU bits 18-20) chooses one of 8
//! columns, and 8 CRU input bits (3-10) read back, one per row, active low
//! when a key at `(row, column)` is held (spec.md §4.4/§6).
//!
//! Mapping host key events onto `(row, column)` pairs — including the
//! virtual multi-key sequences the real keyboard driver synthesizes for
//! arrow keys — is a host-input concern handled outside this crate; this
//! module only models the matrix itself.

pub const ROWS: usize = 8;
pub const COLUMNS: usize = 8;

/// The CRU bit range the scanned row state is read back on.
pub const ROW_BASE_BIT: u16 = 3;
/// The CRU bit range the 3-bit column select is written to.
pub const COLUMN_SELECT_BASE: u16 = 18;
/// The CRU bit the alpha-lock toggle line is written to.
pub const ALPHA_LOCK_BIT: u16 = 21;
/// The matrix row the alpha-lock line forces low when selected, per
/// `kbdColumnUpdate`'s special case.
const ALPHA_LOCK_ROW: usize = 4;

#[derive(Debug, Clone)]
pub struct Keyboard {
    keys: [[bool; COLUMNS]; ROWS],
    column: u8,
    alpha_lock: bool,
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard { keys: [[false; COLUMNS]; ROWS], column: 0, alpha_lock: false }
    }

    /// Records a key transition at the given matrix coordinate.
    pub fn set_key(&mut self, row: usize, column: usize, pressed: bool) {
        self.keys[row][column] = pressed;
    }

    pub fn is_pressed(&self, row: usize, column: usize) -> bool {
        self.keys[row][column]
    }

    pub fn alpha_lock(&self) -> bool {
        self.alpha_lock
    }

    pub fn set_alpha_lock(&mut self, engaged: bool) {
        self.alpha_lock = engaged;
    }

    /// Handles a CRU output to one of the three column-select bits
    /// (`>0012`-`>0014`) or the alpha-lock bit (`>0015`).
    pub fn cru_column_select(&mut self, index: u16, state: bool) {
        debug_assert!((COLUMN_SELECT_BASE..=ALPHA_LOCK_BIT).contains(&index));
        if index == ALPHA_LOCK_BIT {
            self.alpha_lock = state;
            return;
        }
        let bit = 1u8 << (index - COLUMN_SELECT_BASE);
        if state {
            self.column |= bit;
        } else {
            self.column &= !bit;
        }
    }

    /// Handles a CRU read of one of the eight row bits (`>0003`-`>000A`),
    /// active low: `false` means the key at `(row, selected column)` is
    /// held down. Column 0 (the alpha-lock select column, bit 18 clear)
    /// with the alpha-lock engaged forces row 4 low regardless of key
    /// state, matching the real matrix wiring.
    pub fn cru_row_get(&self, bit: u16) -> bool {
        let row = (bit - ROW_BASE_BIT) as usize;
        if row == ALPHA_LOCK_ROW && (self.column & 1) == 0 && self.alpha_lock {
            return false;
        }
        !self.keys[row][self.column as usize]
    }
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_select_bits_compose_into_column_index() {
        let mut kbd = Keyboard::new();
        kbd.cru_column_select(COLUMN_SELECT_BASE, true);
        kbd.cru_column_select(COLUMN_SELECT_BASE + 1, false);
        kbd.cru_column_select(COLUMN_SELECT_BASE + 2, true);
        assert_eq!(kbd.column, 0b101);
    }

    #[test]
    fn pressed_key_reads_back_active_low() {
        let mut kbd = Keyboard::new();
        kbd.set_key(4, 2, true); // FNCT row, column 2
        kbd.cru_column_select(COLUMN_SELECT_BASE, false);
        kbd.cru_column_select(COLUMN_SELECT_BASE + 1, true);
        kbd.cru_column_select(COLUMN_SELECT_BASE + 2, false);
        assert!(!kbd.cru_row_get(ROW_BASE_BIT + 4));
        assert!(kbd.cru_row_get(ROW_BASE_BIT + 5));
    }

    #[test]
    fn released_key_reads_back_high() {
        let kbd = Keyboard::new();
        assert!(kbd.cru_row_get(ROW_BASE_BIT));
    }

    #[test]
    fn alpha_lock_forces_row_four_low_on_column_zero() {
        let mut kbd = Keyboard::new();
        kbd.cru_column_select(ALPHA_LOCK_BIT, true);
        assert!(kbd.alpha_lock());
        kbd.cru_column_select(COLUMN_SELECT_BASE, false);
        kbd.cru_column_select(COLUMN_SELECT_BASE + 1, false);
        kbd.cru_column_select(COLUMN_SELECT_BASE + 2, false);
        assert!(!kbd.cru_row_get(ROW_BASE_BIT + 4));
    }

    #[test]
    fn alpha_lock_does_not_affect_other_columns() {
        let mut kbd = Keyboard::new();
        kbd.cru_column_select(ALPHA_LOCK_BIT, true);
        kbd.cru_column_select(COLUMN_SELECT_BASE, true);
        assert!(kbd.cru_row_get(ROW_BASE_BIT + 4));
    }
}
