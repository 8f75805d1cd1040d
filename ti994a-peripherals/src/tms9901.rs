/*
    Copyright (C) 2024  Mark Halloran

    This file is part of ti994a, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! The TMS9901 programmable systems interface: interrupt mask/status and the
//! single 14-bit countdown timer, wired onto CRU bits 0-15 (spec.md §4.4).
//!
//! The real chip supports 16 independent interrupt levels; the TI-99/4A
//! wires only one of them to the CPU, and the interrupt priority encoder is
//! hardwired to always report level 1 regardless of which input is active
//! (the console ROM never needs to distinguish sources by level — it polls
//! individual CRU bits instead).

pub const IRQ_VDP: u16 = 2;
pub const IRQ_TIMER: u16 = 3;

/// Converts a 14-bit countdown value into the real-time period the original
/// derives it from: the system clock runs at 3 MHz and each timer tick is
/// 64 clock cycles, so `nanos = 1000 * 64 * value / 3`.
#[inline]
pub fn timer_period_nanos(value: u16) -> u64 {
    1000 * 64 * value as u64 / 3
}

#[derive(Debug, Clone)]
pub struct Tms9901 {
    timer_mode: bool,
    timer: u16,
    timer_snapshot: u16,
    int_disabled: [bool; 16],
    int_active: [bool; 16],
}

impl Tms9901 {
    pub fn new() -> Self {
        Tms9901 {
            timer_mode: false,
            timer: 0,
            timer_snapshot: 0,
            int_disabled: [false; 16],
            int_active: [false; 16],
        }
    }

    /// Writing CRU bit 0 selects timer mode (1) or interrupt mode (0).
    pub fn set_mode(&mut self, timer_mode: bool) {
        if !self.timer_mode && timer_mode {
            self.timer_snapshot = self.timer;
        }
        self.timer_mode = timer_mode;
    }

    pub fn timer_mode(&self) -> bool {
        self.timer_mode
    }

    pub fn timer_snapshot(&self) -> u16 {
        self.timer_snapshot
    }

    /// The decrementer's current period, in nanoseconds, for the scheduler
    /// to arm (0 when the timer value is 0, which the scheduler treats as
    /// "disabled").
    pub fn timer_period_nanos(&self) -> u64 {
        timer_period_nanos(self.timer)
    }

    /// Handles a CRU output to bit `index` (1..=14 in timer mode sets one
    /// bit of the countdown register; in interrupt mode enables/disables
    /// that interrupt line). Bit 0 (mode select) is handled by
    /// [`Self::set_mode`], not here.
    pub fn bit_set(&mut self, index: u16, state: bool) {
        debug_assert!((1..16).contains(&index));
        if self.timer_mode {
            let bit = 1u16 << (index - 1);
            if state {
                self.timer |= bit;
            } else {
                self.timer &= !bit;
            }
        } else {
            self.int_disabled[index as usize] = !state;
            if state {
                self.int_active[index as usize] = false;
            }
        }
    }

    /// Handles a CRU read of bit `index` (1..=14): in timer mode, reads a
    /// bit of the live countdown register back; otherwise returns the
    /// caller-supplied line state unchanged (the TMS9901 only intercepts
    /// reads while counting).
    pub fn bit_get(&self, index: u16, line_state: bool) -> bool {
        if self.timer_mode {
            let bit = 1u16 << (index - 1);
            self.timer & bit != 0
        } else {
            line_state
        }
    }

    /// Whether interrupt `index` is currently masked (disabled by the
    /// guest).
    pub fn is_disabled(&self, index: u16) -> bool {
        self.int_disabled[index as usize]
    }

    /// Recomputes whether the single hardwired interrupt line to the CPU
    /// (always reported as level 1) should be raised, given a way to read
    /// the live state of each CRU input bit 1..=15. Returns the new raised
    /// state.
    pub fn recompute_interrupt(&mut self, mut line_is_low: impl FnMut(u16) -> bool) -> bool {
        let raise = (1..16).any(|i| line_is_low(i) && !self.int_disabled[i as usize]);
        self.int_active[1] = raise;
        raise
    }

    /// The interrupt level the CPU's priority encoder reports, or `None` if
    /// nothing is pending within `mask` (spec.md §4.4: hardwired to level
    /// 1 regardless of source).
    pub fn interrupt_level(&self, mask: u8) -> Option<u8> {
        if mask >= 1 && self.int_active[1] {
            Some(1)
        } else {
            None
        }
    }
}

impl Default for Tms9901 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_formula_matches_spec_constant() {
        assert_eq!(timer_period_nanos(100), 1000 * 64 * 100 / 3);
    }

    #[test]
    fn timer_mode_bit_set_and_read_back() {
        let mut chip = Tms9901::new();
        chip.set_mode(true);
        chip.bit_set(1, true);
        chip.bit_set(3, true);
        assert!(chip.bit_get(1, false));
        assert!(!chip.bit_get(2, false));
        assert!(chip.bit_get(3, false));
        assert_eq!(chip.timer, 0b101);
    }

    #[test]
    fn entering_timer_mode_snapshots_previous_value() {
        let mut chip = Tms9901::new();
        chip.set_mode(true);
        chip.bit_set(1, true);
        chip.set_mode(false);
        chip.set_mode(true);
        assert_eq!(chip.timer_snapshot(), 1);
    }

    #[test]
    fn interrupt_enable_bit_clears_active_flag() {
        let mut chip = Tms9901::new();
        chip.bit_set(IRQ_VDP, true); // state 1 enables the interrupt line
        assert!(!chip.is_disabled(IRQ_VDP));
        let raised = chip.recompute_interrupt(|i| i == IRQ_VDP);
        assert!(raised);
        chip.bit_set(IRQ_VDP, false); // state 0 disables it and clears latch
        assert!(chip.is_disabled(IRQ_VDP));
    }

    #[test]
    fn priority_encoder_always_reports_level_one() {
        let mut chip = Tms9901::new();
        chip.bit_set(IRQ_TIMER, true);
        chip.recompute_interrupt(|i| i == IRQ_TIMER);
        assert_eq!(chip.interrupt_level(0xFF), Some(1));
    }
}
