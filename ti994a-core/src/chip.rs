/*
    Copyright (C) 2024  Mark Halloran

    This file is part of ti994a, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! The TMS9900 status register and the fatal-error type shared by every
//! component that can `halt` the machine.
use core::fmt;

use bitflags::bitflags;

#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

bitflags! {
    /// The TMS9900 status word (`ST`). The low 4 bits are the interrupt
    /// mask; everything above bit 11 is a condition flag set by the last
    /// instruction that defines it.
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    #[derive(Default)]
    pub struct StatusFlags: u16 {
        /// Logical greater than (unsigned compare).
        const LGT  = 0b1000_0000_0000_0000;
        /// Arithmetic greater than (signed compare).
        const AGT  = 0b0100_0000_0000_0000;
        /// Equal.
        const EQ   = 0b0010_0000_0000_0000;
        /// Carry.
        const C    = 0b0001_0000_0000_0000;
        /// Overflow.
        const OV   = 0b0000_1000_0000_0000;
        /// Odd parity (byte operations only).
        const OP   = 0b0000_0100_0000_0000;
        /// XOP in progress (set on entry to an XOP handler).
        const XOP  = 0b0000_0010_0000_0000;
        /// Interrupt mask, bits 12..15.
        const MASK = 0b0000_0000_0000_1111;
    }
}

impl StatusFlags {
    /// Returns the 4-bit interrupt mask currently in effect.
    #[inline]
    pub fn interrupt_mask(self) -> u8 {
        (self & StatusFlags::MASK).bits() as u8
    }

    /// Returns a copy of `self` with the interrupt mask replaced by the low
    /// 4 bits of `level`, as `LIMI` and the interrupt-entry context switch
    /// do.
    #[inline]
    pub fn with_interrupt_mask(self, level: u8) -> Self {
        (self & !StatusFlags::MASK) | (StatusFlags::from_bits_truncate(level as u16) & StatusFlags::MASK)
    }

    /// Sets or clears `flag` depending on `condition`, leaving every other
    /// bit untouched. This is the Rust stand-in for the original's
    /// `statusCarry`/`statusOverflow`/... family of setters.
    #[inline]
    pub fn set_cond(&mut self, flag: StatusFlags, condition: bool) {
        self.set(flag, condition);
    }
}

/// A fatal condition that halts the emulated machine: an unmapped memory
/// access, an undefined opcode, an unsupported VDP mode, or a
/// user-requested mount/load that failed. Mirrors the original's
/// centralized `halt(reason)` contract (spec.md §7): nothing in the CPU or
/// memory core swallows an error silently, everything funnels here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaltReason(pub String);

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for HaltReason {}

impl HaltReason {
    pub fn new(reason: impl Into<String>) -> Self {
        HaltReason(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_mask_roundtrip() {
        let st = StatusFlags::LGT | StatusFlags::EQ;
        let st = st.with_interrupt_mask(0x5);
        assert_eq!(st.interrupt_mask(), 0x5);
        assert!(st.contains(StatusFlags::LGT));
        assert!(st.contains(StatusFlags::EQ));
    }

    #[test]
    fn set_cond_toggles_only_target_bit() {
        let mut st = StatusFlags::AGT;
        st.set_cond(StatusFlags::C, true);
        assert!(st.contains(StatusFlags::C));
        assert!(st.contains(StatusFlags::AGT));
        st.set_cond(StatusFlags::C, false);
        assert!(!st.contains(StatusFlags::C));
    }
}
