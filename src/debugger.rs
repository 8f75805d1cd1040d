/*
    Copyright (C) 2024  Mark Halloran

    This file is part of ti994a, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! The debugger shards: breakpoints, memory watches, and conditional
//! breaks, each kept as its own small table just as the original splits
//! them across `break.c`, `std3/watch.c` and `cond.c`.
//!
//! None of these drive execution themselves — [`crate::machine::Machine`]
//! single-steps and asks a [`Debugger`] after each instruction whether it
//! should stop.

use std::collections::BTreeMap;

use thiserror::Error;

const MAX_BREAKPOINTS: usize = 20;
const MAX_WATCHES: usize = 20;
const MAX_CONDITIONS: usize = 100;

/// How a [`Condition`] compares the live value at its address against the
/// value it was armed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
    /// Fires once per actual change, then adopts the new value as its
    /// baseline (so it doesn't keep firing on every poll).
    Change,
}

#[derive(Debug, Clone, Copy)]
struct Condition {
    addr: u16,
    value: u16,
    cmp: Comparison,
}

/// Why [`Debugger::should_break`] stopped the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Breakpoint(u16),
    Condition(u16),
}

/// Breakpoints (stop when PC hits an address), watches (report when a
/// memory location's value changes) and conditions (stop when a comparison
/// against a memory location becomes true).
#[derive(Default)]
pub struct Debugger {
    breakpoints: Vec<u16>,
    watches: Vec<u16>,
    watch_last: BTreeMap<u16, u16>,
    conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DebuggerError {
    #[error("breakpoint at >{0:04X} already set")]
    DuplicateBreakpoint(u16),
    #[error("breakpoint table is full ({MAX_BREAKPOINTS} entries)")]
    BreakpointTableFull,
    #[error("no breakpoint at >{0:04X}")]
    BreakpointNotFound(u16),
    #[error("watch on >{0:04X} already set")]
    DuplicateWatch(u16),
    #[error("watch table is full ({MAX_WATCHES} entries)")]
    WatchTableFull,
    #[error("no watch on >{0:04X}")]
    WatchNotFound(u16),
    #[error("condition on >{0:04X} already set")]
    DuplicateCondition(u16),
    #[error("condition table is full ({MAX_CONDITIONS} entries)")]
    ConditionTableFull,
    #[error("no condition on >{0:04X}")]
    ConditionNotFound(u16),
}

impl Debugger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_breakpoint(&mut self, addr: u16) -> Result<(), DebuggerError> {
        if self.breakpoints.contains(&addr) {
            return Err(DebuggerError::DuplicateBreakpoint(addr));
        }
        if self.breakpoints.len() == MAX_BREAKPOINTS {
            return Err(DebuggerError::BreakpointTableFull);
        }
        self.breakpoints.push(addr);
        Ok(())
    }

    pub fn remove_breakpoint(&mut self, addr: u16) -> Result<(), DebuggerError> {
        let pos = self.breakpoints.iter().position(|&a| a == addr).ok_or(DebuggerError::BreakpointNotFound(addr))?;
        self.breakpoints.remove(pos);
        Ok(())
    }

    pub fn breakpoints(&self) -> &[u16] {
        &self.breakpoints
    }

    pub fn breakpoint_hit(&self, pc: u16) -> bool {
        self.breakpoints.contains(&pc)
    }

    pub fn add_watch(&mut self, addr: u16) -> Result<(), DebuggerError> {
        if self.watches.contains(&addr) {
            return Err(DebuggerError::DuplicateWatch(addr));
        }
        if self.watches.len() == MAX_WATCHES {
            return Err(DebuggerError::WatchTableFull);
        }
        self.watches.push(addr);
        Ok(())
    }

    pub fn remove_watch(&mut self, addr: u16) -> Result<(), DebuggerError> {
        let pos = self.watches.iter().position(|&a| a == addr).ok_or(DebuggerError::WatchNotFound(addr))?;
        self.watches.remove(pos);
        self.watch_last.remove(&addr);
        Ok(())
    }

    pub fn watches(&self) -> &[u16] {
        &self.watches
    }

    /// Reports every watched address whose value (read via `peek`) differs
    /// from what was last reported, updating the baseline as it goes. Mirrors
    /// `watchShow`'s "only print on change" behavior.
    pub fn poll_watches(&mut self, mut peek: impl FnMut(u16) -> u16) -> Vec<(u16, u16)> {
        let mut changed = Vec::new();
        for &addr in &self.watches {
            let value = peek(addr);
            let is_new = match self.watch_last.get(&addr) {
                Some(&last) => last != value,
                None => true,
            };
            if is_new {
                changed.push((addr, value));
                self.watch_last.insert(addr, value);
            }
        }
        changed
    }

    pub fn add_condition(&mut self, addr: u16, cmp: Comparison, value: u16) -> Result<(), DebuggerError> {
        if self.conditions.iter().any(|c| c.addr == addr) {
            return Err(DebuggerError::DuplicateCondition(addr));
        }
        if self.conditions.len() == MAX_CONDITIONS {
            return Err(DebuggerError::ConditionTableFull);
        }
        self.conditions.push(Condition { addr, value, cmp });
        Ok(())
    }

    pub fn remove_condition(&mut self, addr: u16) -> Result<(), DebuggerError> {
        let pos = self.conditions.iter().position(|c| c.addr == addr).ok_or(DebuggerError::ConditionNotFound(addr))?;
        self.conditions.remove(pos);
        Ok(())
    }

    /// Evaluates every armed condition against live memory (via `peek`),
    /// returning whether any is currently true. A `Change` condition that
    /// fires adopts the new value as its baseline, same as the original's
    /// `conditionEval`.
    pub fn any_condition_true(&mut self, mut peek: impl FnMut(u16) -> u16) -> bool {
        let mut any = false;
        for cond in &mut self.conditions {
            let value = peek(cond.addr);
            let fired = match cond.cmp {
                Comparison::Equal => value == cond.value,
                Comparison::NotEqual => value != cond.value,
                Comparison::Change => value != cond.value,
            };
            if fired {
                any = true;
                if cond.cmp == Comparison::Change {
                    cond.value = value;
                }
            }
        }
        any
    }

    /// Whether execution should stop before the instruction at `pc`, and if
    /// so why. Checks breakpoints before conditions, matching the
    /// original's `ti994aRun` loop guard order.
    pub fn should_break(&mut self, pc: u16, peek: impl FnMut(u16) -> u16) -> Option<StopReason> {
        if self.breakpoint_hit(pc) {
            return Some(StopReason::Breakpoint(pc));
        }
        if self.any_condition_true(peek) {
            return Some(StopReason::Condition(pc));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakpoint_add_remove_and_hit() {
        let mut dbg = Debugger::new();
        dbg.add_breakpoint(0x6000).unwrap();
        assert!(dbg.breakpoint_hit(0x6000));
        assert!(!dbg.breakpoint_hit(0x6002));
        dbg.remove_breakpoint(0x6000).unwrap();
        assert!(!dbg.breakpoint_hit(0x6000));
    }

    #[test]
    fn duplicate_breakpoint_is_rejected() {
        let mut dbg = Debugger::new();
        dbg.add_breakpoint(0x6000).unwrap();
        assert_eq!(dbg.add_breakpoint(0x6000), Err(DebuggerError::DuplicateBreakpoint(0x6000)));
    }

    #[test]
    fn watch_reports_only_on_change() {
        let mut dbg = Debugger::new();
        dbg.add_watch(0x8300).unwrap();
        let mut mem: BTreeMap<u16, u16> = BTreeMap::new();
        mem.insert(0x8300, 1);
        let first = dbg.poll_watches(|a| *mem.get(&a).unwrap_or(&0));
        assert_eq!(first, vec![(0x8300, 1)]);
        let second = dbg.poll_watches(|a| *mem.get(&a).unwrap_or(&0));
        assert!(second.is_empty());
        mem.insert(0x8300, 2);
        let third = dbg.poll_watches(|a| *mem.get(&a).unwrap_or(&0));
        assert_eq!(third, vec![(0x8300, 2)]);
    }

    #[test]
    fn equal_condition_fires_without_consuming_baseline() {
        let mut dbg = Debugger::new();
        dbg.add_condition(0x8300, Comparison::Equal, 42).unwrap();
        assert!(dbg.any_condition_true(|_| 42));
        assert!(dbg.any_condition_true(|_| 42)); // keeps firing, unlike Change
    }

    #[test]
    fn change_condition_fires_once_then_rebaselines() {
        let mut dbg = Debugger::new();
        dbg.add_condition(0x8300, Comparison::Change, 0).unwrap();
        assert!(dbg.any_condition_true(|_| 5));
        assert!(!dbg.any_condition_true(|_| 5));
        assert!(dbg.any_condition_true(|_| 6));
    }

    #[test]
    fn should_break_prefers_breakpoint_over_condition() {
        let mut dbg = Debugger::new();
        dbg.add_breakpoint(0x6000).unwrap();
        dbg.add_condition(0x8300, Comparison::Equal, 1).unwrap();
        assert_eq!(dbg.should_break(0x6000, |_| 1), Some(StopReason::Breakpoint(0x6000)));
    }
}
