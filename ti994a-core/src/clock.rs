/*
    Copyright (C) 2024  Mark Halloran

    This file is part of ti994a, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! Scheduler glue: the periodic VDP tick and the TMS9901 timer's
//! recurring alarm, plus the cancellation flag that stops the main loop.
//!
//! The original drives these from a blocking wait on a set of Linux
//! `timerfd`s (spec.md §5). That's an OS-specific non-goal here, so
//! instead [`Scheduler`] tracks elapsed time (wall-clock nanoseconds, or
//! CPU-cycle count in a headless test harness) and yields the events that
//! became due since the last poll — the host's main loop decides how to
//! wait for the next one.
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One of the two timer sources the scheduler multiplexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedEvent {
    /// The 50 Hz VDP refresh/interrupt tick.
    VdpTick,
    /// The TMS9901 countdown timer expired.
    Tms9901Timer,
}

#[derive(Debug, Clone, Copy)]
struct PeriodicSource {
    period: Duration,
    accumulated: Duration,
    enabled: bool,
}

impl PeriodicSource {
    fn new(period: Duration) -> Self {
        PeriodicSource { period, accumulated: Duration::ZERO, enabled: true }
    }

    /// Advances by `elapsed`, returning how many periods fired (almost
    /// always 0 or 1, but a host that polls infrequently may see more).
    fn advance(&mut self, elapsed: Duration) -> u32 {
        if !self.enabled || self.period.is_zero() {
            return 0;
        }
        self.accumulated += elapsed;
        let mut fired = 0;
        while self.accumulated >= self.period {
            self.accumulated -= self.period;
            fired += 1;
        }
        fired
    }
}

/// Multiplexes the VDP's fixed 50 Hz tick and the TMS9901's
/// guest-programmable countdown timer into a single due-event stream.
pub struct Scheduler {
    vdp: PeriodicSource,
    timer: PeriodicSource,
}

/// One VDP field at the NTSC/PAL-ish 50 Hz rate the original hard-codes.
pub const VDP_TICK_PERIOD: Duration = Duration::from_millis(20);

impl Scheduler {
    pub fn new() -> Self {
        Scheduler {
            vdp: PeriodicSource::new(VDP_TICK_PERIOD),
            timer: PeriodicSource { period: Duration::ZERO, accumulated: Duration::ZERO, enabled: false },
        }
    }

    /// Sets the TMS9901 timer's period in nanoseconds (spec.md §4.4:
    /// `1000 * 64 * value / 3`). A period of zero disables the timer
    /// source.
    pub fn set_timer_period_nanos(&mut self, nanos: u64) {
        if nanos == 0 {
            self.timer.enabled = false;
        } else {
            self.timer.period = Duration::from_nanos(nanos);
            self.timer.accumulated = Duration::ZERO;
            self.timer.enabled = true;
        }
    }

    pub fn disable_timer(&mut self) {
        self.timer.enabled = false;
    }

    /// Advances the scheduler by `elapsed` and returns every event that
    /// became due, in the order VDP-then-timer.
    pub fn due(&mut self, elapsed: Duration) -> Vec<SchedEvent> {
        let mut events = Vec::new();
        for _ in 0..self.vdp.advance(elapsed) {
            events.push(SchedEvent::VdpTick);
        }
        for _ in 0..self.timer.advance(elapsed) {
            events.push(SchedEvent::Tms9901Timer);
        }
        events
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// A process-wide run flag, cleared to stop the CPU loop at the next
/// instruction boundary (spec.md §5's "signal-driven cancellation").
#[derive(Clone)]
pub struct RunFlag(Arc<AtomicBool>);

impl RunFlag {
    pub fn new() -> Self {
        RunFlag(Arc::new(AtomicBool::new(true)))
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn stop(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vdp_tick_fires_every_20ms() {
        let mut sched = Scheduler::new();
        assert!(sched.due(Duration::from_millis(19)).is_empty());
        let events = sched.due(Duration::from_millis(1));
        assert_eq!(events, vec![SchedEvent::VdpTick]);
    }

    #[test]
    fn timer_period_matches_tms9901_formula() {
        let mut sched = Scheduler::new();
        let value: u64 = 100;
        let nanos = 1000 * 64 * value / 3;
        sched.set_timer_period_nanos(nanos);
        let events = sched.due(Duration::from_nanos(nanos));
        assert!(events.contains(&SchedEvent::Tms9901Timer));
    }

    #[test]
    fn run_flag_stops() {
        let flag = RunFlag::new();
        assert!(flag.is_running());
        flag.stop();
        assert!(!flag.is_running());
    }
}
