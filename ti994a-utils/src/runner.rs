//! Paces [`Machine::run_for`] against wall-clock time and ties it to a
//! [`RunFlag`], the host-loop half of spec.md §5's concurrency model: "a
//! process-wide run flag cleared by signal handler causes the CPU loop to
//! exit at the next instruction boundary."
use std::thread;
use std::time::{Duration, Instant};

use ti994a::core::chip::HaltReason;
use ti994a::core::clock::RunFlag;
use ti994a::Machine;

/// Instructions handed to [`Machine::run_for`] per host-loop iteration.
/// Small enough that a cleared [`RunFlag`] is noticed within a fraction of
/// a frame, large enough that the loop isn't all per-call overhead.
const SLICE_INSTRUCTIONS: u32 = 3000;

/// Runs `machine` until `flag` is cleared or the CPU halts, sleeping off
/// any wall-clock time a slice finished early so the emulator doesn't run
/// ahead of real time on a fast host.
///
/// `slice_wall_time` is how long [`SLICE_INSTRUCTIONS`] is supposed to
/// take; pass [`Duration::ZERO`] to run flat out instead (useful for
/// headless/batch use where pacing doesn't matter).
pub fn run_paced(machine: &mut Machine, flag: &RunFlag, slice_wall_time: Duration) -> Result<(), HaltReason> {
    while flag.is_running() {
        let started = Instant::now();
        machine.run_for(SLICE_INSTRUCTIONS)?;
        if let Some(remaining) = slice_wall_time.checked_sub(started.elapsed()) {
            if !remaining.is_zero() {
                thread::sleep(remaining);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ti994a::MachineConfig;

    fn config_with_halt_loop() -> MachineConfig {
        let mut rom = vec![0u8; 0x2000];
        rom[0] = 0x83;
        rom[1] = 0x00;
        rom[2] = 0x00;
        rom[3] = 0x06;
        rom[6] = 0x10; // JMP $
        rom[7] = 0xFF;
        MachineConfig { console_rom: rom, ..Default::default() }
    }

    #[test]
    fn stops_promptly_once_the_flag_clears() {
        let mut machine = Machine::new(config_with_halt_loop());
        let flag = RunFlag::new();
        let stop_flag = flag.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            stop_flag.stop();
        });
        run_paced(&mut machine, &flag, Duration::ZERO).expect("a JMP loop never halts");
        handle.join().unwrap();
    }
}
