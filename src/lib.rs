/*
    Copyright (C) 2024  Mark Halloran

    This file is part of ti994a, a Rust library for building emulators.

    ti994a is free software: you can redistribute it and/or modify it
    under the terms of the GNU Lesser General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/
#![allow(dead_code)]

//! A library for building emulators of the Texas Instruments TI-99/4A home
//! computer: a TMS9900 CPU interpreter, the hierarchical memory/bus
//! decoder, a GROM port, a TMS9918 video engine, a TMS9919 sound mixer,
//! and the supporting disassembler/tokenizer/debugger shards that sit on
//! top of [`ti994a_core`], [`ti994a_peripherals`] and [`ti994a_formats`].

pub use ti994a_core as core;
pub use ti994a_peripherals as peripherals;
#[cfg(feature = "formats")]
pub use ti994a_formats as formats;
#[cfg(feature = "audio")]
pub use ti994a_audio as audio;

pub mod basic;
pub mod cli;
pub mod cpu;
pub mod debugger;
pub mod disassembler;
pub mod grom;
pub mod machine;
pub mod memmap;
pub mod sound;
pub mod vdp;

pub use cpu::Cpu;
pub use machine::{Machine, MachineConfig};
pub use memmap::MemoryMap;
