//! Host-integration utilities for [`ti994a`]: a keyboard key-event source
//! trait, a wall-clock-paced run-loop helper, and ROM/GROM file loaders.
//! None of this is specified as core emulator behavior (spec.md §1 calls
//! the evdev keyboard source and the host loop out of scope, interfaces
//! only) — it's the glue a host binary wires the library up with.
pub mod keyboard;
pub mod rom;
pub mod runner;
