/*
    Copyright (C) 2024  Mark Halloran

    This file is part of ti994a, a Rust library for building emulators of
    the Texas Instruments TI-99/4A home computer.

    ti994a is free software: you can redistribute it and/or modify it under
    the terms of the GNU Lesser General Public License (LGPL) as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    ti994a is distributed in the hope that it will be useful, but WITHOUT
    ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or
    FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Lesser General Public
    License for more details.

    You should have received a copy of the GNU Lesser General Public
    License along with this program.  If not, see
    <https://www.gnu.org/licenses/>.

    Author contact information: see Cargo.toml file, section
    [package.authors].
*/
//! The core components shared by every ti994a crate: the CRU bit-serial
//! bus, the hierarchical 64 KiB memory map, the TMS9900 status flags and
//! the video/audio sample traits that let the chipset, formats and audio
//! crates talk to each other without depending on one another directly.
pub mod bus;
pub mod chip;
pub mod clock;
pub mod memory;
pub mod video;
pub mod audio;

pub use chip::StatusFlags;
