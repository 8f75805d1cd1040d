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
//! Emulated peripheral chips hung off the TI-99/4A's CRU and memory-mapped
//! I/O: the TMS9901 systems interface, the FD1771 floppy disk controller
//! and the 8x8 keyboard/joystick matrix.
pub mod fdc;
pub mod keyboard;
pub mod tms9901;

pub use fdc::Fdc;
pub use keyboard::Keyboard;
pub use tms9901::Tms9901;
