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
//! File format support for the ti994a library: the sector-dump disk
//! volume/file layout, the cassette FM modem and its preamble/block/record
//! framing, and the WAV PCM container the cassette modem reads and writes.
pub mod cassette;
pub mod disk;
pub mod tifiles;
pub mod wav;
