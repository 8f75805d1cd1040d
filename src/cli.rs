/*
    Copyright (C) 2024  Mark Halloran

    This file is part of ti994a, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! Parses one line of the emulator host's line-oriented command surface
//! into a [`Command`]. Dispatching a parsed command against a running
//! [`crate::machine::Machine`] — the REPL loop itself, readline history,
//! script files — is a host concern and lives outside this crate.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Break,
    Watch,
    Condition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableAction {
    Add,
    List,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeekTarget {
    Cpu,
    Pad,
    PadGpl,
    Mem,
    Vdp,
    Grom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PokeTarget {
    Mem,
    Vdp,
}

/// One parsed line of the CLI surface (spec.md §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Table { table: Table, action: TableAction, arg: Option<String> },
    Peek { target: PeekTarget, addr: u16, size: Option<u16>, count: Option<u16> },
    Poke { target: PokeTarget, addr: u16, size: u16, values: Vec<u16> },
    RunScript { file: String },
    Go,
    Boot,
    Unassemble { covered: bool },
    Level { mask: u8 },
    Quit,
    Video,
    Sound,
    Comments { file: String },
    Load { file: String, addr: u16, bank: Option<u8> },
    Grom { file: String, addr: u16 },
    Keyboard { device: Option<String> },
    CtrlC,
    InsPerSec { n: u32 },
    Status,
    PixelSize { n: u32 },
    DiskRom,
    DiskFile { unit: u8, path: String, write_protect: bool },
    DiskDir { unit: u8, path: String, write_protect: bool },
    Sams,
    Mmap { file: String, addr: u16, size: u16 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CliError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("'{cmd}' needs {expected}")]
    MissingArgument { cmd: &'static str, expected: &'static str },
    #[error("'{0}' is not a valid number")]
    BadNumber(String),
    #[error("'{0}' must be RO or RW")]
    BadProtectionMode(String),
    #[error("'{0}' is not break, watch or condition")]
    UnknownTable(String),
    #[error("'{0}' is not add, list or remove")]
    UnknownTableAction(String),
    #[error("'{0}' is not a peek target (cpu, pad, padgpl, mem, vdp, grom)")]
    UnknownPeekTarget(String),
    #[error("'{0}' is not a poke target (mem, vdp)")]
    UnknownPokeTarget(String),
}

/// Parses a hex or decimal integer, accepting the TI assembler's `>hex`
/// prefix as well as a bare `0x` one.
fn parse_number<T>(s: &str) -> Result<T, CliError>
where
    T: TryFrom<u32>,
{
    let (digits, radix) = if let Some(rest) = s.strip_prefix('>') {
        (rest, 16)
    } else if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (rest, 16)
    } else {
        (s, 10)
    };
    let value = u32::from_str_radix(digits, radix).map_err(|_| CliError::BadNumber(s.to_string()))?;
    T::try_from(value).map_err(|_| CliError::BadNumber(s.to_string()))
}

fn table_action(s: &str) -> Result<TableAction, CliError> {
    match s {
        "add" => Ok(TableAction::Add),
        "list" => Ok(TableAction::List),
        "remove" => Ok(TableAction::Remove),
        _ => Err(CliError::UnknownTableAction(s.to_string())),
    }
}

fn protection_mode(s: &str) -> Result<bool, CliError> {
    match s.to_ascii_uppercase().as_str() {
        "RO" => Ok(true),
        "RW" => Ok(false),
        _ => Err(CliError::BadProtectionMode(s.to_string())),
    }
}

/// Parses one command line into a [`Command`]. Whitespace-separated,
/// case-sensitive on the command word (matching the original's terse
/// dispatcher), numbers accepted in `>hex`, `0xhex` or decimal.
pub fn parse(line: &str) -> Result<Command, CliError> {
    let mut words = line.split_whitespace();
    let cmd = words.next().ok_or(CliError::Empty)?;

    let command = match cmd {
        "break" | "watch" | "condition" => {
            let table = match cmd {
                "break" => Table::Break,
                "watch" => Table::Watch,
                _ => Table::Condition,
            };
            let action_word = words.next().ok_or(CliError::MissingArgument { cmd: "break/watch/condition", expected: "add|list|remove" })?;
            let action = table_action(action_word)?;
            let arg = words.next().map(|s| s.to_string());
            Command::Table { table, action, arg }
        }
        "peek" => {
            let target_word = words.next().ok_or(CliError::MissingArgument { cmd: "peek", expected: "a target" })?;
            let target = match target_word {
                "cpu" => PeekTarget::Cpu,
                "pad" => PeekTarget::Pad,
                "padgpl" => PeekTarget::PadGpl,
                "mem" => PeekTarget::Mem,
                "vdp" => PeekTarget::Vdp,
                "grom" => PeekTarget::Grom,
                other => return Err(CliError::UnknownPeekTarget(other.to_string())),
            };
            let addr = words.next().map(parse_number).transpose()?.unwrap_or(0);
            let size = words.next().map(parse_number).transpose()?;
            let count = words.next().map(parse_number).transpose()?;
            Command::Peek { target, addr, size, count }
        }
        "poke" => {
            let target_word = words.next().ok_or(CliError::MissingArgument { cmd: "poke", expected: "mem|vdp" })?;
            let target = match target_word {
                "mem" => PokeTarget::Mem,
                "vdp" => PokeTarget::Vdp,
                other => return Err(CliError::UnknownPokeTarget(other.to_string())),
            };
            let addr = parse_number(words.next().ok_or(CliError::MissingArgument { cmd: "poke", expected: "an address" })?)?;
            let size = parse_number(words.next().ok_or(CliError::MissingArgument { cmd: "poke", expected: "a size" })?)?;
            let values = words.map(parse_number).collect::<Result<Vec<u16>, _>>()?;
            Command::Poke { target, addr, size, values }
        }
        "@" => Command::RunScript { file: words.next().ok_or(CliError::MissingArgument { cmd: "@", expected: "a file path" })?.to_string() },
        "go" => Command::Go,
        "boot" => Command::Boot,
        "unassemble" => Command::Unassemble { covered: words.next() == Some("covered") },
        "level" => Command::Level { mask: parse_number(words.next().ok_or(CliError::MissingArgument { cmd: "level", expected: "a hex mask" })?)? },
        "quit" => Command::Quit,
        "video" => Command::Video,
        "sound" => Command::Sound,
        "comments" => Command::Comments { file: words.next().ok_or(CliError::MissingArgument { cmd: "comments", expected: "a file path" })?.to_string() },
        "load" => {
            let file = words.next().ok_or(CliError::MissingArgument { cmd: "load", expected: "a file path" })?.to_string();
            let addr = parse_number(words.next().ok_or(CliError::MissingArgument { cmd: "load", expected: "an address" })?)?;
            let bank = words.next().map(parse_number).transpose()?;
            Command::Load { file, addr, bank }
        }
        "grom" => {
            let file = words.next().ok_or(CliError::MissingArgument { cmd: "grom", expected: "a file path" })?.to_string();
            let addr = parse_number(words.next().ok_or(CliError::MissingArgument { cmd: "grom", expected: "an address" })?)?;
            Command::Grom { file, addr }
        }
        "keyboard" => Command::Keyboard { device: words.next().map(|s| s.to_string()) },
        "ctrlc" => Command::CtrlC,
        "inspersec" => Command::InsPerSec { n: parse_number(words.next().ok_or(CliError::MissingArgument { cmd: "inspersec", expected: "a count" })?)? },
        "status" => Command::Status,
        "pixelsize" => Command::PixelSize { n: parse_number(words.next().ok_or(CliError::MissingArgument { cmd: "pixelsize", expected: "a size" })?)? },
        "disk" => {
            match words.next() {
                Some("rom") => Command::DiskRom,
                _ => return Err(CliError::MissingArgument { cmd: "disk", expected: "rom" }),
            }
        }
        "diskfile" | "diskdir" => {
            let unit = parse_number(words.next().ok_or(CliError::MissingArgument { cmd: "diskfile/diskdir", expected: "a unit number" })?)?;
            let path = words.next().ok_or(CliError::MissingArgument { cmd: "diskfile/diskdir", expected: "a path" })?.to_string();
            let write_protect = protection_mode(words.next().ok_or(CliError::MissingArgument { cmd: "diskfile/diskdir", expected: "RO or RW" })?)?;
            if cmd == "diskfile" {
                Command::DiskFile { unit, path, write_protect }
            } else {
                Command::DiskDir { unit, path, write_protect }
            }
        }
        "sams" => Command::Sams,
        "mmap" => {
            let file = words.next().ok_or(CliError::MissingArgument { cmd: "mmap", expected: "a file path" })?.to_string();
            let addr = parse_number(words.next().ok_or(CliError::MissingArgument { cmd: "mmap", expected: "an address" })?)?;
            let size = parse_number(words.next().ok_or(CliError::MissingArgument { cmd: "mmap", expected: "a size" })?)?;
            Command::Mmap { file, addr, size }
        }
        other => return Err(CliError::UnknownCommand(other.to_string())),
    };

    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_break_add_with_hex_address() {
        let cmd = parse("break add >6000").unwrap();
        assert_eq!(cmd, Command::Table { table: Table::Break, action: TableAction::Add, arg: Some(">6000".to_string()) });
    }

    #[test]
    fn parses_peek_with_defaults() {
        let cmd = parse("peek cpu").unwrap();
        assert_eq!(cmd, Command::Peek { target: PeekTarget::Cpu, addr: 0, size: None, count: None });
    }

    #[test]
    fn parses_peek_with_full_args() {
        let cmd = parse("peek mem >8300 2 10").unwrap();
        assert_eq!(cmd, Command::Peek { target: PeekTarget::Mem, addr: 0x8300, size: Some(2), count: Some(10) });
    }

    #[test]
    fn parses_poke_with_multiple_values() {
        let cmd = parse("poke mem >8300 1 1 2 3").unwrap();
        assert_eq!(cmd, Command::Poke { target: PokeTarget::Mem, addr: 0x8300, size: 1, values: vec![1, 2, 3] });
    }

    #[test]
    fn parses_load_with_optional_bank() {
        let cmd = parse("load game.bin >6000 1").unwrap();
        assert_eq!(cmd, Command::Load { file: "game.bin".to_string(), addr: 0x6000, bank: Some(1) });
    }

    #[test]
    fn parses_diskfile_with_protection_mode() {
        let cmd = parse("diskfile 1 disk1.dsk RO").unwrap();
        assert_eq!(cmd, Command::DiskFile { unit: 1, path: "disk1.dsk".to_string(), write_protect: true });
    }

    #[test]
    fn rejects_bad_protection_mode() {
        assert_eq!(parse("diskfile 1 disk1.dsk XY"), Err(CliError::BadProtectionMode("XY".to_string())));
    }

    #[test]
    fn rejects_unknown_command() {
        assert_eq!(parse("frobnicate"), Err(CliError::UnknownCommand("frobnicate".to_string())));
    }

    #[test]
    fn rejects_empty_line() {
        assert_eq!(parse(""), Err(CliError::Empty));
    }

    #[test]
    fn parses_plain_commands_with_no_arguments() {
        assert_eq!(parse("go").unwrap(), Command::Go);
        assert_eq!(parse("quit").unwrap(), Command::Quit);
        assert_eq!(parse("status").unwrap(), Command::Status);
    }

    #[test]
    fn unassemble_covered_flag() {
        assert_eq!(parse("unassemble").unwrap(), Command::Unassemble { covered: false });
        assert_eq!(parse("unassemble covered").unwrap(), Command::Unassemble { covered: true });
    }
}
