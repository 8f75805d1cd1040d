//! Loading console/device ROM and GROM images from the filesystem into the
//! plain byte vectors [`ti994a::machine::MachineConfig`] and
//! [`ti994a::grom::Grom::load`] expect.
//!
//! The CLI surface (spec.md §6) names `load file addr [bank]` and `grom
//! file addr` as host commands; these are the file-reading half of both,
//! left for the host to combine with the address/bank argument.
use std::fs;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RomLoadError {
    #[error("reading ROM image {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
}

fn read(path: &Path) -> Result<Vec<u8>, RomLoadError> {
    fs::read(path).map_err(|source| RomLoadError::Io { path: path.display().to_string(), source })
}

/// Reads a flat ROM image (console ROM, a cartridge bank, or a device
/// DSR ROM) straight off disk; these are byte-for-byte memory dumps with
/// no container format.
pub fn load_rom_file(path: impl AsRef<Path>) -> Result<Vec<u8>, RomLoadError> {
    read(path.as_ref())
}

/// Reads a GROM image, same format as [`load_rom_file`] — the distinction
/// is only which device the caller hands the bytes to.
pub fn load_grom_file(path: impl AsRef<Path>) -> Result<Vec<u8>, RomLoadError> {
    read(path.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_bytes_verbatim() {
        let mut file = tempfile();
        file.1.write_all(&[0xAA, 0x55, 0x00, 0xFF]).unwrap();
        let data = load_rom_file(&file.0).unwrap();
        assert_eq!(data, vec![0xAA, 0x55, 0x00, 0xFF]);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_rom_file("/nonexistent/path/does-not-exist.bin");
        assert!(err.is_err());
    }

    fn tempfile() -> (std::path::PathBuf, fs::File) {
        let mut path = std::env::temp_dir();
        path.push(format!("ti994a-utils-test-{}", std::process::id()));
        let file = fs::File::create(&path).unwrap();
        (path, file)
    }
}
