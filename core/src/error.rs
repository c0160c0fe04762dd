//! Error types for BIOS/cart loading and save-state handling.
//!
//! `LoadError` and `StateError` hand-roll `Display` in the style of
//! `neogeo-machines`' `RomLoadError` rather than pulling in `thiserror`.
//! `ProtectionOverreach` and `WatchdogTimeout` are not `Result` errors at
//! all; they are logged through the [`crate::log`] callback and execution
//! continues.

use std::fmt;

/// Errors that abort loading a BIOS archive or NEO cartridge image.
#[derive(Debug)]
pub enum LoadError {
    /// Underlying I/O error reading the archive or cartridge file.
    Io(std::io::Error),

    /// The ZIP archive is missing a mandatory member.
    MissingBiosMember(String),

    /// The file does not start with the NEO magic (`N`,`E`,`O`,`0x01`).
    BadNeoMagic,

    /// The cartridge's region/system requirements are not met by the
    /// running configuration (e.g. an MVS-only title booted as AES).
    UnsupportedForSystem(String),

    /// A persisted save blob (NVRAM/cartram/memcard) doesn't match the
    /// size of the in-memory region it's meant to restore.
    SaveSizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::MissingBiosMember(name) => write!(f, "missing BIOS ROM: {name}"),
            Self::BadNeoMagic => write!(f, "not a NEO cartridge image (bad magic)"),
            Self::UnsupportedForSystem(reason) => {
                write!(f, "cartridge unsupported on this system: {reason}")
            }
            Self::SaveSizeMismatch { expected, actual } => write!(
                f,
                "save data size mismatch: expected {expected} bytes, got {actual}"
            ),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Errors rejecting a save-state load.
#[derive(Debug)]
pub enum StateError {
    /// The state buffer's `(region, system)` header doesn't match the
    /// currently running configuration.
    Mismatch { expected: (u8, u8), actual: (u8, u8) },

    /// The buffer is shorter than the computed state size.
    Truncated { expected: usize, actual: usize },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mismatch { expected, actual } => write!(
                f,
                "save state region/system mismatch: expected {expected:?}, got {actual:?}"
            ),
            Self::Truncated { expected, actual } => write!(
                f,
                "save state buffer too small: expected {expected} bytes, got {actual}"
            ),
        }
    }
}

impl std::error::Error for StateError {}
