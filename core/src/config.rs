//! Run-time configuration, mirroring the original's `geo_set_*` setters.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Us,
    Jp,
    As,
    Eu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemKind {
    Aes,
    Mvs,
    UniverseBios,
}

/// Sprite-per-line cap exposed as a configurability point (hardware default: 96).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteLimit {
    Hardware = 96,
    Double = 192,
    Triple = 288,
    Max = 381,
}

#[derive(Debug, Clone, Copy)]
pub struct SystemConfig {
    pub region: Region,
    pub system: SystemKind,
    /// `geo_set_div68k`: 0 = normal divider, 1 = overclocked (68K undivided).
    pub overclock: bool,
    /// `geo_set_adpcm_wrap`: true wraps the ADPCM-A accumulator mod 4096,
    /// false clamps to `[-2048, 2047]` (a game-specific workaround).
    pub adpcm_wrap: bool,
    /// Frames without a watchdog kick before a soft reset is triggered.
    pub watchdog_frames: u32,
    pub sprite_limit: SpriteLimit,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            region: Region::Us,
            system: SystemKind::Mvs,
            overclock: false,
            adpcm_wrap: true,
            watchdog_frames: 8,
            sprite_limit: SpriteLimit::Hardware,
        }
    }
}
