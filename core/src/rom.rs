//! NEO cartridge container parsing and ZIP-backed BIOS archive loading.
//!
//! Grounded in `neogeo-machines::rom_loader`'s CRC32/region style, but the
//! NEO format isn't a flat ROM set: it's one header-prefixed blob that this
//! module splits into the P/S/M/V1/V2/C regions per §6.

use std::io::Read;

use crate::device::cartridge::Board;
use crate::device::lspc::FixBankMode;
use crate::error::LoadError;

const NEO_MAGIC: [u8; 4] = [b'N', b'E', b'O', 0x01];
const NEO_HEADER_SIZE: usize = 4096;

#[derive(Debug, Clone, Default)]
pub struct NeoRom {
    pub p: Vec<u8>,
    pub s: Vec<u8>,
    pub m: Vec<u8>,
    pub v1: Vec<u8>,
    pub v2: Vec<u8>,
    pub c: Vec<u8>,
    pub ngh: u32,
    pub name: String,
}

/// Parse a raw `.neo` image (§6): magic, LE u32 sizes for P/S/M/V1/V2/C,
/// year/genre/screenshot/NGH, then name/manufacturer strings, then the
/// header pad out to byte 4096, then the raw region data concatenated.
pub fn parse_neo(bytes: &[u8]) -> Result<NeoRom, LoadError> {
    if bytes.len() < NEO_HEADER_SIZE || bytes[0..4] != NEO_MAGIC {
        return Err(LoadError::BadNeoMagic);
    }

    let le_u32 = |off: usize| -> u32 {
        u32::from_le_bytes([bytes[off], bytes[off + 1], bytes[off + 2], bytes[off + 3]])
    };

    let psz = le_u32(4) as usize;
    let ssz = le_u32(8) as usize;
    let msz = le_u32(12) as usize;
    let v1sz = le_u32(16) as usize;
    let v2sz = le_u32(20) as usize;
    let csz = le_u32(24) as usize;
    let ngh = le_u32(40);

    let name = String::from_utf8_lossy(&bytes[44..44 + 33])
        .trim_end_matches('\0')
        .to_string();

    let mut cursor = NEO_HEADER_SIZE;
    let mut take = |len: usize| -> Vec<u8> {
        let end = (cursor + len).min(bytes.len());
        let slice = bytes[cursor.min(bytes.len())..end].to_vec();
        cursor = end;
        slice
    };

    let p = take(psz);
    let s = take(ssz);
    let m = take(msz);
    let v1 = take(v1sz);
    let v2 = if v2sz == 0 { v1.clone() } else { take(v2sz) };
    let c = take(csz);

    Ok(NeoRom { p, s, m, v1, v2, c, ngh, name })
}

/// Byteswaps the P (and BIOS) ROM images in place, matching the original's
/// `postload` pass: the 68000 is big-endian but cartridges ship with
/// adjacent 16-bit words byte-swapped for the era's PROM layout.
pub fn postload_byteswap(data: &mut [u8]) {
    let mut i = 0;
    while i + 1 < data.len() {
        data.swap(i, i + 1);
        i += 2;
    }
}

/// `calc_mask(32, csz >> 7)`-equivalent: rounds `entries` up to the next
/// power of two no smaller than 32, then returns `entries - 1` as an
/// address mask for mirroring a tile ROM of irregular size.
pub fn calc_mask(min_pow2: u32, entries: u32) -> u32 {
    let mut n = min_pow2.max(1);
    while n < entries {
        n <<= 1;
    }
    n - 1
}

/// Selects the cartridge controller board from the NGH (plus, for several
/// titles, disambiguating bytes read directly from the raw NEO P-ROM data)
/// per the original loader's heuristic table.
pub fn select_board(ngh: u32, p: &[u8], psz: usize) -> Board {
    let byte_at = |off: usize| -> u8 { p.get(off).copied().unwrap_or(0) };

    match ngh {
        0x006 | 0x019 | 0x038 => Board::Linkable,
        0x008 => Board::BrezzaSoft,
        0x047 | 0x052 => Board::ProCt0,
        0x242 => Board::Kof98,
        0x250 => Board::MSlugX,
        0x151 | 0x251 if psz > 0x500000 => Board::NeoSma,
        0x253 => Board::NeoSma,
        0x256 if psz > 0x200000 => Board::NeoSma,
        0x257 if psz > 0x200000 => Board::NeoSma,
        0x268 => {
            if byte_at(0x1000 + 0x26b) == 0xb9 {
                Board::MS5Plus
            } else if byte_at(0x1000 + 0x267) == 0x4f {
                Board::NeoPvc
            } else {
                Board::Default
            }
        }
        0x269 => Board::NeoPvc,
        0x271 => {
            if byte_at(0x1000 + 0x689) == 0x10 {
                Board::Kf2k3Bla
            } else if byte_at(0x1000 + 0xc1) == 0x02 {
                Board::Kf2k3Bl
            } else {
                Board::NeoPvc
            }
        }
        0x275 => Board::Kof10th,
        0x3e7 | 0x999 => Board::BrezzaSoft,
        0x5003 => Board::CtHd2003,
        _ => Board::Default,
    }
}

/// Selects the fix-layer bank-switching mode from the NGH, mirroring the
/// same per-title disambiguation bytes the loader checks for board
/// selection. Most titles use no fix-layer banking at all.
pub fn select_fix_bank_mode(ngh: u32, p: &[u8], psz: usize) -> FixBankMode {
    let _ = psz;
    let byte_at = |off: usize| -> u8 { p.get(off).copied().unwrap_or(0) };

    match ngh {
        // Garou: only the KE (AES) and KF (MVS) official releases bank-switch
        // the fix layer per scanline; bootlegs and prototypes don't.
        0x253 => {
            let b = byte_at(0x1000 + 0x3e481);
            if b == 0x9f || b == 0x41 {
                FixBankMode::PerLine
            } else {
                FixBankMode::None
            }
        }
        0x256 => FixBankMode::PerLine, // Metal Slug 3
        0x257 => FixBankMode::PerTile, // KOF 2000
        // Metal Slug 4: ms4plus doesn't bank-switch the fix layer.
        0x263 => {
            if byte_at(0x1000 + 0x809) != 0x0c {
                FixBankMode::PerLine
            } else {
                FixBankMode::None
            }
        }
        0x266 => FixBankMode::PerTile, // Matrimelee
        // SVC Chaos: only the official release banks the fix layer.
        0x269 => {
            if byte_at(0x1000 + 0x3d25) == 0xc4 {
                FixBankMode::PerTile
            } else {
                FixBankMode::None
            }
        }
        // KOF 2003: the bootleg variants run their own fix-layer patching
        // and don't use the hardware bank-switch path.
        0x271 => {
            if byte_at(0x1000 + 0x689) == 0x10 || byte_at(0x1000 + 0xc1) == 0x02 {
                FixBankMode::None
            } else {
                FixBankMode::PerTile
            }
        }
        _ => FixBankMode::None,
    }
}

/// CRC-32 lookup table (reflected polynomial 0xEDB88320), in the style of
/// `neogeo-machines::rom_loader`'s checksum table.
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0u32;
    while i < 256 {
        let mut crc = i;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB8_8320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i as usize] = crc;
        i += 1;
    }
    table
};

pub fn crc32(data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        let index = ((crc ^ byte as u32) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    crc ^ 0xFFFF_FFFF
}

/// Known-good checksums for the most common BIOS dumps, used only to log
/// a mismatch warning; an unrecognized dump is never refused, matching
/// the original loader's tolerance for BIOS substitutes.
const KNOWN_BIOS_CRC32: &[(&str, u32)] = &[
    ("sp-s2.sp1", 0x9036_d879),
    ("sp-s3.sp1", 0x9fb0_abe4),
    ("sfix.sfix", 0xc2ea_0cfd),
    ("sm1.sm1", 0x94416d67),
    ("000-lo.lo", 0x5a86cff2),
];

pub fn known_bios_crc32(member: &str) -> Option<u32> {
    KNOWN_BIOS_CRC32.iter().find(|(name, _)| *name == member).map(|(_, crc)| *crc)
}

#[derive(Debug, Clone, Default)]
pub struct BiosSet {
    pub l0: Vec<u8>,
    pub bios: Vec<u8>,
    pub sfix: Vec<u8>,
    pub sm1: Vec<u8>,
    /// ZIP member names actually matched, for `known_bios_crc32` lookups.
    pub bios_name: String,
    pub sm1_name: Option<String>,
}

/// Selects BIOS ZIP members by `(system, region)`: `000-lo.lo` is
/// mandatory in all configurations; `sfix.sfix`/`sm1.sm1` only for
/// MVS/Universe.
pub fn load_bios_zip<R: std::io::Read + std::io::Seek>(
    reader: R,
    system: crate::config::SystemKind,
) -> Result<BiosSet, LoadError> {
    use crate::config::SystemKind;

    let mut archive = zip::ZipArchive::new(reader).map_err(|e| {
        LoadError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    })?;

    let mut read_member = |names: &[&str]| -> Result<(String, Vec<u8>), LoadError> {
        for name in names {
            if let Ok(mut f) = archive.by_name(name) {
                let mut buf = Vec::new();
                f.read_to_end(&mut buf)?;
                return Ok((name.to_string(), buf));
            }
        }
        Err(LoadError::MissingBiosMember(names.join("/")))
    };

    let (_, l0) = read_member(&["000-lo.lo"])?;

    let bios_names: &[&str] = match system {
        SystemKind::Aes => &["neo-po.bin", "neo-epo.bin", "japan-j3.bin"],
        SystemKind::Mvs => &["sp-u2.sp1", "sp-s2.sp1", "sp-45.sp1"],
        SystemKind::UniverseBios => &["uni-bios_4_0.rom"],
    };
    let (bios_name, bios) = read_member(bios_names)?;

    let (sfix, sm1, sm1_name) = match system {
        SystemKind::Aes => (Vec::new(), Vec::new(), None),
        SystemKind::Mvs | SystemKind::UniverseBios => {
            let (_, sfix) = read_member(&["sfix.sfix"])?;
            let (sm1_name, sm1) = read_member(&["sm1.sm1"])?;
            (sfix, sm1, Some(sm1_name))
        }
    };

    Ok(BiosSet { l0, bios, sfix, sm1, bios_name, sm1_name })
}
