use neogeo_core::config::{Region, SystemConfig, SystemKind};
use neogeo_core::core::machine::Machine;
use neogeo_machines::NeoGeoSystem;

mod audio;
mod emulator;
mod input;
mod overlay;
mod rom_path;
mod video;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    // Usage: neogeo <bios-path> <cartridge.neo> [--region us|jp|as|eu] [--mvs|--aes|--unibios] [--scale N]

    let bios_path = args.get(1).expect("Usage: neogeo <bios-path> <cartridge.neo> [--scale N]");
    let cart_path = args.get(2).expect("cartridge .neo path required");
    let scale = parse_flag(&args, "--scale").and_then(|v| v.parse().ok()).unwrap_or(3);

    let config = SystemConfig {
        region: parse_region(&args),
        system: parse_system_kind(&args),
        ..SystemConfig::default()
    };

    let mut machine = NeoGeoSystem::new(config);

    let bios_reader = rom_path::open_bios_zip(bios_path).expect("Failed to open BIOS archive");
    machine.load_bios(bios_reader).expect("Failed to load BIOS");

    let cart_bytes = std::fs::read(cart_path).expect("Failed to read cartridge image");
    machine.load_cartridge(&cart_bytes).expect("Failed to load cartridge");

    let nvram_path = sidecar_path(cart_path, "nv");
    if let Ok(data) = std::fs::read(&nvram_path) {
        let _ = machine.load_nvram(&data);
    }
    let srm_path = sidecar_path(cart_path, "srm");
    if let Ok(data) = std::fs::read(&srm_path) {
        let _ = machine.load_cartram(&data);
    }
    let mcr_path = sidecar_path(cart_path, "mcr");
    if let Ok(data) = std::fs::read(&mcr_path) {
        let _ = machine.load_memcard(&data);
    }

    let key_map = input::default_key_map(machine.input_map());
    machine.reset();
    emulator::run(&mut machine, &key_map, scale);

    if let Err(e) = std::fs::write(&nvram_path, machine.nvram()) {
        eprintln!("Warning: failed to save NVRAM: {e}");
    }
    if let Some(cartram) = machine.cartram()
        && let Err(e) = std::fs::write(&srm_path, cartram)
    {
        eprintln!("Warning: failed to save cartridge RAM: {e}");
    }
    if let Err(e) = std::fs::write(&mcr_path, machine.memcard()) {
        eprintln!("Warning: failed to save memory card: {e}");
    }
}

fn sidecar_path(cart_path: &str, ext: &str) -> std::path::PathBuf {
    std::path::Path::new(cart_path).with_extension(ext)
}

fn parse_flag<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find_map(|w| (w[0] == flag).then_some(w[1].as_str()))
}

fn parse_region(args: &[String]) -> Region {
    match parse_flag(args, "--region") {
        Some("jp") => Region::Jp,
        Some("as") => Region::As,
        Some("eu") => Region::Eu,
        _ => Region::Us,
    }
}

fn parse_system_kind(args: &[String]) -> SystemKind {
    if args.iter().any(|a| a == "--aes") {
        SystemKind::Aes
    } else if args.iter().any(|a| a == "--unibios") {
        SystemKind::UniverseBios
    } else {
        SystemKind::Mvs
    }
}
