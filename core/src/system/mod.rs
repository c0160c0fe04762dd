//! C8: the scheduler / system top. One `System` aggregate owns every
//! component; host callbacks are plain boxed-closure fields rather than
//! global statics, so (unlike the original C implementation) more than
//! one `System` may coexist in a process.

pub mod bus;
pub mod input;

use crate::config::{Region, SystemConfig, SystemKind};
use crate::core::bus::BusMaster;
use crate::core::component::BusMasterComponent;
use crate::cpu::z80::Z80;
use crate::cpu::{Cpu, M68000};
use crate::device::cartridge::{Board, CartController};
use crate::device::lspc::FixBankMode;
use crate::error::{LoadError, StateError};
use crate::log::{LogCallback, LogLevel};
use crate::rom::{self, BiosSet, NeoRom};
use crate::serial::Serializer;

use self::bus::{M68kView, MachineBus, Z80View};

const MASTER_CYCLES_PER_FRAME: u32 = 405_504;
const DIV_M68K: u32 = 2;
const DIV_Z80: u32 = 6;
const DIV_YM2610: u32 = 72;

pub struct System {
    config: SystemConfig,
    bus: MachineBus,
    m68k: M68000,
    z80: Z80,

    mcycs: u32,
    zcycs: u32,
    ymcycs: u32,
    ymsamps: u32,

    log: Option<LogCallback>,
    audio_out: Vec<(i16, i16)>,
    fix_bank_mode: FixBankMode,
}

impl System {
    pub fn new(config: SystemConfig) -> Self {
        let bus = MachineBus::new(CartController::new(Board::Default));
        let mut sys = Self {
            config,
            bus,
            m68k: M68000::new(),
            z80: Z80::new(),
            mcycs: 0,
            zcycs: 0,
            ymcycs: 0,
            ymsamps: 0,
            log: None,
            audio_out: Vec::new(),
            fix_bank_mode: FixBankMode::None,
        };
        sys.bus.mvs = matches!(config.system, SystemKind::Mvs);
        sys
    }

    pub fn set_log_callback(&mut self, cb: LogCallback) {
        self.log = Some(cb);
    }

    fn log(&mut self, level: LogLevel, msg: &str) {
        if let Some(cb) = self.log.as_mut() {
            cb(level, msg);
        }
    }

    // -- Loading ---------------------------------------------------------

    pub fn load_bios<R: std::io::Read + std::io::Seek>(&mut self, reader: R) -> Result<(), LoadError> {
        let bios: BiosSet = rom::load_bios_zip(reader, self.config.system)?;
        self.check_bios_crc(&bios.bios_name, &bios.bios);
        if let Some(name) = &bios.sm1_name {
            self.check_bios_crc(name, &bios.sm1);
        }

        self.bus.lspc.load_l0_rom(&bios.l0);
        self.bus.lspc.load_bios_fix_rom(&bios.sfix);
        self.bus.bios = bios.bios;
        if !bios.sfix.is_empty() {
            self.bus.sm_rom = bios.sm1;
        }
        Ok(())
    }

    fn check_bios_crc(&mut self, member: &str, data: &[u8]) {
        if let Some(expected) = rom::known_bios_crc32(member) {
            let actual = rom::crc32(data);
            if actual != expected {
                self.log(
                    LogLevel::Warn,
                    &format!("BIOS {member}: CRC32 0x{actual:08x}, expected 0x{expected:08x}"),
                );
            }
        }
    }

    pub fn load_cartridge(&mut self, neo_bytes: &[u8]) -> Result<(), LoadError> {
        let mut neo: NeoRom = rom::parse_neo(neo_bytes)?;
        rom::postload_byteswap(&mut neo.p);

        let board = rom::select_board(neo.ngh, &neo.p, neo.p.len());
        self.fix_bank_mode = rom::select_fix_bank_mode(neo.ngh, &neo.p, neo.p.len());
        self.bus.cart = CartController::new(board);
        self.bus.cart_p = neo.p;
        self.bus.m_rom = neo.m;
        self.bus.lspc.load_cart_fix_rom(&neo.s);
        self.bus.lspc.load_c_rom(&neo.c);
        self.bus.sram_present = matches!(
            board,
            Board::NeoPvc | Board::BrezzaSoft | Board::Kof10th
        );
        Ok(())
    }

    // -- Reset -------------------------------------------------------

    /// Hard reset additionally injects IRQ_RESET (vector 3); soft reset
    /// leaves it alone but reinitializes chips and zeros mailbox bytes.
    pub fn reset(&mut self, hard: bool) {
        self.mcycs = 0;
        self.zcycs = 0;
        self.ymcycs = 0;
        self.ymsamps = 0;
        self.bus.watchdog = 0;
        self.bus.sound_code = 0;
        self.bus.sound_reply = 0;
        self.bus.z80_nmi_enabled = false;
        self.bus.z80_nmi_pending = false;

        self.m68k.reset();
        self.z80.reset();

        if hard {
            let vector = {
                let mut view = M68kView(&mut self.bus);
                let hi = view.read(BusMaster::Cpu(0), 0x0000000c) as u32;
                let b1 = view.read(BusMaster::Cpu(0), 0x0000000d) as u32;
                let b2 = view.read(BusMaster::Cpu(0), 0x0000000e) as u32;
                let lo = view.read(BusMaster::Cpu(0), 0x0000000f) as u32;
                (hi << 24) | (b1 << 16) | (b2 << 8) | lo
            };
            self.m68k.pc = vector;
        }
    }

    /// S1: reads the initial PC from the BIOS reset vector at offset 4.
    pub fn initial_pc(&mut self) -> u32 {
        let mut view = M68kView(&mut self.bus);
        let hi = view.read(BusMaster::Cpu(0), 0x00000004) as u32;
        let b1 = view.read(BusMaster::Cpu(0), 0x00000005) as u32;
        let b2 = view.read(BusMaster::Cpu(0), 0x00000006) as u32;
        let lo = view.read(BusMaster::Cpu(0), 0x00000007) as u32;
        (hi << 24) | (b1 << 16) | (b2 << 8) | lo
    }

    // -- Frame loop -------------------------------------------------------

    /// Runs one video frame of audio + pixels. Mirrors the original's
    /// `geo_exec` apportionment of master cycles among 68K/Z80/YM2610/LSPC/RTC.
    pub fn exec(&mut self) {
        let oc: u32 = if self.config.overclock { 0 } else { 1 };
        self.audio_out.clear();

        while self.mcycs < MASTER_CYCLES_PER_FRAME {
            let icycs = {
                let mut view = M68kView(&mut self.bus);
                self.m68k.step_cycles(&mut view)
            };
            self.mcycs += (icycs * DIV_M68K) >> oc;

            if self.bus.mvs {
                self.bus.rtc.sync(icycs >> oc);
            }

            self.bus.lspc.irq2.decrement_by((icycs >> 1) >> oc);
            self.bus.lspc.run(icycs >> oc, self.config.sprite_limit as u16, self.fix_bank_mode);

            while self.zcycs < self.mcycs {
                {
                    let mut view = Z80View(&mut self.bus);
                    self.z80.tick_with_bus(&mut view, BusMaster::Cpu(1));
                }
                self.zcycs += DIV_Z80;
                self.ymcycs += 1;
                if self.ymcycs >= DIV_YM2610 {
                    self.ymcycs -= DIV_YM2610;
                    let sample = self.bus.ym2610.exec();
                    self.audio_out.push(sample);
                    self.ymsamps += 1;
                }
                self.bus.ym2610.tick();
            }
        }

        self.mcycs %= MASTER_CYCLES_PER_FRAME;
        self.zcycs %= MASTER_CYCLES_PER_FRAME;

        self.bus.watchdog += 1;
        if self.bus.watchdog >= self.config.watchdog_frames {
            self.log(LogLevel::Warn, "watchdog reset");
            self.reset(false);
        }
    }

    pub fn audio_samples(&self) -> &[(i16, i16)] {
        &self.audio_out
    }

    pub fn input(&mut self) -> &mut crate::system::input::InputBridge {
        &mut self.bus.input
    }

    pub fn display_size(&self) -> (u32, u32) {
        (crate::device::lspc::WIDTH as u32, (crate::device::lspc::ACTIVE_END - crate::device::lspc::ACTIVE_START) as u32)
    }

    /// Renders the currently composited frame into an RGB24 buffer sized
    /// `width * height * 3`, walking every active scanline.
    pub fn render_frame(&self, out: &mut [u8]) {
        let (w, h) = self.display_size();
        let mut rgba = vec![0u8; w as usize * 4];
        for row in 0..h as usize {
            self.bus.lspc.compose_row(&mut rgba, 0);
            for col in 0..w as usize {
                let src = col * 4;
                let dst = (row * w as usize + col) * 3;
                if dst + 3 <= out.len() {
                    out[dst] = rgba[src + 2];
                    out[dst + 1] = rgba[src + 1];
                    out[dst + 2] = rgba[src];
                }
            }
        }
    }

    // -- Battery-backed storage --------------------------------------

    /// Current NVRAM contents (`.nv`), persisted across sessions.
    pub fn nvram(&self) -> &[u8] {
        &self.bus.nvram
    }

    /// Replaces NVRAM with a previously saved blob. Rejects a size that
    /// doesn't match the in-memory region rather than truncating it.
    pub fn load_nvram(&mut self, data: &[u8]) -> Result<(), LoadError> {
        load_fixed_block(&mut self.bus.nvram, data)
    }

    /// Current memory-card contents (`.mcr`).
    pub fn memcard(&self) -> &[u8] {
        &self.bus.memcard
    }

    pub fn load_memcard(&mut self, data: &[u8]) -> Result<(), LoadError> {
        load_fixed_block(&mut self.bus.memcard, data)
    }

    /// Current cartridge battery RAM (`.srm`), present only on a handful
    /// of boards (NeoPvc, BrezzaSoft, Kof10th).
    pub fn cartram(&self) -> Option<&[u8]> {
        self.bus.sram_present.then(|| self.bus.cart.cartram())
    }

    pub fn load_cartram(&mut self, data: &[u8]) -> Result<(), LoadError> {
        if !self.bus.sram_present {
            return Ok(());
        }
        load_fixed_block(self.bus.cart.cartram_mut(), data)
    }

    // -- Save state --------------------------------------------------

    fn region_byte(&self) -> u8 {
        match self.config.region {
            Region::Us => 0,
            Region::Jp => 1,
            Region::As => 2,
            Region::Eu => 3,
        }
    }

    fn system_byte(&self) -> u8 {
        match self.config.system {
            SystemKind::Aes => 0,
            SystemKind::Mvs => 1,
            SystemKind::UniverseBios => 2,
        }
    }

    /// Computed lazily by performing one dry save into a throwaway buffer,
    /// exactly mirroring the original's lazy sizing.
    pub fn state_size(&mut self) -> usize {
        let mut scratch = vec![0u8; 1 << 20];
        let mut ser = Serializer::new();
        self.state_save(&mut ser, &mut scratch);
        ser.size()
    }

    pub fn state_save(&mut self, ser: &mut Serializer, buf: &mut [u8]) {
        ser.begin();
        ser.push8(buf, self.region_byte());
        ser.push8(buf, self.system_byte());
        ser.push32(buf, self.mcycs);
        ser.push32(buf, self.zcycs);
        ser.push32(buf, self.ymcycs);

        ser.push8(buf, self.bus.lspc.irq2.control as u8);
        ser.push32(buf, self.bus.lspc.irq2.reload);
        ser.push32(buf, self.bus.lspc.irq2.counter);
        ser.push32(buf, self.bus.lspc.irq2.frag);
        ser.push32(buf, self.bus.lspc.irq2.dec);

        ser.pushblk(buf, &self.bus.nvram, self.bus.nvram.len());
        ser.pushblk(buf, &self.bus.memcard, self.bus.memcard.len());
        if self.bus.sram_present {
            let cartram = self.bus.cart.cartram();
            ser.pushblk(buf, cartram, cartram.len());
        }

        ser.push32(buf, self.bus.watchdog);
        ser.push8(buf, self.bus.sound_code);
        ser.push8(buf, self.bus.sound_reply);

        self.bus.lspc.save_state(ser, buf);
        self.bus.cart.save_state(ser, buf);

        // 68K registers
        for &d in &self.m68k.d {
            ser.push32(buf, d);
        }
        for &a in &self.m68k.a {
            ser.push32(buf, a);
        }
        ser.push32(buf, self.m68k.pc);
        ser.push16(buf, self.m68k.sr);

        self.bus.rtc.save_state(ser, buf);
        self.bus.ym2610.save_state(ser, buf);

        // Z80 registers
        ser.push8(buf, self.z80.a);
        ser.push8(buf, self.z80.f);
        ser.push8(buf, self.z80.b);
        ser.push8(buf, self.z80.c);
        ser.push8(buf, self.z80.d);
        ser.push8(buf, self.z80.e);
        ser.push8(buf, self.z80.h);
        ser.push8(buf, self.z80.l);
        ser.push16(buf, self.z80.ix);
        ser.push16(buf, self.z80.iy);
        ser.push16(buf, self.z80.sp);
        ser.push16(buf, self.z80.pc);
    }

    pub fn state_load(&mut self, ser: &mut Serializer, buf: &[u8]) -> Result<(), StateError> {
        ser.begin();
        let region = ser.pop8(buf);
        let system = ser.pop8(buf);
        if region != self.region_byte() || system != self.system_byte() {
            return Err(StateError::Mismatch {
                expected: (self.region_byte(), self.system_byte()),
                actual: (region, system),
            });
        }

        self.mcycs = ser.pop32(buf);
        self.zcycs = ser.pop32(buf);
        self.ymcycs = ser.pop32(buf);

        self.bus.lspc.irq2.control = ser.pop8(buf) as u16;
        self.bus.lspc.irq2.reload = ser.pop32(buf);
        self.bus.lspc.irq2.counter = ser.pop32(buf);
        self.bus.lspc.irq2.frag = ser.pop32(buf);
        self.bus.lspc.irq2.dec = ser.pop32(buf);

        let nvram_len = self.bus.nvram.len();
        let mut nvram = vec![0u8; nvram_len];
        ser.popblk(&mut nvram, buf, nvram_len);
        self.bus.nvram = nvram;

        let memcard_len = self.bus.memcard.len();
        let mut memcard = vec![0u8; memcard_len];
        ser.popblk(&mut memcard, buf, memcard_len);
        self.bus.memcard = memcard;

        if self.bus.sram_present {
            let len = self.bus.cart.cartram().len();
            let mut cartram = vec![0u8; len];
            ser.popblk(&mut cartram, buf, len);
            self.bus.cart.cartram_mut().copy_from_slice(&cartram);
        }

        self.bus.watchdog = ser.pop32(buf);
        self.bus.sound_code = ser.pop8(buf);
        self.bus.sound_reply = ser.pop8(buf);

        self.bus.lspc.load_state(ser, buf);
        self.bus.cart.load_state(ser, buf);

        for d in self.m68k.d.iter_mut() {
            *d = ser.pop32(buf);
        }
        for a in self.m68k.a.iter_mut() {
            *a = ser.pop32(buf);
        }
        self.m68k.pc = ser.pop32(buf);
        self.m68k.sr = ser.pop16(buf);

        self.bus.rtc.load_state(ser, buf);
        self.bus.ym2610.load_state(ser, buf);

        self.z80.a = ser.pop8(buf);
        self.z80.f = ser.pop8(buf);
        self.z80.b = ser.pop8(buf);
        self.z80.c = ser.pop8(buf);
        self.z80.d = ser.pop8(buf);
        self.z80.e = ser.pop8(buf);
        self.z80.h = ser.pop8(buf);
        self.z80.l = ser.pop8(buf);
        self.z80.ix = ser.pop16(buf);
        self.z80.iy = ser.pop16(buf);
        self.z80.sp = ser.pop16(buf);
        self.z80.pc = ser.pop16(buf);

        Ok(())
    }
}

fn load_fixed_block(dst: &mut [u8], data: &[u8]) -> Result<(), LoadError> {
    if data.len() != dst.len() {
        return Err(LoadError::SaveSizeMismatch { expected: dst.len(), actual: data.len() });
    }
    dst.copy_from_slice(data);
    Ok(())
}
