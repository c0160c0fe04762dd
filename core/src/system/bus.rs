//! The shared hardware aggregate behind both CPU buses.
//!
//! Z80 and 68000 need to reach into the same mailbox, YM2610, LSPC, RTC,
//! and cart controller. Rather than back-pointers between two owning
//! structs, both CPUs see the same [`MachineBus`] through a thin
//! per-CPU view (`Z80View`/`M68kView`) that implements the generic
//! [`Bus`] trait with that CPU's address/data width.

use crate::core::bus::{Bus, BusMaster, InterruptState};
use crate::device::cartridge::CartController;
use crate::device::lspc::Lspc;
use crate::device::rtc::Rtc;
use crate::device::ym2610::{NullYmEngine, Ym2610};
use crate::system::input::InputBridge;

pub const NVRAM_SIZE: usize = 0x10000;
pub const MEMCARD_SIZE: usize = 0x800;
pub const WORK_RAM_SIZE: usize = 0x10000;
pub const Z80_WORK_RAM_SIZE: usize = 0x800;

pub struct MachineBus {
    // -- Z80 side --
    pub m_rom: Vec<u8>,
    pub sm_rom: Vec<u8>,
    pub board_fix_active: bool,
    pub z_bank: [u32; 4],
    pub z_work_ram: [u8; Z80_WORK_RAM_SIZE],

    pub sound_code: u8,
    pub sound_reply: u8,
    pub z80_nmi_enabled: bool,
    pub z80_nmi_pending: bool,

    pub ym2610: Ym2610<NullYmEngine>,

    // -- 68000 side --
    pub bios: Vec<u8>,
    pub work_ram: [u8; WORK_RAM_SIZE],
    pub nvram: Vec<u8>,
    pub memcard: Vec<u8>,
    pub sram_present: bool,

    pub cart_p: Vec<u8>,
    pub cart: CartController,
    pub vectable_bios: bool,

    pub lspc: Lspc,
    pub rtc: Rtc,
    pub input: InputBridge,

    pub watchdog: u32,
    pub mvs: bool,

    /// Tracks the last VRAMADDR byte-write so the 8-bit-into-16-bit merge
    /// idiom (both halves of an MMR word duplicate the written byte) has
    /// somewhere to read the other half from; VRAMADDR itself is write-only.
    vramaddr_latch: u16,
}

impl MachineBus {
    pub fn new(cart: CartController) -> Self {
        Self {
            m_rom: Vec::new(),
            sm_rom: Vec::new(),
            board_fix_active: false,
            z_bank: [0; 4],
            z_work_ram: [0; Z80_WORK_RAM_SIZE],
            sound_code: 0,
            sound_reply: 0,
            z80_nmi_enabled: false,
            z80_nmi_pending: false,
            ym2610: Ym2610::with_null_engine(),
            bios: Vec::new(),
            work_ram: [0; WORK_RAM_SIZE],
            nvram: vec![0; NVRAM_SIZE],
            memcard: vec![0; MEMCARD_SIZE],
            sram_present: false,
            cart_p: Vec::new(),
            cart,
            vectable_bios: true,
            lspc: Lspc::new(),
            rtc: Rtc::new(),
            input: InputBridge::new(),
            watchdog: 0,
            mvs: true,
            vramaddr_latch: 0,
        }
    }

    /// 68K write `0x320000`: set sound_code and pulse Z80 NMI (if enabled).
    pub fn mailbox_68k_write(&mut self, data: u8) {
        self.sound_code = data;
        if self.z80_nmi_enabled {
            self.z80_nmi_pending = true;
        }
    }

    pub fn mailbox_68k_read(&self) -> u8 {
        self.sound_reply
    }
}

// ---------------------------------------------------------------------
// Z80 view
// ---------------------------------------------------------------------

pub struct Z80View<'a>(pub &'a mut MachineBus);

fn z80_bank_window(addr: u16) -> Option<usize> {
    match addr {
        0x8000..=0xbfff => Some(0),
        0xc000..=0xdfff => Some(1),
        0xe000..=0xefff => Some(2),
        0xf000..=0xf7ff => Some(3),
        _ => None,
    }
}

impl<'a> Bus for Z80View<'a> {
    type Address = u16;
    type Data = u8;

    fn read(&mut self, _master: BusMaster, addr: u16) -> u8 {
        let bus = &mut *self.0;
        match addr {
            0x0000..=0x7fff => {
                let rom = if bus.board_fix_active && !bus.sm_rom.is_empty() {
                    &bus.sm_rom
                } else {
                    &bus.m_rom
                };
                rom.get(addr as usize).copied().unwrap_or(0xff)
            }
            0xf800..=0xffff => bus.z_work_ram[(addr - 0xf800) as usize],
            _ => {
                if let Some(win) = z80_bank_window(addr) {
                    let bank_base = bus.z_bank[win] as usize;
                    let local = addr as usize - window_base(win);
                    bus.m_rom.get(bank_base + local).copied().unwrap_or(0xff)
                } else {
                    0xff
                }
            }
        }
    }

    fn write(&mut self, _master: BusMaster, addr: u16, data: u8) {
        let bus = &mut *self.0;
        if (0xf800..=0xffff).contains(&addr) {
            bus.z_work_ram[(addr - 0xf800) as usize] = data;
        }
    }

    /// IO ports: `0x00` clears sound_code; `0x04-0x07` YM2610; `0x08-0x0b`
    /// write enables NMIs (read performs the bankswitch); `0x0c` stores
    /// `sound_reply`; `0x18` disables NMIs.
    fn io_read(&mut self, _master: BusMaster, addr: u16) -> u8 {
        let bus = &mut *self.0;
        let port = addr & 0xff;
        match port {
            0x00 => {
                bus.z80_nmi_pending = false;
                bus.sound_code
            }
            0x04..=0x07 => bus.ym2610.read((port - 0x04) as u8),
            0x08..=0x0b => {
                let win = (0x0b - port) as usize;
                let window_size = [0x4000u32, 0x2000, 0x1000, 0x0800][win];
                bus.z_bank[win] = (addr >> 8) as u32 * window_size;
                0xff
            }
            _ => 0xff,
        }
    }

    fn io_write(&mut self, _master: BusMaster, addr: u16, data: u8) {
        let bus = &mut *self.0;
        let port = addr & 0xff;
        match port {
            0x00 => bus.sound_code = 0,
            0x04..=0x07 => bus.ym2610.write((port - 0x04) as u8, data),
            0x08..=0x0b => bus.z80_nmi_enabled = true,
            0x0c => bus.sound_reply = data,
            0x18 => bus.z80_nmi_enabled = false,
            _ => {}
        }
    }

    fn is_halted_for(&self, _master: BusMaster) -> bool {
        false
    }

    fn check_interrupts(&self, _target: BusMaster) -> InterruptState {
        InterruptState {
            nmi: self.0.z80_nmi_pending,
            irq: self.0.ym2610.irq_pending(),
            firq: false,
        }
    }
}

fn window_base(win: usize) -> usize {
    match win {
        0 => 0x8000,
        1 => 0xc000,
        2 => 0xe000,
        3 => 0xf000,
        _ => unreachable!(),
    }
}

// ---------------------------------------------------------------------
// 68000 view
// ---------------------------------------------------------------------

pub struct M68kView<'a>(pub &'a mut MachineBus);

impl<'a> Bus for M68kView<'a> {
    type Address = u32;
    type Data = u8;

    fn read(&mut self, _master: BusMaster, addr: u32) -> u8 {
        let bus = &mut *self.0;
        match addr {
            0x000000..=0x0000ff => {
                if bus.vectable_bios {
                    bus.bios.get(addr as usize).copied().unwrap_or(0xff)
                } else {
                    bus.cart.read_fixed_8(&bus.cart_p, addr)
                }
            }
            0x000100..=0x0fffff => bus.cart.read_fixed_8(&bus.cart_p, addr),
            0x100000..=0x1fffff => bus.work_ram[(addr & 0xffff) as usize],
            0x200000..=0x2fffff => bus.cart.read_banksw_8(&bus.cart_p, addr),
            0x300000..=0x3fffff => read_mmr_8(bus, addr),
            0x400000..=0x7fffff => {
                let off = (addr & 0x1fff) as u16;
                (bus.lspc.palette_read16(off) >> (8 * (1 - (addr & 1)))) as u8
            }
            0x800000..=0xbfffff => bus.memcard[(addr as usize / 2) & (MEMCARD_SIZE - 1)],
            0xc00000..=0xcfffff => {
                let len = bus.bios.len().max(1);
                bus.bios[(addr as usize) % len]
            }
            0xd00000..=0xdfffff if bus.mvs => bus.nvram[(addr as usize) & (NVRAM_SIZE - 1)],
            _ => 0xff,
        }
    }

    fn write(&mut self, _master: BusMaster, addr: u32, data: u8) {
        let bus = &mut *self.0;
        match addr {
            0x000000..=0x0fffff => {}
            0x100000..=0x1fffff => bus.work_ram[(addr & 0xffff) as usize] = data,
            0x200000..=0x2fffff => bus.cart.write_banksw_8(addr, data),
            0x300000..=0x3fffff => write_mmr_8(bus, addr, data),
            0x400000..=0x7fffff => {
                let off = (addr & 0x1fff) as u16;
                let cur = bus.lspc.palette_read16(off);
                let shift = 8 * (1 - (addr & 1));
                let merged = (cur & !(0xff << shift)) | ((data as u16) << shift);
                bus.lspc.palette_write16(off, merged);
            }
            0x800000..=0xbfffff => bus.memcard[(addr as usize / 2) & (MEMCARD_SIZE - 1)] = data,
            0xd00000..=0xdfffff if bus.mvs => bus.nvram[(addr as usize) & (NVRAM_SIZE - 1)] = data,
            _ => {}
        }
    }

    fn is_halted_for(&self, _master: BusMaster) -> bool {
        false
    }

    fn check_interrupts(&self, _target: BusMaster) -> InterruptState {
        InterruptState {
            nmi: false,
            irq: self.0.lspc.vblank_pending || self.0.lspc.hblank_pending || self.0.lspc.irq2.pending,
            firq: false,
        }
    }
}

fn read_mmr_8(bus: &mut MachineBus, addr: u32) -> u8 {
    match addr & 0xffffff {
        0x300000 => bus.input.read_joypad(0),
        0x300001 => 0xff,
        0x300081 => 0xff,
        0x320000 => bus.mailbox_68k_read(),
        0x320001 => (bus.rtc.read() << 6) | 0x3f,
        0x340000 => bus.input.read_joypad(1),
        0x380000 => bus.input.read_system(crate::system::input::SYS_STATUS_B),
        _ => 0xff,
    }
}

fn write_mmr_8(bus: &mut MachineBus, addr: u32, data: u8) {
    match addr & 0xffffff {
        0x300000 => bus.watchdog = 0,
        0x320000 => bus.mailbox_68k_write(data),
        0x380051 => bus.rtc.write(data & 1 != 0, data & 2 != 0, data & 4 != 0),
        0x3a0001 => bus.lspc.set_shadow(data & 1 != 0),
        0x3a0003 => bus.vectable_bios = data & 1 == 0,
        0x3a0009 => {
            bus.board_fix_active = data & 1 != 0;
            bus.lspc.set_fix_bank_active(data & 1 != 0);
        }
        0x3c0000 | 0x3c0001 => {
            let shift = if addr & 1 == 0 { 8 } else { 0 };
            bus.vramaddr_latch =
                (bus.vramaddr_latch & !(0xff << shift)) | ((data as u16) << shift);
            bus.lspc.vramaddr_write(bus.vramaddr_latch);
        }
        0x3c0002 | 0x3c0003 => {
            let v = ((data as u16) << 8) | (data as u16);
            bus.lspc.vram_write(v);
        }
        0x3c0004 | 0x3c0005 => {
            let v = ((data as i8 as i16) << 8) | (data as i16 & 0xff);
            bus.lspc.vrammod_write(v);
        }
        0x3c0006 | 0x3c0007 => bus.lspc.aa_mode_write(((data as u16) << 8) | (data as u16)),
        _ => {}
    }
}
