//! Neo Geo AES/MVS system, wrapping [`neogeo_core::system::System`] behind
//! the frontend-facing [`Machine`] trait.

use neogeo_core::config::SystemConfig;
use neogeo_core::core::machine::{InputButton, Machine};
use neogeo_core::error::LoadError;
use neogeo_core::system::System;

pub const INPUT_P1_UP: u8 = 0;
pub const INPUT_P1_DOWN: u8 = 1;
pub const INPUT_P1_LEFT: u8 = 2;
pub const INPUT_P1_RIGHT: u8 = 3;
pub const INPUT_P1_A: u8 = 4;
pub const INPUT_P1_B: u8 = 5;
pub const INPUT_P1_C: u8 = 6;
pub const INPUT_P1_D: u8 = 7;
pub const INPUT_P1_START: u8 = 8;
pub const INPUT_P1_SELECT: u8 = 9;
pub const INPUT_P2_UP: u8 = 10;
pub const INPUT_P2_DOWN: u8 = 11;
pub const INPUT_P2_LEFT: u8 = 12;
pub const INPUT_P2_RIGHT: u8 = 13;
pub const INPUT_P2_A: u8 = 14;
pub const INPUT_P2_B: u8 = 15;
pub const INPUT_P2_C: u8 = 16;
pub const INPUT_P2_D: u8 = 17;
pub const INPUT_P2_START: u8 = 18;
pub const INPUT_P2_SELECT: u8 = 19;
pub const INPUT_COIN1: u8 = 20;
pub const INPUT_COIN2: u8 = 21;

const NEOGEO_INPUT_MAP: &[InputButton] = &[
    InputButton { id: INPUT_P1_UP, name: "P1 Up" },
    InputButton { id: INPUT_P1_DOWN, name: "P1 Down" },
    InputButton { id: INPUT_P1_LEFT, name: "P1 Left" },
    InputButton { id: INPUT_P1_RIGHT, name: "P1 Right" },
    InputButton { id: INPUT_P1_A, name: "P1 A" },
    InputButton { id: INPUT_P1_B, name: "P1 B" },
    InputButton { id: INPUT_P1_C, name: "P1 C" },
    InputButton { id: INPUT_P1_D, name: "P1 D" },
    InputButton { id: INPUT_P1_START, name: "P1 Start" },
    InputButton { id: INPUT_P1_SELECT, name: "P1 Select" },
    InputButton { id: INPUT_P2_UP, name: "P2 Up" },
    InputButton { id: INPUT_P2_DOWN, name: "P2 Down" },
    InputButton { id: INPUT_P2_LEFT, name: "P2 Left" },
    InputButton { id: INPUT_P2_RIGHT, name: "P2 Right" },
    InputButton { id: INPUT_P2_A, name: "P2 A" },
    InputButton { id: INPUT_P2_B, name: "P2 B" },
    InputButton { id: INPUT_P2_C, name: "P2 C" },
    InputButton { id: INPUT_P2_D, name: "P2 D" },
    InputButton { id: INPUT_P2_START, name: "P2 Start" },
    InputButton { id: INPUT_P2_SELECT, name: "P2 Select" },
    InputButton { id: INPUT_COIN1, name: "Coin 1" },
    InputButton { id: INPUT_COIN2, name: "Coin 2" },
];

/// Per-button held state, latched by `set_input` and read back by the
/// joypad/system-status callbacks installed on the wrapped [`System`].
#[derive(Default, Clone, Copy)]
struct InputLatch {
    p1: u8,
    p2: u8,
    coins: u8,
}

impl InputLatch {
    fn joypad_byte(&self, port: usize) -> u8 {
        // Active-low: a held bit clears the corresponding released-high bit.
        !(if port == 0 { self.p1 } else { self.p2 })
    }

    fn status_a_byte(&self) -> u8 {
        !self.coins
    }
}

pub struct NeoGeoSystem {
    inner: System,
    input: std::rc::Rc<std::cell::RefCell<InputLatch>>,
}

impl NeoGeoSystem {
    pub fn new(config: SystemConfig) -> Self {
        let mut inner = System::new(config);
        let input = std::rc::Rc::new(std::cell::RefCell::new(InputLatch::default()));

        let p1 = input.clone();
        inner.input().set_joypad_callback(0, Box::new(move || p1.borrow().joypad_byte(0)));
        let p2 = input.clone();
        inner.input().set_joypad_callback(1, Box::new(move || p2.borrow().joypad_byte(1)));
        let status = input.clone();
        inner.input().set_system_callback(
            neogeo_core::system::input::SYS_STATUS_A,
            Box::new(move || status.borrow().status_a_byte()),
        );

        Self { inner, input }
    }

    pub fn load_bios<R: std::io::Read + std::io::Seek>(&mut self, reader: R) -> Result<(), LoadError> {
        self.inner.load_bios(reader)
    }

    pub fn load_cartridge(&mut self, neo_bytes: &[u8]) -> Result<(), LoadError> {
        self.inner.load_cartridge(neo_bytes)
    }

    pub fn inner(&self) -> &System {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut System {
        &mut self.inner
    }

    /// Battery-backed blobs persisted across sessions, mirroring the
    /// three files a frontend would keep alongside a ROM: NVRAM, cartridge
    /// RAM (only on boards that carry it), and memory card.
    pub fn nvram(&self) -> &[u8] {
        self.inner.nvram()
    }

    pub fn load_nvram(&mut self, data: &[u8]) -> Result<(), LoadError> {
        self.inner.load_nvram(data)
    }

    pub fn cartram(&self) -> Option<&[u8]> {
        self.inner.cartram()
    }

    pub fn load_cartram(&mut self, data: &[u8]) -> Result<(), LoadError> {
        self.inner.load_cartram(data)
    }

    pub fn memcard(&self) -> &[u8] {
        self.inner.memcard()
    }

    pub fn load_memcard(&mut self, data: &[u8]) -> Result<(), LoadError> {
        self.inner.load_memcard(data)
    }
}

impl Machine for NeoGeoSystem {
    fn display_size(&self) -> (u32, u32) {
        self.inner.display_size()
    }

    fn run_frame(&mut self) {
        self.inner.exec();
    }

    fn render_frame(&self, buffer: &mut [u8]) {
        self.inner.render_frame(buffer);
    }

    fn set_input(&mut self, button: u8, pressed: bool) {
        let mut latch = self.input.borrow_mut();
        let bit = |word: &mut u8, shift: u8| {
            if pressed {
                *word |= 1 << shift;
            } else {
                *word &= !(1 << shift);
            }
        };
        match button {
            INPUT_P1_UP..=INPUT_P1_SELECT => bit(&mut latch.p1, button - INPUT_P1_UP),
            INPUT_P2_UP..=INPUT_P2_SELECT => bit(&mut latch.p2, button - INPUT_P2_UP),
            INPUT_COIN1 => bit(&mut latch.coins, 0),
            INPUT_COIN2 => bit(&mut latch.coins, 1),
            _ => {}
        }
    }

    fn input_map(&self) -> &[InputButton] {
        NEOGEO_INPUT_MAP
    }

    fn reset(&mut self) {
        self.inner.reset(true);
    }
}
