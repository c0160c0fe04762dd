pub mod config;
pub mod core;
pub mod cpu;
pub mod device;
pub mod error;
pub mod log;
pub mod rom;
pub mod serial;
pub mod system;

pub mod prelude {
    pub use crate::core::machine::{InputButton, Machine};
    pub use crate::core::{Bus, BusMaster, BusMasterComponent, Component, bus::InterruptState};
    pub use crate::cpu::Cpu;
    pub use crate::error::{LoadError, StateError};
    pub use crate::system::System;
}
