pub mod cartridge;
pub mod lspc;
pub mod rtc;
pub mod ym2610;

pub use cartridge::CartController;
pub use lspc::Lspc;
pub use rtc::Rtc;
pub use ym2610::Ym2610;
