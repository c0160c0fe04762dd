pub mod neogeo;

pub use neogeo::NeoGeoSystem;
