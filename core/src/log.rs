//! Host-installed logging callback.
//!
//! The original core never prints directly; it calls back into the host
//! with a level and a formatted message (`geo_log_set_callback`). This
//! crate follows the same convention rather than depending on `log` or
//! `tracing`: [`System`](crate::system::System) holds a boxed closure and
//! every internal log site goes through [`System::log`](crate::system::System::log).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

pub type LogCallback = Box<dyn FnMut(LogLevel, &str)>;
