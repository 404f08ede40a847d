pub mod frame;
mod host;
pub mod keys;

pub use host::TerminalHost;
