//! Library components of the `tariff-nav` command.

pub mod logging;
pub mod render;
pub mod session;
