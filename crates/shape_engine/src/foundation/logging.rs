//! Logger installation
//!
//! The library emits records through the `log` macros directly; these
//! helpers install `env_logger` for applications and tests.

/// Initialize the logging system (reads `RUST_LOG`)
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system, ignoring an already installed logger
///
/// Useful in tests where several cases may race to install the logger.
pub fn try_init() -> bool {
    env_logger::try_init().is_ok()
}
