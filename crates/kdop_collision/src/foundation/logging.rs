//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system from `RUST_LOG`; later calls are ignored
pub fn init() {
    let _ = env_logger::try_init();
}

/// Initialize logging for unit tests; safe to call from every test
pub fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_can_be_repeated() {
        init_for_tests();
        init();
        init();
        assert!(log::max_level() >= log::LevelFilter::Error);
        debug!("logging initialized");
    }
}
