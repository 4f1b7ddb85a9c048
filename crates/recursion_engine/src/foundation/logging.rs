//! Logging utilities and structured logging support

/// Initialize the logging system
///
/// `RUST_LOG` wins when set; otherwise `default_filter` (for example `"info"` or
/// `"recursion_engine=debug"`) decides what is printed. Calling this twice is harmless:
/// the second logger is rejected and a warning goes to the first one.
pub fn init(default_filter: &str) {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::warn!("Logger already initialized, keeping the existing one");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_keeps_first_logger() {
        init("warn");
        init("trace");
        log::warn!("still logging after a second init");
    }
}
