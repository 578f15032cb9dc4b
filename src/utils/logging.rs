use log::LevelFilter;

pub fn print_verbose(verbose: bool, msg: &str) {
    if verbose {
        println!("Verbose: {}", msg);
    }
}

/// Initialize the `log` backend for the binary.
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects debug output for
/// this crate and warnings for everything else.
pub fn init_logger(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(LevelFilter::Warn)
        .filter_module("modstack_relay", level)
        .format_target(false)
        .parse_default_env();

    // A second init (e.g. from tests) is harmless.
    let _ = builder.try_init();
}
