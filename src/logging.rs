/// Initialize the logger with the specified verbosity level.
///
/// `RUST_LOG` takes precedence when set.
///
/// # Arguments
/// * `verbose` - Verbosity level (0=info, 1=debug, 2+=trace)
pub fn setup_logger(verbose: u8) {
    let env = env_logger::Env::default().default_filter_or(filter_for(verbose));
    env_logger::Builder::from_env(env)
        .format_module_path(false)
        .init();
}

fn filter_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "ocp_demo_app=info,actix_web=info",
        1 => "ocp_demo_app=debug,actix_web=info",
        _ => "ocp_demo_app=trace,actix_web=debug",
    }
}
