//!
//! log system
//!

use {
    std::{env, io},
    tracing_subscriber::{filter::LevelFilter, EnvFilter},
};

const QUIET_MODULES: &str =
    "actix_web=warn,actix_server=warn,actix_http=warn,rustls=warn";

/// Install the global `tracing` subscriber.
///
/// `verbose` turns on `debug` either for every module (`Some("")`)
/// or for a single one (`Some("allforone")`). `RUST_LOG` directives
/// win over both; without `RUST_LOG` the floor is `info`.
pub fn init_logging(verbose: Option<&str>) {
    let rust_log = env::var("RUST_LOG").ok().filter(|s| !s.is_empty());

    let mut env_filter = EnvFilter::new(QUIET_MODULES);
    if rust_log.is_none() {
        env_filter = env_filter.add_directive(LevelFilter::INFO.into());
    }

    if let Some(module) = verbose {
        if module.is_empty() {
            env_filter = env_filter.add_directive(LevelFilter::DEBUG.into());
        } else {
            match format!("{module}=debug").parse() {
                Ok(directive) => env_filter = env_filter.add_directive(directive),
                Err(err) => eprintln!("Ignoring verbose module `{module}`: {err}"),
            }
        }
    }

    if let Some(rust_log) = rust_log {
        for directive in rust_log.split(',').filter_map(|s| match s.parse() {
            Ok(directive) => Some(directive),
            Err(err) => {
                eprintln!("Ignoring directive `{s}`: {err}");
                None
            }
        }) {
            env_filter = env_filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}
