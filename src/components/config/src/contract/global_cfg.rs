//!
//! Process-wide settings of `allforoned`, from flags with env fallbacks.
//!

#[cfg(not(test))]
use {
    clap::{arg, crate_authors, Command},
    std::env,
};
use {lazy_static::lazy_static, ruc::*};

lazy_static! {
    /// Global agent config.
    pub static ref CFG: Config = pnk!(get_config());
}

#[derive(Debug, Default)]
pub struct Config {
    pub contract_file: String,
    pub node_url: String,
    pub status_host: String,
    pub status_port: u16,
    pub data_dir: String,
    pub poll_interval_ms: u64,
    pub verbose: Option<String>,
}

#[cfg(test)]
fn get_config() -> Result<Config> {
    Ok(Config {
        contract_file: "./allforone.toml".to_owned(),
        node_url: "http://127.0.0.1:27876".to_owned(),
        status_host: "127.0.0.1".to_owned(),
        status_port: 8670,
        data_dir: globutils::fresh_tmp_dir().to_string_lossy().into_owned(),
        poll_interval_ms: 100,
        verbose: None,
    })
}

#[cfg(not(test))]
fn get_config() -> Result<Config> {
    let m = Command::new("allforoned")
        .bin_name("allforoned")
        .version(env!("CARGO_PKG_VERSION"))
        .author(crate_authors!())
        .about("Pays everything received every N blocks to one weighted-random payer.")
        .args([
            arg!(-c --"contract-file" <"Path"> "the contract settings, default to ./allforone.toml"),
            arg!(-n --"node-url" <"URL"> "the ledger node API, default to http://127.0.0.1:27876"),
            arg!(--"status-host" <"IP"> "listen address of the status service"),
            arg!(--"status-port" <"Port"> "listen port of the status service"),
            arg!(-d --"data-dir" <"Path"> "where the distribution watermark is stored"),
            arg!(--"poll-interval-ms" <"Millis"> "how often the node height is polled"),
            arg!(-v --verbose [Module] "debug logs, for all modules or the named one")
                .default_missing_value(""),
        ])
        .get_matches();

    let cf = m
        .get_one::<String>("contract-file")
        .map(|v| v.to_owned())
        .or_else(|| env::var("ALLFORONE_CONTRACT_FILE").ok())
        .unwrap_or_else(|| "./allforone.toml".to_owned());
    let nu = m
        .get_one::<String>("node-url")
        .map(|v| v.to_owned())
        .or_else(|| env::var("ALLFORONE_NODE_URL").ok())
        .unwrap_or_else(|| "http://127.0.0.1:27876".to_owned());
    let sh = m
        .get_one::<String>("status-host")
        .map(|v| v.to_owned())
        .or_else(|| env::var("ALLFORONE_STATUS_HOST").ok())
        .unwrap_or_else(|| "0.0.0.0".to_owned());
    let sp = m
        .get_one::<String>("status-port")
        .map(|v| v.to_owned())
        .or_else(|| env::var("ALLFORONE_STATUS_PORT").ok())
        .unwrap_or_else(|| "8670".to_owned())
        .parse::<u16>()
        .c(d!("'status-port' must be a port number"))?;
    let dd = m
        .get_one::<String>("data-dir")
        .map(|v| v.to_owned())
        .or_else(|| env::var("ALLFORONE_DATA_DIR").ok())
        .map(Ok)
        .unwrap_or_else(|| {
            env::var("HOME")
                .c(d!())
                .map(|home| format!("{home}/.allforone"))
        })?;
    let pi = m
        .get_one::<String>("poll-interval-ms")
        .map(|v| v.to_owned())
        .or_else(|| env::var("ALLFORONE_POLL_INTERVAL_MS").ok())
        .unwrap_or_else(|| "5000".to_owned())
        .parse::<u64>()
        .c(d!("'poll-interval-ms' must be an integer"))?;
    let vb = m.get_one::<String>("verbose").map(|v| v.to_owned());

    Ok(Config {
        contract_file: cf,
        node_url: nu.trim_end_matches('/').to_owned(),
        status_host: sh,
        status_port: sp,
        data_dir: dd,
        poll_interval_ms: pi.max(1),
        verbose: vb,
    })
}
