//!
//! # Global common utils
//!

#![deny(warnings)]
#![deny(missing_docs)]

pub mod logging;

use std::{fs, path::PathBuf, result::Result as StdResult, time::Duration};

/// Perform a synchronize http get request with attohttpc,
/// and parse the response as a String
#[inline(always)]
pub fn http_get_request(
    query: &str,
    timeout: Duration,
) -> StdResult<String, attohttpc::Error> {
    attohttpc::get(query)
        .timeout(timeout)
        .send()?
        .error_for_status()?
        .text()
}

/// Create a new temporary directory for an `allforone` data dir
pub fn fresh_tmp_dir() -> PathBuf {
    let basedir = std::env::temp_dir();
    let basedirname = "allforone_data";
    loop {
        let name = format!("{}_{}", basedirname, rand::random::<u64>());
        let path = basedir.join(name);
        let _ = fs::remove_dir_all(&path);
        if fs::create_dir(&path).is_ok() {
            return path;
        }
    }
}

/// Render an amount of base units with thousands separators, for logs.
pub fn commas(input: u64) -> String {
    let digits = input.to_string();
    let mut res = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            res.push(',');
        }
        res.push(c);
    }
    res
}
