//!
//! # Configuration of the all-for-one payment agent
//!
//! - `contract`: the per-contract settings file (chain, frequency, account)
//! - `contract::global_cfg`: process-wide flags and environment variables
//!

pub mod contract;
