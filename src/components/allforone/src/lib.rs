//!
//! # All-for-one distribution agent
//!
//! Every `frequency` blocks, pays everything a contract account received
//! to a single payer, picked with a chance proportional to its share.
//!

pub mod api;
pub mod collector;
pub mod ledger;
pub mod poller;
pub mod selector;
pub mod status;
pub mod trigger;
pub mod watermark;

pub use {
    ledger::{Account, Ledger, PaymentEvent, SubmissionReceipt},
    trigger::{CycleError, Outcome, SkipReason, Trigger},
};
