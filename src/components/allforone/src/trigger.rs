//!
//! # The per-block distribution cycle
//!
//! Every `frequency` blocks, everything the contract account received
//! since the last payout goes to one of its payers, drawn with a chance
//! proportional to what each one paid. The transfer fee is taken out of
//! the pot.
//!
//! A block either:
//! - is skipped (off-trigger height, already paid, nothing received)
//! - pays one winner and moves the watermark to itself
//! - fails with a [`CycleError`], leaving the watermark where it was
//!
//! The first trigger of an account with no watermark records where its
//! window started, so a failed first payout rolls into the next window.
//!

use {
    crate::{
        collector,
        ledger::{Account, Ledger, SubmissionReceipt},
        selector::{self, WeightTable},
        watermark::WatermarkStore,
    },
    config::contract::ContractConfig,
    globutils::commas,
    parking_lot::RwLock,
    rand_core::RngCore,
    ruc::*,
    std::{fmt, result::Result as StdResult, sync::Arc},
    tracing::{debug, error, info, trace, warn},
};

/// Why a block did not pay anybody, without anything being wrong.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// `height % frequency != 0`
    OffTrigger,
    /// The watermark is already at, or past, this height.
    AlreadyDistributed,
    /// Nobody paid the contract in the window.
    EmptyWindow,
}

/// What one block did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Skipped(SkipReason),
    Distributed {
        cycle: DistributionCycle,
        payout: PayoutIntent,
        receipt: SubmissionReceipt,
    },
}

/// A cycle that could not complete.
#[derive(Debug)]
pub enum CycleError {
    /// Missing or invalid settings.
    Configuration(Box<dyn RucError>),
    /// The payments of the window could not be loaded.
    Collection(Box<dyn RucError>),
    /// The collected amounts do not form a usable weight table.
    Selection(Box<dyn RucError>),
    /// No fee, so no payout.
    FeeEstimation(Box<dyn RucError>),
    /// The broadcaster did not accept the payout.
    Submission(Box<dyn RucError>),
    /// The payout went out, but its watermark could not be saved.
    Watermark {
        payout: PayoutIntent,
        receipt: SubmissionReceipt,
        cause: Box<dyn RucError>,
    },
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleError::Configuration(e) => write!(f, "configuration error: {e}"),
            CycleError::Collection(e) => write!(f, "collection error: {e}"),
            CycleError::Selection(e) => write!(f, "selection error: {e}"),
            CycleError::FeeEstimation(e) => write!(f, "fee estimation error: {e}"),
            CycleError::Submission(e) => write!(f, "submission error: {e}"),
            CycleError::Watermark { receipt, cause, .. } => write!(
                f,
                "payout {} submitted, but the watermark was not saved: {cause}",
                receipt.full_hash
            ),
        }
    }
}

/// The height range one trigger pays out: the blocks after
/// `window_start` up to and including `window_end`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistributionCycle {
    pub chain: u32,
    pub account: u64,
    pub frequency: u64,
    pub trigger_height: u64,
    pub window_start: u64,
    pub window_end: u64,
}

impl DistributionCycle {
    /// The window closed by `trigger_height`: after the watermark if
    /// there is one, otherwise after the block one period back.
    pub fn plan(
        cfg: &ContractConfig,
        trigger_height: u64,
        watermark: Option<u64>,
    ) -> Self {
        let start =
            watermark.unwrap_or_else(|| trigger_height.saturating_sub(cfg.frequency));
        DistributionCycle {
            chain: cfg.chain,
            account: cfg.account,
            frequency: cfg.frequency,
            trigger_height,
            window_start: start,
            window_end: trigger_height,
        }
    }
}

/// The transfer one cycle sends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PayoutIntent {
    pub recipient: u64,
    pub gross: u64,
    pub fee: u64,
    pub net: u64,
}

impl PayoutIntent {
    /// `net = gross - fee`, only when the fee is positive and leaves
    /// something to pay.
    pub fn new(recipient: u64, gross: u64, fee: u64) -> Result<Self> {
        if 0 == fee {
            return Err(eg!("cannot calculate fee"));
        }
        if fee >= gross {
            return Err(eg!(format!(
                "the fee ({fee}) leaves nothing of the {gross} collected"
            )));
        }
        Ok(PayoutIntent {
            recipient,
            gross,
            fee,
            net: gross - fee,
        })
    }
}

/// Drives the cycle of one (chain, account) from consecutive blocks.
pub struct Trigger<L: Ledger + ?Sized, R: RngCore> {
    cfg: ContractConfig,
    account: Account,
    ledger: Arc<L>,
    watermarks: Arc<RwLock<WatermarkStore>>,
    prng: R,
}

impl<L: Ledger + ?Sized, R: RngCore> Trigger<L, R> {
    #[allow(missing_docs)]
    pub fn new(
        cfg: ContractConfig,
        ledger: Arc<L>,
        watermarks: Arc<RwLock<WatermarkStore>>,
        prng: R,
    ) -> StdResult<Self, CycleError> {
        cfg.validate().map_err(CycleError::Configuration)?;
        Ok(Trigger {
            account: Account::from(&cfg),
            cfg,
            ledger,
            watermarks,
            prng,
        })
    }

    #[allow(missing_docs)]
    pub fn config(&self) -> &ContractConfig {
        &self.cfg
    }

    /// Handle the block at `height`.
    pub fn on_block(&mut self, height: u64) -> StdResult<Outcome, CycleError> {
        let chain = self.cfg.chain;
        if 0 != height % self.cfg.frequency {
            trace!(height, "ignore block");
            return Ok(Outcome::Skipped(SkipReason::OffTrigger));
        }

        let watermark = self.watermarks.read().get(chain, self.account.id);
        if matches!(watermark, Some(w) if w >= height) {
            debug!(height, ?watermark, "window already distributed");
            return Ok(Outcome::Skipped(SkipReason::AlreadyDistributed));
        }

        let cycle = DistributionCycle::plan(&self.cfg, height, watermark);
        debug!(
            chain,
            window_start = cycle.window_start,
            window_end = cycle.window_end,
            "distribution cycle"
        );

        if watermark.is_none() {
            // later triggers start here until a payout goes through
            let seeded =
                self.watermarks
                    .write()
                    .seed(chain, self.account.id, cycle.window_start);
            if let Err(e) = seeded {
                warn!(height, "baseline watermark not saved: {e}");
            }
        }

        let payments = collector::collect(
            &*self.ledger,
            &self.cfg.payment_kinds,
            chain,
            cycle.window_start,
            cycle.window_end,
            &self.account,
        )
        .map_err(CycleError::Collection)?;

        let table = WeightTable::<u64>::from_payments(&payments).map_err(CycleError::Selection)?;
        if 0 == table.total() {
            info!(height, "no payments to distribute");
            return Ok(Outcome::Skipped(SkipReason::EmptyWindow));
        }
        let gross = table.total();

        let recipient = *selector::select(&table, &mut self.prng)
            .map_err(CycleError::Selection)?;

        let fee = match self.ledger.estimate_fee(chain, recipient, gross) {
            Ok(fee) => fee.unwrap_or(0),
            Err(e) => {
                warn!(height, "cannot calculate fee: {e}");
                return Err(CycleError::FeeEstimation(e));
            }
        };
        let payout = PayoutIntent::new(recipient, gross, fee).map_err(|e| {
            warn!(height, fee, gross, "no payout: {e}");
            CycleError::FeeEstimation(e)
        })?;

        info!(
            height,
            payers = table.len(),
            "paying amount {} to account {} (fee {})",
            commas(payout.net),
            payout.recipient,
            commas(payout.fee)
        );
        let receipt = self
            .ledger
            .submit_transfer(chain, payout.recipient, payout.net, payout.fee)
            .map_err(|e| {
                warn!(height, "payout not submitted: {e}");
                CycleError::Submission(e)
            })?;

        if let Err(cause) = self.watermarks.write().advance(chain, self.account.id, height) {
            error!(height, full_hash = %receipt.full_hash, "watermark not saved: {cause}");
            return Err(CycleError::Watermark {
                payout,
                receipt,
                cause,
            });
        }

        Ok(Outcome::Distributed {
            cycle,
            payout,
            receipt,
        })
    }
}
