//!
//! Incoming payments of the monitored account within a height window.
//!

use {
    crate::ledger::{Account, Ledger, PaymentEvent},
    config::contract::{PaymentKind, PaymentKinds},
    ruc::*,
    tracing::debug,
};

/// Earliest height whose block can be queried on the ledger.
pub const MIN_LEDGER_HEIGHT: u64 = 2;

/// Load the payments received by `account` on `chain` in the blocks
/// `(window_start, window_end]`.
///
/// `window_start` is the last block already settled, so its payments never
/// count again. Only the plain payments of `chain` addressed to `account`
/// are kept; transfers the account made to itself never count. Nothing
/// found is an empty result, a failed or malformed ledger answer is an
/// error.
pub fn collect<L: Ledger + ?Sized>(
    ledger: &L,
    kinds: &PaymentKinds,
    chain: u32,
    window_start: u64,
    window_end: u64,
    account: &Account,
) -> Result<Vec<PaymentEvent>> {
    if window_end <= window_start {
        return Ok(vec![]);
    }

    // the node filters by time, the window itself is cut by height below
    let anchor = window_start.max(MIN_LEDGER_HEIGHT);
    let since = ledger
        .resolve_height_timestamp(anchor)
        .c(d!(format!("cannot resolve the timestamp of block {anchor}")))?;

    let kind = kinds.kind_for(chain);
    debug!(
        chain,
        window_start,
        window_end,
        since,
        account = %account.rs,
        tx_type = kind.tx_type,
        subtype = kind.subtype,
        "loading payment transactions"
    );

    let txs = ledger
        .query_transactions(chain, account, since, kind)
        .c(d!("cannot load the account transactions"))?;
    let loaded = txs.len();

    let payments = txs
        .into_iter()
        .filter(|tx| tx.height > window_start && tx.height <= window_end)
        .filter(|tx| is_payment(tx, chain, kind, account.id))
        .collect::<Vec<_>>();
    debug!(
        loaded,
        kept = payments.len(),
        dropped = loaded - payments.len(),
        "payment transactions filtered"
    );

    Ok(payments)
}

fn is_payment(tx: &PaymentEvent, chain: u32, kind: PaymentKind, account: u64) -> bool {
    if tx.chain != chain || !kind.matches(tx.tx_type, tx.subtype) {
        return false;
    }
    if tx.recipient != account {
        return false;
    }
    // sent by the contract to itself
    tx.sender != account
}
