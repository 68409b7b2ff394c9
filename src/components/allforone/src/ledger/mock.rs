//!
//! An in-memory [`Ledger`], for tests and dry runs.
//!

use {
    super::{Account, Ledger, PaymentEvent, SubmissionReceipt},
    config::contract::PaymentKind,
    parking_lot::Mutex,
    ruc::*,
    std::collections::BTreeMap,
};

/// Seconds between two blocks, unless a block timestamp is set explicitly.
pub const MOCK_BLOCK_SECS: u64 = 60;

/// A transfer accepted by the mock broadcaster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmittedTransfer {
    pub chain: u32,
    pub recipient: u64,
    pub amount: u64,
    pub fee: u64,
}

/// The arguments of one fee request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeQuery {
    pub chain: u32,
    pub recipient: u64,
    pub amount: u64,
}

/// The arguments of one transaction query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxQuery {
    pub chain: u32,
    pub account: String,
    pub since: u64,
    pub kind: PaymentKind,
}

#[derive(Default)]
struct MockState {
    height: u64,
    timestamps: BTreeMap<u64, u64>,
    // (timestamp, event)
    transactions: Vec<(u64, PaymentEvent)>,
    fee: Option<u64>,
    fail_collection: bool,
    fail_fee: bool,
    fail_submission: bool,
    submitted: Vec<SubmittedTransfer>,
    queries: Vec<TxQuery>,
    fee_queries: Vec<FeeQuery>,
}

/// A ledger whose state is set by hand.
#[derive(Default)]
pub struct MockLedger {
    state: Mutex<MockState>,
}

impl MockLedger {
    #[allow(missing_docs)]
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(missing_docs)]
    pub fn set_height(&self, height: u64) {
        self.state.lock().height = height;
    }

    #[allow(missing_docs)]
    pub fn set_block_timestamp(&self, height: u64, timestamp: u64) {
        self.state.lock().timestamps.insert(height, timestamp);
    }

    /// Record `event` as executed in the block at `height`.
    pub fn push_transaction(&self, height: u64, event: PaymentEvent) {
        let ts = self.timestamp_of(height);
        let event = PaymentEvent { height, ..event };
        self.state.lock().transactions.push((ts, event));
    }

    #[allow(missing_docs)]
    pub fn set_fee(&self, fee: Option<u64>) {
        self.state.lock().fee = fee;
    }

    #[allow(missing_docs)]
    pub fn fail_collection(&self, on: bool) {
        self.state.lock().fail_collection = on;
    }

    #[allow(missing_docs)]
    pub fn fail_fee(&self, on: bool) {
        self.state.lock().fail_fee = on;
    }

    #[allow(missing_docs)]
    pub fn fail_submission(&self, on: bool) {
        self.state.lock().fail_submission = on;
    }

    /// Every transfer the broadcaster accepted, in order.
    pub fn submitted(&self) -> Vec<SubmittedTransfer> {
        self.state.lock().submitted.clone()
    }

    /// Every transaction query received, in order.
    pub fn queries(&self) -> Vec<TxQuery> {
        self.state.lock().queries.clone()
    }

    /// Every fee request received, in order.
    pub fn fee_queries(&self) -> Vec<FeeQuery> {
        self.state.lock().fee_queries.clone()
    }

    fn timestamp_of(&self, height: u64) -> u64 {
        self.state
            .lock()
            .timestamps
            .get(&height)
            .copied()
            .unwrap_or(height * MOCK_BLOCK_SECS)
    }
}

impl Ledger for MockLedger {
    fn current_height(&self) -> Result<u64> {
        Ok(self.state.lock().height)
    }

    fn resolve_height_timestamp(&self, height: u64) -> Result<u64> {
        if self.state.lock().fail_collection {
            return Err(eg!("getBlock: node unreachable"));
        }
        Ok(self.timestamp_of(height))
    }

    // the node filters by kind and age, the caller filters the rest
    fn query_transactions(
        &self,
        chain: u32,
        account: &Account,
        since: u64,
        kind: PaymentKind,
    ) -> Result<Vec<PaymentEvent>> {
        let mut st = self.state.lock();
        if st.fail_collection {
            return Err(eg!("getBlockchainTransactions: node unreachable"));
        }
        st.queries.push(TxQuery {
            chain,
            account: account.rs.clone(),
            since,
            kind,
        });
        Ok(st
            .transactions
            .iter()
            .filter(|(ts, tx)| *ts >= since && kind.matches(tx.tx_type, tx.subtype))
            .map(|(_, tx)| tx.clone())
            .collect())
    }

    fn estimate_fee(
        &self,
        chain: u32,
        recipient: u64,
        amount: u64,
    ) -> Result<Option<u64>> {
        let mut st = self.state.lock();
        if st.fail_fee {
            return Err(eg!("sendMoney: node unreachable"));
        }
        st.fee_queries.push(FeeQuery {
            chain,
            recipient,
            amount,
        });
        Ok(st.fee)
    }

    fn submit_transfer(
        &self,
        chain: u32,
        recipient: u64,
        amount: u64,
        fee: u64,
    ) -> Result<SubmissionReceipt> {
        let mut st = self.state.lock();
        if st.fail_submission {
            return Err(eg!("sendMoney rejected by the node: not enough funds"));
        }
        st.submitted.push(SubmittedTransfer {
            chain,
            recipient,
            amount,
            fee,
        });
        Ok(SubmissionReceipt {
            full_hash: format!("{:064x}", st.submitted.len()),
        })
    }
}
