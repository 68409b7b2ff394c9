//!
//! The ledger node, as seen by the agent.
//!
//! Everything the agent knows about blocks, incoming payments, fees and
//! broadcast comes through [`Ledger`]. `http` talks to a real node,
//! `mock` keeps an in-memory chain for tests.
//!

pub mod http;
pub mod mock;

use {
    config::contract::{ContractConfig, PaymentKind},
    ruc::*,
    serde::{de, Deserialize, Deserializer, Serialize},
    std::result::Result as StdResult,
};

/// An account known both by its numeric id and its RS address.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub rs: String,
}

impl From<&ContractConfig> for Account {
    fn from(cfg: &ContractConfig) -> Self {
        Account {
            id: cfg.account,
            rs: cfg.account_rs.clone(),
        }
    }
}

/// One executed transaction, as returned by a transaction query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub sender: u64,
    pub sender_rs: String,
    pub recipient: u64,
    /// in the smallest currency unit
    pub amount: u64,
    pub chain: u32,
    pub tx_type: i8,
    pub subtype: i8,
    /// the block the transaction was executed in
    pub height: u64,
}

/// What the broadcaster returns for an accepted transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub full_hash: String,
}

/// Request/response view of the ledger node.
///
/// Every call is blocking; implementations must bound each one with a
/// deadline and report an expired deadline as an error.
pub trait Ledger: Send + Sync {
    /// Height of the last block known to the node.
    fn current_height(&self) -> Result<u64>;

    /// Timestamp of the block at `height`.
    fn resolve_height_timestamp(&self, height: u64) -> Result<u64>;

    /// Every executed transaction of `account` on `chain`, of the given
    /// kind, with a timestamp not older than `since`.
    ///
    /// The result may reach past any block of interest, callers bound it
    /// by [`PaymentEvent::height`].
    fn query_transactions(
        &self,
        chain: u32,
        account: &Account,
        since: u64,
        kind: PaymentKind,
    ) -> Result<Vec<PaymentEvent>>;

    /// Fee of a plain transfer of `amount` to `recipient`.
    ///
    /// `None` or `Some(0)` means the node could not price the transfer.
    fn estimate_fee(
        &self,
        chain: u32,
        recipient: u64,
        amount: u64,
    ) -> Result<Option<u64>>;

    /// Sign and broadcast a plain transfer.
    fn submit_transfer(
        &self,
        chain: u32,
        recipient: u64,
        amount: u64,
        fee: u64,
    ) -> Result<SubmissionReceipt>;
}

// the node renders 64-bit integers as strings, small ones as numbers
#[derive(Deserialize)]
#[serde(untagged)]
enum AnyNum {
    Int(u64),
    Str(String),
}

impl AnyNum {
    fn into_u64<E: de::Error>(self) -> StdResult<u64, E> {
        match self {
            AnyNum::Int(n) => Ok(n),
            AnyNum::Str(s) => s.trim().parse::<u64>().map_err(E::custom),
        }
    }
}

pub(crate) fn u64_from_any<'de, D>(deserializer: D) -> StdResult<u64, D::Error>
where
    D: Deserializer<'de>,
{
    AnyNum::deserialize(deserializer)?.into_u64()
}

pub(crate) fn opt_u64_from_any<'de, D>(
    deserializer: D,
) -> StdResult<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<AnyNum>::deserialize(deserializer)?
        .map(AnyNum::into_u64)
        .transpose()
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Deserialize)]
    struct Numbers {
        #[serde(deserialize_with = "u64_from_any")]
        a: u64,
        #[serde(default, deserialize_with = "opt_u64_from_any")]
        b: Option<u64>,
    }

    #[test]
    fn test_numbers_as_strings_or_ints() {
        let p: Numbers = pnk!(serde_json::from_str(r#"{"a":"18446744073709551615"}"#));
        assert_eq!(p.a, u64::MAX);
        assert_eq!(p.b, None);

        let p: Numbers = pnk!(serde_json::from_str(r#"{"a":7,"b":"9"}"#));
        assert_eq!((p.a, p.b), (7, Some(9)));

        assert!(serde_json::from_str::<Numbers>(r#"{"a":"-1"}"#).is_err());
        assert!(serde_json::from_str::<Numbers>(r#"{"a":"ARDOR"}"#).is_err());
    }
}
