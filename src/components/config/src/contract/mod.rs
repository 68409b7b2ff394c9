//!
//! Settings of one monitored contract account.
//!
//! The file is TOML (JSON is accepted as a fallback):
//!
//! ```toml
//! chain = 2
//! frequency = 10
//! account = "5873880488492319831"
//! account_rs = "ARDOR-XK4R-7VJU-6EQG-7R335"
//! seed = 42
//! request_timeout_secs = 10
//!
//! [payment_kinds]
//! default = { type = 0, subtype = 0 }
//!
//! [payment_kinds.chains]
//! 1 = { type = -2, subtype = 0 }
//! ```
//!

pub mod global_cfg;


use {
    ruc::*,
    serde::{Deserialize, Serialize},
    std::{collections::BTreeMap, env, fs, path::Path, time::Duration},
};

/// Environment variable holding the secret phrase used to sign payouts.
pub const SECRET_PHRASE_VAR: &str = "ALLFORONE_SECRET_PHRASE";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// The parent chain of the ledger, whose plain payments use their own type.
pub const PARENT_CHAIN_ID: u32 = 1;

/// The `(type, subtype)` pair that classifies a plain value transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentKind {
    #[serde(rename = "type")]
    pub tx_type: i8,
    pub subtype: i8,
}

impl PaymentKind {
    #[allow(missing_docs)]
    pub const fn new(tx_type: i8, subtype: i8) -> Self {
        PaymentKind { tx_type, subtype }
    }

    #[inline(always)]
    #[allow(missing_docs)]
    pub fn matches(&self, tx_type: i8, subtype: i8) -> bool {
        self.tx_type == tx_type && self.subtype == subtype
    }
}

/// Chain id => payment kind, with a fallback for unlisted chains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentKinds {
    default: PaymentKind,
    chains: BTreeMap<u32, PaymentKind>,
}

impl Default for PaymentKinds {
    fn default() -> Self {
        let mut chains = BTreeMap::new();
        chains.insert(PARENT_CHAIN_ID, PaymentKind::new(-2, 0));
        PaymentKinds {
            default: PaymentKind::new(0, 0),
            chains,
        }
    }
}

impl PaymentKinds {
    #[allow(missing_docs)]
    pub fn new(default: PaymentKind, chains: BTreeMap<u32, PaymentKind>) -> Self {
        PaymentKinds { default, chains }
    }

    /// The kind that counts as a payment on `chain`.
    pub fn kind_for(&self, chain: u32) -> PaymentKind {
        self.chains.get(&chain).copied().unwrap_or(self.default)
    }
}

// TOML keys are always strings, chain ids are parsed afterwards
#[derive(Debug, Default, Deserialize)]
pub struct PaymentKindsStr {
    pub default: Option<PaymentKind>,
    #[serde(default)]
    pub chains: BTreeMap<String, PaymentKind>,
}

impl TryFrom<PaymentKindsStr> for PaymentKinds {
    type Error = Box<dyn RucError>;
    fn try_from(cfg: PaymentKindsStr) -> Result<Self> {
        let mut kinds = PaymentKinds::default();
        if let Some(default) = cfg.default {
            kinds.default = default;
        }
        for (chain, kind) in cfg.chains {
            let chain = chain
                .trim()
                .parse::<u32>()
                .c(d!(format!("invalid chain id in payment_kinds: {chain}")))?;
            kinds.chains.insert(chain, kind);
        }
        Ok(kinds)
    }
}

/// Validated settings of the monitored contract.
#[derive(Debug, Clone)]
pub struct ContractConfig {
    pub chain: u32,
    pub frequency: u64,
    pub account: u64,
    pub account_rs: String,
    pub seed: Option<u64>,
    pub request_timeout: Duration,
    pub payment_kinds: PaymentKinds,
    pub secret_phrase: Option<String>,
}

// account ids overflow the signed integers of TOML, so they are kept as strings
#[derive(Debug, Deserialize)]
pub struct ContractConfigStr {
    pub chain: u32,
    pub frequency: u64,
    pub account: String,
    pub account_rs: String,
    pub seed: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub payment_kinds: Option<PaymentKindsStr>,
}

impl TryFrom<ContractConfigStr> for ContractConfig {
    type Error = Box<dyn RucError>;
    fn try_from(cfg: ContractConfigStr) -> Result<Self> {
        let account = cfg
            .account
            .trim()
            .parse::<u64>()
            .c(d!("'account' must be a numeric account id"))?;
        let payment_kinds = cfg
            .payment_kinds
            .map(PaymentKinds::try_from)
            .transpose()
            .c(d!())?
            .unwrap_or_default();
        let res = ContractConfig {
            chain: cfg.chain,
            frequency: cfg.frequency,
            account,
            account_rs: cfg.account_rs.trim().to_owned(),
            seed: cfg.seed,
            request_timeout: Duration::from_secs(
                cfg.request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            payment_kinds,
            secret_phrase: env::var(SECRET_PHRASE_VAR)
                .ok()
                .filter(|s| !s.is_empty()),
        };
        res.validate().c(d!())?;
        Ok(res)
    }
}

impl ContractConfig {
    /// load the contract settings from file.
    pub fn from_file(file_path: impl AsRef<Path>) -> Result<ContractConfig> {
        let content = fs::read_to_string(file_path.as_ref()).c(d!(format!(
            "contract configuration not found: {}",
            file_path.as_ref().display()
        )))?;
        Self::parse(&content).c(d!())
    }

    /// parse the contract settings from TOML, or JSON.
    pub fn parse(content: &str) -> Result<ContractConfig> {
        let raw = toml::from_str::<ContractConfigStr>(content)
            .c(d!())
            .or_else(|e| {
                serde_json::from_str::<ContractConfigStr>(content)
                    .c(d!())
                    .map_err(|_| e)
            })
            .c(d!("contract configuration is neither valid TOML nor JSON"))?;
        ContractConfig::try_from(raw).c(d!())
    }

    /// The settings that no distribution cycle can run without.
    pub fn validate(&self) -> Result<()> {
        if 0 == self.frequency {
            return Err(eg!("'frequency' must be a positive number of blocks"));
        }
        if 0 == self.account {
            return Err(eg!("'account' must not be zero"));
        }
        if self.account_rs.is_empty() {
            return Err(eg!("'account_rs' must not be empty"));
        }
        Ok(())
    }
}
