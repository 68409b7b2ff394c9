//!
//! [`Ledger`] over the node's `requestType` JSON API.
//!

use {
    super::{opt_u64_from_any, u64_from_any, Account, Ledger, PaymentEvent, SubmissionReceipt},
    config::contract::PaymentKind,
    ruc::*,
    serde::{de::DeserializeOwned, Deserialize},
    serde_json::Value,
    std::time::Duration,
    tracing::debug,
};

/// Minutes a broadcast payout stays valid before the node drops it.
const PAYOUT_DEADLINE_MINUTES: u32 = 15;

/// Records asked for per transaction page, the node's default `maxAPIRecords`.
const TX_PAGE_SIZE: u64 = 100;

/// Upper bound on the pages of one transaction query.
const MAX_TX_PAGES: u64 = 10_000;

/// A blocking client of one ledger node.
#[derive(Clone, Debug)]
pub struct HttpLedger {
    endpoint: String,
    timeout: Duration,
    secret_phrase: Option<String>,
}

#[derive(Deserialize)]
struct BlockchainStatusResp {
    #[serde(rename = "numberOfBlocks", deserialize_with = "u64_from_any")]
    number_of_blocks: u64,
}

#[derive(Deserialize)]
struct BlockResp {
    #[serde(deserialize_with = "u64_from_any")]
    timestamp: u64,
}

#[derive(Deserialize)]
struct TransactionsResp {
    transactions: Vec<TxJson>,
}

#[derive(Deserialize)]
struct TxJson {
    chain: u32,
    #[serde(rename = "type")]
    tx_type: i8,
    subtype: i8,
    #[serde(deserialize_with = "u64_from_any")]
    sender: u64,
    #[serde(rename = "senderRS")]
    sender_rs: String,
    // absent for transaction types without a recipient
    #[serde(default, deserialize_with = "opt_u64_from_any")]
    recipient: Option<u64>,
    #[serde(rename = "amountNQT", deserialize_with = "u64_from_any")]
    amount: u64,
    #[serde(deserialize_with = "u64_from_any")]
    height: u64,
}

#[derive(Deserialize)]
struct FeeResp {
    #[serde(
        rename = "minimumFeeFQT",
        default,
        deserialize_with = "opt_u64_from_any"
    )]
    minimum_fee: Option<u64>,
}

#[derive(Deserialize)]
struct BroadcastResp {
    #[serde(rename = "fullHash")]
    full_hash: String,
}

impl HttpLedger {
    /// `node_url` is the node root, such as `http://127.0.0.1:27876`.
    pub fn new(node_url: &str, timeout: Duration, secret_phrase: Option<String>) -> Self {
        HttpLedger {
            endpoint: format!("{}/nxt", node_url.trim_end_matches('/')),
            timeout,
            secret_phrase,
        }
    }

    fn secret_phrase(&self) -> Result<&str> {
        self.secret_phrase
            .as_deref()
            .c(d!("no secret phrase configured, payouts cannot be signed"))
    }

    fn get<T: DeserializeOwned>(
        &self,
        request_type: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        debug!(request_type, ?params, "ledger request");
        let resp = attohttpc::get(&self.endpoint)
            .param("requestType", request_type)
            .params(params)
            .timeout(self.timeout)
            .send()
            .c(d!(format!("{request_type}: node unreachable")))?;
        Self::decode(request_type, resp).c(d!())
    }

    // the secret phrase travels in the form body only, and is never logged
    fn post<T: DeserializeOwned>(
        &self,
        request_type: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        debug!(request_type, ?params, "ledger request");
        let mut body = Vec::with_capacity(params.len() + 2);
        body.push(("requestType", request_type.to_owned()));
        body.extend_from_slice(params);
        body.push(("secretPhrase", self.secret_phrase().c(d!())?.to_owned()));
        let resp = attohttpc::post(&self.endpoint)
            .form(&body)
            .c(d!())?
            .timeout(self.timeout)
            .send()
            .c(d!(format!("{request_type}: node unreachable")))?;
        Self::decode(request_type, resp).c(d!())
    }

    fn decode<T: DeserializeOwned>(
        request_type: &str,
        resp: attohttpc::Response,
    ) -> Result<T> {
        let value = resp
            .error_for_status()
            .c(d!(format!("{request_type}: bad http status")))?
            .json::<Value>()
            .c(d!(format!("{request_type}: response is not json")))?;
        if let Some(code) = value.get("errorCode") {
            let desc = value
                .get("errorDescription")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(eg!(format!(
                "{request_type} rejected by the node: {desc} (code {code})"
            )));
        }
        serde_json::from_value(value)
            .c(d!(format!("{request_type}: malformed response")))
    }
}

// `fetch(first_index, last_index)`, both inclusive, until a page comes back
// empty; a node capping pages below `TX_PAGE_SIZE` is still read in full
fn fetch_pages<T, F>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(u64, u64) -> Result<Vec<T>>,
{
    let mut all = vec![];
    for _ in 0..MAX_TX_PAGES {
        let first = all.len() as u64;
        let page = fetch(first, first + TX_PAGE_SIZE - 1).c(d!())?;
        if page.is_empty() {
            return Ok(all);
        }
        if page.len() as u64 > TX_PAGE_SIZE {
            return Err(eg!("the node ignored the requested page bounds"));
        }
        all.extend(page);
    }
    Err(eg!(format!("more than {MAX_TX_PAGES} pages of transactions")))
}

impl Ledger for HttpLedger {
    fn current_height(&self) -> Result<u64> {
        let resp: BlockchainStatusResp =
            self.get("getBlockchainStatus", &[]).c(d!())?;
        resp.number_of_blocks
            .checked_sub(1)
            .c(d!("the node reports an empty blockchain"))
    }

    fn resolve_height_timestamp(&self, height: u64) -> Result<u64> {
        self.get::<BlockResp>("getBlock", &[("height", height.to_string())])
            .c(d!())
            .map(|b| b.timestamp)
    }

    fn query_transactions(
        &self,
        chain: u32,
        account: &Account,
        since: u64,
        kind: PaymentKind,
    ) -> Result<Vec<PaymentEvent>> {
        let params = [
            ("chain", chain.to_string()),
            ("account", account.rs.clone()),
            ("timestamp", since.to_string()),
            ("type", kind.tx_type.to_string()),
            ("subtype", kind.subtype.to_string()),
            ("executedOnly", "true".to_owned()),
        ];
        let txs = fetch_pages(|first, last| {
            let mut page_params = params.to_vec();
            page_params.push(("firstIndex", first.to_string()));
            page_params.push(("lastIndex", last.to_string()));
            self.get::<TransactionsResp>("getBlockchainTransactions", &page_params)
                .c(d!())
                .map(|r| r.transactions)
        })
        .c(d!())?;

        Ok(txs
            .into_iter()
            .filter_map(|tx| {
                let recipient = tx.recipient?;
                Some(PaymentEvent {
                    sender: tx.sender,
                    sender_rs: tx.sender_rs,
                    recipient,
                    amount: tx.amount,
                    chain: tx.chain,
                    tx_type: tx.tx_type,
                    subtype: tx.subtype,
                    height: tx.height,
                })
            })
            .collect())
    }

    fn estimate_fee(
        &self,
        chain: u32,
        recipient: u64,
        amount: u64,
    ) -> Result<Option<u64>> {
        let params = [
            ("chain", chain.to_string()),
            ("recipient", recipient.to_string()),
            ("amountNQT", amount.to_string()),
            ("broadcast", "false".to_owned()),
            ("calculateFee", "true".to_owned()),
        ];
        self.post::<FeeResp>("sendMoney", &params)
            .c(d!())
            .map(|r| r.minimum_fee)
    }

    fn submit_transfer(
        &self,
        chain: u32,
        recipient: u64,
        amount: u64,
        fee: u64,
    ) -> Result<SubmissionReceipt> {
        let params = [
            ("chain", chain.to_string()),
            ("recipient", recipient.to_string()),
            ("amountNQT", amount.to_string()),
            ("feeNQT", fee.to_string()),
            ("deadline", PAYOUT_DEADLINE_MINUTES.to_string()),
            ("broadcast", "true".to_owned()),
        ];
        self.post::<BroadcastResp>("sendMoney", &params)
            .c(d!())
            .map(|r| SubmissionReceipt {
                full_hash: r.full_hash,
            })
    }
}
