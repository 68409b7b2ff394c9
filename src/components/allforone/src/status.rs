//!
//! What the next distribution would pay, before it runs.
//!

use {
    crate::{
        collector,
        ledger::{Account, Ledger},
        selector::WeightTable,
        trigger::DistributionCycle,
    },
    config::contract::ContractConfig,
    ruc::*,
    serde::{Deserialize, Serialize},
};

/// One incoming payment waiting for the next distribution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPayment {
    #[serde(rename = "senderRS")]
    pub sender_rs: String,
    #[serde(rename = "amountNQT")]
    pub amount: u64,
}

/// The pot of the upcoming distribution and what it is made of.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    #[serde(rename = "pendingAmountNQT")]
    pub pending_amount: u64,
    pub payments: Vec<PendingPayment>,
}

/// The first trigger height that has not been paid yet and is not
/// behind `current_height`.
///
/// A zero `frequency` never triggers, `current_height` is returned as is.
pub fn next_trigger_height(
    current_height: u64,
    frequency: u64,
    watermark: Option<u64>,
) -> u64 {
    if 0 == frequency {
        return current_height;
    }
    let next = if 0 == current_height {
        frequency
    } else {
        ((current_height - 1) / frequency + 1) * frequency
    };
    match watermark {
        Some(w) if w >= next => (w / frequency + 1) * frequency,
        _ => next,
    }
}

/// Collect the payments the next distribution will pay out.
///
/// The window is exactly the one the trigger will use at
/// [`next_trigger_height`], so the reported sum is what it will split.
pub fn report<L: Ledger + ?Sized>(
    ledger: &L,
    cfg: &ContractConfig,
    current_height: u64,
    watermark: Option<u64>,
) -> Result<Status> {
    cfg.validate().c(d!())?;
    let trigger_height = next_trigger_height(current_height, cfg.frequency, watermark);
    let cycle = DistributionCycle::plan(cfg, trigger_height, watermark);

    let payments = collector::collect(
        ledger,
        &cfg.payment_kinds,
        cfg.chain,
        cycle.window_start,
        cycle.window_end,
        &Account::from(cfg),
    )
    .c(d!())?;
    let table = WeightTable::<u64>::from_payments(&payments).c(d!())?;

    Ok(Status {
        pending_amount: table.total(),
        payments: payments
            .into_iter()
            .map(|p| PendingPayment {
                sender_rs: p.sender_rs,
                amount: p.amount,
            })
            .collect(),
    })
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::ledger::{mock::MockLedger, PaymentEvent},
        config::contract::PaymentKinds,
        std::time::Duration,
    };

    const ACC: u64 = 42;

    fn cfg() -> ContractConfig {
        ContractConfig {
            chain: 2,
            frequency: 10,
            account: ACC,
            account_rs: "ARDOR-ACC".to_owned(),
            seed: None,
            request_timeout: Duration::from_secs(1),
            payment_kinds: PaymentKinds::default(),
            secret_phrase: None,
        }
    }

    fn pay(sender: u64, amount: u64) -> PaymentEvent {
        PaymentEvent {
            sender,
            sender_rs: format!("ARDOR-{sender}"),
            recipient: ACC,
            amount,
            chain: 2,
            tx_type: 0,
            subtype: 0,
            height: 0,
        }
    }

    #[test]
    fn test_next_trigger_height() {
        assert_eq!(next_trigger_height(0, 10, None), 10);
        assert_eq!(next_trigger_height(7, 10, None), 10);
        assert_eq!(next_trigger_height(10, 10, None), 10);
        assert_eq!(next_trigger_height(11, 10, None), 20);
        assert_eq!(next_trigger_height(10, 10, Some(10)), 20);
        assert_eq!(next_trigger_height(12, 10, Some(10)), 20);
        assert_eq!(next_trigger_height(12, 10, Some(30)), 40);
        assert_eq!(next_trigger_height(12, 0, None), 12);
        assert_eq!(next_trigger_height(12, 0, Some(30)), 12);
    }

    #[test]
    fn test_report_invalid_config() {
        let l = MockLedger::new();
        l.push_transaction(3, pay(7, 100));
        let bad = ContractConfig {
            frequency: 0,
            ..cfg()
        };
        assert!(report(&l, &bad, 5, None).is_err());
        assert!(l.queries().is_empty());
    }

    #[test]
    fn test_report_window_bounds() {
        let l = MockLedger::new();
        // settled by the payout at 10
        l.push_transaction(10, pay(7, 1));
        l.push_transaction(11, pay(7, 2));
        // the trigger block is in its own window
        l.push_transaction(20, pay(8, 4));
        // behind the next trigger
        l.push_transaction(21, pay(8, 8));

        let st = pnk!(report(&l, &cfg(), 20, Some(10)));
        assert_eq!(st.pending_amount, 6);
    }

    #[test]
    fn test_report() {
        let l = MockLedger::new();
        l.push_transaction(3, pay(7, 100));
        l.push_transaction(4, pay(8, 5));
        l.push_transaction(4, PaymentEvent { sender: ACC, ..pay(7, 1000) });

        let st = pnk!(report(&l, &cfg(), 5, None));
        assert_eq!(st.pending_amount, 105);
        assert_eq!(
            st.payments,
            vec![
                PendingPayment {
                    sender_rs: "ARDOR-7".to_owned(),
                    amount: 100,
                },
                PendingPayment {
                    sender_rs: "ARDOR-8".to_owned(),
                    amount: 5,
                },
            ]
        );
    }

    #[test]
    fn test_report_after_payout() {
        let l = MockLedger::new();
        l.push_transaction(5, pay(7, 100));
        l.push_transaction(12, pay(8, 5));

        let st = pnk!(report(&l, &cfg(), 13, Some(10)));
        assert_eq!(st.pending_amount, 5);
        assert_eq!(st.payments.len(), 1);
    }

    #[test]
    fn test_report_empty() {
        let l = MockLedger::new();
        assert_eq!(pnk!(report(&l, &cfg(), 5, None)), Status::default());
    }

    #[test]
    fn test_json_field_names() {
        let st = Status {
            pending_amount: 5,
            payments: vec![PendingPayment {
                sender_rs: "ARDOR-8".to_owned(),
                amount: 5,
            }],
        };
        let v = pnk!(serde_json::to_value(&st));
        assert_eq!(
            v,
            serde_json::json!({
                "pendingAmountNQT": 5,
                "payments": [{ "senderRS": "ARDOR-8", "amountNQT": 5 }]
            })
        );
    }

    #[test]
    fn test_report_unreachable() {
        let l = MockLedger::new();
        l.fail_collection(true);
        assert!(report(&l, &cfg(), 5, None).is_err());
    }
}
