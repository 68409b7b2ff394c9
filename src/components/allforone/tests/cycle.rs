use {
    allforone::{
        ledger::mock::MockLedger,
        poller::BlockPoller,
        status,
        watermark::WatermarkStore,
        Outcome, PaymentEvent, SkipReason, Trigger,
    },
    config::contract::{ContractConfig, PaymentKinds},
    parking_lot::RwLock,
    rand_chacha::ChaChaRng,
    rand_core::SeedableRng,
    ruc::*,
    std::{fs, sync::Arc, time::Duration},
};

const ACC: u64 = 5873880488492319831;
const CHAIN: u32 = 2;

fn cfg() -> ContractConfig {
    ContractConfig {
        chain: CHAIN,
        frequency: 10,
        account: ACC,
        account_rs: "ARDOR-XK4R-7VJU-6EQG-7R335".to_owned(),
        seed: Some(42),
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
        chain: CHAIN,
        tx_type: 0,
        subtype: 0,
        height: 0,
    }
}

fn trigger(
    ledger: &Arc<MockLedger>,
    store: &Arc<RwLock<WatermarkStore>>,
) -> Trigger<MockLedger, ChaChaRng> {
    Trigger::new(
        cfg(),
        Arc::clone(ledger),
        Arc::clone(store),
        ChaChaRng::seed_from_u64(42),
    )
    .unwrap_or_else(|e| panic!("{e}"))
}

#[test]
fn status_matches_the_next_payout() {
    let ledger = Arc::new(MockLedger::new());
    ledger.set_fee(Some(100_000));
    ledger.push_transaction(3, pay(1, 2_000_000));
    ledger.push_transaction(4, pay(2, 6_000_000));
    ledger.push_transaction(8, pay(1, 2_000_000));
    ledger.set_height(8);

    let store = Arc::new(RwLock::new(WatermarkStore::in_memory()));
    let st = pnk!(status::report(&*ledger, &cfg(), 8, None));
    assert_eq!(st.pending_amount, 10_000_000);
    assert_eq!(st.payments.len(), 3);

    let mut t = trigger(&ledger, &store);
    let mut outcomes = vec![];
    let mut poller = BlockPoller::new(Arc::clone(&ledger), Duration::from_millis(1));
    pnk!(poller.poll(|h| outcomes.push(t.on_block(h))));
    ledger.set_height(12);
    pnk!(poller.poll(|h| outcomes.push(t.on_block(h))));

    // 8, 9, 10, 11, 12
    assert_eq!(outcomes.len(), 5);
    let distributed = outcomes
        .into_iter()
        .filter_map(|o| match o {
            Ok(Outcome::Distributed { payout, .. }) => Some(payout),
            Ok(Outcome::Skipped(SkipReason::OffTrigger)) => None,
            other => panic!("unexpected outcome: {other:?}"),
        })
        .collect::<Vec<_>>();
    assert_eq!(distributed.len(), 1);
    assert_eq!(distributed[0].gross, st.pending_amount);
    assert_eq!(distributed[0].net, st.pending_amount - 100_000);
    assert!([1, 2].contains(&distributed[0].recipient));

    // nothing left for the trigger at 20
    let st = pnk!(status::report(&*ledger, &cfg(), 12, store.read().get(CHAIN, ACC)));
    assert_eq!(st.pending_amount, 0);
}

#[test]
fn watermark_survives_a_restart() {
    let dir = globutils::fresh_tmp_dir();
    let ledger = Arc::new(MockLedger::new());
    ledger.set_fee(Some(10));
    ledger.push_transaction(5, pay(1, 1_000));

    {
        let store = Arc::new(RwLock::new(pnk!(WatermarkStore::open(&dir))));
        let mut t = trigger(&ledger, &store);
        assert!(matches!(t.on_block(10), Ok(Outcome::Distributed { .. })));
    }

    let store = Arc::new(RwLock::new(pnk!(WatermarkStore::open(&dir))));
    assert_eq!(store.read().get(CHAIN, ACC), Some(10));
    let mut t = trigger(&ledger, &store);
    assert!(matches!(
        t.on_block(10),
        Ok(Outcome::Skipped(SkipReason::AlreadyDistributed))
    ));
    assert_eq!(ledger.submitted().len(), 1);

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn failed_first_payout_rolls_into_the_next_window() {
    let dir = globutils::fresh_tmp_dir();
    let ledger = Arc::new(MockLedger::new());
    ledger.set_fee(Some(10));
    ledger.push_transaction(5, pay(1, 1_000));

    {
        let store = Arc::new(RwLock::new(pnk!(WatermarkStore::open(&dir))));
        let mut t = trigger(&ledger, &store);
        ledger.fail_submission(true);
        assert!(t.on_block(10).is_err());
        assert_eq!(store.read().get(CHAIN, ACC), Some(0));
    }

    // the baseline outlives a restart
    let store = Arc::new(RwLock::new(pnk!(WatermarkStore::open(&dir))));
    let mut t = trigger(&ledger, &store);
    ledger.push_transaction(15, pay(1, 500));
    ledger.fail_submission(false);
    match t.on_block(20) {
        Ok(Outcome::Distributed { cycle, payout, .. }) => {
            assert_eq!(cycle.window_start, 0);
            assert_eq!(payout.gross, 1_500);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(store.read().get(CHAIN, ACC), Some(20));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn sample_contract_file_loads() {
    let cfg = pnk!(ContractConfig::from_file(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/allforone.toml"
    )));
    assert_eq!(cfg.chain, CHAIN);
    assert_eq!(cfg.frequency, 1440);
    assert_eq!(cfg.account, ACC);
    assert_eq!(cfg.seed, None);
    assert_eq!(
        cfg.payment_kinds.kind_for(1),
        config::contract::PaymentKind::new(-2, 0)
    );
}
