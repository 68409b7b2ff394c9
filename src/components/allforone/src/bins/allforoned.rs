//!
//! # allforoned
//!
//! Watches the ledger and runs a distribution cycle on every trigger block.
//!

use {
    allforone::{
        api::{self, StatusService},
        ledger::http::HttpLedger,
        poller::BlockPoller,
        watermark::WatermarkStore,
        Outcome, Trigger,
    },
    config::contract::{global_cfg::CFG, ContractConfig, SECRET_PHRASE_VAR},
    parking_lot::RwLock,
    rand_chacha::ChaChaRng,
    rand_core::SeedableRng,
    ruc::*,
    std::{
        process,
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        time::Duration,
    },
    tracing::{error, info, warn},
};

static EXITING: AtomicBool = AtomicBool::new(false);

fn main() {
    globutils::logging::init_logging(CFG.verbose.as_deref());
    info!("allforoned {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run() {
        eprintln!("{e}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cfg = ContractConfig::from_file(&CFG.contract_file).c(d!())?;
    let secret = cfg
        .secret_phrase
        .clone()
        .c(d!(format!("{SECRET_PHRASE_VAR} is not set")))?;
    info!(
        chain = cfg.chain,
        frequency = cfg.frequency,
        account = %cfg.account_rs,
        node = %CFG.node_url,
        "monitoring contract"
    );

    let ledger = Arc::new(HttpLedger::new(
        &CFG.node_url,
        cfg.request_timeout,
        Some(secret),
    ));
    let watermarks = Arc::new(RwLock::new(WatermarkStore::open(&CFG.data_dir).c(d!())?));
    if let Some(h) = watermarks.read().get(cfg.chain, cfg.account) {
        info!(height = h, "resuming after the last distribution");
    }

    let prng = match cfg.seed {
        Some(seed) => {
            warn!(seed, "seeded selection, payouts are predictable");
            ChaChaRng::seed_from_u64(seed)
        }
        None => ChaChaRng::from_entropy(),
    };

    let svc = Arc::new(
        StatusService::new(cfg.clone(), Arc::clone(&ledger), Arc::clone(&watermarks))
            .c(d!())?,
    );
    api::start_status_server(svc, &CFG.status_host, CFG.status_port).c(d!())?;

    let mut trigger = Trigger::new(cfg, Arc::clone(&ledger), watermarks, prng)
        .map_err(|e| eg!(e.to_string()))?;

    ctrlc::set_handler(|| {
        if !EXITING.swap(true, Ordering::AcqRel) {
            println!("Exiting...");
        }
    })
    .c(d!())?;

    let mut poller = BlockPoller::new(ledger, Duration::from_millis(CFG.poll_interval_ms));
    poller.run(&EXITING, |height| match trigger.on_block(height) {
        Ok(Outcome::Distributed { payout, receipt, .. }) => info!(
            height,
            recipient = payout.recipient,
            net = payout.net,
            fee = payout.fee,
            full_hash = %receipt.full_hash,
            "distribution submitted"
        ),
        Ok(Outcome::Skipped(_)) => {}
        Err(e) => error!(height, "distribution failed: {e}"),
    });

    info!("stopped");
    Ok(())
}
