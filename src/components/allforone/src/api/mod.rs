//!
//! # The status api
//!
//! A read-only http view of the pot the next distribution will pay.
//!


use {
    crate::{
        ledger::Ledger,
        status::{self, Status},
        watermark::WatermarkStore,
    },
    actix_web::{
        error::{ErrorInternalServerError, ErrorServiceUnavailable},
        rt::System,
        web, App, HttpServer,
    },
    config::contract::ContractConfig,
    parking_lot::RwLock,
    ruc::*,
    std::{
        net::{SocketAddr, TcpListener},
        sync::Arc,
        thread,
    },
    tracing::{error, info},
};

/// Answers status queries from the live ledger and watermark.
pub struct StatusService<L: Ledger + ?Sized> {
    cfg: ContractConfig,
    ledger: Arc<L>,
    watermarks: Arc<RwLock<WatermarkStore>>,
}

impl<L: Ledger + ?Sized> StatusService<L> {
    /// Fails on a config the trigger would reject too.
    pub fn new(
        cfg: ContractConfig,
        ledger: Arc<L>,
        watermarks: Arc<RwLock<WatermarkStore>>,
    ) -> Result<Self> {
        cfg.validate().c(d!())?;
        Ok(StatusService {
            cfg,
            ledger,
            watermarks,
        })
    }

    /// Payments pending for the next trigger, as of the current height.
    pub fn status(&self) -> Result<Status> {
        let height = self.ledger.current_height().c(d!())?;
        let watermark = self.watermarks.read().get(self.cfg.chain, self.cfg.account);
        status::report(&*self.ledger, &self.cfg, height, watermark).c(d!())
    }
}

// Ping route to check for liveness of API
#[allow(clippy::unnecessary_wraps)]
async fn ping() -> actix_web::Result<String> {
    Ok("success".into())
}

#[allow(clippy::unnecessary_wraps)]
async fn version() -> actix_web::Result<String> {
    Ok(format!("allforone {}", env!("CARGO_PKG_VERSION")))
}

async fn get_status<L: Ledger + ?Sized + 'static>(
    svc: web::Data<StatusService<L>>,
) -> actix_web::Result<web::Json<Status>> {
    // the ledger client blocks
    web::block(move || svc.status().map_err(|e| e.to_string()))
        .await
        .map_err(ErrorInternalServerError)?
        .map(web::Json)
        .map_err(|e| {
            error!("status unavailable: {e}");
            ErrorServiceUnavailable(e)
        })
}

/// Register the routes of the status api.
pub fn routes<L: Ledger + ?Sized + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/ping", web::get().to(ping))
        .route("/version", web::get().to(version))
        .route("/status", web::get().to(get_status::<L>));
}

/// Serve the status api on its own thread.
///
/// The address is bound before returning, so a busy port is reported
/// to the caller. Returns the bound address.
pub fn start_status_server<L: Ledger + ?Sized + 'static>(
    svc: Arc<StatusService<L>>,
    host: &str,
    port: u16,
) -> Result<SocketAddr> {
    let listener = TcpListener::bind((host, port))
        .c(d!(format!("cannot bind the status api to {host}:{port}")))?;
    let addr = listener.local_addr().c(d!())?;
    let data = web::Data::from(svc);

    thread::spawn(move || {
        let res = System::new().block_on(async move {
            HttpServer::new(move || {
                App::new().app_data(data.clone()).configure(routes::<L>)
            })
            .workers(1)
            .disable_signals()
            .listen(listener)?
            .run()
            .await
        });
        if let Err(e) = res {
            error!("status api stopped: {e}");
        }
    });

    info!("status api listening on {addr}");
    Ok(addr)
}
