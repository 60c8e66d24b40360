use std::{
    net::{IpAddr, SocketAddr},
    str::FromStr,
    sync::Arc,
    time::Duration,
};

use actix_web::{
    dev::{Server, Service},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use chrono::Utc;
use futures::{future::ok, FutureExt};
use log::{info, warn};
use meli_tools::MeliApi;
use settlement_engine::{JsonLedger, JsonQueue, ProcessedOrders};

use crate::{
    accounts::MarketplaceAccounts,
    config::{ProxyOptions, ServerConfig},
    errors::ServerError,
    meli_routes::MeliWebhookRoute,
    notifier::TelegramNotifier,
    report_worker::{start_report_worker, ReportWorker},
    routes::health,
    settlement_worker::{start_settlement_worker, SettlementWorker, WorkerSettings},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let queue = JsonQueue::new(config.queue_file.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let ledger =
        JsonLedger::new(config.ledger_file.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let processed = Arc::new(ProcessedOrders::new());
    let accounts = Arc::new(MarketplaceAccounts::try_from_config(&config)?);
    let notifier = TelegramNotifier::try_new(&config.notifications)?;

    // The cutoff is captured exactly once, here. Anything the marketplace created before this instant belongs to
    // a previous deployment and is discarded unsettled.
    let cutoff = Utc::now();
    info!("🚀️ Cutoff timestamp set. Orders created before {cutoff} will be ignored.");

    let worker = SettlementWorker::new(
        accounts.clone(),
        queue.clone(),
        ledger.clone(),
        notifier.clone(),
        processed.clone(),
        config.seller_profiles(),
        WorkerSettings::from_config(&config, cutoff),
    );
    start_settlement_worker(worker);
    let reports = ReportWorker::new(ledger, notifier, config.daily_report_at, config.monthly_report_at);
    start_report_worker(reports);

    let srv = create_server_instance(config, queue, accounts, processed)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    queue: JsonQueue,
    accounts: Arc<MarketplaceAccounts<MeliApi>>,
    processed: Arc<ProcessedOrders>,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let proxy = ProxyOptions::from_config(&config);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("msr::access_log"))
            .app_data(web::Data::new(queue.clone()))
            .app_data(web::Data::from(accounts.clone()))
            .app_data(web::Data::from(processed.clone()))
            .app_data(web::Data::new(proxy));
        let use_x_forwarded_for = config.use_x_forwarded_for;
        let use_forwarded = config.use_forwarded;
        let whitelist = config.whitelist.clone();
        let webhook_scope = web::scope("/ml-notifications")
            .wrap_fn(move |req, srv| {
                // Collect peer IP from x-forwarded-for, or forwarded headers _if_ `use_nnn` has been set to true
                // in the configuration. Otherwise, use the peer address from the connection info.
                let peer_addr = req.connection_info().peer_addr().map(|a| a.to_string());

                let peer_ip = req
                    .headers()
                    .get("X-Forwarded-For")
                    .and_then(|v| use_x_forwarded_for.then(|| v.to_str().ok()).flatten())
                    .or_else(|| {
                        req.headers().get("Forwarded").and_then(|v| use_forwarded.then(|| v.to_str().ok()).flatten())
                    })
                    .or_else(|| peer_addr.as_deref())
                    .and_then(parse_peer_ip);
                let whitelisted = match (peer_ip, &whitelist) {
                    (Some(ip), Some(whitelist)) => {
                        info!("Marketplace webhook from {ip}");
                        whitelist.contains(&ip)
                    },
                    (_, None) => true,
                    (None, Some(_)) => {
                        warn!("No IP address found in the webhook request, denying access.");
                        false
                    },
                };
                if whitelisted {
                    srv.call(req)
                } else {
                    ok(req.error_response(ServerError::ForbiddenPeer)).boxed_local()
                }
            })
            .service(MeliWebhookRoute::<JsonQueue, MeliApi>::new());
        app.service(health).service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}

/// Peer strings can be a bare IP (forwarding headers) or an `ip:port` pair (connection info).
fn parse_peer_ip(s: &str) -> Option<IpAddr> {
    let s = s.trim();
    IpAddr::from_str(s).ok().or_else(|| SocketAddr::from_str(s).ok().map(|sa| sa.ip()))
}
