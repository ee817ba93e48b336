use std::io;
use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use settlepay::config::Config;
use settlepay::core::SettlementLocks;
use settlepay::modules::bills::{self, BillRepository, BillService, MySqlBillRepository};
use settlepay::modules::gateways::{self, GatewayService};
use settlepay::modules::health;
use settlepay::modules::orders::{self, MySqlOrderRepository, OrderRepository, OrderService};
use settlepay::modules::payments::{
    self, MySqlPaymentRepository, PaymentRepository, PaymentService, PendingPaymentSweeper,
    ReconciliationEngine, SettlementGuard,
};

fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "settlepay=debug,actix_web=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = Config::from_env().map_err(io::Error::other)?;
    init_tracing(&config.app.log_format);
    config.validate().map_err(io::Error::other)?;

    tracing::info!(
        env = %config.app.env,
        bind = %config.server.bind_address(),
        "Starting settlepay"
    );

    let db_pool = config
        .database
        .create_pool()
        .await
        .map_err(io::Error::other)?;

    tracing::info!(
        min_connections = config.database.min_connections,
        max_connections = config.database.max_connections,
        "Database pool initialized"
    );

    // Repositories
    let order_repo: Arc<dyn OrderRepository> = Arc::new(MySqlOrderRepository::new(db_pool.clone()));
    let bill_repo: Arc<dyn BillRepository> = Arc::new(MySqlBillRepository::new(db_pool.clone()));
    let payment_repo: Arc<dyn PaymentRepository> =
        Arc::new(MySqlPaymentRepository::new(db_pool.clone()));

    // Shared state owned here and injected below
    let locks = Arc::new(SettlementLocks::new());
    let gateway_service = Arc::new(GatewayService::from_config(&config.gateways));

    let reconciliation = Arc::new(ReconciliationEngine::new(
        bill_repo.clone(),
        order_repo.clone(),
        payment_repo.clone(),
    ));
    let guard = Arc::new(SettlementGuard::new(reconciliation.clone()));

    let order_service = Arc::new(OrderService::new(
        order_repo.clone(),
        reconciliation.clone(),
        guard.clone(),
        locks.clone(),
    ));
    let bill_service = Arc::new(BillService::new(
        bill_repo.clone(),
        order_repo.clone(),
        reconciliation.clone(),
        guard.clone(),
        locks.clone(),
    ));
    let payment_service = Arc::new(PaymentService::new(
        payment_repo.clone(),
        bill_repo.clone(),
        bill_service.clone(),
        order_service.clone(),
        reconciliation.clone(),
        gateway_service.clone(),
        locks.clone(),
    ));

    let sweeper = Arc::new(PendingPaymentSweeper::new(
        payment_service.clone(),
        locks.clone(),
        Duration::from_secs(config.app.sweep_interval_secs),
        chrono::Duration::minutes(config.app.pending_ttl_minutes),
    ));
    tokio::spawn(sweeper.start());

    let bind_address = config.server.bind_address();
    let workers = config.server.workers;

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(Cors::default().allow_any_origin().allow_any_method().allow_any_header())
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(gateway_service.clone()))
            .app_data(web::Data::new(order_service.clone()))
            .app_data(web::Data::new(bill_service.clone()))
            .app_data(web::Data::new(payment_service.clone()))
            .configure(health::configure)
            .configure(gateways::configure)
            .configure(orders::configure)
            .configure(bills::configure)
            .configure(payments::configure)
    })
    .workers(workers)
    .bind(&bind_address)?
    .run();

    tracing::info!(bind = %bind_address, workers = workers, "Server started");

    server.await
}
