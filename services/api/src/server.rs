use crate::cli::ServeArgs;
use crate::infra::{load_snapshot, AppState, ConfiguredBridge};
use crate::routes::with_coordinator_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use pg_coordinator::config::AppConfig;
use pg_coordinator::error::AppError;
use pg_coordinator::telemetry;
use pg_coordinator::workflows::coordinator::{DirectorySnapshot, InMemoryDirectory, PgCoordinator};
use pg_coordinator::workflows::membership::MembershipEngine;
use pg_coordinator::workflows::scheduling::SchedulingEngine;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let snapshot = match args.snapshot.take() {
        Some(path) => load_snapshot(&path)?,
        None => DirectorySnapshot::default(),
    };
    let bridge = ConfiguredBridge::from_config(&config.bridge)?;
    info!(bridge = bridge.describe(), "chaplaincy bridge selected");

    let coordinator = Arc::new(PgCoordinator::new(
        Arc::new(InMemoryDirectory::new(snapshot)),
        Arc::new(bridge),
        MembershipEngine::default(),
        SchedulingEngine::new(config.scheduling.policy()),
    ));

    let app = with_coordinator_routes(coordinator)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        unit = %config.scheduling.enabled_unit,
        "pg coordinator ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
