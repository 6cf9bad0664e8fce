use crate::cli::{DirArgs, ServeArgs};
use crate::infra::AppState;
use crate::pipeline::load_config;
use crate::routes::with_prediction_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use decision_match::error::AppError;
use decision_match::prediction::PredictionService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::{info, Level};

pub(crate) async fn run(mut args: ServeArgs, dirs: DirArgs) -> Result<(), AppError> {
    let mut config = load_config(&dirs)?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let prediction_service = Arc::new(PredictionService::from_models_dir(
        config.paths.models_dir.clone(),
    ));
    let health = prediction_service.health();
    info!(
        model_loaded = health.model_loaded,
        threshold = health.threshold,
        models_dir = %config.paths.models_dir.display(),
        "prediction service initialised"
    );

    let app = with_prediction_routes(prediction_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "decision match service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
