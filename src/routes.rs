use std::sync::Arc;

use actix_web::{web, HttpResponse, Responder};
use log::info;
use serde::Deserialize;
use tokio::task;
use utoipa::{IntoParams, OpenApi};

use crate::burn::{BurnController, BurnResult, DEFAULT_BURN_SECONDS};
use crate::config::AppSettings;
use crate::error::AppError;
use crate::health::{run_checks, AppLiveness, AppReadiness, HealthCheck, HealthReport};
use crate::info::{report as info_report, InfoReport};
use crate::metrics::MetricsRegistry;

pub struct AppState {
    pub settings: AppSettings,
    pub metrics: Arc<MetricsRegistry>,
    pub burner: BurnController,
    liveness: Vec<Box<dyn HealthCheck>>,
    readiness: Vec<Box<dyn HealthCheck>>,
}

impl AppState {
    pub fn new(settings: AppSettings, metrics: Arc<MetricsRegistry>) -> Self {
        let burner = BurnController::new(metrics.clone());
        Self {
            settings,
            metrics,
            burner,
            liveness: vec![Box::new(AppLiveness) as Box<dyn HealthCheck>],
            readiness: vec![Box::new(AppReadiness) as Box<dyn HealthCheck>],
        }
    }

    pub fn with_burner(mut self, burner: BurnController) -> Self {
        self.burner = burner;
        self
    }

    /// Adds a dependency the pod must reach before taking traffic.
    pub fn with_readiness_check<C>(mut self, check: C) -> Self
    where
        C: HealthCheck + 'static,
    {
        self.readiness.push(Box::new(check));
        self
    }

    fn liveness_report(&self) -> HealthReport {
        report_for(self.liveness.iter())
    }

    fn readiness_report(&self) -> HealthReport {
        report_for(self.readiness.iter())
    }

    fn overall_report(&self) -> HealthReport {
        report_for(self.liveness.iter().chain(self.readiness.iter()))
    }
}

fn report_for<'a, I>(checks: I) -> HealthReport
where
    I: Iterator<Item = &'a Box<dyn HealthCheck>>,
{
    let checks: Vec<&dyn HealthCheck> = checks.map(|c| &**c).collect();
    run_checks(&checks)
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BurnParams {
    /// Seconds to keep every core busy; capped at 120, defaults to 30
    seconds: Option<i64>,
}

/// `/api/burn?seconds=10` - pins every core so pod CPU crosses the HPA threshold.
#[utoipa::path(
    get,
    path = "/api/burn",
    params(BurnParams),
    responses(
        (status = 200, description = "Burn finished on every core", body = BurnResult),
        (status = 400, description = "seconds is not an integer")
    ),
    tag = "burn"
)]
async fn burn(
    state: web::Data<AppState>,
    params: web::Query<BurnParams>,
) -> Result<HttpResponse, AppError> {
    let seconds = params.seconds.unwrap_or(DEFAULT_BURN_SECONDS);
    info!("CPU burn requested for {} seconds", seconds);

    // A dropped request detaches the task; the burners still run to their deadline.
    let burner = state.burner.clone();
    let result = task::spawn_blocking(move || burner.burn(seconds))
        .await
        .map_err(|e| AppError::BurnAborted(e.to_string()))?;

    Ok(HttpResponse::Ok().json(result))
}

#[utoipa::path(
    get,
    path = "/api/info",
    responses((status = 200, description = "Pod identity", body = InfoReport)),
    tag = "info"
)]
async fn app_info(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(info_report(&state.settings, &state.metrics))
}

fn health_response(report: HealthReport) -> HttpResponse {
    if report.is_up() {
        HttpResponse::Ok().json(report)
    } else {
        HttpResponse::ServiceUnavailable().json(report)
    }
}

#[utoipa::path(
    get,
    path = "/q/health/live",
    responses(
        (status = 200, description = "Process is live", body = HealthReport),
        (status = 503, description = "A liveness check is down", body = HealthReport)
    ),
    tag = "health"
)]
async fn health_live(state: web::Data<AppState>) -> impl Responder {
    health_response(state.liveness_report())
}

#[utoipa::path(
    get,
    path = "/q/health/ready",
    responses(
        (status = 200, description = "Ready for traffic", body = HealthReport),
        (status = 503, description = "A readiness check is down", body = HealthReport)
    ),
    tag = "health"
)]
async fn health_ready(state: web::Data<AppState>) -> impl Responder {
    health_response(state.readiness_report())
}

#[utoipa::path(
    get,
    path = "/q/health",
    responses(
        (status = 200, description = "All checks up", body = HealthReport),
        (status = 503, description = "At least one check is down", body = HealthReport)
    ),
    tag = "health"
)]
async fn health_all(state: web::Data<AppState>) -> impl Responder {
    health_response(state.overall_report())
}

async fn metrics(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(state.metrics.render_prometheus())
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ocp-demo-app",
        description = "HPA demo: CPU burn, pod identity and health probes"
    ),
    paths(burn, app_info, health_all, health_live, health_ready),
    tags(
        (name = "burn", description = "Saturate every core for a bounded time"),
        (name = "info", description = "Which pod answered"),
        (name = "health", description = "Kubelet probes")
    )
)]
pub struct ApiDoc;

async fn openapi() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Registers every endpoint; the caller provides `web::Data<AppState>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::InvalidQuery(err.to_string()).into()),
    )
    .route("/api/burn", web::get().to(burn))
    .route("/api/info", web::get().to(app_info))
    .route("/q/health", web::get().to(health_all))
    .route("/q/health/live", web::get().to(health_live))
    .route("/q/health/ready", web::get().to(health_ready))
    .route("/q/metrics", web::get().to(metrics))
    .route("/q/openapi", web::get().to(openapi));
}
