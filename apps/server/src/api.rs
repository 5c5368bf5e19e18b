use std::sync::Arc;

use crate::{config::Config, main_lib::AppState, models::{Budget, BudgetRequest}};
use anyhow::Context;
use axum::{http::HeaderValue, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod budgets;

#[utoipa::path(get, path = "/health", responses((status = 200, description = "Healthy")))]
pub async fn health() -> &'static str {
    "Healthy"
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        budgets::list_budgets,
        budgets::get_budget,
        budgets::create_budget,
        budgets::update_budget,
        budgets::delete_budget
    ),
    components(schemas(Budget, BudgetRequest)),
    tags((name = "budgets", description = "Budget management"))
)]
pub struct ApiDoc;

pub fn app_router(state: Arc<AppState>, config: &Config) -> anyhow::Result<Router> {
    let cors = if config.cors_allow.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .cors_allow
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .with_context(|| format!("Invalid CORS origin '{}'", o))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        CorsLayer::new().allow_origin(origins)
    };
    let cors = cors.allow_methods(Any).allow_headers(Any);

    let router = Router::new()
        .merge(budgets::router())
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger").url("/swagger/v1/swagger.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http());

    Ok(router)
}
