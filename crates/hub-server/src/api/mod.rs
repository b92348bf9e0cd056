use std::sync::Arc;

use axum::Router;
use axum::routing::{get, put};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod actions;
mod devices;
mod extract;
mod logs;
mod sensors;

/// Upper bound for any `limit` query parameter
pub const MAX_LIMIT: i64 = 1000;

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/devices", get(devices::list).post(devices::register))
        .route("/api/devices/stats", get(devices::statistics))
        .route(
            "/api/devices/{id}",
            get(devices::get_one)
                .put(devices::update)
                .delete(devices::delete),
        )
        .route("/api/devices/{id}/wifi", put(devices::configure_wifi))
        .route("/api/actions", get(actions::list_pending).post(actions::enqueue))
        .route("/api/actions/stats", get(actions::statistics))
        .route(
            "/api/actions/{id}",
            get(actions::get_one).put(actions::update_status),
        )
        .route("/api/actions/device/{device_id}", get(actions::list_for_device))
        .route("/api/sensors", get(sensors::list_for_user).post(sensors::record))
        .route("/api/sensors/device/{device_id}", get(sensors::for_device))
        .route(
            "/api/sensors/latest/{device_id}/{sensor_type}",
            get(sensors::latest),
        )
        .route("/api/sensors/stats/{device_id}", get(sensors::statistics))
        .route("/api/sensors/types/{device_id}", get(sensors::sensor_types))
        .route("/api/logs", get(logs::list))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
