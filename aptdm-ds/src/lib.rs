//! aptdm-ds library - APT dataset service
//!
//! JSON and multipart HTTP API over the dataset → sample → reconstruction →
//! analysis hierarchy kept by [`aptdm_common::DataStore`].

use std::time::Instant;

use aptdm_common::DataStore;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;

pub use error::{ApiError, ApiResult};

/// Largest accepted request body; RHIT and POS files run to hundreds of MB
pub const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Directory hierarchy manager rooted at the datasets folder
    pub store: DataStore,
    /// When the service started, for `/health` uptime
    pub startup_time: Instant,
}

impl AppState {
    pub fn new(store: DataStore) -> Self {
        Self {
            store,
            startup_time: Instant::now(),
        }
    }
}

/// Build application router
///
/// Every route that creates or edits something inside a dataset sits behind
/// the publication lock.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post, put};

    let locked = Router::new()
        .route("/api/datasets/:dataset", put(api::update_dataset))
        .route("/api/datasets/:dataset/publish", post(api::publish_dataset))
        .route(
            "/api/datasets/:dataset/samples/defaults",
            get(api::sample_defaults),
        )
        .route("/api/datasets/:dataset/samples", post(api::create_sample))
        .route(
            "/api/datasets/:dataset/samples/:sample/information",
            put(api::update_sample_information),
        )
        .route(
            "/api/datasets/:dataset/samples/:sample/collection",
            put(api::update_collection_metadata),
        )
        .route(
            "/api/datasets/:dataset/samples/:sample/preparation",
            put(api::update_preparation),
        )
        .route(
            "/api/datasets/:dataset/samples/:sample/rhit",
            post(api::upload_rhit_file),
        )
        .route(
            "/api/datasets/:dataset/samples/:sample/reconstructions",
            post(api::create_reconstruction),
        )
        .route(
            "/api/datasets/:dataset/samples/:sample/reconstructions/:recon",
            put(api::update_reconstruction),
        )
        .route(
            "/api/datasets/:dataset/samples/:sample/reconstructions/:recon/analyses",
            post(api::create_analysis),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::publication_lock,
        ));

    // Readable after publication. GETs merge with the locked PUT on shared paths.
    let open = Router::new()
        .route("/api/analysis-presets", get(api::list_analysis_presets))
        .route("/api/buildinfo", get(api::get_build_info))
        .route(
            "/api/datasets",
            get(api::list_datasets).post(api::create_dataset),
        )
        .route("/api/datasets/:dataset", get(api::get_dataset))
        .route(
            "/api/datasets/:dataset/samples/:sample",
            get(api::get_sample),
        )
        .route(
            "/api/datasets/:dataset/samples/:sample/reconstructions/:recon",
            get(api::get_reconstruction),
        )
        .route(
            "/api/datasets/:dataset/samples/:sample/reconstructions/:recon/analyses/:analysis",
            get(api::get_analysis),
        )
        .merge(api::health_routes());

    Router::new()
        .merge(locked)
        .merge(open)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
