//! Publication lock
//!
//! Route layer in front of every route that writes into a dataset. The
//! dataset named by the `:dataset` path segment must exist and must not be
//! published. The store enforces the same rule; checking here rejects
//! uploads before their bodies are read.

use std::collections::HashMap;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::extract::Path;
use super::with_store;
use crate::{ApiError, AppState};

pub async fn publication_lock(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(dataset) = params.get("dataset").cloned() else {
        return Ok(next.run(request).await);
    };

    let name = dataset.clone();
    let published = with_store(&state, move |store| {
        store.load_dataset(&name).map(|d| d.is_published())
    })
    .await?;

    if published {
        debug!(dataset = %dataset, uri = %request.uri(), "Blocked change to published dataset");
        return Err(ApiError::Published(
            "Dataset has already been published!".to_string(),
        ));
    }

    Ok(next.run(request).await)
}
