//! Publishing endpoint

use aptdm_common::metadata::PublicationRequest;
use axum::extract::State;

use super::datasets::{describe_dataset, DatasetResponse};
use super::extract::{Json, Path};
use super::with_store;
use crate::{ApiResult, AppState};

/// POST /api/datasets/:dataset/publish
///
/// Irreversible. Afterwards every locked route on the dataset answers 409.
pub async fn publish_dataset(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<PublicationRequest>,
) -> ApiResult<Json<DatasetResponse>> {
    let response = with_store(&state, move |store| {
        let dataset = store.publish_dataset(&name, &request)?;
        describe_dataset(store, dataset)
    })
    .await?;
    Ok(Json(response))
}
