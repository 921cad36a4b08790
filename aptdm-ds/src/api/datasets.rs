//! Dataset endpoints

use aptdm_common::metadata::{Author, GeneralMetadata, PublicationRecord};
use aptdm_common::store::DatasetDirectory;
use aptdm_common::DataStore;
use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::extract::{Json, Path};
use super::{document_or_errors, with_store};
use crate::{ApiResult, AppState};

/// Descriptive fields of a dataset, as sent by clients
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetForm {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub authors: Vec<Author>,
}

#[derive(Debug, Serialize)]
pub struct DatasetSummary {
    pub name: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DatasetListResponse {
    pub datasets: Vec<DatasetSummary>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct SampleSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DatasetResponse {
    pub name: String,
    pub metadata: GeneralMetadata,
    pub published: bool,
    pub samples: Vec<SampleSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication: Option<PublicationRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// GET /api/datasets
///
/// Lists every dataset directory, including ones whose metadata is broken.
pub async fn list_datasets(State(state): State<AppState>) -> ApiResult<Json<DatasetListResponse>> {
    let entries = with_store(&state, |store| store.list_datasets()).await?;

    let datasets = entries
        .into_iter()
        .map(|entry| match entry.dataset {
            Ok(dataset) => DatasetSummary {
                name: entry.name,
                valid: true,
                title: Some(dataset.metadata.title.clone()),
                published: Some(dataset.is_published()),
                errors: Vec::new(),
            },
            Err(e) => DatasetSummary {
                name: entry.name,
                valid: false,
                title: None,
                published: None,
                errors: e.messages(),
            },
        })
        .collect();

    Ok(Json(DatasetListResponse { datasets }))
}

/// POST /api/datasets
pub async fn create_dataset(
    State(state): State<AppState>,
    Json(form): Json<DatasetForm>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let dataset = with_store(&state, move |store| {
        store.create_dataset(&form.title, &form.abstract_text, form.authors)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse { name: dataset.name }),
    ))
}

/// GET /api/datasets/:dataset
pub async fn get_dataset(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<DatasetResponse>> {
    let response = with_store(&state, move |store| {
        let dataset = store.load_dataset(&name)?;
        describe_dataset(store, dataset)
    })
    .await?;
    Ok(Json(response))
}

/// PUT /api/datasets/:dataset
pub async fn update_dataset(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(form): Json<DatasetForm>,
) -> ApiResult<Json<DatasetResponse>> {
    let response = with_store(&state, move |store| {
        let dataset =
            store.update_dataset(&name, &form.title, &form.abstract_text, form.authors)?;
        describe_dataset(store, dataset)
    })
    .await?;

    info!(dataset = %response.name, "Dataset metadata edited");
    Ok(Json(response))
}

pub(crate) fn describe_dataset(
    store: &DataStore,
    dataset: DatasetDirectory,
) -> aptdm_common::Result<DatasetResponse> {
    let mut errors = Vec::new();

    let samples = dataset
        .list_samples()?
        .into_iter()
        .map(|sample_name| {
            let mut sample_errors = Vec::new();
            let loaded = store
                .load_sample(&dataset.name, &sample_name)
                .and_then(|sample| sample.load_sample_information());
            let title = match loaded {
                Ok(info) => info.map(|info| info.sample_title),
                Err(e) => {
                    sample_errors = e.messages();
                    None
                }
            };
            SampleSummary {
                name: sample_name,
                title,
                errors: sample_errors,
            }
        })
        .collect();

    let publication = document_or_errors(dataset.publication_record(), &mut errors);

    Ok(DatasetResponse {
        published: dataset.is_published(),
        name: dataset.name,
        metadata: dataset.metadata,
        samples,
        publication,
        errors,
    })
}
