//! Sample endpoints

use aptdm_common::metadata::{CollectionMetadata, SampleInformation, SamplePreparation};
use aptdm_common::store::{FileKind, FileRecord, NewSample, SampleDirectory, Upload};
use axum::{extract::State, http::StatusCode};
use serde::Serialize;

use super::extract::{Json, Multipart, Path};
use super::upload::UploadForm;
use super::{document_or_errors, with_store};
use crate::{ApiError, ApiResult, AppState};

/// Form field carrying the raw instrument file
pub const RHIT_FIELD: &str = "rhit_file";

#[derive(Debug, Serialize)]
pub struct SampleResponse {
    pub dataset: String,
    pub name: String,
    pub information: Option<SampleInformation>,
    pub collection: Option<CollectionMetadata>,
    pub preparation: Option<SamplePreparation>,
    pub rhit_files: Vec<FileRecord>,
    pub reconstructions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

fn describe_sample(sample: &SampleDirectory) -> aptdm_common::Result<SampleResponse> {
    let mut errors = Vec::new();
    let information = document_or_errors(sample.load_sample_information(), &mut errors);
    let collection = document_or_errors(sample.load_collection_metadata(), &mut errors);
    let preparation = document_or_errors(sample.load_preparation(), &mut errors);

    Ok(SampleResponse {
        dataset: sample.dataset_name.clone(),
        name: sample.sample_name.clone(),
        information,
        collection,
        preparation,
        rhit_files: sample.rhit_files()?,
        reconstructions: sample.list_reconstructions()?,
        errors,
    })
}

/// GET /api/datasets/:dataset/samples/defaults
///
/// Starting values for a new sample form, named after the first free
/// `Sample<N>`.
pub async fn sample_defaults(
    State(state): State<AppState>,
    Path(dataset): Path<String>,
) -> ApiResult<Json<NewSample>> {
    let defaults = with_store(&state, move |store| {
        let dataset = store.load_dataset(&dataset)?;
        Ok(NewSample {
            information: SampleInformation {
                sample_name: dataset.next_sample_name(),
                sample_title: String::new(),
                sample_description: String::new(),
                metadata: Vec::new(),
            },
            collection: CollectionMetadata::default(),
            preparation: SamplePreparation::default(),
        })
    })
    .await?;
    Ok(Json(defaults))
}

/// POST /api/datasets/:dataset/samples
///
/// Multipart: `metadata` (JSON [`NewSample`]) and an optional `rhit_file`.
pub async fn create_sample(
    State(state): State<AppState>,
    Path(dataset): Path<String>,
    Multipart(multipart): Multipart,
) -> ApiResult<(StatusCode, Json<SampleResponse>)> {
    let mut form = UploadForm::read(&state, multipart).await?;
    let sample: NewSample = form.metadata()?;
    let rhit = form.take_file(RHIT_FIELD)?;
    form.ensure_consumed()?;
    if let Some(file) = &rhit {
        file.expect_kind(FileKind::Rhit)?;
    }

    let response = with_store(&state, move |store| {
        let uploads: Vec<Upload<'_>> = rhit
            .iter()
            .map(|file| file.as_upload(FileKind::Rhit))
            .collect();
        let created = store.create_sample_with_files(&dataset, &sample, &uploads)?;
        describe_sample(&created)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/datasets/:dataset/samples/:sample
pub async fn get_sample(
    State(state): State<AppState>,
    Path((dataset, sample)): Path<(String, String)>,
) -> ApiResult<Json<SampleResponse>> {
    let response = with_store(&state, move |store| {
        describe_sample(&store.load_sample(&dataset, &sample)?)
    })
    .await?;
    Ok(Json(response))
}

/// PUT /api/datasets/:dataset/samples/:sample/information
pub async fn update_sample_information(
    State(state): State<AppState>,
    Path((dataset, sample)): Path<(String, String)>,
    Json(information): Json<SampleInformation>,
) -> ApiResult<Json<SampleInformation>> {
    let saved = information.clone();
    with_store(&state, move |store| {
        store.update_sample_information(&dataset, &sample, &information)
    })
    .await?;
    Ok(Json(saved))
}

/// PUT /api/datasets/:dataset/samples/:sample/collection
pub async fn update_collection_metadata(
    State(state): State<AppState>,
    Path((dataset, sample)): Path<(String, String)>,
    Json(collection): Json<CollectionMetadata>,
) -> ApiResult<Json<CollectionMetadata>> {
    let saved = collection.clone();
    with_store(&state, move |store| {
        store.update_collection_metadata(&dataset, &sample, &collection)
    })
    .await?;
    Ok(Json(saved))
}

/// PUT /api/datasets/:dataset/samples/:sample/preparation
pub async fn update_preparation(
    State(state): State<AppState>,
    Path((dataset, sample)): Path<(String, String)>,
    Json(preparation): Json<SamplePreparation>,
) -> ApiResult<Json<SamplePreparation>> {
    let saved = preparation.clone();
    with_store(&state, move |store| {
        store.update_preparation(&dataset, &sample, &preparation)
    })
    .await?;
    Ok(Json(saved))
}

/// POST /api/datasets/:dataset/samples/:sample/rhit
pub async fn upload_rhit_file(
    State(state): State<AppState>,
    Path((dataset, sample)): Path<(String, String)>,
    Multipart(multipart): Multipart,
) -> ApiResult<(StatusCode, Json<FileRecord>)> {
    let mut form = UploadForm::read(&state, multipart).await?;
    let file = form
        .take_file(RHIT_FIELD)?
        .ok_or_else(|| ApiError::BadRequest(format!("Missing {} part", RHIT_FIELD)))?;
    form.ensure_consumed()?;

    let record = with_store(&state, move |store| {
        store.store_rhit_file(&dataset, &sample, &file.file_name, &file.contents)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(record)))
}
