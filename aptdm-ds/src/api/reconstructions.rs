//! Reconstruction endpoints

use aptdm_common::metadata::ReconstructionMetadata;
use aptdm_common::store::{FileKind, FileRecord, ReconstructionDirectory, Upload};
use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use super::extract::{Json, Multipart, Path};
use super::upload::{UploadForm, UploadedFile};
use super::with_store;
use crate::{ApiResult, AppState};

/// File parts accepted when creating a reconstruction
const FILE_FIELDS: [(&str, FileKind); 3] = [
    ("pos_file", FileKind::Pos),
    ("rrng_file", FileKind::Rrng),
    ("tip_image", FileKind::TipImage),
];

/// `metadata` part of the creation form
#[derive(Debug, Deserialize)]
pub struct NewReconstruction {
    pub name: String,
    pub metadata: ReconstructionMetadata,
}

#[derive(Debug, Serialize)]
pub struct ReconstructionResponse {
    pub dataset: String,
    pub sample: String,
    pub name: String,
    pub metadata: ReconstructionMetadata,
    pub pos_files: Vec<FileRecord>,
    pub rrng_files: Vec<FileRecord>,
    pub tip_images: Vec<FileRecord>,
    pub analyses: Vec<String>,
}

fn describe_reconstruction(
    recon: &ReconstructionDirectory,
) -> aptdm_common::Result<ReconstructionResponse> {
    Ok(ReconstructionResponse {
        dataset: recon.dataset_name.clone(),
        sample: recon.sample_name.clone(),
        name: recon.reconstruction_name.clone(),
        metadata: recon.load_metadata()?,
        pos_files: recon.pos_files()?,
        rrng_files: recon.rrng_files()?,
        tip_images: recon.tip_images()?,
        analyses: recon.list_analyses()?,
    })
}

/// POST /api/datasets/:dataset/samples/:sample/reconstructions
///
/// Multipart: `metadata` (JSON `{name, metadata}`) plus optional
/// `pos_file`, `rrng_file` and `tip_image`.
pub async fn create_reconstruction(
    State(state): State<AppState>,
    Path((dataset, sample)): Path<(String, String)>,
    Multipart(multipart): Multipart,
) -> ApiResult<(StatusCode, Json<ReconstructionResponse>)> {
    let mut form = UploadForm::read(&state, multipart).await?;
    let request: NewReconstruction = form.metadata()?;

    let mut files: Vec<(UploadedFile, FileKind)> = Vec::new();
    for (field, kind) in FILE_FIELDS {
        if let Some(file) = form.take_file(field)? {
            file.expect_kind(kind)?;
            files.push((file, kind));
        }
    }
    form.ensure_consumed()?;

    let response = with_store(&state, move |store| {
        let uploads: Vec<Upload<'_>> = files
            .iter()
            .map(|(file, kind)| file.as_upload(*kind))
            .collect();
        let recon = store.create_reconstruction_with_files(
            &dataset,
            &sample,
            &request.name,
            &request.metadata,
            &uploads,
        )?;
        describe_reconstruction(&recon)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/datasets/:dataset/samples/:sample/reconstructions/:recon
pub async fn get_reconstruction(
    State(state): State<AppState>,
    Path((dataset, sample, recon)): Path<(String, String, String)>,
) -> ApiResult<Json<ReconstructionResponse>> {
    let response = with_store(&state, move |store| {
        describe_reconstruction(&store.load_reconstruction(&dataset, &sample, &recon)?)
    })
    .await?;
    Ok(Json(response))
}

/// PUT /api/datasets/:dataset/samples/:sample/reconstructions/:recon
pub async fn update_reconstruction(
    State(state): State<AppState>,
    Path((dataset, sample, recon)): Path<(String, String, String)>,
    Json(metadata): Json<ReconstructionMetadata>,
) -> ApiResult<Json<ReconstructionResponse>> {
    let response = with_store(&state, move |store| {
        store.update_reconstruction_metadata(&dataset, &sample, &recon, &metadata)?;
        describe_reconstruction(&store.load_reconstruction(&dataset, &sample, &recon)?)
    })
    .await?;
    Ok(Json(response))
}
