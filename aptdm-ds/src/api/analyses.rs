//! Analysis endpoints

use aptdm_common::metadata::{analysis_presets, AnalysisMetadata, AnalysisPreset};
use aptdm_common::store::{AnalysisDirectory, FileKind, FileRecord, Upload};
use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use super::extract::{Json, Multipart, Path};
use super::upload::UploadForm;
use super::with_store;
use crate::{ApiResult, AppState};

/// `metadata` part of the creation form
#[derive(Debug, Deserialize)]
pub struct NewAnalysis {
    pub folder_name: String,
    pub metadata: AnalysisMetadata,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub dataset: String,
    pub sample: String,
    pub reconstruction: String,
    pub name: String,
    pub metadata: AnalysisMetadata,
    pub files: Vec<FileRecord>,
}

#[derive(Debug, Serialize)]
pub struct PresetListResponse {
    pub presets: Vec<AnalysisPreset>,
}

fn describe_analysis(analysis: &AnalysisDirectory) -> aptdm_common::Result<AnalysisResponse> {
    Ok(AnalysisResponse {
        dataset: analysis.dataset_name.clone(),
        sample: analysis.sample_name.clone(),
        reconstruction: analysis.reconstruction_name.clone(),
        name: analysis.analysis_name.clone(),
        metadata: analysis.load_metadata()?,
        files: analysis.data_files()?,
    })
}

/// GET /api/analysis-presets
pub async fn list_analysis_presets() -> Json<PresetListResponse> {
    Json(PresetListResponse {
        presets: analysis_presets(),
    })
}

/// POST /api/datasets/:dataset/samples/:sample/reconstructions/:recon/analyses
///
/// Multipart: `metadata` (JSON `{folder_name, metadata}`) and any number of
/// `files` parts.
pub async fn create_analysis(
    State(state): State<AppState>,
    Path((dataset, sample, recon)): Path<(String, String, String)>,
    Multipart(multipart): Multipart,
) -> ApiResult<(StatusCode, Json<AnalysisResponse>)> {
    let mut form = UploadForm::read(&state, multipart).await?;
    let request: NewAnalysis = form.metadata()?;
    let files = form.take_files("files");
    form.ensure_consumed()?;

    let response = with_store(&state, move |store| {
        let uploads: Vec<Upload<'_>> = files
            .iter()
            .map(|file| file.as_upload(FileKind::AnalysisResult))
            .collect();
        let analysis = store.create_analysis_with_files(
            &dataset,
            &sample,
            &recon,
            &request.folder_name,
            &request.metadata,
            &uploads,
        )?;
        describe_analysis(&analysis)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/datasets/:dataset/samples/:sample/reconstructions/:recon/analyses/:analysis
pub async fn get_analysis(
    State(state): State<AppState>,
    Path((dataset, sample, recon, analysis)): Path<(String, String, String, String)>,
) -> ApiResult<Json<AnalysisResponse>> {
    let response = with_store(&state, move |store| {
        describe_analysis(&store.load_analysis(&dataset, &sample, &recon, &analysis)?)
    })
    .await?;
    Ok(Json(response))
}
