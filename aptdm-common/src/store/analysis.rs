//! Analysis directories

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use super::files::{
    check_uploads, is_metadata_file, list_files, populate_new_directory, store_file, FileKind,
    FileRecord, FileSource, Upload,
};
use super::{create_child, discard_directory, DataStore};
use crate::metadata::{AnalysisMetadata, MetadataDocument};
use crate::{Error, Result};

/// Results derived from one reconstruction
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisDirectory {
    pub dataset_name: String,
    pub sample_name: String,
    pub reconstruction_name: String,
    pub analysis_name: String,
    pub path: PathBuf,
}

impl AnalysisDirectory {
    pub fn load_metadata(&self) -> Result<AnalysisMetadata> {
        AnalysisMetadata::read_from_dir(&self.path)
    }

    /// Every uploaded result file; the metadata document is not listed
    pub fn data_files(&self) -> Result<Vec<FileRecord>> {
        list_files(&self.path, |name| !is_metadata_file(name))
    }
}

impl DataStore {
    /// Create an analysis folder inside a reconstruction
    pub fn create_analysis(
        &self,
        dataset: &str,
        sample: &str,
        reconstruction: &str,
        folder_name: &str,
        metadata: &AnalysisMetadata,
    ) -> Result<AnalysisDirectory> {
        self.create_analysis_with_files(
            dataset,
            sample,
            reconstruction,
            folder_name,
            metadata,
            &[],
        )
    }

    /// Create an analysis folder holding `files`.
    ///
    /// The files are checked before anything is written; if one still
    /// cannot be stored, the new folder is removed.
    pub fn create_analysis_with_files(
        &self,
        dataset: &str,
        sample: &str,
        reconstruction: &str,
        folder_name: &str,
        metadata: &AnalysisMetadata,
        files: &[Upload<'_>],
    ) -> Result<AnalysisDirectory> {
        let recon = self.load_mutable_reconstruction(dataset, sample, reconstruction)?;
        metadata.check()?;
        check_uploads(files, &[FileKind::AnalysisResult])?;

        let path = create_child(&recon.path, "Analysis", folder_name).map_err(|e| match e {
            Error::AlreadyExists(_) => Error::AlreadyExists(format!(
                "Analysis {} already exists for reconstruction {}",
                folder_name, reconstruction
            )),
            other => other,
        })?;
        if let Err(e) = metadata.write_to_dir(&path) {
            discard_directory(&path);
            return Err(e);
        }
        populate_new_directory(&path, files)?;

        info!(
            dataset = %dataset,
            sample = %sample,
            reconstruction = %reconstruction,
            analysis = %folder_name,
            files = files.len(),
            "Created analysis"
        );
        Ok(AnalysisDirectory {
            dataset_name: dataset.to_string(),
            sample_name: sample.to_string(),
            reconstruction_name: reconstruction.to_string(),
            analysis_name: folder_name.to_string(),
            path,
        })
    }

    pub fn load_analysis(
        &self,
        dataset: &str,
        sample: &str,
        reconstruction: &str,
        analysis: &str,
    ) -> Result<AnalysisDirectory> {
        let recon = self.load_reconstruction(dataset, sample, reconstruction)?;
        let path = recon.analysis_path(analysis)?;
        Ok(AnalysisDirectory {
            dataset_name: dataset.to_string(),
            sample_name: sample.to_string(),
            reconstruction_name: reconstruction.to_string(),
            analysis_name: analysis.to_string(),
            path,
        })
    }

    fn load_mutable_analysis(
        &self,
        dataset: &str,
        sample: &str,
        reconstruction: &str,
        analysis: &str,
    ) -> Result<AnalysisDirectory> {
        self.load_mutable_dataset(dataset)?;
        self.load_analysis(dataset, sample, reconstruction, analysis)
    }

    /// Overwrite `AnalysisMetadata.yaml`
    pub fn update_analysis_metadata(
        &self,
        dataset: &str,
        sample: &str,
        reconstruction: &str,
        analysis: &str,
        metadata: &AnalysisMetadata,
    ) -> Result<PathBuf> {
        let dir = self.load_mutable_analysis(dataset, sample, reconstruction, analysis)?;
        metadata.write_to_dir(&dir.path)
    }

    /// Add a result file to an analysis
    pub fn store_analysis_file(
        &self,
        dataset: &str,
        sample: &str,
        reconstruction: &str,
        analysis: &str,
        file_name: &str,
        contents: &(impl FileSource + ?Sized),
    ) -> Result<FileRecord> {
        let dir = self.load_mutable_analysis(dataset, sample, reconstruction, analysis)?;
        store_file(&dir.path, file_name, contents, FileKind::AnalysisResult)
    }
}
