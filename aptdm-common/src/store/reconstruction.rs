//! Reconstruction directories

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use super::files::{
    check_uploads, list_files, populate_new_directory, store_file, FileKind, FileRecord,
    FileSource, Upload,
};
use super::{create_child, discard_directory, existing_child, list_subdirectories, DataStore};
use crate::metadata::{MetadataDocument, ReconstructionMetadata};
use crate::{Error, Result};

/// File kinds kept in a reconstruction directory
const RECONSTRUCTION_KINDS: [FileKind; 3] = [FileKind::Pos, FileKind::Rrng, FileKind::TipImage];

/// A reconstruction of one sample's raw data
#[derive(Debug, Clone, Serialize)]
pub struct ReconstructionDirectory {
    pub dataset_name: String,
    pub sample_name: String,
    pub reconstruction_name: String,
    pub path: PathBuf,
}

impl ReconstructionDirectory {
    pub fn load_metadata(&self) -> Result<ReconstructionMetadata> {
        ReconstructionMetadata::read_from_dir(&self.path)
    }

    pub fn pos_files(&self) -> Result<Vec<FileRecord>> {
        list_files(&self.path, |name| FileKind::Pos.accepts(name))
    }

    pub fn rrng_files(&self) -> Result<Vec<FileRecord>> {
        list_files(&self.path, |name| FileKind::Rrng.accepts(name))
    }

    pub fn tip_images(&self) -> Result<Vec<FileRecord>> {
        list_files(&self.path, |name| FileKind::TipImage.accepts(name))
    }

    /// Analysis directory names, sorted
    pub fn list_analyses(&self) -> Result<Vec<String>> {
        list_subdirectories(&self.path)
    }

    pub(crate) fn analysis_path(&self, name: &str) -> Result<PathBuf> {
        existing_child(&self.path, "analysis", name)
    }
}

impl DataStore {
    /// Create a reconstruction directory named `name` inside a sample
    pub fn create_reconstruction(
        &self,
        dataset: &str,
        sample: &str,
        name: &str,
        metadata: &ReconstructionMetadata,
    ) -> Result<ReconstructionDirectory> {
        self.create_reconstruction_with_files(dataset, sample, name, metadata, &[])
    }

    /// Create a reconstruction holding POS, RRNG and tip image `files`,
    /// removing it again if any of them cannot be stored
    pub fn create_reconstruction_with_files(
        &self,
        dataset: &str,
        sample: &str,
        name: &str,
        metadata: &ReconstructionMetadata,
        files: &[Upload<'_>],
    ) -> Result<ReconstructionDirectory> {
        self.load_mutable_dataset(dataset)?;
        let sample_dir = self.load_sample(dataset, sample)?;
        metadata.check()?;
        check_uploads(files, &RECONSTRUCTION_KINDS)?;

        let path = create_child(&sample_dir.path, "Reconstruction", name).map_err(|e| match e {
            Error::AlreadyExists(_) => Error::AlreadyExists(format!(
                "Reconstruction {} already exists for sample {}",
                name, sample
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
            reconstruction = %name,
            files = files.len(),
            "Created reconstruction"
        );
        Ok(ReconstructionDirectory {
            dataset_name: dataset.to_string(),
            sample_name: sample.to_string(),
            reconstruction_name: name.to_string(),
            path,
        })
    }

    pub fn load_reconstruction(
        &self,
        dataset: &str,
        sample: &str,
        reconstruction: &str,
    ) -> Result<ReconstructionDirectory> {
        let sample_dir = self.load_sample(dataset, sample)?;
        let path = sample_dir.reconstruction_path(reconstruction)?;
        Ok(ReconstructionDirectory {
            dataset_name: dataset.to_string(),
            sample_name: sample.to_string(),
            reconstruction_name: reconstruction.to_string(),
            path,
        })
    }

    pub(crate) fn load_mutable_reconstruction(
        &self,
        dataset: &str,
        sample: &str,
        reconstruction: &str,
    ) -> Result<ReconstructionDirectory> {
        self.load_mutable_dataset(dataset)?;
        self.load_reconstruction(dataset, sample, reconstruction)
    }

    /// Overwrite `ReconstructionMetadata.yaml`
    pub fn update_reconstruction_metadata(
        &self,
        dataset: &str,
        sample: &str,
        reconstruction: &str,
        metadata: &ReconstructionMetadata,
    ) -> Result<PathBuf> {
        let dir = self.load_mutable_reconstruction(dataset, sample, reconstruction)?;
        metadata.write_to_dir(&dir.path)
    }

    /// Store a POS, RRNG or tip image file in a reconstruction
    pub fn store_reconstruction_file(
        &self,
        dataset: &str,
        sample: &str,
        reconstruction: &str,
        file_name: &str,
        contents: &(impl FileSource + ?Sized),
        kind: FileKind,
    ) -> Result<FileRecord> {
        if !RECONSTRUCTION_KINDS.contains(&kind) {
            return Err(Error::InvalidInput(format!(
                "{} files do not belong in a reconstruction",
                kind.label()
            )));
        }
        let dir = self.load_mutable_reconstruction(dataset, sample, reconstruction)?;
        store_file(&dir.path, file_name, contents, kind)
    }
}
