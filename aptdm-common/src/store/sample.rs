//! Sample directories

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::files::{
    check_uploads, list_files, populate_new_directory, FileKind, FileRecord, FileSource, Upload,
};
use super::{create_child, discard_directory, existing_child, list_subdirectories, DataStore};
use crate::metadata::{
    CollectionMetadata, MetadataDocument, SampleInformation, SamplePreparation,
};
use crate::{Error, Result};

/// Everything needed to create a sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSample {
    pub information: SampleInformation,
    #[serde(default)]
    pub collection: CollectionMetadata,
    #[serde(default)]
    pub preparation: SamplePreparation,
}

impl NewSample {
    /// Validation errors of all three documents, prefixed by document
    pub fn validation_errors(&self) -> Vec<String> {
        let documents = [
            ("information", self.information.validation_errors()),
            ("collection", self.collection.validation_errors()),
            ("preparation", self.preparation.validation_errors()),
        ];
        let mut errors = Vec::new();
        for (doc, list) in documents {
            errors.extend(list.into_iter().map(|e| format!("{}.{}", doc, e)));
        }
        errors
    }
}

/// A sample inside a dataset
#[derive(Debug, Clone, Serialize)]
pub struct SampleDirectory {
    pub dataset_name: String,
    pub sample_name: String,
    pub path: PathBuf,
}

impl SampleDirectory {
    /// `SampleInformation.yaml`, if present
    pub fn load_sample_information(&self) -> Result<Option<SampleInformation>> {
        SampleInformation::read_optional(&self.path)
    }

    /// `CollectionMetadata.yaml`, if present
    pub fn load_collection_metadata(&self) -> Result<Option<CollectionMetadata>> {
        CollectionMetadata::read_optional(&self.path)
    }

    /// `SamplePreparation.yaml`, if present
    pub fn load_preparation(&self) -> Result<Option<SamplePreparation>> {
        SamplePreparation::read_optional(&self.path)
    }

    /// Raw instrument files (`*.RHIT`, any case)
    pub fn rhit_files(&self) -> Result<Vec<FileRecord>> {
        list_files(&self.path, |name| FileKind::Rhit.accepts(name))
    }

    /// Reconstruction directory names, sorted
    pub fn list_reconstructions(&self) -> Result<Vec<String>> {
        list_subdirectories(&self.path)
    }

    pub(crate) fn reconstruction_path(&self, name: &str) -> Result<PathBuf> {
        existing_child(&self.path, "reconstruction", name)
    }
}

impl DataStore {
    /// Create a sample with its three metadata documents.
    ///
    /// The directory name is `information.sample_name`; it must be unique
    /// within the dataset.
    pub fn create_sample(&self, dataset: &str, sample: &NewSample) -> Result<SampleDirectory> {
        self.create_sample_with_files(dataset, sample, &[])
    }

    /// Create a sample together with its raw `.RHIT` `files`, removing it
    /// again if any of them cannot be stored
    pub fn create_sample_with_files(
        &self,
        dataset: &str,
        sample: &NewSample,
        files: &[Upload<'_>],
    ) -> Result<SampleDirectory> {
        let dataset_dir = self.load_mutable_dataset(dataset)?;

        let errors = sample.validation_errors();
        if !errors.is_empty() {
            return Err(Error::Metadata {
                path: dataset_dir.path.clone(),
                errors,
            });
        }
        check_uploads(files, &[FileKind::Rhit])?;

        let sample_name = sample.information.sample_name.clone();
        let path = create_child(&dataset_dir.path, "Sample", &sample_name).map_err(|e| match e {
            Error::AlreadyExists(_) => Error::AlreadyExists(format!(
                "Sample {} already exists for dataset {}",
                sample_name, dataset
            )),
            other => other,
        })?;

        let written = sample
            .information
            .write_to_dir(&path)
            .and_then(|_| sample.collection.write_to_dir(&path))
            .and_then(|_| sample.preparation.write_to_dir(&path));
        if let Err(e) = written {
            discard_directory(&path);
            return Err(e);
        }
        populate_new_directory(&path, files)?;

        info!(dataset = %dataset, sample = %sample_name, files = files.len(), "Created sample");
        Ok(SampleDirectory {
            dataset_name: dataset.to_string(),
            sample_name,
            path,
        })
    }

    /// Load a sample by dataset and sample name
    pub fn load_sample(&self, dataset: &str, sample: &str) -> Result<SampleDirectory> {
        let dataset_dir = self.load_dataset(dataset)?;
        let path = dataset_dir.sample_path(sample)?;
        Ok(SampleDirectory {
            dataset_name: dataset.to_string(),
            sample_name: sample.to_string(),
            path,
        })
    }

    fn load_mutable_sample(&self, dataset: &str, sample: &str) -> Result<SampleDirectory> {
        let dataset_dir = self.load_mutable_dataset(dataset)?;
        let path = dataset_dir.sample_path(sample)?;
        Ok(SampleDirectory {
            dataset_name: dataset.to_string(),
            sample_name: sample.to_string(),
            path,
        })
    }

    /// Overwrite `SampleInformation.yaml`. The sample name cannot change.
    pub fn update_sample_information(
        &self,
        dataset: &str,
        sample: &str,
        information: &SampleInformation,
    ) -> Result<PathBuf> {
        let dir = self.load_mutable_sample(dataset, sample)?;
        if information.sample_name != dir.sample_name {
            return Err(Error::InvalidInput(format!(
                "Sample name cannot be changed from {} to {}",
                dir.sample_name, information.sample_name
            )));
        }
        information.write_to_dir(&dir.path)
    }

    /// Overwrite `CollectionMetadata.yaml`
    pub fn update_collection_metadata(
        &self,
        dataset: &str,
        sample: &str,
        collection: &CollectionMetadata,
    ) -> Result<PathBuf> {
        let dir = self.load_mutable_sample(dataset, sample)?;
        collection.write_to_dir(&dir.path)
    }

    /// Overwrite `SamplePreparation.yaml`
    pub fn update_preparation(
        &self,
        dataset: &str,
        sample: &str,
        preparation: &SamplePreparation,
    ) -> Result<PathBuf> {
        let dir = self.load_mutable_sample(dataset, sample)?;
        preparation.write_to_dir(&dir.path)
    }

    /// Store a raw `.RHIT` file in the sample directory
    pub fn store_rhit_file(
        &self,
        dataset: &str,
        sample: &str,
        file_name: &str,
        contents: &(impl FileSource + ?Sized),
    ) -> Result<FileRecord> {
        let dir = self.load_mutable_sample(dataset, sample)?;
        super::files::store_file(&dir.path, file_name, contents, FileKind::Rhit)
    }
}
