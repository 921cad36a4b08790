//! Dataset directories

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use super::{existing_child, list_subdirectories, DataStore};
use crate::metadata::{
    Author, DatasetDates, GeneralMetadata, MetadataDocument, PublicationRecord,
};
use crate::names::{sanitize_name_component, validate_name};
use crate::time::{dataset_date_stamp, today};
use crate::{Error, Result};

/// A dataset whose general metadata parsed and validated
#[derive(Debug, Clone, Serialize)]
pub struct DatasetDirectory {
    pub name: String,
    pub path: PathBuf,
    pub metadata: GeneralMetadata,
}

/// One row of a dataset listing. Unreadable datasets are reported, not hidden.
#[derive(Debug)]
pub struct DatasetEntry {
    pub name: String,
    pub dataset: Result<DatasetDirectory>,
}

impl DatasetDirectory {
    fn load(name: &str, path: PathBuf) -> Result<Self> {
        if !path.is_dir() {
            return Err(Error::NotFound(format!("No dataset at: {}", path.display())));
        }
        let metadata = GeneralMetadata::read_from_dir(&path)?;
        Ok(Self {
            name: name.to_string(),
            path,
            metadata,
        })
    }

    /// Publication is terminal: once the date is set the dataset is frozen
    pub fn is_published(&self) -> bool {
        self.metadata.dates.publication_date.is_some()
    }

    /// Sample directory names, sorted
    pub fn list_samples(&self) -> Result<Vec<String>> {
        list_subdirectories(&self.path)
    }

    /// First `Sample<N>` (N >= 1) not already used in this dataset
    pub fn next_sample_name(&self) -> String {
        (1..)
            .map(|n| format!("Sample{}", n))
            .find(|candidate| !self.path.join(candidate).exists())
            .unwrap_or_else(|| "Sample1".to_string())
    }

    /// The record written at publication time, if any
    pub fn publication_record(&self) -> Result<Option<PublicationRecord>> {
        PublicationRecord::read_optional(&self.path)
    }

    pub(crate) fn sample_path(&self, sample: &str) -> Result<PathBuf> {
        existing_child(&self.path, "sample", sample)
    }
}

impl DataStore {
    /// Create a dataset dated today
    pub fn create_dataset(
        &self,
        title: &str,
        abstract_text: &str,
        authors: Vec<Author>,
    ) -> Result<DatasetDirectory> {
        self.create_dataset_on(today(), title, abstract_text, authors)
    }

    /// Create a dataset named `<DDMonYY>_<FirstAuthorSurname>_<index>`.
    ///
    /// `index` is the smallest non-negative integer that gives an unused name.
    pub fn create_dataset_on(
        &self,
        date: NaiveDate,
        title: &str,
        abstract_text: &str,
        authors: Vec<Author>,
    ) -> Result<DatasetDirectory> {
        let metadata = GeneralMetadata {
            title: title.to_string(),
            abstract_text: abstract_text.to_string(),
            authors,
            dates: DatasetDates {
                creation_date: date,
                publication_date: None,
            },
        };
        metadata.check()?;

        let first_author = sanitize_name_component(&metadata.authors[0].last_name);
        let prefix = format!("{}_{}", dataset_date_stamp(date), first_author);

        std::fs::create_dir_all(&self.root)?;
        let (name, path) = claim_directory(&self.root, &prefix)?;

        if let Err(e) = metadata.write_to_dir(&path) {
            super::discard_directory(&path);
            return Err(e);
        }

        info!(dataset = %name, "Created dataset");
        Ok(DatasetDirectory {
            name,
            path,
            metadata,
        })
    }

    /// Load a dataset by name, validating its general metadata
    pub fn load_dataset(&self, name: &str) -> Result<DatasetDirectory> {
        let path = self.dataset_path(name)?;
        DatasetDirectory::load(name, path)
    }

    /// Every dataset directory under the root, sorted by name.
    ///
    /// Invalid datasets are included with the error that prevents loading.
    /// A directory whose name [`DataStore::load_dataset`] would refuse is
    /// listed as invalid.
    pub fn list_datasets(&self) -> Result<Vec<DatasetEntry>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let entries = list_subdirectories(&self.root)?
            .into_iter()
            .map(|name| {
                let dataset =
                    validate_name("Dataset", &name).and_then(|_| self.load_dataset(&name));
                if let Err(e) = &dataset {
                    warn!(dataset = %name, error = %e, "Dataset failed to load");
                }
                DatasetEntry { name, dataset }
            })
            .collect();
        Ok(entries)
    }

    /// Load a dataset that may still be modified
    pub fn load_mutable_dataset(&self, name: &str) -> Result<DatasetDirectory> {
        let dataset = self.load_dataset(name)?;
        if dataset.is_published() {
            return Err(Error::Published(name.to_string()));
        }
        Ok(dataset)
    }

    /// Replace the descriptive metadata of a dataset. Dates are preserved.
    pub fn update_dataset(
        &self,
        name: &str,
        title: &str,
        abstract_text: &str,
        authors: Vec<Author>,
    ) -> Result<DatasetDirectory> {
        let mut dataset = self.load_mutable_dataset(name)?;

        let metadata = GeneralMetadata {
            title: title.to_string(),
            abstract_text: abstract_text.to_string(),
            authors,
            dates: dataset.metadata.dates.clone(),
        };
        metadata.write_to_dir(&dataset.path)?;

        info!(dataset = %name, "Updated dataset metadata");
        dataset.metadata = metadata;
        Ok(dataset)
    }
}

/// Create `<prefix>_<index>` for the first free index
fn claim_directory(root: &Path, prefix: &str) -> Result<(String, PathBuf)> {
    let mut index: u32 = 0;
    loop {
        let name = format!("{}_{}", prefix, index);
        let path = root.join(&name);
        match std::fs::create_dir(&path) {
            Ok(()) => return Ok((name, path)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => index += 1,
            Err(e) => return Err(e.into()),
        }
    }
}
