//! On-disk hierarchy manager
//!
//! ```text
//! <datasets root>/
//!   <dataset>/                  GeneralMetadata.yml [PublicationRecord.yaml]
//!     <sample>/                 SampleInformation.yaml CollectionMetadata.yaml
//!                               SamplePreparation.yaml *.RHIT
//!       <reconstruction>/       ReconstructionMetadata.yaml *.POS *.RRNG tip images
//!         <analysis>/           AnalysisMetadata.yaml result files
//!   .uploads/                   uploads staged before they are linked in
//! ```
//!
//! Every mutating operation goes through [`DataStore`], which refuses to
//! touch a dataset once it has been published.

mod analysis;
mod dataset;
mod files;
mod publication;
mod reconstruction;
mod sample;

pub use analysis::AnalysisDirectory;
pub use dataset::{DatasetDirectory, DatasetEntry};
pub use files::{
    sanitize_file_name, FileKind, FileRecord, FileSource, StagedFile, StagingWriter, Upload,
};
pub use reconstruction::ReconstructionDirectory;
pub use sample::{NewSample, SampleDirectory};

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::names;
use crate::{Error, Result};

/// Entry point to the directory hierarchy
#[derive(Debug, Clone)]
pub struct DataStore {
    root: PathBuf,
}

impl DataStore {
    /// `root` is the directory holding one sub-directory per dataset
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the dataset directory. Names outside `[A-Za-z0-9_]` are
    /// treated as missing so a lookup can never leave the root.
    fn dataset_path(&self, name: &str) -> Result<PathBuf> {
        if !names::is_valid_name(name) {
            return Err(Error::NotFound(format!("No dataset named {}", name)));
        }
        Ok(self.root.join(name))
    }
}

/// Names of the visible sub-directories of `dir`, sorted
pub(crate) fn list_subdirectories(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

/// Resolve `child` under `parent`, checking the name and that it exists
pub(crate) fn existing_child(parent: &Path, kind: &str, child: &str) -> Result<PathBuf> {
    let path = parent.join(child);
    if !names::is_valid_name(child) || !path.is_dir() {
        return Err(Error::NotFound(format!("No {} named {}", kind, child)));
    }
    Ok(path)
}

/// Create a new child directory, failing if it is already present
pub(crate) fn create_child(parent: &Path, kind: &str, child: &str) -> Result<PathBuf> {
    names::validate_name(kind, child)?;
    let path = parent.join(child);
    match std::fs::create_dir(&path) {
        Ok(()) => Ok(path),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(Error::AlreadyExists(format!(
            "{} {} already exists",
            kind, child
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Remove a directory created by a failed multi-step operation
pub(crate) fn discard_directory(path: &Path) {
    if let Err(e) = std::fs::remove_dir_all(path) {
        tracing::warn!(path = %path.display(), error = %e, "Failed to clean up directory");
    }
}
