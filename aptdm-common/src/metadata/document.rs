//! YAML persistence and validation shared by every metadata document

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::{Error, Result};

/// A metadata document stored as `FILE_NAME` inside its directory
pub trait MetadataDocument: Serialize + DeserializeOwned + Sized {
    /// File name of the document within its directory
    const FILE_NAME: &'static str;

    /// Every schema violation, as `field: message` strings. Empty when valid.
    fn validation_errors(&self) -> Vec<String>;

    /// Path of this document inside `dir`
    fn path_in(dir: &Path) -> PathBuf {
        dir.join(Self::FILE_NAME)
    }

    /// Validate, returning `Error::Metadata` with all violations
    fn check(&self) -> Result<()> {
        let errors = self.validation_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Metadata {
                path: PathBuf::from(Self::FILE_NAME),
                errors,
            })
        }
    }

    /// Load and validate the document stored in `dir`
    fn read_from_dir(dir: &Path) -> Result<Self> {
        let path = Self::path_in(dir);
        if !path.is_file() {
            return Err(Error::NotFound(format!(
                "Metadata file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read(&path)?;
        let doc: Self = serde_yaml::from_slice(&content).map_err(|e| {
            Error::metadata(path.clone(), format!("Metadata file not valid YAML: {}", e))
        })?;

        let errors = doc.validation_errors();
        if !errors.is_empty() {
            return Err(Error::Metadata { path, errors });
        }
        Ok(doc)
    }

    /// Load the document if present. Absent file is `Ok(None)`.
    fn read_optional(dir: &Path) -> Result<Option<Self>> {
        if Self::path_in(dir).is_file() {
            Self::read_from_dir(dir).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Validate then write the document into `dir`, returning its path.
    ///
    /// The file is written to a uniquely named temporary sibling and
    /// renamed into place, so concurrent writers never share a temp file.
    fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        let path = Self::path_in(dir);
        let errors = self.validation_errors();
        if !errors.is_empty() {
            return Err(Error::Metadata { path, errors });
        }

        let yaml = serde_yaml::to_string(self)?;
        let tmp = dir.join(format!(".{}.{}.tmp", Self::FILE_NAME, Uuid::new_v4()));
        let written = std::fs::write(&tmp, yaml).and_then(|_| std::fs::rename(&tmp, &path));
        if let Err(e) = written {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }

        debug!(path = %path.display(), "Wrote metadata document");
        Ok(path)
    }
}

/// Flatten the derive-based validation of `doc` into `field: message` strings.
///
/// Nested structs are reported as `outer.inner`, list entries as
/// `list[index].field`. Output is sorted so reports are stable.
pub fn schema_errors<T: Validate>(doc: &T) -> Vec<String> {
    let mut out = Vec::new();
    if let Err(errors) = doc.validate() {
        collect(&errors, "", &mut out);
    }
    out.sort();
    out
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                for err in list {
                    out.push(format!("{}: {}", path, describe(err)));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

fn describe(err: &ValidationError) -> String {
    match &err.message {
        Some(message) => message.to_string(),
        None => format!("failed '{}' check", err.code),
    }
}
