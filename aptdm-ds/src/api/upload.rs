//! Multipart form handling
//!
//! Creation routes take `multipart/form-data`: one `metadata` part holding
//! JSON plus named file parts. File parts are streamed into the store's
//! staging area as they arrive; nothing enters the hierarchy until every
//! part has been read.

use aptdm_common::store::{sanitize_file_name, FileKind, StagedFile, Upload};
use axum::body::Bytes;
use axum::extract::multipart::{Field, Multipart};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tracing::debug;

use crate::{ApiError, ApiResult, AppState};

/// Name of the JSON part
pub const METADATA_FIELD: &str = "metadata";

/// Chunks buffered between the request body and the staging writer
const STAGING_QUEUE: usize = 16;

/// One uploaded file
#[derive(Debug)]
pub struct UploadedFile {
    /// Form field it arrived in
    pub field: String,
    /// Client-supplied file name, reduced to its last path component
    pub file_name: String,
    pub contents: StagedFile,
}

impl UploadedFile {
    /// Reject files whose extension does not fit `kind`
    pub fn expect_kind(&self, kind: FileKind) -> ApiResult<()> {
        if kind.accepts(&self.file_name) {
            Ok(())
        } else {
            Err(ApiError::BadRequest(format!(
                "{} ({}) is not a {} file",
                self.file_name,
                self.field,
                kind.label()
            )))
        }
    }

    /// Borrow as a store upload of `kind`
    pub fn as_upload(&self, kind: FileKind) -> Upload<'_> {
        Upload {
            file_name: &self.file_name,
            contents: &self.contents,
            kind,
        }
    }
}

/// A fully read multipart form
#[derive(Debug, Default)]
pub struct UploadForm {
    metadata: Option<Bytes>,
    files: Vec<UploadedFile>,
}

impl UploadForm {
    /// Read every part. File inputs left empty by the browser are skipped.
    pub async fn read(state: &AppState, mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = UploadForm::default();

        while let Some(mut field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);

            if name == METADATA_FIELD {
                form.metadata = Some(field.bytes().await?);
                continue;
            }

            match file_name {
                Some(raw) if !raw.is_empty() => {
                    let file_name = sanitize_file_name(&raw)?;
                    let contents = stage_field(state, &mut field).await?;
                    debug!(field = %name, file = %file_name, "Received upload");
                    form.files.push(UploadedFile {
                        field: name,
                        file_name,
                        contents,
                    });
                }
                _ => {
                    if !field.bytes().await?.is_empty() {
                        return Err(ApiError::BadRequest(format!(
                            "Part {} has content but no file name",
                            name
                        )));
                    }
                }
            }
        }

        Ok(form)
    }

    /// Parse the `metadata` part
    pub fn metadata<T: DeserializeOwned>(&self) -> ApiResult<T> {
        let raw = self
            .metadata
            .as_ref()
            .ok_or_else(|| ApiError::BadRequest("Missing metadata part".to_string()))?;
        serde_json::from_slice(raw)
            .map_err(|e| ApiError::BadRequest(format!("Invalid metadata JSON: {}", e)))
    }

    /// Remove and return the single file sent as `field`
    pub fn take_file(&mut self, field: &str) -> ApiResult<Option<UploadedFile>> {
        let mut found = self.take_files(field);
        match found.len() {
            0 => Ok(None),
            1 => Ok(found.pop()),
            n => Err(ApiError::BadRequest(format!(
                "Expected one file in {}, got {}",
                field, n
            ))),
        }
    }

    /// Remove and return every file sent as `field`
    pub fn take_files(&mut self, field: &str) -> Vec<UploadedFile> {
        let (taken, rest) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|file| file.field == field);
        self.files = rest;
        taken
    }

    /// Fail if files were sent in fields the route does not use
    pub fn ensure_consumed(&self) -> ApiResult<()> {
        match self.files.first() {
            None => Ok(()),
            Some(file) => Err(ApiError::BadRequest(format!(
                "Unexpected file field: {}",
                file.field
            ))),
        }
    }
}

/// Stream one file part into a staged file.
///
/// Chunks are handed to a blocking writer task; if the body fails part way
/// the partial file is dropped, which removes it.
async fn stage_field(state: &AppState, field: &mut Field<'_>) -> ApiResult<StagedFile> {
    let (tx, mut rx) = mpsc::channel::<Bytes>(STAGING_QUEUE);
    let store = state.store.clone();
    let writer = tokio::task::spawn_blocking(move || {
        let mut staging = store.staging_writer()?;
        while let Some(chunk) = rx.blocking_recv() {
            staging.write_chunk(&chunk)?;
        }
        staging.finish()
    });

    while let Some(chunk) = field.chunk().await? {
        // A closed queue means the writer failed; its error is returned below
        if tx.send(chunk).await.is_err() {
            break;
        }
    }
    drop(tx);

    writer
        .await
        .map_err(|e| ApiError::Internal(format!("Upload task failed: {}", e)))?
        .map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aptdm_common::DataStore;
    use tempfile::TempDir;

    fn file(store: &DataStore, field: &str, name: &str) -> UploadedFile {
        UploadedFile {
            field: field.into(),
            file_name: name.into(),
            contents: store.stage_bytes(b"data").unwrap(),
        }
    }

    #[test]
    fn test_take_files_by_field() {
        let tmp = TempDir::new().unwrap();
        let store = DataStore::new(tmp.path());
        let mut form = UploadForm {
            metadata: Some(Bytes::from_static(br#"{"title":"x"}"#)),
            files: vec![
                file(&store, "files", "a.csv"),
                file(&store, "pos_file", "r.pos"),
                file(&store, "files", "b.csv"),
            ],
        };

        assert_eq!(form.take_files("files").len(), 2);
        assert!(form.ensure_consumed().is_err());
        assert_eq!(form.take_file("pos_file").unwrap().unwrap().file_name, "r.pos");
        assert!(form.take_file("rrng_file").unwrap().is_none());
        assert!(form.ensure_consumed().is_ok());

        let value: serde_json::Value = form.metadata().unwrap();
        assert_eq!(value["title"], "x");
    }

    #[test]
    fn test_duplicate_single_file_rejected() {
        let tmp = TempDir::new().unwrap();
        let store = DataStore::new(tmp.path());
        let mut form = UploadForm {
            metadata: None,
            files: vec![
                file(&store, "rhit_file", "a.RHIT"),
                file(&store, "rhit_file", "b.RHIT"),
            ],
        };
        assert!(matches!(form.take_file("rhit_file"), Err(ApiError::BadRequest(_))));
        assert!(matches!(
            form.metadata::<serde_json::Value>(),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_expect_kind() {
        let tmp = TempDir::new().unwrap();
        let store = DataStore::new(tmp.path());
        assert!(file(&store, "rhit_file", "a.RHIT").expect_kind(FileKind::Rhit).is_ok());
        assert!(file(&store, "rhit_file", "a.txt").expect_kind(FileKind::Rhit).is_err());
    }

    #[test]
    fn test_dropped_upload_leaves_no_staged_file() {
        let tmp = TempDir::new().unwrap();
        let store = DataStore::new(tmp.path());
        drop(file(&store, "files", "a.csv"));
        let staged: Vec<_> = std::fs::read_dir(tmp.path().join(".uploads"))
            .unwrap()
            .collect();
        assert!(staged.is_empty());
    }
}
