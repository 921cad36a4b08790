//! HTTP API handlers for aptdm-ds

pub mod analyses;
pub mod buildinfo;
pub mod datasets;
pub mod extract;
pub mod health;
pub mod lock;
pub mod publication;
pub mod reconstructions;
pub mod samples;
pub mod upload;

pub use analyses::{create_analysis, get_analysis, list_analysis_presets};
pub use buildinfo::get_build_info;
pub use datasets::{create_dataset, get_dataset, list_datasets, update_dataset};
pub use health::health_routes;
pub use lock::publication_lock;
pub use publication::publish_dataset;
pub use reconstructions::{create_reconstruction, get_reconstruction, update_reconstruction};
pub use samples::{
    create_sample, get_sample, sample_defaults, update_collection_metadata, update_preparation,
    update_sample_information, upload_rhit_file,
};

use aptdm_common::DataStore;

use crate::{ApiError, ApiResult, AppState};

/// Run a store operation on the blocking pool.
///
/// All store calls touch the filesystem, so handlers never run them on the
/// async workers directly.
pub(crate) async fn with_store<T, F>(state: &AppState, op: F) -> ApiResult<T>
where
    F: FnOnce(&DataStore) -> aptdm_common::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || op(&store))
        .await
        .map_err(|e| ApiError::Internal(format!("Store task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// Split a document load into its value and any problems found.
///
/// Detail views still render when one document is broken; the messages
/// go in the response's `errors` list instead.
pub(crate) fn document_or_errors<T>(
    result: aptdm_common::Result<Option<T>>,
    errors: &mut Vec<String>,
) -> Option<T> {
    match result {
        Ok(doc) => doc,
        Err(aptdm_common::Error::Metadata { path, errors: found }) => {
            let file = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();
            errors.extend(found.into_iter().map(|e| format!("{}: {}", file, e)));
            None
        }
        Err(e) => {
            errors.push(e.to_string());
            None
        }
    }
}
