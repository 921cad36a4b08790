//! Publishing a dataset

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use super::{DataStore, DatasetDirectory};
use crate::metadata::{GeneralMetadata, MetadataDocument, PublicationRecord, PublicationRequest};
use crate::time::today;
use crate::{Error, Result};

impl DataStore {
    /// Publish a dataset today
    pub fn publish_dataset(
        &self,
        name: &str,
        request: &PublicationRequest,
    ) -> Result<DatasetDirectory> {
        self.publish_dataset_on(name, request, today(), Utc::now())
    }

    /// Mark a dataset as published on `date`.
    ///
    /// The publication record is written first; the dataset only counts as
    /// published once `publication_date` lands in `GeneralMetadata.yml`.
    /// There is no way back.
    pub fn publish_dataset_on(
        &self,
        name: &str,
        request: &PublicationRequest,
        date: NaiveDate,
        published_at: DateTime<Utc>,
    ) -> Result<DatasetDirectory> {
        let mut dataset = self.load_mutable_dataset(name)?;

        let errors = request.validation_errors();
        if !errors.is_empty() {
            return Err(Error::Metadata {
                path: dataset.path.join(PublicationRecord::FILE_NAME),
                errors,
            });
        }

        let record = PublicationRecord::build(&dataset.metadata, request, date, published_at);
        record.write_to_dir(&dataset.path)?;

        let mut metadata: GeneralMetadata = dataset.metadata.clone();
        metadata.dates.publication_date = Some(date);
        metadata.write_to_dir(&dataset.path)?;

        info!(
            dataset = %name,
            contact = %request.contact_person,
            "Published dataset"
        );
        dataset.metadata = metadata;
        Ok(dataset)
    }
}
