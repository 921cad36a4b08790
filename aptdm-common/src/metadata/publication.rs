//! Publication request and the record left behind by publishing
//!
//! The record holds the metadata a publication service expects, in
//! DataCite / MDF key form, so the dataset can be transferred later.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

use super::dataset::GeneralMetadata;
use super::document::{schema_errors, MetadataDocument};
use crate::time::iso_date;

/// Request to publish a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PublicationRequest {
    #[serde(default)]
    pub accept_license: bool,
    #[validate(length(min = 1, message = "Contact person must not be empty"))]
    pub contact_person: String,
    #[validate(email(message = "Contact email is not a valid address"))]
    pub contact_email: String,
}

impl PublicationRequest {
    /// Schema errors plus the license requirement
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = schema_errors(self);
        if !self.accept_license {
            errors.push("accept_license: The data license must be accepted".to_string());
        }
        errors
    }
}

/// Written as `PublicationRecord.yaml` when a dataset is published
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PublicationRecord {
    pub published_at: DateTime<Utc>,
    #[validate(length(min = 1))]
    pub contact_person: String,
    #[validate(email)]
    pub contact_email: String,
    /// Publication-service metadata, keyed by DataCite / MDF field names
    pub metadata: BTreeMap<String, Value>,
}

impl PublicationRecord {
    /// Build the record for `general`, issued on `issued`
    pub fn build(
        general: &GeneralMetadata,
        request: &PublicationRequest,
        issued: NaiveDate,
        published_at: DateTime<Utc>,
    ) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("accept_license".to_string(), json!(request.accept_license));

        // DataCite fields
        metadata.insert("dc.title".to_string(), json!(general.title));
        metadata.insert("dc.publisher".to_string(), json!("Materials Data Facility"));
        metadata.insert("dc.date.issued".to_string(), json!(iso_date(issued)));
        metadata.insert(
            "dc.contributor.author".to_string(),
            json!(general
                .authors
                .iter()
                .map(|a| a.citation_name())
                .collect::<Vec<_>>()),
        );
        metadata.insert(
            "datacite.creator.affiliation".to_string(),
            json!(general
                .authors
                .iter()
                .map(|a| a.affiliation.clone())
                .collect::<Vec<_>>()),
        );

        // MDF fields
        metadata.insert(
            "mdf-base.data_acquisition_method".to_string(),
            json!("Atom probe tomography"),
        );
        metadata.insert("mdf-base.primary_product".to_string(), json!("Data files"));
        metadata.insert("mdf-base.description".to_string(), json!(general.abstract_text));
        metadata.insert(
            "mdf-base.data_acquisition_location".to_string(),
            json!("NUCAPT"),
        );

        Self {
            published_at,
            contact_person: request.contact_person.clone(),
            contact_email: request.contact_email.clone(),
            metadata,
        }
    }
}

impl MetadataDocument for PublicationRecord {
    const FILE_NAME: &'static str = "PublicationRecord.yaml";

    fn validation_errors(&self) -> Vec<String> {
        schema_errors(self)
    }
}
