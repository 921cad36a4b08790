//! Dataset-level metadata (`GeneralMetadata.yml`)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::document::{schema_errors, MetadataDocument};

/// Person associated with a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Author {
    #[serde(default)]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name must not be empty"))]
    pub last_name: String,
    #[serde(default)]
    pub affiliation: String,
}

impl Author {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        affiliation: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            affiliation: affiliation.into(),
        }
    }

    /// `Last, First` form used in citations
    pub fn citation_name(&self) -> String {
        if self.first_name.is_empty() {
            self.last_name.clone()
        } else {
            format!("{}, {}", self.last_name, self.first_name)
        }
    }
}

/// Lifecycle dates of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDates {
    pub creation_date: NaiveDate,
    /// Set once, when the dataset is published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<NaiveDate>,
}

/// General description of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GeneralMetadata {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    #[serde(rename = "abstract")]
    #[validate(length(min = 1, message = "Abstract must not be empty"))]
    pub abstract_text: String,
    #[validate(length(min = 1, message = "At least one author is required"), nested)]
    pub authors: Vec<Author>,
    pub dates: DatasetDates,
}

impl MetadataDocument for GeneralMetadata {
    const FILE_NAME: &'static str = "GeneralMetadata.yml";

    fn validation_errors(&self) -> Vec<String> {
        schema_errors(self)
    }
}
