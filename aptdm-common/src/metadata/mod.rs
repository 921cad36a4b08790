//! Metadata documents
//!
//! Every level of the hierarchy stores its descriptive metadata as a YAML
//! document. Each document type carries its own validation rules (the
//! schema); nothing is written to disk unless it validates, and everything
//! read from disk is validated again.

mod analysis;
mod dataset;
mod document;
mod publication;
mod reconstruction;
mod sample;

pub use analysis::{analysis_presets, AnalysisMetadata, AnalysisPreset};
pub use dataset::{Author, DatasetDates, GeneralMetadata};
pub use document::{schema_errors, MetadataDocument};
pub use publication::{PublicationRecord, PublicationRequest};
pub use reconstruction::{ReconstructionMethod, ReconstructionMetadata};
pub use sample::{
    CollectionMetadata, ElectropolishStep, EvaporationMode, FibLiftOut, LiftOutStep,
    SampleInformation, SamplePreparation, SharpeningStep,
};

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Free-form structured metadata entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct KeyValue {
    #[validate(length(min = 1, message = "Key must not be empty"))]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}
