//! Reconstruction metadata (`ReconstructionMetadata.yaml`)

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::document::{schema_errors, MetadataDocument};
use super::KeyValue;

/// Method used to reconstruct the APT data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconstructionMethod {
    #[default]
    ShankAngle,
    VoltageProfile,
    TipImage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ReconstructionMetadata {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reconstruction_method: ReconstructionMethod,
    /// Initial tip radius (nm)
    #[validate(range(min = 0.0, message = "Tip radius must be positive"))]
    pub tip_radius: Option<f64>,
    /// Evaporation field strength (V/nm)
    pub evaporation_field: Option<f64>,
    /// Initial voltage (V)
    pub initial_voltage: Option<f64>,
    /// Shank angle (degrees)
    #[validate(range(min = 0.0, message = "Shank angle must be positive"))]
    pub shank_angle: Option<f64>,
    #[serde(default)]
    #[validate(nested)]
    pub metadata: Vec<KeyValue>,
}

impl MetadataDocument for ReconstructionMetadata {
    const FILE_NAME: &'static str = "ReconstructionMetadata.yaml";

    fn validation_errors(&self) -> Vec<String> {
        schema_errors(self)
    }
}
