//! Analysis metadata (`AnalysisMetadata.yaml`) and the list of common presets

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::document::{schema_errors, MetadataDocument};

/// Description of an analysis result folder.
///
/// The folder name and the uploaded files are not part of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AnalysisMetadata {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl MetadataDocument for AnalysisMetadata {
    const FILE_NAME: &'static str = "AnalysisMetadata.yaml";

    fn validation_errors(&self) -> Vec<String> {
        schema_errors(self)
    }
}

/// Pre-filled values for a common kind of analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisPreset {
    pub key: &'static str,
    pub title: &'static str,
    pub folder_name: &'static str,
    pub description: &'static str,
}

/// Common analyses, in display order
pub fn analysis_presets() -> Vec<AnalysisPreset> {
    vec![
        AnalysisPreset {
            key: "conc_profile",
            title: "Concentration Profile",
            folder_name: "Concentration_Profile",
            description: "1D concentration profile (e.g., proxigram)",
        },
        AnalysisPreset {
            key: "mass_spec",
            title: "Mass Spectrum",
            folder_name: "Mass_Spectrum",
            description: "Spectrum of the mass to charge ratio",
        },
        AnalysisPreset {
            key: "bulk_comp",
            title: "Bulk Composition",
            folder_name: "Bulk_Composition",
            description: "Bulk composition of the tip of region of interest",
        },
        AnalysisPreset {
            key: "dist_analysis",
            title: "Distribution Analysis",
            folder_name: "Distribution_Analysis",
            description: "Spatial distribution analysis",
        },
        AnalysisPreset {
            key: "twod_map",
            title: "2D Map",
            folder_name: "2D_Map",
            description: "Two dimensional projection of reconstruction",
        },
        AnalysisPreset {
            key: "threed_map",
            title: "3D Map",
            folder_name: "3D_Map",
            description: "Three dimensional visualization of reconstruction",
        },
    ]
}
