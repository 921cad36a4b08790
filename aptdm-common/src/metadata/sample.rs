//! Sample-level metadata
//!
//! A sample directory holds three documents: the sample description
//! (`SampleInformation.yaml`), how the data was collected on the LEAP
//! (`CollectionMetadata.yaml`) and how the tip was prepared
//! (`SamplePreparation.yaml`).

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::document::{schema_errors, MetadataDocument};
use super::KeyValue;
use crate::names;

/// Description of an APT sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SampleInformation {
    /// Name of the sample directory
    pub sample_name: String,
    #[validate(length(min = 1, message = "Sample title must not be empty"))]
    pub sample_title: String,
    #[serde(default)]
    pub sample_description: String,
    #[serde(default)]
    #[validate(nested)]
    pub metadata: Vec<KeyValue>,
}

impl MetadataDocument for SampleInformation {
    const FILE_NAME: &'static str = "SampleInformation.yaml";

    fn validation_errors(&self) -> Vec<String> {
        let mut errors = schema_errors(self);
        if let Err(e) = names::validate_name("Sample", &self.sample_name) {
            errors.push(format!("sample_name: {}", e));
        }
        errors
    }
}

/// How the sample was evaporated in the instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaporationMode {
    Voltage,
    #[default]
    Laser,
}

/// Data collection settings of the LEAP run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CollectionMetadata {
    #[serde(default = "default_leap_model")]
    pub leap_model: String,
    #[serde(default)]
    pub evaporation_mode: EvaporationMode,
    #[validate(range(min = 0.0, message = "Voltage ratio must be positive"))]
    pub voltage_ratio: Option<f64>,
    /// Laser pulse energy (pJ)
    #[validate(range(min = 0.0, message = "Energy must be positive"))]
    pub laser_pulse_energy: Option<f64>,
    /// Laser pulse repetition rate (kHz)
    #[validate(range(min = 0.0, message = "Frequency must be positive"))]
    pub laser_pulse_frequency: Option<f64>,
    /// Temperature (K)
    pub temperature: Option<f64>,
    /// Detection rate (%)
    pub detection_rate: Option<f64>,
    /// Chamber pressure (torr)
    pub chamber_pressure: Option<f64>,
    #[serde(default)]
    #[validate(nested)]
    pub misc: Vec<KeyValue>,
}

fn default_leap_model() -> String {
    "4000 Si X".to_string()
}

impl Default for CollectionMetadata {
    fn default() -> Self {
        Self {
            leap_model: default_leap_model(),
            evaporation_mode: EvaporationMode::Laser,
            voltage_ratio: Some(1.0),
            laser_pulse_energy: None,
            laser_pulse_frequency: None,
            temperature: None,
            detection_rate: None,
            chamber_pressure: None,
            misc: Vec::new(),
        }
    }
}

impl MetadataDocument for CollectionMetadata {
    const FILE_NAME: &'static str = "CollectionMetadata.yaml";

    fn validation_errors(&self) -> Vec<String> {
        schema_errors(self)
    }
}

/// One electropolishing step
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
pub struct ElectropolishStep {
    pub solution: Option<String>,
    /// Voltage (V)
    pub voltage: Option<f64>,
    /// Temperature (C)
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
pub struct LiftOutStep {
    pub capping_material: Option<String>,
    /// Wedge dimension (um)
    #[validate(range(min = 0.0, message = "Wedge dimension must be positive"))]
    pub wedge_dimension: Option<f64>,
    /// Ion voltage (kV)
    pub ion_voltage: Option<f64>,
    /// Ion current (nA)
    pub ion_current: Option<f64>,
    pub sample_orientation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
pub struct SharpeningStep {
    /// Final ion voltage (kV)
    pub final_ion_voltage: Option<f64>,
    /// Final ion current (pA)
    pub final_ion_current: Option<f64>,
}

/// FIB lift-out preparation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
pub struct FibLiftOut {
    #[serde(default)]
    #[validate(nested)]
    pub lift_out_step: LiftOutStep,
    #[serde(default)]
    #[validate(nested)]
    pub sharpening_step: SharpeningStep,
}

/// How the tip was prepared.
///
/// Only the metadata of the selected method is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "preparation_method", rename_all = "snake_case")]
pub enum SamplePreparation {
    Electropolish {
        electropolish: Vec<ElectropolishStep>,
    },
    FibLiftOut {
        #[serde(default)]
        fib_lift_out: FibLiftOut,
    },
}

impl Default for SamplePreparation {
    fn default() -> Self {
        SamplePreparation::Electropolish {
            electropolish: vec![ElectropolishStep::default()],
        }
    }
}

impl SamplePreparation {
    pub fn method_name(&self) -> &'static str {
        match self {
            SamplePreparation::Electropolish { .. } => "electropolish",
            SamplePreparation::FibLiftOut { .. } => "fib_lift_out",
        }
    }
}

impl MetadataDocument for SamplePreparation {
    const FILE_NAME: &'static str = "SamplePreparation.yaml";

    fn validation_errors(&self) -> Vec<String> {
        match self {
            SamplePreparation::Electropolish { electropolish } => {
                if electropolish.is_empty() {
                    return vec!["electropolish: At least one step is required".to_string()];
                }
                electropolish
                    .iter()
                    .enumerate()
                    .flat_map(|(i, step)| {
                        schema_errors(step)
                            .into_iter()
                            .map(move |e| format!("electropolish[{}].{}", i, e))
                    })
                    .collect()
            }
            SamplePreparation::FibLiftOut { fib_lift_out } => schema_errors(fib_lift_out)
                .into_iter()
                .map(|e| format!("fib_lift_out.{}", e))
                .collect(),
        }
    }
}
