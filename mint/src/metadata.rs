//! What gets recorded, including the environmental-offset estimate.

use serde::{Deserialize, Serialize};
use sprout_types::{ActivityId, ActivityType, GeoPoint, PlantId, UserId};

/// Annual CO₂ absorption assumed for species missing from the table, in kg.
pub const DEFAULT_CO2_KG_PER_PLANT: f64 = 21.77;

const CO2_TABLE: &[(&str, f64)] = &[
    ("bamboo", 35.0),
    ("neem", 30.0),
    ("areca palm", 20.0),
    ("snake plant", 15.0),
    ("tulsi", 12.0),
    ("peace lily", 12.0),
    ("money plant", 10.0),
    ("aloe vera", 8.0),
];

/// Annual CO₂ absorption for a species, in kg. Matching ignores case and
/// surrounding whitespace.
pub fn co2_absorption_kg_per_year(species: &str) -> f64 {
    let key = species.trim().to_ascii_lowercase();
    CO2_TABLE
        .iter()
        .find(|(name, _)| *name == key)
        .map_or(DEFAULT_CO2_KG_PER_PLANT, |(_, kg)| *kg)
}

pub fn estimate_offset_kg(species: &str, quantity: u32) -> f64 {
    co2_absorption_kg_per_year(species) * f64::from(quantity)
}

/// Metadata sent to the minting service for one approved activity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MintMetadata {
    pub activity: ActivityId,
    pub plant: PlantId,
    pub user: UserId,
    pub activity_type: ActivityType,
    pub species: String,
    pub quantity: u32,
    pub location: Option<GeoPoint>,
    pub co2_offset_kg: f64,
    pub aggregate_confidence: f64,
    pub gesture_signature: Option<String>,
}
